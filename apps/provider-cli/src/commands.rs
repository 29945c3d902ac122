use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use serde_json::{json, Value};
use std::convert::Infallible;
use std::sync::Arc;
use tracing::debug;

use appointment_cell::models::{
    AppointmentFilter, AppointmentId, AppointmentStatus, DashboardSection, SortDirection,
    StatusAction,
};
use appointment_cell::services::{
    AppointmentLifecycleService, AppointmentQueryService, AppointmentStatusClient, ResponseCache,
};
use shared_config::AppConfig;
use shared_http::ApiClient;
use shared_models::{ApiError, OperationOutcome};

#[derive(Parser, Debug)]
#[command(name = "provider-cli", author, version, about = "Provider appointment client")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// List appointments, optionally filtered
    List(ListArgs),
    /// Today's appointments
    Today,
    /// One appointment, served from the cache while fresh
    Show {
        #[arg(value_parser = parse_id)]
        id: AppointmentId,
    },
    /// Status badge and the actions available to the provider
    Actions {
        #[arg(value_parser = parse_id)]
        id: AppointmentId,
    },
    /// One dashboard section
    Dashboard {
        #[arg(value_parser = parse_section)]
        section: DashboardSection,
    },
    /// Dashboard counters
    Stats,
    /// Request any status; the server decides whether it is allowed
    Status {
        #[arg(value_parser = parse_id)]
        id: AppointmentId,
        #[arg(value_parser = parse_status)]
        status: AppointmentStatus,
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        notes: Vec<String>,
    },
    Confirm(ActionArgs),
    Start(ActionArgs),
    Complete(ActionArgs),
    Cancel(ActionArgs),
    NoShow(ActionArgs),
    AcceptReschedule(ActionArgs),
    DeclineReschedule(ActionArgs),
}

#[derive(Args, Debug, Clone, Default, PartialEq)]
pub struct ListArgs {
    #[arg(long, value_parser = parse_status)]
    pub status: Option<AppointmentStatus>,
    #[arg(long = "from", value_parser = parse_date)]
    pub date_from: Option<NaiveDate>,
    #[arg(long = "to", value_parser = parse_date)]
    pub date_to: Option<NaiveDate>,
    #[arg(long)]
    pub search: Option<String>,
    #[arg(long)]
    pub sort_by: Option<String>,
    #[arg(long, value_parser = parse_sort_direction)]
    pub sort_direction: Option<SortDirection>,
    #[arg(long)]
    pub page: Option<u32>,
    #[arg(long)]
    pub per_page: Option<u32>,
}

impl From<ListArgs> for AppointmentFilter {
    fn from(args: ListArgs) -> Self {
        AppointmentFilter {
            status: args.status,
            date_from: args.date_from,
            date_to: args.date_to,
            search: args.search,
            sort_by: args.sort_by,
            sort_direction: args.sort_direction,
            per_page: args.per_page,
            page: args.page,
        }
    }
}

#[derive(Args, Debug, Clone, PartialEq)]
pub struct ActionArgs {
    #[arg(value_parser = parse_id)]
    pub id: AppointmentId,
    /// Free-text notes; for cancel, the cancellation reason
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub notes: Vec<String>,
}

fn parse_id(raw: &str) -> Result<AppointmentId, Infallible> {
    Ok(AppointmentId::from(raw))
}

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|e| format!("expected YYYY-MM-DD: {}", e))
}

fn parse_status(raw: &str) -> Result<AppointmentStatus, String> {
    raw.parse::<AppointmentStatus>()
}

fn parse_section(raw: &str) -> Result<DashboardSection, String> {
    raw.parse::<DashboardSection>()
}

fn parse_sort_direction(raw: &str) -> Result<SortDirection, String> {
    raw.parse::<SortDirection>()
}

fn joined_notes(words: &[String]) -> Option<String> {
    let notes = words.join(" ");
    if notes.trim().is_empty() {
        None
    } else {
        Some(notes)
    }
}

/// The appointment services wired to one shared cache.
pub struct App {
    queries: AppointmentQueryService,
    status: AppointmentStatusClient,
    lifecycle: AppointmentLifecycleService,
}

fn to_outcome<T: Serialize>(result: Result<T, ApiError>) -> OperationOutcome<Value> {
    result
        .map(|data| serde_json::to_value(data).unwrap_or(Value::Null))
        .into()
}

impl App {
    pub fn new(config: &AppConfig) -> Self {
        let api = Arc::new(ApiClient::new(config));
        let cache = Arc::new(ResponseCache::new(config.cache_ttl()));

        Self {
            queries: AppointmentQueryService::with_cache(api.clone(), cache.clone()),
            status: AppointmentStatusClient::with_cache(api, cache),
            lifecycle: AppointmentLifecycleService::new(),
        }
    }

    pub async fn run(&self, command: Command) -> OperationOutcome<Value> {
        debug!("Running {:?}", command);

        match command {
            Command::List(args) => to_outcome(self.queries.list_appointments(&args.into()).await),
            Command::Today => to_outcome(self.queries.today_appointments().await),
            Command::Show { id } => to_outcome(self.queries.get_appointment(&id).await),
            Command::Actions { id } => {
                let result = self.queries.get_appointment(&id).await.map(|appointment| {
                    json!({
                        "id": appointment.id,
                        "status": appointment.status,
                        "display": appointment.status.display(),
                        "actions": self.lifecycle.provider_actions(&appointment.status),
                    })
                });
                to_outcome(result)
            }
            Command::Dashboard { section } => to_outcome(self.queries.dashboard(section).await),
            Command::Stats => to_outcome(self.queries.dashboard_stats().await),
            Command::Status { id, status, notes } => {
                to_outcome(self.status.update_status(&id, status, joined_notes(&notes)).await)
            }
            Command::Confirm(args) => self.act(StatusAction::Confirm, args).await,
            Command::Start(args) => self.act(StatusAction::Start, args).await,
            Command::Complete(args) => self.act(StatusAction::Complete, args).await,
            Command::Cancel(args) => self.act(StatusAction::Cancel, args).await,
            Command::NoShow(args) => self.act(StatusAction::MarkNoShow, args).await,
            Command::AcceptReschedule(args) => self.act(StatusAction::AcceptReschedule, args).await,
            Command::DeclineReschedule(args) => {
                self.act(StatusAction::DeclineReschedule, args).await
            }
        }
    }

    async fn act(&self, action: StatusAction, args: ActionArgs) -> OperationOutcome<Value> {
        let notes = joined_notes(&args.notes);
        to_outcome(self.status.perform(action, &args.id, notes).await)
    }
}
