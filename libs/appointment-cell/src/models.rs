// libs/appointment-cell/src/models.rs
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

use shared_http::QueryParams;

pub const APPOINTMENTS_PATH: &str = "/api/provider/appointments";

// Default messages shown when the server gives none (or nothing arrives).
pub const UPDATE_STATUS_FAILED: &str = "Failed to update appointment status";
pub const COMPLETE_FAILED: &str = "Failed to complete appointment";
pub const APPROVE_RESCHEDULE_FAILED: &str = "Failed to approve reschedule request";
pub const DECLINE_RESCHEDULE_FAILED: &str = "Failed to decline reschedule request";
pub const FETCH_APPOINTMENTS_FAILED: &str = "Failed to fetch appointments";
pub const FETCH_TODAY_FAILED: &str = "Failed to fetch today's appointments";
pub const FETCH_APPOINTMENT_FAILED: &str = "Failed to fetch appointment details";
pub const FETCH_DASHBOARD_FAILED: &str = "Failed to fetch dashboard appointments";
pub const FETCH_STATS_FAILED: &str = "Failed to fetch appointment statistics";

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

/// Backend-assigned identifier. Kept in whatever JSON shape it arrived in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AppointmentId {
    Numeric(u64),
    Text(String),
}

impl AppointmentId {
    pub fn cache_key(&self) -> String {
        format!("appointment_{}", self)
    }
}

impl fmt::Display for AppointmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentId::Numeric(id) => write!(f, "{}", id),
            AppointmentId::Text(id) => write!(f, "{}", id),
        }
    }
}

impl From<u64> for AppointmentId {
    fn from(id: u64) -> Self {
        AppointmentId::Numeric(id)
    }
}

/// Canonical decimal strings become `Numeric`; anything else (leading
/// zeros, signs, whitespace) is kept verbatim as `Text`.
impl From<&str> for AppointmentId {
    fn from(id: &str) -> Self {
        match id.parse::<u64>() {
            Ok(n) if n.to_string() == id => AppointmentId::Numeric(n),
            _ => AppointmentId::Text(id.to_string()),
        }
    }
}

impl From<String> for AppointmentId {
    fn from(id: String) -> Self {
        AppointmentId::from(id.as_str())
    }
}

/// An appointment as the backend returns it.
///
/// Only the fields this client acts on are typed; everything else the
/// backend sends is carried through untouched in `extra`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Appointment {
    pub id: AppointmentId,
    pub status: AppointmentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancellation_reason: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    InProgress,
    Completed,
    CancelledByClient,
    CancelledByProvider,
    NoShow,
    // Reachable only through the backend
    Disputed,
    Expired,
    Reviewed,
    Closed,
    #[serde(other)]
    Unknown,
}

impl AppointmentStatus {
    pub const ALL: [AppointmentStatus; 11] = [
        AppointmentStatus::Pending,
        AppointmentStatus::Confirmed,
        AppointmentStatus::InProgress,
        AppointmentStatus::Completed,
        AppointmentStatus::CancelledByClient,
        AppointmentStatus::CancelledByProvider,
        AppointmentStatus::NoShow,
        AppointmentStatus::Disputed,
        AppointmentStatus::Expired,
        AppointmentStatus::Reviewed,
        AppointmentStatus::Closed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::InProgress => "in_progress",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::CancelledByClient => "cancelled_by_client",
            AppointmentStatus::CancelledByProvider => "cancelled_by_provider",
            AppointmentStatus::NoShow => "no_show",
            AppointmentStatus::Disputed => "disputed",
            AppointmentStatus::Expired => "expired",
            AppointmentStatus::Reviewed => "reviewed",
            AppointmentStatus::Closed => "closed",
            AppointmentStatus::Unknown => "unknown",
        }
    }

    /// Statuses the backend accepts no further transitions from.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AppointmentStatus::Completed
                | AppointmentStatus::CancelledByClient
                | AppointmentStatus::CancelledByProvider
                | AppointmentStatus::NoShow
                | AppointmentStatus::Expired
                | AppointmentStatus::Closed
        )
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(
            self,
            AppointmentStatus::CancelledByClient | AppointmentStatus::CancelledByProvider
        )
    }

    pub fn display(&self) -> StatusDisplay {
        let (label, badge, icon) = match self {
            AppointmentStatus::Pending => ("Pending", "warning", "clock"),
            AppointmentStatus::Confirmed => ("Confirmed", "info", "check-circle"),
            AppointmentStatus::InProgress => ("In Progress", "primary", "play-circle"),
            AppointmentStatus::Completed => ("Completed", "success", "check-double"),
            AppointmentStatus::CancelledByClient => ("Cancelled by Client", "danger", "x-circle"),
            AppointmentStatus::CancelledByProvider => ("Cancelled by Provider", "danger", "ban"),
            AppointmentStatus::NoShow => ("No Show", "secondary", "user-x"),
            AppointmentStatus::Disputed => ("Disputed", "danger", "alert-triangle"),
            AppointmentStatus::Expired => ("Expired", "secondary", "hourglass"),
            AppointmentStatus::Reviewed => ("Reviewed", "success", "star"),
            AppointmentStatus::Closed => ("Closed", "dark", "lock"),
            AppointmentStatus::Unknown => ("Unknown", "light", "help-circle"),
        };

        StatusDisplay { label, badge, icon }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppointmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AppointmentStatus::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown appointment status: {}", s))
    }
}

/// How a status is rendered: badge text, badge colour, icon name.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct StatusDisplay {
    pub label: &'static str,
    pub badge: &'static str,
    pub icon: &'static str,
}

/// Named transitions a provider can trigger.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum StatusAction {
    Confirm,
    Start,
    Complete,
    Cancel,
    MarkNoShow,
    AcceptReschedule,
    DeclineReschedule,
}

impl StatusAction {
    /// Status the backend is asked to move to. Reschedule decisions go
    /// through their own routes and have no fixed target.
    pub fn target_status(&self) -> Option<AppointmentStatus> {
        match self {
            StatusAction::Confirm => Some(AppointmentStatus::Confirmed),
            StatusAction::Start => Some(AppointmentStatus::InProgress),
            StatusAction::Complete => Some(AppointmentStatus::Completed),
            StatusAction::Cancel => Some(AppointmentStatus::CancelledByProvider),
            StatusAction::MarkNoShow => Some(AppointmentStatus::NoShow),
            StatusAction::AcceptReschedule | StatusAction::DeclineReschedule => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StatusAction::Confirm => "confirm",
            StatusAction::Start => "start",
            StatusAction::Complete => "complete",
            StatusAction::Cancel => "cancel",
            StatusAction::MarkNoShow => "no-show",
            StatusAction::AcceptReschedule => "accept-reschedule",
            StatusAction::DeclineReschedule => "decline-reschedule",
        }
    }
}

impl FromStr for StatusAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "confirm" => Ok(StatusAction::Confirm),
            "start" => Ok(StatusAction::Start),
            "complete" => Ok(StatusAction::Complete),
            "cancel" => Ok(StatusAction::Cancel),
            "no-show" | "no_show" => Ok(StatusAction::MarkNoShow),
            "accept-reschedule" => Ok(StatusAction::AcceptReschedule),
            "decline-reschedule" => Ok(StatusAction::DeclineReschedule),
            other => Err(format!("unknown action: {}", other)),
        }
    }
}

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StatusUpdateRequest {
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancellation_reason: Option<String>,
}

impl StatusUpdateRequest {
    pub fn new(status: AppointmentStatus, notes: Option<String>) -> Self {
        Self {
            status,
            notes,
            cancellation_reason: None,
        }
    }

    pub fn cancellation(reason: Option<String>) -> Self {
        Self {
            status: AppointmentStatus::CancelledByProvider,
            notes: reason.clone(),
            cancellation_reason: reason,
        }
    }

    pub fn to_body(&self) -> Value {
        let mut body = json!({
            "status": self.status.as_str(),
            "notes": self.notes,
        });
        if let Some(reason) = &self.cancellation_reason {
            body["cancellation_reason"] = Value::String(reason.clone());
        }
        body
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CompleteAppointmentRequest {
    pub notes: Option<String>,
    pub create_invoice: bool,
    pub send_invoice: bool,
}

impl CompleteAppointmentRequest {
    pub fn to_body(&self) -> Value {
        json!({
            "notes": self.notes,
            "create_invoice": self.create_invoice,
            "send_invoice": self.send_invoice,
        })
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            other => Err(format!("unknown sort direction: {}", other)),
        }
    }
}

/// Query filters for the appointment list. Unset fields are not sent.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppointmentFilter {
    pub status: Option<AppointmentStatus>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub sort_direction: Option<SortDirection>,
    pub per_page: Option<u32>,
    pub page: Option<u32>,
}

impl AppointmentFilter {
    pub fn to_query(&self) -> QueryParams {
        let mut query = QueryParams::new();
        let mut push = |key: &str, value: String| query.push((key.to_string(), value));

        if let Some(status) = self.status {
            push("status", status.as_str().to_string());
        }
        if let Some(date_from) = self.date_from {
            push("date_from", date_from.format("%Y-%m-%d").to_string());
        }
        if let Some(date_to) = self.date_to {
            push("date_to", date_to.format("%Y-%m-%d").to_string());
        }
        if let Some(search) = self.search.as_ref().filter(|s| !s.trim().is_empty()) {
            push("search", search.trim().to_string());
        }
        if let Some(sort_by) = &self.sort_by {
            push("sort_by", sort_by.clone());
        }
        if let Some(direction) = self.sort_direction {
            push("sort_direction", direction.as_str().to_string());
        }
        if let Some(per_page) = self.per_page {
            push("per_page", per_page.to_string());
        }
        if let Some(page) = self.page {
            push("page", page.to_string());
        }

        query
    }
}

// ==============================================================================
// RESPONSE MODELS
// ==============================================================================

/// One page of appointments. Bare arrays are read as a single page.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct AppointmentPage {
    pub items: Vec<Appointment>,
    pub current_page: u32,
    pub last_page: u32,
    pub per_page: Option<u32>,
    pub total: u64,
}

impl AppointmentPage {
    /// Lenient decode: anything that is neither an array nor a paginator
    /// object becomes an empty page.
    pub fn from_data(data: Option<Value>) -> Self {
        match data {
            Some(Value::Array(items)) => {
                let items = parse_appointments(items);
                AppointmentPage {
                    total: items.len() as u64,
                    current_page: 1,
                    last_page: 1,
                    per_page: None,
                    items,
                }
            }
            Some(Value::Object(mut paginator)) => {
                let items = match paginator.remove("data") {
                    Some(Value::Array(items)) => parse_appointments(items),
                    _ => {
                        warn!("Paginated response without a data array, treating as empty");
                        Vec::new()
                    }
                };
                let number = |key: &str| paginator.get(key).and_then(Value::as_u64);
                let page_number = |key: &str| number(key).and_then(|n| u32::try_from(n).ok());

                AppointmentPage {
                    current_page: page_number("current_page").unwrap_or(1),
                    last_page: page_number("last_page").unwrap_or(1),
                    per_page: page_number("per_page"),
                    total: number("total").unwrap_or(items.len() as u64),
                    items,
                }
            }
            Some(other) => {
                warn!("Unexpected appointment list payload: {}", other);
                AppointmentPage::default()
            }
            None => AppointmentPage::default(),
        }
    }

    pub fn has_more(&self) -> bool {
        self.current_page < self.last_page
    }
}

fn parse_appointments(items: Vec<Value>) -> Vec<Appointment> {
    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<Appointment>(item) {
            Ok(appointment) => Some(appointment),
            Err(e) => {
                warn!("Skipping unreadable appointment in list: {}", e);
                None
            }
        })
        .collect()
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DashboardSection {
    Today,
    Upcoming,
    Past,
    Cancelled,
}

impl DashboardSection {
    pub fn as_str(&self) -> &'static str {
        match self {
            DashboardSection::Today => "today",
            DashboardSection::Upcoming => "upcoming",
            DashboardSection::Past => "past",
            DashboardSection::Cancelled => "cancelled",
        }
    }
}

impl FromStr for DashboardSection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "today" => Ok(DashboardSection::Today),
            "upcoming" => Ok(DashboardSection::Upcoming),
            "past" => Ok(DashboardSection::Past),
            "cancelled" => Ok(DashboardSection::Cancelled),
            other => Err(format!("unknown dashboard section: {}", other)),
        }
    }
}

/// Provider dashboard counters. Counters the backend omits read as zero.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DashboardStats {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub today: u64,
    #[serde(default)]
    pub upcoming: u64,
    #[serde(default)]
    pub pending: u64,
    #[serde(default)]
    pub completed: u64,
    #[serde(default)]
    pub cancelled: u64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
