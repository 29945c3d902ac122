// libs/appointment-cell/src/services/lifecycle.rs
use tracing::debug;

use crate::models::{AppointmentStatus, StatusAction};

/// Advisory view of the appointment lifecycle.
///
/// The backend alone decides whether a transition is legal. Nothing here is
/// consulted before sending a request; it only tells a UI which buttons to
/// draw for a given status.
pub struct AppointmentLifecycleService;

impl AppointmentLifecycleService {
    pub fn new() -> Self {
        Self
    }

    /// Transitions the backend is known to accept from `current_status`
    /// when a provider asks for them.
    pub fn known_transitions(&self, current_status: &AppointmentStatus) -> Vec<AppointmentStatus> {
        match current_status {
            AppointmentStatus::Pending => vec![
                AppointmentStatus::Confirmed,
                AppointmentStatus::CancelledByProvider,
            ],
            AppointmentStatus::Confirmed => vec![
                AppointmentStatus::InProgress,
                AppointmentStatus::CancelledByProvider,
            ],
            AppointmentStatus::InProgress => vec![
                AppointmentStatus::Completed,
                AppointmentStatus::NoShow,
            ],
            // Terminal, server-driven or unrecognised
            AppointmentStatus::Completed
            | AppointmentStatus::CancelledByClient
            | AppointmentStatus::CancelledByProvider
            | AppointmentStatus::NoShow
            | AppointmentStatus::Disputed
            | AppointmentStatus::Expired
            | AppointmentStatus::Reviewed
            | AppointmentStatus::Closed
            | AppointmentStatus::Unknown => vec![],
        }
    }

    /// Actions a provider UI would offer for an appointment in `current_status`.
    pub fn provider_actions(&self, current_status: &AppointmentStatus) -> Vec<StatusAction> {
        let actions: Vec<StatusAction> = match current_status {
            AppointmentStatus::Pending => vec![StatusAction::Confirm, StatusAction::Cancel],
            AppointmentStatus::Confirmed => vec![StatusAction::Start, StatusAction::Cancel],
            AppointmentStatus::InProgress => vec![StatusAction::Complete, StatusAction::MarkNoShow],
            _ => vec![],
        };

        debug!("Offering {} actions for status {}", actions.len(), current_status);
        actions
    }

    /// Server-initiated disputes can hit any appointment that is still open.
    pub fn may_be_disputed(&self, current_status: &AppointmentStatus) -> bool {
        !current_status.is_terminal()
            && !matches!(
                current_status,
                AppointmentStatus::Disputed | AppointmentStatus::Unknown
            )
    }
}

impl Default for AppointmentLifecycleService {
    fn default() -> Self {
        Self::new()
    }
}
