// libs/appointment-cell/src/services/status.rs
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{info, instrument, warn};

use shared_config::AppConfig;
use shared_http::ApiClient;
use shared_models::ApiError;

use crate::models::{
    Appointment, AppointmentId, AppointmentStatus, CompleteAppointmentRequest, StatusAction,
    StatusUpdateRequest, APPOINTMENTS_PATH, APPROVE_RESCHEDULE_FAILED, COMPLETE_FAILED,
    DECLINE_RESCHEDULE_FAILED, UPDATE_STATUS_FAILED,
};
use crate::services::cache::ResponseCache;

pub(crate) fn appointment_path(appointment_id: &AppointmentId) -> String {
    format!(
        "{}/{}",
        APPOINTMENTS_PATH,
        urlencoding::encode(&appointment_id.to_string())
    )
}

/// Sends appointment status transitions to the provider API.
///
/// The backend owns the transition rules; this client never checks a
/// transition locally. A successful transition drops the cached copy of
/// the appointment. A failed one leaves the cache alone.
pub struct AppointmentStatusClient {
    api: Arc<ApiClient>,
    cache: Arc<ResponseCache<Appointment>>,
}

impl AppointmentStatusClient {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_cache(
            Arc::new(ApiClient::new(config)),
            Arc::new(ResponseCache::new(config.cache_ttl())),
        )
    }

    pub fn with_cache(api: Arc<ApiClient>, cache: Arc<ResponseCache<Appointment>>) -> Self {
        Self { api, cache }
    }

    pub fn cache(&self) -> &Arc<ResponseCache<Appointment>> {
        &self.cache
    }

    /// `PATCH /api/provider/appointments/{id}/status`
    #[instrument(skip(self, notes))]
    pub async fn update_status(
        &self,
        appointment_id: &AppointmentId,
        new_status: AppointmentStatus,
        notes: Option<String>,
    ) -> Result<Appointment, ApiError> {
        self.send_status_update(appointment_id, StatusUpdateRequest::new(new_status, notes))
            .await
    }

    pub async fn confirm(
        &self,
        appointment_id: &AppointmentId,
        notes: Option<String>,
    ) -> Result<Appointment, ApiError> {
        self.update_status(appointment_id, AppointmentStatus::Confirmed, notes).await
    }

    pub async fn start(
        &self,
        appointment_id: &AppointmentId,
        notes: Option<String>,
    ) -> Result<Appointment, ApiError> {
        self.update_status(appointment_id, AppointmentStatus::InProgress, notes).await
    }

    /// Cancels on the provider's behalf; `reason` is sent both as the notes
    /// and as the cancellation reason.
    #[instrument(skip(self, reason))]
    pub async fn cancel(
        &self,
        appointment_id: &AppointmentId,
        reason: Option<String>,
    ) -> Result<Appointment, ApiError> {
        self.send_status_update(appointment_id, StatusUpdateRequest::cancellation(reason))
            .await
    }

    pub async fn mark_no_show(
        &self,
        appointment_id: &AppointmentId,
        notes: Option<String>,
    ) -> Result<Appointment, ApiError> {
        self.update_status(appointment_id, AppointmentStatus::NoShow, notes).await
    }

    /// `POST /api/provider/appointments/{id}/complete`
    #[instrument(skip(self, request))]
    pub async fn complete(
        &self,
        appointment_id: &AppointmentId,
        request: CompleteAppointmentRequest,
    ) -> Result<Appointment, ApiError> {
        let path = format!("{}/complete", appointment_path(appointment_id));
        self.post_transition(appointment_id, &path, request.to_body(), COMPLETE_FAILED)
            .await
    }

    /// `POST /api/provider/appointments/{id}/reschedule-request/approve`
    #[instrument(skip(self, notes))]
    pub async fn accept_reschedule(
        &self,
        appointment_id: &AppointmentId,
        notes: Option<String>,
    ) -> Result<Appointment, ApiError> {
        let path = format!("{}/reschedule-request/approve", appointment_path(appointment_id));
        self.post_transition(appointment_id, &path, json!({ "notes": notes }), APPROVE_RESCHEDULE_FAILED)
            .await
    }

    /// `POST /api/provider/appointments/{id}/reschedule-request/decline`
    #[instrument(skip(self, notes))]
    pub async fn decline_reschedule(
        &self,
        appointment_id: &AppointmentId,
        notes: Option<String>,
    ) -> Result<Appointment, ApiError> {
        let path = format!("{}/reschedule-request/decline", appointment_path(appointment_id));
        self.post_transition(appointment_id, &path, json!({ "notes": notes }), DECLINE_RESCHEDULE_FAILED)
            .await
    }

    /// Runs a named action. `notes` doubles as the cancellation reason for
    /// [`StatusAction::Cancel`]; completion never raises an invoice here.
    pub async fn perform(
        &self,
        action: StatusAction,
        appointment_id: &AppointmentId,
        notes: Option<String>,
    ) -> Result<Appointment, ApiError> {
        match action {
            StatusAction::Confirm => self.confirm(appointment_id, notes).await,
            StatusAction::Start => self.start(appointment_id, notes).await,
            StatusAction::Complete => {
                let request = CompleteAppointmentRequest {
                    notes,
                    ..Default::default()
                };
                self.complete(appointment_id, request).await
            }
            StatusAction::Cancel => self.cancel(appointment_id, notes).await,
            StatusAction::MarkNoShow => self.mark_no_show(appointment_id, notes).await,
            StatusAction::AcceptReschedule => self.accept_reschedule(appointment_id, notes).await,
            StatusAction::DeclineReschedule => self.decline_reschedule(appointment_id, notes).await,
        }
    }

    pub async fn get_cached(&self, key: &str) -> Option<Appointment> {
        self.cache.get(key).await
    }

    pub async fn set_cached(&self, key: &str, value: Appointment) {
        self.cache.set(key, value).await
    }

    pub async fn clear_cache(&self, key: Option<&str>) {
        self.cache.clear(key).await
    }

    async fn send_status_update(
        &self,
        appointment_id: &AppointmentId,
        request: StatusUpdateRequest,
    ) -> Result<Appointment, ApiError> {
        let path = format!("{}/status", appointment_path(appointment_id));

        let result = self
            .api
            .patch(&path, &request.to_body())
            .await
            .and_then(|response| response.into_data::<Appointment>());

        match result {
            Ok(appointment) => {
                self.cache.invalidate(&appointment_id.cache_key()).await;
                info!(
                    "Appointment {} moved to {} (requested {})",
                    appointment_id, appointment.status, request.status
                );
                Ok(appointment)
            }
            Err(e) => {
                let err = e.into_api_error(UPDATE_STATUS_FAILED);
                warn!(
                    "Status update to {} for appointment {} failed: {}",
                    request.status, appointment_id, err
                );
                Err(err)
            }
        }
    }

    async fn post_transition(
        &self,
        appointment_id: &AppointmentId,
        path: &str,
        body: Value,
        default_message: &str,
    ) -> Result<Appointment, ApiError> {
        let result = self
            .api
            .post(path, &body)
            .await
            .and_then(|response| response.into_data::<Appointment>());

        match result {
            Ok(appointment) => {
                self.cache.invalidate(&appointment_id.cache_key()).await;
                info!("Appointment {} now {}", appointment_id, appointment.status);
                Ok(appointment)
            }
            Err(e) => {
                let err = e.into_api_error(default_message);
                warn!("Transition {} for appointment {} failed: {}", path, appointment_id, err);
                Err(err)
            }
        }
    }
}
