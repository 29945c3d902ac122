// libs/appointment-cell/src/services/queries.rs
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use shared_config::AppConfig;
use shared_http::{ApiClient, QueryParams};
use shared_models::ApiError;

use crate::models::{
    Appointment, AppointmentFilter, AppointmentId, AppointmentPage, DashboardSection,
    DashboardStats, APPOINTMENTS_PATH, FETCH_APPOINTMENTS_FAILED, FETCH_APPOINTMENT_FAILED,
    FETCH_DASHBOARD_FAILED, FETCH_STATS_FAILED, FETCH_TODAY_FAILED,
};
use crate::services::cache::ResponseCache;
use crate::services::status::appointment_path;

/// Read side of the provider appointment API.
///
/// List endpoints degrade to empty results when the payload is unreadable.
/// Single-appointment reads go through the shared cache.
pub struct AppointmentQueryService {
    api: Arc<ApiClient>,
    cache: Arc<ResponseCache<Appointment>>,
}

impl AppointmentQueryService {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_cache(
            Arc::new(ApiClient::new(config)),
            Arc::new(ResponseCache::new(config.cache_ttl())),
        )
    }

    pub fn with_cache(api: Arc<ApiClient>, cache: Arc<ResponseCache<Appointment>>) -> Self {
        Self { api, cache }
    }

    #[instrument(skip(self))]
    pub async fn list_appointments(
        &self,
        filter: &AppointmentFilter,
    ) -> Result<AppointmentPage, ApiError> {
        let response = self
            .api
            .get(APPOINTMENTS_PATH, &filter.to_query())
            .await
            .map_err(|e| e.into_api_error(FETCH_APPOINTMENTS_FAILED))?;

        let page = AppointmentPage::from_data(response.data);
        debug!("Fetched {} appointments (page {} of {})", page.items.len(), page.current_page, page.last_page);
        Ok(page)
    }

    pub async fn today_appointments(&self) -> Result<Vec<Appointment>, ApiError> {
        let path = format!("{}/today", APPOINTMENTS_PATH);
        self.fetch_list(&path, FETCH_TODAY_FAILED).await
    }

    pub async fn dashboard(&self, section: DashboardSection) -> Result<Vec<Appointment>, ApiError> {
        let path = format!("{}/dashboard/{}", APPOINTMENTS_PATH, section.as_str());
        self.fetch_list(&path, FETCH_DASHBOARD_FAILED).await
    }

    pub async fn dashboard_stats(&self) -> Result<DashboardStats, ApiError> {
        let path = format!("{}/dashboard/stats", APPOINTMENTS_PATH);
        let response = self
            .api
            .get(&path, &QueryParams::new())
            .await
            .map_err(|e| e.into_api_error(FETCH_STATS_FAILED))?;

        Ok(response.into_data::<DashboardStats>().unwrap_or_else(|e| {
            warn!("Unreadable dashboard stats, using empty counters: {}", e);
            DashboardStats::default()
        }))
    }

    /// Cached read. Falls through to [`Self::fetch_appointment`] when the
    /// entry is missing or stale.
    pub async fn get_appointment(&self, appointment_id: &AppointmentId) -> Result<Appointment, ApiError> {
        if let Some(cached) = self.cache.get(&appointment_id.cache_key()).await {
            return Ok(cached);
        }
        self.fetch_appointment(appointment_id).await
    }

    /// Always asks the server, then refreshes the cache unless the
    /// appointment was invalidated while the request was in flight.
    #[instrument(skip(self))]
    pub async fn fetch_appointment(&self, appointment_id: &AppointmentId) -> Result<Appointment, ApiError> {
        let key = appointment_id.cache_key();
        let generation = self.cache.generation(&key).await;

        let appointment = self
            .api
            .get(&appointment_path(appointment_id), &QueryParams::new())
            .await
            .and_then(|response| response.into_data::<Appointment>())
            .map_err(|e| e.into_api_error(FETCH_APPOINTMENT_FAILED))?;

        if !self.cache.set_if_current(&key, appointment.clone(), generation).await {
            debug!("Appointment {} changed while being fetched, not caching", appointment_id);
        }

        Ok(appointment)
    }

    async fn fetch_list(&self, path: &str, default_message: &str) -> Result<Vec<Appointment>, ApiError> {
        let response = self
            .api
            .get(path, &QueryParams::new())
            .await
            .map_err(|e| e.into_api_error(default_message))?;

        Ok(AppointmentPage::from_data(response.data).items)
    }
}
