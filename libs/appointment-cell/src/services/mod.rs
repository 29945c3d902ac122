pub mod cache;
pub mod lifecycle;
pub mod queries;
pub mod status;

pub use cache::{CacheGeneration, CacheStats, ResponseCache, DEFAULT_CACHE_TIMEOUT};
pub use lifecycle::AppointmentLifecycleService;
pub use queries::AppointmentQueryService;
pub use status::AppointmentStatusClient;
