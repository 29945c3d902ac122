pub mod client;
pub mod error;

pub use client::{ApiClient, ApiResponse, QueryParams};
pub use error::TransportError;
