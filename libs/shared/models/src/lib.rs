pub mod envelope;
pub mod error;

pub use envelope::{ApiEnvelope, ErrorBody, OperationOutcome};
pub use error::{ApiError, FieldErrors};
