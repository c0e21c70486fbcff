pub mod pending;
pub mod ride;
pub mod zone;

pub use pending::{PendingReturnRequest, ReturnMatch};
pub use ride::{Ride, RideDraft};
pub use zone::{Zone, ZoneId};

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Invalid {field}: {message}")]
    Validation { field: String, message: String },
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Prediction model unavailable: {0}")]
    ModelUnavailable(String),
    #[error("Store error: {0}")]
    Store(String),
}

impl CoreError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
