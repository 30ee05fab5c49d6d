use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    /// Every category failed, or the source answered with nothing at all
    #[error("external source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("no stories available")]
    NoStoriesAvailable,

    #[error("no stories to pick from")]
    EmptyPool,

    #[error("no story found")]
    NoExternalStory,

    #[error("{message}")]
    InvalidInput {
        field: &'static str,
        message: String,
    },

    #[error("failed to generate audio: {0}")]
    ConversionFailure(String),
}

impl ServiceError {
    pub fn required(field: &'static str) -> Self {
        ServiceError::InvalidInput {
            field,
            message: format!("{} is required", field),
        }
    }

    /// HTTP-class status for the request layer
    pub fn status(&self) -> u16 {
        match self {
            ServiceError::InvalidInput { .. } => 400,
            ServiceError::NoStoriesAvailable
            | ServiceError::EmptyPool
            | ServiceError::NoExternalStory => 404,
            ServiceError::SourceUnavailable(_) => 502,
            ServiceError::ConversionFailure(_) => 500,
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
