use thiserror::Error;

#[derive(Debug, Error)]
pub enum GroupingError {
    #[error("invalid threshold {0}: expected a value within [0, 1]")]
    InvalidThreshold(f64),
    #[error("malformed input: {0}")]
    MalformedInput(String),
}

impl GroupingError {
    pub fn code(&self) -> &'static str {
        match self {
            GroupingError::InvalidThreshold(_) => "ConfigurationError",
            GroupingError::MalformedInput(_) => "MalformedInputError",
        }
    }
}

pub type GroupResult<T> = Result<T, GroupingError>;
