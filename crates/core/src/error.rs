use thiserror::Error;

/// Core domain errors
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Malformed score map: {source}")]
    MalformedScoreMap { source: serde_json::Error },

    #[error("Score map is not an object: found {found}")]
    ScoreMapNotObject { found: &'static str },

    #[error("Score control not found: {field}")]
    ControlNotFound { field: String },
}

pub type Result<T> = std::result::Result<T, CoreError>;
