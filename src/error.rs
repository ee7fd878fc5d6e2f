use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON Error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Validation Error: {0}")]
    Validation(String),

    #[error("Unknown problem: {0}")]
    UnknownProblem(String),
}

#[derive(Error, Debug)]
pub enum SubmitError {
    #[error("HTTP Error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server (or local store) refused the attempt, e.g. the anti-cheat threshold.
    #[error("Attempt rejected: {0}")]
    Rejected(String),

    #[error("Unexpected status: {0}")]
    Status(u16),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type StoreResult<T> = Result<T, StoreError>;
