use thiserror::Error;

/// Terminal fetch failures. Negotiable conditions (a rejected parameter with
/// a server-proposed alternative) are not errors; they travel through the
/// reply enums in `backend` and surface as `ValidationOutcome::Rejected`.
#[derive(Error, Debug)]
pub enum FetchError {
    /// The request never completed: connection refused, timeout, bad payload.
    #[error("request failed: {0}")]
    Transport(String),

    /// The backend understood the request and refused it without offering an
    /// actionable alternative.
    #[error("backend rejected request: {0}")]
    ServerRejected(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        FetchError::Transport(err.to_string())
    }
}
