use thiserror::Error;

#[derive(Debug, Error)]
pub enum DashboardError {
    /// Rejected locally before any network call.
    #[error("Validation error: {0}")]
    Validation(String),
    /// The backend answered with an `error` field.
    #[error("Server error: {0}")]
    Server(String),
    #[error("Transport error: {0}")]
    Transport(String),
    /// A request of the same kind is still outstanding.
    #[error("{0} already in progress")]
    Busy(&'static str),
    #[error("Export error: {0}")]
    Export(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DashboardError {
    pub fn is_validation(&self) -> bool {
        matches!(self, DashboardError::Validation(_))
    }
}

impl From<reqwest::Error> for DashboardError {
    fn from(err: reqwest::Error) -> Self {
        DashboardError::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for DashboardError {
    fn from(err: serde_json::Error) -> Self {
        DashboardError::Transport(err.to_string())
    }
}

pub type Result<T, E = DashboardError> = std::result::Result<T, E>;
