use crate::models::DatasetMetadata;

/// Whether a dataset is loaded, and its columns. `Loaded` always carries non-empty metadata.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Empty,
    Loaded(DatasetMetadata),
}

impl SessionState {
    pub fn reset(&mut self) {
        *self = SessionState::Empty;
    }

    /// Replaces the whole state with `metadata`. Empty metadata resets instead of loading.
    pub fn install(&mut self, metadata: DatasetMetadata) {
        *self = if metadata.is_empty() {
            tracing::warn!("Refusing to install dataset metadata without columns");
            SessionState::Empty
        } else {
            SessionState::Loaded(metadata)
        };
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, SessionState::Loaded(_))
    }

    pub fn metadata(&self) -> Option<&DatasetMetadata> {
        match self {
            SessionState::Loaded(metadata) => Some(metadata),
            SessionState::Empty => None,
        }
    }
}
