use crate::session::SessionState;

/// Errors that can occur when driving a tracking camera session.
#[derive(Debug, thiserror::Error)]
pub enum VitrackError {
    #[error("no tracking device matched serial filter {0:?}")]
    DeviceNotFound(String),

    #[error("{operation} not allowed while session is {state:?}")]
    InvalidStateTransition {
        operation: &'static str,
        state: SessionState,
    },

    #[error("sensor driver error: {0}")]
    Driver(String),

    #[error("map file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("map file {0} is empty")]
    EmptyMapFile(String),

    #[error("map export failed: {0}")]
    MapExportFailed(String),

    #[error("map import failed: {0}")]
    MapImportFailed(String),

    #[error("failed to restart streaming after map import")]
    RestartFailed(#[source] Box<VitrackError>),

    #[error("output channel disconnected")]
    ChannelDisconnected,
}
