//! Connection termination reasons.

use std::time::Duration;

use thiserror::Error;

use crate::hub::HubError;

/// Why a connection loop ended abnormally.
///
/// Every variant is terminal for one connection only.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("failed to receive frame: {0}")]
    Receive(#[source] axum::Error),

    #[error("failed to send frame: {0}")]
    Send(#[source] axum::Error),

    #[error("no frame received within {0:?}")]
    ReadTimeout(Duration),

    #[error("write did not complete within {0:?}")]
    WriteTimeout(Duration),

    #[error("malformed envelope: {0}")]
    Decode(#[from] serde_json::Error),

    #[error(transparent)]
    Hub(#[from] HubError),
}
