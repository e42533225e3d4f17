//! Hub and Room errors.

use thiserror::Error;

/// Raised when an actor's control loop is no longer running.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HubError {
    #[error("hub control loop has stopped")]
    HubStopped,

    #[error("control loop of room '{0}' has stopped")]
    RoomStopped(String),
}
