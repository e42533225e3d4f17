//! Domain errors.

use thiserror::Error;

/// Value object validation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    /// Client name must not be empty
    #[error("client name must not be empty")]
    EmptyClientName,

    /// Room name must not be empty
    #[error("room name must not be empty")]
    EmptyRoomName,
}
