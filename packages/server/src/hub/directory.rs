//! Room directory trait.

use async_trait::async_trait;

use crate::domain::RoomName;

use super::{HubError, RoomHandle};

/// Lookup and lazy creation of rooms by name.
///
/// The dispatch use case depends on this trait rather than on the hub directly.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RoomDirectory: Send + Sync {
    /// Existing room, or `None`
    async fn find_room(&self, name: &RoomName) -> Result<Option<RoomHandle>, HubError>;

    /// Existing room, or a freshly spawned one. Exactly one room exists per name.
    async fn find_or_create_room(&self, name: &RoomName) -> Result<RoomHandle, HubError>;
}
