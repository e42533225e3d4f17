//! Connection, Room and Hub: the actors that route and fan out messages.
//!
//! Room and Hub state is owned by a single control-loop task each and mutated
//! only through commands sent over a bounded channel. Delivery into a
//! connection mailbox never awaits, so a stalled peer cannot stall a control loop.

pub mod connection;
pub mod directory;
pub mod error;
pub mod registry;
pub mod room;

pub use connection::{Connection, MailboxError, Outbox};
pub use directory::RoomDirectory;
pub use error::HubError;
pub use registry::HubHandle;
pub use room::{RoomHandle, RoomSnapshot};
