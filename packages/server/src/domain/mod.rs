//! Domain models of the whiteboard relay.

pub mod error;
pub mod value_object;
pub mod word;

pub use error::ValueObjectError;
pub use value_object::{ClientName, ConnectionId, RoomName, WordId};
pub use word::{Word, WordBoard, WordEdit};
