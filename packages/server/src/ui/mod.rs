//! WebSocket relay server: routing, connection loops and HTTP inspection endpoints.

pub mod error;
mod handler;
mod server;
mod signal;
pub mod state;

pub use error::ConnectionError;
pub use server::Server;
