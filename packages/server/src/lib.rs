//! Real-time fan-out relay for a multi-room collaborative whiteboard.
//!
//! Clients connect over WebSocket, join named rooms and exchange word edit
//! events that are mirrored to every other member of the same room.

// layers
pub mod domain;
pub mod hub;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

pub mod config;
