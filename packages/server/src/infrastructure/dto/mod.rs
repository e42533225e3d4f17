//! Data Transfer Objects (DTOs) for the whiteboard relay.
//!
//! DTOs are organized by protocol:
//! - `websocket`: WebSocket envelopes
//! - `http`: HTTP inspection API responses

pub mod conversion;
pub mod http;
pub mod websocket;
