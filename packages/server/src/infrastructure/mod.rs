//! Infrastructure layer: wire formats exchanged with clients.

pub mod dto;
