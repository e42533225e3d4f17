//! Shared utilities for the whiteboard relay packages.

pub mod logger;
pub mod time;
