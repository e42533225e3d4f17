//! HTTP API response DTOs.

use serde::Serialize;

use super::websocket::WordDto;

/// Room list entry
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummaryDto {
    pub name: String,
    /// Number of current members
    pub members: usize,
    /// Number of words on the board
    pub words: usize,
    /// RFC 3339 (UTC)
    pub created_at: String,
}

/// Room detail
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomDetailDto {
    pub name: String,
    /// Member names, not unique
    pub members: Vec<String>,
    pub words: Vec<WordDto>,
    /// RFC 3339 (UTC)
    pub created_at: String,
}
