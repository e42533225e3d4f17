//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    domain::RoomName,
    hub::{RoomDirectory, RoomSnapshot},
    infrastructure::dto::{
        http::{RoomDetailDto, RoomSummaryDto},
        websocket::WordDto,
    },
    ui::state::AppState,
};
use whiteboard_shared::time::millis_to_rfc3339;

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Get list of rooms
pub async fn list_rooms(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<RoomSummaryDto>>, StatusCode> {
    let rooms = state.hub.list_rooms().await.map_err(|e| {
        tracing::error!("Failed to list rooms: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let mut summaries = Vec::with_capacity(rooms.len());
    for room in rooms {
        match room.snapshot().await {
            // Domain Model から DTO への変換
            Ok(snapshot) => summaries.push(RoomSummaryDto {
                name: snapshot.name.as_str().to_string(),
                members: snapshot.members.len(),
                words: snapshot.words.len(),
                created_at: millis_to_rfc3339(snapshot.created_at),
            }),
            Err(e) => tracing::warn!("Skipping room '{}': {}", room.name(), e),
        }
    }

    Ok(Json(summaries))
}

/// Get room detail by name
pub async fn get_room(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<RoomDetailDto>, StatusCode> {
    let name = RoomName::try_from(name).map_err(|_| StatusCode::NOT_FOUND)?;

    let room = match state.hub.find_room(&name).await {
        Ok(Some(room)) => room,
        Ok(None) => return Err(StatusCode::NOT_FOUND),
        Err(e) => {
            tracing::error!("Failed to look up room '{}': {}", name, e);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    let snapshot = room.snapshot().await.map_err(|e| {
        tracing::error!("Failed to read room '{}': {}", name, e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok(Json(room_detail(snapshot)))
}

fn room_detail(snapshot: RoomSnapshot) -> RoomDetailDto {
    RoomDetailDto {
        name: snapshot.name.as_str().to_string(),
        members: snapshot
            .members
            .into_iter()
            .map(|member| member.into_string())
            .collect(),
        words: snapshot.words.into_iter().map(WordDto::from).collect(),
        created_at: millis_to_rfc3339(snapshot.created_at),
    }
}
