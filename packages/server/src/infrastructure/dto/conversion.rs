//! Conversion logic between DTOs and domain entities.

use crate::domain::{Word, WordId};
use crate::infrastructure::dto::websocket as dto;

// ========================================
// DTO → Domain Entity
// ========================================

impl From<dto::WordDto> for Word {
    fn from(dto: dto::WordDto) -> Self {
        Self {
            id: WordId::new(dto.id),
            content: dto.word,
            x: dto.x_value,
            y: dto.y_value,
            dx: dto.delta_x,
            dy: dto.delta_y,
        }
    }
}

// ========================================
// Domain Entity → DTO
// ========================================

impl From<Word> for dto::WordDto {
    fn from(model: Word) -> Self {
        Self {
            word: model.content,
            x_value: model.x,
            y_value: model.y,
            delta_x: model.dx,
            delta_y: model.dy,
            id: model.id.as_str().to_string(),
        }
    }
}
