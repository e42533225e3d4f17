//! Value objects.

use std::fmt;

use uuid::Uuid;

use super::ValueObjectError;

/// Opaque, unauthenticated identity supplied at handshake time.
///
/// Not unique: two connections may carry the same name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientName(String);

impl ClientName {
    pub fn new(name: String) -> Result<Self, ValueObjectError> {
        if name.is_empty() {
            return Err(ValueObjectError::EmptyClientName);
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for ClientName {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for ClientName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Name of a whiteboard room, the key of the room directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoomName(String);

impl RoomName {
    pub fn new(name: String) -> Result<Self, ValueObjectError> {
        if name.is_empty() {
            return Err(ValueObjectError::EmptyRoomName);
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RoomName {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for RoomName {
    type Error = ValueObjectError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value.to_string())
    }
}

impl fmt::Display for RoomName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a word, unique within a room.
///
/// Chosen by clients; any string (including the empty one) is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WordId(String);

impl WordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Process-unique key of a live connection.
///
/// Registries key on this instead of [`ClientName`], which is not unique.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_name_rejects_empty() {
        // テスト項目: 空のクライアント名は拒否される
        // given (前提条件):
        let empty = String::new();

        // when (操作):
        let result = ClientName::new(empty);

        // then (期待する結果):
        assert_eq!(result, Err(ValueObjectError::EmptyClientName));
    }

    #[test]
    fn test_client_name_keeps_opaque_value() {
        // テスト項目: クライアント名は加工されずにそのまま保持される
        // given (前提条件):
        let raw = " alice ".to_string();

        // when (操作):
        let name = ClientName::new(raw).unwrap();

        // then (期待する結果):
        assert_eq!(name.as_str(), " alice ");
    }

    #[test]
    fn test_room_name_rejects_empty() {
        // テスト項目: 空のルーム名は拒否される
        // given (前提条件):
        // when (操作):
        let result = RoomName::try_from("");

        // then (期待する結果):
        assert_eq!(result, Err(ValueObjectError::EmptyRoomName));
        assert_eq!(RoomName::try_from("board1").unwrap().as_str(), "board1");
    }

    #[test]
    fn test_connection_ids_are_unique() {
        // テスト項目: 同じ名前でも接続 ID は一意に生成される
        // given (前提条件):
        // when (操作):
        let first = ConnectionId::generate();
        let second = ConnectionId::generate();

        // then (期待する結果):
        assert_ne!(first, second);
    }
}
