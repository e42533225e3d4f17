//! Word entity and the per-room word board.

use std::collections::HashMap;

use super::WordId;

/// A positioned, movable whiteboard unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    pub id: WordId,
    /// Opaque content rendered by clients
    pub content: String,
    pub x: i64,
    pub y: i64,
    /// Relative move applied by clients, stored as sent
    pub dx: i64,
    pub dy: i64,
}

/// A mutation of a room's word board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WordEdit {
    /// `add` and `move`: insert, or overwrite the word with the same id
    Upsert(Word),
    /// `delete`
    Remove(WordId),
}

/// Word state of one room, keyed by word id.
#[derive(Debug, Clone, Default)]
pub struct WordBoard {
    words: HashMap<WordId, Word>,
}

impl WordBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply an edit. Returns `false` only when removing an unknown id.
    pub fn apply(&mut self, edit: WordEdit) -> bool {
        match edit {
            WordEdit::Upsert(word) => {
                self.words.insert(word.id.clone(), word);
                true
            }
            WordEdit::Remove(id) => self.words.remove(&id).is_some(),
        }
    }

    pub fn get(&self, id: &WordId) -> Option<&Word> {
        self.words.get(id)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// All words, ordered by id so repeated reads are stable.
    pub fn inventory(&self) -> Vec<Word> {
        let mut words: Vec<Word> = self.words.values().cloned().collect();
        words.sort_by(|a, b| a.id.cmp(&b.id));
        words
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(id: &str, x: i64, y: i64) -> Word {
        Word {
            id: WordId::new(id),
            content: format!("content-{id}"),
            x,
            y,
            dx: 0,
            dy: 0,
        }
    }

    #[test]
    fn test_upsert_then_move_keeps_identifier() {
        // テスト項目: 同じ id の move は位置だけを更新し、id は変わらない
        // given (前提条件):
        let mut board = WordBoard::new();
        board.apply(WordEdit::Upsert(word("w1", 10, 20)));

        // when (操作):
        let mut moved = word("w1", 30, 40);
        moved.dx = 20;
        moved.dy = 20;
        board.apply(WordEdit::Upsert(moved));

        // then (期待する結果):
        assert_eq!(board.len(), 1);
        let stored = board.get(&WordId::new("w1")).unwrap();
        assert_eq!(stored.id.as_str(), "w1");
        assert_eq!((stored.x, stored.y, stored.dx, stored.dy), (30, 40, 20, 20));
    }

    #[test]
    fn test_remove_deletes_from_inventory() {
        // テスト項目: delete した word はインベントリから消える
        // given (前提条件):
        let mut board = WordBoard::new();
        board.apply(WordEdit::Upsert(word("w1", 1, 1)));
        board.apply(WordEdit::Upsert(word("w2", 2, 2)));

        // when (操作):
        let removed = board.apply(WordEdit::Remove(WordId::new("w1")));

        // then (期待する結果):
        assert!(removed);
        let ids: Vec<_> = board.inventory().into_iter().map(|w| w.id).collect();
        assert_eq!(ids, vec![WordId::new("w2")]);
    }

    #[test]
    fn test_remove_unknown_id_is_noop() {
        // テスト項目: 存在しない id の delete は何も変更しない
        // given (前提条件):
        let mut board = WordBoard::new();
        board.apply(WordEdit::Upsert(word("w1", 1, 1)));

        // when (操作):
        let removed = board.apply(WordEdit::Remove(WordId::new("missing")));

        // then (期待する結果):
        assert!(!removed);
        assert_eq!(board.len(), 1);
    }

    #[test]
    fn test_inventory_is_ordered_by_id() {
        // テスト項目: インベントリは id 順で返される
        // given (前提条件):
        let mut board = WordBoard::new();
        for id in ["c", "a", "b"] {
            board.apply(WordEdit::Upsert(word(id, 0, 0)));
        }

        // when (操作):
        let inventory = board.inventory();

        // then (期待する結果):
        let ids: Vec<&str> = inventory.iter().map(|w| w.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }
}
