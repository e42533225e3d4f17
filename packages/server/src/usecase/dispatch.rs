//! UseCase: 受信メッセージの振り分け
//!
//! 受信したエンベロープを種別ごとに処理します。
//!
//! | 種別 | 前提 | 効果 |
//! |---|---|---|
//! | `add` / `move` | ルームが存在する | word を upsert し、送信者以外にブロードキャスト |
//! | `delete` | ルームが存在する | word を削除し、送信者以外にブロードキャスト |
//! | `get` | ルームが存在する | ルームの word 一覧を送信者にだけ返す |
//! | `join` | なし | ルームを検索または作成し、メンバーに追加 |
//! | `leave` | 送信者がメンバー | メンバーから削除 |
//!
//! 宛先ルームが見つからない場合は何も返さずに破棄します。

use std::sync::Arc;

use crate::{
    domain::{RoomName, Word, WordEdit, WordId},
    hub::{Connection, HubError, RoomDirectory},
    infrastructure::dto::websocket::{Envelope, MessageType, WordDto, WordListMessage},
};

/// メッセージ振り分けのユースケース
pub struct DispatchUseCase {
    directory: Arc<dyn RoomDirectory>,
}

impl DispatchUseCase {
    pub fn new(directory: Arc<dyn RoomDirectory>) -> Self {
        Self { directory }
    }

    /// エンベロープを 1 つ処理する
    ///
    /// # Errors
    ///
    /// Hub またはルームの制御ループが停止している場合のみ `HubError` を返す。
    /// ルーティングの失敗（ルームが無いなど）はエラーにしない。
    pub async fn execute(
        &self,
        connection: &Arc<Connection>,
        envelope: Envelope,
    ) -> Result<(), HubError> {
        match envelope.r#type {
            MessageType::Add | MessageType::Move => {
                let Some(word) = envelope.word.clone() else {
                    tracing::debug!("Dropping {:?} without a word", envelope.r#type);
                    return Ok(());
                };
                self.edit(connection, WordEdit::Upsert(Word::from(word)), envelope)
                    .await
            }
            MessageType::Delete => {
                let Some(word) = envelope.word.as_ref() else {
                    tracing::debug!("Dropping delete without a word");
                    return Ok(());
                };
                let id = WordId::new(word.id.clone());
                self.edit(connection, WordEdit::Remove(id), envelope).await
            }
            MessageType::Get => self.send_inventory(connection, &envelope).await,
            MessageType::Join => self.join(connection, &envelope).await,
            MessageType::Leave => self.leave(connection, &envelope).await,
            MessageType::Unknown => {
                tracing::debug!("Ignoring envelope of unknown type from {}", connection.id());
                Ok(())
            }
        }
    }

    async fn edit(
        &self,
        connection: &Arc<Connection>,
        edit: WordEdit,
        envelope: Envelope,
    ) -> Result<(), HubError> {
        let Some(name) = target_room(&envelope) else {
            return Ok(());
        };
        match self.directory.find_room(&name).await? {
            Some(room) => room.apply_edit(edit, envelope, connection.id()).await,
            None => {
                tracing::debug!("Room '{}' not found, dropping edit", name);
                Ok(())
            }
        }
    }

    async fn send_inventory(
        &self,
        connection: &Arc<Connection>,
        envelope: &Envelope,
    ) -> Result<(), HubError> {
        let Some(name) = target_room(envelope) else {
            return Ok(());
        };
        let Some(room) = self.directory.find_room(&name).await? else {
            tracing::debug!("Room '{}' not found, dropping get", name);
            return Ok(());
        };

        let words: Vec<WordDto> = room
            .inventory()
            .await?
            .into_iter()
            .map(WordDto::from)
            .collect();
        let count = words.len();
        match WordListMessage::new(words).encode() {
            Ok(payload) => {
                if let Err(e) = connection.deliver(payload) {
                    tracing::warn!("Failed to deliver word list: {}", e);
                } else {
                    tracing::debug!("Sent {} words of '{}' to {}", count, name, connection.id());
                }
            }
            Err(e) => tracing::error!("Failed to serialize word list: {}", e),
        }
        Ok(())
    }

    async fn join(&self, connection: &Arc<Connection>, envelope: &Envelope) -> Result<(), HubError> {
        let Some(name) = target_room(envelope) else {
            return Ok(());
        };
        let room = self.directory.find_or_create_room(&name).await?;
        if !connection.remember_room(name.clone()).await {
            tracing::debug!("{} is already a member of '{}'", connection.id(), name);
            return Ok(());
        }
        room.register(connection.clone()).await
    }

    async fn leave(
        &self,
        connection: &Arc<Connection>,
        envelope: &Envelope,
    ) -> Result<(), HubError> {
        let Some(name) = target_room(envelope) else {
            return Ok(());
        };
        if !connection.forget_room(&name).await {
            tracing::debug!("{} is not a member of '{}'", connection.id(), name);
            return Ok(());
        }
        match self.directory.find_room(&name).await? {
            Some(room) => room.unregister(connection.id()).await,
            None => Ok(()),
        }
    }
}

fn target_room(envelope: &Envelope) -> Option<RoomName> {
    let target = envelope.target.clone()?;
    match RoomName::new(target) {
        Ok(name) => Some(name),
        Err(e) => {
            tracing::debug!("Dropping {:?}: {}", envelope.r#type, e);
            None
        }
    }
}
