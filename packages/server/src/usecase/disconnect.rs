//! UseCase: 切断処理
//!
//! 受信ループの終了・強制クローズのどちらから呼ばれても安全な、冪等な後始末を行います。
//! 順序: Hub から登録解除 → 参加中の全ルームから登録解除 → メールボックスを閉じる。

use std::sync::Arc;

use crate::hub::{Connection, HubHandle, RoomDirectory};

/// 切断のユースケース
pub struct DisconnectUseCase {
    hub: HubHandle,
}

impl DisconnectUseCase {
    pub fn new(hub: HubHandle) -> Self {
        Self { hub }
    }

    /// 切断を実行する
    ///
    /// # Returns
    ///
    /// 後始末を実際に行った場合は `true`、既に切断済みなら `false`
    pub async fn execute(&self, connection: &Arc<Connection>) -> bool {
        if !connection.begin_disconnect() {
            tracing::debug!("Connection {} is already disconnected", connection.id());
            return false;
        }

        if let Err(e) = self.hub.unregister(connection.id()).await {
            tracing::warn!("Failed to unregister {} from hub: {}", connection.id(), e);
        }

        for room_name in connection.take_rooms().await {
            let room = match self.hub.find_room(&room_name).await {
                Ok(Some(room)) => room,
                Ok(None) => continue,
                Err(e) => {
                    tracing::warn!("Failed to look up room '{}': {}", room_name, e);
                    continue;
                }
            };
            if let Err(e) = room.unregister(connection.id()).await {
                tracing::warn!(
                    "Failed to unregister {} from room '{}': {}",
                    connection.id(),
                    room_name,
                    e
                );
            }
        }

        connection.close();
        tracing::info!(
            "Client '{}' ({}) disconnected",
            connection.name(),
            connection.id()
        );
        true
    }
}
