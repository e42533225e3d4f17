//! UseCase: 接続確立処理
//!
//! ハンドシェイク済みのクライアントに対して Connection を生成し、Hub に登録します。

use std::sync::Arc;

use crate::{
    domain::ClientName,
    hub::{Connection, HubError, HubHandle, Outbox},
};

/// 接続確立のユースケース
pub struct ConnectUseCase {
    hub: HubHandle,
    /// Connection ごとのメールボックス容量
    mailbox_capacity: usize,
}

impl ConnectUseCase {
    pub fn new(hub: HubHandle, mailbox_capacity: usize) -> Self {
        Self {
            hub,
            mailbox_capacity,
        }
    }

    /// Connection を生成して Hub に登録する
    ///
    /// # Returns
    ///
    /// * `Ok((Arc<Connection>, Outbox))` - 登録済みの Connection と、送信ループが消費する Outbox
    /// * `Err(HubError)` - Hub が停止している
    pub async fn execute(&self, name: ClientName) -> Result<(Arc<Connection>, Outbox), HubError> {
        let (connection, outbox) = Connection::new(name, self.mailbox_capacity);
        self.hub.register(connection.clone()).await?;

        tracing::info!(
            "Client '{}' connected as {}",
            connection.name(),
            connection.id()
        );
        Ok((connection, outbox))
    }
}
