//! Room actor: member set and word board of one whiteboard session.

use std::{collections::HashMap, sync::Arc};

use tokio::sync::{mpsc, oneshot};
use whiteboard_shared::time::now_millis;

use crate::{
    domain::{ClientName, ConnectionId, RoomName, Word, WordBoard, WordEdit},
    infrastructure::dto::websocket::Envelope,
};

use super::{
    HubError,
    connection::{Connection, fan_out},
};

/// A command received by a room's control loop.
#[derive(Debug)]
pub(crate) enum RoomCommand {
    /// Announce the connection to existing members, then add it.
    Register { connection: Arc<Connection> },

    /// Remove a member. Unknown ids are ignored.
    Unregister { connection_id: ConnectionId },

    /// Serialize once and deliver to every member except `exclude`.
    Broadcast {
        envelope: Envelope,
        exclude: Option<ConnectionId>,
    },

    /// Deliver a pre-serialized payload to every member.
    Emit { payload: String },

    /// Apply a word edit, then broadcast `envelope` to everyone except `from`.
    Edit {
        edit: WordEdit,
        envelope: Envelope,
        from: ConnectionId,
    },

    Inventory {
        res_tx: oneshot::Sender<Vec<Word>>,
    },

    Snapshot {
        res_tx: oneshot::Sender<RoomSnapshot>,
    },
}

/// Point-in-time view of a room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomSnapshot {
    pub name: RoomName,
    /// Unix milliseconds (UTC)
    pub created_at: i64,
    /// Member names, sorted
    pub members: Vec<ClientName>,
    pub words: Vec<Word>,
}

struct RoomActor {
    name: RoomName,
    created_at: i64,
    members: HashMap<ConnectionId, Arc<Connection>>,
    board: WordBoard,
    cmd_rx: mpsc::Receiver<RoomCommand>,
}

impl RoomActor {
    async fn run(mut self) {
        tracing::debug!("Room '{}' control loop started", self.name);
        while let Some(cmd) = self.cmd_rx.recv().await {
            self.process_command(cmd);
        }
        tracing::debug!("Room '{}' control loop stopped", self.name);
    }

    fn process_command(&mut self, cmd: RoomCommand) {
        match cmd {
            RoomCommand::Register { connection } => self.register(connection),
            RoomCommand::Unregister { connection_id } => {
                if self.members.remove(&connection_id).is_some() {
                    tracing::info!(
                        "Connection {} left room '{}' ({} members)",
                        connection_id,
                        self.name,
                        self.members.len()
                    );
                }
            }
            RoomCommand::Broadcast { envelope, exclude } => self.broadcast(&envelope, exclude),
            RoomCommand::Emit { payload } => {
                fan_out(self.members.values(), &payload, None);
            }
            RoomCommand::Edit {
                edit,
                envelope,
                from,
            } => {
                if !self.board.apply(edit) {
                    tracing::debug!("Room '{}': delete of an unknown word", self.name);
                }
                self.broadcast(&envelope, Some(from));
            }
            RoomCommand::Inventory { res_tx } => {
                let _ = res_tx.send(self.board.inventory());
            }
            RoomCommand::Snapshot { res_tx } => {
                let mut members: Vec<ClientName> =
                    self.members.values().map(|c| c.name().clone()).collect();
                members.sort_by(|a, b| a.as_str().cmp(b.as_str()));
                let _ = res_tx.send(RoomSnapshot {
                    name: self.name.clone(),
                    created_at: self.created_at,
                    members,
                    words: self.board.inventory(),
                });
            }
        }
    }

    fn register(&mut self, connection: Arc<Connection>) {
        // announce before inserting so the joiner does not receive its own notification
        let notification = Envelope::join_notification(connection.name().as_str(), self.name.as_str());
        self.broadcast(&notification, Some(connection.id()));

        tracing::info!(
            "'{}' ({}) joined room '{}' ({} members)",
            connection.name(),
            connection.id(),
            self.name,
            self.members.len() + 1
        );
        self.members.insert(connection.id(), connection);
    }

    fn broadcast(&self, envelope: &Envelope, exclude: Option<ConnectionId>) {
        let payload = match envelope.encode() {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!("Room '{}': failed to serialize envelope: {}", self.name, e);
                return;
            }
        };
        let delivered = fan_out(self.members.values(), &payload, exclude);
        tracing::debug!(
            "Room '{}': broadcast {:?} to {} members",
            self.name,
            envelope.r#type,
            delivered
        );
    }
}

/// Handle to a running room actor. Cheap to clone.
#[derive(Debug, Clone)]
pub struct RoomHandle {
    name: RoomName,
    cmd_tx: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    /// Start a room's control loop on the current runtime.
    pub fn spawn(name: RoomName, command_capacity: usize) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel(command_capacity);
        let actor = RoomActor {
            name: name.clone(),
            created_at: now_millis(),
            members: HashMap::new(),
            board: WordBoard::new(),
            cmd_rx,
        };
        tokio::spawn(actor.run());
        Self { name, cmd_tx }
    }

    pub fn name(&self) -> &RoomName {
        &self.name
    }

    async fn send(&self, cmd: RoomCommand) -> Result<(), HubError> {
        self.cmd_tx
            .send(cmd)
            .await
            .map_err(|_| HubError::RoomStopped(self.name.to_string()))
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> RoomCommand,
    ) -> Result<T, HubError> {
        let (res_tx, res_rx) = oneshot::channel();
        self.send(make(res_tx)).await?;
        res_rx
            .await
            .map_err(|_| HubError::RoomStopped(self.name.to_string()))
    }

    pub async fn register(&self, connection: Arc<Connection>) -> Result<(), HubError> {
        self.send(RoomCommand::Register { connection }).await
    }

    pub async fn unregister(&self, connection_id: ConnectionId) -> Result<(), HubError> {
        self.send(RoomCommand::Unregister { connection_id }).await
    }

    pub async fn broadcast(
        &self,
        envelope: Envelope,
        exclude: Option<ConnectionId>,
    ) -> Result<(), HubError> {
        self.send(RoomCommand::Broadcast { envelope, exclude }).await
    }

    pub async fn emit(&self, payload: String) -> Result<(), HubError> {
        self.send(RoomCommand::Emit { payload }).await
    }

    pub async fn apply_edit(
        &self,
        edit: WordEdit,
        envelope: Envelope,
        from: ConnectionId,
    ) -> Result<(), HubError> {
        self.send(RoomCommand::Edit {
            edit,
            envelope,
            from,
        })
        .await
    }

    /// Current words, ordered by id.
    pub async fn inventory(&self) -> Result<Vec<Word>, HubError> {
        self.request(|res_tx| RoomCommand::Inventory { res_tx }).await
    }

    pub async fn snapshot(&self) -> Result<RoomSnapshot, HubError> {
        self.request(|res_tx| RoomCommand::Snapshot { res_tx }).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::WordId,
        hub::Outbox,
        infrastructure::dto::websocket::{MessageType, WordDto},
    };

    fn room(name: &str) -> RoomHandle {
        RoomHandle::spawn(RoomName::try_from(name).unwrap(), 16)
    }

    fn connection(name: &str) -> (Arc<Connection>, Outbox) {
        Connection::new(ClientName::new(name.to_string()).unwrap(), 16)
    }

    fn add_envelope(id: &str, x: i64, y: i64) -> (WordEdit, Envelope) {
        let dto = WordDto {
            word: "hello".to_string(),
            x_value: x,
            y_value: y,
            id: id.to_string(),
            ..Default::default()
        };
        let envelope = Envelope {
            r#type: MessageType::Add,
            word: Some(dto.clone()),
            client_id: None,
            target: Some("board1".to_string()),
        };
        (WordEdit::Upsert(dto.into()), envelope)
    }

    fn recv_envelope(outbox: &mut Outbox) -> Envelope {
        let payload = outbox.mailbox.try_recv().expect("a queued message");
        Envelope::decode(&payload).unwrap()
    }

    #[tokio::test]
    async fn test_register_notifies_existing_members_only() {
        // テスト項目: join 通知は既存メンバーにのみ届き、参加者本人には届かない
        // given (前提条件):
        let room = room("board1");
        let (alice, mut alice_outbox) = connection("alice");
        let (bob, mut bob_outbox) = connection("bob");
        room.register(alice).await.unwrap();

        // when (操作):
        room.register(bob).await.unwrap();
        let snapshot = room.snapshot().await.unwrap();

        // then (期待する結果):
        assert_eq!(snapshot.members.len(), 2);
        let notification = recv_envelope(&mut alice_outbox);
        assert_eq!(notification.r#type, MessageType::Join);
        assert_eq!(notification.client_id.as_deref(), Some("bob"));
        assert!(bob_outbox.mailbox.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_edit_is_broadcast_to_others_and_stored() {
        // テスト項目: add は送信者以外に配送され、ルームの word に保存される
        // given (前提条件):
        let room = room("board1");
        let (alice, mut alice_outbox) = connection("alice");
        let (bob, mut bob_outbox) = connection("bob");
        room.register(alice.clone()).await.unwrap();
        room.register(bob.clone()).await.unwrap();
        room.inventory().await.unwrap();
        let _ = recv_envelope(&mut alice_outbox); // bob's join

        // when (操作):
        let (edit, envelope) = add_envelope("w1", 10, 20);
        room.apply_edit(edit, envelope.clone(), alice.id())
            .await
            .unwrap();
        let inventory = room.inventory().await.unwrap();

        // then (期待する結果):
        assert_eq!(recv_envelope(&mut bob_outbox), envelope);
        assert!(alice_outbox.mailbox.try_recv().is_err());
        assert_eq!(inventory.len(), 1);
        assert_eq!(inventory[0].id, WordId::new("w1"));
        assert_eq!((inventory[0].x, inventory[0].y), (10, 20));
    }

    #[tokio::test]
    async fn test_edit_from_non_member_is_broadcast() {
        // テスト項目: メンバーでない接続からの編集もルームが存在すればブロードキャストされる
        // given (前提条件):
        let room = room("board1");
        let (member, mut member_outbox) = connection("member");
        let (outsider, _outsider_outbox) = connection("outsider");
        room.register(member).await.unwrap();

        // when (操作):
        let (edit, envelope) = add_envelope("w1", 5, 5);
        room.apply_edit(edit, envelope.clone(), outsider.id())
            .await
            .unwrap();
        room.inventory().await.unwrap();

        // then (期待する結果):
        assert_eq!(recv_envelope(&mut member_outbox), envelope);
    }

    #[tokio::test]
    async fn test_delete_removes_word() {
        // テスト項目: delete で word がルームから削除される
        // given (前提条件):
        let room = room("board1");
        let (alice, _alice_outbox) = connection("alice");
        let (edit, envelope) = add_envelope("w1", 1, 2);
        room.apply_edit(edit, envelope, alice.id()).await.unwrap();

        // when (操作):
        let delete = Envelope {
            r#type: MessageType::Delete,
            ..Default::default()
        };
        room.apply_edit(WordEdit::Remove(WordId::new("w1")), delete, alice.id())
            .await
            .unwrap();

        // then (期待する結果):
        assert!(room.inventory().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unregister_unknown_member_is_noop() {
        // テスト項目: 存在しないメンバーの登録解除はエラーにならない（二重切断対策）
        // given (前提条件):
        let room = room("board1");
        let (alice, _alice_outbox) = connection("alice");
        room.register(alice.clone()).await.unwrap();
        room.unregister(alice.id()).await.unwrap();

        // when (操作):
        let result = room.unregister(alice.id()).await;

        // then (期待する結果):
        assert!(result.is_ok());
        assert!(room.snapshot().await.unwrap().members.is_empty());
    }

    #[tokio::test]
    async fn test_emit_reaches_every_member() {
        // テスト項目: emit は除外なしで全メンバーに配送される
        // given (前提条件):
        let room = room("board1");
        let (alice, mut alice_outbox) = connection("alice");
        let (bob, mut bob_outbox) = connection("bob");
        room.register(alice).await.unwrap();
        room.register(bob).await.unwrap();
        room.inventory().await.unwrap();
        let _ = alice_outbox.mailbox.try_recv(); // bob's join

        // when (操作):
        room.emit("notice".to_string()).await.unwrap();
        room.inventory().await.unwrap();

        // then (期待する結果):
        assert_eq!(alice_outbox.mailbox.try_recv().ok().as_deref(), Some("notice"));
        assert_eq!(bob_outbox.mailbox.try_recv().ok().as_deref(), Some("notice"));
    }

    #[tokio::test]
    async fn test_slow_member_does_not_block_room() {
        // テスト項目: メールボックスが満杯のメンバーがいてもルームの処理は止まらない
        // given (前提条件):
        let room = room("board1");
        let (slow, _slow_outbox) = Connection::new(ClientName::new("slow".to_string()).unwrap(), 1);
        let (alice, _alice_outbox) = connection("alice");
        room.register(slow.clone()).await.unwrap();

        // when (操作):
        for i in 0..4 {
            let (edit, envelope) = add_envelope(&format!("w{i}"), i, i);
            room.apply_edit(edit, envelope, alice.id()).await.unwrap();
        }
        let inventory = room.inventory().await.unwrap();

        // then (期待する結果):
        assert_eq!(inventory.len(), 4);
        assert!(slow.is_closed());
    }
}
