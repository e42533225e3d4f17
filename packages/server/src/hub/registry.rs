//! Hub actor: process-wide registry of connections and the room directory.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};

use crate::{
    domain::{ConnectionId, RoomName},
    infrastructure::dto::websocket::Envelope,
};

use super::{
    HubError, RoomDirectory, RoomHandle,
    connection::{Connection, fan_out},
};

/// A command received by the hub's control loop.
#[derive(Debug)]
enum HubCommand {
    Register {
        connection: Arc<Connection>,
    },

    Unregister {
        connection_id: ConnectionId,
    },

    /// Serialize once and deliver to every connection except `exclude`.
    Broadcast {
        envelope: Envelope,
        exclude: Option<ConnectionId>,
    },

    /// Deliver a pre-serialized payload to every connection.
    Emit {
        payload: String,
    },

    FindRoom {
        name: RoomName,
        res_tx: oneshot::Sender<Option<RoomHandle>>,
    },

    /// Lookup and creation in one step, so only the control loop writes the directory.
    FindOrCreateRoom {
        name: RoomName,
        res_tx: oneshot::Sender<RoomHandle>,
    },

    ListRooms {
        res_tx: oneshot::Sender<Vec<RoomHandle>>,
    },

    ConnectionCount {
        res_tx: oneshot::Sender<usize>,
    },

    /// Force-close every registered connection; replies with how many were closed.
    CloseAll {
        res_tx: oneshot::Sender<usize>,
    },
}

struct HubActor {
    connections: HashMap<ConnectionId, Arc<Connection>>,
    rooms: HashMap<RoomName, RoomHandle>,
    command_capacity: usize,
    cmd_rx: mpsc::Receiver<HubCommand>,
}

impl HubActor {
    async fn run(mut self) {
        tracing::debug!("Hub control loop started");
        while let Some(cmd) = self.cmd_rx.recv().await {
            self.process_command(cmd);
        }
        tracing::debug!("Hub control loop stopped");
    }

    fn process_command(&mut self, cmd: HubCommand) {
        match cmd {
            HubCommand::Register { connection } => {
                tracing::debug!(
                    "Connection {} ('{}') registered to hub",
                    connection.id(),
                    connection.name()
                );
                self.connections.insert(connection.id(), connection);
            }
            HubCommand::Unregister { connection_id } => {
                if self.connections.remove(&connection_id).is_some() {
                    tracing::debug!("Connection {} unregistered from hub", connection_id);
                }
            }
            HubCommand::Broadcast { envelope, exclude } => match envelope.encode() {
                Ok(payload) => {
                    fan_out(self.connections.values(), &payload, exclude);
                }
                Err(e) => tracing::error!("Hub: failed to serialize envelope: {}", e),
            },
            HubCommand::Emit { payload } => {
                fan_out(self.connections.values(), &payload, None);
            }
            HubCommand::FindRoom { name, res_tx } => {
                let _ = res_tx.send(self.rooms.get(&name).cloned());
            }
            HubCommand::FindOrCreateRoom { name, res_tx } => {
                let capacity = self.command_capacity;
                let room = self
                    .rooms
                    .entry(name)
                    .or_insert_with_key(|name| {
                        tracing::info!("Room '{}' created", name);
                        RoomHandle::spawn(name.clone(), capacity)
                    })
                    .clone();
                let _ = res_tx.send(room);
            }
            HubCommand::ListRooms { res_tx } => {
                let mut rooms: Vec<RoomHandle> = self.rooms.values().cloned().collect();
                rooms.sort_by(|a, b| a.name().cmp(b.name()));
                let _ = res_tx.send(rooms);
            }
            HubCommand::ConnectionCount { res_tx } => {
                let _ = res_tx.send(self.connections.len());
            }
            HubCommand::CloseAll { res_tx } => {
                let closed = self
                    .connections
                    .values()
                    .filter(|connection| connection.close())
                    .count();
                let _ = res_tx.send(closed);
            }
        }
    }
}

/// Handle to the running hub actor. Cheap to clone.
#[derive(Debug, Clone)]
pub struct HubHandle {
    cmd_tx: mpsc::Sender<HubCommand>,
}

impl HubHandle {
    /// Start the hub's control loop on the current runtime.
    ///
    /// `command_capacity` bounds the hub's and every room's command queue.
    pub fn spawn(command_capacity: usize) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel(command_capacity);
        let actor = HubActor {
            connections: HashMap::new(),
            rooms: HashMap::new(),
            command_capacity,
            cmd_rx,
        };
        tokio::spawn(actor.run());
        Self { cmd_tx }
    }

    async fn send(&self, cmd: HubCommand) -> Result<(), HubError> {
        self.cmd_tx.send(cmd).await.map_err(|_| HubError::HubStopped)
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> HubCommand,
    ) -> Result<T, HubError> {
        let (res_tx, res_rx) = oneshot::channel();
        self.send(make(res_tx)).await?;
        res_rx.await.map_err(|_| HubError::HubStopped)
    }

    pub async fn register(&self, connection: Arc<Connection>) -> Result<(), HubError> {
        self.send(HubCommand::Register { connection }).await
    }

    pub async fn unregister(&self, connection_id: ConnectionId) -> Result<(), HubError> {
        self.send(HubCommand::Unregister { connection_id }).await
    }

    pub async fn broadcast(
        &self,
        envelope: Envelope,
        exclude: Option<ConnectionId>,
    ) -> Result<(), HubError> {
        self.send(HubCommand::Broadcast { envelope, exclude }).await
    }

    pub async fn emit(&self, payload: String) -> Result<(), HubError> {
        self.send(HubCommand::Emit { payload }).await
    }

    /// All rooms, ordered by name.
    pub async fn list_rooms(&self) -> Result<Vec<RoomHandle>, HubError> {
        self.request(|res_tx| HubCommand::ListRooms { res_tx }).await
    }

    pub async fn connection_count(&self) -> Result<usize, HubError> {
        self.request(|res_tx| HubCommand::ConnectionCount { res_tx })
            .await
    }

    /// Close every registered connection. Each connection task then runs its own cleanup.
    pub async fn close_all(&self) -> Result<usize, HubError> {
        self.request(|res_tx| HubCommand::CloseAll { res_tx }).await
    }
}

#[async_trait]
impl RoomDirectory for HubHandle {
    async fn find_room(&self, name: &RoomName) -> Result<Option<RoomHandle>, HubError> {
        let name = name.clone();
        self.request(|res_tx| HubCommand::FindRoom { name, res_tx })
            .await
    }

    async fn find_or_create_room(&self, name: &RoomName) -> Result<RoomHandle, HubError> {
        let name = name.clone();
        self.request(|res_tx| HubCommand::FindOrCreateRoom { name, res_tx })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{domain::ClientName, hub::Outbox};

    fn connection(name: &str) -> (Arc<Connection>, Outbox) {
        Connection::new(ClientName::new(name.to_string()).unwrap(), 8)
    }

    fn room_name(name: &str) -> RoomName {
        RoomName::try_from(name).unwrap()
    }

    #[tokio::test]
    async fn test_find_missing_room_returns_none() {
        // テスト項目: 存在しないルームの検索は None を返す
        // given (前提条件):
        let hub = HubHandle::spawn(8);

        // when (操作):
        let room = hub.find_room(&room_name("board1")).await.unwrap();

        // then (期待する結果):
        assert!(room.is_none());
        assert!(hub.list_rooms().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_find_or_create_reuses_existing_room() {
        // テスト項目: 同じ名前の find-or-create は同一ルームを返し、重複作成しない
        // given (前提条件):
        let hub = HubHandle::spawn(8);
        let (alice, mut alice_outbox) = connection("alice");
        let (bob, _bob_outbox) = connection("bob");

        // when (操作):
        let first = hub.find_or_create_room(&room_name("board1")).await.unwrap();
        let second = hub.find_or_create_room(&room_name("board1")).await.unwrap();
        first.register(alice).await.unwrap();
        second.register(bob).await.unwrap();
        let snapshot = first.snapshot().await.unwrap();

        // then (期待する結果):
        assert_eq!(hub.list_rooms().await.unwrap().len(), 1);
        assert_eq!(snapshot.members.len(), 2);
        // alice はもう一方のハンドル経由で参加した bob の通知を受け取る
        assert!(alice_outbox.mailbox.try_recv().is_ok());
    }

    #[tokio::test]
    async fn test_concurrent_find_or_create_creates_one_room() {
        // テスト項目: 同名ルームへの同時 find-or-create でもルームは 1 つだけ作られる
        // given (前提条件):
        let hub = HubHandle::spawn(64);

        // when (操作):
        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let hub = hub.clone();
                tokio::spawn(async move { hub.find_or_create_room(&room_name("shared")).await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        // then (期待する結果):
        let rooms = hub.list_rooms().await.unwrap();
        assert_eq!(rooms.len(), 1);
        assert_eq!(rooms[0].name().as_str(), "shared");
    }

    #[tokio::test]
    async fn test_register_unregister_and_broadcast() {
        // テスト項目: ハブのブロードキャストは送信元を除く全接続に届き、登録解除後は届かない
        // given (前提条件):
        let hub = HubHandle::spawn(8);
        let (alice, mut alice_outbox) = connection("alice");
        let (bob, mut bob_outbox) = connection("bob");
        let (carol, mut carol_outbox) = connection("carol");
        hub.register(alice.clone()).await.unwrap();
        hub.register(bob.clone()).await.unwrap();
        hub.register(carol.clone()).await.unwrap();
        hub.unregister(carol.id()).await.unwrap();

        // when (操作):
        let envelope = Envelope::join_notification("alice", "lobby");
        hub.broadcast(envelope.clone(), Some(alice.id()))
            .await
            .unwrap();
        let count = hub.connection_count().await.unwrap();

        // then (期待する結果):
        assert_eq!(count, 2);
        let received = bob_outbox.mailbox.try_recv().unwrap();
        assert_eq!(Envelope::decode(&received).unwrap(), envelope);
        assert!(alice_outbox.mailbox.try_recv().is_err());
        assert!(carol_outbox.mailbox.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_emit_and_close_all() {
        // テスト項目: emit は全接続に届き、close_all は全接続を閉じる
        // given (前提条件):
        let hub = HubHandle::spawn(8);
        let (alice, mut alice_outbox) = connection("alice");
        let (bob, mut bob_outbox) = connection("bob");
        hub.register(alice.clone()).await.unwrap();
        hub.register(bob.clone()).await.unwrap();

        // when (操作):
        hub.emit("maintenance".to_string()).await.unwrap();
        let closed = hub.close_all().await.unwrap();

        // then (期待する結果):
        assert_eq!(alice_outbox.mailbox.try_recv().ok().as_deref(), Some("maintenance"));
        assert_eq!(bob_outbox.mailbox.try_recv().ok().as_deref(), Some("maintenance"));
        assert_eq!(closed, 2);
        assert!(alice.is_closed() && bob.is_closed());
        assert_eq!(hub.close_all().await.unwrap(), 0);
    }
}
