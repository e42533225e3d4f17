//! Server-side state of one client session.

use std::{
    collections::HashSet,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use thiserror::Error;
use tokio::sync::{Mutex, mpsc, watch};

use crate::domain::{ClientName, ConnectionId, RoomName};

/// Mailbox delivery errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MailboxError {
    /// The peer is not draining its mailbox; the connection has been closed
    #[error("mailbox of connection {0} is full")]
    Full(ConnectionId),

    #[error("mailbox of connection {0} is closed")]
    Closed(ConnectionId),
}

/// Receiving half of a connection, drained by its outbound loop.
#[derive(Debug)]
pub struct Outbox {
    /// Serialized messages in enqueue order
    pub mailbox: mpsc::Receiver<String>,
    /// Becomes `true` once the connection is closed
    pub closed: watch::Receiver<bool>,
}

/// A live client connection.
///
/// Rooms and the hub hold `Arc<Connection>`; the connection itself only keeps the
/// names of the rooms it joined, so there is no ownership cycle.
#[derive(Debug)]
pub struct Connection {
    id: ConnectionId,
    name: ClientName,
    mailbox: mpsc::Sender<String>,
    closed: watch::Sender<bool>,
    disconnected: AtomicBool,
    peer_closed: AtomicBool,
    rooms: Mutex<HashSet<RoomName>>,
}

impl Connection {
    /// Create a connection with a mailbox of `capacity` messages.
    pub fn new(name: ClientName, capacity: usize) -> (Arc<Self>, Outbox) {
        let (mailbox_tx, mailbox_rx) = mpsc::channel(capacity);
        let (closed_tx, closed_rx) = watch::channel(false);

        let connection = Arc::new(Self {
            id: ConnectionId::generate(),
            name,
            mailbox: mailbox_tx,
            closed: closed_tx,
            disconnected: AtomicBool::new(false),
            peer_closed: AtomicBool::new(false),
            rooms: Mutex::new(HashSet::new()),
        });
        let outbox = Outbox {
            mailbox: mailbox_rx,
            closed: closed_rx,
        };
        (connection, outbox)
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn name(&self) -> &ClientName {
        &self.name
    }

    /// Enqueue a serialized message without waiting.
    ///
    /// A full mailbox closes the connection: the peer is considered too slow.
    pub fn deliver(&self, payload: String) -> Result<(), MailboxError> {
        if self.is_closed() {
            return Err(MailboxError::Closed(self.id));
        }
        match self.mailbox.try_send(payload) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(
                    "Mailbox of '{}' ({}) is full, closing slow connection",
                    self.name,
                    self.id
                );
                self.close();
                Err(MailboxError::Full(self.id))
            }
            Err(mpsc::error::TrySendError::Closed(_)) => Err(MailboxError::Closed(self.id)),
        }
    }

    /// Signal the outbound loop to flush and exit. Returns `true` on the first call.
    pub fn close(&self) -> bool {
        !self.closed.send_replace(true)
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }

    /// Claim the disconnect cleanup. Only the first caller gets `true`.
    pub fn begin_disconnect(&self) -> bool {
        !self.disconnected.swap(true, Ordering::AcqRel)
    }

    /// Record that the peer ended the session (close frame or end of stream).
    ///
    /// Nothing more can be written to the socket afterwards.
    pub fn mark_peer_closed(&self) {
        self.peer_closed.store(true, Ordering::Release);
    }

    pub fn is_peer_closed(&self) -> bool {
        self.peer_closed.load(Ordering::Acquire)
    }

    /// Record membership of `room`. Returns `false` if already recorded.
    pub async fn remember_room(&self, room: RoomName) -> bool {
        self.rooms.lock().await.insert(room)
    }

    /// Drop membership of `room`. Returns `false` if it was not recorded.
    pub async fn forget_room(&self, room: &RoomName) -> bool {
        self.rooms.lock().await.remove(room)
    }

    pub async fn joined_rooms(&self) -> Vec<RoomName> {
        let mut rooms: Vec<RoomName> = self.rooms.lock().await.iter().cloned().collect();
        rooms.sort();
        rooms
    }

    /// Remove and return every recorded room.
    pub async fn take_rooms(&self) -> Vec<RoomName> {
        self.rooms.lock().await.drain().collect()
    }
}

/// Deliver `payload` to every connection except `exclude`.
///
/// Failed deliveries are logged and skipped. Returns the number of successful deliveries.
pub(crate) fn fan_out<'a>(
    targets: impl IntoIterator<Item = &'a Arc<Connection>>,
    payload: &str,
    exclude: Option<ConnectionId>,
) -> usize {
    let mut delivered = 0;
    for target in targets {
        if Some(target.id()) == exclude {
            continue;
        }
        match target.deliver(payload.to_string()) {
            Ok(()) => delivered += 1,
            Err(e) => tracing::debug!("Skipping '{}': {}", target.name(), e),
        }
    }
    delivered
}
