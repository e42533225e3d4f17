//! WebSocket connection handlers.

use std::{sync::Arc, time::Duration};

use axum::{
    body::Bytes,
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::IntoResponse,
};
use futures_util::{
    sink::{Sink, SinkExt},
    stream::{SplitStream, StreamExt},
};
use serde::Deserialize;
use tokio::{
    sync::{mpsc, watch},
    time::{Instant, MissedTickBehavior, timeout},
};

use crate::{
    config::KeepaliveConfig,
    domain::ClientName,
    hub::{Connection, Outbox},
    infrastructure::dto::websocket::Envelope,
    ui::{error::ConnectionError, state::AppState},
    usecase::DispatchUseCase,
};

/// Query parameters for WebSocket connection
#[derive(Debug, Deserialize)]
pub struct ConnectQuery {
    pub name: Option<String>,
}

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConnectQuery>,
) -> Result<impl IntoResponse, StatusCode> {
    let name = match query.name.map(ClientName::try_from) {
        Some(Ok(name)) => name,
        Some(Err(e)) => {
            tracing::warn!("Rejecting handshake: {}", e);
            return Err(StatusCode::BAD_REQUEST);
        }
        None => {
            tracing::warn!("Rejecting handshake: query parameter 'name' is missing");
            return Err(StatusCode::BAD_REQUEST);
        }
    };

    let max_size = state.config.limits.max_message_size;
    Ok(ws
        .max_message_size(max_size)
        .max_frame_size(max_size)
        .on_upgrade(move |socket| handle_socket(socket, state, name)))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, name: ClientName) {
    let (connection, outbox) = match state.connect_usecase.execute(name).await {
        Ok(established) => established,
        Err(e) => {
            tracing::error!("Failed to establish connection: {}", e);
            return;
        }
    };

    let keepalive = state.config.keepalive;
    let (sink, stream) = socket.split();

    let mut send_task = tokio::spawn(outbound_loop(
        sink,
        outbox,
        connection.clone(),
        keepalive,
        state.config.limits.coalesce_frames,
    ));
    let mut recv_task = tokio::spawn(inbound_loop(
        stream,
        connection.clone(),
        state.dispatch_usecase.clone(),
        keepalive.pong_wait,
    ));

    // Whichever loop ends first decides how the other is stopped
    let outbound_finished = tokio::select! {
        res = &mut recv_task => {
            log_loop_exit("inbound", &connection, res);
            false
        }
        res = &mut send_task => {
            log_loop_exit("outbound", &connection, res);
            recv_task.abort();
            // wait for the abort so no command from this connection races the cleanup
            let _ = (&mut recv_task).await;
            true
        }
    };

    state.disconnect_usecase.execute(&connection).await;

    // The mailbox is closed now: let the outbound loop flush and send the close frame
    if !outbound_finished {
        match timeout(keepalive.write_wait * 2, &mut send_task).await {
            Ok(res) => log_loop_exit("outbound", &connection, res),
            Err(_) => {
                tracing::warn!(
                    "Outbound loop of {} did not finish in time, aborting",
                    connection.id()
                );
                send_task.abort();
            }
        }
    }
}

fn log_loop_exit(
    direction: &str,
    connection: &Connection,
    res: Result<Result<(), ConnectionError>, tokio::task::JoinError>,
) {
    match res {
        Ok(Ok(())) => tracing::debug!("{} loop of {} finished", direction, connection.id()),
        Ok(Err(e)) => tracing::error!(
            "{} loop of '{}' ({}) failed: {}",
            direction,
            connection.name(),
            connection.id(),
            e
        ),
        Err(e) if e.is_cancelled() => {
            tracing::debug!("{} loop of {} cancelled", direction, connection.id())
        }
        Err(e) => tracing::error!("{} loop of {} panicked: {}", direction, connection.id(), e),
    }
}

/// Receive frames from the peer and dispatch decoded envelopes.
///
/// Any frame, including pong, resets the `pong_wait` read deadline.
async fn inbound_loop(
    mut stream: SplitStream<WebSocket>,
    connection: Arc<Connection>,
    dispatch: Arc<DispatchUseCase>,
    pong_wait: Duration,
) -> Result<(), ConnectionError> {
    loop {
        let frame = match timeout(pong_wait, stream.next()).await {
            Err(_) => return Err(ConnectionError::ReadTimeout(pong_wait)),
            Ok(None) => {
                connection.mark_peer_closed();
                return Ok(());
            }
            Ok(Some(Err(e))) => {
                connection.mark_peer_closed();
                return Err(ConnectionError::Receive(e));
            }
            Ok(Some(Ok(frame))) => frame,
        };

        let envelope = match frame {
            Message::Text(text) => Envelope::decode(text.as_str())?,
            Message::Binary(bytes) => Envelope::decode_slice(&bytes)?,
            Message::Ping(_) | Message::Pong(_) => {
                tracing::trace!("Keepalive frame from {}", connection.id());
                continue;
            }
            Message::Close(_) => {
                tracing::info!("Client '{}' requested close", connection.name());
                connection.mark_peer_closed();
                return Ok(());
            }
        };

        tracing::debug!(
            "Received {:?} from '{}' for {:?}",
            envelope.r#type,
            connection.name(),
            envelope.target
        );
        dispatch.execute(&connection, envelope).await?;
    }
}

/// Drain the mailbox to the peer and send keepalive pings.
///
/// Once the connection is closed, flushes the mailbox and sends a close frame,
/// unless the peer has already ended the session.
async fn outbound_loop<S>(
    mut sink: S,
    mut outbox: Outbox,
    connection: Arc<Connection>,
    keepalive: KeepaliveConfig,
    coalesce: bool,
) -> Result<(), ConnectionError>
where
    S: Sink<Message, Error = axum::Error> + Unpin,
{
    let write_wait = keepalive.write_wait;
    let mut ticker = tokio::time::interval_at(
        Instant::now() + keepalive.ping_period,
        keepalive.ping_period,
    );
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            queued = outbox.mailbox.recv() => {
                let Some(first) = queued else {
                    break;
                };
                let payload = if coalesce {
                    coalesce_queued(first, &mut outbox.mailbox)
                } else {
                    first
                };
                send_frame(&mut sink, Message::Text(payload.into()), write_wait, &connection).await?;
            }
            _ = ticker.tick() => {
                send_frame(&mut sink, Message::Ping(Bytes::new()), write_wait, &connection).await?;
            }
            () = wait_closed(&mut outbox.closed) => {
                // stop accepting, then flush what is already queued
                outbox.mailbox.close();
                if connection.is_peer_closed() {
                    tracing::debug!("Peer of {} already closed, skipping flush", connection.id());
                    return Ok(());
                }
                while let Some(first) = outbox.mailbox.recv().await {
                    let payload = if coalesce {
                        coalesce_queued(first, &mut outbox.mailbox)
                    } else {
                        first
                    };
                    send_frame(&mut sink, Message::Text(payload.into()), write_wait, &connection).await?;
                }
                break;
            }
        }
    }

    if connection.is_peer_closed() {
        return Ok(());
    }
    send_frame(&mut sink, Message::Close(None), write_wait, &connection).await
}

/// Write one frame. A send failure after the peer ended the session is not an error.
async fn send_frame<S>(
    sink: &mut S,
    frame: Message,
    write_wait: Duration,
    connection: &Connection,
) -> Result<(), ConnectionError>
where
    S: Sink<Message, Error = axum::Error> + Unpin,
{
    match write_frame(sink, frame, write_wait).await {
        Err(ConnectionError::Send(e)) if connection.is_peer_closed() => {
            tracing::debug!("Dropping frame to {}: peer already closed ({})", connection.id(), e);
            Ok(())
        }
        res => res,
    }
}

async fn wait_closed(closed: &mut watch::Receiver<bool>) {
    // an error means the connection was dropped, which also ends the session
    let _ = closed.wait_for(|closed| *closed).await;
}

/// Append every message queued right now to `first`, separated by `\n`.
fn coalesce_queued(first: String, mailbox: &mut mpsc::Receiver<String>) -> String {
    let mut frame = first;
    for _ in 0..mailbox.len() {
        match mailbox.try_recv() {
            Ok(next) => {
                frame.push('\n');
                frame.push_str(&next);
            }
            Err(_) => break,
        }
    }
    frame
}

async fn write_frame<S>(
    sink: &mut S,
    frame: Message,
    write_wait: Duration,
) -> Result<(), ConnectionError>
where
    S: Sink<Message, Error = axum::Error> + Unpin,
{
    match timeout(write_wait, sink.send(frame)).await {
        Ok(res) => res.map_err(ConnectionError::Send),
        Err(_) => Err(ConnectionError::WriteTimeout(write_wait)),
    }
}
