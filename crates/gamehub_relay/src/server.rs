//! # Relay Server
//!
//! Newline-delimited JSON over TCP. One task per connection reads frames
//! into the hub; a paired writer task drains the connection's outbound queue.
//!
//! ```text
//! socket ──lines──> reader task ──ClientEvent──> RelayHub
//! socket <──lines── writer task <──ServerEvent── mpsc queue
//! ```

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};

use crate::error::RelayResult;
use crate::hub::{ClientEvent, ConnectionId, RelayHub, ServerEvent};

/// Accept loop bound to one address.
pub struct RelayServer {
    listener: TcpListener,
    hub: Arc<RelayHub>,
}

impl RelayServer {
    /// Binds `addr`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::RelayError::Io`] if the address cannot be bound.
    pub async fn bind(addr: &str, hub: Arc<RelayHub>) -> RelayResult<Self> {
        let listener = TcpListener::bind(addr).await?;
        tracing::info!("relay listening on {}", listener.local_addr()?);
        Ok(Self { listener, hub })
    }

    /// The bound address (useful with port 0).
    ///
    /// # Errors
    ///
    /// Returns [`crate::RelayError::Io`] if the socket is gone.
    pub fn local_addr(&self) -> RelayResult<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// The shared hub.
    #[must_use]
    pub fn hub(&self) -> &Arc<RelayHub> {
        &self.hub
    }

    /// Accepts connections until the listener fails.
    ///
    /// # Errors
    ///
    /// Returns [`crate::RelayError::Io`] when `accept` fails.
    pub async fn run(self) -> RelayResult<()> {
        loop {
            let (stream, peer) = self.listener.accept().await?;
            let hub = Arc::clone(&self.hub);
            tokio::spawn(async move {
                if let Err(err) = serve_connection(stream, hub).await {
                    tracing::warn!("connection {} ended with error: {}", peer, err);
                }
            });
        }
    }
}

async fn serve_connection(stream: TcpStream, hub: Arc<RelayHub>) -> RelayResult<()> {
    let (read_half, write_half) = stream.into_split();
    let (tx, rx) = unbounded_channel();
    let connection = hub.connect(tx);

    let writer = tokio::spawn(write_events(write_half, rx));
    let result = read_events(read_half, connection, &hub).await;

    // Dropping the hub's sender ends the writer.
    hub.disconnect(connection);
    let _ = writer.await;
    result
}

async fn read_events(
    read_half: tokio::net::tcp::OwnedReadHalf,
    connection: ConnectionId,
    hub: &RelayHub,
) -> RelayResult<()> {
    let mut lines = BufReader::new(read_half).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<ClientEvent>(&line) {
            Ok(event) => hub.handle(connection, event)?,
            Err(err) => {
                tracing::debug!("connection {} sent a bad frame: {}", connection, err);
                hub.reply(
                    connection,
                    ServerEvent::Error {
                        message: format!("invalid frame: {err}"),
                    },
                );
            }
        }
    }
    Ok(())
}

async fn write_events(
    mut write_half: tokio::net::tcp::OwnedWriteHalf,
    mut rx: UnboundedReceiver<ServerEvent>,
) -> RelayResult<()> {
    while let Some(event) = rx.recv().await {
        let mut frame = serde_json::to_vec(&event)?;
        frame.push(b'\n');
        write_half.write_all(&frame).await?;
    }
    Ok(())
}
