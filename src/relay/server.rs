//! # Relay Server
//!
//! WebSocket acceptor. Each accepted socket gets a reader task, a writer task
//! and a `Connection` that owns the session; connections never share mutable
//! state.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.0.0: Initial release

use anyhow::{Context, Result};
use futures::{SinkExt, StreamExt};
use log::{debug, error, info};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::{accept_async, tungstenite::Message};

use super::connection::Connection;
use super::RelayContext;

/// Inbound frames buffered per connection
const INBOUND_CHANNEL_CAPACITY: usize = 32;

/// Outbound frames buffered per connection
const OUTBOUND_CHANNEL_CAPACITY: usize = 128;

pub struct RelayServer {
    listener: TcpListener,
    ctx: Arc<RelayContext>,
}

impl RelayServer {
    pub async fn bind(addr: SocketAddr, ctx: Arc<RelayContext>) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to bind {addr}"))?;
        Ok(RelayServer { listener, ctx })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept connections forever, one task per connection.
    pub async fn run(self) -> Result<()> {
        info!("WebSocket server started on ws://{}", self.local_addr()?);

        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    debug!("New connection from {addr}");
                    let ctx = Arc::clone(&self.ctx);
                    tokio::spawn(async move {
                        if let Err(e) = handle_socket(stream, addr, ctx).await {
                            error!("Error handling connection from {addr}: {e:#}");
                        }
                    });
                }
                Err(e) => {
                    error!("Failed to accept connection: {e}");
                }
            }
        }
    }
}

/// Text payload of an inbound frame. Binary frames are decoded as UTF-8 and
/// treated like text; control frames carry no message.
fn inbound_text(message: Message) -> Option<String> {
    match message {
        Message::Text(text) => Some(text.as_str().to_owned()),
        Message::Binary(data) => Some(String::from_utf8_lossy(&data).into_owned()),
        _ => None,
    }
}

async fn handle_socket(stream: TcpStream, addr: SocketAddr, ctx: Arc<RelayContext>) -> Result<()> {
    let ws_stream = accept_async(stream)
        .await
        .with_context(|| format!("WebSocket handshake with {addr} failed"))?;
    let (mut write, mut read) = ws_stream.split();

    let connection = Connection::new(ctx);
    let id = connection.id();
    info!("[{id}] WebSocket connection established: {addr}");

    let (in_tx, in_rx) = mpsc::channel::<String>(INBOUND_CHANNEL_CAPACITY);
    let (out_tx, mut out_rx) = mpsc::channel::<String>(OUTBOUND_CHANNEL_CAPACITY);

    let writer = tokio::spawn(async move {
        while let Some(frame) = out_rx.recv().await {
            if let Err(e) = write.send(Message::Text(frame.into())).await {
                debug!("[{id}] Failed to write to client: {e}");
                break;
            }
        }
        let _ = write.close().await;
    });

    // Dropping in_tx on close or error is the disconnect signal
    let reader = tokio::spawn(async move {
        while let Some(message) = read.next().await {
            match message {
                Ok(Message::Close(_)) => break,
                Ok(message) => {
                    if let Some(text) = inbound_text(message) {
                        if in_tx.send(text).await.is_err() {
                            break;
                        }
                    }
                }
                Err(e) => {
                    debug!("[{id}] WebSocket read error: {e}");
                    break;
                }
            }
        }
    });

    connection.run(in_rx, out_tx).await;

    reader.abort();
    let _ = writer.await;
    Ok(())
}
