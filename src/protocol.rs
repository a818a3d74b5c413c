//! The three-callable handler protocol: `scope`, `receive`, `send`.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::io::AsyncWriteExt;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::sync::{mpsc, Notify};

use crate::error::Error;
use crate::message::{InboundMessage, OutboundMessage};
use crate::scope::Scope;
use crate::Result;

/// A user-supplied request handler, invoked once per HTTP request and once
/// (for the whole worker lifetime) for the lifespan scope.
///
/// Modeled as a trait rather than a bare closure so applications can carry
/// their own state (a router, a connection pool) behind `Arc<dyn
/// Application>`.
#[async_trait]
pub trait Application: Send + Sync {
    async fn call(&self, scope: Scope, receive: Receiver, send: Sender) -> Result<()>;
}

/// The `receive()` half of the protocol.
pub enum Receiver {
    /// Always returns the same buffered request body; the body has already
    /// been read in full by the time the cycle invokes the application.
    Http(Bytes),
    Lifespan(mpsc::Receiver<InboundMessage>),
}

impl Receiver {
    pub(crate) fn new_http(body: Bytes) -> Receiver {
        Receiver::Http(body)
    }

    pub(crate) fn new_lifespan(rx: mpsc::Receiver<InboundMessage>) -> Receiver {
        Receiver::Lifespan(rx)
    }

    pub async fn receive(&mut self) -> InboundMessage {
        match self {
            Receiver::Http(body) => InboundMessage::HttpRequest {
                body: body.clone(),
                more_body: false,
            },
            Receiver::Lifespan(rx) => rx
                .recv()
                .await
                .expect("lifespan event channel closed before a message was sent"),
        }
    }
}

/// The `send()` half of the protocol.
pub enum Sender {
    Http(HttpSender),
    Lifespan(LifespanSender),
}

impl Sender {
    pub(crate) fn new_http(writer: OwnedWriteHalf, method: Bytes, path: Bytes) -> Sender {
        Sender::Http(HttpSender {
            writer,
            method,
            path,
            closed: false,
        })
    }

    pub(crate) fn new_lifespan(startup: Arc<Notify>, shutdown: Arc<Notify>) -> Sender {
        Sender::Lifespan(LifespanSender { startup, shutdown })
    }

    pub async fn send(&mut self, msg: OutboundMessage) -> Result<()> {
        match self {
            Sender::Http(s) => s.send(msg).await,
            Sender::Lifespan(s) => s.send(msg).await,
        }
    }
}

/// Drains an HTTP response onto the connection's write half.
pub struct HttpSender {
    writer: OwnedWriteHalf,
    method: Bytes,
    path: Bytes,
    closed: bool,
}

impl HttpSender {
    async fn send(&mut self, msg: OutboundMessage) -> Result<()> {
        if self.closed {
            // A write to a closed socket is fatal to the cycle and silently
            // discarded (spec §4.1 Failure semantics).
            return Ok(());
        }
        match msg {
            OutboundMessage::HttpResponseStart { status, headers } => {
                let mut head = Vec::with_capacity(64);
                head.extend_from_slice(format!("HTTP/1.1 {} OK\r\n", status).as_bytes());
                for (name, value) in &headers {
                    head.extend_from_slice(name);
                    head.extend_from_slice(b": ");
                    head.extend_from_slice(value);
                    head.extend_from_slice(b"\r\n");
                }
                head.extend_from_slice(b"\r\n");
                if self.writer.write_all(&head).await.is_err() {
                    self.closed = true;
                    return Ok(());
                }
                tracing::info!(
                    method = %String::from_utf8_lossy(&self.method),
                    path = %String::from_utf8_lossy(&self.path),
                    status,
                    "{} {} {}",
                    String::from_utf8_lossy(&self.method),
                    String::from_utf8_lossy(&self.path),
                    status,
                );
            }
            OutboundMessage::HttpResponseBody { body, more_body } => {
                if self.writer.write_all(&body).await.is_err() {
                    self.closed = true;
                    return Ok(());
                }
                if !more_body {
                    let _ = self.writer.flush().await;
                    let _ = self.writer.shutdown().await;
                    self.closed = true;
                }
            }
            other => {
                tracing::warn!(?other, "unhandled outbound message type in http cycle");
            }
        }
        Ok(())
    }
}

/// Acknowledges the lifespan startup/shutdown handshake by waking the
/// [`Lifecycle`](crate::server::lifecycle::Lifecycle) latch the application
/// just satisfied.
pub struct LifespanSender {
    startup: Arc<Notify>,
    shutdown: Arc<Notify>,
}

impl LifespanSender {
    async fn send(&mut self, msg: OutboundMessage) -> Result<()> {
        match msg {
            OutboundMessage::LifespanStartupComplete => {
                tracing::info!("application startup has completed successfully");
                self.startup.notify_one();
            }
            OutboundMessage::LifespanStartupFailed => {
                tracing::error!("application startup has failed");
                self.startup.notify_one();
            }
            OutboundMessage::LifespanShutdownComplete => {
                tracing::info!("application shutdown has completed successfully");
                self.shutdown.notify_one();
            }
            OutboundMessage::LifespanShutdownFailed => {
                tracing::error!("application shutdown has failed");
                self.shutdown.notify_one();
            }
            other => {
                tracing::warn!(?other, "unhandled outbound message type in lifespan");
            }
        }
        Ok(())
    }
}

#[allow(dead_code)]
fn assert_send_sync() {
    fn is_send_sync<T: Send + Sync>() {}
    is_send_sync::<Error>();
}
