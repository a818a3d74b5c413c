//! The per-worker server: binds a shared-port listener, runs the lifespan
//! handshake, and accepts connections until asked to stop (spec §4.2).

pub mod cycle;
pub mod lifecycle;
pub mod tcp;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::registry;
use crate::scope::new_state;
use crate::Result;

use cycle::RequestResponseCycle;
use lifecycle::Lifecycle;

/// How often the accept loop checks for a shutdown request while it has no
/// connection pending. Mirrors the polling cadence of the server this spec
/// was distilled from, which has no native "interrupt accept()" primitive
/// either.
const SHUTDOWN_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// One worker process's entire run: resolve the application, bind the
/// listener, perform the lifespan handshake, serve connections, then perform
/// the shutdown half of the handshake.
pub struct Server {
    config: Config,
    should_exit: Arc<AtomicBool>,
}

impl Server {
    pub fn new(config: Config) -> Server {
        Server {
            config,
            should_exit: Arc::new(AtomicBool::new(false)),
        }
    }

    /// A clone of the exit flag, for installing a signal handler before
    /// `run` is called.
    pub fn should_exit_handle(&self) -> Arc<AtomicBool> {
        self.should_exit.clone()
    }

    pub async fn run(self) -> Result<()> {
        let app = registry::resolve(&self.config.app)?;
        let state = new_state();

        let lifecycle = Lifecycle::spawn(app.clone(), state.clone());
        lifecycle.on_startup().await;

        let addr = format!("{}:{}", self.config.host, self.config.port)
            .parse()
            .map_err(|e: std::net::AddrParseError| crate::error::Error::new_listen(e))?;
        let listener = tcp::bind(addr)?;
        tracing::info!(%addr, "worker accepting connections");

        loop {
            if self.should_exit.load(Ordering::SeqCst) {
                break;
            }
            let accepted = tokio::time::timeout(SHUTDOWN_POLL_INTERVAL, listener.accept()).await;
            let (stream, peer) = match accepted {
                Ok(Ok(pair)) => pair,
                Ok(Err(err)) => {
                    tracing::warn!(%err, "error accepting connection");
                    continue;
                }
                Err(_timeout) => continue,
            };
            tracing::debug!(%peer, "accepted connection");

            let app = app.clone();
            let state = state.clone();
            tokio::spawn(async move {
                let cycle = RequestResponseCycle::new(app, stream, state);
                if let Err(err) = cycle.complete().await {
                    tracing::warn!(%err, "request/response cycle ended with an error");
                }
            });
        }

        tracing::info!("worker no longer accepting connections, running shutdown handshake");
        drop(listener);
        lifecycle.on_shutdown().await;
        Ok(())
    }
}
