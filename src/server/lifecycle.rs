//! Drives the worker-lifetime lifespan protocol: spawns the application's
//! long-running lifespan task once, then lets `on_startup`/`on_shutdown`
//! block until that task acks the corresponding event (spec §4.3).

use std::sync::Arc;

use tokio::sync::{mpsc, Notify};
use tokio::task::JoinHandle;

use crate::message::InboundMessage;
use crate::protocol::{Application, Receiver, Sender};
use crate::scope::{AsgiVersions, LifespanScope, Scope, State};

/// Coordinates the lifespan handshake for one worker.
///
/// The application's `call` is invoked exactly once, with a `Lifespan`
/// scope, and is expected to run for the worker's entire life: it `receive`s
/// `LifespanStartup`, does its setup, `send`s `LifespanStartupComplete` (or
/// `Failed`), then later `receive`s `LifespanShutdown`, tears down, and
/// `send`s `LifespanShutdownComplete` (or `Failed`).
pub struct Lifecycle {
    startup: Arc<Notify>,
    shutdown: Arc<Notify>,
    events: mpsc::Sender<InboundMessage>,
    task: JoinHandle<()>,
}

impl Lifecycle {
    /// Spawns the application's lifespan task. Does not send any event yet.
    pub fn spawn(app: Arc<dyn Application>, state: State) -> Lifecycle {
        let startup = Arc::new(Notify::new());
        let shutdown = Arc::new(Notify::new());
        let (events_tx, events_rx) = mpsc::channel(1);

        let task_startup = startup.clone();
        let task_shutdown = shutdown.clone();

        // Run the application in its own task so a panic inside `call`
        // surfaces as an `Err` from `inner`'s JoinHandle instead of
        // unwinding straight through the latch-notify below it.
        let inner = tokio::spawn(async move {
            let scope = Scope::Lifespan(LifespanScope {
                asgi: AsgiVersions::default(),
                state,
            });
            let receive = Receiver::new_lifespan(events_rx);
            let send = Sender::new_lifespan(task_startup.clone(), task_shutdown.clone());
            app.call(scope, receive, send).await
        });

        let watcher_startup = startup.clone();
        let watcher_shutdown = shutdown.clone();
        let task = tokio::spawn(async move {
            match inner.await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    tracing::error!(%err, "application lifespan task exited with an error");
                }
                Err(join_err) => {
                    tracing::error!(%join_err, "application lifespan task panicked");
                }
            }
            // Whichever branch above ran, both latches must be released —
            // an application that never acks one of the two events must
            // not hang the worker forever.
            watcher_startup.notify_one();
            watcher_shutdown.notify_one();
        });

        Lifecycle {
            startup,
            shutdown,
            events: events_tx,
            task,
        }
    }

    /// Sends `LifespanStartup` and waits for the application to ack it.
    /// Resolves even if the application task panics, so a broken
    /// application fails the worker instead of hanging it.
    pub async fn on_startup(&self) {
        let _ = self.events.send(InboundMessage::LifespanStartup).await;
        self.startup.notified().await;
    }

    /// Sends `LifespanShutdown` and waits for the application to ack it.
    pub async fn on_shutdown(self) {
        let _ = self.events.send(InboundMessage::LifespanShutdown).await;
        self.shutdown.notified().await;
        // Drop the sender before joining so the task's receive() loop, if
        // it is still awaiting a third event, observes channel closure
        // instead of hanging; then give the task a chance to finish tracing
        // its own exit.
        drop(self.events);
        let _ = self.task.await;
    }
}
