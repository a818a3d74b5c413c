//! Coverage of the lifespan handshake's ordering and failure-safety
//! guarantees (spec §4.3, §8 scenario 6).

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use sparrow::scope::new_state;
use sparrow::server::lifecycle::Lifecycle;
use sparrow::{Application, InboundMessage, OutboundMessage, Receiver, Result, Scope, Sender};

/// Records each lifespan event it receives and immediately acks it, so a
/// test can assert both that each fires exactly once and in what order.
struct Recorder {
    events: Arc<Mutex<Vec<&'static str>>>,
}

#[async_trait]
impl Application for Recorder {
    async fn call(&self, _scope: Scope, mut receive: Receiver, mut send: Sender) -> Result<()> {
        match receive.receive().await {
            InboundMessage::LifespanStartup => {
                self.events.lock().unwrap().push("startup");
                send.send(OutboundMessage::LifespanStartupComplete).await?;
            }
            other => panic!("expected lifespan.startup, got {:?}", other),
        }
        match receive.receive().await {
            InboundMessage::LifespanShutdown => {
                self.events.lock().unwrap().push("shutdown");
                send.send(OutboundMessage::LifespanShutdownComplete).await?;
            }
            other => panic!("expected lifespan.shutdown, got {:?}", other),
        }
        Ok(())
    }
}

#[tokio::test]
async fn startup_then_shutdown_each_observed_exactly_once() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let app = Arc::new(Recorder {
        events: events.clone(),
    });
    let lifecycle = Lifecycle::spawn(app, new_state());

    lifecycle.on_startup().await;
    assert_eq!(*events.lock().unwrap(), vec!["startup"]);

    lifecycle.on_shutdown().await;
    assert_eq!(*events.lock().unwrap(), vec!["startup", "shutdown"]);
}

/// An application that never acks startup: the source's "failed startup
/// does not abort the worker" behavior (spec §9 Open Question 2) means
/// `on_startup` must still resolve rather than hang.
struct NeverAcks;

#[async_trait]
impl Application for NeverAcks {
    async fn call(&self, _scope: Scope, mut receive: Receiver, _send: Sender) -> Result<()> {
        let _ = receive.receive().await;
        // Returns without ever calling send(); the coordinator must release
        // the latch anyway.
        Ok(())
    }
}

#[tokio::test]
async fn startup_latch_releases_even_if_application_never_acks() {
    let app = Arc::new(NeverAcks);
    let lifecycle = Lifecycle::spawn(app, new_state());
    lifecycle.on_startup().await;
}

/// An application that panics mid-handshake must not leave the worker stuck
/// waiting for a latch that will now never be set by a normal return path.
struct Panics;

#[async_trait]
impl Application for Panics {
    async fn call(&self, _scope: Scope, mut receive: Receiver, _send: Sender) -> Result<()> {
        let _ = receive.receive().await;
        panic!("application startup blew up");
    }
}

#[tokio::test]
async fn startup_latch_releases_even_if_application_panics() {
    let app = Arc::new(Panics);
    let lifecycle = Lifecycle::spawn(app, new_state());
    lifecycle.on_startup().await;
}
