//! Inbound and outbound messages exchanged across the `receive`/`send`
//! callables of the handler protocol (spec §3, §6).

use bytes::Bytes;

/// A message an [`Application`](crate::Application) receives from the core.
#[derive(Debug, Clone)]
pub enum InboundMessage {
    /// The (already fully buffered) body of the current HTTP request.
    HttpRequest { body: Bytes, more_body: bool },
    /// The worker is about to start accepting connections.
    LifespanStartup,
    /// The worker is about to stop accepting connections.
    LifespanShutdown,
}

/// A message an [`Application`](crate::Application) sends to the core.
#[derive(Debug, Clone)]
pub enum OutboundMessage {
    /// The response status line and headers. Must precede any
    /// `HttpResponseBody` in a given cycle.
    HttpResponseStart {
        status: u16,
        headers: Vec<(Bytes, Bytes)>,
    },
    /// A chunk of the response body. `more_body: false` marks the end of the
    /// response and triggers socket closure.
    HttpResponseBody { body: Bytes, more_body: bool },
    LifespanStartupComplete,
    LifespanStartupFailed,
    LifespanShutdownComplete,
    LifespanShutdownFailed,
}
