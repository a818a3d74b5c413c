//! # sparrow
//!
//! sparrow is a minimal ASGI-style application server: a process manager
//! that spawns worker processes sharing one listening port via kernel-level
//! port sharing, a per-worker asynchronous HTTP/1.1 request/response engine,
//! and a lifespan controller that notifies the application of worker
//! startup and shutdown.
//!
//! ## Architecture
//!
//! - [`Manager`] is the root process: it spawns `workers` worker processes
//!   and waits for a termination signal to tear them all down.
//! - [`Server`] is one worker's entire run: resolve the [`Application`] from
//!   its [`registry`] reference, bind the shared-port listener, run the
//!   lifespan startup handshake, accept connections, and run the lifespan
//!   shutdown handshake on exit.
//! - Each accepted connection becomes one
//!   [`server::cycle::RequestResponseCycle`], which parses the request,
//!   invokes the [`Application`] under the three-callable protocol
//!   (`scope`, `receive`, `send`), and drains the streamed response.
//!
//! ## Low-level
//!
//! sparrow does not implement HTTP/2, TLS, keep-alive, or chunked transfer
//! decoding. A connection is read once, parsed once, and closed once the
//! application's final response chunk is flushed. Applications are
//! expected to be registered ahead of time with [`register_application!`]
//! rather than loaded dynamically; sparrow has no notion of a plugin
//! loader beyond the in-process [`registry`].

pub use crate::config::Config;
pub use crate::error::{Error, Result};
pub use crate::manager::Manager;
pub use crate::message::{InboundMessage, OutboundMessage};
pub use crate::protocol::{Application, Receiver, Sender};
pub use crate::scope::{AsgiVersions, HttpScope, LifespanScope, Scope, State};
pub use crate::server::Server;

pub mod config;
mod error;
pub mod logging;
pub mod manager;
pub mod message;
pub mod protocol;
pub mod registry;
pub mod scope;
pub mod server;
