//! The per-invocation context passed to an [`Application`](crate::Application).

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use bytes::Bytes;

/// The ASGI spec/protocol version pair advertised in every scope.
#[derive(Debug, Clone, Copy)]
pub struct AsgiVersions {
    pub spec_version: &'static str,
    pub version: &'static str,
}

impl Default for AsgiVersions {
    fn default() -> Self {
        AsgiVersions {
            spec_version: "2.3",
            version: "3.0",
        }
    }
}

/// Per-worker state mapping, shared by reference into every scope created by
/// that worker. The core never reads or writes it; it exists purely so an
/// `Application` can stash worker-lifetime data at lifespan startup and read
/// it back from later HTTP scopes.
pub type State = Arc<Mutex<HashMap<String, String>>>;

/// Build a fresh, empty worker state map.
pub fn new_state() -> State {
    Arc::new(Mutex::new(HashMap::new()))
}

/// One accepted HTTP/1.1 request's invocation context.
#[derive(Debug, Clone)]
pub struct HttpScope {
    pub http_version: &'static str,
    pub asgi: AsgiVersions,
    pub method: Bytes,
    pub path: Bytes,
    pub query_string: Bytes,
    pub headers: Vec<(Bytes, Bytes)>,
    pub state: State,
}

/// The worker-lifetime lifespan invocation context. Created once per worker.
#[derive(Debug, Clone)]
pub struct LifespanScope {
    pub asgi: AsgiVersions,
    pub state: State,
}

/// The scope handed to [`Application::call`](crate::Application::call):
/// either one HTTP request or the worker's lifespan.
#[derive(Debug, Clone)]
pub enum Scope {
    Http(HttpScope),
    Lifespan(LifespanScope),
}

impl Scope {
    pub fn is_http(&self) -> bool {
        matches!(self, Scope::Http(_))
    }

    pub fn is_lifespan(&self) -> bool {
        matches!(self, Scope::Lifespan(_))
    }
}
