//! Resolution of an `ApplicationRef` string (`"<module>:<attribute[.sub]*>"`)
//! against an in-process registry of applications, the Rust stand-in for
//! Python's dynamic `importlib` module/attribute lookup (spec §6).

use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::error::Error;
use crate::protocol::Application;
use crate::Result;

/// A statically-registered application constructor. Application crates
/// register themselves with [`inventory::submit!`] at startup; `sparrow`
/// never loads code dynamically.
pub struct Registration {
    pub name: &'static str,
    pub factory: fn() -> Arc<dyn Application>,
}

inventory::collect!(Registration);

/// Registers `factory` under `name` so that `resolve("name")` (or, when the
/// reference is in `module:attr` shape, `resolve("module:attr")`) returns a
/// fresh `Arc<dyn Application>` built by `factory`.
///
/// This is a thin wrapper so callers don't need to depend on `inventory`
/// directly; most applications will use the `register_application!` macro
/// instead.
pub fn registration(name: &'static str, factory: fn() -> Arc<dyn Application>) -> Registration {
    Registration { name, factory }
}

/// Registers an `Application` constructor under a literal name, callable as
/// an `ApplicationRef` (e.g. `register_application!("main:app", || ...)`).
#[macro_export]
macro_rules! register_application {
    ($name:expr, $factory:expr) => {
        ::inventory::submit! {
            $crate::registry::registration($name, $factory)
        }
    };
}

fn table() -> &'static HashMap<&'static str, fn() -> Arc<dyn Application>> {
    static TABLE: OnceCell<HashMap<&'static str, fn() -> Arc<dyn Application>>> = OnceCell::new();
    TABLE.get_or_init(|| {
        let mut map = HashMap::new();
        for registration in inventory::iter::<Registration> {
            map.insert(registration.name, registration.factory);
        }
        map
    })
}

/// Parses and resolves an `ApplicationRef` of the form `"module:attr"` into
/// a live `Application`.
///
/// Fails if the format is wrong (no colon, empty halves), or if nothing is
/// registered under that exact string — both surface as fatal worker
/// startup errors (spec §6).
pub fn resolve(reference: &str) -> Result<Arc<dyn Application>> {
    let (module, attr) = reference
        .split_once(':')
        .ok_or_else(Error::new_ref_format)?;
    if module.is_empty() || attr.is_empty() {
        return Err(Error::new_ref_format());
    }
    table()
        .get(reference)
        .map(|factory| factory())
        .ok_or_else(Error::new_ref_not_found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::OutboundMessage;
    use crate::protocol::{Receiver, Sender};
    use crate::scope::Scope;
    use async_trait::async_trait;

    struct Noop;

    #[async_trait]
    impl Application for Noop {
        async fn call(&self, _scope: Scope, _receive: Receiver, _send: Sender) -> Result<()> {
            Ok(())
        }
    }

    fn noop_factory() -> Arc<dyn Application> {
        Arc::new(Noop)
    }

    crate::register_application!("registry_tests:noop", noop_factory);

    #[test]
    fn rejects_missing_colon() {
        assert!(resolve("bad").is_err());
    }

    #[test]
    fn rejects_empty_attr() {
        assert!(resolve("mod:").is_err());
    }

    #[test]
    fn rejects_empty_module() {
        assert!(resolve(":attr").is_err());
    }

    #[test]
    fn rejects_unregistered_reference() {
        assert!(resolve("registry_tests:does_not_exist").is_err());
    }

    #[test]
    fn resolves_a_registered_application() {
        assert!(resolve("registry_tests:noop").is_ok());
    }

    // OutboundMessage import keeps the test module honest about the shape
    // applications are expected to produce; referenced here so it isn't
    // flagged unused if call() never touches it directly.
    #[allow(dead_code)]
    fn _silence_unused(_: OutboundMessage) {}
}
