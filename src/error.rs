//! Error and Result module.

use std::error::Error as StdError;
use std::fmt;

/// Result type returned from methods that can produce a sparrow [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

type Cause = Box<dyn StdError + Send + Sync>;

/// Represents errors that can occur while resolving, spawning, and serving
/// an application.
pub struct Error {
    inner: Box<ErrorImpl>,
}

struct ErrorImpl {
    kind: Kind,
    cause: Option<Cause>,
}

#[derive(Debug)]
pub(crate) enum Kind {
    /// The `ApplicationRef` string didn't have the `module:attr` shape.
    RefFormat,
    /// The `ApplicationRef` string was well-formed but nothing is registered
    /// under it.
    RefNotFound,
    /// Binding the shared-port listener failed.
    Listen,
    /// Reading from or writing to a connection failed.
    Io,
    /// The application handler returned an error from its `call`.
    Handler,
    /// A worker process could not be spawned by the manager.
    Spawn,
}

impl Error {
    pub(crate) fn new(kind: Kind) -> Error {
        Error {
            inner: Box::new(ErrorImpl { kind, cause: None }),
        }
    }

    pub(crate) fn with(mut self, cause: impl Into<Cause>) -> Error {
        self.inner.cause = Some(cause.into());
        self
    }

    pub(crate) fn new_ref_format() -> Error {
        Error::new(Kind::RefFormat)
    }

    pub(crate) fn new_ref_not_found() -> Error {
        Error::new(Kind::RefNotFound)
    }

    pub(crate) fn new_listen(cause: impl Into<Cause>) -> Error {
        Error::new(Kind::Listen).with(cause)
    }

    pub(crate) fn new_io(cause: impl Into<Cause>) -> Error {
        Error::new(Kind::Io).with(cause)
    }

    pub(crate) fn new_handler(cause: impl Into<Cause>) -> Error {
        Error::new(Kind::Handler).with(cause)
    }

    pub(crate) fn new_spawn(cause: impl Into<Cause>) -> Error {
        Error::new(Kind::Spawn).with(cause)
    }

    fn description(&self) -> &str {
        match self.inner.kind {
            Kind::RefFormat => "application reference must look like \"module:attr\"",
            Kind::RefNotFound => "no application registered under that reference",
            Kind::Listen => "error binding the shared-port listener",
            Kind::Io => "error reading or writing the connection",
            Kind::Handler => "application handler returned an error",
            Kind::Spawn => "error spawning worker process",
        }
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut builder = f.debug_struct("sparrow::Error");
        builder.field("kind", &self.inner.kind);
        if let Some(ref cause) = self.inner.cause {
            builder.field("cause", cause);
        }
        builder.finish()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())?;
        if let Some(ref cause) = self.inner.cause {
            write!(f, ": {}", cause)?;
        }
        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.inner.cause.as_ref().map(|c| &**c as _)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_cause() {
        let err = Error::new_listen(std::io::Error::new(std::io::ErrorKind::AddrInUse, "boom"));
        let s = err.to_string();
        assert!(s.contains("shared-port listener"));
        assert!(s.contains("boom"));
    }

    #[test]
    fn ref_errors_carry_no_cause() {
        let err = Error::new_ref_format();
        assert!(err.source().is_none());
    }
}
