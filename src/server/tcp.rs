//! A `TcpListener` bound with the OS's port-sharing option enabled, so
//! sibling worker processes can bind the exact same `(host, port)` and have
//! the kernel distribute accepted connections across them (spec §4.2's
//! "shared-port requirement").

use std::net::{SocketAddr, TcpListener as StdTcpListener};

use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::TcpListener;

use crate::error::Error;
use crate::Result;

/// Binds `addr` with `SO_REUSEADDR` and, on platforms that support it,
/// `SO_REUSEPORT`.
///
/// On platforms without `SO_REUSEPORT` this still returns a listener (a
/// single bind), but the caller must not then run more than one worker
/// against the same address — see [`supports_port_sharing`].
pub fn bind(addr: SocketAddr) -> Result<TcpListener> {
    let domain = if addr.is_ipv6() {
        Domain::IPV6
    } else {
        Domain::IPV4
    };
    let socket =
        Socket::new(domain, Type::STREAM, Some(Protocol::TCP)).map_err(Error::new_listen)?;

    socket.set_reuse_address(true).map_err(Error::new_listen)?;
    set_reuse_port(&socket)?;
    socket.set_nonblocking(true).map_err(Error::new_listen)?;
    socket.bind(&addr.into()).map_err(Error::new_listen)?;
    // backlog is informational in this spec's configuration surface; a
    // generous fixed value keeps accept() from ever forcing a client retry.
    socket.listen(1024).map_err(Error::new_listen)?;

    let std_listener: StdTcpListener = socket.into();
    TcpListener::from_std(std_listener).map_err(Error::new_listen)
}

/// Whether this platform's `bind` actually shares the port across
/// processes. The `Manager` refuses `workers > 1` when this is `false`
/// (spec §4.2's degradation clause).
pub const fn supports_port_sharing() -> bool {
    cfg!(unix)
}

#[cfg(unix)]
fn set_reuse_port(socket: &Socket) -> Result<()> {
    socket.set_reuse_port(true).map_err(Error::new_listen)
}

#[cfg(not(unix))]
fn set_reuse_port(_socket: &Socket) -> Result<()> {
    Ok(())
}
