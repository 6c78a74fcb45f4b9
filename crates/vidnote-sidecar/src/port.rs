//! Loopback port allocation.

use std::io;
use std::net::{Ipv4Addr, TcpListener};

/// Check if a loopback port can be bound right now.
///
/// Binds and immediately drops the listener, which releases the port.
pub fn is_port_available(port: u16) -> bool {
    TcpListener::bind((Ipv4Addr::LOCALHOST, port))
        .and_then(|listener| listener.local_addr())
        .is_ok()
}

/// Resolve the port to serve on.
///
/// A non-zero `requested` port is returned as-is. Zero asks the OS for a
/// free ephemeral port; the probe socket is released before returning, so
/// the port is only known to be free at the instant of the call.
pub fn allocate_port(requested: u16) -> io::Result<u16> {
    if requested != 0 {
        return Ok(requested);
    }

    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0))?;
    let port = listener.local_addr()?.port();
    tracing::debug!(port, "Allocated ephemeral port");
    Ok(port)
}
