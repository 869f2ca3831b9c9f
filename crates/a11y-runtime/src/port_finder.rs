//! Port finding for the local site server.

use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, TcpListener};

use a11y_core::ports::{PortFinder, ServerError};
use async_trait::async_trait;
use tracing::debug;

/// Attempts at finding an OS-assigned port that is also free on `::1`.
const EPHEMERAL_ATTEMPTS: usize = 8;

/// Check if a port is available on both loopback addresses by attempting to
/// bind to it. The listeners are dropped immediately, which releases the port.
///
/// A host without IPv6 loopback only needs the IPv4 side to be free.
pub fn is_port_available(port: u16) -> bool {
    match TcpListener::bind((Ipv4Addr::LOCALHOST, port)) {
        // Hold the IPv4 side while probing IPv6 so both see the same port
        Ok(_v4) => is_free_on_ipv6_loopback(port),
        Err(_) => false,
    }
}

fn is_free_on_ipv6_loopback(port: u16) -> bool {
    match TcpListener::bind((Ipv6Addr::LOCALHOST, port)) {
        Ok(_) => true,
        Err(e) => e.kind() != io::ErrorKind::AddrInUse,
    }
}

/// Ask the OS for a free ephemeral port.
fn ephemeral_port() -> Result<u16, ServerError> {
    for _ in 0..EPHEMERAL_ATTEMPTS {
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0))
            .map_err(|e| ServerError::NoAvailablePort(e.to_string()))?;
        let port = listener
            .local_addr()
            .map_err(|e| ServerError::NoAvailablePort(e.to_string()))?
            .port();
        if is_free_on_ipv6_loopback(port) {
            return Ok(port);
        }
        debug!(port = %port, "Ephemeral port taken on ::1, retrying");
    }

    Err(ServerError::NoAvailablePort(format!(
        "no port free on both loopback addresses after {EPHEMERAL_ATTEMPTS} attempts"
    )))
}

/// [`PortFinder`] backed by the local TCP stack.
///
/// Honors the preferred port when it is free and falls back to an
/// OS-assigned port otherwise.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalPortFinder;

impl LocalPortFinder {
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PortFinder for LocalPortFinder {
    async fn get_port(&self, preferred: Option<u16>) -> Result<u16, ServerError> {
        if let Some(port) = preferred.filter(|&p| p != 0) {
            if is_port_available(port) {
                debug!(port = %port, "Preferred port is available");
                return Ok(port);
            }
            debug!(port = %port, "Preferred port unavailable, asking the OS for one");
        }

        let port = ephemeral_port()?;
        debug!(port = %port, "Allocated ephemeral port");
        Ok(port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn finds_a_bindable_port() {
        let port = LocalPortFinder::new().get_port(None).await.unwrap();
        assert_ne!(port, 0);
        assert!(is_port_available(port));
    }

    #[tokio::test]
    async fn honors_free_preferred_port() {
        let free = ephemeral_port().unwrap();
        let port = LocalPortFinder::new().get_port(Some(free)).await.unwrap();
        assert_eq!(port, free);
    }

    #[tokio::test]
    async fn falls_back_when_preferred_port_is_taken() {
        let held = TcpListener::bind(("127.0.0.1", 0)).unwrap();
        let taken = held.local_addr().unwrap().port();

        let port = LocalPortFinder::new().get_port(Some(taken)).await.unwrap();

        assert_ne!(port, taken);
        assert!(!is_port_available(taken));
    }

    #[tokio::test]
    async fn port_held_on_ipv6_loopback_is_not_available() {
        // Hosts without IPv6 loopback have nothing to check here
        let Ok(held) = TcpListener::bind((Ipv6Addr::LOCALHOST, 0)) else {
            return;
        };
        let taken = held.local_addr().unwrap().port();

        assert!(!is_port_available(taken));

        let port = LocalPortFinder::new().get_port(Some(taken)).await.unwrap();
        assert_ne!(port, taken);
    }
}
