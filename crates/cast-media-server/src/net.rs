use std::net::{IpAddr, Ipv4Addr};

/// Returns `override_addr` if given, otherwise the first non-loopback IPv4
/// address of any active interface, or loopback with a warning if none is
/// found (the receiver then cannot reach this server, but the caller may
/// still be testing locally).
pub fn lan_ipv4(override_addr: Option<Ipv4Addr>) -> Ipv4Addr {
    if let Some(addr) = override_addr {
        return addr;
    }
    match local_ipv4_via_udp_probe() {
        Some(addr) => addr,
        None => {
            tracing::warn!("could not detect a LAN IPv4 address, falling back to loopback");
            Ipv4Addr::LOCALHOST
        }
    }
}

/// Asks the OS which local address it would use to reach a public host,
/// without sending any traffic — a UDP "connect" just resolves routing.
fn local_ipv4_via_udp_probe() -> Option<Ipv4Addr> {
    let socket = std::net::UdpSocket::bind("0.0.0.0:0").ok()?;
    socket.connect(("8.8.8.8", 80)).ok()?;
    match socket.local_addr().ok()?.ip() {
        IpAddr::V4(addr) if !addr.is_loopback() => Some(addr),
        _ => None,
    }
}
