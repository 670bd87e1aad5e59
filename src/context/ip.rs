//! Caller address normalisation.

use std::net::SocketAddr;

const IPV4_MAPPED_PREFIX: &str = "::ffff:";

/// Strip an IPv4-mapped-IPv6 prefix (`::ffff:1.2.3.4` → `1.2.3.4`).
pub fn normalize_ip(raw: &str) -> String {
    raw.strip_prefix(IPV4_MAPPED_PREFIX).unwrap_or(raw).to_string()
}

/// The observed caller IP, if the connection exposed one.
pub fn client_ip(peer: Option<SocketAddr>) -> Option<String> {
    peer.map(|addr| normalize_ip(&addr.ip().to_string()))
}
