//! Public IP classification

use ipnet::IpNet;
use lazy_static::lazy_static;
use std::net::{IpAddr, Ipv6Addr};

lazy_static! {
    /// Ranges that never get allow-listed, on top of loopback and link-local
    static ref NON_PUBLIC_NETWORKS: Vec<IpNet> = [
        "10.0.0.0/8",
        "172.16.0.0/12",
        "192.168.0.0/16",
        "100.64.0.0/10", // CGNAT
        "fc00::/7",      // unique local
        "fe80::/10",     // link-local
    ]
    .iter()
    .map(|cidr| cidr.parse().expect("static CIDR literal"))
    .collect();
}

/// Whether `ip` is a routable public address.
///
/// IPv4-mapped IPv6 addresses are judged by their embedded IPv4 address.
pub fn is_public(ip: IpAddr) -> bool {
    let ip = ip.to_canonical();

    if ip.is_loopback() || is_link_local_unicast(&ip) || is_link_local_multicast(&ip) {
        return false;
    }

    !NON_PUBLIC_NETWORKS
        .iter()
        .any(|network| network.contains(&ip))
}

fn is_link_local_unicast(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => v4.is_link_local(),
        IpAddr::V6(v6) => (v6.segments()[0] & 0xffc0) == 0xfe80,
    }
}

fn is_link_local_multicast(ip: &IpAddr) -> bool {
    match ip {
        // 224.0.0.0/24
        IpAddr::V4(v4) => matches!(v4.octets(), [224, 0, 0, _]),
        // ffX2::/16, any flags with link-local scope
        IpAddr::V6(v6) => is_v6_link_local_multicast(v6),
    }
}

fn is_v6_link_local_multicast(v6: &Ipv6Addr) -> bool {
    let octets = v6.octets();
    octets[0] == 0xff && (octets[1] & 0x0f) == 0x02
}
