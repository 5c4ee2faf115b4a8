//! # Reserved Range Deny-List
//!
//! Address ranges the server must never be tricked into contacting on behalf of a user:
//! loopback, private LANs, link-local (which includes the cloud metadata service at
//! `169.254.169.254`), and the other special-purpose blocks.
//!
//! The list is plain configuration. Tests and local setups can punch holes in it with
//! [`DenyList::without`] or start from [`DenyList::empty`].

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

use anyhow::Context;
pub use pnet::ipnetwork::IpNetwork;

/// Loopback, RFC 1918 private space, link-local and IPv6 loopback.
const MINIMAL_RANGES: &[(IpAddr, u8)] = &[
    (IpAddr::V4(Ipv4Addr::new(10, 0, 0, 0)), 8),
    (IpAddr::V4(Ipv4Addr::new(172, 16, 0, 0)), 12),
    (IpAddr::V4(Ipv4Addr::new(192, 168, 0, 0)), 16),
    (IpAddr::V4(Ipv4Addr::new(127, 0, 0, 0)), 8),
    (IpAddr::V4(Ipv4Addr::new(169, 254, 0, 0)), 16),
    (IpAddr::V6(Ipv6Addr::LOCALHOST), 128),
];

/// Special-purpose blocks on top of [`MINIMAL_RANGES`].
const RESERVED_RANGES: &[(IpAddr, u8)] = &[
    // "this network", 0.0.0.0 reaches localhost on most stacks
    (IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)), 8),
    // carrier-grade NAT
    (IpAddr::V4(Ipv4Addr::new(100, 64, 0, 0)), 10),
    (IpAddr::V4(Ipv4Addr::new(192, 0, 0, 0)), 24),
    (IpAddr::V4(Ipv4Addr::new(192, 0, 2, 0)), 24),
    (IpAddr::V4(Ipv4Addr::new(198, 18, 0, 0)), 15),
    (IpAddr::V4(Ipv4Addr::new(198, 51, 100, 0)), 24),
    (IpAddr::V4(Ipv4Addr::new(203, 0, 113, 0)), 24),
    // multicast
    (IpAddr::V4(Ipv4Addr::new(224, 0, 0, 0)), 4),
    // reserved + limited broadcast
    (IpAddr::V4(Ipv4Addr::new(240, 0, 0, 0)), 4),
    (IpAddr::V6(Ipv6Addr::UNSPECIFIED), 128),
    // unique local
    (IpAddr::V6(Ipv6Addr::new(0xfc00, 0, 0, 0, 0, 0, 0, 0)), 7),
    // link-local
    (IpAddr::V6(Ipv6Addr::new(0xfe80, 0, 0, 0, 0, 0, 0, 0)), 10),
    // multicast
    (IpAddr::V6(Ipv6Addr::new(0xff00, 0, 0, 0, 0, 0, 0, 0)), 8),
    // documentation
    (IpAddr::V6(Ipv6Addr::new(0x2001, 0x0db8, 0, 0, 0, 0, 0, 0)), 32),
    // deprecated IPv4-compatible
    (IpAddr::V6(Ipv6Addr::UNSPECIFIED), 96),
    // local-use NAT64
    (IpAddr::V6(Ipv6Addr::new(0x64, 0xff9b, 0x1, 0, 0, 0, 0, 0)), 48),
];

/// Well-known NAT64 prefix, `64:ff9b::/96`.
const NAT64_PREFIX: [u16; 6] = [0x64, 0xff9b, 0, 0, 0, 0];

/// An ordered set of address ranges that outbound requests may not reach.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DenyList {
    ranges: Vec<IpNetwork>,
}

impl DenyList {
    /// A list that denies nothing.
    pub fn empty() -> Self {
        Self { ranges: Vec::new() }
    }

    /// Only loopback, private LANs, IPv4 link-local and `::1`.
    pub fn minimal() -> Self {
        Self::from_table(MINIMAL_RANGES)
    }

    fn from_table(table: &[(IpAddr, u8)]) -> Self {
        table
            .iter()
            .filter_map(|(ip, prefix)| IpNetwork::new(*ip, *prefix).ok())
            .fold(Self::empty(), Self::with)
    }

    /// Adds `range` unless an identical range is already listed.
    pub fn with(mut self, range: IpNetwork) -> Self {
        if !self.ranges.contains(&range) {
            self.ranges.push(range);
        }
        self
    }

    /// Removes exactly `range`. Overlapping ranges stay in place.
    pub fn without(mut self, range: IpNetwork) -> Self {
        self.ranges.retain(|listed| *listed != range);
        self
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Returns the first listed range containing `ip`.
    ///
    /// IPv4-mapped IPv6 addresses (`::ffff:a.b.c.d`) are matched as their IPv4 form.
    /// NAT64 and IPv4-compatible addresses are matched as themselves and as the IPv4
    /// address they embed.
    pub fn matching(&self, ip: IpAddr) -> Option<IpNetwork> {
        let ip: IpAddr = canonical(ip);
        let embedded: Option<IpAddr> = embedded_ipv4(ip).map(IpAddr::V4);
        self.ranges
            .iter()
            .copied()
            .find(|range| range.contains(ip) || embedded.is_some_and(|v4| range.contains(v4)))
    }

    pub fn contains(&self, ip: IpAddr) -> bool {
        self.matching(ip).is_some()
    }
}

impl Default for DenyList {
    /// [`DenyList::minimal`] extended with the remaining special-purpose blocks.
    fn default() -> Self {
        let extended: Self = Self::from_table(RESERVED_RANGES);
        extended
            .ranges
            .into_iter()
            .fold(Self::minimal(), Self::with)
    }
}

impl FromStr for DenyList {
    type Err = anyhow::Error;

    /// Parses a comma-separated list of CIDR blocks, e.g. `"10.0.0.0/8, fc00::/7"`.
    ///
    /// A bare address is taken as a single-host range.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut list: DenyList = DenyList::empty();
        for part in s.split(',') {
            let part: &str = part.trim();
            if part.is_empty() {
                continue;
            }
            let range: IpNetwork = part
                .parse()
                .with_context(|| format!("invalid range '{part}'"))?;
            list = list.with(range);
        }
        Ok(list)
    }
}

impl fmt::Display for DenyList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined: Vec<String> = self.ranges.iter().map(IpNetwork::to_string).collect();
        write!(f, "{}", joined.join(", "))
    }
}

/// Unwraps IPv4-mapped IPv6 addresses so they are judged as the IPv4 host they reach.
pub fn canonical(ip: IpAddr) -> IpAddr {
    match ip {
        IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
            Some(v4) => IpAddr::V4(v4),
            None => IpAddr::V6(v6),
        },
        v4 => v4,
    }
}

/// The IPv4 address carried in the low 32 bits of a `64:ff9b::/96` (NAT64) or `::/96`
/// (IPv4-compatible) address. A NAT64 gateway forwards the former to that IPv4 host.
fn embedded_ipv4(ip: IpAddr) -> Option<Ipv4Addr> {
    let IpAddr::V6(v6) = ip else {
        return None;
    };
    let segments: [u16; 8] = v6.segments();
    if segments[..6] != NAT64_PREFIX && segments[..6] != [0; 6] {
        return None;
    }
    let [.., a, b, c, d] = v6.octets();
    Some(Ipv4Addr::new(a, b, c, d))
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
