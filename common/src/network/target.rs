//! # Fetch Target Model
//!
//! Turns the raw string a user submitted into something the guard can reason about.
//!
//! Parsing follows the WHATWG URL rules (the `url` crate), so the host seen here is the
//! host an HTTP client would connect to. That matters for inputs like
//! `http://2130706433/` or `http://0x7f.1/`, which browsers and clients treat as
//! `127.0.0.1`.
//!
//! Parsing never fails with anything but a [`Rejection`]:
//! * a missing or non-`http(s)` scheme is [`Rejection::InvalidScheme`],
//! * a missing or malformed host is [`Rejection::ResolutionFailed`].

use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use url::{Host, ParseError, Url};

use crate::error::Rejection;

const ALLOWED_SCHEMES: [&str; 2] = ["http", "https"];

/// Where a target points before any DNS lookup happens.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TargetHost {
    /// A name that still has to go through a resolver.
    Domain(String),
    /// An address literal. It is its own resolution.
    Ip(IpAddr),
}

impl fmt::Display for TargetHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetHost::Domain(domain) => f.write_str(domain),
            TargetHost::Ip(ip) => write!(f, "{ip}"),
        }
    }
}

/// A candidate URL submitted by an end user.
///
/// Constructed per request and never persisted. A `FetchTarget` has only passed the
/// syntactic checks; it is not safe to fetch until the guard has resolved and
/// checked it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTarget {
    raw: String,
    url: Url,
    host: TargetHost,
    port: u16,
}

impl FetchTarget {
    /// Parses a user-supplied string.
    pub fn parse(raw: &str) -> Result<Self, Rejection> {
        let trimmed: &str = raw.trim();

        let url: Url = match Url::parse(trimmed) {
            Ok(url) => url,
            Err(ParseError::RelativeUrlWithoutBase) => {
                return Err(Rejection::invalid_scheme(""));
            }
            Err(e) => {
                // Judge the scheme first even when the rest is garbage.
                let scheme: &str = scheme_prefix(trimmed).unwrap_or_default();
                if !is_allowed_scheme(scheme) {
                    return Err(Rejection::invalid_scheme(scheme));
                }
                return Err(Rejection::resolution_failed(trimmed, e));
            }
        };

        let mut target: Self = Self::from_url(url)?;
        target.raw = raw.to_string();
        Ok(target)
    }

    /// Builds a target from an already parsed URL, e.g. a redirect `Location`
    /// joined onto the previous hop.
    pub fn from_url(url: Url) -> Result<Self, Rejection> {
        if !is_allowed_scheme(url.scheme()) {
            return Err(Rejection::invalid_scheme(url.scheme()));
        }

        let host: TargetHost = match url.host() {
            Some(Host::Domain(domain)) => TargetHost::Domain(domain.to_string()),
            Some(Host::Ipv4(v4)) => TargetHost::Ip(IpAddr::V4(v4)),
            Some(Host::Ipv6(v6)) => TargetHost::Ip(IpAddr::V6(v6)),
            None => return Err(Rejection::resolution_failed(url.as_str(), "no host")),
        };

        let port: u16 = url
            .port_or_known_default()
            .ok_or_else(|| Rejection::resolution_failed(host.to_string(), "no port"))?;

        Ok(Self {
            raw: url.to_string(),
            url,
            host,
            port,
        })
    }

    /// The string exactly as submitted.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn scheme(&self) -> &str {
        self.url.scheme()
    }

    pub fn host(&self) -> &TargetHost {
        &self.host
    }

    /// Explicit port, or the scheme's default.
    pub fn port(&self) -> u16 {
        self.port
    }
}

impl FromStr for FetchTarget {
    type Err = Rejection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for FetchTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.url)
    }
}

fn is_allowed_scheme(scheme: &str) -> bool {
    ALLOWED_SCHEMES
        .iter()
        .any(|allowed| allowed.eq_ignore_ascii_case(scheme))
}

/// Extracts `scheme` from `scheme:rest` when the prefix is a syntactically valid scheme.
fn scheme_prefix(s: &str) -> Option<&str> {
    let (scheme, _) = s.split_once(':')?;
    let mut chars = scheme.chars();
    let first: char = chars.next()?;
    let valid: bool = first.is_ascii_alphabetic()
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    valid.then_some(scheme)
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
