//! # Outbound Fetch Guard
//!
//! Decides whether the server may fetch a URL on behalf of a remote, possibly hostile, user.
//!
//! A check runs in a single pass:
//! 1. **Scheme**: only `http` and `https` get through.
//! 2. **Resolution**: the host is resolved once, under a timeout. Every failure, including
//!    the timeout and an empty answer, rejects the target.
//! 3. **Ranges**: every resolved address is tested against the deny-list.
//!
//! The accepted [`ValidatedTarget`] carries the addresses that were checked. Fetching by
//! hostname again would ask DNS a second time, and a rebinding server can answer
//! differently; the [`crate::fetch::PinnedFetcher`] connects to the checked addresses instead.
//!
//! The guard does not log rejections. Callers decide what to record.

use std::net::IpAddr;
use std::sync::Arc;

use egress_common::config::GuardConfig;
use egress_common::error::Rejection;
use egress_common::network::range::{self, DenyList};
use egress_common::network::target::{FetchTarget, TargetHost};
use tracing::trace;
use url::Url;

use crate::resolver::{Resolver, SystemResolver};

/// A target that passed every check, together with the addresses it was checked against.
///
/// Only the guard constructs these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedTarget {
    target: FetchTarget,
    addrs: Vec<IpAddr>,
}

impl ValidatedTarget {
    pub fn target(&self) -> &FetchTarget {
        &self.target
    }

    pub fn url(&self) -> &Url {
        self.target.url()
    }

    /// The primary checked address.
    pub fn addr(&self) -> IpAddr {
        // non-empty by construction
        self.addrs[0]
    }

    /// Every checked address, in resolver order.
    pub fn addrs(&self) -> &[IpAddr] {
        &self.addrs
    }
}

#[derive(Clone)]
pub struct OutboundGuard {
    config: GuardConfig,
    resolver: Arc<dyn Resolver>,
}

impl OutboundGuard {
    pub fn new(config: GuardConfig, resolver: Arc<dyn Resolver>) -> Self {
        Self { config, resolver }
    }

    /// A guard backed by the operating system's resolver.
    pub fn with_system_resolver(config: GuardConfig) -> Self {
        Self::new(config, Arc::new(SystemResolver))
    }

    pub fn deny_list(&self) -> &DenyList {
        &self.config.deny_list
    }

    /// Checks a raw user-supplied string.
    pub async fn check(&self, raw: &str) -> Result<ValidatedTarget, Rejection> {
        let target: FetchTarget = FetchTarget::parse(raw)?;
        self.check_target(target).await
    }

    /// Checks an already parsed URL, e.g. the next redirect hop.
    pub async fn check_url(&self, url: Url) -> Result<ValidatedTarget, Rejection> {
        let target: FetchTarget = FetchTarget::from_url(url)?;
        self.check_target(target).await
    }

    pub async fn check_target(&self, target: FetchTarget) -> Result<ValidatedTarget, Rejection> {
        let addrs: Vec<IpAddr> = self.resolve(target.host()).await?;

        for addr in &addrs {
            if let Some(range) = self.config.deny_list.matching(*addr) {
                return Err(Rejection::PrivateAddress {
                    host: target.host().to_string(),
                    addr: *addr,
                    range,
                });
            }
        }

        trace!(host = %target.host(), ?addrs, "target accepted");
        Ok(ValidatedTarget { target, addrs })
    }

    async fn resolve(&self, host: &TargetHost) -> Result<Vec<IpAddr>, Rejection> {
        let domain: &str = match host {
            TargetHost::Ip(ip) => return Ok(vec![range::canonical(*ip)]),
            TargetHost::Domain(domain) => domain,
        };

        let lookup = self.resolver.resolve(domain);
        let answer: Vec<IpAddr> = match tokio::time::timeout(self.config.resolve_timeout, lookup).await {
            Ok(Ok(answer)) => answer,
            Ok(Err(e)) => return Err(Rejection::resolution_failed(domain, format!("{e:#}"))),
            Err(_) => {
                let reason = format!("timed out after {:?}", self.config.resolve_timeout);
                return Err(Rejection::resolution_failed(domain, reason));
            }
        };

        let mut addrs: Vec<IpAddr> = Vec::with_capacity(answer.len());
        for addr in answer.into_iter().map(range::canonical) {
            if !addrs.contains(&addr) {
                addrs.push(addr);
            }
        }

        if addrs.is_empty() {
            return Err(Rejection::resolution_failed(domain, "no addresses"));
        }

        trace!(domain, ?addrs, "resolved");
        Ok(addrs)
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
