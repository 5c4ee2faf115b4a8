//! Hostname resolution behind a trait, so the guard can be driven by fake resolvers.

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use anyhow::Context;
use async_trait::async_trait;

/// Turns a hostname into the addresses a client would connect to.
///
/// Implementations report every failure as an error; the guard decides what an error means.
#[async_trait]
pub trait Resolver: Send + Sync {
    async fn resolve(&self, host: &str) -> anyhow::Result<Vec<IpAddr>>;
}

/// The operating system's resolver (`getaddrinfo` via tokio's blocking pool).
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemResolver;

#[async_trait]
impl Resolver for SystemResolver {
    async fn resolve(&self, host: &str) -> anyhow::Result<Vec<IpAddr>> {
        // lookup_host wants a port; it plays no part in the answer.
        let addrs = tokio::net::lookup_host((host, 0))
            .await
            .with_context(|| format!("looking up {host}"))?;
        Ok(addrs.map(|addr: SocketAddr| addr.ip()).collect())
    }
}

/// A fixed host table. Unknown names fail to resolve.
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    table: HashMap<String, Vec<IpAddr>>,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_host<I>(mut self, host: &str, addrs: I) -> Self
    where
        I: IntoIterator<Item = IpAddr>,
    {
        self.table
            .insert(normalize(host), addrs.into_iter().collect());
        self
    }
}

#[async_trait]
impl Resolver for StaticResolver {
    async fn resolve(&self, host: &str) -> anyhow::Result<Vec<IpAddr>> {
        self.table
            .get(&normalize(host))
            .cloned()
            .with_context(|| format!("no entry for {host}"))
    }
}

/// Hostnames compare case-insensitively and without the root label.
fn normalize(host: &str) -> String {
    host.trim_end_matches('.').to_ascii_lowercase()
}
