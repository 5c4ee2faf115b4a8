//! # Pinned Fetcher
//!
//! Performs the actual GET for a [`ValidatedTarget`], connecting only to the addresses the
//! guard already checked.
//!
//! * DNS for the target host is overridden with the checked addresses, so no second lookup
//!   happens between check and use.
//! * Proxies are disabled; a proxy would resolve the name again on its own.
//! * Redirects are followed by hand. Each `Location` is put through the guard before the
//!   next hop is requested.
//! * The body is read up to a byte cap and decoded lossily.

use std::net::{IpAddr, SocketAddr};

use egress_common::config::FetchConfig;
use egress_common::error::{Rejection, UNREACHABLE_MESSAGE};
use egress_common::network::target::TargetHost;
use reqwest::header::LOCATION;
use reqwest::redirect::Policy;
use reqwest::{Client, Response, StatusCode};
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::guard::{OutboundGuard, ValidatedTarget};

#[derive(Debug, Error)]
pub enum FetchError {
    /// A redirect hop failed the guard.
    #[error("redirect refused: {0}")]
    Rejected(#[from] Rejection),

    #[error("could not build HTTP client")]
    Client(#[source] reqwest::Error),

    #[error("request failed")]
    Request(#[source] reqwest::Error),

    #[error("server answered {status}")]
    Status { status: StatusCode },

    #[error("redirect {status} without a usable Location header")]
    MissingLocation { status: StatusCode },

    #[error("more than {limit} redirects")]
    TooManyRedirects { limit: usize },
}

impl FetchError {
    /// Text safe to show the user who submitted the URL.
    ///
    /// The submitted URL already passed the guard, so nothing about later hops is revealed.
    pub fn user_message(&self) -> &'static str {
        UNREACHABLE_MESSAGE
    }
}

/// The response to a pinned fetch.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// URL of the final hop.
    pub url: Url,
    /// The peer the final response came from, when the client reports it.
    pub remote_addr: Option<IpAddr>,
    pub status: StatusCode,
    pub redirects: usize,
    pub body: String,
    /// Whether the body hit the size cap.
    pub truncated: bool,
}

pub struct PinnedFetcher {
    guard: OutboundGuard,
    config: FetchConfig,
}

impl PinnedFetcher {
    /// `guard` re-checks redirect hops; it should be the guard that produced the targets.
    pub fn new(guard: OutboundGuard, config: FetchConfig) -> Self {
        Self { guard, config }
    }

    pub async fn fetch(&self, target: ValidatedTarget) -> Result<FetchedPage, FetchError> {
        let mut current: ValidatedTarget = target;
        let mut redirects: usize = 0;

        loop {
            let response: Response = self.send(&current).await?;
            let status: StatusCode = response.status();

            if is_followed_redirect(status) {
                let next: Url = redirect_location(&current, &response)
                    .ok_or(FetchError::MissingLocation { status })?;

                if redirects == self.config.max_redirects {
                    return Err(FetchError::TooManyRedirects {
                        limit: self.config.max_redirects,
                    });
                }
                redirects += 1;

                debug!(from = %current.url(), to = %next, status = status.as_u16(), "following redirect");
                current = self.guard.check_url(next).await?;
                continue;
            }

            if !status.is_success() {
                return Err(FetchError::Status { status });
            }

            return self.read_page(current, response, redirects).await;
        }
    }

    async fn send(&self, target: &ValidatedTarget) -> Result<Response, FetchError> {
        let mut builder = Client::builder()
            .redirect(Policy::none())
            .no_proxy()
            .timeout(self.config.timeout)
            .user_agent(self.config.user_agent.as_str());

        if let TargetHost::Domain(domain) = target.target().host() {
            let port: u16 = target.target().port();
            let pinned: Vec<SocketAddr> = target
                .addrs()
                .iter()
                .map(|ip| SocketAddr::new(*ip, port))
                .collect();
            builder = builder.resolve_to_addrs(domain, &pinned);
        }

        let client: Client = builder.build().map_err(FetchError::Client)?;
        debug!(url = %target.url(), addrs = ?target.addrs(), "sending pinned request");

        client
            .get(target.url().clone())
            .send()
            .await
            .map_err(FetchError::Request)
    }

    async fn read_page(
        &self,
        target: ValidatedTarget,
        mut response: Response,
        redirects: usize,
    ) -> Result<FetchedPage, FetchError> {
        let status: StatusCode = response.status();
        let remote_addr: Option<IpAddr> = response.remote_addr().map(|addr| addr.ip());
        let cap: usize = self.config.max_body_bytes;

        let mut body: Vec<u8> = Vec::new();
        let mut truncated: bool = false;
        while let Some(chunk) = response.chunk().await.map_err(FetchError::Request)? {
            let room: usize = cap - body.len();
            if chunk.len() > room {
                body.extend_from_slice(&chunk[..room]);
                truncated = true;
                break;
            }
            body.extend_from_slice(&chunk);
        }

        Ok(FetchedPage {
            url: target.url().clone(),
            remote_addr,
            status,
            redirects,
            body: String::from_utf8_lossy(&body).into_owned(),
            truncated,
        })
    }
}

fn redirect_location(current: &ValidatedTarget, response: &Response) -> Option<Url> {
    let location: &str = response.headers().get(LOCATION)?.to_str().ok()?;
    current.url().join(location).ok()
}

/// Statuses that carry a `Location` to follow. Other 3xx answers end the fetch.
fn is_followed_redirect(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::MOVED_PERMANENTLY
            | StatusCode::FOUND
            | StatusCode::SEE_OTHER
            | StatusCode::TEMPORARY_REDIRECT
            | StatusCode::PERMANENT_REDIRECT
    )
}
