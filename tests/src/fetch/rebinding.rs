#![cfg(test)]
use std::sync::Arc;

use egress_common::config::FetchConfig;
use egress_common::error::Rejection;
use egress_core::fetch::PinnedFetcher;
use egress_core::guard::OutboundGuard;

use crate::utils::{self, LOCALHOST, METADATA, SequenceResolver, TestServer};

const MARKER: &str = "<html><head><title>checked host</title></head><body>served from the checked address</body></html>";

fn serve_marker(_path: &str, _port: u16) -> String {
    utils::html(MARKER)
}

/// The resolver flips to the metadata address after the first answer, the way a
/// rebinding DNS server would. The fetch must still land on the address that was checked.
#[tokio::test]
async fn fetch_uses_the_checked_address_after_dns_flips() {
    let server = TestServer::start(serve_marker).await;
    let resolver = Arc::new(SequenceResolver::new(vec![vec![LOCALHOST], vec![METADATA]]));
    let guard = OutboundGuard::new(utils::loopback_allowed(), resolver.clone());
    let fetcher = PinnedFetcher::new(guard.clone(), FetchConfig::default());

    let url: String = server.url("rebind.test", "/");
    let validated = guard.check(&url).await.expect("first answer is allowed");
    assert_eq!(validated.addr(), LOCALHOST);
    assert_eq!(resolver.calls(), 1);

    let page = fetcher.fetch(validated).await.expect("pinned fetch succeeds");

    assert_eq!(page.remote_addr, Some(LOCALHOST));
    assert_eq!(page.body, MARKER);
    assert_eq!(server.hits(), 1);
    assert_eq!(resolver.calls(), 1, "the fetch must not resolve the host again");

    // A fresh check sees the flipped answer and refuses it.
    let rejection = guard.check(&url).await.unwrap_err();
    assert_eq!(resolver.calls(), 2);
    assert!(matches!(
        rejection,
        Rejection::PrivateAddress { addr, .. } if addr == METADATA
    ));
}

#[tokio::test]
async fn checked_answer_is_stable_across_rebinding_attempts() {
    let server = TestServer::start(serve_marker).await;
    let resolver = Arc::new(SequenceResolver::new(vec![
        vec![LOCALHOST],
        vec![METADATA],
        vec![METADATA],
    ]));
    let guard = OutboundGuard::new(utils::loopback_allowed(), resolver.clone());
    let fetcher = PinnedFetcher::new(guard.clone(), FetchConfig::default());

    let validated = guard
        .check(&server.url("rebind.test", "/"))
        .await
        .unwrap();

    // The same validated target can be fetched repeatedly without touching DNS.
    for _ in 0..3 {
        let page = fetcher.fetch(validated.clone()).await.unwrap();
        assert_eq!(page.remote_addr, Some(LOCALHOST));
    }
    assert_eq!(resolver.calls(), 1);
    assert_eq!(server.hits(), 3);
}
