#![cfg(test)]
use std::net::IpAddr;
use std::sync::Arc;

use egress_common::config::GuardConfig;
use egress_common::error::{Rejection, RejectionKind};
use egress_core::guard::OutboundGuard;
use egress_core::resolver::StaticResolver;

use crate::utils::{METADATA, SequenceResolver};

const PUBLIC: IpAddr = IpAddr::V4(std::net::Ipv4Addr::new(93, 184, 216, 34));

/// Uses the machine's resolver: `.test` is reserved and never resolves.
#[tokio::test]
async fn system_resolver_fails_closed_on_nxdomain() {
    let guard = OutboundGuard::with_system_resolver(GuardConfig::default());
    let rejection = guard
        .check("https://this-domain-does-not-exist-xyz123.test/")
        .await
        .unwrap_err();
    assert_eq!(rejection.kind(), RejectionKind::ResolutionFailed);
}

#[tokio::test]
async fn system_resolver_never_accepts_localhost() {
    let guard = OutboundGuard::with_system_resolver(GuardConfig::default());
    let rejection = guard.check("http://localhost:8080/").await.unwrap_err();
    assert!(matches!(
        rejection.kind(),
        RejectionKind::PrivateAddress | RejectionKind::ResolutionFailed
    ));
}

#[tokio::test]
async fn public_answer_is_reported_exactly() {
    let resolver = Arc::new(SequenceResolver::new(vec![vec![PUBLIC]]));
    let guard = OutboundGuard::new(GuardConfig::default(), resolver.clone());

    let first = guard.check("http://example.com/").await.unwrap();
    let second = guard.check("http://example.com/").await.unwrap();

    assert_eq!(first.addrs(), &[PUBLIC]);
    assert_eq!(first, second);
    assert_eq!(resolver.calls(), 2);
}

#[tokio::test]
async fn guard_is_shared_across_tasks() {
    let resolver = StaticResolver::new()
        .with_host("example.com", [PUBLIC])
        .with_host("metadata.test", [METADATA]);
    let guard = OutboundGuard::new(GuardConfig::default(), Arc::new(resolver));

    let mut handles = Vec::new();
    for i in 0..16 {
        let guard = guard.clone();
        handles.push(tokio::spawn(async move {
            let url = if i % 2 == 0 {
                "https://example.com/"
            } else {
                "http://metadata.test/"
            };
            (i, guard.check(url).await)
        }));
    }

    for handle in handles {
        let (i, result) = handle.await.unwrap();
        if i % 2 == 0 {
            assert_eq!(result.unwrap().addr(), PUBLIC);
        } else {
            assert!(matches!(
                result,
                Err(Rejection::PrivateAddress { addr, .. }) if addr == METADATA
            ));
        }
    }
}
