use std::time::Duration;

use crate::network::range::DenyList;

pub const DEFAULT_RESOLVE_TIMEOUT: Duration = Duration::from_secs(3);
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(8);
pub const DEFAULT_MAX_REDIRECTS: usize = 5;
pub const DEFAULT_MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Settings for the outbound fetch guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardConfig {
    /// Ranges no resolved address may fall into.
    pub deny_list: DenyList,
    /// Upper bound for a single hostname lookup. Hitting it counts as a failed resolution.
    pub resolve_timeout: Duration,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            deny_list: DenyList::default(),
            resolve_timeout: DEFAULT_RESOLVE_TIMEOUT,
        }
    }
}

/// Settings for fetching a page once the guard has accepted it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchConfig {
    /// Total budget per request, connect through last body byte.
    pub timeout: Duration,
    pub user_agent: String,
    /// Redirect hops followed before giving up. Every hop is re-checked by the guard.
    pub max_redirects: usize,
    /// Body bytes kept. The rest of the response is dropped.
    pub max_body_bytes: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_FETCH_TIMEOUT,
            user_agent: format!("egress/{}", env!("CARGO_PKG_VERSION")),
            max_redirects: DEFAULT_MAX_REDIRECTS,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}
