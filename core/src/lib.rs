//! # Egress Core
//!
//! Everything between a user-supplied URL and the text of the page behind it.
//!
//! * **[`resolver`]**: the [`resolver::Resolver`] seam over DNS.
//! * **[`guard`]**: the [`guard::OutboundGuard`] deciding whether a URL may be fetched.
//! * **[`fetch`]**: the [`fetch::PinnedFetcher`], which only connects to addresses the guard checked.
//! * **[`extract`]**: turns fetched HTML into a [`extract::PageSummary`].

pub mod extract;
pub mod fetch;
pub mod guard;
pub mod resolver;
