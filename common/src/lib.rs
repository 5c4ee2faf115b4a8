//! # Egress Common
//!
//! Shared data model for the outbound fetch guard:
//!
//! * **[`network::target`]**: parsing user-supplied URLs into a [`network::target::FetchTarget`].
//! * **[`network::range`]**: the deny-list of reserved address ranges.
//! * **[`error`]**: the typed [`error::Rejection`] returned by every failed check.
//! * **[`config`]**: explicit configuration threaded into the guard and fetcher.

pub mod config;
pub mod error;
pub mod macros;
pub mod network;

#[doc(hidden)]
pub use tracing as __tracing;
