//! End-to-end tests across the guard, the resolver seam and the pinned fetcher.

mod utils;
