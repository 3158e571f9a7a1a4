//! `URL -> bytes` and `URL -> file` fetching with local-path passthrough and
//! a URL-hash-keyed disk cache (§2, §4.6). This is the only network-facing
//! crate in the workspace.

mod cache;
mod client;
mod error;

pub use cache::{default_cache_root, DiskCache};
pub use client::{FetchClient, FetchClientBuilder, DEFAULT_USER_AGENT};
pub use error::FetchError;
