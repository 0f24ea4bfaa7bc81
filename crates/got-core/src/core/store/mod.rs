//! Content storage: the local cache, the remote transports, and the stores
//! that compose them.

mod cache;
mod caching;
mod registry;
pub mod transport;

pub use cache::{CacheFill, CacheLocation, LocalCache};
pub(crate) use cache::resolve_cache_location;
pub use caching::{CachingStore, LoadSource};
pub use registry::{ensure_supported_versions, Registry};
pub(crate) use registry::NOT_INITIALIZED;
pub use transport::{
    connect_transport, validate_remote_url, StoreOutcome, Transfer, Transport, TransportOptions,
};

const USER_AGENT: &str = concat!("git-got/", env!("CARGO_PKG_VERSION"));
