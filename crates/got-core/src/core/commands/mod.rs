//! Repository-level commands: remote registrations and the local cache.

mod cache;
mod remote;

pub use cache::{clear_local_cache, ClearCacheRequest};
pub use remote::{
    add_remote, init, list_remotes, remove_remote, upgrade, ListRemotesRequest,
    RegisterRemoteRequest, RemoveRemoteRequest, UpgradeRequest,
};
