// Intended public API surface for `got-core`.
//
// The CLI goes through this module; everything else in the crate is free to
// move.

pub use crate::core::commands::{
    add_remote, clear_local_cache, init, list_remotes, remove_remote, upgrade, ClearCacheRequest,
    ListRemotesRequest, RegisterRemoteRequest, RemoveRemoteRequest, UpgradeRequest,
};
pub use crate::core::config::context::{CommandContext, CommandInfo};
pub use crate::core::config::{CacheConfig, Config, GlobalOptions, IdentityConfig, NetworkConfig};
pub use crate::core::errors::{find_got_error, GotError};
pub use crate::core::runtime::effects::{Effects, GitClient, SharedEffects, SystemEffects};
pub use crate::core::runtime::{
    error_outcome, format_status_message, to_json_response, CommandGroup,
};
pub use crate::core::store::{CacheLocation, LocalCache};
pub use crate::core::sync::{
    add, chmod, fill_local_cache, get, mv, parse_mode, reset, rm, rm_local, status, AddRequest,
    ChmodRequest, FillCacheRequest, GetRequest, MvRequest, ResetRequest, RmLocalRequest,
    RmRequest, StatusRequest,
};
pub use crate::core::tooling::outcome::{CommandStatus, ExecutionOutcome};
