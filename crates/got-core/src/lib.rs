#![deny(clippy::all)]

mod core;

pub(crate) use crate::core::config;
pub(crate) use crate::core::runtime::effects;
pub(crate) use crate::core::tooling::{diagnostics, outcome, progress};
pub(crate) use crate::core::{errors, fs, store, sync};

pub mod api;

pub use crate::core::config::context::{CommandContext, CommandInfo};
pub use crate::core::config::{CacheConfig, Config, GlobalOptions, IdentityConfig, NetworkConfig};
pub use crate::core::errors::{find_got_error, GotError, TransferOp, TransportError};
pub use crate::core::runtime::effects::SystemEffects;
pub use crate::core::runtime::{error_outcome, format_status_message, to_json_response, CommandGroup};
pub use crate::core::tooling::outcome::{CommandStatus, ExecutionOutcome};
