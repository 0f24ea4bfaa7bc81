#![deny(clippy::all)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate
)]

pub mod hash;
pub mod ignore;
pub mod record;
pub mod remote;
pub mod repo;

pub use hash::{file_sha256, is_valid_checksum};
pub use ignore::IgnoreList;
pub use record::{sidecar_path, tracked_path_for_sidecar, TrackedFileRecord, SIDECAR_SUFFIX};
pub use remote::{
    load_registrations, registration_path, RemoteConfig, RemoteType, DEFAULT_REGISTRATION,
    GOT_DIR, REGISTRATION_VERSION,
};
pub use repo::{discover_repo_root, relative_label};
