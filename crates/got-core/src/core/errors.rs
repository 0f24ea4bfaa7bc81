use std::fmt;

use got_domain::RemoteType;

use crate::diagnostics::codes;

#[derive(Debug, thiserror::Error)]
pub enum GotError {
    #[error("{0}")]
    Configuration(String),
    #[error("'{0}' is not tracked by got")]
    NotTracked(String),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("content of '{label}' does not match checksum {expected} (got {actual})")]
    IntegrityMismatch {
        label: String,
        expected: String,
        actual: String,
    },
    #[error("remote '{name}' uses registration version {found}; this git-got supports {supported}")]
    VersionMismatch {
        name: String,
        found: u32,
        supported: u32,
    },
    #[error("Argument '{0}' is not located in the git repository")]
    OutsideRepository(String),
    #[error("{0}")]
    Usage(String),
}

impl GotError {
    pub(crate) fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub(crate) fn usage(message: impl Into<String>) -> Self {
        Self::Usage(message.into())
    }

    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            GotError::Configuration(_) => codes::CONFIGURATION,
            GotError::NotTracked(_) => codes::NOT_TRACKED,
            GotError::Transport(_) => codes::TRANSPORT,
            GotError::IntegrityMismatch { .. } => codes::INTEGRITY,
            GotError::VersionMismatch { .. } => codes::VERSION,
            GotError::OutsideRepository(_) => codes::OUTSIDE_REPOSITORY,
            GotError::Usage(_) => codes::USAGE,
        }
    }

    #[must_use]
    pub fn reason(&self) -> &'static str {
        match self {
            GotError::Configuration(_) => "configuration",
            GotError::NotTracked(_) => "not_tracked",
            GotError::Transport(_) => "transport",
            GotError::IntegrityMismatch { .. } => "integrity_mismatch",
            GotError::VersionMismatch { .. } => "version_mismatch",
            GotError::OutsideRepository(_) => "outside_repository",
            GotError::Usage(_) => "usage",
        }
    }

    /// Errors the user can fix by changing arguments or repository setup.
    #[must_use]
    pub fn is_user_error(&self) -> bool {
        !matches!(
            self,
            GotError::Transport(_) | GotError::IntegrityMismatch { .. }
        )
    }

    #[must_use]
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            GotError::VersionMismatch { .. } => {
                Some("Version of got repository requires upgrading, run `git got upgrade`")
            }
            GotError::NotTracked(_) => Some("track it first with `git got add <file>`"),
            GotError::Transport(_) => Some("check connectivity and credentials for the remote, then retry"),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferOp {
    Connect,
    Stat,
    Upload,
    Download,
}

impl fmt::Display for TransferOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TransferOp::Connect => "connect",
            TransferOp::Stat => "stat",
            TransferOp::Upload => "upload",
            TransferOp::Download => "download",
        })
    }
}

/// A failed remote operation, tagged with the backend and the file involved.
#[derive(Debug, thiserror::Error)]
#[error("{backend} {operation} failed for '{filename}': {message}")]
pub struct TransportError {
    pub backend: RemoteType,
    pub operation: TransferOp,
    pub filename: String,
    pub message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl TransportError {
    pub(crate) fn new(
        backend: RemoteType,
        operation: TransferOp,
        filename: &str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            backend,
            operation,
            filename: filename.to_string(),
            message: message.into(),
            source: None,
        }
    }

    pub(crate) fn wrap<E>(backend: RemoteType, operation: TransferOp, filename: &str, err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self {
            backend,
            operation,
            filename: filename.to_string(),
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

/// First [`GotError`] found anywhere in an error chain.
pub fn find_got_error(err: &anyhow::Error) -> Option<&GotError> {
    err.chain().find_map(|cause| cause.downcast_ref::<GotError>())
}
