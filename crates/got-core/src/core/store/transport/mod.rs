//! Remote backends. Every transport addresses objects by checksum and
//! reports failures as [`TransportError`]s tagged with its backend.

use std::path::{Path, PathBuf};
use std::time::Duration;

use got_domain::{RemoteConfig, RemoteType};
use url::Url;

use crate::config::Config;
use crate::errors::{GotError, TransportError};

mod file;
mod ftp;
mod scp;
mod srr;

pub(crate) use file::FileTransport;
pub(crate) use ftp::FtpTransport;
pub(crate) use scp::ScpTransport;
pub(crate) use srr::SrrTransport;

/// Suffix appended to the checksum by path-addressed backends.
pub(crate) const OBJECT_SUFFIX: &str = ".got";

/// One object moving between `local` and the remote.
#[derive(Debug, Clone, Copy)]
pub struct Transfer<'a> {
    pub local: &'a Path,
    pub label: &'a str,
    pub checksum: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOutcome {
    Uploaded,
    AlreadyPresent,
}

pub trait Transport: Send + Sync {
    fn remote_type(&self) -> RemoteType;

    fn url(&self) -> &Url;

    /// Whether the remote already holds an object for this checksum.
    fn exists(&self, transfer: &Transfer<'_>) -> Result<bool, TransportError>;

    /// Writes the remote object into `transfer.local`.
    fn fetch(&self, transfer: &Transfer<'_>) -> Result<(), TransportError>;

    /// Unconditionally publishes `transfer.local`.
    fn upload(&self, transfer: &Transfer<'_>) -> Result<(), TransportError>;

    /// Publishes unless the object is already there; the first writer wins.
    fn store(&self, transfer: &Transfer<'_>) -> Result<StoreOutcome, TransportError> {
        if self.exists(transfer)? {
            tracing::debug!(
                backend = %self.remote_type(),
                checksum = transfer.checksum,
                "object already on remote; skipping upload"
            );
            return Ok(StoreOutcome::AlreadyPresent);
        }
        self.upload(transfer)?;
        Ok(StoreOutcome::Uploaded)
    }
}

/// Settings shared by every transport built during one invocation.
#[derive(Debug, Clone)]
pub struct TransportOptions {
    pub http_timeout: Duration,
    pub user: Option<String>,
    pub home: Option<PathBuf>,
}

impl TransportOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            http_timeout: config.network().http_timeout,
            user: config.identity().user.clone(),
            home: config.identity().home.clone(),
        }
    }
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            http_timeout: Duration::from_secs(300),
            user: None,
            home: None,
        }
    }
}

/// Parses `url` and checks that `remote_type` accepts its scheme.
pub fn validate_remote_url(remote_type: RemoteType, url: &str) -> Result<Url, GotError> {
    let parsed = Url::parse(url)
        .map_err(|err| GotError::configuration(format!("Invalid remote URL '{url}': {err}")))?;
    let accepted = remote_type.schemes();
    if !accepted.contains(&parsed.scheme()) {
        return Err(GotError::configuration(format!(
            "Remote type '{remote_type}' does not support URL scheme '{}' (expected {})",
            parsed.scheme(),
            accepted.join(" or "),
        )));
    }
    Ok(parsed)
}

/// Builds the transport for one registration. No network traffic happens
/// until the first operation.
pub fn connect_transport(
    config: &RemoteConfig,
    options: &TransportOptions,
) -> Result<Box<dyn Transport>, GotError> {
    let url = validate_remote_url(config.remote_type, &config.url)?;
    let hostless = url.host_str().map_or(true, str::is_empty);
    if hostless && !matches!(config.remote_type, RemoteType::File) {
        return Err(GotError::configuration(format!(
            "Remote '{}' URL '{}' has no host",
            config.name, config.url
        )));
    }
    let transport: Box<dyn Transport> = match config.remote_type {
        RemoteType::Scp => Box::new(ScpTransport::new(url, options)),
        RemoteType::Srr => Box::new(SrrTransport::new(url, options)?),
        RemoteType::File => Box::new(FileTransport::new(url)?),
        RemoteType::Ftp => Box::new(FtpTransport::new(url)),
    };
    Ok(transport)
}

/// `<url path>/<checksum>.got` for path-addressed backends.
pub(crate) fn object_path(base: &str, checksum: &str) -> String {
    let base = base.trim_end_matches('/');
    if base.is_empty() {
        format!("{checksum}{OBJECT_SUFFIX}")
    } else {
        format!("{base}/{checksum}{OBJECT_SUFFIX}")
    }
}
