use std::fs::{self, File};
use std::net::TcpStream;
use std::path::{Path, PathBuf};

use got_domain::RemoteType;
use ssh2::{CheckResult, ErrorCode, KnownHostFileKind, Session, Sftp};
use tracing::{debug, info};
use url::Url;

use super::{object_path, Transfer, Transport, TransportOptions};
use crate::errors::{TransferOp, TransportError};
use crate::fs::copy_blocks;
use crate::progress::TransferProgress;

const DEFAULT_PORT: u16 = 22;
const BLOCK_SIZE: usize = 32 * 1024;
const IDENTITY_FILES: [&str; 3] = ["id_ed25519", "id_ecdsa", "id_rsa"];
// LIBSSH2_FX_NO_SUCH_FILE
const SFTP_NO_SUCH_FILE: i32 = 2;

/// Objects kept in a directory on an SSH host, moved over SFTP.
pub(crate) struct ScpTransport {
    url: Url,
    user: Option<String>,
    home: Option<PathBuf>,
}

impl ScpTransport {
    pub(crate) fn new(url: Url, options: &TransportOptions) -> Self {
        Self {
            url,
            user: options.user.clone(),
            home: options.home.clone(),
        }
    }

    fn host(&self) -> &str {
        self.url.host_str().unwrap_or_default()
    }

    fn port(&self) -> u16 {
        self.url.port().unwrap_or(DEFAULT_PORT)
    }

    fn user(&self) -> Option<&str> {
        Some(self.url.username())
            .filter(|name| !name.is_empty())
            .or(self.user.as_deref())
    }

    fn fail(op: TransferOp, filename: &str, message: impl Into<String>) -> TransportError {
        TransportError::new(RemoteType::Scp, op, filename, message)
    }

    fn wrap<E>(op: TransferOp, filename: &str, err: E) -> TransportError
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        TransportError::wrap(RemoteType::Scp, op, filename, err)
    }

    fn open_sftp(&self, filename: &str) -> Result<(Session, Sftp), TransportError> {
        let session = self.connect(filename)?;
        let sftp = session
            .sftp()
            .map_err(|err| Self::wrap(TransferOp::Connect, filename, err))?;
        Ok((session, sftp))
    }

    fn connect(&self, filename: &str) -> Result<Session, TransportError> {
        let (host, port) = (self.host(), self.port());
        debug!(host, port, "connecting over ssh");
        let tcp = TcpStream::connect((host, port))
            .map_err(|err| Self::wrap(TransferOp::Connect, filename, err))?;
        let mut session =
            Session::new().map_err(|err| Self::wrap(TransferOp::Connect, filename, err))?;
        session.set_tcp_stream(tcp);
        session
            .handshake()
            .map_err(|err| Self::wrap(TransferOp::Connect, filename, err))?;
        self.verify_host_key(&session, filename)?;
        self.authenticate(&session, filename)?;
        Ok(session)
    }

    /// Unknown hosts are trusted and recorded; a changed key is refused.
    fn verify_host_key(&self, session: &Session, filename: &str) -> Result<(), TransportError> {
        let (host, port) = (self.host(), self.port());
        let (key, key_type) = session
            .host_key()
            .map(|(key, kind)| (key.to_vec(), kind))
            .ok_or_else(|| Self::fail(TransferOp::Connect, filename, "server sent no host key"))?;
        let mut known = session
            .known_hosts()
            .map_err(|err| Self::wrap(TransferOp::Connect, filename, err))?;
        let known_hosts = self.ssh_dir().map(|dir| dir.join("known_hosts"));
        if let Some(path) = known_hosts.as_deref().filter(|path| path.is_file()) {
            known
                .read_file(path, KnownHostFileKind::OpenSSH)
                .map_err(|err| Self::wrap(TransferOp::Connect, filename, err))?;
        }
        match known.check_port(host, port, &key) {
            CheckResult::Match => Ok(()),
            CheckResult::NotFound => {
                let entry = if port == DEFAULT_PORT {
                    host.to_string()
                } else {
                    format!("[{host}]:{port}")
                };
                known
                    .add(&entry, &key, "added by git-got", key_type.into())
                    .map_err(|err| Self::wrap(TransferOp::Connect, filename, err))?;
                if let Some(path) = known_hosts.as_deref() {
                    if let Some(parent) = path.parent() {
                        fs::create_dir_all(parent)
                            .map_err(|err| Self::wrap(TransferOp::Connect, filename, err))?;
                    }
                    known
                        .write_file(path, KnownHostFileKind::OpenSSH)
                        .map_err(|err| Self::wrap(TransferOp::Connect, filename, err))?;
                }
                info!(host = %entry, "added host key to known_hosts");
                Ok(())
            }
            CheckResult::Mismatch => Err(Self::fail(
                TransferOp::Connect,
                filename,
                format!("host key for {host} does not match known_hosts"),
            )),
            CheckResult::Failure => Err(Self::fail(
                TransferOp::Connect,
                filename,
                format!("unable to verify host key for {host}"),
            )),
        }
    }

    fn authenticate(&self, session: &Session, filename: &str) -> Result<(), TransportError> {
        let user = self.user().ok_or_else(|| {
            Self::fail(TransferOp::Connect, filename, "no user name for ssh login")
        })?;
        if session.userauth_agent(user).is_ok() && session.authenticated() {
            debug!(user, "authenticated with ssh agent");
            return Ok(());
        }
        if let Some(dir) = self.ssh_dir() {
            for name in IDENTITY_FILES {
                let key = dir.join(name);
                if key.is_file()
                    && session.userauth_pubkey_file(user, None, &key, None).is_ok()
                    && session.authenticated()
                {
                    debug!(user, key = %key.display(), "authenticated with identity file");
                    return Ok(());
                }
            }
        }
        if let Some(password) = self.url.password() {
            session
                .userauth_password(user, password)
                .map_err(|err| Self::wrap(TransferOp::Connect, filename, err))?;
        }
        if session.authenticated() {
            Ok(())
        } else {
            Err(Self::fail(
                TransferOp::Connect,
                filename,
                format!("authentication failed for {user}@{}", self.host()),
            ))
        }
    }

    fn ssh_dir(&self) -> Option<PathBuf> {
        self.home.as_ref().map(|home| home.join(".ssh"))
    }

    fn object(&self, checksum: &str) -> PathBuf {
        PathBuf::from(object_path(self.url.path(), checksum))
    }
}

impl Transport for ScpTransport {
    fn remote_type(&self) -> RemoteType {
        RemoteType::Scp
    }

    fn url(&self) -> &Url {
        &self.url
    }

    fn exists(&self, transfer: &Transfer<'_>) -> Result<bool, TransportError> {
        let (_session, sftp) = self.open_sftp(transfer.label)?;
        let object = self.object(transfer.checksum);
        match sftp.stat(&object) {
            Ok(_) => Ok(true),
            Err(err) if err.code() == ErrorCode::SFTP(SFTP_NO_SUCH_FILE) => Ok(false),
            Err(err) => Err(Self::wrap(TransferOp::Stat, transfer.label, err)),
        }
    }

    fn fetch(&self, transfer: &Transfer<'_>) -> Result<(), TransportError> {
        let (_session, sftp) = self.open_sftp(transfer.label)?;
        let object = self.object(transfer.checksum);
        let download = |err: ssh2::Error| Self::wrap(TransferOp::Download, transfer.label, err);
        let mut remote = sftp.open(&object).map_err(download)?;
        let total = remote.stat().ok().and_then(|stat| stat.size).unwrap_or(0);
        let mut local = File::create(transfer.local)
            .map_err(|err| Self::wrap(TransferOp::Download, transfer.label, err))?;
        let mut progress = TransferProgress::new("Downloading", transfer.label, total);
        copy_blocks(&mut remote, &mut local, BLOCK_SIZE, &mut progress)
            .map_err(|err| Self::wrap(TransferOp::Download, transfer.label, err))?;
        progress.finish();
        Ok(())
    }

    fn upload(&self, transfer: &Transfer<'_>) -> Result<(), TransportError> {
        let (_session, sftp) = self.open_sftp(transfer.label)?;
        let object = self.object(transfer.checksum);
        let partial = partial_path(&object);
        let mut local = File::open(transfer.local)
            .map_err(|err| Self::wrap(TransferOp::Upload, transfer.label, err))?;
        let total = local.metadata().map(|meta| meta.len()).unwrap_or(0);
        let upload = |err: ssh2::Error| Self::wrap(TransferOp::Upload, transfer.label, err);
        let mut remote = sftp.create(&partial).map_err(upload)?;
        let mut progress = TransferProgress::new("Uploading", transfer.label, total);
        copy_blocks(&mut local, &mut remote, BLOCK_SIZE, &mut progress)
            .map_err(|err| Self::wrap(TransferOp::Upload, transfer.label, err))?;
        progress.finish();
        drop(remote);
        sftp.rename(&partial, &object, None).map_err(upload)?;
        debug!(object = %object.display(), "stored object over sftp");
        Ok(())
    }
}

/// Uploads land under this name first so an interrupted transfer never
/// looks like a complete object.
fn partial_path(object: &Path) -> PathBuf {
    let mut name = object.as_os_str().to_owned();
    name.push(".partial");
    PathBuf::from(name)
}
