use std::fs::{self, File};
use std::io;
use std::path::PathBuf;

use got_domain::RemoteType;
use tracing::debug;
use url::Url;

use super::{object_path, Transfer, Transport};
use crate::errors::{GotError, TransferOp, TransportError};
use crate::fs::{copy_blocks, persist_named_tempfile, sibling_tempfile};
use crate::progress::TransferProgress;

const BLOCK_SIZE: usize = 1024 * 1024;

/// A directory on a local or mounted filesystem.
pub(crate) struct FileTransport {
    url: Url,
    root: PathBuf,
}

impl FileTransport {
    pub(crate) fn new(url: Url) -> Result<Self, GotError> {
        let root = url.to_file_path().map_err(|()| {
            GotError::configuration(format!("Remote URL '{url}' is not a local path"))
        })?;
        Ok(Self { url, root })
    }

    fn object(&self, checksum: &str) -> PathBuf {
        PathBuf::from(object_path(&self.root.to_string_lossy(), checksum))
    }

    fn error(op: TransferOp, transfer: &Transfer<'_>, err: io::Error) -> TransportError {
        TransportError::wrap(RemoteType::File, op, transfer.label, err)
    }
}

impl Transport for FileTransport {
    fn remote_type(&self) -> RemoteType {
        RemoteType::File
    }

    fn url(&self) -> &Url {
        &self.url
    }

    fn exists(&self, transfer: &Transfer<'_>) -> Result<bool, TransportError> {
        let object = self.object(transfer.checksum);
        debug!(object = %object.display(), "checking file remote");
        match fs::metadata(&object) {
            Ok(meta) => Ok(meta.is_file()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(Self::error(TransferOp::Stat, transfer, err)),
        }
    }

    fn fetch(&self, transfer: &Transfer<'_>) -> Result<(), TransportError> {
        let object = self.object(transfer.checksum);
        let mut src = File::open(&object).map_err(|err| {
            if err.kind() == io::ErrorKind::NotFound {
                TransportError::new(
                    RemoteType::File,
                    TransferOp::Download,
                    transfer.label,
                    format!("object {} not found on remote", transfer.checksum),
                )
            } else {
                Self::error(TransferOp::Download, transfer, err)
            }
        })?;
        let total = src.metadata().map(|meta| meta.len()).unwrap_or(0);
        let mut dest = File::create(transfer.local)
            .map_err(|err| Self::error(TransferOp::Download, transfer, err))?;
        let mut progress = TransferProgress::new("Downloading", transfer.label, total);
        copy_blocks(&mut src, &mut dest, BLOCK_SIZE, &mut progress)
            .map_err(|err| Self::error(TransferOp::Download, transfer, err))?;
        progress.finish();
        Ok(())
    }

    fn upload(&self, transfer: &Transfer<'_>) -> Result<(), TransportError> {
        let object = self.object(transfer.checksum);
        let mut src = File::open(transfer.local)
            .map_err(|err| Self::error(TransferOp::Upload, transfer, err))?;
        let total = src.metadata().map(|meta| meta.len()).unwrap_or(0);
        let mut staged =
            sibling_tempfile(&object).map_err(|err| Self::error(TransferOp::Upload, transfer, err))?;
        let mut progress = TransferProgress::new("Uploading", transfer.label, total);
        copy_blocks(&mut src, staged.as_file_mut(), BLOCK_SIZE, &mut progress)
            .map_err(|err| Self::error(TransferOp::Upload, transfer, err))?;
        progress.finish();
        persist_named_tempfile(staged, &object)
            .map_err(|err| Self::error(TransferOp::Upload, transfer, err))?;
        debug!(object = %object.display(), "stored object on file remote");
        Ok(())
    }
}
