use std::fs::File;
use std::io::{self, Cursor, Read};
use std::time::Duration;

use got_domain::RemoteType;
use reqwest::blocking::{Body, Client};
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use super::{Transfer, Transport, TransportOptions};
use crate::errors::{GotError, TransferOp, TransportError};
use crate::fs::copy_blocks;
use crate::progress::TransferProgress;
use crate::store::USER_AGENT;

const METADATA_ENDPOINT: &str = "/srr/api/file_metadata/sha256";
const ADD_FILE_ENDPOINT: &str = "/srr/api/add_file";
const BLOCK_SIZE: usize = 64 * 1024;

#[derive(Debug, Deserialize)]
struct FileMetadata {
    url: String,
}

/// A file registry reached over HTTP, addressed by sha256.
pub(crate) struct SrrTransport {
    url: Url,
    client: Client,
    timeout: Duration,
}

impl SrrTransport {
    pub(crate) fn new(url: Url, options: &TransportOptions) -> Result<Self, GotError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(options.http_timeout)
            .timeout(None::<Duration>)
            .build()
            .map_err(|err| {
                TransportError::wrap(RemoteType::Srr, TransferOp::Connect, url.as_str(), err)
            })?;
        Ok(Self {
            url,
            client,
            timeout: options.http_timeout,
        })
    }

    fn endpoint(&self, path: &str) -> Url {
        let mut endpoint = self.url.clone();
        endpoint.set_path(path);
        endpoint.set_query(None);
        endpoint.set_fragment(None);
        endpoint
    }

    /// Last segment of the registry URL; uploads are filed under it.
    fn parent_id(&self) -> &str {
        self.url
            .path_segments()
            .and_then(|segments| segments.filter(|segment| !segment.is_empty()).last())
            .unwrap_or_default()
    }

    fn wrap(op: TransferOp, filename: &str, err: reqwest::Error) -> TransportError {
        TransportError::wrap(RemoteType::Srr, op, filename, err)
    }

    /// Where the registry serves this checksum from, if it has it.
    fn locate(
        &self,
        transfer: &Transfer<'_>,
        op: TransferOp,
    ) -> Result<Option<Url>, TransportError> {
        let endpoint = self.endpoint(&format!("{METADATA_ENDPOINT}/{}", transfer.checksum));
        debug!(%endpoint, "querying registry metadata");
        let response = self
            .client
            .get(endpoint)
            .timeout(self.timeout)
            .send()
            .map_err(|err| Self::wrap(op, transfer.label, err))?;
        match response.status() {
            StatusCode::OK => {
                let metadata: FileMetadata = response
                    .json()
                    .map_err(|err| Self::wrap(op, transfer.label, err))?;
                let located = self.url.join(&metadata.url).map_err(|err| {
                    TransportError::wrap(RemoteType::Srr, op, transfer.label, err)
                })?;
                Ok(Some(located))
            }
            StatusCode::NOT_FOUND => Ok(None),
            status => Err(TransportError::new(
                RemoteType::Srr,
                op,
                transfer.label,
                format!("registry metadata request returned {status}"),
            )),
        }
    }
}

impl Transport for SrrTransport {
    fn remote_type(&self) -> RemoteType {
        RemoteType::Srr
    }

    fn url(&self) -> &Url {
        &self.url
    }

    fn exists(&self, transfer: &Transfer<'_>) -> Result<bool, TransportError> {
        Ok(self.locate(transfer, TransferOp::Stat)?.is_some())
    }

    fn fetch(&self, transfer: &Transfer<'_>) -> Result<(), TransportError> {
        let located = self.locate(transfer, TransferOp::Download)?.ok_or_else(|| {
            TransportError::new(
                RemoteType::Srr,
                TransferOp::Download,
                transfer.label,
                format!("registry has no file with sha256 {}", transfer.checksum),
            )
        })?;
        debug!(url = %located, "downloading from registry");
        let mut response = self
            .client
            .get(located)
            .send()
            .and_then(reqwest::blocking::Response::error_for_status)
            .map_err(|err| Self::wrap(TransferOp::Download, transfer.label, err))?;
        let total = response.content_length().unwrap_or(0);
        let mut local = File::create(transfer.local).map_err(|err| {
            TransportError::wrap(RemoteType::Srr, TransferOp::Download, transfer.label, err)
        })?;
        let mut progress =
            TransferProgress::new("Downloading", transfer.label, total).per_megabyte();
        copy_blocks(&mut response, &mut local, BLOCK_SIZE, &mut progress).map_err(|err| {
            TransportError::wrap(RemoteType::Srr, TransferOp::Download, transfer.label, err)
        })?;
        progress.finish();
        Ok(())
    }

    fn upload(&self, transfer: &Transfer<'_>) -> Result<(), TransportError> {
        let io_error = |err: io::Error| {
            TransportError::wrap(RemoteType::Srr, TransferOp::Upload, transfer.label, err)
        };
        let file = File::open(transfer.local).map_err(io_error)?;
        let size = file.metadata().map_err(io_error)?.len();
        let boundary = format!(
            "----gotupload{}",
            &transfer.checksum[..transfer.checksum.len().min(12)]
        );
        let description = format!("Got storage for {} @ TBD hashtag", transfer.label);
        let (head, tail) = build_upload_envelope(
            &boundary,
            self.parent_id(),
            &description,
            transfer.checksum,
        );
        let length = head.len() as u64 + size + tail.len() as u64;
        let reader = Cursor::new(head)
            .chain(ProgressReader::new(
                file,
                TransferProgress::new("Uploading", transfer.label, size),
            ))
            .chain(Cursor::new(tail));

        let response = self
            .client
            .post(self.endpoint(ADD_FILE_ENDPOINT))
            .header(
                "Content-Type",
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::sized(reader, length))
            .send()
            .and_then(reqwest::blocking::Response::error_for_status)
            .map_err(|err| Self::wrap(TransferOp::Upload, transfer.label, err))?;
        let text = response
            .text()
            .map_err(|err| Self::wrap(TransferOp::Upload, transfer.label, err))?;
        let file_id = parse_file_id(&text).ok_or_else(|| {
            TransportError::new(
                RemoteType::Srr,
                TransferOp::Upload,
                transfer.label,
                "registry response did not include a file_id",
            )
        })?;
        debug!(file_id, "registry accepted upload");
        Ok(())
    }
}

/// Everything before and after the file bytes of the multipart body.
fn build_upload_envelope(
    boundary: &str,
    parent_id: &str,
    description: &str,
    checksum: &str,
) -> (Vec<u8>, Vec<u8>) {
    let mut head = Vec::new();
    append_form_field(&mut head, boundary, "parent_id", parent_id);
    append_form_field(&mut head, boundary, "target_id", "");
    append_form_field(&mut head, boundary, "description", description);
    append_file_header(&mut head, boundary, "file", checksum);
    let tail = format!("\r\n--{boundary}--\r\n").into_bytes();
    (head, tail)
}

fn append_form_field(buf: &mut Vec<u8>, boundary: &str, name: &str, value: &str) {
    buf.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    buf.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
    );
    buf.extend_from_slice(value.as_bytes());
    buf.extend_from_slice(b"\r\n");
}

fn append_file_header(buf: &mut Vec<u8>, boundary: &str, name: &str, filename: &str) {
    buf.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    buf.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n")
            .as_bytes(),
    );
    buf.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
}

/// The registry answers with free text ending in ` file_id=<digits>`.
fn parse_file_id(text: &str) -> Option<&str> {
    let (_, id) = text.trim_end().rsplit_once(" file_id=")?;
    (!id.is_empty() && id.bytes().all(|byte| byte.is_ascii_digit())).then_some(id)
}

struct ProgressReader<R> {
    inner: R,
    progress: TransferProgress,
    finished: bool,
}

impl<R> ProgressReader<R> {
    fn new(inner: R, progress: TransferProgress) -> Self {
        Self {
            inner,
            progress,
            finished: false,
        }
    }
}

impl<R: Read> Read for ProgressReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let read = self.inner.read(buf)?;
        if read == 0 {
            if !self.finished {
                self.finished = true;
                self.progress.finish();
            }
        } else {
            self.progress.advance(read as u64);
        }
        Ok(read)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use httptest::{matchers::*, responders::*, Expectation, Server};
    use std::fs;
    use std::panic;
    use tempfile::tempdir;

    const CHECKSUM: &str = "5feceb66ffc86f38d952786c6d696c79c2dbc239dd4e91b46729d73a27fb57e9";
    const METADATA_PATH: &str =
        "/srr/api/file_metadata/sha256/5feceb66ffc86f38d952786c6d696c79c2dbc239dd4e91b46729d73a27fb57e9";
    const ABSENT: &str = "6b86b273ff34fce19d6b804eff5a3f5747ada4eaa22f1d49c01e52ddb7875b4b";
    const ABSENT_METADATA_PATH: &str =
        "/srr/api/file_metadata/sha256/6b86b273ff34fce19d6b804eff5a3f5747ada4eaa22f1d49c01e52ddb7875b4b";

    fn registry(server: &Server) -> Result<SrrTransport> {
        let url = Url::parse(&server.url_str("/registry/17"))?;
        Ok(SrrTransport::new(url, &TransportOptions::default())?)
    }

    fn start_server(test: &str) -> Option<Server> {
        match panic::catch_unwind(Server::run) {
            Ok(server) => Some(server),
            Err(_) => {
                eprintln!("skipping {test} (httptest server unavailable)");
                None
            }
        }
    }

    #[test]
    fn parse_file_id_reads_the_trailing_identifier() {
        assert_eq!(parse_file_id("Added data.bin file_id=4711\n"), Some("4711"));
        assert_eq!(parse_file_id("Added data.bin"), None);
        assert_eq!(parse_file_id("file_id=12 and more"), None);
    }

    #[test]
    fn parent_id_is_the_last_path_segment() -> Result<()> {
        let options = TransportOptions::default();
        let srr = SrrTransport::new(Url::parse("https://srr.example/files/42/")?, &options)?;
        assert_eq!(srr.parent_id(), "42");
        let endpoint = srr.endpoint("/srr/api/add_file");
        assert_eq!(endpoint.as_str(), "https://srr.example/srr/api/add_file");
        Ok(())
    }

    #[test]
    fn metadata_status_decides_existence() -> Result<()> {
        let Some(server) = start_server("srr existence test") else {
            return Ok(());
        };
        server.expect(
            Expectation::matching(request::method_path("GET", METADATA_PATH))
                .respond_with(json_encoded(serde_json::json!({ "url": "/files/9" }))),
        );
        server.expect(
            Expectation::matching(request::method_path("GET", ABSENT_METADATA_PATH))
                .respond_with(status_code(404)),
        );
        let srr = registry(&server)?;
        let present = Transfer {
            local: std::path::Path::new("unused"),
            label: "data.bin",
            checksum: CHECKSUM,
        };
        let absent = Transfer {
            checksum: ABSENT,
            ..present
        };
        assert!(srr.exists(&present)?);
        assert!(!srr.exists(&absent)?);
        Ok(())
    }

    #[test]
    fn unexpected_metadata_status_is_a_transport_error() -> Result<()> {
        let Some(server) = start_server("srr status test") else {
            return Ok(());
        };
        server.expect(
            Expectation::matching(request::method("GET")).respond_with(status_code(500)),
        );
        let srr = registry(&server)?;
        let err = srr
            .exists(&Transfer {
                local: std::path::Path::new("unused"),
                label: "data.bin",
                checksum: CHECKSUM,
            })
            .unwrap_err();
        assert_eq!(err.backend, RemoteType::Srr);
        assert_eq!(err.operation, TransferOp::Stat);
        assert!(err.message.contains("500"), "unexpected message: {}", err.message);
        Ok(())
    }

    #[test]
    fn fetch_follows_the_located_url() -> Result<()> {
        let Some(server) = start_server("srr fetch test") else {
            return Ok(());
        };
        server.expect(
            Expectation::matching(request::method_path("GET", METADATA_PATH))
                .respond_with(json_encoded(serde_json::json!({ "url": "/files/9" }))),
        );
        server.expect(
            Expectation::matching(request::method_path("GET", "/files/9"))
                .respond_with(status_code(200).body("0")),
        );
        let temp = tempdir()?;
        let dest = temp.path().join("data.bin");
        registry(&server)?.fetch(&Transfer {
            local: &dest,
            label: "data.bin",
            checksum: CHECKSUM,
        })?;
        assert_eq!(fs::read(&dest)?, b"0");
        Ok(())
    }

    #[test]
    fn upload_posts_a_multipart_form() -> Result<()> {
        let Some(server) = start_server("srr upload test") else {
            return Ok(());
        };
        server.expect(
            Expectation::matching(all_of![
                request::method_path("POST", ADD_FILE_ENDPOINT),
                request::body(matches("name=\"parent_id\"\r\n\r\n17\r\n")),
                request::body(matches("Got storage for data.bin @ TBD hashtag")),
                request::body(matches(format!("filename=\"{CHECKSUM}\""))),
            ])
            .respond_with(status_code(200).body("Added data.bin file_id=301")),
        );
        let temp = tempdir()?;
        let src = temp.path().join("data.bin");
        fs::write(&src, b"0")?;
        registry(&server)?.upload(&Transfer {
            local: &src,
            label: "data.bin",
            checksum: CHECKSUM,
        })?;
        Ok(())
    }

    #[test]
    fn upload_without_file_id_fails() -> Result<()> {
        let Some(server) = start_server("srr upload id test") else {
            return Ok(());
        };
        server.expect(
            Expectation::matching(request::method_path("POST", ADD_FILE_ENDPOINT))
                .respond_with(status_code(200).body("stored")),
        );
        let temp = tempdir()?;
        let src = temp.path().join("data.bin");
        fs::write(&src, b"0")?;
        let err = registry(&server)?
            .upload(&Transfer {
                local: &src,
                label: "data.bin",
                checksum: CHECKSUM,
            })
            .unwrap_err();
        assert!(err.message.contains("file_id"));
        Ok(())
    }
}
