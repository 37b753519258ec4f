//! Remote sources.
//!
//! Downloads an `http://` or `https://` source to a file inside the mounted
//! root. The body is streamed to disk and checked against the declared
//! `Content-Length`; the file ends up owner-read-write only and, when the
//! server says so, carries the remote `Last-Modified` time.

use std::fs::File;
use std::io::{Read, Write};
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::time::SystemTime;

use reqwest::Url;
use reqwest::header::LAST_MODIFIED;
use stevedore_common::constants::{APP_NAME, FETCHED_FILE_MODE};
use stevedore_common::error::{Result, StevedoreError};

/// Downloads a URL to a local path.
pub trait RemoteFetch {
    /// Saves `url` to `destination` and returns the number of bytes written.
    ///
    /// # Errors
    ///
    /// Returns [`StevedoreError::TransferLengthMismatch`] when the body does
    /// not match its declared length, and [`StevedoreError::Transfer`] for
    /// any other request failure.
    fn fetch(&self, url: &Url, destination: &Path) -> Result<u64>;
}

/// [`RemoteFetch`] over a blocking `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
    offline: bool,
}

impl HttpFetcher {
    /// Creates a fetcher with no request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialised.
    pub fn new() -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(format!("{APP_NAME}/{}", env!("CARGO_PKG_VERSION")))
            .timeout(None)
            .build()
            .map_err(|e| StevedoreError::Config {
                message: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self {
            client,
            offline: false,
        })
    }

    /// Wraps an already configured client.
    #[must_use]
    pub fn with_client(client: reqwest::blocking::Client) -> Self {
        Self {
            client,
            offline: false,
        }
    }

    /// Refuses every fetch when `offline` is set.
    #[must_use]
    pub const fn offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }
}

impl RemoteFetch for HttpFetcher {
    fn fetch(&self, url: &Url, destination: &Path) -> Result<u64> {
        if self.offline {
            return Err(StevedoreError::Config {
                message: format!("offline mode blocks remote source {url}"),
            });
        }
        tracing::debug!(url = %url, destination = %destination.display(), "saving remote source");

        let mut response = self
            .client
            .get(url.clone())
            .send()
            .map_err(|e| StevedoreError::transfer(url.as_str(), destination, e))?;
        if !response.status().is_success() {
            return Err(StevedoreError::transfer(
                url.as_str(),
                destination,
                format!("HTTP {}", response.status()),
            ));
        }

        let expected = response.content_length();
        let last_modified = response
            .headers()
            .get(LAST_MODIFIED)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);

        let mut file =
            File::create(destination).map_err(|e| StevedoreError::io(destination, e))?;
        let written = copy_body(&mut response, &mut file, expected, url, destination)?;
        if let Some(expected) = expected.filter(|&len| len != written) {
            return Err(StevedoreError::TransferLengthMismatch {
                path: destination.to_path_buf(),
                expected,
                actual: written,
            });
        }

        file.set_permissions(std::fs::Permissions::from_mode(FETCHED_FILE_MODE))
            .map_err(|e| StevedoreError::io(destination, e))?;
        if let Some(last) = last_modified {
            apply_last_modified(&file, &last, destination);
        }

        tracing::debug!(url = %url, bytes = written, "remote source saved");
        Ok(written)
    }
}

/// Streams `body` into `file`, counting bytes.
///
/// A read error before the declared length was reached is reported as a
/// length mismatch.
fn copy_body(
    body: &mut impl Read,
    file: &mut File,
    expected: Option<u64>,
    url: &Url,
    destination: &Path,
) -> Result<u64> {
    let mut buf = vec![0u8; 64 * 1024];
    let mut written = 0u64;
    loop {
        let n = match body.read(&mut buf) {
            Ok(0) => return Ok(written),
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => {
                if let Some(expected) = expected.filter(|&len| len != written) {
                    tracing::debug!(url = %url, error = %e, "body ended early");
                    return Err(StevedoreError::TransferLengthMismatch {
                        path: destination.to_path_buf(),
                        expected,
                        actual: written,
                    });
                }
                return Err(StevedoreError::transfer(url.as_str(), destination, e));
            }
        };
        file.write_all(&buf[..n])
            .map_err(|e| StevedoreError::io(destination, e))?;
        written += n as u64;
    }
}

/// Parses an HTTP date such as `Sun, 06 Nov 1994 08:49:37 GMT`.
pub fn parse_http_date(value: &str) -> Option<SystemTime> {
    chrono::DateTime::parse_from_rfc2822(value.trim())
        .ok()
        .map(SystemTime::from)
}

/// Sets the file's mtime from a `Last-Modified` value; failures are logged.
fn apply_last_modified(file: &File, value: &str, destination: &Path) {
    let Some(mtime) = parse_http_date(value) else {
        tracing::debug!(value, "error parsing Last-Modified time");
        return;
    };
    if let Err(e) = file.set_modified(mtime) {
        tracing::debug!(
            path = %destination.display(),
            value,
            error = %e,
            "error setting mtime to Last-Modified time"
        );
    }
}
