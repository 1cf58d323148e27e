//! Table sources and structured error types.
//!
//! The TableSource trait abstracts over where a spreadsheet export comes from
//! (configured URL, ad-hoc upload on disk) so the loader can cache uniformly
//! and tests can substitute in-memory sources.
//!
//! Byte-level spreadsheet parsing is not this crate's concern: sources hand
//! back tabular data with a header row and per-column inferred types.

use polars::prelude::*;
use std::io::Cursor;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Structured error types for data operations.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("source returned HTTP {status}: {url}")]
    HttpStatus { status: u16, url: String },

    #[error("malformed table: {0}")]
    MalformedTable(String),

    #[error("missing required column: {0}")]
    MissingColumn(String),

    #[error("cache error: {0}")]
    CacheError(String),

    #[error("parquet I/O error: {0}")]
    ParquetError(String),
}

/// A source of tabular data, identified for cache keying.
///
/// The cache layer sits above this trait — sources don't know about the cache.
pub trait TableSource {
    /// Stable identity of this source (cache key input).
    fn id(&self) -> String;

    /// Fetch the table: header row, stable column order, inferred types.
    fn fetch(&self) -> Result<DataFrame, DataError>;
}

/// Parse CSV bytes into a DataFrame.
fn read_csv_bytes(bytes: &[u8], skip_rows: usize) -> Result<DataFrame, DataError> {
    CsvReadOptions::default()
        .with_has_header(true)
        .with_skip_rows(skip_rows)
        .with_infer_schema_length(Some(500))
        .map_parse_options(|po| po.with_try_parse_dates(true))
        .into_reader_with_file_handle(Cursor::new(bytes))
        .finish()
        .map_err(|e| DataError::MalformedTable(e.to_string()))
}

/// A spreadsheet endpoint behind a configuration-supplied URL.
pub struct HttpSource {
    url: String,
    skip_rows: usize,
    client: reqwest::blocking::Client,
}

impl HttpSource {
    pub fn new(url: impl Into<String>) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("failed to build HTTP client");
        Self {
            url: url.into(),
            skip_rows: 0,
            client,
        }
    }

    /// Skip leading junk rows before the header row.
    pub fn with_skip_rows(mut self, skip_rows: usize) -> Self {
        self.skip_rows = skip_rows;
        self
    }
}

impl TableSource for HttpSource {
    fn id(&self) -> String {
        self.url.clone()
    }

    fn fetch(&self) -> Result<DataFrame, DataError> {
        let resp = self
            .client
            .get(&self.url)
            .send()
            .map_err(|e| DataError::NetworkUnreachable(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(DataError::HttpStatus {
                status: status.as_u16(),
                url: self.url.clone(),
            });
        }

        let bytes = resp
            .bytes()
            .map_err(|e| DataError::NetworkUnreachable(e.to_string()))?;
        read_csv_bytes(&bytes, self.skip_rows)
    }
}

/// An uploaded spreadsheet export on local disk.
///
/// `skip_rows` covers exports that carry banner rows above the header — the
/// shareholder-filing export has three.
///
/// Identity is keyed by content, not path: re-uploading an edited file under
/// the same name changes the identity, so it can never hit the previous
/// version's cache entry.
pub struct FileSource {
    path: PathBuf,
    skip_rows: usize,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            skip_rows: 0,
        }
    }

    pub fn with_skip_rows(mut self, skip_rows: usize) -> Self {
        self.skip_rows = skip_rows;
        self
    }
}

impl TableSource for FileSource {
    fn id(&self) -> String {
        match std::fs::read(&self.path) {
            Ok(bytes) => format!(
                "file:{}:{}:{}",
                self.path.display(),
                self.skip_rows,
                blake3::hash(&bytes).to_hex()
            ),
            // Unreadable files keep a stable identity; fetch reports the error.
            Err(_) => format!("file:{}", self.path.display()),
        }
    }

    fn fetch(&self) -> Result<DataFrame, DataError> {
        let bytes = std::fs::read(&self.path)
            .map_err(|e| DataError::MalformedTable(format!("{}: {e}", self.path.display())))?;
        read_csv_bytes(&bytes, self.skip_rows)
    }
}
