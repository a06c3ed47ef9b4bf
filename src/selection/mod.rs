//! Working set of user-selected files for one operation.
//!
//! A [`Selection`] is an ordered set of [`FileHandle`]s with no duplicate
//! identity keys. Files enter it through two paths with deliberately
//! different policies:
//!
//! - [`Selection::add_files`] - incremental additions; offending files are
//!   dropped individually and counted, the rest are admitted.
//! - [`Selection::replace`] - whole-set replacement; the candidate batch is
//!   validated all-or-nothing and nothing is committed on failure.

mod validate;

use std::collections::HashSet;
use std::path::Path;

use bytes::Bytes;

pub use validate::{
    MAX_TOTAL_UPLOAD_BYTES, ValidationResult, is_pdf, validate_pdf_files,
    validate_pdf_files_with_limit,
};

/// One user-selected file: metadata plus its in-memory payload.
#[derive(Debug, Clone)]
pub struct FileHandle {
    name: String,
    mime_type: String,
    last_modified_ms: i64,
    data: Bytes,
}

/// Identity key used for deduplication.
///
/// Two handles with equal keys are treated as the same file even if their
/// contents differ. This is a known, accepted imprecision.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileKey {
    pub name: String,
    pub size_bytes: u64,
    pub last_modified_ms: i64,
}

impl FileHandle {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        mime_type: impl Into<String>,
        last_modified_ms: i64,
        data: Bytes,
    ) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            last_modified_ms,
            data,
        }
    }

    /// Reads a file from disk, deriving name, mtime and payload.
    ///
    /// The MIME type is declared from the `.pdf` suffix alone; the validator
    /// accepts either evidence, so suffix-less PDFs still need a real type.
    ///
    /// # Errors
    ///
    /// Returns the underlying IO error when the file or its metadata cannot
    /// be read.
    pub async fn from_path(path: &Path) -> std::io::Result<Self> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "file".to_string());
        let metadata = tokio::fs::metadata(path).await?;
        let last_modified_ms = metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
            .and_then(|d| i64::try_from(d.as_millis()).ok())
            .unwrap_or(0);
        let mime_type = if name.to_lowercase().ends_with(".pdf") {
            "application/pdf"
        } else {
            "application/octet-stream"
        };
        let data = Bytes::from(tokio::fs::read(path).await?);
        Ok(Self::new(name, mime_type, last_modified_ms, data))
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    #[must_use]
    pub fn last_modified_ms(&self) -> i64 {
        self.last_modified_ms
    }

    #[must_use]
    pub fn size_bytes(&self) -> u64 {
        self.data.len() as u64
    }

    /// The opaque binary payload. `Bytes` clones are reference-counted, so
    /// handing this to the transport does not copy the file.
    #[must_use]
    pub fn data(&self) -> Bytes {
        self.data.clone()
    }

    #[must_use]
    pub fn key(&self) -> FileKey {
        FileKey {
            name: self.name.clone(),
            size_bytes: self.size_bytes(),
            last_modified_ms: self.last_modified_ms,
        }
    }
}

/// Result of an incremental [`Selection::add_files`] merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddOutcome {
    /// Number of incoming files admitted into the selection.
    pub accepted: usize,
    /// Number of incoming files skipped (non-PDF or duplicate key).
    ///
    /// Reported so callers can surface a partial-success warning
    /// ("N files were skipped") without failing the batch.
    pub rejected_count: usize,
}

/// Ordered, key-unique working set of files for one operation.
///
/// Invariant: every member passed the per-file PDF check at insertion, and
/// no two members share a [`FileKey`]. Insertion order is preserved for
/// display; it carries no meaning for the server.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    files: Vec<FileHandle>,
}

impl Selection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    #[must_use]
    pub fn total_size_bytes(&self) -> u64 {
        self.files.iter().map(FileHandle::size_bytes).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FileHandle> {
        self.files.iter()
    }

    #[must_use]
    pub fn files(&self) -> &[FileHandle] {
        &self.files
    }

    /// Consumes the selection, yielding its files in insertion order.
    #[must_use]
    pub fn into_files(self) -> Vec<FileHandle> {
        self.files
    }

    /// Incrementally merges `incoming` into the selection.
    ///
    /// A file is admitted only if it independently passes the per-file PDF
    /// check and its identity key is present neither in the selection nor
    /// among files admitted earlier in this same call. Offenders are dropped
    /// one by one and counted; the batch as a whole never fails.
    pub fn add_files(&mut self, incoming: Vec<FileHandle>) -> AddOutcome {
        let mut keys: HashSet<FileKey> = self.files.iter().map(FileHandle::key).collect();
        let mut accepted = 0;
        let mut rejected_count = 0;

        for file in incoming {
            if !is_pdf(&file) || !keys.insert(file.key()) {
                rejected_count += 1;
                continue;
            }
            self.files.push(file);
            accepted += 1;
        }

        AddOutcome {
            accepted,
            rejected_count,
        }
    }

    /// Replaces the whole selection with `candidates`, all-or-nothing.
    ///
    /// The candidate set runs through the full validator (type and aggregate
    /// size); on failure the current selection is left untouched and the
    /// validator's message is returned. Duplicate keys within `candidates`
    /// are collapsed to the first occurrence.
    ///
    /// # Errors
    ///
    /// Returns the human-readable validation message when any candidate
    /// fails the policy.
    pub fn replace(&mut self, candidates: Vec<FileHandle>) -> Result<(), String> {
        let verdict = validate_pdf_files(&candidates);
        if !verdict.ok {
            return Err(verdict.message);
        }

        let mut keys = HashSet::new();
        self.files = candidates
            .into_iter()
            .filter(|f| keys.insert(f.key()))
            .collect();
        Ok(())
    }

    /// Drops every file and returns the selection to empty.
    pub fn clear(&mut self) {
        self.files.clear();
    }
}
