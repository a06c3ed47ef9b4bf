//! Fully-specified calls to the processing service.
//!
//! An [`OperationRequest`] pairs an operation kind with the files involved
//! and any kind-specific parameters. Construction-time checks catch the
//! cheap structural mistakes (empty file list, inverted page range) before
//! a single byte goes on the wire.

use crate::selection::{FileHandle, validate_pdf_files};
use crate::transport::error::ClientError;

/// The three operations the service offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Merge,
    Split,
    ExtractImages,
}

impl OperationKind {
    /// Endpoint path on the service, relative to the base URL.
    #[must_use]
    pub fn endpoint_path(self) -> &'static str {
        match self {
            Self::Merge => "v1/merged-pdfs",
            Self::Split => "v1/split/",
            Self::ExtractImages => "v1/images/extract",
        }
    }

    /// Download filename used when the server suggests none.
    #[must_use]
    pub fn default_filename(self) -> &'static str {
        match self {
            Self::Merge => "merged.pdf",
            Self::Split => "pages.zip",
            Self::ExtractImages => "extracted_images.zip",
        }
    }
}

/// An inclusive 1-based page range with `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRange {
    start: u32,
    end: u32,
}

impl PageRange {
    /// # Errors
    ///
    /// Returns a validation error when `start` is zero or `start > end`.
    pub fn new(start: u32, end: u32) -> Result<Self, ClientError> {
        if start < 1 {
            return Err(ClientError::validation("page numbers start at 1"));
        }
        if start > end {
            return Err(ClientError::validation(format!(
                "invalid page range: start page {start} is after end page {end}"
            )));
        }
        Ok(Self { start, end })
    }

    #[must_use]
    pub fn start(self) -> u32 {
        self.start
    }

    #[must_use]
    pub fn end(self) -> u32 {
        self.end
    }

    /// Wire encoding used by the split endpoint's `range` field.
    #[must_use]
    pub fn to_field(self) -> String {
        format!("{}-{}", self.start, self.end)
    }
}

/// How a split operation divides the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitSpec {
    /// One output page per input page.
    Each,
    /// A single inclusive page range.
    Range(PageRange),
}

impl SplitSpec {
    /// Wire encoding of the `mode` field.
    #[must_use]
    pub fn mode_field(self) -> &'static str {
        match self {
            Self::Each => "each",
            Self::Range(_) => "range",
        }
    }
}

/// One fully-specified server call: kind, files, parameters.
#[derive(Debug, Clone)]
pub enum OperationRequest {
    /// Merge all files, in order, into a single PDF.
    Merge { files: Vec<FileHandle> },
    /// Split one file per `spec`.
    Split { file: FileHandle, spec: SplitSpec },
    /// Extract embedded images from one or more files into a ZIP.
    ExtractImages { files: Vec<FileHandle> },
}

impl OperationRequest {
    #[must_use]
    pub fn kind(&self) -> OperationKind {
        match self {
            Self::Merge { .. } => OperationKind::Merge,
            Self::Split { .. } => OperationKind::Split,
            Self::ExtractImages { .. } => OperationKind::ExtractImages,
        }
    }

    /// The files this request will transmit, in wire order.
    #[must_use]
    pub fn files(&self) -> Vec<&FileHandle> {
        match self {
            Self::Merge { files } | Self::ExtractImages { files } => files.iter().collect(),
            Self::Split { file, .. } => vec![file],
        }
    }

    /// Total payload size across all files, in bytes.
    #[must_use]
    pub fn total_bytes(&self) -> u64 {
        self.files().iter().map(|f| f.size_bytes()).sum()
    }

    /// Runs the full pre-flight policy: file counts, PDF evidence, and the
    /// aggregate size ceiling. Page ranges are already valid by construction
    /// ([`PageRange::new`]).
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Validation`]; no network activity has occurred.
    pub fn validate(&self) -> Result<(), ClientError> {
        let files = self.files();
        if files.is_empty() {
            return Err(ClientError::validation("select at least one PDF file"));
        }
        if self.kind() == OperationKind::Merge && files.len() < 2 {
            return Err(ClientError::validation(
                "merging needs at least two PDF files",
            ));
        }

        let owned: Vec<FileHandle> = files.into_iter().cloned().collect();
        let verdict = validate_pdf_files(&owned);
        if !verdict.ok {
            return Err(ClientError::validation(verdict.message));
        }
        Ok(())
    }
}
