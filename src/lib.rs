//! PDF service client core.
//!
//! This library is the upload-and-retrieve orchestration layer for a remote
//! PDF processing service: it validates and deduplicates a working set of
//! files, transmits one multipart request per operation with live upload
//! progress, and maps the server's response (binary artifact vs. structured
//! error) onto a small observable job state machine.
//!
//! # Architecture
//!
//! - [`selection`] - file intake: validation policy and key-based dedup
//! - [`request`] - fully-specified operations (merge, split, extract images)
//! - [`transport`] - the multipart HTTP exchange, progress, abort, errors
//! - [`job`] - per-operation lifecycle controller
//! - [`save`] - writing a returned artifact to disk
//!
//! The service itself (PDF parsing, merging, rasterizing) is an external
//! collaborator reached only over HTTP; nothing here inspects PDF content.

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod job;
pub mod request;
pub mod save;
pub mod selection;
pub mod transport;

// Re-export commonly used types
pub use job::{Job, JobPhase, JobState, OperationOutcome, SubmitError};
pub use request::{OperationKind, OperationRequest, PageRange, SplitSpec};
pub use selection::{
    AddOutcome, FileHandle, FileKey, MAX_TOTAL_UPLOAD_BYTES, Selection, ValidationResult,
    validate_pdf_files,
};
pub use transport::{
    AbortHandle, AbortToken, ApiClient, ClientError, FailureKind, NoopObserver, OperationSuccess,
    ProgressObserver, parse_content_disposition,
};
