//! Multipart transport to the PDF processing service.
//!
//! One asynchronous, cancellable HTTP exchange per operation:
//!
//! - Streamed multipart bodies with live, clamped upload progress
//! - Structured error taxonomy (network / aborted / server / protocol)
//! - Content-Disposition filename extraction on success
//!
//! The binary payload on success and the extracted message on failure are
//! the only two shapes a completed exchange can take; every other condition
//! is an error variant, never a silent drop.

mod abort;
mod client;
pub mod error;
mod filename;
mod progress;

pub use abort::{AbortHandle, AbortToken};
pub use client::{
    ApiClient, BASE_URL_ENV, CONNECT_TIMEOUT_SECS, DEFAULT_BASE_URL, EXCHANGE_TIMEOUT_SECS,
    OperationSuccess,
};
pub use error::{ClientError, FailureKind};
pub use filename::{parse_content_disposition, sanitize_filename};
pub use progress::{NoopObserver, ProgressObserver};

pub(crate) use filename::resolve_unique_path;
