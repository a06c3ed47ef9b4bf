//! Upload progress observation.
//!
//! Request bodies are streamed in fixed-size chunks through a shared
//! counter, so progress reflects bytes actually handed to the connection
//! rather than the size of a buffered body. Percentages are clamped to 99
//! while the upload is in flight: 100 belongs to "the response has fully
//! arrived", which is a different event separated from "all bytes sent" by
//! however long the server spends processing.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU64, Ordering};

use bytes::Bytes;

/// Chunk size for streamed upload bodies.
const UPLOAD_CHUNK_BYTES: usize = 64 * 1024;

/// Receives upload lifecycle notifications for one exchange.
///
/// Callbacks are invoked in order on the uploading task: zero or more
/// strictly increasing `on_upload_progress` calls in `0..=99`, then exactly
/// one `on_upload_complete` once every byte has left the client.
pub trait ProgressObserver: Send + Sync {
    /// Percent of payload bytes handed to the transport, clamped to 0..=99.
    fn on_upload_progress(&self, percent: u8) {
        let _ = percent;
    }

    /// All bytes are sent; the server is still working on the response.
    fn on_upload_complete(&self) {}
}

/// Observer that ignores every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl ProgressObserver for NoopObserver {}

/// Shared byte counter for the parts of one multipart upload.
pub(crate) struct UploadCounter {
    sent: AtomicU64,
    total: u64,
    last_percent: AtomicU8,
    completed: AtomicBool,
    observer: Arc<dyn ProgressObserver>,
}

impl UploadCounter {
    pub(crate) fn new(total: u64, observer: Arc<dyn ProgressObserver>) -> Arc<Self> {
        Arc::new(Self {
            sent: AtomicU64::new(0),
            total,
            last_percent: AtomicU8::new(0),
            completed: AtomicBool::new(false),
            observer,
        })
    }

    /// Marks the upload complete without any bytes. Used when the payload
    /// total is zero and no chunk will ever be yielded.
    pub(crate) fn finish_empty(&self) {
        self.mark_complete();
    }

    fn record(&self, chunk_bytes: u64) {
        let sent = self.sent.fetch_add(chunk_bytes, Ordering::SeqCst) + chunk_bytes;

        if self.total > 0 {
            let rounded = (sent * 100 + self.total / 2) / self.total;
            let percent = u8::try_from(rounded.min(99)).unwrap_or(99);
            let previous = self.last_percent.fetch_max(percent, Ordering::SeqCst);
            if percent > previous {
                self.observer.on_upload_progress(percent);
            }
        }

        if sent >= self.total {
            self.mark_complete();
        }
    }

    fn mark_complete(&self) {
        if !self.completed.swap(true, Ordering::SeqCst) {
            self.observer.on_upload_complete();
        }
    }
}

/// Wraps a payload in a body that reports each chunk to `counter` as the
/// connection consumes it.
pub(crate) fn counted_body(data: Bytes, counter: Arc<UploadCounter>) -> reqwest::Body {
    let chunks = chunked(data);
    let stream = futures_util::stream::iter(chunks.into_iter().map(move |chunk| {
        counter.record(chunk.len() as u64);
        Ok::<Bytes, std::convert::Infallible>(chunk)
    }));
    reqwest::Body::wrap_stream(stream)
}

fn chunked(data: Bytes) -> Vec<Bytes> {
    let mut chunks = Vec::with_capacity(data.len().div_ceil(UPLOAD_CHUNK_BYTES).max(1));
    let mut rest = data;
    while rest.len() > UPLOAD_CHUNK_BYTES {
        chunks.push(rest.split_to(UPLOAD_CHUNK_BYTES));
    }
    if !rest.is_empty() {
        chunks.push(rest);
    }
    chunks
}
