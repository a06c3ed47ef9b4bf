//! Pre-flight policy checks for candidate file sets.
//!
//! Pure functions: nothing here touches the network or commits a selection.
//! Rejection is all-or-nothing for the batch under test; the lenient
//! per-file path lives in [`Selection::add_files`](super::Selection::add_files).

use super::FileHandle;

/// Default ceiling for the aggregate size of one upload: 500 MiB.
pub const MAX_TOTAL_UPLOAD_BYTES: u64 = 500 * 1024 * 1024;

/// Verdict of a validation pass, with a human-readable message either way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    pub ok: bool,
    pub message: String,
}

impl ValidationResult {
    fn pass() -> Self {
        Self {
            ok: true,
            message: "files accepted".to_string(),
        }
    }

    fn fail(message: String) -> Self {
        Self { ok: false, message }
    }
}

/// Whether a file counts as a PDF.
///
/// The declared MIME type and a case-insensitive `.pdf` suffix are accepted
/// as equivalent evidence; browsers and OSes are unreliable about populating
/// the type for dragged files.
#[must_use]
pub fn is_pdf(file: &FileHandle) -> bool {
    file.mime_type() == "application/pdf" || file.name().to_lowercase().ends_with(".pdf")
}

/// Validates a candidate set against the default 500 MiB ceiling.
#[must_use]
pub fn validate_pdf_files(files: &[FileHandle]) -> ValidationResult {
    validate_pdf_files_with_limit(files, MAX_TOTAL_UPLOAD_BYTES)
}

/// Validates a candidate set: every file must be a PDF and the aggregate
/// size must not exceed `max_total_bytes`.
///
/// The failure message names the offending file, or the limit and the
/// actual total for size overruns.
#[must_use]
pub fn validate_pdf_files_with_limit(files: &[FileHandle], max_total_bytes: u64) -> ValidationResult {
    let mut total: u64 = 0;

    for file in files {
        if !is_pdf(file) {
            return ValidationResult::fail(format!(
                "only PDF files are accepted; {} has type {}",
                file.name(),
                file.mime_type()
            ));
        }
        total = total.saturating_add(file.size_bytes());
    }

    if total > max_total_bytes {
        return ValidationResult::fail(format!(
            "combined size {} bytes exceeds the {} MiB limit ({} bytes)",
            total,
            max_total_bytes / (1024 * 1024),
            max_total_bytes
        ));
    }

    ValidationResult::pass()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use bytes::Bytes;

    use super::*;

    fn handle(name: &str, mime: &str, size: usize) -> FileHandle {
        FileHandle::new(name, mime, 0, Bytes::from(vec![0u8; size]))
    }

    #[test]
    fn test_accepts_by_declared_type() {
        let files = [handle("scan", "application/pdf", 4)];
        assert!(validate_pdf_files(&files).ok);
    }

    #[test]
    fn test_accepts_by_suffix_when_type_unreliable() {
        let files = [handle("Report.PDF", "application/octet-stream", 4)];
        assert!(validate_pdf_files(&files).ok);
    }

    #[test]
    fn test_rejects_file_lacking_both_evidences() {
        let files = [handle("a.pdf", "application/pdf", 4), handle("b.png", "image/png", 4)];
        let verdict = validate_pdf_files(&files);
        assert!(!verdict.ok);
        assert!(verdict.message.contains("b.png"), "message should name the offender: {}", verdict.message);
    }

    #[test]
    fn test_rejects_aggregate_over_limit_and_names_it() {
        let files = [handle("a.pdf", "application/pdf", 300), handle("b.pdf", "application/pdf", 300)];
        let verdict = validate_pdf_files_with_limit(&files, 500);
        assert!(!verdict.ok);
        assert!(verdict.message.contains("500"), "message should name the limit: {}", verdict.message);
    }

    #[test]
    fn test_rejection_is_all_or_nothing() {
        // One bad file fails the whole batch, even though the first is fine.
        let files = [handle("a.pdf", "application/pdf", 4), handle("b", "text/plain", 4)];
        assert!(!validate_pdf_files(&files).ok);
    }

    #[test]
    fn test_exact_limit_is_accepted() {
        let files = [handle("a.pdf", "application/pdf", 500)];
        assert!(validate_pdf_files_with_limit(&files, 500).ok);
    }

    #[test]
    fn test_empty_set_is_valid() {
        assert!(validate_pdf_files(&[]).ok);
    }
}
