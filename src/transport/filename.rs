//! Filename extraction from Content-Disposition headers, plus the
//! sanitization and collision handling used when saving artifacts locally.

use std::path::{Component, Path, PathBuf};

/// Parses a Content-Disposition header value to extract a filename.
///
/// Tried in priority order:
/// 1. `filename*=UTF-8''<percent-encoded>` (RFC 6266 extended form)
/// 2. `filename="<name>"` (quoted)
/// 3. `filename=<name>` (unquoted, terminated by `;` or end of string)
///
/// Whitespace is trimmed. When percent-decoding the extended form fails,
/// the raw still-encoded text is returned rather than failing extraction.
/// `None` means the caller should substitute an operation default; a
/// missing name never blocks delivery of the payload.
#[must_use]
pub fn parse_content_disposition(header: &str) -> Option<String> {
    // Extended form first: charset'language'encoded_value
    if let Some(pos) = header.find("filename*=") {
        let value = header[pos + 10..].trim();
        if let Some(quote_pos) = value.find("''") {
            let encoded = &value[quote_pos + 2..];
            let end = encoded.find(';').unwrap_or(encoded.len());
            let encoded_name = encoded[..end].trim();
            if !encoded_name.is_empty() {
                return match urlencoding::decode(encoded_name) {
                    Ok(decoded) => Some(decoded.into_owned()),
                    // Undecodable percent sequences: keep the raw text.
                    Err(_) => Some(encoded_name.to_string()),
                };
            }
        }
    }

    if let Some(pos) = header.find("filename=") {
        let value = header[pos + 9..].trim();

        if let Some(stripped) = value.strip_prefix('"') {
            if let Some(end) = stripped.find('"') {
                return Some(stripped[..end].to_string());
            }
        } else {
            let end = value.find(';').unwrap_or(value.len());
            let filename = value[..end].trim();
            if !filename.is_empty() {
                return Some(filename.to_string());
            }
        }
    }

    None
}

/// Sanitizes a filename for filesystem safety.
///
/// Replaces characters invalid on common filesystems (`/ \ : * ? " < > |`)
/// and control characters, and rewrites dot-only segments so the result can
/// never escape the output directory.
#[must_use]
pub fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if sanitized.is_empty() {
        return "_".to_string();
    }

    if is_safe_filename_segment(&sanitized) {
        sanitized
    } else {
        sanitized
            .chars()
            .map(|c| if c == '.' { '_' } else { c })
            .collect()
    }
}

fn is_safe_filename_segment(name: &str) -> bool {
    !Path::new(name).components().any(|component| {
        matches!(
            component,
            Component::CurDir | Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    })
}

/// Resolves a unique path under `dir`, adding a numeric suffix on collision.
pub(crate) fn resolve_unique_path(dir: &Path, filename: &str) -> PathBuf {
    let filename = {
        let sanitized = sanitize_filename(filename);
        if sanitized.contains('/')
            || sanitized.contains('\\')
            || sanitized.trim_matches('_').is_empty()
        {
            "artifact.bin".to_string()
        } else {
            sanitized
        }
    };
    let base_path = dir.join(&filename);

    if !base_path.exists() {
        return base_path;
    }

    let (stem, ext) = match filename.rfind('.') {
        Some(pos) => (&filename[..pos], &filename[pos..]),
        None => (filename.as_str(), ""),
    };

    for i in 1..1000 {
        let new_path = dir.join(format!("{stem}_{i}{ext}"));
        if !new_path.exists() {
            return new_path;
        }
    }

    // Fallback (extremely unlikely)
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    dir.join(format!("{stem}_{timestamp}{ext}"))
}
