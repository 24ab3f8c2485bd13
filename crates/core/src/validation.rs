//! Upload validation utilities.
//!
//! Uploaded files are checked before any extraction work starts: the extension must be one of
//! [`ALLOWED_EXTENSIONS`] and the payload must fit within the configured size limit.

use crate::constants::ALLOWED_EXTENSIONS;
use crate::{ReportError, ReportResult};
use std::path::Path;

/// Returns the lowercase extension of `filename` including the leading dot, if any.
pub fn file_extension(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", ext.to_lowercase()))
}

/// Validates that `filename` has an accepted extension.
///
/// # Errors
///
/// Returns `ReportError::InvalidFileType` listing the accepted extensions.
pub fn validate_file_type(filename: &str) -> ReportResult<()> {
    match file_extension(filename) {
        Some(ext) if ALLOWED_EXTENSIONS.contains(&ext.as_str()) => Ok(()),
        _ => Err(ReportError::InvalidFileType {
            allowed: ALLOWED_EXTENSIONS.join(", "),
        }),
    }
}

/// Validates that an upload of `len` bytes fits within `max_mb` megabytes.
pub fn validate_file_size(len: usize, max_mb: u64) -> ReportResult<()> {
    let limit = (max_mb as usize).saturating_mul(1024 * 1024);
    if len > limit {
        return Err(ReportError::FileTooLarge { max_mb });
    }
    Ok(())
}

pub fn is_pdf(filename: &str) -> bool {
    file_extension(filename).as_deref() == Some(".pdf")
}

/// Works out the media type of an upload.
///
/// Content sniffing wins; the extension is used when the bytes are not recognised.
pub fn media_type(filename: &str, bytes: &[u8]) -> &'static str {
    if let Some(kind) = infer::get(bytes) {
        return kind.mime_type();
    }
    match file_extension(filename).as_deref() {
        Some(".pdf") => "application/pdf",
        Some(".png") => "image/png",
        Some(".jpg") | Some(".jpeg") => "image/jpeg",
        _ => "application/octet-stream",
    }
}
