//! MIME type handling

use std::path::Path;

/// Number of leading bytes inspected when the extension is unknown
pub const SNIFF_LEN: usize = 512;

const OCTET_STREAM: &str = "application/octet-stream";
const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

/// `Content-Type` implied by the file extension, if it is known
pub fn guess(path: &Path) -> Option<String> {
    let mime = mime_guess::from_path(path).first()?;
    if mime.type_().as_str() == "text" {
        Some(format!("{}; charset=utf-8", mime.essence_str()))
    } else {
        Some(mime.essence_str().to_string())
    }
}

/// Text if the sample is UTF-8 without NUL bytes, binary otherwise
pub fn sniff(head: &[u8]) -> &'static str {
    if head.contains(&0) {
        return OCTET_STREAM;
    }
    match std::str::from_utf8(head) {
        Ok(_) => TEXT_PLAIN,
        // A multi-byte character cut off at the sample boundary is still text
        Err(e) if e.error_len().is_none() && head.len() == SNIFF_LEN => TEXT_PLAIN,
        Err(_) => OCTET_STREAM,
    }
}
