//! Conditional request evaluation

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use http::header::{self, HeaderMap};
use http::Method;

/// Validators describing the current version of a file
#[derive(Debug, Clone)]
pub struct Validators {
    /// Strong entity tag, including quotes
    pub etag: String,
    /// Modification time truncated to whole seconds
    pub last_modified: Option<SystemTime>,
}

impl Validators {
    /// Build validators from a file's size and modification time
    pub fn new(size: u64, modified: Option<SystemTime>) -> Self {
        let last_modified = modified.and_then(truncate_to_secs);
        let mtime_secs = last_modified
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map_or(0, |d| d.as_secs());
        Self {
            etag: format!("\"{:x}-{:x}\"", mtime_secs, size),
            last_modified,
        }
    }

    /// `Last-Modified` header value
    pub fn last_modified_header(&self) -> Option<String> {
        self.last_modified.map(httpdate::fmt_http_date)
    }
}

/// What to do with a request after checking its preconditions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precondition {
    /// Serve the file; `honor_range` is false when `If-Range` did not match
    Proceed { honor_range: bool },
    /// 304 Not Modified
    NotModified,
    /// 412 Precondition Failed
    Failed,
}

/// Evaluate the conditional headers of a request against `validators`
pub fn evaluate(method: &Method, headers: &HeaderMap, validators: &Validators) -> Precondition {
    let safe = method == Method::GET || method == Method::HEAD;

    if let Some(if_match) = header_str(headers, header::IF_MATCH) {
        if !etag_list_matches(if_match, &validators.etag, true) {
            return Precondition::Failed;
        }
    } else if let Some(date) = header_date(headers, header::IF_UNMODIFIED_SINCE) {
        if validators.last_modified.is_some_and(|modified| modified > date) {
            return Precondition::Failed;
        }
    }

    if let Some(if_none_match) = header_str(headers, header::IF_NONE_MATCH) {
        if etag_list_matches(if_none_match, &validators.etag, false) {
            return if safe {
                Precondition::NotModified
            } else {
                Precondition::Failed
            };
        }
    } else if safe {
        if let Some(date) = header_date(headers, header::IF_MODIFIED_SINCE) {
            if validators.last_modified.is_some_and(|modified| modified <= date) {
                return Precondition::NotModified;
            }
        }
    }

    let honor_range = match header_str(headers, header::IF_RANGE) {
        None => true,
        Some(value) if value.starts_with('"') || value.starts_with("W/") => {
            etag_matches(value, &validators.etag, true)
        }
        Some(value) => match (httpdate::parse_http_date(value), validators.last_modified) {
            (Ok(date), Some(modified)) => date == modified,
            _ => false,
        },
    };

    Precondition::Proceed { honor_range }
}

fn header_str(headers: &HeaderMap, name: header::HeaderName) -> Option<&str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn header_date(headers: &HeaderMap, name: header::HeaderName) -> Option<SystemTime> {
    header_str(headers, name).and_then(|v| httpdate::parse_http_date(v).ok())
}

fn etag_list_matches(list: &str, current: &str, strong: bool) -> bool {
    list.split(',')
        .map(str::trim)
        .any(|candidate| candidate == "*" || etag_matches(candidate, current, strong))
}

/// Strong comparison rejects weak tags; weak comparison ignores the `W/` prefix.
fn etag_matches(candidate: &str, current: &str, strong: bool) -> bool {
    match candidate.strip_prefix("W/") {
        Some(_) if strong => false,
        Some(tag) => tag == current,
        None => candidate == current,
    }
}

fn truncate_to_secs(time: SystemTime) -> Option<SystemTime> {
    let secs = time.duration_since(UNIX_EPOCH).ok()?.as_secs();
    Some(UNIX_EPOCH + Duration::from_secs(secs))
}
