//! `Range` header handling

/// Outcome of evaluating a `Range` header against a file size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteRange {
    /// Serve the whole file
    Full,
    /// Serve bytes `start..=end`
    Partial { start: u64, end: u64 },
    /// No byte of the file satisfies the range
    Unsatisfiable,
}

impl ByteRange {
    /// Parse a `Range` header (`bytes=start-end`, `bytes=start-`, `bytes=-suffix`).
    ///
    /// Headers that are malformed or name several ranges are ignored and
    /// the full file is served.
    pub fn parse(header: &str, file_size: u64) -> Self {
        let Some(spec) = header.trim().strip_prefix("bytes=") else {
            return ByteRange::Full;
        };
        if spec.contains(',') {
            return ByteRange::Full;
        }
        let Some((start_str, end_str)) = spec.trim().split_once('-') else {
            return ByteRange::Full;
        };
        let (start_str, end_str) = (start_str.trim(), end_str.trim());

        if start_str.is_empty() {
            // Suffix range: the last N bytes
            let Ok(suffix) = end_str.parse::<u64>() else {
                return ByteRange::Full;
            };
            if suffix == 0 || file_size == 0 {
                return ByteRange::Unsatisfiable;
            }
            return ByteRange::Partial {
                start: file_size.saturating_sub(suffix),
                end: file_size - 1,
            };
        }

        let Ok(start) = start_str.parse::<u64>() else {
            return ByteRange::Full;
        };
        let end = if end_str.is_empty() {
            None
        } else {
            match end_str.parse::<u64>() {
                Ok(end) if end >= start => Some(end),
                _ => return ByteRange::Full,
            }
        };

        if start >= file_size {
            return ByteRange::Unsatisfiable;
        }

        let last = file_size - 1;
        ByteRange::Partial {
            start,
            end: end.map_or(last, |end| end.min(last)),
        }
    }

    /// `Content-Range` value for this range
    pub fn content_range(&self, file_size: u64) -> Option<String> {
        match self {
            ByteRange::Full => None,
            ByteRange::Partial { start, end } => {
                Some(format!("bytes {}-{}/{}", start, end, file_size))
            }
            ByteRange::Unsatisfiable => Some(format!("bytes */{}", file_size)),
        }
    }
}
