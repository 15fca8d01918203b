//! Scanner for JSON documents embedded in binary payloads.
//!
//! Plugin presets and similar settings are stored as plain JSON objects in
//! the middle of otherwise binary chunk data. A candidate starts at `{"`;
//! its end is found by brace counting that ignores braces inside string
//! literals, and the candidate is kept only if it parses as JSON.

use crate::value::Value;

/// Default cap on the length of a single candidate document.
pub const DEFAULT_MAX_SPAN: usize = 1_000_000;

const OPEN: u8 = b'{';
const CLOSE: u8 = b'}';
const QUOTE: u8 = b'"';
const ESCAPE: u8 = b'\\';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanOptions {
    /// Longest span, in bytes, examined for one candidate before giving up
    /// on it.
    pub max_span: usize,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            max_span: DEFAULT_MAX_SPAN,
        }
    }
}

/// A document found by [`scan`].
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddedDocument {
    /// Offset of the opening brace within the scanned slice.
    pub offset: usize,
    /// Length of the document text, braces included.
    pub len: usize,
    pub value: Value,
}

/// Scans `data` with the default options.
pub fn scan(data: &[u8]) -> Vec<EmbeddedDocument> {
    scan_with(data, &ScanOptions::default())
}

/// Finds every embedded JSON document in `data`, in order of appearance.
///
/// After a document is accepted scanning resumes right after it, so objects
/// nested inside it are not reported again. After a rejected candidate it
/// resumes one byte past the opening brace.
pub fn scan_with(data: &[u8], options: &ScanOptions) -> Vec<EmbeddedDocument> {
    let mut documents = Vec::new();
    let mut i = 0;
    while let Some(start) = find_opening(data, i) {
        match find_span_end(data, start, options.max_span) {
            Some(end) => {
                let span = &data[start..=end];
                match parse_document(span) {
                    Ok(value) => {
                        documents.push(EmbeddedDocument {
                            offset: start,
                            len: span.len(),
                            value,
                        });
                        i = end + 1;
                        continue;
                    }
                    Err(err) => {
                        log::debug!("rejected candidate document at {start:#x}: {err}");
                    }
                }
            }
            None => {
                log::debug!("unterminated candidate document at {start:#x}");
            }
        }
        i = start + 1;
    }
    documents
}

/// Position of the next `{"` at or after `from`.
fn find_opening(data: &[u8], from: usize) -> Option<usize> {
    let mut i = from;
    while i < data.len() {
        let at = i + memchr::memchr(OPEN, &data[i..])?;
        if data.get(at + 1) == Some(&QUOTE) {
            return Some(at);
        }
        i = at + 1;
    }
    None
}

/// Index of the brace closing the object that opens at `start`, looking at
/// no more than `max_span` bytes.
fn find_span_end(data: &[u8], start: usize, max_span: usize) -> Option<usize> {
    let limit = data.len().min(start.saturating_add(max_span));
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape_next = false;

    for (j, &byte) in data.iter().enumerate().take(limit).skip(start) {
        if in_string {
            if escape_next {
                escape_next = false;
            } else if byte == ESCAPE {
                escape_next = true;
            } else if byte == QUOTE {
                in_string = false;
            }
            continue;
        }
        match byte {
            QUOTE => in_string = true,
            OPEN => depth += 1,
            CLOSE => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(j);
                }
            }
            _ => {}
        }
    }
    if limit < data.len() {
        log::debug!("candidate document at {start:#x} exceeds {max_span} bytes");
    }
    None
}

/// Invalid UTF-8 is replaced rather than rejected: preset text is
/// occasionally written in a legacy encoding.
fn parse_document(span: &[u8]) -> Result<Value, serde_json::Error> {
    let text = String::from_utf8_lossy(span);
    let json: serde_json::Value = serde_json::from_str(&text)?;
    Ok(Value::from(json))
}
