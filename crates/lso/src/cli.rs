//! Logic behind the command-line tools.
//!
//! - `lso-chunks`: list the chunk records of a container
//! - `lso-scan`: extract JSON documents embedded in any file
//! - `lso-unarchive`: decode a (gzipped) binary plist and resolve its keyed archive

use lso_pack::{
    decode, scan_with, ChunkStream, DecodeError, DecodeOptions, Decoded, Format, ScanOptions,
};
use serde_json::{json, Map, Value};

// ── Errors ────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub enum CliError {
    Io(std::io::Error),
    Json(serde_json::Error),
    Decode(DecodeError),
    UnexpectedFormat(Format),
    Usage(String),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Io(e) => write!(f, "{e}"),
            CliError::Json(e) => write!(f, "{e}"),
            CliError::Decode(e) => write!(f, "{e}"),
            CliError::UnexpectedFormat(format) => write!(f, "unexpected {format} input"),
            CliError::Usage(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for CliError {}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        CliError::Io(e)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Json(e)
    }
}

impl From<DecodeError> for CliError {
    fn from(e: DecodeError) -> Self {
        CliError::Decode(e)
    }
}

// ── lso-chunks ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default)]
pub struct ChunksOptions {
    /// Include JSON documents found in each payload.
    pub documents: bool,
    /// Include event records of `EvSq` chunks.
    pub events: bool,
    pub scan: ScanOptions,
}

/// Lists every chunk of a container as pretty-printed JSON.
pub fn chunks_json(bytes: &[u8], options: &ChunksOptions) -> Result<String, CliError> {
    let mut stream = ChunkStream::open(bytes);
    let mut records = Vec::new();
    for record in stream.by_ref() {
        let mut entry = Map::new();
        entry.insert("offset".into(), json!(record.offset));
        entry.insert("descriptor".into(), json!(record.descriptor.to_string()));
        entry.insert("m1".into(), json!(record.m1));
        entry.insert("m2".into(), json!(record.m2));
        entry.insert("m3".into(), json!(record.m3));
        entry.insert("m4".into(), json!(record.m4));
        entry.insert("m5".into(), json!(record.m5));
        entry.insert("status".into(), json!(hex(&record.status)));
        entry.insert("payload_len".into(), json!(record.payload_len));
        entry.insert("truncated".into(), json!(record.truncated));
        if options.documents {
            let docs: Vec<Value> = record
                .documents(&options.scan)
                .into_iter()
                .map(|doc| json!({"offset": doc.offset, "value": Value::from(doc.value)}))
                .collect();
            entry.insert("documents".into(), Value::Array(docs));
        }
        if options.events {
            let events: Vec<Value> = record
                .events()
                .into_iter()
                .map(|ev| {
                    json!({
                        "offset": ev.offset,
                        "ticks": ev.ticks,
                        "position": ev.position.to_string(),
                    })
                })
                .collect();
            if !events.is_empty() {
                entry.insert("events".into(), Value::Array(events));
            }
        }
        records.push(Value::Object(entry));
    }

    let header = stream.header().map(|h| {
        json!({
            "magic": hex(&h.magic),
            "version": h.version,
        })
    });
    let warnings: Vec<String> = stream.warnings().iter().map(ToString::to_string).collect();
    let out = json!({
        "header": header,
        "chunks": records,
        "warnings": warnings,
    });
    Ok(serde_json::to_string_pretty(&out)?)
}

// ── lso-scan ──────────────────────────────────────────────────────────────

/// Extracts embedded JSON documents from an arbitrary buffer.
pub fn scan_json(bytes: &[u8], options: &ScanOptions) -> Result<String, CliError> {
    let docs: Vec<Value> = scan_with(bytes, options)
        .into_iter()
        .map(|doc| {
            json!({
                "offset": doc.offset,
                "len": doc.len,
                "value": Value::from(doc.value),
            })
        })
        .collect();
    Ok(serde_json::to_string_pretty(&Value::Array(docs))?)
}

// ── lso-unarchive ─────────────────────────────────────────────────────────

/// Decodes a property list, resolving it when it is a keyed archive.
pub fn unarchive_json(bytes: &[u8], options: &DecodeOptions) -> Result<String, CliError> {
    let value = match decode(bytes, options)? {
        Decoded::Archive(value) | Decoded::Plist(value) => value,
        Decoded::Chunks(_) => return Err(CliError::UnexpectedFormat(Format::ChunkStream)),
    };
    Ok(serde_json::to_string_pretty(&Value::from(value))?)
}

// ── Arguments ─────────────────────────────────────────────────────────────

/// Parses a byte count given on the command line.
pub fn parse_size(flag: &str, raw: Option<&String>) -> Result<usize, CliError> {
    let raw = raw.ok_or_else(|| CliError::Usage(format!("{flag} needs a value")))?;
    raw.parse()
        .map_err(|_| CliError::Usage(format!("{flag}: not a number: {raw}")))
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
