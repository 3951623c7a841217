#![forbid(unsafe_code)]

//! JSONL replay transcripts.
//!
//! Every line is a JSON object carrying `seq`, `t_ms`, and `kind` plus the
//! entry's own fields. Two runs of the same scenario produce byte-identical
//! transcripts, so the blake3 checksum is a cheap regression fingerprint.

use std::fs;
use std::io;
use std::path::Path;

use serde_json::{Map, Value};
use web_time::Duration;

/// Ordered log of what a scenario did.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    lines: Vec<String>,
    kinds: Vec<String>,
}

impl Transcript {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one entry. Non-object `fields` are stored under `value`.
    pub fn record(&mut self, at: Duration, kind: &str, fields: Value) {
        let mut entry = Map::new();
        entry.insert("seq".into(), Value::from(self.lines.len() as u64));
        entry.insert("t_ms".into(), Value::from(at.as_millis() as u64));
        entry.insert("kind".into(), Value::from(kind));
        match fields {
            Value::Object(map) => entry.extend(map),
            Value::Null => {}
            other => {
                entry.insert("value".into(), other);
            }
        }
        self.lines.push(Value::Object(entry).to_string());
        self.kinds.push(kind.to_owned());
    }

    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Entries of `kind`.
    #[must_use]
    pub fn count(&self, kind: &str) -> usize {
        self.kinds.iter().filter(|k| *k == kind).count()
    }

    /// Parsed entries of `kind`, in order.
    #[must_use]
    pub fn entries(&self, kind: &str) -> Vec<Value> {
        self.lines
            .iter()
            .zip(&self.kinds)
            .filter(|(_, k)| *k == kind)
            .filter_map(|(line, _)| serde_json::from_str(line).ok())
            .collect()
    }

    /// Newline-terminated JSONL.
    #[must_use]
    pub fn to_jsonl(&self) -> String {
        let mut out = String::with_capacity(self.lines.iter().map(|l| l.len() + 1).sum());
        for line in &self.lines {
            out.push_str(line);
            out.push('\n');
        }
        out
    }

    /// `blake3:<hex>` over the JSONL bytes.
    #[must_use]
    pub fn checksum(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        for line in &self.lines {
            hasher.update(line.as_bytes());
            hasher.update(b"\n");
        }
        format!("blake3:{}", hasher.finalize().to_hex())
    }

    pub fn write_jsonl(&self, path: impl AsRef<Path>) -> io::Result<()> {
        fs::write(path, self.to_jsonl())
    }
}
