//! Ordered key/value store backing the `.aux` sidecar
//!
//! Keys are matched case-insensitively (ASCII) everywhere. Keys need not be
//! unique on load; lookups and updates address the first match.

use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::error::Result;

/// Separator written between key and value when a sidecar is saved
pub const SIDECAR_SEPARATOR: &str = ": ";

/// A single `key: value` line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataEntry {
    pub key: String,
    pub value: String,
}

/// Ordered collection of sidecar lines with a dirty flag
#[derive(Debug, Clone, Default)]
pub struct MetadataStore {
    entries: Vec<MetadataEntry>,
    dirty: bool,
}

impl MetadataStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a sidecar file.
    ///
    /// A missing file yields an empty store rather than an error so callers
    /// can tell "no sidecar" apart from a malformed one.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        match fs::read(path.as_ref()) {
            Ok(bytes) => Ok(Self::parse(&String::from_utf8_lossy(&bytes))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Self::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Parses sidecar text.
    ///
    /// Each non-blank line splits at the first `:` or `=`; a line with
    /// neither splits at its first run of whitespace. Leading whitespace of
    /// the value is dropped.
    pub fn parse(text: &str) -> Self {
        let entries = text
            .lines()
            .map(|line| line.trim_end_matches('\r'))
            .filter(|line| !line.trim().is_empty())
            .map(parse_line)
            .collect();

        Self {
            entries,
            dirty: false,
        }
    }

    /// Returns the value of the first entry whose key matches
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|entry| entry.key.eq_ignore_ascii_case(key))
            .map(|entry| entry.value.as_str())
    }

    /// Whether any entry carries the key
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Replaces the first matching entry or appends a new one, and marks the
    /// store dirty
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        match self
            .entries
            .iter_mut()
            .find(|entry| entry.key.eq_ignore_ascii_case(key))
        {
            Some(entry) => entry.value = value,
            None => self.entries.push(MetadataEntry {
                key: key.to_string(),
                value,
            }),
        }
        self.dirty = true;
    }

    /// Writes every entry as `key<separator>value`, one per line
    pub fn save<P: AsRef<Path>>(&self, path: P, separator: &str) -> Result<()> {
        let file = fs::File::create(path.as_ref())?;
        let mut writer = BufWriter::new(file);
        for entry in &self.entries {
            writeln!(writer, "{}{}{}", entry.key, separator, entry.value)?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    pub fn entries(&self) -> &[MetadataEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn parse_line(line: &str) -> MetadataEntry {
    let split = line
        .find([':', '='])
        .map(|idx| (&line[..idx], &line[idx + 1..]))
        .or_else(|| {
            let trimmed = line.trim_start();
            trimmed
                .find(char::is_whitespace)
                .map(|idx| (&trimmed[..idx], &trimmed[idx..]))
        });

    match split {
        Some((key, value)) => MetadataEntry {
            key: key.trim().to_string(),
            value: value.trim_start().to_string(),
        },
        None => MetadataEntry {
            key: line.trim().to_string(),
            value: String::new(),
        },
    }
}
