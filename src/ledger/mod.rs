//! The redirect ledger: the `_redirects` file as an ordered list of entries.
//!
//! Every non-empty line is `<key><whitespace><target>`. Keys are stored with
//! their leading `/`. Rendering pads every key to one shared column width so
//! the targets line up.

mod file;

pub use file::{load, store};

use crate::error::ShortenError;

/// Spaces added after the longest key when aligning the target column.
pub const PADDING: usize = 10;

/// One `<key> <target>` line of the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectEntry {
    /// Token as stored in the file, normally `/<short key>`.
    pub key: String,
    pub target: String,
}

impl RedirectEntry {
    /// Entry for a bare short key; the `/` prefix is added here.
    pub fn for_short_key(short_key: &str, target: &str) -> Self {
        RedirectEntry {
            key: format!("/{short_key}"),
            target: target.to_string(),
        }
    }
}

/// Whole ledger held in memory, in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
    entries: Vec<RedirectEntry>,
}

impl Ledger {
    /// Parse ledger text.
    ///
    /// Blank lines are skipped. Any other line must split into exactly two
    /// whitespace-separated fields.
    ///
    /// # Errors
    /// [`ShortenError::MalformedLine`] with the 1-based number of the first bad line.
    pub fn parse(text: &str) -> Result<Ledger, ShortenError> {
        let mut entries = Vec::new();
        for (idx, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let mut fields = line.split_whitespace();
            match (fields.next(), fields.next(), fields.next()) {
                (Some(key), Some(target), None) => entries.push(RedirectEntry {
                    key: key.to_string(),
                    target: target.to_string(),
                }),
                _ => return Err(ShortenError::MalformedLine { line: idx + 1 }),
            }
        }
        Ok(Ledger { entries })
    }

    pub fn entries(&self) -> &[RedirectEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether `/<short_key>` is already mapped.
    pub fn contains_key(&self, short_key: &str) -> bool {
        self.entries
            .iter()
            .any(|e| e.key.strip_prefix('/') == Some(short_key))
    }

    /// Insert `entry` ahead of every existing entry.
    pub fn prepend(&mut self, entry: RedirectEntry) {
        self.entries.insert(0, entry);
    }

    /// Column width for the key field: longest key plus [`PADDING`].
    pub fn width(&self) -> usize {
        self.entries.iter().map(|e| e.key.len()).max().unwrap_or(0) + PADDING
    }

    /// Render every entry padded to [`Ledger::width`].
    pub fn render(&self) -> String {
        self.render_with_width(self.width())
    }

    /// Render every entry with its key left-justified in `width` columns.
    pub fn render_with_width(&self, width: usize) -> String {
        let mut out = String::new();
        for e in &self.entries {
            out.push_str(&format!("{:<width$}{}\n", e.key, e.target));
        }
        out
    }
}
