//! Desktop entry (.desktop file) reading and writing.
//!
//! The format handled here is the small subset barrel writes: a group header
//! followed by `Key=Value` lines. Parsing keeps every line in order so a
//! file can be modified and written back without disturbing keys barrel
//! does not know about.

use std::fmt;

/// Group header written at the top of every entry
pub const DESKTOP_ENTRY_HEADER: &str = "[Desktop Entry]";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Line {
    /// Line without `=` (group headers, comments), kept verbatim
    Raw(String),
    Field { key: String, value: String },
}

/// An editable desktop entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DesktopEntry {
    lines: Vec<Line>,
    /// Index where the next missing key gets inserted
    insert_at: Option<usize>,
}

impl DesktopEntry {
    /// Empty entry carrying only the `[Desktop Entry]` header.
    pub fn new() -> Self {
        Self::parse(DESKTOP_ENTRY_HEADER)
    }

    /// Parse desktop entry text. Never fails: blank lines are dropped and
    /// anything without `=` is kept as an opaque line.
    pub fn parse(text: &str) -> Self {
        let mut lines = Vec::new();

        for line in text.lines() {
            if line.trim().is_empty() {
                continue;
            }
            match line.split_once('=') {
                Some((key, value)) => lines.push(Line::Field {
                    key: key.trim().to_string(),
                    value: value.to_string(),
                }),
                None => lines.push(Line::Raw(line.to_string())),
            }
        }

        let insert_at = lines
            .iter()
            .position(|l| matches!(l, Line::Raw(raw) if raw.trim_start().starts_with('[')))
            .map(|header| header + 1);

        Self { lines, insert_at }
    }

    /// Value of `key`, or `default` when the key is absent.
    pub fn get<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.lines
            .iter()
            .find_map(|line| match line {
                Line::Field { key: k, value } if k == key => Some(value.as_str()),
                _ => None,
            })
            .unwrap_or(default)
    }

    /// Whether `key` is present.
    pub fn contains(&self, key: &str) -> bool {
        self.lines
            .iter()
            .any(|line| matches!(line, Line::Field { key: k, .. } if k == key))
    }

    /// Update `key` in place, or insert it right after the header.
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        let key = key.trim();
        let value = value.into();

        for line in &mut self.lines {
            if let Line::Field { key: k, value: v } = line {
                if k == key {
                    *v = value;
                    return;
                }
            }
        }

        let field = Line::Field {
            key: key.to_string(),
            value,
        };
        match self.insert_at {
            Some(index) => {
                self.lines.insert(index, field);
                self.insert_at = Some(index + 1);
            }
            None => self.lines.push(field),
        }
    }

    /// [`DesktopEntry::set`] for several fields, applied in order.
    pub fn set_many<I, K, V>(&mut self, fields: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        for (key, value) in fields {
            self.set(key.as_ref(), value);
        }
    }

    /// Key/value pairs in file order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.lines.iter().filter_map(|line| match line {
            Line::Field { key, value } => Some((key.as_str(), value.as_str())),
            Line::Raw(_) => None,
        })
    }

    /// Render back to text with a single trailing newline.
    pub fn serialize(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            match line {
                Line::Raw(raw) => out.push_str(raw),
                Line::Field { key, value } => {
                    out.push_str(key);
                    out.push('=');
                    out.push_str(value);
                }
            }
            out.push('\n');
        }
        out
    }
}

impl fmt::Display for DesktopEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.serialize())
    }
}
