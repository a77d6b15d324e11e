//! An ordered set of [`Line`]s with optional string aliases (§3.2).

use std::collections::HashMap;

use crate::line::{new_line_handle, LineHandle};
use crate::types::Float;

/// An ordered list of lines, addressable by position or by name.
///
/// Line `0` is the "primary" line by convention: `LineCollection` forwards
/// `primary()`/`primary_ago()` sugar to it, matching how a data feed's
/// primary line is `close` to close-only indicators, and how a single-line
/// indicator's own output is its line 0.
#[derive(Debug, Clone, Default)]
pub struct LineCollection {
    lines: Vec<LineHandle>,
    aliases: HashMap<String, usize>,
}

impl LineCollection {
    /// An empty collection with no lines.
    pub fn new() -> Self {
        LineCollection {
            lines: Vec::new(),
            aliases: HashMap::new(),
        }
    }

    /// Appends a freshly created, empty line and optionally aliases it.
    /// Returns the new line's index.
    pub fn add_line(&mut self, alias: Option<&str>) -> usize {
        let idx = self.lines.len();
        self.lines.push(new_line_handle());
        if let Some(name) = alias {
            self.aliases.insert(name.to_string(), idx);
        }
        idx
    }

    /// Adds an alias for an already-present line index.
    pub fn add_alias(&mut self, name: &str, idx: usize) {
        self.aliases.insert(name.to_string(), idx);
    }

    /// Number of lines in the collection.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// `true` iff the collection has no lines at all.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Fetches a line handle by position.
    pub fn get_line(&self, idx: usize) -> Option<&LineHandle> {
        self.lines.get(idx)
    }

    /// Fetches a line handle by alias.
    pub fn get_line_by_name(&self, name: &str) -> Option<&LineHandle> {
        self.aliases.get(name).and_then(|&idx| self.lines.get(idx))
    }

    /// The primary line (index 0), if any line exists yet.
    pub fn primary(&self) -> Option<&LineHandle> {
        self.lines.first()
    }

    /// Bar-relative read sugar on the primary line; NaN if the collection
    /// has no lines.
    pub fn primary_ago(&self, ago: i64) -> Float {
        match self.primary() {
            Some(line) => line.borrow().get(ago),
            None => Float::NAN,
        }
    }

    /// Iterates over every line handle in order.
    pub fn iter(&self) -> impl Iterator<Item = &LineHandle> {
        self.lines.iter()
    }

    /// The logical size of the primary line, or `0` if there is none.
    /// This is what the driver uses to decide which lifecycle phase
    /// (`prenext`/`nextstart`/`next`) applies to the next bar (§4.2.1).
    pub fn size(&self) -> usize {
        self.primary().map(|l| l.borrow().size()).unwrap_or(0)
    }
}
