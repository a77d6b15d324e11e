//! A [`LineCollection`] fixed to the seven canonical OHLCV channels (§3.3).

use crate::collection::LineCollection;
use crate::error::{PipelineError, Result};
use crate::line::LineHandle;
use crate::types::Float;

/// Index of the `datetime` line within a [`DataFeed`].
pub const DATETIME: usize = 0;
/// Index of the `open` line within a [`DataFeed`].
pub const OPEN: usize = 1;
/// Index of the `high` line within a [`DataFeed`].
pub const HIGH: usize = 2;
/// Index of the `low` line within a [`DataFeed`].
pub const LOW: usize = 3;
/// Index of the `close` line within a [`DataFeed`].
pub const CLOSE: usize = 4;
/// Index of the `volume` line within a [`DataFeed`].
pub const VOLUME: usize = 5;
/// Index of the `openinterest` line within a [`DataFeed`].
pub const OPEN_INTEREST: usize = 6;

const NAMES: [&str; 7] = [
    "datetime",
    "open",
    "high",
    "low",
    "close",
    "volume",
    "openinterest",
];

/// A line collection with exactly the seven OHLCV lines in the fixed order
/// `{datetime, open, high, low, close, volume, openinterest}`.
///
/// This is the only concrete producer the core defines; everything else
/// (CSV ingestion, broker fills, live feeds) is an external collaborator
/// that only needs to call [`DataFeed::push_bar`] once per bar.
#[derive(Debug, Clone)]
pub struct DataFeed {
    lines: LineCollection,
}

impl Default for DataFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl DataFeed {
    /// Creates a feed with its seven lines already allocated (but empty).
    pub fn new() -> Self {
        let mut lines = LineCollection::new();
        for name in NAMES {
            lines.add_line(Some(name));
        }
        DataFeed { lines }
    }

    /// Appends one bar. `volume`/`openinterest` default to `0.0`, matching
    /// §3.3. The caller is responsible for the OHLC invariant
    /// (`low <= min(open, close) <= max(open, close) <= high`) and for
    /// `datetime` being monotonically non-decreasing; the core does not
    /// enforce either, by design.
    pub fn push_bar(
        &mut self,
        datetime: Float,
        open: Float,
        high: Float,
        low: Float,
        close: Float,
        volume: Option<Float>,
        openinterest: Option<Float>,
    ) {
        self.line_mut(DATETIME).append(datetime);
        self.line_mut(OPEN).append(open);
        self.line_mut(HIGH).append(high);
        self.line_mut(LOW).append(low);
        self.line_mut(CLOSE).append(close);
        self.line_mut(VOLUME).append(volume.unwrap_or(0.0));
        self.line_mut(OPEN_INTEREST)
            .append(openinterest.unwrap_or(0.0));
    }

    /// The underlying line collection, for passing to indicator constructors.
    pub fn lines(&self) -> &LineCollection {
        &self.lines
    }

    /// Number of bars pushed so far.
    pub fn size(&self) -> usize {
        self.lines.size()
    }

    fn line_mut(&mut self, idx: usize) -> std::cell::RefMut<'_, crate::line::Line> {
        self.lines.get_line(idx).unwrap().borrow_mut()
    }

    /// Fetches one of the seven lines by name, validating that a
    /// [`LineCollection`] claiming to be OHLC-shaped actually has it.
    /// Used by constructors of indicators that consume a feed-like
    /// collection rather than a concrete [`DataFeed`] (§7, input shape
    /// mismatch).
    pub fn require_line(collection: &LineCollection, name: &str) -> Result<LineHandle> {
        collection.get_line_by_name(name).cloned().ok_or_else(|| {
            PipelineError::input_shape_mismatch(format!(
                "expected a '{name}' line, but the input collection does not have one"
            ))
        })
    }
}
