//! The line buffer: a single append-only numeric channel with bar-relative
//! ("ago") indexing. This is the leaf of the data model in §3.1.
//!
//! # NaN semantics
//!
//! `Float::NAN` means "not yet valid" — a bar before an indicator's minimum
//! period, or a read that falls outside the buffer's current range. It is
//! never an error (see [`crate::error`]).
//!
//! # Ago indexing
//!
//! `ago <= 0` is the only legal direction for reads and writes: `0` is the
//! current bar, `-1` is the previous one, and so on. `get` tolerates
//! `ago > 0` by returning NaN (mirroring a not-yet-happened bar); `set`
//! rejects it outright, since writing to the future is a programmer error,
//! not a warm-up state.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::error::{PipelineError, Result};
use crate::types::Float;

/// Shared, reference-counted handle to a [`Line`].
///
/// Indicators hold clones of their inputs' handles rather than indices into
/// a global arena (see the "cyclic references" design note): a handle only
/// ever points from a consumer toward a producer, never the reverse, so the
/// dependency graph is acyclic by construction.
pub type LineHandle = Rc<RefCell<Line>>;

/// Wraps a fresh, empty [`Line`] in a [`LineHandle`].
pub fn new_line_handle() -> LineHandle {
    Rc::new(RefCell::new(Line::new()))
}

/// An append-only numeric channel with a movable cursor.
///
/// Physically the buffer is a [`VecDeque`] so the bounded "q-buffer" mode
/// (§4.1, `savemem`) can drop the oldest entries in O(1) without disturbing
/// the logical indexing: `idx` always tracks the *logical* cursor position,
/// and `dropped` records how many leading entries have been evicted so a
/// read that lands before the window returns NaN instead of panicking.
#[derive(Debug, Clone)]
pub struct Line {
    buffer: VecDeque<Float>,
    /// Logical cursor: -1 means empty, otherwise the index of the current bar.
    idx: i64,
    /// Count of physically-evicted leading entries (q-buffer mode only).
    dropped: usize,
    /// `savemem` capacity; `None` means unbounded (the default).
    capacity: Option<usize>,
    /// Lines whose `append` mirrors this line's `append` (§3.1 binding).
    bindings: Vec<LineHandle>,
}

impl Default for Line {
    fn default() -> Self {
        Self::new()
    }
}

impl Line {
    /// Creates an empty, unbounded line: `idx = -1`, no data.
    pub fn new() -> Self {
        Line {
            buffer: VecDeque::new(),
            idx: -1,
            dropped: 0,
            capacity: None,
            bindings: Vec::new(),
        }
    }

    /// Declares a bounded "q-buffer" capacity. Once the logical length
    /// exceeds `capacity`, the oldest physical entry is dropped on every
    /// subsequent `append`/`forward`. Any indicator whose window fits
    /// within `capacity` remains correct; reads below the window return NaN.
    pub fn set_savemem(&mut self, capacity: usize) {
        self.capacity = Some(capacity.max(1));
        self.trim();
    }

    /// Number of logical bars processed so far (I4: `idx + 1`, or `0` if empty).
    pub fn size(&self) -> usize {
        if self.idx < 0 {
            0
        } else {
            (self.idx + 1) as usize
        }
    }

    /// `true` iff no bar has been appended or forwarded yet.
    pub fn is_empty(&self) -> bool {
        self.idx < 0
    }

    /// The raw logical cursor; `-1` before any data exists.
    pub fn cursor(&self) -> i64 {
        self.idx
    }

    /// Appends a new current value, advancing the cursor by one (I3).
    ///
    /// Mirrors the value into every bound line afterward, so bindings form
    /// a tree of simultaneous appends rather than a lag chain.
    pub fn append(&mut self, value: Float) {
        self.idx += 1;
        self.buffer.push_back(value);
        self.trim();
        for bound in &self.bindings {
            bound.borrow_mut().append(value);
        }
    }

    /// Advances the cursor by `n` bars, padding each new slot with NaN.
    /// Used by the driver to keep every output line bar-aligned with its
    /// input before dispatching to the active lifecycle hook (§4.2.1).
    pub fn forward(&mut self, n: usize) {
        for _ in 0..n {
            self.append(Float::NAN);
        }
    }

    /// Reads the value at bar-relative offset `ago` (`ago <= 0` is current
    /// or earlier). Any position outside the live range — including a
    /// future `ago > 0`, a negative absolute index, or a position evicted
    /// by `savemem` — returns NaN rather than erroring.
    pub fn get(&self, ago: i64) -> Float {
        if self.idx < 0 {
            return Float::NAN;
        }
        let abs = self.idx + ago;
        if abs < 0 || abs > self.idx {
            return Float::NAN;
        }
        let abs = abs as usize;
        if abs < self.dropped {
            return Float::NAN;
        }
        let physical = abs - self.dropped;
        self.buffer.get(physical).copied().unwrap_or(Float::NAN)
    }

    /// Writes `value` at bar-relative offset `ago`. Rejects `ago > 0` with
    /// [`PipelineError::AccessOutOfRange`] — writing to an unborn bar is a
    /// programmer error, not a warm-up state. Because every output line is
    /// kept bar-aligned via `forward` before the active hook runs (§4.2.1),
    /// `ago <= 0` always addresses an already-physically-present slot; no
    /// buffer growth happens here.
    pub fn set(&mut self, ago: i64, value: Float) -> Result<()> {
        if ago > 0 {
            return Err(PipelineError::AccessOutOfRange { ago });
        }
        if self.idx < 0 {
            return Err(PipelineError::AccessOutOfRange { ago });
        }
        let abs = self.idx + ago;
        if abs < 0 {
            return Err(PipelineError::AccessOutOfRange { ago });
        }
        let abs = abs as usize;
        if abs < self.dropped {
            // Evicted by savemem; nothing physically there to overwrite.
            return Ok(());
        }
        let physical = abs - self.dropped;
        if let Some(slot) = self.buffer.get_mut(physical) {
            *slot = value;
        }
        for bound in &self.bindings {
            bound.borrow_mut().set(ago, value).ok();
        }
        Ok(())
    }

    /// Absolute-index read used by batch (`once`) kernels, where it is more
    /// natural to walk `start..end` than to keep re-deriving `ago`.
    pub fn get_abs(&self, i: usize) -> Float {
        self.get(i as i64 - self.idx)
    }

    /// Absolute-index write, the batch-mode counterpart of [`Line::set`].
    pub fn set_abs(&mut self, i: usize, value: Float) {
        let ago = i as i64 - self.idx;
        self.set(ago, value).ok();
    }

    /// Resets to a single NaN entry with the cursor at `0` (§4.1 table).
    /// Distinct from [`Line::clear`]: a fresh "warm but empty" state, used
    /// where the caller wants `size() == 1` rather than `0`.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.buffer.push_back(Float::NAN);
        self.idx = 0;
        self.dropped = 0;
    }

    /// Empties the line entirely: `idx = -1`, no entries (§9 open question
    /// (c) — the one unambiguous "full wipe" the reimplementation commits to).
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.idx = -1;
        self.dropped = 0;
    }

    /// Registers `target` to mirror every future `append` (and best-effort
    /// `set`) on `source`. Rejects binding a line to itself, which is the
    /// only cycle a single `bind` call could possibly introduce.
    pub fn bind(source: &LineHandle, target: &LineHandle) -> Result<()> {
        if Rc::ptr_eq(source, target) {
            return Err(PipelineError::construction(
                "a line cannot be bound to itself",
            ));
        }
        source.borrow_mut().bindings.push(Rc::clone(target));
        Ok(())
    }

    fn trim(&mut self) {
        if let Some(cap) = self.capacity {
            while self.buffer.len() > cap {
                self.buffer.pop_front();
                self.dropped += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_advances_cursor_and_sets_current() {
        let mut line = Line::new();
        assert_eq!(line.size(), 0);
        line.append(1.0);
        assert_eq!(line.get(0), 1.0);
        line.append(2.0);
        assert_eq!(line.get(0), 2.0);
        assert_eq!(line.get(-1), 1.0);
        assert_eq!(line.size(), 2);
    }

    #[test]
    fn out_of_range_reads_are_nan() {
        let mut line = Line::new();
        line.append(1.0);
        assert!(line.get(1).is_nan());
        assert!(line.get(-5).is_nan());
        let empty = Line::new();
        assert!(empty.get(0).is_nan());
    }

    #[test]
    fn set_rejects_future_writes() {
        let mut line = Line::new();
        line.append(1.0);
        let err = line.set(1, 2.0).unwrap_err();
        assert!(matches!(err, PipelineError::AccessOutOfRange { ago: 1 }));
    }

    #[test]
    fn forward_pads_with_nan_then_set_overwrites() {
        let mut line = Line::new();
        line.forward(1);
        assert!(line.get(0).is_nan());
        line.set(0, 42.0).unwrap();
        assert_eq!(line.get(0), 42.0);
    }

    #[test]
    fn reset_seeds_single_nan_clear_empties() {
        let mut line = Line::new();
        line.append(1.0);
        line.append(2.0);
        line.reset();
        assert_eq!(line.size(), 1);
        assert!(line.get(0).is_nan());
        line.clear();
        assert_eq!(line.size(), 0);
        assert_eq!(line.cursor(), -1);
    }

    #[test]
    fn savemem_evicts_old_entries_but_keeps_logical_size() {
        let mut line = Line::new();
        line.set_savemem(3);
        for v in 0..10 {
            line.append(v as Float);
        }
        assert_eq!(line.size(), 10);
        assert_eq!(line.get(0), 9.0);
        assert_eq!(line.get(-2), 7.0);
        // Anything older than the 3-entry window is gone.
        assert!(line.get(-5).is_nan());
    }

    #[test]
    fn binding_mirrors_appends() {
        let source = new_line_handle();
        let target = new_line_handle();
        Line::bind(&source, &target).unwrap();
        source.borrow_mut().append(1.0);
        source.borrow_mut().append(2.0);
        assert_eq!(target.borrow().get(0), 2.0);
        assert_eq!(target.borrow().get(-1), 1.0);
    }

    #[test]
    fn binding_rejects_self_cycle() {
        let line = new_line_handle();
        let err = Line::bind(&line, &line).unwrap_err();
        assert!(matches!(err, PipelineError::Construction(_)));
    }
}
