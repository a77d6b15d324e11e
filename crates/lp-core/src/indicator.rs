//! The indicator base machinery: lifecycle phases, minimum-period driven
//! dispatch, and the two equivalent evaluation modes of §4.2.
//!
//! # The two modes, one protocol
//!
//! Both modes share one invariant: every output line is `forward`-ed (one
//! NaN-padded bar, or `n` of them) *before* the active lifecycle hook runs.
//! The hook then either leaves the NaN in place (warm-up) or overwrites it
//! with `set`. This is what the design notes call driving a single kernel
//! from two loops rather than reimplementing the math twice — see each
//! indicator module for where the "kernel" actually lives.

use crate::collection::LineCollection;
use crate::types::Float;

/// A line-producing node in the pipeline (§3.4).
///
/// Implementors own their parameters, a (possibly empty, for feeds) set of
/// input line handles, and their output [`LineCollection`]. The trait is
/// object-safe so a [`crate::Pipeline`] can hold a `Vec<Box<dyn Indicator>>`
/// arena without knowing each node's concrete type.
pub trait Indicator {
    /// The minimum bar count at which every output line is guaranteed
    /// non-NaN (§4.2.2). Fixed at construction; never recomputed.
    fn minperiod(&self) -> usize;

    /// This node's output line collection.
    fn output(&self) -> &LineCollection;

    /// Called once per bar while `len < minperiod - 1` (i.e. the about-to-be
    /// produced bar count is still short of `minperiod`). The default does
    /// nothing: the bar's output slots were already `forward`-ed to NaN by
    /// the driver, which is exactly what "not yet valid" should look like.
    fn prenext(&mut self) {}

    /// Called exactly once, on the bar where the produced count first
    /// reaches `minperiod`. Indicators whose steady-state recurrence needs
    /// a different seed (EMA's SMA seed, TRIX's first delta, ...) override
    /// this; the default assumes the steady-state formula is already valid
    /// on its first call and simply delegates to [`Indicator::next`].
    fn nextstart(&mut self) {
        self.next();
    }

    /// Called once per bar once `len >= minperiod`: the steady-state
    /// streaming recurrence.
    fn next(&mut self);

    /// Batch-mode counterpart of `prenext`, covering `[start, end)`. Default
    /// does nothing, matching `prenext`.
    fn preonce(&mut self, _start: usize, _end: usize) {}

    /// Batch-mode counterpart of `nextstart`, covering the single-bar range
    /// `[start, end)` where `end == start + 1 == minperiod`. The default
    /// delegates to [`Indicator::once`], which is correct whenever the seed
    /// bar's formula coincides with the steady-state one (true for plain
    /// windowed aggregates; false for seeded recurrences like EMA).
    fn oncestart(&mut self, start: usize, end: usize) {
        self.once(start, end);
    }

    /// Batch-mode steady state, covering `[start, end)`.
    fn once(&mut self, start: usize, end: usize);
}

/// Extends every line in `output` by `n` NaN-padded bars.
fn forward_all(output: &LineCollection, n: usize) {
    for line in output.iter() {
        line.borrow_mut().forward(n);
    }
}

/// Drives one streaming bar on `ind`: forwards its output lines by one bar,
/// then dispatches to `prenext`/`nextstart`/`next` based on the resulting
/// bar count versus `minperiod` (§4.2.1).
#[tracing::instrument(level = "trace", skip(ind), fields(mp = ind.minperiod()))]
pub fn tick(ind: &mut dyn Indicator) {
    let before = ind.output().size();
    forward_all(ind.output(), 1);
    let len = before + 1;
    let mp = ind.minperiod();
    if len < mp {
        ind.prenext();
    } else if len == mp {
        ind.nextstart();
    } else {
        ind.next();
    }
}

/// Drives the whole-history batch kernel on `ind` for `n` bars: forwards
/// its output lines by `n`, then calls `preonce`/`oncestart`/`once` over
/// the three sub-ranges `[0, mp-1)`, `[mp-1, mp)`, `[mp, n)` (clipped to
/// `n` when there is not enough data to ever reach `minperiod`).
#[tracing::instrument(level = "trace", skip(ind), fields(mp = ind.minperiod(), n))]
pub fn run_once(ind: &mut dyn Indicator, n: usize) {
    if n == 0 {
        return;
    }
    forward_all(ind.output(), n);
    let mp = ind.minperiod().max(1);
    let pre_end = mp.saturating_sub(1).min(n);
    ind.preonce(0, pre_end);
    if mp <= n {
        let once_start = mp.min(n);
        ind.oncestart(pre_end, once_start);
        if once_start < n {
            ind.once(once_start, n);
        }
    } else {
        tracing::debug!(
            "node never reaches minperiod={} within n={} bars; output stays NaN",
            mp,
            n
        );
    }
}

/// Convenience: reads `line[ago]`, treating a missing handle as NaN. Used
/// pervasively by indicator `next`/`once` bodies for input access.
pub fn read(line: &crate::line::LineHandle, ago: i64) -> Float {
    line.borrow().get(ago)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::line::new_line_handle;

    /// A trivial pass-through indicator: `out[t] = in[t]`, mp = 1. Used to
    /// exercise the `tick`/`run_once` drivers in isolation from any real
    /// indicator's math.
    struct Echo {
        input: crate::line::LineHandle,
        output: LineCollection,
    }

    impl Echo {
        fn new(input: crate::line::LineHandle) -> Self {
            let mut output = LineCollection::new();
            output.add_line(Some("echo"));
            Echo { input, output }
        }
    }

    impl Indicator for Echo {
        fn minperiod(&self) -> usize {
            1
        }
        fn output(&self) -> &LineCollection {
            &self.output
        }
        fn next(&mut self) {
            let v = read(&self.input, 0);
            self.output.get_line(0).unwrap().borrow_mut().set(0, v).unwrap();
        }
        fn once(&mut self, start: usize, end: usize) {
            for i in start..end {
                let v = self.input.borrow().get_abs(i);
                self.output.get_line(0).unwrap().borrow_mut().set_abs(i, v);
            }
        }
    }

    #[test]
    fn streaming_and_batch_agree_for_echo() {
        let input = new_line_handle();
        for v in [1.0, 2.0, 3.0, 4.0] {
            input.borrow_mut().append(v);
        }

        let mut streaming = Echo::new(input.clone());
        for i in 0..4 {
            // Echo's own output must advance in lockstep with its input.
            let _ = i;
            tick(&mut streaming);
        }

        let mut batch = Echo::new(input.clone());
        run_once(&mut batch, 4);

        for ago in 0..4 {
            assert_eq!(
                streaming.output().primary().unwrap().borrow().get(-ago),
                batch.output().primary().unwrap().borrow().get(-ago),
            );
        }
    }

    #[test]
    fn prenext_leaves_nan_until_minperiod() {
        struct Delayed {
            output: LineCollection,
            mp: usize,
        }
        impl Indicator for Delayed {
            fn minperiod(&self) -> usize {
                self.mp
            }
            fn output(&self) -> &LineCollection {
                &self.output
            }
            fn next(&mut self) {
                self.output
                    .get_line(0)
                    .unwrap()
                    .borrow_mut()
                    .set(0, 1.0)
                    .unwrap();
            }
        }
        let mut output = LineCollection::new();
        output.add_line(Some("x"));
        let mut ind = Delayed { output, mp: 3 };
        tick(&mut ind);
        tick(&mut ind);
        assert!(ind.output().primary().unwrap().borrow().get(0).is_nan());
        tick(&mut ind);
        assert_eq!(ind.output().primary().unwrap().borrow().get(0), 1.0);
    }
}
