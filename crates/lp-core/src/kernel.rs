//! Small pure numeric helpers shared by several indicator modules.
//!
//! Keeping these here rather than duplicating them per-indicator is what
//! lets the streaming and batch modes of e.g. SMA and EMA call exactly the
//! same formula instead of two hand-synced copies (§4.2's equivalence
//! property, P3).

use crate::line::LineHandle;
use crate::types::Float;

/// Smoothing factor for an EMA-family recurrence with the given period.
pub fn ema_alpha(period: usize) -> Float {
    2.0 / (period as Float + 1.0)
}

/// Wilder's smoothing factor (`1/period`), used by SMMA/ATR/DM/ADX.
pub fn wilder_alpha(period: usize) -> Float {
    1.0 / period as Float
}

/// Arithmetic mean of a slice.
pub fn mean(values: &[Float]) -> Float {
    values.iter().sum::<Float>() / values.len() as Float
}

/// Reads `line[ago=0]` back through `period` bars, oldest first — the
/// natural order for a seeding sum. Out-of-range reads come back NaN from
/// [`crate::line::Line::get`], same as any other read.
pub fn window_ago(line: &LineHandle, period: usize) -> Vec<Float> {
    let borrow = line.borrow();
    (0..period)
        .rev()
        .map(|back| borrow.get(-(back as i64)))
        .collect()
}

/// Same as [`window_ago`] but addressed by absolute index, for batch kernels
/// walking `start..end`. Returns the `period` values ending at (and
/// including) `end_abs`.
pub fn window_abs(line: &LineHandle, end_abs: usize, period: usize) -> Vec<Float> {
    let borrow = line.borrow();
    let start = end_abs + 1 - period;
    (start..=end_abs).map(|i| borrow.get_abs(i)).collect()
}

/// Linearly weighted mean of a window, heaviest weight on the last
/// (most recent) element — shared by WMA and HMA's inner stages.
pub fn wma_weighted(window: &[Float]) -> Float {
    let weight_sum = (1..=window.len()).sum::<usize>() as Float;
    window
        .iter()
        .enumerate()
        .map(|(i, &v)| v * (i + 1) as Float)
        .sum::<Float>()
        / weight_sum
}

/// EMA-style recurrence: `alpha * value + (1 - alpha) * prev`.
pub fn ema_step(prev: Float, value: Float, alpha: Float) -> Float {
    alpha * value + (1.0 - alpha) * prev
}

/// True range of one bar against the previous close (§4.5.3/§4.7).
pub fn true_range(high: Float, low: Float, prev_close: Float) -> Float {
    if prev_close.is_nan() {
        return high - low;
    }
    let a = high - low;
    let b = (high - prev_close).abs();
    let c = (low - prev_close).abs();
    a.max(b).max(c)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::line::new_line_handle;

    #[test]
    fn mean_of_window() {
        let line = new_line_handle();
        for v in [1.0, 2.0, 3.0, 4.0, 5.0] {
            line.borrow_mut().append(v);
        }
        let w = window_ago(&line, 3);
        assert_eq!(w, vec![3.0, 4.0, 5.0]);
        assert_eq!(mean(&w), 4.0);
    }

    #[test]
    fn window_abs_matches_window_ago_at_head() {
        let line = new_line_handle();
        for v in [10.0, 20.0, 30.0, 40.0] {
            line.borrow_mut().append(v);
        }
        let by_ago = window_ago(&line, 2);
        let by_abs = window_abs(&line, 3, 2);
        assert_eq!(by_ago, by_abs);
    }

    #[test]
    fn true_range_without_prev_close_is_high_minus_low() {
        assert_eq!(true_range(10.0, 8.0, Float::NAN), 2.0);
    }

    #[test]
    fn true_range_picks_widest_of_three() {
        // prev close far below the bar's low: low - prev_close dominates.
        assert_eq!(true_range(10.0, 9.0, 2.0), 8.0);
    }

    quickcheck::quickcheck! {
        /// WMA's weights always sum to 1: a constant window returns that
        /// same constant, for any window length (within float rounding —
        /// §7's tolerance, since the weighted sum and the weight sum are
        /// each accumulated independently).
        fn wma_weighted_of_constant_window_is_identity(len: u8, c: i16) -> quickcheck::TestResult {
            if len == 0 {
                return quickcheck::TestResult::discard();
            }
            let c = c as Float;
            let window = vec![c; len as usize];
            quickcheck::TestResult::from_bool((wma_weighted(&window) - c).abs() <= 1e-9 * c.abs().max(1.0))
        }
    }
}
