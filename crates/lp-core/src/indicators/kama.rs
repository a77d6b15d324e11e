//! Kaufman's Adaptive Moving Average (§4.5.1): an EMA-style recurrence
//! whose smoothing constant adapts to an efficiency ratio (trend strength
//! vs. noise) each bar. `mp = period + 1`.

use crate::collection::LineCollection;
use crate::error::{PipelineError, Result};
use crate::indicator::{read, Indicator};
use crate::kernel::{window_abs, window_ago};
use crate::line::LineHandle;

const DEFAULT_FAST: usize = 2;
const DEFAULT_SLOW: usize = 30;

pub struct Kama {
    period: usize,
    fast_alpha: f64,
    slow_alpha: f64,
    input: LineHandle,
    output: LineCollection,
}

impl Kama {
    pub fn new(input: LineHandle, period: usize) -> Result<Self> {
        Self::with_constants(input, period, DEFAULT_FAST, DEFAULT_SLOW)
    }

    /// As [`Kama::new`], but with explicit fast/slow EMA periods instead of
    /// the conventional `2`/`30`.
    pub fn with_constants(input: LineHandle, period: usize, fast: usize, slow: usize) -> Result<Self> {
        PipelineError::require_positive_period(period, "Kama")?;
        PipelineError::require_positive_period(fast, "Kama fast constant")?;
        PipelineError::require_positive_period(slow, "Kama slow constant")?;
        let mut output = LineCollection::new();
        output.add_line(Some("kama"));
        Ok(Kama {
            period,
            fast_alpha: 2.0 / (fast as f64 + 1.0),
            slow_alpha: 2.0 / (slow as f64 + 1.0),
            input,
            output,
        })
    }

    fn smoothing_constant(&self, window: &[f64]) -> f64 {
        let change = (window[window.len() - 1] - window[0]).abs();
        let volatility: f64 = window.windows(2).map(|w| (w[1] - w[0]).abs()).sum();
        let er = if volatility == 0.0 { 0.0 } else { change / volatility };
        (er * (self.fast_alpha - self.slow_alpha) + self.slow_alpha).powi(2)
    }
}

impl Indicator for Kama {
    fn minperiod(&self) -> usize {
        self.period + 1
    }

    fn output(&self) -> &LineCollection {
        &self.output
    }

    fn nextstart(&mut self) {
        // Seeded with the current price, matching Kaufman's original.
        let v = read(&self.input, 0);
        self.output.get_line(0).unwrap().borrow_mut().set(0, v).unwrap();
    }

    fn next(&mut self) {
        let window = window_ago(&self.input, self.period + 1);
        let sc = self.smoothing_constant(&window);
        let prev = self.output.primary().unwrap().borrow().get(-1);
        let price = read(&self.input, 0);
        let v = prev + sc * (price - prev);
        self.output.get_line(0).unwrap().borrow_mut().set(0, v).unwrap();
    }

    fn oncestart(&mut self, start: usize, _end: usize) {
        let v = self.input.borrow().get_abs(start);
        self.output.get_line(0).unwrap().borrow_mut().set_abs(start, v);
    }

    fn once(&mut self, start: usize, end: usize) {
        for i in start..end {
            let window = window_abs(&self.input, i, self.period + 1);
            let sc = self.smoothing_constant(&window);
            let prev = self.output.primary().unwrap().borrow().get_abs(i - 1);
            let price = self.input.borrow().get_abs(i);
            let v = prev + sc * (price - prev);
            self.output.get_line(0).unwrap().borrow_mut().set_abs(i, v);
        }
    }
}
