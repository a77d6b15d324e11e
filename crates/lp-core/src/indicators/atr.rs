//! Average True Range (§4.5.3/§4.7): Wilder's smoothing of true range.
//! `ATR = SMMA_period(TR)`, `mp = period + 1` — one extra bar beyond SMMA's
//! own `mp = period` because the first true range needs a previous close.

use crate::collection::LineCollection;
use crate::error::{PipelineError, Result};
use crate::indicator::{read, Indicator};
use crate::kernel::{ema_step, mean, true_range, wilder_alpha};
use crate::line::LineHandle;

pub struct Atr {
    period: usize,
    alpha: f64,
    high: LineHandle,
    low: LineHandle,
    close: LineHandle,
    output: LineCollection,
}

impl Atr {
    pub fn new(high: LineHandle, low: LineHandle, close: LineHandle, period: usize) -> Result<Self> {
        PipelineError::require_positive_period(period, "Atr")?;
        let mut output = LineCollection::new();
        output.add_line(Some("atr"));
        Ok(Atr {
            period,
            alpha: wilder_alpha(period),
            high,
            low,
            close,
            output,
        })
    }

    fn tr_ago(&self, ago: i64) -> f64 {
        true_range(
            read(&self.high, ago),
            read(&self.low, ago),
            read(&self.close, ago - 1),
        )
    }

    fn tr_abs(&self, i: usize) -> f64 {
        let high = self.high.borrow().get_abs(i);
        let low = self.low.borrow().get_abs(i);
        let prev_close = if i == 0 {
            f64::NAN
        } else {
            self.close.borrow().get_abs(i - 1)
        };
        true_range(high, low, prev_close)
    }
}

impl Indicator for Atr {
    fn minperiod(&self) -> usize {
        self.period + 1
    }

    fn output(&self) -> &LineCollection {
        &self.output
    }

    fn nextstart(&mut self) {
        let window: Vec<f64> = (0..self.period)
            .rev()
            .map(|back| self.tr_ago(-(back as i64)))
            .collect();
        let seed = mean(&window);
        self.output.get_line(0).unwrap().borrow_mut().set(0, seed).unwrap();
    }

    fn next(&mut self) {
        let prev = read(self.output.primary().unwrap(), -1);
        let v = ema_step(prev, self.tr_ago(0), self.alpha);
        self.output.get_line(0).unwrap().borrow_mut().set(0, v).unwrap();
    }

    fn oncestart(&mut self, start: usize, _end: usize) {
        let window: Vec<f64> = (start + 1 - self.period..=start)
            .map(|i| self.tr_abs(i))
            .collect();
        let seed = mean(&window);
        self.output.get_line(0).unwrap().borrow_mut().set_abs(start, seed);
    }

    fn once(&mut self, start: usize, end: usize) {
        for i in start..end {
            let prev = self.output.primary().unwrap().borrow().get_abs(i - 1);
            let v = ema_step(prev, self.tr_abs(i), self.alpha);
            self.output.get_line(0).unwrap().borrow_mut().set_abs(i, v);
        }
    }
}
