//! Wilder's Smoothed Moving Average. `mp = period`; seeded as the mean of
//! the first `period` inputs, then `smma[t] = (smma[t-1]*(period-1) + in[t]) / period`
//! — algebraically the EMA recurrence with `alpha = 1/period`.

use crate::collection::LineCollection;
use crate::error::{PipelineError, Result};
use crate::indicator::{read, Indicator};
use crate::kernel::{ema_step, mean, wilder_alpha, window_abs, window_ago};
use crate::line::LineHandle;

pub struct Smma {
    period: usize,
    alpha: f64,
    input: LineHandle,
    output: LineCollection,
}

impl Smma {
    pub fn new(input: LineHandle, period: usize) -> Result<Self> {
        PipelineError::require_positive_period(period, "Smma")?;
        let mut output = LineCollection::new();
        output.add_line(Some("smma"));
        Ok(Smma {
            period,
            alpha: wilder_alpha(period),
            input,
            output,
        })
    }
}

impl Indicator for Smma {
    fn minperiod(&self) -> usize {
        self.period
    }

    fn output(&self) -> &LineCollection {
        &self.output
    }

    fn nextstart(&mut self) {
        let seed = mean(&window_ago(&self.input, self.period));
        self.output.get_line(0).unwrap().borrow_mut().set(0, seed).unwrap();
    }

    fn next(&mut self) {
        let prev = read(self.output.primary().unwrap(), -1);
        let v = ema_step(prev, read(&self.input, 0), self.alpha);
        self.output.get_line(0).unwrap().borrow_mut().set(0, v).unwrap();
    }

    fn oncestart(&mut self, start: usize, _end: usize) {
        let seed = mean(&window_abs(&self.input, start, self.period));
        self.output.get_line(0).unwrap().borrow_mut().set_abs(start, seed);
    }

    fn once(&mut self, start: usize, end: usize) {
        for i in start..end {
            let prev = self.output.primary().unwrap().borrow().get_abs(i - 1);
            let v = ema_step(prev, self.input.borrow().get_abs(i), self.alpha);
            self.output.get_line(0).unwrap().borrow_mut().set_abs(i, v);
        }
    }
}
