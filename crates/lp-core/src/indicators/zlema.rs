//! Zero-Lag EMA (§4.5.1): an EMA of a de-lagged input series,
//! `delagged[t] = 2*in[t] - in[t-lag]` with `lag = (period-1)/2`.
//! `mp = period + lag`.

use crate::collection::LineCollection;
use crate::error::{PipelineError, Result};
use crate::indicator::Indicator;
use crate::kernel::{ema_alpha, ema_step, mean, window_abs, window_ago};
use crate::line::{new_line_handle, LineHandle};

pub struct Zlema {
    period: usize,
    lag: usize,
    alpha: f64,
    input: LineHandle,
    delagged: LineHandle,
    output: LineCollection,
}

impl Zlema {
    pub fn new(input: LineHandle, period: usize) -> Result<Self> {
        PipelineError::require_positive_period(period, "Zlema")?;
        let lag = (period.saturating_sub(1)) / 2;
        let mut output = LineCollection::new();
        output.add_line(Some("zlema"));
        Ok(Zlema {
            period,
            lag,
            alpha: ema_alpha(period),
            input,
            delagged: new_line_handle(),
            output,
        })
    }

    fn step(&mut self, len: usize) {
        self.delagged.borrow_mut().forward(1);
        if len > self.lag {
            let v = 2.0 * self.input.borrow().get(0) - self.input.borrow().get(-(self.lag as i64));
            self.delagged.borrow_mut().set(0, v).unwrap();
        }
        let delagged_len = len.saturating_sub(self.lag);
        if delagged_len < self.period {
            return;
        }
        let v = if delagged_len == self.period {
            mean(&window_ago(&self.delagged, self.period))
        } else {
            let prev = self.output.primary().unwrap().borrow().get(-1);
            ema_step(prev, self.delagged.borrow().get(0), self.alpha)
        };
        self.output.get_line(0).unwrap().borrow_mut().set(0, v).unwrap();
    }

    fn step_abs(&mut self, i: usize) {
        let len = i + 1;
        self.delagged.borrow_mut().forward(1);
        if len > self.lag {
            let prev_i = i - self.lag;
            let v = 2.0 * self.input.borrow().get_abs(i) - self.input.borrow().get_abs(prev_i);
            self.delagged.borrow_mut().set_abs(i, v);
        }
        let delagged_len = len.saturating_sub(self.lag);
        if delagged_len < self.period {
            return;
        }
        let v = if delagged_len == self.period {
            mean(&window_abs(&self.delagged, i, self.period))
        } else {
            let prev = self.output.primary().unwrap().borrow().get_abs(i - 1);
            ema_step(prev, self.delagged.borrow().get_abs(i), self.alpha)
        };
        self.output.get_line(0).unwrap().borrow_mut().set_abs(i, v);
    }
}

impl Indicator for Zlema {
    fn minperiod(&self) -> usize {
        self.period + self.lag
    }
    fn output(&self) -> &LineCollection {
        &self.output
    }
    fn prenext(&mut self) {
        let len = self.output.size();
        self.step(len);
    }
    fn nextstart(&mut self) {
        let len = self.output.size();
        self.step(len);
    }
    fn next(&mut self) {
        let len = self.output.size();
        self.step(len);
    }
    fn preonce(&mut self, start: usize, end: usize) {
        for i in start..end {
            self.step_abs(i);
        }
    }
    fn oncestart(&mut self, start: usize, end: usize) {
        for i in start..end {
            self.step_abs(i);
        }
    }
    fn once(&mut self, start: usize, end: usize) {
        for i in start..end {
            self.step_abs(i);
        }
    }
}
