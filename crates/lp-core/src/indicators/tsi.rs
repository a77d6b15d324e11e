//! True Strength Index (§4.4.5): a double-smoothed momentum divided by a
//! double-smoothed absolute momentum, where momentum is the `pchange`-bar
//! price change (§6.3 `pchange`). `mp = pchange + long_period +
//! short_period - 1`: `pchange` bars for the first momentum reading, then
//! each EMA stage adds its own `period - 1`.

use crate::collection::LineCollection;
use crate::error::{PipelineError, Result};
use crate::indicator::Indicator;
use crate::kernel::{ema_alpha, ema_step, mean, window_abs, window_ago};
use crate::line::{new_line_handle, LineHandle};

fn ema_stage_step(line: &LineHandle, input_ago0: &LineHandle, stage_len: usize, period: usize, alpha: f64) {
    line.borrow_mut().forward(1);
    if stage_len < period {
        return;
    }
    let v = if stage_len == period {
        mean(&window_ago(input_ago0, period))
    } else {
        let prev = line.borrow().get(-1);
        ema_step(prev, input_ago0.borrow().get(0), alpha)
    };
    line.borrow_mut().set(0, v).unwrap();
}

fn ema_stage_step_abs(line: &LineHandle, input: &LineHandle, i: usize, stage_len: usize, period: usize, alpha: f64) {
    line.borrow_mut().forward(1);
    if stage_len < period {
        return;
    }
    let v = if stage_len == period {
        mean(&window_abs(input, i, period))
    } else {
        let prev = line.borrow().get_abs(i - 1);
        ema_step(prev, input.borrow().get_abs(i), alpha)
    };
    line.borrow_mut().set_abs(i, v);
}

pub struct Tsi {
    long_period: usize,
    short_period: usize,
    pchange: usize,
    long_alpha: f64,
    short_alpha: f64,
    input: LineHandle,
    momentum: LineHandle,
    abs_momentum: LineHandle,
    long_num: LineHandle,
    long_den: LineHandle,
    short_num: LineHandle,
    short_den: LineHandle,
    output: LineCollection,
}

impl Tsi {
    pub fn new(input: LineHandle, long_period: usize, short_period: usize, pchange: usize) -> Result<Self> {
        PipelineError::require_positive_period(long_period, "Tsi long_period")?;
        PipelineError::require_positive_period(short_period, "Tsi short_period")?;
        PipelineError::require_positive_period(pchange, "Tsi pchange")?;
        let mut output = LineCollection::new();
        output.add_line(Some("tsi"));
        Ok(Tsi {
            long_period,
            short_period,
            pchange,
            long_alpha: ema_alpha(long_period),
            short_alpha: ema_alpha(short_period),
            input,
            momentum: new_line_handle(),
            abs_momentum: new_line_handle(),
            long_num: new_line_handle(),
            long_den: new_line_handle(),
            short_num: new_line_handle(),
            short_den: new_line_handle(),
            output,
        })
    }

    fn step(&mut self, len: usize) {
        self.momentum.borrow_mut().forward(1);
        self.abs_momentum.borrow_mut().forward(1);
        if len > self.pchange {
            let m = self.input.borrow().get(0) - self.input.borrow().get(-(self.pchange as i64));
            self.momentum.borrow_mut().set(0, m).unwrap();
            self.abs_momentum.borrow_mut().set(0, m.abs()).unwrap();
        }
        let momentum_len = len.saturating_sub(self.pchange);
        ema_stage_step(&self.long_num, &self.momentum, momentum_len, self.long_period, self.long_alpha);
        ema_stage_step(&self.long_den, &self.abs_momentum, momentum_len, self.long_period, self.long_alpha);
        let stage1_len = momentum_len.saturating_sub(self.long_period - 1);
        ema_stage_step(&self.short_num, &self.long_num, stage1_len, self.short_period, self.short_alpha);
        ema_stage_step(&self.short_den, &self.long_den, stage1_len, self.short_period, self.short_alpha);
        if stage1_len >= self.short_period {
            let num = self.short_num.borrow().get(0);
            let den = self.short_den.borrow().get(0);
            let v = 100.0 * num / den;
            self.output.get_line(0).unwrap().borrow_mut().set(0, v).unwrap();
        }
    }

    fn step_abs(&mut self, i: usize) {
        let len = i + 1;
        self.momentum.borrow_mut().forward(1);
        self.abs_momentum.borrow_mut().forward(1);
        if len > self.pchange {
            let m = self.input.borrow().get_abs(i) - self.input.borrow().get_abs(i - self.pchange);
            self.momentum.borrow_mut().set_abs(i, m);
            self.abs_momentum.borrow_mut().set_abs(i, m.abs());
        }
        let momentum_len = len.saturating_sub(self.pchange);
        ema_stage_step_abs(&self.long_num, &self.momentum, i, momentum_len, self.long_period, self.long_alpha);
        ema_stage_step_abs(&self.long_den, &self.abs_momentum, i, momentum_len, self.long_period, self.long_alpha);
        let stage1_len = momentum_len.saturating_sub(self.long_period - 1);
        ema_stage_step_abs(&self.short_num, &self.long_num, i, stage1_len, self.short_period, self.short_alpha);
        ema_stage_step_abs(&self.short_den, &self.long_den, i, stage1_len, self.short_period, self.short_alpha);
        if stage1_len >= self.short_period {
            let num = self.short_num.borrow().get_abs(i);
            let den = self.short_den.borrow().get_abs(i);
            let v = 100.0 * num / den;
            self.output.get_line(0).unwrap().borrow_mut().set_abs(i, v);
        }
    }
}

impl Indicator for Tsi {
    fn minperiod(&self) -> usize {
        self.pchange + self.long_period + self.short_period - 1
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
