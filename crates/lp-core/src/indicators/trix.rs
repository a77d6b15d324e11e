//! TRIX (§4.4.4): the percentage rate of change, over `rocperiod` bars
//! (§6.3 `rocperiod`), of a triple-smoothed EMA. `mp = 3*(period-1) +
//! rocperiod + 1`: the triple EMA chain needs `3*(period-1)+1` bars to
//! produce its first value, plus `rocperiod` more so the rate-of-change
//! has a value `rocperiod` bars back to compare against.

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

pub struct Trix {
    period: usize,
    rocperiod: usize,
    alpha: f64,
    input: LineHandle,
    ema1: LineHandle,
    ema2: LineHandle,
    ema3: LineHandle,
    output: LineCollection,
}

impl Trix {
    pub fn new(input: LineHandle, period: usize, rocperiod: usize) -> Result<Self> {
        PipelineError::require_positive_period(period, "Trix")?;
        PipelineError::require_positive_period(rocperiod, "Trix rocperiod")?;
        let mut output = LineCollection::new();
        output.add_line(Some("trix"));
        Ok(Trix {
            period,
            rocperiod,
            alpha: ema_alpha(period),
            input,
            ema1: new_line_handle(),
            ema2: new_line_handle(),
            ema3: new_line_handle(),
            output,
        })
    }

    fn ema3_stage_len(&self, len: usize) -> usize {
        let stage2 = len.saturating_sub(self.period - 1);
        stage2.saturating_sub(self.period - 1)
    }

    fn step(&mut self, len: usize) {
        ema_stage_step(&self.ema1, &self.input, len, self.period, self.alpha);
        let stage2_len = len.saturating_sub(self.period - 1);
        ema_stage_step(&self.ema2, &self.ema1, stage2_len, self.period, self.alpha);
        let stage3_len = stage2_len.saturating_sub(self.period - 1);
        ema_stage_step(&self.ema3, &self.ema2, stage3_len, self.period, self.alpha);
        if stage3_len > self.rocperiod {
            let prev = self.ema3.borrow().get(-(self.rocperiod as i64));
            let curr = self.ema3.borrow().get(0);
            let v = 100.0 * (curr - prev) / prev;
            self.output.get_line(0).unwrap().borrow_mut().set(0, v).unwrap();
        }
    }

    fn step_abs(&mut self, i: usize) {
        let len = i + 1;
        ema_stage_step_abs(&self.ema1, &self.input, i, len, self.period, self.alpha);
        let stage2_len = len.saturating_sub(self.period - 1);
        ema_stage_step_abs(&self.ema2, &self.ema1, i, stage2_len, self.period, self.alpha);
        let stage3_len = stage2_len.saturating_sub(self.period - 1);
        ema_stage_step_abs(&self.ema3, &self.ema2, i, stage3_len, self.period, self.alpha);
        if stage3_len > self.rocperiod {
            let prev = self.ema3.borrow().get_abs(i - self.rocperiod);
            let curr = self.ema3.borrow().get_abs(i);
            let v = 100.0 * (curr - prev) / prev;
            self.output.get_line(0).unwrap().borrow_mut().set_abs(i, v);
        }
    }
}

impl Indicator for Trix {
    fn minperiod(&self) -> usize {
        3 * (self.period - 1) + self.rocperiod + 1
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicator::{run_once, tick};
    use crate::line::new_line_handle as new_input;

    fn feed(values: &[f64]) -> LineHandle {
        let line = new_input();
        for &v in values {
            line.borrow_mut().append(v);
        }
        line
    }

    #[test]
    fn minperiod_formula() {
        let trix = Trix::new(new_input(), 4, 1).unwrap();
        assert_eq!(trix.minperiod(), 11);
        // Sanity-check the helper mirrors the public formula.
        assert_eq!(trix.ema3_stage_len(11), 2);
    }

    #[test]
    fn minperiod_scales_with_rocperiod() {
        let trix = Trix::new(new_input(), 4, 3).unwrap();
        assert_eq!(trix.minperiod(), 13);
    }

    #[test]
    fn streaming_and_batch_agree() {
        let values: Vec<f64> = (1..=30).map(|v| v as f64 + (v as f64 * 0.7).sin()).collect();
        let a = feed(&values);
        let b = feed(&values);
        let mut streaming = Trix::new(a, 3, 2).unwrap();
        for _ in 0..values.len() {
            tick(&mut streaming);
        }
        let mut batch = Trix::new(b, 3, 2).unwrap();
        run_once(&mut batch, values.len());
        for ago in 0..values.len() as i64 {
            let s = streaming.output().primary().unwrap().borrow().get(-ago);
            let bt = batch.output().primary().unwrap().borrow().get(-ago);
            if s.is_nan() {
                assert!(bt.is_nan());
            } else {
                assert_eq!(s, bt);
            }
        }
    }
}
