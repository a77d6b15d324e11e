//! Hull Moving Average (§4.5.1): `WMA(sqrt(n))` applied to
//! `2*WMA(n/2) - WMA(n)`, built to cut WMA's lag without sacrificing as
//! much smoothness. `mp = n + round(sqrt(n)) - 1`.

use crate::collection::LineCollection;
use crate::error::{PipelineError, Result};
use crate::indicator::Indicator;
use crate::kernel::{wma_weighted, window_abs, window_ago};
use crate::line::{new_line_handle, LineHandle};

fn wma_stage_step(line: &LineHandle, input_ago0: &LineHandle, stage_len: usize, period: usize) {
    line.borrow_mut().forward(1);
    if stage_len < period {
        return;
    }
    let v = wma_weighted(&window_ago(input_ago0, period));
    line.borrow_mut().set(0, v).unwrap();
}

fn wma_stage_step_abs(line: &LineHandle, input: &LineHandle, i: usize, stage_len: usize, period: usize) {
    line.borrow_mut().forward(1);
    if stage_len < period {
        return;
    }
    let v = wma_weighted(&window_abs(input, i, period));
    line.borrow_mut().set_abs(i, v);
}

pub struct Hma {
    period: usize,
    half: usize,
    sqrt_period: usize,
    input: LineHandle,
    wma_half: LineHandle,
    wma_full: LineHandle,
    diff: LineHandle,
    output: LineCollection,
}

impl Hma {
    pub fn new(input: LineHandle, period: usize) -> Result<Self> {
        PipelineError::require_positive_period(period, "Hma")?;
        if period < 2 {
            return Err(PipelineError::construction(
                "Hma: period must be >= 2 so that period/2 is non-zero",
            ));
        }
        let half = (period / 2).max(1);
        let sqrt_period = (period as f64).sqrt().round().max(1.0) as usize;
        let mut output = LineCollection::new();
        output.add_line(Some("hma"));
        Ok(Hma {
            period,
            half,
            sqrt_period,
            input,
            wma_half: new_line_handle(),
            wma_full: new_line_handle(),
            diff: new_line_handle(),
            output,
        })
    }

    fn step(&mut self, len: usize) {
        wma_stage_step(&self.wma_half, &self.input, len, self.half);
        wma_stage_step(&self.wma_full, &self.input, len, self.period);
        self.diff.borrow_mut().forward(1);
        if len >= self.period {
            let v = 2.0 * self.wma_half.borrow().get(0) - self.wma_full.borrow().get(0);
            self.diff.borrow_mut().set(0, v).unwrap();
        }
        let diff_len = len.saturating_sub(self.period - 1);
        if diff_len >= self.sqrt_period {
            let v = wma_weighted(&window_ago(&self.diff, self.sqrt_period));
            self.output.get_line(0).unwrap().borrow_mut().set(0, v).unwrap();
        }
    }

    fn step_abs(&mut self, i: usize) {
        let len = i + 1;
        wma_stage_step_abs(&self.wma_half, &self.input, i, len, self.half);
        wma_stage_step_abs(&self.wma_full, &self.input, i, len, self.period);
        self.diff.borrow_mut().forward(1);
        if len >= self.period {
            let v = 2.0 * self.wma_half.borrow().get_abs(i) - self.wma_full.borrow().get_abs(i);
            self.diff.borrow_mut().set_abs(i, v);
        }
        let diff_len = len.saturating_sub(self.period - 1);
        if diff_len >= self.sqrt_period {
            let v = wma_weighted(&window_abs(&self.diff, i, self.sqrt_period));
            self.output.get_line(0).unwrap().borrow_mut().set_abs(i, v);
        }
    }
}

impl Indicator for Hma {
    fn minperiod(&self) -> usize {
        self.period + self.sqrt_period - 1
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
    fn rejects_period_below_two() {
        assert!(Hma::new(new_input(), 1).is_err());
    }

    #[test]
    fn streaming_and_batch_agree() {
        let values: Vec<f64> = (1..=20).map(|v| (v as f64) * 1.3).collect();
        let a = feed(&values);
        let b = feed(&values);
        let mut streaming = Hma::new(a, 9).unwrap();
        for _ in 0..values.len() {
            tick(&mut streaming);
        }
        let mut batch = Hma::new(b, 9).unwrap();
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
