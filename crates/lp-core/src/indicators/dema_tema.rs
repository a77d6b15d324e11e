//! Double and Triple Exponential Moving Average (§4.5.1): EMAs of EMAs,
//! combined to cancel lag. Each chained EMA stage adds `period - 1` to the
//! minimum period of the stage before it.
//!
//! `DEMA = 2*EMA1 - EMA2`, `mp = 2*period - 1`.
//! `TEMA = 3*EMA1 - 3*EMA2 + EMA3`, `mp = 3*period - 2`.
//!
//! Both EMA stages live on internal, not publicly exposed lines so the
//! chain can be driven bar-by-bar in lockstep with the visible output,
//! exactly mirroring what a `Pipeline` of three discrete `Ema` nodes would
//! compute — see the module doc for why recomputing per stage (rather than
//! nesting driver calls) keeps this bit-identical between modes.

use crate::collection::LineCollection;
use crate::error::{PipelineError, Result};
use crate::indicator::Indicator;
use crate::kernel::{ema_alpha, ema_step, mean, window_abs, window_ago};
use crate::line::{new_line_handle, LineHandle};

/// Advances one EMA stage by a single bar, in `ago`-relative terms.
/// `stage_len` is the stage's own bar count (the upstream's `len` minus the
/// offset already consumed by earlier stages).
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

pub struct Dema {
    period: usize,
    alpha: f64,
    input: LineHandle,
    ema1: LineHandle,
    ema2: LineHandle,
    output: LineCollection,
}

impl Dema {
    pub fn new(input: LineHandle, period: usize) -> Result<Self> {
        PipelineError::require_positive_period(period, "Dema")?;
        let mut output = LineCollection::new();
        output.add_line(Some("dema"));
        Ok(Dema {
            period,
            alpha: ema_alpha(period),
            input,
            ema1: new_line_handle(),
            ema2: new_line_handle(),
            output,
        })
    }

    fn step(&mut self, len: usize) {
        ema_stage_step(&self.ema1, &self.input, len, self.period, self.alpha);
        let stage2_len = len.saturating_sub(self.period - 1);
        ema_stage_step(&self.ema2, &self.ema1, stage2_len, self.period, self.alpha);
        if len >= self.minperiod() {
            let v = 2.0 * self.ema1.borrow().get(0) - self.ema2.borrow().get(0);
            self.output.get_line(0).unwrap().borrow_mut().set(0, v).unwrap();
        }
    }

    fn step_abs(&mut self, i: usize) {
        let len = i + 1;
        ema_stage_step_abs(&self.ema1, &self.input, i, len, self.period, self.alpha);
        let stage2_len = len.saturating_sub(self.period - 1);
        ema_stage_step_abs(&self.ema2, &self.ema1, i, stage2_len, self.period, self.alpha);
        if len >= self.minperiod() {
            let v = 2.0 * self.ema1.borrow().get_abs(i) - self.ema2.borrow().get_abs(i);
            self.output.get_line(0).unwrap().borrow_mut().set_abs(i, v);
        }
    }
}

impl Indicator for Dema {
    fn minperiod(&self) -> usize {
        2 * self.period - 1
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

pub struct Tema {
    period: usize,
    alpha: f64,
    input: LineHandle,
    ema1: LineHandle,
    ema2: LineHandle,
    ema3: LineHandle,
    output: LineCollection,
}

impl Tema {
    pub fn new(input: LineHandle, period: usize) -> Result<Self> {
        PipelineError::require_positive_period(period, "Tema")?;
        let mut output = LineCollection::new();
        output.add_line(Some("tema"));
        Ok(Tema {
            period,
            alpha: ema_alpha(period),
            input,
            ema1: new_line_handle(),
            ema2: new_line_handle(),
            ema3: new_line_handle(),
            output,
        })
    }

    fn step(&mut self, len: usize) {
        ema_stage_step(&self.ema1, &self.input, len, self.period, self.alpha);
        let stage2_len = len.saturating_sub(self.period - 1);
        ema_stage_step(&self.ema2, &self.ema1, stage2_len, self.period, self.alpha);
        let stage3_len = stage2_len.saturating_sub(self.period - 1);
        ema_stage_step(&self.ema3, &self.ema2, stage3_len, self.period, self.alpha);
        if len >= self.minperiod() {
            let v = 3.0 * self.ema1.borrow().get(0) - 3.0 * self.ema2.borrow().get(0)
                + self.ema3.borrow().get(0);
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
        if len >= self.minperiod() {
            let v = 3.0 * self.ema1.borrow().get_abs(i) - 3.0 * self.ema2.borrow().get_abs(i)
                + self.ema3.borrow().get_abs(i);
            self.output.get_line(0).unwrap().borrow_mut().set_abs(i, v);
        }
    }
}

impl Indicator for Tema {
    fn minperiod(&self) -> usize {
        3 * self.period - 2
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
    fn dema_minperiod_is_2p_minus_1() {
        let dema = Dema::new(new_input(), 4).unwrap();
        assert_eq!(dema.minperiod(), 7);
    }

    #[test]
    fn tema_minperiod_is_3p_minus_2() {
        let tema = Tema::new(new_input(), 4).unwrap();
        assert_eq!(tema.minperiod(), 10);
    }

    #[test]
    fn dema_streaming_and_batch_agree() {
        let values: Vec<f64> = (1..=14).map(|v| v as f64).collect();
        let a = feed(&values);
        let b = feed(&values);
        let mut streaming = Dema::new(a, 3).unwrap();
        for _ in 0..values.len() {
            tick(&mut streaming);
        }
        let mut batch = Dema::new(b, 3).unwrap();
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

    #[test]
    fn tema_streaming_and_batch_agree() {
        let values: Vec<f64> = (1..=20).map(|v| v as f64).collect();
        let a = feed(&values);
        let b = feed(&values);
        let mut streaming = Tema::new(a, 3).unwrap();
        for _ in 0..values.len() {
            tick(&mut streaming);
        }
        let mut batch = Tema::new(b, 3).unwrap();
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
