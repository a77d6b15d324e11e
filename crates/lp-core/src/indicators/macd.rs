//! MACD (§4.5.2): difference of a fast and a slow EMA, plus an EMA of that
//! difference as the signal line. `mp = slow_period + signal_period - 1`.
//! Output lines (§6.2): `macd`, `signal`, `histo`.

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

pub struct Macd {
    fast_period: usize,
    slow_period: usize,
    signal_period: usize,
    fast_alpha: f64,
    slow_alpha: f64,
    signal_alpha: f64,
    input: LineHandle,
    fast_ema: LineHandle,
    slow_ema: LineHandle,
    diff: LineHandle,
    signal_ema: LineHandle,
    output: LineCollection,
}

impl Macd {
    pub fn new(input: LineHandle, fast_period: usize, slow_period: usize, signal_period: usize) -> Result<Self> {
        PipelineError::require_positive_period(fast_period, "Macd fast_period")?;
        PipelineError::require_positive_period(slow_period, "Macd slow_period")?;
        PipelineError::require_positive_period(signal_period, "Macd signal_period")?;
        if fast_period >= slow_period {
            return Err(PipelineError::construction(
                "Macd: fast_period must be strictly less than slow_period",
            ));
        }
        let mut output = LineCollection::new();
        output.add_line(Some("macd"));
        output.add_line(Some("signal"));
        output.add_line(Some("histo"));
        Ok(Macd {
            fast_period,
            slow_period,
            signal_period,
            fast_alpha: ema_alpha(fast_period),
            slow_alpha: ema_alpha(slow_period),
            signal_alpha: ema_alpha(signal_period),
            input,
            fast_ema: new_line_handle(),
            slow_ema: new_line_handle(),
            diff: new_line_handle(),
            signal_ema: new_line_handle(),
            output,
        })
    }

    fn step(&mut self, len: usize) {
        ema_stage_step(&self.fast_ema, &self.input, len, self.fast_period, self.fast_alpha);
        ema_stage_step(&self.slow_ema, &self.input, len, self.slow_period, self.slow_alpha);
        self.diff.borrow_mut().forward(1);
        if len >= self.slow_period {
            let v = self.fast_ema.borrow().get(0) - self.slow_ema.borrow().get(0);
            self.diff.borrow_mut().set(0, v).unwrap();
        }
        let diff_len = len.saturating_sub(self.slow_period - 1);
        ema_stage_step(&self.signal_ema, &self.diff, diff_len, self.signal_period, self.signal_alpha);
        if diff_len >= self.signal_period {
            let macd = self.diff.borrow().get(0);
            let signal = self.signal_ema.borrow().get(0);
            self.write(macd, signal);
        }
    }

    fn step_abs(&mut self, i: usize) {
        let len = i + 1;
        ema_stage_step_abs(&self.fast_ema, &self.input, i, len, self.fast_period, self.fast_alpha);
        ema_stage_step_abs(&self.slow_ema, &self.input, i, len, self.slow_period, self.slow_alpha);
        self.diff.borrow_mut().forward(1);
        if len >= self.slow_period {
            let v = self.fast_ema.borrow().get_abs(i) - self.slow_ema.borrow().get_abs(i);
            self.diff.borrow_mut().set_abs(i, v);
        }
        let diff_len = len.saturating_sub(self.slow_period - 1);
        ema_stage_step_abs(&self.signal_ema, &self.diff, i, diff_len, self.signal_period, self.signal_alpha);
        if diff_len >= self.signal_period {
            let macd = self.diff.borrow().get_abs(i);
            let signal = self.signal_ema.borrow().get_abs(i);
            self.write_abs(i, macd, signal);
        }
    }

    fn write(&self, macd: f64, signal: f64) {
        self.output.get_line(0).unwrap().borrow_mut().set(0, macd).unwrap();
        self.output.get_line(1).unwrap().borrow_mut().set(0, signal).unwrap();
        self.output.get_line(2).unwrap().borrow_mut().set(0, macd - signal).unwrap();
    }

    fn write_abs(&self, i: usize, macd: f64, signal: f64) {
        self.output.get_line(0).unwrap().borrow_mut().set_abs(i, macd);
        self.output.get_line(1).unwrap().borrow_mut().set_abs(i, signal);
        self.output.get_line(2).unwrap().borrow_mut().set_abs(i, macd - signal);
    }
}

impl Indicator for Macd {
    fn minperiod(&self) -> usize {
        self.slow_period + self.signal_period - 1
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
    fn rejects_fast_not_less_than_slow() {
        assert!(Macd::new(new_input(), 26, 12, 9).is_err());
    }

    #[test]
    fn histo_is_macd_minus_signal() {
        let values: Vec<f64> = (1..=40).map(|v| v as f64).collect();
        let input = feed(&values);
        let mut macd = Macd::new(input, 3, 6, 4).unwrap();
        for _ in 0..values.len() {
            tick(&mut macd);
        }
        let m = macd.output().get_line(0).unwrap().borrow().get(0);
        let s = macd.output().get_line(1).unwrap().borrow().get(0);
        let h = macd.output().get_line(2).unwrap().borrow().get(0);
        assert_eq!(h, m - s);
    }

    #[test]
    fn streaming_and_batch_agree() {
        let values: Vec<f64> = (1..=40).map(|v| (v as f64 * 1.1).sin() * 10.0 + v as f64).collect();
        let a = feed(&values);
        let b = feed(&values);
        let mut streaming = Macd::new(a, 3, 6, 4).unwrap();
        for _ in 0..values.len() {
            tick(&mut streaming);
        }
        let mut batch = Macd::new(b, 3, 6, 4).unwrap();
        run_once(&mut batch, values.len());
        for line_idx in 0..3 {
            for ago in 0..values.len() as i64 {
                let s = streaming.output().get_line(line_idx).unwrap().borrow().get(-ago);
                let bt = batch.output().get_line(line_idx).unwrap().borrow().get(-ago);
                if s.is_nan() {
                    assert!(bt.is_nan());
                } else {
                    assert_eq!(s, bt);
                }
            }
        }
    }
}
