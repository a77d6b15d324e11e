//! Percentage Price Oscillator (§4.4.2): MACD expressed as a percentage of
//! a chosen EMA, so its scale is comparable across instruments.
//! `ppo = 100 * (fast_ema - slow_ema) / denominator`, where `denominator`
//! (§6.3 `denominator`) is either `EMA_slow` (`Long`, the common
//! convention) or `EMA_fast` (`Short`); same signal/histo structure as
//! MACD. `mp = slow_period + signal_period - 1`.

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

/// Which EMA the PPO percentage is divided by (§6.3 `denominator`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PpoDenominator {
    /// Divide by `EMA_slow` — the conventional PPO definition.
    Long,
    /// Divide by `EMA_fast`.
    Short,
}

pub struct Ppo {
    slow_period: usize,
    fast_period: usize,
    signal_period: usize,
    denominator: PpoDenominator,
    fast_alpha: f64,
    slow_alpha: f64,
    signal_alpha: f64,
    input: LineHandle,
    fast_ema: LineHandle,
    slow_ema: LineHandle,
    ppo_line: LineHandle,
    signal_ema: LineHandle,
    output: LineCollection,
}

impl Ppo {
    pub fn new(
        input: LineHandle,
        fast_period: usize,
        slow_period: usize,
        signal_period: usize,
        denominator: PpoDenominator,
    ) -> Result<Self> {
        PipelineError::require_positive_period(fast_period, "Ppo fast_period")?;
        PipelineError::require_positive_period(slow_period, "Ppo slow_period")?;
        PipelineError::require_positive_period(signal_period, "Ppo signal_period")?;
        if fast_period >= slow_period {
            return Err(PipelineError::construction(
                "Ppo: fast_period must be strictly less than slow_period",
            ));
        }
        let mut output = LineCollection::new();
        output.add_line(Some("ppo"));
        output.add_line(Some("signal"));
        output.add_line(Some("histo"));
        Ok(Ppo {
            slow_period,
            fast_period,
            signal_period,
            denominator,
            fast_alpha: ema_alpha(fast_period),
            slow_alpha: ema_alpha(slow_period),
            signal_alpha: ema_alpha(signal_period),
            input,
            fast_ema: new_line_handle(),
            slow_ema: new_line_handle(),
            ppo_line: new_line_handle(),
            signal_ema: new_line_handle(),
            output,
        })
    }

    fn step(&mut self, len: usize) {
        ema_stage_step(&self.fast_ema, &self.input, len, self.fast_period, self.fast_alpha);
        ema_stage_step(&self.slow_ema, &self.input, len, self.slow_period, self.slow_alpha);
        self.ppo_line.borrow_mut().forward(1);
        if len >= self.slow_period {
            let slow = self.slow_ema.borrow().get(0);
            let fast = self.fast_ema.borrow().get(0);
            let denom = match self.denominator {
                PpoDenominator::Long => slow,
                PpoDenominator::Short => fast,
            };
            let v = 100.0 * (fast - slow) / denom;
            self.ppo_line.borrow_mut().set(0, v).unwrap();
        }
        let ppo_len = len.saturating_sub(self.slow_period - 1);
        ema_stage_step(&self.signal_ema, &self.ppo_line, ppo_len, self.signal_period, self.signal_alpha);
        if ppo_len >= self.signal_period {
            let ppo = self.ppo_line.borrow().get(0);
            let signal = self.signal_ema.borrow().get(0);
            self.write(ppo, signal);
        }
    }

    fn step_abs(&mut self, i: usize) {
        let len = i + 1;
        ema_stage_step_abs(&self.fast_ema, &self.input, i, len, self.fast_period, self.fast_alpha);
        ema_stage_step_abs(&self.slow_ema, &self.input, i, len, self.slow_period, self.slow_alpha);
        self.ppo_line.borrow_mut().forward(1);
        if len >= self.slow_period {
            let slow = self.slow_ema.borrow().get_abs(i);
            let fast = self.fast_ema.borrow().get_abs(i);
            let denom = match self.denominator {
                PpoDenominator::Long => slow,
                PpoDenominator::Short => fast,
            };
            let v = 100.0 * (fast - slow) / denom;
            self.ppo_line.borrow_mut().set_abs(i, v);
        }
        let ppo_len = len.saturating_sub(self.slow_period - 1);
        ema_stage_step_abs(&self.signal_ema, &self.ppo_line, i, ppo_len, self.signal_period, self.signal_alpha);
        if ppo_len >= self.signal_period {
            let ppo = self.ppo_line.borrow().get_abs(i);
            let signal = self.signal_ema.borrow().get_abs(i);
            self.write_abs(i, ppo, signal);
        }
    }

    fn write(&self, ppo: f64, signal: f64) {
        self.output.get_line(0).unwrap().borrow_mut().set(0, ppo).unwrap();
        self.output.get_line(1).unwrap().borrow_mut().set(0, signal).unwrap();
        self.output.get_line(2).unwrap().borrow_mut().set(0, ppo - signal).unwrap();
    }

    fn write_abs(&self, i: usize, ppo: f64, signal: f64) {
        self.output.get_line(0).unwrap().borrow_mut().set_abs(i, ppo);
        self.output.get_line(1).unwrap().borrow_mut().set_abs(i, signal);
        self.output.get_line(2).unwrap().borrow_mut().set_abs(i, ppo - signal);
    }
}

impl Indicator for Ppo {
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
    fn streaming_and_batch_agree() {
        let values: Vec<f64> = (1..=40).map(|v| (v as f64 * 1.1).sin() * 10.0 + v as f64 + 50.0).collect();
        let a = feed(&values);
        let b = feed(&values);
        let mut streaming = Ppo::new(a, 3, 6, 4, PpoDenominator::Long).unwrap();
        for _ in 0..values.len() {
            tick(&mut streaming);
        }
        let mut batch = Ppo::new(b, 3, 6, 4, PpoDenominator::Long).unwrap();
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

    #[test]
    fn short_denominator_divides_by_fast_ema() {
        let values: Vec<f64> = (1..=20).map(|v| v as f64 * 2.0).collect();
        let a = feed(&values);
        let mut ppo = Ppo::new(a, 3, 6, 4, PpoDenominator::Short).unwrap();
        for _ in 0..values.len() {
            tick(&mut ppo);
        }
        let fast = ppo.fast_ema.borrow().get(0);
        let slow = ppo.slow_ema.borrow().get(0);
        let expected = 100.0 * (fast - slow) / fast;
        assert_eq!(ppo.output().get_line(0).unwrap().borrow().get(0), expected);
    }
}
