//! Stochastic oscillator (§4.5.3): `%K` against the rolling high/low
//! range, smoothed twice (the "slow" stochastic's `%K` is itself an SMA
//! of the raw fast `%K`, and `%D` is an SMA of that). `mp = period +
//! k_slowing + d_period - 2`. Output lines (§6.2): `%K`, `%D`.

use crate::collection::LineCollection;
use crate::error::{PipelineError, Result};
use crate::indicator::{read, Indicator};
use crate::kernel::mean;
use crate::line::{new_line_handle, LineHandle};

pub struct Stochastic {
    period: usize,
    k_slowing: usize,
    d_period: usize,
    high: LineHandle,
    low: LineHandle,
    close: LineHandle,
    raw_k: LineHandle,
    output: LineCollection,
}

impl Stochastic {
    pub fn new(
        high: LineHandle,
        low: LineHandle,
        close: LineHandle,
        period: usize,
        k_slowing: usize,
        d_period: usize,
    ) -> Result<Self> {
        PipelineError::require_positive_period(period, "Stochastic period")?;
        PipelineError::require_positive_period(k_slowing, "Stochastic k_slowing")?;
        PipelineError::require_positive_period(d_period, "Stochastic d_period")?;
        let mut output = LineCollection::new();
        output.add_line(Some("%K"));
        output.add_line(Some("%D"));
        Ok(Stochastic {
            period,
            k_slowing,
            d_period,
            high,
            low,
            close,
            raw_k: new_line_handle(),
            output,
        })
    }

    fn raw_k_at(&self, window_high: &[f64], window_low: &[f64], close: f64) -> f64 {
        let hh = window_high.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let ll = window_low.iter().copied().fold(f64::INFINITY, f64::min);
        let range = hh - ll;
        if range == 0.0 {
            50.0
        } else {
            100.0 * (close - ll) / range
        }
    }

    fn step(&mut self, len: usize) {
        self.raw_k.borrow_mut().forward(1);
        if len >= self.period {
            let window_high: Vec<f64> = (0..self.period).rev().map(|b| read(&self.high, -(b as i64))).collect();
            let window_low: Vec<f64> = (0..self.period).rev().map(|b| read(&self.low, -(b as i64))).collect();
            let v = self.raw_k_at(&window_high, &window_low, read(&self.close, 0));
            self.raw_k.borrow_mut().set(0, v).unwrap();
        }

        let k_len = len.saturating_sub(self.period - 1);
        if k_len >= self.k_slowing {
            let window: Vec<f64> = (0..self.k_slowing).rev().map(|b| self.raw_k.borrow().get(-(b as i64))).collect();
            let k = mean(&window);
            self.output.get_line(0).unwrap().borrow_mut().set(0, k).unwrap();

            let d_len = k_len.saturating_sub(self.k_slowing - 1);
            if d_len >= self.d_period {
                let window: Vec<f64> = (0..self.d_period)
                    .rev()
                    .map(|b| self.output.get_line(0).unwrap().borrow().get(-(b as i64)))
                    .collect();
                let d = mean(&window);
                self.output.get_line(1).unwrap().borrow_mut().set(0, d).unwrap();
            }
        }
    }

    fn step_abs(&mut self, i: usize) {
        let len = i + 1;
        self.raw_k.borrow_mut().forward(1);
        if len >= self.period {
            let start = i + 1 - self.period;
            let window_high: Vec<f64> = (start..=i).map(|k| self.high.borrow().get_abs(k)).collect();
            let window_low: Vec<f64> = (start..=i).map(|k| self.low.borrow().get_abs(k)).collect();
            let close = self.close.borrow().get_abs(i);
            let v = self.raw_k_at(&window_high, &window_low, close);
            self.raw_k.borrow_mut().set_abs(i, v);
        }

        let k_len = len.saturating_sub(self.period - 1);
        if k_len >= self.k_slowing {
            let start = i + 1 - self.k_slowing;
            let window: Vec<f64> = (start..=i).map(|k| self.raw_k.borrow().get_abs(k)).collect();
            let k = mean(&window);
            self.output.get_line(0).unwrap().borrow_mut().set_abs(i, k);

            let d_len = k_len.saturating_sub(self.k_slowing - 1);
            if d_len >= self.d_period {
                let start = i + 1 - self.d_period;
                let window: Vec<f64> = (start..=i)
                    .map(|k| self.output.get_line(0).unwrap().borrow().get_abs(k))
                    .collect();
                let d = mean(&window);
                self.output.get_line(1).unwrap().borrow_mut().set_abs(i, d);
            }
        }
    }
}

impl Indicator for Stochastic {
    fn minperiod(&self) -> usize {
        self.period + self.k_slowing + self.d_period - 2
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
        let s = Stochastic::new(new_input(), new_input(), new_input(), 14, 3, 3).unwrap();
        assert_eq!(s.minperiod(), 18);
    }

    #[test]
    fn streaming_and_batch_agree() {
        let n = 30;
        let high: Vec<f64> = (0..n).map(|i| 100.0 + i as f64 + (i as f64 * 0.5).sin() * 3.0).collect();
        let low: Vec<f64> = high.iter().map(|h| h - 3.0).collect();
        let close: Vec<f64> = high.iter().zip(&low).map(|(h, l)| (h + l) / 2.0).collect();

        let h1 = feed(&high);
        let l1 = feed(&low);
        let c1 = feed(&close);
        let h2 = feed(&high);
        let l2 = feed(&low);
        let c2 = feed(&close);

        let mut streaming = Stochastic::new(h1, l1, c1, 5, 3, 3).unwrap();
        for _ in 0..n {
            tick(&mut streaming);
        }
        let mut batch = Stochastic::new(h2, l2, c2, 5, 3, 3).unwrap();
        run_once(&mut batch, n);

        for line_idx in 0..2 {
            for ago in 0..n as i64 {
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
