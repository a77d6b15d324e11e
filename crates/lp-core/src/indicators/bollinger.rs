//! Bollinger Bands (§4.5.2): an SMA midline with bands `k` population
//! standard deviations away, plus the derived `%b` and bandwidth series.
//! `mp = period`. Output lines (§6.2): `mid`, `top`, `bot`, `pctb`,
//! `bandwidth`.

use crate::collection::LineCollection;
use crate::error::{PipelineError, Result};
use crate::indicator::{read, Indicator};
use crate::kernel::{mean, window_abs, window_ago};
use crate::line::LineHandle;

pub struct Bollinger {
    period: usize,
    k: f64,
    input: LineHandle,
    output: LineCollection,
}

impl Bollinger {
    pub fn new(input: LineHandle, period: usize, k: f64) -> Result<Self> {
        PipelineError::require_positive_period(period, "Bollinger")?;
        let mut output = LineCollection::new();
        output.add_line(Some("mid"));
        output.add_line(Some("top"));
        output.add_line(Some("bot"));
        output.add_line(Some("pctb"));
        output.add_line(Some("bandwidth"));
        Ok(Bollinger {
            period,
            k,
            input,
            output,
        })
    }

    /// Mid/top/bot/pctb/bandwidth from one price window and the current
    /// price. Population standard deviation, per §9 open question (a).
    /// `pctb = 0.5` when the bands have collapsed (`top == bot`), per §7.
    fn compute(&self, window: &[f64], price: f64) -> (f64, f64, f64, f64, f64) {
        let mid = mean(window);
        let variance = window.iter().map(|v| (v - mid).powi(2)).sum::<f64>() / window.len() as f64;
        let sd = variance.sqrt();
        let top = mid + self.k * sd;
        let bot = mid - self.k * sd;
        let pctb = if top == bot { 0.5 } else { (price - bot) / (top - bot) };
        let bandwidth = (top - bot) / mid;
        (mid, top, bot, pctb, bandwidth)
    }

    fn write(&self, values: (f64, f64, f64, f64, f64)) {
        let (mid, top, bot, pctb, bandwidth) = values;
        self.output.get_line(0).unwrap().borrow_mut().set(0, mid).unwrap();
        self.output.get_line(1).unwrap().borrow_mut().set(0, top).unwrap();
        self.output.get_line(2).unwrap().borrow_mut().set(0, bot).unwrap();
        self.output.get_line(3).unwrap().borrow_mut().set(0, pctb).unwrap();
        self.output.get_line(4).unwrap().borrow_mut().set(0, bandwidth).unwrap();
    }

    fn write_abs(&self, i: usize, values: (f64, f64, f64, f64, f64)) {
        let (mid, top, bot, pctb, bandwidth) = values;
        self.output.get_line(0).unwrap().borrow_mut().set_abs(i, mid);
        self.output.get_line(1).unwrap().borrow_mut().set_abs(i, top);
        self.output.get_line(2).unwrap().borrow_mut().set_abs(i, bot);
        self.output.get_line(3).unwrap().borrow_mut().set_abs(i, pctb);
        self.output.get_line(4).unwrap().borrow_mut().set_abs(i, bandwidth);
    }
}

impl Indicator for Bollinger {
    fn minperiod(&self) -> usize {
        self.period
    }

    fn output(&self) -> &LineCollection {
        &self.output
    }

    fn next(&mut self) {
        let window = window_ago(&self.input, self.period);
        let price = read(&self.input, 0);
        let values = self.compute(&window, price);
        self.write(values);
    }

    fn once(&mut self, start: usize, end: usize) {
        for i in start..end {
            let window = window_abs(&self.input, i, self.period);
            let price = self.input.borrow().get_abs(i);
            let values = self.compute(&window, price);
            self.write_abs(i, values);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicator::{run_once, tick};
    use crate::line::new_line_handle;

    fn feed(values: &[f64]) -> LineHandle {
        let line = new_line_handle();
        for &v in values {
            line.borrow_mut().append(v);
        }
        line
    }

    #[test]
    fn flat_series_has_zero_width_bands() {
        let input = feed(&[5.0; 6]);
        let mut bb = Bollinger::new(input, 5, 2.0).unwrap();
        for _ in 0..6 {
            tick(&mut bb);
        }
        assert_eq!(bb.output().get_line(1).unwrap().borrow().get(0), 5.0);
        assert_eq!(bb.output().get_line(2).unwrap().borrow().get(0), 5.0);
        assert_eq!(bb.output().get_line(3).unwrap().borrow().get(0), 0.5);
    }

    #[test]
    fn streaming_and_batch_agree() {
        let values = [1.0, 2.0, 3.0, 2.5, 4.0, 5.0, 4.5, 6.0, 7.0];
        let a = feed(&values);
        let b = feed(&values);
        let mut streaming = Bollinger::new(a, 4, 2.0).unwrap();
        for _ in 0..values.len() {
            tick(&mut streaming);
        }
        let mut batch = Bollinger::new(b, 4, 2.0).unwrap();
        run_once(&mut batch, values.len());
        for line_idx in 0..5 {
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
