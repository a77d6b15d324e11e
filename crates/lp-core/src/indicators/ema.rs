//! Exponential Moving Average (§4.5.1): an SMA-seeded recursive smoothing.
//! `mp = period`; the first valid value is the SMA of the first `period`
//! inputs, and every later value recurses from the previous output.

use crate::collection::LineCollection;
use crate::error::{PipelineError, Result};
use crate::indicator::{read, Indicator};
use crate::kernel::{ema_alpha, ema_step, mean, window_abs, window_ago};
use crate::line::LineHandle;

pub struct Ema {
    period: usize,
    alpha: f64,
    input: LineHandle,
    output: LineCollection,
}

impl Ema {
    pub fn new(input: LineHandle, period: usize) -> Result<Self> {
        PipelineError::require_positive_period(period, "Ema")?;
        let mut output = LineCollection::new();
        output.add_line(Some("ema"));
        Ok(Ema {
            period,
            alpha: ema_alpha(period),
            input,
            output,
        })
    }

    fn set(&self, ago: i64, v: f64) {
        self.output.get_line(0).unwrap().borrow_mut().set(ago, v).unwrap();
    }
}

impl Indicator for Ema {
    fn minperiod(&self) -> usize {
        self.period
    }

    fn output(&self) -> &LineCollection {
        &self.output
    }

    fn nextstart(&mut self) {
        let seed = mean(&window_ago(&self.input, self.period));
        self.set(0, seed);
    }

    fn next(&mut self) {
        let prev = read(self.output.primary().unwrap(), -1);
        let v = ema_step(prev, read(&self.input, 0), self.alpha);
        self.set(0, v);
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
    fn seeds_with_sma_then_recurses() {
        let input = feed(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        let mut ema = Ema::new(input, 3).unwrap();
        for _ in 0..5 {
            tick(&mut ema);
        }
        let alpha = ema_alpha(3);
        let seed = 2.0; // mean(1,2,3)
        assert_eq!(ema.output().primary().unwrap().borrow().get(-2), seed);
        let step1 = ema_step(seed, 4.0, alpha);
        assert_eq!(ema.output().primary().unwrap().borrow().get(-1), step1);
        let step2 = ema_step(step1, 5.0, alpha);
        assert_eq!(ema.output().primary().unwrap().borrow().get(0), step2);
    }

    #[test]
    fn streaming_and_batch_agree() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0];
        let a = feed(&values);
        let b = feed(&values);

        let mut streaming = Ema::new(a, 4).unwrap();
        for _ in 0..values.len() {
            tick(&mut streaming);
        }
        let mut batch = Ema::new(b, 4).unwrap();
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
