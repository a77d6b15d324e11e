//! Envelope (§4.5.2): an SMA midline with bands offset by a fixed
//! percentage, the simpler sibling of Bollinger's standard-deviation
//! bands. `mp = period`. Output lines: `mid`, `upper`, `lower`.

use crate::collection::LineCollection;
use crate::error::{PipelineError, Result};
use crate::indicator::Indicator;
use crate::kernel::{mean, window_abs, window_ago};
use crate::line::LineHandle;

pub struct Envelope {
    period: usize,
    pct: f64,
    input: LineHandle,
    output: LineCollection,
}

impl Envelope {
    /// `pct` is a fraction, e.g. `0.025` for a 2.5% envelope.
    pub fn new(input: LineHandle, period: usize, pct: f64) -> Result<Self> {
        PipelineError::require_positive_period(period, "Envelope")?;
        let mut output = LineCollection::new();
        output.add_line(Some("mid"));
        output.add_line(Some("upper"));
        output.add_line(Some("lower"));
        Ok(Envelope {
            period,
            pct,
            input,
            output,
        })
    }

    fn write(&self, mid: f64) {
        self.output.get_line(0).unwrap().borrow_mut().set(0, mid).unwrap();
        self.output.get_line(1).unwrap().borrow_mut().set(0, mid * (1.0 + self.pct)).unwrap();
        self.output.get_line(2).unwrap().borrow_mut().set(0, mid * (1.0 - self.pct)).unwrap();
    }

    fn write_abs(&self, i: usize, mid: f64) {
        self.output.get_line(0).unwrap().borrow_mut().set_abs(i, mid);
        self.output.get_line(1).unwrap().borrow_mut().set_abs(i, mid * (1.0 + self.pct));
        self.output.get_line(2).unwrap().borrow_mut().set_abs(i, mid * (1.0 - self.pct));
    }
}

impl Indicator for Envelope {
    fn minperiod(&self) -> usize {
        self.period
    }

    fn output(&self) -> &LineCollection {
        &self.output
    }

    fn next(&mut self) {
        let mid = mean(&window_ago(&self.input, self.period));
        self.write(mid);
    }

    fn once(&mut self, start: usize, end: usize) {
        for i in start..end {
            let mid = mean(&window_abs(&self.input, i, self.period));
            self.write_abs(i, mid);
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
    fn bands_are_symmetric_percent_offsets() {
        let input = feed(&[10.0, 10.0, 10.0]);
        let mut env = Envelope::new(input, 3, 0.05).unwrap();
        for _ in 0..3 {
            tick(&mut env);
        }
        assert_eq!(env.output().get_line(0).unwrap().borrow().get(0), 10.0);
        assert_eq!(env.output().get_line(1).unwrap().borrow().get(0), 10.5);
        assert_eq!(env.output().get_line(2).unwrap().borrow().get(0), 9.5);
    }

    #[test]
    fn streaming_and_batch_agree() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let a = feed(&values);
        let b = feed(&values);
        let mut streaming = Envelope::new(a, 3, 0.1).unwrap();
        for _ in 0..values.len() {
            tick(&mut streaming);
        }
        let mut batch = Envelope::new(b, 3, 0.1).unwrap();
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
