//! Weighted Moving Average (§4.5.1): a linearly weighted window, heaviest
//! weight on the most recent bar. `mp = period`.

use crate::collection::LineCollection;
use crate::error::{PipelineError, Result};
use crate::indicator::Indicator;
use crate::kernel::{wma_weighted, window_abs, window_ago};
use crate::line::LineHandle;

pub struct Wma {
    period: usize,
    input: LineHandle,
    output: LineCollection,
}

impl Wma {
    pub fn new(input: LineHandle, period: usize) -> Result<Self> {
        PipelineError::require_positive_period(period, "Wma")?;
        let mut output = LineCollection::new();
        output.add_line(Some("wma"));
        Ok(Wma {
            period,
            input,
            output,
        })
    }
}

impl Indicator for Wma {
    fn minperiod(&self) -> usize {
        self.period
    }

    fn output(&self) -> &LineCollection {
        &self.output
    }

    fn next(&mut self) {
        let window = window_ago(&self.input, self.period);
        let v = wma_weighted(&window);
        self.output.get_line(0).unwrap().borrow_mut().set(0, v).unwrap();
    }

    fn once(&mut self, start: usize, end: usize) {
        for i in start..end {
            let window = window_abs(&self.input, i, self.period);
            let v = wma_weighted(&window);
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
    fn weights_heaviest_bar_most() {
        let input = feed(&[1.0, 1.0, 1.0, 100.0]);
        let mut wma = Wma::new(input, 3).unwrap();
        for _ in 0..4 {
            tick(&mut wma);
        }
        // window (1,1,100) weights (1,2,3)/6 -> (1+2+300)/6
        let expected = (1.0 + 2.0 + 300.0) / 6.0;
        assert_eq!(wma.output().primary().unwrap().borrow().get(0), expected);
    }

    #[test]
    fn streaming_and_batch_agree() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let a = feed(&values);
        let b = feed(&values);
        let mut streaming = Wma::new(a, 3).unwrap();
        for _ in 0..values.len() {
            tick(&mut streaming);
        }
        let mut batch = Wma::new(b, 3).unwrap();
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
