//! Simple Moving Average (§4.5.1): the arithmetic mean of the last `period`
//! input values. `mp = period`.

use crate::collection::LineCollection;
use crate::error::{PipelineError, Result};
use crate::indicator::Indicator;
use crate::kernel::{mean, window_abs, window_ago};
use crate::line::LineHandle;

/// `sma[t] = mean(in[t-period+1 ..= t])`.
pub struct Sma {
    period: usize,
    input: LineHandle,
    output: LineCollection,
}

impl Sma {
    pub fn new(input: LineHandle, period: usize) -> Result<Self> {
        PipelineError::require_positive_period(period, "Sma")?;
        let mut output = LineCollection::new();
        output.add_line(Some("sma"));
        Ok(Sma {
            period,
            input,
            output,
        })
    }
}

impl Indicator for Sma {
    fn minperiod(&self) -> usize {
        self.period
    }

    fn output(&self) -> &LineCollection {
        &self.output
    }

    fn next(&mut self) {
        let window = window_ago(&self.input, self.period);
        let v = mean(&window);
        self.output
            .get_line(0)
            .unwrap()
            .borrow_mut()
            .set(0, v)
            .unwrap();
    }

    fn once(&mut self, start: usize, end: usize) {
        for i in start..end {
            let window = window_abs(&self.input, i, self.period);
            let v = mean(&window);
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
    fn rejects_zero_period() {
        assert!(Sma::new(new_line_handle(), 0).is_err());
    }

    #[test]
    fn warms_up_then_emits_mean() {
        let input = feed(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        let mut sma = Sma::new(input, 3).unwrap();
        for _ in 0..5 {
            tick(&mut sma);
        }
        // First two bars are warm-up (mp=3).
        assert!(sma.output().primary().unwrap().borrow().get(-4).is_nan());
        assert!(sma.output().primary().unwrap().borrow().get(-3).is_nan());
        assert_eq!(sma.output().primary().unwrap().borrow().get(-2), 2.0); // mean(1,2,3)
        assert_eq!(sma.output().primary().unwrap().borrow().get(-1), 3.0); // mean(2,3,4)
        assert_eq!(sma.output().primary().unwrap().borrow().get(0), 4.0); // mean(3,4,5)
    }

    #[test]
    fn streaming_and_batch_agree() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0];
        let input_a = feed(&values);
        let input_b = feed(&values);

        let mut streaming = Sma::new(input_a, 4).unwrap();
        for _ in 0..values.len() {
            tick(&mut streaming);
        }

        let mut batch = Sma::new(input_b, 4).unwrap();
        run_once(&mut batch, values.len());

        for ago in 0..values.len() as i64 {
            let s = streaming.output().primary().unwrap().borrow().get(-ago);
            let b = batch.output().primary().unwrap().borrow().get(-ago);
            if s.is_nan() {
                assert!(b.is_nan());
            } else {
                assert_eq!(s, b);
            }
        }
    }

    proptest::proptest! {
        /// P3 over arbitrary inputs and periods: streaming and batch must
        /// agree at every index, not just on a hand-picked fixture.
        #[test]
        fn streaming_and_batch_agree_for_any_series(
            values in proptest::collection::vec(-1000.0f64..1000.0, 1..40),
            period in 1usize..10,
        ) {
            let input_a = feed(&values);
            let input_b = feed(&values);

            let mut streaming = Sma::new(input_a, period).unwrap();
            for _ in 0..values.len() {
                tick(&mut streaming);
            }
            let mut batch = Sma::new(input_b, period).unwrap();
            run_once(&mut batch, values.len());

            for ago in 0..values.len() as i64 {
                let s = streaming.output().primary().unwrap().borrow().get(-ago);
                let b = batch.output().primary().unwrap().borrow().get(-ago);
                if s.is_nan() {
                    proptest::prop_assert!(b.is_nan());
                } else {
                    proptest::prop_assert_eq!(s, b);
                }
            }
        }
    }
}
