//! Ultimate Oscillator (§4.5.3): a weighted blend of buying-pressure to
//! true-range ratios over three periods, meant to dampen the single-period
//! oscillator's sensitivity to the chosen window length.
//! `mp = max(period1, period2, period3) + 1` (the `+1` for the previous
//! close every true range needs).

use crate::collection::LineCollection;
use crate::error::{PipelineError, Result};
use crate::indicator::{read, Indicator};
use crate::kernel::true_range;
use crate::line::{new_line_handle, LineHandle};

pub struct Ultimate {
    period1: usize,
    period2: usize,
    period3: usize,
    high: LineHandle,
    low: LineHandle,
    close: LineHandle,
    bp: LineHandle,
    tr: LineHandle,
    output: LineCollection,
}

impl Ultimate {
    pub fn new(
        high: LineHandle,
        low: LineHandle,
        close: LineHandle,
        period1: usize,
        period2: usize,
        period3: usize,
    ) -> Result<Self> {
        PipelineError::require_positive_period(period1, "Ultimate period1")?;
        PipelineError::require_positive_period(period2, "Ultimate period2")?;
        PipelineError::require_positive_period(period3, "Ultimate period3")?;
        let mut output = LineCollection::new();
        output.add_line(Some("uo"));
        Ok(Ultimate {
            period1,
            period2,
            period3,
            high,
            low,
            close,
            bp: new_line_handle(),
            tr: new_line_handle(),
            output,
        })
    }

    fn max_period(&self) -> usize {
        self.period1.max(self.period2).max(self.period3)
    }

    fn sum_ago(line: &LineHandle, period: usize) -> f64 {
        (0..period).map(|back| line.borrow().get(-(back as i64))).sum()
    }

    fn sum_abs(line: &LineHandle, end: usize, period: usize) -> f64 {
        let start = end + 1 - period;
        (start..=end).map(|i| line.borrow().get_abs(i)).sum()
    }
}

impl Indicator for Ultimate {
    fn minperiod(&self) -> usize {
        self.max_period() + 1
    }

    fn output(&self) -> &LineCollection {
        &self.output
    }

    fn prenext(&mut self) {
        self.bp.borrow_mut().forward(1);
        self.tr.borrow_mut().forward(1);
        if self.output.size() >= 2 {
            let prev_close = read(&self.close, -1);
            let bp = read(&self.close, 0) - read(&self.low, 0).min(prev_close);
            let tr = true_range(read(&self.high, 0), read(&self.low, 0), prev_close);
            self.bp.borrow_mut().set(0, bp).unwrap();
            self.tr.borrow_mut().set(0, tr).unwrap();
        }
    }

    fn next(&mut self) {
        self.prenext();
        let avg1 = Self::sum_ago(&self.bp, self.period1) / Self::sum_ago(&self.tr, self.period1);
        let avg2 = Self::sum_ago(&self.bp, self.period2) / Self::sum_ago(&self.tr, self.period2);
        let avg3 = Self::sum_ago(&self.bp, self.period3) / Self::sum_ago(&self.tr, self.period3);
        let uo = 100.0 * (4.0 * avg1 + 2.0 * avg2 + avg3) / 7.0;
        self.output.get_line(0).unwrap().borrow_mut().set(0, uo).unwrap();
    }

    fn preonce(&mut self, start: usize, end: usize) {
        for i in start..end {
            self.fill_bp_tr_abs(i);
        }
    }

    fn oncestart(&mut self, start: usize, end: usize) {
        for i in start..end {
            self.fill_bp_tr_abs(i);
        }
    }

    fn once(&mut self, start: usize, end: usize) {
        for i in start..end {
            self.fill_bp_tr_abs(i);
            let avg1 = Self::sum_abs(&self.bp, i, self.period1) / Self::sum_abs(&self.tr, i, self.period1);
            let avg2 = Self::sum_abs(&self.bp, i, self.period2) / Self::sum_abs(&self.tr, i, self.period2);
            let avg3 = Self::sum_abs(&self.bp, i, self.period3) / Self::sum_abs(&self.tr, i, self.period3);
            let uo = 100.0 * (4.0 * avg1 + 2.0 * avg2 + avg3) / 7.0;
            self.output.get_line(0).unwrap().borrow_mut().set_abs(i, uo);
        }
    }
}

impl Ultimate {
    fn fill_bp_tr_abs(&mut self, i: usize) {
        self.bp.borrow_mut().forward(1);
        self.tr.borrow_mut().forward(1);
        if i >= 1 {
            let prev_close = self.close.borrow().get_abs(i - 1);
            let close = self.close.borrow().get_abs(i);
            let low = self.low.borrow().get_abs(i);
            let high = self.high.borrow().get_abs(i);
            let bp = close - low.min(prev_close);
            let tr = true_range(high, low, prev_close);
            self.bp.borrow_mut().set_abs(i, bp);
            self.tr.borrow_mut().set_abs(i, tr);
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
    fn minperiod_is_max_plus_one() {
        let u = Ultimate::new(new_input(), new_input(), new_input(), 7, 14, 28).unwrap();
        assert_eq!(u.minperiod(), 29);
    }

    #[test]
    fn streaming_and_batch_agree() {
        let n = 20;
        let high: Vec<f64> = (0..n).map(|i| 10.0 + i as f64 + (i as f64).sin()).collect();
        let low: Vec<f64> = high.iter().map(|h| h - 1.5).collect();
        let close: Vec<f64> = high.iter().zip(&low).map(|(h, l)| (h + l) / 2.0).collect();

        let h1 = feed(&high);
        let l1 = feed(&low);
        let c1 = feed(&close);
        let h2 = feed(&high);
        let l2 = feed(&low);
        let c2 = feed(&close);

        let mut streaming = Ultimate::new(h1, l1, c1, 2, 4, 6).unwrap();
        for _ in 0..n {
            tick(&mut streaming);
        }
        let mut batch = Ultimate::new(h2, l2, c2, 2, 4, 6).unwrap();
        run_once(&mut batch, n);

        for ago in 0..n as i64 {
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
