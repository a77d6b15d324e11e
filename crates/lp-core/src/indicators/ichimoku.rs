//! Ichimoku Kinko Hyo (§4.5.3): five lines built from rolling
//! high/low midpoints, two of which are classically *plotted* ahead of
//! (senkou spans) or behind (chikou span) the current bar.
//!
//! This engine has no plotting layer and `Line::set` cannot write to a
//! bar that has not happened yet (§4.1), so the displaced lines are
//! modeled as lagged reads instead of a forward overlay: `senkou_a[t]`
//! and `senkou_b[t]` report what the span's raw value *was*
//! `displacement` bars ago, and `chikou[t]` reports what the close *was*
//! `displacement` bars ago. A consumer that wants the traditional
//! forward-shifted chart can re-apply the shift itself; the numeric
//! content is identical either way.
//!
//! `mp = senkou_b_period + displacement` (the most demanding of the five
//! lines); the individual lines become non-NaN earlier, exactly as real
//! Ichimoku behaves.

use crate::collection::LineCollection;
use crate::error::{PipelineError, Result};
use crate::indicator::Indicator;
use crate::line::{new_line_handle, LineHandle};

fn high_low_mid(high: &LineHandle, low: &LineHandle, period: usize) -> f64 {
    let hh = (0..period)
        .map(|back| high.borrow().get(-(back as i64)))
        .fold(f64::NEG_INFINITY, f64::max);
    let ll = (0..period)
        .map(|back| low.borrow().get(-(back as i64)))
        .fold(f64::INFINITY, f64::min);
    (hh + ll) / 2.0
}

fn high_low_mid_abs(high: &LineHandle, low: &LineHandle, end: usize, period: usize) -> f64 {
    let start = end + 1 - period;
    let hh = (start..=end).map(|i| high.borrow().get_abs(i)).fold(f64::NEG_INFINITY, f64::max);
    let ll = (start..=end).map(|i| low.borrow().get_abs(i)).fold(f64::INFINITY, f64::min);
    (hh + ll) / 2.0
}

pub struct Ichimoku {
    tenkan_period: usize,
    kijun_period: usize,
    senkou_b_period: usize,
    displacement: usize,
    high: LineHandle,
    low: LineHandle,
    close: LineHandle,
    raw_senkou_b: LineHandle,
    output: LineCollection,
}

impl Ichimoku {
    pub fn new(
        high: LineHandle,
        low: LineHandle,
        close: LineHandle,
        tenkan_period: usize,
        kijun_period: usize,
        senkou_b_period: usize,
        displacement: usize,
    ) -> Result<Self> {
        PipelineError::require_positive_period(tenkan_period, "Ichimoku tenkan_period")?;
        PipelineError::require_positive_period(kijun_period, "Ichimoku kijun_period")?;
        PipelineError::require_positive_period(senkou_b_period, "Ichimoku senkou_b_period")?;
        PipelineError::require_positive_period(displacement, "Ichimoku displacement")?;
        let mut output = LineCollection::new();
        output.add_line(Some("tenkan_sen"));
        output.add_line(Some("kijun_sen"));
        output.add_line(Some("senkou_span_a"));
        output.add_line(Some("senkou_span_b"));
        output.add_line(Some("chikou_span"));
        Ok(Ichimoku {
            tenkan_period,
            kijun_period,
            senkou_b_period,
            displacement,
            high,
            low,
            close,
            raw_senkou_b: new_line_handle(),
            output,
        })
    }

    fn step(&mut self, len: usize) {
        self.raw_senkou_b.borrow_mut().forward(1);

        if len >= self.tenkan_period {
            let v = high_low_mid(&self.high, &self.low, self.tenkan_period);
            self.output.get_line(0).unwrap().borrow_mut().set(0, v).unwrap();
        }
        if len >= self.kijun_period {
            let v = high_low_mid(&self.high, &self.low, self.kijun_period);
            self.output.get_line(1).unwrap().borrow_mut().set(0, v).unwrap();
        }
        if len >= self.senkou_b_period {
            let v = high_low_mid(&self.high, &self.low, self.senkou_b_period);
            self.raw_senkou_b.borrow_mut().set(0, v).unwrap();
        }
        if len >= self.kijun_period + self.displacement {
            let d = self.displacement as i64;
            let tenkan = self.output.get_line(0).unwrap().borrow().get(-d);
            let kijun = self.output.get_line(1).unwrap().borrow().get(-d);
            self.output
                .get_line(2)
                .unwrap()
                .borrow_mut()
                .set(0, (tenkan + kijun) / 2.0)
                .unwrap();
        }
        if len >= self.senkou_b_period + self.displacement {
            let v = self.raw_senkou_b.borrow().get(-(self.displacement as i64));
            self.output.get_line(3).unwrap().borrow_mut().set(0, v).unwrap();
        }
        if len >= self.displacement + 1 {
            let v = self.close.borrow().get(-(self.displacement as i64));
            self.output.get_line(4).unwrap().borrow_mut().set(0, v).unwrap();
        }
    }

    fn step_abs(&mut self, i: usize) {
        let len = i + 1;
        self.raw_senkou_b.borrow_mut().forward(1);

        if len >= self.tenkan_period {
            let v = high_low_mid_abs(&self.high, &self.low, i, self.tenkan_period);
            self.output.get_line(0).unwrap().borrow_mut().set_abs(i, v);
        }
        if len >= self.kijun_period {
            let v = high_low_mid_abs(&self.high, &self.low, i, self.kijun_period);
            self.output.get_line(1).unwrap().borrow_mut().set_abs(i, v);
        }
        if len >= self.senkou_b_period {
            let v = high_low_mid_abs(&self.high, &self.low, i, self.senkou_b_period);
            self.raw_senkou_b.borrow_mut().set_abs(i, v);
        }
        if len >= self.kijun_period + self.displacement {
            let back = i - self.displacement;
            let tenkan = self.output.get_line(0).unwrap().borrow().get_abs(back);
            let kijun = self.output.get_line(1).unwrap().borrow().get_abs(back);
            self.output
                .get_line(2)
                .unwrap()
                .borrow_mut()
                .set_abs(i, (tenkan + kijun) / 2.0);
        }
        if len >= self.senkou_b_period + self.displacement {
            let v = self.raw_senkou_b.borrow().get_abs(i - self.displacement);
            self.output.get_line(3).unwrap().borrow_mut().set_abs(i, v);
        }
        if len >= self.displacement + 1 {
            let v = self.close.borrow().get_abs(i - self.displacement);
            self.output.get_line(4).unwrap().borrow_mut().set_abs(i, v);
        }
    }
}

impl Indicator for Ichimoku {
    fn minperiod(&self) -> usize {
        self.senkou_b_period + self.displacement
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
    fn minperiod_is_senkou_b_plus_displacement() {
        let ich = Ichimoku::new(new_input(), new_input(), new_input(), 9, 26, 52, 26).unwrap();
        assert_eq!(ich.minperiod(), 78);
    }

    #[test]
    fn streaming_and_batch_agree() {
        let n = 40;
        let high: Vec<f64> = (0..n).map(|i| 100.0 + i as f64 + (i as f64 * 0.3).sin() * 2.0).collect();
        let low: Vec<f64> = high.iter().map(|h| h - 2.0).collect();
        let close: Vec<f64> = high.iter().zip(&low).map(|(h, l)| (h + l) / 2.0).collect();

        let h1 = feed(&high);
        let l1 = feed(&low);
        let c1 = feed(&close);
        let h2 = feed(&high);
        let l2 = feed(&low);
        let c2 = feed(&close);

        let mut streaming = Ichimoku::new(h1, l1, c1, 3, 5, 8, 4).unwrap();
        for _ in 0..n {
            tick(&mut streaming);
        }
        let mut batch = Ichimoku::new(h2, l2, c2, 3, 5, 8, 4).unwrap();
        run_once(&mut batch, n);

        for line_idx in 0..5 {
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
