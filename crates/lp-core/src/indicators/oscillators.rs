//! Price-vs-moving-average oscillators (§4.5.2): how far the current price
//! sits from a chosen moving average, as a signed difference (or, for
//! [`PriceOsc`], a percentage). Each shares its underlying average's
//! minimum period.

use crate::collection::LineCollection;
use crate::error::{PipelineError, Result};
use crate::indicator::{read, Indicator};
use crate::kernel::{ema_alpha, ema_step, mean, wma_weighted, window_abs, window_ago};
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

/// `price - DEMA(price, period)`. `mp = 2*period - 1`.
pub struct DemaOsc {
    period: usize,
    alpha: f64,
    input: LineHandle,
    ema1: LineHandle,
    ema2: LineHandle,
    output: LineCollection,
}

impl DemaOsc {
    pub fn new(input: LineHandle, period: usize) -> Result<Self> {
        PipelineError::require_positive_period(period, "DemaOsc")?;
        let mut output = LineCollection::new();
        output.add_line(Some("demaosc"));
        Ok(DemaOsc {
            period,
            alpha: ema_alpha(period),
            input,
            ema1: new_line_handle(),
            ema2: new_line_handle(),
            output,
        })
    }

    fn step(&mut self, len: usize) {
        ema_stage_step(&self.ema1, &self.input, len, self.period, self.alpha);
        let stage2_len = len.saturating_sub(self.period - 1);
        ema_stage_step(&self.ema2, &self.ema1, stage2_len, self.period, self.alpha);
        if len >= self.minperiod() {
            let dema = 2.0 * self.ema1.borrow().get(0) - self.ema2.borrow().get(0);
            let v = read(&self.input, 0) - dema;
            self.output.get_line(0).unwrap().borrow_mut().set(0, v).unwrap();
        }
    }

    fn step_abs(&mut self, i: usize) {
        let len = i + 1;
        ema_stage_step_abs(&self.ema1, &self.input, i, len, self.period, self.alpha);
        let stage2_len = len.saturating_sub(self.period - 1);
        ema_stage_step_abs(&self.ema2, &self.ema1, i, stage2_len, self.period, self.alpha);
        if len >= self.minperiod() {
            let dema = 2.0 * self.ema1.borrow().get_abs(i) - self.ema2.borrow().get_abs(i);
            let v = self.input.borrow().get_abs(i) - dema;
            self.output.get_line(0).unwrap().borrow_mut().set_abs(i, v);
        }
    }
}

impl Indicator for DemaOsc {
    fn minperiod(&self) -> usize {
        2 * self.period - 1
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

/// `price - TEMA(price, period)`. `mp = 3*period - 2`.
pub struct TemaOsc {
    period: usize,
    alpha: f64,
    input: LineHandle,
    ema1: LineHandle,
    ema2: LineHandle,
    ema3: LineHandle,
    output: LineCollection,
}

impl TemaOsc {
    pub fn new(input: LineHandle, period: usize) -> Result<Self> {
        PipelineError::require_positive_period(period, "TemaOsc")?;
        let mut output = LineCollection::new();
        output.add_line(Some("temaosc"));
        Ok(TemaOsc {
            period,
            alpha: ema_alpha(period),
            input,
            ema1: new_line_handle(),
            ema2: new_line_handle(),
            ema3: new_line_handle(),
            output,
        })
    }

    fn step(&mut self, len: usize) {
        ema_stage_step(&self.ema1, &self.input, len, self.period, self.alpha);
        let stage2_len = len.saturating_sub(self.period - 1);
        ema_stage_step(&self.ema2, &self.ema1, stage2_len, self.period, self.alpha);
        let stage3_len = stage2_len.saturating_sub(self.period - 1);
        ema_stage_step(&self.ema3, &self.ema2, stage3_len, self.period, self.alpha);
        if len >= self.minperiod() {
            let tema = 3.0 * self.ema1.borrow().get(0) - 3.0 * self.ema2.borrow().get(0)
                + self.ema3.borrow().get(0);
            let v = read(&self.input, 0) - tema;
            self.output.get_line(0).unwrap().borrow_mut().set(0, v).unwrap();
        }
    }

    fn step_abs(&mut self, i: usize) {
        let len = i + 1;
        ema_stage_step_abs(&self.ema1, &self.input, i, len, self.period, self.alpha);
        let stage2_len = len.saturating_sub(self.period - 1);
        ema_stage_step_abs(&self.ema2, &self.ema1, i, stage2_len, self.period, self.alpha);
        let stage3_len = stage2_len.saturating_sub(self.period - 1);
        ema_stage_step_abs(&self.ema3, &self.ema2, i, stage3_len, self.period, self.alpha);
        if len >= self.minperiod() {
            let tema = 3.0 * self.ema1.borrow().get_abs(i) - 3.0 * self.ema2.borrow().get_abs(i)
                + self.ema3.borrow().get_abs(i);
            let v = self.input.borrow().get_abs(i) - tema;
            self.output.get_line(0).unwrap().borrow_mut().set_abs(i, v);
        }
    }
}

impl Indicator for TemaOsc {
    fn minperiod(&self) -> usize {
        3 * self.period - 2
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

/// `price - WMA(price, period)`. `mp = period`.
pub struct WmaOsc {
    period: usize,
    input: LineHandle,
    output: LineCollection,
}

impl WmaOsc {
    pub fn new(input: LineHandle, period: usize) -> Result<Self> {
        PipelineError::require_positive_period(period, "WmaOsc")?;
        let mut output = LineCollection::new();
        output.add_line(Some("wmaosc"));
        Ok(WmaOsc {
            period,
            input,
            output,
        })
    }
}

impl Indicator for WmaOsc {
    fn minperiod(&self) -> usize {
        self.period
    }
    fn output(&self) -> &LineCollection {
        &self.output
    }
    fn next(&mut self) {
        let wma = wma_weighted(&window_ago(&self.input, self.period));
        let v = read(&self.input, 0) - wma;
        self.output.get_line(0).unwrap().borrow_mut().set(0, v).unwrap();
    }
    fn once(&mut self, start: usize, end: usize) {
        for i in start..end {
            let wma = wma_weighted(&window_abs(&self.input, i, self.period));
            let v = self.input.borrow().get_abs(i) - wma;
            self.output.get_line(0).unwrap().borrow_mut().set_abs(i, v);
        }
    }
}

/// `100 * (price - SMA(price, period)) / SMA(price, period)`. `mp = period`.
pub struct PriceOsc {
    period: usize,
    input: LineHandle,
    output: LineCollection,
}

impl PriceOsc {
    pub fn new(input: LineHandle, period: usize) -> Result<Self> {
        PipelineError::require_positive_period(period, "PriceOsc")?;
        let mut output = LineCollection::new();
        output.add_line(Some("priceosc"));
        Ok(PriceOsc {
            period,
            input,
            output,
        })
    }
}

impl Indicator for PriceOsc {
    fn minperiod(&self) -> usize {
        self.period
    }
    fn output(&self) -> &LineCollection {
        &self.output
    }
    fn next(&mut self) {
        let sma = mean(&window_ago(&self.input, self.period));
        let v = 100.0 * (read(&self.input, 0) - sma) / sma;
        self.output.get_line(0).unwrap().borrow_mut().set(0, v).unwrap();
    }
    fn once(&mut self, start: usize, end: usize) {
        for i in start..end {
            let sma = mean(&window_abs(&self.input, i, self.period));
            let v = 100.0 * (self.input.borrow().get_abs(i) - sma) / sma;
            self.output.get_line(0).unwrap().borrow_mut().set_abs(i, v);
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
    fn price_osc_streaming_and_batch_agree() {
        let values: Vec<f64> = (1..=15).map(|v| v as f64).collect();
        let a = feed(&values);
        let b = feed(&values);
        let mut streaming = PriceOsc::new(a, 4).unwrap();
        for _ in 0..values.len() {
            tick(&mut streaming);
        }
        let mut batch = PriceOsc::new(b, 4).unwrap();
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

    #[test]
    fn dema_osc_streaming_and_batch_agree() {
        let values: Vec<f64> = (1..=16).map(|v| v as f64).collect();
        let a = feed(&values);
        let b = feed(&values);
        let mut streaming = DemaOsc::new(a, 3).unwrap();
        for _ in 0..values.len() {
            tick(&mut streaming);
        }
        let mut batch = DemaOsc::new(b, 3).unwrap();
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
