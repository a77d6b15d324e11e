//! Vortex Indicator (§4.5.3): two oscillators comparing directional
//! movement against the summed true range over a rolling window.
//! `mp = period + 1` (the extra bar is the previous close/high/low each
//! raw quantity needs). Output lines: `vi_plus`, `vi_minus`.

use crate::collection::LineCollection;
use crate::error::{PipelineError, Result};
use crate::indicator::{read, Indicator};
use crate::kernel::true_range;
use crate::line::LineHandle;

pub struct Vortex {
    period: usize,
    high: LineHandle,
    low: LineHandle,
    close: LineHandle,
    output: LineCollection,
}

impl Vortex {
    pub fn new(high: LineHandle, low: LineHandle, close: LineHandle, period: usize) -> Result<Self> {
        PipelineError::require_positive_period(period, "Vortex")?;
        let mut output = LineCollection::new();
        output.add_line(Some("vi_plus"));
        output.add_line(Some("vi_minus"));
        Ok(Vortex {
            period,
            high,
            low,
            close,
            output,
        })
    }

    fn vm_plus_ago(&self, ago: i64) -> f64 {
        (read(&self.high, ago) - read(&self.low, ago - 1)).abs()
    }

    fn vm_minus_ago(&self, ago: i64) -> f64 {
        (read(&self.low, ago) - read(&self.high, ago - 1)).abs()
    }

    fn tr_ago(&self, ago: i64) -> f64 {
        true_range(read(&self.high, ago), read(&self.low, ago), read(&self.close, ago - 1))
    }

    fn vm_plus_abs(&self, i: usize) -> f64 {
        (self.high.borrow().get_abs(i) - self.low.borrow().get_abs(i - 1)).abs()
    }

    fn vm_minus_abs(&self, i: usize) -> f64 {
        (self.low.borrow().get_abs(i) - self.high.borrow().get_abs(i - 1)).abs()
    }

    fn tr_abs(&self, i: usize) -> f64 {
        let prev_close = self.close.borrow().get_abs(i - 1);
        true_range(self.high.borrow().get_abs(i), self.low.borrow().get_abs(i), prev_close)
    }

    fn step(&mut self, len: usize) {
        if len < self.minperiod() {
            return;
        }
        let vm_plus: f64 = (0..self.period).map(|b| self.vm_plus_ago(-(b as i64))).sum();
        let vm_minus: f64 = (0..self.period).map(|b| self.vm_minus_ago(-(b as i64))).sum();
        let tr: f64 = (0..self.period).map(|b| self.tr_ago(-(b as i64))).sum();
        self.output.get_line(0).unwrap().borrow_mut().set(0, vm_plus / tr).unwrap();
        self.output.get_line(1).unwrap().borrow_mut().set(0, vm_minus / tr).unwrap();
    }

    fn step_abs(&mut self, i: usize) {
        let len = i + 1;
        if len < self.minperiod() {
            return;
        }
        let start = i + 1 - self.period;
        let vm_plus: f64 = (start..=i).map(|k| self.vm_plus_abs(k)).sum();
        let vm_minus: f64 = (start..=i).map(|k| self.vm_minus_abs(k)).sum();
        let tr: f64 = (start..=i).map(|k| self.tr_abs(k)).sum();
        self.output.get_line(0).unwrap().borrow_mut().set_abs(i, vm_plus / tr);
        self.output.get_line(1).unwrap().borrow_mut().set_abs(i, vm_minus / tr);
    }
}

impl Indicator for Vortex {
    fn minperiod(&self) -> usize {
        self.period + 1
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
