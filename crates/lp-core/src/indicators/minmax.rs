//! Rolling extremes over a window (§4.5.3's Stochastic/Vortex/DM depend on
//! these; also useful standalone). `mp = period` for both.

use crate::collection::LineCollection;
use crate::error::{PipelineError, Result};
use crate::indicator::Indicator;
use crate::kernel::{window_abs, window_ago};
use crate::line::LineHandle;

/// `lowest[t] = min(in[t-period+1 ..= t])`.
pub struct Lowest {
    period: usize,
    input: LineHandle,
    output: LineCollection,
}

impl Lowest {
    pub fn new(input: LineHandle, period: usize) -> Result<Self> {
        PipelineError::require_positive_period(period, "Lowest")?;
        let mut output = LineCollection::new();
        output.add_line(Some("lowest"));
        Ok(Lowest {
            period,
            input,
            output,
        })
    }
}

impl Indicator for Lowest {
    fn minperiod(&self) -> usize {
        self.period
    }
    fn output(&self) -> &LineCollection {
        &self.output
    }
    fn next(&mut self) {
        let v = window_ago(&self.input, self.period)
            .into_iter()
            .fold(f64::INFINITY, f64::min);
        self.output.get_line(0).unwrap().borrow_mut().set(0, v).unwrap();
    }
    fn once(&mut self, start: usize, end: usize) {
        for i in start..end {
            let v = window_abs(&self.input, i, self.period)
                .into_iter()
                .fold(f64::INFINITY, f64::min);
            self.output.get_line(0).unwrap().borrow_mut().set_abs(i, v);
        }
    }
}

/// `highest[t] = max(in[t-period+1 ..= t])`.
pub struct Highest {
    period: usize,
    input: LineHandle,
    output: LineCollection,
}

impl Highest {
    pub fn new(input: LineHandle, period: usize) -> Result<Self> {
        PipelineError::require_positive_period(period, "Highest")?;
        let mut output = LineCollection::new();
        output.add_line(Some("highest"));
        Ok(Highest {
            period,
            input,
            output,
        })
    }
}

impl Indicator for Highest {
    fn minperiod(&self) -> usize {
        self.period
    }
    fn output(&self) -> &LineCollection {
        &self.output
    }
    fn next(&mut self) {
        let v = window_ago(&self.input, self.period)
            .into_iter()
            .fold(f64::NEG_INFINITY, f64::max);
        self.output.get_line(0).unwrap().borrow_mut().set(0, v).unwrap();
    }
    fn once(&mut self, start: usize, end: usize) {
        for i in start..end {
            let v = window_abs(&self.input, i, self.period)
                .into_iter()
                .fold(f64::NEG_INFINITY, f64::max);
            self.output.get_line(0).unwrap().borrow_mut().set_abs(i, v);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicator::tick;
    use crate::line::new_line_handle;

    fn feed(values: &[f64]) -> LineHandle {
        let line = new_line_handle();
        for &v in values {
            line.borrow_mut().append(v);
        }
        line
    }

    #[test]
    fn lowest_and_highest_over_window() {
        let input = feed(&[5.0, 1.0, 9.0, 3.0]);
        let mut lo = Lowest::new(input.clone(), 3).unwrap();
        let mut hi = Highest::new(input, 3).unwrap();
        for _ in 0..4 {
            tick(&mut lo);
            tick(&mut hi);
        }
        assert_eq!(lo.output().primary().unwrap().borrow().get(0), 1.0);
        assert_eq!(hi.output().primary().unwrap().borrow().get(0), 9.0);
    }
}
