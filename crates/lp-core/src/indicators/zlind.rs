//! Zero-Lag Indicator: the raw momentum-corrected transform that
//! [`crate::indicators::zlema::Zlema`] smooths with an EMA. Exposed
//! standalone since it is occasionally used unsmoothed as a fast-reacting
//! proxy series. `zlind[t] = 2*in[t] - in[t-lag]`, `lag = (period-1)/2`,
//! `mp = lag + 1`.

use crate::collection::LineCollection;
use crate::error::{PipelineError, Result};
use crate::indicator::{read, Indicator};
use crate::line::LineHandle;

pub struct ZlIndicator {
    lag: i64,
    input: LineHandle,
    output: LineCollection,
}

impl ZlIndicator {
    pub fn new(input: LineHandle, period: usize) -> Result<Self> {
        PipelineError::require_positive_period(period, "ZlIndicator")?;
        let lag = ((period.saturating_sub(1)) / 2) as i64;
        let mut output = LineCollection::new();
        output.add_line(Some("zlind"));
        Ok(ZlIndicator { lag, input, output })
    }
}

impl Indicator for ZlIndicator {
    fn minperiod(&self) -> usize {
        self.lag as usize + 1
    }
    fn output(&self) -> &LineCollection {
        &self.output
    }
    fn next(&mut self) {
        let v = 2.0 * read(&self.input, 0) - read(&self.input, -self.lag);
        self.output.get_line(0).unwrap().borrow_mut().set(0, v).unwrap();
    }
    fn once(&mut self, start: usize, end: usize) {
        for i in start..end {
            let prev_i = i - self.lag as usize;
            let v = 2.0 * self.input.borrow().get_abs(i) - self.input.borrow().get_abs(prev_i);
            self.output.get_line(0).unwrap().borrow_mut().set_abs(i, v);
        }
    }
}
