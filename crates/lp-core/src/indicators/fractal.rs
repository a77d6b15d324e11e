//! Williams Fractal (§4.5.3): marks a 5-bar-centered local extreme once
//! the two bars that confirm it have arrived. `mp = 5`; the fractal, when
//! present, is reported about the bar two ago (`ago = -2`), the earliest
//! point at which both confirming bars are known. Output lines:
//! `up` (a low fractal, carries that bar's low) and `down` (a high
//! fractal, carries that bar's high); non-fractal bars are NaN.

use crate::collection::LineCollection;
use crate::error::Result;
use crate::indicator::{read, Indicator};
use crate::line::LineHandle;
use crate::types::Float;

pub struct Fractal {
    high: LineHandle,
    low: LineHandle,
    output: LineCollection,
}

impl Fractal {
    pub fn new(high: LineHandle, low: LineHandle) -> Result<Self> {
        let mut output = LineCollection::new();
        output.add_line(Some("up"));
        output.add_line(Some("down"));
        Ok(Fractal { high, low, output })
    }

    fn write(&self) {
        let center_high = read(&self.high, -2);
        let is_bearish = (0..5).filter(|&b| b != 2).all(|b| read(&self.high, -(b as i64)) < center_high);
        let bearish = if is_bearish { center_high } else { Float::NAN };

        let center_low = read(&self.low, -2);
        let is_bullish = (0..5).filter(|&b| b != 2).all(|b| read(&self.low, -(b as i64)) > center_low);
        let bullish = if is_bullish { center_low } else { Float::NAN };

        self.output.get_line(0).unwrap().borrow_mut().set(0, bullish).unwrap();
        self.output.get_line(1).unwrap().borrow_mut().set(0, bearish).unwrap();
    }

    fn write_abs(&self, i: usize) {
        let center = i - 2;
        let center_high = self.high.borrow().get_abs(center);
        let is_bearish = (i - 4..=i).filter(|&k| k != center).all(|k| self.high.borrow().get_abs(k) < center_high);
        let bearish = if is_bearish { center_high } else { Float::NAN };

        let center_low = self.low.borrow().get_abs(center);
        let is_bullish = (i - 4..=i).filter(|&k| k != center).all(|k| self.low.borrow().get_abs(k) > center_low);
        let bullish = if is_bullish { center_low } else { Float::NAN };

        self.output.get_line(0).unwrap().borrow_mut().set_abs(i, bullish);
        self.output.get_line(1).unwrap().borrow_mut().set_abs(i, bearish);
    }
}

impl Indicator for Fractal {
    fn minperiod(&self) -> usize {
        5
    }
    fn output(&self) -> &LineCollection {
        &self.output
    }
    fn next(&mut self) {
        self.write();
    }
    fn once(&mut self, start: usize, end: usize) {
        for i in start..end {
            self.write_abs(i);
        }
    }
}
