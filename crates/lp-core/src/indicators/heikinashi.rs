//! Heikin-Ashi candles (§4.5.2): a smoothed OHLC transform with a
//! one-bar recurrence on `ha_open`. `mp = 2`: the first bar (`t = 0`) has
//! no previous `ha_open`/`ha_close` to average, so it stays NaN; the
//! first valid bar is `t = 1`, which seeds `ha_open` from bar 0's own
//! open/close average.

use crate::collection::LineCollection;
use crate::error::Result;
use crate::indicator::{read, Indicator};
use crate::line::LineHandle;

pub struct HeikinAshi {
    open: LineHandle,
    high: LineHandle,
    low: LineHandle,
    close: LineHandle,
    output: LineCollection,
}

impl HeikinAshi {
    pub fn new(open: LineHandle, high: LineHandle, low: LineHandle, close: LineHandle) -> Result<Self> {
        let mut output = LineCollection::new();
        output.add_line(Some("ha_open"));
        output.add_line(Some("ha_high"));
        output.add_line(Some("ha_low"));
        output.add_line(Some("ha_close"));
        Ok(HeikinAshi {
            open,
            high,
            low,
            close,
            output,
        })
    }

    fn ha_close(&self, ago: i64) -> f64 {
        (read(&self.open, ago) + read(&self.high, ago) + read(&self.low, ago) + read(&self.close, ago)) / 4.0
    }

    fn ha_close_abs(&self, i: usize) -> f64 {
        let o = self.open.borrow().get_abs(i);
        let h = self.high.borrow().get_abs(i);
        let l = self.low.borrow().get_abs(i);
        let c = self.close.borrow().get_abs(i);
        (o + h + l + c) / 4.0
    }

    fn write(&self, ha_open: f64, ha_close: f64) {
        let ha_high = read(&self.high, 0).max(ha_open).max(ha_close);
        let ha_low = read(&self.low, 0).min(ha_open).min(ha_close);
        self.output.get_line(0).unwrap().borrow_mut().set(0, ha_open).unwrap();
        self.output.get_line(1).unwrap().borrow_mut().set(0, ha_high).unwrap();
        self.output.get_line(2).unwrap().borrow_mut().set(0, ha_low).unwrap();
        self.output.get_line(3).unwrap().borrow_mut().set(0, ha_close).unwrap();
    }

    fn write_abs(&self, i: usize, ha_open: f64, ha_close: f64) {
        let high = self.high.borrow().get_abs(i);
        let low = self.low.borrow().get_abs(i);
        let ha_high = high.max(ha_open).max(ha_close);
        let ha_low = low.min(ha_open).min(ha_close);
        self.output.get_line(0).unwrap().borrow_mut().set_abs(i, ha_open);
        self.output.get_line(1).unwrap().borrow_mut().set_abs(i, ha_high);
        self.output.get_line(2).unwrap().borrow_mut().set_abs(i, ha_low);
        self.output.get_line(3).unwrap().borrow_mut().set_abs(i, ha_close);
    }
}

impl Indicator for HeikinAshi {
    fn minperiod(&self) -> usize {
        2
    }

    fn output(&self) -> &LineCollection {
        &self.output
    }

    fn nextstart(&mut self) {
        let prev_open = read(&self.open, -1);
        let prev_close = read(&self.close, -1);
        let ha_open = (prev_open + prev_close) / 2.0;
        let ha_close = self.ha_close(0);
        self.write(ha_open, ha_close);
    }

    fn next(&mut self) {
        let prev_open = self.output.get_line(0).unwrap().borrow().get(-1);
        let prev_close = self.output.get_line(3).unwrap().borrow().get(-1);
        let ha_open = (prev_open + prev_close) / 2.0;
        let ha_close = self.ha_close(0);
        self.write(ha_open, ha_close);
    }

    fn oncestart(&mut self, start: usize, _end: usize) {
        let o = self.open.borrow().get_abs(start - 1);
        let c = self.close.borrow().get_abs(start - 1);
        let ha_open = (o + c) / 2.0;
        let ha_close = self.ha_close_abs(start);
        self.write_abs(start, ha_open, ha_close);
    }

    fn once(&mut self, start: usize, end: usize) {
        for i in start..end {
            let prev_open = self.output.get_line(0).unwrap().borrow().get_abs(i - 1);
            let prev_close = self.output.get_line(3).unwrap().borrow().get_abs(i - 1);
            let ha_open = (prev_open + prev_close) / 2.0;
            let ha_close = self.ha_close_abs(i);
            self.write_abs(i, ha_open, ha_close);
        }
    }
}
