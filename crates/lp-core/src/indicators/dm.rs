//! Directional Movement / ADX (§4.5.3): Wilder's smoothed directional
//! indicators and the resulting trend-strength index.
//!
//! `+DM`/`-DM`/`TR` are raw per-bar quantities (no separate storage: each
//! is recomputed on demand from `high`/`low`/`close`, the same trick
//! [`crate::indicators::atr::Atr`] uses). Each is Wilder-smoothed
//! (`SMMA`) over `period`; `+DI`/`-DI` are the smoothed `+DM`/`-DM` scaled
//! by the smoothed `TR`; `DX` is their normalized absolute difference (`0.0` when `+DI + -DI == 0`, per §7); and
//! `ADX` is `DX` smoothed again over `period`.
//!
//! `mp = 2*period + 1`, Wilder's own warm-up figure: `period + 1` bars for
//! `+DI`/`-DI`/`DX` to exist (one extra for the first true range), plus
//! `period` more `DX` values for `ADX` to seed, plus one bar of margin.
//! `+DI`/`-DI`/`DX` are written to their output lines as soon as they are
//! individually ready, same as the other multi-line composites here (e.g.
//! `Macd`). Output lines (§6.2): `plusDI`, `minusDI`, `dx`, `adx`.

use crate::collection::LineCollection;
use crate::error::{PipelineError, Result};
use crate::indicator::{read, Indicator};
use crate::kernel::{ema_step, mean, true_range, wilder_alpha};
use crate::line::{new_line_handle, LineHandle};

pub struct Dm {
    period: usize,
    alpha: f64,
    high: LineHandle,
    low: LineHandle,
    close: LineHandle,
    tr_smma: LineHandle,
    plus_dm_smma: LineHandle,
    minus_dm_smma: LineHandle,
    output: LineCollection,
}

impl Dm {
    pub fn new(high: LineHandle, low: LineHandle, close: LineHandle, period: usize) -> Result<Self> {
        PipelineError::require_positive_period(period, "Dm")?;
        let mut output = LineCollection::new();
        output.add_line(Some("plusDI"));
        output.add_line(Some("minusDI"));
        output.add_line(Some("dx"));
        output.add_line(Some("adx"));
        Ok(Dm {
            period,
            alpha: wilder_alpha(period),
            high,
            low,
            close,
            tr_smma: new_line_handle(),
            plus_dm_smma: new_line_handle(),
            minus_dm_smma: new_line_handle(),
            output,
        })
    }

    fn tr_ago(&self, ago: i64) -> f64 {
        true_range(read(&self.high, ago), read(&self.low, ago), read(&self.close, ago - 1))
    }

    fn plus_dm_ago(&self, ago: i64) -> f64 {
        let up = read(&self.high, ago) - read(&self.high, ago - 1);
        let down = read(&self.low, ago - 1) - read(&self.low, ago);
        if up > down && up > 0.0 {
            up
        } else {
            0.0
        }
    }

    fn minus_dm_ago(&self, ago: i64) -> f64 {
        let up = read(&self.high, ago) - read(&self.high, ago - 1);
        let down = read(&self.low, ago - 1) - read(&self.low, ago);
        if down > up && down > 0.0 {
            down
        } else {
            0.0
        }
    }

    fn tr_abs(&self, i: usize) -> f64 {
        let prev_close = self.close.borrow().get_abs(i - 1);
        true_range(self.high.borrow().get_abs(i), self.low.borrow().get_abs(i), prev_close)
    }

    fn plus_dm_abs(&self, i: usize) -> f64 {
        let up = self.high.borrow().get_abs(i) - self.high.borrow().get_abs(i - 1);
        let down = self.low.borrow().get_abs(i - 1) - self.low.borrow().get_abs(i);
        if up > down && up > 0.0 {
            up
        } else {
            0.0
        }
    }

    fn minus_dm_abs(&self, i: usize) -> f64 {
        let up = self.high.borrow().get_abs(i) - self.high.borrow().get_abs(i - 1);
        let down = self.low.borrow().get_abs(i - 1) - self.low.borrow().get_abs(i);
        if down > up && down > 0.0 {
            down
        } else {
            0.0
        }
    }

    fn smma_advance(line: &LineHandle, stage_len: usize, period: usize, alpha: f64, current: f64, seed_window: &[f64]) {
        line.borrow_mut().forward(1);
        if stage_len < period {
            return;
        }
        let v = if stage_len == period {
            mean(seed_window)
        } else {
            ema_step(line.borrow().get(-1), current, alpha)
        };
        line.borrow_mut().set(0, v).unwrap();
    }

    fn smma_advance_abs(line: &LineHandle, i: usize, stage_len: usize, period: usize, alpha: f64, current: f64, seed_window: &[f64]) {
        line.borrow_mut().forward(1);
        if stage_len < period {
            return;
        }
        let v = if stage_len == period {
            mean(seed_window)
        } else {
            ema_step(line.borrow().get_abs(i - 1), current, alpha)
        };
        line.borrow_mut().set_abs(i, v);
    }

    fn step(&mut self, len: usize) {
        let raw_len = len.saturating_sub(1);
        let tr_seed: Vec<f64> = if raw_len == self.period {
            (0..self.period).rev().map(|b| self.tr_ago(-(b as i64))).collect()
        } else {
            Vec::new()
        };
        let plus_seed: Vec<f64> = if raw_len == self.period {
            (0..self.period).rev().map(|b| self.plus_dm_ago(-(b as i64))).collect()
        } else {
            Vec::new()
        };
        let minus_seed: Vec<f64> = if raw_len == self.period {
            (0..self.period).rev().map(|b| self.minus_dm_ago(-(b as i64))).collect()
        } else {
            Vec::new()
        };
        let tr_now = if raw_len >= 1 { self.tr_ago(0) } else { 0.0 };
        let plus_now = if raw_len >= 1 { self.plus_dm_ago(0) } else { 0.0 };
        let minus_now = if raw_len >= 1 { self.minus_dm_ago(0) } else { 0.0 };
        Self::smma_advance(&self.tr_smma, raw_len, self.period, self.alpha, tr_now, &tr_seed);
        Self::smma_advance(&self.plus_dm_smma, raw_len, self.period, self.alpha, plus_now, &plus_seed);
        Self::smma_advance(&self.minus_dm_smma, raw_len, self.period, self.alpha, minus_now, &minus_seed);

        if raw_len >= self.period {
            let tr = self.tr_smma.borrow().get(0);
            let plus_di = 100.0 * self.plus_dm_smma.borrow().get(0) / tr;
            let minus_di = 100.0 * self.minus_dm_smma.borrow().get(0) / tr;
            let di_sum = plus_di + minus_di;
            let dx = if di_sum == 0.0 { 0.0 } else { 100.0 * (plus_di - minus_di).abs() / di_sum };
            self.output.get_line(0).unwrap().borrow_mut().set(0, plus_di).unwrap();
            self.output.get_line(1).unwrap().borrow_mut().set(0, minus_di).unwrap();
            self.output.get_line(2).unwrap().borrow_mut().set(0, dx).unwrap();

            let dx_len = raw_len - self.period + 1;
            if dx_len > self.period {
                let adx = if dx_len == self.period + 1 {
                    let window: Vec<f64> = (0..self.period)
                        .rev()
                        .map(|b| self.output.get_line(2).unwrap().borrow().get(-(b as i64)))
                        .collect();
                    mean(&window)
                } else {
                    let prev_adx = self.output.get_line(3).unwrap().borrow().get(-1);
                    ema_step(prev_adx, dx, self.alpha)
                };
                self.output.get_line(3).unwrap().borrow_mut().set(0, adx).unwrap();
            }
        }
    }

    fn step_abs(&mut self, i: usize) {
        let len = i + 1;
        let raw_len = len.saturating_sub(1);
        let tr_seed: Vec<f64> = if raw_len == self.period {
            (i + 1 - self.period..=i).map(|k| self.tr_abs(k)).collect()
        } else {
            Vec::new()
        };
        let plus_seed: Vec<f64> = if raw_len == self.period {
            (i + 1 - self.period..=i).map(|k| self.plus_dm_abs(k)).collect()
        } else {
            Vec::new()
        };
        let minus_seed: Vec<f64> = if raw_len == self.period {
            (i + 1 - self.period..=i).map(|k| self.minus_dm_abs(k)).collect()
        } else {
            Vec::new()
        };
        let tr_now = if raw_len >= 1 { self.tr_abs(i) } else { 0.0 };
        let plus_now = if raw_len >= 1 { self.plus_dm_abs(i) } else { 0.0 };
        let minus_now = if raw_len >= 1 { self.minus_dm_abs(i) } else { 0.0 };
        Self::smma_advance_abs(&self.tr_smma, i, raw_len, self.period, self.alpha, tr_now, &tr_seed);
        Self::smma_advance_abs(&self.plus_dm_smma, i, raw_len, self.period, self.alpha, plus_now, &plus_seed);
        Self::smma_advance_abs(&self.minus_dm_smma, i, raw_len, self.period, self.alpha, minus_now, &minus_seed);

        if raw_len >= self.period {
            let tr = self.tr_smma.borrow().get_abs(i);
            let plus_di = 100.0 * self.plus_dm_smma.borrow().get_abs(i) / tr;
            let minus_di = 100.0 * self.minus_dm_smma.borrow().get_abs(i) / tr;
            let di_sum = plus_di + minus_di;
            let dx = if di_sum == 0.0 { 0.0 } else { 100.0 * (plus_di - minus_di).abs() / di_sum };
            self.output.get_line(0).unwrap().borrow_mut().set_abs(i, plus_di);
            self.output.get_line(1).unwrap().borrow_mut().set_abs(i, minus_di);
            self.output.get_line(2).unwrap().borrow_mut().set_abs(i, dx);

            let dx_len = raw_len - self.period + 1;
            if dx_len > self.period {
                let adx = if dx_len == self.period + 1 {
                    let window: Vec<f64> = (i + 1 - self.period..=i)
                        .map(|k| self.output.get_line(2).unwrap().borrow().get_abs(k))
                        .collect();
                    mean(&window)
                } else {
                    let prev_adx = self.output.get_line(3).unwrap().borrow().get_abs(i - 1);
                    ema_step(prev_adx, dx, self.alpha)
                };
                self.output.get_line(3).unwrap().borrow_mut().set_abs(i, adx);
            }
        }
    }
}

impl Indicator for Dm {
    fn minperiod(&self) -> usize {
        2 * self.period + 1
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
