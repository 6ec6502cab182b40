//! Moving average convergence/divergence.
//!
//! Lines, in order: `macd` (fast EMA - slow EMA of close), `signal`
//! (EMA of macd) and `histogram` (macd - signal). The signal EMA only starts
//! seeding once macd has a value.

use crate::data::Bar;
use crate::indicators::ema::EmaState;
use crate::indicators::{Indicator, Line};

pub const MACD_LINE: usize = 0;
pub const SIGNAL_LINE: usize = 1;
pub const HISTOGRAM_LINE: usize = 2;

#[derive(Debug, Clone)]
pub struct Macd {
    name: String,
    fast: EmaState,
    slow: EmaState,
    signal: EmaState,
    lines: [Line; 3],
}

impl Macd {
    pub fn new(fast: usize, slow: usize, signal: usize) -> Self {
        Macd {
            name: format!("macd_{fast}_{slow}_{signal}"),
            fast: EmaState::new(fast),
            slow: EmaState::new(slow),
            signal: EmaState::new(signal),
            lines: [
                Line::new("macd"),
                Line::new("signal"),
                Line::new("histogram"),
            ],
        }
    }

    pub fn macd(&self) -> &Line {
        &self.lines[MACD_LINE]
    }

    pub fn signal(&self) -> &Line {
        &self.lines[SIGNAL_LINE]
    }

    pub fn histogram(&self) -> &Line {
        &self.lines[HISTOGRAM_LINE]
    }
}

impl Default for Macd {
    fn default() -> Self {
        Macd::new(12, 26, 9)
    }
}

impl Indicator for Macd {
    fn name(&self) -> &str {
        &self.name
    }

    fn min_period(&self) -> usize {
        self.slow.span().max(self.fast.span()) + self.signal.span() - 1
    }

    fn update(&mut self, bar: &Bar) {
        let fast = self.fast.next_value(bar.close);
        let slow = self.slow.next_value(bar.close);

        let macd = fast.zip(slow).map(|(f, s)| f - s);
        let signal = macd.and_then(|m| self.signal.next_value(m));
        let histogram = macd.zip(signal).map(|(m, s)| m - s);

        self.lines[MACD_LINE].push(macd);
        self.lines[SIGNAL_LINE].push(signal);
        self.lines[HISTOGRAM_LINE].push(histogram);
    }

    fn lines(&self) -> &[Line] {
        &self.lines
    }
}
