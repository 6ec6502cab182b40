//! Simple moving average of close prices.
//!
//! Keeps a running sum over a window of the last `period` closes, so each new
//! bar costs O(1). First value at index `period - 1`.

use crate::data::Bar;
use crate::indicators::{Indicator, Line};
use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
    name: String,
    window: VecDeque<f64>,
    sum: f64,
    lines: [Line; 1],
}

impl Sma {
    //period must be >= 1, checked when the indicator is registered
    pub fn new(period: usize) -> Self {
        let name = format!("sma_{period}");
        Sma {
            period,
            window: VecDeque::with_capacity(period),
            sum: 0.0,
            lines: [Line::new(name.clone())],
            name,
        }
    }

    pub fn period(&self) -> usize {
        self.period
    }

    pub fn line(&self) -> &Line {
        &self.lines[0]
    }

    //slides the window and returns the new mean once it is full
    pub fn next_value(&mut self, value: f64) -> Option<f64> {
        self.window.push_back(value);
        self.sum += value;

        if self.window.len() > self.period {
            if let Some(leaving) = self.window.pop_front() {
                self.sum -= leaving;
            }
        }

        (self.window.len() == self.period).then(|| self.sum / self.period as f64)
    }
}

impl Indicator for Sma {
    fn name(&self) -> &str {
        &self.name
    }

    fn min_period(&self) -> usize {
        self.period
    }

    fn update(&mut self, bar: &Bar) {
        let value = self.next_value(bar.close);
        self.lines[0].push(value);
    }

    fn lines(&self) -> &[Line] {
        &self.lines
    }
}
