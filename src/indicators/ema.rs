//! Exponential moving average.
//!
//! `ema[i] = ema[i-1] + k * (x[i] - ema[i-1])` with `k = 2 / (span + 1)`,
//! seeded with the simple average of the first `span` inputs.

use crate::data::Bar;
use crate::indicators::{Indicator, Line};

//the bare recurrence, shared with macd
#[derive(Debug, Clone)]
pub struct EmaState {
    span: usize,
    alpha: f64,
    seen: usize,
    seed_sum: f64,
    value: Option<f64>,
}

impl EmaState {
    pub fn new(span: usize) -> Self {
        EmaState {
            span,
            alpha: 2.0 / (span as f64 + 1.0),
            seen: 0,
            seed_sum: 0.0,
            value: None,
        }
    }

    pub fn span(&self) -> usize {
        self.span
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn value(&self) -> Option<f64> {
        self.value
    }

    pub fn next_value(&mut self, input: f64) -> Option<f64> {
        self.value = match self.value {
            Some(prev) => Some(prev + self.alpha * (input - prev)),
            None => {
                self.seen += 1;
                self.seed_sum += input;
                (self.seen == self.span).then(|| self.seed_sum / self.span as f64)
            }
        };
        self.value
    }
}

#[derive(Debug, Clone)]
pub struct Ema {
    name: String,
    state: EmaState,
    lines: [Line; 1],
}

impl Ema {
    pub fn new(span: usize) -> Self {
        let name = format!("ema_{span}");
        Ema {
            state: EmaState::new(span),
            lines: [Line::new(name.clone())],
            name,
        }
    }

    pub fn line(&self) -> &Line {
        &self.lines[0]
    }
}

impl Indicator for Ema {
    fn name(&self) -> &str {
        &self.name
    }

    fn min_period(&self) -> usize {
        self.state.span()
    }

    fn update(&mut self, bar: &Bar) {
        let value = self.state.next_value(bar.close);
        self.lines[0].push(value);
    }

    fn lines(&self) -> &[Line] {
        &self.lines
    }
}
