//! Incremental indicators.
//!
//! Every indicator is attached to one named feed and consumes exactly one bar
//! each time that feed emits, appending one value to each of its [`Line`]s.
//! Nothing is ever recomputed over history.

pub mod ema;
pub mod macd;
pub mod sma;

pub use ema::{Ema, EmaState};
pub use macd::Macd;
pub use sma::Sma;

use crate::data::series::OutOfRange;
use crate::data::Bar;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum IndicatorError {
    //the value exists in principle but the warm-up window has not completed
    #[error("{line} has no value at offset {offset} yet ({valid} valid values)")]
    InsufficientHistory {
        line: String,
        offset: isize,
        valid: usize,
    },
    #[error(transparent)]
    OutOfRange(#[from] OutOfRange),
}

//contract for an indicator fed bar by bar
pub trait Indicator: Send {
    fn name(&self) -> &str;

    //number of source bars before the last line produces its first value
    fn min_period(&self) -> usize;

    //consumes the newest bar of the source feed
    fn update(&mut self, bar: &Bar);

    fn lines(&self) -> &[Line];
}

//one derived value per source bar; warm-up slots hold no value
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    name: String,
    values: Vec<f64>,
    first_valid: Option<usize>,
}

impl Line {
    pub fn new(name: impl Into<String>) -> Self {
        Line {
            name: name.into(),
            values: Vec::new(),
            first_valid: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    //appends the value for the newest source bar, `None` while warming up
    pub fn push(&mut self, value: Option<f64>) {
        match value {
            Some(v) => {
                if self.first_valid.is_none() {
                    self.first_valid = Some(self.values.len());
                }
                self.values.push(v);
            }
            None => self.values.push(f64::NAN),
        }
    }

    //value at a backward offset (0 = latest)
    pub fn at(&self, offset: isize) -> Result<f64, IndicatorError> {
        if offset > 0 {
            return Err(OutOfRange {
                offset,
                available: self.values.len(),
            }
            .into());
        }

        let target = (self.values.len() as isize)
            .checked_sub(1)
            .and_then(|last| last.checked_add(offset));
        match (self.first_valid, target) {
            (Some(first), Some(target)) if target >= first as isize => {
                Ok(self.values[target as usize])
            }
            _ => Err(IndicatorError::InsufficientHistory {
                line: self.name.clone(),
                offset,
                valid: self.valid_len(),
            }),
        }
    }

    //number of source bars consumed, including warm-up
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    //number of readable values
    pub fn valid_len(&self) -> usize {
        self.first_valid
            .map_or(0, |first| self.values.len() - first)
    }
}

#[cfg(test)]
pub(crate) fn make_bars(closes: &[f64]) -> Vec<Bar> {
    use chrono::{Duration, TimeZone, Utc};
    let start = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Bar::new(
                start + Duration::days(i as i64),
                open,
                open.max(close) + 1.0,
                open.min(close) - 1.0,
                close,
                1000.0,
            )
            .unwrap()
        })
        .collect()
}

#[cfg(test)]
pub(crate) fn assert_approx(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warm_up_slots_are_insufficient_history() {
        let mut line = Line::new("sma_2");
        line.push(None);
        line.push(Some(1.5));
        line.push(Some(2.5));

        assert_eq!(line.len(), 3);
        assert_eq!(line.valid_len(), 2);
        assert_eq!(line.at(0).unwrap(), 2.5);
        assert_eq!(line.at(-1).unwrap(), 1.5);
        assert!(matches!(
            line.at(-2),
            Err(IndicatorError::InsufficientHistory { valid: 2, .. })
        ));
        assert!(matches!(
            line.at(-10),
            Err(IndicatorError::InsufficientHistory { .. })
        ));
    }

    #[test]
    fn lookahead_is_out_of_range() {
        let mut line = Line::new("x");
        line.push(Some(1.0));
        assert!(matches!(line.at(1), Err(IndicatorError::OutOfRange(_))));
    }

    #[test]
    fn empty_line_has_no_value() {
        let line = Line::new("x");
        assert!(matches!(
            line.at(0),
            Err(IndicatorError::InsufficientHistory { valid: 0, .. })
        ));
    }

    #[test]
    fn extreme_backward_offset_is_insufficient_history() {
        assert!(matches!(
            Line::new("x").at(isize::MIN),
            Err(IndicatorError::InsufficientHistory { valid: 0, .. })
        ));

        let mut line = Line::new("x");
        line.push(Some(1.0));
        assert!(matches!(
            line.at(isize::MIN),
            Err(IndicatorError::InsufficientHistory { valid: 1, .. })
        ));
    }
}
