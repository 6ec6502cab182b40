use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

//malformed or out-of-order input; always fatal for a run
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DataError {
    #[error("Invalid OHLC values: high ({high}) < low ({low}) at {timestamp}")]
    InvalidHighLow {
        timestamp: DateTime<Utc>,
        high: f64,
        low: f64,
    },
    #[error("Invalid OHLC values: close ({close}) outside high-low range [{low}, {high}] at {timestamp}")]
    InvalidClose {
        timestamp: DateTime<Utc>,
        close: f64,
        high: f64,
        low: f64,
    },
    #[error("Invalid OHLC values: open ({open}) outside high-low range [{low}, {high}] at {timestamp}")]
    InvalidOpen {
        timestamp: DateTime<Utc>,
        open: f64,
        high: f64,
        low: f64,
    },
    #[error("Non-finite {field} value at {timestamp}")]
    NonFinite {
        timestamp: DateTime<Utc>,
        field: &'static str,
    },
    #[error("Negative volume: {volume} at {timestamp}")]
    NegativeVolume { timestamp: DateTime<Utc>, volume: f64 },
    #[error("Bar at {next} is not after the previous bar at {previous}")]
    OutOfOrder {
        previous: DateTime<Utc>,
        next: DateTime<Utc>,
    },
}

//represents a single ohlcv bar (candlestick) of market data
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    //creates a new Bar with validation
    pub fn new(
        timestamp: DateTime<Utc>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Result<Self, DataError> {
        let bar = Bar::new_unchecked(timestamp, open, high, low, close, volume);
        bar.validate()?;
        Ok(bar)
    }

    //creates a Bar without validation
    pub fn new_unchecked(
        timestamp: DateTime<Utc>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Self {
        Bar {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    //checks the ohlcv invariants of an already built bar
    pub fn validate(&self) -> Result<(), DataError> {
        let timestamp = self.timestamp;

        for (field, value) in [
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("close", self.close),
            ("volume", self.volume),
        ] {
            if !value.is_finite() {
                return Err(DataError::NonFinite { timestamp, field });
            }
        }

        //validate high >= low
        if self.high < self.low {
            return Err(DataError::InvalidHighLow {
                timestamp,
                high: self.high,
                low: self.low,
            });
        }

        //validate close within [low, high]
        if self.close < self.low || self.close > self.high {
            return Err(DataError::InvalidClose {
                timestamp,
                close: self.close,
                high: self.high,
                low: self.low,
            });
        }

        //validate open within [low, high]
        if self.open < self.low || self.open > self.high {
            return Err(DataError::InvalidOpen {
                timestamp,
                open: self.open,
                high: self.high,
                low: self.low,
            });
        }

        //validate non-negative volume
        if self.volume < 0.0 {
            return Err(DataError::NegativeVolume {
                timestamp,
                volume: self.volume,
            });
        }

        Ok(())
    }

    //folds a later bar of the same period into this one
    //open is kept, close and extremes follow the newer bar
    pub fn merge(&mut self, later: &Bar) {
        self.high = self.high.max(later.high);
        self.low = self.low.min(later.low);
        self.close = later.close;
        self.volume += later.volume;
    }
}
