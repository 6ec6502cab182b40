use crate::config::ConfigError;
use crate::data::{DataError, OutOfRange};
use crate::engine::SimState;
use crate::indicators::IndicatorError;
use crate::strategy::LineRef;
use thiserror::Error;

//errors surfaced by a simulation run
//data and out-of-range errors abort the run; insufficient history returned
//from a strategy callback only skips the current tick
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BacktestError {
    #[error("Data error: {0}")]
    Data(#[from] DataError),

    #[error("Lookback error: {0}")]
    OutOfRange(#[from] OutOfRange),

    #[error(transparent)]
    Indicator(IndicatorError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Unknown feed '{0}'")]
    UnknownFeed(String),

    #[error("Unknown indicator line {0:?}")]
    UnknownLine(LineRef),

    #[error("Simulator already ran (state {0:?})")]
    AlreadyRan(SimState),
}

impl BacktestError {
    //true for errors a strategy may hit while indicators warm up
    pub fn is_insufficient_history(&self) -> bool {
        matches!(
            self,
            BacktestError::Indicator(IndicatorError::InsufficientHistory { .. })
        )
    }
}

impl From<IndicatorError> for BacktestError {
    fn from(err: IndicatorError) -> Self {
        match err {
            IndicatorError::OutOfRange(range) => BacktestError::OutOfRange(range),
            other => BacktestError::Indicator(other),
        }
    }
}
