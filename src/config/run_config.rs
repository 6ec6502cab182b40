use crate::data::timeframe::{TimeFrame, TimeFrameError};
use crate::engine::execution::{CommissionScheme, FillPrice};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Starting cash must be positive and finite, got {0}")]
    StartingCash(f64),
    #[error("Commission rate must be non-negative and finite, got {0}")]
    CommissionRate(f64),
    #[error("Commission multiplier must be positive and finite, got {0}")]
    Multiplier(f64),
    #[error("Feed name must not be empty")]
    EmptyFeedName,
    #[error("Duplicate feed name '{0}'")]
    DuplicateFeed(String),
    #[error("Feed '{name}' ({timeframe}) is not coarser than the primary timeframe {primary}")]
    NotCoarser {
        name: String,
        timeframe: TimeFrame,
        primary: TimeFrame,
    },
    #[error("Invalid timeframe for feed '{name}': {source}")]
    TimeFrame {
        name: String,
        #[source]
        source: TimeFrameError,
    },
    #[error("Invalid indicator parameters for {indicator}: {message}")]
    Indicator {
        indicator: String,
        message: String,
    },
}

//the feed bars are read into
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedConfig {
    pub name: String,
    pub timeframe: TimeFrame,
}

//a coarser feed derived from the primary one
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResampleRule {
    pub name: String,
    pub timeframe: TimeFrame,
}

impl ResampleRule {
    pub fn new(name: impl Into<String>, timeframe: TimeFrame) -> Self {
        ResampleRule {
            name: name.into(),
            timeframe,
        }
    }
}

//static configuration of one simulation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub starting_cash: f64,
    pub commission: CommissionScheme,
    pub fill_price: FillPrice,
    pub primary: FeedConfig,
    pub resample: Vec<ResampleRule>,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            starting_cash: 10_000.0,
            commission: CommissionScheme::default(),
            fill_price: FillPrice::Open,
            primary: FeedConfig {
                name: "base".to_string(),
                timeframe: TimeFrame::minutes(60),
            },
            resample: Vec::new(),
        }
    }
}

impl RunConfig {
    //adds a resampled feed (builder style)
    pub fn with_resample(mut self, name: impl Into<String>, timeframe: TimeFrame) -> Self {
        self.resample.push(ResampleRule::new(name, timeframe));
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.starting_cash.is_finite() && self.starting_cash > 0.0) {
            return Err(ConfigError::StartingCash(self.starting_cash));
        }

        let rate = self.commission.rate;
        if !(rate.is_finite() && rate >= 0.0) {
            return Err(ConfigError::CommissionRate(rate));
        }

        let multiplier = self.commission.multiplier;
        if !(multiplier.is_finite() && multiplier > 0.0) {
            return Err(ConfigError::Multiplier(multiplier));
        }

        let primary = &self.primary;
        validate_feed(&primary.name, &primary.timeframe)?;

        let mut names = HashSet::new();
        names.insert(primary.name.as_str());

        for rule in &self.resample {
            validate_feed(&rule.name, &rule.timeframe)?;

            if !names.insert(rule.name.as_str()) {
                return Err(ConfigError::DuplicateFeed(rule.name.clone()));
            }

            if rule.timeframe.nominal_minutes() <= primary.timeframe.nominal_minutes() {
                return Err(ConfigError::NotCoarser {
                    name: rule.name.clone(),
                    timeframe: rule.timeframe,
                    primary: primary.timeframe,
                });
            }
        }

        Ok(())
    }
}

fn validate_feed(name: &str, timeframe: &TimeFrame) -> Result<(), ConfigError> {
    if name.trim().is_empty() {
        return Err(ConfigError::EmptyFeedName);
    }

    timeframe.validate().map_err(|source| ConfigError::TimeFrame {
        name: name.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert!(RunConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_bad_money_settings() {
        let mut config = RunConfig {
            starting_cash: 0.0,
            ..RunConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::StartingCash(0.0)));

        config.starting_cash = 100.0;
        config.commission.rate = -0.1;
        assert!(matches!(config.validate(), Err(ConfigError::CommissionRate(_))));

        config.commission.rate = 0.0;
        config.commission.multiplier = 0.0;
        assert!(matches!(config.validate(), Err(ConfigError::Multiplier(_))));
    }

    #[test]
    fn rejects_duplicate_and_finer_feeds() {
        let config = RunConfig::default()
            .with_resample("daily", TimeFrame::days(1))
            .with_resample("daily", TimeFrame::weeks(1));
        assert_eq!(
            config.validate(),
            Err(ConfigError::DuplicateFeed("daily".into()))
        );

        let config = RunConfig::default().with_resample("fast", TimeFrame::minutes(15));
        assert!(matches!(config.validate(), Err(ConfigError::NotCoarser { .. })));

        let config = RunConfig::default().with_resample("base", TimeFrame::days(1));
        assert!(matches!(config.validate(), Err(ConfigError::DuplicateFeed(_))));
    }

    #[test]
    fn rejects_zero_compression() {
        let config = RunConfig::default().with_resample(
            "daily",
            TimeFrame {
                unit: crate::data::TimeFrameUnit::Day,
                compression: 0,
            },
        );
        assert!(matches!(config.validate(), Err(ConfigError::TimeFrame { .. })));
    }
}
