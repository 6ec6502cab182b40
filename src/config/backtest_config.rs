use crate::config::run_config::{FeedConfig, RunConfig};
use crate::data::{CsvFormat, TimeFrame};
use crate::engine::execution::CommissionScheme;
use crate::strategy::macd_trend::{MacdTrendParams, MacdTrendStrategy};
use crate::strategy::price_cross::{PriceCrossParams, PriceCrossStrategy};
use crate::strategy::sma_trend::{SmaTrendParams, SmaTrendStrategy};
use crate::strategy::Strategy;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

//strategy selection with its parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StrategyConfig {
    SmaTrend(SmaTrendParams),
    MacdTrend(MacdTrendParams),
    PriceCross(PriceCrossParams),
}

impl StrategyConfig {
    pub fn build(&self) -> Box<dyn Strategy> {
        match self {
            StrategyConfig::SmaTrend(params) => Box::new(SmaTrendStrategy::new(params.clone())),
            StrategyConfig::MacdTrend(params) => Box::new(MacdTrendStrategy::new(params.clone())),
            StrategyConfig::PriceCross(params) => Box::new(PriceCrossStrategy::new(params.clone())),
        }
    }
}

//complete backtest configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestConfiguration {
    //data
    pub data_path: PathBuf,
    #[serde(default)]
    pub csv: CsvFormat,

    //broker and feeds
    #[serde(default)]
    pub run: RunConfig,

    pub strategy: StrategyConfig,

    //optional output path
    #[serde(default)]
    pub output_trades_csv: Option<PathBuf>,
}

impl Default for BacktestConfiguration {
    //hourly eurusd with daily, weekly and monthly feeds, 100x multiplier
    fn default() -> Self {
        let run = RunConfig {
            starting_cash: 10_000.0,
            commission: CommissionScheme {
                rate: 0.0,
                multiplier: 100.0,
            },
            primary: FeedConfig {
                name: "hourly".to_string(),
                timeframe: TimeFrame::minutes(60),
            },
            ..RunConfig::default()
        }
        .with_resample("daily", TimeFrame::days(1))
        .with_resample("weekly", TimeFrame::weeks(1))
        .with_resample("monthly", TimeFrame::months(1));

        BacktestConfiguration {
            data_path: PathBuf::from("EURUSD_H1.csv"),
            csv: CsvFormat::default(),
            run,
            strategy: StrategyConfig::SmaTrend(SmaTrendParams::default()),
            output_trades_csv: None,
        }
    }
}

impl BacktestConfiguration {
    //load configuration from a JSON file
    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: BacktestConfiguration = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        config.run.validate()?;
        Ok(config)
    }

    //save configuration to a JSON file
    pub fn to_json_file(&self, path: &Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write config {}", path.display()))?;
        Ok(())
    }
}
