pub mod backtest_config;
pub mod run_config;

pub use backtest_config::{BacktestConfiguration, StrategyConfig};
pub use run_config::{ConfigError, FeedConfig, ResampleRule, RunConfig};
