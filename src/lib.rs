//a bar-driven, multi-timeframe backtest simulator

pub mod config;
pub mod data;
pub mod engine;
pub mod error;
pub mod indicators;
pub mod metrics;
pub mod portfolio;
pub mod strategy;

//prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{
        BacktestConfiguration, ConfigError, FeedConfig, ResampleRule, RunConfig, StrategyConfig,
    };
    pub use crate::data::{
        load_csv, Bar, BarSeries, CsvFormat, DataError, OutOfRange, Resampler, TimeFrame,
        TimeFrameUnit,
    };
    pub use crate::engine::{
        Broker, CommissionScheme, FillPrice, Notification, Order, OrderKind, OrderSide,
        OrderStatus, RunResult, SimState, Simulator,
    };
    pub use crate::error::BacktestError;
    pub use crate::indicators::{Ema, Indicator, IndicatorError, Line, Macd, Sma};
    pub use crate::metrics::{write_trades_csv, RunSummary};
    pub use crate::portfolio::{Position, Trade, TradeStatus};
    pub use crate::strategy::{
        exit::{ExitConfig, ExitRule, ExitView, Trend},
        macd_trend::{MacdTrendParams, MacdTrendStrategy},
        price_cross::{PriceCrossParams, PriceCrossStrategy},
        sizing::{BetSizer, BetSizing, TradeStats},
        sma_trend::{SmaTrendParams, SmaTrendStrategy},
        Flow, IndicatorRef, LineRef, MacdLines, Setup, Strategy, StrategyContext,
    };
}
