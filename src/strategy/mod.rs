pub mod exit;
pub mod macd_trend;
pub mod price_cross;
pub mod sizing;
pub mod sma_trend;

use crate::config::ConfigError;
use crate::data::BarSeries;
use crate::engine::broker::Broker;
use crate::engine::execution::Order;
use crate::engine::feeds::Feeds;
use crate::engine::indicator_set::IndicatorSet;
use crate::error::BacktestError;
use crate::indicators::{Ema, Indicator, Line, Macd, Sma};
use crate::portfolio::{Position, Trade};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

//what the simulator should do after a bar callback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    //end the run now, skipping the remaining bars
    Stop,
}

//strategy interface that all strategies must implement
//state lives in the implementing struct; the simulator is the only caller
pub trait Strategy: Send {
    //returns the strategy name
    fn name(&self) -> &str;

    //called once before the first bar; register indicators here
    fn on_init(&mut self, _setup: &mut Setup<'_>) -> Result<(), BacktestError> {
        Ok(())
    }

    //called on each primary bar once every feed has a bar
    fn on_bar(&mut self, context: &mut StrategyContext<'_>) -> Result<Flow, BacktestError>;

    //called for every order status change
    fn on_order(&mut self, _context: &mut StrategyContext<'_>, _order: &Order) {}

    //called when a trade opens, changes size or closes
    fn on_trade(&mut self, _context: &mut StrategyContext<'_>, _trade: &Trade) {}

    //called once at the end of the run
    fn on_stop(&mut self, _context: &mut StrategyContext<'_>) -> Result<(), BacktestError> {
        Ok(())
    }
}

//handle to one line of a registered indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineRef {
    pub indicator: usize,
    pub line: usize,
}

//handle to a registered indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IndicatorRef {
    pub index: usize,
}

impl IndicatorRef {
    pub fn line(&self, line: usize) -> LineRef {
        LineRef {
            indicator: self.index,
            line,
        }
    }
}

//handles to the three macd lines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MacdLines {
    pub macd: LineRef,
    pub signal: LineRef,
    pub histogram: LineRef,
}

//registration context passed to on_init
pub struct Setup<'a> {
    feeds: &'a Feeds,
    indicators: &'a mut IndicatorSet,
}

impl<'a> Setup<'a> {
    pub(crate) fn new(feeds: &'a Feeds, indicators: &'a mut IndicatorSet) -> Self {
        Setup { feeds, indicators }
    }

    pub fn primary_feed(&self) -> &str {
        self.feeds.primary_name()
    }

    pub fn has_feed(&self, feed: &str) -> bool {
        self.feeds.index_of(feed).is_some()
    }

    //attaches any indicator to a named feed
    pub fn add(
        &mut self,
        feed: &str,
        indicator: Box<dyn Indicator>,
    ) -> Result<IndicatorRef, BacktestError> {
        let feed_index = self
            .feeds
            .index_of(feed)
            .ok_or_else(|| BacktestError::UnknownFeed(feed.to_string()))?;
        let index = self.indicators.add(feed_index, indicator);
        Ok(IndicatorRef { index })
    }

    pub fn sma(&mut self, feed: &str, period: usize) -> Result<LineRef, BacktestError> {
        if period == 0 {
            return Err(indicator_error("sma", "period must be at least 1"));
        }
        Ok(self.add(feed, Box::new(Sma::new(period)))?.line(0))
    }

    pub fn ema(&mut self, feed: &str, span: usize) -> Result<LineRef, BacktestError> {
        if span == 0 {
            return Err(indicator_error("ema", "span must be at least 1"));
        }
        Ok(self.add(feed, Box::new(Ema::new(span)))?.line(0))
    }

    pub fn macd(
        &mut self,
        feed: &str,
        fast: usize,
        slow: usize,
        signal: usize,
    ) -> Result<MacdLines, BacktestError> {
        if fast == 0 || slow == 0 || signal == 0 {
            return Err(indicator_error("macd", "spans must be at least 1"));
        }
        if fast >= slow {
            return Err(indicator_error(
                "macd",
                &format!("fast span {fast} must be shorter than slow span {slow}"),
            ));
        }

        let handle = self.add(feed, Box::new(Macd::new(fast, slow, signal)))?;
        Ok(MacdLines {
            macd: handle.line(0),
            signal: handle.line(1),
            histogram: handle.line(2),
        })
    }
}

fn indicator_error(indicator: &str, message: &str) -> BacktestError {
    ConfigError::Indicator {
        indicator: indicator.to_string(),
        message: message.to_string(),
    }
    .into()
}

//context providing access to market data, indicators and order submission
pub struct StrategyContext<'a> {
    feeds: &'a Feeds,
    indicators: &'a IndicatorSet,
    broker: &'a mut Broker,
}

impl<'a> StrategyContext<'a> {
    pub(crate) fn new(
        feeds: &'a Feeds,
        indicators: &'a IndicatorSet,
        broker: &'a mut Broker,
    ) -> Self {
        StrategyContext {
            feeds,
            indicators,
            broker,
        }
    }

    //timestamp of the latest primary bar
    pub fn now(&self) -> Option<DateTime<Utc>> {
        self.feeds.primary().last().map(|bar| bar.timestamp)
    }

    //the primary feed
    pub fn data(&self) -> &BarSeries {
        self.feeds.primary()
    }

    pub fn feed(&self, name: &str) -> Result<&BarSeries, BacktestError> {
        self.feeds
            .series(name)
            .ok_or_else(|| BacktestError::UnknownFeed(name.to_string()))
    }

    pub fn line(&self, line: LineRef) -> Result<&Line, BacktestError> {
        self.indicators
            .line(line)
            .ok_or(BacktestError::UnknownLine(line))
    }

    //indicator value at a backward offset
    pub fn value(&self, line: LineRef, offset: isize) -> Result<f64, BacktestError> {
        Ok(self.line(line)?.at(offset)?)
    }

    pub fn position(&self) -> Position {
        self.broker.position()
    }

    pub fn cash(&self) -> f64 {
        self.broker.cash()
    }

    pub fn portfolio_value(&self) -> f64 {
        self.broker.value()
    }

    pub fn pending_order(&self) -> Option<&Order> {
        self.broker.pending_order()
    }

    pub fn order(&self, id: u64) -> Option<&Order> {
        self.broker.order(id)
    }

    pub fn broker(&self) -> &Broker {
        &*self.broker
    }

    pub fn buy(&mut self, size: u64) -> Option<u64> {
        self.broker.buy(size)
    }

    pub fn sell(&mut self, size: u64) -> Option<u64> {
        self.broker.sell(size)
    }

    pub fn close(&mut self) -> Option<u64> {
        self.broker.close()
    }

    pub fn cancel(&mut self, id: u64) -> bool {
        self.broker.cancel(id)
    }
}
