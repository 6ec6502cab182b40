use crate::config::RunConfig;
use crate::data::Bar;
use crate::engine::broker::{Broker, Notification};
use crate::engine::execution::Order;
use crate::engine::feeds::Feeds;
use crate::engine::indicator_set::IndicatorSet;
use crate::error::BacktestError;
use crate::indicators::Line;
use crate::portfolio::{Position, Trade};
use crate::strategy::{Flow, LineRef, Setup, Strategy, StrategyContext};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

//notification callbacks may submit orders, which raise more notifications
const MAX_DISPATCH_ROUNDS: usize = 16;

//run lifecycle: idle -> running -> stopped | completed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimState {
    Idle,
    Running,
    Stopped,
    Completed,
}

//result of a run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunResult {
    pub state: SimState,
    //primary bars processed
    pub bars: usize,
    pub starting_cash: f64,
    pub final_cash: f64,
    pub final_value: f64,
    pub position: Position,
    //closed trades in closing order
    pub trades: Vec<Trade>,
    pub open_trade: Option<Trade>,
    pub orders: Vec<Order>,
}

//drives one strategy over one bar stream
pub struct Simulator {
    config: RunConfig,
    state: SimState,
    feeds: Feeds,
    indicators: IndicatorSet,
    broker: Broker,
    bars: usize,
}

impl Simulator {
    //validates the configuration and builds the feeds
    pub fn new(config: RunConfig) -> Result<Self, BacktestError> {
        config.validate()?;

        let broker = Broker::new(config.starting_cash, config.commission, config.fill_price);
        let feeds = Feeds::from_config(&config);

        Ok(Simulator {
            config,
            state: SimState::Idle,
            feeds,
            indicators: IndicatorSet::new(),
            broker,
            bars: 0,
        })
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn state(&self) -> SimState {
        self.state
    }

    pub fn feeds(&self) -> &Feeds {
        &self.feeds
    }

    pub fn broker(&self) -> &Broker {
        &self.broker
    }

    //inspects an indicator line after (or during) a run
    pub fn line(&self, line: LineRef) -> Option<&Line> {
        self.indicators.line(line)
    }

    //runs the strategy over the bars; a simulator runs once
    pub fn run<S, I>(&mut self, strategy: &mut S, bars: I) -> Result<RunResult, BacktestError>
    where
        S: Strategy + ?Sized,
        I: IntoIterator<Item = Bar>,
    {
        if self.state != SimState::Idle {
            return Err(BacktestError::AlreadyRan(self.state));
        }

        self.state = SimState::Running;
        info!(
            strategy = strategy.name(),
            feeds = self.feeds.len(),
            cash = self.config.starting_cash,
            "starting run"
        );

        match self.drive(strategy, bars) {
            Ok(state) => {
                self.state = state;
                info!(
                    state = ?state,
                    bars = self.bars,
                    value = self.broker.value(),
                    trades = self.broker.trades().len(),
                    "run finished"
                );
                Ok(self.result())
            }
            Err(err) => {
                //aborted runs never complete
                self.state = SimState::Stopped;
                warn!(bars = self.bars, error = %err, "run aborted");
                Err(err)
            }
        }
    }

    fn drive<S, I>(&mut self, strategy: &mut S, bars: I) -> Result<SimState, BacktestError>
    where
        S: Strategy + ?Sized,
        I: IntoIterator<Item = Bar>,
    {
        {
            let mut setup = Setup::new(&self.feeds, &mut self.indicators);
            strategy.on_init(&mut setup)?;
        }

        for bar in bars {
            if self.step(strategy, bar)? == Flow::Stop {
                info!(bars = self.bars, "strategy requested stop");
                self.finish(strategy, SimState::Stopped)?;
                return Ok(SimState::Stopped);
            }
        }

        self.finish(strategy, SimState::Completed)?;
        Ok(SimState::Completed)
    }

    //one primary bar through the whole pipeline
    fn step<S>(&mut self, strategy: &mut S, bar: Bar) -> Result<Flow, BacktestError>
    where
        S: Strategy + ?Sized,
    {
        bar.validate()?;

        let emitted = self.feeds.push_primary(bar.clone())?;
        self.bars += 1;

        //orders from the previous tick execute against this bar
        self.broker.process_bar(&bar);

        for (feed, emitted_bar) in &emitted {
            self.indicators.update(*feed, emitted_bar);
        }

        self.broker.update_market(&bar);
        self.dispatch(strategy);

        if !self.feeds.all_ready() {
            return Ok(Flow::Continue);
        }

        let outcome = {
            let mut context = StrategyContext::new(&self.feeds, &self.indicators, &mut self.broker);
            strategy.on_bar(&mut context)
        };

        let flow = match outcome {
            Ok(flow) => flow,
            Err(err) if err.is_insufficient_history() => {
                debug!(timestamp = %bar.timestamp, error = %err, "indicator warming up, tick skipped");
                Flow::Continue
            }
            Err(err) => return Err(err),
        };

        self.dispatch(strategy);
        Ok(flow)
    }

    //delivers queued order and trade notifications
    fn dispatch<S>(&mut self, strategy: &mut S)
    where
        S: Strategy + ?Sized,
    {
        for _ in 0..MAX_DISPATCH_ROUNDS {
            let notifications = self.broker.drain_notifications();
            if notifications.is_empty() {
                return;
            }

            let mut context = StrategyContext::new(&self.feeds, &self.indicators, &mut self.broker);
            for notification in &notifications {
                match notification {
                    Notification::Order(order) => strategy.on_order(&mut context, order),
                    Notification::Trade(trade) => strategy.on_trade(&mut context, trade),
                }
            }
        }

        warn!("notification rounds exhausted, dropping the rest");
        self.broker.drain_notifications();
    }

    fn finish<S>(&mut self, strategy: &mut S, state: SimState) -> Result<(), BacktestError>
    where
        S: Strategy + ?Sized,
    {
        if state == SimState::Completed {
            for (feed, partial) in self.feeds.flush()? {
                debug!(feed, timestamp = %partial.timestamp, "flushed partial bar");
                self.indicators.update(feed, &partial);
            }
        }

        self.broker.cancel_pending();
        self.dispatch(strategy);

        {
            let mut context = StrategyContext::new(&self.feeds, &self.indicators, &mut self.broker);
            strategy.on_stop(&mut context)?;
        }

        //nothing is left to fill against
        if let Some(id) = self.broker.cancel_pending() {
            debug!(order = id, "order submitted in on_stop canceled");
        }
        self.broker.drain_notifications();
        Ok(())
    }

    fn result(&self) -> RunResult {
        RunResult {
            state: self.state,
            bars: self.bars,
            starting_cash: self.broker.starting_cash(),
            final_cash: self.broker.cash(),
            final_value: self.broker.value(),
            position: self.broker.position(),
            trades: self.broker.trades().to_vec(),
            open_trade: self.broker.open_trade().cloned(),
            orders: self.broker.orders().to_vec(),
        }
    }
}
