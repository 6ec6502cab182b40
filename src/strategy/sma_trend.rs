use crate::engine::execution::{Order, OrderStatus};
use crate::error::BacktestError;
use crate::portfolio::Trade;
use crate::strategy::exit::{ExitConfig, ExitRule, ExitView, Trend};
use crate::strategy::sizing::{BetSizer, BetSizing, TradeStats};
use crate::strategy::{Flow, LineRef, Setup, Strategy, StrategyContext};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

//sma trend strategy parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmaTrendParams {
    //feed the sma is computed on
    pub feed: String,
    pub period: usize,
    //distance in bars between compared sma points
    pub step: usize,
    //number of comparisons that must agree
    pub steps: usize,
    pub exit: ExitConfig,
    pub sizing: BetSizing,
}

impl Default for SmaTrendParams {
    fn default() -> Self {
        SmaTrendParams {
            feed: "daily".to_string(),
            period: 100,
            step: 10,
            steps: 3,
            exit: ExitConfig::TrendReversal,
            sizing: BetSizing::default(),
        }
    }
}

//sma slope strategy
//trend is up when sma[0] > sma[-step] > sma[-2*step] > ... and down when the
//chain is strictly falling; enters in the trend direction when flat
#[derive(Debug)]
pub struct SmaTrendStrategy {
    params: SmaTrendParams,
    exit: Box<dyn ExitRule>,
    sizer: BetSizer,

    //state
    sma: Option<LineRef>,
    halted: bool,
}

impl SmaTrendStrategy {
    pub fn new(params: SmaTrendParams) -> Self {
        SmaTrendStrategy {
            exit: params.exit.build(),
            sizer: BetSizer::new(params.sizing.clone()),
            params,
            sma: None,
            halted: false,
        }
    }

    pub fn stats(&self) -> TradeStats {
        self.sizer.stats()
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    //reads the sma chain; insufficient history propagates and skips the tick
    fn trend(&self, context: &StrategyContext<'_>, sma: LineRef) -> Result<Option<Trend>, BacktestError> {
        let step = self.params.step.max(1) as isize;
        let mut points = Vec::with_capacity(self.params.steps + 1);
        for i in 0..=self.params.steps as isize {
            points.push(context.value(sma, -i * step)?);
        }

        let rising = points.windows(2).all(|w| w[0] > w[1]);
        let falling = points.windows(2).all(|w| w[0] < w[1]);

        Ok(match (rising, falling) {
            (true, false) => Some(Trend::Up),
            (false, true) => Some(Trend::Down),
            _ => None,
        })
    }
}

impl Strategy for SmaTrendStrategy {
    fn name(&self) -> &str {
        "SMA Trend"
    }

    fn on_init(&mut self, setup: &mut Setup<'_>) -> Result<(), BacktestError> {
        self.sma = Some(setup.sma(&self.params.feed, self.params.period)?);
        self.halted = false;
        Ok(())
    }

    fn on_bar(&mut self, context: &mut StrategyContext<'_>) -> Result<Flow, BacktestError> {
        if self.halted {
            return Ok(Flow::Stop);
        }

        let Some(sma) = self.sma else {
            return Ok(Flow::Continue);
        };
        let trend = self.trend(context, sma)?;

        if context.pending_order().is_some() {
            return Ok(Flow::Continue);
        }

        let position = context.position();
        if position.is_flat() {
            let size = self.sizer.size();
            let submitted = match trend {
                Some(Trend::Up) => context.buy(size),
                Some(Trend::Down) => context.sell(size),
                None => None,
            };
            if submitted.is_some() {
                self.sizer.record_entry();
            }
        } else {
            let view = ExitView {
                long: position.is_long(),
                entry_price: position.avg_price,
                close: context.data().close(0)?,
                trend,
            };
            if self.exit.should_exit(&view) {
                context.close();
            }
        }

        Ok(Flow::Continue)
    }

    fn on_order(&mut self, _context: &mut StrategyContext<'_>, order: &Order) {
        match order.status {
            OrderStatus::Completed => {
                if let Some(executed) = order.executed {
                    let action = if order.is_buy() { "buy" } else { "sell" };
                    info!(
                        price = executed.price,
                        cost = executed.value,
                        commission = executed.commission,
                        "{} executed", action
                    );
                }
            }
            OrderStatus::Canceled | OrderStatus::MarginRejected => {
                warn!(order = order.id, status = ?order.status, "order not filled, halting");
                self.halted = true;
            }
            OrderStatus::Submitted | OrderStatus::Accepted => {}
        }
    }

    fn on_trade(&mut self, _context: &mut StrategyContext<'_>, trade: &Trade) {
        if !trade.is_closed() {
            return;
        }

        self.sizer.record_close(trade);
        info!(gross = trade.pnl, net = trade.pnl_net, "trade closed");
    }

    fn on_stop(&mut self, _context: &mut StrategyContext<'_>) -> Result<(), BacktestError> {
        let stats = self.sizer.stats();
        info!(
            entries = stats.entries,
            wins = stats.wins,
            losses = stats.losses,
            longest_loss_streak = stats.longest_loss_streak,
            "strategy finished"
        );
        Ok(())
    }
}
