use crate::engine::execution::{Order, OrderStatus};
use crate::error::BacktestError;
use crate::portfolio::Trade;
use crate::strategy::exit::{ExitConfig, ExitRule, ExitView, Trend};
use crate::strategy::sizing::{BetSizer, BetSizing, TradeStats};
use crate::strategy::{Flow, LineRef, Setup, Strategy, StrategyContext};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

//macd trend strategy parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MacdTrendParams {
    pub daily_feed: String,
    pub weekly_feed: String,
    pub monthly_feed: String,
    pub fast: usize,
    pub slow: usize,
    pub signal: usize,
    pub exit: ExitConfig,
    pub sizing: BetSizing,
}

impl Default for MacdTrendParams {
    fn default() -> Self {
        MacdTrendParams {
            daily_feed: "daily".to_string(),
            weekly_feed: "weekly".to_string(),
            monthly_feed: "monthly".to_string(),
            fast: 12,
            slow: 26,
            signal: 9,
            exit: ExitConfig::TrendReversal,
            sizing: BetSizing {
                starting_size: 1700,
                step_after_win: 18,
                double_on_loss: true,
            },
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct MacdHandles {
    daily: LineRef,
    weekly: LineRef,
    monthly: LineRef,
}

//multi-timeframe macd agreement
//the bias flips long when monthly and weekly macd are positive and rising and
//daily macd is positive, and flips short on the mirror condition; otherwise
//the previous bias is kept. a flat book always enters in the bias direction
#[derive(Debug)]
pub struct MacdTrendStrategy {
    params: MacdTrendParams,
    exit: Box<dyn ExitRule>,
    sizer: BetSizer,

    //state
    handles: Option<MacdHandles>,
    bias: Trend,
    halted: bool,
}

impl MacdTrendStrategy {
    pub fn new(params: MacdTrendParams) -> Self {
        MacdTrendStrategy {
            exit: params.exit.build(),
            sizer: BetSizer::new(params.sizing.clone()),
            params,
            handles: None,
            bias: Trend::Up,
            halted: false,
        }
    }

    pub fn stats(&self) -> TradeStats {
        self.sizer.stats()
    }

    pub fn bias(&self) -> Trend {
        self.bias
    }

    //this bar's signal, none when the timeframes disagree
    fn signal(
        &self,
        context: &StrategyContext<'_>,
        handles: MacdHandles,
    ) -> Result<Option<Trend>, BacktestError> {
        let monthly = context.value(handles.monthly, 0)?;
        let monthly_prev = context.value(handles.monthly, -1)?;
        let weekly = context.value(handles.weekly, 0)?;
        let weekly_prev = context.value(handles.weekly, -1)?;
        let daily = context.value(handles.daily, 0)?;

        debug!(daily, weekly, monthly, "macd");

        if monthly > 0.0 && monthly > monthly_prev && weekly > 0.0 && weekly > weekly_prev && daily > 0.0
        {
            Ok(Some(Trend::Up))
        } else if monthly < 0.0
            && monthly < monthly_prev
            && weekly < 0.0
            && weekly < weekly_prev
            && daily < 0.0
        {
            Ok(Some(Trend::Down))
        } else {
            Ok(None)
        }
    }
}

impl Strategy for MacdTrendStrategy {
    fn name(&self) -> &str {
        "MACD Trend"
    }

    fn on_init(&mut self, setup: &mut Setup<'_>) -> Result<(), BacktestError> {
        let p = &self.params;
        let daily = setup.macd(&p.daily_feed, p.fast, p.slow, p.signal)?;
        let weekly = setup.macd(&p.weekly_feed, p.fast, p.slow, p.signal)?;
        let monthly = setup.macd(&p.monthly_feed, p.fast, p.slow, p.signal)?;

        self.handles = Some(MacdHandles {
            daily: daily.macd,
            weekly: weekly.macd,
            monthly: monthly.macd,
        });
        self.bias = Trend::Up;
        self.halted = false;
        Ok(())
    }

    fn on_bar(&mut self, context: &mut StrategyContext<'_>) -> Result<Flow, BacktestError> {
        if self.halted {
            return Ok(Flow::Stop);
        }

        let Some(handles) = self.handles else {
            return Ok(Flow::Continue);
        };

        let signal = self.signal(context, handles)?;
        if let Some(trend) = signal {
            self.bias = trend;
        }

        if context.pending_order().is_some() {
            return Ok(Flow::Continue);
        }

        let position = context.position();
        if position.is_flat() {
            let size = self.sizer.size();
            let submitted = if self.bias.is_up() {
                context.buy(size)
            } else {
                context.sell(size)
            };
            if submitted.is_some() {
                self.sizer.record_entry();
            }
        } else {
            let view = ExitView {
                long: position.is_long(),
                entry_price: position.avg_price,
                close: context.data().close(0)?,
                trend: signal,
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
        info!(
            gross = trade.pnl,
            net = trade.pnl_net,
            next_size = self.sizer.size(),
            "trade closed"
        );
    }

    fn on_stop(&mut self, _context: &mut StrategyContext<'_>) -> Result<(), BacktestError> {
        let stats = self.sizer.stats();
        info!(
            entries = stats.entries,
            wins = stats.wins,
            losses = stats.losses,
            win_rate = stats.win_rate().unwrap_or(0.0),
            longest_loss_streak = stats.longest_loss_streak,
            "strategy finished"
        );
        Ok(())
    }
}
