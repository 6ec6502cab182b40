use crate::error::BacktestError;
use crate::strategy::{Flow, LineRef, Setup, Strategy, StrategyContext};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriceCrossParams {
    //feed the sma is computed on, the primary feed when unset
    pub feed: Option<String>,
    pub period: usize,
    pub size: u64,
}

impl Default for PriceCrossParams {
    fn default() -> Self {
        PriceCrossParams {
            feed: None,
            period: 15,
            size: 1,
        }
    }
}

//long only: buy when the close is above the sma, close when it drops below
#[derive(Debug)]
pub struct PriceCrossStrategy {
    params: PriceCrossParams,
    sma: Option<LineRef>,
}

impl PriceCrossStrategy {
    pub fn new(params: PriceCrossParams) -> Self {
        PriceCrossStrategy { params, sma: None }
    }
}

impl Strategy for PriceCrossStrategy {
    fn name(&self) -> &str {
        "Price Cross"
    }

    fn on_init(&mut self, setup: &mut Setup<'_>) -> Result<(), BacktestError> {
        let feed = match &self.params.feed {
            Some(feed) => feed.clone(),
            None => setup.primary_feed().to_string(),
        };
        self.sma = Some(setup.sma(&feed, self.params.period)?);
        Ok(())
    }

    fn on_bar(&mut self, context: &mut StrategyContext<'_>) -> Result<Flow, BacktestError> {
        let Some(sma_line) = self.sma else {
            return Ok(Flow::Continue);
        };

        let sma = context.value(sma_line, 0)?;
        let close = context.data().close(0)?;

        if context.pending_order().is_some() {
            return Ok(Flow::Continue);
        }

        let position = context.position();
        if position.is_flat() {
            if close > sma {
                debug!(close, sma, "buy create");
                context.buy(self.params.size);
            }
        } else if position.is_long() && close < sma {
            debug!(close, sma, "sell create");
            context.close();
        }

        Ok(Flow::Continue)
    }
}
