use crate::portfolio::Trade;
use serde::{Deserialize, Serialize};

//bet sizing rules
//after a win the bet resets to the base size and the base grows by
//`step_after_win`; after a loss the bet optionally doubles
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BetSizing {
    pub starting_size: u64,
    pub step_after_win: u64,
    pub double_on_loss: bool,
}

impl Default for BetSizing {
    fn default() -> Self {
        BetSizing {
            starting_size: 1,
            step_after_win: 1,
            double_on_loss: false,
        }
    }
}

//entry and outcome counters kept by a strategy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TradeStats {
    pub entries: usize,
    pub wins: usize,
    pub losses: usize,
    pub loss_streak: usize,
    pub longest_loss_streak: usize,
}

impl TradeStats {
    //wins per entry, none before the first entry
    pub fn win_rate(&self) -> Option<f64> {
        (self.entries > 0).then(|| self.wins as f64 / self.entries as f64)
    }
}

#[derive(Debug, Clone)]
pub struct BetSizer {
    rules: BetSizing,
    base: u64,
    current: u64,
    stats: TradeStats,
}

impl BetSizer {
    pub fn new(rules: BetSizing) -> Self {
        BetSizer {
            base: rules.starting_size,
            current: rules.starting_size,
            rules,
            stats: TradeStats::default(),
        }
    }

    //size for the next entry
    pub fn size(&self) -> u64 {
        self.current
    }

    pub fn stats(&self) -> TradeStats {
        self.stats
    }

    pub fn record_entry(&mut self) {
        self.stats.entries += 1;
    }

    //updates sizing from a closed trade; open trades are ignored
    pub fn record_close(&mut self, trade: &Trade) {
        if !trade.is_closed() {
            return;
        }

        if trade.is_loss() {
            if self.rules.double_on_loss {
                self.current = self.current.saturating_mul(2);
            }
            self.stats.losses += 1;
            self.stats.loss_streak += 1;
            self.stats.longest_loss_streak =
                self.stats.longest_loss_streak.max(self.stats.loss_streak);
        } else {
            self.current = self.base;
            self.base = self.base.saturating_add(self.rules.step_after_win);
            self.stats.wins += 1;
            self.stats.loss_streak = 0;
        }
    }
}
