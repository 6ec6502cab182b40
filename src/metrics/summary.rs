use crate::engine::simulator::{RunResult, SimState};
use crate::portfolio::Trade;
use anyhow::Context;
use prettytable::{Cell, Row, Table};
use serde::{Deserialize, Serialize};
use std::path::Path;

//summary metrics for a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub state: SimState,
    pub bars: usize,
    pub starting_cash: f64,
    pub final_cash: f64,
    pub final_value: f64,
    pub net_profit: f64,
    pub num_trades: usize,
    pub num_winning_trades: usize,
    pub num_losing_trades: usize,
    pub win_rate: f64,
    pub longest_losing_streak: usize,
    pub total_commission: f64,
}

impl RunSummary {
    //calculate summary metrics from the closed trades of a run
    pub fn from_result(result: &RunResult) -> Self {
        let trades = &result.trades;

        //break-even trades count as winners
        let num_losing = trades.iter().filter(|t| t.is_loss()).count();
        let num_winning = trades.len() - num_losing;
        let win_rate = if trades.is_empty() {
            0.0
        } else {
            num_winning as f64 / trades.len() as f64
        };

        //commission paid by the still open trade counts too
        let total_commission = trades
            .iter()
            .chain(result.open_trade.iter())
            .map(|t| t.commission)
            .sum();

        RunSummary {
            state: result.state,
            bars: result.bars,
            starting_cash: result.starting_cash,
            final_cash: result.final_cash,
            final_value: result.final_value,
            net_profit: result.final_value - result.starting_cash,
            num_trades: trades.len(),
            num_winning_trades: num_winning,
            num_losing_trades: num_losing,
            win_rate,
            longest_losing_streak: longest_losing_streak(trades),
            total_commission,
        }
    }

    //prints metrics in a formatted table
    pub fn pretty_print_table(&self) {
        let mut table = Table::new();

        table.add_row(Row::new(vec![Cell::new("Metric"), Cell::new("Value")]));

        table.add_row(Row::new(vec![
            Cell::new("Run State"),
            Cell::new(&format!("{:?}", self.state)),
        ]));

        table.add_row(Row::new(vec![
            Cell::new("Bars"),
            Cell::new(&format!("{}", self.bars)),
        ]));

        table.add_row(Row::new(vec![
            Cell::new("Starting Cash"),
            Cell::new(&format!("{:.2}", self.starting_cash)),
        ]));

        table.add_row(Row::new(vec![
            Cell::new("Final Cash"),
            Cell::new(&format!("{:.2}", self.final_cash)),
        ]));

        table.add_row(Row::new(vec![
            Cell::new("Final Value"),
            Cell::new(&format!("{:.2}", self.final_value)),
        ]));

        table.add_row(Row::new(vec![
            Cell::new("Net Profit"),
            Cell::new(&format!(
                "{:.2} ({:.2}%)",
                self.net_profit,
                self.net_profit / self.starting_cash * 100.0
            )),
        ]));

        table.add_row(Row::new(vec![
            Cell::new("Closed Trades"),
            Cell::new(&format!("{}", self.num_trades)),
        ]));

        table.add_row(Row::new(vec![
            Cell::new("Winners / Losers"),
            Cell::new(&format!(
                "{} / {}",
                self.num_winning_trades, self.num_losing_trades
            )),
        ]));

        table.add_row(Row::new(vec![
            Cell::new("Win Rate"),
            Cell::new(&format!("{:.2}%", self.win_rate * 100.0)),
        ]));

        table.add_row(Row::new(vec![
            Cell::new("Longest Losing Streak"),
            Cell::new(&format!("{}", self.longest_losing_streak)),
        ]));

        table.add_row(Row::new(vec![
            Cell::new("Total Commission"),
            Cell::new(&format!("{:.2}", self.total_commission)),
        ]));

        table.printstd();
    }
}

fn longest_losing_streak(trades: &[Trade]) -> usize {
    let mut longest = 0;
    let mut current = 0;

    for trade in trades {
        if trade.is_loss() {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }

    longest
}

//writes closed trades to a csv file, one row per trade
pub fn write_trades_csv(trades: &[Trade], path: &Path) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;

    for trade in trades {
        writer.serialize(trade)?;
    }

    writer.flush()?;
    Ok(())
}
