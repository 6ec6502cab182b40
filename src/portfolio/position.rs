use serde::{Deserialize, Serialize};

//net position held by the broker
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    //net size (positive for long, negative for short, 0 for flat)
    pub size: i64,

    //average entry price, 0 when flat
    pub avg_price: f64,
}

impl Position {
    //creates a new flat position
    pub fn new() -> Self {
        Position::default()
    }

    //calculates unrealized pnl at a given price
    pub fn unrealized_pnl(&self, current_price: f64, multiplier: f64) -> f64 {
        if self.size == 0 {
            return 0.0;
        }

        (current_price - self.avg_price) * self.size as f64 * multiplier
    }

    //returns true if the position is flat (no open position)
    pub fn is_flat(&self) -> bool {
        self.size == 0
    }

    //returns true if the position is long
    pub fn is_long(&self) -> bool {
        self.size > 0
    }

    //returns true if the position is short
    pub fn is_short(&self) -> bool {
        self.size < 0
    }

    //how much of a signed fill would reduce the current position
    pub fn closing_size(&self, fill_size: i64) -> i64 {
        if self.size == 0 || self.size.signum() == fill_size.signum() {
            0
        } else {
            fill_size.abs().min(self.size.abs())
        }
    }

    //updates position with a new fill
    //returns the realized pnl from this fill (if it closes/reduces position)
    pub fn update_with_fill(&mut self, fill_size: i64, fill_price: f64, multiplier: f64) -> f64 {
        let mut realized_pnl = 0.0;

        //if position is flat, just establish new position
        if self.size == 0 {
            self.size = fill_size;
            self.avg_price = if fill_size == 0 { 0.0 } else { fill_price };
            return realized_pnl;
        }

        let close_size = self.closing_size(fill_size);

        if close_size == 0 {
            //adding to position - update average entry price
            let total_size = self.size + fill_size;
            let total_cost = self.avg_price * self.size as f64 + fill_price * fill_size as f64;
            self.avg_price = total_cost / total_size as f64;
            self.size = total_size;
        } else {
            //reducing or reversing position
            let price_diff = if self.size > 0 {
                //closing long
                fill_price - self.avg_price
            } else {
                //closing short
                self.avg_price - fill_price
            };

            realized_pnl = price_diff * close_size as f64 * multiplier;

            self.size += fill_size;

            //reversed: the residual opens at the fill price
            if self.size != 0 && self.size.signum() == fill_size.signum() {
                self.avg_price = fill_price;
            }

            if self.size == 0 {
                self.avg_price = 0.0;
            }
        }

        realized_pnl
    }

    //returns the notional value of the position
    pub fn notional_value(&self, current_price: f64, multiplier: f64) -> f64 {
        current_price * multiplier * self.size.abs() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adding_averages_entry_price() {
        let mut position = Position::new();
        position.update_with_fill(2, 10.0, 1.0);
        position.update_with_fill(2, 12.0, 1.0);

        assert_eq!(position.size, 4);
        assert_eq!(position.avg_price, 11.0);
    }

    #[test]
    fn reducing_realizes_pnl() {
        let mut position = Position::new();
        position.update_with_fill(3, 10.0, 2.0);
        let pnl = position.update_with_fill(-1, 13.0, 2.0);

        assert_eq!(pnl, 6.0);
        assert_eq!(position.size, 2);
        assert_eq!(position.avg_price, 10.0);
    }

    #[test]
    fn short_profit_when_price_falls() {
        let mut position = Position::new();
        position.update_with_fill(-2, 10.0, 1.0);
        let pnl = position.update_with_fill(2, 8.0, 1.0);

        assert_eq!(pnl, 4.0);
        assert!(position.is_flat());
        assert_eq!(position.avg_price, 0.0);
    }

    #[test]
    fn reversal_reopens_at_fill_price() {
        let mut position = Position::new();
        position.update_with_fill(1, 10.0, 1.0);
        let pnl = position.update_with_fill(-3, 11.0, 1.0);

        assert_eq!(pnl, 1.0);
        assert_eq!(position.size, -2);
        assert_eq!(position.avg_price, 11.0);
    }

    #[test]
    fn unrealized_scales_with_multiplier() {
        let mut position = Position::new();
        position.update_with_fill(-1, 100.0, 50.0);
        assert_eq!(position.unrealized_pnl(98.0, 50.0), 100.0);
        assert_eq!(position.notional_value(98.0, 50.0), 4_900.0);
    }
}
