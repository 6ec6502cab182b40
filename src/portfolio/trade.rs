use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeStatus {
    Open,
    Closed,
}

//a round trip: opened when the position leaves flat, closed when it returns
//to flat or flips side
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub id: u64,
    pub status: TradeStatus,

    //current signed size, 0 once closed
    pub size: i64,
    //largest absolute size held during the trade
    pub peak_size: i64,
    //long or short for the whole trade
    pub long: bool,

    //average entry price
    pub price: f64,
    pub exit_price: Option<f64>,

    pub opened: DateTime<Utc>,
    pub closed: Option<DateTime<Utc>>,
    //primary bars elapsed since the opening fill
    pub bars: usize,

    //realized gross pnl
    pub pnl: f64,
    //commissions attributed to this trade (opening and closing share)
    pub commission: f64,
    //pnl net of commissions
    pub pnl_net: f64,
}

impl Trade {
    pub(crate) fn open(
        id: u64,
        timestamp: DateTime<Utc>,
        size: i64,
        price: f64,
        commission: f64,
    ) -> Self {
        Trade {
            id,
            status: TradeStatus::Open,
            size,
            peak_size: size.abs(),
            long: size > 0,
            price,
            exit_price: None,
            opened: timestamp,
            closed: None,
            bars: 0,
            pnl: 0.0,
            commission,
            pnl_net: -commission,
        }
    }

    //same direction fill; price is the position's new average
    pub(crate) fn extend(&mut self, size: i64, avg_price: f64, commission: f64) {
        self.size += size;
        self.peak_size = self.peak_size.max(self.size.abs());
        self.price = avg_price;
        self.add_commission(commission);
    }

    //opposite direction fill that leaves the trade open
    pub(crate) fn reduce(&mut self, size: i64, realized: f64, commission: f64) {
        self.size -= size * self.size.signum();
        self.pnl += realized;
        self.add_commission(commission);
    }

    pub(crate) fn close(
        &mut self,
        timestamp: DateTime<Utc>,
        exit_price: f64,
        realized: f64,
        commission: f64,
    ) {
        self.size = 0;
        self.status = TradeStatus::Closed;
        self.exit_price = Some(exit_price);
        self.closed = Some(timestamp);
        self.pnl += realized;
        self.add_commission(commission);
    }

    fn add_commission(&mut self, commission: f64) {
        self.commission += commission;
        self.pnl_net = self.pnl - self.commission;
    }

    pub fn is_open(&self) -> bool {
        self.status == TradeStatus::Open
    }

    pub fn is_closed(&self) -> bool {
        self.status == TradeStatus::Closed
    }

    //a closed trade whose gross pnl is negative
    pub fn is_loss(&self) -> bool {
        self.is_closed() && self.pnl < 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn net_pnl_tracks_commission_share() {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut trade = Trade::open(1, t0, 4, 10.0, 0.4);
        trade.reduce(1, 2.0, 0.1);
        assert_eq!(trade.size, 3);
        assert!(trade.is_open());

        trade.close(t0, 12.0, 6.0, 0.3);
        assert!(trade.is_closed());
        assert_eq!(trade.pnl, 8.0);
        assert!((trade.commission - 0.8).abs() < 1e-12);
        assert!((trade.pnl_net - 7.2).abs() < 1e-12);
        assert_eq!(trade.peak_size, 4);
    }

    #[test]
    fn short_reduce_moves_toward_zero() {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut trade = Trade::open(1, t0, -5, 10.0, 0.0);
        trade.reduce(2, 0.0, 0.0);
        assert_eq!(trade.size, -3);
        assert!(!trade.long);
    }
}
