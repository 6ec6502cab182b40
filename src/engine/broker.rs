use crate::data::Bar;
use crate::engine::execution::{
    CommissionScheme, Execution, FillPrice, Order, OrderKind, OrderSide, OrderStatus,
};
use crate::portfolio::{Position, Trade};
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

//events queued by the broker for delivery to the strategy
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    Order(Order),
    Trade(Trade),
}

//simulated broker for a single instrument
//cash moves only by realized pnl and commissions, an open position holds
//margin equal to its entry value
#[derive(Debug, Clone)]
pub struct Broker {
    starting_cash: f64,
    cash: f64,
    commission: CommissionScheme,
    fill_price: FillPrice,
    position: Position,

    //latest close and bar time seen
    last_price: Option<f64>,
    now: Option<DateTime<Utc>>,

    //at most one order waits for the next bar
    pending: Option<Order>,
    //finished orders in completion order
    orders: Vec<Order>,

    open_trade: Option<Trade>,
    trades: Vec<Trade>,

    notifications: Vec<Notification>,
    next_order_id: u64,
    next_trade_id: u64,
}

impl Broker {
    pub fn new(starting_cash: f64, commission: CommissionScheme, fill_price: FillPrice) -> Self {
        Broker {
            starting_cash,
            cash: starting_cash,
            commission,
            fill_price,
            position: Position::new(),
            last_price: None,
            now: None,
            pending: None,
            orders: Vec::new(),
            open_trade: None,
            trades: Vec::new(),
            notifications: Vec::new(),
            next_order_id: 1,
            next_trade_id: 1,
        }
    }

    pub fn starting_cash(&self) -> f64 {
        self.starting_cash
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    pub fn commission_scheme(&self) -> CommissionScheme {
        self.commission
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn last_price(&self) -> Option<f64> {
        self.last_price
    }

    //cash locked by the open position
    pub fn margin_held(&self) -> f64 {
        self.commission
            .operation_value(self.position.avg_price, self.position.size.unsigned_abs())
    }

    //returns available cash for new exposure (cash - margin held)
    pub fn available_cash(&self) -> f64 {
        self.cash - self.margin_held()
    }

    //portfolio value: cash plus unrealized pnl at the last price
    pub fn value(&self) -> f64 {
        let unrealized = self.last_price.map_or(0.0, |price| {
            self.position
                .unrealized_pnl(price, self.commission.multiplier)
        });
        self.cash + unrealized
    }

    pub fn pending_order(&self) -> Option<&Order> {
        self.pending.as_ref()
    }

    //looks up an order by id, pending or finished
    pub fn order(&self, id: u64) -> Option<&Order> {
        self.pending
            .iter()
            .chain(self.orders.iter())
            .find(|order| order.id == id)
    }

    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    //closed trades
    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    pub fn open_trade(&self) -> Option<&Trade> {
        self.open_trade.as_ref()
    }

    //records the latest bar as the reference for margin checks and valuation
    pub fn update_market(&mut self, bar: &Bar) {
        self.now = Some(bar.timestamp);
        self.last_price = Some(bar.close);
    }

    pub fn buy(&mut self, size: u64) -> Option<u64> {
        self.submit(OrderSide::Buy, OrderKind::Market, size)
    }

    pub fn sell(&mut self, size: u64) -> Option<u64> {
        self.submit(OrderSide::Sell, OrderKind::Market, size)
    }

    //submits an order that flattens the position, none if already flat
    pub fn close(&mut self) -> Option<u64> {
        let size = self.position.size;
        if size == 0 {
            debug!("close requested while flat, ignoring");
            return None;
        }

        let side = if size > 0 {
            OrderSide::Sell
        } else {
            OrderSide::Buy
        };
        self.submit(side, OrderKind::Close, size.unsigned_abs())
    }

    //submits an order and returns its id
    //refused (none) when another order is pending or the size is zero
    //an unfundable order is still returned, with status margin rejected
    pub fn submit(&mut self, side: OrderSide, kind: OrderKind, size: u64) -> Option<u64> {
        if size == 0 {
            warn!("refusing zero-size {:?} order", side);
            return None;
        }

        //positions are signed, so sizes must fit an i64
        if i64::try_from(size).is_err() {
            warn!(size, "refusing {:?} order larger than i64::MAX", side);
            return None;
        }

        if let Some(pending) = &self.pending {
            warn!(
                pending = pending.id,
                "refusing {:?} order while another order is pending", side
            );
            return None;
        }

        let id = self.next_order_id;
        self.next_order_id += 1;
        let mut order = Order::new(id, side, kind, size, self.now);
        self.notify_order(&order);

        if let Some(price) = self.last_price {
            if let Err((required, free)) = self.check_margin(order.signed_size(), price) {
                warn!(order = id, required, free, "order rejected for insufficient margin");
                self.finish(order, OrderStatus::MarginRejected);
                return Some(id);
            }
        }

        order.status = OrderStatus::Accepted;
        self.notify_order(&order);
        self.pending = Some(order);
        Some(id)
    }

    //cancels the pending order if it has this id
    pub fn cancel(&mut self, id: u64) -> bool {
        match self.pending.take() {
            Some(order) if order.id == id => {
                debug!(order = id, "order canceled");
                self.finish(order, OrderStatus::Canceled);
                true
            }
            other => {
                self.pending = other;
                false
            }
        }
    }

    //cancels whatever is pending, used at end of run
    pub fn cancel_pending(&mut self) -> Option<u64> {
        let order = self.pending.take()?;
        let id = order.id;
        debug!(order = id, "pending order canceled at end of run");
        self.finish(order, OrderStatus::Canceled);
        Some(id)
    }

    //resolves the pending order against a newly arrived bar
    pub fn process_bar(&mut self, bar: &Bar) {
        self.now = Some(bar.timestamp);

        if let Some(trade) = self.open_trade.as_mut() {
            trade.bars += 1;
        }

        if let Some(order) = self.pending.take() {
            self.execute(order, bar);
        }
    }

    //drains notifications in the order they were raised
    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    //checks that the exposure an order adds can be funded at `price`
    //returns (required, free) on failure
    fn check_margin(&self, signed_size: i64, price: f64) -> Result<(), (f64, f64)> {
        let closing = self.position.closing_size(signed_size);
        let opening = signed_size.unsigned_abs() - closing.unsigned_abs();

        //pure reductions always go through
        if opening == 0 {
            return Ok(());
        }

        let multiplier = self.commission.multiplier;
        let realized = if closing > 0 {
            let diff = price - self.position.avg_price;
            diff * closing as f64 * self.position.size.signum() as f64 * multiplier
        } else {
            0.0
        };

        let remaining = self.position.size.unsigned_abs() - closing.unsigned_abs();
        let free = self.cash + realized
            - self.commission.commission(price, signed_size.unsigned_abs())
            - self.commission.operation_value(self.position.avg_price, remaining);
        let required = self.commission.operation_value(price, opening);

        if required > free {
            Err((required, free))
        } else {
            Ok(())
        }
    }

    fn execute(&mut self, mut order: Order, bar: &Bar) {
        let price = self.fill_price.pick(bar);
        let signed = order.signed_size();

        //the gap between submit and fill can make an accepted order unfundable
        if let Err((required, free)) = self.check_margin(signed, price) {
            warn!(
                order = order.id,
                required, free, "order rejected for insufficient margin at execution"
            );
            self.finish(order, OrderStatus::MarginRejected);
            return;
        }

        let filled = signed.unsigned_abs();
        let commission = self.commission.commission(price, filled);
        let closing = self.position.closing_size(signed);
        let opening = filled - closing.unsigned_abs();

        let realized = self
            .position
            .update_with_fill(signed, price, self.commission.multiplier);
        self.cash += realized - commission;

        order.executed = Some(Execution {
            timestamp: bar.timestamp,
            price,
            size: signed,
            value: self.commission.operation_value(price, filled),
            commission,
        });
        debug!(
            order = order.id,
            price,
            size = signed,
            commission,
            "order executed"
        );
        self.finish(order, OrderStatus::Completed);

        if closing > 0 {
            let share = commission * closing as f64 / filled as f64;
            self.apply_closing(bar.timestamp, price, closing, realized, share);
        }

        if opening > 0 {
            let share = commission * opening as f64 / filled as f64;
            self.apply_opening(bar.timestamp, price, opening as i64 * signed.signum(), share);
        }
    }

    fn apply_closing(
        &mut self,
        timestamp: DateTime<Utc>,
        price: f64,
        closing: i64,
        realized: f64,
        commission: f64,
    ) {
        let Some(mut trade) = self.open_trade.take() else {
            return;
        };

        let flipped_or_flat =
            self.position.is_flat() || self.position.is_long() != trade.long;

        if flipped_or_flat {
            trade.close(timestamp, price, realized, commission);
            debug!(trade = trade.id, pnl = trade.pnl, net = trade.pnl_net, "trade closed");
            self.notifications.push(Notification::Trade(trade.clone()));
            self.trades.push(trade);
        } else {
            trade.reduce(closing, realized, commission);
            self.notifications.push(Notification::Trade(trade.clone()));
            self.open_trade = Some(trade);
        }
    }

    fn apply_opening(&mut self, timestamp: DateTime<Utc>, price: f64, size: i64, commission: f64) {
        match self.open_trade.as_mut() {
            Some(trade) => {
                trade.extend(size, self.position.avg_price, commission);
                self.notifications.push(Notification::Trade(trade.clone()));
            }
            None => {
                let trade = Trade::open(self.next_trade_id, timestamp, size, price, commission);
                self.next_trade_id += 1;
                debug!(trade = trade.id, size, price, "trade opened");
                self.notifications.push(Notification::Trade(trade.clone()));
                self.open_trade = Some(trade);
            }
        }
    }

    fn notify_order(&mut self, order: &Order) {
        self.notifications.push(Notification::Order(order.clone()));
    }

    fn finish(&mut self, mut order: Order, status: OrderStatus) {
        order.status = status;
        self.notify_order(&order);
        self.orders.push(order);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn bar(day: i64, open: f64, close: f64) -> Bar {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::days(day);
        Bar::new(ts, open, open.max(close), open.min(close), close, 1.0).unwrap()
    }

    fn statuses(notifications: &[Notification]) -> Vec<OrderStatus> {
        notifications
            .iter()
            .filter_map(|n| match n {
                Notification::Order(order) => Some(order.status),
                Notification::Trade(_) => None,
            })
            .collect()
    }

    #[test]
    fn accepted_order_fills_at_next_open() {
        let mut broker = Broker::new(1_000.0, CommissionScheme::default(), FillPrice::Open);
        broker.update_market(&bar(0, 10.0, 10.0));

        let id = broker.buy(5).unwrap();
        assert_eq!(
            statuses(&broker.drain_notifications()),
            vec![OrderStatus::Submitted, OrderStatus::Accepted]
        );
        assert!(broker.position().is_flat());

        broker.process_bar(&bar(1, 11.0, 12.0));
        let order = broker.order(id).unwrap();
        assert_eq!(order.status, OrderStatus::Completed);
        assert_eq!(order.executed.unwrap().price, 11.0);
        assert_eq!(broker.position().size, 5);
        assert!(broker.pending_order().is_none());
    }

    #[test]
    fn second_order_refused_while_pending() {
        let mut broker = Broker::new(1_000.0, CommissionScheme::default(), FillPrice::Open);
        broker.update_market(&bar(0, 10.0, 10.0));
        assert!(broker.buy(1).is_some());
        assert!(broker.sell(1).is_none());
        assert!(broker.buy(0).is_none());
    }

    #[test]
    fn margin_rejection_leaves_position_untouched() {
        let mut broker = Broker::new(100.0, CommissionScheme::default(), FillPrice::Open);
        broker.update_market(&bar(0, 10.0, 10.0));

        let id = broker.buy(11).unwrap();
        assert_eq!(broker.order(id).unwrap().status, OrderStatus::MarginRejected);
        assert!(broker.pending_order().is_none());
        assert!(broker.position().is_flat());
        assert_eq!(broker.cash(), 100.0);
        assert_eq!(
            statuses(&broker.drain_notifications()),
            vec![OrderStatus::Submitted, OrderStatus::MarginRejected]
        );
    }

    #[test]
    fn multiplier_scales_required_margin() {
        let scheme = CommissionScheme {
            rate: 0.0,
            multiplier: 100.0,
        };
        let mut broker = Broker::new(1_000.0, scheme, FillPrice::Open);
        broker.update_market(&bar(0, 1.0, 1.0));

        let id = broker.buy(11).unwrap();
        assert_eq!(broker.order(id).unwrap().status, OrderStatus::MarginRejected);
        let id = broker.buy(10).unwrap();
        assert_eq!(broker.order(id).unwrap().status, OrderStatus::Accepted);
    }

    #[test]
    fn gap_at_execution_can_reject() {
        let mut broker = Broker::new(100.0, CommissionScheme::default(), FillPrice::Open);
        broker.update_market(&bar(0, 10.0, 10.0));
        let id = broker.buy(10).unwrap();

        broker.process_bar(&bar(1, 12.0, 12.0));
        assert_eq!(broker.order(id).unwrap().status, OrderStatus::MarginRejected);
        assert!(broker.position().is_flat());
    }

    #[test]
    fn close_is_noop_when_flat() {
        let mut broker = Broker::new(100.0, CommissionScheme::default(), FillPrice::Open);
        broker.update_market(&bar(0, 10.0, 10.0));
        assert!(broker.close().is_none());
        assert!(broker.drain_notifications().is_empty());
    }

    #[test]
    fn flip_closes_trade_and_opens_residual() {
        let mut broker = Broker::new(1_000.0, CommissionScheme::default(), FillPrice::Open);
        broker.update_market(&bar(0, 10.0, 10.0));
        broker.buy(2).unwrap();
        broker.process_bar(&bar(1, 10.0, 11.0));
        broker.update_market(&bar(1, 10.0, 11.0));

        broker.sell(5).unwrap();
        broker.process_bar(&bar(2, 12.0, 12.0));

        assert_eq!(broker.trades().len(), 1);
        let closed = &broker.trades()[0];
        assert_eq!(closed.pnl, 4.0);
        assert_eq!(closed.exit_price, Some(12.0));

        let open = broker.open_trade().unwrap();
        assert_eq!(open.size, -3);
        assert_eq!(open.price, 12.0);
        assert_eq!(broker.position().size, -3);
    }

    #[test]
    fn cancel_only_matches_pending_id() {
        let mut broker = Broker::new(1_000.0, CommissionScheme::default(), FillPrice::Open);
        broker.update_market(&bar(0, 10.0, 10.0));
        let id = broker.buy(1).unwrap();

        assert!(!broker.cancel(id + 1));
        assert!(broker.cancel(id));
        assert_eq!(broker.order(id).unwrap().status, OrderStatus::Canceled);
        assert!(broker.cancel_pending().is_none());
    }

    #[test]
    fn value_marks_open_position() {
        let mut broker = Broker::new(1_000.0, CommissionScheme::default(), FillPrice::Open);
        broker.update_market(&bar(0, 10.0, 10.0));
        broker.sell(10).unwrap();
        broker.process_bar(&bar(1, 10.0, 9.0));
        broker.update_market(&bar(1, 10.0, 9.0));

        assert_eq!(broker.cash(), 1_000.0);
        assert_eq!(broker.margin_held(), 100.0);
        assert_eq!(broker.available_cash(), 900.0);
        assert_eq!(broker.value(), 1_010.0);
    }

    #[test]
    fn oversized_order_never_flips_side() {
        let mut broker = Broker::new(1_000.0, CommissionScheme::default(), FillPrice::Open);
        broker.update_market(&bar(0, 10.0, 10.0));

        assert_eq!(broker.buy(u64::MAX), None);
        assert_eq!(broker.sell(i64::MAX as u64 + 1), None);
        assert!(broker.drain_notifications().is_empty());
        assert!(broker.pending_order().is_none());

        broker.process_bar(&bar(1, 10.0, 10.0));
        assert!(broker.position().is_flat());
        assert!(broker.open_trade().is_none());

        //the largest representable size still goes through the margin check
        let id = broker.buy(i64::MAX as u64).unwrap();
        assert_eq!(broker.order(id).unwrap().status, OrderStatus::MarginRejected);
    }
}
