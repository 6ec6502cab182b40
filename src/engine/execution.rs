use crate::data::Bar;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

//order side (buy or sell)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    //converts to size sign (Buy = +1, Sell = -1)
    pub fn to_size_sign(&self) -> i64 {
        match self {
            OrderSide::Buy => 1,
            OrderSide::Sell => -1,
        }
    }
}

//market orders come from buy/sell, close orders are sized to flatten
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderKind {
    Market,
    Close,
}

//order lifecycle
//submitted -> accepted -> completed, or ends canceled / margin rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Submitted,
    Accepted,
    Completed,
    Canceled,
    MarginRejected,
}

impl OrderStatus {
    //still waiting on the broker
    pub fn is_alive(&self) -> bool {
        matches!(self, OrderStatus::Submitted | OrderStatus::Accepted)
    }
}

//which price of the next bar a market order executes at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillPrice {
    #[default]
    Open,
    Close,
}

impl FillPrice {
    pub fn pick(&self, bar: &Bar) -> f64 {
        match self {
            FillPrice::Open => bar.open,
            FillPrice::Close => bar.close,
        }
    }
}

//commission rate on traded value plus a contract multiplier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommissionScheme {
    //fraction of price * size charged per fill
    pub rate: f64,
    //scales position value and pnl (eg 100 for a lot of 100 units)
    pub multiplier: f64,
}

impl Default for CommissionScheme {
    fn default() -> Self {
        CommissionScheme {
            rate: 0.0,
            multiplier: 1.0,
        }
    }
}

impl CommissionScheme {
    pub fn commission(&self, price: f64, size: u64) -> f64 {
        price * size as f64 * self.rate
    }

    //cash needed to carry `size` units at `price`
    pub fn operation_value(&self, price: f64, size: u64) -> f64 {
        price * size as f64 * self.multiplier
    }
}

//what actually happened when an order filled
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Execution {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
    //signed: positive for buys, negative for sells
    pub size: i64,
    //price * size * multiplier
    pub value: f64,
    pub commission: f64,
}

//represents a trading order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: u64,
    pub side: OrderSide,
    pub kind: OrderKind,
    pub size: u64,
    pub status: OrderStatus,
    pub created: Option<DateTime<Utc>>,
    pub executed: Option<Execution>,
}

impl Order {
    pub(crate) fn new(
        id: u64,
        side: OrderSide,
        kind: OrderKind,
        size: u64,
        created: Option<DateTime<Utc>>,
    ) -> Self {
        Order {
            id,
            side,
            kind,
            size,
            status: OrderStatus::Submitted,
            created,
            executed: None,
        }
    }

    //returns the signed size (positive for buy, negative for sell)
    pub fn signed_size(&self) -> i64 {
        i64::try_from(self.size).unwrap_or(i64::MAX) * self.side.to_size_sign()
    }

    pub fn is_buy(&self) -> bool {
        self.side == OrderSide::Buy
    }

    pub fn is_alive(&self) -> bool {
        self.status.is_alive()
    }
}
