pub mod broker;
pub mod execution;
pub mod feeds;
pub mod indicator_set;
pub mod simulator;

pub use broker::{Broker, Notification};
pub use execution::{
    CommissionScheme, Execution, FillPrice, Order, OrderKind, OrderSide, OrderStatus,
};
pub use feeds::{Feed, Feeds};
pub use indicator_set::IndicatorSet;
pub use simulator::{RunResult, SimState, Simulator};
