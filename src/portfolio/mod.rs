pub mod position;
pub mod trade;

pub use position::Position;
pub use trade::{Trade, TradeStatus};
