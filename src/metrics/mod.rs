pub mod summary;

pub use summary::{write_trades_csv, RunSummary};
