pub mod bar;
pub mod loader;
pub mod resample;
pub mod series;
pub mod timeframe;

pub use bar::{Bar, DataError};
pub use loader::{load_csv, CsvFormat};
pub use resample::Resampler;
pub use series::{BarSeries, OutOfRange};
pub use timeframe::{TimeFrame, TimeFrameError, TimeFrameUnit};
