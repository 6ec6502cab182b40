use crate::data::bar::{Bar, DataError};
use thiserror::Error;

//lookback past the start of a series, or any lookahead
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Offset {offset} is out of range for a series of {available} bars")]
pub struct OutOfRange {
    pub offset: isize,
    pub available: usize,
}

//resolves a backward offset (0 = latest) to an absolute index
pub(crate) fn resolve_offset(len: usize, offset: isize) -> Result<usize, OutOfRange> {
    let out_of_range = OutOfRange {
        offset,
        available: len,
    };

    if offset > 0 || len == 0 {
        return Err(out_of_range);
    }

    let back = offset.unsigned_abs();
    if back >= len {
        return Err(out_of_range);
    }

    Ok(len - 1 - back)
}

//append-only, strictly time ordered sequence of bars for one timeframe
#[derive(Debug, Clone, Default)]
pub struct BarSeries {
    bars: Vec<Bar>,
}

impl BarSeries {
    pub fn new() -> Self {
        BarSeries { bars: Vec::new() }
    }

    //appends a bar, rejecting timestamps that do not move forward
    pub fn append(&mut self, bar: Bar) -> Result<(), DataError> {
        if let Some(last) = self.bars.last() {
            if bar.timestamp <= last.timestamp {
                return Err(DataError::OutOfOrder {
                    previous: last.timestamp,
                    next: bar.timestamp,
                });
            }
        }

        self.bars.push(bar);
        Ok(())
    }

    //returns the bar at a backward offset (0 = latest, -1 = previous)
    pub fn at(&self, offset: isize) -> Result<&Bar, OutOfRange> {
        let index = resolve_offset(self.bars.len(), offset)?;
        Ok(&self.bars[index])
    }

    //returns the close price at a backward offset
    pub fn close(&self, offset: isize) -> Result<f64, OutOfRange> {
        self.at(offset).map(|bar| bar.close)
    }

    //returns the most recent bar
    pub fn last(&self) -> Option<&Bar> {
        self.bars.last()
    }

    //returns the number of emitted bars
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    //iterates oldest first
    pub fn iter(&self) -> impl Iterator<Item = &Bar> {
        self.bars.iter()
    }

    //returns the close prices for the last n bars (oldest first)
    pub fn closes(&self, n: usize) -> Vec<f64> {
        let start = self.bars.len().saturating_sub(n);
        self.bars[start..].iter().map(|b| b.close).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn bar(minute: i64, close: f64) -> Bar {
        let timestamp = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap() + Duration::minutes(minute);
        Bar::new(timestamp, close, close, close, close, 1.0).unwrap()
    }

    #[test]
    fn at_zero_is_latest() {
        let mut series = BarSeries::new();
        series.append(bar(0, 1.0)).unwrap();
        series.append(bar(1, 2.0)).unwrap();
        series.append(bar(2, 3.0)).unwrap();

        assert_eq!(series.at(0).unwrap().close, 3.0);
        assert_eq!(series.at(-2).unwrap().close, 1.0);
        assert_eq!(series.len(), 3);
    }

    #[test]
    fn lookback_past_start_is_out_of_range() {
        let mut series = BarSeries::new();
        series.append(bar(0, 1.0)).unwrap();

        assert_eq!(
            series.at(-1).unwrap_err(),
            OutOfRange {
                offset: -1,
                available: 1
            }
        );
        assert!(series.at(1).is_err());
        assert!(BarSeries::new().at(0).is_err());
    }

    #[test]
    fn rejects_duplicate_and_earlier_timestamps() {
        let mut series = BarSeries::new();
        series.append(bar(5, 1.0)).unwrap();

        assert!(matches!(
            series.append(bar(5, 2.0)),
            Err(DataError::OutOfOrder { .. })
        ));
        assert!(matches!(
            series.append(bar(4, 2.0)),
            Err(DataError::OutOfOrder { .. })
        ));
        assert_eq!(series.len(), 1);
    }

    #[test]
    fn closes_returns_tail_oldest_first() {
        let mut series = BarSeries::new();
        for i in 0..5 {
            series.append(bar(i, i as f64)).unwrap();
        }
        assert_eq!(series.closes(3), vec![2.0, 3.0, 4.0]);
        assert_eq!(series.closes(10).len(), 5);
    }
}
