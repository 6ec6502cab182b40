use crate::data::bar::Bar;
use crate::data::timeframe::TimeFrame;

//aggregates fine-grained bars into coarser bars without lookahead
//a coarse bar is only emitted once a source bar from a later period arrives,
//or when the stream ends and the simulator flushes
#[derive(Debug, Clone)]
pub struct Resampler {
    timeframe: TimeFrame,
    //bucket index and the bar being accumulated for it
    pending: Option<(i64, Bar)>,
}

impl Resampler {
    pub fn new(timeframe: TimeFrame) -> Self {
        Resampler {
            timeframe,
            pending: None,
        }
    }

    pub fn timeframe(&self) -> TimeFrame {
        self.timeframe
    }

    //feeds one source bar, returning the previous period's bar if it just closed
    pub fn push(&mut self, bar: &Bar) -> Option<Bar> {
        let bucket = self.timeframe.bucket(bar.timestamp);

        match self.pending.as_mut() {
            Some((current, accumulator)) if *current == bucket => {
                accumulator.merge(bar);
                None
            }
            _ => {
                let seeded = self.seed(bucket, bar);
                self.pending
                    .replace((bucket, seeded))
                    .map(|(_, closed)| closed)
            }
        }
    }

    //emits the in-progress bar at end of stream
    pub fn flush(&mut self) -> Option<Bar> {
        self.pending.take().map(|(_, bar)| bar)
    }

    //returns the partially built bar, if any
    pub fn in_progress(&self) -> Option<&Bar> {
        self.pending.as_ref().map(|(_, bar)| bar)
    }

    fn seed(&self, bucket: i64, bar: &Bar) -> Bar {
        let mut seeded = bar.clone();
        //stamp with the period boundary so emitted timestamps stay aligned
        if let Some(start) = self.timeframe.bucket_start(bucket) {
            seeded.timestamp = start;
        }
        seeded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn hourly(hour: i64, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Bar {
        let timestamp = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap() + Duration::hours(hour);
        Bar::new(timestamp, open, high, low, close, volume).unwrap()
    }

    #[test]
    fn emits_only_when_period_closes() {
        let mut daily = Resampler::new(TimeFrame::days(1));

        assert!(daily.push(&hourly(0, 10.0, 11.0, 9.0, 10.5, 100.0)).is_none());
        assert!(daily.push(&hourly(5, 10.5, 13.0, 10.0, 12.0, 50.0)).is_none());
        assert!(daily.push(&hourly(23, 12.0, 12.5, 8.0, 9.0, 25.0)).is_none());

        let closed = daily
            .push(&hourly(24, 9.0, 9.5, 8.5, 9.2, 10.0))
            .expect("day boundary closes the first day");

        assert_eq!(closed.timestamp, Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap());
        assert_eq!(closed.open, 10.0);
        assert_eq!(closed.high, 13.0);
        assert_eq!(closed.low, 8.0);
        assert_eq!(closed.close, 9.0);
        assert_eq!(closed.volume, 175.0);

        assert_eq!(daily.in_progress().map(|b| b.open), Some(9.0));
    }

    #[test]
    fn flush_emits_partial_period_once() {
        let mut weekly = Resampler::new(TimeFrame::weeks(1));
        weekly.push(&hourly(0, 10.0, 11.0, 9.0, 10.5, 100.0));

        let flushed = weekly.flush().expect("partial week is flushed");
        assert_eq!(flushed.volume, 100.0);
        assert!(weekly.flush().is_none());
    }

    #[test]
    fn seeded_bar_is_aligned_to_period_start() {
        let mut daily = Resampler::new(TimeFrame::days(1));
        daily.push(&hourly(7, 10.0, 11.0, 9.0, 10.5, 100.0));
        let bar = daily.flush().unwrap();
        assert_eq!(bar.timestamp, Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap());
    }
}
