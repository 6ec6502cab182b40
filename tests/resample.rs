//! Property tests for bar series and resampling.

use barsim::data::{Bar, BarSeries, Resampler, TimeFrame};
use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;
use std::collections::BTreeMap;

fn origin() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2023, 12, 28, 0, 0, 0).unwrap()
}

//(minutes since previous bar, open, close, wick, volume)
fn arb_steps() -> impl Strategy<Value = Vec<(i64, f64, f64, f64, f64)>> {
    prop::collection::vec(
        (1..600_i64, 1.0..100.0_f64, 1.0..100.0_f64, 0.0..5.0_f64, 0.0..1000.0_f64),
        1..300,
    )
}

fn build_bars(steps: &[(i64, f64, f64, f64, f64)]) -> Vec<Bar> {
    let mut timestamp = origin();
    steps
        .iter()
        .map(|&(gap, open, close, wick, volume)| {
            timestamp += Duration::minutes(gap);
            Bar::new(
                timestamp,
                open,
                open.max(close) + wick,
                open.min(close) - wick,
                close,
                volume,
            )
            .unwrap()
        })
        .collect()
}

fn resample_all(bars: &[Bar], timeframe: TimeFrame) -> Vec<Bar> {
    let mut resampler = Resampler::new(timeframe);
    let mut emitted: Vec<Bar> = bars.iter().filter_map(|bar| resampler.push(bar)).collect();
    emitted.extend(resampler.flush());
    emitted
}

fn check_periods(bars: &[Bar], timeframe: TimeFrame) -> Result<(), TestCaseError> {
    let emitted = resample_all(bars, timeframe);

    let mut groups: BTreeMap<i64, Vec<&Bar>> = BTreeMap::new();
    for bar in bars {
        groups.entry(timeframe.bucket(bar.timestamp)).or_default().push(bar);
    }
    prop_assert_eq!(emitted.len(), groups.len());

    for (coarse, (bucket, sources)) in emitted.iter().zip(groups.iter()) {
        prop_assert_eq!(timeframe.bucket(coarse.timestamp), *bucket);
        prop_assert_eq!(Some(coarse.timestamp), timeframe.bucket_start(*bucket));

        let volume: f64 = sources.iter().map(|bar| bar.volume).sum();
        prop_assert!((coarse.volume - volume).abs() < 1e-6);

        for source in sources {
            prop_assert!(coarse.high >= source.high);
            prop_assert!(coarse.low <= source.low);
        }
        prop_assert_eq!(coarse.open, sources[0].open);
        prop_assert_eq!(coarse.close, sources[sources.len() - 1].close);
    }

    for pair in emitted.windows(2) {
        prop_assert!(pair[0].timestamp < pair[1].timestamp);
    }
    Ok(())
}

proptest! {
    #[test]
    fn series_length_and_latest_bar(steps in arb_steps()) {
        let bars = build_bars(&steps);
        let mut series = BarSeries::new();

        for (i, bar) in bars.iter().enumerate() {
            series.append(bar.clone()).unwrap();
            prop_assert_eq!(series.len(), i + 1);
            prop_assert_eq!(series.at(0).unwrap(), bar);
        }
        prop_assert!(series.at(-(bars.len() as isize)).is_err());
    }

    #[test]
    fn daily_bars_aggregate_their_sources(steps in arb_steps()) {
        check_periods(&build_bars(&steps), TimeFrame::days(1))?;
    }

    #[test]
    fn weekly_bars_aggregate_their_sources(steps in arb_steps()) {
        check_periods(&build_bars(&steps), TimeFrame::weeks(1))?;
    }

    #[test]
    fn compressed_minute_bars_aggregate_their_sources(steps in arb_steps()) {
        check_periods(&build_bars(&steps), TimeFrame::minutes(240))?;
    }
}

#[test]
fn monthly_bar_starts_on_the_first() {
    let bars = build_bars(&[(60, 1.0, 2.0, 0.0, 1.0), (60 * 24 * 5, 2.0, 3.0, 0.0, 1.0)]);
    let emitted = resample_all(&bars, TimeFrame::months(1));

    assert_eq!(emitted.len(), 2);
    assert_eq!(
        emitted[0].timestamp,
        Utc.with_ymd_and_hms(2023, 12, 1, 0, 0, 0).unwrap()
    );
    assert_eq!(
        emitted[1].timestamp,
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    );
}
