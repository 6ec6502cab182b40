use chrono::{DateTime, Datelike, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const SECONDS_PER_DAY: i64 = 86_400;
//1970-01-01 was a thursday, shifting by 3 days aligns week buckets on mondays
const EPOCH_WEEKDAY_SHIFT: i64 = 3;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TimeFrameError {
    #[error("Compression must be at least 1, got {0}")]
    ZeroCompression(u32),
    #[error("Invalid timeframe '{input}': {message}")]
    InvalidInput { input: String, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeFrameUnit {
    Minute,
    Hour,
    Day,
    Week,
    Month,
}

impl TimeFrameUnit {
    fn suffix(&self) -> &'static str {
        match self {
            TimeFrameUnit::Minute => "m",
            TimeFrameUnit::Hour => "h",
            TimeFrameUnit::Day => "d",
            TimeFrameUnit::Week => "w",
            TimeFrameUnit::Month => "mo",
        }
    }
}

//a period rule: unit plus compression (eg 60 minutes, 1 week)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeFrame {
    pub unit: TimeFrameUnit,
    pub compression: u32,
}

impl TimeFrame {
    pub fn new(unit: TimeFrameUnit, compression: u32) -> Result<Self, TimeFrameError> {
        let timeframe = TimeFrame { unit, compression };
        timeframe.validate()?;
        Ok(timeframe)
    }

    pub fn minutes(compression: u32) -> Self {
        TimeFrame {
            unit: TimeFrameUnit::Minute,
            compression,
        }
    }

    pub fn days(compression: u32) -> Self {
        TimeFrame {
            unit: TimeFrameUnit::Day,
            compression,
        }
    }

    pub fn weeks(compression: u32) -> Self {
        TimeFrame {
            unit: TimeFrameUnit::Week,
            compression,
        }
    }

    pub fn months(compression: u32) -> Self {
        TimeFrame {
            unit: TimeFrameUnit::Month,
            compression,
        }
    }

    pub fn validate(&self) -> Result<(), TimeFrameError> {
        if self.compression == 0 {
            return Err(TimeFrameError::ZeroCompression(self.compression));
        }
        Ok(())
    }

    //approximate length in minutes, only used to order timeframes
    pub fn nominal_minutes(&self) -> u64 {
        let unit_minutes: u64 = match self.unit {
            TimeFrameUnit::Minute => 1,
            TimeFrameUnit::Hour => 60,
            TimeFrameUnit::Day => 1_440,
            TimeFrameUnit::Week => 10_080,
            TimeFrameUnit::Month => 43_200,
        };
        unit_minutes * u64::from(self.compression)
    }

    //maps a timestamp to the index of the period that contains it
    pub fn bucket(&self, timestamp: DateTime<Utc>) -> i64 {
        let compression = i64::from(self.compression.max(1));
        let seconds = timestamp.timestamp();

        match self.unit {
            TimeFrameUnit::Minute => seconds.div_euclid(60 * compression),
            TimeFrameUnit::Hour => seconds.div_euclid(3_600 * compression),
            TimeFrameUnit::Day => seconds.div_euclid(SECONDS_PER_DAY).div_euclid(compression),
            TimeFrameUnit::Week => {
                let days = seconds.div_euclid(SECONDS_PER_DAY);
                (days + EPOCH_WEEKDAY_SHIFT)
                    .div_euclid(7)
                    .div_euclid(compression)
            }
            TimeFrameUnit::Month => {
                let months = i64::from(timestamp.year()) * 12 + i64::from(timestamp.month0());
                months.div_euclid(compression)
            }
        }
    }

    //utc start of a bucket returned by `bucket`
    pub fn bucket_start(&self, bucket: i64) -> Option<DateTime<Utc>> {
        let compression = i64::from(self.compression.max(1));
        let first = bucket.checked_mul(compression)?;

        let seconds = match self.unit {
            TimeFrameUnit::Minute => first.checked_mul(60)?,
            TimeFrameUnit::Hour => first.checked_mul(3_600)?,
            TimeFrameUnit::Day => first.checked_mul(SECONDS_PER_DAY)?,
            TimeFrameUnit::Week => first
                .checked_mul(7)?
                .checked_sub(EPOCH_WEEKDAY_SHIFT)?
                .checked_mul(SECONDS_PER_DAY)?,
            TimeFrameUnit::Month => {
                let year = i32::try_from(first.div_euclid(12)).ok()?;
                let month = u32::try_from(first.rem_euclid(12) + 1).ok()?;
                return Utc.with_ymd_and_hms(year, month, 1, 0, 0, 0).single();
            }
        };

        DateTime::from_timestamp(seconds, 0)
    }
}

impl fmt::Display for TimeFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.compression, self.unit.suffix())
    }
}

impl FromStr for TimeFrame {
    type Err = TimeFrameError;

    //parses "60m", "1h", "1d", "1w", "1mo"
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim().to_lowercase();
        let split = input
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(|| TimeFrameError::InvalidInput {
                input: s.to_string(),
                message: "missing unit suffix".into(),
            })?;
        let (amount, suffix) = input.split_at(split);

        let compression: u32 = if amount.is_empty() {
            1
        } else {
            amount.parse().map_err(|_| TimeFrameError::InvalidInput {
                input: s.to_string(),
                message: "compression is not a number".into(),
            })?
        };

        let unit = match suffix {
            "m" | "min" | "minute" | "minutes" => TimeFrameUnit::Minute,
            "h" | "hour" | "hours" => TimeFrameUnit::Hour,
            "d" | "day" | "days" => TimeFrameUnit::Day,
            "w" | "week" | "weeks" => TimeFrameUnit::Week,
            "mo" | "month" | "months" => TimeFrameUnit::Month,
            other => {
                return Err(TimeFrameError::InvalidInput {
                    input: s.to_string(),
                    message: format!("unknown unit '{other}'"),
                })
            }
        };

        TimeFrame::new(unit, compression)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn day_buckets_split_at_midnight() {
        let tf = TimeFrame::days(1);
        assert_eq!(tf.bucket(at(2024, 1, 2, 0)), tf.bucket(at(2024, 1, 2, 23)));
        assert_ne!(tf.bucket(at(2024, 1, 2, 23)), tf.bucket(at(2024, 1, 3, 0)));
        assert_eq!(tf.bucket_start(tf.bucket(at(2024, 1, 2, 15))), Some(at(2024, 1, 2, 0)));
    }

    #[test]
    fn week_buckets_start_on_monday() {
        let tf = TimeFrame::weeks(1);
        //2024-01-01 is a monday, 2024-01-07 a sunday
        assert_eq!(tf.bucket(at(2024, 1, 1, 0)), tf.bucket(at(2024, 1, 7, 23)));
        assert_ne!(tf.bucket(at(2024, 1, 7, 23)), tf.bucket(at(2024, 1, 8, 0)));
        assert_eq!(tf.bucket_start(tf.bucket(at(2024, 1, 4, 9))), Some(at(2024, 1, 1, 0)));
    }

    #[test]
    fn month_buckets_follow_calendar() {
        let tf = TimeFrame::months(1);
        assert_eq!(tf.bucket(at(2024, 2, 1, 0)), tf.bucket(at(2024, 2, 29, 23)));
        assert_ne!(tf.bucket(at(2024, 2, 29, 23)), tf.bucket(at(2024, 3, 1, 0)));
        assert_eq!(tf.bucket_start(tf.bucket(at(2024, 12, 31, 0))), Some(at(2024, 12, 1, 0)));

        let quarterly = TimeFrame::months(3);
        assert_eq!(quarterly.bucket(at(2024, 1, 5, 0)), quarterly.bucket(at(2024, 3, 5, 0)));
        assert_eq!(
            quarterly.bucket_start(quarterly.bucket(at(2024, 5, 5, 0))),
            Some(at(2024, 4, 1, 0))
        );
    }

    #[test]
    fn minute_compression_groups_hours() {
        let tf = TimeFrame::minutes(60);
        assert_eq!(tf.bucket(at(2024, 1, 2, 5)), tf.bucket(at(2024, 1, 2, 5) + chrono::Duration::minutes(59)));
        assert_ne!(tf.bucket(at(2024, 1, 2, 5)), tf.bucket(at(2024, 1, 2, 6)));
    }

    #[test]
    fn parses_short_forms() {
        assert_eq!("60m".parse::<TimeFrame>().unwrap(), TimeFrame::minutes(60));
        assert_eq!("1d".parse::<TimeFrame>().unwrap(), TimeFrame::days(1));
        assert_eq!("w".parse::<TimeFrame>().unwrap(), TimeFrame::weeks(1));
        assert_eq!("3mo".parse::<TimeFrame>().unwrap(), TimeFrame::months(3));
        assert_eq!(TimeFrame::months(3).to_string(), "3mo");
        assert!("0d".parse::<TimeFrame>().is_err());
        assert!("5y".parse::<TimeFrame>().is_err());
        assert!("15".parse::<TimeFrame>().is_err());
    }

    #[test]
    fn orders_by_nominal_length() {
        assert!(TimeFrame::minutes(60).nominal_minutes() < TimeFrame::days(1).nominal_minutes());
        assert!(TimeFrame::weeks(1).nominal_minutes() < TimeFrame::months(1).nominal_minutes());
    }
}
