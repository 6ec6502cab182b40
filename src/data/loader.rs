use crate::data::bar::Bar;
use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use csv::{ReaderBuilder, StringRecord, Trim};
use serde::{Deserialize, Serialize};
use std::path::Path;

//layout of a generic ohlcv csv file
//columns are positional: datetime, open, high, low, close and an optional volume
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CsvFormat {
    //chrono format string, rfc3339 is always tried first
    pub datetime_format: String,
    pub has_headers: bool,
    //inclusive window; bars outside it are skipped
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl Default for CsvFormat {
    fn default() -> Self {
        CsvFormat {
            datetime_format: "%Y-%m-%d %H:%M".to_string(),
            has_headers: true,
            from: None,
            to: None,
        }
    }
}

impl CsvFormat {
    fn in_window(&self, timestamp: DateTime<Utc>) -> bool {
        self.from.map_or(true, |from| timestamp >= from) && self.to.map_or(true, |to| timestamp <= to)
    }

    fn parse_timestamp(&self, raw: &str) -> Result<DateTime<Utc>> {
        if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
            return Ok(parsed.with_timezone(&Utc));
        }

        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, &self.datetime_format) {
            return Ok(naive.and_utc());
        }

        //date-only formats such as %Y-%m-%d
        let date = NaiveDate::parse_from_str(raw, &self.datetime_format).context(format!(
            "Failed to parse timestamp '{}' with format '{}'",
            raw, self.datetime_format
        ))?;
        let midnight = date
            .and_hms_opt(0, 0, 0)
            .context(format!("Invalid date '{}'", raw))?;
        Ok(midnight.and_utc())
    }
}

fn field(record: &StringRecord, index: usize, name: &str) -> Result<f64> {
    let raw = record
        .get(index)
        .context(format!("Missing {} column", name))?;
    raw.parse::<f64>()
        .context(format!("Failed to parse {} value '{}'", name, raw))
}

//loads bars from a csv file, keeping file order
//ordering and ohlc consistency are checked by the simulator, not here
pub fn load_csv<P: AsRef<Path>>(path: P, format: &CsvFormat) -> Result<Vec<Bar>> {
    let path = path.as_ref();
    let mut reader = ReaderBuilder::new()
        .has_headers(format.has_headers)
        .trim(Trim::All)
        .flexible(true)
        .from_path(path)
        .context(format!("Failed to open CSV file: {:?}", path))?;

    let first_line = if format.has_headers { 2 } else { 1 };
    let mut bars = Vec::new();

    for (index, result) in reader.records().enumerate() {
        let line = index + first_line;
        let record = result.context(format!("Failed to read CSV record at line {}", line))?;

        if record.iter().all(|value| value.is_empty()) {
            continue;
        }

        let raw_timestamp = record
            .get(0)
            .context(format!("Missing datetime column at line {}", line))?;
        let timestamp = format
            .parse_timestamp(raw_timestamp)
            .context(format!("Bad datetime at line {}", line))?;

        if !format.in_window(timestamp) {
            continue;
        }

        let parsed = (|| -> Result<Bar> {
            let volume = match record.get(5) {
                Some(raw) if !raw.is_empty() => field(&record, 5, "volume")?,
                _ => 0.0,
            };

            Ok(Bar::new_unchecked(
                timestamp,
                field(&record, 1, "open")?,
                field(&record, 2, "high")?,
                field(&record, 3, "low")?,
                field(&record, 4, "close")?,
                volume,
            ))
        })();

        bars.push(parsed.context(format!("Bad record at line {}", line))?);
    }

    Ok(bars)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::io::Write;

    fn write_csv(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn parses_generic_format_without_volume() {
        let file = write_csv("Date,Open,High,Low,Close\n2024-01-02 00:00,1.1,1.2,1.0,1.15\n2024-01-02 01:00,1.15,1.25,1.1,1.2\n");
        let bars = load_csv(file.path(), &CsvFormat::default()).unwrap();

        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].timestamp, Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap());
        assert_eq!(bars[1].close, 1.2);
        assert_eq!(bars[1].volume, 0.0);
    }

    #[test]
    fn applies_date_window() {
        let file = write_csv("d,o,h,l,c,v\n2024-01-01 00:00,1,1,1,1,5\n2024-01-02 00:00,2,2,2,2,5\n2024-01-03 00:00,3,3,3,3,5\n");
        let format = CsvFormat {
            from: Some(Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap()),
            to: Some(Utc.with_ymd_and_hms(2024, 1, 2, 23, 59, 0).unwrap()),
            ..CsvFormat::default()
        };

        let bars = load_csv(file.path(), &format).unwrap();
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].close, 2.0);
    }

    #[test]
    fn reports_line_of_bad_record() {
        let file = write_csv("d,o,h,l,c\n2024-01-01 00:00,1,1,1,1\n2024-01-01 01:00,1,x,1,1\n");
        let err = load_csv(file.path(), &CsvFormat::default()).unwrap_err();
        assert!(format!("{:#}", err).contains("line 3"));
    }
}
