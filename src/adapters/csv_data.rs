//! CSV file data adapter.
//!
//! Expects a header row followed by `date,open,high,low,close,volume`
//! records with ISO dates, sorted ascending by date.

use crate::domain::bar::Bar;
use crate::domain::error::RulebenchError;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;

pub struct CsvBarSource {
    path: PathBuf,
}

impl CsvBarSource {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl DataPort for CsvBarSource {
    fn fetch_bars(&self) -> Result<Vec<Bar>, RulebenchError> {
        let content = fs::read_to_string(&self.path).map_err(|e| RulebenchError::Data {
            reason: format!("failed to read {}: {}", self.path.display(), e),
        })?;
        parse_csv(&content)
    }
}

fn parse_csv(content: &str) -> Result<Vec<Bar>, RulebenchError> {
    let mut rdr = csv::Reader::from_reader(content.as_bytes());
    let mut bars = Vec::new();

    for result in rdr.records() {
        let record = result.map_err(|e| RulebenchError::Data {
            reason: format!("CSV parse error: {}", e),
        })?;

        let date_str = field(&record, 0, "date")?;
        let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").map_err(|e| {
            RulebenchError::Data {
                reason: format!("invalid date '{}': {}", date_str, e),
            }
        })?;

        let open = parse_f64(&record, 1, "open")?;
        let high = parse_f64(&record, 2, "high")?;
        let low = parse_f64(&record, 3, "low")?;
        let close = parse_f64(&record, 4, "close")?;
        let volume: i64 = field(&record, 5, "volume")?
            .parse()
            .map_err(|e| RulebenchError::Data {
                reason: format!("invalid volume value: {}", e),
            })?;

        bars.push(Bar {
            date,
            open,
            high,
            low,
            close,
            volume,
        });
    }

    if let Some(window) = bars.windows(2).find(|w| w[1].date <= w[0].date) {
        return Err(RulebenchError::Data {
            reason: format!(
                "bars out of order: {} follows {}",
                window[1].date, window[0].date
            ),
        });
    }

    Ok(bars)
}

fn field<'a>(
    record: &'a csv::StringRecord,
    index: usize,
    name: &str,
) -> Result<&'a str, RulebenchError> {
    record.get(index).ok_or_else(|| RulebenchError::Data {
        reason: format!("missing {} column", name),
    })
}

fn parse_f64(
    record: &csv::StringRecord,
    index: usize,
    name: &str,
) -> Result<f64, RulebenchError> {
    field(record, index, name)?
        .parse()
        .map_err(|e| RulebenchError::Data {
            reason: format!("invalid {} value: {}", name, e),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE_CSV: &str = "\
date,open,high,low,close,volume
2020-01-01,100,101,99,100.5,100000
2020-01-02,100.5,102,100,101.0,120000
2020-01-03,101.0,103,100.5,102.5,150000
";

    #[test]
    fn parses_well_formed_csv() {
        let bars = parse_csv(SAMPLE_CSV).unwrap();
        assert_eq!(bars.len(), 3);
        assert_eq!(
            bars[0].date,
            NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()
        );
        assert!((bars[0].close - 100.5).abs() < f64::EPSILON);
        assert_eq!(bars[2].volume, 150_000);
    }

    #[test]
    fn fetch_bars_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", SAMPLE_CSV).unwrap();

        let source = CsvBarSource::new(file.path().to_path_buf());
        let bars = source.fetch_bars().unwrap();
        assert_eq!(bars.len(), 3);
    }

    #[test]
    fn missing_file_is_a_data_error() {
        let source = CsvBarSource::new(PathBuf::from("/nonexistent/bars.csv"));
        let err = source.fetch_bars().unwrap_err();
        assert!(matches!(err, RulebenchError::Data { .. }));
    }

    #[test]
    fn rejects_bad_date() {
        let err = parse_csv("date,open,high,low,close,volume\nnot-a-date,1,1,1,1,1\n").unwrap_err();
        assert!(err.to_string().contains("invalid date"));
    }

    #[test]
    fn rejects_missing_column() {
        let err = parse_csv("date,open\n2020-01-01,1\n").unwrap_err();
        assert!(err.to_string().contains("missing high column"));
    }

    #[test]
    fn rejects_bad_price() {
        let err =
            parse_csv("date,open,high,low,close,volume\n2020-01-01,1,1,1,abc,1\n").unwrap_err();
        assert!(err.to_string().contains("invalid close value"));
    }

    #[test]
    fn rejects_out_of_order_dates() {
        let csv = "\
date,open,high,low,close,volume
2020-01-02,1,1,1,1,1
2020-01-01,1,1,1,1,1
";
        let err = parse_csv(csv).unwrap_err();
        assert!(err.to_string().contains("out of order"));
    }

    #[test]
    fn empty_body_yields_empty_series() {
        let bars = parse_csv("date,open,high,low,close,volume\n").unwrap();
        assert!(bars.is_empty());
    }
}
