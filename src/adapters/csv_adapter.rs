//! CSV file adapter for price histories and action output.
//!
//! Price files carry no header. Rows are either `open,high,low,close` or
//! `date,open,high,low,close` with a `YYYY-MM-DD` date.

use crate::domain::action::TradingAction;
use crate::domain::error::TrendError;
use crate::domain::price_bar::PriceBar;
use crate::ports::action_port::ActionPort;
use crate::ports::price_port::PricePort;
use chrono::NaiveDate;
use std::path::Path;

#[derive(Debug, Clone, Copy, Default)]
pub struct CsvAdapter;

impl CsvAdapter {
    pub fn new() -> Self {
        Self
    }

    fn parse_record(record: &csv::StringRecord, line: u64) -> Result<PriceBar, TrendError> {
        let (date, prices) = match record.len() {
            4 => (None, 0),
            5 => {
                let raw = record.get(0).unwrap_or_default().trim();
                let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|e| {
                    TrendError::InvalidData {
                        reason: format!("line {line}: invalid date '{raw}': {e}"),
                    }
                })?;
                (Some(date), 1)
            }
            n => {
                return Err(TrendError::InvalidData {
                    reason: format!("line {line}: expected 4 or 5 columns, found {n}"),
                });
            }
        };

        let field = |offset: usize, name: &str| -> Result<f64, TrendError> {
            let raw = record.get(prices + offset).unwrap_or_default().trim();
            raw.parse().map_err(|e| TrendError::InvalidData {
                reason: format!("line {line}: invalid {name} value '{raw}': {e}"),
            })
        };

        Ok(PriceBar {
            date,
            open: field(0, "open")?,
            high: field(1, "high")?,
            low: field(2, "low")?,
            close: field(3, "close")?,
        })
    }

    fn writer(path: &Path) -> Result<csv::Writer<std::fs::File>, TrendError> {
        csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(path)
            .map_err(|e| csv_error(path, e))
    }
}

/// File-system failures stay I/O errors; everything else is a malformed file.
fn csv_error(path: &Path, err: csv::Error) -> TrendError {
    let reason = err.to_string();
    match err.into_kind() {
        csv::ErrorKind::Io(io) => TrendError::Io(std::io::Error::new(
            io.kind(),
            format!("{}: {io}", path.display()),
        )),
        _ => TrendError::Csv {
            file: path.display().to_string(),
            reason,
        },
    }
}

impl PricePort for CsvAdapter {
    fn load_prices(&self, path: &Path) -> Result<Vec<PriceBar>, TrendError> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(|e| csv_error(path, e))?;

        let mut bars = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|e| csv_error(path, e))?;
            let line = record.position().map(|p| p.line()).unwrap_or(0);
            bars.push(Self::parse_record(&record, line)?);
        }

        if bars.iter().all(|b| b.date.is_some()) {
            bars.sort_by_key(|b| b.date);
        }
        Ok(bars)
    }
}

impl ActionPort for CsvAdapter {
    fn write_actions(&self, path: &Path, actions: &[TradingAction]) -> Result<(), TrendError> {
        let mut wtr = Self::writer(path)?;
        for action in actions {
            wtr.write_record([action.value().to_string()])
                .map_err(|e| csv_error(path, e))?;
        }
        wtr.flush()?;
        Ok(())
    }

    fn write_curve(&self, path: &Path, curve: &[f64]) -> Result<(), TrendError> {
        let mut wtr = Self::writer(path)?;
        for value in curve {
            wtr.write_record([value.to_string()])
                .map_err(|e| csv_error(path, e))?;
        }
        wtr.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn load_headerless_four_columns() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "prices.csv",
            "186.73,188.71,186.0,186.3\n185.57,186.33,184.94,185.54\n",
        );
        let bars = CsvAdapter::new().load_prices(&path).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].open, 186.73);
        assert_eq!(bars[1].close, 185.54);
        assert!(bars[0].date.is_none());
    }

    #[test]
    fn load_dated_rows_sorted() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "prices.csv",
            "2024-01-16,105.0,115.0,100.0,110.0\n2024-01-15,100.0,110.0,90.0,105.0\n",
        );
        let bars = CsvAdapter::new().load_prices(&path).unwrap();
        assert_eq!(bars[0].date, NaiveDate::from_ymd_opt(2024, 1, 15));
        assert_eq!(bars[0].close, 105.0);
        assert_eq!(bars[1].open, 105.0);
    }

    #[test]
    fn load_skips_blank_lines_and_trims() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "prices.csv", "1.0, 2.0, 0.5, 1.5\n\n2.0,3.0,1.0,2.5\n");
        let bars = CsvAdapter::new().load_prices(&path).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].high, 2.0);
    }

    #[test]
    fn load_rejects_bad_value() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "prices.csv", "1.0,2.0,abc,1.5\n");
        let err = CsvAdapter::new().load_prices(&path).unwrap_err();
        assert!(matches!(err, TrendError::InvalidData { ref reason } if reason.contains("low")));
    }

    #[test]
    fn load_rejects_wrong_column_count() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "prices.csv", "1.0,2.0,1.5\n");
        assert!(matches!(
            CsvAdapter::new().load_prices(&path),
            Err(TrendError::InvalidData { .. })
        ));
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let err = CsvAdapter::new()
            .load_prices(Path::new("/nonexistent/prices.csv"))
            .unwrap_err();
        assert!(matches!(
            err,
            TrendError::Io(ref e) if e.kind() == std::io::ErrorKind::NotFound
        ));
        assert!(err.to_string().contains("/nonexistent/prices.csv"));
    }

    #[test]
    fn write_into_missing_directory_is_io_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing/output.csv");
        let err = CsvAdapter::new()
            .write_actions(&path, &[TradingAction::Hold])
            .unwrap_err();
        assert!(matches!(err, TrendError::Io(_)));
    }

    #[test]
    fn write_actions_one_per_line() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("output.csv");
        CsvAdapter::new()
            .write_actions(
                &path,
                &[TradingAction::Buy, TradingAction::Hold, TradingAction::Sell],
            )
            .unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "1\n0\n-1\n");
    }

    #[test]
    fn write_empty_actions_creates_empty_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("output.csv");
        CsvAdapter::new().write_actions(&path, &[]).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "");
    }

    #[test]
    fn write_curve_values() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("curve.csv");
        CsvAdapter::new().write_curve(&path, &[0.25, -1.5]).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "0.25\n-1.5\n");
    }
}
