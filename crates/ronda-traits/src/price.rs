//! Price tables and their ingestion from Polars DataFrames.

use crate::types::{CE_TO_UNIX_EPOCH_DAYS, FactorSignal, TimeSeries, Timestamp};
use crate::{Result, RondaError};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Column names accepted as the time index, in lookup order.
pub const TIMESTAMP_COLUMNS: [&str; 4] = ["timestamp", "datetime", "date", "time"];

/// One bar of a price table. Only `close` is required.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    /// Opening price.
    pub open: Option<f64>,
    /// Highest price.
    pub high: Option<f64>,
    /// Lowest price.
    pub low: Option<f64>,
    /// Closing price. NaN when missing.
    pub close: f64,
    /// Traded volume.
    pub volume: Option<f64>,
}

impl PriceBar {
    /// A bar carrying only a close price.
    pub const fn from_close(close: f64) -> Self {
        Self {
            open: None,
            high: None,
            low: None,
            close,
            volume: None,
        }
    }
}

/// A time-ascending table of price bars.
pub type PriceTable = TimeSeries<PriceBar>;

impl TimeSeries<PriceBar> {
    /// Builds a price table with only close prices on an ordinal index.
    pub fn from_closes(closes: &[f64]) -> Self {
        Self::from_values(closes.iter().copied().map(PriceBar::from_close).collect())
    }

    /// The close column as its own series.
    pub fn close(&self) -> FactorSignal {
        self.map(|bar| bar.close)
    }
}

/// Finds a column by trimmed, case-insensitive name.
fn find_column<'a>(df: &'a DataFrame, name: &str) -> Option<&'a Column> {
    df.get_columns()
        .iter()
        .find(|c| c.name().trim().eq_ignore_ascii_case(name))
}

/// Reads a numeric column as `f64`, mapping nulls to NaN.
///
/// String columns are parsed strictly; any other type is rejected.
fn numeric_values(column: &Column) -> Result<Vec<f64>> {
    let series = column.as_materialized_series();
    let cast = match series.dtype() {
        DataType::Float64 => series.clone(),
        DataType::Float32
        | DataType::Int8
        | DataType::Int16
        | DataType::Int32
        | DataType::Int64
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32
        | DataType::UInt64 => series.cast(&DataType::Float64)?,
        DataType::String => series.strict_cast(&DataType::Float64).map_err(|_| {
            RondaError::InvalidData(format!("column '{}' is not numeric", column.name()))
        })?,
        other => {
            return Err(RondaError::InvalidData(format!(
                "column '{}' has non-numeric type {other}",
                column.name()
            )));
        }
    };
    Ok(cast
        .f64()?
        .into_iter()
        .map(|v| v.unwrap_or(f64::NAN))
        .collect())
}

fn parse_time_str(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date.and_time(NaiveTime::MIN));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|dt| dt.naive_utc())
        })
}

fn missing_timestamp(row: usize) -> RondaError {
    RondaError::InvalidData(format!("missing or unparsable timestamp at row {row}"))
}

/// Decodes the index column into timestamps.
fn timestamp_values(column: &Column) -> Result<Vec<Timestamp>> {
    let series = column.as_materialized_series();
    let decoded: Vec<Option<Timestamp>> = match series.dtype() {
        DataType::Date => series
            .date()?
            .into_iter()
            .map(|d: Option<i32>| {
                d.and_then(|days| NaiveDate::from_num_days_from_ce_opt(days + CE_TO_UNIX_EPOCH_DAYS))
                    .map(Timestamp::from)
            })
            .collect(),
        DataType::Datetime(unit, _) => {
            let unit = *unit;
            series
                .datetime()?
                .into_iter()
                .map(|v: Option<i64>| {
                    v.and_then(|raw| match unit {
                        TimeUnit::Milliseconds => DateTime::from_timestamp_millis(raw),
                        TimeUnit::Microseconds => DateTime::from_timestamp_micros(raw),
                        TimeUnit::Nanoseconds => Some(DateTime::from_timestamp_nanos(raw)),
                    })
                    .map(|dt| Timestamp::Time(dt.naive_utc()))
                })
                .collect()
        }
        DataType::Int8
        | DataType::Int16
        | DataType::Int32
        | DataType::Int64
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32 => series
            .cast(&DataType::Int64)?
            .i64()?
            .into_iter()
            .map(|v| v.map(Timestamp::Ordinal))
            .collect(),
        DataType::String => series
            .str()?
            .into_iter()
            .map(|v| v.and_then(parse_time_str).map(Timestamp::Time))
            .collect(),
        other => {
            return Err(RondaError::InvalidData(format!(
                "column '{}' of type {other} cannot be used as a timestamp",
                column.name()
            )));
        }
    };

    decoded
        .into_iter()
        .enumerate()
        .map(|(row, t)| t.ok_or_else(|| missing_timestamp(row)))
        .collect()
}

/// Locates and decodes the time index, falling back to the row number.
fn index_of(df: &DataFrame) -> Result<Vec<Timestamp>> {
    match TIMESTAMP_COLUMNS.iter().find_map(|name| find_column(df, name)) {
        Some(column) => timestamp_values(column),
        None => Ok((0..df.height() as i64).map(Timestamp::Ordinal).collect()),
    }
}

/// Sorts rows by timestamp and rejects duplicates.
fn sorted_series<T>(index: Vec<Timestamp>, values: Vec<T>) -> Result<TimeSeries<T>> {
    let mut rows: Vec<(Timestamp, T)> = index.into_iter().zip(values).collect();
    rows.sort_by(|a, b| a.0.cmp(&b.0));
    if let Some(w) = rows.windows(2).find(|w| w[0].0 == w[1].0) {
        return Err(RondaError::InvalidData(format!(
            "duplicate timestamp {}",
            w[0].0
        )));
    }
    let (index, values) = rows.into_iter().unzip();
    TimeSeries::new(index, values)
}

impl TryFrom<&DataFrame> for PriceTable {
    type Error = RondaError;

    /// Reads a price table from a DataFrame.
    ///
    /// Column names are matched after trimming and lower-casing, so `Close`
    /// and ` close ` both resolve to `close`. The index comes from the first
    /// of [`TIMESTAMP_COLUMNS`] present, or the row number if none is.
    fn try_from(df: &DataFrame) -> Result<Self> {
        let close = find_column(df, "close")
            .ok_or_else(|| RondaError::MissingColumn("close".to_string()))
            .and_then(numeric_values)?;

        let optional = |name: &str| -> Result<Option<Vec<f64>>> {
            find_column(df, name).map(numeric_values).transpose()
        };
        let open = optional("open")?;
        let high = optional("high")?;
        let low = optional("low")?;
        let volume = optional("volume")?;

        let pick = |col: &Option<Vec<f64>>, row: usize| {
            col.as_ref().map(|v| v[row]).filter(|v| v.is_finite())
        };
        let bars = (0..df.height())
            .map(|row| PriceBar {
                open: pick(&open, row),
                high: pick(&high, row),
                low: pick(&low, row),
                close: close[row],
                volume: pick(&volume, row),
            })
            .collect();

        sorted_series(index_of(df)?, bars)
    }
}

/// Reads one precomputed factor column of a DataFrame as a signal.
///
/// Uses the same index rules as the price table reader, so the signal aligns
/// with a [`PriceTable`] built from the same frame.
///
/// # Errors
///
/// Returns [`RondaError::MissingColumn`] if `name` is absent and
/// [`RondaError::InvalidData`] if it is not numeric.
pub fn signal_from_column(df: &DataFrame, name: &str) -> Result<FactorSignal> {
    let column = find_column(df, name).ok_or_else(|| RondaError::MissingColumn(name.to_string()))?;
    sorted_series(index_of(df)?, numeric_values(column)?)
}

/// Names of numeric columns that are neither prices nor the time index.
///
/// These are the candidate factor columns of a research frame.
pub fn factor_columns(df: &DataFrame) -> Vec<String> {
    const RESERVED: [&str; 5] = ["open", "high", "low", "close", "volume"];
    df.get_columns()
        .iter()
        .filter(|c| {
            let name = c.name().trim().to_ascii_lowercase();
            !RESERVED.contains(&name.as_str()) && !TIMESTAMP_COLUMNS.contains(&name.as_str())
        })
        .filter(|c| {
            matches!(
                c.dtype(),
                DataType::Float32 | DataType::Float64 | DataType::Int32 | DataType::Int64
            )
        })
        .map(|c| c.name().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_table_normalizes_column_names() {
        let df = df! {
            "Date" => &["2024-01-03", "2024-01-02", "2024-01-04"],
            "Close" => &[101.0, 100.0, 99.0],
            "Volume" => &[10.0, 20.0, 30.0],
        }
        .unwrap();

        let table = PriceTable::try_from(&df).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.index()[0].to_string(), "2024-01-02");
        assert_eq!(table.values()[0].close, 100.0);
        assert_eq!(table.values()[0].volume, Some(20.0));
        assert_eq!(table.values()[0].open, None);
    }

    #[test]
    fn test_price_table_requires_close() {
        let df = df! { "open" => &[1.0, 2.0] }.unwrap();
        let err = PriceTable::try_from(&df).unwrap_err();
        assert!(matches!(err, RondaError::MissingColumn(c) if c == "close"));
    }

    #[test]
    fn test_price_table_without_index_uses_row_numbers() {
        let df = df! { "close" => &[1.0, 2.0, 3.0] }.unwrap();
        let table = PriceTable::try_from(&df).unwrap();
        assert_eq!(table.index()[2], Timestamp::Ordinal(2));
    }

    #[test]
    fn test_duplicate_timestamps_rejected() {
        let df = df! {
            "timestamp" => &[1i64, 1],
            "close" => &[1.0, 2.0],
        }
        .unwrap();
        assert!(matches!(
            PriceTable::try_from(&df),
            Err(RondaError::InvalidData(_))
        ));
    }

    #[test]
    fn test_non_numeric_signal_rejected() {
        let df = df! {
            "close" => &[1.0, 2.0],
            "momentum" => &["high", "low"],
        }
        .unwrap();
        assert!(matches!(
            signal_from_column(&df, "momentum"),
            Err(RondaError::InvalidData(_))
        ));
    }

    #[test]
    fn test_signal_from_column_keeps_missing_as_nan() {
        let df = df! {
            "timestamp" => &[0i64, 1, 2],
            "close" => &[1.0, 2.0, 3.0],
            "alpha" => &[Some(0.5), None, Some(-0.5)],
        }
        .unwrap();
        let signal = signal_from_column(&df, "alpha").unwrap();
        assert_eq!(signal.len(), 3);
        assert!(signal.values()[1].is_nan());
        assert_eq!(factor_columns(&df), vec!["alpha".to_string()]);
    }
}
