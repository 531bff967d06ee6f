//! Time-indexed containers shared by every component.
//!
//! [`TimeSeries`] is the exchange format between the correlation engine, the
//! performance analyzer and the backtest engine. Its index is strictly
//! increasing, which every constructor checks.

use crate::{Result, RondaError};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Days between 0001-01-01 (CE) and 1970-01-01, used to decode Polars dates.
pub const CE_TO_UNIX_EPOCH_DAYS: i32 = 719_163;

/// A point on a time axis.
///
/// Indexes are either ordinal (bar number, row id) or calendar time. The
/// distinction matters for durations: ordinal spans are counted in steps,
/// calendar spans in elapsed days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Timestamp {
    /// Integer position on an ordinal axis.
    Ordinal(i64),
    /// Calendar date and time.
    Time(NaiveDateTime),
}

impl Timestamp {
    /// Returns true for an ordinal timestamp.
    pub const fn is_ordinal(&self) -> bool {
        matches!(self, Self::Ordinal(_))
    }

    /// Distance from `self` to `later`.
    ///
    /// Ordinal timestamps give their integer difference, calendar timestamps
    /// the number of whole elapsed days. Mixed kinds have no defined span.
    pub fn span_to(&self, later: &Self) -> Option<i64> {
        match (self, later) {
            (Self::Ordinal(a), Self::Ordinal(b)) => Some(b - a),
            (Self::Time(a), Self::Time(b)) => Some((*b - *a).num_days()),
            _ => None,
        }
    }
}

impl From<i64> for Timestamp {
    fn from(value: i64) -> Self {
        Self::Ordinal(value)
    }
}

impl From<NaiveDateTime> for Timestamp {
    fn from(value: NaiveDateTime) -> Self {
        Self::Time(value)
    }
}

impl From<NaiveDate> for Timestamp {
    fn from(value: NaiveDate) -> Self {
        Self::Time(value.and_time(NaiveTime::MIN))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ordinal(n) => write!(f, "{n}"),
            Self::Time(t) if t.time() == NaiveTime::MIN => write!(f, "{}", t.format("%Y-%m-%d")),
            Self::Time(t) => write!(f, "{}", t.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

/// An ordered mapping from timestamp to value.
///
/// # Invariants
///
/// - `index` and `values` have the same length
/// - `index` is strictly increasing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeries<T> {
    index: Vec<Timestamp>,
    values: Vec<T>,
}

/// A factor's value per timestamp. Missing entries are NaN.
pub type FactorSignal = TimeSeries<f64>;

impl<T> Default for TimeSeries<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T> TimeSeries<T> {
    /// Builds a series, validating length and ordering.
    ///
    /// # Errors
    ///
    /// Returns [`RondaError::InvalidData`] if the lengths differ or the index
    /// is not strictly increasing.
    pub fn new(index: Vec<Timestamp>, values: Vec<T>) -> Result<Self> {
        if index.len() != values.len() {
            return Err(RondaError::InvalidData(format!(
                "index has {} entries but values has {}",
                index.len(),
                values.len()
            )));
        }
        if let Some(pos) = index.windows(2).position(|w| w[0] >= w[1]) {
            return Err(RondaError::InvalidData(format!(
                "index must be strictly increasing ({} followed by {})",
                index[pos],
                index[pos + 1]
            )));
        }
        Ok(Self { index, values })
    }

    /// An empty series.
    pub const fn empty() -> Self {
        Self {
            index: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Builds a series on an ordinal index `0..n`.
    pub fn from_values(values: Vec<T>) -> Self {
        let index = (0..values.len() as i64).map(Timestamp::Ordinal).collect();
        Self { index, values }
    }

    /// Appends a point after the current last timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`RondaError::InvalidData`] if `timestamp` does not come after
    /// the last one already present.
    pub fn push(&mut self, timestamp: Timestamp, value: T) -> Result<()> {
        if let Some(last) = self.index.last()
            && *last >= timestamp
        {
            return Err(RondaError::InvalidData(format!(
                "cannot append {timestamp} after {last}"
            )));
        }
        self.index.push(timestamp);
        self.values.push(value);
        Ok(())
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Whether the series has no points.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// The timestamps, in increasing order.
    pub fn index(&self) -> &[Timestamp] {
        &self.index
    }

    /// The values, in index order.
    pub fn values(&self) -> &[T] {
        &self.values
    }

    /// Iterates over `(timestamp, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&Timestamp, &T)> {
        self.index.iter().zip(self.values.iter())
    }

    /// Looks up the value stored at `timestamp`.
    pub fn get(&self, timestamp: &Timestamp) -> Option<&T> {
        self.index
            .binary_search(timestamp)
            .ok()
            .map(|pos| &self.values[pos])
    }

    /// The last `(timestamp, value)` pair.
    pub fn last(&self) -> Option<(&Timestamp, &T)> {
        self.index.last().zip(self.values.last())
    }

    /// Applies `f` to every value, keeping the index.
    pub fn map<U, F>(&self, f: F) -> TimeSeries<U>
    where
        F: FnMut(&T) -> U,
    {
        TimeSeries {
            index: self.index.clone(),
            values: self.values.iter().map(f).collect(),
        }
    }

    /// Consumes the series and returns its index and values.
    pub fn into_parts(self) -> (Vec<Timestamp>, Vec<T>) {
        (self.index, self.values)
    }
}

impl TimeSeries<f64> {
    /// Shifts values by `periods` positions, filling vacated slots with NaN.
    ///
    /// A negative shift pulls future values back: after `shift(-h)` the
    /// value at position `i` is the original value at `i + h`.
    pub fn shift(&self, periods: isize) -> Self {
        let n = self.values.len();
        let values = (0..n)
            .map(|i| {
                let src = i as isize - periods;
                if src >= 0 && (src as usize) < n {
                    self.values[src as usize]
                } else {
                    f64::NAN
                }
            })
            .collect();
        Self {
            index: self.index.clone(),
            values,
        }
    }

    /// Single-period simple return `x[t] / x[t-1] - 1`.
    ///
    /// Missing values are padded with the last finite value first, so a gap
    /// reads as a flat step and the change after it is measured from the last
    /// observed value. Points before the first finite value, and changes from
    /// a zero value, are NaN.
    pub fn pct_change(&self) -> Self {
        let mut last: Option<f64> = None;
        let values = self
            .values
            .iter()
            .map(|&x| {
                let current = if x.is_finite() { Some(x) } else { last };
                let change = match (last, current) {
                    (Some(prev), Some(cur)) if prev != 0.0 => cur / prev - 1.0,
                    _ => f64::NAN,
                };
                last = current;
                change
            })
            .collect();
        Self {
            index: self.index.clone(),
            values,
        }
    }

    /// Drops points whose value is not finite.
    pub fn dropna(&self) -> Self {
        let (index, values) = self
            .iter()
            .filter(|(_, v)| v.is_finite())
            .map(|(t, v)| (*t, *v))
            .unzip();
        Self { index, values }
    }

    /// Number of finite values.
    pub fn count_finite(&self) -> usize {
        self.values.iter().filter(|v| v.is_finite()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(n: i64) -> Timestamp {
        Timestamp::Ordinal(n)
    }

    #[test]
    fn test_new_rejects_unordered_index() {
        let err = TimeSeries::new(vec![ts(0), ts(2), ts(1)], vec![1.0, 2.0, 3.0]);
        assert!(matches!(err, Err(RondaError::InvalidData(_))));

        let err = TimeSeries::new(vec![ts(0), ts(0)], vec![1.0, 2.0]);
        assert!(err.is_err());
    }

    #[test]
    fn test_new_rejects_length_mismatch() {
        let err = TimeSeries::new(vec![ts(0), ts(1)], vec![1.0]);
        assert!(matches!(err, Err(RondaError::InvalidData(_))));
    }

    #[test]
    fn test_push_and_get() {
        let mut series = TimeSeries::empty();
        series.push(ts(1), 10.0).unwrap();
        series.push(ts(3), 30.0).unwrap();
        assert!(series.push(ts(2), 20.0).is_err());

        assert_eq!(series.len(), 2);
        assert_eq!(series.get(&ts(3)), Some(&30.0));
        assert_eq!(series.get(&ts(2)), None);
    }

    #[test]
    fn test_shift_backward_gives_forward_values() {
        let series = TimeSeries::from_values(vec![1.0, 2.0, 3.0, 4.0]);
        let shifted = series.shift(-2);
        assert_eq!(&shifted.values()[..2], &[3.0, 4.0]);
        assert!(shifted.values()[2].is_nan());
        assert!(shifted.values()[3].is_nan());

        let lagged = series.shift(1);
        assert!(lagged.values()[0].is_nan());
        assert_eq!(&lagged.values()[1..], &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_pct_change() {
        let series = TimeSeries::from_values(vec![100.0, 110.0, f64::NAN, 99.0]);
        let returns = series.pct_change();
        assert!(returns.values()[0].is_nan());
        assert!((returns.values()[1] - 0.1).abs() < 1e-12);
        assert_eq!(returns.values()[2], 0.0);
        // Measured from 110, the last close before the gap.
        assert!((returns.values()[3] + 0.1).abs() < 1e-12);
        assert_eq!(returns.dropna().len(), 3);
    }

    #[test]
    fn test_pct_change_leading_gap_and_zero() {
        let series = TimeSeries::from_values(vec![f64::NAN, 0.0, 5.0, 10.0]);
        let returns = series.pct_change();
        assert!(returns.values()[0].is_nan());
        assert!(returns.values()[1].is_nan());
        assert!(returns.values()[2].is_nan());
        assert!((returns.values()[3] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_span_to() {
        let a = Timestamp::from(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        let b = Timestamp::from(NaiveDate::from_ymd_opt(2024, 1, 11).unwrap());
        assert_eq!(a.span_to(&b), Some(10));
        assert_eq!(ts(3).span_to(&ts(7)), Some(4));
        assert_eq!(a.span_to(&ts(7)), None);
    }

    #[test]
    fn test_timestamp_display() {
        let day = Timestamp::from(NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());
        assert_eq!(day.to_string(), "2024-03-05");
        assert_eq!(ts(42).to_string(), "42");
    }
}
