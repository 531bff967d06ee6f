//! Timestamp alignment of a signal against a target series.

use ndarray::{Array1, ArrayView1, s};
use ronda_traits::{TimeSeries, Timestamp};

/// The inner-joined projection of a signal and a target.
///
/// # Invariants
///
/// - `index`, `signal` and `target` have the same length
/// - `index` is strictly increasing
/// - no value is NaN
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedPair {
    /// Shared timestamps.
    pub index: Vec<Timestamp>,
    /// Signal values at each timestamp.
    pub signal: Array1<f64>,
    /// Target values at each timestamp.
    pub target: Array1<f64>,
}

impl AlignedPair {
    /// Number of aligned rows.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Whether no rows survived alignment.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Views of the signal and target over rows `start..end`.
    pub fn window(&self, start: usize, end: usize) -> (ArrayView1<'_, f64>, ArrayView1<'_, f64>) {
        (
            self.signal.slice(s![start..end]),
            self.target.slice(s![start..end]),
        )
    }
}

/// Inner-joins two series on timestamp, keeping rows accepted by `keep`.
///
/// Both indexes are strictly increasing, so a single merge pass suffices.
pub fn align_with<A, B, F>(left: &TimeSeries<A>, right: &TimeSeries<B>, keep: F) -> Vec<(Timestamp, A, B)>
where
    A: Copy,
    B: Copy,
    F: Fn(&A, &B) -> bool,
{
    let (li, lv) = (left.index(), left.values());
    let (ri, rv) = (right.index(), right.values());
    let mut out = Vec::with_capacity(li.len().min(ri.len()));
    let (mut i, mut j) = (0, 0);
    while i < li.len() && j < ri.len() {
        match li[i].cmp(&ri[j]) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                if keep(&lv[i], &rv[j]) {
                    out.push((li[i], lv[i], rv[j]));
                }
                i += 1;
                j += 1;
            }
        }
    }
    out
}

/// Pairs `signal` and `target` by timestamp and drops rows where either is missing.
///
/// The result may hold fewer than two rows; statistics over such a pair are
/// undefined and callers report NaN or insufficient data.
///
/// # Example
///
/// ```rust,ignore
/// use ronda_eval::align;
///
/// let pair = align(&signal, &forward_returns);
/// println!("{} aligned rows", pair.len());
/// ```
pub fn align(signal: &TimeSeries<f64>, target: &TimeSeries<f64>) -> AlignedPair {
    let rows = align_with(signal, target, |s, t| !s.is_nan() && !t.is_nan());
    let mut index = Vec::with_capacity(rows.len());
    let mut sig = Vec::with_capacity(rows.len());
    let mut tgt = Vec::with_capacity(rows.len());
    for (ts, s, t) in rows {
        index.push(ts);
        sig.push(s);
        tgt.push(t);
    }
    AlignedPair {
        index,
        signal: Array1::from(sig),
        target: Array1::from(tgt),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ronda_traits::Timestamp::Ordinal;

    fn series(index: &[i64], values: &[f64]) -> TimeSeries<f64> {
        TimeSeries::new(index.iter().map(|&i| Ordinal(i)).collect(), values.to_vec()).unwrap()
    }

    #[test]
    fn test_align_inner_join_drops_missing() {
        let signal = series(&[1, 2, 3, 4, 5], &[0.1, f64::NAN, 0.3, 0.4, 0.5]);
        let target = series(&[2, 3, 4, 6], &[2.0, 3.0, f64::NAN, 6.0]);

        let pair = align(&signal, &target);
        assert_eq!(pair.len(), 1);
        assert_eq!(pair.index, vec![Ordinal(3)]);
        assert_eq!(pair.signal[0], 0.3);
        assert_eq!(pair.target[0], 3.0);
    }

    #[test]
    fn test_align_disjoint_is_empty() {
        let signal = series(&[1, 2], &[0.1, 0.2]);
        let target = series(&[3, 4], &[1.0, 2.0]);
        assert!(align(&signal, &target).is_empty());
    }

    #[test]
    fn test_window_views() {
        let signal = series(&[0, 1, 2, 3], &[1.0, 2.0, 3.0, 4.0]);
        let pair = align(&signal, &signal);
        let (s, t) = pair.window(1, 3);
        assert_eq!(s.to_vec(), vec![2.0, 3.0]);
        assert_eq!(t.to_vec(), vec![2.0, 3.0]);
    }
}
