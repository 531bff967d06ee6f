//! Factor scorecard.
//!
//! Grades a factor from its IC statistics and, when available, the
//! long/short spread of its quantile analysis.

use crate::analyzer::IcRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Score of a check that clears its upper threshold.
const HIGH: f64 = 1.0;
/// Score of a check that clears only its lower threshold.
const MID: f64 = 0.6;
/// Score of a check that clears neither threshold, or is undefined.
const LOW: f64 = 0.2;

/// Overall factor grade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Rating {
    /// Score below 0.4
    Poor,
    /// Score in `[0.4, 0.6)`
    Fair,
    /// Score in `[0.6, 0.8)`
    Good,
    /// Score of at least 0.8
    Excellent,
}

impl Rating {
    /// Rating of a mean check score.
    pub const fn from_score(score: f64) -> Self {
        if score >= 0.8 {
            Self::Excellent
        } else if score >= 0.6 {
            Self::Good
        } else if score >= 0.4 {
            Self::Fair
        } else {
            Self::Poor
        }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Poor => "Poor",
            Self::Fair => "Fair",
            Self::Good => "Good",
            Self::Excellent => "Excellent",
        };
        f.write_str(name)
    }
}

/// One graded criterion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreCheck {
    /// Criterion name
    pub name: &'static str,
    /// Input value that was graded
    pub value: f64,
    /// Awarded score
    pub score: f64,
}

/// Graded summary of a factor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FactorScorecard {
    /// Individual checks in evaluation order
    pub checks: Vec<ScoreCheck>,
    /// Mean of the check scores
    pub score: f64,
    /// Grade of `score`
    pub rating: Rating,
}

/// Grades `|value|` against two thresholds. NaN never clears a threshold.
const fn grade(value: f64, high: f64, mid: f64) -> f64 {
    let magnitude = value.abs();
    if magnitude > high {
        HIGH
    } else if magnitude > mid {
        MID
    } else {
        LOW
    }
}

impl FactorScorecard {
    /// Grade a factor.
    ///
    /// # Arguments
    ///
    /// * `ic_stats` - Per-horizon IC records; horizons 1 and 5 are graded
    /// * `long_short_return` - Spread between the top and bottom quantile,
    ///   graded when supplied
    ///
    /// A missing horizon grades as undefined.
    pub fn evaluate(ic_stats: &BTreeMap<usize, IcRecord>, long_short_return: Option<f64>) -> Self {
        let at = |h: usize| ic_stats.get(&h);
        let ic_1 = at(1).map_or(f64::NAN, |r| r.ic);
        let ic_ir_1 = at(1).map_or(f64::NAN, |r| r.ic_ir);
        let ic_5 = at(5).map_or(f64::NAN, |r| r.ic);

        let mut checks = vec![
            ScoreCheck {
                name: "ic_strength",
                value: ic_1,
                score: grade(ic_1, 0.05, 0.02),
            },
            ScoreCheck {
                name: "ic_stability",
                value: ic_ir_1,
                score: grade(ic_ir_1, 1.0, 0.5),
            },
            ScoreCheck {
                name: "ic_persistence",
                value: ic_5,
                score: grade(ic_5, 0.02, 0.01),
            },
        ];
        if let Some(spread) = long_short_return {
            checks.push(ScoreCheck {
                name: "layer_effect",
                value: spread,
                score: grade(spread, 0.005, 0.001),
            });
        }

        let score = checks.iter().map(|c| c.score).sum::<f64>() / checks.len() as f64;
        Self {
            checks,
            score,
            rating: Rating::from_score(score),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn record(ic: f64, ic_ir: f64) -> IcRecord {
        IcRecord {
            ic,
            ic_mean: ic,
            ic_std: 0.1,
            ic_ir,
            ic_win_rate: 0.5,
            ic_positive_rate: 0.3,
            ic_negative_rate: 0.2,
        }
    }

    #[test]
    fn test_grade_thresholds() {
        assert_eq!(grade(0.06, 0.05, 0.02), HIGH);
        assert_eq!(grade(-0.06, 0.05, 0.02), HIGH);
        assert_eq!(grade(0.03, 0.05, 0.02), MID);
        assert_eq!(grade(0.02, 0.05, 0.02), LOW);
        assert_eq!(grade(f64::NAN, 0.05, 0.02), LOW);
    }

    #[test]
    fn test_scorecard_with_layer_effect() {
        let stats = BTreeMap::from([(1, record(0.06, 0.7)), (5, record(0.005, 0.1))]);
        let card = FactorScorecard::evaluate(&stats, Some(0.01));

        assert_eq!(card.checks.len(), 4);
        assert_relative_eq!(card.score, 0.7, epsilon = 1e-12);
        assert_eq!(card.rating, Rating::Good);
    }

    #[test]
    fn test_scorecard_excellent() {
        let stats = BTreeMap::from([(1, record(-0.08, -1.5)), (5, record(-0.03, -0.4))]);
        let card = FactorScorecard::evaluate(&stats, None);

        assert_eq!(card.checks.len(), 3);
        assert_relative_eq!(card.score, 1.0, epsilon = 1e-12);
        assert_eq!(card.rating, Rating::Excellent);
    }

    #[test]
    fn test_scorecard_undefined_inputs() {
        let card = FactorScorecard::evaluate(&BTreeMap::new(), Some(f64::NAN));
        assert!(card.checks.iter().all(|c| c.score == LOW));
        assert_eq!(card.rating, Rating::Poor);
    }

    #[test]
    fn test_rating_boundaries() {
        assert_eq!(Rating::from_score(0.8), Rating::Excellent);
        assert_eq!(Rating::from_score(0.79), Rating::Good);
        assert_eq!(Rating::from_score(0.4), Rating::Fair);
        assert_eq!(Rating::from_score(0.39), Rating::Poor);
        assert_eq!(Rating::Good.to_string(), "Good");
    }
}
