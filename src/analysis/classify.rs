//! Thresholded classification of scores and score movement, shared by the
//! factor, module and index levels.

use serde::{Deserialize, Serialize};

pub const SUPPORTIVE_THRESHOLD: f64 = 66.0;
pub const NEUTRAL_THRESHOLD: f64 = 33.0;

/// Observations between "now" and the comparison point for velocity.
pub const VELOCITY_LOOKBACK: usize = 7;
pub const VELOCITY_THRESHOLD: f64 = 2.0;

/// Trend direction compares the first and last of this many recent observations.
pub const TREND_OBSERVATIONS: usize = 3;
pub const MODULE_TREND_THRESHOLD: f64 = 1.0;
pub const INDEX_TREND_THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Movement {
    Up,
    Down,
    Flat,
}

/// `diff > threshold` is up, `diff < -threshold` is down, anything else flat.
pub fn classify_move(diff: f64, threshold: f64) -> Movement {
    if diff > threshold {
        Movement::Up
    } else if diff < -threshold {
        Movement::Down
    } else {
        Movement::Flat
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Supportive,
    Neutral,
    Restrictive,
}

impl Status {
    pub fn from_score(score: f64) -> Self {
        if score >= SUPPORTIVE_THRESHOLD {
            Status::Supportive
        } else if score >= NEUTRAL_THRESHOLD {
            Status::Neutral
        } else {
            Status::Restrictive
        }
    }

    /// Display color used by the dashboard
    pub fn color(&self) -> &'static str {
        match self {
            Status::Supportive => "#14b8a6",
            Status::Neutral => "#f97316",
            Status::Restrictive => "#ef4444",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Velocity {
    Rising,
    Falling,
    Flat,
}

impl Velocity {
    /// Latest score against the one `VELOCITY_LOOKBACK` observations earlier.
    /// Flat when the history is too short.
    pub fn from_history(scores: &[f64]) -> Self {
        if scores.len() < VELOCITY_LOOKBACK + 1 {
            return Velocity::Flat;
        }
        let now = scores[scores.len() - 1];
        let past = scores[scores.len() - 1 - VELOCITY_LOOKBACK];
        match classify_move(now - past, VELOCITY_THRESHOLD) {
            Movement::Up => Velocity::Rising,
            Movement::Down => Velocity::Falling,
            Movement::Flat => Velocity::Flat,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Improving,
    Declining,
    Stable,
}

impl TrendDirection {
    /// Last value against the first of the most recent `TREND_OBSERVATIONS`.
    /// Needs at least two observations; otherwise stable.
    pub fn from_recent(scores: &[f64], threshold: f64) -> Self {
        let recent = &scores[scores.len().saturating_sub(TREND_OBSERVATIONS)..];
        if recent.len() < 2 {
            return TrendDirection::Stable;
        }
        match classify_move(recent[recent.len() - 1] - recent[0], threshold) {
            Movement::Up => TrendDirection::Improving,
            Movement::Down => TrendDirection::Declining,
            Movement::Flat => TrendDirection::Stable,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeDirection {
    Up,
    Down,
    Flat,
}

impl ChangeDirection {
    pub fn between(value: f64, previous: f64) -> Self {
        match classify_move(value - previous, 0.0) {
            Movement::Up => ChangeDirection::Up,
            Movement::Down => ChangeDirection::Down,
            Movement::Flat => ChangeDirection::Flat,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_boundaries() {
        assert_eq!(Status::from_score(66.0), Status::Supportive);
        assert_eq!(Status::from_score(65.9), Status::Neutral);
        assert_eq!(Status::from_score(33.0), Status::Neutral);
        assert_eq!(Status::from_score(32.9), Status::Restrictive);
        assert_eq!(Status::from_score(0.0), Status::Restrictive);
        assert_eq!(Status::from_score(100.0), Status::Supportive);
    }

    #[test]
    fn test_velocity() {
        let rising = [50.0, 50.0, 50.0, 50.0, 50.0, 50.0, 50.0, 52.5];
        assert_eq!(Velocity::from_history(&rising), Velocity::Rising);

        let falling = [60.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 57.9];
        assert_eq!(Velocity::from_history(&falling), Velocity::Falling);

        // exactly +2 is not rising
        let edge = [50.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 52.0];
        assert_eq!(Velocity::from_history(&edge), Velocity::Flat);

        // fewer than 8 observations
        let short = [0.0, 100.0, 100.0, 100.0, 100.0, 100.0, 100.0];
        assert_eq!(Velocity::from_history(&short), Velocity::Flat);
    }

    #[test]
    fn test_trend_direction() {
        assert_eq!(
            TrendDirection::from_recent(&[10.0, 40.0, 41.0, 42.5], MODULE_TREND_THRESHOLD),
            TrendDirection::Improving
        );
        assert_eq!(
            TrendDirection::from_recent(&[40.0, 41.0, 39.0], MODULE_TREND_THRESHOLD),
            TrendDirection::Declining
        );
        assert_eq!(
            TrendDirection::from_recent(&[40.0, 45.0, 40.8], MODULE_TREND_THRESHOLD),
            TrendDirection::Stable
        );
        assert_eq!(
            TrendDirection::from_recent(&[40.0, 40.8], INDEX_TREND_THRESHOLD),
            TrendDirection::Improving
        );
        assert_eq!(TrendDirection::from_recent(&[40.0], 0.5), TrendDirection::Stable);
        assert_eq!(TrendDirection::from_recent(&[], 0.5), TrendDirection::Stable);
    }
}
