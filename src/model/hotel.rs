//! Hotel root record and its accessibility score

use super::ids::{HotelId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lowest score a hotel can carry
pub const MIN_SCORE: f64 = 0.0;
/// Highest score a hotel can carry
pub const MAX_SCORE: f64 = 10.0;

/// Error for a score outside [0, 10]
#[derive(Debug, Clone, PartialEq, Error)]
#[error("accessibility score {0} is outside [0, 10]")]
pub struct ScoreError(pub f64);

/// Accessibility score in the closed range [0, 10]
///
/// Checked on construction and on deserialization, so a row read back from
/// a store can never carry an out-of-range value.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct AccessibilityScore(f64);

impl AccessibilityScore {
    pub fn new(value: f64) -> Result<Self, ScoreError> {
        if value.is_finite() && (MIN_SCORE..=MAX_SCORE).contains(&value) {
            Ok(Self(value))
        } else {
            Err(ScoreError(value))
        }
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    pub fn band(&self) -> ScoreBand {
        ScoreBand::for_score(self.0)
    }
}

impl TryFrom<f64> for AccessibilityScore {
    type Error = ScoreError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<AccessibilityScore> for f64 {
    fn from(score: AccessibilityScore) -> Self {
        score.0
    }
}

impl std::fmt::Display for AccessibilityScore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.1}", self.0)
    }
}

/// Coarse rating used when presenting a score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreBand {
    /// 8 and above
    Good,
    /// 6 up to 8
    Fair,
    /// Below 6
    Poor,
}

impl ScoreBand {
    pub fn for_score(score: f64) -> Self {
        if score >= 8.0 {
            ScoreBand::Good
        } else if score >= 6.0 {
            ScoreBand::Fair
        } else {
            ScoreBand::Poor
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ScoreBand::Good => "good",
            ScoreBand::Fair => "fair",
            ScoreBand::Poor => "poor",
        }
    }
}

/// A persisted hotel row (`hotels` table)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hotel {
    pub id: HotelId,
    pub url: String,
    pub name: String,
    pub location: String,
    pub accessibility_score: Option<AccessibilityScore>,
    pub created_at: DateTime<Utc>,
    pub user_id: UserId,
}

/// Insert payload for a hotel row; id and created_at are assigned by the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewHotel {
    pub url: String,
    pub name: String,
    pub location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accessibility_score: Option<AccessibilityScore>,
    pub user_id: UserId,
}
