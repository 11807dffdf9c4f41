//! Scoring collaborators
//!
//! A `ScoringEngine` turns a submitted hotel into an `Assessment`: the
//! score plus the feature checklist, compliance notes and guest-sentiment
//! insights that get persisted alongside the hotel. A real engine (site
//! crawler, review mining, rule checks) plugs in here; the orchestrator only
//! persists what it is handed.

mod mock;

pub use mock::MockScoringEngine;

use crate::model::{
    AccessibilityScore, HotelId, HotelInput, NewAccessibilityFeature, NewComplianceNote,
    NewSentimentInsight,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScoringError {
    #[error("assessment failed for {url}: {reason}")]
    Failed { url: String, reason: String },
}

/// One checklist entry produced by an engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureFinding {
    pub name: String,
    pub available: bool,
    pub description: Option<String>,
}

impl FeatureFinding {
    pub fn new(name: impl Into<String>, available: bool, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            available,
            description: Some(description.into()),
        }
    }
}

/// Everything an engine says about one hotel
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Assessment {
    pub accessibility_score: Option<AccessibilityScore>,
    pub features: Vec<FeatureFinding>,
    pub compliance_notes: Vec<String>,
    pub sentiment_insights: Vec<String>,
}

impl Assessment {
    pub fn feature_rows(&self, hotel_id: HotelId) -> Vec<NewAccessibilityFeature> {
        self.features
            .iter()
            .map(|f| NewAccessibilityFeature {
                hotel_id,
                name: f.name.clone(),
                available: f.available,
                description: f.description.clone(),
            })
            .collect()
    }

    pub fn compliance_rows(&self, hotel_id: HotelId) -> Vec<NewComplianceNote> {
        self.compliance_notes
            .iter()
            .map(|note| NewComplianceNote {
                hotel_id,
                note: note.clone(),
            })
            .collect()
    }

    pub fn sentiment_rows(&self, hotel_id: HotelId) -> Vec<NewSentimentInsight> {
        self.sentiment_insights
            .iter()
            .map(|insight| NewSentimentInsight {
                hotel_id,
                insight: insight.clone(),
            })
            .collect()
    }
}

/// Trait for accessibility scoring engines
#[async_trait]
pub trait ScoringEngine: Send + Sync {
    /// Short identifier used in logs
    fn id(&self) -> &str;

    /// Assess the hotel described by `input`
    async fn assess(&self, input: &HotelInput) -> Result<Assessment, ScoringError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_carry_hotel_id() {
        let assessment = Assessment {
            accessibility_score: None,
            features: vec![FeatureFinding::new("Ramp", true, "Front entrance")],
            compliance_notes: vec!["a".into(), "b".into()],
            sentiment_insights: vec!["c".into()],
        };
        let hotel_id = HotelId::new();

        let features = assessment.feature_rows(hotel_id);
        assert_eq!(features.len(), 1);
        assert_eq!(features[0].description.as_deref(), Some("Front entrance"));

        assert!(assessment
            .compliance_rows(hotel_id)
            .iter()
            .all(|r| r.hotel_id == hotel_id));
        assert_eq!(assessment.sentiment_rows(hotel_id)[0].insight, "c");
    }
}
