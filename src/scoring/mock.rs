//! Fixed-output scoring engine
//!
//! Returns the same assessment for every hotel. Used until a real engine
//! exists, and as a deterministic fixture in tests.

use super::{Assessment, FeatureFinding, ScoringEngine, ScoringError};
use crate::model::{AccessibilityScore, HotelInput};
use async_trait::async_trait;

const MOCK_SCORE: f64 = 7.5;

pub struct MockScoringEngine {
    assessment: Assessment,
}

impl Default for MockScoringEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MockScoringEngine {
    pub fn new() -> Self {
        Self {
            assessment: Self::canned(),
        }
    }

    /// Serve a caller-supplied assessment instead of the canned one
    pub fn with_assessment(assessment: Assessment) -> Self {
        Self { assessment }
    }

    fn canned() -> Assessment {
        Assessment {
            accessibility_score: AccessibilityScore::new(MOCK_SCORE).ok(),
            features: vec![
                FeatureFinding::new(
                    "Wheelchair Access",
                    true,
                    "Ramps and elevator access throughout the property",
                ),
                FeatureFinding::new(
                    "Braille Signage",
                    true,
                    "Available in elevators and room numbers",
                ),
                FeatureFinding::new("Hearing Loops", false, "Not available in conference rooms"),
                FeatureFinding::new(
                    "Accessible Bathrooms",
                    true,
                    "Modified bathrooms in all public areas",
                ),
            ],
            compliance_notes: vec![
                "Meets ADA requirements for entrance accessibility".to_string(),
                "Emergency evacuation procedures need updating".to_string(),
                "Staff training on accessibility assistance recommended".to_string(),
            ],
            sentiment_insights: vec![
                "Positive feedback on wheelchair accessibility and staff assistance".to_string(),
                "Some concerns about limited availability of accessible rooms".to_string(),
                "High praise for clear signage and navigation".to_string(),
            ],
        }
    }
}

#[async_trait]
impl ScoringEngine for MockScoringEngine {
    fn id(&self) -> &str {
        "mock"
    }

    async fn assess(&self, _input: &HotelInput) -> Result<Assessment, ScoringError> {
        Ok(self.assessment.clone())
    }
}
