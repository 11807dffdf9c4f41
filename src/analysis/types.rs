//! Types shared by the orchestrator and the session

use crate::auth::AuthError;
use crate::model::{
    AccessibilityFeature, ComplianceNote, Hotel, InputError, SentimentInsight,
};
use crate::storage::StorageError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One hotel with everything persisted for it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotelAnalysis {
    pub hotel: Hotel,
    pub features: Vec<AccessibilityFeature>,
    pub compliance: Vec<ComplianceNote>,
    pub sentiment: Vec<SentimentInsight>,
}

impl HotelAnalysis {
    pub fn available_feature_count(&self) -> usize {
        self.features.iter().filter(|f| f.available).count()
    }

    /// True when every dependent row points at `self.hotel`
    pub fn is_consistent(&self) -> bool {
        let id = self.hotel.id;
        self.features.iter().all(|f| f.hotel_id == id)
            && self.compliance.iter().all(|n| n.hotel_id == id)
            && self.sentiment.iter().all(|s| s.hotel_id == id)
    }
}

/// Persistence step that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Hotel,
    Features,
    Compliance,
    Sentiment,
    /// Reading an analysis back
    Read,
}

impl Stage {
    pub fn failure(&self) -> &'static str {
        match self {
            Stage::Hotel => "hotel create failed",
            Stage::Features => "features create failed",
            Stage::Compliance => "compliance create failed",
            Stage::Sentiment => "sentiment create failed",
            Stage::Read => "analysis read failed",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Hotel => "hotel",
            Stage::Features => "features",
            Stage::Compliance => "compliance",
            Stage::Sentiment => "sentiment",
            Stage::Read => "read",
        };
        f.write_str(name)
    }
}

/// Errors that end an analysis
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InputError),

    #[error("unauthenticated: {0}")]
    Unauthenticated(AuthError),

    #[error("{}: {source}", .stage.failure())]
    Persistence {
        stage: Stage,
        #[source]
        source: StorageError,
    },

    #[error("unexpected error: {0}")]
    Unexpected(String),

    #[error("an analysis is already in progress")]
    Busy,
}

impl AnalysisError {
    pub fn persistence(stage: Stage) -> impl FnOnce(StorageError) -> Self {
        move |source| AnalysisError::Persistence { stage, source }
    }

    /// The failed stage, for persistence errors
    pub fn stage(&self) -> Option<Stage> {
        match self {
            AnalysisError::Persistence { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// The single message shown to the person who submitted the form
    pub fn user_message(&self) -> String {
        match self {
            AnalysisError::InvalidInput(e) => format!("Invalid input: {}", e),
            AnalysisError::Unauthenticated(_) => {
                "You must be logged in to analyze hotels".to_string()
            }
            AnalysisError::Persistence { stage, .. } => match stage {
                Stage::Hotel => "Failed to create hotel entry",
                Stage::Features => "Failed to create accessibility features",
                Stage::Compliance => "Failed to create compliance notes",
                Stage::Sentiment => "Failed to create sentiment insights",
                Stage::Read => "Failed to load hotel analysis",
            }
            .to_string(),
            AnalysisError::Unexpected(_) => "An unexpected error occurred".to_string(),
            AnalysisError::Busy => "An analysis is already in progress".to_string(),
        }
    }
}

/// Progress of one analysis invocation
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", content = "reason", rename_all = "snake_case")]
pub enum AnalysisState {
    #[default]
    Idle,
    Authenticating,
    CreatingHotel,
    CreatingFeatures,
    CreatingCompliance,
    CreatingSentiment,
    Done,
    Failed(String),
}

impl AnalysisState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, AnalysisState::Done | AnalysisState::Failed(_))
    }

    /// The state that follows this one on success
    pub fn next(&self) -> Option<AnalysisState> {
        use AnalysisState::*;
        match self {
            Idle => Some(Authenticating),
            Authenticating => Some(CreatingHotel),
            CreatingHotel => Some(CreatingFeatures),
            CreatingFeatures => Some(CreatingCompliance),
            CreatingCompliance => Some(CreatingSentiment),
            CreatingSentiment => Some(Done),
            Done | Failed(_) => None,
        }
    }

    pub fn can_transition_to(&self, to: &AnalysisState) -> bool {
        match to {
            AnalysisState::Failed(_) => !self.is_terminal(),
            other => self.next().as_ref() == Some(other),
        }
    }
}

impl std::fmt::Display for AnalysisState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnalysisState::Idle => f.write_str("idle"),
            AnalysisState::Authenticating => f.write_str("authenticating"),
            AnalysisState::CreatingHotel => f.write_str("creating hotel"),
            AnalysisState::CreatingFeatures => f.write_str("creating features"),
            AnalysisState::CreatingCompliance => f.write_str("creating compliance notes"),
            AnalysisState::CreatingSentiment => f.write_str("creating sentiment insights"),
            AnalysisState::Done => f.write_str("done"),
            AnalysisState::Failed(reason) => write!(f, "failed: {}", reason),
        }
    }
}

/// What to do with already written rows when a dependent stage fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RollbackPolicy {
    /// Delete the hotel and whatever dependent rows made it in
    #[default]
    Compensate,
    /// Leave the partial analysis in place
    Leave,
}
