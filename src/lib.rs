//! hotelcheck: hotel accessibility analysis pipeline
//!
//! Takes a hotel's URL, name and location, asks a scoring engine for an
//! accessibility assessment and persists the result as one hotel row plus
//! its feature checklist, compliance notes and guest-sentiment insights.
//!
//! # Core Concepts
//!
//! - **Hotel**: root record of one analysis, owned by the submitting user
//! - **Dependent records**: features, compliance notes and sentiment
//!   insights, each pointing at exactly one hotel
//! - **Collaborators**: `AuthProvider`, `HotelStore` and `ScoringEngine`
//!   are traits, passed into the orchestrator explicitly
//!
//! # Example
//!
//! ```
//! use hotelcheck::{HotelInput, ScoreBand, AccessibilityScore};
//!
//! let input = HotelInput::new("https://example.com", "Grand Hotel", "Paris, France");
//! assert!(input.validate().is_ok());
//! assert_eq!(AccessibilityScore::new(7.5).unwrap().band(), ScoreBand::Fair);
//! ```

pub mod analysis;
pub mod auth;
pub mod config;
mod http;
pub mod model;
pub mod report;
pub mod scoring;
pub mod storage;

pub use analysis::{
    AnalysisError, AnalysisOrchestrator, AnalysisSession, AnalysisState, HotelAnalysis,
    RollbackPolicy, SessionView, Stage,
};
pub use auth::{AuthError, AuthProvider, RestAuth, StaticAuth, UserIdentity};
pub use config::{ConfigError, RemoteConfig};
pub use model::{
    AccessibilityFeature, AccessibilityScore, ComplianceNote, Hotel, HotelId, HotelInput,
    InputError, RecordId, ScoreBand, SentimentInsight, UserId,
};
pub use scoring::{Assessment, FeatureFinding, MockScoringEngine, ScoringEngine, ScoringError};
pub use storage::{
    HotelStore, OpenStore, RestStore, RowCounts, SqliteStore, StorageError, StorageResult,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
