//! Hotel analysis pipeline
//!
//! # Architecture
//!
//! - **AnalysisOrchestrator**: authenticates the caller, asks the scoring
//!   engine for an assessment, writes the hotel row and its three dependent
//!   batches, and returns the aggregate
//! - **AnalysisSession**: busy flag, progress and last result for
//!   interactive callers
//!
//! # Example
//!
//! ```no_run
//! use hotelcheck::{
//!     AnalysisOrchestrator, HotelInput, MockScoringEngine, OpenStore, SqliteStore, StaticAuth,
//!     UserIdentity,
//! };
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let orchestrator = AnalysisOrchestrator::new(
//!     Arc::new(StaticAuth::signed_in(UserIdentity::new("alice"))),
//!     Arc::new(SqliteStore::open_in_memory()?),
//!     Arc::new(MockScoringEngine::new()),
//! );
//!
//! let input = HotelInput::new("https://example.com", "Grand Hotel", "Paris, France");
//! let analysis = orchestrator.analyze_hotel(&input).await?;
//! assert_eq!(analysis.features.len(), 4);
//! # Ok(())
//! # }
//! ```

mod orchestrator;
mod session;
mod types;

pub use orchestrator::AnalysisOrchestrator;
pub use session::{AnalysisSession, SessionView};
pub use types::{AnalysisError, AnalysisState, HotelAnalysis, RollbackPolicy, Stage};
