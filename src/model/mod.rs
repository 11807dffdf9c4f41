//! Records, identifiers and form input

mod hotel;
mod ids;
mod input;
mod records;

pub use hotel::{AccessibilityScore, Hotel, NewHotel, ScoreBand, ScoreError, MAX_SCORE, MIN_SCORE};
pub use ids::{HotelId, RecordId, UserId};
pub use input::{HotelInput, InputError};
pub use records::{
    AccessibilityFeature, ComplianceNote, HotelOwned, NewAccessibilityFeature, NewComplianceNote,
    NewSentimentInsight, SentimentInsight,
};

/// Table names shared by every store
pub mod table {
    pub const HOTELS: &str = "hotels";
    pub const FEATURES: &str = "accessibility_features";
    pub const COMPLIANCE_NOTES: &str = "compliance_notes";
    pub const SENTIMENT_INSIGHTS: &str = "sentiment_insights";
}
