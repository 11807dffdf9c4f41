//! Storage trait definitions

use crate::model::{
    AccessibilityFeature, ComplianceNote, Hotel, HotelId, NewAccessibilityFeature,
    NewComplianceNote, NewHotel, NewSentimentInsight, SentimentInsight, UserId,
};
use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Date parsing error: {0}")]
    DateParse(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Store rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Insert into {0} returned no row")]
    NoRowReturned(&'static str),

    #[error("Invalid row in {table}: {reason}")]
    InvalidRow { table: &'static str, reason: String },

    #[error("Internal storage error: {0}")]
    Internal(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for hotel analysis storage backends
///
/// Every operation is scoped to an owning user. Dependent writes against a
/// hotel the owner does not hold fail with `StorageError::AccessDenied`;
/// reads of foreign rows behave as if the rows did not exist.
///
/// Implementations must be thread-safe (Send + Sync) so one store can be
/// shared behind an `Arc` by concurrent invocations.
#[async_trait]
pub trait HotelStore: Send + Sync {
    // === Inserts ===

    /// Insert a hotel row and return it with its assigned id and timestamp
    async fn insert_hotel(&self, hotel: &NewHotel) -> StorageResult<Hotel>;

    /// Insert a batch of features in one call
    async fn insert_features(
        &self,
        owner: &UserId,
        rows: &[NewAccessibilityFeature],
    ) -> StorageResult<Vec<AccessibilityFeature>>;

    /// Insert a batch of compliance notes in one call
    async fn insert_compliance_notes(
        &self,
        owner: &UserId,
        rows: &[NewComplianceNote],
    ) -> StorageResult<Vec<ComplianceNote>>;

    /// Insert a batch of sentiment insights in one call
    async fn insert_sentiment_insights(
        &self,
        owner: &UserId,
        rows: &[NewSentimentInsight],
    ) -> StorageResult<Vec<SentimentInsight>>;

    // === Selects ===

    /// Load a hotel by id
    async fn select_hotel(&self, owner: &UserId, id: &HotelId) -> StorageResult<Option<Hotel>>;

    /// List the owner's hotels, newest first
    async fn list_hotels(&self, owner: &UserId) -> StorageResult<Vec<Hotel>>;

    /// Features of a hotel, oldest first
    async fn select_features(
        &self,
        owner: &UserId,
        hotel_id: &HotelId,
    ) -> StorageResult<Vec<AccessibilityFeature>>;

    /// Compliance notes of a hotel, oldest first
    async fn select_compliance_notes(
        &self,
        owner: &UserId,
        hotel_id: &HotelId,
    ) -> StorageResult<Vec<ComplianceNote>>;

    /// Sentiment insights of a hotel, oldest first
    async fn select_sentiment_insights(
        &self,
        owner: &UserId,
        hotel_id: &HotelId,
    ) -> StorageResult<Vec<SentimentInsight>>;

    // === Deletes ===

    /// Delete a hotel together with its dependent rows
    ///
    /// Returns false when no such hotel exists for the owner.
    async fn delete_hotel(&self, owner: &UserId, id: &HotelId) -> StorageResult<bool>;
}

/// Extension trait for opening stores from paths
pub trait OpenStore: HotelStore + Sized {
    /// Open or create a store at the given path
    fn open(path: impl AsRef<Path>) -> StorageResult<Self>;

    /// Create an in-memory store (useful for testing)
    fn open_in_memory() -> StorageResult<Self>;
}
