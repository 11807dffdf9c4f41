//! Shared fakes for the pipeline integration tests
//!
//! `RecordingStore` wraps a real in-memory `SqliteStore`, logs every call it
//! receives and can be told to fail one persistence stage, or to hand back
//! fewer rows than it stored for one stage. It can also hold the hotel
//! insert until released, for tests that need a submission to stay in
//! flight.

#![allow(dead_code)]

use async_trait::async_trait;
use hotelcheck::model::{
    AccessibilityFeature, ComplianceNote, Hotel, HotelId, NewAccessibilityFeature,
    NewComplianceNote, NewHotel, NewSentimentInsight, SentimentInsight, UserId,
};
use hotelcheck::{
    AnalysisOrchestrator, HotelInput, HotelStore, MockScoringEngine, OpenStore, RollbackPolicy,
    SqliteStore, Stage, StaticAuth, StorageError, StorageResult, UserIdentity,
};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// Store calls in the order they arrived
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    InsertHotel,
    InsertFeatures,
    InsertCompliance,
    InsertSentiment,
    Select,
    DeleteHotel,
}

/// Holds `insert_hotel` until the test releases it
pub struct Gate {
    pub entered: Notify,
    pub release: Notify,
}

pub struct RecordingStore {
    inner: SqliteStore,
    calls: Mutex<Vec<Call>>,
    fail_at: Option<Stage>,
    truncate: Option<(Stage, usize)>,
    gate: Option<Arc<Gate>>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self {
            inner: SqliteStore::open_in_memory().unwrap(),
            calls: Mutex::new(Vec::new()),
            fail_at: None,
            truncate: None,
            gate: None,
        }
    }

    pub fn failing_at(stage: Stage) -> Self {
        Self {
            fail_at: Some(stage),
            ..Self::new()
        }
    }

    /// Store every row of `stage` but return only the first `keep`
    pub fn truncating_at(stage: Stage, keep: usize) -> Self {
        Self {
            truncate: Some((stage, keep)),
            ..Self::new()
        }
    }

    pub fn gated() -> (Self, Arc<Gate>) {
        let gate = Arc::new(Gate {
            entered: Notify::new(),
            release: Notify::new(),
        });
        let store = Self {
            gate: Some(gate.clone()),
            ..Self::new()
        };
        (store, gate)
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn inner(&self) -> &SqliteStore {
        &self.inner
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn returned<R>(&self, stage: Stage, mut rows: Vec<R>) -> Vec<R> {
        if let Some((at, keep)) = self.truncate {
            if at == stage {
                rows.truncate(keep);
            }
        }
        rows
    }

    fn check(&self, stage: Stage) -> StorageResult<()> {
        if self.fail_at == Some(stage) {
            return Err(StorageError::Rejected {
                status: 500,
                message: format!("injected {} failure", stage),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl HotelStore for RecordingStore {
    async fn insert_hotel(&self, hotel: &NewHotel) -> StorageResult<Hotel> {
        self.record(Call::InsertHotel);
        if let Some(gate) = &self.gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }
        self.check(Stage::Hotel)?;
        self.inner.insert_hotel(hotel).await
    }

    async fn insert_features(
        &self,
        owner: &UserId,
        rows: &[NewAccessibilityFeature],
    ) -> StorageResult<Vec<AccessibilityFeature>> {
        self.record(Call::InsertFeatures);
        self.check(Stage::Features)?;
        let stored = self.inner.insert_features(owner, rows).await?;
        Ok(self.returned(Stage::Features, stored))
    }

    async fn insert_compliance_notes(
        &self,
        owner: &UserId,
        rows: &[NewComplianceNote],
    ) -> StorageResult<Vec<ComplianceNote>> {
        self.record(Call::InsertCompliance);
        self.check(Stage::Compliance)?;
        let stored = self.inner.insert_compliance_notes(owner, rows).await?;
        Ok(self.returned(Stage::Compliance, stored))
    }

    async fn insert_sentiment_insights(
        &self,
        owner: &UserId,
        rows: &[NewSentimentInsight],
    ) -> StorageResult<Vec<SentimentInsight>> {
        self.record(Call::InsertSentiment);
        self.check(Stage::Sentiment)?;
        let stored = self.inner.insert_sentiment_insights(owner, rows).await?;
        Ok(self.returned(Stage::Sentiment, stored))
    }

    async fn select_hotel(&self, owner: &UserId, id: &HotelId) -> StorageResult<Option<Hotel>> {
        self.record(Call::Select);
        self.inner.select_hotel(owner, id).await
    }

    async fn list_hotels(&self, owner: &UserId) -> StorageResult<Vec<Hotel>> {
        self.record(Call::Select);
        self.inner.list_hotels(owner).await
    }

    async fn select_features(
        &self,
        owner: &UserId,
        hotel_id: &HotelId,
    ) -> StorageResult<Vec<AccessibilityFeature>> {
        self.record(Call::Select);
        self.inner.select_features(owner, hotel_id).await
    }

    async fn select_compliance_notes(
        &self,
        owner: &UserId,
        hotel_id: &HotelId,
    ) -> StorageResult<Vec<ComplianceNote>> {
        self.record(Call::Select);
        self.inner.select_compliance_notes(owner, hotel_id).await
    }

    async fn select_sentiment_insights(
        &self,
        owner: &UserId,
        hotel_id: &HotelId,
    ) -> StorageResult<Vec<SentimentInsight>> {
        self.record(Call::Select);
        self.inner.select_sentiment_insights(owner, hotel_id).await
    }

    async fn delete_hotel(&self, owner: &UserId, id: &HotelId) -> StorageResult<bool> {
        self.record(Call::DeleteHotel);
        self.inner.delete_hotel(owner, id).await
    }
}

pub fn grand_hotel() -> HotelInput {
    HotelInput::new("https://example.com", "Grand Hotel", "Paris, France")
}

pub fn alice() -> StaticAuth {
    StaticAuth::signed_in(UserIdentity::new("alice"))
}

/// Orchestrator over `store` using the canned scoring engine
pub fn orchestrator(
    auth: StaticAuth,
    store: Arc<RecordingStore>,
    rollback: RollbackPolicy,
) -> AnalysisOrchestrator {
    AnalysisOrchestrator::new(Arc::new(auth), store, Arc::new(MockScoringEngine::new()))
        .with_rollback(rollback)
}
