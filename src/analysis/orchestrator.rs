//! Analysis orchestrator
//!
//! Sequences one submission: authenticate, assess, create the hotel row,
//! then the feature, compliance and sentiment batches. Calls go out one at
//! a time and nothing is retried; the first failure ends the run.

use super::types::{AnalysisError, AnalysisState, HotelAnalysis, RollbackPolicy, Stage};
use crate::auth::{AuthProvider, UserIdentity};
use crate::model::{
    table, AccessibilityFeature, ComplianceNote, Hotel, HotelId, HotelInput, HotelOwned,
    NewHotel, SentimentInsight, UserId,
};
use crate::scoring::{Assessment, ScoringEngine};
use crate::storage::{HotelStore, StorageError};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Walks `AnalysisState` forward and reports each step
struct StateTracker<'a, F> {
    state: AnalysisState,
    observer: &'a mut F,
}

impl<'a, F> StateTracker<'a, F>
where
    F: FnMut(&AnalysisState),
{
    fn new(observer: &'a mut F) -> Self {
        observer(&AnalysisState::Idle);
        Self {
            state: AnalysisState::Idle,
            observer,
        }
    }

    fn advance(&mut self, next: AnalysisState) {
        debug_assert!(
            self.state.can_transition_to(&next),
            "illegal transition {:?} -> {:?}",
            self.state,
            next
        );
        debug!(from = %self.state, to = %next, "analysis state");
        self.state = next;
        (self.observer)(&self.state);
    }
}

/// Dependent batches written for one hotel
struct Dependents {
    features: Vec<AccessibilityFeature>,
    compliance: Vec<ComplianceNote>,
    sentiment: Vec<SentimentInsight>,
}

/// Turns form submissions into persisted, aggregated analyses
pub struct AnalysisOrchestrator {
    auth: Arc<dyn AuthProvider>,
    store: Arc<dyn HotelStore>,
    scorer: Arc<dyn ScoringEngine>,
    rollback: RollbackPolicy,
}

impl AnalysisOrchestrator {
    pub fn new(
        auth: Arc<dyn AuthProvider>,
        store: Arc<dyn HotelStore>,
        scorer: Arc<dyn ScoringEngine>,
    ) -> Self {
        Self {
            auth,
            store,
            scorer,
            rollback: RollbackPolicy::default(),
        }
    }

    pub fn with_rollback(mut self, policy: RollbackPolicy) -> Self {
        self.rollback = policy;
        self
    }

    pub fn rollback_policy(&self) -> RollbackPolicy {
        self.rollback
    }

    /// Analyze one hotel and persist the result
    pub async fn analyze_hotel(&self, input: &HotelInput) -> Result<HotelAnalysis, AnalysisError> {
        self.analyze_hotel_with(input, |_| {}).await
    }

    /// Same as `analyze_hotel`, reporting every state transition to `observer`
    ///
    /// The observer sees `Idle` first and exactly one terminal state last.
    pub async fn analyze_hotel_with<F>(
        &self,
        input: &HotelInput,
        mut observer: F,
    ) -> Result<HotelAnalysis, AnalysisError>
    where
        F: FnMut(&AnalysisState) + Send,
    {
        let mut tracker = StateTracker::new(&mut observer);
        let result = self.run(input, &mut tracker).await;

        match &result {
            Ok(analysis) => {
                info!(
                    hotel_id = %analysis.hotel.id,
                    features = analysis.features.len(),
                    compliance = analysis.compliance.len(),
                    sentiment = analysis.sentiment.len(),
                    "analysis complete"
                );
                tracker.advance(AnalysisState::Done);
            }
            Err(e) => {
                warn!(state = %tracker.state, error = %e, "analysis failed");
                tracker.advance(AnalysisState::Failed(e.user_message()));
            }
        }
        result
    }

    async fn run<F>(
        &self,
        input: &HotelInput,
        tracker: &mut StateTracker<'_, F>,
    ) -> Result<HotelAnalysis, AnalysisError>
    where
        F: FnMut(&AnalysisState) + Send,
    {
        input.validate()?;

        tracker.advance(AnalysisState::Authenticating);
        let user = self.authenticate().await?;

        tracker.advance(AnalysisState::CreatingHotel);
        let assessment = self.scorer.assess(input).await.map_err(|e| {
            error!(engine = self.scorer.id(), error = %e, "scoring engine failed");
            AnalysisError::Unexpected(e.to_string())
        })?;

        let hotel = self
            .store
            .insert_hotel(&NewHotel {
                url: input.url.clone(),
                name: input.name.clone(),
                location: input.location.clone(),
                accessibility_score: assessment.accessibility_score,
                user_id: user.id.clone(),
            })
            .await
            .map_err(AnalysisError::persistence(Stage::Hotel))?;
        info!(hotel_id = %hotel.id, user = %user.id, "hotel created");

        if hotel.user_id != user.id {
            let err = AnalysisError::Unexpected(format!(
                "store stamped hotel {} with owner {} instead of {}",
                hotel.id, hotel.user_id, user.id
            ));
            self.compensate(&user.id, &hotel.id).await;
            return Err(err);
        }

        match self.fan_out(&user.id, &hotel, &assessment, tracker).await {
            Ok(dependents) => Ok(HotelAnalysis {
                hotel,
                features: dependents.features,
                compliance: dependents.compliance,
                sentiment: dependents.sentiment,
            }),
            Err(e) => {
                self.compensate(&user.id, &hotel.id).await;
                Err(e)
            }
        }
    }

    async fn authenticate(&self) -> Result<UserIdentity, AnalysisError> {
        self.auth.current_user().await.map_err(|e| {
            debug!(error = %e, "no authenticated user");
            AnalysisError::Unauthenticated(e)
        })
    }

    async fn fan_out<F>(
        &self,
        owner: &UserId,
        hotel: &Hotel,
        assessment: &Assessment,
        tracker: &mut StateTracker<'_, F>,
    ) -> Result<Dependents, AnalysisError>
    where
        F: FnMut(&AnalysisState) + Send,
    {
        tracker.advance(AnalysisState::CreatingFeatures);
        let rows = assessment.feature_rows(hotel.id);
        let features = self
            .store
            .insert_features(owner, &rows)
            .await
            .map_err(AnalysisError::persistence(Stage::Features))?;
        check_batch(&hotel.id, rows.len(), &features, Stage::Features)?;

        tracker.advance(AnalysisState::CreatingCompliance);
        let rows = assessment.compliance_rows(hotel.id);
        let compliance = self
            .store
            .insert_compliance_notes(owner, &rows)
            .await
            .map_err(AnalysisError::persistence(Stage::Compliance))?;
        check_batch(&hotel.id, rows.len(), &compliance, Stage::Compliance)?;

        tracker.advance(AnalysisState::CreatingSentiment);
        let rows = assessment.sentiment_rows(hotel.id);
        let sentiment = self
            .store
            .insert_sentiment_insights(owner, &rows)
            .await
            .map_err(AnalysisError::persistence(Stage::Sentiment))?;
        check_batch(&hotel.id, rows.len(), &sentiment, Stage::Sentiment)?;

        Ok(Dependents {
            features,
            compliance,
            sentiment,
        })
    }

    async fn compensate(&self, owner: &UserId, hotel_id: &HotelId) {
        if self.rollback == RollbackPolicy::Leave {
            warn!(hotel_id = %hotel_id, "leaving partial analysis in place");
            return;
        }
        match self.store.delete_hotel(owner, hotel_id).await {
            Ok(true) => info!(hotel_id = %hotel_id, "rolled back partial analysis"),
            Ok(false) => warn!(hotel_id = %hotel_id, "rollback found no hotel to delete"),
            Err(e) => {
                error!(hotel_id = %hotel_id, error = %e, "rollback failed; orphaned rows remain")
            }
        }
    }

    /// Load a stored analysis for the current user
    ///
    /// Returns `Ok(None)` when the hotel does not exist or belongs to
    /// someone else.
    pub async fn load_analysis(
        &self,
        hotel_id: &HotelId,
    ) -> Result<Option<HotelAnalysis>, AnalysisError> {
        let user = self.authenticate().await?;
        let read = AnalysisError::persistence;

        let Some(hotel) = self
            .store
            .select_hotel(&user.id, hotel_id)
            .await
            .map_err(read(Stage::Read))?
        else {
            return Ok(None);
        };

        let features = self
            .store
            .select_features(&user.id, hotel_id)
            .await
            .map_err(read(Stage::Read))?;
        let compliance = self
            .store
            .select_compliance_notes(&user.id, hotel_id)
            .await
            .map_err(read(Stage::Read))?;
        let sentiment = self
            .store
            .select_sentiment_insights(&user.id, hotel_id)
            .await
            .map_err(read(Stage::Read))?;

        Ok(Some(HotelAnalysis {
            hotel,
            features,
            compliance,
            sentiment,
        }))
    }

    /// The current user's hotels, newest first
    pub async fn list_hotels(&self) -> Result<Vec<Hotel>, AnalysisError> {
        let user = self.authenticate().await?;
        self.store
            .list_hotels(&user.id)
            .await
            .map_err(AnalysisError::persistence(Stage::Read))
    }
}

/// Fail unless the store handed back every row it was sent, each pointing
/// at `hotel_id`
fn check_batch<R: HotelOwned>(
    hotel_id: &HotelId,
    sent: usize,
    rows: &[R],
    stage: Stage,
) -> Result<(), AnalysisError> {
    if rows.len() != sent {
        let table = match stage {
            Stage::Features => table::FEATURES,
            Stage::Compliance => table::COMPLIANCE_NOTES,
            Stage::Sentiment => table::SENTIMENT_INSIGHTS,
            Stage::Hotel | Stage::Read => table::HOTELS,
        };
        return Err(AnalysisError::Persistence {
            stage,
            source: StorageError::InvalidRow {
                table,
                reason: format!("sent {} rows, store returned {}", sent, rows.len()),
            },
        });
    }
    match rows.iter().find(|r| r.hotel_id() != *hotel_id) {
        Some(stray) => Err(AnalysisError::Unexpected(format!(
            "{} stage returned a row for hotel {} instead of {}",
            stage,
            stray.hotel_id(),
            hotel_id
        ))),
        None => Ok(()),
    }
}
