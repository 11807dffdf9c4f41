//! End-to-end tests for the analysis pipeline
//!
//! Drives `AnalysisOrchestrator` against a recording wrapper around the
//! in-memory SQLite store, so both the returned aggregate and the exact
//! sequence of store calls can be checked.
//!
//! Run with: `cargo test --test pipeline`

mod common;

use common::{alice, grand_hotel, orchestrator, Call, RecordingStore};
use hotelcheck::{
    AccessibilityScore, AnalysisError, AnalysisOrchestrator, AnalysisState, Assessment,
    FeatureFinding, HotelInput, MockScoringEngine, RollbackPolicy, RowCounts, Stage, StaticAuth,
    StorageError, UserIdentity,
};
use proptest::prelude::*;
use std::sync::Arc;

// ============================================================================
// Happy path
// ============================================================================

#[tokio::test]
async fn grand_hotel_creates_one_hotel_and_ten_dependents() {
    let store = Arc::new(RecordingStore::new());
    let orch = orchestrator(alice(), store.clone(), RollbackPolicy::Compensate);

    let analysis = orch.analyze_hotel(&grand_hotel()).await.unwrap();

    assert_eq!(analysis.hotel.name, "Grand Hotel");
    assert_eq!(analysis.hotel.user_id.as_str(), "alice");
    let score = analysis.hotel.accessibility_score.map(|s| s.value());
    assert_eq!(score, Some(7.5));
    assert_eq!(analysis.available_feature_count(), 3);
    assert_eq!(
        store.inner().row_counts().unwrap(),
        RowCounts {
            hotels: 1,
            features: 4,
            compliance_notes: 3,
            sentiment_insights: 3,
        }
    );
    assert_eq!(
        store.calls(),
        vec![
            Call::InsertHotel,
            Call::InsertFeatures,
            Call::InsertCompliance,
            Call::InsertSentiment,
        ]
    );
}

#[tokio::test]
async fn every_dependent_row_references_the_new_hotel() {
    let store = Arc::new(RecordingStore::new());
    let orch = orchestrator(alice(), store.clone(), RollbackPolicy::Compensate);

    let first = orch.analyze_hotel(&grand_hotel()).await.unwrap();
    let second = orch
        .analyze_hotel(&HotelInput::new(
            "https://seaside.example.org",
            "Seaside Inn",
            "Brighton, UK",
        ))
        .await
        .unwrap();

    assert_ne!(first.hotel.id, second.hotel.id);
    assert!(first.is_consistent());
    assert!(second.is_consistent());

    let reloaded = orch.load_analysis(&second.hotel.id).await.unwrap().unwrap();
    assert!(reloaded.is_consistent());
    assert_eq!(reloaded.features.len(), 4);
}

#[tokio::test]
async fn hotels_are_private_to_their_owner() {
    let store = Arc::new(RecordingStore::new());
    let alice_orch = orchestrator(alice(), store.clone(), RollbackPolicy::Compensate);
    let bob_orch = orchestrator(
        StaticAuth::signed_in(UserIdentity::new("bob")),
        store.clone(),
        RollbackPolicy::Compensate,
    );

    let created = alice_orch.analyze_hotel(&grand_hotel()).await.unwrap();

    let foreign = bob_orch.load_analysis(&created.hotel.id).await.unwrap();
    assert!(foreign.is_none());
    assert!(bob_orch.list_hotels().await.unwrap().is_empty());
    assert_eq!(alice_orch.list_hotels().await.unwrap().len(), 1);
}

// ============================================================================
// Authentication
// ============================================================================

#[tokio::test]
async fn signed_out_submission_writes_nothing() {
    let store = Arc::new(RecordingStore::new());
    let orch = orchestrator(
        StaticAuth::signed_out(),
        store.clone(),
        RollbackPolicy::Compensate,
    );
    let mut states = Vec::new();

    let err = orch
        .analyze_hotel_with(&grand_hotel(), |s| states.push(s.clone()))
        .await
        .unwrap_err();

    assert!(matches!(err, AnalysisError::Unauthenticated(_)));
    assert_eq!(
        err.user_message(),
        "You must be logged in to analyze hotels"
    );
    assert!(store.calls().is_empty());
    assert_eq!(store.inner().row_counts().unwrap().total(), 0);
    assert_eq!(
        states,
        vec![
            AnalysisState::Idle,
            AnalysisState::Authenticating,
            AnalysisState::Failed("You must be logged in to analyze hotels".into()),
        ]
    );
}

#[tokio::test]
async fn signed_out_submission_leaves_existing_rows_alone() {
    let store = Arc::new(RecordingStore::new());
    orchestrator(alice(), store.clone(), RollbackPolicy::Compensate)
        .analyze_hotel(&grand_hotel())
        .await
        .unwrap();
    let before = store.inner().row_counts().unwrap();

    let signed_out = orchestrator(
        StaticAuth::signed_out(),
        store.clone(),
        RollbackPolicy::Compensate,
    );
    let err = signed_out.analyze_hotel(&grand_hotel()).await.unwrap_err();

    assert!(matches!(err, AnalysisError::Unauthenticated(_)));
    assert_eq!(store.inner().row_counts().unwrap(), before);
}

// ============================================================================
// Stage failures
// ============================================================================

#[tokio::test]
async fn hotel_insert_failure_skips_dependent_inserts() {
    let store = Arc::new(RecordingStore::failing_at(Stage::Hotel));
    let orch = orchestrator(alice(), store.clone(), RollbackPolicy::Compensate);

    let err = orch.analyze_hotel(&grand_hotel()).await.unwrap_err();

    assert_eq!(err.stage(), Some(Stage::Hotel));
    assert_eq!(err.user_message(), "Failed to create hotel entry");
    assert_eq!(store.calls(), vec![Call::InsertHotel]);
    assert_eq!(store.inner().row_counts().unwrap().total(), 0);
}

#[tokio::test]
async fn features_failure_is_rolled_back() {
    let store = Arc::new(RecordingStore::failing_at(Stage::Features));
    let orch = orchestrator(alice(), store.clone(), RollbackPolicy::Compensate);

    let err = orch.analyze_hotel(&grand_hotel()).await.unwrap_err();

    assert_eq!(err.stage(), Some(Stage::Features));
    assert_eq!(
        err.user_message(),
        "Failed to create accessibility features"
    );
    assert_eq!(
        store.calls(),
        vec![Call::InsertHotel, Call::InsertFeatures, Call::DeleteHotel]
    );
    assert_eq!(store.inner().row_counts().unwrap().total(), 0);
}

#[tokio::test]
async fn sentiment_failure_rolls_back_earlier_batches() {
    let store = Arc::new(RecordingStore::failing_at(Stage::Sentiment));
    let orch = orchestrator(alice(), store.clone(), RollbackPolicy::Compensate);
    let mut states = Vec::new();

    let err = orch
        .analyze_hotel_with(&grand_hotel(), |s| states.push(s.clone()))
        .await
        .unwrap_err();

    assert_eq!(err.user_message(), "Failed to create sentiment insights");
    assert_eq!(store.inner().row_counts().unwrap().total(), 0);
    assert_eq!(
        states.last(),
        Some(&AnalysisState::Failed(
            "Failed to create sentiment insights".into()
        ))
    );
    assert_eq!(
        states.iter().filter(|s| s.is_terminal()).count(),
        1,
        "exactly one terminal state per invocation"
    );
}

#[tokio::test]
async fn leave_policy_keeps_partial_rows() {
    let store = Arc::new(RecordingStore::failing_at(Stage::Compliance));
    let orch = orchestrator(alice(), store.clone(), RollbackPolicy::Leave);

    let err = orch.analyze_hotel(&grand_hotel()).await.unwrap_err();

    assert_eq!(err.user_message(), "Failed to create compliance notes");
    assert!(!store.calls().contains(&Call::DeleteHotel));
    assert!(!store.calls().contains(&Call::InsertSentiment));
    let counts = store.inner().row_counts().unwrap();
    assert_eq!(counts.hotels, 1);
    assert_eq!(counts.features, 4);
    assert_eq!(counts.compliance_notes, 0);
    assert_eq!(counts.sentiment_insights, 0);
}

#[tokio::test]
async fn short_feature_batch_fails_and_rolls_back() {
    let store = Arc::new(RecordingStore::truncating_at(Stage::Features, 1));
    let orch = orchestrator(alice(), store.clone(), RollbackPolicy::Compensate);

    let err = orch.analyze_hotel(&grand_hotel()).await.unwrap_err();

    assert_eq!(err.stage(), Some(Stage::Features));
    assert_eq!(
        err.user_message(),
        "Failed to create accessibility features"
    );
    assert!(matches!(
        err,
        AnalysisError::Persistence {
            source: StorageError::InvalidRow { .. },
            ..
        }
    ));
    assert!(!store.calls().contains(&Call::InsertCompliance));
    assert_eq!(store.calls().last(), Some(&Call::DeleteHotel));
    assert_eq!(store.inner().row_counts().unwrap().total(), 0);
}

#[tokio::test]
async fn empty_sentiment_representation_is_an_error() {
    let store = Arc::new(RecordingStore::truncating_at(Stage::Sentiment, 0));
    let orch = orchestrator(alice(), store.clone(), RollbackPolicy::Leave);

    let err = orch.analyze_hotel(&grand_hotel()).await.unwrap_err();

    assert_eq!(err.stage(), Some(Stage::Sentiment));
    // Rows were stored; only the returned representation came up short
    assert_eq!(store.inner().row_counts().unwrap().sentiment_insights, 3);
}

// ============================================================================
// Properties
// ============================================================================

fn hotel_input() -> impl Strategy<Value = HotelInput> {
    (
        "https?://[a-z]{1,12}\\.(com|org|fr)(/[a-z0-9-]{1,10})?",
        "[A-Z][A-Za-z' &-]{0,30}",
        "[A-Z][a-z]{1,12}, [A-Z][a-z]{1,12}",
    )
        .prop_map(|(url, name, location)| HotelInput::new(url, name, location))
}

fn scored_orchestrator(score: Option<f64>, store: Arc<RecordingStore>) -> AnalysisOrchestrator {
    let engine = MockScoringEngine::with_assessment(Assessment {
        accessibility_score: score.map(|s| AccessibilityScore::new(s).unwrap()),
        features: vec![FeatureFinding::new("Ramp", true, "Level access")],
        compliance_notes: vec![],
        sentiment_insights: vec!["Guests mention helpful staff".into()],
    });
    AnalysisOrchestrator::new(Arc::new(alice()), store, Arc::new(engine))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn submitted_fields_are_stored_verbatim(input in hotel_input()) {
        let store = Arc::new(RecordingStore::new());
        let orch = orchestrator(alice(), store, RollbackPolicy::Compensate);

        let analysis = tokio_test::block_on(orch.analyze_hotel(&input)).unwrap();

        prop_assert_eq!(&analysis.hotel.url, &input.url);
        prop_assert_eq!(&analysis.hotel.name, &input.name);
        prop_assert_eq!(&analysis.hotel.location, &input.location);
    }

    #[test]
    fn stored_score_stays_in_range(score in proptest::option::of(0.0f64..=10.0)) {
        let store = Arc::new(RecordingStore::new());
        let orch = scored_orchestrator(score, store.clone());

        let hotel = grand_hotel();
        let run = orch.analyze_hotel(&hotel);
        let analysis = tokio_test::block_on(run).unwrap();
        let stored = analysis.hotel.accessibility_score.map(|s| s.value());

        prop_assert_eq!(stored, score);
        if let Some(value) = stored {
            prop_assert!((0.0..=10.0).contains(&value));
        }

        let reloaded = tokio_test::block_on(orch.load_analysis(&analysis.hotel.id))
            .unwrap()
            .unwrap();
        let expected = analysis.hotel.accessibility_score;
        prop_assert_eq!(reloaded.hotel.accessibility_score, expected);
    }

    #[test]
    fn out_of_range_scores_are_unrepresentable(
        score in prop_oneof![-100.0f64..-0.001, 10.001f64..100.0]
    ) {
        prop_assert!(AccessibilityScore::new(score).is_err());
    }
}
