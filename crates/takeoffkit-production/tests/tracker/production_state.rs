//! End-to-end flows through the production tracking facade.

use std::sync::Arc;

use chrono::NaiveDate;
use takeoffkit_core::{CostCodeId, DrawingId, MeasurementId};
use takeoffkit_measure::{
    MeasurementAttrs, MeasurementKind, MeasurementStore, PixelScale, Point, Rect,
};
use takeoffkit_production::{ProductionState, SelectionKey, StatusResponse};

use crate::mock_api::MockApi;

fn date(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

fn cc(raw: i64) -> CostCodeId {
    CostCodeId::new(raw)
}

/// Store with one segmented run (remote id 500) and one plain line
/// (remote id 600).
fn seeded_store() -> (MeasurementStore, MeasurementId, MeasurementId) {
    let mut store = MeasurementStore::new(PixelScale::new(100.0, 100.0));
    let segmented = store
        .create(
            MeasurementKind::Linear,
            vec![
                Point::new(0.1, 0.1),
                Point::new(0.5, 0.1),
                Point::new(0.9, 0.1),
            ],
            MeasurementAttrs {
                name: "duct run".to_string(),
                ..MeasurementAttrs::default()
            },
        )
        .unwrap();
    store.set_remote_id(segmented, 500);
    let plain = store
        .create(
            MeasurementKind::Linear,
            vec![Point::new(0.1, 0.8), Point::new(0.9, 0.8)],
            MeasurementAttrs {
                name: "pipe".to_string(),
                ..MeasurementAttrs::default()
            },
        )
        .unwrap();
    store.set_remote_id(plain, 600);
    (store, segmented, plain)
}

fn new_state(api: Arc<MockApi>) -> ProductionState {
    let mut state = ProductionState::new(DrawingId::new(1), date("2026-03-02"), api);
    state.set_cost_code(Some(cc(7)));
    state
}

#[tokio::test]
async fn apply_requires_an_active_cost_code() {
    let api = Arc::new(MockApi::new());
    let (store, segmented, _) = seeded_store();
    let mut state = ProductionState::new(DrawingId::new(1), date("2026-03-02"), api);

    let result = state
        .apply_percent(&store, SelectionKey::Measurement(segmented), 50.0)
        .await;
    assert!(result.unwrap_err().is_input());
}

#[tokio::test]
async fn click_opens_picker_and_context_switch_closes_it() {
    let api = Arc::new(MockApi::new());
    let (store, segmented, _) = seeded_store();
    let mut state = new_state(api);

    let visible: Vec<_> = store.top_level().collect();
    let target = state
        .click(&visible, Point::new(0.3, 0.11), 3.0, store.pixel_scale())
        .unwrap();
    assert_eq!(target, SelectionKey::Segment(segmented, 0));
    assert_eq!(state.session().picker(), Some(target));

    state.set_cost_code(Some(cc(9)));
    assert_eq!(state.session().picker(), None);
}

#[tokio::test]
async fn apply_percent_clamps_and_reverts_on_failure() {
    let api = Arc::new(MockApi::new());
    let (store, _, plain) = seeded_store();
    let mut state = new_state(api.clone());

    state
        .apply_percent(&store, SelectionKey::Measurement(plain), 150.0)
        .await
        .unwrap();
    assert_eq!(state.board().percent(plain, cc(7)), 100.0);

    api.fail();
    let result = state
        .apply_percent(&store, SelectionKey::Measurement(plain), 25.0)
        .await;
    assert!(result.is_err());
    // Reverted to the last confirmed value, not zero.
    assert_eq!(state.board().percent(plain, cc(7)), 100.0);
}

#[tokio::test]
async fn segment_apply_takes_the_authoritative_response() {
    let api = Arc::new(MockApi::new());
    let (store, segmented, _) = seeded_store();
    let mut state = new_state(api);

    state
        .apply_percent(&store, SelectionKey::Segment(segmented, 1), 60.0)
        .await
        .unwrap();
    // The echoed response replaced the maps wholesale.
    assert_eq!(state.board().segment_percent(segmented, 1), 60.0);
    assert_eq!(state.board().segment_percent(segmented, 0), 0.0);
}

#[tokio::test]
async fn box_select_is_additive_and_bulk_apply_consumes_it() {
    let api = Arc::new(MockApi::new());
    let (store, segmented, plain) = seeded_store();
    let mut state = new_state(api.clone());

    let visible: Vec<_> = store.top_level().collect();
    // First box over the segmented run only.
    let first = Rect::from_corners(Point::new(0.0, 0.0), Point::new(1.0, 0.2));
    let selected = state.box_select(&visible, &first);
    assert_eq!(selected, 2);
    // Second overlapping box adds the plain line; nothing is deselected.
    let second = Rect::from_corners(Point::new(0.0, 0.7), Point::new(1.0, 0.9));
    let selected = state.box_select(&visible, &second);
    assert_eq!(selected, 3);

    let applied = state.bulk_apply(&store, 80.0).await.unwrap();
    assert_eq!(applied, 3);
    assert!(state.session().selection().is_empty());
    assert_eq!(state.board().segment_percent(segmented, 0), 80.0);
    assert_eq!(state.board().segment_percent(segmented, 1), 80.0);
    assert_eq!(state.board().percent(plain, cc(7)), 80.0);

    let requests = api.bulk_requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].items.len(), 3);
    assert_eq!(requests[0].labour_cost_code_id, 7);
}

#[tokio::test]
async fn bulk_transport_failure_reverts_every_optimistic_entry() {
    let api = Arc::new(MockApi::new());
    let (store, segmented, plain) = seeded_store();
    let mut state = new_state(api.clone());

    state
        .apply_percent(&store, SelectionKey::Measurement(plain), 40.0)
        .await
        .unwrap();

    let visible: Vec<_> = store.top_level().collect();
    let everything = Rect::from_corners(Point::new(0.0, 0.0), Point::new(1.0, 1.0));
    state.box_select(&visible, &everything);

    api.fail();
    let result = state.bulk_apply(&store, 90.0).await;
    assert!(result.is_err());
    assert_eq!(state.board().percent(plain, cc(7)), 40.0);
    assert_eq!(state.board().segment_percent(segmented, 0), 0.0);
    assert_eq!(state.board().segment_percent(segmented, 1), 0.0);
}

#[tokio::test]
async fn date_switch_replaces_statuses_wholesale() {
    let api = Arc::new(MockApi::new());
    let (store, _, plain) = seeded_store();
    let mut state = new_state(api.clone());

    // Monday has a status for the plain line; Tuesday has nothing.
    let mut monday = StatusResponse::default();
    monday.statuses.insert("600-7".to_string(), 55.0);
    api.seed_date(date("2026-03-02"), monday);

    state.refresh(&store).await.unwrap();
    assert_eq!(state.board().percent(plain, cc(7)), 55.0);

    state
        .change_work_date(date("2026-03-03"), &store)
        .await
        .unwrap();
    // The Monday-only status must not survive the switch.
    assert_eq!(state.board().percent(plain, cc(7)), 0.0);

    state
        .change_work_date(date("2026-03-02"), &store)
        .await
        .unwrap();
    assert_eq!(state.board().percent(plain, cc(7)), 55.0);
}

#[tokio::test]
async fn stale_generation_response_is_discarded() {
    let api = Arc::new(MockApi::new());
    let (store, _, plain) = seeded_store();
    let mut state = new_state(api);

    let stale_generation = state.session().generation();
    let mut response = StatusResponse::default();
    response.statuses.insert("600-7".to_string(), 99.0);

    // The context moves on before the response lands.
    state.set_cost_code(Some(cc(9)));
    let applied = state.apply_status_response(stale_generation, &response, &store);
    assert!(!applied);
    assert_eq!(state.board().percent(plain, cc(7)), 0.0);

    // A response for the current generation applies.
    let applied = state.apply_status_response(state.session().generation(), &response, &store);
    assert!(applied);
    assert_eq!(state.board().percent(plain, cc(7)), 99.0);
}

#[tokio::test]
async fn hide_completed_keeps_partially_complete_segmented_runs() {
    let api = Arc::new(MockApi::new());
    let (store, segmented, plain) = seeded_store();
    let mut state = new_state(api);

    // Whole line complete; segmented run only half complete.
    state
        .apply_percent(&store, SelectionKey::Measurement(plain), 100.0)
        .await
        .unwrap();
    state
        .apply_percent(&store, SelectionKey::Segment(segmented, 0), 100.0)
        .await
        .unwrap();

    let visible: Vec<_> = store.top_level().collect();
    let shown = state.visible_after_hide(&visible, true);
    let names: Vec<_> = shown.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["duct run"]);

    let unfiltered = state.visible_after_hide(&visible, false);
    assert_eq!(unfiltered.len(), 2);
}
