//! End-to-end flows through the takeoff state facade: optimistic mutation,
//! rollback on sync failure, and undo/redo through the same sync path.

use std::sync::Arc;

use takeoffkit_core::{DrawingId, EngineEvent, NoticeLevel, Unit};
use takeoffkit_measure::{
    MeasurementAttrs, MeasurementDto, MeasurementKind, MeasurementPatch, PixelScale, Point,
    TakeoffState,
};

use crate::mock_api::{seed_calibration, MockApi};

fn new_state(api: Arc<MockApi>) -> TakeoffState {
    TakeoffState::new(DrawingId::new(1), PixelScale::new(1.0, 1.0), api, true)
}

fn line_points() -> Vec<Point> {
    vec![Point::new(0.0, 0.0), Point::new(50.0, 0.0)]
}

fn square_points(x: f64, y: f64, side: f64) -> Vec<Point> {
    vec![
        Point::new(x, y),
        Point::new(x + side, y),
        Point::new(x + side, y + side),
        Point::new(x, y + side),
    ]
}

fn attrs(name: &str) -> MeasurementAttrs {
    MeasurementAttrs {
        name: name.to_string(),
        color: "#3b82f6".to_string(),
        ..MeasurementAttrs::default()
    }
}

#[tokio::test]
async fn create_confirms_and_records_remote_id() {
    let api = Arc::new(MockApi::new());
    let mut state = new_state(api.clone());

    let id = state
        .create_measurement(MeasurementKind::Linear, line_points(), attrs("wall"))
        .await
        .unwrap();

    let record = state.store().get(id).unwrap();
    assert!(record.remote_id.is_some());
    assert!(state.can_undo());
    assert_eq!(api.calls(), vec!["create"]);
}

#[tokio::test]
async fn create_failure_rolls_back_the_optimistic_entry() {
    let api = Arc::new(MockApi::new());
    api.fail_on("create");
    let mut state = new_state(api.clone());
    let mut events = state.events().subscribe();

    let result = state
        .create_measurement(MeasurementKind::Linear, line_points(), attrs("wall"))
        .await;

    assert!(result.is_err());
    assert!(state.store().is_empty());
    assert!(!state.can_undo());

    // Created, then deleted on rollback, then the failure notification.
    let mut saw_failure = false;
    while let Ok(event) = events.try_recv() {
        if let EngineEvent::Notification { level, .. } = event {
            assert_eq!(level, NoticeLevel::Error);
            saw_failure = true;
        }
    }
    assert!(saw_failure);
}

#[tokio::test]
async fn edit_capability_is_enforced() {
    let api = Arc::new(MockApi::new());
    let mut state = TakeoffState::new(DrawingId::new(1), PixelScale::new(1.0, 1.0), api, false);

    let result = state
        .create_measurement(MeasurementKind::Linear, line_points(), attrs("wall"))
        .await;
    let err = result.unwrap_err();
    assert!(err.is_input());
    assert!(state.store().is_empty());
}

#[tokio::test]
async fn update_failure_reverts_to_the_previous_state() {
    let api = Arc::new(MockApi::new());
    let mut state = new_state(api.clone());
    let id = state
        .create_measurement(MeasurementKind::Linear, line_points(), attrs("wall"))
        .await
        .unwrap();

    api.fail_on("update");
    let result = state
        .update_measurement(
            id,
            MeasurementPatch::points(vec![Point::new(0.0, 0.0), Point::new(9.0, 0.0)]),
        )
        .await;

    assert!(result.is_err());
    let record = state.store().get(id).unwrap();
    assert_eq!(record.points, line_points());
    // Only the create remains undoable; undoing it still syncs fine.
    assert!(state.can_undo());
    state.undo().await.unwrap();
    assert!(state.store().is_empty());
}

#[tokio::test]
async fn undo_create_deletes_and_redo_restores_with_identical_identity() {
    let api = Arc::new(MockApi::new());
    let mut state = new_state(api.clone());
    let id = state
        .create_measurement(MeasurementKind::Linear, line_points(), attrs("wall"))
        .await
        .unwrap();
    let points_before = state.store().get(id).unwrap().points.clone();

    state.undo().await.unwrap();
    assert!(state.store().get(id).is_none());
    assert!(state.can_redo());

    state.redo().await.unwrap();
    let restored = state.store().get(id).unwrap();
    assert_eq!(restored.id, id);
    assert_eq!(restored.points, points_before);
    assert_eq!(api.calls(), vec!["create", "delete", "restore"]);
}

#[tokio::test]
async fn failed_undo_reapplies_the_change_locally() {
    let api = Arc::new(MockApi::new());
    let mut state = new_state(api.clone());
    let id = state
        .create_measurement(MeasurementKind::Linear, line_points(), attrs("wall"))
        .await
        .unwrap();

    api.fail_on("delete");
    let result = state.undo().await;
    assert!(result.is_err());
    // The undone create came back: the measurement is present and undoable.
    assert!(state.store().get(id).is_some());
    assert!(state.can_undo());
    assert!(!state.can_redo());
}

#[tokio::test]
async fn undo_delete_restores_a_deduction_into_its_parent() {
    let api = Arc::new(MockApi::new());
    let mut state = new_state(api.clone());
    state
        .calibrate_from_distance(Point::new(0.0, 0.0), Point::new(10.0, 0.0), 10.0, Unit::M)
        .await
        .unwrap();

    let parent = state
        .create_measurement(MeasurementKind::Area, square_points(0.0, 0.0, 10.0), attrs("slab"))
        .await
        .unwrap();
    let deduction = state
        .add_deduction(parent, square_points(1.0, 1.0, 2.0), None)
        .await
        .unwrap();
    assert_eq!(state.store().get(parent).unwrap().computed_value, Some(96.0));

    state.delete_measurement(deduction).await.unwrap();
    assert_eq!(state.store().get(parent).unwrap().computed_value, Some(100.0));

    state.undo().await.unwrap();
    let restored = state.store().get(deduction).unwrap();
    assert_eq!(restored.parent, Some(parent));
    assert!(state
        .store()
        .get(parent)
        .unwrap()
        .deductions
        .contains(&deduction));
    assert_eq!(state.store().get(parent).unwrap().computed_value, Some(96.0));
}

#[tokio::test]
async fn deleting_a_parent_takes_its_deductions_and_undo_restores_both() {
    let api = Arc::new(MockApi::new());
    let mut state = new_state(api.clone());
    state
        .calibrate_from_distance(Point::new(0.0, 0.0), Point::new(10.0, 0.0), 10.0, Unit::M)
        .await
        .unwrap();

    let parent = state
        .create_measurement(MeasurementKind::Area, square_points(0.0, 0.0, 10.0), attrs("slab"))
        .await
        .unwrap();
    let deduction = state
        .add_deduction(parent, square_points(1.0, 1.0, 2.0), None)
        .await
        .unwrap();

    state.delete_measurement(parent).await.unwrap();
    assert!(state.store().is_empty());

    state.undo().await.unwrap();
    assert_eq!(state.store().get(deduction).unwrap().parent, Some(parent));
    assert_eq!(state.store().get(parent).unwrap().computed_value, Some(96.0));
}

#[tokio::test]
async fn delete_failure_restores_the_subtree() {
    let api = Arc::new(MockApi::new());
    let mut state = new_state(api.clone());
    let parent = state
        .create_measurement(MeasurementKind::Area, square_points(0.0, 0.0, 10.0), attrs("slab"))
        .await
        .unwrap();
    let deduction = state
        .add_deduction(parent, square_points(1.0, 1.0, 2.0), None)
        .await
        .unwrap();

    api.fail_on("delete");
    let result = state.delete_measurement(parent).await;
    assert!(result.is_err());
    assert!(state.store().get(parent).is_some());
    assert!(state.store().get(deduction).is_some());
}

#[tokio::test]
async fn calibration_failure_reverts_to_previous_calibration() {
    let api = Arc::new(MockApi::new());
    let mut state = new_state(api.clone());
    state
        .calibrate_from_distance(Point::new(0.0, 0.0), Point::new(10.0, 0.0), 10.0, Unit::M)
        .await
        .unwrap();
    let id = state
        .create_measurement(MeasurementKind::Linear, line_points(), attrs("wall"))
        .await
        .unwrap();
    assert_eq!(state.store().get(id).unwrap().computed_value, Some(50.0));

    api.fail_on("save_calibration");
    let result = state
        .calibrate_from_distance(Point::new(0.0, 0.0), Point::new(20.0, 0.0), 10.0, Unit::M)
        .await;
    assert!(result.is_err());
    // Still computed under the original 1 px/m factor.
    assert_eq!(state.store().get(id).unwrap().computed_value, Some(50.0));
}

#[tokio::test]
async fn delete_calibration_clears_values_and_failure_restores_them() {
    let api = Arc::new(MockApi::new());
    let mut state = new_state(api.clone());
    state
        .calibrate_from_distance(Point::new(0.0, 0.0), Point::new(10.0, 0.0), 10.0, Unit::M)
        .await
        .unwrap();
    let id = state
        .create_measurement(MeasurementKind::Linear, line_points(), attrs("wall"))
        .await
        .unwrap();

    state.delete_calibration().await.unwrap();
    assert_eq!(state.store().get(id).unwrap().computed_value, None);
    assert_eq!(state.store().get(id).unwrap().unit, None);

    state
        .calibrate_from_distance(Point::new(0.0, 0.0), Point::new(10.0, 0.0), 10.0, Unit::M)
        .await
        .unwrap();
    api.fail_on("delete_calibration");
    let result = state.delete_calibration().await;
    assert!(result.is_err());
    assert_eq!(state.store().get(id).unwrap().computed_value, Some(50.0));
}

#[tokio::test]
async fn load_hydrates_nested_deductions_and_calibration() {
    let api = Arc::new(MockApi::new());
    {
        let mut payload = api.payload.lock().unwrap();
        payload.calibration = Some(seed_calibration(1.0));
        payload.measurements = vec![MeasurementDto {
            id: 500,
            name: "slab".to_string(),
            kind: MeasurementKind::Area,
            color: "#10b981".to_string(),
            category: None,
            points: square_points(0.0, 0.0, 10.0),
            computed_value: Some(96.0),
            perimeter_value: Some(40.0),
            unit: Some("sq m".to_string()),
            takeoff_condition_id: None,
            bid_area_id: None,
            parent_measurement_id: None,
            scope: takeoffkit_measure::BidScope::Takeoff,
            variation_id: None,
            deductions: vec![MeasurementDto {
                id: 501,
                name: "Opening".to_string(),
                kind: MeasurementKind::Area,
                color: "#10b981".to_string(),
                category: None,
                points: square_points(1.0, 1.0, 2.0),
                computed_value: Some(4.0),
                perimeter_value: None,
                unit: Some("sq m".to_string()),
                takeoff_condition_id: None,
                bid_area_id: None,
                parent_measurement_id: Some(500),
                scope: takeoffkit_measure::BidScope::Takeoff,
                variation_id: None,
                deductions: Vec::new(),
            }],
        }];
    }

    let mut state = new_state(api.clone());
    state.load().await.unwrap();

    let parent_id = state.store().find_by_remote(500).unwrap();
    let child_id = state.store().find_by_remote(501).unwrap();
    let parent = state.store().get(parent_id).unwrap();
    assert_eq!(parent.deductions, vec![child_id]);
    // Net value recomputed locally under the loaded calibration.
    assert_eq!(parent.computed_value, Some(96.0));
    assert_eq!(state.store().get(child_id).unwrap().name, "Opening");
}
