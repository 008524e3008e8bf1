//! Property tests for box-select hit-testing.

use proptest::prelude::*;
use takeoffkit_measure::geometry::{segment_intersects_rect, Point, Rect};

proptest! {
    #[test]
    fn segment_with_an_endpoint_inside_is_always_selected(
        ax in 0.1f64..0.9, ay in 0.1f64..0.9,
        bx in -2.0f64..2.0, by in -2.0f64..2.0,
    ) {
        let rect = Rect::from_corners(Point::new(0.0, 0.0), Point::new(1.0, 1.0));
        prop_assert!(segment_intersects_rect(Point::new(ax, ay), Point::new(bx, by), &rect));
    }

    #[test]
    fn segment_far_outside_is_never_selected(
        ax in 5.0f64..9.0, ay in 5.0f64..9.0,
        bx in 5.0f64..9.0, by in 5.0f64..9.0,
    ) {
        let rect = Rect::from_corners(Point::new(0.0, 0.0), Point::new(1.0, 1.0));
        prop_assert!(!segment_intersects_rect(Point::new(ax, ay), Point::new(bx, by), &rect));
    }

    #[test]
    fn selection_is_symmetric_in_segment_direction(
        ax in -2.0f64..2.0, ay in -2.0f64..2.0,
        bx in -2.0f64..2.0, by in -2.0f64..2.0,
    ) {
        let rect = Rect::from_corners(Point::new(0.0, 0.0), Point::new(1.0, 1.0));
        let forward = segment_intersects_rect(Point::new(ax, ay), Point::new(bx, by), &rect);
        let backward = segment_intersects_rect(Point::new(bx, by), Point::new(ax, ay), &rect);
        prop_assert_eq!(forward, backward);
    }
}
