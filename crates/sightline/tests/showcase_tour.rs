//! Runs the bundled showcase tour end to end.

use sightline::tour::{TourDefinition, TourExecutor, TourExecutorConfig};
use sightline_core::PlaybackOutcome;

#[test]
fn test_showcase_tour_runs() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/tours/showcase.ron");
    let tour = TourDefinition::from_file(path).unwrap();

    let report = TourExecutor::with_config(TourExecutorConfig::default())
        .execute_tour(&tour)
        .unwrap();

    assert_eq!(report.tour_name, "Showcase");
    assert_eq!(report.snapshot.len(), 5);
    assert_eq!(report.count(PlaybackOutcome::Finished), 3);
    assert_eq!(report.count(PlaybackOutcome::Stopped), 1);
    assert!(report.playbacks.iter().all(|p| p.outcome.is_some()));
    assert!(report
        .final_camera
        .position
        .abs_diff_eq(glam::Vec3::new(0.0, 8.0, 25.0), 1e-3));
}
