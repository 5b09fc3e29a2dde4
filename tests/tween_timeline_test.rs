use cgmath::Vector3;

use drake_ngin::tween::{BezierPath, Ease, Lerp, Timeline};

#[derive(Default)]
struct Recorder {
    values: Vec<f32>,
    events: Vec<String>,
}

#[test]
fn lerp_blends_scalars_vectors_and_colours() {
    assert_eq!(2.0f32.lerp(4.0, 0.5), 3.0);
    assert_eq!(
        Vector3::new(0.0, 10.0, -2.0).lerp(Vector3::new(2.0, 0.0, 2.0), 0.5),
        Vector3::new(1.0, 5.0, 0.0)
    );
    assert_eq!([1.0, 0.0, 0.5].lerp([0.0, 1.0, 0.5], 0.5), [0.5, 0.5, 0.5]);
}

#[test]
fn bezier_path_hits_first_and_last_control_point() {
    let path = BezierPath::new(vec![
        Vector3::new(0.0, 0.0, 0.0),
        Vector3::new(30.0, 20.0, 20.0),
        Vector3::new(10.0, 40.0, -30.0),
        Vector3::new(50.0, 70.0, 20.0),
    ])
    .unwrap();
    assert_eq!(path.sample(0.0), Vector3::new(0.0, 0.0, 0.0));
    assert_eq!(path.sample(1.0), Vector3::new(50.0, 70.0, 20.0));
}

#[test]
fn bezier_path_midpoint_matches_de_casteljau_by_hand() {
    // Quadratic curve: B(0.5) = 0.25 p0 + 0.5 p1 + 0.25 p2.
    let path = BezierPath::new(vec![0.0f32, 1.0, 0.0]).unwrap();
    assert!((path.sample(0.5) - 0.5).abs() < 1e-6);

    let path = BezierPath::new(vec![0.0f32, 0.0, 1.0, 1.0]).unwrap();
    assert!((path.sample(0.5) - 0.5).abs() < 1e-6);
}

#[test]
fn bezier_path_rejects_degenerate_point_lists() {
    assert!(BezierPath::new(vec![1.0f32]).is_err());
    assert!(BezierPath::<f32>::new(vec![]).is_err());
}

#[test]
fn timeline_applies_eased_progress_and_finishes_on_one() {
    let mut timeline: Timeline<Recorder> = Timeline::new();
    timeline.tween(0.0, 1.0, Ease::Linear, |state, t| state.values.push(t));

    let mut state = Recorder::default();
    assert!(timeline.advance(&mut state, 0.25));
    assert!(timeline.advance(&mut state, 0.25));
    // Overshoot the end; the final application must still be exactly 1.0.
    assert!(!timeline.advance(&mut state, 10.0));
    assert_eq!(state.values, vec![0.25, 0.5, 1.0]);
    assert!(timeline.is_idle());
}

#[test]
fn timeline_waits_for_an_entrys_start_offset() {
    let mut timeline: Timeline<Recorder> = Timeline::new();
    timeline.tween(1.0, 1.0, Ease::Linear, |state, t| state.values.push(t));

    let mut state = Recorder::default();
    timeline.advance(&mut state, 0.5);
    assert!(state.values.is_empty());
    timeline.advance(&mut state, 1.0);
    assert_eq!(state.values, vec![0.5]);
}

#[test]
fn completion_callback_runs_after_the_final_apply() {
    let mut timeline: Timeline<Recorder> = Timeline::new();
    timeline.tween_then(
        0.0,
        0.5,
        Ease::Linear,
        |state, t| state.events.push(format!("apply {}", t)),
        |state| state.events.push("complete".to_string()),
    );

    let mut state = Recorder::default();
    timeline.advance(&mut state, 1.0);
    assert_eq!(state.events, vec!["apply 1", "complete"]);
}

#[test]
fn delayed_calls_fire_once_in_insertion_order() {
    let mut timeline: Timeline<Recorder> = Timeline::new();
    timeline
        .tween(0.0, 0.4, Ease::Linear, |state, _| {
            state.events.push("tween".to_string())
        })
        .call(0.4, |state| state.events.push("first".to_string()))
        .call(0.4, |state| state.events.push("second".to_string()));

    let mut state = Recorder::default();
    timeline.advance(&mut state, 0.4);
    assert_eq!(state.events, vec!["tween", "first", "second"]);
    // Finished entries must not fire again.
    timeline.advance(&mut state, 0.1);
    assert_eq!(state.events.len(), 3);
}

#[test]
fn clear_cancels_pending_entries_without_callbacks() {
    let mut timeline: Timeline<Recorder> = Timeline::new();
    timeline.tween_then(
        0.0,
        1.0,
        Ease::Linear,
        |state, t| state.values.push(t),
        |state| state.events.push("should not fire".to_string()),
    );
    timeline.call(2.0, |state| state.events.push("also not".to_string()));

    let mut state = Recorder::default();
    timeline.advance(&mut state, 0.5);
    timeline.clear();
    assert!(timeline.is_idle());
    assert_eq!(timeline.elapsed(), 0.0);
    assert!(!timeline.advance(&mut state, 10.0));
    assert!(state.events.is_empty());
}

#[test]
fn duration_reports_the_latest_entry_end() {
    let mut timeline: Timeline<Recorder> = Timeline::new();
    timeline.tween(0.0, 0.45, Ease::QuadOut, |_, _| {});
    timeline.tween(0.45, 0.1, Ease::QuartIn, |_, _| {});
    timeline.tween(0.55, 0.8, Ease::ElasticOut, |_, _| {});
    timeline.call(1.35, |_| {});
    assert!((timeline.duration() - 1.35).abs() < 1e-6);
}
