use body_chart::chart::BodyChart;
use body_chart::diagram::history::HistoryState;
use body_chart::diagram::model::{Color, DrawMode, Point, StrokeStyle};
use body_chart::diagram::snapshot::Snapshot;
use body_chart::diagram::{EditingSession, ViewId, ViewRegistry};
use body_chart::ChartError;
use std::sync::Arc;

fn registry() -> Arc<ViewRegistry> {
    Arc::new(ViewRegistry::builtin(120, 240))
}

fn new_session() -> EditingSession {
    EditingSession::new(
        registry(),
        StrokeStyle::new(DrawMode::FreehandPain, Color::RED, 4.0),
    )
    .unwrap()
}

fn freehand(session: &mut EditingSession, points: &[(f32, f32)]) {
    let (x, y) = points[0];
    session.down(x, y).unwrap();
    for &(x, y) in &points[1..] {
        session.move_to(x, y);
    }
    assert!(session.up().unwrap());
}

#[test]
fn undo_removes_only_last_mark_after_visiting_another_view() {
    let mut session = new_session();
    let posterior_base = session.registry().resolve(ViewId::Posterior).unwrap();
    let anterior_base = session.registry().resolve(ViewId::Anterior).unwrap();

    freehand(&mut session, &[(20.0, 60.0), (60.0, 70.0), (100.0, 60.0)]);
    let after_pain = session.raster(ViewId::Anterior).unwrap().clone();

    session.set_style(StrokeStyle::new(DrawMode::TriggerPoint, Color::BLUE, 8.0));
    session.down(60.0, 150.0).unwrap();
    assert!(session.up().unwrap());
    assert_ne!(session.raster(ViewId::Anterior).unwrap(), &after_pain);

    session.switch_view(ViewId::Posterior).unwrap();
    session.switch_view(ViewId::Anterior).unwrap();
    assert!(session.undo().unwrap());

    assert_eq!(session.raster(ViewId::Anterior).unwrap(), &after_pain);
    assert_ne!(session.raster(ViewId::Anterior).unwrap(), &*anterior_base);
    assert_eq!(session.raster(ViewId::Posterior).unwrap(), &*posterior_base);
    assert_eq!(session.current(ViewId::Posterior), HistoryState::Base);
}

#[test]
fn drawing_on_one_view_never_changes_another_views_current() {
    let mut session = new_session();
    freehand(&mut session, &[(10.0, 10.0), (50.0, 50.0)]);
    let anterior_current = session.current(ViewId::Anterior);

    session.switch_view(ViewId::RightLateral).unwrap();
    freehand(&mut session, &[(30.0, 30.0), (90.0, 40.0)]);
    freehand(&mut session, &[(30.0, 90.0), (90.0, 100.0)]);
    session.undo().unwrap();

    assert_eq!(session.current(ViewId::Anterior), anterior_current);
    assert!(session.can_undo(ViewId::RightLateral));
    assert!(session.can_redo(ViewId::RightLateral));
}

#[test]
fn undo_view_works_on_inactive_view() {
    let mut session = new_session();
    freehand(&mut session, &[(10.0, 10.0), (50.0, 50.0)]);
    session.switch_view(ViewId::Posterior).unwrap();

    assert!(session.undo_view(ViewId::Anterior).unwrap());
    assert_eq!(session.current(ViewId::Anterior), HistoryState::Base);
    assert!(!session.undo_view(ViewId::Anterior).unwrap());
    assert!(session.redo_view(ViewId::Anterior).unwrap());
    assert_eq!(session.active_view(), ViewId::Posterior);
}

#[test]
fn style_change_mid_stroke_applies_to_next_stroke() {
    let mut session = new_session();
    session.down(10.0, 10.0).unwrap();
    session.set_style(StrokeStyle::new(DrawMode::Point, Color::BLACK, 2.0));
    assert!(session.move_to(60.0, 60.0));
    assert!(session.up().unwrap());

    session.down(100.0, 200.0).unwrap();
    assert!(!session.move_to(110.0, 210.0));
    assert!(session.up().unwrap());
    assert_eq!(session.history().view(ViewId::Anterior).map(|h| h.len()), Some(2));
}

#[test]
fn snapshot_round_trip_is_byte_identical() {
    let mut session = new_session();
    freehand(&mut session, &[(5.0, 5.0), (115.0, 235.0)]);
    session.set_style(StrokeStyle::new(DrawMode::FreehandRestriction, Color::BLUE, 5.0));
    freehand(&mut session, &[(5.0, 235.0), (60.0, 120.0), (115.0, 5.0)]);

    let first = session.snapshot(ViewId::Anterior).unwrap().unwrap();
    let decoded = first.decode().unwrap();
    let second = Snapshot::encode(&decoded).unwrap();
    assert_eq!(first, second);
}

#[test]
fn reopened_chart_shows_stored_marks_and_can_undo_to_base() {
    let mut session = new_session();
    freehand(&mut session, &[(20.0, 20.0), (100.0, 200.0)]);
    let drawn = session.raster(ViewId::Anterior).unwrap().clone();

    let mut chart = BodyChart::new("Reopen");
    chart.set_views(session.final_snapshots().unwrap());

    let (mut reopened, failures) = EditingSession::open(
        session.registry().clone(),
        StrokeStyle::default(),
        &chart,
    )
    .unwrap();
    assert!(failures.is_empty());
    assert_eq!(reopened.raster(ViewId::Anterior).unwrap(), &drawn);
    assert!(reopened.undo().unwrap());
    let base = reopened.registry().resolve(ViewId::Anterior).unwrap();
    assert_eq!(reopened.raster(ViewId::Anterior).unwrap(), &*base);
}

#[test]
fn corrupt_snapshot_falls_back_to_base_without_touching_siblings() {
    let mut session = new_session();
    session.switch_view(ViewId::Posterior).unwrap();
    freehand(&mut session, &[(20.0, 20.0), (100.0, 100.0)]);
    let posterior = session.raster(ViewId::Posterior).unwrap().clone();

    let mut chart = BodyChart::new("Partly broken");
    chart.set_views(session.final_snapshots().unwrap());
    chart
        .views
        .insert(ViewId::Anterior, Snapshot::from_stored("data:image/png;base64,@@@"));

    let (reopened, failures) =
        EditingSession::open(registry(), StrokeStyle::default(), &chart).unwrap();

    assert_eq!(failures.len(), 1);
    assert!(matches!(
        &failures[0],
        ChartError::RasterDecode { view: ViewId::Anterior, .. }
    ));
    let base = reopened.registry().resolve(ViewId::Anterior).unwrap();
    assert_eq!(reopened.raster(ViewId::Anterior).unwrap(), &*base);
    assert!(!reopened.can_undo(ViewId::Anterior));
    assert_eq!(reopened.raster(ViewId::Posterior).unwrap(), &posterior);
}

#[test]
fn explicit_stroke_api_targets_named_view() {
    let mut session = new_session();
    session
        .begin_stroke(
            ViewId::LeftLateral,
            Point::new(40.0, 40.0),
            DrawMode::Point,
            Color::BLACK,
            10.0,
        )
        .unwrap();
    assert!(session.end_stroke().unwrap());
    assert!(!session.end_stroke().unwrap());

    assert!(session.can_undo(ViewId::LeftLateral));
    assert!(!session.can_undo(ViewId::Anterior));
    assert_eq!(session.active_view(), ViewId::Anterior);
}

#[test]
fn stroke_from_far_off_surface_commits_its_visible_part() {
    let mut session = new_session();
    let base = session.registry().resolve(ViewId::Anterior).unwrap();
    freehand(&mut session, &[(-3.0e9, 50.0), (3.0e9, 50.0)]);

    let raster = session.raster(ViewId::Anterior).unwrap();
    assert_ne!(raster, &*base);
    assert_eq!(raster.get_pixel(60, 50), &Color::RED.to_rgba());
    assert!(session.can_undo(ViewId::Anterior));
}

#[test]
fn repeated_resizes_keep_marks_on_every_open_view() {
    let mut session = new_session();
    freehand(&mut session, &[(10.0, 100.0), (110.0, 100.0)]);
    session.switch_view(ViewId::Posterior).unwrap();
    freehand(&mut session, &[(60.0, 20.0), (60.0, 220.0)]);
    let anterior = session.raster(ViewId::Anterior).unwrap().clone();
    let posterior = session.raster(ViewId::Posterior).unwrap().clone();

    assert!(session.resize(3, 6).is_empty());
    assert!(session.resize(120, 240).is_empty());

    assert_eq!(session.raster(ViewId::Anterior).unwrap(), &anterior);
    assert_eq!(session.raster(ViewId::Posterior).unwrap(), &posterior);
}
