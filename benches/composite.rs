use body_chart::diagram::model::{Color, DrawMode, StrokeStyle};
use body_chart::diagram::{EditingSession, ViewRegistry};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::sync::Arc;

fn session_with_history(strokes: usize) -> EditingSession {
    let registry = Arc::new(ViewRegistry::builtin(300, 600));
    let mut session = EditingSession::new(
        registry,
        StrokeStyle::new(DrawMode::FreehandPain, Color::RED, 4.0),
    )
    .expect("anterior view is registered");
    for i in 0..strokes {
        draw(&mut session, i);
    }
    session
}

fn draw(session: &mut EditingSession, i: usize) {
    let y = 20.0 + (i % 50) as f32 * 10.0;
    session.down(40.0, y).expect("down");
    session.move_to(150.0, y + 5.0);
    session.move_to(260.0, y);
    session.up().expect("commit");
}

fn bench_commit(c: &mut Criterion) {
    let mut group = c.benchmark_group("commit_stroke");
    for history_len in [0usize, 50, 200] {
        group.bench_with_input(
            BenchmarkId::from_parameter(history_len),
            &history_len,
            |b, &history_len| {
                let mut session = session_with_history(history_len);
                let mut i = history_len;
                b.iter(|| {
                    draw(&mut session, i);
                    i += 1;
                });
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_commit);
criterion_main!(benches);
