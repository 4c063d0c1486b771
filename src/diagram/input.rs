use crate::diagram::model::{Color, DrawMode, Point, Stroke, StrokeStyle, ViewId};

/// Consecutive freehand samples closer than this are merged.
const MIN_POINT_DIST_SQ: f32 = 0.25;

/// A stroke finished by [`StrokeInterpreter::end_stroke`], tagged with the
/// view it was started on.
#[derive(Debug, Clone, PartialEq)]
pub struct FinishedStroke {
    pub view: ViewId,
    pub stroke: Stroke,
}

#[derive(Debug, Clone, PartialEq)]
struct ActiveStroke {
    view: ViewId,
    stroke: Stroke,
}

/// Turns pointer samples into strokes using the configured style.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StrokeInterpreter {
    style: StrokeStyle,
    active: Option<ActiveStroke>,
}

impl StrokeInterpreter {
    pub fn new(style: StrokeStyle) -> Self {
        Self {
            style: style.sanitized(),
            active: None,
        }
    }

    pub fn style(&self) -> StrokeStyle {
        self.style
    }

    /// Takes effect from the next stroke; an in-progress stroke keeps the
    /// style it started with.
    pub fn set_style(&mut self, style: StrokeStyle) {
        self.style = style.sanitized();
    }

    pub fn set_mode(&mut self, mode: DrawMode) {
        self.style.mode = mode;
    }

    pub fn set_color(&mut self, color: Color) {
        self.style.color = color;
    }

    pub fn set_width(&mut self, width: f32) {
        self.style = StrokeStyle {
            width,
            ..self.style
        }
        .sanitized();
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn active_view(&self) -> Option<ViewId> {
        self.active.as_ref().map(|active| active.view)
    }

    pub fn active_stroke(&self) -> Option<&Stroke> {
        self.active.as_ref().map(|active| &active.stroke)
    }

    /// Starts a stroke with explicit parameters. Point and trigger-point
    /// strokes are fully defined by this single sample.
    pub fn begin_stroke(
        &mut self,
        view: ViewId,
        point: Point,
        mode: DrawMode,
        color: Color,
        width: f32,
    ) {
        let style = StrokeStyle::new(mode, color, width);
        if let Some(previous) = self.active.take() {
            tracing::debug!(
                view = %previous.view,
                "unfinished stroke replaced by a new one"
            );
        }
        self.active = Some(ActiveStroke {
            view,
            stroke: Stroke::new(style, point),
        });
    }

    /// Starts a stroke with the configured style.
    pub fn begin(&mut self, view: ViewId, point: Point) {
        let style = self.style;
        self.begin_stroke(view, point, style.mode, style.color, style.width);
    }

    /// Appends a sample to an active freehand stroke. Returns whether the
    /// sample was recorded.
    pub fn extend_stroke(&mut self, point: Point) -> bool {
        let Some(active) = self.active.as_mut() else {
            tracing::trace!("extend ignored: no active stroke");
            return false;
        };
        if !active.stroke.mode().is_freehand() {
            return false;
        }
        if !should_append_point(active.stroke.points.last().copied(), point) {
            return false;
        }
        active.stroke.points.push(point);
        true
    }

    pub fn end_stroke(&mut self) -> Option<FinishedStroke> {
        let Some(active) = self.active.take() else {
            tracing::trace!("end ignored: no active stroke");
            return None;
        };
        Some(FinishedStroke {
            view: active.view,
            stroke: active.stroke,
        })
    }
}

fn should_append_point(last: Option<Point>, point: Point) -> bool {
    let Some(last) = last else {
        return true;
    };
    last.distance_sq(point) >= MIN_POINT_DIST_SQ
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interpreter(mode: DrawMode) -> StrokeInterpreter {
        StrokeInterpreter::new(StrokeStyle::new(mode, Color::RED, 4.0))
    }

    #[test]
    fn freehand_collects_samples_until_end() {
        let mut input = interpreter(DrawMode::FreehandPain);
        input.begin(ViewId::Anterior, Point::new(1.0, 1.0));
        assert!(input.extend_stroke(Point::new(5.0, 5.0)));
        assert!(input.extend_stroke(Point::new(9.0, 2.0)));

        let finished = input.end_stroke().expect("active stroke");
        assert_eq!(finished.view, ViewId::Anterior);
        assert_eq!(finished.stroke.points.len(), 3);
        assert!(!input.is_active());
    }

    #[test]
    fn duplicate_samples_are_skipped() {
        let mut input = interpreter(DrawMode::FreehandRestriction);
        input.begin(ViewId::Posterior, Point::new(3.0, 3.0));
        assert!(!input.extend_stroke(Point::new(3.0, 3.0)));
        assert!(!input.extend_stroke(Point::new(3.2, 3.1)));
        assert!(input.extend_stroke(Point::new(4.0, 3.0)));
        assert_eq!(input.active_stroke().map(|s| s.points.len()), Some(2));
    }

    #[test]
    fn point_modes_ignore_extra_samples() {
        for mode in [DrawMode::Point, DrawMode::TriggerPoint] {
            let mut input = interpreter(mode);
            input.begin(ViewId::Anterior, Point::new(10.0, 10.0));
            assert!(!input.extend_stroke(Point::new(20.0, 20.0)));
            let finished = input.end_stroke().unwrap();
            assert_eq!(finished.stroke.points, vec![Point::new(10.0, 10.0)]);
            assert_eq!(finished.stroke.mode(), mode);
        }
    }

    #[test]
    fn extend_and_end_without_stroke_are_noops() {
        let mut input = interpreter(DrawMode::FreehandPain);
        assert!(!input.extend_stroke(Point::new(1.0, 1.0)));
        assert_eq!(input.end_stroke(), None);
    }

    #[test]
    fn style_changes_apply_to_next_stroke_only() {
        let mut input = interpreter(DrawMode::FreehandPain);
        input.begin(ViewId::Anterior, Point::new(0.0, 0.0));
        input.set_color(Color::BLUE);
        input.set_width(12.0);
        input.set_mode(DrawMode::Point);
        input.extend_stroke(Point::new(5.0, 0.0));

        let first = input.end_stroke().unwrap().stroke;
        assert_eq!(first.style.color, Color::RED);
        assert_eq!(first.style.width, 4.0);
        assert_eq!(first.points.len(), 2);

        input.begin(ViewId::Anterior, Point::new(1.0, 1.0));
        let second = input.end_stroke().unwrap().stroke;
        assert_eq!(second.style.color, Color::BLUE);
        assert_eq!(second.style.width, 12.0);
        assert_eq!(second.mode(), DrawMode::Point);
    }

    #[test]
    fn explicit_begin_sanitizes_width() {
        let mut input = interpreter(DrawMode::FreehandPain);
        input.begin_stroke(
            ViewId::LeftLateral,
            Point::new(0.0, 0.0),
            DrawMode::TriggerPoint,
            Color::BLACK,
            -3.0,
        );
        let finished = input.end_stroke().unwrap();
        assert_eq!(finished.view, ViewId::LeftLateral);
        assert!(finished.stroke.style.width > 0.0);
    }
}
