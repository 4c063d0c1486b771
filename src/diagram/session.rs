use crate::chart::model::BodyChart;
use crate::diagram::history::{HistoryManager, HistoryState};
use crate::diagram::input::{FinishedStroke, StrokeInterpreter};
use crate::diagram::model::{Color, DrawMode, Point, StrokeStyle, ViewId};
use crate::diagram::render::render_stroke;
use crate::diagram::snapshot::Snapshot;
use crate::diagram::state::ViewState;
use crate::diagram::views::ViewRegistry;
use crate::error::{ChartError, ChartResult, UnknownViewError};
use image::RgbaImage;
use std::collections::BTreeMap;
use std::sync::Arc;

/// One user's editing session over a chart's views.
///
/// Each view owns its raster and history; the active view only decides
/// where pointer input lands. Finishing a gesture composites it onto the
/// view it started on and commits one snapshot to that view's history.
#[derive(Debug)]
pub struct EditingSession {
    registry: Arc<ViewRegistry>,
    views: BTreeMap<ViewId, ViewState>,
    history: HistoryManager,
    input: StrokeInterpreter,
    active: ViewId,
    surface: (u32, u32),
}

impl EditingSession {
    /// Starts on the anterior view, sized to its base image.
    pub fn new(registry: Arc<ViewRegistry>, style: StrokeStyle) -> ChartResult<Self> {
        let active = ViewId::Anterior;
        let base = registry.resolve(active)?;
        let surface = base.dimensions();
        let mut session = Self {
            registry,
            views: BTreeMap::new(),
            history: HistoryManager::new(),
            input: StrokeInterpreter::new(style),
            active,
            surface,
        };
        session.ensure_view(active)?;
        Ok(session)
    }

    /// Re-opens a saved chart. Views whose snapshot cannot be decoded start
    /// from their base image; their errors are returned alongside the session.
    pub fn open(
        registry: Arc<ViewRegistry>,
        style: StrokeStyle,
        chart: &BodyChart,
    ) -> ChartResult<(Self, Vec<ChartError>)> {
        let mut session = Self::new(registry, style)?;
        let mut failures = Vec::new();
        for (view, snapshot) in &chart.views {
            let state = match session.ensure_view(*view) {
                Ok(state) => state,
                Err(err) => {
                    failures.push(ChartError::from(err));
                    continue;
                }
            };
            match state.restore(&HistoryState::Snapshot(snapshot.clone())) {
                Ok(()) => {
                    state.mark_committed();
                    session.history.seed(*view, snapshot.clone());
                }
                Err(source) => failures.push(ChartError::RasterDecode {
                    view: *view,
                    source,
                }),
            }
        }
        Ok((session, failures))
    }

    pub fn registry(&self) -> &Arc<ViewRegistry> {
        &self.registry
    }

    pub fn active_view(&self) -> ViewId {
        self.active
    }

    pub fn surface_size(&self) -> (u32, u32) {
        self.surface
    }

    pub fn style(&self) -> StrokeStyle {
        self.input.style()
    }

    pub fn set_style(&mut self, style: StrokeStyle) {
        self.input.set_style(style);
    }

    pub fn interpreter_mut(&mut self) -> &mut StrokeInterpreter {
        &mut self.input
    }

    fn ensure_view(&mut self, view: ViewId) -> Result<&mut ViewState, UnknownViewError> {
        let surface = self.surface;
        if !self.views.contains_key(&view) {
            let base = self.registry.resolve(view)?;
            self.views.insert(view, ViewState::new(view, base, surface));
        }
        let state = self
            .views
            .get_mut(&view)
            .ok_or_else(|| UnknownViewError::new(view.as_str()))?;
        Ok(state)
    }

    /// Makes `view` the target of pointer input. An in-progress stroke is
    /// finished on the view it started on; no history moves.
    pub fn switch_view(&mut self, view: ViewId) -> ChartResult<()> {
        self.ensure_view(view)?;
        self.finish_pending()?;
        if self.active != view {
            tracing::debug!(from = %self.active, to = %view, "switch view");
        }
        self.active = view;
        Ok(())
    }

    pub fn switch_view_name(&mut self, name: &str) -> ChartResult<()> {
        let view: ViewId = name.parse()?;
        self.switch_view(view)
    }

    pub fn down(&mut self, x: f32, y: f32) -> ChartResult<()> {
        self.finish_pending()?;
        let view = self.active;
        self.ensure_view(view)?;
        self.input.begin(view, Point::new(x, y));
        Ok(())
    }

    pub fn move_to(&mut self, x: f32, y: f32) -> bool {
        self.input.extend_stroke(Point::new(x, y))
    }

    /// Finishes the current gesture. Returns `false` when nothing was active.
    pub fn up(&mut self) -> ChartResult<bool> {
        match self.input.end_stroke() {
            Some(finished) => self.commit_stroke(finished).map(|_| true),
            None => Ok(false),
        }
    }

    pub fn begin_stroke(
        &mut self,
        view: ViewId,
        point: Point,
        mode: DrawMode,
        color: Color,
        width: f32,
    ) -> ChartResult<()> {
        self.ensure_view(view)?;
        self.finish_pending()?;
        self.input.begin_stroke(view, point, mode, color, width);
        Ok(())
    }

    pub fn extend_stroke(&mut self, point: Point) -> bool {
        self.input.extend_stroke(point)
    }

    pub fn end_stroke(&mut self) -> ChartResult<bool> {
        self.up()
    }

    fn finish_pending(&mut self) -> ChartResult<()> {
        if self.input.is_active() {
            self.up()?;
        }
        Ok(())
    }

    fn commit_stroke(&mut self, finished: FinishedStroke) -> ChartResult<()> {
        let FinishedStroke { view, stroke } = finished;
        let state = self.ensure_view(view)?;
        state.composite(&stroke);
        self.commit_current(view)?;
        tracing::debug!(view = %view, mode = %stroke.mode(), samples = stroke.points.len(), "stroke committed");
        Ok(())
    }

    /// Snapshots the view's raster into its history. If encoding fails the
    /// raster is put back to the last committed state.
    fn commit_current(&mut self, view: ViewId) -> ChartResult<()> {
        let state = self.ensure_view(view)?;
        let encoded = state.snapshot();
        match encoded {
            Ok(snapshot) => {
                state.mark_committed();
                self.history.commit(view, snapshot);
                Ok(())
            }
            Err(err) => {
                let current = self.history.current(view);
                if let Err(rollback) = self.restore_view(view, &current) {
                    tracing::warn!(view = %view, error = %rollback, "rollback after failed snapshot encode");
                }
                Err(err.into())
            }
        }
    }

    /// The active view with the in-progress stroke drawn over a copy of its
    /// raster. The committed raster is untouched until the gesture ends.
    pub fn preview(&self) -> Option<RgbaImage> {
        let mut raster = self.views.get(&self.active)?.raster().clone();
        if self.input.active_view() == Some(self.active) {
            if let Some(stroke) = self.input.active_stroke() {
                render_stroke(&mut raster, stroke);
            }
        }
        Some(raster)
    }

    pub fn undo(&mut self) -> ChartResult<bool> {
        self.undo_view(self.active)
    }

    pub fn redo(&mut self) -> ChartResult<bool> {
        self.redo_view(self.active)
    }

    pub fn undo_view(&mut self, view: ViewId) -> ChartResult<bool> {
        self.ensure_view(view)?;
        self.finish_pending()?;
        let Some(state) = self.history.undo(view) else {
            return Ok(false);
        };
        tracing::debug!(view = %view, "undo");
        self.restore_view(view, &state)?;
        Ok(true)
    }

    pub fn redo_view(&mut self, view: ViewId) -> ChartResult<bool> {
        self.ensure_view(view)?;
        self.finish_pending()?;
        let Some(state) = self.history.redo(view) else {
            return Ok(false);
        };
        tracing::debug!(view = %view, "redo");
        self.restore_view(view, &state)?;
        Ok(true)
    }

    fn restore_view(&mut self, view: ViewId, history_state: &HistoryState) -> ChartResult<()> {
        let state = self.ensure_view(view)?;
        state
            .restore(history_state)
            .map_err(|source| ChartError::RasterDecode { view, source })
    }

    /// Resets the active view to its base image as a committed edit.
    pub fn clear(&mut self) -> ChartResult<()> {
        self.finish_pending()?;
        let view = self.active;
        self.ensure_view(view)?.clear();
        self.commit_current(view)?;
        tracing::debug!(view = %view, "view cleared");
        Ok(())
    }

    /// Re-derives every open view's surface at the new size from its
    /// committed history state. Views whose snapshot fails to decode fall
    /// back to their base image and are returned as errors.
    pub fn resize(&mut self, width: u32, height: u32) -> Vec<ChartError> {
        let size = (width.max(1), height.max(1));
        if size == self.surface {
            return Vec::new();
        }
        tracing::debug!(width = size.0, height = size.1, "surface resized");
        self.surface = size;
        let mut failures = Vec::new();
        for (view, state) in self.views.iter_mut() {
            let committed = self.history.current(*view);
            if let Err(source) = state.resize(size, &committed) {
                failures.push(ChartError::RasterDecode { view: *view, source });
            }
        }
        failures
    }

    pub fn raster(&self, view: ViewId) -> Option<&RgbaImage> {
        self.views.get(&view).map(ViewState::raster)
    }

    pub fn view_state(&self, view: ViewId) -> Option<&ViewState> {
        self.views.get(&view)
    }

    pub fn current(&self, view: ViewId) -> HistoryState {
        self.history.current(view)
    }

    pub fn can_undo(&self, view: ViewId) -> bool {
        self.history.can_undo(view)
    }

    pub fn can_redo(&self, view: ViewId) -> bool {
        self.history.can_redo(view)
    }

    pub fn history(&self) -> &HistoryManager {
        &self.history
    }

    pub fn snapshot(&self, view: ViewId) -> ChartResult<Option<Snapshot>> {
        match self.views.get(&view) {
            Some(state) => Ok(Some(state.snapshot()?)),
            None => Ok(None),
        }
    }

    /// Snapshots of the current raster of every view that holds at least one
    /// committed edit. Views never drawn on (or undone back to the base
    /// image) are left out.
    pub fn final_snapshots(&self) -> ChartResult<BTreeMap<ViewId, Snapshot>> {
        let mut snapshots = BTreeMap::new();
        for view in self.history.edited_views() {
            if let Some(state) = self.views.get(&view) {
                snapshots.insert(view, state.snapshot()?);
            }
        }
        Ok(snapshots)
    }
}
