use crate::diagram::history::HistoryState;
use crate::diagram::model::{Stroke, ViewId};
use crate::diagram::render::{base_surface, fit_to_surface, render_stroke};
use crate::diagram::snapshot::Snapshot;
use crate::diagram::views::BaseImageRef;
use crate::error::{RasterDecodeError, RasterEncodeError};
use image::RgbaImage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewPhase {
    Empty,
    HasHistory,
    Restoring,
}

pub fn can_transition(from: ViewPhase, to: ViewPhase) -> bool {
    matches!(
        (from, to),
        (ViewPhase::Empty, ViewPhase::HasHistory)
            | (ViewPhase::Empty, ViewPhase::Restoring)
            | (ViewPhase::HasHistory, ViewPhase::Restoring)
            | (ViewPhase::Restoring, ViewPhase::Empty)
            | (ViewPhase::Restoring, ViewPhase::HasHistory)
    ) || from == to
}

/// Working surface of one view: the fixed base image plus the composited
/// raster holding every committed mark.
#[derive(Debug, Clone)]
pub struct ViewState {
    view_id: ViewId,
    base: BaseImageRef,
    raster: RgbaImage,
    phase: ViewPhase,
}

impl ViewState {
    pub fn new(view_id: ViewId, base: BaseImageRef, size: (u32, u32)) -> Self {
        let raster = base_surface(&base, size);
        Self {
            view_id,
            base,
            raster,
            phase: ViewPhase::Empty,
        }
    }

    pub fn view_id(&self) -> ViewId {
        self.view_id
    }

    pub fn base(&self) -> &BaseImageRef {
        &self.base
    }

    pub fn raster(&self) -> &RgbaImage {
        &self.raster
    }

    pub fn phase(&self) -> ViewPhase {
        self.phase
    }

    pub fn size(&self) -> (u32, u32) {
        self.raster.dimensions()
    }

    fn transition(&mut self, to: ViewPhase) {
        debug_assert!(
            can_transition(self.phase, to),
            "invalid view phase transition {:?} -> {:?}",
            self.phase,
            to
        );
        self.phase = to;
    }

    /// Draws `stroke` over the current raster. Returns whether the stroke
    /// touched the surface.
    pub fn composite(&mut self, stroke: &Stroke) -> bool {
        render_stroke(&mut self.raster, stroke)
    }

    pub fn snapshot(&self) -> Result<Snapshot, RasterEncodeError> {
        Snapshot::encode(&self.raster)
    }

    /// Resets the raster to exactly the base image.
    pub fn clear(&mut self) {
        self.raster = base_surface(&self.base, self.size());
    }

    pub fn mark_committed(&mut self) {
        if self.phase == ViewPhase::Empty {
            self.transition(ViewPhase::HasHistory);
        }
    }

    /// Re-blits the raster for a history position. A snapshot that fails to
    /// decode leaves the view on its base image and reports the error.
    pub fn restore(&mut self, state: &HistoryState) -> Result<(), RasterDecodeError> {
        self.transition(ViewPhase::Restoring);
        let size = self.size();
        let result = match state {
            HistoryState::Base => {
                self.raster = base_surface(&self.base, size);
                self.transition(ViewPhase::Empty);
                Ok(())
            }
            HistoryState::Snapshot(snapshot) => match snapshot.decode() {
                Ok(decoded) => {
                    self.raster = fit_to_surface(&self.base, decoded, size);
                    self.transition(ViewPhase::HasHistory);
                    Ok(())
                }
                Err(err) => {
                    self.raster = base_surface(&self.base, size);
                    self.transition(ViewPhase::Empty);
                    Err(err)
                }
            },
        };
        if let Err(err) = &result {
            tracing::warn!(view = %self.view_id, error = %err, "snapshot restore fell back to base image");
        }
        result
    }

    /// Re-derives the surface at `size` from `committed`, the view's current
    /// history position, so repeated resizes never compound scaling loss.
    pub fn resize(
        &mut self,
        size: (u32, u32),
        committed: &HistoryState,
    ) -> Result<(), RasterDecodeError> {
        if self.size() == size {
            return Ok(());
        }
        self.raster = base_surface(&self.base, size);
        self.restore(committed)
    }
}
