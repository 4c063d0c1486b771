use crate::diagram::model::ViewId;
use crate::diagram::snapshot::Snapshot;
use std::collections::BTreeMap;

/// What a view should show at a history position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryState {
    /// Below the first entry: the bare base image.
    Base,
    Snapshot(Snapshot),
}

/// Linear snapshot history for one view.
///
/// `position` counts the entries currently applied, so `0` is the base image
/// and `entries.len()` is the tail.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ViewHistory {
    entries: Vec<Snapshot>,
    position: usize,
}

impl ViewHistory {
    /// A history whose first entry is a previously stored snapshot.
    pub fn seeded(snapshot: Snapshot) -> Self {
        Self {
            entries: vec![snapshot],
            position: 1,
        }
    }

    /// Appends `snapshot`, discarding every entry after the current position.
    pub fn commit(&mut self, snapshot: Snapshot) {
        self.entries.truncate(self.position);
        self.entries.push(snapshot);
        self.position = self.entries.len();
    }

    pub fn undo(&mut self) -> Option<HistoryState> {
        if self.position == 0 {
            return None;
        }
        self.position -= 1;
        Some(self.current())
    }

    pub fn redo(&mut self) -> Option<HistoryState> {
        if self.position >= self.entries.len() {
            return None;
        }
        self.position += 1;
        Some(self.current())
    }

    pub fn current(&self) -> HistoryState {
        match self.position.checked_sub(1) {
            Some(index) => HistoryState::Snapshot(self.entries[index].clone()),
            None => HistoryState::Base,
        }
    }

    pub fn can_undo(&self) -> bool {
        self.position > 0
    }

    pub fn can_redo(&self) -> bool {
        self.position < self.entries.len()
    }

    pub fn has_edits(&self) -> bool {
        self.can_undo()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn position(&self) -> usize {
        self.position
    }
}

/// Independent histories keyed by view. No operation on one view reads or
/// writes another view's entry.
#[derive(Debug, Clone, Default)]
pub struct HistoryManager {
    views: BTreeMap<ViewId, ViewHistory>,
}

impl HistoryManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&mut self, view: ViewId, snapshot: Snapshot) {
        self.views.insert(view, ViewHistory::seeded(snapshot));
    }

    pub fn commit(&mut self, view: ViewId, snapshot: Snapshot) {
        let history = self.views.entry(view).or_default();
        history.commit(snapshot);
        tracing::debug!(
            view = %view,
            position = history.position(),
            "history commit"
        );
    }

    pub fn undo(&mut self, view: ViewId) -> Option<HistoryState> {
        self.views.get_mut(&view)?.undo()
    }

    pub fn redo(&mut self, view: ViewId) -> Option<HistoryState> {
        self.views.get_mut(&view)?.redo()
    }

    pub fn current(&self, view: ViewId) -> HistoryState {
        self.views
            .get(&view)
            .map(ViewHistory::current)
            .unwrap_or(HistoryState::Base)
    }

    pub fn view(&self, view: ViewId) -> Option<&ViewHistory> {
        self.views.get(&view)
    }

    pub fn can_undo(&self, view: ViewId) -> bool {
        self.views.get(&view).is_some_and(ViewHistory::can_undo)
    }

    pub fn can_redo(&self, view: ViewId) -> bool {
        self.views.get(&view).is_some_and(ViewHistory::can_redo)
    }

    /// Views whose current position is above the base image.
    pub fn edited_views(&self) -> impl Iterator<Item = ViewId> + '_ {
        self.views
            .iter()
            .filter(|(_, history)| history.has_edits())
            .map(|(view, _)| *view)
    }
}
