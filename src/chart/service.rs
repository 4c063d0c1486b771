use crate::chart::model::{BodyChart, ChartId};
use crate::chart::store::ChartStore;
use crate::diagram::session::EditingSession;
use crate::error::{ChartResult, PersistenceError};
use chrono::Utc;
use std::cmp::Ordering;
use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;

/// Save, load, list and delete charts through a [`ChartStore`].
#[derive(Clone)]
pub struct ChartService {
    store: Arc<dyn ChartStore>,
}

impl ChartService {
    pub fn new(store: Arc<dyn ChartStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn ChartStore> {
        &self.store
    }

    /// Writes `chart` as a whole. A chart without an id gets a fresh id and a
    /// creation date; a saved chart keeps both and is replaced in place.
    ///
    /// `chart` is only updated once the store accepted the write, so a failed
    /// save can be retried as is.
    pub fn save(&self, chart: &mut BodyChart) -> ChartResult<ChartId> {
        chart.validate()?;

        let now = Utc::now();
        let mut stored = chart.clone();
        let id = *stored.id.get_or_insert_with(ChartId::generate);
        stored.date.get_or_insert(now);
        stored.updated_at = Some(now);

        self.store
            .put(&id, &stored)
            .map_err(|err| PersistenceError::new("put", err))?;

        tracing::debug!(chart = %id, views = stored.views.len(), "chart saved");
        *chart = stored;
        Ok(id)
    }

    /// Stores the final snapshot of every view edited in `session`, replacing
    /// whatever views the chart held before.
    pub fn save_session(
        &self,
        chart: &mut BodyChart,
        session: &EditingSession,
    ) -> ChartResult<ChartId> {
        let mut candidate = chart.clone();
        candidate.set_views(session.final_snapshots()?);
        let id = self.save(&mut candidate)?;
        *chart = candidate;
        Ok(id)
    }

    pub fn load(&self, id: &ChartId) -> ChartResult<Option<BodyChart>> {
        let chart = self
            .store
            .get(id)
            .map_err(|err| PersistenceError::new("get", err))?;
        tracing::debug!(chart = %id, found = chart.is_some(), "chart loaded");
        Ok(chart)
    }

    /// Returns `false` when no chart existed under `id`.
    pub fn delete(&self, id: &ChartId) -> ChartResult<bool> {
        let removed = self
            .store
            .delete(id)
            .map_err(|err| PersistenceError::new("delete", err))?;
        tracing::debug!(chart = %id, removed, "chart deleted");
        Ok(removed)
    }

    /// Every stored chart, most recent first.
    pub fn list(&self) -> ChartResult<Vec<BodyChart>> {
        let mut charts = self
            .store
            .list_all()
            .map_err(|err| PersistenceError::new("list", err))?;
        charts.sort_by(newest_first);
        Ok(charts)
    }

    pub fn list_for_patient(&self, patient_id: &str) -> ChartResult<Vec<BodyChart>> {
        let mut charts = self.list()?;
        charts.retain(|chart| chart.belongs_to(patient_id));
        Ok(charts)
    }

    /// Saves on a worker thread. The outcome is sent to the returned receiver;
    /// if nobody is listening any more a failure is logged instead.
    pub fn save_detached(&self, mut chart: BodyChart) -> Receiver<ChartResult<BodyChart>> {
        let (tx, rx) = mpsc::channel();
        let service = self.clone();
        std::thread::spawn(move || {
            let result = service.save(&mut chart).map(|_| chart);
            if let Err(mpsc::SendError(result)) = tx.send(result) {
                if let Err(err) = result {
                    tracing::error!(error = %err, "detached chart save failed");
                }
            }
        });
        rx
    }
}

impl std::fmt::Debug for ChartService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChartService").finish_non_exhaustive()
    }
}

fn newest_first(a: &BodyChart, b: &BodyChart) -> Ordering {
    // Undated charts sort last.
    let by_date = match (a.date, b.date) {
        (Some(a_date), Some(b_date)) => b_date.cmp(&a_date),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    by_date.then_with(|| a.id.cmp(&b.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::store::MemoryStore;
    use crate::diagram::snapshot::Snapshot;
    use crate::diagram::ViewId;
    use crate::error::ChartError;
    use chrono::{Duration, TimeZone};

    fn service() -> ChartService {
        ChartService::new(Arc::new(MemoryStore::new()))
    }

    #[test]
    fn first_save_assigns_id_and_date() {
        let service = service();
        let mut chart = BodyChart::new("Avaliação Inicial");
        let id = service.save(&mut chart).unwrap();

        assert_eq!(chart.id, Some(id));
        assert!(chart.date.is_some());
        assert_eq!(chart.date, chart.updated_at);
    }

    #[test]
    fn resave_keeps_creation_date_and_replaces_views() {
        let service = service();
        let mut chart = BodyChart::new("Follow-up");
        chart
            .views
            .insert(ViewId::Posterior, Snapshot::from_stored("data:image/png;base64,AA=="));
        let id = service.save(&mut chart).unwrap();
        let created = chart.date;

        chart.views.clear();
        chart.notes = "second visit".into();
        assert_eq!(service.save(&mut chart).unwrap(), id);

        let loaded = service.load(&id).unwrap().unwrap();
        assert_eq!(loaded.date, created);
        assert!(loaded.views.is_empty());
        assert_eq!(loaded.notes, "second visit");
        assert_eq!(service.list().unwrap().len(), 1);
    }

    #[test]
    fn invalid_chart_is_not_stored() {
        let service = service();
        let mut chart = BodyChart::new("");
        assert!(matches!(
            service.save(&mut chart),
            Err(ChartError::InvalidChart(_))
        ));
        assert!(chart.id.is_none());
        assert!(service.list().unwrap().is_empty());
    }

    #[test]
    fn list_is_newest_first_and_filters_by_patient() {
        let service = service();
        let base = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        for (offset, patient) in [(0, "p-1"), (2, "p-2"), (1, "p-1")] {
            let mut chart = BodyChart::new(format!("visit {offset}")).with_patient(patient);
            chart.date = Some(base + Duration::days(offset));
            service.save(&mut chart).unwrap();
        }

        let titles: Vec<_> = service
            .list()
            .unwrap()
            .into_iter()
            .map(|chart| chart.title)
            .collect();
        assert_eq!(titles, vec!["visit 2", "visit 1", "visit 0"]);

        let p1 = service.list_for_patient("p-1").unwrap();
        assert_eq!(p1.len(), 2);
        assert!(p1.iter().all(|chart| chart.belongs_to("p-1")));
    }

    #[test]
    fn delete_reports_missing_charts() {
        let service = service();
        let mut chart = BodyChart::new("Temp");
        let id = service.save(&mut chart).unwrap();
        assert!(service.delete(&id).unwrap());
        assert!(!service.delete(&id).unwrap());
        assert!(service.load(&id).unwrap().is_none());
    }
}
