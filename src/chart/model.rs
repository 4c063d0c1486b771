use crate::diagram::model::ViewId;
use crate::diagram::snapshot::Snapshot;
use crate::error::ChartError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChartId(Uuid);

impl ChartId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for ChartId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for ChartId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

/// A saved body diagram: one final snapshot per drawn view plus metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyChart {
    /// Assigned on first save.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ChartId>,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_id: Option<String>,
    /// Creation time, stamped on first save and never changed afterwards.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub views: BTreeMap<ViewId, Snapshot>,
    #[serde(default)]
    pub notes: String,
}

impl BodyChart {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: None,
            title: title.into(),
            patient_id: None,
            date: None,
            updated_at: None,
            views: BTreeMap::new(),
            notes: String::new(),
        }
    }

    pub fn with_patient(mut self, patient_id: impl Into<String>) -> Self {
        self.patient_id = Some(patient_id.into());
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    pub fn is_saved(&self) -> bool {
        self.id.is_some()
    }

    pub fn validate(&self) -> Result<(), ChartError> {
        if self.title.trim().is_empty() {
            return Err(ChartError::InvalidChart("title must not be empty".into()));
        }
        if let Some(patient_id) = &self.patient_id {
            if patient_id.trim().is_empty() {
                return Err(ChartError::InvalidChart(
                    "patient id must not be blank when present".into(),
                ));
            }
        }
        Ok(())
    }

    /// Replaces every stored view with `snapshots`.
    pub fn set_views(&mut self, snapshots: BTreeMap<ViewId, Snapshot>) {
        self.views = snapshots;
    }

    pub fn belongs_to(&self, patient_id: &str) -> bool {
        self.patient_id.as_deref() == Some(patient_id)
    }
}
