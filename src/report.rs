use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::providers::azure::EpicRecord;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    pub epic_id: u64,
    pub epic_state: String,
    pub title: String,
    pub effort: f64,
    pub story_points: f64,
    pub difference: f64,
}

impl ReportRow {
    /// Combine an Epic with the summed story points of its children.
    pub fn from_epic(epic: &EpicRecord, total_story_points: f64) -> Self {
        Self {
            epic_id: epic.id,
            epic_state: epic.state.clone(),
            title: epic.title.clone(),
            effort: epic.effort,
            story_points: total_story_points,
            difference: epic.effort - total_story_points,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EpicReport {
    pub provider: String,
    pub organization: String,
    pub project: String,
    pub iteration: String,
    pub collected_at: DateTime<Utc>,
    pub total_epics: usize,
    pub rows: Vec<ReportRow>,
    pub failed_epics: Vec<FailedEpic>,
    pub summary: ReportSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedEpic {
    pub epic_id: u64,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub total_effort: f64,
    pub total_story_points: f64,
    pub total_difference: f64,
}

impl ReportSummary {
    pub fn from_rows(rows: &[ReportRow]) -> Self {
        rows.iter().fold(Self::default(), |acc, row| Self {
            total_effort: acc.total_effort + row.effort,
            total_story_points: acc.total_story_points + row.story_points,
            total_difference: acc.total_difference + row.difference,
        })
    }
}

/// Progress of a report run, emitted in Epic order as each one completes.
#[derive(Debug, Clone, PartialEq)]
pub enum ReportEvent {
    Started { epic_count: usize },
    Row(ReportRow),
    EpicFailed { epic_id: u64, error: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportOutcome {
    /// The query matched nothing. Informational, not a failure.
    NoEpics,
    Completed { rows: usize, failures: usize },
}
