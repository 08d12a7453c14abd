use chrono::Utc;
use futures::{stream, StreamExt};
use log::{debug, info, warn};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::core::AzureDevOpsProvider;
use crate::error::{EpicLensError, Result};
use crate::report::{
    EpicReport, FailedEpic, ReportEvent, ReportOutcome, ReportRow, ReportSummary,
};

impl AzureDevOpsProvider {
    /// Detail fetch, child aggregation and row assembly for a single Epic.
    pub async fn build_row(&self, project: &str, epic_id: u64) -> Result<ReportRow> {
        let epic = self.fetch_epic(project, epic_id).await?;
        let total_story_points = self.aggregate_story_points(project, &epic).await?;
        let row = ReportRow::from_epic(&epic, total_story_points);

        debug!(
            "Epic {epic_id}: effort {}, total story points {}, difference {}",
            row.effort, row.story_points, row.difference
        );
        Ok(row)
    }

    /// Run the whole pipeline for one iteration, sending one event per Epic as it completes.
    ///
    /// Rows arrive in the order the query returned the Epics, whatever the concurrency.
    /// A failing Epic is reported as [`ReportEvent::EpicFailed`] and the run continues.
    /// Only a failed Epic query, invalid input or cancellation end the run with an error.
    pub async fn run_report(
        &self,
        project: &str,
        iteration: &str,
        events: &mpsc::UnboundedSender<ReportEvent>,
        cancel: &CancellationToken,
    ) -> Result<ReportOutcome> {
        let epic_ids = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(EpicLensError::Cancelled),
            ids = self.locate_epics(project, iteration) => ids?,
        };

        if epic_ids.is_empty() {
            info!("No Epics found in iteration: {iteration}");
            return Ok(ReportOutcome::NoEpics);
        }

        // A dropped receiver only means nobody is watching; keep computing.
        let _ = events.send(ReportEvent::Started {
            epic_count: epic_ids.len(),
        });

        let mut rows = std::pin::pin!(stream::iter(epic_ids)
            .map(|epic_id| async move { (epic_id, self.build_row(project, epic_id).await) })
            .buffered(self.options.concurrency));

        let mut completed = 0;
        let mut failures = 0;
        loop {
            let next = tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    warn!("Report cancelled after {completed} rows");
                    return Err(EpicLensError::Cancelled);
                }
                next = rows.next() => next,
            };
            let Some((epic_id, result)) = next else {
                break;
            };

            match result {
                Ok(row) => {
                    completed += 1;
                    let _ = events.send(ReportEvent::Row(row));
                }
                Err(e) => {
                    failures += 1;
                    warn!("Error fetching Epic details for {epic_id}: {e}");
                    let _ = events.send(ReportEvent::EpicFailed {
                        epic_id,
                        error: e.to_string(),
                    });
                }
            }
        }

        info!("Report finished: {completed} rows, {failures} failed Epics");
        Ok(ReportOutcome::Completed {
            rows: completed,
            failures,
        })
    }

    /// Run the pipeline to completion and gather every event into an [`EpicReport`].
    pub async fn collect_report(
        &self,
        project: &str,
        iteration: &str,
        cancel: &CancellationToken,
    ) -> Result<EpicReport> {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let outcome = self.run_report(project, iteration, &tx, cancel).await?;
        drop(tx);

        let mut rows = Vec::new();
        let mut failed_epics = Vec::new();
        while let Some(event) = rx.recv().await {
            match event {
                ReportEvent::Row(row) => rows.push(row),
                ReportEvent::EpicFailed { epic_id, error } => {
                    failed_epics.push(FailedEpic { epic_id, error });
                }
                ReportEvent::Started { .. } => {}
            }
        }

        let total_epics = match outcome {
            ReportOutcome::NoEpics => 0,
            ReportOutcome::Completed { rows, failures } => rows + failures,
        };

        Ok(EpicReport {
            provider: "Azure DevOps".to_string(),
            organization: self.organization.clone(),
            project: project.to_string(),
            iteration: iteration.to_string(),
            collected_at: Utc::now(),
            total_epics,
            summary: ReportSummary::from_rows(&rows),
            rows,
            failed_epics,
        })
    }
}
