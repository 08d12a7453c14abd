use futures::{stream, StreamExt};
use log::{debug, info, warn};

use super::core::{require, AzureDevOpsProvider, ChildFailurePolicy};
use crate::error::Result;
use crate::providers::azure::client::epic_query;
use crate::providers::azure::types::{EpicRecord, FIELD_STORY_POINTS};

impl AzureDevOpsProvider {
    /// IDs of every Epic in the iteration, in query order. An empty list is a valid answer.
    pub async fn locate_epics(&self, project: &str, iteration: &str) -> Result<Vec<u64>> {
        require(project, "project")?;
        require(iteration, "iteration")?;
        info!("Querying Epics in iteration: {iteration}");

        let ids = self
            .client
            .query_work_item_ids(project, &epic_query(iteration))
            .await?;

        info!("Query matched {} Epics", ids.len());
        Ok(ids)
    }

    /// Epic fields and relations.
    pub async fn fetch_epic(&self, project: &str, id: u64) -> Result<EpicRecord> {
        let item = self
            .client
            .fetch_work_item(project, &id.to_string(), true)
            .await?;
        let (fields, relations) = item.into_parts();

        Ok(EpicRecord::new(id, &fields, relations))
    }

    /// Sum of the story points of every forward-hierarchy child of the Epic.
    pub async fn aggregate_story_points(&self, project: &str, epic: &EpicRecord) -> Result<f64> {
        let child_ids = epic.child_ids();
        debug!("Epic {} has {} children", epic.id, child_ids.len());

        let mut results = std::pin::pin!(stream::iter(child_ids)
            .map(|child_id| async move {
                let result = self.client.fetch_work_item(project, child_id, false).await;
                (child_id, result)
            })
            .buffered(self.options.child_concurrency));

        // Returning early drops the stream, so children not yet requested never are.
        let mut total = 0.0;
        while let Some((child_id, result)) = results.next().await {
            match result {
                Ok(child) => {
                    let (fields, _) = child.into_parts();
                    total += fields.number_or_zero(FIELD_STORY_POINTS);
                }
                Err(e) => match self.options.child_failure {
                    ChildFailurePolicy::ContributeZero => {
                        warn!("Failed to fetch child {child_id} of Epic {}: {e}", epic.id);
                    }
                    ChildFailurePolicy::FailEpic => return Err(e),
                },
            }
        }

        Ok(total)
    }
}
