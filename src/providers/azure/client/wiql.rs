use serde::{Deserialize, Serialize};

use super::core::AzureDevOpsClient;
use crate::error::Result;

#[derive(Debug, Serialize)]
pub struct WiqlQuery {
    pub query: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WiqlResultDto {
    #[serde(default)]
    pub work_items: Option<Vec<WorkItemReferenceDto>>,
}

#[derive(Debug, Deserialize)]
pub struct WorkItemReferenceDto {
    pub id: u64,
}

/// WIQL selecting the IDs of every Epic in an iteration. Single quotes are doubled
/// so the iteration path stays inside its string literal.
pub fn epic_query(iteration: &str) -> String {
    let iteration = iteration.replace('\'', "''");
    format!(
        "Select [System.Id] From WorkItems \
         Where [System.IterationPath] = '{iteration}' \
         AND [System.WorkItemType] = 'Epic'"
    )
}

impl AzureDevOpsClient {
    /// `POST {organization}/{project}/_apis/wit/wiql`
    pub async fn query_work_item_ids(&self, project: &str, query: &str) -> Result<Vec<u64>> {
        let url = self.endpoint(
            Some(project),
            &["_apis", "wit", "wiql"],
            &[("api-version", "6.0")],
        )?;
        let body = WiqlQuery {
            query: query.to_string(),
        };
        let result: WiqlResultDto = self.post_json(url, &body).await?;

        Ok(result
            .work_items
            .unwrap_or_default()
            .into_iter()
            .map(|item| item.id)
            .collect())
    }
}
