use serde::Deserialize;

use super::core::AzureDevOpsClient;
use crate::error::Result;

#[derive(Debug, Deserialize)]
pub struct IterationListDto {
    #[serde(default)]
    pub value: Option<Vec<IterationDto>>,
}

#[derive(Debug, Deserialize)]
pub struct IterationDto {
    pub path: Option<String>,
}

impl AzureDevOpsClient {
    /// `GET {organization}/{project}/_apis/work/teamsettings/iterations`
    pub async fn fetch_iterations(&self, project: &str) -> Result<Vec<IterationDto>> {
        let url = self.endpoint(
            Some(project),
            &["_apis", "work", "teamsettings", "iterations"],
            &[("api-version", "7.1")],
        )?;
        let iterations: IterationListDto = self.get_json(url).await?;
        Ok(iterations.value.unwrap_or_default())
    }
}
