use serde::Deserialize;

use super::core::AzureDevOpsClient;
use crate::error::Result;

#[derive(Debug, Deserialize)]
pub struct ProjectListDto {
    #[serde(default)]
    pub value: Option<Vec<ProjectDto>>,
}

#[derive(Debug, Deserialize)]
pub struct ProjectDto {
    pub name: Option<String>,
}

impl AzureDevOpsClient {
    /// `GET {organization}/_apis/projects`
    pub async fn fetch_projects(&self) -> Result<Vec<ProjectDto>> {
        let url = self.endpoint(None, &["_apis", "projects"], &[("api-version", "6.0")])?;
        let projects: ProjectListDto = self.get_json(url).await?;
        Ok(projects.value.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_value_is_empty_list() {
        let dto: ProjectListDto = serde_json::from_str(r#"{"count": 0, "value": null}"#).unwrap();

        assert!(dto.value.unwrap_or_default().is_empty());
    }

    #[test]
    fn test_project_without_name() {
        let dto: ProjectListDto =
            serde_json::from_str(r#"{"value": [{"id": "1"}, {"name": "Alpha"}]}"#).unwrap();
        let names: Vec<Option<String>> = dto.value.unwrap().into_iter().map(|p| p.name).collect();

        assert_eq!(names, vec![None, Some("Alpha".to_string())]);
    }
}
