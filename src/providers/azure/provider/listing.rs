use log::{info, warn};

use super::core::{require, AzureDevOpsProvider};
use crate::error::Result;
use crate::providers::azure::iteration_path;

impl AzureDevOpsProvider {
    /// Project names visible to the credential, sorted ascending.
    pub async fn list_projects(&self) -> Result<Vec<String>> {
        info!("Fetching projects for organization: {}", self.organization);

        let mut projects: Vec<String> = self
            .client
            .fetch_projects()
            .await?
            .into_iter()
            .filter_map(|p| p.name)
            .collect();
        projects.sort();

        info!("Found {} projects", projects.len());
        Ok(projects)
    }

    /// Iteration paths of a project, collapsed to their parent grouping and
    /// deduplicated in first-seen order.
    pub async fn list_iterations(&self, project: &str) -> Result<Vec<String>> {
        require(project, "project")?;
        info!("Fetching iterations for project: {project}");

        let iterations = self.client.fetch_iterations(project).await?;
        let paths: Vec<String> = iterations.into_iter().filter_map(|i| i.path).collect();
        if paths.is_empty() {
            warn!("No iterations found for project: {project}");
        }

        let collapsed = iteration_path::collapse_unique(
            paths.iter().map(String::as_str),
            self.options.iteration_depth,
        );

        info!(
            "Collapsed {} iterations into {} groups",
            paths.len(),
            collapsed.len()
        );
        Ok(collapsed)
    }
}
