use serde::Deserialize;

use super::core::AzureDevOpsClient;
use crate::error::Result;
use crate::providers::azure::types::{Relation, WorkItemFields};

#[derive(Debug, Deserialize)]
pub struct WorkItemDto {
    #[serde(default)]
    pub fields: Option<WorkItemFields>,
    #[serde(default)]
    pub relations: Option<Vec<RelationDto>>,
}

#[derive(Debug, Deserialize)]
pub struct RelationDto {
    #[serde(default)]
    pub rel: Option<String>,
    pub url: Option<String>,
}

impl From<RelationDto> for Relation {
    fn from(dto: RelationDto) -> Self {
        Self {
            rel: dto.rel.unwrap_or_default(),
            url: dto.url,
        }
    }
}

impl WorkItemDto {
    pub fn into_parts(self) -> (WorkItemFields, Vec<Relation>) {
        let relations = self
            .relations
            .unwrap_or_default()
            .into_iter()
            .map(Relation::from)
            .collect();
        (self.fields.unwrap_or_default(), relations)
    }
}

impl AzureDevOpsClient {
    /// `GET {organization}/{project}/_apis/wit/workitems/{id}`, optionally with
    /// `$expand=relations`.
    pub async fn fetch_work_item(
        &self,
        project: &str,
        id: &str,
        with_relations: bool,
    ) -> Result<WorkItemDto> {
        let query: &[(&str, &str)] = if with_relations {
            &[("$expand", "relations"), ("api-version", "6.0")]
        } else {
            &[("api-version", "6.0")]
        };
        let url = self.endpoint(Some(project), &["_apis", "wit", "workitems", id], query)?;

        self.get_json(url).await
    }
}
