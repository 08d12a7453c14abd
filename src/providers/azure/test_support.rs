use mockito::{Matcher, Mock, Server};
use serde_json::{json, Value};

use super::client::{AzureDevOpsClient, ClientConfig};
use super::provider::{AzureDevOpsProvider, ReportOptions};
use crate::auth::Token;

pub const TOKEN: &str = "test-pat";
/// `Basic base64(":test-pat")`
pub const AUTH_HEADER: &str = "Basic OnRlc3QtcGF0";

pub fn config_for(server: &Server) -> ClientConfig {
    let mut config = ClientConfig::new("org");
    config.base_url = server.url();
    config
}

pub fn client_with(config: &ClientConfig) -> AzureDevOpsClient {
    AzureDevOpsClient::new(config, Token::new(TOKEN).unwrap()).unwrap()
}

pub fn provider_for(server: &Server, options: ReportOptions) -> AzureDevOpsProvider {
    AzureDevOpsProvider::new(&config_for(server), Token::new(TOKEN).unwrap(), options).unwrap()
}

fn api_version(version: &str) -> Matcher {
    Matcher::UrlEncoded("api-version".into(), version.into())
}

pub fn child_url(id: u64) -> String {
    format!("https://dev.azure.com/org/_apis/wit/workItems/{id}")
}

pub async fn mock_projects(server: &mut Server, names: &[&str]) -> Mock {
    let value: Vec<Value> = names.iter().map(|name| json!({ "name": name })).collect();
    server
        .mock("GET", "/org/_apis/projects")
        .match_query(api_version("6.0"))
        .match_header("authorization", AUTH_HEADER)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({ "count": names.len(), "value": value }).to_string())
        .create_async()
        .await
}

pub async fn mock_iterations(server: &mut Server, project: &str, paths: &[&str]) -> Mock {
    let value: Vec<Value> = paths.iter().map(|path| json!({ "path": path })).collect();
    server
        .mock(
            "GET",
            format!("/org/{project}/_apis/work/teamsettings/iterations").as_str(),
        )
        .match_query(api_version("7.1"))
        .match_header("authorization", AUTH_HEADER)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({ "count": paths.len(), "value": value }).to_string())
        .create_async()
        .await
}

pub async fn mock_wiql(server: &mut Server, project: &str, ids: &[u64]) -> Mock {
    let work_items: Vec<Value> = ids
        .iter()
        .map(|id| json!({ "id": id, "url": child_url(*id) }))
        .collect();
    server
        .mock("POST", format!("/org/{project}/_apis/wit/wiql").as_str())
        .match_query(api_version("6.0"))
        .match_header("authorization", AUTH_HEADER)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({ "queryType": "flat", "workItems": work_items }).to_string())
        .create_async()
        .await
}

/// Epic detail request (`$expand=relations`) answering with the given fields and children.
pub async fn mock_epic(
    server: &mut Server,
    project: &str,
    id: u64,
    fields: Value,
    children: &[u64],
) -> Mock {
    let relations: Vec<Value> = children
        .iter()
        .map(|child| {
            json!({
                "rel": "System.LinkTypes.Hierarchy-Forward",
                "url": child_url(*child),
                "attributes": { "isLocked": false }
            })
        })
        .collect();
    server
        .mock(
            "GET",
            format!("/org/{project}/_apis/wit/workitems/{id}").as_str(),
        )
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("$expand".into(), "relations".into()),
            api_version("6.0"),
        ]))
        .match_header("authorization", AUTH_HEADER)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({ "id": id, "fields": fields, "relations": relations }).to_string())
        .create_async()
        .await
}

/// Child request without relations. `None` leaves the story-points field out.
pub async fn mock_child(server: &mut Server, project: &str, id: u64, points: Option<f64>) -> Mock {
    let fields = match points {
        Some(points) => json!({ "Microsoft.VSTS.Scheduling.StoryPoints": points }),
        None => json!({ "System.Title": "No estimate" }),
    };
    server
        .mock(
            "GET",
            format!("/org/{project}/_apis/wit/workitems/{id}").as_str(),
        )
        .match_query(api_version("6.0"))
        .match_header("authorization", AUTH_HEADER)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({ "id": id, "fields": fields }).to_string())
        .create_async()
        .await
}

pub async fn mock_failure(server: &mut Server, method: &str, path: &str, status: usize) -> Mock {
    server
        .mock(method, path)
        .match_query(Matcher::Any)
        .with_status(status)
        .with_body(r#"{"message": "boom"}"#)
        .create_async()
        .await
}
