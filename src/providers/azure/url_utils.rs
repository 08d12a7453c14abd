pub fn child_id_from_url(url: &str) -> Option<&str> {
    // Relation targets look like https://dev.azure.com/org/_apis/wit/workItems/202
    url.rsplit('/').next().filter(|id| !id.is_empty())
}
