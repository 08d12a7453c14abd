use indexmap::IndexSet;

/// Azure DevOps separates iteration path segments with a backslash.
pub const SEPARATOR: &str = "\\";

/// Segments kept when grouping iterations under their parent, e.g. `Project\Q1`.
pub const DEFAULT_DEPTH: usize = 2;

/// Collapse a path to at most its first `depth` segments.
/// Paths without a separator are returned unchanged.
pub fn collapse(path: &str, depth: usize) -> String {
    if !path.contains(SEPARATOR) {
        return path.to_string();
    }

    path.split(SEPARATOR)
        .take(depth.max(1))
        .collect::<Vec<_>>()
        .join(SEPARATOR)
}

/// Collapse every path and keep only the first occurrence of each result,
/// in the order the source listed them.
pub fn collapse_unique<'a, I>(paths: I, depth: usize) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    paths
        .into_iter()
        .map(|path| collapse(path, depth))
        .collect::<IndexSet<_>>()
        .into_iter()
        .collect()
}
