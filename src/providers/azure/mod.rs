mod client;
mod iteration_path;
mod provider;
#[cfg(test)]
mod test_support;
mod types;
mod url_utils;

pub use client::ClientConfig;
pub use provider::{AzureDevOpsProvider, ChildFailurePolicy, ReportOptions};
pub use types::EpicRecord;
