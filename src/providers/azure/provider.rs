mod core;
mod epics;
mod listing;
mod report;

pub use self::core::{AzureDevOpsProvider, ChildFailurePolicy, ReportOptions};
