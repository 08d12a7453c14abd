use crate::auth::Token;
use crate::error::{EpicLensError, Result};
use crate::providers::azure::client::{AzureDevOpsClient, ClientConfig};
use crate::providers::azure::iteration_path;

/// What to do when one child of an Epic cannot be fetched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ChildFailurePolicy {
    /// Log the failure, count the child as 0 story points and keep going.
    #[default]
    ContributeZero,
    /// Fail the whole Epic; it is reported as a failed Epic instead of a row.
    FailEpic,
}

#[derive(Debug, Clone)]
pub struct ReportOptions {
    /// Epics processed at once. 1 keeps the fetches strictly sequential.
    pub concurrency: usize,
    /// Children fetched at once for a single Epic.
    pub child_concurrency: usize,
    pub child_failure: ChildFailurePolicy,
    /// Segments kept when collapsing iteration paths.
    pub iteration_depth: usize,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            concurrency: 1,
            child_concurrency: 1,
            child_failure: ChildFailurePolicy::default(),
            iteration_depth: iteration_path::DEFAULT_DEPTH,
        }
    }
}

impl ReportOptions {
    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 || self.child_concurrency == 0 {
            return Err(EpicLensError::Config(
                "Concurrency must be at least 1".to_string(),
            ));
        }
        if self.iteration_depth == 0 {
            return Err(EpicLensError::Config(
                "Iteration depth must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

pub struct AzureDevOpsProvider {
    pub client: AzureDevOpsClient,
    pub organization: String,
    pub options: ReportOptions,
}

impl AzureDevOpsProvider {
    pub fn new(config: &ClientConfig, token: Token, options: ReportOptions) -> Result<Self> {
        options.validate()?;
        let client = AzureDevOpsClient::new(config, token)?;

        Ok(Self {
            client,
            organization: config.organization.clone(),
            options,
        })
    }
}

pub(super) fn require(value: &str, what: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(EpicLensError::Validation(format!("Please select a {what}.")));
    }
    Ok(())
}
