use crate::error::{EpicLensError, Result};

/// Personal access token presented to Azure DevOps as the basic-auth password.
pub struct Token(String);

impl Token {
    /// Validate a credential. Empty or whitespace-only values are a configuration error,
    /// raised before any client is built.
    pub fn new(value: &str) -> Result<Self> {
        if value.trim().is_empty() {
            return Err(EpicLensError::Config(
                "Personal Access Token (PAT) is missing. Please set the environment variable AZURE_DEVOPS_PAT."
                    .to_string(),
            ));
        }

        Ok(Self(value.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<Option<&str>> for Token {
    type Error = EpicLensError;

    fn try_from(value: Option<&str>) -> Result<Self> {
        Self::new(value.unwrap_or_default())
    }
}

impl std::fmt::Debug for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<redacted>")
    }
}
