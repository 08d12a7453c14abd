use std::time::Duration;

use log::{debug, warn};
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use url::Url;

use crate::auth::Token;
use crate::error::{EpicLensError, Result};

pub const DEFAULT_BASE_URL: &str = "https://dev.azure.com";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_millis(500);

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub organization: String,
    pub timeout: Duration,
    /// Extra attempts for transient failures. 0 disables retrying.
    pub max_retries: u32,
    pub retry_backoff: Duration,
}

impl ClientConfig {
    pub fn new(organization: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            organization: organization.into(),
            timeout: DEFAULT_TIMEOUT,
            max_retries: 0,
            retry_backoff: DEFAULT_RETRY_BACKOFF,
        }
    }
}

pub struct AzureDevOpsClient {
    pub client: Client,
    pub organization_url: Url,
    token: Token,
    max_retries: u32,
    retry_backoff: Duration,
}

impl AzureDevOpsClient {
    pub fn new(config: &ClientConfig, token: Token) -> Result<Self> {
        if config.organization.trim().is_empty() {
            return Err(EpicLensError::Config(
                "Organization name must not be empty".to_string(),
            ));
        }

        let client = Client::builder()
            .user_agent("EpicLens/0.1.0")
            .timeout(config.timeout)
            .build()
            .map_err(|e| EpicLensError::Config(format!("Failed to create HTTP client: {e}")))?;

        let mut organization_url = Url::parse(&config.base_url)
            .map_err(|e| EpicLensError::Config(format!("Invalid base URL: {e}")))?;
        organization_url
            .path_segments_mut()
            .map_err(|()| EpicLensError::Config("Base URL cannot be a base".to_string()))?
            .pop_if_empty()
            .push(&config.organization);

        Ok(Self {
            client,
            organization_url,
            token,
            max_retries: config.max_retries,
            retry_backoff: config.retry_backoff,
        })
    }

    /// Azure DevOps expects the PAT as the password of a basic-auth pair with an empty user.
    pub fn auth_request(&self, request: RequestBuilder) -> RequestBuilder {
        request.basic_auth("", Some(self.token.as_str()))
    }

    /// Build `{organization}/{project}/{segments..}?{query}`, percent-encoding every segment.
    pub fn endpoint(
        &self,
        project: Option<&str>,
        segments: &[&str],
        query: &[(&str, &str)],
    ) -> Result<Url> {
        let mut url = self.organization_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|()| EpicLensError::Config("Invalid organization URL".to_string()))?;
            if let Some(project) = project {
                path.push(project);
            }
            path.extend(segments);
        }

        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }

        Ok(url)
    }

    /// Issue one authenticated request and parse the JSON answer.
    ///
    /// Non-success statuses become [`EpicLensError::Api`] carrying the response body.
    /// Transient failures are retried with exponential backoff when `max_retries > 0`.
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        body: Option<&Value>,
    ) -> Result<T> {
        let mut attempt = 0u32;

        loop {
            match self.execute(method.clone(), url.clone(), body).await {
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    let delay = self.retry_backoff.saturating_mul(2u32.saturating_pow(attempt));
                    attempt += 1;
                    warn!(
                        "{method} {} failed ({e}), retrying in {delay:?} (attempt {attempt}/{})",
                        url.path(),
                        self.max_retries
                    );
                    tokio::time::sleep(delay).await;
                }
                result => return result,
            }
        }
    }

    pub async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        self.request(Method::GET, url, None).await
    }

    pub async fn post_json<T, B>(&self, url: Url, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = serde_json::to_value(body)?;
        self.request(Method::POST, url, Some(&body)).await
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        body: Option<&Value>,
    ) -> Result<T> {
        debug!("{method} {url}");

        let mut request = self.client.request(method, url);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = self.auth_request(request).send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(EpicLensError::Api {
                status: status.as_u16(),
                body: text,
            });
        }

        Ok(serde_json::from_str(&text)?)
    }
}
