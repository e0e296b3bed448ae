use crate::error::FetchError;
use crate::fetchers::Fetcher;
use crate::parsers::PageSource;
use async_trait::async_trait;
use reqwest::Client;
use reqwest::redirect::Policy;
use std::time::Duration;
use url::Url;

/// Plain HTTP GET via reqwest
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    timeout_secs: u64,
}

impl HttpFetcher {
    pub fn new(user_agent: &str, timeout_secs: u64) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(timeout_secs))
            .redirect(Policy::limited(10))
            .build()?;

        Ok(Self {
            client,
            timeout_secs,
        })
    }

    fn classify(&self, error: reqwest::Error) -> FetchError {
        if error.is_timeout() {
            FetchError::Timeout(self.timeout_secs)
        } else {
            FetchError::Request(error)
        }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<PageSource, FetchError> {
        ::log::debug!("GET {}", url);
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }

        let final_url = response.url().clone();
        let body = response.text().await.map_err(|e| self.classify(e))?;
        ::log::debug!("Fetched {} bytes from {}", body.len(), final_url);

        Ok(PageSource::new(final_url, body))
    }
}
