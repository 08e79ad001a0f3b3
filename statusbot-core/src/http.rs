//! HTTP client abstraction for the game-server status reads.
//!
//! The trait exists so the FiveM fetcher can be exercised in tests without a
//! live server. The default implementation wraps reqwest with the fixed
//! per-request timeout the status endpoints are bounded by.

use std::time::Duration;

use async_trait::async_trait;

use crate::Error;

/// Timeout applied to each status-endpoint request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// A generic trait for making HTTP GET requests.
#[cfg_attr(test, mockall::automock(type Error = Error;))]
#[async_trait]
pub trait HttpClient: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    async fn get(&self, url: String) -> Result<String, Self::Error>;
}

#[derive(Clone)]
pub struct DefaultHttpClient {
    client: reqwest::Client,
}

impl DefaultHttpClient {
    pub fn new() -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpClient for DefaultHttpClient {
    type Error = Error;

    async fn get(&self, url: String) -> Result<String, Self::Error> {
        let response = self.client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(response)
    }
}
