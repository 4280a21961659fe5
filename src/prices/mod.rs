use std::{fmt, time::Duration};

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use thiserror::Error;
use url::Url;

mod data;
mod fetch;

pub use data::{AveragePrice, Averages, ItemMapping, Latest, LatestPrice};
pub use fetch::{Client, FetchError};

pub const DEFAULT_BASE_URL: &str = "https://prices.runescape.wiki/api/v1/osrs";

/// Averaging window of the `5m` and `1h` endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Window {
    FiveMinute,
    OneHour,
}

impl Window {
    pub fn as_str(self) -> &'static str {
        match self {
            Window::FiveMinute => "5m",
            Window::OneHour => "1h",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Mapping,
    Average(Window),
    Latest,
}

impl Endpoint {
    pub fn path(self) -> &'static str {
        match self {
            Endpoint::Mapping => "mapping",
            Endpoint::Average(window) => window.as_str(),
            Endpoint::Latest => "latest",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Mapping => f.write_str("mapping"),
            Endpoint::Average(window) => write!(f, "{} avg", window.as_str()),
            Endpoint::Latest => f.write_str("latest"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("unexpected status {0}")]
    UnexpectedStatus(StatusCode),
    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Typed access to the four price endpoints.
#[derive(Debug, Clone)]
pub struct PriceClient {
    client: Client,
}

impl PriceClient {
    pub fn new(base: Url, timeout: Duration) -> Result<Self, FetchError> {
        Ok(Self {
            client: Client::new(base, timeout)?,
        })
    }

    pub fn base(&self) -> &Url {
        self.client.base()
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        params: &[(&str, &str)],
    ) -> Result<T, ApiError> {
        let (body, status) = self.client.get(endpoint.path(), params).await?;
        if !status.is_success() {
            return Err(ApiError::UnexpectedStatus(status));
        }
        Ok(serde_json::from_slice(&body)?)
    }

    pub async fn mapping(&self, params: &[(&str, &str)]) -> Result<Vec<ItemMapping>, ApiError> {
        self.fetch(Endpoint::Mapping, params).await
    }

    pub async fn average(
        &self,
        window: Window,
        params: &[(&str, &str)],
    ) -> Result<Averages, ApiError> {
        self.fetch(Endpoint::Average(window), params).await
    }

    pub async fn five_minute(&self, params: &[(&str, &str)]) -> Result<Averages, ApiError> {
        self.average(Window::FiveMinute, params).await
    }

    pub async fn one_hour(&self, params: &[(&str, &str)]) -> Result<Averages, ApiError> {
        self.average(Window::OneHour, params).await
    }

    pub async fn latest(&self, params: &[(&str, &str)]) -> Result<Latest, ApiError> {
        self.fetch(Endpoint::Latest, params).await
    }
}
