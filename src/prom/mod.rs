use prometheus::{core::Collector, proto::MetricFamily};
use thiserror::Error;
use tokio::sync::Mutex;

use crate::prices::{ApiError, Endpoint, PriceClient, Window};

mod metrics;

pub use metrics::PriceMetrics;

#[derive(Debug, Error)]
#[error("failed to get {endpoint}: {source}")]
pub struct CollectionError {
    pub endpoint: Endpoint,
    pub source: ApiError,
}

impl CollectionError {
    fn at(endpoint: Endpoint) -> impl FnOnce(ApiError) -> Self {
        move |source| Self { endpoint, source }
    }
}

/// Runs one fetch-join-publish cycle per scrape.
#[derive(Debug)]
pub struct Exporter {
    client: PriceClient,
    metrics: Mutex<PriceMetrics>,
}

impl Exporter {
    pub fn new(client: PriceClient) -> prometheus::Result<Self> {
        Ok(Self {
            client,
            metrics: Mutex::new(PriceMetrics::new()?),
        })
    }

    /// Never fails, the outcome is reported through `osrs_ge_up`.
    ///
    /// The lock is held for the whole cycle, overlapping scrapes queue up
    /// behind it instead of interleaving their writes.
    pub async fn collect(&self) -> Vec<MetricFamily> {
        let metrics = self.metrics.lock().await;
        metrics.reset();

        match self.scrape(&metrics).await {
            Ok(items) => {
                debug!(target: "collector", "published {} items", items);
                metrics.scrape_succeeded();
            }
            Err(err) => {
                error!(target: "collector", "collection failed: {}", err);
                metrics.scrape_failed();
            }
        }

        metrics.collect()
    }

    async fn scrape(&self, metrics: &PriceMetrics) -> Result<usize, CollectionError> {
        let mapping = self
            .client
            .mapping(&[])
            .await
            .map_err(CollectionError::at(Endpoint::Mapping))?;
        let five_minute = self
            .client
            .five_minute(&[])
            .await
            .map_err(CollectionError::at(Endpoint::Average(Window::FiveMinute)))?;
        let one_hour = self
            .client
            .one_hour(&[])
            .await
            .map_err(CollectionError::at(Endpoint::Average(Window::OneHour)))?;
        let latest = self
            .client
            .latest(&[])
            .await
            .map_err(CollectionError::at(Endpoint::Latest))?;

        for item in &mapping {
            let id = item.id.to_string();
            let labels = [
                item.name.as_str(),
                id.as_str(),
                item.members_label(),
                item.icon.as_str(),
            ];

            metrics.item(&labels, item);
            if let Some(price) = five_minute.data.get(&id) {
                metrics.average(Window::FiveMinute, &labels, price);
            }
            if let Some(price) = one_hour.data.get(&id) {
                metrics.average(Window::OneHour, &labels, price);
            }
            if let Some(price) = latest.data.get(&id) {
                metrics.latest(&labels, price);
            }
        }

        Ok(mapping.len())
    }
}
