use prometheus::{
    core::{Collector, Desc},
    proto::MetricFamily,
    GaugeVec, IntCounter, IntGauge, Opts,
};

use crate::prices::{AveragePrice, ItemMapping, LatestPrice, Window};

pub const NAMESPACE: &str = "osrs";
pub const SUBSYSTEM: &str = "ge";
pub const LABEL_NAMES: [&str; 4] = ["name", "id", "members", "icon"];

fn opts(name: &str, help: &str) -> Opts {
    Opts::new(name, help)
        .namespace(NAMESPACE)
        .subsystem(SUBSYSTEM)
}

fn item_gauge(name: &str, help: &str) -> prometheus::Result<GaugeVec> {
    GaugeVec::new(opts(name, help), &LABEL_NAMES)
}

fn set_present(gauge: &GaugeVec, labels: &[&str], value: Option<i64>) {
    if let Some(value) = value {
        gauge.with_label_values(labels).set(value as f64);
    }
}

#[derive(Debug)]
struct AverageGauges {
    high: GaugeVec,
    low: GaugeVec,
    high_volume: GaugeVec,
    low_volume: GaugeVec,
}

impl AverageGauges {
    fn new(window: Window) -> prometheus::Result<Self> {
        let suffix = window.as_str();
        Ok(Self {
            high: item_gauge(
                &format!("item_high_{}", suffix),
                &format!("High value of an item ({} avg).", suffix),
            )?,
            low: item_gauge(
                &format!("item_low_{}", suffix),
                &format!("Low value of an item ({} avg).", suffix),
            )?,
            high_volume: item_gauge(
                &format!("item_high_volume_{}", suffix),
                &format!("Traded volume of an item at the high price ({}).", suffix),
            )?,
            low_volume: item_gauge(
                &format!("item_low_volume_{}", suffix),
                &format!("Traded volume of an item at the low price ({}).", suffix),
            )?,
        })
    }

    fn set(&self, labels: &[&str], price: &AveragePrice) {
        set_present(&self.high, labels, price.avg_high_price);
        set_present(&self.low, labels, price.avg_low_price);
        set_present(&self.high_volume, labels, price.high_price_volume);
        set_present(&self.low_volume, labels, price.low_price_volume);
    }

    fn gauges(&self) -> [&GaugeVec; 4] {
        [&self.high, &self.low, &self.high_volume, &self.low_volume]
    }
}

/// Every series published by the exporter.
#[derive(Debug)]
pub struct PriceMetrics {
    value: GaugeVec,
    high_alch: GaugeVec,
    low_alch: GaugeVec,
    limit: GaugeVec,
    five_minute: AverageGauges,
    one_hour: AverageGauges,
    high_latest: GaugeVec,
    high_latest_time: GaugeVec,
    low_latest: GaugeVec,
    low_latest_time: GaugeVec,

    up: IntGauge,
    total_scrapes: IntCounter,
    query_failures: IntCounter,
}

impl PriceMetrics {
    pub fn new() -> prometheus::Result<Self> {
        Ok(Self {
            value: item_gauge("item_value", "Current value of an item.")?,
            high_alch: item_gauge("item_high_alch", "High alch value of an item.")?,
            low_alch: item_gauge("item_low_alch", "Low alch value of an item.")?,
            limit: item_gauge("item_limit", "Buy limit for an item.")?,
            five_minute: AverageGauges::new(Window::FiveMinute)?,
            one_hour: AverageGauges::new(Window::OneHour)?,
            high_latest: item_gauge("item_high_latest", "High value of an item (latest).")?,
            high_latest_time: item_gauge(
                "item_high_latest_time",
                "Unix timestamp of the latest high price transaction.",
            )?,
            low_latest: item_gauge("item_low_latest", "Low value of an item (latest).")?,
            low_latest_time: item_gauge(
                "item_low_latest_time",
                "Unix timestamp of the latest low price transaction.",
            )?,
            up: IntGauge::with_opts(opts("up", "Was the last scrape successful."))?,
            total_scrapes: IntCounter::with_opts(opts(
                "exporter_scrapes_total",
                "Number of scrapes.",
            ))?,
            query_failures: IntCounter::with_opts(opts(
                "exporter_query_failures_total",
                "Number of failed scrapes.",
            ))?,
        })
    }

    fn item_gauges(&self) -> Vec<&GaugeVec> {
        let mut gauges = vec![&self.value, &self.high_alch, &self.low_alch, &self.limit];
        gauges.extend_from_slice(&self.five_minute.gauges());
        gauges.extend_from_slice(&self.one_hour.gauges());
        gauges.extend_from_slice(&[
            &self.high_latest,
            &self.high_latest_time,
            &self.low_latest,
            &self.low_latest_time,
        ]);
        gauges
    }

    /// Drops every per-item series so delisted items do not linger.
    pub fn reset(&self) {
        for gauge in self.item_gauges() {
            gauge.reset();
        }
    }

    pub fn item(&self, labels: &[&str], item: &ItemMapping) {
        self.value
            .with_label_values(labels)
            .set(item.value as f64);
        set_present(&self.high_alch, labels, item.highalch);
        set_present(&self.low_alch, labels, item.lowalch);
        set_present(&self.limit, labels, item.limit);
    }

    pub fn average(&self, window: Window, labels: &[&str], price: &AveragePrice) {
        match window {
            Window::FiveMinute => self.five_minute.set(labels, price),
            Window::OneHour => self.one_hour.set(labels, price),
        }
    }

    pub fn latest(&self, labels: &[&str], price: &LatestPrice) {
        set_present(&self.high_latest, labels, price.high);
        set_present(&self.high_latest_time, labels, price.high_time);
        set_present(&self.low_latest, labels, price.low);
        set_present(&self.low_latest_time, labels, price.low_time);
    }

    pub fn scrape_succeeded(&self) {
        self.up.set(1);
        self.total_scrapes.inc();
    }

    pub fn scrape_failed(&self) {
        self.up.set(0);
        self.query_failures.inc();
        self.total_scrapes.inc();
    }
}

impl Collector for PriceMetrics {
    fn desc(&self) -> Vec<&Desc> {
        let mut descs: Vec<&Desc> = self
            .item_gauges()
            .into_iter()
            .flat_map(|gauge| gauge.desc())
            .collect();
        descs.extend(self.up.desc());
        descs.extend(self.total_scrapes.desc());
        descs.extend(self.query_failures.desc());
        descs
    }

    fn collect(&self) -> Vec<MetricFamily> {
        let mut families: Vec<MetricFamily> = self
            .item_gauges()
            .into_iter()
            .flat_map(|gauge| gauge.collect())
            .collect();
        families.extend(self.up.collect());
        families.extend(self.total_scrapes.collect());
        families.extend(self.query_failures.collect());
        families
    }
}
