//! Pipeline orchestrator.
//!
//! Fans out to the three adapters concurrently, waits for all of them, then
//! merges onto the primary timeline. Adapter faults have already been turned
//! into fallbacks by [`SeriesSource::fetch`]; the only failure left is an
//! empty primary series.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::adapters::{BinanceKlinesSource, MultplCapeSource, YahooChartSource};
use crate::config::PipelineConfig;
use crate::data_source::SeriesSource;
use crate::http_client::{HttpClient, ReqwestHttpClient};
use crate::merge::{merge_with, BoundaryFill};
use crate::signal::{classify, Signal};
use crate::{MergedRecord, Observation, PipelineError, PriceObservation};

pub type PriceSource = Arc<dyn SeriesSource<Item = PriceObservation>>;
pub type MetricSource = Arc<dyn SeriesSource<Item = Observation>>;

/// Result of one pipeline invocation, in dashboard payload shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub history: Vec<MergedRecord>,
    #[serde(rename = "currentPrice")]
    pub current_price: f64,
    #[serde(rename = "latestCape")]
    pub latest_metric: f64,
}

impl MarketSnapshot {
    pub fn signal(&self) -> Signal {
        classify(self.latest_metric)
    }
}

/// Stateless orchestrator; every [`run`](Pipeline::run) re-fetches all
/// sources.
#[derive(Clone)]
pub struct Pipeline {
    primary: PriceSource,
    secondary: PriceSource,
    metric: MetricSource,
    boundary_fill: BoundaryFill,
}

impl Pipeline {
    pub fn new(primary: PriceSource, secondary: PriceSource, metric: MetricSource) -> Self {
        Self {
            primary,
            secondary,
            metric,
            boundary_fill: BoundaryFill::default(),
        }
    }

    /// Real adapters over one shared reqwest client.
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::with_http_client(config, Arc::new(ReqwestHttpClient::default()))
    }

    pub fn with_http_client(config: &PipelineConfig, http_client: Arc<dyn HttpClient>) -> Self {
        let primary = BinanceKlinesSource::new(
            Arc::clone(&http_client),
            config.primary_symbol.as_str(),
            config.primary_limit,
        )
        .with_base_url(config.binance_url.as_str())
        .with_timeout_ms(config.timeout_ms);

        let secondary = YahooChartSource::new(
            Arc::clone(&http_client),
            config.secondary_symbol.as_str(),
            config.secondary_range.as_str(),
        )
        .with_base_url(config.yahoo_url.as_str())
        .with_timeout_ms(config.timeout_ms);

        let metric = MultplCapeSource::new(http_client)
            .with_url(config.cape_url.as_str())
            .with_timeout_ms(config.timeout_ms);

        Self::new(Arc::new(primary), Arc::new(secondary), Arc::new(metric))
    }

    pub fn with_boundary_fill(mut self, boundary_fill: BoundaryFill) -> Self {
        self.boundary_fill = boundary_fill;
        self
    }

    /// # Errors
    ///
    /// Returns [`PipelineError::NoMarketData`] when the primary source yields
    /// nothing, even after its fallback.
    pub async fn run(&self) -> Result<MarketSnapshot, PipelineError> {
        let (primary, secondary, metric) = tokio::join!(
            self.primary.fetch(),
            self.secondary.fetch(),
            self.metric.fetch()
        );

        if primary.is_empty() {
            tracing::error!(
                source = %self.primary.id(),
                "primary series is empty; no timeline to merge onto"
            );
            return Err(PipelineError::NoMarketData);
        }

        let history = merge_with(&primary, &secondary, &metric, self.boundary_fill);
        let current_price = history.last().map_or(0.0, |record| record.primary_value);
        let latest_metric = metric.last().map_or(0.0, |observation| observation.value);

        tracing::info!(
            records = history.len(),
            secondary_len = secondary.len(),
            metric_len = metric.len(),
            current_price,
            latest_metric,
            "pipeline merged"
        );

        Ok(MarketSnapshot {
            history,
            current_price,
            latest_metric,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_source::{SeriesFuture, SourceError};
    use crate::{CalendarDate, ProviderId, SourceRole};

    struct FixedPrices(Vec<PriceObservation>);

    impl SeriesSource for FixedPrices {
        type Item = PriceObservation;

        fn id(&self) -> ProviderId {
            ProviderId::Binance
        }

        fn role(&self) -> SourceRole {
            SourceRole::Critical
        }

        fn try_fetch<'a>(
            &'a self,
        ) -> SeriesFuture<'a, Result<Vec<PriceObservation>, SourceError>> {
            let items = self.0.clone();
            Box::pin(async move { Ok(items) })
        }
    }

    struct FixedMetric(Vec<Observation>);

    impl SeriesSource for FixedMetric {
        type Item = Observation;

        fn id(&self) -> ProviderId {
            ProviderId::Multpl
        }

        fn role(&self) -> SourceRole {
            SourceRole::DegradedFallback
        }

        fn try_fetch<'a>(&'a self) -> SeriesFuture<'a, Result<Vec<Observation>, SourceError>> {
            let items = self.0.clone();
            Box::pin(async move { Ok(items) })
        }
    }

    fn price(date: &str, close: f64) -> PriceObservation {
        let millis = CalendarDate::parse(date).expect("valid").epoch_millis();
        PriceObservation::from_epoch_millis(millis, close).expect("valid")
    }

    fn metric(date: &str, value: f64) -> Observation {
        Observation::new(CalendarDate::parse(date).expect("valid"), value).expect("finite")
    }

    #[tokio::test]
    async fn empty_primary_is_a_hard_failure() {
        let pipeline = Pipeline::new(
            Arc::new(FixedPrices(Vec::new())),
            Arc::new(FixedPrices(vec![price("2024-01-01", 480.0)])),
            Arc::new(FixedMetric(vec![metric("2024-01-01", 32.0)])),
        );

        assert_eq!(pipeline.run().await, Err(PipelineError::NoMarketData));
    }

    #[tokio::test]
    async fn snapshot_reports_last_price_and_last_metric() {
        let pipeline = Pipeline::new(
            Arc::new(FixedPrices(vec![
                price("2024-01-01", 42_000.0),
                price("2024-01-08", 46_500.0),
            ])),
            Arc::new(FixedPrices(Vec::new())),
            Arc::new(FixedMetric(vec![
                metric("2023-12-01", 31.0),
                metric("2024-01-01", 32.5),
            ])),
        );

        let snapshot = pipeline.run().await.expect("primary present");
        assert_eq!(snapshot.history.len(), 2);
        assert_eq!(snapshot.current_price, 46_500.0);
        assert_eq!(snapshot.latest_metric, 32.5);
        assert_eq!(snapshot.signal(), Signal::Hold);
        assert!(snapshot.history.iter().all(|r| r.secondary_value.is_none()));
    }

    #[test]
    fn snapshot_serializes_with_payload_keys() {
        let snapshot = MarketSnapshot {
            history: Vec::new(),
            current_price: 64_000.0,
            latest_metric: 33.1,
        };
        let json = serde_json::to_value(&snapshot).expect("serializable");
        assert_eq!(
            json,
            serde_json::json!({"history": [], "currentPrice": 64000.0, "latestCape": 33.1})
        );
    }
}
