//! Core contracts for capewatch.
//!
//! This crate contains:
//! - Canonical domain models and validation
//! - HTTP transport seam and the three source adapters
//! - Series merge engine and valuation classifier
//! - Pipeline orchestrator and configuration
//! - Purchase ledger with pluggable storage

pub mod adapters;
pub mod config;
pub mod data_source;
pub mod domain;
pub mod error;
pub mod http_client;
pub mod ledger;
pub mod merge;
pub mod pipeline;
pub mod signal;
pub mod source;

pub use adapters::{BinanceKlinesSource, MultplCapeSource, YahooChartSource};
pub use config::{LedgerConfig, PipelineConfig};
pub use data_source::{SeriesFuture, SeriesSource, SourceError, SourceErrorKind};
pub use domain::{CalendarDate, Dated, MergedRecord, Observation, PriceObservation};
pub use error::{PipelineError, ValidationError};
pub use http_client::{HttpClient, HttpError, HttpRequest, HttpResponse, ReqwestHttpClient};
pub use ledger::{
    FileStore, Ledger, LedgerError, LedgerStore, MemoryStore, PortfolioEntry, PortfolioSummary,
    StoreError, validate_amount, DEFAULT_LEDGER_KEY,
};
pub use merge::{merge, merge_with, BoundaryFill, MATCH_TOLERANCE_MS, METRIC_UNSET};
pub use pipeline::{MarketSnapshot, MetricSource, Pipeline, PriceSource};
pub use signal::{classify, Signal, BUY_BELOW, SELL_ABOVE};
pub use source::{ProviderId, SourceRole};
