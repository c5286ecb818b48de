use std::sync::Arc;

use serde_json::Value;

use crate::data_source::{fetch_body, SeriesFuture, SeriesSource, SourceError};
use crate::http_client::{HttpClient, HttpRequest, DEFAULT_TIMEOUT_MS};
use crate::{PriceObservation, ProviderId, SourceRole};

pub const DEFAULT_BINANCE_URL: &str = "https://api.binance.com";

/// Weekly klines for the primary asset. Critical: the merged timeline is
/// built on this series.
#[derive(Clone)]
pub struct BinanceKlinesSource {
    http_client: Arc<dyn HttpClient>,
    base_url: String,
    symbol: String,
    limit: usize,
    timeout_ms: u64,
}

impl BinanceKlinesSource {
    pub fn new(http_client: Arc<dyn HttpClient>, symbol: impl Into<String>, limit: usize) -> Self {
        Self {
            http_client,
            base_url: String::from(DEFAULT_BINANCE_URL),
            symbol: symbol.into(),
            limit,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/api/v3/klines?symbol={}&interval=1w&limit={}",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(&self.symbol),
            self.limit
        )
    }
}

impl SeriesSource for BinanceKlinesSource {
    type Item = PriceObservation;

    fn id(&self) -> ProviderId {
        ProviderId::Binance
    }

    fn role(&self) -> SourceRole {
        SourceRole::Critical
    }

    fn try_fetch<'a>(&'a self) -> SeriesFuture<'a, Result<Vec<PriceObservation>, SourceError>> {
        Box::pin(async move {
            let request = HttpRequest::get(self.endpoint()).with_timeout_ms(self.timeout_ms);
            let body = fetch_body(self.http_client.as_ref(), request).await?;
            parse_klines(&body)
        })
    }
}

/// Parses the klines array-of-arrays payload:
/// `[[openTime, open, high, low, close, volume, closeTime, ...], ...]`.
///
/// Only the open time (index 0) and close (index 4) are kept. Rows whose
/// close is missing or not a finite number are skipped.
pub(crate) fn parse_klines(body: &str) -> Result<Vec<PriceObservation>, SourceError> {
    let payload: Value = serde_json::from_str(body)
        .map_err(|e| SourceError::parse(format!("failed to parse binance klines: {e}")))?;

    // Error payloads come back as an object: {"code": -1121, "msg": "Invalid symbol."}
    let rows = payload.as_array().ok_or_else(|| {
        let detail = payload
            .get("msg")
            .and_then(Value::as_str)
            .unwrap_or("expected a JSON array");
        SourceError::parse(format!("unexpected binance payload: {detail}"))
    })?;

    let observations = rows
        .iter()
        .filter_map(|row| {
            let row = row.as_array()?;
            let open_time = row.first()?.as_i64()?;
            let close = number_or_decimal_string(row.get(4)?)?;
            PriceObservation::from_epoch_millis(open_time, close).ok()
        })
        .collect::<Vec<_>>();

    Ok(observations)
}

fn number_or_decimal_string(value: &Value) -> Option<f64> {
    match value {
        Value::String(raw) => raw.trim().parse::<f64>().ok(),
        Value::Number(number) => number.as_f64(),
        _ => None,
    }
}
