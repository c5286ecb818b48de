use std::sync::Arc;

use serde::Deserialize;

use crate::data_source::{fetch_body, SeriesFuture, SeriesSource, SourceError};
use crate::http_client::{HttpClient, HttpRequest, BROWSER_USER_AGENT, DEFAULT_TIMEOUT_MS};
use crate::{PriceObservation, ProviderId, SourceRole};

pub const DEFAULT_YAHOO_URL: &str = "https://query1.finance.yahoo.com";

/// Weekly closes for the correlated equity. Optional: an empty result only
/// blanks `secondary_value` in the merged stream.
#[derive(Clone)]
pub struct YahooChartSource {
    http_client: Arc<dyn HttpClient>,
    base_url: String,
    symbol: String,
    range: String,
    timeout_ms: u64,
}

impl YahooChartSource {
    pub fn new(
        http_client: Arc<dyn HttpClient>,
        symbol: impl Into<String>,
        range: impl Into<String>,
    ) -> Self {
        Self {
            http_client,
            base_url: String::from(DEFAULT_YAHOO_URL),
            symbol: symbol.into(),
            range: range.into(),
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
            "{}/v8/finance/chart/{}?interval=1wk&range={}",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(&self.symbol),
            urlencoding::encode(&self.range)
        )
    }
}

impl SeriesSource for YahooChartSource {
    type Item = PriceObservation;

    fn id(&self) -> ProviderId {
        ProviderId::Yahoo
    }

    fn role(&self) -> SourceRole {
        SourceRole::Optional
    }

    fn try_fetch<'a>(&'a self) -> SeriesFuture<'a, Result<Vec<PriceObservation>, SourceError>> {
        Box::pin(async move {
            let request = HttpRequest::get(self.endpoint())
                .with_header("user-agent", BROWSER_USER_AGENT)
                .with_header("referer", "https://finance.yahoo.com/")
                .with_timeout_ms(self.timeout_ms);
            let body = fetch_body(self.http_client.as_ref(), request).await?;
            parse_chart(&body)
        })
    }
}

/// Parses a v8 chart response into weekly closes.
///
/// Timestamps arrive in epoch seconds. Weeks without a usable close (null,
/// zero, or negative) are dropped.
pub(crate) fn parse_chart(body: &str) -> Result<Vec<PriceObservation>, SourceError> {
    let response: YahooChartResponse = serde_json::from_str(body)
        .map_err(|e| SourceError::parse(format!("failed to parse yahoo chart: {e}")))?;

    if let Some(error) = response.chart.error {
        let detail = error
            .description
            .or(error.code)
            .unwrap_or_else(|| String::from("unknown error"));
        return Err(SourceError::parse(format!("yahoo chart API error: {detail}")));
    }

    let result = response
        .chart
        .result
        .unwrap_or_default()
        .into_iter()
        .next()
        .ok_or_else(|| SourceError::parse("no chart data in response"))?;

    let Some(timestamps) = result.timestamp else {
        // Symbols without trading history come back with no timestamp array.
        return Ok(Vec::new());
    };
    let closes = result
        .indicators
        .quote
        .into_iter()
        .next()
        .map(|quote| quote.close)
        .ok_or_else(|| SourceError::parse("no quote data"))?;

    let observations = timestamps
        .iter()
        .zip(closes)
        .filter_map(|(&seconds, close)| {
            let close = close.filter(|value| *value > 0.0)?;
            PriceObservation::from_epoch_millis(seconds.checked_mul(1_000)?, close).ok()
        })
        .collect();

    Ok(observations)
}

#[derive(Debug, Deserialize)]
struct YahooChartResponse {
    chart: YahooChartData,
}

#[derive(Debug, Deserialize)]
struct YahooChartData {
    result: Option<Vec<YahooChartResult>>,
    error: Option<YahooChartError>,
}

#[derive(Debug, Deserialize)]
struct YahooChartError {
    code: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct YahooChartResult {
    timestamp: Option<Vec<i64>>,
    indicators: YahooChartIndicators,
}

#[derive(Debug, Deserialize)]
struct YahooChartIndicators {
    #[serde(default)]
    quote: Vec<YahooChartQuote>,
}

#[derive(Debug, Deserialize)]
struct YahooChartQuote {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_source::SourceErrorKind;

    #[test]
    fn converts_seconds_and_drops_null_closes() {
        let body = r#"{"chart":{"result":[{
            "timestamp":[1704067200,1704672000,1705276800],
            "indicators":{"quote":[{"close":[48.17,null,54.73]}]}
        }],"error":null}}"#;

        let observations = parse_chart(body).expect("valid chart");
        assert_eq!(observations.len(), 2);
        assert_eq!(observations[0].timestamp, 1_704_067_200_000);
        assert_eq!(observations[1].date.to_string(), "2024-01-15");
        assert!((observations[1].close - 54.73).abs() < 1e-9);
    }

    #[test]
    fn api_error_is_a_failure() {
        let body = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;
        let err = parse_chart(body).expect_err("must fail");
        assert_eq!(err.kind(), SourceErrorKind::Parse);
        assert!(err.message().contains("delisted"));
    }

    #[test]
    fn html_body_is_a_failure() {
        let err = parse_chart("<html>Too Many Requests</html>").expect_err("must fail");
        assert_eq!(err.kind(), SourceErrorKind::Parse);
    }
}
