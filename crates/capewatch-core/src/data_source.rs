//! Source adapter contract and its error type.
//!
//! Every adapter exposes the same capability: produce an ascending series of
//! dated observations. [`SeriesSource::try_fetch`] may fail;
//! [`SeriesSource::fetch`] never does, because each adapter owns its failure
//! domain and resolves to either data or its own fallback.
//!
//! | Adapter | Item | Role | Fallback |
//! |---------|------|------|----------|
//! | `BinanceKlinesSource` | [`PriceObservation`](crate::PriceObservation) | critical | empty |
//! | `YahooChartSource` | [`PriceObservation`](crate::PriceObservation) | optional | empty |
//! | `MultplCapeSource` | [`Observation`](crate::Observation) | degraded fallback | single literal point |

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;

use crate::http_client::{HttpClient, HttpRequest};
use crate::{Dated, ProviderId, SourceRole};

/// Adapter-level error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceErrorKind {
    Transport,
    UpstreamStatus,
    Parse,
    Empty,
}

/// Structured adapter failure. Never crosses the pipeline boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError {
    kind: SourceErrorKind,
    message: String,
}

impl SourceError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Transport,
            message: message.into(),
        }
    }

    pub fn upstream_status(status: u16) -> Self {
        Self {
            kind: SourceErrorKind::UpstreamStatus,
            message: format!("upstream returned status {status}"),
        }
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Parse,
            message: message.into(),
        }
    }

    pub fn empty(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Empty,
            message: message.into(),
        }
    }

    pub const fn kind(&self) -> SourceErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            SourceErrorKind::Transport => "source.transport",
            SourceErrorKind::UpstreamStatus => "source.upstream_status",
            SourceErrorKind::Parse => "source.parse",
            SourceErrorKind::Empty => "source.empty",
        }
    }
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for SourceError {}

pub type SeriesFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Source adapter contract.
///
/// Implementations must be `Send + Sync`; the pipeline holds them behind
/// `Arc<dyn SeriesSource<Item = _>>`.
pub trait SeriesSource: Send + Sync {
    type Item: Dated + Send + 'static;

    fn id(&self) -> ProviderId;

    fn role(&self) -> SourceRole;

    /// Performs the upstream call and parses the payload.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] on transport failure, non-2xx status, or a
    /// payload that does not have the expected shape.
    fn try_fetch<'a>(&'a self) -> SeriesFuture<'a, Result<Vec<Self::Item>, SourceError>>;

    /// Series substituted when [`try_fetch`](SeriesSource::try_fetch) fails.
    fn fallback(&self) -> Vec<Self::Item> {
        Vec::new()
    }

    /// Infallible fetch: ascending series on success, fallback on failure.
    fn fetch<'a>(&'a self) -> SeriesFuture<'a, Vec<Self::Item>> {
        Box::pin(async move {
            match self.try_fetch().await {
                Ok(mut items) => {
                    items.sort_by_key(|item| item.epoch_millis());
                    tracing::debug!(source = %self.id(), count = items.len(), "series fetched");
                    items
                }
                Err(error) => {
                    let fallback = self.fallback();
                    tracing::warn!(
                        source = %self.id(),
                        role = ?self.role(),
                        code = error.code(),
                        error = %error.message(),
                        fallback_len = fallback.len(),
                        "series fetch failed; using fallback"
                    );
                    fallback
                }
            }
        })
    }
}

/// Issues a GET and returns the body of a 2xx response.
pub(crate) async fn fetch_body(
    client: &dyn HttpClient,
    request: HttpRequest,
) -> Result<String, SourceError> {
    let response = client.execute(request).await.map_err(|error| {
        if error.timed_out() {
            SourceError::transport(format!("timed out: {}", error.message()))
        } else {
            SourceError::transport(format!("transport error: {}", error.message()))
        }
    })?;

    if !response.is_success() {
        return Err(SourceError::upstream_status(response.status));
    }

    Ok(response.body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CalendarDate, Observation};

    struct ScriptedSource {
        result: Result<Vec<Observation>, SourceError>,
        fallback: Vec<Observation>,
    }

    impl SeriesSource for ScriptedSource {
        type Item = Observation;

        fn id(&self) -> ProviderId {
            ProviderId::Multpl
        }

        fn role(&self) -> SourceRole {
            SourceRole::DegradedFallback
        }

        fn try_fetch<'a>(&'a self) -> SeriesFuture<'a, Result<Vec<Observation>, SourceError>> {
            let result = self.result.clone();
            Box::pin(async move { result })
        }

        fn fallback(&self) -> Vec<Observation> {
            self.fallback.clone()
        }
    }

    fn obs(date: &str, value: f64) -> Observation {
        Observation::new(CalendarDate::parse(date).expect("valid date"), value).expect("finite")
    }

    #[tokio::test]
    async fn fetch_sorts_successful_series_ascending() {
        let source = ScriptedSource {
            result: Ok(vec![obs("2024-03-01", 35.0), obs("2024-01-01", 30.0)]),
            fallback: Vec::new(),
        };

        let series = source.fetch().await;
        assert_eq!(series, vec![obs("2024-01-01", 30.0), obs("2024-03-01", 35.0)]);
    }

    #[tokio::test]
    async fn fetch_substitutes_fallback_on_failure() {
        let source = ScriptedSource {
            result: Err(SourceError::transport("connection reset")),
            fallback: vec![obs("2024-01-01", 32.0)],
        };

        let series = source.fetch().await;
        assert_eq!(series, vec![obs("2024-01-01", 32.0)]);
    }

    struct CannedClient(Result<crate::HttpResponse, crate::HttpError>);

    impl HttpClient for CannedClient {
        fn execute<'a>(
            &'a self,
            _request: HttpRequest,
        ) -> Pin<Box<dyn Future<Output = Result<crate::HttpResponse, crate::HttpError>> + Send + 'a>>
        {
            let response = self.0.clone();
            Box::pin(async move { response })
        }
    }

    #[tokio::test]
    async fn fetch_body_classifies_transport_and_status_failures() {
        let request = || HttpRequest::get("https://upstream.test/");

        let timeout = CannedClient(Err(crate::HttpError::timeout("deadline elapsed")));
        let err = fetch_body(&timeout, request()).await.expect_err("must fail");
        assert_eq!(err.kind(), SourceErrorKind::Transport);
        assert!(err.message().starts_with("timed out"));

        let unavailable = CannedClient(Ok(crate::HttpResponse::with_status(503, "")));
        let err = fetch_body(&unavailable, request()).await.expect_err("must fail");
        assert_eq!(err.kind(), SourceErrorKind::UpstreamStatus);

        let ok = CannedClient(Ok(crate::HttpResponse::ok("[]")));
        assert_eq!(fetch_body(&ok, request()).await.expect("2xx"), "[]");
    }

    #[test]
    fn error_codes_are_stable() {
        assert_eq!(SourceError::upstream_status(503).code(), "source.upstream_status");
        assert_eq!(
            SourceError::upstream_status(503).to_string(),
            "upstream returned status 503 (source.upstream_status)"
        );
        assert_eq!(SourceError::empty("no rows").kind(), SourceErrorKind::Empty);
    }
}
