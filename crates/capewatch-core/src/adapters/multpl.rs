use std::sync::{Arc, OnceLock};

use regex::Regex;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::Date;

use crate::data_source::{fetch_body, SeriesFuture, SeriesSource, SourceError};
use crate::http_client::{HttpClient, HttpRequest, BROWSER_USER_AGENT, DEFAULT_TIMEOUT_MS};
use crate::{CalendarDate, Observation, ProviderId, SourceRole};

pub const DEFAULT_CAPE_URL: &str = "https://www.multpl.com/shiller-pe/table/by-month";

/// Row date format on the CAPE table, e.g. `Jan 1, 2024`.
const TABLE_DAY: &[BorrowedFormatItem<'static>] =
    format_description!("[month repr:short] [day padding:none], [year]");

/// Substituted when the CAPE page cannot be read, so the classifier always
/// has a numeric input. A single point: every record, whatever its date and
/// whichever boundary fill applies, resolves to the same neutral value.
const FALLBACK_CAPE: [(i32, u8, u8, f64); 1] = [(2024, 1, 1, 32.0)];

/// Monthly Shiller CAPE history scraped from an HTML table.
#[derive(Clone)]
pub struct MultplCapeSource {
    http_client: Arc<dyn HttpClient>,
    url: String,
    timeout_ms: u64,
}

impl MultplCapeSource {
    pub fn new(http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            http_client,
            url: String::from(DEFAULT_CAPE_URL),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }
}

impl SeriesSource for MultplCapeSource {
    type Item = Observation;

    fn id(&self) -> ProviderId {
        ProviderId::Multpl
    }

    fn role(&self) -> SourceRole {
        SourceRole::DegradedFallback
    }

    fn try_fetch<'a>(&'a self) -> SeriesFuture<'a, Result<Vec<Observation>, SourceError>> {
        Box::pin(async move {
            let request = HttpRequest::get(self.url.as_str())
                .with_header("user-agent", BROWSER_USER_AGENT)
                .with_timeout_ms(self.timeout_ms);
            let body = fetch_body(self.http_client.as_ref(), request).await?;
            parse_cape_table(&body)
        })
    }

    fn fallback(&self) -> Vec<Observation> {
        fallback_series()
    }
}

pub fn fallback_series() -> Vec<Observation> {
    FALLBACK_CAPE
        .iter()
        .filter_map(|&(year, month, day, value)| {
            let date = CalendarDate::from_ymd(year, month, day).ok()?;
            Observation::new(date, value).ok()
        })
        .collect()
}

/// Extracts `(date, value)` pairs from `table#datatable`.
///
/// The first row is the header. Rows whose date or value cell does not parse
/// are skipped. The page lists newest first, so the result is reversed into
/// ascending order. A page with no usable rows is an error, which lets the
/// caller fall back instead of classifying on nothing.
pub(crate) fn parse_cape_table(html: &str) -> Result<Vec<Observation>, SourceError> {
    let table = table_pattern()
        .captures(html)
        .and_then(|captures| captures.get(1))
        .ok_or_else(|| SourceError::parse("CAPE page has no datatable"))?
        .as_str();

    let mut observations = row_pattern()
        .captures_iter(table)
        .skip(1)
        .filter_map(|row| {
            let cells = cell_pattern()
                .captures_iter(row.get(1)?.as_str())
                .filter_map(|cell| cell.get(1).map(|m| cell_text(m.as_str())))
                .collect::<Vec<_>>();
            let date = parse_table_day(cells.first()?)?;
            let value = parse_leading_number(cells.get(1)?)?;
            Observation::new(date, value).ok()
        })
        .collect::<Vec<_>>();

    if observations.is_empty() {
        return Err(SourceError::empty("CAPE table contained no usable rows"));
    }

    observations.reverse();
    Ok(observations)
}

fn parse_table_day(text: &str) -> Option<CalendarDate> {
    Date::parse(text.trim(), TABLE_DAY)
        .ok()
        .map(CalendarDate::from_date)
}

fn parse_leading_number(text: &str) -> Option<f64> {
    number_pattern()
        .find(text)
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .filter(|value| value.is_finite())
}

/// Inner text of a cell with markup and entities removed.
fn cell_text(raw: &str) -> String {
    let without_tags = tag_pattern().replace_all(raw, " ");
    let without_entities = entity_pattern().replace_all(&without_tags, " ");
    without_entities
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn table_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"(?is)<table[^>]*\bid\s*=\s*["']datatable["'][^>]*>(.*?)</table>"#)
            .expect("table pattern is valid")
    })
}

fn row_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?is)<tr\b[^>]*>(.*?)</tr>").expect("row pattern is valid"))
}

fn cell_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"(?is)<td\b[^>]*>(.*?)</td>").expect("cell pattern is valid"))
}

fn tag_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?s)<[^>]*>").expect("tag pattern is valid"))
}

fn entity_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"&#?[A-Za-z0-9]+;").expect("entity pattern is valid"))
}

fn number_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"-?\d+(?:\.\d+)?").expect("number pattern is valid"))
}
