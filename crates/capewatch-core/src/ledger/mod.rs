//! # Purchase Ledger
//!
//! User-maintained dollar-cost-averaging records with ROI accounting.
//!
//! The whole collection is loaded once when the ledger opens and written back
//! as one JSON array after every successful mutation. Validation runs before
//! anything is touched, so a rejected `add` leaves both memory and storage
//! unchanged.

mod store;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::OffsetDateTime;

use crate::pipeline::MarketSnapshot;
use crate::{CalendarDate, ValidationError};

pub use store::{FileStore, LedgerStore, MemoryStore, StoreError};

/// Storage key the browser dashboard used; kept so exported data loads as is.
pub const DEFAULT_LEDGER_KEY: &str = "btc_dca_records";

/// One recorded purchase.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioEntry {
    pub id: u64,
    pub date: CalendarDate,
    #[serde(alias = "usdtAmount")]
    pub amount_invested: f64,
    #[serde(alias = "btcPriceAtBuy")]
    pub price_at_purchase: f64,
    #[serde(alias = "btcAmount")]
    pub quantity_acquired: f64,
}

/// Aggregates over every entry at a given price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSummary {
    pub entry_count: usize,
    pub total_invested: f64,
    pub total_quantity: f64,
    pub current_value: f64,
    pub roi_percent: f64,
}

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("no usable price for {date}; market history is unavailable")]
    PriceUnavailable { date: CalendarDate },

    #[error("stored ledger '{key}' is not a valid entry list: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize ledger: {0}")]
    Serialization(#[source] serde_json::Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub struct Ledger<S: LedgerStore> {
    store: S,
    key: String,
    entries: Vec<PortfolioEntry>,
}

impl<S: LedgerStore> Ledger<S> {
    /// Loads the collection stored under `key`. A missing value is an empty
    /// ledger.
    ///
    /// # Errors
    ///
    /// [`LedgerError::Corrupt`] when the stored value is not an entry array;
    /// [`LedgerError::Store`] when the store cannot be read.
    pub fn open(store: S, key: impl Into<String>) -> Result<Self, LedgerError> {
        let key = key.into();
        let entries = match store.get(&key)? {
            Some(raw) if !raw.trim().is_empty() => serde_json::from_str::<Vec<PortfolioEntry>>(&raw)
                .map_err(|source| LedgerError::Corrupt {
                    key: key.clone(),
                    source,
                })?,
            _ => Vec::new(),
        };

        tracing::debug!(key = %key, entries = entries.len(), "ledger opened");
        Ok(Self {
            store,
            key,
            entries,
        })
    }

    /// Stored order (insertion order).
    pub fn entries(&self) -> &[PortfolioEntry] {
        &self.entries
    }

    pub fn entries_newest_first(&self) -> Vec<PortfolioEntry> {
        self.entries.iter().rev().copied().collect()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Records a purchase of `amount` on `date`, priced from the snapshot
    /// record nearest to that date.
    ///
    /// # Errors
    ///
    /// Validation errors for a malformed date or a non-positive amount,
    /// [`LedgerError::PriceUnavailable`] when no positive price resolves, and
    /// store errors from persisting. No error path mutates the ledger.
    pub fn add(
        &mut self,
        date: &str,
        amount: f64,
        snapshot: &MarketSnapshot,
    ) -> Result<PortfolioEntry, LedgerError> {
        let date = CalendarDate::parse(date)?;
        let amount = validate_amount(amount)?;

        let price = price_near(snapshot, date);
        if !(price.is_finite() && price > 0.0) {
            return Err(LedgerError::PriceUnavailable { date });
        }

        let entry = PortfolioEntry {
            id: self.next_id(),
            date,
            amount_invested: amount,
            price_at_purchase: price,
            quantity_acquired: amount / price,
        };

        let mut next = self.entries.clone();
        next.push(entry);
        self.persist(&next)?;
        self.entries = next;

        tracing::info!(id = entry.id, date = %entry.date, amount, price, "ledger entry added");
        Ok(entry)
    }

    /// Removes the entry with `id`. Returns `false` (and writes nothing) when
    /// no such entry exists.
    pub fn delete(&mut self, id: u64) -> Result<bool, LedgerError> {
        let Some(position) = self.entries.iter().position(|entry| entry.id == id) else {
            return Ok(false);
        };

        let mut next = self.entries.clone();
        next.remove(position);
        self.persist(&next)?;
        self.entries = next;

        tracing::info!(id, "ledger entry deleted");
        Ok(true)
    }

    pub fn summary(&self, latest_price: f64) -> PortfolioSummary {
        let total_invested = self.entries.iter().map(|e| e.amount_invested).sum::<f64>();
        let total_quantity = self.entries.iter().map(|e| e.quantity_acquired).sum::<f64>();
        let current_value = total_quantity * latest_price;
        let roi_percent = if total_invested > 0.0 {
            (current_value - total_invested) / total_invested * 100.0
        } else {
            0.0
        };

        PortfolioSummary {
            entry_count: self.entries.len(),
            total_invested,
            total_quantity,
            current_value,
            roi_percent,
        }
    }

    /// Wall-clock millisecond id, bumped past the current maximum so ids stay
    /// unique and increasing even within one millisecond.
    fn next_id(&self) -> u64 {
        let now = u64::try_from(OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000)
            .unwrap_or_default();
        let floor = self
            .entries
            .iter()
            .map(|entry| entry.id.saturating_add(1))
            .max()
            .unwrap_or(0);
        now.max(floor)
    }

    fn persist(&mut self, entries: &[PortfolioEntry]) -> Result<(), LedgerError> {
        let raw = serde_json::to_string(entries).map_err(LedgerError::Serialization)?;
        self.store.set(&self.key, &raw)?;
        Ok(())
    }
}

/// Checks an amount to invest: finite and strictly positive.
pub fn validate_amount(amount: f64) -> Result<f64, ValidationError> {
    if !amount.is_finite() {
        return Err(ValidationError::NonFiniteValue { field: "amount" });
    }
    if amount <= 0.0 {
        return Err(ValidationError::NonPositiveAmount { value: amount });
    }
    Ok(amount)
}

/// Primary value of the history record closest to `date` (first wins ties).
/// Falls back to the snapshot's current price when there is no history or
/// the nearest close is not a usable price.
fn price_near(snapshot: &MarketSnapshot, date: CalendarDate) -> f64 {
    let mut best: Option<(i64, f64)> = None;
    for record in &snapshot.history {
        let distance = record.date.distance_millis(date);
        if best.map_or(true, |(best_distance, _)| distance < best_distance) {
            best = Some((distance, record.primary_value));
        }
    }
    best.map(|(_, price)| price)
        .filter(|price| price.is_finite() && *price > 0.0)
        .unwrap_or(snapshot.current_price)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MergedRecord;

    fn record(date: &str, price: f64) -> MergedRecord {
        MergedRecord {
            date: CalendarDate::parse(date).expect("valid"),
            primary_value: price,
            secondary_value: None,
            metric_value: 32.0,
        }
    }

    fn snapshot(history: Vec<MergedRecord>, current_price: f64) -> MarketSnapshot {
        MarketSnapshot {
            history,
            current_price,
            latest_metric: 32.0,
        }
    }

    #[test]
    fn price_resolves_to_nearest_record_first_on_ties() {
        let market = snapshot(
            vec![
                record("2024-05-27", 60_000.0),
                record("2024-06-03", 62_000.0),
                record("2024-06-10", 70_000.0),
            ],
            70_000.0,
        );

        let day = |d: &str| CalendarDate::parse(d).expect("valid");
        assert_eq!(price_near(&market, day("2024-06-01")), 62_000.0);
        assert_eq!(price_near(&market, day("2024-05-30")), 60_000.0);
        assert_eq!(price_near(&market, day("2030-01-01")), 70_000.0);

        let tied = snapshot(
            vec![record("2024-06-01", 61_000.0), record("2024-06-05", 63_000.0)],
            63_000.0,
        );
        assert_eq!(price_near(&tied, day("2024-06-03")), 61_000.0);
    }

    #[test]
    fn unusable_nearest_close_falls_back_to_current_price() {
        let market = snapshot(
            vec![record("2024-05-27", 60_000.0), record("2024-06-03", 0.0)],
            68_000.0,
        );
        let day = CalendarDate::parse("2024-06-02").expect("valid");
        assert_eq!(price_near(&market, day), 68_000.0);
    }

    #[test]
    fn amount_validation_distinguishes_non_finite_from_non_positive() {
        assert_eq!(validate_amount(250.0), Ok(250.0));
        assert!(matches!(
            validate_amount(f64::NAN),
            Err(ValidationError::NonFiniteValue { field: "amount" })
        ));
        assert!(matches!(
            validate_amount(f64::INFINITY),
            Err(ValidationError::NonFiniteValue { .. })
        ));
        assert!(matches!(
            validate_amount(-1.0),
            Err(ValidationError::NonPositiveAmount { .. })
        ));
    }

    #[test]
    fn empty_history_uses_current_price() {
        let market = snapshot(Vec::new(), 55_000.0);
        let day = CalendarDate::parse("2024-06-01").expect("valid");
        assert_eq!(price_near(&market, day), 55_000.0);
    }

    #[test]
    fn rejects_invalid_input_without_writing() {
        let mut ledger = Ledger::open(MemoryStore::new(), DEFAULT_LEDGER_KEY).expect("opens");
        let market = snapshot(vec![record("2024-06-03", 60_000.0)], 60_000.0);

        assert!(matches!(
            ledger.add("06/01/2024", 100.0, &market),
            Err(LedgerError::Validation(ValidationError::InvalidDate { .. }))
        ));
        assert!(matches!(
            ledger.add("2024-06-01", 0.0, &market),
            Err(LedgerError::Validation(ValidationError::NonPositiveAmount { .. }))
        ));
        assert!(matches!(
            ledger.add("2024-06-01", f64::NAN, &market),
            Err(LedgerError::Validation(ValidationError::NonFiniteValue { .. }))
        ));
        assert!(matches!(
            ledger.add("2024-06-01", 100.0, &snapshot(Vec::new(), 0.0)),
            Err(LedgerError::PriceUnavailable { .. })
        ));

        assert!(ledger.entries().is_empty());
        assert_eq!(ledger.store().get(DEFAULT_LEDGER_KEY).expect("readable"), None);
    }

    #[test]
    fn ids_are_unique_and_increasing() {
        let mut ledger = Ledger::open(MemoryStore::new(), DEFAULT_LEDGER_KEY).expect("opens");
        let market = snapshot(vec![record("2024-06-03", 60_000.0)], 60_000.0);

        let first = ledger.add("2024-06-01", 100.0, &market).expect("added");
        let second = ledger.add("2024-06-02", 100.0, &market).expect("added");
        assert!(second.id > first.id);
    }

    #[test]
    fn unknown_id_delete_is_a_no_op() {
        let mut ledger = Ledger::open(MemoryStore::new(), DEFAULT_LEDGER_KEY).expect("opens");
        assert!(!ledger.delete(42).expect("no-op"));
        assert_eq!(ledger.store().get(DEFAULT_LEDGER_KEY).expect("readable"), None);
    }

    #[test]
    fn summary_of_empty_ledger_has_zero_roi() {
        let ledger = Ledger::open(MemoryStore::new(), DEFAULT_LEDGER_KEY).expect("opens");
        let summary = ledger.summary(64_000.0);
        assert_eq!(summary.total_invested, 0.0);
        assert_eq!(summary.roi_percent, 0.0);
        assert_eq!(summary.entry_count, 0);
    }

    #[test]
    fn reads_browser_era_field_names() {
        let legacy = r#"[{"id":1717200000000,"date":"2024-06-01","usdtAmount":1000,"btcPriceAtBuy":60000,"btcAmount":0.0166667}]"#;
        let store = MemoryStore::new().with_value(DEFAULT_LEDGER_KEY, legacy);

        let ledger = Ledger::open(store, DEFAULT_LEDGER_KEY).expect("legacy data loads");
        let entry = ledger.entries()[0];
        assert_eq!(entry.id, 1_717_200_000_000);
        assert_eq!(entry.amount_invested, 1_000.0);
        assert_eq!(entry.price_at_purchase, 60_000.0);
    }

    #[test]
    fn corrupt_value_is_reported_not_discarded() {
        let store = MemoryStore::new().with_value(DEFAULT_LEDGER_KEY, "{not json");
        assert!(matches!(
            Ledger::open(store, DEFAULT_LEDGER_KEY),
            Err(LedgerError::Corrupt { .. })
        ));
    }
}
