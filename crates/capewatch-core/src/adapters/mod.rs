//! Concrete source adapters, one per upstream series.

pub mod binance;
pub mod multpl;
pub mod yahoo;

pub use binance::{BinanceKlinesSource, DEFAULT_BINANCE_URL};
pub use multpl::{MultplCapeSource, DEFAULT_CAPE_URL};
pub use yahoo::{YahooChartSource, DEFAULT_YAHOO_URL};
