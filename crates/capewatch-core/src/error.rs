use thiserror::Error;

/// Validation and contract errors exposed by `capewatch-core`.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("date must be a calendar day formatted YYYY-MM-DD: '{value}'")]
    InvalidDate { value: String },
    #[error("epoch timestamp {value} is out of range")]
    TimestampOutOfRange { value: i64 },

    #[error("invalid source '{value}', expected one of binance, yahoo, multpl")]
    InvalidSource { value: String },

    #[error("field '{field}' must be finite")]
    NonFiniteValue { field: &'static str },
    #[error("amount invested must be greater than zero, got {value}")]
    NonPositiveAmount { value: f64 },
}

/// Hard failure of a pipeline invocation.
///
/// Every other adapter fault is absorbed into a fallback before fan-in, so a
/// missing primary series is the only condition that reaches the caller.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum PipelineError {
    #[error("no market data available")]
    NoMarketData,
}
