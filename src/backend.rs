use crate::error::FetchError;
use crate::models::{DateRange, DecisionRecord, PerformanceSummary, StockEntry};
use async_trait::async_trait;
use chrono::NaiveDate;

/// Answer to a decisions lookup. The two rejection variants are negotiable:
/// the server names a usable alternative instead of failing outright.
#[derive(Debug, Clone)]
pub enum DecisionsReply {
    Decisions(Vec<DecisionRecord>),
    /// The date is inside the declared range but no trading happened on it.
    NotTradingDay {
        nearest: Option<NaiveDate>,
        message: String,
    },
    /// The date falls outside the range the server can answer for.
    OutOfRange {
        valid: DateRange,
        message: String,
    },
}

/// Answer to a performance-summary request over a reporting window.
#[derive(Debug, Clone)]
pub enum SummaryReply {
    Summary(PerformanceSummary),
    /// The requested window is unsupported; the server declares its own.
    WindowRejected {
        valid: DateRange,
        message: String,
    },
}

/// The request surface this controller consumes. The HTTP client implements
/// it against the JSON envelope API; tests implement it with scripted
/// replies.
#[async_trait]
pub trait AnalyticsBackend: Send + Sync {
    async fn valid_date_range(&self) -> Result<DateRange, FetchError>;

    /// Valid quarter codes in chronological order. May legitimately be empty.
    async fn available_quarters(&self) -> Result<Vec<String>, FetchError>;

    async fn stock_list(&self, quarter: &str) -> Result<Vec<StockEntry>, FetchError>;

    async fn trading_decisions(&self, date: NaiveDate) -> Result<DecisionsReply, FetchError>;

    async fn performance_summary(&self, window: DateRange) -> Result<SummaryReply, FetchError>;
}
