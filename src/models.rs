use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Inclusive calendar-date window, both endpoints valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Nearest in-range date to the given one. Out-of-range inputs land on
    /// the violated endpoint; in-range inputs come back unchanged.
    pub fn nearest(&self, date: NaiveDate) -> NaiveDate {
        if date < self.start {
            self.start
        } else if date > self.end {
            self.end
        } else {
            date
        }
    }

    /// Calendar days covered, endpoints inclusive.
    pub fn day_count(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {}",
            self.start.format(DATE_FORMAT),
            self.end.format(DATE_FORMAT)
        )
    }
}

/// The user-requested trading date alongside whatever range the server has
/// declared. The requested value is never clamped into the bounds here; the
/// negotiator compares the two.
#[derive(Debug, Clone, Copy)]
pub struct DateSelection {
    pub value: NaiveDate,
    pub bounds: Option<DateRange>,
}

#[derive(Debug, Clone, Default)]
pub struct QuarterSelection {
    pub code: Option<String>,
    /// Valid quarter codes in chronological order, as declared by the server.
    pub available: Vec<String>,
}

/// What a proposed alternative to a rejected parameter may be. Never an
/// arbitrary value: a single date or a supported window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Suggestion {
    Date(NaiveDate),
    Range(DateRange),
}

impl fmt::Display for Suggestion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Suggestion::Date(date) => write!(f, "{}", date.format(DATE_FORMAT)),
            Suggestion::Range(range) => write!(f, "{}", range),
        }
    }
}

/// Result of reconciling a requested parameter against server constraints.
/// A rejection always carries a human-readable reason; the suggestion is
/// present whenever the server (or the declared bounds) offered one.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationOutcome<T> {
    Accepted(T),
    Rejected {
        reason: String,
        suggestion: Option<Suggestion>,
    },
}

impl<T> ValidationOutcome<T> {
    pub fn is_accepted(&self) -> bool {
        matches!(self, ValidationOutcome::Accepted(_))
    }

    pub fn suggestion(&self) -> Option<Suggestion> {
        match self {
            ValidationOutcome::Accepted(_) => None,
            ValidationOutcome::Rejected { suggestion, .. } => *suggestion,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockEntry {
    #[serde(rename = "stock_id")]
    pub id: String,
    #[serde(rename = "stock_name", default)]
    pub name: String,
    /// Model-assigned risk score in 0..=1.
    #[serde(default)]
    pub risk: f64,
    /// Portfolio share in 0..=1. Weights are not renormalized at this layer.
    #[serde(default)]
    pub weight: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TradeAction {
    Buy,
    Sell,
    Hold,
}

impl TradeAction {
    /// Wire encoding used by the decisions endpoint: 1 buy, -1 sell, 0 hold.
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(TradeAction::Buy),
            -1 => Some(TradeAction::Sell),
            0 => Some(TradeAction::Hold),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TradeAction::Buy => "buy",
            TradeAction::Sell => "sell",
            TradeAction::Hold => "hold",
        }
    }
}

impl<'de> Deserialize<'de> for TradeAction {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let code = i64::deserialize(deserializer)?;
        TradeAction::from_code(code)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown action code {}", code)))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionRecord {
    pub stock_id: String,
    #[serde(default)]
    pub stock_name: String,
    pub action: TradeAction,
    /// Share count; zero is the norm for holds.
    #[serde(deserialize_with = "deserialize_quantity")]
    pub quantity: u32,
}

fn deserialize_quantity<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = f64::deserialize(deserializer)?;
    if !raw.is_finite() || raw < 0.0 {
        return Err(serde::de::Error::custom(format!(
            "quantity must be a non-negative number (value: {})",
            raw
        )));
    }
    Ok(raw.round() as u32)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesOrigin {
    /// Series came back with the summary payload.
    Server,
    /// Series was generated locally because the payload carried none.
    Synthetic,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub portfolio_value: f64,
    pub benchmark_value: f64,
}

#[derive(Debug, Clone)]
pub struct PerformanceSummary {
    pub window: DateRange,
    pub total_return: f64,
    pub sharpe_ratio: f64,
    pub max_drawdown: f64,
    pub series: Vec<SeriesPoint>,
    pub series_origin: SeriesOrigin,
}

impl PerformanceSummary {
    pub fn is_synthetic_series(&self) -> bool {
        self.series_origin == SeriesOrigin::Synthetic
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn range_contains_both_endpoints() {
        let range = DateRange::new(date(2023, 1, 1), date(2023, 1, 31));
        assert!(range.contains(date(2023, 1, 1)));
        assert!(range.contains(date(2023, 1, 31)));
        assert!(!range.contains(date(2023, 2, 1)));
        assert_eq!(range.day_count(), 31);
    }

    #[test]
    fn nearest_clamps_to_violated_endpoint() {
        let range = DateRange::new(date(2023, 1, 10), date(2023, 1, 20));
        assert_eq!(range.nearest(date(2023, 1, 1)), date(2023, 1, 10));
        assert_eq!(range.nearest(date(2023, 1, 25)), date(2023, 1, 20));
        assert_eq!(range.nearest(date(2023, 1, 15)), date(2023, 1, 15));
    }

    #[test]
    fn trade_action_decodes_wire_codes() {
        let record: DecisionRecord = serde_json::from_str(
            r#"{"stock_id":"2330","stock_name":"TSMC","action":-1,"quantity":5}"#,
        )
        .unwrap();
        assert_eq!(record.action, TradeAction::Sell);
        assert_eq!(record.quantity, 5);

        let bad = serde_json::from_str::<DecisionRecord>(
            r#"{"stock_id":"2330","action":7,"quantity":0}"#,
        );
        assert!(bad.is_err());
    }

    #[test]
    fn quantity_rejects_negative_values() {
        let bad = serde_json::from_str::<DecisionRecord>(
            r#"{"stock_id":"2330","action":0,"quantity":-1}"#,
        );
        assert!(bad.is_err());
    }
}
