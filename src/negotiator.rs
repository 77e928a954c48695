use crate::backend::{AnalyticsBackend, DecisionsReply, SummaryReply};
use crate::error::FetchError;
use crate::models::{
    DateRange, DateSelection, DecisionRecord, PerformanceSummary, QuarterSelection, Suggestion,
    ValidationOutcome, DATE_FORMAT,
};
use chrono::NaiveDate;
use log::{info, warn};
use std::sync::Arc;

/// Decides whether a requested parameter is usable as-is or must be
/// redirected. Rejections always carry a reason and, where the server or the
/// declared bounds offer one, a concrete alternative — never a bare failure.
pub struct ValidationNegotiator {
    backend: Arc<dyn AnalyticsBackend>,
}

impl ValidationNegotiator {
    pub fn new(backend: Arc<dyn AnalyticsBackend>) -> Self {
        Self { backend }
    }

    pub async fn declared_bounds(&self) -> Result<DateRange, FetchError> {
        self.backend.valid_date_range().await
    }

    /// Local date policy against the declared bounds. With no bounds on
    /// record yet the date passes through; the decisions fetch itself is the
    /// authority of last resort.
    pub fn reconcile_date(&self, selection: DateSelection) -> ValidationOutcome<NaiveDate> {
        match selection.bounds {
            Some(bounds) if !bounds.contains(selection.value) => ValidationOutcome::Rejected {
                reason: format!(
                    "date {} is outside the available range {}",
                    selection.value.format(DATE_FORMAT),
                    bounds
                ),
                suggestion: Some(Suggestion::Range(bounds)),
            },
            _ => ValidationOutcome::Accepted(selection.value),
        }
    }

    /// Quarter policy: an unset quarter resolves to the most recent
    /// available one; an empty set fails closed so no dependent fetch runs.
    pub fn resolve_quarter(&self, selection: &QuarterSelection) -> ValidationOutcome<String> {
        if selection.available.is_empty() {
            return ValidationOutcome::Rejected {
                reason: "no reporting quarters are available".to_string(),
                suggestion: None,
            };
        }

        match &selection.code {
            Some(code) if selection.available.iter().any(|entry| entry == code) => {
                ValidationOutcome::Accepted(code.clone())
            }
            Some(code) => ValidationOutcome::Rejected {
                reason: format!("quarter {} is not in the available set", code),
                suggestion: None,
            },
            None => {
                let latest = selection
                    .available
                    .last()
                    .expect("available set is confirmed non-empty")
                    .clone();
                ValidationOutcome::Accepted(latest)
            }
        }
    }

    /// Issues the decisions fetch and folds server-side rejections into the
    /// negotiation contract: non-trading days suggest the nearest trading
    /// day, out-of-range dates suggest the supported range.
    pub async fn negotiate_decisions(
        &self,
        date: NaiveDate,
    ) -> Result<ValidationOutcome<Vec<DecisionRecord>>, FetchError> {
        match self.backend.trading_decisions(date).await? {
            DecisionsReply::Decisions(records) => Ok(ValidationOutcome::Accepted(records)),
            DecisionsReply::NotTradingDay { nearest, message } => {
                info!(
                    "Decisions for {} rejected as non-trading day (nearest: {:?})",
                    date.format(DATE_FORMAT),
                    nearest
                );
                Ok(ValidationOutcome::Rejected {
                    reason: message,
                    suggestion: nearest.map(Suggestion::Date),
                })
            }
            DecisionsReply::OutOfRange { valid, message } => Ok(ValidationOutcome::Rejected {
                reason: message,
                suggestion: Some(Suggestion::Range(valid)),
            }),
        }
    }

    /// Range policy for the performance summary: one corrective retry with
    /// the server-declared window, then terminal.
    pub async fn negotiate_summary(
        &self,
        window: DateRange,
    ) -> Result<PerformanceSummary, FetchError> {
        let corrected = match self.backend.performance_summary(window).await? {
            SummaryReply::Summary(summary) => return Ok(summary),
            SummaryReply::WindowRejected { valid, message } => {
                warn!(
                    "Summary window {} rejected ({}); retrying once with {}",
                    window, message, valid
                );
                valid
            }
        };

        match self.backend.performance_summary(corrected).await? {
            SummaryReply::Summary(summary) => Ok(summary),
            SummaryReply::WindowRejected { message, .. } => {
                Err(FetchError::ServerRejected(format!(
                    "summary window rejected again after correction: {}",
                    message
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StockEntry;
    use async_trait::async_trait;

    struct NullBackend;

    #[async_trait]
    impl AnalyticsBackend for NullBackend {
        async fn valid_date_range(&self) -> Result<DateRange, FetchError> {
            Err(FetchError::Transport("unused".into()))
        }
        async fn available_quarters(&self) -> Result<Vec<String>, FetchError> {
            Err(FetchError::Transport("unused".into()))
        }
        async fn stock_list(&self, _quarter: &str) -> Result<Vec<StockEntry>, FetchError> {
            Err(FetchError::Transport("unused".into()))
        }
        async fn trading_decisions(&self, _date: NaiveDate) -> Result<DecisionsReply, FetchError> {
            Err(FetchError::Transport("unused".into()))
        }
        async fn performance_summary(&self, _window: DateRange) -> Result<SummaryReply, FetchError> {
            Err(FetchError::Transport("unused".into()))
        }
    }

    fn negotiator() -> ValidationNegotiator {
        ValidationNegotiator::new(Arc::new(NullBackend))
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn in_bounds_date_is_accepted() {
        let bounds = DateRange::new(date(2020, 1, 2), date(2023, 6, 30));
        let outcome = negotiator().reconcile_date(DateSelection {
            value: date(2022, 3, 15),
            bounds: Some(bounds),
        });
        assert_eq!(outcome, ValidationOutcome::Accepted(date(2022, 3, 15)));
    }

    #[test]
    fn out_of_bounds_date_suggests_the_declared_range() {
        let bounds = DateRange::new(date(2020, 1, 2), date(2023, 6, 30));
        let outcome = negotiator().reconcile_date(DateSelection {
            value: date(2024, 1, 1),
            bounds: Some(bounds),
        });
        match outcome {
            ValidationOutcome::Rejected { suggestion, reason } => {
                assert_eq!(suggestion, Some(Suggestion::Range(bounds)));
                assert!(reason.contains("2024-01-01"));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn unknown_bounds_pass_the_date_through() {
        let outcome = negotiator().reconcile_date(DateSelection {
            value: date(2024, 1, 1),
            bounds: None,
        });
        assert!(outcome.is_accepted());
    }

    #[test]
    fn unset_quarter_resolves_to_most_recent() {
        let selection = QuarterSelection {
            code: None,
            available: vec!["2023-Q4".into(), "2024-Q1".into(), "2024-Q2".into()],
        };
        assert_eq!(
            negotiator().resolve_quarter(&selection),
            ValidationOutcome::Accepted("2024-Q2".to_string())
        );
    }

    #[test]
    fn empty_quarter_set_fails_closed_without_suggestion() {
        let selection = QuarterSelection::default();
        match negotiator().resolve_quarter(&selection) {
            ValidationOutcome::Rejected { suggestion, .. } => assert_eq!(suggestion, None),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn requested_quarter_must_be_in_the_available_set() {
        let selection = QuarterSelection {
            code: Some("2019-Q1".into()),
            available: vec!["2023-Q4".into(), "2024-Q1".into()],
        };
        match negotiator().resolve_quarter(&selection) {
            ValidationOutcome::Rejected { reason, suggestion } => {
                assert!(reason.contains("2019-Q1"));
                assert_eq!(suggestion, None);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }

        let known = QuarterSelection {
            code: Some("2024-Q1".into()),
            available: vec!["2023-Q4".into(), "2024-Q1".into()],
        };
        assert!(negotiator().resolve_quarter(&known).is_accepted());
    }
}
