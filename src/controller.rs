use crate::backend::AnalyticsBackend;
use crate::error::FetchError;
use crate::models::{
    DateRange, DecisionRecord, PerformanceSummary, SeriesOrigin, StockEntry, ValidationOutcome,
    DATE_FORMAT,
};
use crate::negotiator::ValidationNegotiator;
use crate::params::ParameterStore;
use crate::synth::SeriesSynthesizer;
use chrono::NaiveDate;
use log::{info, warn};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// What the presentation layer sees for one data slot. `NoData` is a
/// well-formed empty response and renders as an explicit empty state, never
/// as a blank table or an error.
#[derive(Debug, Clone)]
pub enum SlotView<T> {
    NotLoaded,
    NoData,
    Ready(T),
    Failed(String),
}

impl<T> Default for SlotView<T> {
    fn default() -> Self {
        SlotView::NotLoaded
    }
}

impl<T> SlotView<T> {
    pub fn is_ready(&self) -> bool {
        matches!(self, SlotView::Ready(_))
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            SlotView::Ready(value) => Some(value),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StockTable {
    pub quarter: String,
    pub entries: Vec<StockEntry>,
}

#[derive(Debug, Clone)]
pub struct DecisionTable {
    pub date: NaiveDate,
    pub records: Vec<DecisionRecord>,
}

/// Snapshot of everything currently displayable. Handed out by value; the
/// presentation layer never reaches into controller internals.
#[derive(Debug, Clone, Default)]
pub struct DisplayState {
    pub stocks: SlotView<StockTable>,
    pub decisions: SlotView<DecisionTable>,
    pub summary: SlotView<PerformanceSummary>,
}

/// Per-slot results of the initial activation. The three fetches are issued
/// together and resolved independently; one failing leaves the others alone.
#[derive(Debug)]
pub struct ActivationReport {
    pub stocks: Result<ValidationOutcome<String>, FetchError>,
    pub decisions: Result<ValidationOutcome<NaiveDate>, FetchError>,
    pub summary: Result<(), FetchError>,
}

/// Orchestrates the three data retrievals around the parameter store.
///
/// Each slot carries a generation counter; a fetch claims the next value at
/// issue time and may only publish its result while still the newest claim.
/// Stale results are discarded on arrival, so a later user action always
/// wins regardless of response ordering.
pub struct DashboardController {
    backend: Arc<dyn AnalyticsBackend>,
    negotiator: ValidationNegotiator,
    synthesizer: SeriesSynthesizer,
    store: Mutex<ParameterStore>,
    display: Mutex<DisplayState>,
    quarters_loaded: AtomicBool,
    stocks_generation: AtomicU64,
    decisions_generation: AtomicU64,
    summary_generation: AtomicU64,
}

impl DashboardController {
    pub fn new(backend: Arc<dyn AnalyticsBackend>, initial_date: NaiveDate) -> Self {
        Self::with_synthesizer(backend, initial_date, SeriesSynthesizer::default())
    }

    pub fn with_synthesizer(
        backend: Arc<dyn AnalyticsBackend>,
        initial_date: NaiveDate,
        synthesizer: SeriesSynthesizer,
    ) -> Self {
        Self {
            negotiator: ValidationNegotiator::new(Arc::clone(&backend)),
            backend,
            synthesizer,
            store: Mutex::new(ParameterStore::new(initial_date)),
            display: Mutex::new(DisplayState::default()),
            quarters_loaded: AtomicBool::new(false),
            stocks_generation: AtomicU64::new(0),
            decisions_generation: AtomicU64::new(0),
            summary_generation: AtomicU64::new(0),
        }
    }

    pub fn display(&self) -> DisplayState {
        self.display_guard().clone()
    }

    pub fn current_date(&self) -> NaiveDate {
        self.store_guard().current_date().value
    }

    pub fn declared_bounds(&self) -> Option<DateRange> {
        self.store_guard().bounds()
    }

    /// Initial activation: all three retrievals, concurrently, each with its
    /// own outcome. The summary covers the given reporting window.
    pub async fn activate(&self, window: DateRange) -> ActivationReport {
        let date = self.current_date();
        let (stocks, decisions, summary) = futures::join!(
            self.select_quarter(None),
            self.select_date(date),
            self.refresh_summary(window),
        );
        ActivationReport {
            stocks,
            decisions,
            summary,
        }
    }

    /// Date-change trigger: records the request, reconciles it, and
    /// re-fetches decisions only. A rejection leaves the displayed decisions
    /// untouched so the caller can offer the accept/dismiss choice.
    pub async fn select_date(
        &self,
        date: NaiveDate,
    ) -> Result<ValidationOutcome<NaiveDate>, FetchError> {
        self.store_guard().set_date(date);

        if let Err(err) = self.ensure_bounds().await {
            // Without bounds the local check cannot run; the decisions
            // endpoint remains the authority.
            warn!("Could not refresh the valid date range: {}", err);
        }

        let selection = self.store_guard().current_date();
        if let outcome @ ValidationOutcome::Rejected { .. } =
            self.negotiator.reconcile_date(selection)
        {
            return Ok(outcome);
        }

        let generation = self.claim(&self.decisions_generation);
        let outcome = self.negotiator.negotiate_decisions(date).await;

        match outcome {
            Ok(ValidationOutcome::Accepted(records)) => {
                if !self.publish_decisions(generation, date, records) {
                    info!(
                        "Discarding stale decisions for {} (superseded)",
                        date.format(DATE_FORMAT)
                    );
                }
                Ok(ValidationOutcome::Accepted(date))
            }
            Ok(ValidationOutcome::Rejected { reason, suggestion }) => {
                Ok(ValidationOutcome::Rejected { reason, suggestion })
            }
            Err(err) => {
                if self.is_current(&self.decisions_generation, generation) {
                    self.display_guard().decisions = SlotView::Failed(err.to_string());
                }
                Err(err)
            }
        }
    }

    /// Quarter-change trigger: resolves the selection and re-fetches the
    /// stock list only. An empty available set fails closed: the slot shows
    /// an explicit no-data state and no fetch is issued.
    pub async fn select_quarter(
        &self,
        code: Option<&str>,
    ) -> Result<ValidationOutcome<String>, FetchError> {
        if let Some(code) = code {
            self.store_guard().set_quarter(code);
        }

        if let Err(err) = self.ensure_quarters().await {
            self.display_guard().stocks = SlotView::Failed(err.to_string());
            return Err(err);
        }

        let selection = self.store_guard().current_quarter().clone();
        let resolved = match self.negotiator.resolve_quarter(&selection) {
            ValidationOutcome::Accepted(code) => code,
            rejected => {
                if selection.available.is_empty() {
                    self.display_guard().stocks = SlotView::NoData;
                }
                return Ok(rejected);
            }
        };

        self.store_guard().set_quarter(resolved.clone());

        let generation = self.claim(&self.stocks_generation);
        match self.backend.stock_list(&resolved).await {
            Ok(entries) => {
                self.publish_stocks(generation, resolved.clone(), entries);
                Ok(ValidationOutcome::Accepted(resolved))
            }
            Err(err) => {
                if self.is_current(&self.stocks_generation, generation) {
                    self.display_guard().stocks = SlotView::Failed(err.to_string());
                }
                Err(err)
            }
        }
    }

    /// Summary trigger with the one-shot range correction handled by the
    /// negotiator. When the payload carries no series, the synthesizer fills
    /// the window and the result is flagged synthetic.
    pub async fn refresh_summary(&self, window: DateRange) -> Result<(), FetchError> {
        let generation = self.claim(&self.summary_generation);

        match self.negotiator.negotiate_summary(window).await {
            Ok(mut summary) => {
                if summary.series.is_empty() {
                    summary.series = self.synthesizer.generate(summary.window);
                    summary.series_origin = SeriesOrigin::Synthetic;
                    info!(
                        "No authoritative series for {}; showing a synthetic placeholder",
                        summary.window
                    );
                }
                self.publish_summary(generation, summary);
                Ok(())
            }
            Err(err) => {
                if self.is_current(&self.summary_generation, generation) {
                    self.display_guard().summary = SlotView::Failed(err.to_string());
                }
                Err(err)
            }
        }
    }

    async fn ensure_bounds(&self) -> Result<DateRange, FetchError> {
        if let Some(bounds) = self.store_guard().bounds() {
            return Ok(bounds);
        }
        let bounds = self.negotiator.declared_bounds().await?;
        self.store_guard().set_bounds(bounds);
        Ok(bounds)
    }

    async fn ensure_quarters(&self) -> Result<(), FetchError> {
        if self.quarters_loaded.load(Ordering::SeqCst) {
            return Ok(());
        }
        let quarters = self.backend.available_quarters().await?;
        self.store_guard().set_available_quarters(quarters);
        self.quarters_loaded.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn claim(&self, slot: &AtomicU64) -> u64 {
        slot.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_current(&self, slot: &AtomicU64, generation: u64) -> bool {
        slot.load(Ordering::SeqCst) == generation
    }

    fn publish_decisions(
        &self,
        generation: u64,
        date: NaiveDate,
        records: Vec<DecisionRecord>,
    ) -> bool {
        if !self.is_current(&self.decisions_generation, generation) {
            return false;
        }
        self.display_guard().decisions = if records.is_empty() {
            SlotView::NoData
        } else {
            SlotView::Ready(DecisionTable { date, records })
        };
        true
    }

    fn publish_stocks(&self, generation: u64, quarter: String, entries: Vec<StockEntry>) -> bool {
        if !self.is_current(&self.stocks_generation, generation) {
            info!("Discarding stale stock list for {} (superseded)", quarter);
            return false;
        }
        self.display_guard().stocks = if entries.is_empty() {
            SlotView::NoData
        } else {
            SlotView::Ready(StockTable { quarter, entries })
        };
        true
    }

    fn publish_summary(&self, generation: u64, summary: PerformanceSummary) -> bool {
        if !self.is_current(&self.summary_generation, generation) {
            info!("Discarding stale summary for {} (superseded)", summary.window);
            return false;
        }
        self.display_guard().summary = SlotView::Ready(summary);
        true
    }

    fn store_guard(&self) -> MutexGuard<'_, ParameterStore> {
        self.store.lock().expect("parameter store lock poisoned")
    }

    fn display_guard(&self) -> MutexGuard<'_, DisplayState> {
        self.display.lock().expect("display state lock poisoned")
    }
}
