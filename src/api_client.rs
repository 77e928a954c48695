use crate::backend::{AnalyticsBackend, DecisionsReply, SummaryReply};
use crate::error::FetchError;
use crate::models::{
    DateRange, DecisionRecord, PerformanceSummary, SeriesOrigin, SeriesPoint, StockEntry,
    DATE_FORMAT,
};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub fn build_http_client(timeout: Option<Duration>) -> Result<Client, FetchError> {
    let mut builder = Client::builder();
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder
        .build()
        .map_err(|err| FetchError::Transport(format!("failed to build HTTP client: {}", err)))
}

/// HTTP implementation of the backend interface against the JSON envelope
/// API. Every response body is `{"status", "message"?, "data"?}`; rejection
/// details ride inside `data`.
pub struct ApiClient {
    http: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct Envelope {
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<Value>,
}

impl Envelope {
    fn is_success(&self) -> bool {
        self.status.eq_ignore_ascii_case("success")
    }

    fn message(&self) -> String {
        self.message
            .clone()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| "backend returned an error without a message".to_string())
    }
}

/// Alternative-bearing fields a rejection payload may carry, per the backend
/// adapters: a nearest trading day for non-trading dates, a supported window
/// for out-of-range requests.
#[derive(Debug, Default, Deserialize)]
struct RejectionFields {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    nearest_trading_day: Option<NaiveDate>,
    #[serde(default)]
    valid_range: Option<DateRange>,
}

#[derive(Debug, Deserialize)]
struct DateRangePayload {
    start_date: NaiveDate,
    end_date: NaiveDate,
}

#[derive(Debug, Deserialize)]
struct QuartersPayload {
    #[serde(default)]
    quarters: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct StockListPayload {
    #[serde(default)]
    stocks: Vec<StockEntry>,
}

#[derive(Debug, Deserialize)]
struct DecisionsPayload {
    #[serde(default)]
    decisions: Vec<DecisionRecord>,
}

#[derive(Debug, Deserialize)]
struct SummaryPayload {
    total_return: f64,
    sharpe_ratio: f64,
    max_drawdown: f64,
    #[serde(default)]
    start_date: Option<NaiveDate>,
    #[serde(default)]
    end_date: Option<NaiveDate>,
    #[serde(default)]
    series: Option<SeriesArrays>,
}

#[derive(Debug, Deserialize)]
struct SeriesArrays {
    #[serde(default)]
    dates: Vec<NaiveDate>,
    #[serde(default)]
    portfolio_values: Vec<f64>,
    #[serde(default)]
    benchmark_values: Vec<f64>,
}

impl ApiClient {
    pub fn new(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    async fn get_envelope(&self, path: &str, query: &[(&str, String)]) -> Result<Envelope, FetchError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self.http.get(&url).query(query).send().await?;
        let status = response.status();
        let body = response.text().await?;

        match serde_json::from_str::<Envelope>(&body) {
            Ok(envelope) => Ok(envelope),
            Err(_) if !status.is_success() => Err(FetchError::ServerRejected(format!(
                "HTTP {} from {}",
                status, path
            ))),
            Err(err) => Err(FetchError::Transport(format!(
                "malformed response from {}: {}",
                path, err
            ))),
        }
    }

    async fn get_success<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, FetchError> {
        let envelope = self.get_envelope(path, query).await?;
        if !envelope.is_success() {
            return Err(FetchError::ServerRejected(envelope.message()));
        }
        parse_data(path, envelope.data)
    }
}

fn parse_data<T: DeserializeOwned>(path: &str, data: Option<Value>) -> Result<T, FetchError> {
    let value = data.unwrap_or(Value::Null);
    serde_json::from_value(value)
        .map_err(|err| FetchError::Transport(format!("malformed payload from {}: {}", path, err)))
}

fn rejection_fields(data: &Option<Value>) -> RejectionFields {
    data.as_ref()
        .and_then(|value| serde_json::from_value(value.clone()).ok())
        .unwrap_or_default()
}

/// A non-success decisions envelope becomes a negotiable reply when the
/// payload names an alternative, a terminal rejection otherwise.
fn classify_decisions_rejection(envelope: Envelope) -> Result<DecisionsReply, FetchError> {
    let fields = rejection_fields(&envelope.data);
    let message = fields.error.unwrap_or_else(|| envelope.message());
    if let Some(valid) = fields.valid_range {
        return Ok(DecisionsReply::OutOfRange { valid, message });
    }
    if fields.nearest_trading_day.is_some() {
        return Ok(DecisionsReply::NotTradingDay {
            nearest: fields.nearest_trading_day,
            message,
        });
    }
    Err(FetchError::ServerRejected(message))
}

fn classify_summary_rejection(envelope: Envelope) -> Result<SummaryReply, FetchError> {
    let fields = rejection_fields(&envelope.data);
    let message = fields.error.unwrap_or_else(|| envelope.message());
    match fields.valid_range {
        Some(valid) => Ok(SummaryReply::WindowRejected { valid, message }),
        None => Err(FetchError::ServerRejected(message)),
    }
}

fn build_summary(requested: DateRange, payload: SummaryPayload) -> Result<PerformanceSummary, FetchError> {
    let window = match (payload.start_date, payload.end_date) {
        (Some(start), Some(end)) => DateRange::new(start, end),
        _ => requested,
    };

    let series = match payload.series {
        Some(arrays) => zip_series(arrays)?,
        None => Vec::new(),
    };

    Ok(PerformanceSummary {
        window,
        total_return: payload.total_return,
        sharpe_ratio: payload.sharpe_ratio,
        max_drawdown: payload.max_drawdown,
        series,
        series_origin: SeriesOrigin::Server,
    })
}

fn zip_series(arrays: SeriesArrays) -> Result<Vec<SeriesPoint>, FetchError> {
    let SeriesArrays {
        dates,
        portfolio_values,
        benchmark_values,
    } = arrays;

    if dates.len() != portfolio_values.len() || dates.len() != benchmark_values.len() {
        return Err(FetchError::Transport(format!(
            "series arrays disagree on length ({} dates, {} portfolio, {} benchmark)",
            dates.len(),
            portfolio_values.len(),
            benchmark_values.len()
        )));
    }

    Ok(dates
        .into_iter()
        .zip(portfolio_values)
        .zip(benchmark_values)
        .map(|((date, portfolio_value), benchmark_value)| SeriesPoint {
            date,
            portfolio_value,
            benchmark_value,
        })
        .collect())
}

#[async_trait]
impl AnalyticsBackend for ApiClient {
    async fn valid_date_range(&self) -> Result<DateRange, FetchError> {
        let payload: DateRangePayload = self.get_success("/trading/date-range", &[]).await?;
        Ok(DateRange::new(payload.start_date, payload.end_date))
    }

    async fn available_quarters(&self) -> Result<Vec<String>, FetchError> {
        let payload: QuartersPayload = self.get_success("/stock-picked/quarters", &[]).await?;
        Ok(payload.quarters)
    }

    async fn stock_list(&self, quarter: &str) -> Result<Vec<StockEntry>, FetchError> {
        let query = [("quarter", quarter.to_string())];
        let payload: StockListPayload = self.get_success("/stock-picked/list", &query).await?;
        Ok(payload.stocks)
    }

    async fn trading_decisions(&self, date: NaiveDate) -> Result<DecisionsReply, FetchError> {
        let query = [("date", date.format(DATE_FORMAT).to_string())];
        let envelope = self.get_envelope("/trading/decisions", &query).await?;

        if !envelope.is_success() {
            return classify_decisions_rejection(envelope);
        }

        // Some adapter paths report rejections inside a success envelope.
        if rejection_fields(&envelope.data).error.is_some() {
            return classify_decisions_rejection(envelope);
        }

        let payload: DecisionsPayload = parse_data("/trading/decisions", envelope.data)?;
        Ok(DecisionsReply::Decisions(payload.decisions))
    }

    async fn performance_summary(&self, window: DateRange) -> Result<SummaryReply, FetchError> {
        let query = [
            ("start_date", window.start.format(DATE_FORMAT).to_string()),
            ("end_date", window.end.format(DATE_FORMAT).to_string()),
        ];
        let envelope = self.get_envelope("/results/summary", &query).await?;

        if !envelope.is_success() {
            return classify_summary_rejection(envelope);
        }
        if rejection_fields(&envelope.data).error.is_some() {
            return classify_summary_rejection(envelope);
        }

        let payload: SummaryPayload = parse_data("/results/summary", envelope.data)?;
        Ok(SummaryReply::Summary(build_summary(window, payload)?))
    }
}
