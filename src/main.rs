use anyhow::{anyhow, Result};
use chrono::{Duration, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use dashboard::api_client::{build_http_client, ApiClient, DEFAULT_TIMEOUT};
use dashboard::api_url::resolve_api_base_url;
use dashboard::controller::{DashboardController, DisplayState, SlotView};
use dashboard::models::{
    DateRange, PerformanceSummary, Suggestion, ValidationOutcome, DATE_FORMAT,
};
use dashboard::synth::SeriesSynthesizer;
use log::{error, warn};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "dashboard")]
#[command(about = "Controller for the portfolio analytics dashboard")]
struct Cli {
    /// Base URL of the analytics API (falls back to DASHBOARD_API_URL, then
    /// the local development default)
    #[arg(long = "api-url", value_name = "URL", global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch all three panels: stock list, decisions, performance summary
    Activate {
        /// Trading date for the decisions panel (defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Reporting quarter (defaults to the most recent available)
        #[arg(long)]
        quarter: Option<String>,
    },
    /// Fetch trading decisions for a date
    Decisions {
        date: NaiveDate,
        /// Accept a server-suggested alternative date instead of stopping
        #[arg(long)]
        accept_suggestion: bool,
    },
    /// Fetch the low-risk stock list for a quarter
    Stocks {
        /// Quarter code such as 2024-Q2 (defaults to the most recent)
        quarter: Option<String>,
    },
    /// Fetch the performance summary over a reporting window
    Summary { start: NaiveDate, end: NaiveDate },
    /// Render a fully synthetic summary without contacting any backend
    Preview {
        start: NaiveDate,
        end: NaiveDate,
        /// Seed for reproducible output
        #[arg(long)]
        seed: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    if let Commands::Preview { start, end, seed } = &cli.command {
        render_summary(
            &SeriesSynthesizer::default().synthetic_summary(DateRange::new(*start, *end), *seed),
        );
        return Ok(());
    }

    let base_url = resolve_api_base_url(cli.api_url.as_deref());
    let http = build_http_client(Some(DEFAULT_TIMEOUT))?;
    let backend = Arc::new(ApiClient::new(http, base_url));
    let today = Utc::now().date_naive();
    let controller = DashboardController::new(backend, today);

    match cli.command {
        Commands::Activate { date, quarter } => {
            if let Some(date) = date {
                controller.select_date(date).await.map_or_else(
                    |err| warn!("Date pre-selection failed: {}", err),
                    |outcome| report_rejection("date", &outcome),
                );
            }
            if let Some(quarter) = quarter.as_deref() {
                controller.select_quarter(Some(quarter)).await.map_or_else(
                    |err| warn!("Quarter pre-selection failed: {}", err),
                    |outcome| report_rejection("quarter", &outcome),
                );
            }

            // Summary covers the trailing year, like the dashboard's default view.
            let end = controller.current_date();
            let window = DateRange::new(end - Duration::days(365), end);
            let report = controller.activate(window).await;

            if let Err(err) = &report.stocks {
                error!("Stock list unavailable: {}", err);
            }
            if let Err(err) = &report.decisions {
                error!("Trading decisions unavailable: {}", err);
            }
            if let Err(err) = &report.summary {
                error!("Performance summary unavailable: {}", err);
            }

            render(&controller.display());
            Ok(())
        }
        Commands::Decisions {
            date,
            accept_suggestion,
        } => {
            match controller.select_date(date).await? {
                ValidationOutcome::Accepted(_) => {}
                ValidationOutcome::Rejected { reason, suggestion } => {
                    warn!("Date {} rejected: {}", date.format(DATE_FORMAT), reason);
                    match suggestion {
                        Some(suggestion) if accept_suggestion => {
                            let corrected = match suggestion {
                                Suggestion::Date(suggested) => suggested,
                                Suggestion::Range(range) => range.nearest(date),
                            };
                            println!(
                                "Retrying with suggested date {}",
                                corrected.format(DATE_FORMAT)
                            );
                            let retried = controller.select_date(corrected).await?;
                            report_rejection("date", &retried);
                        }
                        Some(suggestion) => {
                            println!(
                                "Suggested alternative: {} (re-run with --accept-suggestion to use it)",
                                suggestion
                            );
                            return Ok(());
                        }
                        None => {
                            return Err(anyhow!("date rejected with no alternative: {}", reason))
                        }
                    }
                }
            }
            render(&controller.display());
            Ok(())
        }
        Commands::Stocks { quarter } => {
            let outcome = controller.select_quarter(quarter.as_deref()).await?;
            report_rejection("quarter", &outcome);
            render(&controller.display());
            Ok(())
        }
        Commands::Summary { start, end } => {
            controller
                .refresh_summary(DateRange::new(start, end))
                .await?;
            render(&controller.display());
            Ok(())
        }
        Commands::Preview { .. } => unreachable!("handled before backend setup"),
    }
}

fn report_rejection<T>(what: &str, outcome: &ValidationOutcome<T>) {
    if let ValidationOutcome::Rejected { reason, suggestion } = outcome {
        match suggestion {
            Some(suggestion) => warn!("{} rejected: {} (suggested: {})", what, reason, suggestion),
            None => warn!("{} rejected: {}", what, reason),
        }
    }
}

fn render(display: &DisplayState) {
    match &display.stocks {
        SlotView::NotLoaded => {}
        SlotView::NoData => println!("Stock list: no data for the selected quarter"),
        SlotView::Failed(message) => println!("Stock list: error ({})", message),
        SlotView::Ready(table) => {
            println!("Stock list for {}:", table.quarter);
            println!("  {:<10} {:<16} {:>6} {:>8}", "id", "name", "risk", "weight");
            for entry in &table.entries {
                println!(
                    "  {:<10} {:<16} {:>6.2} {:>7.2}%",
                    entry.id,
                    entry.name,
                    entry.risk,
                    entry.weight * 100.0
                );
            }
        }
    }

    match &display.decisions {
        SlotView::NotLoaded => {}
        SlotView::NoData => println!("Decisions: no data for the selected date"),
        SlotView::Failed(message) => println!("Decisions: error ({})", message),
        SlotView::Ready(table) => {
            println!("Decisions for {}:", table.date.format(DATE_FORMAT));
            println!(
                "  {:<10} {:<16} {:<6} {:>8}",
                "stock", "name", "action", "quantity"
            );
            for record in &table.records {
                println!(
                    "  {:<10} {:<16} {:<6} {:>8}",
                    record.stock_id,
                    record.stock_name,
                    record.action.as_str(),
                    record.quantity
                );
            }
        }
    }

    match &display.summary {
        SlotView::NotLoaded => {}
        SlotView::NoData => println!("Summary: no data for the selected window"),
        SlotView::Failed(message) => println!("Summary: error ({})", message),
        SlotView::Ready(summary) => render_summary(summary),
    }
}

fn render_summary(summary: &PerformanceSummary) {
    println!("Performance summary for {}:", summary.window);
    println!("  total return:  {:>8.2}%", summary.total_return * 100.0);
    println!("  sharpe ratio:  {:>8.2}", summary.sharpe_ratio);
    println!("  max drawdown:  {:>8.2}%", summary.max_drawdown * 100.0);

    let origin = if summary.is_synthetic_series() {
        "synthetic placeholder"
    } else {
        "server"
    };
    println!(
        "  series: {} points ({} to {}, {})",
        summary.series.len(),
        summary
            .series
            .first()
            .map(|p| p.date.format(DATE_FORMAT).to_string())
            .unwrap_or_else(|| "-".to_string()),
        summary
            .series
            .last()
            .map(|p| p.date.format(DATE_FORMAT).to_string())
            .unwrap_or_else(|| "-".to_string()),
        origin
    );
}
