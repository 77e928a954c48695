use crate::metrics;
use crate::models::{DateRange, PerformanceSummary, SeriesOrigin, SeriesPoint};

/// Knobs for the placeholder series. The defaults are the constants the
/// dashboard has always used: both legs start at the same capital and the
/// portfolio carries a higher base drift than the benchmark.
#[derive(Debug, Clone, Copy)]
pub struct SynthConfig {
    pub starting_capital: f64,
    pub portfolio_base_return: f64,
    pub benchmark_base_return: f64,
    /// Full width of the uniform jitter added to each leg's base return.
    pub daily_jitter: f64,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            starting_capital: 1_000_000.0,
            portfolio_base_return: 0.0005,
            benchmark_base_return: 0.0003,
            daily_jitter: 0.002,
        }
    }
}

/// Generates a plausible daily value series when no authoritative history is
/// available. This is a placeholder visualization path, not a market model;
/// its output is always flagged `SeriesOrigin::Synthetic` and the controller
/// never invokes it when a server series exists.
#[derive(Debug, Clone, Default)]
pub struct SeriesSynthesizer {
    config: SynthConfig,
}

impl SeriesSynthesizer {
    pub fn new(config: SynthConfig) -> Self {
        Self { config }
    }

    /// One point per calendar day across the window, both endpoints
    /// inclusive. Empty when the window is inverted.
    pub fn generate(&self, window: DateRange) -> Vec<SeriesPoint> {
        self.walk(window, &mut fastrand::Rng::new())
    }

    pub fn generate_seeded(&self, window: DateRange, seed: u64) -> Vec<SeriesPoint> {
        self.walk(window, &mut fastrand::Rng::with_seed(seed))
    }

    /// A full offline summary: the synthetic series plus metrics computed
    /// from it. Used when no backend is reachable at all.
    pub fn synthetic_summary(&self, window: DateRange, seed: Option<u64>) -> PerformanceSummary {
        let series = match seed {
            Some(seed) => self.generate_seeded(window, seed),
            None => self.generate(window),
        };

        PerformanceSummary {
            window,
            total_return: metrics::total_return(&series),
            sharpe_ratio: metrics::sharpe_ratio(&series),
            max_drawdown: metrics::max_drawdown(&series),
            series,
            series_origin: SeriesOrigin::Synthetic,
        }
    }

    fn walk(&self, window: DateRange, rng: &mut fastrand::Rng) -> Vec<SeriesPoint> {
        if window.start > window.end {
            return Vec::new();
        }

        let mut series = Vec::with_capacity(window.day_count().max(0) as usize);
        let mut portfolio_value = self.config.starting_capital;
        let mut benchmark_value = self.config.starting_capital;

        for date in window.start.iter_days() {
            if date > window.end {
                break;
            }
            series.push(SeriesPoint {
                date,
                portfolio_value,
                benchmark_value,
            });
            portfolio_value *= 1.0 + self.daily_return(self.config.portfolio_base_return, rng);
            benchmark_value *= 1.0 + self.daily_return(self.config.benchmark_base_return, rng);
        }

        series
    }

    fn daily_return(&self, base: f64, rng: &mut fastrand::Rng) -> f64 {
        base + (rng.f64() - 0.5) * self.config.daily_jitter
    }
}
