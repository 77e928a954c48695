use crate::models::{DateRange, DateSelection, QuarterSelection};
use chrono::NaiveDate;

/// Single-owner holder of the current selection state. Setters record what
/// was requested and what the server declared, separately; nothing here
/// clamps or validates — that is the negotiator's job.
#[derive(Debug, Clone)]
pub struct ParameterStore {
    date: NaiveDate,
    bounds: Option<DateRange>,
    quarter: QuarterSelection,
}

impl ParameterStore {
    pub fn new(initial_date: NaiveDate) -> Self {
        Self {
            date: initial_date,
            bounds: None,
            quarter: QuarterSelection::default(),
        }
    }

    pub fn set_date(&mut self, value: NaiveDate) {
        self.date = value;
    }

    pub fn set_bounds(&mut self, bounds: DateRange) {
        self.bounds = Some(bounds);
    }

    pub fn set_quarter(&mut self, code: impl Into<String>) {
        self.quarter.code = Some(code.into());
    }

    pub fn set_available_quarters(&mut self, quarters: Vec<String>) {
        self.quarter.available = quarters;
    }

    pub fn current_date(&self) -> DateSelection {
        DateSelection {
            value: self.date,
            bounds: self.bounds,
        }
    }

    pub fn current_quarter(&self) -> &QuarterSelection {
        &self.quarter
    }

    pub fn bounds(&self) -> Option<DateRange> {
        self.bounds
    }
}
