use std::path::Path;

use anyhow::bail;
use chrono::NaiveDateTime;
use serde::Serialize;

use crate::coefficients;
use crate::config;
use crate::cost;
use crate::dates;
use crate::ingest;
use crate::models::{
    CalculationResult, CostRollup, DateRange, DateWindow, GradeSpec, PriceTable, Row, Scenario,
};
use crate::prices;
use crate::production;
use crate::scenarios;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductionLoad {
    pub kept: usize,
    pub total_before: usize,
    pub removed_by_pon: usize,
}

#[derive(Debug, Clone)]
struct ProductionData {
    rows: Vec<Row>,
    load: ProductionLoad,
    range: DateRange,
}

#[derive(Debug, Clone)]
struct PriceData {
    rows: Vec<Row>,
    date_column: Option<String>,
}

/// Everything derived from the current datasets, window and grade.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    pub window: DateWindow,
    pub date_range: Option<DateRange>,
    pub production: Option<ProductionLoad>,
    pub production_records: usize,
    pub price_records: Option<usize>,
    pub grade: Option<GradeSpec>,
    pub calculation: Option<CalculationResult>,
    pub scenarios: Vec<Scenario>,
    pub prices: Option<PriceTable>,
}

impl Analysis {
    pub fn scenario(&self, name: &str) -> Option<&Scenario> {
        self.scenarios
            .iter()
            .find(|scenario| scenario.name.eq_ignore_ascii_case(name.trim()))
    }

    /// Cost rollup for `name`, or for the top-ranked scenario.
    pub fn cost_rollup(&self, name: Option<&str>) -> Option<CostRollup> {
        let scenario = match name {
            Some(name) => self.scenario(name)?,
            None => self.scenarios.first()?,
        };
        Some(cost::scenario_cost(scenario, self.prices.as_ref()))
    }
}

/// Current uploads plus user selections. Each change is followed by a full
/// recomputation in [`Session::analyze`].
#[derive(Debug, Clone)]
pub struct Session {
    production: Option<ProductionData>,
    prices: Option<PriceData>,
    window: DateWindow,
    grade: Option<&'static GradeSpec>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            production: None,
            prices: None,
            window: DateWindow::default(),
            grade: config::billet_spec(config::DEFAULT_GRADE),
        }
    }

    /// Parses first, so a failed upload leaves the current dataset in place.
    pub async fn load_production_file(&mut self, path: &Path) -> anyhow::Result<ProductionLoad> {
        let rows = ingest::read_rows(path).await?;
        Ok(self.load_production(rows))
    }

    /// Applies the PON gate and resets the window to the data's date span.
    pub fn load_production(&mut self, rows: Vec<Row>) -> ProductionLoad {
        let result = production::filter_production_data(rows);
        let load = ProductionLoad {
            kept: result.filtered.len(),
            total_before: result.total_before,
            removed_by_pon: result.removed_by_pon,
        };
        let range = dates::derive_date_range(&result.filtered);
        self.window = DateWindow {
            start: range.min,
            end: range.max,
        };
        self.production = Some(ProductionData {
            rows: result.filtered,
            load,
            range,
        });
        load
    }

    pub async fn load_price_file(&mut self, path: &Path) -> anyhow::Result<usize> {
        let rows = ingest::read_rows(path).await?;
        Ok(self.load_prices(rows))
    }

    pub fn load_prices(&mut self, rows: Vec<Row>) -> usize {
        let date_column = dates::find_date_column(&rows);
        let count = rows.len();
        self.prices = Some(PriceData { rows, date_column });
        count
    }

    pub fn window(&self) -> DateWindow {
        self.window
    }

    pub fn set_window(&mut self, start: Option<NaiveDateTime>, end: Option<NaiveDateTime>) {
        self.window = DateWindow { start, end };
    }

    pub fn reset_window(&mut self) {
        self.window = match &self.production {
            Some(data) => DateWindow {
                start: data.range.min,
                end: data.range.max,
            },
            None => DateWindow::default(),
        };
    }

    /// `None` scores without a compliance check.
    pub fn select_grade(&mut self, code: Option<&str>) -> anyhow::Result<()> {
        self.grade = match code {
            None => None,
            Some(code) => match config::billet_spec(code) {
                Some(spec) => Some(spec),
                None => bail!("unknown billet grade {code:?}"),
            },
        };
        Ok(())
    }

    pub fn analyze(&self) -> Analysis {
        let filtered_production = self.production.as_ref().map(|data| {
            dates::filter_by_date_range(&data.rows, data.range.column.as_deref(), self.window)
        });
        let filtered_prices = self.prices.as_ref().map(|data| {
            dates::filter_by_date_range(&data.rows, data.date_column.as_deref(), self.window)
        });

        let calculation = filtered_production
            .as_deref()
            .filter(|rows| !rows.is_empty())
            .map(coefficients::calculate_coefficients);
        let scenarios = calculation
            .as_ref()
            .map(|calc| scenarios::score_scenarios(&calc.coefficients, &calc.baseline, self.grade))
            .unwrap_or_default();
        let price_table = filtered_prices
            .as_deref()
            .filter(|rows| !rows.is_empty())
            .map(prices::calculate_scrap_prices);

        Analysis {
            window: self.window,
            date_range: self.production.as_ref().map(|data| data.range.clone()),
            production: self.production.as_ref().map(|data| data.load),
            production_records: filtered_production.as_ref().map_or(0, Vec::len),
            price_records: filtered_prices.as_ref().map(Vec::len),
            grade: self.grade.copied(),
            calculation,
            scenarios,
            prices: price_table,
        }
    }
}
