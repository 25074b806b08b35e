use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

use chrono::NaiveDateTime;
use regex::Regex;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// Raw spreadsheet cell. Empty cells are never stored in a [`Row`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Number(f64),
    Text(String),
}

impl CellValue {
    /// Numeric reading with leading-prefix semantics for text ("12.5%" -> 12.5).
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(value) => Some(*value),
            CellValue::Text(text) => leading_number(text),
        }
    }

    /// A value that counts as "set": non-zero numbers and non-blank text.
    pub fn is_truthy(&self) -> bool {
        match self {
            CellValue::Number(value) => *value != 0.0 && !value.is_nan(),
            CellValue::Text(text) => !text.is_empty(),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Number(value) if value.fract() == 0.0 && value.abs() < 1e15 => {
                write!(f, "{}", *value as i64)
            }
            CellValue::Number(value) => write!(f, "{}", value),
            CellValue::Text(text) => f.write_str(text),
        }
    }
}

fn leading_number(text: &str) -> Option<f64> {
    static PREFIX: OnceLock<Regex> = OnceLock::new();
    let re = PREFIX.get_or_init(|| {
        Regex::new(r"^[+-]?(\d+\.?\d*|\.\d+)([eE][+-]?\d+)?").expect("numeric prefix regex")
    });
    re.find(text.trim_start())
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

/// One spreadsheet row: column name -> cell, in header order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    cells: Vec<(String, CellValue)>,
}

impl Row {
    pub fn from_cells<I, S>(cells: I) -> Self
    where
        I: IntoIterator<Item = (S, CellValue)>,
        S: Into<String>,
    {
        Self {
            cells: cells
                .into_iter()
                .map(|(column, value)| (column.into(), value))
                .collect(),
        }
    }

    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.cells
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(name, _)| name.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn number(&self, column: &str) -> Option<f64> {
        self.get(column).and_then(CellValue::as_number)
    }

    /// First truthy value among `columns`, read as a number; 0 when nothing usable.
    pub fn first_number(&self, columns: &[&str]) -> f64 {
        columns
            .iter()
            .filter_map(|column| self.get(column))
            .find(|value| value.is_truthy())
            .and_then(CellValue::as_number)
            .unwrap_or(0.0)
    }

    /// First truthy value among `columns`, stringified; empty when nothing set.
    pub fn first_text(&self, columns: &[&str]) -> String {
        columns
            .iter()
            .filter_map(|column| self.get(column))
            .find(|value| value.is_truthy())
            .map(|value| value.to_string())
            .unwrap_or_default()
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.cells.len()))?;
        for (column, value) in &self.cells {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}

/// The ten canonical scrap categories, in match-priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Material {
    #[serde(rename = "Clean Bales 1")]
    CleanBales1,
    #[serde(rename = "Clean Bales 2")]
    CleanBales2,
    #[serde(rename = "Tin Cans")]
    TinCans,
    #[serde(rename = "Estructural")]
    Estructural,
    #[serde(rename = "Merchant 1 & 2")]
    Merchant,
    #[serde(rename = "Incinerator")]
    Incinerator,
    #[serde(rename = "Fragmentized scrap")]
    Fragmentized,
    #[serde(rename = "Steel turnings")]
    SteelTurnings,
    #[serde(rename = "Scrap Plate Iron")]
    ScrapPlateIron,
    #[serde(rename = "Recovered Scrap")]
    RecoveredScrap,
}

impl Material {
    pub const COUNT: usize = 10;

    pub const ALL: [Material; Material::COUNT] = [
        Material::CleanBales1,
        Material::CleanBales2,
        Material::TinCans,
        Material::Estructural,
        Material::Merchant,
        Material::Incinerator,
        Material::Fragmentized,
        Material::SteelTurnings,
        Material::ScrapPlateIron,
        Material::RecoveredScrap,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Material::CleanBales1 => "Clean Bales 1",
            Material::CleanBales2 => "Clean Bales 2",
            Material::TinCans => "Tin Cans",
            Material::Estructural => "Estructural",
            Material::Merchant => "Merchant 1 & 2",
            Material::Incinerator => "Incinerator",
            Material::Fragmentized => "Fragmentized scrap",
            Material::SteelTurnings => "Steel turnings",
            Material::ScrapPlateIron => "Scrap Plate Iron",
            Material::RecoveredScrap => "Recovered Scrap",
        }
    }
}

impl fmt::Display for Material {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterResult {
    pub filtered: Vec<Row>,
    pub total_before: usize,
    pub removed_by_pon: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub column: Option<String>,
    pub min: Option<NaiveDateTime>,
    pub max: Option<NaiveDateTime>,
}

/// Inclusive analysis window; `None` bounds are open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct DateWindow {
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialCoefficient {
    pub energy_factor: f64,
    pub cost_factor: f64,
    pub yield_factor: f64,
    /// Sum of matched mix percentages, not a row count.
    pub sample_size: f64,
    pub cu_contribution: f64,
    pub p_contribution: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Baseline {
    pub energy: f64,
    pub cost: f64,
    #[serde(rename = "yield")]
    pub yield_pct: f64,
}

pub type CoefficientTable = BTreeMap<Material, MaterialCoefficient>;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationResult {
    pub coefficients: CoefficientTable,
    pub baseline: Baseline,
    pub total_heats: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceTransaction {
    pub description: String,
    pub price_per_ton: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialPrice {
    pub price_per_ton: f64,
    pub samples: usize,
    pub total_tonnage: f64,
    pub total_cost: f64,
    pub transactions: Vec<PriceTransaction>,
    pub is_fixed: bool,
}

pub type PriceTable = BTreeMap<Material, MaterialPrice>;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeSpec {
    pub code: &'static str,
    pub cu_max: f64,
    pub p_max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    pub name: &'static str,
    pub mix: BTreeMap<Material, f64>,
    /// Mix normalized to shares of 1.
    pub shares: BTreeMap<Material, f64>,
    pub energy_per_ton: i64,
    #[serde(rename = "yield")]
    pub yield_pct: f64,
    pub estimated_cu: f64,
    pub estimated_p: f64,
    pub meets_spec: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CostLine {
    pub material: Material,
    pub percentage: f64,
    pub price_per_ton: f64,
    pub tonnage: f64,
    pub total_cost: f64,
    pub is_fixed: bool,
    pub samples: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CostRollup {
    pub scenario: &'static str,
    pub lines: Vec<CostLine>,
    pub total_cost: f64,
    pub total_tonnage: f64,
    pub cost_per_ton: f64,
    pub energy_per_ton: i64,
    #[serde(rename = "yield")]
    pub yield_pct: f64,
    pub efficiency: f64,
    pub loss_pct: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingStatus {
    pub material: Material,
    pub descriptions: usize,
    pub configured: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fixed_price: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_cells_read_leading_numbers() {
        assert_eq!(CellValue::Text("12.5%".into()).as_number(), Some(12.5));
        assert_eq!(CellValue::Text("  7 t".into()).as_number(), Some(7.0));
        assert_eq!(CellValue::Text("-.5".into()).as_number(), Some(-0.5));
        assert_eq!(CellValue::Text("n/a".into()).as_number(), None);
        assert_eq!(CellValue::Number(3.25).as_number(), Some(3.25));
    }

    #[test]
    fn first_number_skips_zero_and_blank_values() {
        let row = Row::from_cells([
            ("ENERGY_PER_TN KWH/T", CellValue::Number(0.0)),
            ("Energy per Ton", CellValue::Number(372.0)),
        ]);
        assert_eq!(row.first_number(&["ENERGY_PER_TN KWH/T", "Energy per Ton"]), 372.0);
        assert_eq!(row.first_number(&["Missing"]), 0.0);

        let junk = Row::from_cells([("Yield", CellValue::Text("bad".into()))]);
        assert_eq!(junk.first_number(&["Yield"]), 0.0);
    }

    #[test]
    fn numbers_stringify_without_trailing_zeroes() {
        assert_eq!(CellValue::Number(12.0).to_string(), "12");
        assert_eq!(CellValue::Number(12.5).to_string(), "12.5");
        let row = Row::from_cells([("Material", CellValue::Number(6.0))]);
        assert_eq!(row.first_text(&["Material Description", "Material"]), "6");
    }

    #[test]
    fn rows_serialize_as_ordered_maps() {
        let row = Row::from_cells([
            ("b", CellValue::Number(1.0)),
            ("a", CellValue::Text("x".into())),
        ]);
        let json = serde_json::to_string(&row).expect("serialize row");
        assert_eq!(json, r#"{"b":1.0,"a":"x"}"#);
    }

    #[test]
    fn materials_serialize_by_label() {
        let json = serde_json::to_string(&Material::Merchant).expect("serialize material");
        assert_eq!(json, "\"Merchant 1 & 2\"");
        for material in Material::ALL {
            assert_eq!(
                serde_json::to_string(&material).expect("serialize"),
                format!("\"{}\"", material.label())
            );
        }
    }
}
