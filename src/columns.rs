//! Keyword heuristics that locate key columns in uploaded sheets.
//!
//! Column names vary per file, so every lookup is a case-insensitive
//! substring match over the header names of a sample row. Callers decide
//! what a miss means; nothing here fails.

use crate::config;
use crate::models::{Material, Row};

/// Column names of the first row, used as the dataset's discovery sample.
pub fn sample_columns(rows: &[Row]) -> Vec<&str> {
    rows.first()
        .map(|row| row.columns().collect())
        .unwrap_or_default()
}

/// First column whose lowercased name contains any of `keywords`.
pub fn find_column(columns: &[&str], keywords: &[&str]) -> Option<String> {
    let keywords: Vec<String> = keywords.iter().map(|kw| kw.to_lowercase()).collect();
    columns
        .iter()
        .find(|column| {
            let lower = column.to_lowercase();
            keywords.iter().any(|kw| lower.contains(kw.as_str()))
        })
        .map(|column| column.to_string())
}

/// Every column matching any keyword, in header order.
pub fn find_columns(columns: &[&str], keywords: &[&str]) -> Vec<String> {
    let keywords: Vec<String> = keywords.iter().map(|kw| kw.to_lowercase()).collect();
    columns
        .iter()
        .filter(|column| {
            let lower = column.to_lowercase();
            keywords.iter().any(|kw| lower.contains(kw.as_str()))
        })
        .map(|column| column.to_string())
        .collect()
}

pub fn pon_column(columns: &[&str]) -> Option<String> {
    find_column(columns, config::PON_KEYWORDS)
}

/// "cu" together with "max" or "copper"; otherwise any "copper" column.
pub fn copper_column(columns: &[&str]) -> Option<String> {
    columns
        .iter()
        .find(|column| {
            let lower = column.to_lowercase();
            lower.contains("cu") && (lower.contains("max") || lower.contains("copper"))
        })
        .map(|column| column.to_string())
        .or_else(|| find_column(columns, &["copper"]))
}

pub fn phosphorus_column(columns: &[&str]) -> Option<String> {
    find_column(columns, config::P_KEYWORDS)
}

/// Mix-percentage column for `material` in this particular row.
pub fn material_column(row: &Row, material: Material) -> Option<&str> {
    let needle = material.label().to_lowercase();
    row.columns()
        .find(|column| column.to_lowercase().contains(&needle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CellValue;

    #[test]
    fn find_column_is_case_insensitive_and_ordered() {
        let columns = vec!["Heat", "Production DATE", "Period"];
        assert_eq!(
            find_column(&columns, config::DATE_KEYWORDS),
            Some("Production DATE".to_string())
        );
        assert_eq!(
            find_columns(&columns, config::DATE_KEYWORDS),
            vec!["Production DATE".to_string(), "Period".to_string()]
        );
        assert_eq!(find_column(&columns, &["yield"]), None);
    }

    #[test]
    fn pon_column_matches_variants() {
        assert_eq!(pon_column(&["Heat", "PON_min"]), Some("PON_min".to_string()));
        assert_eq!(pon_column(&["pon min (ppm)"]), Some("pon min (ppm)".to_string()));
        assert_eq!(pon_column(&["Heat", "Yield"]), None);
    }

    #[test]
    fn copper_prefers_cu_max_columns() {
        let columns = vec!["Copper note", "Cu (max)", "P (max)"];
        assert_eq!(copper_column(&columns), Some("Cu (max)".to_string()));
        assert_eq!(copper_column(&["Copper"]), Some("Copper".to_string()));
        assert_eq!(copper_column(&["Cu"]), None);
    }

    #[test]
    fn phosphorus_matches_known_spellings() {
        assert_eq!(
            phosphorus_column(&["Cu (max)", "P (max)"]),
            Some("P (max)".to_string())
        );
        assert_eq!(
            phosphorus_column(&["Phosphorus %"]),
            Some("Phosphorus %".to_string())
        );
        assert_eq!(phosphorus_column(&["Pmax"]), None);
    }

    #[test]
    fn material_column_found_per_row() {
        let row = Row::from_cells([
            ("Heat", CellValue::Number(1.0)),
            ("MERCHANT 1 & 2 %", CellValue::Number(40.0)),
        ]);
        assert_eq!(material_column(&row, Material::Merchant), Some("MERCHANT 1 & 2 %"));
        assert_eq!(material_column(&row, Material::TinCans), None);
    }

    #[test]
    fn sample_columns_uses_first_row() {
        let rows = vec![
            Row::from_cells([("A", CellValue::Number(1.0))]),
            Row::from_cells([("B", CellValue::Number(1.0))]),
        ];
        assert_eq!(sample_columns(&rows), vec!["A"]);
        assert!(sample_columns(&[]).is_empty());
    }
}
