use crate::columns;
use crate::config::PON_MIN_MAX;
use crate::models::{FilterResult, Row};

/// Drops heats whose PON min reading is above the ceiling. Rows without a
/// numeric reading stay in.
pub fn filter_production_data(rows: Vec<Row>) -> FilterResult {
    let total_before = rows.len();
    let pon_column = columns::pon_column(&columns::sample_columns(&rows));

    let Some(pon_column) = pon_column else {
        log::warn!("no PON column found; keeping all {total_before} heats");
        return FilterResult {
            filtered: rows,
            total_before,
            removed_by_pon: 0,
        };
    };
    log::info!("PON column: {pon_column}");

    let filtered: Vec<Row> = rows
        .into_iter()
        .filter(|row| {
            row.number(&pon_column)
                .map_or(true, |value| value <= PON_MIN_MAX)
        })
        .collect();
    let removed_by_pon = total_before - filtered.len();

    log::info!(
        "production filter: {} of {} heats kept, {} removed by PON min > {}",
        filtered.len(),
        total_before,
        removed_by_pon,
        PON_MIN_MAX
    );

    FilterResult {
        filtered,
        total_before,
        removed_by_pon,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CellValue;

    fn heat(pon: Option<CellValue>) -> Row {
        let mut cells = vec![("Heat", CellValue::Number(1.0))];
        if let Some(pon) = pon {
            cells.push(("PON min", pon));
        }
        Row::from_cells(cells)
    }

    #[test]
    fn removes_heats_above_ceiling() {
        let rows = vec![
            heat(Some(CellValue::Number(12.0))),
            heat(Some(CellValue::Number(50.0))),
            heat(Some(CellValue::Number(50.5))),
            heat(Some(CellValue::Text("72".into()))),
        ];
        let result = filter_production_data(rows);
        assert_eq!(result.total_before, 4);
        assert_eq!(result.removed_by_pon, 2);
        assert_eq!(result.filtered.len(), 2);
    }

    #[test]
    fn keeps_missing_and_non_numeric_readings() {
        let rows = vec![
            heat(Some(CellValue::Number(10.0))),
            heat(None),
            heat(Some(CellValue::Text("n/a".into()))),
        ];
        let result = filter_production_data(rows);
        assert_eq!(result.removed_by_pon, 0);
        assert_eq!(result.filtered.len(), 3);
    }

    #[test]
    fn no_pon_column_keeps_everything() {
        let rows = vec![heat(None), heat(None)];
        let result = filter_production_data(rows);
        assert_eq!(result.filtered.len(), 2);
        assert_eq!(result.removed_by_pon, 0);
    }

    #[test]
    fn kept_plus_removed_equals_input() {
        let rows: Vec<Row> = (0..20)
            .map(|i| heat(Some(CellValue::Number(f64::from(i) * 5.0))))
            .collect();
        let result = filter_production_data(rows);
        assert_eq!(
            result.filtered.len() + result.removed_by_pon,
            result.total_before
        );
        assert_eq!(result.removed_by_pon, 9);
    }

    #[test]
    fn empty_input() {
        let result = filter_production_data(Vec::new());
        assert_eq!(result.total_before, 0);
        assert!(result.filtered.is_empty());
    }
}
