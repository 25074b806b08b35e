use std::fmt::Write;

use chrono::NaiveDateTime;

use crate::models::{CostRollup, Material, MaterialPrice};
use crate::session::Analysis;

fn format_bound(bound: Option<NaiveDateTime>) -> String {
    bound
        .map(|value| value.date().to_string())
        .unwrap_or_else(|| "open".to_string())
}

/// Materials that actually saw purchases, plus fixed-price ones.
pub fn priced_materials(analysis: &Analysis) -> Vec<(Material, &MaterialPrice)> {
    analysis
        .prices
        .iter()
        .flat_map(|table| table.iter())
        .filter(|(_, price)| price.samples > 0 || price.is_fixed)
        .map(|(material, price)| (*material, price))
        .collect()
}

pub fn build_report(analysis: &Analysis, rollup: Option<&CostRollup>) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# EAF Scrap Mix Report");
    let _ = writeln!(
        output,
        "Window {} to {} | grade {}",
        format_bound(analysis.window.start),
        format_bound(analysis.window.end),
        analysis.grade.map_or("none", |grade| grade.code)
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Data");

    match analysis.production {
        Some(load) => {
            let _ = writeln!(
                output,
                "- Production: {} of {} heats loaded ({} removed by PON min), {} in window",
                load.kept, load.total_before, load.removed_by_pon, analysis.production_records
            );
        }
        None => {
            let _ = writeln!(output, "- Production: not loaded");
        }
    }
    match analysis.price_records {
        Some(count) => {
            let _ = writeln!(output, "- Prices: {count} transactions in window");
        }
        None => {
            let _ = writeln!(output, "- Prices: not loaded");
        }
    }
    if let Some(range) = &analysis.date_range {
        let _ = writeln!(
            output,
            "- Date column: {} ({} to {})",
            range.column.as_deref().unwrap_or("none"),
            format_bound(range.min),
            format_bound(range.max)
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Scenarios");

    if analysis.scenarios.is_empty() {
        let _ = writeln!(output, "No production heats in this window.");
    } else {
        for (rank, scenario) in analysis.scenarios.iter().enumerate() {
            let _ = writeln!(
                output,
                "{}. {}: {} kWh/t, yield {:.2}%, Cu {:.4}, P {:.4}{}",
                rank + 1,
                scenario.name,
                scenario.energy_per_ton,
                scenario.yield_pct,
                scenario.estimated_cu,
                scenario.estimated_p,
                if scenario.meets_spec { "" } else { " (off spec)" }
            );
        }
    }

    if let Some(calc) = &analysis.calculation {
        let _ = writeln!(output);
        let _ = writeln!(output, "## Coefficients");
        let _ = writeln!(
            output,
            "Baseline: {:.1} kWh/t, cost {:.2}, yield {:.2} over {} heats",
            calc.baseline.energy, calc.baseline.cost, calc.baseline.yield_pct, calc.total_heats
        );
        for (material, coefficient) in &calc.coefficients {
            let _ = writeln!(
                output,
                "- {}: energy x{:.3}, cost x{:.3}, yield x{:.3}, Cu {:.4}, P {:.4} (weight {:.1})",
                material,
                coefficient.energy_factor,
                coefficient.cost_factor,
                coefficient.yield_factor,
                coefficient.cu_contribution,
                coefficient.p_contribution,
                coefficient.sample_size
            );
        }
    }

    let priced = priced_materials(analysis);
    if !priced.is_empty() {
        let _ = writeln!(output);
        let _ = writeln!(output, "## Scrap Prices");
        for (material, price) in priced {
            let _ = writeln!(
                output,
                "- {}: {:.2}/t{}",
                material,
                price.price_per_ton,
                if price.is_fixed {
                    " (fixed)".to_string()
                } else {
                    format!(
                        " from {} transactions, {:.1} t",
                        price.samples,
                        price.total_tonnage / 1000.0
                    )
                }
            );
        }
    }

    if let Some(rollup) = rollup {
        let _ = writeln!(output);
        let _ = writeln!(output, "## Cost: {}", rollup.scenario);
        for line in &rollup.lines {
            let _ = writeln!(
                output,
                "- {} ({} parts): {:.2}/t, cost {:.2}{}",
                line.material,
                line.percentage,
                line.price_per_ton,
                line.total_cost,
                if line.is_fixed { " (fixed price)" } else { "" }
            );
        }
        let _ = writeln!(
            output,
            "Material cost per ton {:.2} | efficiency {:.3} | loss {:.1}%",
            rollup.cost_per_ton,
            rollup.efficiency * 100.0,
            rollup.loss_pct
        );
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CellValue, Row};
    use crate::session::Session;

    fn session() -> Session {
        let mut session = Session::new();
        session.load_production(vec![Row::from_cells([
            ("Date", CellValue::Text("2024-01-05".into())),
            ("Energy per Ton", CellValue::Number(380.0)),
            ("Yield", CellValue::Number(9.2)),
            ("Merchant 1 & 2", CellValue::Number(70.0)),
        ])]);
        session
    }

    #[test]
    fn report_lists_ranked_scenarios() {
        let analysis = session().analyze();
        let report = build_report(&analysis, analysis.cost_rollup(None).as_ref());
        assert!(report.starts_with("# EAF Scrap Mix Report"));
        assert!(report.contains("grade KP18"));
        assert!(report.contains("1. Energy-Optimized"));
        assert!(report.contains("- Prices: not loaded"));
        assert!(report.contains("## Cost: Energy-Optimized"));
        assert!(!report.contains("## Scrap Prices"));
    }

    #[test]
    fn report_includes_prices_when_loaded() {
        let mut session = session();
        session.load_prices(vec![Row::from_cells([
            ("Entry date", CellValue::Text("2024-01-05".into())),
            ("Material", CellValue::Text("WIRE".into())),
            ("Net weight", CellValue::Number(2000.0)),
            ("Amount", CellValue::Number(500.0)),
        ])]);
        let analysis = session.analyze();
        let report = build_report(&analysis, None);
        assert!(report.contains("- Merchant 1 & 2: 250.00/t from 1 transactions"));
        assert!(report.contains("- Recovered Scrap: 124.50/t (fixed)"));
    }

    #[test]
    fn empty_window_is_reported() {
        let mut session = session();
        let start = chrono::NaiveDate::from_ymd_opt(2025, 1, 1)
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .expect("valid date");
        session.set_window(Some(start), None);
        let analysis = session.analyze();
        let report = build_report(&analysis, None);
        assert!(report.contains("No production heats in this window."));
    }
}
