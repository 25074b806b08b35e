use crate::columns;
use crate::config;
use crate::models::{
    Baseline, CalculationResult, CoefficientTable, Material, MaterialCoefficient, Row,
};

/// Metrics read from one heat.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct HeatReading {
    energy: f64,
    cost: f64,
    yield_pct: f64,
    cu: f64,
    p: f64,
}

impl HeatReading {
    fn read(row: &Row, cu_column: Option<&str>, p_column: Option<&str>) -> Self {
        let trace = |column: Option<&str>| column.map_or(0.0, |column| row.first_number(&[column]));
        Self {
            energy: row.first_number(config::ENERGY_COLUMNS),
            cost: row.first_number(config::COST_COLUMNS),
            yield_pct: row.first_number(config::YIELD_COLUMNS),
            cu: trace(cu_column),
            p: trace(p_column),
        }
    }
}

/// Running sums for one material.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Accumulator {
    totals: HeatReading,
    heats: usize,
    weight: f64,
}

impl Accumulator {
    fn record(self, heat: HeatReading, percentage: f64) -> Self {
        Self {
            totals: HeatReading {
                energy: self.totals.energy + heat.energy,
                cost: self.totals.cost + heat.cost,
                yield_pct: self.totals.yield_pct + heat.yield_pct,
                cu: self.totals.cu + heat.cu,
                p: self.totals.p + heat.p,
            },
            heats: self.heats + 1,
            weight: self.weight + percentage,
        }
    }

    fn mean(&self, total: f64) -> Option<f64> {
        (self.heats > 0).then(|| total / self.heats as f64)
    }
}

type MaterialStats = [Accumulator; Material::COUNT];

fn absorb(stats: MaterialStats, row: &Row, heat: HeatReading) -> MaterialStats {
    let mut next = stats;
    for material in Material::ALL {
        let percentage = columns::material_column(row, material)
            .and_then(|column| row.number(column))
            .unwrap_or(0.0);
        if percentage > 0.0 {
            let slot = material as usize;
            next[slot] = next[slot].record(heat, percentage);
        }
    }
    next
}

fn baseline_metric(mean: Option<f64>, fallback: f64) -> f64 {
    match mean {
        Some(value) if value.is_finite() && value != 0.0 => value,
        _ => fallback,
    }
}

fn derive_baseline(reference: &Accumulator) -> Baseline {
    let fallback = config::FALLBACK_BASELINE;
    if reference.heats == 0 {
        log::warn!(
            "no heats contain {}; using fallback baseline",
            config::BASELINE_MATERIAL
        );
    }
    Baseline {
        energy: baseline_metric(reference.mean(reference.totals.energy), fallback.energy),
        cost: baseline_metric(reference.mean(reference.totals.cost), fallback.cost),
        yield_pct: baseline_metric(reference.mean(reference.totals.yield_pct), fallback.yield_pct),
    }
}

fn coefficient(stats: &Accumulator, baseline: &Baseline) -> MaterialCoefficient {
    let energy = stats.mean(stats.totals.energy).unwrap_or(baseline.energy);
    let cost = stats.mean(stats.totals.cost).unwrap_or(baseline.cost);
    let yield_pct = stats.mean(stats.totals.yield_pct).unwrap_or(baseline.yield_pct);

    MaterialCoefficient {
        energy_factor: energy / baseline.energy,
        cost_factor: cost / baseline.cost,
        yield_factor: yield_pct / baseline.yield_pct,
        sample_size: stats.weight,
        cu_contribution: stats.mean(stats.totals.cu).unwrap_or(0.0),
        p_contribution: stats.mean(stats.totals.p).unwrap_or(0.0),
    }
}

/// Per-material factors relative to the baseline material, recomputed from
/// scratch over `rows`.
pub fn calculate_coefficients(rows: &[Row]) -> CalculationResult {
    let sample = columns::sample_columns(rows);
    let cu_column = columns::copper_column(&sample);
    let p_column = columns::phosphorus_column(&sample);

    match (&cu_column, &p_column) {
        (Some(cu), Some(p)) => log::info!("Cu column: {cu} | P column: {p}"),
        _ => log::warn!(
            "trace element columns incomplete (Cu: {:?}, P: {:?}); missing ones contribute 0",
            cu_column,
            p_column
        ),
    }

    let stats = rows
        .iter()
        .fold([Accumulator::default(); Material::COUNT], |stats, row| {
            let heat = HeatReading::read(row, cu_column.as_deref(), p_column.as_deref());
            absorb(stats, row, heat)
        });

    for material in Material::ALL {
        let entry = &stats[material as usize];
        log::debug!(
            "{}: {} heats, mix weight {:.1}",
            material,
            entry.heats,
            entry.weight
        );
    }

    let baseline = derive_baseline(&stats[config::BASELINE_MATERIAL as usize]);
    let coefficients: CoefficientTable = Material::ALL
        .into_iter()
        .map(|material| (material, coefficient(&stats[material as usize], &baseline)))
        .collect();

    CalculationResult {
        coefficients,
        baseline,
        total_heats: rows.len(),
    }
}
