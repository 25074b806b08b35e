use std::collections::BTreeMap;

use crate::config::{self, Recipe};
use crate::models::{Baseline, CoefficientTable, GradeSpec, Material, Scenario};

fn round_to(value: f64, places: i32) -> f64 {
    let scale = 10f64.powi(places);
    (value * scale).round() / scale
}

/// Mix percentages scaled to shares of 1; an all-zero mix stays all zero.
pub fn mix_shares(mix: &[(Material, f64)]) -> BTreeMap<Material, f64> {
    let total: f64 = mix.iter().map(|(_, value)| value).sum();
    mix.iter()
        .map(|(material, value)| {
            let share = if total > 0.0 { value / total } else { 0.0 };
            (*material, share)
        })
        .collect()
}

fn score_recipe(
    recipe: &Recipe,
    coefficients: &CoefficientTable,
    baseline: &Baseline,
    spec: Option<&GradeSpec>,
) -> Scenario {
    let shares = mix_shares(recipe.mix);

    let mut energy_factor = 0.0;
    let mut yield_factor = 0.0;
    let mut estimated_cu = 0.0;
    let mut estimated_p = 0.0;
    for (material, share) in &shares {
        let coefficient = coefficients.get(material);
        energy_factor += share * coefficient.map_or(1.0, |c| c.energy_factor);
        yield_factor += share * coefficient.map_or(1.0, |c| c.yield_factor);
        estimated_cu += share * coefficient.map_or(0.0, |c| c.cu_contribution);
        estimated_p += share * coefficient.map_or(0.0, |c| c.p_contribution);
    }

    let meets_spec = spec.map_or(true, |spec| {
        estimated_cu <= spec.cu_max && estimated_p <= spec.p_max
    });

    Scenario {
        name: recipe.name,
        mix: recipe.mix.iter().copied().collect(),
        shares,
        energy_per_ton: (baseline.energy * energy_factor).round() as i64,
        yield_pct: round_to(baseline.yield_pct * yield_factor, 2),
        estimated_cu: round_to(estimated_cu, 4),
        estimated_p: round_to(estimated_p, 4),
        meets_spec,
    }
}

/// Scores the fixed recipes, cheapest energy first. Ties keep recipe order.
pub fn score_scenarios(
    coefficients: &CoefficientTable,
    baseline: &Baseline,
    spec: Option<&GradeSpec>,
) -> Vec<Scenario> {
    let mut scenarios: Vec<Scenario> = config::SCENARIO_RECIPES
        .iter()
        .map(|recipe| score_recipe(recipe, coefficients, baseline, spec))
        .collect();
    scenarios.sort_by_key(|scenario| scenario.energy_per_ton);

    for scenario in &scenarios {
        log::debug!(
            "{}: {} kWh/t, yield {:.2}, Cu {:.4}, P {:.4}, meets spec: {}",
            scenario.name,
            scenario.energy_per_ton,
            scenario.yield_pct,
            scenario.estimated_cu,
            scenario.estimated_p,
            scenario.meets_spec
        );
    }
    scenarios
}
