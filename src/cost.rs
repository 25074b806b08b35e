use crate::config;
use crate::models::{CostLine, CostRollup, MappingStatus, Material, PriceTable, Scenario};

/// Purchase cost and performance figures for one scenario. Without a price
/// table every cost figure is zero.
pub fn scenario_cost(scenario: &Scenario, prices: Option<&PriceTable>) -> CostRollup {
    let mut lines: Vec<CostLine> = scenario
        .mix
        .iter()
        .filter(|(_, percentage)| **percentage > 0.0)
        .map(|(material, percentage)| {
            let price = prices.and_then(|table| table.get(material));
            CostLine {
                material: *material,
                percentage: *percentage,
                price_per_ton: price.map_or(0.0, |p| p.price_per_ton),
                tonnage: price.map_or(0.0, |p| p.total_tonnage),
                total_cost: price.map_or(0.0, |p| p.total_cost),
                is_fixed: price.is_some_and(|p| p.is_fixed),
                samples: price.map_or(0, |p| p.samples),
            }
        })
        .collect();
    lines.sort_by(|a, b| {
        b.total_cost
            .partial_cmp(&a.total_cost)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let total_cost: f64 = lines.iter().map(|line| line.total_cost).sum();
    let total_tonnage: f64 = lines.iter().map(|line| line.tonnage).sum();
    let cost_per_ton = if total_tonnage > 0.0 {
        total_cost / total_tonnage * 1000.0
    } else {
        0.0
    };
    let efficiency = if scenario.energy_per_ton != 0 {
        scenario.yield_pct / scenario.energy_per_ton as f64
    } else {
        0.0
    };

    CostRollup {
        scenario: scenario.name,
        lines,
        total_cost,
        total_tonnage,
        cost_per_ton,
        energy_per_ton: scenario.energy_per_ton,
        yield_pct: scenario.yield_pct,
        efficiency,
        loss_pct: 100.0 - scenario.yield_pct,
    }
}

pub fn mapping_status() -> Vec<MappingStatus> {
    Material::ALL
        .into_iter()
        .map(|material| {
            let descriptions = config::descriptions_for(material).len();
            let fixed_price = config::fixed_price(material);
            MappingStatus {
                material,
                descriptions,
                configured: descriptions > 0 || fixed_price.is_some(),
                fixed_price,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CellValue, MaterialPrice, Row};
    use crate::prices::calculate_scrap_prices;
    use std::collections::BTreeMap;

    fn scenario(mix: &[(Material, f64)]) -> Scenario {
        Scenario {
            name: "Test Mix",
            mix: mix.iter().copied().collect(),
            shares: BTreeMap::new(),
            energy_per_ton: 400,
            yield_pct: 90.0,
            estimated_cu: 0.0,
            estimated_p: 0.0,
            meets_spec: true,
        }
    }

    fn purchase(description: &str, weight: f64, amount: f64) -> Row {
        Row::from_cells([
            ("Material Description", CellValue::Text(description.into())),
            ("Net weight", CellValue::Number(weight)),
            ("Amount", CellValue::Number(amount)),
        ])
    }

    #[test]
    fn rolls_up_priced_materials() {
        let prices = calculate_scrap_prices(&[
            purchase("FRAGMENTIZED", 2000.0, 300.0),
            purchase("N1&2", 1000.0, 200.0),
            purchase("6B", 5000.0, 400.0),
        ]);
        let mix = scenario(&[
            (Material::Fragmentized, 20.0),
            (Material::Merchant, 80.0),
            (Material::Incinerator, 0.0),
            (Material::RecoveredScrap, 5.0),
        ]);
        let rollup = scenario_cost(&mix, Some(&prices));

        assert_eq!(rollup.lines.len(), 3);
        assert_eq!(rollup.lines[0].material, Material::Fragmentized);
        assert_eq!(rollup.lines[1].material, Material::Merchant);
        assert_eq!(rollup.total_cost, 500.0);
        assert_eq!(rollup.total_tonnage, 3000.0);
        assert!((rollup.cost_per_ton - 500.0 / 3.0).abs() < 1e-9);

        let recovered = rollup
            .lines
            .iter()
            .find(|line| line.material == Material::RecoveredScrap)
            .expect("recovered scrap line");
        assert!(recovered.is_fixed);
        assert_eq!(recovered.price_per_ton, 124.5);
        assert_eq!(recovered.total_cost, 0.0);
    }

    #[test]
    fn performance_metrics() {
        let rollup = scenario_cost(&scenario(&[(Material::Merchant, 100.0)]), None);
        assert!((rollup.efficiency - 0.225).abs() < 1e-12);
        assert_eq!(rollup.loss_pct, 10.0);
        assert_eq!(rollup.cost_per_ton, 0.0);
        assert_eq!(rollup.lines[0].price_per_ton, 0.0);
    }

    #[test]
    fn zero_energy_gives_zero_efficiency() {
        let mut mix = scenario(&[(Material::Merchant, 100.0)]);
        mix.energy_per_ton = 0;
        mix.yield_pct = 8.75;
        let rollup = scenario_cost(&mix, None);
        assert_eq!(rollup.efficiency, 0.0);
        assert_eq!(rollup.loss_pct, 100.0 - 8.75);
    }

    #[test]
    fn zero_tonnage_gives_zero_cost_per_ton() {
        let mut prices = PriceTable::new();
        prices.insert(Material::Merchant, MaterialPrice::default());
        let rollup = scenario_cost(&scenario(&[(Material::Merchant, 50.0)]), Some(&prices));
        assert_eq!(rollup.cost_per_ton, 0.0);
    }

    #[test]
    fn mapping_status_flags_fixed_material_as_configured() {
        let status = mapping_status();
        assert_eq!(status.len(), 10);
        assert!(status.iter().all(|entry| entry.configured));
        let recovered = status
            .iter()
            .find(|entry| entry.material == Material::RecoveredScrap)
            .expect("recovered scrap listed");
        assert_eq!(recovered.descriptions, 0);
        assert_eq!(recovered.fixed_price, Some(124.5));
    }
}
