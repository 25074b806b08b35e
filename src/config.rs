//! Static reference data: material mapping, grade table, scenario recipes.

use crate::models::{Baseline, GradeSpec, Material};

pub const PON_MIN_MAX: f64 = 50.0;

/// Recovered scrap never appears in supplier data.
pub const RECOVERED_SCRAP_FIXED_PRICE: f64 = 124.5;

pub const DEFAULT_GRADE: &str = "KP18";

pub const BASELINE_MATERIAL: Material = Material::Merchant;

pub const FALLBACK_BASELINE: Baseline = Baseline {
    energy: 365.0,
    cost: 29.5,
    yield_pct: 9.5,
};

pub const ENERGY_COLUMNS: &[&str] = &["ENERGY_PER_TN KWH/T", "Energy per Ton"];
pub const YIELD_COLUMNS: &[&str] = &["Yield"];
pub const COST_COLUMNS: &[&str] = &["Cost per heat £/tn", "Cost per heat Â£/tn", "Cost"];

pub const DESCRIPTION_COLUMNS: &[&str] = &["Material Description", "Material"];
pub const WEIGHT_COLUMNS: &[&str] = &["Net weight", "NetWeight"];
pub const AMOUNT_COLUMNS: &[&str] = &["Amt.in loc.cur.", "Amount"];
pub const ENTRY_DATE_COLUMN: &str = "Entry date";

pub const DATE_KEYWORDS: &[&str] = &["date", "fecha", "time", "period"];
pub const PON_KEYWORDS: &[&str] = &["PON min", "PON_min", "PONmin", "pon"];
pub const P_KEYWORDS: &[&str] = &["p (max)", "p(max)", "p max", "p_max", "phosphorus"];

/// Supplier description fragments per material, tried in this order.
pub const MATERIAL_MAPPING: &[(Material, &[&str])] = &[
    (Material::CleanBales1, &["8A/NEWSHEETS", "12A", "4A", "RAIL"]),
    (Material::CleanBales2, &["12C", "12D", "4C", "8B"]),
    (Material::TinCans, &["Frag Tin-can Bales", "Tin Cans Loose / Baled"]),
    (Material::Estructural, &["OA", "OA/#1", "DEMO.", "Oversize"]),
    (
        Material::Merchant,
        &[
            "# 1/2 Bales",
            "#2",
            "1ª/2ª EXP",
            "Cast iron",
            "N1 & HMS1",
            "N1&2",
            "WIRE",
            "Light Iron / Fragfeed",
        ],
    ),
    (Material::Incinerator, &["6B"]),
    (Material::Fragmentized, &["FRAGMENTIZED"]),
    (Material::SteelTurnings, &["STEEL TURNINGS"]),
    (Material::ScrapPlateIron, &["Scrap Plate Iron"]),
    (Material::RecoveredScrap, &[]),
];

pub fn descriptions_for(material: Material) -> &'static [&'static str] {
    MATERIAL_MAPPING
        .iter()
        .find(|(candidate, _)| *candidate == material)
        .map(|(_, descriptions)| *descriptions)
        .unwrap_or(&[])
}

pub fn fixed_price(material: Material) -> Option<f64> {
    match material {
        Material::RecoveredScrap => Some(RECOVERED_SCRAP_FIXED_PRICE),
        _ => None,
    }
}

const fn grade(code: &'static str, p_max: f64, cu_max: f64) -> GradeSpec {
    GradeSpec {
        code,
        cu_max,
        p_max,
    }
}

/// Billet grade ceilings as (code, P max, Cu max).
pub const BILLET_SPECS: &[GradeSpec] = &[
    grade("KP04", 0.035, 0.35),
    grade("KP05", 0.035, 0.35),
    grade("KP06", 0.04, 0.75),
    grade("KP07", 0.05, 0.30),
    grade("KP08", 0.035, 0.55),
    grade("KP09", 0.035, 0.55),
    grade("KP11", 0.03, 0.18),
    grade("KP12", 0.03, 0.18),
    grade("KP13", 0.035, 0.35),
    grade("KP14", 0.04, 0.55),
    grade("KP15", 0.035, 0.50),
    grade("KP16", 0.05, 0.70),
    grade("KP17", 0.035, 0.35),
    grade("KP18", 0.05, 0.75),
    grade("KP20", 0.03, 0.50),
    grade("KP21", 0.03, 0.50),
    grade("KP22", 0.030, 0.50),
    grade("KP23", 0.035, 0.30),
    grade("KP24", 0.035, 0.30),
    grade("KP26", 0.04, 0.60),
    grade("KP27", 0.04, 0.55),
    grade("KP28", 0.04, 0.60),
    grade("KP29", 0.04, 0.20),
    grade("KP30", 0.04, 0.20),
    grade("KP31", 0.03, 0.30),
    grade("KP32", 0.03, 0.30),
    grade("KP33", 0.030, 0.55),
    grade("KP34", 0.035, 0.50),
    grade("KP35", 0.035, 0.50),
    grade("KP36", 0.035, 0.30),
    grade("KP37", 0.05, 0.65),
    grade("KP38", 0.040, 0.50),
    grade("KP39", 0.035, 0.30),
    grade("KP40", 0.05, 0.65),
    grade("KP41", 0.040, 0.50),
    grade("KP42", 0.050, 0.35),
    grade("KP44", 0.05, 0.60),
    grade("KP46", 0.05, 0.50),
    grade("KP47", 0.05, 0.50),
    grade("KP48", 0.035, 0.55),
    grade("KP50", 0.020, 0.20),
    grade("KP51", 0.020, 0.20),
    grade("KP52", 0.040, 0.20),
    grade("KP53", 0.040, 0.20),
    grade("KP54", 0.03, 0.30),
    grade("KP55", 0.03, 0.20),
    grade("KP56", 0.030, 0.20),
    grade("KP57", 0.030, 0.20),
    grade("KP58", 0.025, 0.20),
    grade("KP59", 0.030, 0.30),
    grade("KP61", 0.040, 0.30),
    grade("KP62", 0.040, 0.20),
    grade("KP64", 0.030, 0.20),
    grade("KP66", 0.030, 0.20),
    grade("KP67", 0.040, 0.20),
    grade("KP71", 0.05, 0.65),
    grade("KP72", 0.035, 0.30),
    grade("KP73", 0.05, 0.75),
    grade("KP75", 0.04, 0.20),
    grade("KP77", 0.030, 0.50),
];

pub fn billet_spec(code: &str) -> Option<&'static GradeSpec> {
    let code = code.trim();
    BILLET_SPECS
        .iter()
        .find(|spec| spec.code.eq_ignore_ascii_case(code))
}

pub struct Recipe {
    pub name: &'static str,
    pub mix: &'static [(Material, f64)],
}

pub const SCENARIO_RECIPES: &[Recipe] = &[
    Recipe {
        name: "Energy-Optimized",
        mix: &[
            (Material::CleanBales1, 10.0),
            (Material::CleanBales2, 10.0),
            (Material::Merchant, 40.0),
            (Material::Estructural, 30.0),
            (Material::TinCans, 5.0),
            (Material::Incinerator, 0.0),
            (Material::Fragmentized, 5.0),
            (Material::SteelTurnings, 0.0),
            (Material::ScrapPlateIron, 0.0),
            (Material::RecoveredScrap, 0.0),
        ],
    },
    Recipe {
        name: "Yield-Optimized",
        mix: &[
            (Material::CleanBales1, 8.0),
            (Material::CleanBales2, 12.0),
            (Material::Merchant, 30.0),
            (Material::Estructural, 40.0),
            (Material::TinCans, 8.0),
            (Material::Incinerator, 2.0),
            (Material::Fragmentized, 0.0),
            (Material::SteelTurnings, 0.0),
            (Material::ScrapPlateIron, 0.0),
            (Material::RecoveredScrap, 0.0),
        ],
    },
    Recipe {
        name: "Balanced",
        mix: &[
            (Material::CleanBales1, 9.0),
            (Material::CleanBales2, 11.0),
            (Material::Merchant, 35.0),
            (Material::Estructural, 35.0),
            (Material::TinCans, 6.0),
            (Material::Incinerator, 1.0),
            (Material::Fragmentized, 2.0),
            (Material::SteelTurnings, 1.0),
            (Material::ScrapPlateIron, 0.0),
            (Material::RecoveredScrap, 0.0),
        ],
    },
    Recipe {
        name: "Current Mix",
        mix: &[
            (Material::CleanBales1, 6.0),
            (Material::CleanBales2, 11.0),
            (Material::Merchant, 64.0),
            (Material::Estructural, 45.0),
            (Material::TinCans, 9.0),
            (Material::Incinerator, 0.0),
            (Material::Fragmentized, 19.0),
            (Material::SteelTurnings, 4.0),
            (Material::ScrapPlateIron, 4.0),
            (Material::RecoveredScrap, 2.0),
        ],
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mapping_covers_every_material_in_order() {
        let order: Vec<Material> = MATERIAL_MAPPING.iter().map(|(m, _)| *m).collect();
        assert_eq!(order, Material::ALL.to_vec());
        assert!(descriptions_for(Material::RecoveredScrap).is_empty());
        assert_eq!(fixed_price(Material::RecoveredScrap), Some(124.5));
        assert_eq!(fixed_price(Material::Merchant), None);
    }

    #[test]
    fn grade_lookup_is_case_insensitive() {
        let spec = billet_spec("kp18").expect("KP18 present");
        assert_eq!(spec.cu_max, 0.75);
        assert_eq!(spec.p_max, 0.05);
        assert!(billet_spec("KP99").is_none());
        assert_eq!(BILLET_SPECS.len(), 60);
    }

    #[test]
    fn recipes_are_fixed() {
        let names: Vec<&str> = SCENARIO_RECIPES.iter().map(|r| r.name).collect();
        assert_eq!(
            names,
            vec!["Energy-Optimized", "Yield-Optimized", "Balanced", "Current Mix"]
        );
        let current: f64 = SCENARIO_RECIPES[3].mix.iter().map(|(_, v)| v).sum();
        assert_eq!(current, 164.0);
    }
}
