use crate::config;
use crate::models::{Material, MaterialPrice, PriceTable, PriceTransaction, Row};

/// A purchase line read from the price sheet.
#[derive(Debug, Clone, PartialEq)]
struct Purchase {
    description: String,
    net_weight: f64,
    amount: f64,
    date: Option<String>,
}

impl Purchase {
    fn read(row: &Row) -> Self {
        Self {
            description: row.first_text(config::DESCRIPTION_COLUMNS),
            net_weight: row.first_number(config::WEIGHT_COLUMNS),
            amount: row.first_number(config::AMOUNT_COLUMNS),
            date: row
                .get(config::ENTRY_DATE_COLUMN)
                .map(|value| value.to_string()),
        }
    }

    fn is_priced(&self) -> bool {
        self.net_weight > 0.0 && self.amount > 0.0
    }
}

/// First material (in mapping order) whose description fragments match.
pub fn match_material(description: &str) -> Option<Material> {
    config::MATERIAL_MAPPING
        .iter()
        .find(|(_, fragments)| {
            fragments
                .iter()
                .any(|fragment| description.contains(fragment) || *fragment == description)
        })
        .map(|(material, _)| *material)
}

fn absorb(price: MaterialPrice, purchase: Purchase) -> MaterialPrice {
    let total_tonnage = price.total_tonnage + purchase.net_weight;
    let total_cost = price.total_cost + purchase.amount;
    let mut transactions = price.transactions;
    transactions.push(PriceTransaction {
        price_per_ton: purchase.amount / purchase.net_weight * 1000.0,
        description: purchase.description,
        date: purchase.date,
    });

    MaterialPrice {
        price_per_ton: total_cost / total_tonnage * 1000.0,
        samples: price.samples + 1,
        total_tonnage,
        total_cost,
        transactions,
        is_fixed: price.is_fixed,
    }
}

/// Volume-weighted purchase price per material, with fixed-price materials
/// pinned after aggregation.
pub fn calculate_scrap_prices(rows: &[Row]) -> PriceTable {
    let initial: PriceTable = Material::ALL
        .into_iter()
        .map(|material| (material, MaterialPrice::default()))
        .collect();

    let (mut table, unmatched, unpriced) = rows.iter().map(Purchase::read).fold(
        (initial, 0usize, 0usize),
        |(mut table, unmatched, unpriced), purchase| {
            if !purchase.is_priced() {
                return (table, unmatched, unpriced + 1);
            }
            match match_material(&purchase.description) {
                Some(material) => {
                    let current = table.remove(&material).unwrap_or_default();
                    table.insert(material, absorb(current, purchase));
                    (table, unmatched, unpriced)
                }
                None => {
                    log::debug!("no material for description {:?}", purchase.description);
                    (table, unmatched + 1, unpriced)
                }
            }
        },
    );

    for material in Material::ALL {
        if let Some(fixed) = config::fixed_price(material) {
            let entry = table.entry(material).or_default();
            entry.price_per_ton = fixed;
            entry.is_fixed = true;
        }
    }

    let matched: usize = table.values().map(|price| price.samples).sum();
    log::info!(
        "price aggregation: {} transactions matched, {} unmatched, {} without weight/amount",
        matched,
        unmatched,
        unpriced
    );

    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CellValue;

    fn purchase(description: &str, weight: f64, amount: f64) -> Row {
        Row::from_cells([
            ("Entry date", CellValue::Text("2024-01-10".into())),
            ("Material Description", CellValue::Text(description.into())),
            ("Net weight", CellValue::Number(weight)),
            ("Amt.in loc.cur.", CellValue::Number(amount)),
        ])
    }

    #[test]
    fn single_transaction_prices_per_thousand() {
        let table = calculate_scrap_prices(&[purchase("STEEL TURNINGS loose", 1000.0, 50000.0)]);
        let turnings = &table[&Material::SteelTurnings];
        assert_eq!(turnings.price_per_ton, 50000.0);
        assert_eq!(turnings.samples, 1);
        assert_eq!(turnings.total_tonnage, 1000.0);
        assert_eq!(turnings.transactions[0].date.as_deref(), Some("2024-01-10"));
    }

    #[test]
    fn price_is_volume_weighted() {
        let rows = vec![
            purchase("FRAGMENTIZED", 2000.0, 300.0),
            purchase("FRAGMENTIZED grade B", 1000.0, 90.0),
        ];
        let table = calculate_scrap_prices(&rows);
        let frag = &table[&Material::Fragmentized];
        assert!((frag.price_per_ton - 130.0).abs() < 1e-9);
        assert_eq!(frag.samples, 2);
        assert_eq!(frag.transactions[0].price_per_ton, 150.0);
        assert_eq!(frag.transactions[1].price_per_ton, 90.0);
    }

    #[test]
    fn first_mapped_material_wins() {
        // "12A" (Clean Bales 1) and "#2" (Merchant) both match; mapping order decides.
        assert_eq!(match_material("12A #2 mix"), Some(Material::CleanBales1));
        assert_eq!(match_material("N1&2"), Some(Material::Merchant));
        assert_eq!(match_material("copper wire"), None);
    }

    #[test]
    fn recovered_scrap_is_always_fixed() {
        let table = calculate_scrap_prices(&[]);
        let recovered = &table[&Material::RecoveredScrap];
        assert_eq!(recovered.price_per_ton, 124.5);
        assert!(recovered.is_fixed);
        assert_eq!(table.len(), 10);

        let table = calculate_scrap_prices(&[purchase("Recovered Scrap", 1000.0, 999.0)]);
        assert_eq!(table[&Material::RecoveredScrap].price_per_ton, 124.5);
        assert!(table[&Material::RecoveredScrap].is_fixed);
    }

    #[test]
    fn skips_non_positive_lines_and_uses_fallback_columns() {
        let rows = vec![
            purchase("6B", 0.0, 100.0),
            purchase("6B", 100.0, -5.0),
            Row::from_cells([
                ("Material", CellValue::Text("6B".into())),
                ("NetWeight", CellValue::Text("500".into())),
                ("Amount", CellValue::Number(60.0)),
            ]),
        ];
        let table = calculate_scrap_prices(&rows);
        let incinerator = &table[&Material::Incinerator];
        assert_eq!(incinerator.samples, 1);
        assert_eq!(incinerator.price_per_ton, 120.0);
        assert_eq!(incinerator.transactions[0].date, None);
    }
}
