use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{NaiveDate, NaiveDateTime};
use clap::{Args, Parser, Subcommand};

mod coefficients;
mod columns;
mod config;
mod cost;
mod dates;
mod ingest;
mod models;
mod prices;
mod production;
mod report;
mod scenarios;
mod session;

use models::Material;
use session::{Analysis, Session};

#[derive(Parser)]
#[command(name = "eaf-optimizer")]
#[command(about = "Scrap mix scenarios for arc furnace production data", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct AnalysisArgs {
    /// Production heats (xlsx, xls, ods or csv)
    #[arg(long)]
    production: PathBuf,
    /// Scrap purchase transactions
    #[arg(long)]
    prices: Option<PathBuf>,
    /// First day of the analysis window (defaults to the earliest heat)
    #[arg(long)]
    start: Option<NaiveDate>,
    /// Last day of the analysis window, inclusive (defaults to the latest heat)
    #[arg(long)]
    end: Option<NaiveDate>,
    /// Billet grade whose Cu/P ceilings scenarios are checked against
    #[arg(long, default_value = config::DEFAULT_GRADE, conflicts_with = "no_grade")]
    grade: String,
    /// Skip the grade compliance check
    #[arg(long)]
    no_grade: bool,
    /// Scenario used for the cost breakdown (defaults to the top-ranked one)
    #[arg(long)]
    scenario: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Rank scenarios and print the cost breakdown
    Score {
        #[command(flatten)]
        analysis: AnalysisArgs,
        /// Emit the full analysis as JSON
        #[arg(long)]
        json: bool,
    },
    /// Generate a markdown report
    Report {
        #[command(flatten)]
        analysis: AnalysisArgs,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// Show which columns the heuristics pick up in a sheet
    Columns {
        #[arg(long)]
        file: PathBuf,
    },
    /// List billet grade ceilings
    Grades,
}

fn midnight(date: NaiveDate) -> Option<NaiveDateTime> {
    date.and_hms_opt(0, 0, 0)
}

async fn build_session(args: &AnalysisArgs) -> anyhow::Result<Session> {
    let mut session = Session::new();
    session.select_grade(if args.no_grade { None } else { Some(&args.grade) })?;

    let load = session
        .load_production_file(&args.production)
        .await
        .context("could not load production data")?;
    if load.removed_by_pon > 0 {
        log::info!(
            "production data loaded: {} of {} records ({} removed by PON min > {})",
            load.kept,
            load.total_before,
            load.removed_by_pon,
            config::PON_MIN_MAX
        );
    } else {
        log::info!(
            "production data loaded: {} of {} records",
            load.kept,
            load.total_before
        );
    }

    if let Some(path) = &args.prices {
        let count = session
            .load_price_file(path)
            .await
            .context("could not load price data")?;
        log::info!("price data loaded: {count} records");
    }

    match (args.start, args.end) {
        (None, None) => session.reset_window(),
        (start, end) => {
            let derived = session.window();
            session.set_window(
                start.and_then(midnight).or(derived.start),
                end.and_then(midnight).or(derived.end),
            );
        }
    }

    Ok(session)
}

fn selected_rollup(
    analysis: &Analysis,
    scenario: Option<&str>,
) -> anyhow::Result<Option<models::CostRollup>> {
    if let Some(name) = scenario {
        if !analysis.scenarios.is_empty() && analysis.scenario(name).is_none() {
            anyhow::bail!("unknown scenario {name:?}");
        }
    }
    Ok(analysis.cost_rollup(scenario))
}

fn print_analysis(analysis: &Analysis, rollup: Option<&models::CostRollup>) {
    println!(
        "Heats analyzed: {} | price records: {}",
        analysis.production_records,
        analysis
            .price_records
            .map_or("n/a".to_string(), |count| count.to_string())
    );

    let Some(calc) = &analysis.calculation else {
        println!("No production heats in the selected window.");
        return;
    };

    println!(
        "Baseline ({}): {:.1} kWh/t, cost {:.2}, yield {:.2}",
        config::BASELINE_MATERIAL,
        calc.baseline.energy,
        calc.baseline.cost,
        calc.baseline.yield_pct
    );

    println!("Scenarios by energy:");
    for scenario in &analysis.scenarios {
        println!(
            "- {} {} kWh/t, yield {:.2}, Cu {:.4}, P {:.4}{}",
            scenario.name,
            scenario.energy_per_ton,
            scenario.yield_pct,
            scenario.estimated_cu,
            scenario.estimated_p,
            if scenario.meets_spec { "" } else { " [off spec]" }
        );
    }

    println!("Material coefficients:");
    for (material, coefficient) in &calc.coefficients {
        println!(
            "- {} energy x{:.3}, cost x{:.3}, yield x{:.3}, weight {:.1}",
            material,
            coefficient.energy_factor,
            coefficient.cost_factor,
            coefficient.yield_factor,
            coefficient.sample_size
        );
    }

    let priced = report::priced_materials(analysis);
    if !priced.is_empty() {
        println!("Scrap prices:");
        for (material, price) in priced {
            println!(
                "- {} {:.2}/t ({} transactions{})",
                material,
                price.price_per_ton,
                price.samples,
                if price.is_fixed { ", fixed" } else { "" }
            );
        }
    }

    if let Some(rollup) = rollup {
        println!(
            "Cost for {}: {:.2}/t over {:.1} t purchased",
            rollup.scenario,
            rollup.cost_per_ton,
            rollup.total_tonnage / 1000.0
        );
    }
}

async fn print_columns(path: &Path) -> anyhow::Result<()> {
    let rows = ingest::read_rows(path).await?;
    let sample = columns::sample_columns(&rows);
    let show = |label: &str, column: Option<String>| {
        println!("{label}: {}", column.as_deref().unwrap_or("(not found)"));
    };

    println!("{} rows, {} columns in first row", rows.len(), sample.len());
    let range = dates::derive_date_range(&rows);
    show("Date", range.column.clone());
    if let (Some(min), Some(max)) = (range.min, range.max) {
        println!("  spans {} to {}", min.date(), max.date());
    }
    show("PON min", columns::pon_column(&sample));
    show("Cu", columns::copper_column(&sample));
    show("P", columns::phosphorus_column(&sample));
    let field = |candidates: &[&str]| {
        candidates
            .iter()
            .find(|name| sample.contains(*name))
            .map(|name| name.to_string())
    };
    show("Energy", field(config::ENERGY_COLUMNS));
    show("Yield", field(config::YIELD_COLUMNS));
    show("Cost", field(config::COST_COLUMNS));
    show("Description", field(config::DESCRIPTION_COLUMNS));
    show("Net weight", field(config::WEIGHT_COLUMNS));
    show("Amount", field(config::AMOUNT_COLUMNS));

    println!("Materials:");
    for status in cost::mapping_status() {
        let column = rows
            .first()
            .and_then(|row| columns::material_column(row, status.material));
        let pricing = match status.fixed_price {
            Some(price) => format!("fixed price {price}"),
            None => format!("{} descriptions", status.descriptions),
        };
        println!(
            "- {}: mix column {}, {}{}",
            status.material,
            column.unwrap_or("(not found)"),
            pricing,
            if status.configured { "" } else { " [unmapped]" }
        );
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Score { analysis, json } => {
            let session = build_session(&analysis).await?;
            let result = session.analyze();
            let rollup = selected_rollup(&result, analysis.scenario.as_deref())?;

            if json {
                let payload = serde_json::json!({
                    "analysis": result,
                    "cost": rollup,
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                print_analysis(&result, rollup.as_ref());
            }
        }
        Commands::Report { analysis, out } => {
            let session = build_session(&analysis).await?;
            let result = session.analyze();
            let rollup = selected_rollup(&result, analysis.scenario.as_deref())?;
            let report = report::build_report(&result, rollup.as_ref());
            tokio::fs::write(&out, report)
                .await
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
        Commands::Columns { file } => {
            print_columns(&file).await?;
        }
        Commands::Grades => {
            println!("Grade  Cu max  P max");
            for spec in config::BILLET_SPECS {
                println!("{:<6} {:<7.2} {:.3}", spec.code, spec.cu_max, spec.p_max);
            }
            let known: Vec<&str> = Material::ALL.iter().map(|m| m.label()).collect();
            println!("Materials: {}", known.join(", "));
        }
    }

    Ok(())
}
