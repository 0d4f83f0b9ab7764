use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;

use sylva::{
    config::Scenario,
    dispatch::Planner,
    growth::HORIZON_YEARS,
    states::GridCell,
};

#[derive(Debug, Parser)]
#[command(author, version, about = "Forest bioeconomy harvest planner")]
struct Cli {
    /// Path to the scenario YAML file
    #[arg(long, default_value = "scenarios/desaa_baseline.yaml")]
    scenario: PathBuf,

    /// Delimited cell table with columns grid_id, x, y, agb_ton_ha
    #[arg(long)]
    cells: PathBuf,

    /// Override the scenario's carbon price ($/tCO2e)
    #[arg(long)]
    carbon_price: Option<f64>,

    /// Override the scenario's random seed
    #[arg(long)]
    seed: Option<u64>,

    /// Where to write the per-cell results JSON
    #[arg(long, default_value = "results/plan.json")]
    output: PathBuf,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut scenario = Scenario::from_yaml(&cli.scenario)
        .with_context(|| format!("loading scenario {}", cli.scenario.display()))?;
    if let Some(price) = cli.carbon_price {
        scenario.prices.carbon_price = price;
    }
    if let Some(seed) = cli.seed {
        scenario.random_seed = seed;
    }
    scenario.validate()?;

    let cells = load_cells(&cli.cells)
        .with_context(|| format!("loading cells from {}", cli.cells.display()))?;

    let planner = Planner::new(scenario.planner_settings())?;
    let outcome = planner.plan(&cells)?;

    if let Some(dir) = cli.output.parent() {
        fs::create_dir_all(dir)?;
    }
    let json = serde_json::to_string_pretty(&outcome.cells)?;
    fs::write(&cli.output, json)?;

    let total_npv: f64 = outcome.cells.iter().map(|c| c.npv).sum();
    let early_harvest = mean_early_harvest(&outcome);
    println!(
        "Scenario '{}' (carbon ${}/tCO2e): {} cells over {} distinct states.",
        scenario.name,
        scenario.prices.carbon_price,
        cells.len(),
        outcome.results.len() + outcome.failed.len(),
    );
    println!(
        "Total NPV ${:.2}, mean year-1..5 harvest {:.1} t/ha. Results written to {}.",
        total_npv,
        early_harvest,
        cli.output.display()
    );
    if !outcome.failed.is_empty() {
        eprintln!(
            "{} state(s) failed to optimize and were left out of the results.",
            outcome.failed.len()
        );
    }
    Ok(())
}

fn mean_early_harvest(outcome: &sylva::dispatch::PlanOutcome) -> f64 {
    if outcome.results.is_empty() {
        return 0.0;
    }
    let window = 5.min(HORIZON_YEARS);
    let sum: f64 = outcome
        .results
        .values()
        .map(|r| r.schedule[..window].iter().sum::<f64>() / window as f64)
        .sum();
    sum / outcome.results.len() as f64
}

/// Reads a tab- or comma-delimited cell table. `grid_id` and `agb_ton_ha`
/// are required; coordinates default to zero when absent.
fn load_cells(path: &Path) -> Result<Vec<GridCell>> {
    let text = fs::read_to_string(path)?;
    let mut lines = text.lines().enumerate();
    let (_, header) = lines.next().context("cell table is empty")?;
    let sep = if header.contains('\t') { '\t' } else { ',' };
    let columns: Vec<&str> = header.split(sep).map(str::trim).collect();

    let column = |name: &str| columns.iter().position(|c| *c == name);
    let id_col = column("grid_id").context("missing column grid_id")?;
    let biomass_col = column("agb_ton_ha").context("missing column agb_ton_ha")?;
    let x_col = column("x");
    let y_col = column("y");

    let mut cells = Vec::new();
    for (number, line) in lines {
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split(sep).map(str::trim).collect();
        let field = |col: usize| {
            fields
                .get(col)
                .copied()
                .with_context(|| format!("line {}: missing field {}", number + 1, col + 1))
        };
        let parse_f64 = |col: usize| -> Result<f64> {
            let raw = field(col)?;
            raw.parse::<f64>()
                .with_context(|| format!("line {}: cannot parse '{raw}' as a number", number + 1))
        };

        let id = field(id_col)?
            .parse::<u64>()
            .with_context(|| format!("line {}: cannot parse grid_id", number + 1))?;
        cells.push(GridCell {
            id,
            x: x_col.map(parse_f64).transpose()?.unwrap_or(0.0),
            y: y_col.map(parse_f64).transpose()?.unwrap_or(0.0),
            biomass: parse_f64(biomass_col)?,
        });
    }
    Ok(cells)
}
