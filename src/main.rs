use std::path::PathBuf;
use std::process::ExitCode;

use chrono::NaiveDate;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use waste_route_planner::config::PlannerConfig;
use waste_route_planner::context::PlanningContext;
use waste_route_planner::error::PlannerError;
use waste_route_planner::output::write_outputs;
use waste_route_planner::planner::plan_day;

/// Plans one day of waste-collection routes for the whole fleet.
#[derive(Debug, Parser)]
#[command(name = "plan-routes", version)]
struct Args {
    /// JSON planner configuration; defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Planning date, YYYY-MM-DD.
    #[arg(long)]
    date: NaiveDate,

    /// Where route files are written; defaults to the data directory.
    #[arg(long)]
    output_dir: Option<PathBuf>,
}

fn run(args: Args) -> Result<(), PlannerError> {
    let config = match &args.config {
        Some(path) => PlannerConfig::from_json_file(path)?,
        None => {
            let config = PlannerConfig::default();
            config.validate()?;
            config
        }
    };

    let context = PlanningContext::load(&config)?;
    let result = plan_day(&context, args.date, &config.simulation);

    let output_dir = args.output_dir.unwrap_or_else(|| config.data.data_dir.clone());
    write_outputs(&output_dir, &result)?;

    info!(
        date = %result.date,
        vehicles = result.active_routes().count(),
        stops = result.total_container_stops(),
        collected_ton = result.summary.collected_ton,
        "done"
    );
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "planning failed");
            ExitCode::FAILURE
        }
    }
}
