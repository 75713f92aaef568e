use clap::{Parser, ValueEnum};
use salmon_planner::application::{config_loader, input_loader};
use salmon_planner::infrastructure::logging;
use salmon_planner::{
    AllocationStrategy, JobCompletion, PlanningRequest, PlanningService, PlanningWorker,
    SolverBackend,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "salmon-planner")]
#[command(about = "Shift production planner: raw material to lines, packing areas and box formats")]
#[command(version)]
struct Args {
    /// YAML planning parameters
    #[arg(short, long, value_name = "FILE")]
    config: PathBuf,

    /// CSV with raw units per size class
    #[arg(short, long, value_name = "FILE")]
    availability: PathBuf,

    /// Optional CSV with demand ceilings
    #[arg(short, long, value_name = "FILE")]
    demand: Option<PathBuf>,

    /// Allocation strategy (overrides the configuration)
    #[arg(long)]
    strategy: Option<StrategyArg>,

    /// Engine for the exact strategy (overrides the configuration)
    #[arg(long)]
    backend: Option<BackendArg>,

    /// Solver time limit in seconds
    #[arg(long, value_name = "SECS")]
    time_limit: Option<f64>,

    /// Relative MIP gap at which the solver may stop
    #[arg(long)]
    mip_gap: Option<f64>,

    /// Where solve-failure artifacts are written
    #[arg(long, value_name = "DIR")]
    diagnostics_dir: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum StrategyArg {
    Exact,
    Greedy,
}

#[derive(Clone, Copy, ValueEnum)]
enum BackendArg {
    Auto,
    Highs,
    CoinCbc,
}

impl From<StrategyArg> for AllocationStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Exact => AllocationStrategy::Exact,
            StrategyArg::Greedy => AllocationStrategy::Greedy,
        }
    }
}

impl From<BackendArg> for SolverBackend {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Auto => SolverBackend::Auto,
            BackendArg::Highs => SolverBackend::Highs,
            BackendArg::CoinCbc => SolverBackend::CoinCbc,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    logging::init();

    let mut params = config_loader::load_parameters(&args.config)?;

    let mut settings = params.settings().clone();
    if let Some(strategy) = args.strategy {
        settings.strategy = strategy.into();
    }
    if let Some(backend) = args.backend {
        settings.backend = backend.into();
    }
    if args.time_limit.is_some() {
        settings.time_limit_secs = args.time_limit;
    }
    if args.mip_gap.is_some() {
        settings.mip_gap = args.mip_gap;
    }
    if let Some(dir) = args.diagnostics_dir {
        settings.diagnostics_dir = dir;
    }
    if &settings != params.settings() {
        params = params.with_settings(settings);
    }

    let availability = input_loader::load_availability(&params, &args.availability)?;
    let demand = args
        .demand
        .as_ref()
        .map(|path| input_loader::load_demand(&params, path))
        .transpose()?;

    let service = PlanningService::from_settings(params.settings())?;
    let mut request = PlanningRequest::new(Arc::new(params), availability)?;
    if let Some(demand) = demand {
        request = request.with_demand(demand);
    }

    let worker = PlanningWorker::new(service);
    let token = worker.submit(request);
    info!(%token, "waiting for plan");

    let report = match worker.completion(token).await {
        JobCompletion::Completed(report) => report,
        JobCompletion::Failed(reason) => return Err(reason.into()),
    };

    println!("Strategy: {}  Status: {}", report.strategy, report.status);
    if let Some(objective) = report.objective_value {
        println!("Objective: {:.2}", objective);
    }
    println!();
    println!("{}", report.table);
    println!("{}", report.kpis);
    if !report.notes.is_empty() {
        println!("Notes:");
        for note in &report.notes {
            println!("- {}", note);
        }
    }

    Ok(())
}
