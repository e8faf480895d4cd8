use cflp::parse::{parse_open_facilities, InputFiles};
use cflp::problem::Variant;
use cflp::solver::{MicrolpSolver, SolverConfig};
use cflp::CflpSolver;
use clap::{ArgEnum, ErrorKind, Parser};
use env_logger::Env;
use log::{error, info};
use std::path::PathBuf;
use std::time::Duration;

#[derive(ArgEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum Engine {
    /// Pure Rust branch and bound, always available
    Microlp,
    /// Gurobi, needs the `gurobi` feature and a licence
    Gurobi,
}

/// Capacitated facility location: decide which facilities to open and how to route
/// products from plants through them to customers
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Cli {
    /// Demand of every product by every customer (customers x products)
    #[clap(parse(from_os_str))]
    demand: PathBuf,
    /// Capacity of every product at every plant (plants x products)
    #[clap(parse(from_os_str))]
    plant_capacity: PathBuf,
    /// Minimum activity level of every facility
    #[clap(parse(from_os_str))]
    min_activity: PathBuf,
    /// Maximum activity level of every facility
    #[clap(parse(from_os_str))]
    max_activity: PathBuf,
    /// Fixed cost of opening every facility
    #[clap(parse(from_os_str))]
    fixed_cost: PathBuf,
    /// Marginal cost per unit at every facility
    #[clap(parse(from_os_str))]
    marginal_cost: PathBuf,
    /// Unit transportation cost of every product
    #[clap(parse(from_os_str))]
    transport_cost: PathBuf,
    /// Distance from every plant to every facility (plants x facilities)
    #[clap(parse(from_os_str))]
    plant_distance: PathBuf,
    /// Distance from every facility to every customer (facilities x customers)
    #[clap(parse(from_os_str))]
    customer_distance: PathBuf,
    /// Number of facilities to open
    #[clap(allow_hyphen_values = true)]
    open_facilities: String,
    /// `single` (one facility per customer) or `divisible` (demand may be split)
    variant: String,

    /// The MILP engine
    #[clap(long, arg_enum, default_value = "microlp")]
    engine: Engine,
    /// Stop the solve after this many seconds
    #[clap(long)]
    time_limit: Option<f64>,
    /// Stop the solve at this relative optimality gap
    #[clap(long)]
    mip_gap: Option<f64>,
    /// Number of threads the engine may use
    #[clap(long)]
    threads: Option<usize>,
    /// Show the engine's own progress log
    #[clap(long)]
    solver_output: bool,
    /// Print the report as JSON
    #[clap(long)]
    json: bool,
    /// Build the model and print its size instead of solving it
    #[clap(long)]
    dry_run: bool,
}

impl Cli {
    fn input_files(&self) -> InputFiles {
        InputFiles {
            demand: self.demand.clone(),
            plant_capacity: self.plant_capacity.clone(),
            min_activity: self.min_activity.clone(),
            max_activity: self.max_activity.clone(),
            fixed_cost: self.fixed_cost.clone(),
            marginal_cost: self.marginal_cost.clone(),
            transport_cost: self.transport_cost.clone(),
            plant_distance: self.plant_distance.clone(),
            customer_distance: self.customer_distance.clone(),
        }
    }

    fn solver_config(&self) -> Result<SolverConfig, String> {
        let time_limit = match self.time_limit {
            Some(secs) if !secs.is_finite() || secs < 0.0 => {
                return Err(format!("invalid time limit {}", secs))
            }
            Some(secs) => Some(Duration::from_secs_f64(secs)),
            None => None,
        };
        if let Some(gap) = self.mip_gap {
            if !(0.0..=1.0).contains(&gap) {
                return Err(format!("invalid MIP gap {}, expected a fraction", gap));
            }
        }

        Ok(SolverConfig {
            time_limit,
            mip_gap: self.mip_gap,
            threads: self.threads,
            solver_output: self.solver_output,
        })
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let files = cli.input_files();
    files.check_exist()?;

    let open_facilities = parse_open_facilities(&cli.open_facilities)?;
    let variant: Variant = cli.variant.parse()?;
    let config = cli.solver_config()?;

    let data = files.load(open_facilities)?;
    info!(
        "Loaded {} products, {} plants, {} facilities and {} customers, opening {}",
        data.products(),
        data.plants(),
        data.facilities(),
        data.customers(),
        data.open_facilities()
    );

    if cli.dry_run {
        let stats = CflpSolver::dry_run(&data, variant)?;
        match cli.json {
            true => println!("{}", serde_json::to_string_pretty(&stats)?),
            false => println!("{}", stats),
        }
        return Ok(());
    }

    let report = match cli.engine {
        Engine::Microlp => CflpSolver::solve::<MicrolpSolver>(&data, variant, &config)?,
        #[cfg(feature = "gurobi")]
        Engine::Gurobi => {
            CflpSolver::solve::<cflp::solver::GurobiSolver>(&data, variant, &config)?
        }
        #[cfg(not(feature = "gurobi"))]
        Engine::Gurobi => {
            return Err(cflp::solver::SolverError::Unsupported(
                "this binary was built without the gurobi feature",
            )
            .into())
        }
    };

    match cli.json {
        true => println!("{}", serde_json::to_string_pretty(&report)?),
        false => print!("{}", report),
    }

    Ok(())
}

pub fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            err.exit()
        }
        Err(err) => {
            error!("{}", err);
            std::process::exit(1);
        }
    };

    if let Err(err) = run(&cli) {
        error!("{}", err);
        std::process::exit(1);
    }
}
