use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use fincalc::cli::OutputOptions;
use fincalc::core::CalculatorKind;
use fincalc::core::log::init_logging;
use std::path::PathBuf;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    /// Print results as JSON instead of tables
    #[arg(long, global = true)]
    json: bool,

    /// Skip the backend and evaluate locally
    #[arg(long, global = true)]
    offline: bool,

    /// Do not draw the chart under the tables
    #[arg(long, global = true)]
    no_chart: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for fincalc::AppCommand {
    fn from(cmd: Commands) -> fincalc::AppCommand {
        match cmd {
            Commands::Calc { kind, pairs, input } => {
                fincalc::AppCommand::Calc { kind, pairs, input }
            }
            Commands::Xirr { flows, input } => fincalc::AppCommand::Xirr { flows, input },
            Commands::Batch { file } => fincalc::AppCommand::Batch { file },
            Commands::Serve { listen } => fincalc::AppCommand::Serve { listen },
            Commands::Setup | Commands::List => {
                unreachable!("Setup and List are handled separately")
            }
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// List the available calculators
    List,
    /// Run one calculator, e.g. `calc sip sipAmount=5000 returnRate=12 tenureYears=10`
    Calc {
        /// Calculator name, see `list`
        kind: CalculatorKind,
        /// Input fields as key=value
        pairs: Vec<String>,
        /// YAML or JSON file with input fields
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
    /// Analyze dated cash flows, e.g. `xirr 2023-01-01:-10000 2024-01-01:11000`
    Xirr {
        /// Cash flows as DATE:AMOUNT (negative for investments)
        flows: Vec<String>,
        /// YAML or JSON file with cash flows
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
    /// Run a YAML list of named calculations
    Batch { file: PathBuf },
    /// Start the HTTP service
    Serve {
        /// Address to listen on, overrides the config
        #[arg(short, long)]
        listen: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let opts = fincalc::RunOptions {
        offline: cli.offline,
        output: OutputOptions {
            json: cli.json,
            no_chart: cli.no_chart,
        },
    };

    let result = match cli.command {
        Some(Commands::Setup) => fincalc::cli::setup::setup(),
        Some(Commands::List) => {
            for kind in CalculatorKind::ALL {
                println!("{:<18} POST {}", kind.name(), kind.endpoint());
            }
            Ok(())
        }
        Some(cmd) => fincalc::run_command(cmd.into(), cli.config_path.as_deref(), opts).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
