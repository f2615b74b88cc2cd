pub mod calc;
pub mod cli;
pub mod core;
pub mod providers;
pub mod server;

use crate::cli::OutputOptions;
use crate::core::config::{AppConfig, BackendConfig};
use crate::core::{Calculator, CalculatorKind};
use crate::providers::{FallbackCalculator, LocalCalculator, RemoteCalculator};
use anyhow::{Result, bail};
use std::path::PathBuf;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub enum AppCommand {
    Calc {
        kind: CalculatorKind,
        pairs: Vec<String>,
        input: Option<PathBuf>,
    },
    Xirr {
        flows: Vec<String>,
        input: Option<PathBuf>,
    },
    Batch {
        file: PathBuf,
    },
    Serve {
        listen: Option<String>,
    },
}

/// Global switches that shape how a command talks to the backend and prints.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    pub offline: bool,
    pub output: OutputOptions,
}

/// The backend first, the in-process calculators when it is unreachable.
pub fn build_calculator(backend: &BackendConfig, offline: bool) -> Box<dyn Calculator> {
    if offline {
        debug!("Offline mode, evaluating locally");
        return Box::new(LocalCalculator);
    }
    match RemoteCalculator::new(backend) {
        Ok(remote) => Box::new(FallbackCalculator::new(remote, LocalCalculator)),
        Err(e) => {
            warn!(error = %e, "Backend client unavailable, evaluating locally");
            Box::new(LocalCalculator)
        }
    }
}

pub async fn run_command(
    cmd: AppCommand,
    config_path: Option<&str>,
    opts: RunOptions,
) -> Result<()> {
    info!("fincalc starting...");

    let config = AppConfig::load_or_default(config_path)?;
    debug!("Loaded config: {config:#?}");
    let symbol = config.currency_symbol.as_str();

    let calculator = || build_calculator(&config.backend, opts.offline);
    let output = match cmd {
        AppCommand::Serve { listen } => {
            let mut server = config.server.clone();
            if let Some(addr) = listen {
                server.listen_addr = addr;
            }
            return server::run(&server).await;
        }
        AppCommand::Calc { kind, pairs, input } => {
            let req = cli::input::build_request(kind, input.as_deref(), &pairs)?;
            cli::calc::run(calculator().as_ref(), &req, symbol, opts.output).await?
        }
        AppCommand::Xirr { flows, input } => {
            let mut cash_flows = match input.as_deref() {
                Some(path) => cli::input::read_cash_flows(path)?,
                None => Vec::new(),
            };
            for arg in &flows {
                cash_flows.push(cli::input::parse_cash_flow(arg)?);
            }
            if cash_flows.is_empty() {
                bail!("No cash flows given; pass DATE:AMOUNT arguments or --input FILE");
            }
            cli::xirr::run(calculator().as_ref(), cash_flows, symbol, opts.output).await?
        }
        AppCommand::Batch { file } => {
            cli::batch::run(calculator().as_ref(), &file, symbol, opts.output).await?
        }
    };

    println!("{output}");
    Ok(())
}
