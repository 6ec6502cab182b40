use anyhow::{Context, Result};
use barsim::prelude::*;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "barsim")]
#[command(about = "A bar-driven multi-timeframe backtest simulator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    //run a backtest from a json configuration
    Run {
        //path to the json configuration
        #[arg(long)]
        config: PathBuf,

        //overrides
        //path to csv data file
        #[arg(long)]
        data: Option<PathBuf>,

        //starting cash
        #[arg(long)]
        cash: Option<f64>,

        //commission rate on traded value
        #[arg(long)]
        commission: Option<f64>,

        //contract multiplier
        #[arg(long)]
        mult: Option<f64>,

        //output path for closed trades csv
        #[arg(long)]
        output_trades_csv: Option<PathBuf>,

        //log level (error, warn, info, debug, trace)
        #[arg(long, default_value = "info")]
        log_level: String,
    },

    //write the default configuration to a file
    InitConfig {
        path: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            data,
            cash,
            commission,
            mult,
            output_trades_csv,
            log_level,
        } => {
            init_logging(&log_level)?;

            let mut configuration = BacktestConfiguration::from_json_file(&config)?;
            if let Some(data) = data {
                configuration.data_path = data;
            }
            if let Some(cash) = cash {
                configuration.run.starting_cash = cash;
            }
            if let Some(rate) = commission {
                configuration.run.commission.rate = rate;
            }
            if let Some(multiplier) = mult {
                configuration.run.commission.multiplier = multiplier;
            }
            if output_trades_csv.is_some() {
                configuration.output_trades_csv = output_trades_csv;
            }

            run_backtest(configuration)?;
        }
        Commands::InitConfig { path } => {
            BacktestConfiguration::default().to_json_file(&path)?;
            println!("Default configuration written to {:?}", path);
        }
    }

    Ok(())
}

fn init_logging(level: &str) -> Result<()> {
    let level: Level = level
        .parse()
        .context(format!("Invalid log level '{}'", level))?;
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .init();
    Ok(())
}

fn run_backtest(configuration: BacktestConfiguration) -> Result<()> {
    let data_path = &configuration.data_path;

    //load data
    info!(path = %data_path.display(), "loading data");
    let bars = load_csv(data_path, &configuration.csv)
        .context(format!("Failed to load data from {:?}", data_path))?;

    let (Some(first), Some(last)) = (bars.first(), bars.last()) else {
        anyhow::bail!("No bars found in {:?}", data_path);
    };
    info!(bars = bars.len(), from = %first.timestamp, to = %last.timestamp, "data loaded");

    let mut strategy = configuration.strategy.build();
    let mut simulator = Simulator::new(configuration.run.clone())?;

    println!("Starting Portfolio Value: {:.2}", configuration.run.starting_cash);
    let result = simulator
        .run(strategy.as_mut(), bars)
        .context("Backtest aborted")?;

    println!("Backtest Results");
    println!("================\n");
    RunSummary::from_result(&result).pretty_print_table();

    //save outputs if requested
    if let Some(trades_path) = &configuration.output_trades_csv {
        write_trades_csv(&result.trades, trades_path)?;
        println!("Trades saved to {:?}", trades_path);
    }

    Ok(())
}
