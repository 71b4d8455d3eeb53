#![warn(clippy::all)]
#![allow(clippy::pedantic)]

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use valuator_common::logging::init_logging;
use valuator_common::Validate;
use valuator_core::{EarnoutModel, LinearValuationModel, ValuationCalculator, ValuationError, YearFigures};

use valuator_cli::prompt::amount_or_prompt;
use valuator_cli::{parse_amount_arg, report, Config};

/// Company valuation from EBIT and Revenue.
#[derive(Parser, Debug)]
#[command(name = "valuator")]
#[command(version)]
#[command(about = "Company valuation from EBIT and Revenue.", long_about = None)]
struct Cli {
    /// Path to the config file (default: ~/.valuator/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level override (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Price a company from its EBIT and Revenue
    Price {
        /// EBIT (prompted when omitted)
        #[arg(long, value_parser = parse_amount_arg, allow_negative_numbers = true)]
        ebit: Option<f64>,

        /// Revenue (prompted when omitted)
        #[arg(long, value_parser = parse_amount_arg, allow_negative_numbers = true)]
        revenue: Option<f64>,

        /// Draw the EBIT vs Revenue chart
        #[arg(long)]
        chart: bool,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Describe the model and its weighting bands
    Explain,

    /// Show the reference examples and the derived scale factor
    Reference,

    /// Build a two-year earnout schedule
    Earnout {
        /// Year 1 EBIT
        #[arg(long, value_parser = parse_amount_arg, allow_negative_numbers = true)]
        ebit1: Option<f64>,

        /// Year 1 Revenue
        #[arg(long, value_parser = parse_amount_arg, allow_negative_numbers = true)]
        revenue1: Option<f64>,

        /// Year 2 EBIT
        #[arg(long, value_parser = parse_amount_arg, allow_negative_numbers = true)]
        ebit2: Option<f64>,

        /// Year 2 Revenue
        #[arg(long, value_parser = parse_amount_arg, allow_negative_numbers = true)]
        revenue2: Option<f64>,

        /// Print the schedule as JSON
        #[arg(long)]
        json: bool,
    },

    /// Value a company with the linear regression model
    Linear {
        /// EBIT (prompted when omitted)
        #[arg(long, value_parser = parse_amount_arg)]
        ebit: Option<f64>,

        /// Revenue (prompted when omitted)
        #[arg(long, value_parser = parse_amount_arg)]
        revenue: Option<f64>,

        /// Only print the linear relations table
        #[arg(long)]
        table: bool,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Inspect or create the configuration file
    Config {
        #[command(subcommand)]
        config_command: ConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Print the effective configuration
    Show,
    /// Write the default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the configuration file path
    Path,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {err:#}", console::style("error:").red().bold());
            ExitCode::from(exit_code(&err))
        }
    }
}

/// Bad figures and bad configuration exit with 2, everything else with 1.
///
/// Every [`ValuationError`] is either a rejected figure or a model
/// configuration the calculators cannot use.
fn exit_code(err: &anyhow::Error) -> u8 {
    if err.downcast_ref::<ValuationError>().is_some() {
        return 2;
    }
    if let Some(e) = err.downcast_ref::<valuator_common::Error>() {
        return e.exit_code() as u8;
    }
    1
}

fn run(cli: Cli) -> Result<()> {
    let config_path = Config::resolve_path(cli.config.as_deref());

    // an explicit --config must point at a file, except when creating it
    let creating = matches!(
        cli.command,
        Commands::Config {
            config_command: ConfigCommands::Init { .. } | ConfigCommands::Path
        }
    );
    if cli.config.is_some() && !creating && !config_path.exists() {
        return Err(valuator_common::Error::NotFound(config_path.display().to_string()).into());
    }

    let mut config = Config::load(Some(&config_path))?;
    if let Some(level) = cli.log_level {
        config.observability.log_level = level;
    }

    init_logging(&config.observability.log_level, &config.observability.log_format);

    if let Commands::Config { config_command } = &cli.command {
        return run_config(config_command, &config, &config_path);
    }

    config
        .validate()
        .map_err(valuator_common::Error::from)
        .with_context(|| format!("Invalid configuration in {}", config_path.display()))?;

    let calculator = ValuationCalculator::new(config.model.clone())?;

    match cli.command {
        Commands::Price {
            ebit,
            revenue,
            chart,
            json,
        } => {
            let ebit = amount_or_prompt(ebit, "EBIT", 230.0)?;
            let revenue = amount_or_prompt(revenue, "Revenue", 2300.0)?;
            let chart = chart.then_some(&config.chart);

            tracing::info!(ebit, revenue, "Pricing company");
            let out = if json {
                report::price_json(&calculator, chart, ebit, revenue)?
            } else {
                report::price(&calculator, chart, ebit, revenue)?
            };
            println!("{out}");
        }

        Commands::Explain => println!("{}", report::explain(&calculator)),

        Commands::Reference => println!("{}", report::reference(&calculator)),

        Commands::Earnout {
            ebit1,
            revenue1,
            ebit2,
            revenue2,
            json,
        } => {
            let year1 = YearFigures {
                ebit: amount_or_prompt(ebit1, "Year 1 EBIT", 230.0)?,
                revenue: amount_or_prompt(revenue1, "Year 1 Revenue", 2300.0)?,
            };
            let year2 = YearFigures {
                ebit: amount_or_prompt(ebit2, "Year 2 EBIT", 350.0)?,
                revenue: amount_or_prompt(revenue2, "Year 2 Revenue", 3500.0)?,
            };

            let model = EarnoutModel::new(calculator, config.earnout.clone())?;
            let out = if json {
                report::earnout_json(&model, year1, year2)?
            } else {
                report::earnout(&model, year1, year2)?
            };
            println!("{out}");
        }

        Commands::Linear {
            ebit,
            revenue,
            table,
            json,
        } => {
            let model = LinearValuationModel::new(config.linear.clone())?;
            if table {
                println!("{}", report::relations(&model));
                return Ok(());
            }

            let ebit = amount_or_prompt(ebit, "EBIT", 220.0)?;
            let revenue = amount_or_prompt(revenue, "Revenue", 2200.0)?;
            let out = if json {
                report::linear_json(&model, ebit, revenue)?
            } else {
                report::linear(&model, ebit, revenue)?
            };
            println!("{out}");
        }

        Commands::Config { .. } => {}
    }

    Ok(())
}

fn run_config(command: &ConfigCommands, config: &Config, path: &std::path::Path) -> Result<()> {
    match command {
        ConfigCommands::Show => {
            let out = serde_json::to_string_pretty(config).context("Failed to serialize config")?;
            println!("{out}");
        }
        ConfigCommands::Init { force } => {
            if path.exists() && !force {
                return Err(valuator_common::Error::Config(format!(
                    "{} already exists (use --force to overwrite)",
                    path.display()
                ))
                .into());
            }
            Config::default().save(path)?;
            tracing::info!(path = %path.display(), "Wrote default config");
            println!("Wrote {}", path.display());
        }
        ConfigCommands::Path => println!("{}", path.display()),
    }
    Ok(())
}
