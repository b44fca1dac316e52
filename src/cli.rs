//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use crate::adapters::csv_data::CsvBarSource;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::sample_data::SampleBarSource;
use crate::domain::bar::Bar;
use crate::domain::engine::RunConfig;
use crate::domain::error::RulebenchError;
use crate::domain::{parser, pipeline, python, validate};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;

#[derive(Parser, Debug)]
#[command(name = "rulebench", about = "Trading-rule DSL compiler and backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Parse a rule and print its AST as JSON
    Parse { rule: String },
    /// Parse a rule and print the emitted Python strategy source
    Generate { rule: String },
    /// Compile a rule and backtest it over CSV or the built-in sample data
    Backtest {
        rule: String,
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(short, long)]
        data: Option<PathBuf>,
        #[arg(long)]
        capital: Option<f64>,
    },
    /// Start the HTTP server exposing POST /api/groq
    #[cfg(feature = "web")]
    Serve {
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Parse { rule } => run_parse(&rule),
        Command::Generate { rule } => run_generate(&rule),
        Command::Backtest {
            rule,
            config,
            data,
            capital,
        } => run_backtest(&rule, config.as_ref(), data, capital),
        #[cfg(feature = "web")]
        Command::Serve { config } => run_serve(config.as_ref()),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(&err)
        }
    }
}

/// Parse with caret context on stderr so the offending token is visible.
fn parse_rule(rule: &str) -> Result<crate::domain::ast::RuleSet, RulebenchError> {
    parser::parse(rule).map_err(|e| {
        eprintln!("{}", e.display_with_context(rule));
        RulebenchError::Parse(e)
    })
}

fn to_pretty_json<T: serde::Serialize>(value: &T) -> Result<String, RulebenchError> {
    serde_json::to_string_pretty(value).map_err(|e| RulebenchError::Data {
        reason: format!("serialization failed: {}", e),
    })
}

fn run_parse(rule: &str) -> Result<(), RulebenchError> {
    let ast = parse_rule(rule)?;
    validate::validate(&ast)?;
    println!("{}", to_pretty_json(&ast)?);
    Ok(())
}

fn run_generate(rule: &str) -> Result<(), RulebenchError> {
    let ast = parse_rule(rule)?;
    validate::validate(&ast)?;
    print!("{}", python::emit(&ast));
    Ok(())
}

fn run_backtest(
    rule: &str,
    config: Option<&PathBuf>,
    data: Option<PathBuf>,
    capital: Option<f64>,
) -> Result<(), RulebenchError> {
    let config_adapter = config.map(load_config).transpose()?;
    let run_config = build_run_config(config_adapter.as_ref(), capital);
    let bars = load_bars(data, config_adapter.as_ref())?;

    let output = pipeline::run(rule, &bars, &run_config).map_err(|e| {
        if let RulebenchError::Parse(parse_err) = &e {
            eprintln!("{}", parse_err.display_with_context(rule));
        }
        e
    })?;
    println!("{}", to_pretty_json(&output)?);
    Ok(())
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, RulebenchError> {
    FileConfigAdapter::from_file(path).map_err(|e| RulebenchError::ConfigParse {
        file: path.display().to_string(),
        reason: e.to_string(),
    })
}

fn build_run_config(config: Option<&FileConfigAdapter>, capital: Option<f64>) -> RunConfig {
    let defaults = RunConfig::default();
    let mut run_config = match config {
        Some(cfg) => RunConfig {
            initial_capital: cfg.get_double("backtest", "initial_capital", defaults.initial_capital),
            fee_rate: cfg.get_double("backtest", "fee_rate", defaults.fee_rate),
            slippage_pct: cfg.get_double("backtest", "slippage_pct", defaults.slippage_pct),
        },
        None => defaults,
    };
    if let Some(capital) = capital {
        run_config.initial_capital = capital;
    }
    run_config
}

fn load_bars(
    data: Option<PathBuf>,
    config: Option<&FileConfigAdapter>,
) -> Result<Vec<Bar>, RulebenchError> {
    if let Some(path) = data {
        return CsvBarSource::new(path).fetch_bars();
    }
    if let Some(path) = config.and_then(|cfg| cfg.get_string("data", "csv")) {
        return CsvBarSource::new(PathBuf::from(path)).fetch_bars();
    }
    SampleBarSource.fetch_bars()
}

#[cfg(feature = "web")]
fn run_serve(config: Option<&PathBuf>) -> Result<(), RulebenchError> {
    use crate::adapters::passthrough_language::PassthroughInterpreter;
    use crate::adapters::web::{AppState, build_router};
    use std::sync::Arc;

    let config_adapter = config.map(load_config).transpose()?;
    let bind = config_adapter
        .as_ref()
        .and_then(|cfg| cfg.get_string("server", "bind"))
        .unwrap_or_else(|| "127.0.0.1:3000".to_string());
    let run_config = build_run_config(config_adapter.as_ref(), None);
    let bars = load_bars(None, config_adapter.as_ref())?;

    let state = AppState {
        language: Arc::new(PassthroughInterpreter),
        bars: Arc::new(bars),
        run_config,
    };
    let router = build_router(state);

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async move {
        let listener = tokio::net::TcpListener::bind(&bind).await?;
        tracing::info!(%bind, "listening");
        axum::serve(listener, router).await
    })?;
    Ok(())
}
