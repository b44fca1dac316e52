//! End-to-end request pipeline: DSL → AST → strategy → backtest → report.
//!
//! One request is one synchronous pipeline; stages run strictly in order
//! and each stage's output is the next stage's sole input. Any stage error
//! is terminal for the request — no partial results, no retries.

use crate::domain::ast::RuleSet;
use crate::domain::bar::Bar;
use crate::domain::codegen;
use crate::domain::engine::{self, RunConfig};
use crate::domain::error::RulebenchError;
use crate::domain::parser;
use crate::domain::python;
use crate::domain::report::Report;
use crate::domain::validate;
use serde::Serialize;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;
use tracing::info;

/// The four response fields of the external contract. `dsl` is the
/// canonical rendering of the parsed AST; `python` is emitted source for
/// audit, never executed here.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineOutput {
    pub dsl: String,
    pub ast: RuleSet,
    pub python: String,
    pub backtest: Report,
}

/// Run the whole pipeline for one rule over one series.
pub fn run(dsl: &str, bars: &[Bar], config: &RunConfig) -> Result<PipelineOutput, RulebenchError> {
    let rules = parser::parse(dsl)?;
    validate::validate(&rules)?;
    let strategy = codegen::generate(&rules)?;
    let python = python::emit(&rules);
    let result = engine::run(&strategy, bars, config)?;
    let report = Report::compute(&result.trades);
    info!(
        trades = report.num_trades,
        total_return_pct = report.total_return_pct,
        "backtest complete"
    );
    Ok(PipelineOutput {
        dsl: rules.to_string(),
        ast: rules,
        python,
        backtest: report,
    })
}

/// Run many DSL variants over one shared read-only series, one worker per
/// variant. Parallelism stays at run granularity — never inside the bar
/// loop — and output order matches input order.
pub fn run_sweep(
    dsls: &[String],
    bars: &[Bar],
    config: &RunConfig,
) -> Vec<Result<PipelineOutput, RulebenchError>> {
    thread::scope(|scope| {
        let handles: Vec<_> = dsls
            .iter()
            .map(|dsl| scope.spawn(move || run(dsl, bars, config)))
            .collect();
        handles
            .into_iter()
            .map(|handle| {
                handle.join().unwrap_or_else(|_| {
                    Err(RulebenchError::Data {
                        reason: "sweep worker panicked".into(),
                    })
                })
            })
            .collect()
    })
}

/// Run the pipeline with a whole-pipeline deadline. On expiry the caller
/// receives `Cancelled` and no partial state: the worker owns every piece
/// of run state and its result is discarded unread.
pub fn run_with_deadline(
    dsl: &str,
    bars: &[Bar],
    config: &RunConfig,
    deadline: Duration,
) -> Result<PipelineOutput, RulebenchError> {
    let (tx, rx) = mpsc::channel();
    let dsl = dsl.to_string();
    let bars = bars.to_vec();
    let config = config.clone();
    thread::spawn(move || {
        let _ = tx.send(run(&dsl, &bars, &config));
    });
    match rx.recv_timeout(deadline) {
        Ok(result) => result,
        Err(_) => Err(RulebenchError::Cancelled {
            deadline_ms: deadline.as_millis() as u64,
        }),
    }
}
