//! Strategy lowering and evaluation.
//!
//! `generate` walks a rule AST and lowers it into a predicate IR the
//! backtest engine evaluates bar by bar. Lowering is an exhaustive match
//! over the closed node set; a node with no lowering for its position fails
//! with `UnsupportedConstruct` (the forward-compatibility hook for future
//! DSL features).
//!
//! # Evaluation semantics
//!
//! - Comparisons evaluate at the given bar index; both operands must be
//!   Ready, otherwise the predicate is NotReady.
//! - `crosses above`/`crosses below` need the previous bar: NoFire at
//!   index 0, NotReady while either bar's operands are not Ready.
//! - `and` short-circuits on the first NoFire, `or` on the first Fire, left
//!   operand first. An operand that must be consulted but is NotReady makes
//!   the whole predicate NotReady.

use crate::domain::ast::{BoolOp, CompareOp, Expr, IndicatorKind, RuleSet};
use crate::domain::error::RulebenchError;
use crate::domain::indicator::IndicatorSeries;
use serde::Serialize;
use std::collections::HashMap;

const EPSILON: f64 = 1e-9;

/// Evaluation outcome of one predicate at one bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Fire,
    NoFire,
    NotReady,
}

/// Per-bar signal from a compiled strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    Hold,
    Enter,
    Exit,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ValueNode {
    Indicator(IndicatorKind),
    Constant(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Compare {
        op: CompareOp,
        left: ValueNode,
        right: ValueNode,
    },
    All(Vec<Predicate>),
    Any(Vec<Predicate>),
}

/// The generated strategy artifact: stateless, owned by the engine for the
/// duration of one run.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledStrategy {
    entry: Predicate,
    exit: Option<Predicate>,
    indicators: Vec<IndicatorKind>,
}

impl CompiledStrategy {
    /// Indicator series the engine must precompute before the bar loop.
    pub fn indicators(&self) -> &[IndicatorKind] {
        &self.indicators
    }

    /// Bars required to cover the longest indicator warm-up. Always at
    /// least 1 so an empty series is never runnable.
    pub fn min_bars(&self) -> usize {
        self.indicators
            .iter()
            .map(|k| k.first_ready_index() + 1)
            .max()
            .unwrap_or(1)
            .max(1)
    }

    /// Signal at `index`. Exit is reported preferentially so a bar where
    /// both conditions fire flattens and never round-trips.
    pub fn signal(
        &self,
        tables: &HashMap<IndicatorKind, IndicatorSeries>,
        index: usize,
    ) -> Signal {
        if let Some(exit) = &self.exit {
            if evaluate(exit, tables, index) == Trigger::Fire {
                return Signal::Exit;
            }
        }
        if evaluate(&self.entry, tables, index) == Trigger::Fire {
            return Signal::Enter;
        }
        Signal::Hold
    }
}

/// Lower a rule AST into an executable strategy.
pub fn generate(rules: &RuleSet) -> Result<CompiledStrategy, RulebenchError> {
    let entry_expr = rules.entry().ok_or_else(|| RulebenchError::Structural {
        reason: "rule set has no entry action".into(),
    })?;
    let entry = lower_boolean(entry_expr)?;
    let exit = rules.exit().map(lower_boolean).transpose()?;
    Ok(CompiledStrategy {
        entry,
        exit,
        indicators: rules.indicators(),
    })
}

fn lower_boolean(expr: &Expr) -> Result<Predicate, RulebenchError> {
    match expr {
        Expr::Comparison { op, left, right } => Ok(Predicate::Compare {
            op: *op,
            left: lower_value(left)?,
            right: lower_value(right)?,
        }),
        Expr::BooleanOp { op, operands } => {
            let lowered = operands
                .iter()
                .map(lower_boolean)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(match op {
                BoolOp::And => Predicate::All(lowered),
                BoolOp::Or => Predicate::Any(lowered),
            })
        }
        other => Err(RulebenchError::UnsupportedConstruct {
            construct: format!("{} in condition position", other.node_name()),
        }),
    }
}

fn lower_value(expr: &Expr) -> Result<ValueNode, RulebenchError> {
    match expr {
        Expr::Indicator { indicator } => Ok(ValueNode::Indicator(*indicator)),
        Expr::Constant { value } => Ok(ValueNode::Constant(*value)),
        other => Err(RulebenchError::UnsupportedConstruct {
            construct: format!("{} in operand position", other.node_name()),
        }),
    }
}

fn resolve(
    node: &ValueNode,
    tables: &HashMap<IndicatorKind, IndicatorSeries>,
    index: usize,
) -> Option<f64> {
    match node {
        ValueNode::Constant(v) => Some(*v),
        ValueNode::Indicator(kind) => tables.get(kind)?.at(index).value(),
    }
}

fn compare_static(op: CompareOp, left: f64, right: f64) -> bool {
    match op {
        CompareOp::Gt => left > right,
        CompareOp::Lt => left < right,
        CompareOp::Ge => left >= right,
        CompareOp::Le => left <= right,
        CompareOp::Eq => (left - right).abs() < EPSILON,
        // Cross operators are handled with the previous bar before this
        // point; reaching here would be a lowering bug.
        CompareOp::CrossesAbove | CompareOp::CrossesBelow => false,
    }
}

/// Evaluate a predicate at one bar against precomputed indicator tables.
pub fn evaluate(
    pred: &Predicate,
    tables: &HashMap<IndicatorKind, IndicatorSeries>,
    index: usize,
) -> Trigger {
    match pred {
        Predicate::Compare { op, left, right } => match op {
            CompareOp::CrossesAbove | CompareOp::CrossesBelow => {
                if index == 0 {
                    return Trigger::NoFire;
                }
                let values = (
                    resolve(left, tables, index),
                    resolve(right, tables, index),
                    resolve(left, tables, index - 1),
                    resolve(right, tables, index - 1),
                );
                let (Some(lc), Some(rc), Some(lp), Some(rp)) = values else {
                    return Trigger::NotReady;
                };
                let crossed = match op {
                    CompareOp::CrossesAbove => lc > rc && lp <= rp,
                    _ => lc < rc && lp >= rp,
                };
                if crossed { Trigger::Fire } else { Trigger::NoFire }
            }
            _ => {
                let (Some(l), Some(r)) = (resolve(left, tables, index), resolve(right, tables, index))
                else {
                    return Trigger::NotReady;
                };
                if compare_static(*op, l, r) {
                    Trigger::Fire
                } else {
                    Trigger::NoFire
                }
            }
        },
        Predicate::All(preds) => {
            for p in preds {
                match evaluate(p, tables, index) {
                    Trigger::NoFire => return Trigger::NoFire,
                    Trigger::NotReady => return Trigger::NotReady,
                    Trigger::Fire => {}
                }
            }
            Trigger::Fire
        }
        Predicate::Any(preds) => {
            for p in preds {
                match evaluate(p, tables, index) {
                    Trigger::Fire => return Trigger::Fire,
                    Trigger::NotReady => return Trigger::NotReady,
                    Trigger::NoFire => {}
                }
            }
            Trigger::NoFire
        }
    }
}
