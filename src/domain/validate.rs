//! Structural validation of rule ASTs.
//!
//! A separate pass from parsing so trees constructed by other means (tests,
//! tooling) can be checked independently. The parser cannot produce most of
//! these malformations, but the AST types can represent them.

use crate::domain::ast::{ActionKind, Expr, IndicatorKind, RuleSet};
use crate::domain::error::RulebenchError;

/// Check a rule AST for structural soundness:
/// - exactly one entry action, at most one exit action, all reachable from
///   the root action list;
/// - boolean positions hold boolean-valued nodes with at least two operands
///   per combinator;
/// - comparison operands are numeric-valued nodes;
/// - indicator parameters are within arity and range.
pub fn validate(rules: &RuleSet) -> Result<(), RulebenchError> {
    let entries = rules
        .actions
        .iter()
        .filter(|a| a.action == ActionKind::Enter)
        .count();
    let exits = rules
        .actions
        .iter()
        .filter(|a| a.action == ActionKind::Exit)
        .count();

    if entries == 0 {
        return Err(structural("rule set has no entry action"));
    }
    if entries > 1 {
        return Err(structural("rule set has more than one entry action"));
    }
    if exits > 1 {
        return Err(structural("rule set has more than one exit action"));
    }

    for action in &rules.actions {
        validate_boolean(&action.condition)?;
    }
    Ok(())
}

fn validate_boolean(expr: &Expr) -> Result<(), RulebenchError> {
    match expr {
        Expr::Comparison { left, right, .. } => {
            validate_numeric(left)?;
            validate_numeric(right)
        }
        Expr::BooleanOp { operands, .. } => {
            if operands.len() < 2 {
                return Err(structural("boolean combinator requires at least 2 operands"));
            }
            for operand in operands {
                validate_boolean(operand)?;
            }
            Ok(())
        }
        Expr::Indicator { .. } | Expr::Constant { .. } => Err(structural(format!(
            "condition must be a comparison, found bare {}",
            expr.node_name()
        ))),
    }
}

fn validate_numeric(expr: &Expr) -> Result<(), RulebenchError> {
    match expr {
        Expr::Indicator { indicator } => match indicator {
            IndicatorKind::Sma { window } | IndicatorKind::Rsi { window } if *window == 0 => {
                Err(structural("indicator window must be at least 1"))
            }
            _ => Ok(()),
        },
        Expr::Constant { value } if !value.is_finite() => {
            Err(structural("constant operand must be finite"))
        }
        Expr::Constant { .. } => Ok(()),
        Expr::Comparison { .. } | Expr::BooleanOp { .. } => Err(structural(format!(
            "comparison operand must be numeric, found {}",
            expr.node_name()
        ))),
    }
}

fn structural(reason: impl Into<String>) -> RulebenchError {
    RulebenchError::Structural {
        reason: reason.into(),
    }
}
