//! Python source emission for generated strategies.
//!
//! Renders the rule as a self-contained `apply_strategy(df)` function in
//! the hosted product's audit format: pandas boolean series combined with
//! `&`/`|`, indicator helpers `compute_sma`/`compute_rsi` assumed in scope,
//! `shift(1)` for cross detection. The source is returned to the caller for
//! inspection and is never executed by this crate.

use crate::domain::ast::{BoolOp, CompareOp, Expr, IndicatorKind, RuleSet};
use std::fmt::Write;

pub fn emit(rules: &RuleSet) -> String {
    let entry = rules
        .entry()
        .map(expr_to_py)
        .unwrap_or_else(|| "False".to_string());
    let exit = rules
        .exit()
        .map(expr_to_py)
        .unwrap_or_else(|| "False".to_string());

    let mut out = String::with_capacity(256);
    out.push_str("# Generated strategy code\n\n");
    out.push_str("def apply_strategy(df):\n");
    out.push_str("    import pandas as pd\n\n");
    out.push_str("    signals = pd.DataFrame(index=df.index)\n");
    let _ = writeln!(out, "    signals['entry'] = {}", entry);
    let _ = writeln!(out, "    signals['exit'] = {}", exit);
    out.push_str("\n    return signals\n");
    out
}

fn expr_to_py(expr: &Expr) -> String {
    match expr {
        Expr::Comparison {
            op: CompareOp::CrossesAbove,
            left,
            right,
        } => format!(
            "(({l} > {r}) & ({ls} <= {rs}))",
            l = expr_to_py(left),
            r = expr_to_py(right),
            ls = shifted(left),
            rs = shifted(right),
        ),
        Expr::Comparison {
            op: CompareOp::CrossesBelow,
            left,
            right,
        } => format!(
            "(({l} < {r}) & ({ls} >= {rs}))",
            l = expr_to_py(left),
            r = expr_to_py(right),
            ls = shifted(left),
            rs = shifted(right),
        ),
        Expr::Comparison { op, left, right } => format!(
            "({} {} {})",
            expr_to_py(left),
            py_op(*op),
            expr_to_py(right)
        ),
        Expr::BooleanOp { op, operands } => {
            let connective = match op {
                BoolOp::And => " & ",
                BoolOp::Or => " | ",
            };
            let parts: Vec<String> = operands.iter().map(expr_to_py).collect();
            format!("({})", parts.join(connective))
        }
        Expr::Indicator { indicator } => indicator_to_py(indicator),
        Expr::Constant { value } => format!("{}", value),
    }
}

/// Previous-bar rendering of an operand. Series shift; constants don't.
fn shifted(expr: &Expr) -> String {
    match expr {
        Expr::Indicator { .. } => format!("{}.shift(1)", expr_to_py(expr)),
        _ => expr_to_py(expr),
    }
}

fn indicator_to_py(indicator: &IndicatorKind) -> String {
    match indicator {
        IndicatorKind::Sma { window } => format!("compute_sma(df['close'], {})", window),
        IndicatorKind::Rsi { window } => format!("compute_rsi(df['close'], {})", window),
        IndicatorKind::Volume => "df['volume']".to_string(),
        IndicatorKind::Close => "df['close']".to_string(),
    }
}

fn py_op(op: CompareOp) -> &'static str {
    match op {
        CompareOp::Gt => ">",
        CompareOp::Lt => "<",
        CompareOp::Ge => ">=",
        CompareOp::Le => "<=",
        CompareOp::Eq => "==",
        CompareOp::CrossesAbove | CompareOp::CrossesBelow => {
            // Crosses are rendered with shift(1) before reaching here.
            unreachable!("cross operators have a dedicated rendering")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::parser;

    #[test]
    fn emit_sample_rule() {
        let rules = parser::parse(
            "buy when close > SMA(20) and volume > 1000000. exit when RSI(14) < 30.",
        )
        .unwrap();
        let code = emit(&rules);

        assert!(code.contains("def apply_strategy(df):"));
        assert!(code.contains(
            "signals['entry'] = ((df['close'] > compute_sma(df['close'], 20)) & (df['volume'] > 1000000))"
        ));
        assert!(code.contains("signals['exit'] = (compute_rsi(df['close'], 14) < 30)"));
        assert!(code.contains("return signals"));
    }

    #[test]
    fn emit_without_exit_clause() {
        let rules = parser::parse("buy when close > 100").unwrap();
        let code = emit(&rules);
        assert!(code.contains("signals['exit'] = False"));
    }

    #[test]
    fn emit_cross_uses_shift_on_series_only() {
        let rules = parser::parse("buy when close crosses above SMA(50)").unwrap();
        let code = emit(&rules);
        assert!(code.contains(
            "((df['close'] > compute_sma(df['close'], 50)) & \
             (df['close'].shift(1) <= compute_sma(df['close'], 50).shift(1)))"
        ));

        let rules = parser::parse("buy when close crosses above 100").unwrap();
        let code = emit(&rules);
        // The constant side must not grow a .shift(1).
        assert!(code.contains("((df['close'] > 100) & (df['close'].shift(1) <= 100))"));
    }

    #[test]
    fn emit_disjunction_uses_pipe() {
        let rules = parser::parse("buy when close > 100 or volume > 1M").unwrap();
        let code = emit(&rules);
        assert!(code.contains("((df['close'] > 100) | (df['volume'] > 1000000))"));
    }

    #[test]
    fn emit_is_deterministic() {
        let rules = parser::parse("buy when close > 1. exit when close < 1.").unwrap();
        assert_eq!(emit(&rules), emit(&rules));
    }
}
