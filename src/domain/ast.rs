//! Rule AST data structures.
//!
//! This module defines the abstract syntax tree for trading rules:
//! - `Expr`: expression nodes (comparisons, boolean combinators, indicators, constants)
//! - `IndicatorKind`: indicator identity + parameters (serves as series-table key)
//! - `Action`/`RuleSet`: entry/exit actions and the rule root
//!
//! `Display` renders the canonical DSL text; re-parsing a rendered rule set
//! reproduces a structurally identical tree. Serialization preserves
//! node-type tags so the tree can cross the HTTP boundary as tagged JSON.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompareOp {
    Gt,
    Lt,
    Ge,
    Le,
    Eq,
    CrossesAbove,
    CrossesBelow,
}

impl CompareOp {
    /// Canonical DSL spelling of the operator.
    pub fn symbol(&self) -> &'static str {
        match self {
            CompareOp::Gt => ">",
            CompareOp::Lt => "<",
            CompareOp::Ge => ">=",
            CompareOp::Le => "<=",
            CompareOp::Eq => "==",
            CompareOp::CrossesAbove => "crosses above",
            CompareOp::CrossesBelow => "crosses below",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoolOp {
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "UPPERCASE")]
pub enum IndicatorKind {
    Sma { window: usize },
    Rsi { window: usize },
    Volume,
    Close,
}

impl IndicatorKind {
    /// Index of the first bar with a defined value.
    ///
    /// SMA needs a full window of closes; RSI needs `window` close-to-close
    /// changes, so one extra bar. VOLUME and CLOSE are ready immediately.
    pub fn first_ready_index(&self) -> usize {
        match self {
            IndicatorKind::Sma { window } => window.saturating_sub(1),
            IndicatorKind::Rsi { window } => *window,
            IndicatorKind::Volume | IndicatorKind::Close => 0,
        }
    }
}

impl fmt::Display for IndicatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorKind::Sma { window } => write!(f, "SMA({})", window),
            IndicatorKind::Rsi { window } => write!(f, "RSI({})", window),
            IndicatorKind::Volume => write!(f, "volume"),
            IndicatorKind::Close => write!(f, "close"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Expr {
    Comparison {
        op: CompareOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    BooleanOp {
        op: BoolOp,
        operands: Vec<Expr>,
    },
    Indicator {
        indicator: IndicatorKind,
    },
    Constant {
        value: f64,
    },
}

impl Expr {
    /// Short node name, used in error messages.
    pub fn node_name(&self) -> &'static str {
        match self {
            Expr::Comparison { .. } => "comparison",
            Expr::BooleanOp { .. } => "boolean combinator",
            Expr::Indicator { .. } => "indicator",
            Expr::Constant { .. } => "constant",
        }
    }

    fn collect_indicators(&self, out: &mut Vec<IndicatorKind>) {
        match self {
            Expr::Comparison { left, right, .. } => {
                left.collect_indicators(out);
                right.collect_indicators(out);
            }
            Expr::BooleanOp { operands, .. } => {
                for operand in operands {
                    operand.collect_indicators(out);
                }
            }
            Expr::Indicator { indicator } => {
                if !out.contains(indicator) {
                    out.push(*indicator);
                }
            }
            Expr::Constant { .. } => {}
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Comparison { op, left, right } => {
                write!(f, "{} {} {}", left, op.symbol(), right)
            }
            Expr::BooleanOp { op, operands } => {
                let connective = match op {
                    BoolOp::And => " and ",
                    BoolOp::Or => " or ",
                };
                for (i, operand) in operands.iter().enumerate() {
                    if i > 0 {
                        f.write_str(connective)?;
                    }
                    // Nested combinators keep explicit parentheses so the
                    // rendering re-parses without ambiguity.
                    if matches!(operand, Expr::BooleanOp { .. }) {
                        write!(f, "({})", operand)?;
                    } else {
                        write!(f, "{}", operand)?;
                    }
                }
                Ok(())
            }
            Expr::Indicator { indicator } => write!(f, "{}", indicator),
            Expr::Constant { value } => write!(f, "{}", value),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Enter,
    Exit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub action: ActionKind,
    pub condition: Expr,
}

/// Root of a parsed rule: the list of entry/exit actions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSet {
    pub actions: Vec<Action>,
}

impl RuleSet {
    pub fn entry(&self) -> Option<&Expr> {
        self.actions
            .iter()
            .find(|a| a.action == ActionKind::Enter)
            .map(|a| &a.condition)
    }

    pub fn exit(&self) -> Option<&Expr> {
        self.actions
            .iter()
            .find(|a| a.action == ActionKind::Exit)
            .map(|a| &a.condition)
    }

    /// All indicator references in the rule, deduplicated, first-seen order.
    pub fn indicators(&self) -> Vec<IndicatorKind> {
        let mut out = Vec::new();
        for action in &self.actions {
            action.condition.collect_indicators(&mut out);
        }
        out
    }
}

impl fmt::Display for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, action) in self.actions.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            let verb = match action.action {
                ActionKind::Enter => "buy",
                ActionKind::Exit => "exit",
            };
            write!(f, "{} when {}.", verb, action.condition)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close() -> Expr {
        Expr::Indicator {
            indicator: IndicatorKind::Close,
        }
    }

    fn constant(value: f64) -> Expr {
        Expr::Constant { value }
    }

    fn above(left: Expr, right: Expr) -> Expr {
        Expr::Comparison {
            op: CompareOp::Gt,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    #[test]
    fn first_ready_index_per_kind() {
        assert_eq!(IndicatorKind::Sma { window: 20 }.first_ready_index(), 19);
        assert_eq!(IndicatorKind::Rsi { window: 14 }.first_ready_index(), 14);
        assert_eq!(IndicatorKind::Volume.first_ready_index(), 0);
        assert_eq!(IndicatorKind::Close.first_ready_index(), 0);
    }

    #[test]
    fn indicator_display() {
        assert_eq!(IndicatorKind::Sma { window: 20 }.to_string(), "SMA(20)");
        assert_eq!(IndicatorKind::Rsi { window: 14 }.to_string(), "RSI(14)");
        assert_eq!(IndicatorKind::Volume.to_string(), "volume");
        assert_eq!(IndicatorKind::Close.to_string(), "close");
    }

    #[test]
    fn indicator_kind_as_table_key() {
        use std::collections::HashMap;

        let mut map = HashMap::new();
        map.insert(IndicatorKind::Sma { window: 20 }, "sma20");
        map.insert(IndicatorKind::Sma { window: 50 }, "sma50");
        map.insert(IndicatorKind::Volume, "vol");

        assert_eq!(map.get(&IndicatorKind::Sma { window: 20 }), Some(&"sma20"));
        assert_eq!(map.get(&IndicatorKind::Sma { window: 50 }), Some(&"sma50"));
        assert_eq!(map.get(&IndicatorKind::Volume), Some(&"vol"));
    }

    #[test]
    fn expr_display_comparison() {
        let expr = above(close(), constant(100.0));
        assert_eq!(expr.to_string(), "close > 100");
    }

    #[test]
    fn expr_display_crosses() {
        let expr = Expr::Comparison {
            op: CompareOp::CrossesAbove,
            left: Box::new(close()),
            right: Box::new(Expr::Indicator {
                indicator: IndicatorKind::Sma { window: 20 },
            }),
        };
        assert_eq!(expr.to_string(), "close crosses above SMA(20)");
    }

    #[test]
    fn expr_display_nested_boolean_parenthesized() {
        let inner = Expr::BooleanOp {
            op: BoolOp::Or,
            operands: vec![
                above(close(), constant(100.0)),
                above(close(), constant(50.0)),
            ],
        };
        let expr = Expr::BooleanOp {
            op: BoolOp::And,
            operands: vec![
                inner,
                above(
                    Expr::Indicator {
                        indicator: IndicatorKind::Volume,
                    },
                    constant(1000.0),
                ),
            ],
        };
        assert_eq!(
            expr.to_string(),
            "(close > 100 or close > 50) and volume > 1000"
        );
    }

    #[test]
    fn ruleset_display() {
        let rules = RuleSet {
            actions: vec![
                Action {
                    action: ActionKind::Enter,
                    condition: above(close(), constant(100.0)),
                },
                Action {
                    action: ActionKind::Exit,
                    condition: Expr::Comparison {
                        op: CompareOp::Lt,
                        left: Box::new(Expr::Indicator {
                            indicator: IndicatorKind::Rsi { window: 14 },
                        }),
                        right: Box::new(constant(30.0)),
                    },
                },
            ],
        };
        assert_eq!(
            rules.to_string(),
            "buy when close > 100. exit when RSI(14) < 30."
        );
    }

    #[test]
    fn entry_and_exit_accessors() {
        let rules = RuleSet {
            actions: vec![Action {
                action: ActionKind::Enter,
                condition: above(close(), constant(1.0)),
            }],
        };
        assert!(rules.entry().is_some());
        assert!(rules.exit().is_none());
    }

    #[test]
    fn indicators_deduplicated_in_order() {
        let sma = Expr::Indicator {
            indicator: IndicatorKind::Sma { window: 20 },
        };
        let rules = RuleSet {
            actions: vec![
                Action {
                    action: ActionKind::Enter,
                    condition: Expr::BooleanOp {
                        op: BoolOp::And,
                        operands: vec![
                            above(close(), sma.clone()),
                            above(
                                Expr::Indicator {
                                    indicator: IndicatorKind::Volume,
                                },
                                constant(1.0),
                            ),
                        ],
                    },
                },
                Action {
                    action: ActionKind::Exit,
                    condition: above(sma.clone(), close()),
                },
            ],
        };
        assert_eq!(
            rules.indicators(),
            vec![
                IndicatorKind::Close,
                IndicatorKind::Sma { window: 20 },
                IndicatorKind::Volume,
            ]
        );
    }

    #[test]
    fn ast_serializes_with_node_type_tags() {
        let expr = above(close(), constant(100.0));
        let json = serde_json::to_value(&expr).unwrap();
        assert_eq!(json["type"], "comparison");
        assert_eq!(json["op"], "gt");
        assert_eq!(json["left"]["type"], "indicator");
        assert_eq!(json["left"]["indicator"]["name"], "CLOSE");
        assert_eq!(json["right"]["type"], "constant");
        assert_eq!(json["right"]["value"], 100.0);
    }

    #[test]
    fn indicator_serializes_with_name_and_params() {
        let kind = IndicatorKind::Sma { window: 20 };
        let json = serde_json::to_value(kind).unwrap();
        assert_eq!(json["name"], "SMA");
        assert_eq!(json["window"], 20);

        let back: IndicatorKind = serde_json::from_value(json).unwrap();
        assert_eq!(back, kind);
    }
}
