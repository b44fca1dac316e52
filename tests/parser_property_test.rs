//! Property tests for the parser.
//!
//! The central invariant: rendering any structurally valid AST to canonical
//! DSL and parsing it back yields the identical tree.

use proptest::prelude::*;
use rulebench::domain::ast::{Action, ActionKind, BoolOp, CompareOp, Expr, IndicatorKind, RuleSet};
use rulebench::domain::parser;

fn indicator_kind() -> impl Strategy<Value = IndicatorKind> {
    prop_oneof![
        (1usize..60).prop_map(|window| IndicatorKind::Sma { window }),
        (1usize..60).prop_map(|window| IndicatorKind::Rsi { window }),
        Just(IndicatorKind::Volume),
        Just(IndicatorKind::Close),
    ]
}

// Quarter-step constants survive the f64 Display round trip exactly.
fn constant() -> impl Strategy<Value = Expr> {
    (-4_000_000i64..=4_000_000).prop_map(|v| Expr::Constant {
        value: v as f64 / 4.0,
    })
}

fn operand() -> impl Strategy<Value = Expr> {
    prop_oneof![
        indicator_kind().prop_map(|indicator| Expr::Indicator { indicator }),
        constant(),
    ]
}

fn compare_op() -> impl Strategy<Value = CompareOp> {
    prop_oneof![
        Just(CompareOp::Gt),
        Just(CompareOp::Lt),
        Just(CompareOp::Ge),
        Just(CompareOp::Le),
        Just(CompareOp::Eq),
        Just(CompareOp::CrossesAbove),
        Just(CompareOp::CrossesBelow),
    ]
}

fn comparison() -> impl Strategy<Value = Expr> {
    (operand(), compare_op(), operand()).prop_map(|(left, op, right)| Expr::Comparison {
        op,
        left: Box::new(left),
        right: Box::new(right),
    })
}

fn bool_op() -> impl Strategy<Value = BoolOp> {
    prop_oneof![Just(BoolOp::And), Just(BoolOp::Or)]
}

/// Comparisons, flat combinators, and one level of nesting.
fn condition() -> impl Strategy<Value = Expr> {
    let flat = (bool_op(), prop::collection::vec(comparison(), 2..4))
        .prop_map(|(op, operands)| Expr::BooleanOp { op, operands });
    let nested = (
        bool_op(),
        prop::collection::vec(
            prop_oneof![
                comparison(),
                (bool_op(), prop::collection::vec(comparison(), 2..3))
                    .prop_map(|(op, operands)| Expr::BooleanOp { op, operands }),
            ],
            2..4,
        ),
    )
        .prop_map(|(op, operands)| Expr::BooleanOp { op, operands });
    prop_oneof![comparison(), flat, nested]
}

fn rule_set() -> impl Strategy<Value = RuleSet> {
    (condition(), prop::option::of(condition())).prop_map(|(entry, exit)| {
        let mut actions = vec![Action {
            action: ActionKind::Enter,
            condition: entry,
        }];
        if let Some(condition) = exit {
            actions.push(Action {
                action: ActionKind::Exit,
                condition,
            });
        }
        RuleSet { actions }
    })
}

proptest! {
    #[test]
    fn canonical_rendering_round_trips(rules in rule_set()) {
        let rendered = rules.to_string();
        let reparsed = parser::parse(&rendered)
            .unwrap_or_else(|e| panic!("rendering {:?} failed to parse: {}", rendered, e));
        prop_assert_eq!(&rules, &reparsed);

        // Rendering is a fixed point: a second round trip changes nothing.
        prop_assert_eq!(rendered, reparsed.to_string());
    }

    #[test]
    fn parsing_never_panics_on_arbitrary_text(input in "\\PC{0,80}") {
        let _ = parser::parse(&input);
    }
}
