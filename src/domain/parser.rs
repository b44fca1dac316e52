//! Rule DSL lexer and parser.
//!
//! Two stages: a lexer that tokenizes on whitespace and operator symbols
//! (tokens keep their byte offset for caret error display), and a recursive
//! descent parser over the token stream. Keywords are case-insensitive.
//!
//! Grammar notes:
//! - `and`/`or` are left-associative with no precedence between them; a
//!   parenthesis level may chain only one connective kind, and mixing them
//!   is rejected as `AmbiguousExpression` rather than guessed.
//! - Unit suffixes on numbers (`1k`, `1M`) are normalized in the lexer with
//!   exact integer multipliers.
//! - `N-day moving average` is grammar sugar for `SMA(N)`.
//! - `SMA(close, 20)` is accepted alongside `SMA(20)`; the source series
//!   can only be `close`.

use crate::domain::ast::{Action, ActionKind, BoolOp, CompareOp, Expr, IndicatorKind, RuleSet};
use crate::domain::error::ParseError;

#[derive(Debug, Clone, PartialEq)]
enum Tok {
    Word(String),
    Number(f64),
    LParen,
    RParen,
    Comma,
    Hyphen,
    Period,
    Gt,
    Lt,
    Ge,
    Le,
    EqEq,
}

impl Tok {
    fn describe(&self) -> String {
        match self {
            Tok::Word(w) => w.clone(),
            Tok::Number(n) => n.to_string(),
            Tok::LParen => "(".into(),
            Tok::RParen => ")".into(),
            Tok::Comma => ",".into(),
            Tok::Hyphen => "-".into(),
            Tok::Period => ".".into(),
            Tok::Gt => ">".into(),
            Tok::Lt => "<".into(),
            Tok::Ge => ">=".into(),
            Tok::Le => "<=".into(),
            Tok::EqEq => "==".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Token {
    tok: Tok,
    pos: usize,
}

struct Lexer<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.input[self.pos..].chars().nth(offset)
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn lex(mut self) -> Result<Vec<Token>, ParseError> {
        let mut tokens: Vec<Token> = Vec::new();
        loop {
            while self.peek().is_some_and(|c| c.is_whitespace()) {
                self.advance();
            }
            let start = self.pos;
            let Some(ch) = self.peek() else {
                break;
            };

            if ch.is_ascii_digit() || (ch == '.' && self.peek_at(1).is_some_and(|c| c.is_ascii_digit())) {
                tokens.push(Token {
                    tok: self.lex_number(false)?,
                    pos: start,
                });
                continue;
            }

            if ch == '-' {
                let signed = self.peek_at(1).is_some_and(|c| c.is_ascii_digit())
                    && !matches!(tokens.last(), Some(Token { tok: Tok::Number(_), .. }));
                if signed {
                    self.advance();
                    tokens.push(Token {
                        tok: self.lex_number(true)?,
                        pos: start,
                    });
                } else {
                    self.advance();
                    tokens.push(Token {
                        tok: Tok::Hyphen,
                        pos: start,
                    });
                }
                continue;
            }

            if ch.is_alphabetic() || ch == '_' {
                let mut word = String::new();
                while let Some(c) = self.peek() {
                    if c.is_alphanumeric() || c == '_' {
                        word.push(c);
                        self.advance();
                    } else {
                        break;
                    }
                }
                tokens.push(Token {
                    tok: Tok::Word(word),
                    pos: start,
                });
                continue;
            }

            let tok = match ch {
                '(' => {
                    self.advance();
                    Tok::LParen
                }
                ')' => {
                    self.advance();
                    Tok::RParen
                }
                ',' => {
                    self.advance();
                    Tok::Comma
                }
                '.' => {
                    self.advance();
                    Tok::Period
                }
                '>' => {
                    self.advance();
                    if self.peek() == Some('=') {
                        self.advance();
                        Tok::Ge
                    } else {
                        Tok::Gt
                    }
                }
                '<' => {
                    self.advance();
                    if self.peek() == Some('=') {
                        self.advance();
                        Tok::Le
                    } else {
                        Tok::Lt
                    }
                }
                '=' => {
                    self.advance();
                    if self.peek() == Some('=') {
                        self.advance();
                        Tok::EqEq
                    } else {
                        return Err(ParseError::Syntax {
                            message: "expected '==', found single '='".into(),
                            position: start,
                        });
                    }
                }
                other => {
                    return Err(ParseError::Syntax {
                        message: format!("unexpected character '{}'", other),
                        position: start,
                    });
                }
            };
            tokens.push(Token { tok, pos: start });
        }
        Ok(tokens)
    }

    fn lex_number(&mut self, negative: bool) -> Result<Tok, ParseError> {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }
        // A '.' is a decimal point only when a digit follows; otherwise it
        // terminates the clause.
        if self.peek() == Some('.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
            }
        }

        let digits = &self.input[start..self.pos];
        let mut value: f64 = digits.parse().map_err(|_| ParseError::Syntax {
            message: format!("invalid number: {}", digits),
            position: start,
        })?;

        // Exact unit-suffix normalization: part of the grammar, not a
        // heuristic. The suffix must end the token.
        if let Some(suffix) = self.peek() {
            let boundary = !self
                .peek_at(1)
                .is_some_and(|c| c.is_alphanumeric() || c == '_');
            match suffix {
                'k' | 'K' if boundary => {
                    self.advance();
                    value *= 1_000.0;
                }
                'm' | 'M' if boundary => {
                    self.advance();
                    value *= 1_000_000.0;
                }
                _ => {}
            }
        }

        Ok(Tok::Number(if negative { -value } else { value }))
    }
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    input_len: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn current_pos(&self) -> usize {
        self.peek().map(|t| t.pos).unwrap_or(self.input_len)
    }

    fn found(&self) -> String {
        self.peek()
            .map(|t| t.tok.describe())
            .unwrap_or_else(|| "end of input".into())
    }

    fn syntax(&self, message: impl Into<String>) -> ParseError {
        ParseError::Syntax {
            message: message.into(),
            position: self.current_pos(),
        }
    }

    fn peek_keyword(&self, keyword: &str) -> bool {
        matches!(self.peek(), Some(Token { tok: Tok::Word(w), .. }) if w.eq_ignore_ascii_case(keyword))
    }

    fn consume_keyword(&mut self, keyword: &str) -> bool {
        if self.peek_keyword(keyword) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_keyword(&mut self, keyword: &str) -> Result<(), ParseError> {
        if self.consume_keyword(keyword) {
            Ok(())
        } else {
            Err(self.syntax(format!("expected '{}', found '{}'", keyword, self.found())))
        }
    }

    fn expect_tok(&mut self, expected: Tok, what: &str) -> Result<(), ParseError> {
        match self.peek() {
            Some(token) if token.tok == expected => {
                self.pos += 1;
                Ok(())
            }
            _ => Err(self.syntax(format!("expected {}, found '{}'", what, self.found()))),
        }
    }

    fn parse_rules(&mut self) -> Result<RuleSet, ParseError> {
        if self.peek().is_none() {
            return Err(ParseError::Syntax {
                message: "expected rule clause".into(),
                position: 0,
            });
        }
        let mut actions = Vec::new();
        while self.peek().is_some() {
            actions.push(self.parse_clause()?);
        }
        Ok(RuleSet { actions })
    }

    fn parse_clause(&mut self) -> Result<Action, ParseError> {
        let action = if self.consume_keyword("buy") || self.consume_keyword("enter") {
            ActionKind::Enter
        } else if self.consume_keyword("exit") || self.consume_keyword("sell") {
            ActionKind::Exit
        } else {
            return Err(self.syntax(format!(
                "expected 'buy', 'enter', 'sell' or 'exit', found '{}'",
                self.found()
            )));
        };
        self.expect_keyword("when")?;
        let condition = self.parse_expr()?;
        // Clause terminator is optional at end of input.
        if matches!(self.peek(), Some(Token { tok: Tok::Period, .. })) {
            self.pos += 1;
        }
        Ok(Action { action, condition })
    }

    fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        let first = self.parse_term()?;
        let mut operands = vec![first];
        let mut connective: Option<BoolOp> = None;
        loop {
            let op = if self.peek_keyword("and") {
                BoolOp::And
            } else if self.peek_keyword("or") {
                BoolOp::Or
            } else {
                break;
            };
            if connective.is_some_and(|existing| existing != op) {
                return Err(ParseError::AmbiguousExpression {
                    position: self.current_pos(),
                });
            }
            connective = Some(op);
            self.pos += 1;
            operands.push(self.parse_term()?);
        }
        match connective {
            Some(op) => Ok(Expr::BooleanOp { op, operands }),
            None => Ok(operands.remove(0)),
        }
    }

    fn parse_term(&mut self) -> Result<Expr, ParseError> {
        if matches!(self.peek(), Some(Token { tok: Tok::LParen, .. })) {
            self.pos += 1;
            let expr = self.parse_expr()?;
            self.expect_tok(Tok::RParen, "')'")?;
            Ok(expr)
        } else {
            let left = self.parse_operand()?;
            let op = self.parse_compare_op()?;
            let right = self.parse_operand()?;
            Ok(Expr::Comparison {
                op,
                left: Box::new(left),
                right: Box::new(right),
            })
        }
    }

    fn parse_compare_op(&mut self) -> Result<CompareOp, ParseError> {
        let Some(token) = self.peek().cloned() else {
            return Err(self.syntax("expected comparison operator, found end of input"));
        };
        match &token.tok {
            Tok::Gt => {
                self.pos += 1;
                Ok(CompareOp::Gt)
            }
            Tok::Lt => {
                self.pos += 1;
                Ok(CompareOp::Lt)
            }
            Tok::Ge => {
                self.pos += 1;
                Ok(CompareOp::Ge)
            }
            Tok::Le => {
                self.pos += 1;
                Ok(CompareOp::Le)
            }
            Tok::EqEq => {
                self.pos += 1;
                Ok(CompareOp::Eq)
            }
            Tok::Word(w) if w.eq_ignore_ascii_case("is") => {
                self.pos += 1;
                if self.consume_keyword("above") {
                    Ok(CompareOp::Gt)
                } else if self.consume_keyword("below") {
                    Ok(CompareOp::Lt)
                } else {
                    Err(self.syntax(format!(
                        "expected 'above' or 'below' after 'is', found '{}'",
                        self.found()
                    )))
                }
            }
            Tok::Word(w) if w.eq_ignore_ascii_case("above") => {
                self.pos += 1;
                Ok(CompareOp::Gt)
            }
            Tok::Word(w) if w.eq_ignore_ascii_case("below") => {
                self.pos += 1;
                Ok(CompareOp::Lt)
            }
            Tok::Word(w) if w.eq_ignore_ascii_case("crosses") => {
                self.pos += 1;
                if self.consume_keyword("above") {
                    Ok(CompareOp::CrossesAbove)
                } else if self.consume_keyword("below") {
                    Ok(CompareOp::CrossesBelow)
                } else {
                    Err(self.syntax(format!(
                        "expected 'above' or 'below' after 'crosses', found '{}'",
                        self.found()
                    )))
                }
            }
            _ => Err(self.syntax(format!(
                "expected comparison operator, found '{}'",
                self.found()
            ))),
        }
    }

    fn parse_operand(&mut self) -> Result<Expr, ParseError> {
        while self.consume_keyword("the") || self.consume_keyword("a") {}
        let Some(token) = self.peek().cloned() else {
            return Err(self.syntax("expected operand, found end of input"));
        };
        match token.tok {
            Tok::Number(value) => {
                self.pos += 1;
                if self.day_phrase_ahead() {
                    let window = integer_window(value, token.pos)?;
                    self.consume_day_phrase()?;
                    Ok(Expr::Indicator {
                        indicator: IndicatorKind::Sma { window },
                    })
                } else {
                    Ok(Expr::Constant { value })
                }
            }
            Tok::Word(word) => self.parse_indicator_ref(&word, token.pos),
            _ => Err(self.syntax(format!("expected operand, found '{}'", self.found()))),
        }
    }

    fn day_phrase_ahead(&self) -> bool {
        let mut i = self.pos;
        if matches!(self.tokens.get(i), Some(Token { tok: Tok::Hyphen, .. })) {
            i += 1;
        }
        matches!(self.tokens.get(i), Some(Token { tok: Tok::Word(w), .. }) if w.eq_ignore_ascii_case("day"))
    }

    fn consume_day_phrase(&mut self) -> Result<(), ParseError> {
        if matches!(self.peek(), Some(Token { tok: Tok::Hyphen, .. })) {
            self.pos += 1;
        }
        self.expect_keyword("day")?;
        self.expect_keyword("moving")?;
        self.expect_keyword("average")?;
        Ok(())
    }

    fn parse_indicator_ref(&mut self, word: &str, pos: usize) -> Result<Expr, ParseError> {
        self.pos += 1;
        let lower = word.to_ascii_lowercase();
        let is_call = matches!(self.peek(), Some(Token { tok: Tok::LParen, .. }));
        match (lower.as_str(), is_call) {
            ("sma", true) => {
                let window = self.parse_call_window(word)?;
                Ok(Expr::Indicator {
                    indicator: IndicatorKind::Sma { window },
                })
            }
            ("rsi", true) => {
                let window = self.parse_call_window(word)?;
                Ok(Expr::Indicator {
                    indicator: IndicatorKind::Rsi { window },
                })
            }
            ("close", false) => Ok(Expr::Indicator {
                indicator: IndicatorKind::Close,
            }),
            ("volume", false) => Ok(Expr::Indicator {
                indicator: IndicatorKind::Volume,
            }),
            ("close", true) | ("volume", true) => Err(ParseError::Syntax {
                message: format!("'{}' takes no parameter list", word),
                position: pos,
            }),
            (_, true) => Err(ParseError::UnknownIndicator {
                name: word.to_string(),
                position: pos,
            }),
            _ => Err(ParseError::Syntax {
                message: format!("expected operand, found '{}'", word),
                position: pos,
            }),
        }
    }

    fn parse_call_window(&mut self, name: &str) -> Result<usize, ParseError> {
        self.expect_tok(Tok::LParen, "'('")?;
        // The hosted language service emits SMA(close, 20); allow the
        // source-series form but only over closes.
        if let Some(Token { tok: Tok::Word(w), .. }) = self.peek() {
            if w.eq_ignore_ascii_case("close") {
                self.pos += 1;
                self.expect_tok(Tok::Comma, "','")?;
            } else {
                return Err(self.syntax(format!("indicator source must be 'close', found '{}'", w)));
            }
        }
        let window = match self.peek().cloned() {
            Some(Token {
                tok: Tok::Number(v),
                pos,
            }) => {
                self.pos += 1;
                integer_window(v, pos)?
            }
            _ => {
                return Err(self.syntax(format!(
                    "expected window length in {}(...), found '{}'",
                    name,
                    self.found()
                )));
            }
        };
        self.expect_tok(Tok::RParen, "')'")?;
        Ok(window)
    }
}

fn integer_window(value: f64, position: usize) -> Result<usize, ParseError> {
    if value.fract() == 0.0 && value >= 1.0 && value <= u32::MAX as f64 {
        Ok(value as usize)
    } else {
        Err(ParseError::Syntax {
            message: format!("indicator window must be a positive integer, found {}", value),
            position,
        })
    }
}

/// Parse DSL text into a rule AST. Pure and deterministic; no partial AST
/// is ever returned on failure.
pub fn parse(input: &str) -> Result<RuleSet, ParseError> {
    let tokens = Lexer::new(input).lex()?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        input_len: input.len(),
    };
    parser.parse_rules()
}
