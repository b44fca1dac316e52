//! Domain error types.
//!
//! Every pipeline stage fails with a distinct, user-visible category; no
//! stage collapses its failures into a generic error or returns a partial
//! result alongside one.

/// Errors produced while turning DSL text into an AST.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("parse error at position {position}: {message}")]
    Syntax { message: String, position: usize },

    #[error("unknown indicator '{name}' at position {position}")]
    UnknownIndicator { name: String, position: usize },

    #[error("ambiguous expression at position {position}: mixed 'and'/'or' must be parenthesized")]
    AmbiguousExpression { position: usize },
}

impl ParseError {
    pub fn position(&self) -> usize {
        match self {
            ParseError::Syntax { position, .. }
            | ParseError::UnknownIndicator { position, .. }
            | ParseError::AmbiguousExpression { position } => *position,
        }
    }

    /// Format the error with a caret pointing at the error position in the input.
    pub fn display_with_context(&self, input: &str) -> String {
        let caret = " ".repeat(self.position()) + "^";
        format!(
            "{input}\n{caret}\n{err}",
            input = input,
            caret = caret,
            err = self
        )
    }
}

/// Top-level error type for rulebench.
#[derive(Debug, thiserror::Error)]
pub enum RulebenchError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("invalid rule structure: {reason}")]
    Structural { reason: String },

    #[error("unsupported construct: no lowering for {construct}")]
    UnsupportedConstruct { construct: String },

    #[error("insufficient data: have {bars} bars, need {required} to cover indicator warm-up")]
    InsufficientData { bars: usize, required: usize },

    #[error("language service failed: {reason}")]
    Interpret { reason: String },

    #[error("run cancelled: exceeded deadline of {deadline_ms}ms")]
    Cancelled { deadline_ms: u64 },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&RulebenchError> for std::process::ExitCode {
    fn from(err: &RulebenchError) -> Self {
        let code: u8 = match err {
            RulebenchError::Io(_) => 1,
            RulebenchError::ConfigParse { .. }
            | RulebenchError::ConfigMissing { .. }
            | RulebenchError::ConfigInvalid { .. } => 2,
            RulebenchError::Data { .. } => 3,
            RulebenchError::Parse(_)
            | RulebenchError::Structural { .. }
            | RulebenchError::UnsupportedConstruct { .. } => 4,
            RulebenchError::InsufficientData { .. } => 5,
            RulebenchError::Interpret { .. } => 6,
            RulebenchError::Cancelled { .. } => 7,
        };
        std::process::ExitCode::from(code)
    }
}
