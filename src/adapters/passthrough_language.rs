//! Passthrough language adapter.
//!
//! Treats the request text as already-formed DSL. This is the bundled
//! default; a hosted deployment swaps in an adapter that calls a real
//! language-understanding service behind the same port.

use crate::domain::error::RulebenchError;
use crate::ports::language_port::LanguagePort;

pub struct PassthroughInterpreter;

impl LanguagePort for PassthroughInterpreter {
    fn interpret(&self, text: &str) -> Result<String, RulebenchError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(RulebenchError::Interpret {
                reason: "empty rule text".into(),
            });
        }
        Ok(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passes_text_through_trimmed() {
        let dsl = PassthroughInterpreter
            .interpret("  buy when close > 100  ")
            .unwrap();
        assert_eq!(dsl, "buy when close > 100");
    }

    #[test]
    fn rejects_empty_text() {
        let err = PassthroughInterpreter.interpret("   ").unwrap_err();
        assert!(matches!(err, RulebenchError::Interpret { .. }));
    }
}
