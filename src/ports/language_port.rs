//! Language-understanding port trait.
//!
//! The natural-language interpretation step (free text → DSL string) is a
//! dynamic, opaque collaborator. Its whole contract is "given free text,
//! return a DSL string or fail"; provider internals stay on the other side
//! of this trait.

use crate::domain::error::RulebenchError;

pub trait LanguagePort {
    fn interpret(&self, text: &str) -> Result<String, RulebenchError>;
}
