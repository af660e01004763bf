//! Label table: name -> byte offset from the image's start.
//!
//! Backed by [`indexmap::IndexMap`] rather than a `HashMap` so that
//! diagnostics which must enumerate labels (none currently do, but the
//! `-l`/`--labels` CLI flag does) report them in declaration order instead
//! of an arbitrary hash order.

use indexmap::IndexMap;

use crate::error::{AsmError, Span};

#[derive(Debug, Default)]
pub struct SymbolTable {
    offsets: IndexMap<String, i64>,
    first_definition: IndexMap<String, Span>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a label's existence (before any offset is known) so forward
    /// references resolve to a placeholder during early fixed-point
    /// iterations instead of failing as undefined.
    pub fn declare(&mut self, name: &str, span: Span) -> Result<(), AsmError> {
        if let Some(first) = self.first_definition.get(name) {
            return Err(AsmError::name_resolution(
                format!(
                    "label '{name}' redefined (first defined at {}:{})",
                    first.line, first.col
                ),
                span,
            ));
        }
        self.first_definition.insert(name.to_string(), span);
        self.offsets.insert(name.to_string(), 0);
        Ok(())
    }

    pub fn set(&mut self, name: &str, offset: i64) {
        self.offsets.insert(name.to_string(), offset);
    }

    pub fn get(&self, name: &str) -> Option<i64> {
        self.offsets.get(name).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> {
        self.offsets.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn as_map(&self) -> IndexMap<String, i64> {
        self.offsets.clone()
    }
}
