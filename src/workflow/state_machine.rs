//! Table-driven status transition validation.
//!
//! Each document type supplies its allowed transitions as data; the same
//! evaluator checks purchase orders and goods receipts alike.

use std::fmt::Display;

use crate::errors::ServiceError;

/// Allowed transitions for one document type.
///
/// A status with no entry, or with an empty target list, is terminal.
#[derive(Debug, Clone, Copy)]
pub struct TransitionTable<S: 'static> {
    document: &'static str,
    entries: &'static [(S, &'static [S])],
}

impl<S: Copy + PartialEq + 'static> TransitionTable<S> {
    pub const fn new(document: &'static str, entries: &'static [(S, &'static [S])]) -> Self {
        Self { document, entries }
    }

    pub fn document(&self) -> &'static str {
        self.document
    }

    /// Statuses directly reachable from `from`.
    pub fn allowed_from(&self, from: S) -> &'static [S] {
        self.entries
            .iter()
            .find(|(status, _)| *status == from)
            .map(|(_, targets)| *targets)
            .unwrap_or(&[])
    }

    pub fn is_terminal(&self, status: S) -> bool {
        self.allowed_from(status).is_empty()
    }

    pub fn permits(&self, from: S, to: S) -> bool {
        from == to || self.allowed_from(from).contains(&to)
    }
}

/// A document status governed by a [`TransitionTable`].
pub trait DocumentStatus: Copy + PartialEq + Display + 'static {
    fn transitions() -> &'static TransitionTable<Self>;
}

/// Succeeds iff `new == old` or `new` is directly reachable from `old`.
pub fn validate_transition<S>(old: S, new: S, table: &TransitionTable<S>) -> Result<(), ServiceError>
where
    S: Copy + PartialEq + Display + 'static,
{
    if table.permits(old, new) {
        return Ok(());
    }

    Err(ServiceError::InvalidTransition {
        document: table.document().to_string(),
        from: old.to_string(),
        to: new.to_string(),
        allowed: table
            .allowed_from(old)
            .iter()
            .map(ToString::to_string)
            .collect(),
    })
}
