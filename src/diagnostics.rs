//! Non-fatal warning collection shared by the translation pipeline.
//!
//! All pipeline stages (lexer, parser, validator, transformer) push
//! warnings into a single [`Diagnostics`] sink that travels with the
//! translation. Warnings never abort a translation; fatal conditions are
//! [`crate::error::TranslateError`] values instead.

use tracing::warn;

/// The query clause a diagnostic refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Clause {
    Select,
    Where,
    OrderBy,
    Join,
}

impl Clause {
    pub fn as_str(&self) -> &'static str {
        match self {
            Clause::Select => "SELECT",
            Clause::Where => "WHERE",
            Clause::OrderBy => "ORDER BY",
            Clause::Join => "JOIN",
        }
    }
}

/// Accumulates user-facing warnings for one translation.
#[derive(Debug, Default)]
pub struct Diagnostics {
    warnings: Vec<String>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a warning and mirror it to the tracing subscriber.
    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        warn!(target: "squery_sql", "{}", message);
        self.warnings.push(message);
    }

    /// Record a warning prefixed with the clause it occurred in.
    pub fn warn_in(&mut self, clause: Clause, message: impl AsRef<str>) {
        self.warn(format!("{}: {}", clause.as_str(), message.as_ref()));
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn into_warnings(self) -> Vec<String> {
        self.warnings
    }
}
