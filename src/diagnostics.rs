//! Problems found while loading a module that did not stop the load.
//!
//! A provider that cannot resolve one type (bad signature blob, index out of range, ...) records
//! a [`Diagnostic`] and keeps going with the rest of the module. The dump pipeline logs every
//! entry as `Loader exception: {diagnostic}` and proceeds with what was resolved.
//!
//! [`Diagnostics`] is backed by `boxcar::Vec`, so entries can be appended from several threads
//! through a shared reference.
//!
//! ```rust
//! use typedump::diagnostics::{DiagnosticCategory, Diagnostics};
//!
//! let diagnostics = Diagnostics::new();
//! diagnostics.error(DiagnosticCategory::Signature, "Bad method signature for 'Update'");
//! assert_eq!(diagnostics.error_count(), 1);
//! ```

use std::fmt;

use crate::token::Token;

/// Severity of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticSeverity {
    /// Unusual but harmless
    Info,
    /// Some data is missing or approximated
    Warning,
    /// A type or member could not be resolved and was dropped
    Error,
}

impl fmt::Display for DiagnosticSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticSeverity::Info => write!(f, "INFO"),
            DiagnosticSeverity::Warning => write!(f, "WARN"),
            DiagnosticSeverity::Error => write!(f, "ERROR"),
        }
    }
}

/// Where in the module a diagnostic originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticCategory {
    /// `#Strings` or `#Blob` heap
    Heap,
    /// Metadata table structure or row content
    Table,
    /// Field, method or type-spec signature blob
    Signature,
    /// Type definition or reference resolution
    Type,
    /// Custom attribute lookup
    CustomAttribute,
    /// Assembly references
    Reference,
    /// Anything else
    General,
}

impl fmt::Display for DiagnosticCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DiagnosticCategory::Heap => "Heap",
            DiagnosticCategory::Table => "Table",
            DiagnosticCategory::Signature => "Signature",
            DiagnosticCategory::Type => "Type",
            DiagnosticCategory::CustomAttribute => "CustomAttribute",
            DiagnosticCategory::Reference => "Reference",
            DiagnosticCategory::General => "General",
        };
        f.write_str(name)
    }
}

/// A single diagnostic entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Severity
    pub severity: DiagnosticSeverity,
    /// Origin
    pub category: DiagnosticCategory,
    /// Human-readable description
    pub message: String,
    /// Token of the affected type or member, if known
    pub token: Option<Token>,
}

impl Diagnostic {
    /// Creates a new diagnostic without a token.
    pub fn new(
        severity: DiagnosticSeverity,
        category: DiagnosticCategory,
        message: impl Into<String>,
    ) -> Self {
        Diagnostic {
            severity,
            category,
            message: message.into(),
            token: None,
        }
    }

    /// Attaches the token of the affected row.
    #[must_use]
    pub fn with_token(mut self, token: Token) -> Self {
        self.token = Some(token);
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.category, self.message)?;
        if let Some(token) = self.token {
            write!(f, " (token: {token})")?;
        }
        Ok(())
    }
}

/// Append-only, thread-safe list of [`Diagnostic`] entries.
#[derive(Debug, Default)]
pub struct Diagnostics {
    entries: boxcar::Vec<Diagnostic>,
}

impl Diagnostics {
    /// Creates an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Diagnostics {
            entries: boxcar::Vec::new(),
        }
    }

    /// Records an informational entry.
    pub fn info(&self, category: DiagnosticCategory, message: impl Into<String>) {
        self.push(Diagnostic::new(DiagnosticSeverity::Info, category, message));
    }

    /// Records a warning.
    pub fn warning(&self, category: DiagnosticCategory, message: impl Into<String>) {
        self.push(Diagnostic::new(
            DiagnosticSeverity::Warning,
            category,
            message,
        ));
    }

    /// Records an error.
    pub fn error(&self, category: DiagnosticCategory, message: impl Into<String>) {
        self.push(Diagnostic::new(
            DiagnosticSeverity::Error,
            category,
            message,
        ));
    }

    /// Records a prepared entry, e.g. one carrying a token.
    pub fn push(&self, diagnostic: Diagnostic) {
        self.entries.push(diagnostic);
    }

    /// Returns `true` if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.count() == 0
    }

    /// Total number of entries.
    #[must_use]
    pub fn count(&self) -> usize {
        self.entries.count()
    }

    /// Number of error entries.
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.iter()
            .filter(|d| d.severity == DiagnosticSeverity::Error)
            .count()
    }

    /// Iterates over all entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter().map(|(_, d)| d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{sync::Arc, thread};

    #[test]
    fn display_with_token() {
        let diag = Diagnostic::new(
            DiagnosticSeverity::Error,
            DiagnosticCategory::Signature,
            "Bad field signature for 'speed'",
        )
        .with_token(Token::new(0x04000003));

        assert_eq!(
            diag.to_string(),
            "[ERROR] Signature: Bad field signature for 'speed' (token: 0x04000003)"
        );
    }

    #[test]
    fn counts() {
        let diagnostics = Diagnostics::new();
        assert!(diagnostics.is_empty());

        diagnostics.info(DiagnosticCategory::Reference, "UnityEngine resolved");
        diagnostics.warning(DiagnosticCategory::Heap, "String index out of range");
        diagnostics.error(DiagnosticCategory::Type, "Type 0x02000004 dropped");

        assert_eq!(diagnostics.count(), 3);
        assert_eq!(diagnostics.error_count(), 1);
        assert_eq!(
            diagnostics.iter().map(|d| d.category).collect::<Vec<_>>(),
            vec![
                DiagnosticCategory::Reference,
                DiagnosticCategory::Heap,
                DiagnosticCategory::Type
            ]
        );
    }

    #[test]
    fn concurrent_appends() {
        let diagnostics = Arc::new(Diagnostics::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let diagnostics = Arc::clone(&diagnostics);
                thread::spawn(move || {
                    diagnostics.warning(DiagnosticCategory::General, format!("worker {i}"));
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(diagnostics.count(), 8);
    }
}
