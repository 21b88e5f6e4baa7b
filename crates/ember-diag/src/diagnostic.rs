//! [`Diagnostic`] records and the [`Errors`] sink that accumulates them.

use ember_base::Span;

use crate::kind::ErrorKind;

/// Diagnostic severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

/// A single diagnostic, optionally chained to related continuations (e.g.
/// "note: the conflicting method is defined here").
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: ErrorKind,
    pub span: Span,
    pub message: String,
    pub continuations: Vec<Continuation>,
}

/// A secondary note attached to a [`Diagnostic`], pointing at a related
/// span (e.g. the other default-body candidate in an `AmbiguousDefault`
/// error).
#[derive(Debug, Clone)]
pub struct Continuation {
    pub span: Span,
    pub message: String,
}

impl Diagnostic {
    pub fn error(kind: ErrorKind, span: Span, message: impl Into<String>) -> Self {
        Diagnostic {
            severity: Severity::Error,
            kind,
            span,
            message: message.into(),
            continuations: Vec::new(),
        }
    }

    pub fn warning(kind: ErrorKind, span: Span, message: impl Into<String>) -> Self {
        Diagnostic {
            severity: Severity::Warning,
            kind,
            span,
            message: message.into(),
            continuations: Vec::new(),
        }
    }

    /// Attaches a continuation note and returns `self`, for fluent
    /// construction at the call site:
    /// `Diagnostic::error(..).with_note(span, "defined here")`.
    pub fn with_note(mut self, span: Span, message: impl Into<String>) -> Self {
        self.continuations.push(Continuation {
            span,
            message: message.into(),
        });
        self
    }

    pub fn is_fatal(&self) -> bool {
        self.severity == Severity::Error && self.kind.is_fatal()
    }
}

/// Accumulates diagnostics across a whole compilation.
///
/// Passed by `&mut` through `compile_program` and every pass; core code
/// never prints directly (root spec §6.4) — it only pushes here. The
/// embedder (external collaborator, §1) decides how to render these.
#[derive(Debug, Default, Clone)]
pub struct Errors {
    diagnostics: Vec<Diagnostic>,
    fatal: bool,
}

impl Errors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a diagnostic. Returns `true` if the diagnostic was fatal
    /// (the caller should abort the current pass chain, per §7's
    /// propagation policy).
    pub fn push(&mut self, diagnostic: Diagnostic) -> bool {
        let fatal = diagnostic.is_fatal();
        if fatal {
            self.fatal = true;
        }
        log::debug!(
            "diagnostic: {:?} {} at {}..{}",
            diagnostic.severity,
            diagnostic.kind,
            diagnostic.span.start,
            diagnostic.span.end
        );
        self.diagnostics.push(diagnostic);
        fatal
    }

    /// `true` if any diagnostic pushed so far was an error (of any kind).
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// `true` if a fatal diagnostic has been pushed; the pass manager
    /// must not run further passes once this is set.
    pub fn is_fatal(&self) -> bool {
        self.fatal
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Returns the diagnostics whose kind matches `kind`, in push order.
    pub fn of_kind(&self, kind: ErrorKind) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(move |d| d.kind == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_tracks_error_presence() {
        let mut errors = Errors::new();
        assert!(!errors.has_errors());
        errors.push(Diagnostic::error(ErrorKind::SyntaxError, Span::new(0, 1), "oops"));
        assert!(errors.has_errors());
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn warnings_do_not_count_as_errors() {
        let mut errors = Errors::new();
        errors.push(Diagnostic::warning(ErrorKind::UnreachableBranch, Span::new(0, 1), "dead code"));
        assert!(!errors.has_errors());
    }

    #[test]
    fn fatal_diagnostic_sets_sink_fatal_flag() {
        let mut errors = Errors::new();
        let was_fatal = errors.push(Diagnostic::error(ErrorKind::NumericOverflow, Span::new(0, 1), "overflow"));
        assert!(was_fatal);
        assert!(errors.is_fatal());
    }

    #[test]
    fn non_fatal_diagnostic_does_not_set_fatal_flag() {
        let mut errors = Errors::new();
        errors.push(Diagnostic::error(ErrorKind::CapMismatch, Span::new(0, 1), "bad cap"));
        assert!(!errors.is_fatal());
    }

    #[test]
    fn of_kind_filters_by_kind() {
        let mut errors = Errors::new();
        errors.push(Diagnostic::error(ErrorKind::RecursiveAlias, Span::new(0, 1), "a"));
        errors.push(Diagnostic::error(ErrorKind::CapMismatch, Span::new(2, 3), "b"));
        errors.push(Diagnostic::error(ErrorKind::RecursiveAlias, Span::new(4, 5), "c"));
        assert_eq!(errors.of_kind(ErrorKind::RecursiveAlias).count(), 2);
    }

    #[test]
    fn with_note_attaches_continuation() {
        let diag = Diagnostic::error(ErrorKind::AmbiguousDefault, Span::new(0, 1), "ambiguous")
            .with_note(Span::new(10, 11), "candidate A")
            .with_note(Span::new(20, 21), "candidate B");
        assert_eq!(diag.continuations.len(), 2);
    }
}
