//! The closed error taxonomy (root spec §7).
//!
//! `ErrorKind` enumerates every diagnostic the core can produce. It is
//! intentionally closed (no catch-all variant) so that exhaustive `match`
//! expressions in tests (and in a future code-generation crate reacting to
//! specific kinds) are checked by the compiler.

use std::fmt;

/// A single diagnostic kind, grouped by the taxonomy's four categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    // --- Lexical ---
    UnknownChar,
    BadEscape,
    UnterminatedString,
    NumericOverflow,

    // --- Syntactic ---
    SyntaxError,
    MissingEndKeyword,

    // --- Semantic ---
    NameNotFound,
    DuplicateName,
    CaseClash,
    RecursiveAlias,
    RecursiveTrait,
    MissingBody,
    AmbiguousDelegate,
    AmbiguousDefault,
    MethodSignatureClash,
    DelegateNotProvided,
    FieldNotInit,

    // --- Type ---
    NotASubtype,
    NoSubtypeRelation,
    CapMismatch,
    NotAnLValue,
    ConsumedUse,
    UndefinedUse,
    UnreachableBranch,
    NotPartialButErrors,
    PartialButNeverErrors,
    NoType,
    AmbiguousType,
    FloatAsInt,
    BadTypeArg,
    ConstraintViolation,

    // --- Structural ---
    BadMainCreate,
    BadFinal,
    BadInit,
    BadFFI,

    /// A pass invariant violation caught by the tree checker (a
    /// programming error in the core itself, never something a source
    /// program can trigger) — always fatal.
    InternalError,
}

impl ErrorKind {
    /// Whether this kind is recoverable: the offending subtree is marked
    /// with an `error-type` and the pass continues (root spec §7).
    ///
    /// Only tree-invariant violations caught by `check_tree` and a handful
    /// of truly unrecoverable lexical failures are fatal; everything else
    /// is locally recoverable.
    pub fn is_fatal(self) -> bool {
        matches!(self, ErrorKind::NumericOverflow | ErrorKind::BadFFI | ErrorKind::InternalError)
    }

    /// Short machine-stable name, as it would appear in a structured log
    /// line or a test assertion (`assert_eq!(err.kind(), ErrorKind::...)`).
    pub fn name(self) -> &'static str {
        match self {
            ErrorKind::UnknownChar => "UnknownChar",
            ErrorKind::BadEscape => "BadEscape",
            ErrorKind::UnterminatedString => "UnterminatedString",
            ErrorKind::NumericOverflow => "NumericOverflow",
            ErrorKind::SyntaxError => "SyntaxError",
            ErrorKind::MissingEndKeyword => "MissingEndKeyword",
            ErrorKind::NameNotFound => "NameNotFound",
            ErrorKind::DuplicateName => "DuplicateName",
            ErrorKind::CaseClash => "CaseClash",
            ErrorKind::RecursiveAlias => "RecursiveAlias",
            ErrorKind::RecursiveTrait => "RecursiveTrait",
            ErrorKind::MissingBody => "MissingBody",
            ErrorKind::AmbiguousDelegate => "AmbiguousDelegate",
            ErrorKind::AmbiguousDefault => "AmbiguousDefault",
            ErrorKind::MethodSignatureClash => "MethodSignatureClash",
            ErrorKind::DelegateNotProvided => "DelegateNotProvided",
            ErrorKind::FieldNotInit => "FieldNotInit",
            ErrorKind::NotASubtype => "NotASubtype",
            ErrorKind::NoSubtypeRelation => "NoSubtypeRelation",
            ErrorKind::CapMismatch => "CapMismatch",
            ErrorKind::NotAnLValue => "NotAnLValue",
            ErrorKind::ConsumedUse => "ConsumedUse",
            ErrorKind::UndefinedUse => "UndefinedUse",
            ErrorKind::UnreachableBranch => "UnreachableBranch",
            ErrorKind::NotPartialButErrors => "NotPartialButErrors",
            ErrorKind::PartialButNeverErrors => "PartialButNeverErrors",
            ErrorKind::NoType => "NoType",
            ErrorKind::AmbiguousType => "AmbiguousType",
            ErrorKind::FloatAsInt => "FloatAsInt",
            ErrorKind::BadTypeArg => "BadTypeArg",
            ErrorKind::ConstraintViolation => "ConstraintViolation",
            ErrorKind::BadMainCreate => "BadMainCreate",
            ErrorKind::BadFinal => "BadFinal",
            ErrorKind::BadInit => "BadInit",
            ErrorKind::BadFFI => "BadFFI",
            ErrorKind::InternalError => "InternalError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fatal_kinds_are_a_small_subset() {
        assert!(ErrorKind::NumericOverflow.is_fatal());
        assert!(ErrorKind::BadFFI.is_fatal());
        assert!(ErrorKind::InternalError.is_fatal());
        assert!(!ErrorKind::SyntaxError.is_fatal());
        assert!(!ErrorKind::CapMismatch.is_fatal());
    }

    #[test]
    fn name_round_trips_through_display() {
        assert_eq!(ErrorKind::RecursiveAlias.to_string(), "RecursiveAlias");
        assert_eq!(ErrorKind::CapMismatch.name(), "CapMismatch");
    }
}
