//! The literal unifier (component M, root spec §4.11): resolves a
//! numeric literal's transient `literal(int|float)` type to exactly one
//! concrete numeric type, once enough control-flow context has
//! accumulated to constrain it.

use std::collections::BTreeSet;

use ember_diag::{Diagnostic, ErrorKind, Errors};

use ember_ast::{NodeArena, NodeId, TokenKind};
use ember_base::Span;

use crate::shape::{literal_family, make_nominal, nominal_def, LiteralFamily};
use crate::cap::{Cap, Ephemeral};

/// The unconstrained-interchange-format set a type contributes to literal
/// resolution (root spec §4.11 "`uifset`"): either a fixed set of
/// concrete numeric definitions (a nominal type contributes its own
/// singleton; an already-combined union/isect contributes more), or a
/// set derived from a typeparam's constraint — kept separate because
/// "mixing a formal parameter with a concrete UIF is forbidden".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UifSet {
    Concrete(BTreeSet<NodeId>),
    Formal(BTreeSet<NodeId>),
}

impl UifSet {
    fn defs(&self) -> &BTreeSet<NodeId> {
        match self {
            UifSet::Concrete(s) | UifSet::Formal(s) => s,
        }
    }

    fn is_formal(&self) -> bool {
        matches!(self, UifSet::Formal(_))
    }

    fn rewrap(&self, defs: BTreeSet<NodeId>) -> UifSet {
        match self {
            UifSet::Concrete(_) => UifSet::Concrete(defs),
            UifSet::Formal(_) => UifSet::Formal(defs),
        }
    }
}

/// Looks up the family (`int`/`float`) of a numeric nominal type's
/// defining entity. `ember-types` doesn't own the built-in numeric
/// entity table (that lives in the scope builder's prelude, per root
/// spec §4.4), so callers supply it.
pub trait NumericFamilyOracle {
    fn family_of(&self, def: NodeId) -> Option<LiteralFamily>;
}

/// Computes the `uifset` contribution of a single type (root spec
/// §4.11): a nominal numeric type's singleton, a typeparam's constrained
/// set, or the recursive combination for `union`/`isect`. `None` if `ty`
/// doesn't constrain a numeric literal at all (e.g. a non-numeric
/// nominal, `infer-type`).
pub fn uifset(arena: &NodeArena, oracle: &dyn NumericFamilyOracle, ty: NodeId) -> Option<UifSet> {
    match arena.kind(ty) {
        TokenKind::Nominal => {
            let def = nominal_def(arena, ty)?;
            oracle.family_of(def)?;
            Some(UifSet::Concrete(BTreeSet::from([def])))
        }
        TokenKind::TypeParamRef => {
            let def = crate::shape::typeparamref_def(arena, ty)?;
            let constraint = crate::shape::typeparam_decl_constraint(arena, def);
            if arena.kind(constraint) == TokenKind::InferType {
                return None;
            }
            let inner = uifset(arena, oracle, constraint)?;
            Some(UifSet::Formal(inner.defs().clone()))
        }
        TokenKind::Isect => combine(arena, oracle, arena.children(ty), Combine::Restrict),
        TokenKind::Union => combine(arena, oracle, arena.children(ty), Combine::Broaden),
        _ => None,
    }
}

enum Combine {
    Restrict,
    Broaden,
}

fn combine(arena: &NodeArena, oracle: &dyn NumericFamilyOracle, members: &[NodeId], how: Combine) -> Option<UifSet> {
    let mut acc: Option<UifSet> = None;
    for &m in members {
        let next = uifset(arena, oracle, m)?;
        acc = Some(match acc {
            None => next,
            Some(prev) => {
                if prev.is_formal() != next.is_formal() {
                    // "mixing a formal parameter with a concrete UIF is
                    // forbidden" — signalled by returning an empty set,
                    // which resolves to `NoType`/`AmbiguousType` upstream
                    // rather than silently picking a side.
                    return Some(UifSet::Concrete(BTreeSet::new()));
                }
                let combined = match how {
                    Combine::Restrict => prev.defs().intersection(next.defs()).copied().collect(),
                    Combine::Broaden => prev.defs().union(next.defs()).copied().collect(),
                };
                prev.rewrap(combined)
            }
        });
    }
    acc
}

/// Why a literal failed to resolve (root spec §4.11).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LiteralError {
    NoType,
    AmbiguousType(Vec<NodeId>),
    FloatAsInt(NodeId),
}

/// Resolves a literal's family against the `uifset`s of its collected
/// branch target types, choosing exactly one numeric definition.
pub fn resolve(
    arena: &NodeArena,
    oracle: &dyn NumericFamilyOracle,
    literal_family_kind: LiteralFamily,
    branch_targets: &[NodeId],
) -> Result<NodeId, LiteralError> {
    let mut acc: Option<UifSet> = None;
    for &target in branch_targets {
        let Some(set) = uifset(arena, oracle, target) else {
            continue;
        };
        acc = Some(match acc {
            None => set,
            Some(prev) => {
                if prev.is_formal() != set.is_formal() {
                    UifSet::Concrete(BTreeSet::new())
                } else {
                    let combined: BTreeSet<NodeId> = prev.defs().union(set.defs()).copied().collect();
                    prev.rewrap(combined)
                }
            }
        });
    }

    let Some(set) = acc else {
        return Err(LiteralError::NoType);
    };
    let defs = set.defs();
    match defs.len() {
        0 => Err(LiteralError::NoType),
        1 => {
            let def = *defs.iter().next().unwrap();
            if literal_family_kind == LiteralFamily::Float && oracle.family_of(def) == Some(LiteralFamily::Int) {
                Err(LiteralError::FloatAsInt(def))
            } else {
                Ok(def)
            }
        }
        _ => Err(LiteralError::AmbiguousType(defs.iter().copied().collect())),
    }
}

/// Full unification: resolves `literal` and, on success, rewrites its
/// type slot to the chosen nominal type (root spec §4.11 "rewrite the
/// literal's type slot"). On failure, pushes the matching diagnostic and
/// leaves the literal's type slot untouched.
pub fn unify_literal(
    arena: &mut NodeArena,
    errors: &mut Errors,
    oracle: &dyn NumericFamilyOracle,
    literal: NodeId,
    name: NodeId,
    span: Span,
    branch_targets: &[NodeId],
) {
    let family = literal_family(arena, literal);
    match resolve(arena, oracle, family, branch_targets) {
        Ok(def) => {
            let resolved = make_nominal(arena, None, name, Vec::new(), Cap::Val, Ephemeral::Normal, Some(def));
            arena.set_type(literal, resolved);
        }
        Err(LiteralError::NoType) => {
            errors.push(Diagnostic::error(ErrorKind::NoType, span, "literal has no constraining numeric type"));
        }
        Err(LiteralError::AmbiguousType(_)) => {
            errors.push(Diagnostic::error(
                ErrorKind::AmbiguousType,
                span,
                "literal is constrained to more than one numeric type",
            ));
        }
        Err(LiteralError::FloatAsInt(_)) => {
            errors.push(Diagnostic::error(
                ErrorKind::FloatAsInt,
                span,
                "float literal cannot resolve to an integer-only type",
            ));
        }
    }
}
