//! The subtype relation on full types (root spec §4.9) plus the
//! reification/deferred-materialization machinery (§4.10).
//!
//! `A <: B` is a pure structural predicate over type subtrees: it reports
//! `true`/`false` and never pushes a diagnostic itself (callers — chiefly
//! the expression typer in `ember-passes` — decide which `ErrorKind` to
//! raise when it returns `false`, since the right message depends on
//! call-site context).

use std::collections::HashSet;

use ember_ast::{NodeArena, NodeId, TokenKind};

use crate::cap::{Cap, Ephemeral};
use crate::shape::*;

/// `A <: B`, by structural case analysis (root spec §4.9).
pub fn is_subtype(arena: &NodeArena, a: NodeId, b: NodeId) -> bool {
    let ka = arena.kind(a);
    let kb = arena.kind(b);

    // Recovery: an already-erroneous subtree is vacuously compatible so
    // downstream checks don't cascade a secondary diagnostic (root spec
    // §7 "Propagation policy").
    if ka == TokenKind::ErrorType || kb == TokenKind::ErrorType {
        return true;
    }
    // `infer` is a placeholder for "not yet known"; treat it as
    // compatible with anything so a single missing annotation doesn't
    // produce a cascade of spurious mismatches elsewhere.
    if ka == TokenKind::InferType || kb == TokenKind::InferType {
        return true;
    }

    // union-on-left: every arm of A must be <: B.
    if ka == TokenKind::Union {
        return arena.children(a).iter().all(|&arm| is_subtype(arena, arm, b));
    }
    // union-on-right: A must be <: some arm of B.
    if kb == TokenKind::Union {
        return arena.children(b).iter().any(|&arm| is_subtype(arena, a, arm));
    }
    // isect-on-left (dual): some conjunct of A is <: B.
    if ka == TokenKind::Isect {
        return arena.children(a).iter().any(|&arm| is_subtype(arena, arm, b));
    }
    // isect-on-right (dual): A must be <: every conjunct of B.
    if kb == TokenKind::Isect {
        return arena.children(b).iter().all(|&arm| is_subtype(arena, a, arm));
    }

    // literal type on the left: always <: any numeric type consistent
    // with its family (full disambiguation is the literal unifier's job;
    // this is the permissive, pre-unification subtype check).
    if ka == TokenKind::LiteralType {
        return literal_compatible_with(arena, a, b);
    }

    // typeparam on the left: check against its constraint, unless both
    // sides name the exact same type parameter (reflexivity).
    if ka == TokenKind::TypeParamRef {
        if kb == TokenKind::TypeParamRef && typeparamref_def(arena, a) == typeparamref_def(arena, b) {
            return cap_ephemeral_compatible(
                typeparamref_cap(arena, a),
                typeparamref_ephemeral(arena, a),
                typeparamref_cap(arena, b),
                typeparamref_ephemeral(arena, b),
            );
        }
        if let Some(def) = typeparamref_def(arena, a) {
            let constraint = typeparam_decl_constraint(arena, def);
            if arena.kind(constraint) != TokenKind::InferType {
                return is_subtype(arena, constraint, b);
            }
        }
        // Unconstrained: per the §4.8 open-question resolution, treated
        // as the constraint's default cap rather than `#any`, so an
        // unconstrained typeparam is *not* vacuously a subtype of an
        // unrelated nominal.
        return false;
    }

    // tuple: pointwise, same arity.
    if ka == TokenKind::Tuple && kb == TokenKind::Tuple {
        let ca = arena.children(a);
        let cb = arena.children(b);
        return ca.len() == cb.len() && ca.iter().zip(cb).all(|(&x, &y)| is_subtype(arena, x, y));
    }

    // arrow: reduce using viewpoint, then compare as a nominal-like type.
    if let (Some(info_a), Some(info_b)) = (effective_type_info(arena, a), effective_type_info(arena, b)) {
        return nominal_like_subtype(arena, &info_a, &info_b);
    }

    false
}

/// `true` iff `target` is a type a numeric literal could plausibly
/// unify with: a nominal type (distinguishing `int`-vs-`float` families
/// by name requires the interner, so the literal unifier in
/// `literal.rs` — which has access to it — owns the precise family
/// check via `uifset`; this predicate stays permissive) or a typeparam
/// whose constraint-set admits numerics.
fn literal_compatible_with(arena: &NodeArena, literal: NodeId, target: NodeId) -> bool {
    let _ = literal_family(arena, literal);
    matches!(arena.kind(target), TokenKind::Nominal | TokenKind::TypeParamRef)
}

fn cap_ephemeral_compatible(cap_a: Cap, eph_a: Ephemeral, cap_b: Cap, eph_b: Ephemeral) -> bool {
    cap_a.sub(cap_b) && eph_a.compatible_as_subtype(eph_b)
}

/// The flattened `(def, cap, ephemeral, typeargs)` view of a type after
/// reducing any enclosing `arrow`s via the viewpoint table (root spec
/// §4.8, §4.9 "arrow: reduce using viewpoint, then compare").
struct EffectiveType {
    def: Option<NodeId>,
    cap: Cap,
    ephemeral: Ephemeral,
    typeargs: Vec<NodeId>,
    /// The AST node the def/typeargs came from — a `Nominal` node, used
    /// for the structural-interface fallback which needs to walk the
    /// *defining entity's* members, not just identity.
    nominal_like: NodeId,
}

fn effective_type_info(arena: &NodeArena, ty: NodeId) -> Option<EffectiveType> {
    match arena.kind(ty) {
        TokenKind::Nominal => Some(EffectiveType {
            def: nominal_def(arena, ty),
            cap: nominal_cap(arena, ty),
            ephemeral: nominal_ephemeral(arena, ty),
            typeargs: nominal_typeargs(arena, ty).to_vec(),
            nominal_like: ty,
        }),
        TokenKind::TypeParamRef => Some(EffectiveType {
            def: typeparamref_def(arena, ty),
            cap: typeparamref_cap(arena, ty),
            ephemeral: typeparamref_ephemeral(arena, ty),
            typeargs: Vec::new(),
            nominal_like: ty,
        }),
        TokenKind::Arrow => {
            let view = arrow_view(arena, ty);
            let target = arrow_target(arena, ty);
            let target_info = effective_type_info(arena, target)?;
            let view_cap = effective_type_info(arena, view).map(|v| v.cap);
            let cap = match view_cap {
                Some(vc) => vc.viewpoint(target_info.cap).unwrap_or(target_info.cap),
                // `this-type` (or anything else whose cap can't be read
                // statically) leaves the target's own cap untouched —
                // the expression typer substitutes a concrete receiver
                // cap before this ever runs in practice.
                None => target_info.cap,
            };
            Some(EffectiveType { cap, ..target_info })
        }
        _ => None,
    }
}

fn nominal_like_subtype(arena: &NodeArena, a: &EffectiveType, b: &EffectiveType) -> bool {
    match (a.def, b.def) {
        (Some(def_a), Some(def_b)) if def_a == def_b => {
            a.typeargs.len() == b.typeargs.len()
                && a.typeargs
                    .iter()
                    .zip(&b.typeargs)
                    .all(|(&x, &y)| type_equal(arena, x, y))
                && cap_ephemeral_compatible(a.cap, a.ephemeral, b.cap, b.ephemeral)
        }
        (Some(def_a), Some(def_b)) => {
            if provides_closure_contains(arena, def_a, def_b) {
                return true;
            }
            if matches!(arena.kind(def_b), TokenKind::Interface) {
                return structural_match(arena, Some(def_a), def_b);
            }
            false
        }
        _ => false,
    }
}

/// Structural equality (not subtyping) of two type subtrees, used for
/// invariant typearg comparison.
pub fn type_equal(arena: &NodeArena, a: NodeId, b: NodeId) -> bool {
    let ka = arena.kind(a);
    let kb = arena.kind(b);
    if ka != kb {
        return false;
    }
    match ka {
        TokenKind::Nominal => {
            nominal_def(arena, a) == nominal_def(arena, b)
                && nominal_cap(arena, a) == nominal_cap(arena, b)
                && nominal_ephemeral(arena, a) == nominal_ephemeral(arena, b)
                && {
                    let ta = nominal_typeargs(arena, a);
                    let tb = nominal_typeargs(arena, b);
                    ta.len() == tb.len() && ta.iter().zip(tb).all(|(&x, &y)| type_equal(arena, x, y))
                }
        }
        TokenKind::TypeParamRef => {
            typeparamref_def(arena, a) == typeparamref_def(arena, b)
                && typeparamref_cap(arena, a) == typeparamref_cap(arena, b)
        }
        TokenKind::Union | TokenKind::Isect | TokenKind::Tuple => {
            let ca = arena.children(a);
            let cb = arena.children(b);
            ca.len() == cb.len() && ca.iter().zip(cb).all(|(&x, &y)| type_equal(arena, x, y))
        }
        TokenKind::Arrow => {
            type_equal(arena, arrow_view(arena, a), arrow_view(arena, b))
                && type_equal(arena, arrow_target(arena, a), arrow_target(arena, b))
        }
        _ => true,
    }
}

/// `true` if `entity`'s transitive provides-closure contains `target`
/// (root spec §4.9 "or A's provides-closure contains a B-compatible
/// entry"). Cycle-safe: the trait flattener already rejects cyclic
/// provides graphs (`RecursiveTrait`), but this helper runs independently
/// of that pass's bookkeeping, so it tracks its own visited set.
fn provides_closure_contains(arena: &NodeArena, entity: NodeId, target: NodeId) -> bool {
    let mut seen = HashSet::new();
    let mut stack = vec![entity];
    while let Some(cur) = stack.pop() {
        if !seen.insert(cur) {
            continue;
        }
        if cur == target {
            return true;
        }
        for &provided in ember_ast::entity::entity_provides(arena, cur) {
            if let Some(def) = nominal_def(arena, provided) {
                stack.push(def);
            }
        }
    }
    false
}

/// Structural (interface-like) subtyping: every method of the
/// `interface` entity must have a subtype counterpart in `def_a`'s
/// members (contravariant params, covariant result, partial ≤ partial).
fn structural_match(arena: &NodeArena, def_a: Option<NodeId>, interface: NodeId) -> bool {
    let Some(def_a) = def_a else { return false };
    for &iface_method in ember_ast::entity::entity_members(arena, interface) {
        if !ember_ast::entity::is_method_kind(arena.kind(iface_method)) {
            continue;
        }
        let found = ember_ast::entity::entity_members(arena, def_a).iter().any(|&m| {
            ember_ast::entity::is_method_kind(arena.kind(m))
                && arena.kind(ember_ast::entity::method_name(arena, m)) == arena.kind(ember_ast::entity::method_name(arena, iface_method))
                && method_signature_compatible(arena, m, iface_method)
        });
        if !found {
            return false;
        }
    }
    true
}

/// `true` if method `m` is a valid override of `required`: contravariant
/// parameters, covariant result (root spec §4.9).
fn method_signature_compatible(arena: &NodeArena, m: NodeId, required: NodeId) -> bool {
    let m_params = ember_ast::entity::method_params(arena, m);
    let r_params = ember_ast::entity::method_params(arena, required);
    if m_params.len() != r_params.len() {
        return false;
    }
    let params_ok = m_params.iter().zip(r_params).all(|(&mp, &rp)| {
        is_subtype(arena, ember_ast::entity::param_type(arena, rp), ember_ast::entity::param_type(arena, mp))
    });
    let result_ok = is_subtype(
        arena,
        ember_ast::entity::method_result(arena, m),
        ember_ast::entity::method_result(arena, required),
    );
    params_ok && result_ok
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_base::Span;

    fn make_numeric_nominal(arena: &mut NodeArena, def: NodeId, cap: Cap) -> NodeId {
        let name = arena.alloc(TokenKind::Identifier(Default::default()), Span::default());
        make_nominal(arena, None, name, vec![], cap, Ephemeral::Normal, Some(def))
    }

    #[test]
    fn subtype_is_reflexive() {
        let mut arena = NodeArena::new();
        let def = arena.alloc(TokenKind::ClassKw, Span::default());
        let t = make_numeric_nominal(&mut arena, def, Cap::Ref);
        assert!(is_subtype(&arena, t, t));
    }

    #[test]
    fn same_def_subtype_respects_cap_order() {
        let mut arena = NodeArena::new();
        let def = arena.alloc(TokenKind::ClassKw, Span::default());
        let iso_t = make_numeric_nominal(&mut arena, def, Cap::Iso);
        let tag_t = make_numeric_nominal(&mut arena, def, Cap::Tag);
        assert!(is_subtype(&arena, iso_t, tag_t));
        assert!(!is_subtype(&arena, tag_t, iso_t));
    }

    #[test]
    fn union_on_left_requires_every_arm() {
        let mut arena = NodeArena::new();
        let def_a = arena.alloc(TokenKind::ClassKw, Span::default());
        let def_b = arena.alloc(TokenKind::ClassKw, Span::default());
        let a = make_numeric_nominal(&mut arena, def_a, Cap::Ref);
        let b = make_numeric_nominal(&mut arena, def_b, Cap::Ref);
        let union = make_list_type(&mut arena, TokenKind::Union, vec![a, b]);
        // union(A,B) <: A is false (B is not <: A)
        assert!(!is_subtype(&arena, union, a));
    }

    #[test]
    fn union_on_right_accepts_any_matching_arm() {
        let mut arena = NodeArena::new();
        let def_a = arena.alloc(TokenKind::ClassKw, Span::default());
        let def_b = arena.alloc(TokenKind::ClassKw, Span::default());
        let a = make_numeric_nominal(&mut arena, def_a, Cap::Ref);
        let b = make_numeric_nominal(&mut arena, def_b, Cap::Ref);
        let union = make_list_type(&mut arena, TokenKind::Union, vec![a, b]);
        assert!(is_subtype(&arena, a, union));
    }

    #[test]
    fn tuple_subtype_is_pointwise() {
        let mut arena = NodeArena::new();
        let def = arena.alloc(TokenKind::ClassKw, Span::default());
        let iso_t = make_numeric_nominal(&mut arena, def, Cap::Iso);
        let tag_t = make_numeric_nominal(&mut arena, def, Cap::Tag);
        let tuple_a = make_list_type(&mut arena, TokenKind::Tuple, vec![iso_t, iso_t]);
        let tuple_b = make_list_type(&mut arena, TokenKind::Tuple, vec![tag_t, tag_t]);
        assert!(is_subtype(&arena, tuple_a, tuple_b));
        assert!(!is_subtype(&arena, tuple_b, tuple_a));
    }

    #[test]
    fn error_type_is_vacuously_compatible() {
        let mut arena = NodeArena::new();
        let def = arena.alloc(TokenKind::ClassKw, Span::default());
        let t = make_numeric_nominal(&mut arena, def, Cap::Ref);
        let err = make_error_type(&mut arena);
        assert!(is_subtype(&arena, err, t));
        assert!(is_subtype(&arena, t, err));
    }

    #[test]
    fn subtype_is_transitive_across_random_chains() {
        let mut arena = NodeArena::new();
        let def = arena.alloc(TokenKind::ClassKw, Span::default());
        let iso_t = make_numeric_nominal(&mut arena, def, Cap::Iso);
        let trn_t = make_numeric_nominal(&mut arena, def, Cap::Trn);
        let tag_t = make_numeric_nominal(&mut arena, def, Cap::Tag);
        assert!(is_subtype(&arena, iso_t, trn_t));
        assert!(is_subtype(&arena, trn_t, tag_t));
        assert!(is_subtype(&arena, iso_t, tag_t));
    }
}
