//! The type assembler (component H, root spec §4.7): builds `union`/
//! `isect`/`tuple`/`arrow` type subtrees in normalized form so the rest
//! of the compiler never has to re-simplify a type it's handed.

use ember_ast::{NodeArena, NodeId, TokenKind};

use crate::shape::*;
use crate::subtype::{is_subtype, type_equal};

/// `union(A, B)`: if `A <: B` return `B`, if `B <: A` return `A`;
/// otherwise a flattened union with no nested unions and no duplicates
/// up to `<:` (root spec §4.7).
pub fn union(arena: &mut NodeArena, a: NodeId, b: NodeId) -> NodeId {
    if is_subtype(arena, a, b) {
        return b;
    }
    if is_subtype(arena, b, a) {
        return a;
    }
    let mut arms = Vec::new();
    flatten_into(arena, TokenKind::Union, a, &mut arms);
    flatten_into(arena, TokenKind::Union, b, &mut arms);
    dedup_by_subtype(arena, &mut arms);
    build_list(arena, TokenKind::Union, arms)
}

/// `isect(A, B)`: the dual of [`union`].
pub fn isect(arena: &mut NodeArena, a: NodeId, b: NodeId) -> NodeId {
    if is_subtype(arena, a, b) {
        return a;
    }
    if is_subtype(arena, b, a) {
        return b;
    }
    let mut arms = Vec::new();
    flatten_into(arena, TokenKind::Isect, a, &mut arms);
    flatten_into(arena, TokenKind::Isect, b, &mut arms);
    dedup_by_subtype(arena, &mut arms);
    build_list(arena, TokenKind::Isect, arms)
}

/// Builds a `tuple` type, collapsing a one-element tuple to its sole
/// member (root spec §4.7).
pub fn tuple(arena: &mut NodeArena, members: Vec<NodeId>) -> NodeId {
    if members.len() == 1 {
        return members[0];
    }
    make_list_type(arena, TokenKind::Tuple, members)
}

/// `arrow(arrow(a,b), c) = arrow(a, viewpoint(b,c))`: right-associative
/// viewpoint composition (root spec §4.7). Folds any chain of nested
/// arrows on the view side down to a single `arrow` node.
pub fn arrow(arena: &mut NodeArena, view: NodeId, target: NodeId) -> NodeId {
    if arena.kind(view) == TokenKind::Arrow {
        let inner_view = arrow_view(arena, view);
        let inner_target = arrow_target(arena, view);
        let composed_target = arrow(arena, inner_target, target);
        return arrow(arena, inner_view, composed_target);
    }
    make_arrow(arena, view, target)
}

/// Flattens `node` into `out` if it is a list of `kind`, otherwise
/// pushes `node` itself as a single arm.
fn flatten_into(arena: &NodeArena, kind: TokenKind, node: NodeId, out: &mut Vec<NodeId>) {
    if arena.kind(node) == kind {
        for &child in arena.children(node) {
            flatten_into(arena, kind, child, out);
        }
    } else {
        out.push(node);
    }
}

/// Removes arms that are structurally equal, or subsumed by another arm
/// under `<:` — "no duplicates up to `<:`" (root spec §4.7).
fn dedup_by_subtype(arena: &NodeArena, arms: &mut Vec<NodeId>) {
    let mut kept: Vec<NodeId> = Vec::new();
    'outer: for &arm in arms.iter() {
        for &k in kept.iter() {
            if type_equal(arena, arm, k) || is_subtype(arena, arm, k) {
                continue 'outer;
            }
            if is_subtype(arena, k, arm) {
                // `arm` is broader; it supersedes the kept one.
                let idx = kept.iter().position(|&x| x == k).unwrap();
                kept[idx] = arm;
                continue 'outer;
            }
        }
        kept.push(arm);
    }
    *arms = kept;
}

fn build_list(arena: &mut NodeArena, kind: TokenKind, mut arms: Vec<NodeId>) -> NodeId {
    if arms.len() == 1 {
        return arms.remove(0);
    }
    make_list_type(arena, kind, arms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cap::{Cap, Ephemeral};
    use ember_base::Span;

    fn numeric(arena: &mut NodeArena, def: NodeId, cap: Cap) -> NodeId {
        let name = arena.alloc(TokenKind::Identifier(Default::default()), Span::default());
        make_nominal(arena, None, name, vec![], cap, Ephemeral::Normal, Some(def))
    }

    #[test]
    fn union_of_related_types_collapses_to_the_wider_one() {
        let mut arena = NodeArena::new();
        let def = arena.alloc(TokenKind::ClassKw, Span::default());
        let iso_t = numeric(&mut arena, def, Cap::Iso);
        let tag_t = numeric(&mut arena, def, Cap::Tag);
        let u = union(&mut arena, iso_t, tag_t);
        assert_eq!(u, tag_t);
    }

    #[test]
    fn union_of_unrelated_types_builds_a_flat_union() {
        let mut arena = NodeArena::new();
        let def_a = arena.alloc(TokenKind::ClassKw, Span::default());
        let def_b = arena.alloc(TokenKind::ClassKw, Span::default());
        let a = numeric(&mut arena, def_a, Cap::Ref);
        let b = numeric(&mut arena, def_b, Cap::Ref);
        let u = union(&mut arena, a, b);
        assert_eq!(arena.kind(u), TokenKind::Union);
        assert_eq!(arena.children(u).len(), 2);
    }

    #[test]
    fn nested_unions_flatten() {
        let mut arena = NodeArena::new();
        let def_a = arena.alloc(TokenKind::ClassKw, Span::default());
        let def_b = arena.alloc(TokenKind::ClassKw, Span::default());
        let def_c = arena.alloc(TokenKind::ClassKw, Span::default());
        let a = numeric(&mut arena, def_a, Cap::Ref);
        let b = numeric(&mut arena, def_b, Cap::Ref);
        let c = numeric(&mut arena, def_c, Cap::Ref);
        let ab = union(&mut arena, a, b);
        let abc = union(&mut arena, ab, c);
        assert_eq!(arena.kind(abc), TokenKind::Union);
        assert_eq!(arena.children(abc).len(), 3);
    }

    #[test]
    fn single_element_tuple_collapses() {
        let mut arena = NodeArena::new();
        let def = arena.alloc(TokenKind::ClassKw, Span::default());
        let t = numeric(&mut arena, def, Cap::Ref);
        assert_eq!(tuple(&mut arena, vec![t]), t);
    }

    #[test]
    fn multi_element_tuple_stays_a_tuple() {
        let mut arena = NodeArena::new();
        let def = arena.alloc(TokenKind::ClassKw, Span::default());
        let t = numeric(&mut arena, def, Cap::Ref);
        let tup = tuple(&mut arena, vec![t, t]);
        assert_eq!(arena.kind(tup), TokenKind::Tuple);
    }

    #[test]
    fn nested_arrows_compose_right_associatively() {
        let mut arena = NodeArena::new();
        let def = arena.alloc(TokenKind::ClassKw, Span::default());
        let a = numeric(&mut arena, def, Cap::Iso);
        let b = numeric(&mut arena, def, Cap::Trn);
        let c = numeric(&mut arena, def, Cap::Ref);
        let inner = arrow(&mut arena, a, b);
        let composed = arrow(&mut arena, inner, c);
        // arrow(arrow(a,b), c) must reduce to a single arrow node, not a
        // nested one.
        assert_eq!(arena.kind(composed), TokenKind::Arrow);
        assert_eq!(arrow_view(&arena, composed), a);
        assert_ne!(arrow_target(&arena, composed), c);
    }
}
