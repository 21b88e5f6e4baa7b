//! Canonical child-layout conventions for type subtrees (root spec §3.4).
//!
//! Types are themselves AST subtrees (no separate "Type" struct hierarchy,
//! per root spec §9 "Polymorphism") — this module is the single place
//! that knows which child index means what for each type-node `kind`, so
//! the rest of `ember-types` reads/writes types through named accessors
//! instead of scattering magic child indices everywhere.

use ember_ast::{NodeArena, NodeData, NodeId, TokenKind};
use ember_base::Span;

use crate::cap::{Cap, Ephemeral};

/// Allocates a cap-marker leaf node for `cap`.
pub fn build_cap_marker(arena: &mut NodeArena, cap: Cap) -> NodeId {
    arena.alloc(cap.to_token(), Span::default())
}

/// Allocates an ephemeral-marker leaf node: `^` (Caret), `!`
/// (ExclaimMark), or the `NoneNode` sentinel for the normal case.
pub fn build_ephemeral_marker(arena: &mut NodeArena, eph: Ephemeral) -> NodeId {
    let kind = match eph {
        Ephemeral::Ephemeral => TokenKind::Caret,
        Ephemeral::Aliased => TokenKind::ExclaimMark,
        Ephemeral::Normal => TokenKind::NoneNode,
    };
    arena.alloc(kind, Span::default())
}

pub fn read_cap_marker(arena: &NodeArena, marker: NodeId) -> Cap {
    Cap::from_token(arena.kind(marker)).unwrap_or(Cap::Ref)
}

pub fn read_ephemeral_marker(arena: &NodeArena, marker: NodeId) -> Ephemeral {
    match arena.kind(marker) {
        TokenKind::Caret => Ephemeral::Ephemeral,
        TokenKind::ExclaimMark => Ephemeral::Aliased,
        _ => Ephemeral::Normal,
    }
}

/// Builds a `nominal` type node: `(package-id?, name, typeargs, cap,
/// ephemeral-marker)` with `data` pointing at the defining entity (root
/// spec §3.4). `package` is `None` for an unqualified name.
#[allow(clippy::too_many_arguments)]
pub fn make_nominal(
    arena: &mut NodeArena,
    package: Option<NodeId>,
    name: NodeId,
    typeargs: Vec<NodeId>,
    cap: Cap,
    eph: Ephemeral,
    def: Option<NodeId>,
) -> NodeId {
    let node = arena.alloc(TokenKind::Nominal, Span::default());
    let pkg = package.unwrap_or_else(|| arena.alloc_none(Span::default()));
    let typeargs_node = arena.alloc(TokenKind::TypeArgs, Span::default());
    arena.set_children(typeargs_node, typeargs);
    let cap_marker = build_cap_marker(arena, cap);
    let eph_marker = build_ephemeral_marker(arena, eph);
    arena.set_children(node, vec![pkg, name, typeargs_node, cap_marker, eph_marker]);
    if let Some(def) = def {
        arena.set_data(node, NodeData::Def(def));
    }
    node
}

pub fn nominal_package(arena: &NodeArena, nominal: NodeId) -> Option<NodeId> {
    let pkg = arena.child(nominal, 0);
    if arena.get(pkg).is_none_node() {
        None
    } else {
        Some(pkg)
    }
}

pub fn nominal_name(arena: &NodeArena, nominal: NodeId) -> NodeId {
    arena.child(nominal, 1)
}

pub fn nominal_typeargs(arena: &NodeArena, nominal: NodeId) -> &[NodeId] {
    arena.children(arena.child(nominal, 2))
}

pub fn nominal_cap(arena: &NodeArena, nominal: NodeId) -> Cap {
    read_cap_marker(arena, arena.child(nominal, 3))
}

pub fn nominal_ephemeral(arena: &NodeArena, nominal: NodeId) -> Ephemeral {
    read_ephemeral_marker(arena, arena.child(nominal, 4))
}

pub fn nominal_def(arena: &NodeArena, nominal: NodeId) -> Option<NodeId> {
    arena.data(nominal).as_def()
}

/// Builds a `typeparamref` node: `(name, cap, ephemeral-marker)` with
/// `data` → the defining typeparam declaration.
pub fn make_typeparamref(arena: &mut NodeArena, name: NodeId, cap: Cap, eph: Ephemeral, def: NodeId) -> NodeId {
    let node = arena.alloc(TokenKind::TypeParamRef, Span::default());
    let cap_marker = build_cap_marker(arena, cap);
    let eph_marker = build_ephemeral_marker(arena, eph);
    arena.set_children(node, vec![name, cap_marker, eph_marker]);
    arena.set_data(node, NodeData::Def(def));
    node
}

pub fn typeparamref_cap(arena: &NodeArena, node: NodeId) -> Cap {
    read_cap_marker(arena, arena.child(node, 1))
}

pub fn typeparamref_ephemeral(arena: &NodeArena, node: NodeId) -> Ephemeral {
    read_ephemeral_marker(arena, arena.child(node, 2))
}

pub fn typeparamref_def(arena: &NodeArena, node: NodeId) -> Option<NodeId> {
    arena.data(node).as_def()
}

/// Builds an unflattened `union`/`isect`/`tuple` node directly from
/// `members`. Callers wanting normalization (root spec §4.7) should go
/// through [`crate::assembler`] instead.
pub fn make_list_type(arena: &mut NodeArena, kind: TokenKind, members: Vec<NodeId>) -> NodeId {
    let node = arena.alloc(kind, Span::default());
    arena.set_children(node, members);
    node
}

/// Builds an `arrow` (viewpoint) node: `(view-type, target-type)`.
pub fn make_arrow(arena: &mut NodeArena, view: NodeId, target: NodeId) -> NodeId {
    let node = arena.alloc(TokenKind::Arrow, Span::default());
    arena.set_children(node, vec![view, target]);
    node
}

pub fn arrow_view(arena: &NodeArena, arrow: NodeId) -> NodeId {
    arena.child(arrow, 0)
}

pub fn arrow_target(arena: &NodeArena, arrow: NodeId) -> NodeId {
    arena.child(arrow, 1)
}

/// The marker for "is a `this-type`", legal only as the view side of an
/// arrow inside a method (root spec §3.4).
pub fn make_this_type(arena: &mut NodeArena) -> NodeId {
    arena.alloc(TokenKind::ThisType, Span::default())
}

/// A first-class function type `{(A, B): C}` (`ember-parser`'s
/// `parse_function_type`): `(params, result)`, where `params` is a
/// `Params` node whose children are themselves type subtrees (there is
/// no parameter name at this position, unlike a method's own params).
pub fn function_type_params(arena: &NodeArena, node: NodeId) -> &[NodeId] {
    arena.children(arena.child(node, 0))
}

pub fn function_type_result(arena: &NodeArena, node: NodeId) -> NodeId {
    arena.child(node, 1)
}

pub fn make_infer_type(arena: &mut NodeArena) -> NodeId {
    arena.alloc(TokenKind::InferType, Span::default())
}

pub fn make_error_type(arena: &mut NodeArena) -> NodeId {
    arena.alloc(TokenKind::ErrorType, Span::default())
}

/// Whether a numeric literal type (root spec §3.4, §4.11) is an integer
/// or float family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralFamily {
    Int,
    Float,
}

/// Builds a transient `literal` type node carrying the accumulated
/// control-flow branch origins (root spec §4.11, §9
/// "Control-flow-as-types").
pub fn make_literal_type(arena: &mut NodeArena, family: LiteralFamily, branches: Vec<NodeId>) -> NodeId {
    let node = arena.alloc(TokenKind::LiteralType, Span::default());
    let marker_kind = match family {
        LiteralFamily::Int => TokenKind::IntLiteral(0),
        LiteralFamily::Float => TokenKind::FloatLiteral(0),
    };
    let marker = arena.alloc(marker_kind, Span::default());
    arena.set_children(node, vec![marker]);
    arena.set_data(node, NodeData::LiteralBranches(branches));
    node
}

pub fn literal_family(arena: &NodeArena, node: NodeId) -> LiteralFamily {
    match arena.kind(arena.child(node, 0)) {
        TokenKind::FloatLiteral(_) => LiteralFamily::Float,
        _ => LiteralFamily::Int,
    }
}

pub fn literal_branches(arena: &NodeArena, node: NodeId) -> Vec<NodeId> {
    arena.data(node).as_literal_branches().unwrap_or(&[]).to_vec()
}

/// Builds a type-parameter declaration: `(name, constraint, default-cap)`.
/// `constraint` is an [`make_infer_type`] node when the parameter is
/// unconstrained (matches any type / `#any`, per §4.8's open-question
/// resolution — see `nominal`/`typeparamref` handling in `subtype.rs`).
pub fn make_typeparam_decl(arena: &mut NodeArena, name: NodeId, constraint: NodeId, default_cap: Cap) -> NodeId {
    let node = arena.alloc(TokenKind::TypeParamDecl, Span::default());
    let cap_marker = build_cap_marker(arena, default_cap);
    arena.set_children(node, vec![name, constraint, cap_marker]);
    node
}

pub fn typeparam_decl_name(arena: &NodeArena, decl: NodeId) -> NodeId {
    arena.child(decl, 0)
}

pub fn typeparam_decl_constraint(arena: &NodeArena, decl: NodeId) -> NodeId {
    arena.child(decl, 1)
}

pub fn typeparam_decl_default_cap(arena: &NodeArena, decl: NodeId) -> Cap {
    read_cap_marker(arena, arena.child(decl, 2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_ast::NodeArena;

    #[test]
    fn nominal_round_trips_its_fields() {
        let mut arena = NodeArena::new();
        let name = arena.alloc(TokenKind::Identifier(Default::default()), Span::default());
        let def = arena.alloc(TokenKind::ClassKw, Span::default());
        let nominal = make_nominal(&mut arena, None, name, vec![], Cap::Ref, Ephemeral::Normal, Some(def));

        assert_eq!(nominal_package(&arena, nominal), None);
        assert_eq!(nominal_name(&arena, nominal), name);
        assert_eq!(nominal_cap(&arena, nominal), Cap::Ref);
        assert_eq!(nominal_ephemeral(&arena, nominal), Ephemeral::Normal);
        assert_eq!(nominal_def(&arena, nominal), Some(def));
    }

    #[test]
    fn function_type_exposes_params_and_result() {
        let mut arena = NodeArena::new();
        let p1 = make_infer_type(&mut arena);
        let params = make_list_type(&mut arena, TokenKind::Params, vec![p1]);
        let result = make_this_type(&mut arena);
        let func = arena.alloc(TokenKind::FunctionType, Span::default());
        arena.set_children(func, vec![params, result]);

        assert_eq!(function_type_params(&arena, func), &[p1]);
        assert_eq!(function_type_result(&arena, func), result);
    }

    #[test]
    fn arrow_exposes_view_and_target() {
        let mut arena = NodeArena::new();
        let a = make_this_type(&mut arena);
        let b = make_infer_type(&mut arena);
        let arrow = make_arrow(&mut arena, a, b);
        assert_eq!(arrow_view(&arena, arrow), a);
        assert_eq!(arrow_target(&arena, arrow), b);
    }

    #[test]
    fn literal_type_tracks_family_and_branches() {
        let mut arena = NodeArena::new();
        let b1 = arena.alloc(TokenKind::Reference, Span::default());
        let lit = make_literal_type(&mut arena, LiteralFamily::Float, vec![b1]);
        assert_eq!(literal_family(&arena, lit), LiteralFamily::Float);
        assert_eq!(literal_branches(&arena, lit), vec![b1]);
    }
}
