//! Entity and member child-layout conventions (root spec §3.6).
//!
//! Entities (primitive/struct/class/actor/trait/interface) and their
//! members (fields, methods) are ordinary [`crate::Node`]s; this module
//! is the single place that names their child-index conventions, mirroring
//! how `ember_types::shape` does the same for type subtrees.

use ember_base::Span;
use ember_lexer::TokenKind;

use crate::arena::NodeArena;
use crate::node::NodeId;

/// The six entity kinds, as the `TokenKind` an entity node is tagged
/// with.
pub fn is_entity_kind(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Primitive
            | TokenKind::Struct
            | TokenKind::ClassKw
            | TokenKind::Actor
            | TokenKind::Trait
            | TokenKind::Interface
    )
}

/// `true` for entity kinds that may be left without method bodies
/// (trait/interface — root spec §4.6 Stage 4 case 4).
pub fn is_abstract_kind(kind: TokenKind) -> bool {
    matches!(kind, TokenKind::Trait | TokenKind::Interface)
}

/// Builds an entity node: `(name, typeparams, cap-marker, provides,
/// members)`.
pub fn make_entity(
    arena: &mut NodeArena,
    kind: TokenKind,
    name: NodeId,
    typeparams: Vec<NodeId>,
    cap_marker: NodeId,
    provides: Vec<NodeId>,
    members: Vec<NodeId>,
) -> NodeId {
    debug_assert!(is_entity_kind(kind));
    let node = arena.alloc(kind, Span::default());
    let typeparams_node = arena.alloc(TokenKind::TypeParamDecl, Span::default());
    arena.set_children(typeparams_node, typeparams);
    let provides_node = arena.alloc(TokenKind::Provides, Span::default());
    arena.set_children(provides_node, provides);
    let members_node = arena.alloc(TokenKind::Members, Span::default());
    arena.set_children(members_node, members);
    arena.set_children(node, vec![name, typeparams_node, cap_marker, provides_node, members_node]);
    node
}

pub fn entity_name(arena: &NodeArena, entity: NodeId) -> NodeId {
    arena.child(entity, 0)
}

pub fn entity_typeparams(arena: &NodeArena, entity: NodeId) -> &[NodeId] {
    arena.children(arena.child(entity, 1))
}

pub fn entity_cap_marker(arena: &NodeArena, entity: NodeId) -> NodeId {
    arena.child(entity, 2)
}

pub fn entity_provides(arena: &NodeArena, entity: NodeId) -> &[NodeId] {
    arena.children(arena.child(entity, 3))
}

pub fn entity_members(arena: &NodeArena, entity: NodeId) -> &[NodeId] {
    arena.children(arena.child(entity, 4))
}

pub fn entity_members_node(arena: &NodeArena, entity: NodeId) -> NodeId {
    arena.child(entity, 4)
}

/// `true` for the member kinds that introduce a field (`let`/`var`/
/// `embed`/`delegate`). A `delegate` field (root spec §4.6 Stage 3) has
/// the same three-child shape as any other field; its type names the
/// trait or interface it delegates to.
pub fn is_field_kind(kind: TokenKind) -> bool {
    matches!(kind, TokenKind::Let | TokenKind::Var | TokenKind::Embed | TokenKind::Delegate)
}

/// Builds a field member: `(name, type, default-value-or-none)`.
pub fn make_field(arena: &mut NodeArena, kind: TokenKind, name: NodeId, ty: NodeId, default: Option<NodeId>) -> NodeId {
    debug_assert!(is_field_kind(kind));
    let node = arena.alloc(kind, Span::default());
    let default = default.unwrap_or_else(|| arena.alloc_none(Span::default()));
    arena.set_children(node, vec![name, ty, default]);
    node
}

pub fn field_name(arena: &NodeArena, field: NodeId) -> NodeId {
    arena.child(field, 0)
}

pub fn field_type(arena: &NodeArena, field: NodeId) -> NodeId {
    arena.child(field, 1)
}

pub fn field_default(arena: &NodeArena, field: NodeId) -> Option<NodeId> {
    let d = arena.child(field, 2);
    if arena.get(d).is_none_node() {
        None
    } else {
        Some(d)
    }
}

/// `true` for the member kinds that introduce a method (`new`/`be`/
/// `fun`).
pub fn is_method_kind(kind: TokenKind) -> bool {
    matches!(kind, TokenKind::New | TokenKind::Be | TokenKind::Fun)
}

/// Builds a method member: `(name, cap-marker, typeparams, params,
/// result-type, body-or-none)`. `partial` (the method can error, `?`
/// suffix) and `is_extern` are carried as node flags rather than extra
/// children since they're simple booleans, not subtrees.
#[allow(clippy::too_many_arguments)]
pub fn make_method(
    arena: &mut NodeArena,
    kind: TokenKind,
    name: NodeId,
    cap_marker: NodeId,
    typeparams: Vec<NodeId>,
    params: Vec<NodeId>,
    result: NodeId,
    body: Option<NodeId>,
) -> NodeId {
    debug_assert!(is_method_kind(kind));
    let node = arena.alloc(kind, Span::default());
    let typeparams_node = arena.alloc(TokenKind::TypeParamDecl, Span::default());
    arena.set_children(typeparams_node, typeparams);
    let params_node = arena.alloc(TokenKind::Params, Span::default());
    arena.set_children(params_node, params);
    let body = body.unwrap_or_else(|| arena.alloc_none(Span::default()));
    arena.set_children(
        node,
        vec![name, cap_marker, typeparams_node, params_node, result, body],
    );
    node
}

pub fn method_name(arena: &NodeArena, method: NodeId) -> NodeId {
    arena.child(method, 0)
}

pub fn method_cap_marker(arena: &NodeArena, method: NodeId) -> NodeId {
    arena.child(method, 1)
}

pub fn method_typeparams(arena: &NodeArena, method: NodeId) -> &[NodeId] {
    arena.children(arena.child(method, 2))
}

pub fn method_params(arena: &NodeArena, method: NodeId) -> &[NodeId] {
    arena.children(arena.child(method, 3))
}

pub fn method_result(arena: &NodeArena, method: NodeId) -> NodeId {
    arena.child(method, 4)
}

pub fn method_body(arena: &NodeArena, method: NodeId) -> Option<NodeId> {
    let b = arena.child(method, 5);
    if arena.get(b).is_none_node() {
        None
    } else {
        Some(b)
    }
}

pub fn method_set_body(arena: &mut NodeArena, method: NodeId, body: NodeId) {
    let children = arena.children(method).to_vec();
    let old_body = children[5];
    arena.replace(old_body, body);
}

/// Builds a parameter declaration: `(name, type, default-value-or-none)`.
pub fn make_param(arena: &mut NodeArena, name: NodeId, ty: NodeId, default: Option<NodeId>) -> NodeId {
    let node = arena.alloc(TokenKind::ParamDecl, Span::default());
    let default = default.unwrap_or_else(|| arena.alloc_none(Span::default()));
    arena.set_children(node, vec![name, ty, default]);
    node
}

pub fn param_name(arena: &NodeArena, param: NodeId) -> NodeId {
    arena.child(param, 0)
}

pub fn param_type(arena: &NodeArena, param: NodeId) -> NodeId {
    arena.child(param, 1)
}

pub fn param_default(arena: &NodeArena, param: NodeId) -> Option<NodeId> {
    let d = arena.child(param, 2);
    if arena.get(d).is_none_node() {
        None
    } else {
        Some(d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_base::Span;

    #[test]
    fn entity_round_trips_its_sections() {
        let mut arena = NodeArena::new();
        let name = arena.alloc(TokenKind::Identifier(Default::default()), Span::default());
        let cap_marker = arena.alloc(TokenKind::RefCap, Span::default());
        let entity = make_entity(&mut arena, TokenKind::ClassKw, name, vec![], cap_marker, vec![], vec![]);
        assert_eq!(entity_name(&arena, entity), name);
        assert!(entity_members(&arena, entity).is_empty());
    }

    #[test]
    fn method_body_starts_absent_and_can_be_set() {
        let mut arena = NodeArena::new();
        let name = arena.alloc(TokenKind::Identifier(Default::default()), Span::default());
        let cap_marker = arena.alloc(TokenKind::RefCap, Span::default());
        let result = arena.alloc(TokenKind::InferType, Span::default());
        let method = make_method(&mut arena, TokenKind::Fun, name, cap_marker, vec![], vec![], result, None);
        assert_eq!(method_body(&arena, method), None);

        let body = arena.alloc(TokenKind::Seq, Span::default());
        method_set_body(&mut arena, method, body);
        assert_eq!(method_body(&arena, method), Some(body));
    }
}
