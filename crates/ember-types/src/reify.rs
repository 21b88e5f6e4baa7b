//! Reification (component K, root spec §4.10): substituting concrete
//! typeargs for typeparam references throughout a subtree, plus the
//! deferred-materialization cache for generic method lookups (root spec
//! §9 "Deferred reification").

use std::collections::HashMap;

use ember_ast::{entity, NodeArena, NodeData, NodeId, TokenKind};

use crate::assembler;
use crate::shape::*;

/// Substitutes `type_args[i]` for every `typeparamref` whose `data`
/// points at `type_params[i]`, deep-copying the subtree so the original
/// is left untouched. Identity when `type_params` is empty (root spec
/// §8.2 testable property "`reify(x, params, args)` is the identity when
/// `params` is empty").
pub fn reify(arena: &mut NodeArena, node: NodeId, type_params: &[NodeId], type_args: &[NodeId]) -> NodeId {
    if type_params.is_empty() {
        return node;
    }
    reify_inner(arena, node, type_params, type_args)
}

fn reify_inner(arena: &mut NodeArena, node: NodeId, type_params: &[NodeId], type_args: &[NodeId]) -> NodeId {
    let kind = arena.kind(node);

    if kind == TokenKind::TypeParamRef {
        if let Some(def) = typeparamref_def(arena, node) {
            if let Some(idx) = type_params.iter().position(|&p| p == def) {
                let eph = typeparamref_ephemeral(arena, node);
                return splice_with_ephemeral(arena, type_args[idx], eph, type_params, type_args);
            }
        }
    }

    if entity::is_method_kind(kind) {
        return reify_method(arena, node, type_params, type_args);
    }

    let span = arena.get(node).span;
    let children: Vec<NodeId> = arena.children(node).to_vec();
    let new_children: Vec<NodeId> = children
        .iter()
        .map(|&c| reify_inner(arena, c, type_params, type_args))
        .collect();

    let new_node = if kind == TokenKind::Arrow && new_children.len() == 2 {
        // "`arrow` is simplified in-place after substitution" (§4.10):
        // go through the assembler instead of a raw rebuild so a
        // substitution that turns the view/target into nested arrows
        // still comes out composed.
        assembler::arrow(arena, new_children[0], new_children[1])
    } else {
        let fresh = arena.alloc(kind, span);
        arena.set_children(fresh, new_children);
        fresh
    };

    if let Some(ty) = arena.ty(node) {
        let new_ty = reify_inner(arena, ty, type_params, type_args);
        arena.set_type(new_node, new_ty);
    }
    if let Some(def) = arena.data(node).as_def() {
        arena.set_data(new_node, NodeData::Def(def));
    }
    new_node
}

/// Deep-copies `arg` (itself substituted against the same `type_params`/
/// `type_args`, in case the arg subtree is not yet fully concrete) and
/// overrides the copy's ephemeral marker with `eph` — "preserving the
/// ephemeral marker of the reference" (root spec §4.10), i.e. of the
/// `typeparamref` being replaced, not of the argument value.
fn splice_with_ephemeral(
    arena: &mut NodeArena,
    arg: NodeId,
    eph: crate::cap::Ephemeral,
    type_params: &[NodeId],
    type_args: &[NodeId],
) -> NodeId {
    let copy = reify_inner(arena, arg, type_params, type_args);
    match arena.kind(copy) {
        TokenKind::Nominal => {
            let old_marker = arena.child(copy, 4);
            let new_marker = build_ephemeral_marker(arena, eph);
            arena.replace(old_marker, new_marker);
        }
        TokenKind::TypeParamRef => {
            let old_marker = arena.child(copy, 2);
            let new_marker = build_ephemeral_marker(arena, eph);
            arena.replace(old_marker, new_marker);
        }
        _ => {}
    }
    copy
}

/// Like [`reify`], but always deep-copies, even when `type_params` is
/// empty. `reify`'s identity shortcut is correct for a read-only
/// specialized view but wrong for anything the caller is about to graft
/// into the tree as a new node's child (the trait flattener's Stage 4
/// copy-and-reify of a default method body, root spec §4.6).
pub fn reify_force(arena: &mut NodeArena, node: NodeId, type_params: &[NodeId], type_args: &[NodeId]) -> NodeId {
    reify_inner(arena, node, type_params, type_args)
}

/// Reifies a method member as a standalone, freshly-owned node: unlike
/// the public [`reify`], this always deep-copies even when
/// `type_params` is empty. The trait flattener (root spec §4.6 Stage 2)
/// needs a method signature it can attach as a new child under a
/// different entity's members list; `reify`'s identity shortcut is
/// correct for a read-only specialized *view* of an existing member but
/// would alias the original method's children into two parents if the
/// result were then spliced into the tree.
pub fn reify_method_signature(arena: &mut NodeArena, method: NodeId, type_params: &[NodeId], type_args: &[NodeId]) -> NodeId {
    reify_method(arena, method, type_params, type_args)
}

/// Reifies a method member, skipping its body: the copy's body slot is
/// left absent and `data` records a [`NodeData::BodyDonor`] pointing at
/// the *original* method node, so the trait flattener's body-resolution
/// stage (root spec §4.6 Stage 4) or a later materialization can still
/// find a concrete body to copy-and-reify from without this call having
/// duplicated it up front.
fn reify_method(arena: &mut NodeArena, method: NodeId, type_params: &[NodeId], type_args: &[NodeId]) -> NodeId {
    let span = arena.get(method).span;
    let name = reify_inner(arena, entity::method_name(arena, method), type_params, type_args);
    let cap_marker = reify_inner(arena, entity::method_cap_marker(arena, method), type_params, type_args);
    let method_typeparams: Vec<NodeId> = entity::method_typeparams(arena, method)
        .iter()
        .map(|&p| reify_inner(arena, p, type_params, type_args))
        .collect();
    let params: Vec<NodeId> = entity::method_params(arena, method)
        .iter()
        .map(|&p| reify_inner(arena, p, type_params, type_args))
        .collect();
    let result = reify_inner(arena, entity::method_result(arena, method), type_params, type_args);

    let new_method = entity::make_method(arena, arena.kind(method), name, cap_marker, method_typeparams, params, result, None);
    arena.get_mut(new_method).span = span;
    arena.set_data(new_method, NodeData::BodyDonor(method));
    new_method
}

/// Key identifying one materialized instantiation: the generic method's
/// AST, the typeargs it was reified against, and the call-site argument
/// expressions (root spec §4.10/§9).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct MaterializeKey {
    method_ast: NodeId,
    type_args: Vec<NodeId>,
    method_args: Vec<NodeId>,
}

/// Per-compilation cache of materialized [`ember_ast::DeferredReification`]
/// results, so repeated lookups of the same instantiation don't
/// re-substitute (root spec §4.10). Owned by the driver's `Compiler`
/// value for the lifetime of one compilation.
#[derive(Debug, Default)]
pub struct ReificationCache {
    cache: HashMap<MaterializeKey, NodeId>,
}

impl ReificationCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Materializes `deferred`, substituting its `type_params`/`type_args`
    /// through the method body it refers to, returning the fresh body
    /// subtree. Cached by `(ast, type_args, method_args)`.
    pub fn materialize(&mut self, arena: &mut NodeArena, deferred: &ember_ast::DeferredReification) -> Option<NodeId> {
        let key = MaterializeKey {
            method_ast: deferred.method_ast,
            type_args: deferred.type_args.clone(),
            method_args: deferred.method_args.clone(),
        };
        if let Some(&cached) = self.cache.get(&key) {
            return Some(cached);
        }
        let body = entity::method_body(arena, deferred.method_ast)?;
        let materialized = reify(arena, body, &deferred.type_params, &deferred.type_args);
        self.cache.insert(key, materialized);
        Some(materialized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cap::{Cap, Ephemeral};
    use ember_base::Span;

    #[test]
    fn reify_is_identity_when_params_empty() {
        let mut arena = NodeArena::new();
        let def = arena.alloc(TokenKind::ClassKw, Span::default());
        let name = arena.alloc(TokenKind::Identifier(Default::default()), Span::default());
        let t = make_nominal(&mut arena, None, name, vec![], Cap::Ref, Ephemeral::Normal, Some(def));
        assert_eq!(reify(&mut arena, t, &[], &[]), t);
    }

    #[test]
    fn reify_substitutes_matching_typeparamref() {
        let mut arena = NodeArena::new();
        let tp_name = arena.alloc(TokenKind::Identifier(Default::default()), Span::default());
        let constraint = make_infer_type(&mut arena);
        let decl = make_typeparam_decl(&mut arena, tp_name, constraint, Cap::Ref);
        let param_ref_name = arena.alloc(TokenKind::Identifier(Default::default()), Span::default());
        let param_ref = make_typeparamref(&mut arena, param_ref_name, Cap::Ref, Ephemeral::Normal, decl);

        let def = arena.alloc(TokenKind::ClassKw, Span::default());
        let concrete_name = arena.alloc(TokenKind::Identifier(Default::default()), Span::default());
        let concrete = make_nominal(&mut arena, None, concrete_name, vec![], Cap::Iso, Ephemeral::Normal, Some(def));

        let reified = reify(&mut arena, param_ref, &[decl], &[concrete]);
        assert_eq!(arena.kind(reified), TokenKind::Nominal);
        assert_eq!(nominal_def(&arena, reified), Some(def));
        // The substituted copy is a distinct node from the arg template.
        assert_ne!(reified, concrete);
    }

    #[test]
    fn reify_preserves_the_typeparamref_ephemeral_marker() {
        let mut arena = NodeArena::new();
        let tp_name = arena.alloc(TokenKind::Identifier(Default::default()), Span::default());
        let constraint = make_infer_type(&mut arena);
        let decl = make_typeparam_decl(&mut arena, tp_name, constraint, Cap::Ref);
        let param_ref_name = arena.alloc(TokenKind::Identifier(Default::default()), Span::default());
        let param_ref = make_typeparamref(&mut arena, param_ref_name, Cap::Ref, Ephemeral::Ephemeral, decl);

        let def = arena.alloc(TokenKind::ClassKw, Span::default());
        let concrete_name = arena.alloc(TokenKind::Identifier(Default::default()), Span::default());
        let concrete = make_nominal(&mut arena, None, concrete_name, vec![], Cap::Iso, Ephemeral::Normal, Some(def));

        let reified = reify(&mut arena, param_ref, &[decl], &[concrete]);
        assert_eq!(nominal_ephemeral(&arena, reified), Ephemeral::Ephemeral);
    }

    #[test]
    fn reify_method_skips_body_and_records_donor() {
        let mut arena = NodeArena::new();
        let name = arena.alloc(TokenKind::Identifier(Default::default()), Span::default());
        let cap_marker = arena.alloc(TokenKind::RefCap, Span::default());
        let result = make_infer_type(&mut arena);
        let body = arena.alloc(TokenKind::Seq, Span::default());
        let method = entity::make_method(&mut arena, TokenKind::Fun, name, cap_marker, vec![], vec![], result, Some(body));

        let reified = reify_method(&mut arena, method, &[], &[]);
        assert_eq!(entity::method_body(&arena, reified), None);
        assert_eq!(arena.data(reified).as_body_donor(), Some(method));
    }
}
