//! Trait flattening (component I, root spec §4.6) — "the most intricate
//! single component". For each concrete entity `T`, four explicit
//! stages run in order: walk the provides graph (Stage 1), import each
//! provider's methods as signatures (Stage 2), bind `delegate` fields to
//! the methods their target provides (Stage 3), and finally pick each
//! method's body by priority (Stage 4).
//!
//! Per-entity bookkeeping (is-local, delegate/default-body candidates)
//! lives in ordinary local `HashMap`s for the duration of one entity's
//! processing — it has no reason to survive past Stage 4, unlike the
//! cross-entity cycle guard (`NodeData::Provides`), which has to persist
//! on the node so a later reference to the same entity (as someone
//! else's provider, or the generic top-down walk reaching it on its own)
//! doesn't redo the work.

use std::collections::HashMap;

use ember_ast::entity::{
    entity_members, entity_provides, entity_typeparams, field_name, field_type, is_abstract_kind, is_entity_kind,
    is_method_kind, method_body, method_cap_marker, method_name, method_params, method_result, method_set_body,
    param_name, param_type,
};
use ember_ast::{NodeArena, NodeData, NodeId, ProvidesState, TokenKind};
use ember_base::{Interner, Span, Symbol};
use ember_diag::{Diagnostic, ErrorKind, Errors};
use ember_types::reify::{reify_force, reify_method_signature};
use ember_types::shape::{nominal_def, nominal_typeargs, read_cap_marker};
use ember_types::subtype::{is_subtype, type_equal};

use crate::builders::{make_dot_call, make_ident, make_reference};
use crate::pass_manager::{mark, Pass};

const PASS: Pass = Pass::TraitFlattener;

pub fn run(arena: &mut NodeArena, interner: &mut Interner, errors: &mut Errors, root: NodeId) {
    walk(arena, interner, errors, root);
}

fn walk(arena: &mut NodeArena, interner: &mut Interner, errors: &mut Errors, node: NodeId) {
    if arena.get(node).flags.reached(PASS.index()) {
        return;
    }

    if is_entity_kind(arena.kind(node)) {
        flatten_entity(arena, interner, errors, node);
    }

    mark(arena, node, PASS);

    let children: Vec<NodeId> = arena.children(node).to_vec();
    for child in children {
        walk(arena, interner, errors, child);
    }
}

fn identifier_symbol(arena: &NodeArena, node: NodeId) -> Option<Symbol> {
    match arena.kind(node) {
        TokenKind::Identifier(sym) => Some(sym),
        _ => None,
    }
}

/// A default-body candidate: the donor method (on some provider), and
/// the typeparam/typearg substitution that provider was instantiated
/// with at `T`'s provides list — needed to reify the donor's body
/// correctly once it is actually copied in Stage 4.
struct DefaultCandidate {
    donor: NodeId,
    type_params: Vec<NodeId>,
    type_args: Vec<NodeId>,
}

fn flatten_entity(arena: &mut NodeArena, interner: &mut Interner, errors: &mut Errors, entity: NodeId) {
    match arena.data(entity).as_provides_state() {
        Some(ProvidesState::Done) => return,
        Some(ProvidesState::InProgress) => {
            let span = arena.get(entity).span;
            errors.push(Diagnostic::error(ErrorKind::RecursiveTrait, span, "provides graph is cyclic"));
            arena.set_data(entity, NodeData::Provides(ProvidesState::Done));
            return;
        }
        _ => {}
    }
    arena.set_data(entity, NodeData::Provides(ProvidesState::InProgress));

    // Stage 1: provides graph.
    let mut providers: Vec<(NodeId, NodeId)> = Vec::new();
    for provided in entity_provides(arena, entity).to_vec() {
        let Some(def) = nominal_def(arena, provided) else { continue };
        if !matches!(arena.kind(def), TokenKind::Trait | TokenKind::Interface) {
            let span = arena.get(provided).span;
            errors.push(Diagnostic::error(ErrorKind::NotASubtype, span, "provides must name a trait or interface"));
            continue;
        }
        flatten_entity(arena, interner, errors, def);
        providers.push((provided, def));
    }

    // Stage 2: method import.
    let mut members: Vec<NodeId> = entity_members(arena, entity).to_vec();
    let mut by_name: HashMap<Symbol, usize> = HashMap::new();
    let mut is_local: Vec<Symbol> = Vec::new();
    for (i, &m) in members.iter().enumerate() {
        if is_method_kind(arena.kind(m)) {
            if let Some(sym) = identifier_symbol(arena, method_name(arena, m)) {
                by_name.insert(sym, i);
                is_local.push(sym);
            }
        }
    }

    let mut default_candidates: HashMap<Symbol, Vec<DefaultCandidate>> = HashMap::new();

    for (provided, provider_def) in &providers {
        let type_args = nominal_typeargs(arena, *provided).to_vec();
        let type_params = entity_typeparams(arena, *provider_def).to_vec();
        let provider_methods: Vec<NodeId> =
            entity_members(arena, *provider_def).iter().copied().filter(|&m| is_method_kind(arena.kind(m))).collect();

        for provider_method in provider_methods {
            let Some(sym) = identifier_symbol(arena, method_name(arena, provider_method)) else { continue };

            if method_body(arena, provider_method).is_some() {
                let candidates = default_candidates.entry(sym).or_default();
                if candidates.len() < 2 && !candidates.iter().any(|c| c.donor == provider_method) {
                    candidates.push(DefaultCandidate {
                        donor: provider_method,
                        type_params: type_params.clone(),
                        type_args: type_args.clone(),
                    });
                }
            }

            match by_name.get(&sym).copied() {
                Some(idx) if is_local.contains(&sym) => {
                    let local = members[idx];
                    let imported = reify_method_signature(arena, provider_method, &type_params, &type_args);
                    if !signature_subtype(arena, local, imported) {
                        push_clash(arena, interner, errors, sym, local);
                    }
                }
                Some(idx) => {
                    let existing = members[idx];
                    let imported = reify_method_signature(arena, provider_method, &type_params, &type_args);
                    if !signature_equal(arena, existing, imported) {
                        push_clash(arena, interner, errors, sym, existing);
                    }
                }
                None => {
                    let imported = reify_method_signature(arena, provider_method, &type_params, &type_args);
                    members.push(imported);
                    by_name.insert(sym, members.len() - 1);
                }
            }
        }
    }

    // Stage 3: field delegation.
    let mut delegate_candidates: HashMap<Symbol, Vec<NodeId>> = HashMap::new();
    for field in entity_members(arena, entity).to_vec() {
        if arena.kind(field) != TokenKind::Delegate {
            continue;
        }
        let target_ty = field_type(arena, field);
        let Some(target_def) = nominal_def(arena, target_ty) else { continue };
        if !providers.iter().any(|&(_, def)| def == target_def) {
            let span = arena.get(field_name(arena, field)).span;
            errors.push(Diagnostic::error(ErrorKind::DelegateNotProvided, span, "delegate target is not in this entity's provides list"));
            continue;
        }
        for &target_method in entity_members(arena, target_def) {
            if !is_method_kind(arena.kind(target_method)) {
                continue;
            }
            let Some(sym) = identifier_symbol(arena, method_name(arena, target_method)) else { continue };
            let list = delegate_candidates.entry(sym).or_default();
            if list.len() < 2 && !list.contains(&field) {
                list.push(field);
            }
        }
    }

    // Stage 4: body resolution.
    let is_abstract = is_abstract_kind(arena.kind(entity));
    let method_syms: Vec<Symbol> = by_name.keys().copied().collect();
    for sym in method_syms {
        if is_local.contains(&sym) {
            continue;
        }
        let idx = by_name[&sym];
        let method_node = members[idx];
        if method_body(arena, method_node).is_some() {
            continue;
        }

        if let Some(fields) = delegate_candidates.get(&sym) {
            match fields.len() {
                1 => {
                    attach_delegate_body(arena, interner, errors, method_node, fields[0]);
                    continue;
                }
                n if n >= 2 => {
                    let span = arena.get(method_name(arena, method_node)).span;
                    errors.push(Diagnostic::error(ErrorKind::AmbiguousDelegate, span, "more than one delegate target provides this method"));
                    continue;
                }
                _ => {}
            }
        }

        match default_candidates.get(&sym) {
            Some(candidates) if candidates.len() == 1 => {
                attach_default_body(arena, interner, errors, method_node, &candidates[0]);
            }
            Some(candidates) if candidates.len() >= 2 => {
                if !is_abstract {
                    let span = arena.get(method_name(arena, method_node)).span;
                    errors.push(Diagnostic::error(ErrorKind::AmbiguousDefault, span, "more than one provider supplies a default body for this method"));
                }
                // Abstract: legal, but uncallable without a local override; leave bodyless.
            }
            _ => {
                if !is_abstract {
                    let span = arena.get(method_name(arena, method_node)).span;
                    errors.push(Diagnostic::error(ErrorKind::MissingBody, span, "method has no body and no unambiguous default"));
                }
            }
        }
    }

    if !members.iter().eq(entity_members(arena, entity).iter()) {
        let members_node = ember_ast::entity::entity_members_node(arena, entity);
        arena.set_children(members_node, members);
    }

    arena.set_data(entity, NodeData::Provides(ProvidesState::Done));
}

fn push_clash(arena: &NodeArena, interner: &Interner, errors: &mut Errors, sym: Symbol, at: NodeId) {
    let span = arena.get(method_name(arena, at)).span;
    let text = interner.resolve(sym);
    errors.push(Diagnostic::error(ErrorKind::MethodSignatureClash, span, format!("'{text}' clashes with a provided method of the same name")));
}

/// `L <: M` as signatures (root spec §4.9): contravariant parameters,
/// covariant result.
fn signature_subtype(arena: &NodeArena, local: NodeId, required: NodeId) -> bool {
    let l_params = method_params(arena, local);
    let r_params = method_params(arena, required);
    if l_params.len() != r_params.len() {
        return false;
    }
    let params_ok = l_params.iter().zip(r_params).all(|(&lp, &rp)| is_subtype(arena, param_type(arena, rp), param_type(arena, lp)));
    let result_ok = is_subtype(arena, method_result(arena, local), method_result(arena, required));
    params_ok && result_ok
}

/// Exact signature equality between two non-local entries inherited from
/// different providers (root spec §4.6 Stage 2): parameter names, types,
/// default-value presence, result, error-ness, and cap all have to
/// agree, or it's a `MethodSignatureClash`.
fn signature_equal(arena: &NodeArena, a: NodeId, b: NodeId) -> bool {
    let a_params = method_params(arena, a);
    let b_params = method_params(arena, b);
    if a_params.len() != b_params.len() {
        return false;
    }
    let params_ok = a_params.iter().zip(b_params).all(|(&ap, &bp)| {
        identifier_symbol(arena, param_name(arena, ap)) == identifier_symbol(arena, param_name(arena, bp))
            && type_equal(arena, param_type(arena, ap), param_type(arena, bp))
            && ember_ast::entity::param_default(arena, ap).is_some() == ember_ast::entity::param_default(arena, bp).is_some()
    });
    params_ok
        && type_equal(arena, method_result(arena, a), method_result(arena, b))
        && read_cap_marker(arena, method_cap_marker(arena, a)) == read_cap_marker(arena, method_cap_marker(arena, b))
        && arena.get(a).flags.partial == arena.get(b).flags.partial
}

/// Synthesizes `this.field.method(args...)` as `method_node`'s body
/// (root spec §4.6 Stage 4 case 2) and records the delegation via
/// [`NodeData::DelegateField`].
fn attach_delegate_body(arena: &mut NodeArena, interner: &mut Interner, errors: &mut Errors, method_node: NodeId, field: NodeId) {
    let span = arena.get(method_node).span;
    let this_node = arena.alloc(TokenKind::This, span);
    let field_name_sym = identifier_symbol(arena, field_name(arena, field)).unwrap_or(Symbol::EMPTY);
    let field_name_copy = make_ident(arena, field_name_sym, span);
    let field_ref = {
        let node = arena.alloc(TokenKind::FieldRef, span);
        arena.set_children(node, vec![this_node, field_name_copy]);
        node
    };

    let method_name_sym = identifier_symbol(arena, method_name(arena, method_node)).unwrap_or(Symbol::EMPTY);
    let method_name_copy = make_ident(arena, method_name_sym, span);
    let args: Vec<NodeId> = method_params(arena, method_node)
        .to_vec()
        .iter()
        .map(|&p| {
            let sym = identifier_symbol(arena, param_name(arena, p)).unwrap_or(Symbol::EMPTY);
            let name_copy = make_ident(arena, sym, span);
            make_reference(arena, name_copy, span)
        })
        .collect();
    let call = make_dot_call(arena, field_ref, method_name_copy, args, span);
    let body = {
        let node = arena.alloc(TokenKind::Seq, span);
        arena.set_children(node, vec![call]);
        node
    };

    method_set_body(arena, method_node, body);
    arena.set_data(method_node, NodeData::DelegateField(field));
    crate::scope::build_method_scope(arena, interner, errors, method_node);
    crate::resolve::walk(arena, interner, errors, body);
}

/// Copies and reifies a default-method candidate's body onto
/// `method_node` (root spec §4.6 Stage 4 case 3), then rebuilds the
/// method's own scope and re-resolves the fresh subtree so references
/// bind to `method_node`'s own (already-reified) parameters rather than
/// the donor's.
fn attach_default_body(arena: &mut NodeArena, interner: &mut Interner, errors: &mut Errors, method_node: NodeId, candidate: &DefaultCandidate) {
    let Some(donor_body) = method_body(arena, candidate.donor) else { return };
    let body = reify_force(arena, donor_body, &candidate.type_params, &candidate.type_args);
    method_set_body(arena, method_node, body);
    arena.set_data(method_node, NodeData::BodyDonor(candidate.donor));
    crate::scope::build_method_scope(arena, interner, errors, method_node);
    crate::resolve::walk(arena, interner, errors, body);
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_ast::entity::{entity_members, method_name as mname};

    fn parse(source: &str) -> (NodeArena, Interner, NodeId) {
        let mut arena = NodeArena::new();
        let mut interner = Interner::new();
        let mut errors = Errors::new();
        let root = ember_parser::parse_program(
            source,
            0,
            ember_lexer::LexerOptions::default(),
            &mut arena,
            &mut interner,
            &mut errors,
        );
        assert!(!errors.has_errors());
        (arena, interner, root)
    }

    fn run_through_flatten(arena: &mut NodeArena, interner: &mut Interner, errors: &mut Errors, root: NodeId) {
        crate::sugar::run(arena, interner, root);
        crate::scope::run(arena, interner, errors, root);
        crate::resolve::run(arena, interner, errors, root);
        run(arena, interner, errors, root);
    }

    fn find_method(arena: &NodeArena, interner: &Interner, entity: NodeId, name: &str) -> Option<NodeId> {
        entity_members(arena, entity).iter().copied().find(|&m| {
            is_method_kind(arena.kind(m)) && identifier_symbol(arena, mname(arena, m)).map(|s| interner.resolve(s)) == Some(name)
        })
    }

    #[test]
    fn trait_method_with_default_body_is_imported_and_attached() {
        let (mut arena, mut interner, root) = parse(
            "trait ref Greeter\n  fun hello(): U32\n    1\n  end\nend\nclass ref Thing is Greeter\nend\nprimitive val U32 end\n",
        );
        let mut errors = Errors::new();
        run_through_flatten(&mut arena, &mut interner, &mut errors, root);
        assert!(!errors.has_errors());
        let package = arena.children(root)[0];
        let thing = arena.children(package).iter().copied().find(|&e| {
            identifier_symbol(&arena, ember_ast::entity::entity_name(&arena, e)).map(|s| interner.resolve(s)) == Some("Thing")
        }).unwrap();
        let hello = find_method(&arena, &interner, thing, "hello").unwrap();
        assert!(method_body(&arena, hello).is_some());
    }

    #[test]
    fn ambiguous_default_body_is_rejected_for_concrete_entities() {
        let (mut arena, mut interner, root) = parse(
            "trait ref A\n  fun go(): U32\n    1\n  end\nend\ntrait ref B\n  fun go(): U32\n    2\n  end\nend\nclass ref Thing is A, B\nend\nprimitive val U32 end\n",
        );
        let mut errors = Errors::new();
        run_through_flatten(&mut arena, &mut interner, &mut errors, root);
        assert!(errors.of_kind(ErrorKind::AmbiguousDefault).count() >= 1);
    }

    #[test]
    fn missing_body_is_rejected_for_concrete_entities() {
        let (mut arena, mut interner, root) = parse(
            "trait ref Greeter\n  fun hello(): U32\nend\nclass ref Thing is Greeter\nend\nprimitive val U32 end\n",
        );
        let mut errors = Errors::new();
        run_through_flatten(&mut arena, &mut interner, &mut errors, root);
        assert!(errors.of_kind(ErrorKind::MissingBody).count() >= 1);
    }

    #[test]
    fn delegate_field_forwards_to_its_target() {
        let (mut arena, mut interner, root) = parse(
            "trait ref Greeter\n  fun hello(): U32\nend\nclass ref Thing is Greeter\n  delegate g: Greeter\nend\nclass ref G is Greeter\n  fun hello(): U32\n    1\n  end\nend\nprimitive val U32 end\n",
        );
        let mut errors = Errors::new();
        run_through_flatten(&mut arena, &mut interner, &mut errors, root);
        let package = arena.children(root)[0];
        let thing = arena.children(package).iter().copied().find(|&e| {
            identifier_symbol(&arena, ember_ast::entity::entity_name(&arena, e)).map(|s| interner.resolve(s)) == Some("Thing")
        }).unwrap();
        let hello = find_method(&arena, &interner, thing, "hello").unwrap();
        assert!(method_body(&arena, hello).is_some());
        assert!(arena.data(hello).as_delegate_field().is_some());
    }

    #[test]
    fn recursive_provides_graph_is_rejected() {
        let (mut arena, mut interner, root) = parse("trait ref A is B\nend\ntrait ref B is A\nend\n");
        let mut errors = Errors::new();
        run_through_flatten(&mut arena, &mut interner, &mut errors, root);
        assert!(errors.of_kind(ErrorKind::RecursiveTrait).count() >= 1);
    }
}
