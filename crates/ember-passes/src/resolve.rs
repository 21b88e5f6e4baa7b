//! Name resolution (component G, root spec §4.5).
//!
//! One top-down walk. Expression-level `reference` nodes are bound to
//! the nearest enclosing `param`/local/field declaration via
//! [`ember_ast::NodeArena::lookup`]. Type-level `nominal` nodes are
//! resolved against the same lexical chain: a hit on an entity attaches
//! `data`; a hit on a type parameter rewrites the node into a
//! `typeparamref` in place (only this pass is allowed to make that
//! call, per `ember-parser`'s own doc comment on why a bare name always
//! starts out parsed as `nominal`); a hit on a `type` alias inlines the
//! alias's right-hand side, reified against the caller's type
//! arguments, with cycle detection over `RecursiveAlias`.
//!
//! There is no bundled prelude: this core never reads a filesystem or
//! loads a standard library (root spec §1), so any "primitive" type a
//! program's expressions lean on (`U8`, `Bool`, `None`, `Array`, ...)
//! must be declared as an ordinary entity somewhere in the same
//! package. A `nominal` that names nothing in scope is reported via
//! `NameNotFound` and left unresolved; later passes treat an
//! unresolved `nominal` the same way they treat an `error-type`.
//!
//! Package-qualified names (`Pkg::Name`) are resolved by the bare name
//! alone — multi-package builds are out of scope (root spec §1), so the
//! qualifier is accepted syntactically but otherwise ignored.

use ember_ast::entity::{is_entity_kind, is_method_kind};
use ember_ast::{AliasState, NodeArena, NodeData, NodeId, TokenKind};
use ember_base::Interner;
use ember_diag::{Diagnostic, ErrorKind, Errors};
use ember_types::cap::Ephemeral;
use ember_types::reify::reify;
use ember_types::shape::{
    make_error_type, make_typeparamref, nominal_cap, nominal_ephemeral, nominal_name, nominal_typeargs,
    typeparam_decl_default_cap,
};

use crate::pass_manager::{mark, Pass};

const PASS: Pass = Pass::NameResolver;

pub fn run(arena: &mut NodeArena, interner: &mut Interner, errors: &mut Errors, root: NodeId) {
    walk(arena, interner, errors, root);
}

/// `pub(crate)` so the trait flattener can re-run name resolution over a
/// freshly attached default-method body (root spec §4.6 Stage 4) — the
/// fresh nodes reify produced have never been visited by this pass, so
/// the usual reached-mask skip simply doesn't fire for them.
pub(crate) fn walk(arena: &mut NodeArena, interner: &mut Interner, errors: &mut Errors, node: NodeId) {
    if arena.get(node).flags.reached(PASS.index()) {
        return;
    }

    let node = resolve_in_place(arena, interner, errors, node);

    mark(arena, node, PASS);

    let children: Vec<NodeId> = arena.children(node).to_vec();
    for child in children {
        walk(arena, interner, errors, child);
    }
}

/// Resolves `node` itself, returning the id it should be treated as
/// from here on (a `nominal` resolving to a type parameter is replaced
/// wholesale; everything else is resolved in place and returns `node`
/// unchanged).
fn resolve_in_place(arena: &mut NodeArena, interner: &mut Interner, errors: &mut Errors, node: NodeId) -> NodeId {
    match arena.kind(node) {
        TokenKind::Reference => {
            resolve_reference(arena, interner, errors, node);
            node
        }
        TokenKind::Nominal => resolve_nominal(arena, interner, errors, node),
        _ => node,
    }
}

fn resolve_reference(arena: &mut NodeArena, interner: &Interner, errors: &mut Errors, node: NodeId) {
    let name_node = arena.child(node, 0);
    let sym = match arena.kind(name_node) {
        TokenKind::Identifier(sym) => sym,
        _ => return,
    };
    match arena.lookup(node, sym) {
        Some((_, def, _)) => arena.set_data(node, NodeData::Def(def)),
        None => {
            let span = arena.get(node).span;
            let text = interner.resolve(sym);
            errors.push(Diagnostic::error(ErrorKind::NameNotFound, span, format!("cannot find '{text}' in scope")));
        }
    }
}

/// Resolves a `nominal` type node. Already-attached `data` (set by an
/// earlier pass, e.g. the `none` nominal the sugar pass synthesizes for
/// a bare result type) is left alone only if it already names an
/// entity; otherwise the name is looked up fresh.
fn resolve_nominal(arena: &mut NodeArena, interner: &mut Interner, errors: &mut Errors, node: NodeId) -> NodeId {
    let name_node = nominal_name(arena, node);
    let sym = match arena.kind(name_node) {
        TokenKind::Identifier(sym) => sym,
        _ => return node,
    };

    let found = arena.lookup(node, sym);
    let Some((_, def, _)) = found else {
        let span = arena.get(node).span;
        let text = interner.resolve(sym);
        errors.push(Diagnostic::error(ErrorKind::NameNotFound, span, format!("cannot find type '{text}' in scope")));
        return node;
    };

    match arena.kind(def) {
        TokenKind::TypeParamDecl => {
            let cap_marker = arena.child(node, 3);
            let explicit_cap = !arena.get(cap_marker).is_none_node();
            let cap = if explicit_cap { nominal_cap(arena, node) } else { typeparam_decl_default_cap(arena, def) };
            let eph = nominal_ephemeral(arena, node);
            let replacement = make_typeparamref(arena, name_node, cap, eph, def);
            arena.replace(node, replacement);
            replacement
        }
        TokenKind::TypeKw => {
            let reified = resolve_alias_reference(arena, interner, errors, node, def);
            arena.replace(node, reified);
            reified
        }
        k if is_entity_kind(k) => {
            arena.set_data(node, NodeData::Def(def));
            node
        }
        _ => node,
    }
}

/// Inlines a reference to a `type` alias: resolves the alias's own
/// right-hand side (idempotent thanks to the pass-reached mask, so
/// this is safe to call ahead of the generic top-down walk reaching the
/// alias's `TypeKw` node on its own), then reifies it against the
/// alias's type parameters and this use site's type arguments (root
/// spec §4.5, §4.10). Detects a self-referential alias chain via
/// `AliasState`, reporting `RecursiveAlias` at most once per cycle.
fn resolve_alias_reference(
    arena: &mut NodeArena,
    interner: &mut Interner,
    errors: &mut Errors,
    use_site: NodeId,
    alias: NodeId,
) -> NodeId {
    let state = arena.data(alias).as_alias_state().unwrap_or(AliasState::Initial);

    if state == AliasState::InProgress {
        let span = arena.get(use_site).span;
        errors.push(Diagnostic::error(ErrorKind::RecursiveAlias, span, "type alias refers to itself"));
        arena.set_data(alias, NodeData::Alias(AliasState::Done));
        return make_error_type(arena);
    }

    let rhs = arena.child(alias, 2);
    if state == AliasState::Initial {
        arena.set_data(alias, NodeData::Alias(AliasState::InProgress));
        walk(arena, interner, errors, rhs);
        arena.set_data(alias, NodeData::Alias(AliasState::Done));
    }

    let typeparams_node = arena.child(alias, 1);
    let type_params: Vec<NodeId> = arena.children(typeparams_node).to_vec();
    let type_args: Vec<NodeId> = nominal_typeargs(arena, use_site).to_vec();

    let use_eph = nominal_ephemeral(arena, use_site);
    let reified = reify(arena, rhs, &type_params, &type_args);
    override_ephemeral(arena, reified, use_eph);
    reified
}

/// A use site's own ephemeral marker (`Foo'` vs `Foo` vs `Foo!`) applies
/// to whatever the alias expands to, the same way reification preserves
/// a substituted `typeparamref`'s ephemeral marker.
fn override_ephemeral(arena: &mut NodeArena, node: NodeId, eph: Ephemeral) {
    if eph == Ephemeral::Normal {
        return;
    }
    match arena.kind(node) {
        TokenKind::Nominal => {
            let old = arena.child(node, 4);
            let new = ember_types::shape::build_ephemeral_marker(arena, eph);
            arena.replace(old, new);
        }
        TokenKind::TypeParamRef => {
            let old = arena.child(node, 2);
            let new = ember_types::shape::build_ephemeral_marker(arena, eph);
            arena.replace(old, new);
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_types::cap::Cap;
    use ember_types::shape::{nominal_def, typeparamref_def};

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

    fn run_through_resolve(arena: &mut NodeArena, interner: &mut Interner, errors: &mut Errors, root: NodeId) {
        crate::sugar::run(arena, interner, root);
        crate::scope::run(arena, interner, errors, root);
        run(arena, interner, errors, root);
    }

    #[test]
    fn reference_binds_to_enclosing_parameter() {
        let (mut arena, mut interner, root) = parse("class ref Thing\n  fun go(x: U32): U32\n    x\n  end\nend\nprimitive val U32 end\n");
        let mut errors = Errors::new();
        run_through_resolve(&mut arena, &mut interner, &mut errors, root);
        assert!(!errors.has_errors());
    }

    #[test]
    fn unbound_reference_is_reported() {
        let (mut arena, mut interner, root) = parse("class ref Thing\n  fun go(): U32\n    missing\n  end\nend\nprimitive val U32 end\n");
        let mut errors = Errors::new();
        run_through_resolve(&mut arena, &mut interner, &mut errors, root);
        assert_eq!(errors.of_kind(ErrorKind::NameNotFound).count(), 1);
    }

    #[test]
    fn nominal_attaches_entity_def() {
        let (mut arena, mut interner, root) =
            parse("class ref Thing\n  var f: Other = Other\nend\nclass ref Other\nend\n");
        let mut errors = Errors::new();
        run_through_resolve(&mut arena, &mut interner, &mut errors, root);
        assert!(!errors.has_errors());
        let package = arena.children(root)[0];
        let thing = arena.children(package)[0];
        let field = ember_ast::entity::entity_members(&arena, thing)[0];
        let ty = ember_ast::entity::field_type(&arena, field);
        assert!(nominal_def(&arena, ty).is_some());
    }

    #[test]
    fn nominal_naming_a_typeparam_becomes_typeparamref() {
        let (mut arena, mut interner, root) = parse("class ref Box[T]\n  var v: T\nend\n");
        let mut errors = Errors::new();
        run_through_resolve(&mut arena, &mut interner, &mut errors, root);
        assert!(!errors.has_errors());
        let package = arena.children(root)[0];
        let entity = arena.children(package)[0];
        let field = ember_ast::entity::entity_members(&arena, entity)[0];
        let ty = ember_ast::entity::field_type(&arena, field);
        assert_eq!(arena.kind(ty), TokenKind::TypeParamRef);
        assert!(typeparamref_def(&arena, ty).is_some());
    }

    #[test]
    fn unresolved_typeparam_cap_falls_back_to_constraint_default() {
        let (mut arena, mut interner, root) = parse("class ref Box[T: Any val]\n  var v: T\nend\nclass ref Any end\n");
        let mut errors = Errors::new();
        run_through_resolve(&mut arena, &mut interner, &mut errors, root);
        let package = arena.children(root)[0];
        let entity = arena.children(package)[0];
        let field = ember_ast::entity::entity_members(&arena, entity)[0];
        let ty = ember_ast::entity::field_type(&arena, field);
        assert_eq!(ember_types::shape::typeparamref_cap(&arena, ty), Cap::Val);
    }

    #[test]
    fn self_referential_alias_is_rejected() {
        let (mut arena, mut interner, root) = parse("type Loop = Loop\nclass ref Anchor\n  var v: Loop\nend\n");
        let mut errors = Errors::new();
        run_through_resolve(&mut arena, &mut interner, &mut errors, root);
        assert!(errors.of_kind(ErrorKind::RecursiveAlias).count() >= 1);
    }
}
