//! Scope building (component F, root spec §4.4).
//!
//! One top-down walk. Every node that the root spec calls out as scope-
//! introducing (`package`, an entity, a method, a `seq`) gets its own
//! [`ember_ast::Symtab`] via [`ember_ast::NodeArena::symtab_mut`]; every
//! other node relies on [`ember_ast::NodeArena::lookup`] walking up to
//! the nearest ancestor that has one.

use ember_ast::entity::{
    entity_members, entity_name, entity_typeparams, field_default, field_name, is_entity_kind, is_field_kind,
    is_method_kind, method_name, method_params, method_typeparams, param_name,
};
use ember_ast::{NodeArena, NodeId, SymbolStatus, TokenKind};
use ember_base::{Interner, Symbol};
use ember_diag::{Diagnostic, ErrorKind, Errors};
use ember_types::shape::typeparam_decl_name;

use crate::pass_manager::{mark, Pass};

const PASS: Pass = Pass::ScopeBuilder;

pub fn run(arena: &mut NodeArena, interner: &mut Interner, errors: &mut Errors, root: NodeId) {
    walk(arena, interner, errors, root);
}

fn walk(arena: &mut NodeArena, interner: &mut Interner, errors: &mut Errors, node: NodeId) {
    if arena.get(node).flags.reached(PASS.index()) {
        return;
    }

    match arena.kind(node) {
        TokenKind::Package => build_package_scope(arena, interner, errors, node),
        k if is_entity_kind(k) => build_entity_scope(arena, interner, errors, node),
        k if is_method_kind(k) => build_method_scope(arena, interner, errors, node),
        TokenKind::TypeKw => build_alias_scope(arena, interner, errors, node),
        TokenKind::Seq => build_seq_scope(arena, interner, errors, node),
        _ => {}
    }

    mark(arena, node, PASS);

    let children: Vec<NodeId> = arena.children(node).to_vec();
    for child in children {
        walk(arena, interner, errors, child);
    }
}

/// Inserts `name_node`'s symbol into `scope`'s symtab, reporting
/// `DuplicateName` for an exact repeat and `CaseClash` for a distinct
/// spelling that differs from an existing entry only by letter case
/// (root spec §4.4).
fn insert_checked(
    arena: &mut NodeArena,
    interner: &Interner,
    errors: &mut Errors,
    scope: NodeId,
    name_node: NodeId,
    def: NodeId,
    status: SymbolStatus,
) {
    let sym = match arena.kind(name_node) {
        TokenKind::Identifier(sym) => sym,
        _ => return,
    };
    if sym == Symbol::EMPTY {
        return;
    }
    let span = arena.get(name_node).span;
    let text = interner.resolve(sym).to_string();

    let tab = arena.symtab_mut(scope);
    if tab.contains(sym) {
        errors.push(Diagnostic::error(
            ErrorKind::DuplicateName,
            span,
            format!("'{text}' is already defined in this scope"),
        ));
        return;
    }
    let clash = tab.names().find(|&existing| {
        let other = interner.resolve(existing);
        other != text && other.eq_ignore_ascii_case(&text)
    });
    if let Some(existing) = clash {
        let other = interner.resolve(existing).to_string();
        errors.push(Diagnostic::error(
            ErrorKind::CaseClash,
            span,
            format!("'{text}' differs from '{other}' only by case"),
        ));
        return;
    }
    arena.symtab_mut(scope).insert(sym, def, status);
}

fn build_package_scope(arena: &mut NodeArena, interner: &Interner, errors: &mut Errors, package: NodeId) {
    let items = arena.children(package).to_vec();
    for item in items {
        match arena.kind(item) {
            k if is_entity_kind(k) => {
                let name = entity_name(arena, item);
                insert_checked(arena, interner, errors, package, name, item, SymbolStatus::Defined);
            }
            TokenKind::TypeKw => {
                let name = arena.child(item, 0);
                insert_checked(arena, interner, errors, package, name, item, SymbolStatus::Defined);
            }
            _ => {}
        }
    }
}

fn build_entity_scope(arena: &mut NodeArena, interner: &Interner, errors: &mut Errors, entity: NodeId) {
    for tp in entity_typeparams(arena, entity).to_vec() {
        let name = typeparam_decl_name(arena, tp);
        insert_checked(arena, interner, errors, entity, name, tp, SymbolStatus::Defined);
    }
    for member in entity_members(arena, entity).to_vec() {
        let kind = arena.kind(member);
        if is_field_kind(kind) {
            let name = field_name(arena, member);
            insert_checked(arena, interner, errors, entity, name, member, SymbolStatus::Defined);
        } else if is_method_kind(kind) {
            let name = method_name(arena, member);
            insert_checked(arena, interner, errors, entity, name, member, SymbolStatus::Defined);
        }
    }
}

/// A `type` alias's own type parameters get their own symtab on the
/// `TypeKw` node, exactly like an entity's, so references inside the
/// alias's right-hand side resolve to them (root spec §4.5 alias
/// inlining needs this before it can reify the right-hand side against
/// the caller's type arguments).
fn build_alias_scope(arena: &mut NodeArena, interner: &Interner, errors: &mut Errors, alias: NodeId) {
    let typeparams_node = arena.child(alias, 1);
    for tp in arena.children(typeparams_node).to_vec() {
        let name = typeparam_decl_name(arena, tp);
        insert_checked(arena, interner, errors, alias, name, tp, SymbolStatus::Defined);
    }
}

/// `pub(crate)` so the trait flattener (root spec §4.6 Stage 4) can
/// rebuild a method's own scope after grafting a copy-and-reified
/// default body onto it — "a freshly attached body must have its symbol
/// tables rebuilt" (root spec §4.6).
pub(crate) fn build_method_scope(arena: &mut NodeArena, interner: &Interner, errors: &mut Errors, method: NodeId) {
    for tp in method_typeparams(arena, method).to_vec() {
        let name = typeparam_decl_name(arena, tp);
        insert_checked(arena, interner, errors, method, name, tp, SymbolStatus::Defined);
    }
    for param in method_params(arena, method).to_vec() {
        let name = param_name(arena, param);
        insert_checked(arena, interner, errors, method, name, param, SymbolStatus::Defined);
    }
}

/// A `seq`'s direct statement children may be `let`/`var` local
/// declarations (parsed with the same shape as a field, root spec §4.4).
/// A parameter is always `defined`; a local starts `defined` only when
/// it is declared with an initializer, `undefined` otherwise (root spec
/// §4.4, §3.3).
fn build_seq_scope(arena: &mut NodeArena, interner: &Interner, errors: &mut Errors, seq: NodeId) {
    for stmt in arena.children(seq).to_vec() {
        let kind = arena.kind(stmt);
        if kind == TokenKind::Let || kind == TokenKind::Var {
            let name = field_name(arena, stmt);
            let status = if field_default(arena, stmt).is_some() {
                SymbolStatus::Defined
            } else {
                SymbolStatus::Undefined
            };
            insert_checked(arena, interner, errors, seq, name, stmt, status);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_ast::entity::entity_members;

    fn parse(source: &str) -> (NodeArena, Interner, NodeId) {
        let mut arena = NodeArena::new();
        let mut interner = Interner::new();
        let mut errors = Errors::new();
        let root = ember_parser::parse_program(source, 0, ember_lexer::LexerOptions::default(), &mut arena, &mut interner, &mut errors);
        assert!(!errors.has_errors());
        (arena, interner, root)
    }

    #[test]
    fn package_scope_binds_entity_names() {
        let (mut arena, mut interner, root) = parse("class ref Counter end");
        let mut errors = Errors::new();
        crate::sugar::run(&mut arena, &mut interner, root);
        run(&mut arena, &mut interner, &mut errors, root);
        assert!(!errors.has_errors());
        let package = arena.children(root)[0];
        let name_sym = interner.lookup("Counter").unwrap();
        assert!(arena.symtab(package).unwrap().contains(name_sym));
    }

    #[test]
    fn duplicate_field_name_is_rejected() {
        let (mut arena, mut interner, root) = parse("class ref Counter\n  var x: U32 = 0\n  var x: U32 = 1\nend");
        let mut errors = Errors::new();
        crate::sugar::run(&mut arena, &mut interner, root);
        run(&mut arena, &mut interner, &mut errors, root);
        assert!(errors.of_kind(ErrorKind::DuplicateName).count() >= 1);
    }

    #[test]
    fn case_only_clash_is_rejected() {
        let (mut arena, mut interner, root) = parse("class ref Counter\n  var x: U32 = 0\n  var X: U32 = 1\nend");
        let mut errors = Errors::new();
        crate::sugar::run(&mut arena, &mut interner, root);
        run(&mut arena, &mut interner, &mut errors, root);
        assert!(errors.of_kind(ErrorKind::CaseClash).count() >= 1);
    }

    #[test]
    fn let_initialized_local_starts_defined() {
        let (mut arena, mut interner, root) = parse("class ref Thing\n  fun go()\n    let x: U32 = 1\n    x\n  end\nend");
        let mut errors = Errors::new();
        crate::sugar::run(&mut arena, &mut interner, root);
        run(&mut arena, &mut interner, &mut errors, root);
        assert!(!errors.has_errors());
        let package = arena.children(root)[0];
        let entity = arena.children(package)[0];
        let method = entity_members(&arena, entity)[0];
        let body = ember_ast::entity::method_body(&arena, method).unwrap();
        let x_sym = interner.lookup("x").unwrap();
        let (_, _, status) = arena.lookup(body, x_sym).unwrap();
        assert_eq!(status, SymbolStatus::Defined);
    }
}
