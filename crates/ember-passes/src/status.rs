//! Status tracker / verifier (component N, root spec §4.13).
//!
//! The final pass. Earlier passes annotate every node with a type and a
//! straight-line consume/define status (`typer::type_reference`,
//! `typer::type_consume`); this pass re-examines the fully typed tree for
//! the handful of whole-method/whole-entity consistency rules that don't
//! fit a single bottom-up expression walk:
//!
//! - constructor field-init completeness (`FieldNotInit`), tracked with
//!   its own little define/undefine dataflow over just the entity's
//!   no-default fields, joined across branches per the root spec §3.3
//!   lattice — independent of the general-purpose symtab status the
//!   scope builder seeds as `Defined` for every field (that status is
//!   for ordinary reads from *other* methods, where every field is
//!   already known to be initialized by construction);
//! - partial/total agreement between a method's `?` marker and whether
//!   its body can actually error (`NotPartialButErrors` /
//!   `PartialButNeverErrors`);
//! - the structural shape of `Main.create`, `_final`, `_init`, and
//!   `extern` method signatures (`BadMainCreate` / `BadFinal` /
//!   `BadInit` / `BadFFI`);
//! - a local, syntactic unreachable-statement check within a `seq`
//!   (root spec §1.2, supplementing `UnreachableBranch`).

use std::collections::HashMap;

use ember_ast::entity::{
    entity_members, entity_name, entity_typeparams, field_default, field_name, is_entity_kind, is_field_kind,
    is_method_kind, method_body, method_cap_marker, method_name, method_params, method_result, method_typeparams,
    param_name, param_type,
};
use ember_ast::{NodeArena, NodeId, SymbolStatus, TokenKind};
use ember_base::{Interner, Symbol};
use ember_diag::{Diagnostic, ErrorKind, Errors};
use ember_types::cap::Cap;
use ember_types::shape::{nominal_cap, nominal_def, nominal_name, read_cap_marker};

use crate::pass_manager::{mark, Pass};

const PASS: Pass = Pass::StatusTracker;

/// The FFI-safe nominal type names an `extern` method's parameters and
/// result may use (root spec §1.2, §4.13 "FFI structural check").
const FFI_SAFE_NAMES: [&str; 13] = [
    "U8", "U16", "U32", "U64", "I8", "I16", "I32", "I64", "F32", "F64", "Bool", "Pointer", "None",
];

pub fn run(arena: &mut NodeArena, interner: &mut Interner, errors: &mut Errors, root: NodeId) {
    walk(arena, interner, errors, root);
}

fn walk(arena: &mut NodeArena, interner: &mut Interner, errors: &mut Errors, node: NodeId) {
    if arena.get(node).flags.reached(PASS.index()) {
        return;
    }

    match arena.kind(node) {
        TokenKind::Package => check_main(arena, interner, errors, node),
        k if is_entity_kind(k) => check_entity(arena, interner, errors, node),
        TokenKind::Seq => check_unreachable(arena, errors, node),
        _ => {}
    }

    mark(arena, node, PASS);

    let children: Vec<NodeId> = arena.children(node).to_vec();
    for child in children {
        walk(arena, interner, errors, child);
    }
}

fn ident_symbol(arena: &NodeArena, node: NodeId) -> Option<Symbol> {
    match arena.kind(node) {
        TokenKind::Identifier(sym) => Some(sym),
        _ => None,
    }
}

/// A statement kind after which any sibling in the same `seq` can never
/// run (root spec §1.2 "Unreachable-branch checking"): local and
/// syntactic, no dataflow divergence analysis.
fn is_divergent_stmt(kind: TokenKind) -> bool {
    matches!(kind, TokenKind::Return | TokenKind::Break | TokenKind::Continue | TokenKind::ErrorKw)
}

fn check_unreachable(arena: &NodeArena, errors: &mut Errors, seq: NodeId) {
    let children = arena.children(seq);
    let mut diverged = false;
    for &stmt in children {
        if diverged {
            errors.push(Diagnostic::error(ErrorKind::UnreachableBranch, arena.get(stmt).span, "statement is unreachable"));
        } else if is_divergent_stmt(arena.kind(stmt)) {
            diverged = true;
        }
    }
}

fn check_entity(arena: &mut NodeArena, interner: &mut Interner, errors: &mut Errors, entity: NodeId) {
    let members: Vec<NodeId> = entity_members(arena, entity).to_vec();
    for &member in &members {
        if !is_method_kind(arena.kind(member)) {
            continue;
        }
        check_partial_total(arena, errors, member);
        if arena.kind(member) == TokenKind::New {
            check_constructor_field_init(arena, interner, errors, entity, member);
        }
        check_final(arena, interner, errors, entity, member);
        check_init(arena, interner, errors, entity, member);
        check_ffi(arena, interner, errors, member);
    }
}

/// `NotPartialButErrors` / `PartialButNeverErrors` (root spec §4.13):
/// compares a method's `?` marker against whether its (fully typed)
/// body's `can_error` flag actually ended up set.
fn check_partial_total(arena: &NodeArena, errors: &mut Errors, method: NodeId) {
    if arena.get(method).flags.is_extern {
        return;
    }
    let Some(body) = method_body(arena, method) else { return };
    let can_error = arena.get(body).flags.can_error;
    let partial = arena.get(method).flags.partial;
    let span = arena.get(method).span;
    if partial && !can_error {
        errors.push(Diagnostic::error(
            ErrorKind::PartialButNeverErrors,
            span,
            "method is declared partial ('?') but its body can never raise an error",
        ));
    } else if !partial && can_error {
        errors.push(Diagnostic::error(
            ErrorKind::NotPartialButErrors,
            span,
            "method can raise an error but is not declared partial ('?')",
        ));
    }
}

/// Constructor completeness (root spec §4.13, §8.1 testable property 6):
/// every field with no default value must be `Defined` at every
/// `return` and at the constructor's end.
///
/// Tracked independently of the shared entity symtab (which the scope
/// builder seeds `Defined` for every field, for ordinary reads from
/// other methods) with its own small dataflow over just the no-default
/// field names, joined across `if`/`while`/`try`/`match` branches per
/// the §3.3 lattice.
fn check_constructor_field_init(arena: &mut NodeArena, interner: &mut Interner, errors: &mut Errors, entity: NodeId, method: NodeId) {
    let Some(body) = method_body(arena, method) else { return };

    let required: HashMap<Symbol, NodeId> = entity_members(arena, entity)
        .iter()
        .copied()
        .filter(|&m| is_field_kind(arena.kind(m)) && field_default(arena, m).is_none())
        .filter_map(|m| ident_symbol(arena, field_name(arena, m)).map(|s| (s, m)))
        .collect();
    if required.is_empty() {
        return;
    }

    let initial: HashMap<Symbol, SymbolStatus> = required.keys().map(|&s| (s, SymbolStatus::Undefined)).collect();
    let (exit, diverged) = eval_stmt(arena, interner, errors, &required, body, initial);
    if !diverged {
        check_all_defined(arena, interner, errors, &required, &exit, arena.get(method).span);
    }
}

/// Evaluates one statement's effect on the field-init dataflow state,
/// returning the exit state and whether this statement diverges (a
/// `return`/`break`/`continue`/`error` that makes any sibling after it
/// in the same `seq` unreachable, per [`check_unreachable`]).
fn eval_stmt(
    arena: &NodeArena,
    interner: &Interner,
    errors: &mut Errors,
    required: &HashMap<Symbol, NodeId>,
    node: NodeId,
    mut cur: HashMap<Symbol, SymbolStatus>,
) -> (HashMap<Symbol, SymbolStatus>, bool) {
    match arena.kind(node) {
        TokenKind::Seq => {
            let mut diverged = false;
            for &stmt in arena.children(node) {
                if diverged {
                    break;
                }
                let (next, d) = eval_stmt(arena, interner, errors, required, stmt, cur);
                cur = next;
                diverged = d;
            }
            (cur, diverged)
        }
        TokenKind::Assignment => {
            mark_if_field_target(arena, required, node, &mut cur);
            (cur, false)
        }
        TokenKind::Return => {
            check_all_defined(arena, interner, errors, required, &cur, arena.get(node).span);
            (cur, true)
        }
        TokenKind::Break | TokenKind::Continue | TokenKind::ErrorKw => (cur, true),
        TokenKind::If => {
            let cond = arena.child(node, 0);
            let then_b = arena.child(node, 1);
            let else_b = arena.child(node, 2);
            let _ = cond;
            let (then_exit, then_div) = eval_stmt(arena, interner, errors, required, then_b, cur.clone());
            let (else_exit, else_div) = if arena.get(else_b).is_none_node() {
                (cur.clone(), false)
            } else {
                eval_stmt(arena, interner, errors, required, else_b, cur)
            };
            join_branches(required, then_exit, then_div, else_exit, else_div)
        }
        TokenKind::While => {
            let body = arena.child(node, 1);
            let (body_exit, _) = eval_stmt(arena, interner, errors, required, body, cur.clone());
            (join(&cur, &body_exit, required), false)
        }
        TokenKind::Try => {
            let body = arena.child(node, 0);
            let else_b = arena.child(node, 1);
            let (body_exit, body_div) = eval_stmt(arena, interner, errors, required, body, cur.clone());
            if arena.get(else_b).is_none_node() {
                (body_exit, body_div)
            } else {
                let (else_exit, else_div) = eval_stmt(arena, interner, errors, required, else_b, cur);
                join_branches(required, body_exit, body_div, else_exit, else_div)
            }
        }
        TokenKind::Match => {
            let children = arena.children(node);
            let mut acc: Option<(HashMap<Symbol, SymbolStatus>, bool)> = None;
            for &case in &children[1..] {
                let body = arena.child(case, 2);
                let (exit, div) = eval_stmt(arena, interner, errors, required, body, cur.clone());
                acc = Some(match acc {
                    None => (exit, div),
                    Some((acc_map, acc_div)) => join_branches(required, acc_map, acc_div, exit, div),
                });
            }
            acc.unwrap_or((cur, false))
        }
        TokenKind::Recover => {
            let body = arena.child(node, 1);
            eval_stmt(arena, interner, errors, required, body, cur)
        }
        _ => (cur, false),
    }
}

/// Joins two branch exit states per root spec §3.3's lattice, treating a
/// diverging branch (one that already returned/raised) as contributing
/// nothing to the joined "falls through" state — only a branch that
/// actually reaches the join point constrains it.
fn join_branches(
    required: &HashMap<Symbol, NodeId>,
    a: HashMap<Symbol, SymbolStatus>,
    a_div: bool,
    b: HashMap<Symbol, SymbolStatus>,
    b_div: bool,
) -> (HashMap<Symbol, SymbolStatus>, bool) {
    match (a_div, b_div) {
        (true, true) => (join(&a, &b, required), true),
        (true, false) => (b, false),
        (false, true) => (a, false),
        (false, false) => (join(&a, &b, required), false),
    }
}

fn join(
    a: &HashMap<Symbol, SymbolStatus>,
    b: &HashMap<Symbol, SymbolStatus>,
    required: &HashMap<Symbol, NodeId>,
) -> HashMap<Symbol, SymbolStatus> {
    required
        .keys()
        .map(|&sym| {
            let sa = a.get(&sym).copied().unwrap_or(SymbolStatus::Undefined);
            let sb = b.get(&sym).copied().unwrap_or(SymbolStatus::Undefined);
            (sym, sa.join(sb))
        })
        .collect()
}

fn mark_if_field_target(arena: &NodeArena, required: &HashMap<Symbol, NodeId>, assign: NodeId, cur: &mut HashMap<Symbol, SymbolStatus>) {
    let lhs = arena.child(assign, 0);
    let sym = match arena.kind(lhs) {
        TokenKind::Reference => ident_symbol(arena, arena.child(lhs, 0)),
        TokenKind::FieldRef => {
            let receiver = arena.child(lhs, 0);
            if arena.kind(receiver) == TokenKind::This {
                ident_symbol(arena, arena.child(lhs, 1))
            } else {
                None
            }
        }
        _ => None,
    };
    if let Some(sym) = sym {
        if required.contains_key(&sym) {
            cur.insert(sym, SymbolStatus::Defined);
        }
    }
}

fn check_all_defined(
    arena: &NodeArena,
    interner: &Interner,
    errors: &mut Errors,
    required: &HashMap<Symbol, NodeId>,
    cur: &HashMap<Symbol, SymbolStatus>,
    span: ember_base::Span,
) {
    for (&sym, &field) in required {
        let status = cur.get(&sym).copied().unwrap_or(SymbolStatus::Undefined);
        if status != SymbolStatus::Defined {
            let text = interner.resolve(sym);
            errors.push(
                Diagnostic::error(ErrorKind::FieldNotInit, span, format!("field '{text}' is not initialized before the constructor returns"))
                    .with_note(arena.get(field).span, "field declared here"),
            );
        }
    }
}

fn is_none_result(arena: &NodeArena, interner: &Interner, result: NodeId) -> bool {
    arena.kind(result) == TokenKind::Nominal
        && ident_symbol(arena, nominal_name(arena, result)).map(|s| interner.resolve(s) == "None").unwrap_or(false)
}

/// `_final` on actors/classes must be `fun ref _final()`, no parameters,
/// returning `None`, not partial (root spec §4.13).
fn check_final(arena: &mut NodeArena, interner: &mut Interner, errors: &mut Errors, entity: NodeId, method: NodeId) {
    if !matches!(arena.kind(entity), TokenKind::Actor | TokenKind::ClassKw) {
        return;
    }
    let final_sym = interner.intern("_final");
    if ident_symbol(arena, method_name(arena, method)) != Some(final_sym) {
        return;
    }
    let span = arena.get(method).span;
    let ok = arena.kind(method) == TokenKind::Fun
        && read_cap_marker(arena, method_cap_marker(arena, method)) == Cap::Ref
        && method_params(arena, method).is_empty()
        && method_typeparams(arena, method).is_empty()
        && !arena.get(method).flags.partial
        && is_none_result(arena, interner, method_result(arena, method));
    if !ok {
        errors.push(Diagnostic::error(
            ErrorKind::BadFinal,
            span,
            "'_final' must be 'fun ref _final()' with no parameters, returning None, not partial",
        ));
    }
}

/// `_init` on a primitive with no type parameters must be `fun box
/// _init()`, no parameters, returning `None`, not partial (root spec
/// §4.13).
fn check_init(arena: &mut NodeArena, interner: &mut Interner, errors: &mut Errors, entity: NodeId, method: NodeId) {
    if arena.kind(entity) != TokenKind::Primitive || !entity_typeparams(arena, entity).is_empty() {
        return;
    }
    let init_sym = interner.intern("_init");
    if ident_symbol(arena, method_name(arena, method)) != Some(init_sym) {
        return;
    }
    let span = arena.get(method).span;
    let ok = arena.kind(method) == TokenKind::Fun
        && read_cap_marker(arena, method_cap_marker(arena, method)) == Cap::Box
        && method_params(arena, method).is_empty()
        && method_typeparams(arena, method).is_empty()
        && !arena.get(method).flags.partial
        && is_none_result(arena, interner, method_result(arena, method));
    if !ok {
        errors.push(Diagnostic::error(
            ErrorKind::BadInit,
            span,
            "'_init' must be 'fun box _init()' with no parameters, returning None, not partial",
        ));
    }
}

/// FFI structural check (root spec §1.2, §4.13): an `extern` method's
/// parameters and result must each be one of a fixed FFI-safe nominal
/// set, at `tag` cap or the naming primitive's own default cap.
fn check_ffi(arena: &mut NodeArena, interner: &mut Interner, errors: &mut Errors, method: NodeId) {
    if !arena.get(method).flags.is_extern {
        return;
    }
    let span = arena.get(method).span;
    let mut ok = true;
    for &param in method_params(arena, method) {
        if !is_ffi_safe_type(arena, interner, param_type(arena, param)) {
            ok = false;
        }
    }
    if !is_ffi_safe_type(arena, interner, method_result(arena, method)) {
        ok = false;
    }
    if !ok {
        errors.push(Diagnostic::error(
            ErrorKind::BadFFI,
            span,
            "'extern' method parameters and result must be FFI-safe primitive types",
        ));
    }
}

fn is_ffi_safe_type(arena: &NodeArena, interner: &Interner, ty: NodeId) -> bool {
    if arena.kind(ty) != TokenKind::Nominal {
        return false;
    }
    let Some(name_sym) = ident_symbol(arena, nominal_name(arena, ty)) else { return false };
    if !FFI_SAFE_NAMES.contains(&interner.resolve(name_sym)) {
        return false;
    }
    let cap = nominal_cap(arena, ty);
    if cap == Cap::Tag {
        return true;
    }
    matches!(nominal_def(arena, ty), Some(def) if arena.kind(def) == TokenKind::Primitive) && cap == Cap::Val
}

/// `Main.create(env: Env)` (root spec §4.3, §4.13, §8.3 scenario 1): if
/// the package declares an entity named `Main`, it must be an actor with
/// an exact `new create(env: Env): None` constructor, not partial. A
/// package with no `Main` at all is a library package and is exempt —
/// the external package loader (§1), not this core, knows whether a
/// given compilation is a program build that requires one.
fn check_main(arena: &mut NodeArena, interner: &mut Interner, errors: &mut Errors, package: NodeId) {
    let main_sym = interner.intern("Main");
    let items: Vec<NodeId> = arena.children(package).to_vec();
    let Some(&main_entity) = items
        .iter()
        .find(|&&item| is_entity_kind(arena.kind(item)) && ident_symbol(arena, entity_name(arena, item)) == Some(main_sym))
    else {
        return;
    };

    if arena.kind(main_entity) != TokenKind::Actor {
        errors.push(Diagnostic::error(ErrorKind::BadMainCreate, arena.get(main_entity).span, "'Main' must be an actor"));
        return;
    }

    let create_sym = interner.intern("create");
    let Some(&create_method) = entity_members(arena, main_entity)
        .iter()
        .find(|&&m| is_method_kind(arena.kind(m)) && ident_symbol(arena, method_name(arena, m)) == Some(create_sym))
    else {
        errors.push(Diagnostic::error(
            ErrorKind::BadMainCreate,
            arena.get(main_entity).span,
            "actor 'Main' must define a 'create' constructor",
        ));
        return;
    };

    let env_sym = interner.intern("Env");
    let env_name_sym = interner.intern("env");
    let span = arena.get(create_method).span;

    let mut ok = arena.kind(create_method) == TokenKind::New
        && !arena.get(create_method).flags.partial
        && method_typeparams(arena, create_method).is_empty()
        && is_none_result(arena, interner, method_result(arena, create_method));

    let params = method_params(arena, create_method);
    if params.len() != 1 {
        ok = false;
    } else {
        let param = params[0];
        let name_ok = ident_symbol(arena, param_name(arena, param)) == Some(env_name_sym);
        let ty = param_type(arena, param);
        let type_ok = arena.kind(ty) == TokenKind::Nominal && ident_symbol(arena, nominal_name(arena, ty)) == Some(env_sym);
        ok = ok && name_ok && type_ok;
    }

    if !ok {
        errors.push(Diagnostic::error(
            ErrorKind::BadMainCreate,
            span,
            "'Main.create' must be 'new create(env: Env)' returning None, not partial",
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_ast::NodeArena;

    fn parse(source: &str) -> (NodeArena, Interner, NodeId) {
        let mut arena = NodeArena::new();
        let mut interner = Interner::new();
        let mut errors = Errors::new();
        let root = ember_parser::parse_program(source, 0, ember_lexer::LexerOptions::default(), &mut arena, &mut interner, &mut errors);
        assert!(!errors.has_errors());
        (arena, interner, root)
    }

    fn run_full(arena: &mut NodeArena, interner: &mut Interner, errors: &mut Errors, root: NodeId) {
        crate::sugar::run(arena, interner, root);
        crate::scope::run(arena, interner, errors, root);
        crate::resolve::run(arena, interner, errors, root);
        crate::flatten::run(arena, interner, errors, root);
        let mut cache = ember_types::reify::ReificationCache::default();
        crate::typer::run(arena, interner, errors, root, &mut cache);
        run(arena, interner, errors, root);
    }

    #[test]
    fn constructor_leaving_a_no_default_field_undefined_is_rejected() {
        let (mut arena, mut interner, root) = parse(
            "class ref Counter\n  var x: U32\n  new create() =>\n    None\n  end\nend\nprimitive val U32 end\nprimitive val None end\n",
        );
        let mut errors = Errors::new();
        run_full(&mut arena, &mut interner, &mut errors, root);
        assert!(errors.of_kind(ErrorKind::FieldNotInit).count() >= 1);
    }

    #[test]
    fn constructor_initializing_every_field_is_accepted() {
        let (mut arena, mut interner, root) = parse(
            "class ref Counter\n  var x: U32\n  new create() =>\n    x = 0\n  end\nend\nprimitive val U32 end\nprimitive val None end\n",
        );
        let mut errors = Errors::new();
        run_full(&mut arena, &mut interner, &mut errors, root);
        assert_eq!(errors.of_kind(ErrorKind::FieldNotInit).count(), 0);
    }

    #[test]
    fn constructor_initializing_field_in_only_one_if_branch_is_rejected() {
        let (mut arena, mut interner, root) = parse(
            "class ref Counter\n  var x: U32\n  var b: Bool\n  new create() =>\n    if b then\n      x = 0\n    end\n  end\nend\nprimitive val U32 end\nprimitive val None end\nprimitive val Bool end\n",
        );
        let mut errors = Errors::new();
        run_full(&mut arena, &mut interner, &mut errors, root);
        assert!(errors.of_kind(ErrorKind::FieldNotInit).count() >= 1);
    }

    #[test]
    fn constructor_initializing_field_in_both_if_branches_is_accepted() {
        let (mut arena, mut interner, root) = parse(
            "class ref Counter\n  var x: U32\n  var b: Bool\n  new create() =>\n    if b then\n      x = 0\n    else\n      x = 1\n    end\n  end\nend\nprimitive val U32 end\nprimitive val None end\nprimitive val Bool end\n",
        );
        let mut errors = Errors::new();
        run_full(&mut arena, &mut interner, &mut errors, root);
        assert_eq!(errors.of_kind(ErrorKind::FieldNotInit).count(), 0);
    }

    #[test]
    fn field_with_a_default_value_needs_no_constructor_assignment() {
        let (mut arena, mut interner, root) = parse(
            "class ref Counter\n  var x: U32 = 0\n  new create() =>\n    None\n  end\nend\nprimitive val U32 end\nprimitive val None end\n",
        );
        let mut errors = Errors::new();
        run_full(&mut arena, &mut interner, &mut errors, root);
        assert_eq!(errors.of_kind(ErrorKind::FieldNotInit).count(), 0);
    }

    #[test]
    fn partial_method_whose_body_never_errors_is_rejected() {
        let (mut arena, mut interner, root) =
            parse("class ref Thing\n  fun go()? =>\n    None\n  end\nend\nprimitive val None end\n");
        let mut errors = Errors::new();
        run_full(&mut arena, &mut interner, &mut errors, root);
        assert!(errors.of_kind(ErrorKind::PartialButNeverErrors).count() >= 1);
    }

    #[test]
    fn total_method_whose_body_errors_is_rejected() {
        let (mut arena, mut interner, root) =
            parse("class ref Thing\n  fun go() =>\n    error\n  end\nend\nprimitive val None end\n");
        let mut errors = Errors::new();
        run_full(&mut arena, &mut interner, &mut errors, root);
        assert!(errors.of_kind(ErrorKind::NotPartialButErrors).count() >= 1);
    }

    #[test]
    fn statement_after_return_is_flagged_unreachable() {
        let (mut arena, mut interner, root) =
            parse("class ref Thing\n  fun go(): U32 =>\n    return 1\n    2\n  end\nend\nprimitive val U32 end\n");
        let mut errors = Errors::new();
        run_full(&mut arena, &mut interner, &mut errors, root);
        assert!(errors.of_kind(ErrorKind::UnreachableBranch).count() >= 1);
    }

    #[test]
    fn main_actor_without_create_is_rejected() {
        let (mut arena, mut interner, root) = parse("actor Main end\n");
        let mut errors = Errors::new();
        run_full(&mut arena, &mut interner, &mut errors, root);
        assert!(errors.of_kind(ErrorKind::BadMainCreate).count() >= 1);
    }

    #[test]
    fn main_actor_with_correct_create_is_accepted() {
        let (mut arena, mut interner, root) =
            parse("actor Main\n  new create(env: Env) =>\n    None\n  end\nend\nclass ref Env end\nprimitive val None end\n");
        let mut errors = Errors::new();
        run_full(&mut arena, &mut interner, &mut errors, root);
        assert_eq!(errors.of_kind(ErrorKind::BadMainCreate).count(), 0);
    }

    #[test]
    fn non_actor_main_is_rejected() {
        let (mut arena, mut interner, root) = parse("class ref Main end\n");
        let mut errors = Errors::new();
        run_full(&mut arena, &mut interner, &mut errors, root);
        assert!(errors.of_kind(ErrorKind::BadMainCreate).count() >= 1);
    }
}
