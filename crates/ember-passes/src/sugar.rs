//! Sugar/desugar rewrites (component E, root spec §4.3).
//!
//! Everything here runs before the scope builder, so every rewrite must
//! produce a tree the parser itself could, in principle, have produced —
//! sugar never invents a shape the BNF doesn't already know about
//! (idempotence, root spec §4.3 invariant).
//!
//! Object literals are the one desugar the root spec lists here but this
//! pass deliberately does not perform: `{ name = expr, ... }` carries no
//! type annotation this grammar could rewrite blindly into a named
//! constructor call, so picking the target entity is deferred to the
//! expression typer (§4.12), which has the surrounding expected-type
//! context (an assignment's left side, a field's declared type, a call
//! argument's parameter type) that sugar does not.

use ember_ast::entity::{entity_cap_marker, is_entity_kind, is_method_kind, make_field, method_name, method_result};
use ember_ast::{NodeArena, NodeId, TokenKind};
use ember_base::{Interner, Symbol};
use ember_types::cap::Cap;
use ember_types::shape::{build_cap_marker, make_nominal, read_cap_marker};

use crate::builders::{make_dot_call, make_ident, make_named_arg, make_reference, make_seq};
use crate::pass_manager::{mark, Pass};

const PASS: Pass = Pass::Sugar;

pub fn run(arena: &mut NodeArena, interner: &mut Interner, root: NodeId) {
    walk(arena, interner, root);
}

fn walk(arena: &mut NodeArena, interner: &mut Interner, node: NodeId) {
    if arena.get(node).flags.reached(PASS.index()) {
        return;
    }

    let kind = arena.kind(node);
    if is_entity_kind(kind) {
        default_entity_cap(arena, interner, node);
    } else if is_method_kind(kind) {
        default_constructor_name(arena, interner, node, kind);
        default_result_type(arena, interner, node);
    }

    mark(arena, node, PASS);

    let children: Vec<NodeId> = arena.children(node).to_vec();
    for child in children {
        let child = desugar_in_place(arena, interner, child);
        walk(arena, interner, child);
    }
}

/// One-shot tree-shape rewrites that replace `node` with something else
/// entirely. Returns the id to recurse into afterwards (the replacement,
/// or `node` unchanged if no rewrite applied here).
fn desugar_in_place(arena: &mut NodeArena, interner: &mut Interner, node: NodeId) -> NodeId {
    match arena.kind(node) {
        TokenKind::ForLoop => desugar_for_loop(arena, interner, node),
        TokenKind::Assignment => desugar_update_assignment(arena, interner, node),
        TokenKind::ArrayLiteral => desugar_array_literal(arena, interner, node),
        _ => node,
    }
}

/// class→ref, actor→tag, primitive/struct→val, trait/interface→ref.
fn default_cap_for_entity(kind: TokenKind) -> Cap {
    match kind {
        TokenKind::ClassKw => Cap::Ref,
        TokenKind::Actor => Cap::Tag,
        TokenKind::Primitive | TokenKind::Struct => Cap::Val,
        TokenKind::Trait | TokenKind::Interface => Cap::Ref,
        _ => Cap::Ref,
    }
}

fn default_entity_cap(arena: &mut NodeArena, _interner: &mut Interner, entity: NodeId) {
    let marker = entity_cap_marker(arena, entity);
    if arena.get(marker).is_none_node() {
        let cap = default_cap_for_entity(arena.kind(entity));
        let replacement = build_cap_marker(arena, cap);
        arena.replace(marker, replacement);
    }
}

/// A `new`/`be`/`fun` parsed with an empty placeholder name (the
/// parser's `expect_identifier` recovery symbol, root spec §4.2) takes
/// the entity-kind's default: `create` for `new`, `apply` for `be`/`fun`.
fn default_constructor_name(arena: &mut NodeArena, interner: &mut Interner, method: NodeId, kind: TokenKind) {
    let name_node = method_name(arena, method);
    if let TokenKind::Identifier(sym) = arena.kind(name_node) {
        if sym == Symbol::EMPTY {
            let default = if kind == TokenKind::New { "create" } else { "apply" };
            let sym = interner.intern(default);
            arena.get_mut(name_node).kind = TokenKind::Identifier(sym);
        }
    }
}

/// A method with no explicit result type parses to `infer`; sugar pins
/// that down to the stdlib unit type `None` rather than leaving it open
/// for the literal unifier/typer to chase.
fn default_result_type(arena: &mut NodeArena, interner: &mut Interner, method: NodeId) {
    let result = method_result(arena, method);
    if arena.kind(result) == TokenKind::InferType {
        let none_sym = interner.intern("None");
        let span = arena.get(result).span;
        let replacement = make_nominal(arena, None, make_ident(arena, none_sym, span), Vec::new(), Cap::Val, ember_types::cap::Ephemeral::Normal, None);
        arena.get_mut(replacement).span = span;
        arena.replace(result, replacement);
    }
}

/// `for x in e do body end` → `{ let $tmp = e ; while $tmp.has_next() do
/// let x = $tmp.next() ; body end }` (root spec §4.3).
fn desugar_for_loop(arena: &mut NodeArena, interner: &mut Interner, for_loop: NodeId) -> NodeId {
    let span = arena.get(for_loop).span;
    let children = arena.children(for_loop).to_vec();
    let (var_name, iterable, body) = (children[0], children[1], children[2]);

    let tmp_sym = interner.intern("$for_iter");
    let tmp_ident = make_ident(arena, tmp_sym, span);
    let tmp_ident_decl = make_ident(arena, tmp_sym, span);
    let infer_ty = ember_types::shape::make_infer_type(arena);
    let let_tmp = make_field(arena, TokenKind::Let, tmp_ident_decl, infer_ty, Some(iterable));

    let has_next_sym = interner.intern("has_next");
    let has_next_name = make_ident(arena, has_next_sym, span);
    let tmp_ref_cond = make_reference(arena, tmp_ident, span);
    let cond = make_dot_call(arena, tmp_ref_cond, has_next_name, Vec::new(), span);

    let next_sym = interner.intern("next");
    let next_name = make_ident(arena, next_sym, span);
    let tmp_ref_next = make_reference(arena, make_ident(arena, tmp_sym, span), span);
    let next_call = make_dot_call(arena, tmp_ref_next, next_name, Vec::new(), span);
    let var_infer_ty = ember_types::shape::make_infer_type(arena);
    let let_var = make_field(arena, TokenKind::Let, var_name, var_infer_ty, Some(next_call));

    let body_stmts = arena.children(body).to_vec();
    let mut while_body_stmts = vec![let_var];
    while_body_stmts.extend(body_stmts);
    let while_body = make_seq(arena, while_body_stmts, span);

    let while_node = arena.alloc(TokenKind::While, span);
    arena.set_children(while_node, vec![cond, while_body]);

    let outer = make_seq(arena, vec![let_tmp, while_node], span);
    arena.replace(for_loop, outer);
    outer
}

/// `a(i) = v` parses as `Assignment(Call(a, typeargs, [i]), v)` (root
/// spec §4.2's permissive grouping); the sugar pass rewrites it into
/// `a.update(i, value = v)` so the scope builder onward never has to know
/// a call can appear on an assignment's left side at all.
fn desugar_update_assignment(arena: &mut NodeArena, interner: &mut Interner, assignment: NodeId) -> NodeId {
    let children = arena.children(assignment).to_vec();
    let (lhs, rhs) = (children[0], children[1]);
    if arena.kind(lhs) != TokenKind::Call {
        return assignment;
    }
    let span = arena.get(assignment).span;
    let call_children = arena.children(lhs).to_vec();
    let (callee, _typeargs_node, args_node) = (call_children[0], call_children[1], call_children[2]);
    let mut args = arena.children(args_node).to_vec();

    let value_sym = interner.intern("value");
    let value_name = make_ident(arena, value_sym, span);
    let named_value = make_named_arg(arena, value_name, rhs, span);
    args.push(named_value);

    let update_sym = interner.intern("update");
    let update_name = make_ident(arena, update_sym, span);
    let replacement = make_dot_call(arena, callee, update_name, args, span);
    arena.replace(assignment, replacement);
    replacement
}

/// `[e1, e2, ...]` → a block building an `Array` via `create`/`push`,
/// evaluating to the populated array. The element type is left to
/// ordinary call-argument inference on the `push` calls (root spec
/// §4.11); this rewrite is purely structural and does not need it.
fn desugar_array_literal(arena: &mut NodeArena, interner: &mut Interner, literal: NodeId) -> NodeId {
    let span = arena.get(literal).span;
    let elems = arena.children(literal).to_vec();

    let array_sym = interner.intern("Array");
    let array_name = make_ident(arena, array_sym, span);
    let array_ty_ref = make_reference(arena, array_name, span);
    let create_sym = interner.intern("create");
    let create_name = make_ident(arena, create_sym, span);
    let create_call = make_dot_call(arena, array_ty_ref, create_name, Vec::new(), span);

    let tmp_sym = interner.intern("$array_tmp");
    let tmp_decl_name = make_ident(arena, tmp_sym, span);
    let infer_ty = ember_types::shape::make_infer_type(arena);
    let let_tmp = make_field(arena, TokenKind::Let, tmp_decl_name, infer_ty, Some(create_call));

    let push_sym = interner.intern("push");
    let mut stmts = vec![let_tmp];
    for elem in elems {
        let tmp_ref = make_reference(arena, make_ident(arena, tmp_sym, span), span);
        let push_name = make_ident(arena, push_sym, span);
        let push_call = make_dot_call(arena, tmp_ref, push_name, vec![elem], span);
        stmts.push(push_call);
    }
    let final_ref = make_reference(arena, make_ident(arena, tmp_sym, span), span);
    stmts.push(final_ref);

    let seq = make_seq(arena, stmts, span);
    arena.replace(literal, seq);
    seq
}

#[allow(dead_code)]
fn read_explicit_cap(arena: &NodeArena, marker: NodeId) -> Option<Cap> {
    if arena.get(marker).is_none_node() {
        None
    } else {
        Some(read_cap_marker(arena, marker))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_ast::entity::{entity_members, method_body, method_name as mname};

    fn parse(source: &str) -> (NodeArena, Interner, NodeId) {
        let mut arena = NodeArena::new();
        let mut interner = Interner::new();
        let mut errors = Errors::new();
        let root = ember_parser::parse_program(source, 0, ember_lexer::LexerOptions::default(), &mut arena, &mut interner, &mut errors);
        assert!(!errors.has_errors());
        (arena, interner, root)
    }

    #[test]
    fn default_cap_fills_unmarked_class() {
        let (mut arena, mut interner, root) = parse("class Counter end");
        run(&mut arena, &mut interner, root);
        let package = arena.children(root)[0];
        let entity = arena.children(package)[0];
        assert_eq!(read_cap_marker(&arena, entity_cap_marker(&arena, entity)), Cap::Ref);
    }

    #[test]
    fn default_cap_for_actor_is_tag() {
        let (mut arena, mut interner, root) = parse("actor Main end");
        run(&mut arena, &mut interner, root);
        let package = arena.children(root)[0];
        let entity = arena.children(package)[0];
        assert_eq!(read_cap_marker(&arena, entity_cap_marker(&arena, entity)), Cap::Tag);
    }

    #[test]
    fn missing_result_type_becomes_none() {
        let (mut arena, mut interner, root) = parse("class ref Thing\n  fun go()\n  end\nend");
        run(&mut arena, &mut interner, root);
        let package = arena.children(root)[0];
        let entity = arena.children(package)[0];
        let method = entity_members(&arena, entity)[0];
        let result = method_result(&arena, method);
        assert_eq!(arena.kind(result), TokenKind::Nominal);
    }

    #[test]
    fn for_loop_desugars_to_seq_with_while() {
        let (mut arena, mut interner, root) = parse(
            "class ref Thing\n  fun go()\n    for x in xs do\n      x\n    end\n  end\nend",
        );
        run(&mut arena, &mut interner, root);
        let package = arena.children(root)[0];
        let entity = arena.children(package)[0];
        let method = entity_members(&arena, entity)[0];
        let body = method_body(&arena, method).unwrap();
        let stmt = arena.children(body)[0];
        assert_eq!(arena.kind(stmt), TokenKind::Seq);
        let stmts = arena.children(stmt);
        assert_eq!(arena.kind(stmts[0]), TokenKind::Let);
        assert_eq!(arena.kind(stmts[1]), TokenKind::While);
    }

    #[test]
    fn array_literal_desugars_to_create_and_push_chain() {
        let (mut arena, mut interner, root) = parse("class ref Thing\n  fun go()\n    [1, 2, 3]\n  end\nend");
        run(&mut arena, &mut interner, root);
        let package = arena.children(root)[0];
        let entity = arena.children(package)[0];
        let method = entity_members(&arena, entity)[0];
        let body = method_body(&arena, method).unwrap();
        let stmt = arena.children(body)[0];
        assert_eq!(arena.kind(stmt), TokenKind::Seq);
        let stmts = arena.children(stmt);
        // let $tmp = Array.create() ; push ; push ; push ; $tmp
        assert_eq!(stmts.len(), 5);
        assert_eq!(arena.kind(stmts[0]), TokenKind::Let);
    }

    #[test]
    fn assignment_to_a_call_desugars_to_update() {
        let (mut arena, mut interner, root) = parse("class ref Thing\n  fun go()\n    a(0) = 1\n  end\nend");
        run(&mut arena, &mut interner, root);
        let package = arena.children(root)[0];
        let entity = arena.children(package)[0];
        let method = entity_members(&arena, entity)[0];
        let body = method_body(&arena, method).unwrap();
        let stmt = arena.children(body)[0];
        assert_eq!(arena.kind(stmt), TokenKind::DotCall);
        let name_node = arena.children(stmt)[1];
        assert!(matches!(arena.kind(name_node), TokenKind::Identifier(_)));
    }
}
