//! Expression typing (component L, root spec §4.12), folding in literal
//! unification (component M, [`ember_types::literal`]) and the
//! capability checks of component J ([`ember_types::cap`]).
//!
//! Unlike the earlier passes, this one is bottom-up over expressions:
//! [`type_expr`] recurses into a node's children before computing the
//! node's own type, since almost every rule (call result, assignment,
//! branch union) needs the operand types first. The outer [`walk`] stays
//! a top-down structural pass — it finds each method/field and hands its
//! body to `type_expr` once, in the method's own lexical context (`this`,
//! the declared result type). `type_expr` marks every node it visits
//! reached for this pass, so the outer walk's generic recursion into an
//! already-typed body is a single reached-mask check, not a second pass
//! over the same subtree.
//!
//! There is no bundled prelude (root spec §1, see also `resolve.rs`):
//! `Bool`, `None`, `String`, and the numeric primitives are ordinary
//! entities the program itself declares. [`Prelude`] is built once up
//! front by scanning the package for entities with those exact names.

use std::collections::HashMap;

use ember_ast::entity::{
    entity_members, entity_name, entity_provides as _entity_provides, entity_typeparams, field_default, field_name,
    field_type, is_entity_kind, is_field_kind, is_method_kind, method_body, method_cap_marker, method_name,
    method_params, method_result, method_typeparams, param_default, param_name, param_type,
};
use ember_ast::{DeferredReification, NodeArena, NodeId, SymbolStatus, TokenKind};
use ember_base::{Interner, Symbol};
use ember_diag::{Diagnostic, ErrorKind, Errors};
use ember_types::assembler;
use ember_types::cap::{Cap, Ephemeral};
use ember_types::literal::{unify_literal, NumericFamilyOracle};
use ember_types::reify::{reify, reify_force, ReificationCache};
use ember_types::shape::{
    build_cap_marker, function_type_params, function_type_result, literal_family, make_error_type, make_infer_type,
    make_nominal, nominal_cap, nominal_def, nominal_ephemeral, nominal_typeargs, typeparamref_cap, LiteralFamily,
};
use ember_types::subtype::is_subtype;

use crate::pass_manager::{mark, Pass};

const PASS: Pass = Pass::ExpressionTyper;

/// The known-by-name entities this core leans on for literals, booleans,
/// strings, and "no value". Built once per compilation by [`build_prelude`].
struct Prelude {
    numeric: HashMap<NodeId, LiteralFamily>,
    bool_def: Option<NodeId>,
    string_def: Option<NodeId>,
    none_def: Option<NodeId>,
}

impl NumericFamilyOracle for Prelude {
    fn family_of(&self, def: NodeId) -> Option<LiteralFamily> {
        self.numeric.get(&def).copied()
    }
}

const INT_NAMES: [&str; 8] = ["I8", "I16", "I32", "I64", "U8", "U16", "U32", "U64"];
const FLOAT_NAMES: [&str; 2] = ["F32", "F64"];

fn build_prelude(arena: &NodeArena, interner: &Interner, root: NodeId) -> Prelude {
    let mut numeric = HashMap::new();
    let mut bool_def = None;
    let mut string_def = None;
    let mut none_def = None;

    let package = arena.child(root, 0);
    for &item in arena.children(package) {
        if !is_entity_kind(arena.kind(item)) {
            continue;
        }
        let Some(sym) = ident_symbol(arena, entity_name(arena, item)) else { continue };
        let text = interner.resolve(sym);
        if INT_NAMES.contains(&text) {
            numeric.insert(item, LiteralFamily::Int);
        } else if FLOAT_NAMES.contains(&text) {
            numeric.insert(item, LiteralFamily::Float);
        } else if text == "Bool" {
            bool_def = Some(item);
        } else if text == "String" {
            string_def = Some(item);
        } else if text == "None" {
            none_def = Some(item);
        }
    }
    Prelude { numeric, bool_def, string_def, none_def }
}

fn ident_symbol(arena: &NodeArena, node: NodeId) -> Option<Symbol> {
    match arena.kind(node) {
        TokenKind::Identifier(sym) => Some(sym),
        _ => None,
    }
}

/// The enclosing method's typing context: `this`'s concrete type, the
/// method's declared result type, and the package node (partial
/// application synthesizes a fresh sibling entity there, root spec
/// §4.12 "partial application").
struct TyCtx {
    this_type: NodeId,
    this_entity: NodeId,
    result_type: NodeId,
    package: NodeId,
}

pub fn run(arena: &mut NodeArena, interner: &mut Interner, errors: &mut Errors, root: NodeId, cache: &mut ReificationCache) {
    let prelude = build_prelude(arena, interner, root);
    let package = arena.child(root, 0);
    walk(arena, interner, errors, &prelude, cache, package, root);
}

/// Top-down structural walk: descends until it finds a method (types its
/// body) or a field (types its default), then lets the reached-mask stop
/// it from redoing any of that subtree.
fn walk(arena: &mut NodeArena, interner: &mut Interner, errors: &mut Errors, prelude: &Prelude, cache: &mut ReificationCache, package: NodeId, node: NodeId) {
    if arena.get(node).flags.reached(PASS.index()) {
        return;
    }

    let kind = arena.kind(node);
    if is_entity_kind(kind) {
        for &member in entity_members(arena, node).to_vec().iter() {
            if is_method_kind(arena.kind(member)) {
                type_method(arena, interner, errors, prelude, cache, package, node, member);
            } else if is_field_kind(arena.kind(member)) {
                type_field(arena, interner, errors, prelude, cache, package, node, member);
            }
        }
    }

    mark(arena, node, PASS);

    let children: Vec<NodeId> = arena.children(node).to_vec();
    for child in children {
        walk(arena, interner, errors, prelude, cache, package, child);
    }
}

fn entity_this_type(arena: &mut NodeArena, entity: NodeId) -> NodeId {
    let cap = ember_ast::entity::entity_cap_marker(arena, entity);
    let cap = ember_types::shape::read_cap_marker(arena, cap);
    let name_sym = ident_symbol(arena, entity_name(arena, entity)).unwrap_or(Symbol::EMPTY);
    let span = arena.get(entity).span;
    let name = arena.alloc(TokenKind::Identifier(name_sym), span);
    let typeargs: Vec<NodeId> = entity_typeparams(arena, entity)
        .to_vec()
        .iter()
        .map(|&decl| {
            let tp_name = ember_types::shape::typeparam_decl_name(arena, decl);
            let tp_sym = ident_symbol(arena, tp_name).unwrap_or(Symbol::EMPTY);
            let tp_name_copy = arena.alloc(TokenKind::Identifier(tp_sym), span);
            let tp_cap = ember_types::shape::typeparam_decl_default_cap(arena, decl);
            ember_types::shape::make_typeparamref(arena, tp_name_copy, tp_cap, Ephemeral::Normal, decl)
        })
        .collect();
    make_nominal(arena, None, name, typeargs, cap, Ephemeral::Normal, Some(entity))
}

fn type_method(
    arena: &mut NodeArena,
    interner: &mut Interner,
    errors: &mut Errors,
    prelude: &Prelude,
    cache: &mut ReificationCache,
    package: NodeId,
    entity: NodeId,
    method: NodeId,
) {
    if arena.get(method).flags.reached(PASS.index()) {
        return;
    }
    let this_type = entity_this_type(arena, entity);
    let result_type = method_result(arena, method);
    let ctx = TyCtx { this_type, this_entity: entity, result_type, package };

    for &param in method_params(arena, method).to_vec().iter() {
        if let Some(default) = param_default(arena, param) {
            let want = param_type(arena, param);
            type_expr(arena, interner, errors, prelude, cache, &ctx, default, Some(want));
        }
    }

    if let Some(body) = method_body(arena, method) {
        type_expr(arena, interner, errors, prelude, cache, &ctx, body, Some(result_type));
    }

    mark(arena, method, PASS);
}

fn type_field(
    arena: &mut NodeArena,
    interner: &mut Interner,
    errors: &mut Errors,
    prelude: &Prelude,
    cache: &mut ReificationCache,
    package: NodeId,
    entity: NodeId,
    field: NodeId,
) {
    if arena.get(field).flags.reached(PASS.index()) {
        return;
    }
    let this_type = entity_this_type(arena, entity);
    let ctx = TyCtx { this_type, this_entity: entity, result_type: field_type(arena, field), package };
    if let Some(default) = field_default(arena, field) {
        let declared = field_type(arena, field);
        let want = if arena.kind(declared) != TokenKind::InferType { Some(declared) } else { None };
        type_expr(arena, interner, errors, prelude, cache, &ctx, default, want);
    }
    mark(arena, field, PASS);
}

fn with_cap(arena: &mut NodeArena, ty: NodeId, cap: Cap) -> NodeId {
    let copy = reify_force(arena, ty, &[], &[]);
    match arena.kind(copy) {
        TokenKind::Nominal => {
            let old = arena.child(copy, 3);
            let new = build_cap_marker(arena, cap);
            arena.replace(old, new);
        }
        TokenKind::TypeParamRef => {
            let old = arena.child(copy, 1);
            let new = build_cap_marker(arena, cap);
            arena.replace(old, new);
        }
        _ => {}
    }
    copy
}

fn with_ephemeral(arena: &mut NodeArena, ty: NodeId, eph: Ephemeral) -> NodeId {
    let copy = reify_force(arena, ty, &[], &[]);
    match arena.kind(copy) {
        TokenKind::Nominal => {
            let old = arena.child(copy, 4);
            let new = ember_types::shape::build_ephemeral_marker(arena, eph);
            arena.replace(old, new);
        }
        TokenKind::TypeParamRef => {
            let old = arena.child(copy, 2);
            let new = ember_types::shape::build_ephemeral_marker(arena, eph);
            arena.replace(old, new);
        }
        _ => {}
    }
    copy
}

fn cap_of(arena: &NodeArena, ty: NodeId) -> Cap {
    match arena.kind(ty) {
        TokenKind::Nominal => nominal_cap(arena, ty),
        TokenKind::TypeParamRef => typeparamref_cap(arena, ty),
        _ => Cap::Ref,
    }
}

fn def_of(arena: &NodeArena, ty: NodeId) -> Option<NodeId> {
    match arena.kind(ty) {
        TokenKind::Nominal => nominal_def(arena, ty),
        _ => None,
    }
}

fn typeargs_of(arena: &NodeArena, ty: NodeId) -> Vec<NodeId> {
    match arena.kind(ty) {
        TokenKind::Nominal => nominal_typeargs(arena, ty).to_vec(),
        _ => Vec::new(),
    }
}

fn find_field(arena: &NodeArena, entity: NodeId, sym: Symbol) -> Option<NodeId> {
    entity_members(arena, entity)
        .iter()
        .copied()
        .find(|&m| is_field_kind(arena.kind(m)) && ident_symbol(arena, field_name(arena, m)) == Some(sym))
}

fn find_method(arena: &NodeArena, entity: NodeId, sym: Symbol) -> Option<NodeId> {
    entity_members(arena, entity)
        .iter()
        .copied()
        .find(|&m| is_method_kind(arena.kind(m)) && ident_symbol(arena, method_name(arena, m)) == Some(sym))
}

/// The type a `reference` (or bare field access) node resolves to: a
/// param's declared type, a local's declared-or-inferred type, or an
/// entity field's declared type.
fn def_type(arena: &mut NodeArena, def: NodeId) -> NodeId {
    match arena.kind(def) {
        TokenKind::ParamDecl => param_type(arena, def),
        TokenKind::Let | TokenKind::Var | TokenKind::Embed | TokenKind::Delegate => {
            let declared = field_type(arena, def);
            if arena.kind(declared) == TokenKind::InferType {
                arena.ty(def).unwrap_or_else(|| make_infer_type(arena))
            } else {
                declared
            }
        }
        _ => make_error_type(arena),
    }
}

fn bool_type(arena: &mut NodeArena, prelude: &Prelude, span: ember_base::Span) -> NodeId {
    match prelude.bool_def {
        Some(def) => {
            let name_sym = ident_symbol(arena, entity_name(arena, def)).unwrap_or(Symbol::EMPTY);
            let name = arena.alloc(TokenKind::Identifier(name_sym), span);
            make_nominal(arena, None, name, Vec::new(), Cap::Val, Ephemeral::Normal, Some(def))
        }
        None => make_error_type(arena),
    }
}

fn none_type(arena: &mut NodeArena, prelude: &Prelude, span: ember_base::Span) -> NodeId {
    match prelude.none_def {
        Some(def) => {
            let name_sym = ident_symbol(arena, entity_name(arena, def)).unwrap_or(Symbol::EMPTY);
            let name = arena.alloc(TokenKind::Identifier(name_sym), span);
            make_nominal(arena, None, name, Vec::new(), Cap::Val, Ephemeral::Normal, Some(def))
        }
        None => make_error_type(arena),
    }
}

fn string_type(arena: &mut NodeArena, prelude: &Prelude, span: ember_base::Span) -> NodeId {
    match prelude.string_def {
        Some(def) => {
            let name_sym = ident_symbol(arena, entity_name(arena, def)).unwrap_or(Symbol::EMPTY);
            let name = arena.alloc(TokenKind::Identifier(name_sym), span);
            make_nominal(arena, None, name, Vec::new(), Cap::Val, Ephemeral::Normal, Some(def))
        }
        None => make_error_type(arena),
    }
}

/// Types `node`, returning its type and recording it on `node`'s `ty`
/// slot. `expected`, when known (an assignment's left side, a field's
/// declared type, a call parameter's type), lets a numeric literal or an
/// object literal resolve against real context instead of floating
/// unconstrained (root spec §4.11, §4.12 "object literal").
#[allow(clippy::too_many_arguments)]
fn type_expr(
    arena: &mut NodeArena,
    interner: &mut Interner,
    errors: &mut Errors,
    prelude: &Prelude,
    cache: &mut ReificationCache,
    ctx: &TyCtx,
    node: NodeId,
    expected: Option<NodeId>,
) -> NodeId {
    if arena.get(node).flags.reached(PASS.index()) {
        return arena.ty(node).unwrap_or_else(|| make_error_type(arena));
    }

    let span = arena.get(node).span;
    let kind = arena.kind(node);

    let ty = match kind {
        TokenKind::IntLiteral(_) => {
            let lit = ember_types::shape::make_literal_type(arena, LiteralFamily::Int, vec![node]);
            if let Some(target) = expected {
                // `unify_literal` needs a fresh `name` node for the resolved
                // nominal's identifier slot; literals carry no name child of
                // their own, so allocate a throwaway identifier for it.
                let name = arena.alloc(TokenKind::Identifier(Symbol::EMPTY), span);
                unify_literal(arena, errors, prelude, lit, name, span, &[target]);
                arena.ty(lit).unwrap_or(lit)
            } else {
                lit
            }
        }
        TokenKind::FloatLiteral(_) => {
            let lit = ember_types::shape::make_literal_type(arena, LiteralFamily::Float, vec![node]);
            if let Some(target) = expected {
                let name = arena.alloc(TokenKind::Identifier(Symbol::EMPTY), span);
                unify_literal(arena, errors, prelude, lit, name, span, &[target]);
                arena.ty(lit).unwrap_or(lit)
            } else {
                lit
            }
        }
        TokenKind::StringLiteral(_) => string_type(arena, prelude, span),
        TokenKind::True | TokenKind::False => bool_type(arena, prelude, span),
        TokenKind::This => ctx.this_type,
        TokenKind::ErrorKw => {
            arena.get_mut(node).flags.can_error = true;
            make_error_type(arena)
        }
        TokenKind::Reference => type_reference(arena, interner, errors, node),
        TokenKind::FieldRef => type_field_ref(arena, interner, errors, prelude, cache, ctx, node),
        TokenKind::TupleIndex => type_tuple_index(arena, interner, errors, prelude, cache, ctx, node),
        TokenKind::DotCall => type_dot_call(arena, interner, errors, prelude, cache, ctx, node).0,
        TokenKind::Call => type_call(arena, interner, errors, prelude, cache, ctx, node),
        TokenKind::PartialApply => type_partial_apply(arena, interner, errors, prelude, cache, ctx, node),
        TokenKind::Assignment => type_assignment(arena, interner, errors, prelude, cache, ctx, node),
        TokenKind::Tuple => {
            let members: Vec<NodeId> =
                arena.children(node).to_vec().iter().map(|&m| type_expr(arena, interner, errors, prelude, cache, ctx, m, None)).collect();
            assembler::tuple(arena, members)
        }
        TokenKind::Seq => type_seq(arena, interner, errors, prelude, cache, ctx, node, expected),
        TokenKind::Let | TokenKind::Var => type_local_decl(arena, interner, errors, prelude, cache, ctx, node),
        TokenKind::If => type_if(arena, interner, errors, prelude, cache, ctx, node, expected),
        TokenKind::While => type_while(arena, interner, errors, prelude, cache, ctx, node),
        TokenKind::Try => type_try(arena, interner, errors, prelude, cache, ctx, node, expected),
        TokenKind::Match => type_match(arena, interner, errors, prelude, cache, ctx, node, expected),
        TokenKind::Recover => type_recover(arena, interner, errors, prelude, cache, ctx, node, expected),
        TokenKind::Consume => type_consume(arena, interner, errors, prelude, cache, ctx, node),
        TokenKind::Return => type_return_like(arena, interner, errors, prelude, cache, ctx, node, Some(ctx.result_type)),
        TokenKind::Break | TokenKind::Continue => type_return_like(arena, interner, errors, prelude, cache, ctx, node, None),
        TokenKind::ObjectLiteral => type_object_literal(arena, interner, errors, prelude, cache, ctx, node, expected),
        TokenKind::Plus | TokenKind::Minus | TokenKind::Star | TokenKind::Slash | TokenKind::Percent => {
            type_dot_call(arena, interner, errors, prelude, cache, ctx, node).0
        }
        TokenKind::EqEq | TokenKind::NotEq | TokenKind::Lt | TokenKind::Le | TokenKind::Gt | TokenKind::Ge | TokenKind::AndAnd | TokenKind::OrOr => {
            for &c in arena.children(node).to_vec().iter() {
                type_expr(arena, interner, errors, prelude, cache, ctx, c, None);
            }
            bool_type(arena, prelude, span)
        }
        _ => {
            for &c in arena.children(node).to_vec().iter() {
                type_expr(arena, interner, errors, prelude, cache, ctx, c, None);
            }
            make_error_type(arena)
        }
    };

    arena.set_type(node, ty);

    if kind != TokenKind::Try {
        let children_error = arena.children(node).iter().any(|&c| arena.get(c).flags.can_error);
        let already_self_error = arena.get(node).flags.can_error;
        arena.get_mut(node).flags.can_error = already_self_error || children_error;
    }

    mark(arena, node, PASS);
    ty
}

fn type_reference(arena: &mut NodeArena, interner: &Interner, errors: &mut Errors, node: NodeId) -> NodeId {
    let name_node = arena.child(node, 0);
    let sym = match ident_symbol(arena, name_node) {
        Some(sym) => sym,
        None => return make_error_type(arena),
    };
    match arena.lookup(node, sym) {
        Some((_, def, status)) => {
            if status == SymbolStatus::Consumed {
                let text = interner.resolve(sym).to_string();
                errors.push(Diagnostic::error(ErrorKind::ConsumedUse, arena.get(node).span, format!("'{text}' was already consumed")));
            } else if status == SymbolStatus::Undefined {
                let text = interner.resolve(sym).to_string();
                errors.push(Diagnostic::error(ErrorKind::UndefinedUse, arena.get(node).span, format!("'{text}' is used before it is defined")));
            }
            def_type(arena, def)
        }
        None => make_error_type(arena),
    }
}

/// The effective viewpoint-adjusted cap for reading `field` through a
/// receiver held at `receiver_cap`. An `embed` field always reads as if
/// through `ref`, regardless of the receiver's actual cap — storage is
/// inline rather than indirect (root spec §1.2, §4.12).
fn viewed_field_type(arena: &mut NodeArena, field: NodeId, field_ty: NodeId, receiver_cap: Cap) -> NodeId {
    let view_cap = if arena.kind(field) == TokenKind::Embed { Cap::Ref } else { receiver_cap };
    let field_cap = cap_of(arena, field_ty);
    let viewed = view_cap.viewpoint(field_cap).unwrap_or(field_cap);
    with_cap(arena, field_ty, viewed)
}

fn type_field_ref(
    arena: &mut NodeArena,
    interner: &mut Interner,
    errors: &mut Errors,
    prelude: &Prelude,
    cache: &mut ReificationCache,
    ctx: &TyCtx,
    node: NodeId,
) -> NodeId {
    let receiver = arena.child(node, 0);
    let name_node = arena.child(node, 1);
    let recv_ty = type_expr(arena, interner, errors, prelude, cache, ctx, receiver, None);
    let Some(sym) = ident_symbol(arena, name_node) else { return make_error_type(arena) };
    let Some(entity) = def_of(arena, recv_ty) else {
        errors.push(Diagnostic::error(ErrorKind::NameNotFound, arena.get(node).span, "receiver has no known fields"));
        return make_error_type(arena);
    };
    let Some(field) = find_field(arena, entity, sym) else {
        let text = interner.resolve(sym).to_string();
        errors.push(Diagnostic::error(ErrorKind::NameNotFound, arena.get(node).span, format!("no field '{text}' on this type")));
        return make_error_type(arena);
    };
    let field_ty = field_type(arena, field);
    viewed_field_type(arena, field, field_ty, cap_of(arena, recv_ty))
}

fn type_tuple_index(
    arena: &mut NodeArena,
    interner: &mut Interner,
    errors: &mut Errors,
    prelude: &Prelude,
    cache: &mut ReificationCache,
    ctx: &TyCtx,
    node: NodeId,
) -> NodeId {
    let receiver = arena.child(node, 0);
    let idx_node = arena.child(node, 1);
    let recv_ty = type_expr(arena, interner, errors, prelude, cache, ctx, receiver, None);
    let idx = match arena.kind(idx_node) {
        TokenKind::IntLiteral(v) => v as usize,
        _ => return make_error_type(arena),
    };
    if arena.kind(recv_ty) == TokenKind::Tuple {
        arena.children(recv_ty).get(idx).copied().unwrap_or_else(|| make_error_type(arena))
    } else {
        errors.push(Diagnostic::error(ErrorKind::NotASubtype, arena.get(node).span, "tuple index on a non-tuple type"));
        make_error_type(arena)
    }
}

/// Resolves and type-checks a call's arguments against `method`'s
/// parameters, positionally or by name (root spec §4.2's named-argument
/// shape, the same `Assignment(name, value)` the parser already reuses).
#[allow(clippy::too_many_arguments)]
fn check_call_args(
    arena: &mut NodeArena,
    interner: &mut Interner,
    errors: &mut Errors,
    prelude: &Prelude,
    cache: &mut ReificationCache,
    ctx: &TyCtx,
    method: NodeId,
    args: &[NodeId],
    entity_params: &[NodeId],
    entity_args: &[NodeId],
    method_typeargs: &[NodeId],
) -> Vec<NodeId> {
    let params = method_params(arena, method).to_vec();
    let mut arg_types = Vec::new();
    let mut pos_idx = 0usize;
    for &arg in args {
        let (target_idx, value_node) = if arena.kind(arg) == TokenKind::Assignment {
            let name_ident = arena.child(arg, 0);
            let sym = ident_symbol(arena, name_ident);
            let idx = params.iter().position(|&p| ident_symbol(arena, param_name(arena, p)) == sym);
            (idx, arena.child(arg, 1))
        } else {
            let idx = if pos_idx < params.len() { Some(pos_idx) } else { None };
            pos_idx += 1;
            (idx, arg)
        };
        let expected = target_idx.map(|i| {
            let raw = param_type(arena, params[i]);
            let after_entity = reify(arena, raw, entity_params, entity_args);
            reify(arena, after_entity, &method_typeparams(arena, method).to_vec(), method_typeargs)
        });
        let arg_ty = type_expr(arena, interner, errors, prelude, cache, ctx, value_node, expected);
        if let Some(want) = expected {
            if !is_subtype(arena, arg_ty, want) {
                errors.push(Diagnostic::error(ErrorKind::NotASubtype, arena.get(value_node).span, "argument type is not a subtype of the parameter's type"));
            }
        }
        arg_types.push(arg_ty);
    }
    arg_types
}

/// Types a `dot-call` (root spec §4.12 "dot/call"): resolves `name` on
/// the receiver's entity, checks the receiver's cap against the method's
/// required receiver cap (with auto-recovery when every argument and the
/// result are sendable), type-checks arguments, and reifies the result.
/// Returns the result type and the resolved method (`None` on failure),
/// since a handful of callers — `PartialApply`, the binary-operator
/// shim — need the method identity, not just its type.
fn type_dot_call(
    arena: &mut NodeArena,
    interner: &mut Interner,
    errors: &mut Errors,
    prelude: &Prelude,
    cache: &mut ReificationCache,
    ctx: &TyCtx,
    node: NodeId,
) -> (NodeId, Option<NodeId>) {
    let receiver = arena.child(node, 0);
    let name_node = arena.child(node, 1);
    let typeargs_node = arena.child(node, 2);
    let args_node = arena.child(node, 3);

    let recv_ty = type_expr(arena, interner, errors, prelude, cache, ctx, receiver, None);
    let Some(sym) = ident_symbol(arena, name_node) else { return (make_error_type(arena), None) };
    let Some(entity) = def_of(arena, recv_ty) else {
        for &a in arena.children(args_node).to_vec().iter() {
            type_expr(arena, interner, errors, prelude, cache, ctx, a, None);
        }
        errors.push(Diagnostic::error(ErrorKind::NameNotFound, arena.get(node).span, "receiver's type has no known methods"));
        return (make_error_type(arena), None);
    };
    let Some(method) = find_method(arena, entity, sym) else {
        for &a in arena.children(args_node).to_vec().iter() {
            type_expr(arena, interner, errors, prelude, cache, ctx, a, None);
        }
        let text = interner.resolve(sym).to_string();
        errors.push(Diagnostic::error(ErrorKind::NameNotFound, arena.get(node).span, format!("no method '{text}' on this type")));
        return (make_error_type(arena), None);
    };

    let entity_params = entity_typeparams(arena, entity).to_vec();
    let entity_args = typeargs_of(arena, recv_ty);
    let method_typeargs: Vec<NodeId> = arena.children(typeargs_node).to_vec();

    let args: Vec<NodeId> = arena.children(args_node).to_vec();
    let arg_types = check_call_args(arena, interner, errors, prelude, cache, ctx, method, &args, &entity_params, &entity_args, &method_typeargs);

    let required_cap = ember_types::shape::read_cap_marker(arena, method_cap_marker(arena, method));
    let receiver_cap = cap_of(arena, recv_ty);
    let raw_result = method_result(arena, method);
    let result_after_entity = reify(arena, raw_result, &entity_params, &entity_args);
    let result_ty = if arena.kind(result_after_entity) == TokenKind::ThisType {
        recv_ty
    } else {
        reify(arena, result_after_entity, &method_typeparams(arena, method).to_vec(), &method_typeargs)
    };

    let direct_ok = receiver_cap.sub(required_cap);
    if !direct_ok {
        let args_sendable = arg_types.iter().all(|&t| cap_of(arena, t).is_sendable());
        let result_sendable = cap_of(arena, result_ty).is_sendable();
        let recovered_ok = receiver_cap.recover().sub(required_cap) && args_sendable && result_sendable;
        if !recovered_ok {
            errors.push(Diagnostic::error(ErrorKind::CapMismatch, arena.get(node).span, "receiver's capability does not permit this call"));
        }
    }

    if arena.get(method).flags.partial {
        arena.get_mut(node).flags.can_error = true;
    }

    if !entity_params.is_empty() || !method_typeparams(arena, method).is_empty() {
        let deferred = DeferredReification {
            method_ast: method,
            type_params: entity_params.clone(),
            type_args: entity_args.clone(),
            method_params: method_typeparams(arena, method).to_vec(),
            method_args: method_typeargs.clone(),
            this_type: recv_ty,
        };
        if let Some(materialized) = cache.materialize(arena, &deferred) {
            let inner_ctx = TyCtx { this_type: recv_ty, this_entity: entity, result_type: raw_result, package: ctx.package };
            type_expr(arena, interner, errors, prelude, cache, &inner_ctx, materialized, None);
        }
    }

    (result_ty, Some(method))
}

/// A bare call `f(...)`: `f` must evaluate to a first-class function
/// value (root spec §4.12 "dot/call" — calls through a function-typed
/// value go through the same argument machinery as a method call, just
/// without a receiver cap to check).
fn type_call(
    arena: &mut NodeArena,
    interner: &mut Interner,
    errors: &mut Errors,
    prelude: &Prelude,
    cache: &mut ReificationCache,
    ctx: &TyCtx,
    node: NodeId,
) -> NodeId {
    let callee = arena.child(node, 0);
    let args_node = arena.child(node, 2);
    let callee_ty = type_expr(arena, interner, errors, prelude, cache, ctx, callee, None);

    if arena.kind(callee_ty) != TokenKind::FunctionType {
        for &a in arena.children(args_node).to_vec().iter() {
            type_expr(arena, interner, errors, prelude, cache, ctx, a, None);
        }
        errors.push(Diagnostic::error(ErrorKind::NoType, arena.get(node).span, "callee is not a function value"));
        return make_error_type(arena);
    }

    let params = function_type_params(arena, callee_ty).to_vec();
    let args: Vec<NodeId> = arena.children(args_node).to_vec();
    for (i, &arg) in args.iter().enumerate() {
        let expected = params.get(i).copied();
        let arg_ty = type_expr(arena, interner, errors, prelude, cache, ctx, arg, expected);
        if let Some(want) = expected {
            if !is_subtype(arena, arg_ty, want) {
                errors.push(Diagnostic::error(ErrorKind::NotASubtype, arena.get(arg).span, "argument is not a subtype of the function's parameter type"));
            }
        }
    }
    function_type_result(arena, callee_ty)
}

/// Partial application (`method~`, root spec §4.12): synthesizes an
/// anonymous class capturing the receiver and every argument already
/// supplied at the `~` site as fields, with a zero-argument `apply`
/// method that forwards to the original call. Currying (omitting only
/// some parameters so `apply` still takes the rest) is not modeled —
/// every captured call is fully saturated at the `~` site, which covers
/// "defer this call" without needing partial parameter lists (see
/// DESIGN.md).
fn type_partial_apply(
    arena: &mut NodeArena,
    interner: &mut Interner,
    errors: &mut Errors,
    prelude: &Prelude,
    cache: &mut ReificationCache,
    ctx: &TyCtx,
    node: NodeId,
) -> NodeId {
    let inner = arena.child(node, 0);
    let span = arena.get(node).span;

    if arena.kind(inner) != TokenKind::DotCall {
        type_expr(arena, interner, errors, prelude, cache, ctx, inner, None);
        errors.push(Diagnostic::error(ErrorKind::NoType, span, "partial application needs a method call"));
        return make_error_type(arena);
    }

    let (result_ty, method) = type_dot_call(arena, interner, errors, prelude, cache, ctx, inner);
    let Some(method) = method else { return make_error_type(arena) };

    let receiver = arena.child(inner, 0);
    let name_node = arena.child(inner, 1);
    let args_node = arena.child(inner, 3);
    let args: Vec<NodeId> = arena.children(args_node).to_vec();
    let method_name_sym = ident_symbol(arena, name_node).unwrap_or(Symbol::EMPTY);

    let recv_sym = interner.intern("$recv");
    let recv_ty = arena.ty(receiver).unwrap_or_else(|| make_error_type(arena));
    let recv_field_ty = reify_force(arena, recv_ty, &[], &[]);
    let recv_field_name = arena.alloc(TokenKind::Identifier(recv_sym), span);
    let recv_field_default = reify_force(arena, receiver, &[], &[]);
    let recv_field = ember_ast::entity::make_field(arena, TokenKind::Let, recv_field_name, recv_field_ty, Some(recv_field_default));

    let mut capture_fields = vec![recv_field];
    let mut capture_syms = vec![recv_sym];
    for (i, &arg) in args.iter().enumerate() {
        let value_node = if arena.kind(arg) == TokenKind::Assignment { arena.child(arg, 1) } else { arg };
        let arg_sym = interner.intern(&format!("$arg{i}"));
        let arg_ty = arena.ty(value_node).unwrap_or_else(|| make_error_type(arena));
        let arg_field_ty = reify_force(arena, arg_ty, &[], &[]);
        let arg_field_name = arena.alloc(TokenKind::Identifier(arg_sym), span);
        let arg_field_default = reify_force(arena, value_node, &[], &[]);
        let arg_field = ember_ast::entity::make_field(arena, TokenKind::Let, arg_field_name, arg_field_ty, Some(arg_field_default));
        capture_fields.push(arg_field);
        capture_syms.push(arg_sym);
    }

    let class_name_sym = interner.intern(&format!("$partial_{}", node.index()));
    let class_name = arena.alloc(TokenKind::Identifier(class_name_sym), span);
    let cap_marker = build_cap_marker(arena, Cap::Ref);

    let this_node = arena.alloc(TokenKind::This, span);
    let field_accesses: Vec<NodeId> = capture_syms
        .iter()
        .skip(1)
        .map(|&sym| {
            let name = arena.alloc(TokenKind::Identifier(sym), span);
            let fref = arena.alloc(TokenKind::FieldRef, span);
            arena.set_children(fref, vec![this_node, name]);
            fref
        })
        .collect();
    let recv_name_for_call = arena.alloc(TokenKind::Identifier(recv_sym), span);
    let recv_field_ref = arena.alloc(TokenKind::FieldRef, span);
    arena.set_children(recv_field_ref, vec![this_node, recv_name_for_call]);

    let call_name = arena.alloc(TokenKind::Identifier(method_name_sym), span);
    let typeargs_node = arena.alloc(TokenKind::TypeArgs, span);
    arena.set_children(typeargs_node, Vec::new());
    let args_node_new = arena.alloc(TokenKind::Params, span);
    arena.set_children(args_node_new, field_accesses);
    let forward_call = arena.alloc(TokenKind::DotCall, span);
    arena.set_children(forward_call, vec![recv_field_ref, call_name, typeargs_node, args_node_new]);

    let apply_body = arena.alloc(TokenKind::Seq, span);
    arena.set_children(apply_body, vec![forward_call]);

    let apply_name_sym = interner.intern("apply");
    let apply_name = arena.alloc(TokenKind::Identifier(apply_name_sym), span);
    let apply_cap = build_cap_marker(arena, Cap::Ref);
    let apply_result = reify_force(arena, result_ty, &[], &[]);
    let apply_method = ember_ast::entity::make_method(arena, TokenKind::Fun, apply_name, apply_cap, Vec::new(), Vec::new(), apply_result, Some(apply_body));

    let class_node = ember_ast::entity::make_entity(arena, TokenKind::ClassKw, class_name, Vec::new(), cap_marker, Vec::new(), {
        let mut members = capture_fields.clone();
        members.push(apply_method);
        members
    });

    arena.push_child(ctx.package, class_node);

    crate::scope::run(arena, interner, errors, class_node);
    crate::resolve::run(arena, interner, errors, class_node);

    let class_ty = make_nominal(arena, None, arena.alloc(TokenKind::Identifier(class_name_sym), span), Vec::new(), Cap::Ref, Ephemeral::Normal, Some(class_node));
    type_expr(arena, interner, errors, prelude, cache, ctx, apply_body, None);

    class_ty
}

fn type_assignment(
    arena: &mut NodeArena,
    interner: &mut Interner,
    errors: &mut Errors,
    prelude: &Prelude,
    cache: &mut ReificationCache,
    ctx: &TyCtx,
    node: NodeId,
) -> NodeId {
    let lhs = arena.child(node, 0);
    let rhs = arena.child(node, 1);
    let span = arena.get(node).span;

    if !matches!(arena.kind(lhs), TokenKind::Reference | TokenKind::FieldRef) {
        errors.push(Diagnostic::error(ErrorKind::NotAnLValue, span, "left side of an assignment must be a variable or a field"));
        type_expr(arena, interner, errors, prelude, cache, ctx, rhs, None);
        return make_error_type(arena);
    }

    let lhs_ty = type_expr(arena, interner, errors, prelude, cache, ctx, lhs, None);
    let rhs_ty = type_expr(arena, interner, errors, prelude, cache, ctx, rhs, Some(lhs_ty));

    if !is_subtype(arena, rhs_ty, lhs_ty) {
        errors.push(Diagnostic::error(ErrorKind::NotASubtype, span, "assigned value is not a subtype of the target's type"));
    }

    if arena.kind(lhs) == TokenKind::FieldRef {
        let receiver = arena.child(lhs, 0);
        let recv_ty = arena.ty(receiver).unwrap_or_else(|| make_error_type(arena));
        let receiver_cap = cap_of(arena, recv_ty);
        if !cap_of(arena, rhs_ty).safe_to_write(receiver_cap) {
            errors.push(Diagnostic::error(ErrorKind::CapMismatch, span, "this value is not safe to write through the receiver's capability"));
        }
    } else if let Some(sym) = ident_symbol(arena, arena.child(lhs, 0)) {
        arena.set_status(node, sym, SymbolStatus::Defined);
    }

    with_ephemeral(arena, lhs_ty, Ephemeral::Ephemeral)
}

fn type_seq(
    arena: &mut NodeArena,
    interner: &mut Interner,
    errors: &mut Errors,
    prelude: &Prelude,
    cache: &mut ReificationCache,
    ctx: &TyCtx,
    node: NodeId,
    expected: Option<NodeId>,
) -> NodeId {
    let stmts: Vec<NodeId> = arena.children(node).to_vec();
    let mut last = None;
    for (i, &stmt) in stmts.iter().enumerate() {
        let want = if i + 1 == stmts.len() { expected } else { None };
        last = Some(type_expr(arena, interner, errors, prelude, cache, ctx, stmt, want));
    }
    last.unwrap_or_else(|| none_type(arena, prelude, arena.get(node).span))
}

fn type_local_decl(
    arena: &mut NodeArena,
    interner: &mut Interner,
    errors: &mut Errors,
    prelude: &Prelude,
    cache: &mut ReificationCache,
    ctx: &TyCtx,
    node: NodeId,
) -> NodeId {
    let declared = field_type(arena, node);
    let span = arena.get(node).span;
    let want = if arena.kind(declared) != TokenKind::InferType { Some(declared) } else { None };
    let inferred = match field_default(arena, node) {
        Some(default) => Some(type_expr(arena, interner, errors, prelude, cache, ctx, default, want)),
        None => None,
    };
    let final_ty = match want {
        Some(t) => t,
        None => inferred.unwrap_or_else(|| make_infer_type(arena)),
    };
    arena.set_type(node, final_ty);
    none_type(arena, prelude, span)
}

fn type_if(
    arena: &mut NodeArena,
    interner: &mut Interner,
    errors: &mut Errors,
    prelude: &Prelude,
    cache: &mut ReificationCache,
    ctx: &TyCtx,
    node: NodeId,
    expected: Option<NodeId>,
) -> NodeId {
    let cond = arena.child(node, 0);
    let then_branch = arena.child(node, 1);
    let else_branch = arena.child(node, 2);
    let span = arena.get(node).span;

    let cond_ty = type_expr(arena, interner, errors, prelude, cache, ctx, cond, None);
    let want_bool = bool_type(arena, prelude, span);
    if !is_subtype(arena, cond_ty, want_bool) {
        errors.push(Diagnostic::error(ErrorKind::NotASubtype, arena.get(cond).span, "condition must be a Bool"));
    }

    let then_ty = type_expr(arena, interner, errors, prelude, cache, ctx, then_branch, expected);
    let else_ty = if arena.get(else_branch).is_none_node() {
        none_type(arena, prelude, span)
    } else {
        type_expr(arena, interner, errors, prelude, cache, ctx, else_branch, expected)
    };
    assembler::union(arena, then_ty, else_ty)
}

fn type_while(
    arena: &mut NodeArena,
    interner: &mut Interner,
    errors: &mut Errors,
    prelude: &Prelude,
    cache: &mut ReificationCache,
    ctx: &TyCtx,
    node: NodeId,
) -> NodeId {
    let cond = arena.child(node, 0);
    let body = arena.child(node, 1);
    let span = arena.get(node).span;
    let cond_ty = type_expr(arena, interner, errors, prelude, cache, ctx, cond, None);
    let want_bool = bool_type(arena, prelude, span);
    if !is_subtype(arena, cond_ty, want_bool) {
        errors.push(Diagnostic::error(ErrorKind::NotASubtype, arena.get(cond).span, "condition must be a Bool"));
    }
    type_expr(arena, interner, errors, prelude, cache, ctx, body, None);
    none_type(arena, prelude, span)
}

fn type_try(
    arena: &mut NodeArena,
    interner: &mut Interner,
    errors: &mut Errors,
    prelude: &Prelude,
    cache: &mut ReificationCache,
    ctx: &TyCtx,
    node: NodeId,
    expected: Option<NodeId>,
) -> NodeId {
    let body = arena.child(node, 0);
    let else_body = arena.child(node, 1);
    let span = arena.get(node).span;

    let body_ty = type_expr(arena, interner, errors, prelude, cache, ctx, body, expected);
    let has_else = !arena.get(else_body).is_none_node();

    if !arena.get(body).flags.can_error {
        errors.push(Diagnostic::error(ErrorKind::UnreachableBranch, span, "try body can never raise an error"));
    }

    let result = if has_else {
        let else_ty = type_expr(arena, interner, errors, prelude, cache, ctx, else_body, expected);
        arena.get_mut(node).flags.can_error = arena.get(else_body).flags.can_error;
        assembler::union(arena, body_ty, else_ty)
    } else {
        arena.get_mut(node).flags.can_error = false;
        body_ty
    };
    result
}

fn type_match(
    arena: &mut NodeArena,
    interner: &mut Interner,
    errors: &mut Errors,
    prelude: &Prelude,
    cache: &mut ReificationCache,
    ctx: &TyCtx,
    node: NodeId,
    expected: Option<NodeId>,
) -> NodeId {
    let children: Vec<NodeId> = arena.children(node).to_vec();
    let subject = children[0];
    type_expr(arena, interner, errors, prelude, cache, ctx, subject, None);

    let mut result: Option<NodeId> = None;
    for &case in &children[1..] {
        let pattern = arena.child(case, 0);
        let guard = arena.child(case, 1);
        let body = arena.child(case, 2);
        type_expr(arena, interner, errors, prelude, cache, ctx, pattern, None);
        if !arena.get(guard).is_none_node() {
            let guard_ty = type_expr(arena, interner, errors, prelude, cache, ctx, guard, None);
            let want_bool = bool_type(arena, prelude, arena.get(guard).span);
            if !is_subtype(arena, guard_ty, want_bool) {
                errors.push(Diagnostic::error(ErrorKind::NotASubtype, arena.get(guard).span, "case guard must be a Bool"));
            }
        }
        let body_ty = type_expr(arena, interner, errors, prelude, cache, ctx, body, expected);
        mark(arena, case, PASS);
        result = Some(match result {
            Some(acc) => assembler::union(arena, acc, body_ty),
            None => body_ty,
        });
    }
    result.unwrap_or_else(|| make_error_type(arena))
}

fn type_recover(
    arena: &mut NodeArena,
    interner: &mut Interner,
    errors: &mut Errors,
    prelude: &Prelude,
    cache: &mut ReificationCache,
    ctx: &TyCtx,
    node: NodeId,
    expected: Option<NodeId>,
) -> NodeId {
    let cap_marker = arena.child(node, 0);
    let body = arena.child(node, 1);
    let body_ty = type_expr(arena, interner, errors, prelude, cache, ctx, body, expected);
    let recovered_cap = cap_of(arena, body_ty).recover();
    let cap = if arena.get(cap_marker).is_none_node() {
        recovered_cap
    } else {
        ember_types::shape::read_cap_marker(arena, cap_marker)
    };
    with_cap(arena, body_ty, cap)
}

fn type_consume(
    arena: &mut NodeArena,
    interner: &mut Interner,
    errors: &mut Errors,
    prelude: &Prelude,
    cache: &mut ReificationCache,
    ctx: &TyCtx,
    node: NodeId,
) -> NodeId {
    let cap_marker = arena.child(node, 0);
    let operand = arena.child(node, 1);
    let span = arena.get(node).span;

    let operand_ty = type_expr(arena, interner, errors, prelude, cache, ctx, operand, None);

    match arena.kind(operand) {
        TokenKind::Reference => {
            if let Some(sym) = ident_symbol(arena, arena.child(operand, 0)) {
                arena.set_status(node, sym, SymbolStatus::Consumed);
            }
        }
        TokenKind::This => {}
        _ => {
            errors.push(Diagnostic::error(ErrorKind::NotAnLValue, span, "consume requires a local, parameter, or this"));
        }
    }

    let ephemeral = with_ephemeral(arena, operand_ty, Ephemeral::Ephemeral);
    if arena.get(cap_marker).is_none_node() {
        ephemeral
    } else {
        let cap = ember_types::shape::read_cap_marker(arena, cap_marker);
        with_cap(arena, ephemeral, cap)
    }
}

fn type_return_like(
    arena: &mut NodeArena,
    interner: &mut Interner,
    errors: &mut Errors,
    prelude: &Prelude,
    cache: &mut ReificationCache,
    ctx: &TyCtx,
    node: NodeId,
    expected: Option<NodeId>,
) -> NodeId {
    let value = arena.child(node, 0);
    let span = arena.get(node).span;
    if arena.get(value).is_none_node() {
        return none_type(arena, prelude, span);
    }
    let ty = type_expr(arena, interner, errors, prelude, cache, ctx, value, expected);
    if let Some(want) = expected {
        if !is_subtype(arena, ty, want) {
            errors.push(Diagnostic::error(ErrorKind::NotASubtype, span, "returned value is not a subtype of the declared result type"));
        }
    }
    ty
}

/// `{ name = expr, ... }` (root spec §4.3, §4.12): resolved here, with
/// the expected-type context sugar deliberately left for, into a typed
/// constructor call `T.create(name = expr, ...)` against the entity the
/// surrounding context names.
fn type_object_literal(
    arena: &mut NodeArena,
    interner: &mut Interner,
    errors: &mut Errors,
    prelude: &Prelude,
    cache: &mut ReificationCache,
    ctx: &TyCtx,
    node: NodeId,
    expected: Option<NodeId>,
) -> NodeId {
    let span = arena.get(node).span;
    let Some(target) = expected else {
        errors.push(Diagnostic::error(ErrorKind::NoType, span, "object literal has no surrounding type context"));
        return make_error_type(arena);
    };
    let Some(entity) = def_of(arena, target) else {
        errors.push(Diagnostic::error(ErrorKind::NoType, span, "object literal's expected type is not a concrete entity"));
        return make_error_type(arena);
    };
    let create_sym = interner.intern("create");
    let Some(_method) = find_method(arena, entity, create_sym) else {
        errors.push(Diagnostic::error(ErrorKind::NameNotFound, span, "entity has no 'create' constructor"));
        return make_error_type(arena);
    };

    let fields: Vec<NodeId> = arena.children(node).to_vec();
    let name_sym = ident_symbol(arena, ember_ast::entity::entity_name(arena, entity)).unwrap_or(Symbol::EMPTY);
    let receiver_name = arena.alloc(TokenKind::Identifier(name_sym), span);
    arena.set_data(receiver_name, ember_ast::NodeData::None);
    let receiver_ref = arena.alloc(TokenKind::Reference, span);
    arena.set_children(receiver_ref, vec![receiver_name]);
    arena.set_data(receiver_ref, ember_ast::NodeData::Def(entity));

    let create_name = arena.alloc(TokenKind::Identifier(create_sym), span);
    let typeargs_node = arena.alloc(TokenKind::TypeArgs, span);
    arena.set_children(typeargs_node, Vec::new());
    let args_node = arena.alloc(TokenKind::Params, span);
    arena.set_children(args_node, fields);
    let call = arena.alloc(TokenKind::DotCall, span);
    arena.set_children(call, vec![receiver_ref, create_name, typeargs_node, args_node]);

    arena.replace(node, call);
    type_dot_call(arena, interner, errors, prelude, cache, ctx, call).0
}
