//! Small expression/type node builders shared by the passes that
//! synthesize new tree shapes: the sugar pass's desugarings (root spec
//! §4.3), the trait flattener's delegate-forwarding bodies (root spec
//! §4.6 Stage 4). Each mirrors a concrete-syntax shape the parser itself
//! produces, so nothing here invents a tree the grammar doesn't already
//! know about.

use ember_ast::{NodeArena, NodeId, TokenKind};
use ember_base::{Span, Symbol};

pub(crate) fn make_ident(arena: &mut NodeArena, sym: Symbol, span: Span) -> NodeId {
    arena.alloc(TokenKind::Identifier(sym), span)
}

pub(crate) fn make_reference(arena: &mut NodeArena, name: NodeId, span: Span) -> NodeId {
    let node = arena.alloc(TokenKind::Reference, span);
    arena.set_children(node, vec![name]);
    node
}

pub(crate) fn make_params_node(arena: &mut NodeArena, args: Vec<NodeId>, span: Span) -> NodeId {
    let node = arena.alloc(TokenKind::Params, span);
    arena.set_children(node, args);
    node
}

pub(crate) fn make_typeargs_node(arena: &mut NodeArena, typeargs: Vec<NodeId>, span: Span) -> NodeId {
    let node = arena.alloc(TokenKind::TypeArgs, span);
    arena.set_children(node, typeargs);
    node
}

pub(crate) fn make_call(arena: &mut NodeArena, callee: NodeId, typeargs: Vec<NodeId>, args: Vec<NodeId>, span: Span) -> NodeId {
    let typeargs_node = make_typeargs_node(arena, typeargs, span);
    let args_node = make_params_node(arena, args, span);
    let node = arena.alloc(TokenKind::Call, span);
    arena.set_children(node, vec![callee, typeargs_node, args_node]);
    node
}

pub(crate) fn make_dot_call(arena: &mut NodeArena, receiver: NodeId, name: NodeId, args: Vec<NodeId>, span: Span) -> NodeId {
    let typeargs_node = make_typeargs_node(arena, Vec::new(), span);
    let args_node = make_params_node(arena, args, span);
    let node = arena.alloc(TokenKind::DotCall, span);
    arena.set_children(node, vec![receiver, name, typeargs_node, args_node]);
    node
}

pub(crate) fn make_named_arg(arena: &mut NodeArena, name: NodeId, value: NodeId, span: Span) -> NodeId {
    let node = arena.alloc(TokenKind::Assignment, span);
    arena.set_children(node, vec![name, value]);
    node
}

pub(crate) fn make_seq(arena: &mut NodeArena, stmts: Vec<NodeId>, span: Span) -> NodeId {
    let node = arena.alloc(TokenKind::Seq, span);
    arena.set_children(node, stmts);
    node
}
