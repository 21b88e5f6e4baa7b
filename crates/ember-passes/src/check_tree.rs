//! Tree-invariant checker (root spec §6.2's `CompileOptions::check_tree`,
//! §7's fatal-error path).
//!
//! Optional, debug-oriented: walks every node reachable from the program
//! root and confirms the structural invariants the rest of the core
//! assumes without re-checking (root spec §3.7 invariants 1-3) —
//! every child's parent link points back at its actual parent, no child
//! id is out of range, and no node is reachable twice (the tree really is
//! a tree, not a graph with sharing, outside the explicit `ty`/`data`
//! cross-links). A violation here is a bug in the core itself, never
//! something a source program can trigger, so it is always reported as
//! `ErrorKind::InternalError` and is always fatal.

use std::collections::HashSet;

use ember_ast::{NodeArena, NodeId};
use ember_diag::{Diagnostic, ErrorKind, Errors};

pub fn run(arena: &NodeArena, errors: &mut Errors, root: NodeId) {
    let mut visited = HashSet::new();
    walk(arena, errors, root, &mut visited);
}

fn walk(arena: &NodeArena, errors: &mut Errors, node: NodeId, visited: &mut HashSet<NodeId>) {
    if !visited.insert(node) {
        errors.push(Diagnostic::error(
            ErrorKind::InternalError,
            arena.get(node).span,
            "AST node reachable from the program root by more than one path",
        ));
        return;
    }

    for &child in arena.children(node) {
        if child.index() >= arena.len() {
            errors.push(Diagnostic::error(ErrorKind::InternalError, arena.get(node).span, "child id out of range"));
            continue;
        }
        if arena.parent(child) != Some(node) {
            errors.push(Diagnostic::error(
                ErrorKind::InternalError,
                arena.get(child).span,
                "child's parent back-link does not point at its actual parent",
            ));
        }
        walk(arena, errors, child, visited);
    }

    if let Some(ty) = arena.ty(node) {
        if ty.index() >= arena.len() {
            errors.push(Diagnostic::error(ErrorKind::InternalError, arena.get(node).span, "type slot id out of range"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_base::Span;
    use ember_lexer::TokenKind;

    #[test]
    fn well_formed_tree_passes() {
        let mut arena = NodeArena::new();
        let root = arena.alloc(TokenKind::Seq, Span::default());
        let child = arena.alloc(TokenKind::NoneNode, Span::default());
        arena.push_child(root, child);

        let mut errors = Errors::new();
        run(&arena, &mut errors, root);
        assert!(!errors.has_errors());
    }

    #[test]
    fn mismatched_parent_link_is_reported() {
        let mut arena = NodeArena::new();
        let root = arena.alloc(TokenKind::Seq, Span::default());
        let other_parent = arena.alloc(TokenKind::Seq, Span::default());
        let child = arena.alloc(TokenKind::NoneNode, Span::default());
        arena.push_child(other_parent, child);
        arena.get_mut(root).children.push(child);

        let mut errors = Errors::new();
        run(&arena, &mut errors, root);
        assert_eq!(errors.of_kind(ErrorKind::InternalError).count(), 1);
        assert!(errors.is_fatal());
    }

    #[test]
    fn shared_child_reached_by_two_paths_is_reported() {
        let mut arena = NodeArena::new();
        let root = arena.alloc(TokenKind::Seq, Span::default());
        let a = arena.alloc(TokenKind::Seq, Span::default());
        let b = arena.alloc(TokenKind::Seq, Span::default());
        let shared = arena.alloc(TokenKind::NoneNode, Span::default());
        arena.push_child(root, a);
        arena.push_child(root, b);
        arena.get_mut(a).children.push(shared);
        arena.get_mut(b).children.push(shared);
        arena.get_mut(shared).parent = Some(a);

        let mut errors = Errors::new();
        run(&arena, &mut errors, root);
        assert!(errors.of_kind(ErrorKind::InternalError).count() >= 1);
    }
}
