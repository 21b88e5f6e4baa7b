//! The flat, index-addressed node arena (root spec §3.7, §9 "Cyclic
//! graphs").
//!
//! A single `NodeArena` owns every node ever allocated during one
//! compilation, addressed by [`NodeId`]. Cross-references (`parent`,
//! `ty`, `data`) are themselves `NodeId`s, so they are `Copy` and never
//! participate in ownership — a dangling id is a programming error the
//! tree checker (`ember_passes::check_tree`) catches, not a use-after-free.

use ember_base::{Span, Symbol};
use ember_lexer::TokenKind;

use crate::data::NodeData;
use crate::node::{Node, NodeId};
use crate::symtab::{SymbolStatus, Symtab};

/// Owns every [`Node`] allocated in one compilation.
#[derive(Debug, Default)]
pub struct NodeArena {
    nodes: Vec<Node>,
    /// Detached subtree roots (root spec §3.7): nodes that were built but
    /// are not (or are no longer) reachable from the program root. Kept
    /// here so `reset`/drop frees them deterministically and so a tree
    /// checker can confirm nothing detached leaks into a later pass.
    detached_roots: Vec<NodeId>,
}

impl NodeArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a new, parentless, childless node and returns its id.
    pub fn alloc(&mut self, kind: TokenKind, span: Span) -> NodeId {
        let id = NodeId::from_index(self.nodes.len());
        self.nodes.push(Node::new(kind, span));
        id
    }

    /// Allocates the sentinel "no child here" filler node (root spec
    /// §4.2) at `span`.
    pub fn alloc_none(&mut self, span: Span) -> NodeId {
        self.alloc(TokenKind::NoneNode, span)
    }

    pub fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn get_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Appends `child` to `parent`'s children and sets `child`'s parent
    /// link. Panics (a programming error, not a diagnosable one) if
    /// `child` already has a different parent — reattaching requires an
    /// explicit `detach` first.
    pub fn push_child(&mut self, parent: NodeId, child: NodeId) {
        if let Some(existing) = self.nodes[child.index()].parent {
            assert_eq!(existing, parent, "child already attached to a different parent");
        } else {
            self.nodes[child.index()].parent = Some(parent);
        }
        self.nodes[parent.index()].children.push(child);
    }

    /// Replaces `parent`'s children wholesale with `children`, setting
    /// each child's parent link. Used by productions that build all of a
    /// node's children up front (root spec §4.2, uniform arity).
    pub fn set_children(&mut self, parent: NodeId, children: Vec<NodeId>) {
        for &child in &children {
            self.nodes[child.index()].parent = Some(parent);
        }
        self.nodes[parent.index()].children = children;
    }

    /// Removes `node` from its parent's child list and clears its parent
    /// link, tracking it as a detached root (root spec §3.7).
    pub fn detach(&mut self, node: NodeId) {
        if let Some(parent) = self.nodes[node.index()].parent.take() {
            self.nodes[parent.index()].children.retain(|&c| c != node);
        }
        self.detached_roots.push(node);
    }

    /// Replaces `old` with `new` in `old`'s parent's child list (or in
    /// `ty` if `old` was installed as a type), used by rewrite passes
    /// that swap one subtree for another in place (sugar, literal
    /// unification rewriting a literal's type slot, trait-flattener body
    /// attachment). `new` takes over `old`'s former parent link.
    pub fn replace(&mut self, old: NodeId, new: NodeId) {
        let parent = self.nodes[old.index()].parent;
        if let Some(parent) = parent {
            if let Some(slot) = self.nodes[parent.index()].children.iter_mut().find(|c| **c == old) {
                *slot = new;
            } else if self.nodes[parent.index()].ty == Some(old) {
                self.nodes[parent.index()].ty = Some(new);
            }
            self.nodes[new.index()].parent = Some(parent);
        }
        self.nodes[old.index()].parent = None;
        self.detached_roots.push(old);
    }

    /// Installs `ty` as `node`'s type subtree (root spec invariant 3: not
    /// a child, no parent link back into the main tree).
    pub fn set_type(&mut self, node: NodeId, ty: NodeId) {
        self.nodes[node.index()].ty = Some(ty);
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        &self.nodes[node.index()].children
    }

    pub fn child(&self, node: NodeId, index: usize) -> NodeId {
        self.nodes[node.index()].children[index]
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.index()].parent
    }

    pub fn ty(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.index()].ty
    }

    pub fn kind(&self, node: NodeId) -> TokenKind {
        self.nodes[node.index()].kind
    }

    pub fn data(&self, node: NodeId) -> &NodeData {
        &self.nodes[node.index()].data
    }

    pub fn set_data(&mut self, node: NodeId, data: NodeData) {
        self.nodes[node.index()].data = data;
    }

    /// Ensures `node` has a symtab, creating an empty one if needed, and
    /// returns a mutable reference to it.
    pub fn symtab_mut(&mut self, node: NodeId) -> &mut Symtab {
        self.nodes[node.index()].symtab.get_or_insert_with(Symtab::new)
    }

    pub fn symtab(&self, node: NodeId) -> Option<&Symtab> {
        self.nodes[node.index()].symtab.as_ref()
    }

    /// Walks from `node` up through `parent` links, returning the first
    /// binding found for `name` (root spec §3.3 invariant 4: "lookup
    /// walks to ancestors").
    pub fn lookup(&self, node: NodeId, name: Symbol) -> Option<(NodeId, NodeId, SymbolStatus)> {
        let mut cur = Some(node);
        while let Some(n) = cur {
            if let Some(tab) = self.symtab(n) {
                if let Some((def, status)) = tab.get(name) {
                    return Some((n, def, status));
                }
            }
            cur = self.parent(n);
        }
        None
    }

    /// Updates the status of `name` in the nearest ancestor scope (from
    /// `node` upward) that binds it. Returns `false` if no ancestor binds
    /// it.
    pub fn set_status(&mut self, node: NodeId, name: Symbol, status: SymbolStatus) -> bool {
        let mut cur = Some(node);
        while let Some(n) = cur {
            if let Some(tab) = self.nodes[n.index()].symtab.as_mut() {
                if tab.set_status(name, status) {
                    return true;
                }
            }
            cur = self.parent(n);
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_base::Span;

    #[test]
    fn alloc_assigns_increasing_ids() {
        let mut arena = NodeArena::new();
        let a = arena.alloc(TokenKind::Seq, Span::default());
        let b = arena.alloc(TokenKind::Seq, Span::default());
        assert_ne!(a, b);
        assert_eq!(arena.len(), 2);
    }

    #[test]
    fn push_child_sets_both_links() {
        let mut arena = NodeArena::new();
        let parent = arena.alloc(TokenKind::Seq, Span::default());
        let child = arena.alloc(TokenKind::NoneNode, Span::default());
        arena.push_child(parent, child);
        assert_eq!(arena.children(parent), &[child]);
        assert_eq!(arena.parent(child), Some(parent));
    }

    #[test]
    fn detach_removes_from_parent_and_clears_link() {
        let mut arena = NodeArena::new();
        let parent = arena.alloc(TokenKind::Seq, Span::default());
        let child = arena.alloc(TokenKind::NoneNode, Span::default());
        arena.push_child(parent, child);
        arena.detach(child);
        assert!(arena.children(parent).is_empty());
        assert_eq!(arena.parent(child), None);
    }

    #[test]
    fn replace_swaps_child_slot_in_place() {
        let mut arena = NodeArena::new();
        let parent = arena.alloc(TokenKind::Seq, Span::default());
        let old = arena.alloc(TokenKind::NoneNode, Span::default());
        let new = arena.alloc(TokenKind::NoneNode, Span::default());
        arena.push_child(parent, old);
        arena.replace(old, new);
        assert_eq!(arena.children(parent), &[new]);
        assert_eq!(arena.parent(new), Some(parent));
        assert_eq!(arena.parent(old), None);
    }

    #[test]
    fn type_slot_is_independent_of_children() {
        let mut arena = NodeArena::new();
        let expr = arena.alloc(TokenKind::Reference, Span::default());
        let ty = arena.alloc(TokenKind::Nominal, Span::default());
        arena.set_type(expr, ty);
        assert!(arena.children(expr).is_empty());
        assert_eq!(arena.ty(expr), Some(ty));
        assert_eq!(arena.parent(ty), None);
    }

    #[test]
    fn lookup_walks_up_through_ancestors() {
        let mut arena = NodeArena::new();
        let mut interner = ember_base::Interner::new();
        let name = interner.intern("x");

        let root = arena.alloc(TokenKind::Seq, Span::default());
        let child = arena.alloc(TokenKind::Seq, Span::default());
        arena.push_child(root, child);
        let def = arena.alloc(TokenKind::ParamDecl, Span::default());

        arena.symtab_mut(root).insert(name, def, SymbolStatus::Defined);

        let found = arena.lookup(child, name);
        assert_eq!(found, Some((root, def, SymbolStatus::Defined)));
    }

    #[test]
    fn lookup_prefers_nearest_scope() {
        let mut arena = NodeArena::new();
        let mut interner = ember_base::Interner::new();
        let name = interner.intern("x");

        let root = arena.alloc(TokenKind::Seq, Span::default());
        let child = arena.alloc(TokenKind::Seq, Span::default());
        arena.push_child(root, child);

        let outer_def = arena.alloc(TokenKind::ParamDecl, Span::default());
        let inner_def = arena.alloc(TokenKind::ParamDecl, Span::default());
        arena.symtab_mut(root).insert(name, outer_def, SymbolStatus::Defined);
        arena.symtab_mut(child).insert(name, inner_def, SymbolStatus::Undefined);

        let (scope, def, status) = arena.lookup(child, name).unwrap();
        assert_eq!(scope, child);
        assert_eq!(def, inner_def);
        assert_eq!(status, SymbolStatus::Undefined);
    }

    #[test]
    fn set_status_updates_the_binding_ancestor() {
        let mut arena = NodeArena::new();
        let mut interner = ember_base::Interner::new();
        let name = interner.intern("x");

        let root = arena.alloc(TokenKind::Seq, Span::default());
        let child = arena.alloc(TokenKind::Seq, Span::default());
        arena.push_child(root, child);
        let def = arena.alloc(TokenKind::ParamDecl, Span::default());
        arena.symtab_mut(root).insert(name, def, SymbolStatus::Undefined);

        assert!(arena.set_status(child, name, SymbolStatus::Consumed));
        assert_eq!(arena.lookup(child, name).unwrap().2, SymbolStatus::Consumed);
    }
}
