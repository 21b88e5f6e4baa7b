//! The uniform AST node (root spec §3.2).
//!
//! Every tree node — concrete syntax or an abstract shape synthesized by a
//! later pass — is the same [`Node`] struct. There is no node-kind class
//! hierarchy (root spec §9 "Polymorphism"): a single `kind: TokenKind` tag
//! plus a handful of independent side slots cover every shape named in the
//! spec.

use ember_base::Span;
use ember_lexer::TokenKind;

use crate::data::NodeData;
use crate::flags::NodeFlags;
use crate::symtab::Symtab;

/// A non-owning handle into a [`crate::arena::NodeArena`].
///
/// `Copy`, dense, and comparable in O(1); this is how the tree represents
/// parent/child/type/data links rather than `Box`/`Rc` (root spec §3.7,
/// §9 "Cyclic graphs").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// A sentinel used only for fields that are populated lazily and
    /// observably absent before that point (never stored in the arena's
    /// `parent`/`type` slots, which use `Option<NodeId>` instead).
    pub const DANGLING: NodeId = NodeId(u32::MAX);

    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn from_index(i: usize) -> Self {
        NodeId(i as u32)
    }
}

/// A tree node.
///
/// See the module documentation and root spec §3.2 for the field-by-field
/// rationale. Every field is independently optional/empty except `kind`
/// and `span`, which every node carries regardless of origin.
#[derive(Debug, Clone)]
pub struct Node {
    /// Token kind if this node came straight from the parser, or the
    /// abstract marker kind (`Seq`, `Nominal`, ...) if synthesized.
    pub kind: TokenKind,
    /// Source span; synthesized nodes inherit the span of the construct
    /// that produced them (e.g. a desugared `for` inherits the `for`
    /// keyword's span) so diagnostics still point somewhere sensible.
    pub span: Span,
    /// Ordered children. Order is semantically significant (root spec
    /// invariant 2): reordering must be an explicit, deliberate rewrite.
    pub children: Vec<NodeId>,
    /// Back-reference to the parent, `None` only for a detached root
    /// (root spec invariant 1).
    pub parent: Option<NodeId>,
    /// This node's type, as a pointer to another AST subtree. Not a
    /// child — has no parent link back into the main tree (invariant 3).
    pub ty: Option<NodeId>,
    /// Opaque back-reference: a definition, a body donor, a recursion
    /// marker, or nothing.
    pub data: NodeData,
    /// Independent booleans plus the pass-reached bitmask.
    pub flags: NodeFlags,
    /// This node's own local scope, if it introduces one. Lookup from a
    /// node without a symtab walks to the nearest ancestor that has one.
    pub symtab: Option<Symtab>,
}

impl Node {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Node {
            kind,
            span,
            children: Vec::new(),
            parent: None,
            ty: None,
            data: NodeData::None,
            flags: NodeFlags::default(),
            symtab: None,
        }
    }

    /// `true` if this is the sentinel "no child here" filler node the
    /// parser inserts to keep production arities uniform (root spec §4.2).
    pub fn is_none_node(&self) -> bool {
        self.kind == TokenKind::NoneNode
    }
}
