//! The node `data` slot: an opaque back-reference (root spec §3.2).
//!
//! `data` never owns anything — it is a `NodeId` (or small bundle of
//! them) pointing elsewhere in the same arena, or a bookkeeping marker
//! with no node behind it at all. What it means depends entirely on the
//! owning node's `kind`.

use crate::node::NodeId;

/// Cycle-detection state for a type-alias definition (root spec §4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AliasState {
    #[default]
    Initial,
    InProgress,
    Done,
}

/// Cycle-detection state for a trait/interface's provides-graph walk
/// (root spec §4.6 Stage 1), and for the trait-flattener's own recursion
/// guard distinct from `AliasState` above (different entities, different
/// graphs).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProvidesState {
    #[default]
    Initial,
    InProgress,
    Done,
}

/// A not-yet-materialized method instantiation (root spec §4.10, §9
/// "Deferred reification").
///
/// Building this record instead of eagerly substituting avoids
/// duplicating a (potentially large) method body every time a generic
/// receiver's method is looked up; [`crate::reify::materialize`]
/// performs the substitution the first time the body is actually needed.
#[derive(Debug, Clone)]
pub struct DeferredReification {
    /// The original (unreified) method definition node.
    pub method_ast: NodeId,
    /// The entity's type parameter declarations.
    pub type_params: Vec<NodeId>,
    /// The type arguments supplied at the receiver's nominal type.
    pub type_args: Vec<NodeId>,
    /// The method's own type parameter declarations, if generic.
    pub method_params: Vec<NodeId>,
    /// The type arguments supplied at the call site for `method_params`.
    pub method_args: Vec<NodeId>,
    /// The concrete receiver type substituted for `this-type`.
    pub this_type: NodeId,
}

/// The opaque `data` back-reference (root spec §3.2).
#[derive(Debug, Clone, Default)]
pub enum NodeData {
    #[default]
    None,
    /// A `reference` node's resolved definition (param, local, field, or
    /// entity/typeparam for a type-position reference).
    Def(NodeId),
    /// A method body's donor: the trait/entity method it was copied from
    /// during trait flattening (root spec §4.6 Stage 4), or the original
    /// definition a `DeferredReification` will eventually materialize
    /// from.
    BodyDonor(NodeId),
    /// A type-alias definition's cycle-detection state.
    Alias(AliasState),
    /// A trait/interface's provides-graph cycle-detection state.
    Provides(ProvidesState),
    /// A lazily-materializable method instantiation.
    Deferred(Box<DeferredReification>),
    /// A literal-type node's accumulated control-flow branch origins
    /// (root spec §4.11, §9 "Control-flow-as-types"): each entry is the
    /// AST node whose value contributed this literal (an `if`/`match`
    /// arm, a `seq`'s final expression, ...).
    LiteralBranches(Vec<NodeId>),
    /// A field-delegation binding: which field a method forwards to
    /// (root spec §4.6 Stage 3/4).
    DelegateField(NodeId),
}

impl NodeData {
    pub fn as_def(&self) -> Option<NodeId> {
        match self {
            NodeData::Def(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_body_donor(&self) -> Option<NodeId> {
        match self {
            NodeData::BodyDonor(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_alias_state(&self) -> Option<AliasState> {
        match self {
            NodeData::Alias(s) => Some(*s),
            _ => None,
        }
    }

    pub fn as_provides_state(&self) -> Option<ProvidesState> {
        match self {
            NodeData::Provides(s) => Some(*s),
            _ => None,
        }
    }

    pub fn as_deferred(&self) -> Option<&DeferredReification> {
        match self {
            NodeData::Deferred(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_literal_branches(&self) -> Option<&[NodeId]> {
        match self {
            NodeData::LiteralBranches(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_delegate_field(&self) -> Option<NodeId> {
        match self {
            NodeData::DelegateField(id) => Some(*id),
            _ => None,
        }
    }
}
