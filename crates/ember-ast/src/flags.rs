//! Per-node flags (root spec §3.2, §5 "Ordering guarantees").
//!
//! The spec calls these "independent booleans" plus a pass-reached mask.
//! They are modeled as plain `bool`/`u32` fields rather than a bitflags
//! crate: there are few enough of them, and each has pass-specific
//! propagation rules (see [`NodeFlags::propagate_can_error`]) that read
//! more clearly as named methods than as bit twiddling.

/// The independent per-node flags plus the pass-reached bitmask.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NodeFlags {
    /// Set iff this node or any descendant can raise an error (root spec
    /// invariant 5). Propagates bottom-up; explicitly cleared by `try`.
    pub can_error: bool,
    /// Set iff evaluating this node can, directly or transitively, send a
    /// message to an actor behavior.
    pub can_send: bool,
    /// Weaker than `can_send`: set iff this node's evaluation *might*
    /// send depending on a runtime-only condition the type system can't
    /// rule out (e.g. a dynamic dispatch through an interface).
    pub might_send: bool,
    /// Set while a pass's visit of this node is still on the call stack;
    /// used by recursive-definition cycle detection (alias/trait
    /// flattening) rather than left to `NodeData::AliasState`/`RecState`
    /// alone when the same node is visited via two different paths in a
    /// single pass.
    pub in_progress: bool,
    /// Set once a node's processing for the *current* pass is fully
    /// finished; used by constructs that attach a node twice (sugar
    /// rewrites) to avoid double-processing.
    pub done: bool,
    /// Set on a subtree the pass manager should skip descending into
    /// entirely (root spec §5 invariant 3), e.g. a `DeferredReification`
    /// donor body kept only for later materialization.
    pub preserve: bool,
    /// Set on a method declared with a trailing `?` (root spec §3.6):
    /// the method may raise an error without an enclosing `try`. Checked
    /// against the body's actual `can_error` by the status tracker (root
    /// spec §4.13, `NotPartialButErrors`/`PartialButNeverErrors`).
    pub partial: bool,
    /// Set on a method declared with a leading `extern` (FFI boundary,
    /// root spec §4.13's `BadFFI` structural check).
    pub is_extern: bool,
    /// Bit `i` set means pass number `i` (0-indexed, matching
    /// `ember_passes::Pass` discriminants) has visited this node at least
    /// once. Root spec §5 invariant 1 and §8.1 testable property 2.
    pub pass_reached_mask: u32,
}

impl NodeFlags {
    /// Records that `pass_index` has now visited this node.
    pub fn mark_reached(&mut self, pass_index: u32) {
        self.pass_reached_mask |= 1 << pass_index;
    }

    /// `true` if `pass_index` has already visited this node.
    pub fn reached(&self, pass_index: u32) -> bool {
        self.pass_reached_mask & (1 << pass_index) != 0
    }

    /// The highest pass index that has reached this node, or `None` if no
    /// pass has visited it yet. Used to check the monotonicity testable
    /// property (root spec §8.1.2).
    pub fn highest_reached(&self) -> Option<u32> {
        if self.pass_reached_mask == 0 {
            None
        } else {
            Some(31 - self.pass_reached_mask.leading_zeros())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mark_reached_is_idempotent_and_queryable() {
        let mut flags = NodeFlags::default();
        assert!(!flags.reached(2));
        flags.mark_reached(2);
        flags.mark_reached(2);
        assert!(flags.reached(2));
        assert!(!flags.reached(3));
    }

    #[test]
    fn highest_reached_tracks_the_max_pass_index() {
        let mut flags = NodeFlags::default();
        assert_eq!(flags.highest_reached(), None);
        flags.mark_reached(0);
        flags.mark_reached(3);
        flags.mark_reached(1);
        assert_eq!(flags.highest_reached(), Some(3));
    }
}
