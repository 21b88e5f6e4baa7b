//! The pass pipeline driver (component D, root spec §4 intro, §5
//! "Ordering guarantees").
//!
//! Each pass is a single top-down (or, where noted, bottom-up) walk over
//! the whole tree reachable from the program root. A node's
//! `pass_reached_mask` bit for a pass's own index is set the moment that
//! pass visits it, so later code (and the §8.1.2 monotonicity property)
//! can tell which passes have already run over a given subtree. Bit
//! index `i` here must match [`Pass`]'s discriminant for pass `i`
//! exactly — [`ember_ast::NodeFlags::mark_reached`] has no idea what a
//! "pass" is, it only knows bit positions.

use ember_ast::{NodeArena, NodeId};
use ember_base::Interner;
use ember_diag::Errors;
use ember_types::reify::ReificationCache;

/// The six passes that run, in this fixed order, over every program.
/// Discriminants are 0-indexed and double as bit positions into
/// [`ember_ast::NodeFlags::pass_reached_mask`] — do not renumber these
/// without checking every `mark_reached`/`reached` call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u32)]
pub enum Pass {
    Sugar = 0,
    ScopeBuilder = 1,
    NameResolver = 2,
    TraitFlattener = 3,
    ExpressionTyper = 4,
    StatusTracker = 5,
}

impl Pass {
    pub const ALL: [Pass; 6] = [
        Pass::Sugar,
        Pass::ScopeBuilder,
        Pass::NameResolver,
        Pass::TraitFlattener,
        Pass::ExpressionTyper,
        Pass::StatusTracker,
    ];

    pub fn index(self) -> u32 {
        self as u32
    }

    pub fn name(self) -> &'static str {
        match self {
            Pass::Sugar => "sugar",
            Pass::ScopeBuilder => "scope_builder",
            Pass::NameResolver => "name_resolver",
            Pass::TraitFlattener => "trait_flattener",
            Pass::ExpressionTyper => "expression_typer",
            Pass::StatusTracker => "status_tracker",
        }
    }
}

/// Marks `node` as reached by `pass`, skipping the write if it was
/// already marked (root spec §8.1 testable property 2 requires the mask
/// only ever grows, never needs to shrink — `mark_reached` is already
/// idempotent, this wrapper just centralizes the index lookup).
pub(crate) fn mark(arena: &mut NodeArena, node: NodeId, pass: Pass) {
    arena.get_mut(node).flags.mark_reached(pass.index());
}

/// `true` if `node` is flagged `preserve` (root spec §5 invariant 3): a
/// pass must not descend into it at all. Set on donor bodies kept around
/// only for later [`ember_types::reify::ReificationCache::materialize`]
/// calls, among other "look but don't touch yet" subtrees.
pub(crate) fn is_preserved(arena: &NodeArena, node: NodeId) -> bool {
    arena.get(node).flags.preserve
}

/// Runs every pass up to and including `limit` (or all of them if `limit`
/// is `None`) over `root`, in the fixed order of [`Pass::ALL`].
///
/// Stops early if `errors` becomes fatal after a pass (root spec §7
/// propagation policy: a fatal error aborts the remaining pass chain).
/// Non-fatal errors accumulate in `errors` and every later pass still
/// runs, since most diagnostics are locally recoverable via `error-type`
/// substitution.
///
/// When `check_tree` is set (`CompileOptions::check_tree`, root spec
/// §6.2), [`crate::check_tree::run`] re-validates the whole tree's
/// parent/child invariants after each pass — any violation it finds is
/// itself a fatal `InternalError`, so the loop's usual early-exit check
/// catches it.
#[allow(clippy::too_many_arguments)]
pub fn run_passes(
    arena: &mut NodeArena,
    interner: &mut Interner,
    errors: &mut Errors,
    root: NodeId,
    limit: Option<Pass>,
    cache: &mut ReificationCache,
    check_tree: bool,
) {
    for pass in Pass::ALL {
        if let Some(limit) = limit {
            if pass > limit {
                break;
            }
        }
        log::debug!("running pass {}", pass.name());
        match pass {
            Pass::Sugar => crate::sugar::run(arena, interner, root),
            Pass::ScopeBuilder => crate::scope::run(arena, interner, errors, root),
            Pass::NameResolver => crate::resolve::run(arena, interner, errors, root),
            Pass::TraitFlattener => crate::flatten::run(arena, interner, errors, root),
            Pass::ExpressionTyper => crate::typer::run(arena, interner, errors, root, cache),
            Pass::StatusTracker => crate::status::run(arena, interner, errors, root),
        }
        if check_tree {
            crate::check_tree::run(arena, errors, root);
        }
        if errors.is_fatal() {
            log::debug!("pass {} reported a fatal error, aborting pipeline", pass.name());
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pass_discriminants_match_bit_positions() {
        assert_eq!(Pass::Sugar.index(), 0);
        assert_eq!(Pass::ScopeBuilder.index(), 1);
        assert_eq!(Pass::NameResolver.index(), 2);
        assert_eq!(Pass::TraitFlattener.index(), 3);
        assert_eq!(Pass::ExpressionTyper.index(), 4);
        assert_eq!(Pass::StatusTracker.index(), 5);
    }

    #[test]
    fn all_contains_every_pass_in_order() {
        assert_eq!(Pass::ALL.len(), 6);
        for (i, pass) in Pass::ALL.iter().enumerate() {
            assert_eq!(pass.index(), i as u32);
        }
    }
}
