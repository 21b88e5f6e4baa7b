#![cfg_attr(docsrs, feature(doc_cfg))]

//! # ember-passes
//!
//! The pass pipeline (components D–N, minus the parts that live in
//! `ember-types`): sugar/desugaring, scope building, name resolution,
//! trait flattening, expression typing, and status tracking, sequenced
//! by a small [`pass_manager`].
//!
//! Each pass is a single walk over the shared [`ember_ast::NodeArena`],
//! gated by [`ember_ast::NodeFlags::pass_reached_mask`] so a node is
//! never revisited by the same pass twice (root spec §5 "Ordering
//! guarantees"). Passes communicate only through the tree itself — node
//! `type`, `data`, `flags`, and `symtab` — never through side channels.
//!
//! ## Modules
//! - [`pass_manager`]: the `Pass` enum and `run_passes` driver.
//! - [`sugar`]: desugaring (component E).
//! - [`scope`]: symbol table construction (component F).
//! - [`resolve`]: name resolution (component G).
//! - [`flatten`]: trait flattening (component I).
//! - [`typer`]: expression typing (component L), including literal
//!   unification (component M) and the capability checks of component J.
//! - [`status`]: the final status-tracking/verifier pass (component N).
//! - [`builders`]: small tree-shape builders shared by `sugar` and
//!   `flatten`.
//! - [`check_tree`]: the optional tree-invariant checker `CompileOptions`
//!   can enable after every pass.

pub mod builders;
pub mod check_tree;
pub mod flatten;
pub mod pass_manager;
pub mod resolve;
pub mod scope;
pub mod status;
pub mod sugar;
pub mod typer;

pub use pass_manager::{run_passes, Pass};
