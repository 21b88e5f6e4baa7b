#![cfg_attr(docsrs, feature(doc_cfg))]

//! # ember-types
//!
//! The type algebra (root spec §3.4, §3.5, §4.7–§4.11): reference
//! capabilities, type-subtree shape conventions, the subtype relation,
//! type assembly/normalization, reification, and the literal unifier.
//!
//! Types are ordinary [`ember_ast::Node`] subtrees — there is no parallel
//! `Type` struct hierarchy (root spec §9 "Polymorphism") — so this crate
//! is mostly a set of named accessors and algorithms over
//! [`ember_ast::NodeArena`] rather than its own data structure.
//!
//! ## Modules
//! - [`cap`]: the six-capability lattice and ephemeral markers.
//! - [`capset`]: `#read`/`#send`/`#share`/`#alias`/`#any` constraint sets.
//! - [`shape`]: type-subtree child-layout conventions.
//! - [`subtype`]: the structural `A <: B` relation.
//! - [`assembler`]: union/isect/tuple/arrow normalization.
//! - [`reify`]: typeparam substitution and deferred-reification caching.
//! - [`literal`]: the literal unifier (`uifset` and resolution).

pub mod assembler;
pub mod cap;
pub mod capset;
pub mod literal;
pub mod reify;
pub mod shape;
pub mod subtype;

pub use cap::{Cap, Ephemeral};
pub use capset::CapSet;
pub use literal::{uifset, unify_literal, LiteralError, NumericFamilyOracle, UifSet};
pub use reify::{reify, reify_force, reify_method_signature, ReificationCache};
pub use subtype::{is_subtype, type_equal};
