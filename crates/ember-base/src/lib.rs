#![cfg_attr(docsrs, feature(doc_cfg))]

//! # ember-base
//!
//! Pure structural atoms shared by every crate in the ember compiler core.
//!
//! This crate provides the foundational types the core's passes are built
//! on top of:
//!
//! - [`Arena`] — bump allocation for values that live for an entire
//!   compilation and are never individually freed;
//! - [`Pool`] — a slab allocator with individual-slot reuse, for values
//!   that are frequently detached and reattached (AST subtrees produced by
//!   sugar rewrites or trait-method duplication);
//! - [`Interner`]/[`Symbol`] — string interning for O(1) name equality;
//! - [`Span`] — source location tracking;
//! - [`SpannedError`]/[`Result`] — errors with source positions.
//!
//! # Design principles
//!
//! This crate has **no knowledge of the source language's grammar or
//! semantics**. It is the "external collaborator" layer the rest of the
//! core depends on (see the root spec's §1): a real embedder could swap
//! any of these out without touching the lexer, parser, or passes, as long
//! as the `Symbol`/`Span`/arena-handle contracts are preserved.
//!
//! # Example
//!
//! ```
//! use ember_base::{Arena, Interner, Span};
//!
//! let arena: Arena<&str> = Arena::new();
//! let mut interner = Interner::new();
//!
//! let hello = interner.intern("hello");
//! let span = Span::new(0, 5);
//!
//! let allocated = arena.alloc("hello");
//! assert_eq!(*allocated, "hello");
//! ```

pub mod arena;
pub mod error;
pub mod intern;
pub mod pool;
pub mod span;

pub use arena::Arena;
pub use error::{Result, SpannedError};
pub use intern::{Interner, Symbol, SymbolEq};
pub use pool::{Pool, Slot};
pub use span::Span;
