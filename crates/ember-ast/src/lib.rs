#![cfg_attr(docsrs, feature(doc_cfg))]

//! # ember-ast
//!
//! The uniform AST node/arena/symbol-table data structure (root spec §3)
//! shared by every pass in the ember compiler core.
//!
//! There is a single node shape ([`Node`]) reused for concrete syntax
//! *and* every abstract tree form later passes synthesize — types,
//! desugared loops, trait-flattened method bodies — tagged by the same
//! closed [`ember_lexer::TokenKind`] enum the lexer uses for tokens
//! (root spec §9 "Polymorphism"). Nodes live in a single [`NodeArena`]
//! per compilation and are addressed by the non-owning [`NodeId`] handle.
//!
//! ## Modules
//! - [`node`]: [`Node`], [`NodeId`].
//! - [`arena`]: [`NodeArena`], the tree's owner and navigation API.
//! - [`symtab`]: [`Symtab`], [`SymbolStatus`] and its join lattice.
//! - [`flags`]: [`NodeFlags`], the per-node boolean/bitmask slot.
//! - [`data`]: [`NodeData`], the opaque `data` back-reference variants.
//! - [`printer`]: the debug AST dump format and its reader (§6.3).

pub mod arena;
pub mod data;
pub mod entity;
pub mod flags;
pub mod node;
pub mod printer;
pub mod symtab;

pub use arena::NodeArena;
pub use data::{AliasState, DeferredReification, NodeData, ProvidesState};
pub use flags::NodeFlags;
pub use node::{Node, NodeId};
pub use printer::{parse_ast, print_ast, ReadError};
pub use symtab::{SymbolStatus, Symtab};

pub use ember_lexer::TokenKind;
