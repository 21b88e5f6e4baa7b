#![cfg_attr(docsrs, feature(doc_cfg))]

//! # ember-diag
//!
//! The diagnostic surface of the ember compiler core (root spec §6.4, §7).
//!
//! ## Architecture
//!
//! ```text
//!  pass code
//!      │  Errors::push(Diagnostic)
//!      ▼
//! ┌───────────┐     consumed by the embedder
//! │  Errors   │ ──▶ (never printed here — see root spec §6.4)
//! └───────────┘
//! ```
//!
//! Core code never formats or prints a diagnostic; it only ever pushes one
//! onto an [`Errors`] sink that the caller supplied. Error-message
//! formatting is explicitly named as an external collaborator in the root
//! spec's §1.
//!
//! ## Modules
//!
//! - [`kind`]: the closed [`kind::ErrorKind`] taxonomy (§7)
//! - [`diagnostic`]: [`Diagnostic`], [`Severity`], and the [`Errors`] sink

pub mod diagnostic;
pub mod kind;

pub use diagnostic::{Diagnostic, Errors, Severity};
pub use kind::ErrorKind;
