#![cfg_attr(docsrs, feature(doc_cfg))]

//! # ember-compile
//!
//! The top-level compilation entry point (root spec §6.2): wires the
//! lexer, parser, and [`ember_passes::run_passes`] pipeline together
//! behind a single [`compile_program`] call, and owns the per-compilation
//! [`Compiler`] state (interner, AST arena) the rest of the core is
//! threaded through explicitly rather than reaching for anywhere
//! ambient/global (root spec §9 "global state to eliminate").
//!
//! This crate never touches a filesystem: a [`SourceFile`] is an owned,
//! in-memory buffer the embedder constructs however it likes (reading a
//! real file, a test fixture, a generated string); package discovery and
//! multi-file loading from disk are an external collaborator's job
//! (root spec §1).

use std::sync::Arc;

use ember_ast::{NodeArena, NodeId};
use ember_base::{Interner, Span};
use ember_diag::Errors;
use ember_lexer::{LexerOptions, TokenKind};
use ember_passes::{run_passes, Pass};
use ember_types::reify::ReificationCache;

/// One in-memory compilation unit (root spec §6.1).
///
/// `source` is an `Arc<str>` rather than an owned `String` so a caller
/// compiling the same text repeatedly (e.g. an incremental-looking
/// embedder layered on top of this non-incremental core) isn't forced to
/// clone the buffer per attempt.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub name: String,
    pub source: Arc<str>,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, source: impl Into<Arc<str>>) -> Self {
        SourceFile { name: name.into(), source: source.into() }
    }
}

/// How much the embedder wants logged at the `info` level (root spec
/// §6.2). The core always logs at `debug`/`trace` through the `log`
/// facade regardless of this setting (root spec §1.1); this only gates
/// the handful of coarse `info`-level milestones `compile_program` itself
/// emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// No `info`-level milestones, only `debug`/`trace`.
    Minimal,
    /// Coarse progress suitable for a build tool's own log stream.
    ToolInfo,
    #[default]
    Info,
}

/// Configuration for one [`compile_program`] call (root spec §6.2).
#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// Last pass to run; `None` runs the whole pipeline.
    pub limit: Option<Pass>,
    pub verbosity: Verbosity,
    /// Enables platform conditionals a real code generator would branch
    /// on. Stored and threaded through for that future consumer; this
    /// core's own passes are platform-independent and never read it.
    pub release: bool,
    /// Column width [`pretty_print_ast`] wraps at.
    pub ast_print_width: usize,
    /// Runs [`ember_passes::check_tree::run`] after every pass.
    pub check_tree: bool,
    pub allow_test_symbols: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions {
            limit: None,
            verbosity: Verbosity::default(),
            release: false,
            ast_print_width: 100,
            check_tree: false,
            allow_test_symbols: false,
        }
    }
}

/// The state one compilation owns: the interner every [`ember_base::Symbol`]
/// is relative to, and the arena every [`NodeId`] is relative to. Neither
/// is global — a second concurrent [`compile_program`] call gets its own
/// `Compiler` and the two share nothing (root spec §5 "no shared mutable
/// state across compilations").
pub struct Compiler {
    pub arena: NodeArena,
    pub interner: Interner,
    pub root: NodeId,
}

impl Compiler {
    /// Renders `self.root` via [`ember_ast::printer::print_ast`], then
    /// greedily wraps the single-line dump at `width` columns, never
    /// breaking inside a `(...)`/`{...}`/`[...]` token run. A convenience
    /// for the debugging dumps `CompileOptions::ast_print_width` names
    /// (root spec §6.2); the canonical, normative dump format is still
    /// the unwrapped single line `print_ast` itself produces (root spec
    /// §6.3).
    pub fn pretty_print_ast(&self, width: usize) -> String {
        let flat = ember_ast::printer::print_ast(&self.arena, &self.interner, self.root);
        wrap_at_spaces(&flat, width)
    }
}

fn wrap_at_spaces(flat: &str, width: usize) -> String {
    let mut out = String::new();
    let mut col = 0;
    for word in flat.split(' ') {
        let word_len = word.chars().count();
        if col > 0 && col + 1 + word_len > width {
            out.push('\n');
            col = 0;
        } else if col > 0 {
            out.push(' ');
            col += 1;
        }
        out.push_str(word);
        col += word_len;
    }
    out
}

/// Drives `sources` (one or more in-memory files forming a single
/// package, root spec §6.2) through parsing and the full pass pipeline,
/// stopping early wherever `errors` becomes fatal. Always returns a
/// `Compiler` with a root to inspect, even when `errors` is non-empty —
/// most diagnostics are locally recoverable (root spec §7), so a partial
/// or error-marked tree is still useful to a caller (e.g. a language
/// server wanting best-effort completions).
pub fn compile_program(sources: &[SourceFile], options: CompileOptions, errors: &mut Errors) -> Compiler {
    if options.verbosity != Verbosity::Minimal {
        log::info!("compile_program: compiling {} source file(s)", sources.len());
    }

    let mut arena = NodeArena::new();
    let mut interner = Interner::new();
    let lexer_options = LexerOptions { allow_test_symbols: options.allow_test_symbols };

    let root = parse_sources(&mut arena, &mut interner, errors, sources, lexer_options);

    if !errors.is_fatal() {
        let mut cache = ReificationCache::default();
        run_passes(&mut arena, &mut interner, errors, root, options.limit, &mut cache, options.check_tree);
    }

    if options.verbosity != Verbosity::Minimal {
        log::info!("compile_program: finished with {} diagnostic(s)", errors.len());
    }

    Compiler { arena, interner, root }
}

/// Parses every source file independently, then merges their top-level
/// packages into one (root spec §6.2's generalization of
/// `root_package_path` to a pre-loaded file list): a multi-file package
/// is just the union of every file's top-level declarations, in file
/// order.
fn parse_sources(
    arena: &mut NodeArena,
    interner: &mut Interner,
    errors: &mut Errors,
    sources: &[SourceFile],
    lexer_options: LexerOptions,
) -> NodeId {
    let mut items = Vec::new();
    let mut span = Span::default();

    for (i, source) in sources.iter().enumerate() {
        log::debug!("parsing '{}' ({} bytes)", source.name, source.source.len());
        let program = ember_parser::parse_program(&source.source, i as u32, lexer_options, arena, interner, errors);
        let package = arena.child(program, 0);
        span = span.merge(arena.get(package).span);
        items.extend(arena.children(package).iter().copied());
        arena.detach(package);
    }

    let package = arena.alloc(TokenKind::Package, span);
    arena.set_children(package, items);
    let program = arena.alloc(TokenKind::Program, span);
    arena.push_child(program, package);
    program
}
