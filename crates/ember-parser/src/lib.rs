#![cfg_attr(docsrs, feature(doc_cfg))]

//! # ember-parser
//!
//! Recursive-descent parsing (component B, root spec §4.2): tokens to a
//! uniform [`ember_ast::Node`] tree. Every production builds a node of
//! known child arity, filling absent optionals with the parser's sentinel
//! `none` node (`arena.alloc_none`) so arity stays uniform across a given
//! `kind` regardless of which optional pieces were written at the source
//! level.
//!
//! The parser is deliberately permissive: on a missing or unexpected
//! token it pushes a `SyntaxError`/`MissingEndKeyword` diagnostic, installs
//! an `error-type` placeholder or best-effort node, and keeps going rather
//! than aborting the whole parse. It only gives up on the current
//! top-level item (or member) and resynchronizes at the next
//! synchronization-point keyword (root spec §4.2), so a single mistake
//! doesn't swallow the rest of the file.

mod entity;
mod expr;
mod ty;

use ember_ast::{NodeArena, NodeId, TokenKind};
use ember_base::Interner;
use ember_diag::{Diagnostic, ErrorKind, Errors};
use ember_lexer::{tokenize, LexerOptions, Token};

/// Parses `source` into a `Program` node (root spec §6.2's
/// `compile_program` entry point composes this with the pass manager).
pub fn parse_program(
    source: &str,
    source_id: u32,
    lexer_options: LexerOptions,
    arena: &mut NodeArena,
    interner: &mut Interner,
    errors: &mut Errors,
) -> NodeId {
    let tokens = tokenize(source, source_id, lexer_options, interner, errors);
    let mut parser = Parser::new(tokens, arena, interner, errors);
    parser.parse_program()
}

/// Token-stream cursor plus the arena/interner/errors every production
/// writes into.
pub struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    arena: &'a mut NodeArena,
    interner: &'a mut Interner,
    errors: &'a mut Errors,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: Vec<Token>, arena: &'a mut NodeArena, interner: &'a mut Interner, errors: &'a mut Errors) -> Self {
        Parser {
            tokens,
            pos: 0,
            arena,
            interner,
            errors,
        }
    }

    // ---- cursor primitives -------------------------------------------

    fn peek(&self) -> Token {
        self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_kind(&self) -> TokenKind {
        self.peek().kind
    }

    fn previous(&self) -> Token {
        self.tokens[self.pos.saturating_sub(1).min(self.tokens.len() - 1)]
    }

    fn is_at_end(&self) -> bool {
        self.peek_kind() == TokenKind::Eof
    }

    fn advance(&mut self) -> Token {
        let tok = self.peek();
        if !self.is_at_end() {
            self.pos += 1;
        }
        tok
    }

    /// `true` and consumes the token if the next kind matches (ignoring
    /// newline-sensitivity — callers that care about `_New` check
    /// `peek_kind()` directly first, per root spec §4.2).
    fn check_base(&self, kind: TokenKind) -> bool {
        self.peek_kind().strip_newline_variant() == kind
    }

    fn match_base(&mut self, kind: TokenKind) -> bool {
        if self.check_base(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consumes the next token if it is exactly `kind`, pushing
    /// `SyntaxError` and returning `None` otherwise. Used for tokens whose
    /// newline variant is never acceptable at this position.
    fn expect(&mut self, kind: TokenKind, what: &str) -> Option<Token> {
        if self.peek_kind() == kind {
            Some(self.advance())
        } else {
            self.error_here(ErrorKind::SyntaxError, format!("expected {what}"));
            None
        }
    }

    fn expect_base(&mut self, kind: TokenKind, what: &str) -> Option<Token> {
        if self.check_base(kind) {
            Some(self.advance())
        } else {
            self.error_here(ErrorKind::SyntaxError, format!("expected {what}"));
            None
        }
    }

    /// Consumes the closing `end` keyword of a block, reporting
    /// `MissingEndKeyword` (rather than the generic `SyntaxError`) if
    /// absent — a dedicated diagnostic since an unterminated block is the
    /// single most common real-world parse mistake (root spec §7).
    fn expect_end(&mut self) {
        if !self.match_base(TokenKind::End) {
            self.error_here(ErrorKind::MissingEndKeyword, "expected 'end'");
        }
    }

    fn error_here(&mut self, kind: ErrorKind, message: impl Into<String>) {
        let span = self.peek().span;
        self.errors.push(Diagnostic::error(kind, span, message));
    }

    /// Allocates the `none` sentinel at the current position's span.
    fn none_node(&mut self) -> NodeId {
        let span = self.peek().span;
        self.arena.alloc_none(span)
    }

    fn error_type_node(&mut self) -> NodeId {
        let span = self.peek().span;
        self.arena.alloc(TokenKind::ErrorType, span)
    }

    /// Parses an identifier into a bare `Reference`-free name leaf node
    /// tagged `Identifier`; on failure, interns a placeholder empty name
    /// so callers can keep building a well-formed (if meaningless) tree.
    fn expect_identifier(&mut self) -> NodeId {
        let span = self.peek().span;
        if let TokenKind::Identifier(sym) = self.peek_kind() {
            self.advance();
            self.arena.alloc(TokenKind::Identifier(sym), span)
        } else {
            self.error_here(ErrorKind::SyntaxError, "expected identifier");
            self.arena.alloc(TokenKind::Identifier(ember_base::Symbol::EMPTY), span)
        }
    }

    /// Skips tokens until a top-level synchronization keyword, so one bad
    /// item doesn't take the rest of the source down with it (root spec
    /// §4.2 "attempts recovery to synchronization points").
    fn synchronize_top_level(&mut self) {
        while !self.is_at_end() {
            let k = self.peek_kind();
            if k.is_entity_keyword() || k == TokenKind::Use || k == TokenKind::TypeKw {
                return;
            }
            self.advance();
        }
    }

    /// Skips tokens until a member-start keyword or the entity's closing
    /// `end`.
    fn synchronize_member(&mut self) {
        while !self.is_at_end() {
            let k = self.peek_kind();
            if k.is_method_keyword() || ember_ast::entity::is_field_kind(k) || k == TokenKind::End || k == TokenKind::Extern {
                return;
            }
            self.advance();
        }
    }

    // ---- top level ------------------------------------------------------

    fn parse_program(&mut self) -> NodeId {
        let start = self.peek().span;
        let package = self.parse_package();
        let span = start.merge(self.previous().span);
        let program = self.arena.alloc(TokenKind::Program, span);
        self.arena.push_child(program, package);
        program
    }

    fn parse_package(&mut self) -> NodeId {
        let start = self.peek().span;
        let mut items = Vec::new();
        while !self.is_at_end() {
            match self.peek_kind() {
                TokenKind::Use => items.push(self.parse_use()),
                TokenKind::TypeKw => items.push(self.parse_type_alias()),
                k if k.is_entity_keyword() => items.push(entity::parse_entity(self)),
                _ => {
                    self.error_here(ErrorKind::SyntaxError, "expected a top-level declaration");
                    self.synchronize_top_level();
                    if self.is_at_end() {
                        break;
                    }
                }
            }
        }
        let span = start.merge(self.previous().span);
        let package = self.arena.alloc(TokenKind::Package, span);
        self.arena.set_children(package, items);
        package
    }

    /// `use "path"`; package loading itself is out of scope (root spec
    /// §1), so this only records the shape for a later external
    /// collaborator to resolve.
    fn parse_use(&mut self) -> NodeId {
        let start = self.advance().span; // 'use'
        let path = if let TokenKind::StringLiteral(sym) = self.peek_kind() {
            let span = self.advance().span;
            self.arena.alloc(TokenKind::StringLiteral(sym), span)
        } else {
            self.error_here(ErrorKind::SyntaxError, "expected a string literal path");
            self.none_node()
        };
        let span = start.merge(self.previous().span);
        let node = self.arena.alloc(TokenKind::Use, span);
        self.arena.set_children(node, vec![path]);
        node
    }

    /// `type Name[typeparams] = Type`.
    fn parse_type_alias(&mut self) -> NodeId {
        let start = self.advance().span; // 'type'
        let name = self.expect_identifier();
        let typeparams = ty::parse_typeparam_decls(self);
        self.expect(TokenKind::Assign, "'='");
        let rhs = ty::parse_type(self);
        let span = start.merge(self.previous().span);
        let node = self.arena.alloc(TokenKind::TypeKw, span);
        let typeparams_node = self.arena.alloc(TokenKind::TypeParamDecl, span);
        self.arena.set_children(typeparams_node, typeparams);
        self.arena.set_children(node, vec![name, typeparams_node, rhs]);
        node
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_ast::print_ast;

    fn parse(source: &str) -> (NodeArena, String) {
        let mut arena = NodeArena::new();
        let mut interner = Interner::new();
        let mut errors = Errors::new();
        let program = parse_program(source, 0, LexerOptions::default(), &mut arena, &mut interner, &mut errors);
        assert!(!errors.has_errors(), "unexpected parse errors: {:?}", errors.iter().collect::<Vec<_>>());
        let printed = print_ast(&arena, &interner, program);
        (arena, printed)
    }

    #[test]
    fn parses_an_empty_primitive() {
        let (arena, _) = parse("primitive Unit end");
        let mut errs = Errors::new();
        let mut interner = Interner::new();
        let _ = &mut errs;
        let _ = &mut interner;
        assert!(!arena.is_empty());
    }

    #[test]
    fn parses_a_class_with_a_field_and_a_method() {
        let (_arena, printed) = parse(
            "class ref Counter\n  var count: I32 = 0\n  new create(): Counter\n    count = 0\n  end\nend",
        );
        assert!(printed.contains("class"));
    }

    #[test]
    fn reports_missing_end_keyword() {
        let mut arena = NodeArena::new();
        let mut interner = Interner::new();
        let mut errors = Errors::new();
        parse_program("class ref Foo", 0, LexerOptions::default(), &mut arena, &mut interner, &mut errors);
        assert!(errors.of_kind(ErrorKind::MissingEndKeyword).count() >= 1);
    }

    #[test]
    fn parses_a_use_declaration() {
        let (_arena, printed) = parse("use \"collections\"\nprimitive Unit end");
        assert!(printed.contains("use"));
    }
}
