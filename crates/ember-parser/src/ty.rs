//! Type grammar: nominal types, unions, intersections, tuples, and
//! typeparam declarations/typeargs (root spec §3.4, §4.2).
//!
//! Arrow (viewpoint) types and `typeparamref` are never written by this
//! module: arrows are synthesized by the expression typer (root spec
//! §4.12), and a bare name is always parsed as a `nominal` — only the
//! name resolver (§4.5) knows whether that name actually refers to an
//! in-scope type parameter, at which point it rewrites the node in place.

use ember_ast::{NodeId, TokenKind};
use ember_diag::ErrorKind;
use ember_types::assembler;
use ember_types::cap::{Cap, Ephemeral};
use ember_types::shape::*;

use crate::Parser;

/// `type := isect-type ('|' isect-type)*`
pub(crate) fn parse_type(p: &mut Parser) -> NodeId {
    let mut left = parse_isect_type(p);
    while p.match_base(TokenKind::Pipe) {
        let right = parse_isect_type(p);
        left = assembler::union(p.arena, left, right);
    }
    left
}

/// `isect-type := atom-type ('&' atom-type)*`
fn parse_isect_type(p: &mut Parser) -> NodeId {
    let mut left = parse_atom_type(p);
    while p.match_base(TokenKind::Amp) {
        let right = parse_atom_type(p);
        left = assembler::isect(p.arena, left, right);
    }
    left
}

/// `atom-type := '(' type (',' type)* ')' | 'this' | nominal-type`
fn parse_atom_type(p: &mut Parser) -> NodeId {
    match p.peek_kind().strip_newline_variant() {
        TokenKind::LParen => parse_paren_type(p),
        TokenKind::LBrace => parse_function_type(p),
        TokenKind::This => {
            p.advance();
            make_this_type(p.arena)
        }
        TokenKind::Identifier(_) => parse_nominal_type(p),
        _ => {
            p.error_here(ErrorKind::SyntaxError, "expected a type");
            make_error_type(p.arena)
        }
    }
}

/// A tuple of one collapses to its sole member (root spec §4.7).
fn parse_paren_type(p: &mut Parser) -> NodeId {
    p.advance(); // '(' or '(\n'
    let mut members = vec![parse_type(p)];
    while p.match_base(TokenKind::Comma) {
        members.push(parse_type(p));
    }
    p.expect_base(TokenKind::RParen, "')'");
    if members.len() == 1 {
        members.pop().unwrap()
    } else {
        make_list_type(p.arena, TokenKind::Tuple, members)
    }
}

/// `{(A, B): C}` — a first-class function type.
fn parse_function_type(p: &mut Parser) -> NodeId {
    let start = p.peek().span;
    p.advance(); // '{'
    p.expect_base(TokenKind::LParen, "'('");
    let mut params = Vec::new();
    if !p.check_base(TokenKind::RParen) {
        params.push(parse_type(p));
        while p.match_base(TokenKind::Comma) {
            params.push(parse_type(p));
        }
    }
    p.expect_base(TokenKind::RParen, "')'");
    let result = if p.match_base(TokenKind::Colon) {
        parse_type(p)
    } else {
        make_infer_type(p.arena)
    };
    p.expect(TokenKind::RBrace, "'}'");
    let span = start.merge(p.previous().span);
    let params_node = p.arena.alloc(TokenKind::Params, span);
    p.arena.set_children(params_node, params);
    let node = p.arena.alloc(TokenKind::FunctionType, span);
    p.arena.set_children(node, vec![params_node, result]);
    node
}

/// `nominal-type := [Identifier '::'] Identifier ['[' type (',' type)* ']'] [cap-keyword] ['^' | '!']`
fn parse_nominal_type(p: &mut Parser) -> NodeId {
    let start = p.peek().span;
    let first = p.expect_identifier();

    let (package, name) = if p.match_base(TokenKind::DoubleColon) {
        (Some(first), p.expect_identifier())
    } else {
        (None, first)
    };

    let mut typeargs = Vec::new();
    if p.check_base(TokenKind::LSquare) {
        p.advance();
        typeargs.push(parse_type(p));
        while p.match_base(TokenKind::Comma) {
            typeargs.push(parse_type(p));
        }
        p.expect(TokenKind::RSquare, "']'");
    }

    let explicit_cap = parse_cap_keyword(p);
    let eph = parse_ephemeral_marker(p);

    let span = start.merge(p.previous().span);
    let node = make_nominal(p.arena, package, name, typeargs, explicit_cap.unwrap_or(Cap::Ref), eph, None);
    p.arena.get_mut(node).span = span;
    if explicit_cap.is_none() {
        // No cap written at the use site: leave the marker slot as the
        // `none` sentinel so a later pass can tell "unspecified" apart
        // from "explicitly `ref`" and substitute the entity's own
        // default cap (root spec §4.3).
        let marker = p.arena.child(node, 3);
        let none = p.arena.alloc_none(span);
        p.arena.replace(marker, none);
    }
    node
}

fn parse_cap_keyword(p: &mut Parser) -> Option<Cap> {
    let cap = Cap::from_token(p.peek_kind());
    if cap.is_some() {
        p.advance();
    }
    cap
}

fn parse_ephemeral_marker(p: &mut Parser) -> Ephemeral {
    if p.match_base(TokenKind::Caret) {
        Ephemeral::Ephemeral
    } else if p.match_base(TokenKind::ExclaimMark) {
        Ephemeral::Aliased
    } else {
        Ephemeral::Normal
    }
}

/// `['[' Identifier [':' capset-or-type] [cap-keyword] (',' ...)* ']']`
pub(crate) fn parse_typeparam_decls(p: &mut Parser) -> Vec<NodeId> {
    let mut decls = Vec::new();
    if !p.check_base(TokenKind::LSquare) {
        return decls;
    }
    p.advance();
    if !p.check_base(TokenKind::RSquare) {
        decls.push(parse_typeparam_decl(p));
        while p.match_base(TokenKind::Comma) {
            decls.push(parse_typeparam_decl(p));
        }
    }
    p.expect(TokenKind::RSquare, "']'");
    decls
}

fn parse_typeparam_decl(p: &mut Parser) -> NodeId {
    let name = p.expect_identifier();
    let constraint = if p.match_base(TokenKind::Colon) {
        parse_constraint(p)
    } else {
        make_infer_type(p.arena)
    };
    let default_cap = parse_cap_keyword(p).unwrap_or(Cap::Ref);
    make_typeparam_decl(p.arena, name, constraint, default_cap)
}

/// A constraint is either an ordinary type (nominal/union/isect) or a
/// `#read`/`#send`/`#share`/`#alias`/`#any` capability-set tag (root spec
/// §3.5). The capset tags reuse the `At` node kind wrapping the bare
/// identifier, matching how the lexer's closed `TokenKind` set has no
/// dedicated variant for them and how cap keywords already double as
/// AST markers. The parser only builds the shape here; resolving the
/// name to a concrete [`ember_types::CapSet`] (and rejecting a typo) is
/// [`ember_types::capset::capset_constraint`]'s job, once an interner
/// lookup can tell `#read` apart from a misspelling.
fn parse_constraint(p: &mut Parser) -> NodeId {
    if p.check_base(TokenKind::At) {
        let start = p.advance().span;
        let name = p.expect_identifier();
        let span = start.merge(p.previous().span);
        let node = p.arena.alloc(TokenKind::At, span);
        p.arena.set_children(node, vec![name]);
        node
    } else {
        parse_type(p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_ast::NodeArena;
    use ember_base::Interner;
    use ember_diag::Errors;

    fn parse_type_str(source: &str) -> (NodeArena, NodeId) {
        let mut arena = NodeArena::new();
        let mut interner = Interner::new();
        let mut errors = Errors::new();
        let tokens = ember_lexer::tokenize(source, 0, ember_lexer::LexerOptions::default(), &mut interner, &mut errors);
        let mut parser = Parser::new(tokens, &mut arena, &mut interner, &mut errors);
        let ty = parse_type(&mut parser);
        assert!(!errors.has_errors());
        (arena, ty)
    }

    #[test]
    fn parses_a_bare_nominal_type() {
        let (arena, ty) = parse_type_str("I32");
        assert_eq!(arena.kind(ty), TokenKind::Nominal);
        assert_eq!(nominal_cap(&arena, ty), Cap::Ref);
    }

    #[test]
    fn parses_an_explicit_cap_and_ephemeral_marker() {
        let (arena, ty) = parse_type_str("Array[U8] iso^");
        assert_eq!(nominal_cap(&arena, ty), Cap::Iso);
        assert_eq!(nominal_ephemeral(&arena, ty), Ephemeral::Ephemeral);
        assert_eq!(nominal_typeargs(&arena, ty).len(), 1);
    }

    #[test]
    fn union_of_subtype_and_supertype_collapses() {
        // Without a registered subtype relation between distinct nominal
        // defs, `A | A` collapses via structural equality alone.
        let (arena, ty) = parse_type_str("Foo | Foo");
        assert_eq!(arena.kind(ty), TokenKind::Nominal);
    }

    #[test]
    fn tuple_of_one_collapses_to_its_member() {
        let (arena, ty) = parse_type_str("(I32)");
        assert_eq!(arena.kind(ty), TokenKind::Nominal);
    }

    #[test]
    fn parses_a_tuple_type() {
        let (arena, ty) = parse_type_str("(I32, Bool)");
        assert_eq!(arena.kind(ty), TokenKind::Tuple);
    }

    #[test]
    fn parses_a_capset_constraint_tag_on_a_typeparam() {
        let mut arena = NodeArena::new();
        let mut interner = Interner::new();
        let mut errors = Errors::new();
        let tokens =
            ember_lexer::tokenize("[T: @send]", 0, ember_lexer::LexerOptions::default(), &mut interner, &mut errors);
        let mut parser = Parser::new(tokens, &mut arena, &mut interner, &mut errors);
        let decls = parse_typeparam_decls(&mut parser);
        assert!(!errors.has_errors());
        let constraint = typeparam_decl_constraint(&arena, decls[0]);
        assert!(ember_types::capset::is_capset_constraint(&arena, constraint));
        assert_eq!(
            ember_types::capset::capset_constraint(&arena, &interner, constraint),
            Some(ember_types::CapSet::send())
        );
    }
}
