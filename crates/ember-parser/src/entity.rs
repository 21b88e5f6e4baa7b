//! Entity and member grammar: primitives, structs, classes, actors,
//! traits and interfaces, and their field/method members (root spec
//! §3.6, §4.2).

use ember_ast::entity::{is_field_kind, is_method_kind, make_entity, make_field, make_method, make_param};
use ember_ast::{NodeId, TokenKind};
use ember_diag::ErrorKind;
use ember_types::shape::{build_cap_marker, make_infer_type};

use crate::expr::parse_seq;
use crate::ty::{parse_type, parse_typeparam_decls};
use crate::Parser;

/// `entity-kind [cap-keyword] Identifier [typeparams] ['is' type (',' type)*]
///     member* 'end'`
pub(crate) fn parse_entity(p: &mut Parser) -> NodeId {
    let start = p.peek().span;
    let kind = p.advance().kind;

    let cap_marker = parse_optional_cap_marker(p);
    let name = p.expect_identifier();
    let typeparams = parse_typeparam_decls(p);

    let mut provides = Vec::new();
    if p.match_base(TokenKind::Is) {
        provides.push(parse_type(p));
        while p.match_base(TokenKind::Comma) {
            provides.push(parse_type(p));
        }
    }

    let mut members = Vec::new();
    while !p.is_at_end() && !p.check_base(TokenKind::End) {
        if is_field_kind(p.peek_kind()) {
            members.push(parse_field(p));
        } else if p.check_base(TokenKind::Extern) || p.peek_kind().is_method_keyword() {
            members.push(parse_method(p));
        } else {
            p.error_here(ErrorKind::SyntaxError, "expected a field or method declaration");
            p.synchronize_member();
            if p.is_at_end() || p.check_base(TokenKind::End) {
                break;
            }
        }
    }
    p.expect_end();

    let span = start.merge(p.previous().span);
    let node = make_entity(p.arena, kind, name, typeparams, cap_marker, provides, members);
    p.arena.get_mut(node).span = span;
    node
}

/// A default-capability marker written right after the entity keyword
/// (`class ref Counter`). Absent for entity kinds that don't carry one at
/// all (primitive/struct/trait/interface default to `val`/no aliasing
/// concerns — root spec §4.3's "default caps" sugar fills this in for
/// any entity that left it unspecified).
fn parse_optional_cap_marker(p: &mut Parser) -> NodeId {
    let cap = ember_types::cap::Cap::from_token(p.peek_kind());
    if let Some(cap) = cap {
        p.advance();
        build_cap_marker(p.arena, cap)
    } else {
        p.none_node()
    }
}

/// `('let' | 'var' | 'embed') Identifier ':' Type ['=' expr]`
fn parse_field(p: &mut Parser) -> NodeId {
    let start = p.peek().span;
    let kind = p.advance().kind;
    let name = p.expect_identifier();
    p.expect(TokenKind::Colon, "':'");
    let ty = parse_type(p);
    let default = if p.match_base(TokenKind::Assign) {
        Some(crate::expr::parse_expr(p))
    } else {
        None
    };
    let span = start.merge(p.previous().span);
    let node = make_field(p.arena, kind, name, ty, default);
    p.arena.get_mut(node).span = span;
    node
}

/// `['extern'] ('new' | 'be' | 'fun') [cap-keyword] Identifier [typeparams]
///     '(' param (',' param)* ')' [':' Type] ['?'] [seq 'end']`
///
/// A method with no body (trait/interface signature, root spec §4.6
/// Stage 4 case 4) is recognized by the signature running straight into
/// another member keyword or the entity's closing `end` with nothing in
/// between — there is no empty `seq ... end` to parse in that case.
fn parse_method(p: &mut Parser) -> NodeId {
    let start = p.peek().span;
    let is_extern = p.match_base(TokenKind::Extern);
    let kind = p.advance().kind; // new/be/fun
    let cap_marker = parse_optional_cap_marker(p);
    let name = p.expect_identifier();
    let typeparams = parse_typeparam_decls(p);

    p.expect_base(TokenKind::LParen, "'('");
    let mut params = Vec::new();
    if !p.check_base(TokenKind::RParen) {
        params.push(parse_param(p));
        while p.match_base(TokenKind::Comma) {
            params.push(parse_param(p));
        }
    }
    p.expect_base(TokenKind::RParen, "')'");

    let result = if p.match_base(TokenKind::Colon) {
        parse_type(p)
    } else {
        make_infer_type(p.arena)
    };

    let partial = p.match_base(TokenKind::Question);

    let body = if p.is_at_end() || p.check_base(TokenKind::End) || is_field_kind(p.peek_kind()) || p.check_base(TokenKind::Extern) || p.peek_kind().is_method_keyword() {
        None
    } else {
        let seq = parse_seq(p, &[TokenKind::End]);
        p.expect_end();
        Some(seq)
    };

    let span = start.merge(p.previous().span);
    let node = make_method(p.arena, kind, name, cap_marker, typeparams, params, result, body);
    p.arena.get_mut(node).span = span;
    p.arena.get_mut(node).flags.partial = partial;
    p.arena.get_mut(node).flags.is_extern = is_extern;
    node
}

/// `Identifier ':' Type ['=' expr]`
fn parse_param(p: &mut Parser) -> NodeId {
    let start = p.peek().span;
    let name = p.expect_identifier();
    p.expect(TokenKind::Colon, "':'");
    let ty = parse_type(p);
    let default = if p.match_base(TokenKind::Assign) {
        Some(crate::expr::parse_expr(p))
    } else {
        None
    };
    let span = start.merge(p.previous().span);
    let node = make_param(p.arena, name, ty, default);
    p.arena.get_mut(node).span = span;
    node
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_ast::entity::{entity_members, method_body, method_name};
    use ember_ast::NodeArena;
    use ember_base::Interner;
    use ember_diag::Errors;

    fn parse_entity_str(source: &str) -> (NodeArena, NodeId) {
        let mut arena = NodeArena::new();
        let mut interner = Interner::new();
        let mut errors = Errors::new();
        let tokens = ember_lexer::tokenize(source, 0, ember_lexer::LexerOptions::default(), &mut interner, &mut errors);
        let mut parser = Parser::new(tokens, &mut arena, &mut interner, &mut errors);
        let entity = parse_entity(&mut parser);
        assert!(!errors.has_errors(), "unexpected errors: {:?}", errors.iter().collect::<Vec<_>>());
        (arena, entity)
    }

    #[test]
    fn parses_a_class_with_a_field_and_a_method() {
        let (arena, entity) = parse_entity_str(
            "class ref Counter\n  var count: I32 = 0\n  new create(): Counter\n    count = 0\n  end\nend",
        );
        assert_eq!(entity_members(&arena, entity).len(), 2);
    }

    #[test]
    fn parses_a_bodiless_interface_method() {
        let (arena, entity) = parse_entity_str("interface Greeter\n  fun greet(): String\nend");
        let members = entity_members(&arena, entity);
        assert_eq!(members.len(), 1);
        assert_eq!(method_body(&arena, members[0]), None);
    }

    #[test]
    fn marks_a_partial_method() {
        let (arena, entity) = parse_entity_str("class ref Thing\n  fun risky()? \n    error\n  end\nend");
        let members = entity_members(&arena, entity);
        assert!(arena.get(members[0]).flags.partial);
    }

    #[test]
    fn marks_an_extern_method() {
        let (arena, entity) = parse_entity_str("class ref Thing\n  extern fun raw_syscall()\n  end\nend");
        let members = entity_members(&arena, entity);
        assert!(arena.get(members[0]).flags.is_extern);
    }

    #[test]
    fn parses_provides_clause() {
        let (arena, entity) = parse_entity_str("class ref Counter is Greeter\nend");
        assert_eq!(ember_ast::entity::entity_provides(&arena, entity).len(), 1);
    }

    #[test]
    fn method_name_is_recorded() {
        let (arena, entity) = parse_entity_str("primitive Unit\n  fun id(): Unit\n    this\n  end\nend");
        let members = entity_members(&arena, entity);
        let name_node = method_name(&arena, members[0]);
        assert!(matches!(arena.kind(name_node), TokenKind::Identifier(_)));
    }
}
