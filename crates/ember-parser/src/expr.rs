//! Expression and statement grammar (root spec §3.6, §4.2).
//!
//! Binary and unary operators reuse the lexical operator token as the
//! node kind directly (`Plus`, `Minus`, `EqEq`, ...) rather than a
//! separate `BinaryOp` marker — the same "one enum, two jobs" convention
//! `TokenKind` already uses for cap keywords and entity keywords. A
//! `Minus` node has one child when it came from a unary prefix and two
//! when it came from a binary chain; callers tell the two apart by
//! `children.len()`, same as the lexer/parser already do for other
//! context-dependent kinds.

use ember_ast::entity::make_field;
use ember_ast::{NodeId, TokenKind};
use ember_diag::ErrorKind;
use ember_types::shape::make_infer_type;

use crate::ty::parse_type;
use crate::Parser;

/// Parses statements until a token in `terminators` (or end of input),
/// returning a `Seq` node. Optional `;` separates statements; none is
/// required between two syntactically complete expressions.
pub(crate) fn parse_seq(p: &mut Parser, terminators: &[TokenKind]) -> NodeId {
    let start = p.peek().span;
    let mut stmts = Vec::new();
    while !p.is_at_end() && !at_any(p, terminators) {
        stmts.push(parse_expr(p));
        while p.match_base(TokenKind::Semi) {}
    }
    let span = if stmts.is_empty() { start } else { start.merge(p.previous().span) };
    let node = p.arena.alloc(TokenKind::Seq, span);
    p.arena.set_children(node, stmts);
    node
}

fn at_any(p: &Parser, kinds: &[TokenKind]) -> bool {
    let k = p.peek_kind().strip_newline_variant();
    kinds.iter().any(|&t| t == k)
}

pub(crate) fn parse_expr(p: &mut Parser) -> NodeId {
    parse_assignment(p)
}

/// `assignment := or-expr ['=' assignment]` (right-associative; the sugar
/// pass rewrites an `a(i) = v` shape into `a.update(i, value = v)`, so the
/// parser just builds the plain shape here — root spec §4.3).
fn parse_assignment(p: &mut Parser) -> NodeId {
    let lhs = parse_or(p);
    if p.match_base(TokenKind::Assign) {
        let rhs = parse_assignment(p);
        let span = p.arena.get(lhs).span.merge(p.arena.get(rhs).span);
        let node = p.arena.alloc(TokenKind::Assignment, span);
        p.arena.set_children(node, vec![lhs, rhs]);
        node
    } else {
        lhs
    }
}

fn parse_or(p: &mut Parser) -> NodeId {
    parse_binary_level(p, &[TokenKind::OrOr], parse_and)
}

fn parse_and(p: &mut Parser) -> NodeId {
    parse_binary_level(p, &[TokenKind::AndAnd], parse_equality)
}

fn parse_equality(p: &mut Parser) -> NodeId {
    parse_binary_level(p, &[TokenKind::EqEq, TokenKind::NotEq], parse_relational)
}

fn parse_relational(p: &mut Parser) -> NodeId {
    parse_binary_level(p, &[TokenKind::Lt, TokenKind::Le, TokenKind::Gt, TokenKind::Ge], parse_additive)
}

/// `additive := multiplicative (('+' | binary-minus) multiplicative)*`.
/// Only the non-newline `Minus` continues the chain — a `Minus` preceded
/// by a newline (`MinusNew`) always starts a new statement instead (root
/// spec §4.1/§4.2), so the loop condition checks the exact token, not
/// `strip_newline_variant`.
fn parse_additive(p: &mut Parser) -> NodeId {
    let mut left = parse_multiplicative(p);
    loop {
        let op = p.peek_kind();
        if op == TokenKind::Plus || op == TokenKind::Minus {
            p.advance();
            let right = parse_multiplicative(p);
            left = make_binary(p, op, left, right);
        } else {
            break;
        }
    }
    left
}

fn parse_multiplicative(p: &mut Parser) -> NodeId {
    parse_binary_level(p, &[TokenKind::Star, TokenKind::Slash, TokenKind::Percent], parse_unary)
}

fn parse_binary_level(p: &mut Parser, ops: &[TokenKind], next: fn(&mut Parser) -> NodeId) -> NodeId {
    let mut left = next(p);
    loop {
        let op = p.peek_kind();
        if ops.contains(&op) {
            p.advance();
            let right = next(p);
            left = make_binary(p, op, left, right);
        } else {
            break;
        }
    }
    left
}

fn make_binary(p: &mut Parser, op: TokenKind, left: NodeId, right: NodeId) -> NodeId {
    let span = p.arena.get(left).span.merge(p.arena.get(right).span);
    let node = p.arena.alloc(op, span);
    p.arena.set_children(node, vec![left, right]);
    node
}

/// `unary := ('-' | '-\n') unary | postfix`. Either newline variant of
/// `-` is accepted here since a minus can only begin a unary expression
/// at a position where a primary is expected, regardless of which line
/// it's on.
fn parse_unary(p: &mut Parser) -> NodeId {
    if p.peek_kind() == TokenKind::Minus || p.peek_kind() == TokenKind::MinusNew {
        let start = p.advance().span;
        let operand = parse_unary(p);
        let span = start.merge(p.arena.get(operand).span);
        let node = p.arena.alloc(TokenKind::Minus, span);
        p.arena.set_children(node, vec![operand]);
        node
    } else {
        parse_postfix(p)
    }
}

/// `postfix := primary ( '.' Identifier (typeargs)? ('(' args ')')?
///                     | '.' IntLiteral
///                     | (typeargs)? '(' args ')'
///                     | '~'
///                     )*`
fn parse_postfix(p: &mut Parser) -> NodeId {
    let mut expr = parse_primary(p);
    loop {
        match p.peek_kind() {
            TokenKind::Dot => {
                p.advance();
                expr = parse_dot_tail(p, expr);
            }
            TokenKind::LParen => {
                let typeargs = Vec::new();
                expr = parse_call(p, expr, typeargs);
            }
            TokenKind::LSquare => {
                // `[` only continues the postfix chain when it's a
                // typearg list immediately followed by a call — any other
                // use (e.g. a fresh array literal starting the next
                // statement) is not this production's concern, so back
                // out and let the caller decide.
                let checkpoint = p.pos;
                let typeargs = parse_typeargs(p);
                if p.check_base(TokenKind::LParen) {
                    expr = parse_call(p, expr, typeargs);
                } else {
                    p.pos = checkpoint;
                    break;
                }
            }
            TokenKind::Tilde => {
                let start = p.arena.get(expr).span;
                p.advance();
                let span = start.merge(p.previous().span);
                let node = p.arena.alloc(TokenKind::PartialApply, span);
                p.arena.set_children(node, vec![expr]);
                expr = node;
            }
            _ => break,
        }
    }
    expr
}

fn parse_typeargs(p: &mut Parser) -> Vec<NodeId> {
    p.advance(); // '[' or '[\n'
    let mut args = vec![parse_type(p)];
    while p.match_base(TokenKind::Comma) {
        args.push(parse_type(p));
    }
    p.expect(TokenKind::RSquare, "']'");
    args
}

/// After consuming `.`, either a `.0` tuple index or a field/method
/// reference.
fn parse_dot_tail(p: &mut Parser, receiver: NodeId) -> NodeId {
    if let TokenKind::IntLiteral(v) = p.peek_kind() {
        let span = p.advance().span;
        let index = p.arena.alloc(TokenKind::IntLiteral(v), span);
        let node_span = p.arena.get(receiver).span.merge(span);
        let node = p.arena.alloc(TokenKind::TupleIndex, node_span);
        p.arena.set_children(node, vec![receiver, index]);
        return node;
    }
    let name = p.expect_identifier();
    let typeargs = if p.check_base(TokenKind::LSquare) { parse_typeargs(p) } else { Vec::new() };
    if p.peek_kind() == TokenKind::LParen {
        p.advance();
        let args = parse_args(p);
        let typeargs_node = p.arena.alloc(TokenKind::TypeArgs, p.previous().span);
        p.arena.set_children(typeargs_node, typeargs);
        let args_node = p.arena.alloc(TokenKind::Params, p.previous().span);
        p.arena.set_children(args_node, args);
        let span = p.arena.get(receiver).span.merge(p.previous().span);
        let node = p.arena.alloc(TokenKind::DotCall, span);
        p.arena.set_children(node, vec![receiver, name, typeargs_node, args_node]);
        node
    } else {
        let span = p.arena.get(receiver).span.merge(p.arena.get(name).span);
        let node = p.arena.alloc(TokenKind::FieldRef, span);
        p.arena.set_children(node, vec![receiver, name]);
        node
    }
}

fn parse_call(p: &mut Parser, callee: NodeId, typeargs: Vec<NodeId>) -> NodeId {
    p.advance(); // '(' (possibly after already consuming '[' typeargs ']')
    let args = parse_args(p);
    let typeargs_node = p.arena.alloc(TokenKind::TypeArgs, p.previous().span);
    p.arena.set_children(typeargs_node, typeargs);
    let args_node = p.arena.alloc(TokenKind::Params, p.previous().span);
    p.arena.set_children(args_node, args);
    let span = p.arena.get(callee).span.merge(p.previous().span);
    let node = p.arena.alloc(TokenKind::Call, span);
    p.arena.set_children(node, vec![callee, typeargs_node, args_node]);
    node
}

/// Call arguments: ordinary expressions, or `name = expr` named
/// arguments — represented with the same `Assignment` shape the sugar
/// pass already builds for the `a(i) = v` rewrite (root spec §4.3), since
/// structurally a named argument and an assignment are the same
/// (lhs, rhs) pair.
fn parse_args(p: &mut Parser) -> Vec<NodeId> {
    let mut args = Vec::new();
    if !p.check_base(TokenKind::RParen) {
        args.push(parse_arg(p));
        while p.match_base(TokenKind::Comma) {
            args.push(parse_arg(p));
        }
    }
    p.expect_base(TokenKind::RParen, "')'");
    args
}

fn parse_arg(p: &mut Parser) -> NodeId {
    if let TokenKind::Identifier(_) = p.peek_kind() {
        let checkpoint = p.pos;
        let name = p.expect_identifier();
        if p.match_base(TokenKind::Assign) {
            let value = parse_expr(p);
            let span = p.arena.get(name).span.merge(p.arena.get(value).span);
            let node = p.arena.alloc(TokenKind::Assignment, span);
            p.arena.set_children(node, vec![name, value]);
            return node;
        }
        p.pos = checkpoint;
    }
    parse_expr(p)
}

/// `primary := literal | 'this' | Identifier | '(' expr,* ')' | '[' expr,* ']'
///           | '{' field,* '}' | if | while | for | try | match | recover
///           | consume | return | break | continue | 'error'`
fn parse_primary(p: &mut Parser) -> NodeId {
    match p.peek_kind().strip_newline_variant() {
        TokenKind::IntLiteral(v) => {
            let span = p.advance().span;
            p.arena.alloc(TokenKind::IntLiteral(v), span)
        }
        TokenKind::FloatLiteral(v) => {
            let span = p.advance().span;
            p.arena.alloc(TokenKind::FloatLiteral(v), span)
        }
        TokenKind::StringLiteral(s) => {
            let span = p.advance().span;
            p.arena.alloc(TokenKind::StringLiteral(s), span)
        }
        TokenKind::True => {
            let span = p.advance().span;
            p.arena.alloc(TokenKind::True, span)
        }
        TokenKind::False => {
            let span = p.advance().span;
            p.arena.alloc(TokenKind::False, span)
        }
        TokenKind::This => {
            let span = p.advance().span;
            p.arena.alloc(TokenKind::This, span)
        }
        TokenKind::Identifier(_) => {
            let name = p.expect_identifier();
            let span = p.arena.get(name).span;
            let node = p.arena.alloc(TokenKind::Reference, span);
            p.arena.set_children(node, vec![name]);
            node
        }
        TokenKind::Let => parse_local_decl(p, TokenKind::Let),
        TokenKind::Var => parse_local_decl(p, TokenKind::Var),
        TokenKind::LParen => parse_paren_expr(p),
        TokenKind::LSquare => parse_array_literal(p),
        TokenKind::LBrace => parse_object_literal(p),
        TokenKind::If => parse_if(p),
        TokenKind::While => parse_while(p),
        TokenKind::For => parse_for(p),
        TokenKind::Try => parse_try(p),
        TokenKind::Match => parse_match(p),
        TokenKind::Recover => parse_recover(p),
        TokenKind::Consume => parse_consume(p),
        TokenKind::Return => parse_return_like(p, TokenKind::Return),
        TokenKind::Break => parse_return_like(p, TokenKind::Break),
        TokenKind::Continue => parse_return_like(p, TokenKind::Continue),
        TokenKind::ErrorKw => {
            let span = p.advance().span;
            p.arena.alloc(TokenKind::ErrorKw, span)
        }
        _ => {
            p.error_here(ErrorKind::SyntaxError, "expected an expression");
            let span = p.peek().span;
            p.advance();
            p.arena.alloc(TokenKind::ErrorType, span)
        }
    }
}

/// `('let' | 'var') Identifier [':' Type] ['=' expr]` — a local variable
/// declaration used as an expression inside a `seq` (root spec §4.4's
/// "sequence → local variable names"). Reuses the exact three-child shape
/// [`ember_ast::entity::make_field`] already builds for entity fields: a
/// local binding and a field are structurally the same thing (a name, a
/// type, an optional initializer), so there is no need for a second
/// builder just because one lives inside a body and the other inside an
/// entity's member list.
fn parse_local_decl(p: &mut Parser, kind: TokenKind) -> NodeId {
    let start = p.advance().span; // 'let' or 'var'
    let name = p.expect_identifier();
    let ty = if p.match_base(TokenKind::Colon) {
        parse_type(p)
    } else {
        make_infer_type(p.arena)
    };
    let default = if p.match_base(TokenKind::Assign) {
        Some(parse_expr(p))
    } else {
        None
    };
    let span = start.merge(p.previous().span);
    let node = make_field(p.arena, kind, name, ty, default);
    p.arena.get_mut(node).span = span;
    node
}

/// A parenthesized expression collapses to its sole member; more than one
/// comma-separated member builds a value `Tuple` (same marker the type
/// grammar uses — root spec §4.7 "tuple of one collapses").
fn parse_paren_expr(p: &mut Parser) -> NodeId {
    let start = p.advance().span;
    let mut members = vec![parse_expr(p)];
    while p.match_base(TokenKind::Comma) {
        members.push(parse_expr(p));
    }
    p.expect_base(TokenKind::RParen, "')'");
    if members.len() == 1 {
        members.pop().unwrap()
    } else {
        let span = start.merge(p.previous().span);
        let node = p.arena.alloc(TokenKind::Tuple, span);
        p.arena.set_children(node, members);
        node
    }
}

fn parse_array_literal(p: &mut Parser) -> NodeId {
    let start = p.advance().span;
    let mut elems = Vec::new();
    if !p.check_base(TokenKind::RSquare) {
        elems.push(parse_expr(p));
        while p.match_base(TokenKind::Comma) {
            elems.push(parse_expr(p));
        }
    }
    p.expect(TokenKind::RSquare, "']'");
    let span = start.merge(p.previous().span);
    let node = p.arena.alloc(TokenKind::ArrayLiteral, span);
    p.arena.set_children(node, elems);
    node
}

/// `{ name = expr (',' name = expr)* }` — expanded into a typed
/// constructor call by the sugar pass (root spec §4.3).
fn parse_object_literal(p: &mut Parser) -> NodeId {
    let start = p.advance().span; // '{'
    let mut fields = Vec::new();
    if !p.check_base(TokenKind::RBrace) {
        fields.push(parse_object_field(p));
        while p.match_base(TokenKind::Comma) {
            fields.push(parse_object_field(p));
        }
    }
    p.expect(TokenKind::RBrace, "'}'");
    let span = start.merge(p.previous().span);
    let node = p.arena.alloc(TokenKind::ObjectLiteral, span);
    p.arena.set_children(node, fields);
    node
}

fn parse_object_field(p: &mut Parser) -> NodeId {
    let name = p.expect_identifier();
    p.expect(TokenKind::Assign, "'='");
    let value = parse_expr(p);
    let span = p.arena.get(name).span.merge(p.arena.get(value).span);
    let node = p.arena.alloc(TokenKind::Assignment, span);
    p.arena.set_children(node, vec![name, value]);
    node
}

/// `if cond then seq (elseif cond then seq)* (else seq)? end`, modeled as
/// a right-nested `(cond, then-seq, else-branch)` triple so every `If`
/// node has the same three-child shape regardless of how many `elseif`
/// arms were written — an `elseif` arm is just another `If` node sitting
/// in its parent's else-branch slot.
fn parse_if(p: &mut Parser) -> NodeId {
    let start = p.advance().span; // 'if'
    let cond = parse_expr(p);
    p.expect_base(TokenKind::Then, "'then'");
    let then_seq = parse_seq(p, &[TokenKind::Elseif, TokenKind::Else, TokenKind::End]);
    let else_branch = if p.check_base(TokenKind::Elseif) {
        p.advance();
        parse_if_tail(p, start)
    } else if p.match_base(TokenKind::Else) {
        parse_seq(p, &[TokenKind::End])
    } else {
        p.none_node()
    };
    p.expect_end();
    let span = start.merge(p.previous().span);
    let node = p.arena.alloc(TokenKind::If, span);
    p.arena.set_children(node, vec![cond, then_seq, else_branch]);
    node
}

/// Parses the remainder of an `elseif` arm (condition, `then`, body, and
/// its own possible further `elseif`/`else`) without re-consuming the
/// outer `end` — the enclosing [`parse_if`] call does that once, after
/// the whole chain bottoms out.
fn parse_if_tail(p: &mut Parser, start_span: ember_base::Span) -> NodeId {
    let cond = parse_expr(p);
    p.expect_base(TokenKind::Then, "'then'");
    let then_seq = parse_seq(p, &[TokenKind::Elseif, TokenKind::Else, TokenKind::End]);
    let else_branch = if p.check_base(TokenKind::Elseif) {
        p.advance();
        parse_if_tail(p, start_span)
    } else if p.match_base(TokenKind::Else) {
        parse_seq(p, &[TokenKind::End])
    } else {
        p.none_node()
    };
    let span = start_span.merge(p.previous().span);
    let node = p.arena.alloc(TokenKind::If, span);
    p.arena.set_children(node, vec![cond, then_seq, else_branch]);
    node
}

fn parse_while(p: &mut Parser) -> NodeId {
    let start = p.advance().span; // 'while'
    let cond = parse_expr(p);
    p.expect_base(TokenKind::Do, "'do'");
    let body = parse_seq(p, &[TokenKind::End]);
    p.expect_end();
    let span = start.merge(p.previous().span);
    let node = p.arena.alloc(TokenKind::While, span);
    p.arena.set_children(node, vec![cond, body]);
    node
}

/// `for name in iterable do seq end`; the iterator-protocol desugaring
/// into a `while`-over-`next`/`has_next` happens in the sugar pass (root
/// spec §4.3) — the parser keeps the surface shape as-is.
fn parse_for(p: &mut Parser) -> NodeId {
    let start = p.advance().span; // 'for'
    let name = p.expect_identifier();
    p.expect_base(TokenKind::In, "'in'");
    let iterable = parse_expr(p);
    p.expect_base(TokenKind::Do, "'do'");
    let body = parse_seq(p, &[TokenKind::End]);
    p.expect_end();
    let span = start.merge(p.previous().span);
    let node = p.arena.alloc(TokenKind::ForLoop, span);
    p.arena.set_children(node, vec![name, iterable, body]);
    node
}

fn parse_try(p: &mut Parser) -> NodeId {
    let start = p.advance().span; // 'try'
    let body = parse_seq(p, &[TokenKind::Else, TokenKind::End]);
    let else_body = if p.match_base(TokenKind::Else) {
        parse_seq(p, &[TokenKind::End])
    } else {
        p.none_node()
    };
    p.expect_end();
    let span = start.merge(p.previous().span);
    let node = p.arena.alloc(TokenKind::Try, span);
    p.arena.set_children(node, vec![body, else_body]);
    node
}

/// `match subject (case pattern [if guard] '=>' seq)* end`. Patterns are
/// parsed as ordinary expressions (literal/identifier/tuple shapes);
/// binding semantics are the name resolver's concern (root spec §4.4).
fn parse_match(p: &mut Parser) -> NodeId {
    let start = p.advance().span; // 'match'
    let subject = parse_expr(p);
    let mut cases = Vec::new();
    while p.match_base(TokenKind::Case) {
        cases.push(parse_case(p));
    }
    p.expect_end();
    let span = start.merge(p.previous().span);
    let node = p.arena.alloc(TokenKind::Match, span);
    let mut children = vec![subject];
    children.extend(cases);
    p.arena.set_children(node, children);
    node
}

fn parse_case(p: &mut Parser) -> NodeId {
    let start = p.peek().span;
    let pattern = parse_expr(p);
    let guard = if p.match_base(TokenKind::If) {
        parse_expr(p)
    } else {
        p.none_node()
    };
    p.expect(TokenKind::FatArrow, "'=>'");
    let body = parse_seq(p, &[TokenKind::Case, TokenKind::End]);
    let span = start.merge(p.previous().span);
    let node = p.arena.alloc(TokenKind::Case, span);
    p.arena.set_children(node, vec![pattern, guard, body]);
    node
}

/// `recover [cap-keyword] seq end`.
fn parse_recover(p: &mut Parser) -> NodeId {
    let start = p.advance().span; // 'recover'
    let cap_marker = if let Some(cap) = ember_types::cap::Cap::from_token(p.peek_kind()) {
        p.advance();
        ember_types::shape::build_cap_marker(p.arena, cap)
    } else {
        p.none_node()
    };
    let body = parse_seq(p, &[TokenKind::End]);
    p.expect_end();
    let span = start.merge(p.previous().span);
    let node = p.arena.alloc(TokenKind::Recover, span);
    p.arena.set_children(node, vec![cap_marker, body]);
    node
}

/// `consume [cap-keyword] expr`.
fn parse_consume(p: &mut Parser) -> NodeId {
    let start = p.advance().span; // 'consume'
    let cap_marker = if let Some(cap) = ember_types::cap::Cap::from_token(p.peek_kind()) {
        p.advance();
        ember_types::shape::build_cap_marker(p.arena, cap)
    } else {
        p.none_node()
    };
    let operand = parse_postfix(p);
    let span = start.merge(p.arena.get(operand).span);
    let node = p.arena.alloc(TokenKind::Consume, span);
    p.arena.set_children(node, vec![cap_marker, operand]);
    node
}

/// `return`/`break`/`continue` each optionally carry a trailing value
/// expression; absent when followed directly by a block terminator.
fn parse_return_like(p: &mut Parser, kind: TokenKind) -> NodeId {
    let start = p.advance().span;
    let value = if starts_expression(p) {
        parse_expr(p)
    } else {
        p.none_node()
    };
    let span = start.merge(p.previous().span);
    let node = p.arena.alloc(kind, span);
    p.arena.set_children(node, vec![value]);
    node
}

fn starts_expression(p: &Parser) -> bool {
    !matches!(
        p.peek_kind().strip_newline_variant(),
        TokenKind::End
            | TokenKind::Else
            | TokenKind::Elseif
            | TokenKind::Semi
            | TokenKind::Eof
            | TokenKind::Case
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_ast::NodeArena;
    use ember_base::Interner;
    use ember_diag::Errors;

    fn parse_expr_str(source: &str) -> (NodeArena, NodeId) {
        let mut arena = NodeArena::new();
        let mut interner = Interner::new();
        let mut errors = Errors::new();
        let tokens = ember_lexer::tokenize(source, 0, ember_lexer::LexerOptions::default(), &mut interner, &mut errors);
        let mut parser = Parser::new(tokens, &mut arena, &mut interner, &mut errors);
        let expr = parse_expr(&mut parser);
        assert!(!errors.has_errors(), "unexpected errors: {:?}", errors.iter().collect::<Vec<_>>());
        (arena, expr)
    }

    #[test]
    fn parses_additive_left_associatively() {
        let (arena, expr) = parse_expr_str("1 + 2 - 3");
        assert_eq!(arena.kind(expr), TokenKind::Minus);
        assert_eq!(arena.children(expr).len(), 2);
        let lhs = arena.children(expr)[0];
        assert_eq!(arena.kind(lhs), TokenKind::Plus);
    }

    #[test]
    fn unary_minus_has_one_child() {
        let (arena, expr) = parse_expr_str("-x");
        assert_eq!(arena.kind(expr), TokenKind::Minus);
        assert_eq!(arena.children(expr).len(), 1);
    }

    #[test]
    fn newline_minus_does_not_continue_a_binary_chain() {
        let mut arena = NodeArena::new();
        let mut interner = Interner::new();
        let mut errors = Errors::new();
        let tokens = ember_lexer::tokenize("x\n-y", 0, ember_lexer::LexerOptions::default(), &mut interner, &mut errors);
        let mut parser = Parser::new(tokens, &mut arena, &mut interner, &mut errors);
        let first = parse_expr(&mut parser);
        // `-y` on its own line must not have been swallowed into `x`'s chain.
        assert_eq!(arena.kind(first), TokenKind::Reference);
    }

    #[test]
    fn parses_a_call_with_named_argument() {
        let (arena, expr) = parse_expr_str("foo(1, value = 2)");
        assert_eq!(arena.kind(expr), TokenKind::Call);
        let args = arena.children(arena.children(expr)[2]);
        assert_eq!(args.len(), 2);
        assert_eq!(arena.kind(args[1]), TokenKind::Assignment);
    }

    #[test]
    fn parses_a_dot_call_chain() {
        let (arena, expr) = parse_expr_str("a.b.c()");
        assert_eq!(arena.kind(expr), TokenKind::DotCall);
    }

    #[test]
    fn parses_an_if_elseif_else_chain() {
        let (arena, expr) = parse_expr_str("if a then 1 elseif b then 2 else 3 end");
        assert_eq!(arena.kind(expr), TokenKind::If);
        let else_branch = arena.children(expr)[2];
        assert_eq!(arena.kind(else_branch), TokenKind::If);
    }

    #[test]
    fn parses_a_tuple_of_two() {
        let (arena, expr) = parse_expr_str("(1, 2)");
        assert_eq!(arena.kind(expr), TokenKind::Tuple);
    }

    #[test]
    fn single_parenthesized_expression_collapses() {
        let (arena, expr) = parse_expr_str("(1)");
        assert_eq!(arena.kind(expr), TokenKind::IntLiteral(1));
    }

    #[test]
    fn parses_a_local_var_declaration_with_initializer() {
        let (arena, expr) = parse_expr_str("var count: U32 = 0");
        assert_eq!(arena.kind(expr), TokenKind::Var);
        assert!(ember_ast::entity::field_default(&arena, expr).is_some());
    }

    #[test]
    fn parses_a_let_declaration_without_a_type() {
        let (arena, expr) = parse_expr_str("let x = 1");
        assert_eq!(arena.kind(expr), TokenKind::Let);
        assert_eq!(arena.kind(ember_ast::entity::field_type(&arena, expr)), TokenKind::InferType);
    }
}
