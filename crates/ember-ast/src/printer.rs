//! Whitespace-insensitive, Lisp-like AST dump and reader (root spec §6.3).
//!
//! Format: `(<kind>{symtab-keys}{flags} child child … [type])`. The
//! `{...}` blocks are printed for readability but are not required by the
//! reader — [`parse_ast`] reconstructs tree *shape* (kind, children,
//! type) from a dump, which is all the debug format's own round-trip
//! property (§8.1 invariant 1 talks about the *source* grammar; this is
//! the separate "printer has a reader, and it round-trips" requirement
//! of §6.3).

use ember_base::{Interner, Span};
use ember_lexer::TokenKind;

use crate::arena::NodeArena;
use crate::node::NodeId;

/// Renders `root` and everything reachable from it as a Lisp-like dump.
pub fn print_ast(arena: &NodeArena, interner: &Interner, root: NodeId) -> String {
    let mut out = String::new();
    write_node(arena, interner, root, &mut out);
    out
}

fn write_node(arena: &NodeArena, interner: &Interner, id: NodeId, out: &mut String) {
    let node = arena.get(id);
    out.push('(');
    out.push_str(node.kind.printer_name());

    if let TokenKind::Identifier(sym) = node.kind {
        out.push(':');
        out.push_str(interner.resolve(sym));
    }
    if let TokenKind::IntLiteral(v) = node.kind {
        out.push(':');
        out.push_str(&v.to_string());
    }

    if let Some(tab) = &node.symtab {
        if !tab.is_empty() {
            out.push('{');
            let mut first = true;
            for name in tab.names() {
                if !first {
                    out.push(',');
                }
                first = false;
                out.push_str(interner.resolve(name));
            }
            out.push('}');
        }
    }

    let flag_str = flag_string(node);
    if !flag_str.is_empty() {
        out.push('{');
        out.push_str(&flag_str);
        out.push('}');
    }

    for &child in &node.children {
        out.push(' ');
        write_node(arena, interner, child, out);
    }

    if let Some(ty) = node.ty {
        out.push_str(" [");
        write_node(arena, interner, ty, out);
        out.push(']');
    }

    out.push(')');
}

fn flag_string(node: &crate::node::Node) -> String {
    let mut parts = Vec::new();
    if node.flags.can_error {
        parts.push("can_error");
    }
    if node.flags.can_send {
        parts.push("can_send");
    }
    if node.flags.might_send {
        parts.push("might_send");
    }
    if node.flags.preserve {
        parts.push("preserve");
    }
    if node.flags.done {
        parts.push("done");
    }
    parts.join(",")
}

/// A parse error from the debug-dump reader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadError(pub String);

impl std::fmt::Display for ReadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "malformed ast dump: {}", self.0)
    }
}

/// Parses a dump produced by [`print_ast`] back into a tree, allocating
/// nodes in `arena` and interning any embedded identifier text in
/// `interner`. Returns the root node id.
pub fn parse_ast(text: &str, arena: &mut NodeArena, interner: &mut Interner) -> Result<NodeId, ReadError> {
    let mut chars = text.trim().char_indices().peekable();
    let id = read_node(text, &mut chars, arena, interner)?;
    Ok(id)
}

type Chars<'a> = std::iter::Peekable<std::str::CharIndices<'a>>;

fn read_node(text: &str, chars: &mut Chars, arena: &mut NodeArena, interner: &mut Interner) -> Result<NodeId, ReadError> {
    skip_ws(chars);
    let Some((start, '(')) = chars.next() else {
        return Err(ReadError("expected '('".into()));
    };
    let _ = start;

    let name_start = match chars.peek() {
        Some(&(i, _)) => i,
        None => return Err(ReadError("unexpected end of input".into())),
    };
    let mut name_end = name_start;
    while let Some(&(i, c)) = chars.peek() {
        if c == '(' || c == ')' || c == ' ' || c == '{' || c == '[' {
            break;
        }
        name_end = i + c.len_utf8();
        chars.next();
    }
    let tag = &text[name_start..name_end];
    let (kind_name, payload) = match tag.split_once(':') {
        Some((k, p)) => (k, Some(p)),
        None => (tag, None),
    };
    let kind = kind_from_name(kind_name, payload, interner)
        .ok_or_else(|| ReadError(format!("unknown node kind '{}'", kind_name)))?;

    let node_id = arena.alloc(kind, Span::default());

    // Skip an optional `{...}` symtab block and an optional `{...}` flag
    // block; neither contributes to tree shape.
    skip_ws(chars);
    while let Some(&(_, '{')) = chars.peek() {
        skip_brace_block(chars)?;
        skip_ws(chars);
    }

    let mut children = Vec::new();
    loop {
        skip_ws(chars);
        match chars.peek() {
            Some(&(_, '(')) => {
                let child = read_node(text, chars, arena, interner)?;
                children.push(child);
            }
            Some(&(_, '[')) => {
                chars.next();
                skip_ws(chars);
                let ty = read_node(text, chars, arena, interner)?;
                skip_ws(chars);
                match chars.next() {
                    Some((_, ']')) => {}
                    _ => return Err(ReadError("expected ']' after type".into())),
                }
                arena.set_type(node_id, ty);
            }
            Some(&(_, ')')) => {
                chars.next();
                break;
            }
            Some(&(_, c)) => return Err(ReadError(format!("unexpected character '{}'", c))),
            None => return Err(ReadError("unexpected end of input".into())),
        }
    }

    arena.set_children(node_id, children);
    Ok(node_id)
}

fn skip_brace_block(chars: &mut Chars) -> Result<(), ReadError> {
    match chars.next() {
        Some((_, '{')) => {}
        _ => return Err(ReadError("expected '{'".into())),
    }
    let mut depth = 1;
    for (_, c) in chars.by_ref() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(());
                }
            }
            _ => {}
        }
    }
    Err(ReadError("unterminated '{' block".into()))
}

fn skip_ws(chars: &mut Chars) {
    while let Some(&(_, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
        } else {
            break;
        }
    }
}

fn kind_from_name(name: &str, payload: Option<&str>, interner: &mut Interner) -> Option<TokenKind> {
    if name == "id" {
        let sym = interner.intern(payload.unwrap_or(""));
        return Some(TokenKind::Identifier(sym));
    }
    if name == "int" {
        let v: i128 = payload.unwrap_or("0").parse().ok()?;
        return Some(TokenKind::IntLiteral(v));
    }
    Some(match name {
        "seq" => TokenKind::Seq,
        "x" => TokenKind::NoneNode,
        "nominal" => TokenKind::Nominal,
        "typeparamref" => TokenKind::TypeParamRef,
        "union" => TokenKind::Union,
        "isect" => TokenKind::Isect,
        "tuple" => TokenKind::Tuple,
        "arrow" => TokenKind::Arrow,
        "thistype" => TokenKind::ThisType,
        "functiontype" => TokenKind::FunctionType,
        "literal" => TokenKind::LiteralType,
        "infer" => TokenKind::InferType,
        "errortype" => TokenKind::ErrorType,
        "call" => TokenKind::Call,
        "dot" => TokenKind::DotCall,
        "tupleref" => TokenKind::TupleIndex,
        "assign" => TokenKind::Assignment,
        "reference" => TokenKind::Reference,
        "fieldref" => TokenKind::FieldRef,
        "param" => TokenKind::ParamDecl,
        "typeparam" => TokenKind::TypeParamDecl,
        "typeargs" => TokenKind::TypeArgs,
        "params" => TokenKind::Params,
        "body" => TokenKind::Body,
        "provides" => TokenKind::Provides,
        "members" => TokenKind::Members,
        "partial_apply" => TokenKind::PartialApply,
        "array" => TokenKind::ArrayLiteral,
        "object" => TokenKind::ObjectLiteral,
        "for" => TokenKind::ForLoop,
        "block" => TokenKind::Block,
        "program" => TokenKind::Program,
        "package" => TokenKind::Package,
        "iso" => TokenKind::Iso,
        "trn" => TokenKind::Trn,
        "ref" => TokenKind::RefCap,
        "val" => TokenKind::Val,
        "box" => TokenKind::BoxCap,
        "tag" => TokenKind::Tag,
        "fun" => TokenKind::Fun,
        "new" => TokenKind::New,
        "be" => TokenKind::Be,
        "class" => TokenKind::ClassKw,
        "actor" => TokenKind::Actor,
        "trait" => TokenKind::Trait,
        "interface" => TokenKind::Interface,
        "primitive" => TokenKind::Primitive,
        "struct" => TokenKind::Struct,
        "none" => TokenKind::None_,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn print_then_parse_round_trips_a_simple_tree() {
        let mut arena = NodeArena::new();
        let mut interner = Interner::new();
        let sym = interner.intern("Foo");

        let root = arena.alloc(TokenKind::Seq, Span::default());
        let id_node = arena.alloc(TokenKind::Identifier(sym), Span::default());
        arena.push_child(root, id_node);

        let dumped = print_ast(&arena, &interner, root);
        assert_eq!(dumped, "(seq (id:Foo))");

        let mut arena2 = NodeArena::new();
        let mut interner2 = Interner::new();
        let root2 = parse_ast(&dumped, &mut arena2, &mut interner2).unwrap();
        let dumped2 = print_ast(&arena2, &interner2, root2);
        assert_eq!(dumped, dumped2);
    }

    #[test]
    fn round_trips_a_type_slot() {
        let mut arena = NodeArena::new();
        let mut interner = Interner::new();

        let expr = arena.alloc(TokenKind::Reference, Span::default());
        let ty = arena.alloc(TokenKind::Nominal, Span::default());
        arena.set_type(expr, ty);

        let dumped = print_ast(&arena, &interner, expr);
        assert_eq!(dumped, "(reference [(nominal)])");

        let mut arena2 = NodeArena::new();
        let mut interner2 = Interner::new();
        let root2 = parse_ast(&dumped, &mut arena2, &mut interner2).unwrap();
        assert_eq!(print_ast(&arena2, &interner2, root2), dumped);
    }

    #[test]
    fn rejects_unknown_kind_names() {
        let mut arena = NodeArena::new();
        let mut interner = Interner::new();
        assert!(parse_ast("(bogus_kind)", &mut arena, &mut interner).is_err());
    }
}
