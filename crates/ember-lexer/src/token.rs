//! The token/node-kind enumeration and the [`Token`] value type (root spec
//! §3.1, §6.5).
//!
//! `TokenKind` is deliberately a single closed enum reused for two
//! purposes, per the root spec's design note on polymorphism (§9): the
//! lexer produces a subset of its variants as concrete syntax, and the
//! parser and later passes reuse the *same* variants to tag abstract tree
//! shapes that never appear in source text (`Seq`, `Nominal`,
//! `TypeParamRef`, `Arrow`, ...). This mirrors the source language's own
//! `ast_t`/`token_id` reuse rather than introducing a second "node kind"
//! enum that would have to be kept in lock-step with this one.
//!
//! The full source language recognizes close to 200 distinct kinds; this
//! core reproduces a representative closed set covering every syntactic
//! category and abstract marker the rest of the spec names explicitly.

use ember_base::Symbol;

/// A closed enumeration of token/node kinds.
///
/// Kept `Copy` so it can be embedded directly in AST nodes without an
/// indirection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // ---- End of input -------------------------------------------------
    Eof,

    // ---- Punctuation & operators (lexical only) -----------------------
    LParen,
    LParenNew,
    RParen,
    LSquare,
    LSquareNew,
    RSquare,
    LBrace,
    RBrace,
    Comma,
    Dot,
    DotDot,
    Colon,
    DoubleColon,
    Semi,
    FatArrow, // `=>`
    ThinArrow, // `->`
    At,
    Question,
    Bang,
    Tilde, // partial application `~`
    Pipe,
    Amp,
    Caret, // ephemeral marker `^`
    ExclaimMark, // aliased marker `!`
    Assign,
    Plus,
    Minus,
    MinusNew,
    Star,
    Slash,
    Percent,
    EqEq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    AndAnd,
    OrOr,

    // ---- Literals (lexical only) ---------------------------------------
    Identifier(Symbol),
    IntLiteral(i128),
    FloatLiteral(u64), // bit pattern of an f64; f64 is not Eq/Hash
    StringLiteral(Symbol),

    // ---- Keywords (lexical; also reused as node kinds for their form) --
    Use,
    TypeKw,
    Primitive,
    Struct,
    ClassKw,
    Actor,
    Trait,
    Interface,
    Is,
    New,
    Be,
    Fun,
    Let,
    Var,
    Embed,
    Delegate,
    If,
    Then,
    Elseif,
    Else,
    While,
    Do,
    For,
    In,
    Try,
    With,
    Match,
    Case,
    Recover,
    Consume,
    Return,
    Break,
    Continue,
    ErrorKw,
    This,
    Extern,
    True,
    False,
    End,
    None_,

    // ---- Reference capabilities (lexical keyword; also a type-level tag)
    Iso,
    Trn,
    RefCap,
    Val,
    BoxCap,
    Tag,

    // ---- Test-only token ids, gated by `allow_test_symbols` ------------
    TestFail,
    TestSeqFlatten,
    TestNoMatch,

    // ---- Abstract node kinds (never produced directly by the lexer) ---
    Program,
    Package,
    Seq,
    NoneNode, // sentinel "no child here" filler (§4.2)
    Nominal,
    TypeParamRef,
    Union,
    Isect,
    Tuple,
    Arrow, // viewpoint type: (view, target)
    ThisType,
    FunctionType,
    LiteralType,
    InferType,
    ErrorType,
    Call,
    DotCall,
    TupleIndex,
    Assignment,
    Reference,
    FieldRef,
    ParamDecl,
    TypeParamDecl,
    TypeArgs,
    Params,
    Body,
    Provides,
    Members,
    PartialApply,
    ArrayLiteral,
    ObjectLiteral,
    ForLoop,
    Block,
}

impl TokenKind {
    /// The textual, normative name used in the AST printer (root spec
    /// §6.3/§6.5). Lowercase, matching the source language's own
    /// convention (`seq`, `fun`, `nominal`, `arrow`, `typeparamref`,
    /// `iso`, `tag`, ...).
    pub fn printer_name(&self) -> &'static str {
        match self {
            TokenKind::Eof => "eof",
            TokenKind::LParen | TokenKind::LParenNew => "(",
            TokenKind::RParen => ")",
            TokenKind::LSquare | TokenKind::LSquareNew => "[",
            TokenKind::RSquare => "]",
            TokenKind::LBrace => "{",
            TokenKind::RBrace => "}",
            TokenKind::Comma => ",",
            TokenKind::Dot => ".",
            TokenKind::DotDot => "..",
            TokenKind::Colon => ":",
            TokenKind::DoubleColon => "::",
            TokenKind::Semi => ";",
            TokenKind::FatArrow => "=>",
            TokenKind::ThinArrow => "->",
            TokenKind::At => "@",
            TokenKind::Question => "?",
            TokenKind::Bang => "!",
            TokenKind::Tilde => "~",
            TokenKind::Pipe => "|",
            TokenKind::Amp => "&",
            TokenKind::Caret => "^",
            TokenKind::ExclaimMark => "aliased",
            TokenKind::Assign => "=",
            TokenKind::Plus => "+",
            TokenKind::Minus | TokenKind::MinusNew => "-",
            TokenKind::Star => "*",
            TokenKind::Slash => "/",
            TokenKind::Percent => "%",
            TokenKind::EqEq => "==",
            TokenKind::NotEq => "!=",
            TokenKind::Lt => "<",
            TokenKind::Le => "<=",
            TokenKind::Gt => ">",
            TokenKind::Ge => ">=",
            TokenKind::AndAnd => "and",
            TokenKind::OrOr => "or",
            TokenKind::Identifier(_) => "id",
            TokenKind::IntLiteral(_) => "int",
            TokenKind::FloatLiteral(_) => "float",
            TokenKind::StringLiteral(_) => "string",
            TokenKind::Use => "use",
            TokenKind::TypeKw => "type",
            TokenKind::Primitive => "primitive",
            TokenKind::Struct => "struct",
            TokenKind::ClassKw => "class",
            TokenKind::Actor => "actor",
            TokenKind::Trait => "trait",
            TokenKind::Interface => "interface",
            TokenKind::Is => "is",
            TokenKind::New => "new",
            TokenKind::Be => "be",
            TokenKind::Fun => "fun",
            TokenKind::Let => "let",
            TokenKind::Var => "var",
            TokenKind::Embed => "embed",
            TokenKind::Delegate => "delegate",
            TokenKind::If => "if",
            TokenKind::Then => "then",
            TokenKind::Elseif => "elseif",
            TokenKind::Else => "else",
            TokenKind::While => "while",
            TokenKind::Do => "do",
            TokenKind::For => "for",
            TokenKind::In => "in",
            TokenKind::Try => "try",
            TokenKind::With => "with",
            TokenKind::Match => "match",
            TokenKind::Case => "case",
            TokenKind::Recover => "recover",
            TokenKind::Consume => "consume",
            TokenKind::Return => "return",
            TokenKind::Break => "break",
            TokenKind::Continue => "continue",
            TokenKind::ErrorKw => "error",
            TokenKind::This => "this",
            TokenKind::Extern => "extern",
            TokenKind::True => "true",
            TokenKind::False => "false",
            TokenKind::End => "end",
            TokenKind::None_ => "none",
            TokenKind::Iso => "iso",
            TokenKind::Trn => "trn",
            TokenKind::RefCap => "ref",
            TokenKind::Val => "val",
            TokenKind::BoxCap => "box",
            TokenKind::Tag => "tag",
            TokenKind::TestFail => "$fail",
            TokenKind::TestSeqFlatten => "$seq_flatten",
            TokenKind::TestNoMatch => "$no_match",
            TokenKind::Program => "program",
            TokenKind::Package => "package",
            TokenKind::Seq => "seq",
            TokenKind::NoneNode => "x",
            TokenKind::Nominal => "nominal",
            TokenKind::TypeParamRef => "typeparamref",
            TokenKind::Union => "union",
            TokenKind::Isect => "isect",
            TokenKind::Tuple => "tuple",
            TokenKind::Arrow => "arrow",
            TokenKind::ThisType => "thistype",
            TokenKind::FunctionType => "functiontype",
            TokenKind::LiteralType => "literal",
            TokenKind::InferType => "infer",
            TokenKind::ErrorType => "errortype",
            TokenKind::Call => "call",
            TokenKind::DotCall => "dot",
            TokenKind::TupleIndex => "tupleref",
            TokenKind::Assignment => "assign",
            TokenKind::Reference => "reference",
            TokenKind::FieldRef => "fieldref",
            TokenKind::ParamDecl => "param",
            TokenKind::TypeParamDecl => "typeparam",
            TokenKind::TypeArgs => "typeargs",
            TokenKind::Params => "params",
            TokenKind::Body => "body",
            TokenKind::Provides => "provides",
            TokenKind::Members => "members",
            TokenKind::PartialApply => "partial_apply",
            TokenKind::ArrayLiteral => "array",
            TokenKind::ObjectLiteral => "object",
            TokenKind::ForLoop => "for",
            TokenKind::Block => "block",
        }
    }

    /// `true` for the three symbols that carry a newline-sensitive variant
    /// (root spec §4.1/§4.2, grounded in the original lexer's
    /// `TK_LPAREN_NEW`/`TK_LSQUARE_NEW`/`TK_MINUS_NEW`).
    pub fn is_newline_variant(&self) -> bool {
        matches!(
            self,
            TokenKind::LParenNew | TokenKind::LSquareNew | TokenKind::MinusNew
        )
    }

    /// Maps a newline-sensitive base kind to its `_New` variant; returns
    /// the kind unchanged if it is not one of the three affected symbols.
    pub fn to_newline_variant(self) -> TokenKind {
        match self {
            TokenKind::LParen => TokenKind::LParenNew,
            TokenKind::LSquare => TokenKind::LSquareNew,
            TokenKind::Minus => TokenKind::MinusNew,
            other => other,
        }
    }

    /// Strips the newline-sensitivity from a kind, so grammar productions
    /// that don't care about it can match a single base kind.
    pub fn strip_newline_variant(self) -> TokenKind {
        match self {
            TokenKind::LParenNew => TokenKind::LParen,
            TokenKind::LSquareNew => TokenKind::LSquare,
            TokenKind::MinusNew => TokenKind::Minus,
            other => other,
        }
    }

    /// `true` if this kind is one of the six reference-capability keywords.
    pub fn is_cap_keyword(&self) -> bool {
        matches!(
            self,
            TokenKind::Iso
                | TokenKind::Trn
                | TokenKind::RefCap
                | TokenKind::Val
                | TokenKind::BoxCap
                | TokenKind::Tag
        )
    }

    /// `true` if this kind introduces an entity definition.
    pub fn is_entity_keyword(&self) -> bool {
        matches!(
            self,
            TokenKind::Primitive
                | TokenKind::Struct
                | TokenKind::ClassKw
                | TokenKind::Actor
                | TokenKind::Trait
                | TokenKind::Interface
        )
    }

    /// `true` if this kind introduces a method-like member
    /// (`new`/`be`/`fun`).
    pub fn is_method_keyword(&self) -> bool {
        matches!(self, TokenKind::New | TokenKind::Be | TokenKind::Fun)
    }
}

/// A lexed token: a kind plus its source span.
///
/// Tokens are value-like and freely duplicated (root spec §3.1); literal
/// payloads live inside `kind` itself (`IntLiteral`, `FloatLiteral`,
/// `StringLiteral`, `Identifier`) rather than in a side slot, since the
/// closed `TokenKind` enum already has room for them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: ember_base::Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: ember_base::Span) -> Self {
        Token { kind, span }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newline_variant_round_trips() {
        assert_eq!(TokenKind::LParen.to_newline_variant(), TokenKind::LParenNew);
        assert!(TokenKind::LParenNew.is_newline_variant());
        assert_eq!(TokenKind::LParenNew.strip_newline_variant(), TokenKind::LParen);
    }

    #[test]
    fn only_three_symbols_are_newline_sensitive() {
        assert!(!TokenKind::RParen.is_newline_variant());
        assert_eq!(TokenKind::RParen.to_newline_variant(), TokenKind::RParen);
    }

    #[test]
    fn cap_keyword_recognizes_all_six() {
        for k in [
            TokenKind::Iso,
            TokenKind::Trn,
            TokenKind::RefCap,
            TokenKind::Val,
            TokenKind::BoxCap,
            TokenKind::Tag,
        ] {
            assert!(k.is_cap_keyword());
        }
        assert!(!TokenKind::Fun.is_cap_keyword());
    }

    #[test]
    fn printer_names_are_lowercase_and_stable() {
        assert_eq!(TokenKind::Seq.printer_name(), "seq");
        assert_eq!(TokenKind::Fun.printer_name(), "fun");
        assert_eq!(TokenKind::Nominal.printer_name(), "nominal");
        assert_eq!(TokenKind::Arrow.printer_name(), "arrow");
        assert_eq!(TokenKind::TypeParamRef.printer_name(), "typeparamref");
        assert_eq!(TokenKind::Iso.printer_name(), "iso");
        assert_eq!(TokenKind::Tag.printer_name(), "tag");
    }
}
