//! Byte-level lexical analysis (root spec §4.1).
//!
//! The lexer consumes source bytes and produces a lazy sequence of
//! [`Token`]s. It never allocates an AST node and knows nothing about
//! grammar productions — disambiguation beyond "was this symbol preceded
//! by a newline" is the parser's job (§4.2).

use ember_base::{Interner, Span};
use ember_diag::{Diagnostic, ErrorKind, Errors};

use crate::token::{Token, TokenKind};

/// Lexer configuration relevant to tokenization itself.
///
/// A strict subset of `ember_compile::CompileOptions` — the lexer doesn't
/// need to see `verbosity` or `ast_print_width`, so it takes only what it
/// uses rather than the whole options record.
#[derive(Debug, Clone, Copy, Default)]
pub struct LexerOptions {
    /// Enables the `$fail`/`$seq_flatten`/`$no_match` test-only spellings
    /// (root spec §4.1).
    pub allow_test_symbols: bool,
}

/// Consumes source bytes, producing tokens on demand.
pub struct Lexer<'a> {
    source: &'a str,
    bytes: &'a [u8],
    pos: usize,
    source_id: u32,
    at_line_start: bool,
    options: LexerOptions,
}

impl<'a> Lexer<'a> {
    /// Opens a lexer over `source`, identified by `source_id` for span
    /// tagging when multiple files participate in one compilation.
    pub fn open(source: &'a str, source_id: u32, options: LexerOptions) -> Self {
        Lexer {
            source,
            bytes: source.as_bytes(),
            pos: 0,
            source_id,
            at_line_start: true,
            options,
        }
    }

    fn span(&self, start: usize) -> Span {
        Span::in_source(self.source_id, start, self.pos)
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.pos += 1;
        Some(b)
    }

    /// Skips whitespace and comments, tracking whether a newline was
    /// crossed (needed for the `_New` token variants, root spec §4.1).
    ///
    /// Block comments nest, matching `/* /* ... */ */`.
    fn skip_trivia(&mut self, errors: &mut Errors) {
        loop {
            match self.peek() {
                Some(b'\n') => {
                    self.at_line_start = true;
                    self.pos += 1;
                }
                Some(b) if b.is_ascii_whitespace() => {
                    self.pos += 1;
                }
                Some(b'/') if self.peek_at(1) == Some(b'/') => {
                    while !matches!(self.peek(), None | Some(b'\n')) {
                        self.pos += 1;
                    }
                }
                Some(b'/') if self.peek_at(1) == Some(b'*') => {
                    let start = self.pos;
                    self.pos += 2;
                    let mut depth = 1usize;
                    while depth > 0 {
                        match (self.peek(), self.peek_at(1)) {
                            (Some(b'/'), Some(b'*')) => {
                                depth += 1;
                                self.pos += 2;
                            }
                            (Some(b'*'), Some(b'/')) => {
                                depth -= 1;
                                self.pos += 2;
                            }
                            (Some(b'\n'), _) => {
                                self.at_line_start = true;
                                self.pos += 1;
                            }
                            (Some(_), _) => self.pos += 1,
                            (None, _) => {
                                errors.push(Diagnostic::error(
                                    ErrorKind::UnterminatedString,
                                    self.span(start),
                                    "unterminated block comment",
                                ));
                                return;
                            }
                        }
                    }
                }
                _ => return,
            }
        }
    }

    /// Lexes the next token, interning identifiers and string contents
    /// against `interner`.
    pub fn next(&mut self, interner: &mut Interner, errors: &mut Errors) -> Token {
        self.skip_trivia(errors);
        let was_line_start = std::mem::replace(&mut self.at_line_start, false);
        let start = self.pos;

        let Some(b) = self.peek() else {
            return Token::new(TokenKind::Eof, self.span(start));
        };

        let kind = match b {
            b'(' => {
                self.pos += 1;
                if was_line_start {
                    TokenKind::LParenNew
                } else {
                    TokenKind::LParen
                }
            }
            b')' => {
                self.pos += 1;
                TokenKind::RParen
            }
            b'[' => {
                self.pos += 1;
                if was_line_start {
                    TokenKind::LSquareNew
                } else {
                    TokenKind::LSquare
                }
            }
            b']' => {
                self.pos += 1;
                TokenKind::RSquare
            }
            b'{' => {
                self.pos += 1;
                TokenKind::LBrace
            }
            b'}' => {
                self.pos += 1;
                TokenKind::RBrace
            }
            b',' => {
                self.pos += 1;
                TokenKind::Comma
            }
            b';' => {
                self.pos += 1;
                TokenKind::Semi
            }
            b'.' => {
                self.pos += 1;
                if self.peek() == Some(b'.') {
                    self.pos += 1;
                    TokenKind::DotDot
                } else {
                    TokenKind::Dot
                }
            }
            b':' => {
                self.pos += 1;
                if self.peek() == Some(b':') {
                    self.pos += 1;
                    TokenKind::DoubleColon
                } else {
                    TokenKind::Colon
                }
            }
            b'@' => {
                self.pos += 1;
                TokenKind::At
            }
            b'?' => {
                self.pos += 1;
                TokenKind::Question
            }
            b'~' => {
                self.pos += 1;
                TokenKind::Tilde
            }
            b'|' => {
                self.pos += 1;
                TokenKind::Pipe
            }
            b'&' => {
                self.pos += 1;
                TokenKind::Amp
            }
            b'^' => {
                self.pos += 1;
                TokenKind::Caret
            }
            b'%' => {
                self.pos += 1;
                TokenKind::Percent
            }
            b'*' => {
                self.pos += 1;
                TokenKind::Star
            }
            b'/' => {
                self.pos += 1;
                TokenKind::Slash
            }
            b'+' => {
                self.pos += 1;
                TokenKind::Plus
            }
            b'-' => {
                self.pos += 1;
                if self.peek() == Some(b'>') {
                    self.pos += 1;
                    TokenKind::ThinArrow
                } else if was_line_start {
                    TokenKind::MinusNew
                } else {
                    TokenKind::Minus
                }
            }
            b'=' => {
                self.pos += 1;
                match self.peek() {
                    Some(b'=') => {
                        self.pos += 1;
                        TokenKind::EqEq
                    }
                    Some(b'>') => {
                        self.pos += 1;
                        TokenKind::FatArrow
                    }
                    _ => TokenKind::Assign,
                }
            }
            b'!' => {
                self.pos += 1;
                if self.peek() == Some(b'=') {
                    self.pos += 1;
                    TokenKind::NotEq
                } else {
                    TokenKind::Bang
                }
            }
            b'<' => {
                self.pos += 1;
                if self.peek() == Some(b'=') {
                    self.pos += 1;
                    TokenKind::Le
                } else {
                    TokenKind::Lt
                }
            }
            b'>' => {
                self.pos += 1;
                if self.peek() == Some(b'=') {
                    self.pos += 1;
                    TokenKind::Ge
                } else {
                    TokenKind::Gt
                }
            }
            b'"' => return self.lex_string(interner, errors, start),
            b'0'..=b'9' => return self.lex_number(errors, start),
            b'$' if self.options.allow_test_symbols => {
                return self.lex_test_symbol(errors, start)
            }
            b if is_ident_start(b) => return self.lex_ident_or_keyword(interner, start),
            _ => {
                // Consume one UTF-8 scalar so the diagnostic span covers
                // exactly the offending character, then report it.
                let ch_len = utf8_len(b);
                self.pos += ch_len.max(1);
                errors.push(Diagnostic::error(
                    ErrorKind::UnknownChar,
                    self.span(start),
                    format!("unrecognized character at byte {}", start),
                ));
                return self.next(interner, errors);
            }
        };

        Token::new(kind, self.span(start))
    }

    fn lex_test_symbol(&mut self, errors: &mut Errors, start: usize) -> Token {
        self.pos += 1; // consume '$'
        let ident_start = self.pos;
        while self.peek().map(is_ident_continue).unwrap_or(false) {
            self.pos += 1;
        }
        let word = &self.source[ident_start..self.pos];
        let kind = match word {
            "fail" => TokenKind::TestFail,
            "seq_flatten" => TokenKind::TestSeqFlatten,
            "no_match" => TokenKind::TestNoMatch,
            _ => {
                errors.push(Diagnostic::error(
                    ErrorKind::UnknownChar,
                    self.span(start),
                    format!("unknown test symbol '${}'", word),
                ));
                TokenKind::TestFail
            }
        };
        Token::new(kind, self.span(start))
    }

    fn lex_ident_or_keyword(&mut self, interner: &mut Interner, start: usize) -> Token {
        self.pos += 1;
        while self
            .peek()
            .map(|b| is_ident_continue(b) || b == b'\'')
            .unwrap_or(false)
        {
            self.pos += 1;
        }
        let text = &self.source[start..self.pos];
        let kind = keyword_kind(text).unwrap_or_else(|| TokenKind::Identifier(interner.intern(text)));
        Token::new(kind, self.span(start))
    }

    fn lex_number(&mut self, errors: &mut Errors, start: usize) -> Token {
        if self.peek() == Some(b'0') && matches!(self.peek_at(1), Some(b'x') | Some(b'X')) {
            self.pos += 2;
            let digits_start = self.pos;
            while self.peek().map(|b| b.is_ascii_hexdigit() || b == b'_').unwrap_or(false) {
                self.pos += 1;
            }
            return self.finish_radix_int(errors, start, digits_start, 16);
        }
        if self.peek() == Some(b'0') && matches!(self.peek_at(1), Some(b'b') | Some(b'B')) {
            self.pos += 2;
            let digits_start = self.pos;
            while self.peek().map(|b| b == b'0' || b == b'1' || b == b'_').unwrap_or(false) {
                self.pos += 1;
            }
            return self.finish_radix_int(errors, start, digits_start, 2);
        }

        while self.peek().map(|b| b.is_ascii_digit() || b == b'_').unwrap_or(false) {
            self.pos += 1;
        }

        let mut is_float = false;
        if self.peek() == Some(b'.') && self.peek_at(1).map(|b| b.is_ascii_digit()).unwrap_or(false) {
            is_float = true;
            self.pos += 1;
            while self.peek().map(|b| b.is_ascii_digit() || b == b'_').unwrap_or(false) {
                self.pos += 1;
            }
        }
        if matches!(self.peek(), Some(b'e') | Some(b'E')) {
            let save = self.pos;
            self.pos += 1;
            if matches!(self.peek(), Some(b'+') | Some(b'-')) {
                self.pos += 1;
            }
            if self.peek().map(|b| b.is_ascii_digit()).unwrap_or(false) {
                is_float = true;
                while self.peek().map(|b| b.is_ascii_digit()).unwrap_or(false) {
                    self.pos += 1;
                }
            } else {
                self.pos = save;
            }
        }

        let text: String = self.source[start..self.pos].chars().filter(|&c| c != '_').collect();
        if is_float {
            match text.parse::<f64>() {
                Ok(v) => Token::new(TokenKind::FloatLiteral(v.to_bits()), self.span(start)),
                Err(_) => {
                    errors.push(Diagnostic::error(
                        ErrorKind::NumericOverflow,
                        self.span(start),
                        format!("invalid float literal '{}'", text),
                    ));
                    Token::new(TokenKind::FloatLiteral(0), self.span(start))
                }
            }
        } else {
            match text.parse::<i128>() {
                Ok(v) => Token::new(TokenKind::IntLiteral(v), self.span(start)),
                Err(_) => {
                    errors.push(Diagnostic::error(
                        ErrorKind::NumericOverflow,
                        self.span(start),
                        format!("integer literal '{}' does not fit in 128 bits", text),
                    ));
                    Token::new(TokenKind::IntLiteral(0), self.span(start))
                }
            }
        }
    }

    fn finish_radix_int(&mut self, errors: &mut Errors, start: usize, digits_start: usize, radix: u32) -> Token {
        let digits: String = self.source[digits_start..self.pos]
            .chars()
            .filter(|&c| c != '_')
            .collect();
        if digits.is_empty() {
            errors.push(Diagnostic::error(
                ErrorKind::NumericOverflow,
                self.span(start),
                "numeric literal has no digits",
            ));
            return Token::new(TokenKind::IntLiteral(0), self.span(start));
        }
        match i128::from_str_radix(&digits, radix) {
            Ok(v) => Token::new(TokenKind::IntLiteral(v), self.span(start)),
            Err(_) => {
                errors.push(Diagnostic::error(
                    ErrorKind::NumericOverflow,
                    self.span(start),
                    format!("numeric literal '{}' overflows 128 bits", &self.source[start..self.pos]),
                ));
                Token::new(TokenKind::IntLiteral(0), self.span(start))
            }
        }
    }

    fn lex_string(&mut self, interner: &mut Interner, errors: &mut Errors, start: usize) -> Token {
        // Triple-quoted multi-line string: """ ... """
        if self.peek() == Some(b'"') && self.peek_at(1) == Some(b'"') && self.peek_at(2) == Some(b'"') {
            return self.lex_triple_string(interner, errors, start);
        }

        self.pos += 1; // opening quote
        let mut value = String::new();
        loop {
            match self.peek() {
                None => {
                    errors.push(Diagnostic::error(
                        ErrorKind::UnterminatedString,
                        self.span(start),
                        "unterminated string literal",
                    ));
                    break;
                }
                Some(b'"') => {
                    self.pos += 1;
                    break;
                }
                Some(b'\\') => {
                    self.pos += 1;
                    if let Some(ch) = self.lex_escape(errors, start) {
                        value.push(ch);
                    }
                }
                Some(_) => {
                    let ch_len = self.push_utf8_char(&mut value);
                    if ch_len == 0 {
                        self.pos += 1;
                    }
                }
            }
        }
        Token::new(TokenKind::StringLiteral(interner.intern(&value)), self.span(start))
    }

    fn lex_triple_string(&mut self, interner: &mut Interner, errors: &mut Errors, start: usize) -> Token {
        self.pos += 3;
        let body_start = self.pos;
        loop {
            match self.peek() {
                None => {
                    errors.push(Diagnostic::error(
                        ErrorKind::UnterminatedString,
                        self.span(start),
                        "unterminated triple-quoted string literal",
                    ));
                    break;
                }
                Some(b'"') if self.peek_at(1) == Some(b'"') && self.peek_at(2) == Some(b'"') => {
                    break;
                }
                Some(b'\n') => {
                    self.at_line_start = true;
                    self.pos += 1;
                }
                Some(_) => self.pos += 1,
            }
        }
        let raw = &self.source[body_start..self.pos];
        if self.peek() == Some(b'"') {
            self.pos += 3;
        }
        let normalized = normalize_triple_quoted(raw);
        Token::new(
            TokenKind::StringLiteral(interner.intern(&normalized)),
            self.span(start),
        )
    }

    /// Handles one escape sequence (the character after the backslash has
    /// not yet been consumed). Returns the decoded character, or `None` if
    /// the escape was invalid (an error has already been pushed).
    fn lex_escape(&mut self, errors: &mut Errors, string_start: usize) -> Option<char> {
        let esc_start = self.pos;
        let c = self.bump()?;
        let simple = |c: char| Some(c);
        match c {
            b'a' => simple('\u{07}'),
            b'b' => simple('\u{08}'),
            b'e' => simple('\u{1B}'),
            b'f' => simple('\u{0C}'),
            b'n' => simple('\n'),
            b'r' => simple('\r'),
            b't' => simple('\t'),
            b'v' => simple('\u{0B}'),
            b'"' => simple('"'),
            b'\\' => simple('\\'),
            b'0' => simple('\0'),
            b'x' => self.lex_hex_escape(errors, esc_start, 2),
            b'u' => self.lex_hex_escape(errors, esc_start, 4),
            b'U' => self.lex_hex_escape(errors, esc_start, 6),
            _ => {
                errors.push(Diagnostic::error(
                    ErrorKind::BadEscape,
                    self.span(string_start),
                    format!("unknown escape sequence '\\{}'", c as char),
                ));
                None
            }
        }
    }

    fn lex_hex_escape(&mut self, errors: &mut Errors, esc_start: usize, digits: usize) -> Option<char> {
        let hex_start = self.pos;
        for _ in 0..digits {
            if self.peek().map(|b| b.is_ascii_hexdigit()).unwrap_or(false) {
                self.pos += 1;
            } else {
                errors.push(Diagnostic::error(
                    ErrorKind::BadEscape,
                    self.span(esc_start),
                    "escape sequence is missing hex digits",
                ));
                return None;
            }
        }
        let text = &self.source[hex_start..self.pos];
        let value = u32::from_str_radix(text, 16).ok()?;
        char::from_u32(value).or_else(|| {
            errors.push(Diagnostic::error(
                ErrorKind::BadEscape,
                self.span(esc_start),
                format!("'\\u{{{}}}' is not a valid Unicode scalar value", text),
            ));
            None
        })
    }

    fn push_utf8_char(&mut self, out: &mut String) -> usize {
        let rest = &self.source[self.pos..];
        if let Some(ch) = rest.chars().next() {
            out.push(ch);
            let len = ch.len_utf8();
            self.pos += len;
            len
        } else {
            0
        }
    }
}

/// Strips the common leading-whitespace prefix of every non-blank line in
/// a triple-quoted string body and trims a single leading/trailing
/// newline, matching the source language's multi-line string
/// normalization (root spec §4.1).
fn normalize_triple_quoted(raw: &str) -> String {
    let mut body = raw;
    if let Some(stripped) = body.strip_prefix('\n') {
        body = stripped;
    }
    if let Some(stripped) = body.strip_suffix('\n') {
        body = stripped;
    }

    let min_indent = body
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.len() - line.trim_start_matches(' ').len())
        .min()
        .unwrap_or(0);

    body.lines()
        .map(|line| {
            if line.len() >= min_indent {
                &line[min_indent..]
            } else {
                line.trim_start_matches(' ')
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

fn is_ident_continue(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

fn utf8_len(first_byte: u8) -> usize {
    if first_byte & 0x80 == 0 {
        1
    } else if first_byte & 0xE0 == 0xC0 {
        2
    } else if first_byte & 0xF0 == 0xE0 {
        3
    } else if first_byte & 0xF8 == 0xF0 {
        4
    } else {
        1
    }
}

fn keyword_kind(text: &str) -> Option<TokenKind> {
    Some(match text {
        "use" => TokenKind::Use,
        "type" => TokenKind::TypeKw,
        "primitive" => TokenKind::Primitive,
        "struct" => TokenKind::Struct,
        "class" => TokenKind::ClassKw,
        "actor" => TokenKind::Actor,
        "trait" => TokenKind::Trait,
        "interface" => TokenKind::Interface,
        "is" => TokenKind::Is,
        "new" => TokenKind::New,
        "be" => TokenKind::Be,
        "fun" => TokenKind::Fun,
        "let" => TokenKind::Let,
        "var" => TokenKind::Var,
        "embed" => TokenKind::Embed,
        "delegate" => TokenKind::Delegate,
        "if" => TokenKind::If,
        "then" => TokenKind::Then,
        "elseif" => TokenKind::Elseif,
        "else" => TokenKind::Else,
        "while" => TokenKind::While,
        "do" => TokenKind::Do,
        "for" => TokenKind::For,
        "in" => TokenKind::In,
        "try" => TokenKind::Try,
        "with" => TokenKind::With,
        "match" => TokenKind::Match,
        "case" => TokenKind::Case,
        "recover" => TokenKind::Recover,
        "consume" => TokenKind::Consume,
        "return" => TokenKind::Return,
        "break" => TokenKind::Break,
        "continue" => TokenKind::Continue,
        "error" => TokenKind::ErrorKw,
        "this" => TokenKind::This,
        "extern" => TokenKind::Extern,
        "true" => TokenKind::True,
        "false" => TokenKind::False,
        "end" => TokenKind::End,
        "None" => TokenKind::None_,
        "and" => TokenKind::AndAnd,
        "or" => TokenKind::OrOr,
        "iso" => TokenKind::Iso,
        "trn" => TokenKind::Trn,
        "ref" => TokenKind::RefCap,
        "val" => TokenKind::Val,
        "box" => TokenKind::BoxCap,
        "tag" => TokenKind::Tag,
        _ => return None,
    })
}

/// Lexes an entire source into a `Vec<Token>`, ending with one `Eof`
/// token. Convenience wrapper around repeated [`Lexer::next`] calls for
/// callers (chiefly the parser) that want to look ahead freely rather
/// than drive the lexer themselves.
pub fn tokenize(source: &str, source_id: u32, options: LexerOptions, interner: &mut Interner, errors: &mut Errors) -> Vec<Token> {
    let mut lexer = Lexer::open(source, source_id, options);
    let mut tokens = Vec::new();
    loop {
        let tok = lexer.next(interner, errors);
        let done = tok.kind == TokenKind::Eof;
        tokens.push(tok);
        if done {
            break;
        }
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex_all(source: &str) -> (Vec<TokenKind>, Interner, Errors) {
        let mut interner = Interner::new();
        let mut errors = Errors::new();
        let tokens = tokenize(source, 0, LexerOptions::default(), &mut interner, &mut errors);
        (tokens.into_iter().map(|t| t.kind).collect(), interner, errors)
    }

    #[test]
    fn lexes_keywords_and_identifiers() {
        let (kinds, interner, errors) = lex_all("class Foo fun bar");
        assert!(errors.is_empty());
        assert_eq!(kinds[0], TokenKind::ClassKw);
        match kinds[1] {
            TokenKind::Identifier(sym) => assert_eq!(interner.resolve(sym), "Foo"),
            other => panic!("expected identifier, got {:?}", other),
        }
        assert_eq!(kinds[2], TokenKind::Fun);
    }

    #[test]
    fn lexes_decimal_hex_and_binary_integers() {
        let (kinds, _, errors) = lex_all("10 0xFF 0b101");
        assert!(errors.is_empty());
        assert_eq!(kinds[0], TokenKind::IntLiteral(10));
        assert_eq!(kinds[1], TokenKind::IntLiteral(255));
        assert_eq!(kinds[2], TokenKind::IntLiteral(5));
    }

    #[test]
    fn lexes_float_with_exponent() {
        let (kinds, _, errors) = lex_all("1.5e2");
        assert!(errors.is_empty());
        match kinds[0] {
            TokenKind::FloatLiteral(bits) => assert_eq!(f64::from_bits(bits), 150.0),
            other => panic!("expected float, got {:?}", other),
        }
    }

    #[test]
    fn integer_overflow_is_reported() {
        let (_, _, errors) = lex_all("999999999999999999999999999999999999999999");
        assert!(errors.of_kind(ErrorKind::NumericOverflow).count() >= 1);
    }

    #[test]
    fn string_literal_decodes_escapes() {
        let (kinds, interner, errors) = lex_all(r#""hi\n\t\"there\"""#);
        assert!(errors.is_empty());
        match kinds[0] {
            TokenKind::StringLiteral(sym) => assert_eq!(interner.resolve(sym), "hi\n\t\"there\""),
            other => panic!("expected string, got {:?}", other),
        }
    }

    #[test]
    fn string_literal_decodes_unicode_escape() {
        let (kinds, interner, errors) = lex_all(r#""A\U0001F600""#);
        assert!(errors.is_empty());
        match kinds[0] {
            TokenKind::StringLiteral(sym) => {
                let s = interner.resolve(sym);
                assert!(s.starts_with('A'));
                assert!(s.chars().nth(1).unwrap() as u32 == 0x1F600);
            }
            other => panic!("expected string, got {:?}", other),
        }
    }

    #[test]
    fn unterminated_string_is_reported() {
        let (_, _, errors) = lex_all("\"abc");
        assert!(errors.of_kind(ErrorKind::UnterminatedString).count() >= 1);
    }

    #[test]
    fn triple_quoted_string_normalizes_indentation() {
        let source = "\"\"\"\n    line one\n    line two\n    \"\"\"";
        let (kinds, interner, errors) = lex_all(source);
        assert!(errors.is_empty());
        match kinds[0] {
            TokenKind::StringLiteral(sym) => {
                assert_eq!(interner.resolve(sym), "line one\nline two");
            }
            other => panic!("expected string, got {:?}", other),
        }
    }

    #[test]
    fn newline_preceded_lparen_gets_new_variant() {
        let (kinds, _, errors) = lex_all("foo\n(bar)");
        assert!(errors.is_empty());
        // foo, LParenNew, bar, RParen, Eof
        assert!(matches!(kinds[1], TokenKind::LParenNew));
    }

    #[test]
    fn same_line_lparen_is_plain_variant() {
        let (kinds, _, errors) = lex_all("foo(bar)");
        assert!(errors.is_empty());
        assert_eq!(kinds[1], TokenKind::LParen);
    }

    #[test]
    fn newline_preceded_minus_gets_new_variant_but_same_line_is_plain() {
        let (kinds, _, errors) = lex_all("a\n-b\nc - d");
        assert!(errors.is_empty());
        assert_eq!(kinds[1], TokenKind::MinusNew);
        // find the later plain minus between c and d
        assert!(kinds.iter().any(|k| *k == TokenKind::Minus));
    }

    #[test]
    fn test_symbols_rejected_without_flag() {
        let (_, _, errors) = lex_all("$fail");
        assert!(errors.of_kind(ErrorKind::UnknownChar).count() >= 1);
    }

    #[test]
    fn test_symbols_accepted_with_flag() {
        let mut interner = Interner::new();
        let mut errors = Errors::new();
        let tokens = tokenize(
            "$fail",
            0,
            LexerOptions { allow_test_symbols: true },
            &mut interner,
            &mut errors,
        );
        assert!(errors.is_empty());
        assert_eq!(tokens[0].kind, TokenKind::TestFail);
    }

    #[test]
    fn nested_block_comments_are_skipped() {
        let (kinds, _, errors) = lex_all("/* outer /* inner */ still outer */ class");
        assert!(errors.is_empty());
        assert_eq!(kinds[0], TokenKind::ClassKw);
    }

    #[test]
    fn line_comment_runs_to_end_of_line() {
        let (kinds, _, errors) = lex_all("class // a comment\nfun");
        assert!(errors.is_empty());
        assert_eq!(kinds[0], TokenKind::ClassKw);
        assert_eq!(kinds[1], TokenKind::Fun);
    }

    #[test]
    fn two_character_operators_are_longest_match() {
        let (kinds, _, errors) = lex_all("a <= b => c :: d");
        assert!(errors.is_empty());
        assert!(kinds.contains(&TokenKind::Le));
        assert!(kinds.contains(&TokenKind::FatArrow));
        assert!(kinds.contains(&TokenKind::DoubleColon));
    }

    #[test]
    fn unknown_character_is_reported_and_skipped() {
        let (_, _, errors) = lex_all("class ` fun");
        assert!(errors.of_kind(ErrorKind::UnknownChar).count() >= 1);
    }

    proptest::proptest! {
        #[test]
        fn lexer_never_panics_on_arbitrary_bytes(s in ".{0,200}") {
            let mut interner = Interner::new();
            let mut errors = Errors::new();
            let _ = tokenize(&s, 0, LexerOptions::default(), &mut interner, &mut errors);
        }
    }
}
