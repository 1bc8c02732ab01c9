//! The lexer: source text → token stream.
//!
//! Scanning is single-pass, left-to-right (`spec.md` §4.1). Whitespace
//! and `//` line comments are discarded without producing tokens.
//! Unrecognized characters are reported through the caller's
//! [`Handler`] and skipped so scanning can continue — the lexer never
//! aborts early; it always produces a complete (if erroneous) token
//! stream, and the driver decides whether to hand that to the parser.

use log::trace;
use msl_util::{Handler, Span};

use crate::cursor::Cursor;
use crate::token::{keyword, Token, TokenKind};

pub struct Lexer<'a> {
    cursor: Cursor<'a>,
    handler: &'a mut Handler,
    token_start: usize,
    token_line: u32,
    token_column: u32,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str, handler: &'a mut Handler) -> Self {
        Self {
            cursor: Cursor::new(source),
            handler,
            token_start: 0,
            token_line: 1,
            token_column: 1,
        }
    }

    /// Scans and returns the next token, skipping whitespace, comments,
    /// and any unrecognized characters (each of which is reported as a
    /// diagnostic before scanning resumes).
    pub fn next_token(&mut self) -> Token {
        loop {
            self.skip_whitespace_and_comments();

            self.token_start = self.cursor.position();
            self.token_line = self.cursor.line();
            self.token_column = self.cursor.column();

            if self.cursor.is_at_end() {
                return self.make(TokenKind::Eof);
            }

            let c = self.cursor.current_char();
            let kind = match c {
                '(' => { self.cursor.advance(); TokenKind::LParen }
                ')' => { self.cursor.advance(); TokenKind::RParen }
                '[' => { self.cursor.advance(); TokenKind::LBracket }
                ']' => { self.cursor.advance(); TokenKind::RBracket }
                '{' => { self.cursor.advance(); TokenKind::LBrace }
                '}' => { self.cursor.advance(); TokenKind::RBrace }
                ',' => { self.cursor.advance(); TokenKind::Comma }
                '.' => { self.cursor.advance(); TokenKind::Dot }
                ':' => { self.cursor.advance(); TokenKind::Colon }
                ';' => { self.cursor.advance(); TokenKind::Semicolon }
                '+' => { self.cursor.advance(); self.lex_plus() }
                '-' => { self.cursor.advance(); self.lex_minus() }
                '*' => { self.cursor.advance(); self.compound(TokenKind::Star, TokenKind::StarEq) }
                '/' => { self.cursor.advance(); self.compound(TokenKind::Slash, TokenKind::SlashEq) }
                '%' => { self.cursor.advance(); self.compound(TokenKind::Percent, TokenKind::PercentEq) }
                '=' => { self.cursor.advance(); self.compound(TokenKind::Eq, TokenKind::EqEq) }
                '!' => { self.cursor.advance(); self.compound(TokenKind::Bang, TokenKind::BangEq) }
                '>' => { self.cursor.advance(); self.compound(TokenKind::Gt, TokenKind::GtEq) }
                '<' => { self.cursor.advance(); self.compound(TokenKind::Lt, TokenKind::LtEq) }
                '&' => {
                    self.cursor.advance();
                    if self.cursor.eat('&') {
                        TokenKind::AndAnd
                    } else {
                        self.error("unexpected character '&' (did you mean '&&'?)");
                        continue;
                    }
                }
                '|' => {
                    self.cursor.advance();
                    if self.cursor.eat('|') {
                        TokenKind::OrOr
                    } else {
                        self.error("unexpected character '|' (did you mean '||'?)");
                        continue;
                    }
                }
                '"' => match self.lex_string() {
                    Some(kind) => kind,
                    None => continue,
                },
                c if c.is_ascii_digit() => self.lex_number(),
                c if c.is_ascii_alphabetic() => self.lex_identifier(),
                other => {
                    self.error(format!("unexpected character '{other}'"));
                    self.cursor.advance();
                    continue;
                }
            };

            return self.make(kind);
        }
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            match self.cursor.current_char() {
                ' ' | '\t' | '\x0b' | '\x0c' | '\r' | '\n' => {
                    self.cursor.advance();
                }
                '/' if self.cursor.peek_char(1) == '/' => {
                    while !self.cursor.is_at_end() && self.cursor.current_char() != '\n' {
                        self.cursor.advance();
                    }
                }
                _ => return,
            }
        }
    }

    fn compound(&mut self, plain: TokenKind, with_eq: TokenKind) -> TokenKind {
        if self.cursor.eat('=') {
            with_eq
        } else {
            plain
        }
    }

    fn lex_plus(&mut self) -> TokenKind {
        if self.cursor.eat('+') {
            TokenKind::PlusPlus
        } else if self.cursor.eat('=') {
            TokenKind::PlusEq
        } else {
            TokenKind::Plus
        }
    }

    fn lex_minus(&mut self) -> TokenKind {
        if self.cursor.eat('-') {
            TokenKind::MinusMinus
        } else if self.cursor.eat('=') {
            TokenKind::MinusEq
        } else {
            TokenKind::Minus
        }
    }

    fn lex_string(&mut self) -> Option<TokenKind> {
        self.cursor.advance(); // opening quote
        let mut value = String::new();
        loop {
            if self.cursor.is_at_end() {
                self.error_at("unterminated string literal", self.token_line, self.token_column);
                return None;
            }
            let c = self.cursor.current_char();
            if c == '"' {
                self.cursor.advance();
                return Some(TokenKind::Str(value));
            }
            value.push(c);
            self.cursor.advance();
        }
    }

    fn lex_number(&mut self) -> TokenKind {
        while self.cursor.current_char().is_ascii_digit() {
            self.cursor.advance();
        }
        if self.cursor.current_char() == '.' && self.cursor.peek_char(1).is_ascii_digit() {
            self.cursor.advance(); // '.'
            while self.cursor.current_char().is_ascii_digit() {
                self.cursor.advance();
            }
        }
        let lexeme = self.cursor.slice_from(self.token_start);
        let value: f64 = lexeme.parse().unwrap_or(f64::NAN);
        TokenKind::Number(value)
    }

    fn lex_identifier(&mut self) -> TokenKind {
        while {
            let c = self.cursor.current_char();
            c.is_ascii_alphanumeric()
        } {
            self.cursor.advance();
        }
        let lexeme = self.cursor.slice_from(self.token_start);
        keyword(lexeme).unwrap_or(TokenKind::Identifier)
    }

    fn make(&self, kind: TokenKind) -> Token {
        let lexeme = self.cursor.slice_from(self.token_start).to_owned();
        let span = Span::new(
            self.token_start,
            self.cursor.position(),
            self.token_line,
            self.token_column,
        );
        Token::new(kind, lexeme, span)
    }

    fn error(&mut self, message: impl Into<String>) {
        self.error_at(message, self.cursor.line(), self.cursor.column());
    }

    fn error_at(&mut self, message: impl Into<String>, line: u32, column: u32) {
        self.handler.error(message, Span::point(self.cursor.position(), line, column));
    }
}

/// Scans `source` to completion, returning every token including the
/// trailing `Eof`. Errors are recorded in `handler`; the lexer itself
/// never fails.
pub fn tokenize(source: &str, handler: &mut Handler) -> Vec<Token> {
    let mut lexer = Lexer::new(source, handler);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token();
        let is_eof = token.is_eof();
        tokens.push(token);
        if is_eof {
            trace!("tokenized {} tokens ({} bytes of source)", tokens.len(), source.len());
            return tokens;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        let mut handler = Handler::new();
        tokenize(source, &mut handler).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn lexes_arithmetic_expression() {
        assert_eq!(
            kinds("1 + 2 * 3;"),
            vec![
                TokenKind::Number(1.0),
                TokenKind::Plus,
                TokenKind::Number(2.0),
                TokenKind::Star,
                TokenKind::Number(3.0),
                TokenKind::Semicolon,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn distinguishes_keywords_from_identifiers() {
        assert_eq!(kinds("let letter"), vec![TokenKind::Let, TokenKind::Identifier, TokenKind::Eof]);
    }

    #[test]
    fn compounds_comparison_and_assignment_operators() {
        assert_eq!(
            kinds("a += 1; b == 2; c != 3;"),
            vec![
                TokenKind::Identifier,
                TokenKind::PlusEq,
                TokenKind::Number(1.0),
                TokenKind::Semicolon,
                TokenKind::Identifier,
                TokenKind::EqEq,
                TokenKind::Number(2.0),
                TokenKind::Semicolon,
                TokenKind::Identifier,
                TokenKind::BangEq,
                TokenKind::Number(3.0),
                TokenKind::Semicolon,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lexes_increment_and_decrement() {
        assert_eq!(kinds("++x--"), vec![TokenKind::PlusPlus, TokenKind::Identifier, TokenKind::MinusMinus, TokenKind::Eof]);
    }

    #[test]
    fn skips_line_comments() {
        assert_eq!(kinds("1 // a comment\n+ 2"), vec![TokenKind::Number(1.0), TokenKind::Plus, TokenKind::Number(2.0), TokenKind::Eof]);
    }

    #[test]
    fn string_literal_allows_embedded_newlines() {
        let mut handler = Handler::new();
        let tokens = tokenize("\"a\nb\"", &mut handler);
        assert_eq!(tokens[0].kind, TokenKind::Str("a\nb".to_string()));
        assert!(!handler.has_errors());
    }

    #[test]
    fn unterminated_string_reports_error_at_opening_quote() {
        let mut handler = Handler::new();
        let tokens = tokenize("\"abc", &mut handler);
        assert!(handler.has_errors());
        assert_eq!(tokens.last().unwrap().kind, TokenKind::Eof);
    }

    #[test]
    fn lone_ampersand_is_a_lexical_error() {
        let mut handler = Handler::new();
        tokenize("a & b", &mut handler);
        assert!(handler.has_errors());
    }

    #[test]
    fn lone_pipe_is_a_lexical_error() {
        let mut handler = Handler::new();
        tokenize("a | b", &mut handler);
        assert!(handler.has_errors());
    }

    #[test]
    fn unrecognized_character_is_reported_and_skipped() {
        let mut handler = Handler::new();
        let tokens = kinds_with_handler("let @x = 1;", &mut handler);
        assert!(handler.has_errors());
        assert_eq!(tokens, vec![TokenKind::Let, TokenKind::Identifier, TokenKind::Eq, TokenKind::Number(1.0), TokenKind::Semicolon, TokenKind::Eof]);
    }

    fn kinds_with_handler(source: &str, handler: &mut Handler) -> Vec<TokenKind> {
        tokenize(source, handler).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn number_requires_digit_after_dot_to_be_part_of_the_literal() {
        assert_eq!(kinds("1.5"), vec![TokenKind::Number(1.5), TokenKind::Eof]);
        assert_eq!(kinds("xs.len"), vec![TokenKind::Identifier, TokenKind::Dot, TokenKind::Identifier, TokenKind::Eof]);
    }

    #[test]
    fn tracks_line_and_column_of_tokens() {
        let mut handler = Handler::new();
        let tokens = tokenize("let\nx = 1;", &mut handler);
        // `x` starts line 2, column 1
        let x_tok = &tokens[1];
        assert_eq!((x_tok.span.line, x_tok.span.column), (2, 1));
    }
}
