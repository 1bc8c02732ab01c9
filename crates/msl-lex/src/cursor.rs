//! Character cursor for traversing source text.
//!
//! Tracks byte position plus 1-based line/column so the lexer never has
//! to recompute them; `spec.md` §3 requires columns be "1-based offsets
//! from the start of the line in which the token begins."

pub struct Cursor<'a> {
    source: &'a str,
    position: usize,
    line: u32,
    column: u32,
}

impl<'a> Cursor<'a> {
    pub fn new(source: &'a str) -> Self {
        Self { source, position: 0, line: 1, column: 1 }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    pub fn column(&self) -> u32 {
        self.column
    }

    pub fn is_at_end(&self) -> bool {
        self.position >= self.source.len()
    }

    pub fn current_char(&self) -> char {
        self.peek_char(0)
    }

    pub fn peek_char(&self, chars_ahead: usize) -> char {
        self.source[self.position..].chars().nth(chars_ahead).unwrap_or('\0')
    }

    /// The slice of source between `start` and the cursor's current
    /// position, used to materialize a token's lexeme once it's fully
    /// scanned.
    pub fn slice_from(&self, start: usize) -> &'a str {
        &self.source[start..self.position]
    }

    pub fn advance(&mut self) -> char {
        let c = self.current_char();
        if c != '\0' {
            self.position += c.len_utf8();
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        c
    }

    /// Consumes the current character if it equals `expected`.
    pub fn eat(&mut self, expected: char) -> bool {
        if self.current_char() == expected {
            self.advance();
            true
        } else {
            false
        }
    }
}
