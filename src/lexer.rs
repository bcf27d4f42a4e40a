use std::{iter::Peekable, num::ParseIntError};

use crate::token::{Span, Token, TokenKind, KEYWORDS};

/// Lexes the whole input eagerly, including the final [`TokenKind::Eof`].
pub fn lex_in_new(src: &str) -> Vec<Token> {
    Lexer::new(src).collect()
}

/// The SPL lexer.
///
/// Tokens are produced lazily, one per call to [`Lexer::next_token`]. Trivia
/// (spaces, tabs and `#` comments) never reaches the caller. As an
/// [`Iterator`], the lexer finishes right after yielding the end of input
/// token.
pub struct Lexer<'src> {
    src: &'src str,
    iter: Peekable<std::str::Chars<'src>>,
    cursor: usize,
    current_lo: usize,
    finished: bool,
}

impl<'src> Lexer<'src> {
    /// Constructs a new lexer with the default state.
    pub fn new(src: &'src str) -> Lexer<'src> {
        Lexer {
            src,
            iter: src.chars().peekable(),
            cursor: 0,
            current_lo: 0,
            finished: false,
        }
    }

    /// Scans the next token. Once the input is exhausted, keeps returning
    /// [`TokenKind::Eof`].
    pub fn next_token(&mut self) -> Token {
        loop {
            if let Some(kind) = self.scan_token_kind() {
                return Token::new(kind, self.span());
            }
        }
    }

    /// Tries to scan the current character. Returns `None` for trivia.
    fn scan_token_kind(&mut self) -> Option<TokenKind> {
        use TokenKind::*;
        let Some(c) = self.mark_advance() else {
            return Some(Eof);
        };
        let kind = match c {
            ' ' | '\t' | '\r' => {
                self.whitespace();
                return None;
            }
            '#' => {
                self.comment();
                return None;
            }
            '\n' | ';' => EndLine,
            '+' => self.with_assign(Plus, PlusAssign),
            '-' => self.with_assign(Minus, MinusAssign),
            '*' => self.with_assign(Star, StarAssign),
            '/' => self.with_assign(Slash, SlashAssign),
            '%' => self.with_assign(Percent, PercentAssign),
            '=' => self.with_assign(Assign, EqEq),
            '<' => self.with_assign(Less, LessEq),
            '>' => self.with_assign(Greater, GreaterEq),
            '!' => match self.peek() {
                Some('=') => self.advance_with(NotEq),
                _ => TokenKind::Error(self::Error::UnexpectedChar),
            },
            '(' => LParen,
            ')' => RParen,
            ':' => Colon,
            c if c.is_ascii_alphabetic() || c == '_' => self.identifier_or_keyword(),
            c if c.is_ascii_digit() => self.number(),
            _ => TokenKind::Error(self::Error::UnexpectedChar),
        };
        Some(kind)
    }

    /// Picks `assign` if the current character is followed by `=`.
    fn with_assign(&mut self, bare: TokenKind, assign: TokenKind) -> TokenKind {
        match self.peek() {
            Some('=') => self.advance_with(assign),
            _ => bare,
        }
    }

    fn identifier_or_keyword(&mut self) -> TokenKind {
        let valid_identifier_suffix = |c: char| c.is_ascii_alphanumeric() || c == '_';

        while self.peek().is_some_and(valid_identifier_suffix) {
            self.advance();
        }
        KEYWORDS
            .get(self.substr())
            .copied()
            .unwrap_or(TokenKind::Identifier)
    }

    fn number(&mut self) -> TokenKind {
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }
        TokenKind::Number
    }

    fn whitespace(&mut self) {
        while matches!(self.peek(), Some(' ' | '\t' | '\r')) {
            self.advance();
        }
    }

    /// Skips up to (but not including) the line break, which still
    /// terminates the statement.
    fn comment(&mut self) {
        while self.peek().is_some_and(|c| c != '\n') {
            self.advance();
        }
    }
}

impl Lexer<'_> {
    /// Starts a new token "mark" and advances the iterator.
    fn mark_advance(&mut self) -> Option<char> {
        self.current_lo = self.cursor;
        self.advance()
    }

    /// Returns the next character and advances the iterator. `None` once the
    /// input is exhausted.
    fn advance(&mut self) -> Option<char> {
        self.iter.next().inspect(|c| self.cursor += c.len_utf8())
    }

    /// Advances and returns the provided value.
    fn advance_with<T>(&mut self, value: T) -> T {
        self.advance();
        value
    }

    /// Returns the next character without advancing the iterator.
    fn peek(&mut self) -> Option<char> {
        self.iter.peek().copied()
    }

    /// Returns the current span.
    fn span(&self) -> Span {
        Span::new_of_bounds(self.current_lo..self.cursor)
    }

    /// Returns the substring of the current marked bounds.
    fn substr(&self) -> &str {
        self.span().substr(self.src)
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        if self.finished {
            return None;
        }
        let token = self.next_token();
        self.finished = token.is_eof();
        Some(token)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Error {
    UnexpectedChar,
}

pub mod extract {
    use super::*;

    pub fn int(token: Token, src: &str) -> Result<i64, ParseIntError> {
        debug_assert_eq!(token.kind, TokenKind::Number);
        token.text(src).parse()
    }

    pub fn ident(token: Token, src: &str) -> &str {
        debug_assert_eq!(token.kind, TokenKind::Identifier);
        token.text(src)
    }
}
