use std::{fmt, ops::Range};

use crate::lexer;

#[derive(Copy, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    lo: usize,
    len: u32,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Token {
        Token {
            kind,
            len: span.len,
            lo: span.lo,
        }
    }

    pub fn span(&self) -> Span {
        Span {
            len: self.len,
            lo: self.lo,
        }
    }

    /// Returns the literal text of this token.
    pub fn text<'src>(&self, src: &'src str) -> &'src str {
        self.span().substr(src)
    }

    pub fn is_eof(&self) -> bool {
        self.kind == TokenKind::Eof
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Token({:?}, {})", self.kind, self.span())
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct Span {
    pub len: u32,
    pub lo: usize,
}

impl Span {
    pub fn new_of_bounds(Range { start: lo, end: hi }: Range<usize>) -> Span {
        debug_assert!(hi >= lo);
        Self::new_of_length(lo, u32::try_from(hi - lo).unwrap())
    }

    pub fn new_of_length(lo: usize, len: u32) -> Span {
        Span { len, lo }
    }

    pub fn hi(&self) -> usize {
        self.lo + self.len as usize
    }

    /// Returns a span which starts at `self` and finishes at `other`.
    pub fn to(self, other: Span) -> Span {
        Span::new_of_bounds(self.lo..other.hi().max(self.lo))
    }

    pub fn substr(self, src: &str) -> &str {
        &src[self.lo..self.hi()]
    }

    pub fn wrap<T>(self, inner: T) -> Spanned<T> {
        Spanned { span: self, inner }
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Span({self}, len: {})", self.len)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lo = self.lo;
        let hi = self.hi();
        write!(f, "{lo}..{hi}")
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Spanned<T> {
    pub span: Span,
    pub inner: T,
}

impl<T> Spanned<T> {
    /// Maps the inner value, keeping the span.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Spanned<U> {
        self.span.wrap(f(self.inner))
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Let,
    Const,
    Exit,
    True,
    False,
    And,
    Or,
    Xor,
    Not,
    If,
    Elif,
    Else,
    EndIf,
    While,
    EndWhile,
    For,
    EndFor,
    Break,
    Continue,

    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    /// `=`
    Assign,
    /// `+=`
    PlusAssign,
    /// `-=`
    MinusAssign,
    /// `*=`
    StarAssign,
    /// `/=`
    SlashAssign,
    /// `%=`
    PercentAssign,
    /// `==`
    EqEq,
    /// `!=`
    NotEq,
    Less,
    LessEq,
    Greater,
    GreaterEq,
    LParen,
    RParen,
    /// Opens a block, or introduces a type annotation.
    Colon,

    Identifier,
    Number,

    /// Statement terminator: either `;` or a line break.
    EndLine,
    Eof,
    Error(lexer::Error),
}

impl TokenKind {
    /// A short human readable name, used when a token of this kind was
    /// expected but something else was found.
    pub fn describe(&self) -> &'static str {
        use TokenKind::*;
        match self {
            Let => "`let`",
            Const => "`const`",
            Exit => "`exit`",
            True => "`true`",
            False => "`false`",
            And => "`and`",
            Or => "`or`",
            Xor => "`xor`",
            Not => "`not`",
            If => "`if`",
            Elif => "`elif`",
            Else => "`else`",
            EndIf => "`endif`",
            While => "`while`",
            EndWhile => "`endwhile`",
            For => "`for`",
            EndFor => "`endfor`",
            Break => "`break`",
            Continue => "`continue`",
            Plus => "`+`",
            Minus => "`-`",
            Star => "`*`",
            Slash => "`/`",
            Percent => "`%`",
            Assign => "`=`",
            PlusAssign => "`+=`",
            MinusAssign => "`-=`",
            StarAssign => "`*=`",
            SlashAssign => "`/=`",
            PercentAssign => "`%=`",
            EqEq => "`==`",
            NotEq => "`!=`",
            Less => "`<`",
            LessEq => "`<=`",
            Greater => "`>`",
            GreaterEq => "`>=`",
            LParen => "`(`",
            RParen => "`)`",
            Colon => "`:`",
            Identifier => "identifier",
            Number => "number",
            EndLine => "`;` or line break",
            Eof => "end of input",
            Error(_) => "invalid token",
        }
    }
}

pub static KEYWORDS: phf::Map<&'static str, TokenKind> = phf::phf_map! {
    "let" => TokenKind::Let,
    "const" => TokenKind::Const,
    "exit" => TokenKind::Exit,
    "true" => TokenKind::True,
    "false" => TokenKind::False,
    "and" => TokenKind::And,
    "or" => TokenKind::Or,
    "xor" => TokenKind::Xor,
    "not" => TokenKind::Not,
    "if" => TokenKind::If,
    "elif" => TokenKind::Elif,
    "else" => TokenKind::Else,
    "endif" => TokenKind::EndIf,
    "while" => TokenKind::While,
    "endwhile" => TokenKind::EndWhile,
    "for" => TokenKind::For,
    "endfor" => TokenKind::EndFor,
    "break" => TokenKind::Break,
    "continue" => TokenKind::Continue,
};
