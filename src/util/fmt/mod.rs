use std::fmt;

use crate::{token::Span, util::intern::Interner};

pub mod error;
pub mod tree;

/// Everything needed to render a diagnostic: the source it points into and the
/// interner its identifiers come from.
pub struct Context<'a> {
    pub src: &'a str,
    pub ident_interner: &'a Interner<str>,
}

impl Context<'_> {
    pub fn position(&self, span: Span) -> Position {
        Position::of(self.src, span.lo)
    }
}

/// Analogous to [`std::fmt::Display`], but also contains the program context,
/// such as the current [`Interner`].
pub trait Show {
    fn show(&self, f: &mut fmt::Formatter<'_>, ctx: &Context<'_>) -> fmt::Result;

    /// Returns a type which can be displayed.
    fn display(&self, ctx: &Context<'_>) -> impl fmt::Display
    where
        Self: Sized,
    {
        Display(self, ctx)
    }
}

struct Display<'this, 'ctx, 'a, T: Show>(&'this T, &'ctx Context<'a>);

impl<T> fmt::Display for Display<'_, '_, '_, T>
where
    T: Show,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Display(this, ctx) = self;
        this.show(f, ctx)
    }
}

/// A 1-based line and column. Columns count characters, not bytes.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    /// Position of the byte offset `lo` in `src`. Offsets past the end map to
    /// the position right after the last character.
    pub fn of(src: &str, lo: usize) -> Position {
        let before = src.get(..lo).unwrap_or(src);
        let line_start = before.rfind('\n').map_or(0, |i| i + 1);
        Position {
            line: before.matches('\n').count() + 1,
            column: before[line_start..].chars().count() + 1,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}
