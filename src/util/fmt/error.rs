#![allow(clippy::items_after_statements)]

use std::fmt;

use crate::{
    codegen, lexer, parser,
    token::{Span, Spanned, TokenKind},
    types::{self, Operands, Type},
    util::fmt::{Context, Show},
    Diagnostic,
};

impl Show for Spanned<parser::Error> {
    fn show(&self, f: &mut fmt::Formatter<'_>, ctx: &Context<'_>) -> fmt::Result {
        let i = ctx.ident_interner;
        let Spanned { span, inner: error } = self;

        if f.alternate() {
            write!(f, "{}: ", ctx.position(*span))?;
        }

        use parser::Error::*;
        match error {
            InvalidAssignmentTarget => write!(f, "invalid assignment target"),
            UnexpectedToken { token } => {
                let found = Found::new(*token, *span, ctx.src);
                write!(f, "unexpected {found}")
            }
            Unexpected { actual, expected } => {
                let found = Found::new(*actual, *span, ctx.src);
                let expected = expected.describe();
                write!(f, "expected {expected}, but found {found}")
            }
            Redeclared { name } => {
                let name = i.get(*name);
                write!(f, "{name} is already declared")
            }
            ParseInt => write!(f, "number literal out of range"),
            UnknownType { name } => {
                let name = i.get(*name);
                write!(f, "unknown type {name}")
            }
            TooDeep => write!(f, "nested too deeply"),
            TooManyVariables => write!(f, "too many variables"),
            Lexer(lexer::Error::UnexpectedChar) => {
                let text = text(*span, ctx.src).escape_debug();
                write!(f, "unexpected character {text}")
            }
        }
    }
}

impl Show for Spanned<codegen::Error> {
    fn show(&self, f: &mut fmt::Formatter<'_>, ctx: &Context<'_>) -> fmt::Result {
        let i = ctx.ident_interner;
        let Spanned { span, inner: error } = self;

        if f.alternate() {
            write!(f, "{}: ", ctx.position(*span))?;
        }

        match error {
            codegen::Error::UndefinedIdentifier(name) => {
                let name = i.get(*name);
                write!(f, "{name} is not defined")
            }
            codegen::Error::AssignToConstant(name) => {
                let name = i.get(*name);
                write!(f, "cannot assign to constant {name}")
            }
            codegen::Error::TypeMismatch { expected, found } => {
                write!(f, "expected {expected}, but found {found}")
            }
            codegen::Error::InvalidOperands { op, lhs, rhs } => {
                let what = match types::operands(*op) {
                    Operands::Int if types::binary_result(*op) == Type::Int => {
                        "do math operations on"
                    }
                    Operands::Int | Operands::Same => "compare",
                    Operands::Bool => "do logical operations on",
                };
                write!(f, "cannot {what} {lhs} and {rhs}")
            }
            codegen::Error::BreakOutsideLoop => write!(f, "break outside of a loop"),
            codegen::Error::ContinueOutsideLoop => write!(f, "continue outside of a loop"),
        }
    }
}

impl Show for Spanned<Diagnostic> {
    fn show(&self, f: &mut fmt::Formatter<'_>, ctx: &Context<'_>) -> fmt::Result {
        let span = self.span;
        match &self.inner {
            Diagnostic::Syntax(error) => span.wrap(error.clone()).show(f, ctx),
            Diagnostic::Codegen(error) => span.wrap(error.clone()).show(f, ctx),
        }
    }
}

/// Describes the token found where something else was expected.
struct Found<'src> {
    kind: TokenKind,
    text: &'src str,
}

impl Found<'_> {
    fn new(kind: TokenKind, span: Span, src: &str) -> Found<'_> {
        Found {
            kind,
            text: text(span, src),
        }
    }
}

impl fmt::Display for Found<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.kind, self.text) {
            (TokenKind::Eof, _) => f.write_str("end of input"),
            (TokenKind::EndLine, "\n") => f.write_str("line break"),
            (_, text) => write!(f, "token {text}"),
        }
    }
}

fn text(span: Span, src: &str) -> &str {
    src.get(span.lo..span.hi()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use crate::{
        lexer, parser,
        token::{Span, TokenKind},
        util::{
            fmt::{Context, Show},
            intern::Interner,
        },
        Diagnostic,
    };

    #[test]
    fn test_plain_and_alternate() {
        let interner = Interner::default();
        let src = "1 +\n  )";
        let ctx = Context {
            src,
            ident_interner: &interner,
        };
        let error = Span::new_of_length(6, 1).wrap(parser::Error::UnexpectedToken {
            token: TokenKind::RParen,
        });
        assert_eq!(error.display(&ctx).to_string(), "unexpected token )");
        assert_eq!(format!("{:#}", error.display(&ctx)), "2:3: unexpected token )");
    }

    #[test]
    fn test_diagnostic_delegates() {
        let mut interner = Interner::default();
        let counter = interner.intern("counter");
        let src = "counter = $";
        let ctx = Context {
            src,
            ident_interner: &interner,
        };

        let lexer_error = Span::new_of_length(10, 1)
            .wrap(Diagnostic::Syntax(parser::Error::Lexer(lexer::Error::UnexpectedChar)));
        let undefined = Span::new_of_length(0, 7)
            .wrap(Diagnostic::Codegen(crate::codegen::Error::UndefinedIdentifier(counter)));

        assert_eq!(
            format!("{:#}", lexer_error.display(&ctx)),
            "1:11: unexpected character $"
        );
        assert_eq!(
            format!("{:#}", undefined.display(&ctx)),
            "1:1: counter is not defined"
        );
    }

    #[test]
    fn test_semicolon_is_not_a_line_break() {
        let interner = Interner::default();
        let ctx = Context {
            src: "let x;",
            ident_interner: &interner,
        };
        let error = Span::new_of_length(5, 1).wrap(parser::Error::Unexpected {
            actual: TokenKind::EndLine,
            expected: TokenKind::Assign,
        });
        assert_eq!(
            error.display(&ctx).to_string(),
            "expected `=`, but found token ;"
        );
    }

    #[test]
    fn test_unexpected_character_is_escaped() {
        let interner = Interner::default();
        let ctx = Context {
            src: "1\0$",
            ident_interner: &interner,
        };
        let nul =
            Span::new_of_length(1, 1).wrap(parser::Error::Lexer(lexer::Error::UnexpectedChar));
        assert_eq!(format!("{:#}", nul.display(&ctx)), "1:2: unexpected character \\0");
    }

    #[test]
    fn test_operand_messages() {
        use crate::{ast::BinaryOperator, codegen::Error, types::Type};

        let interner = Interner::default();
        let ctx = Context {
            src: "",
            ident_interner: &interner,
        };
        let message = |op, lhs, rhs| {
            let error = Span::new_of_length(0, 0).wrap(Error::InvalidOperands { op, lhs, rhs });
            let message = error.display(&ctx).to_string();
            message
        };
        assert_eq!(
            message(BinaryOperator::Mod, Type::Bool, Type::Int),
            "cannot do math operations on bool and int"
        );
        assert_eq!(
            message(BinaryOperator::Ge, Type::Int, Type::Bool),
            "cannot compare int and bool"
        );
        assert_eq!(
            message(BinaryOperator::Ne, Type::Bool, Type::Int),
            "cannot compare bool and int"
        );
        assert_eq!(
            message(BinaryOperator::Or, Type::Int, Type::Bool),
            "cannot do logical operations on int and bool"
        );

        let mismatch = Span::new_of_length(0, 0).wrap(Error::TypeMismatch {
            expected: Type::Int,
            found: Type::Bool,
        });
        assert_eq!(mismatch.display(&ctx).to_string(), "expected int, but found bool");
    }
}
