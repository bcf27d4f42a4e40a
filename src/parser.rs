use tracing::{debug, trace};

use crate::{
    ast::{
        AssignOperator, BinaryOperator, Branch, Expr, ExprKind, Ident, Program, Stmt, StmtKind,
        UnaryOperator,
    },
    lexer::{self, extract, Lexer},
    symbols::{DeclareError, Mutability, SymbolTable},
    token::{Spanned, Token, TokenKind},
    types::{self, Type},
    util::intern::{Interned, Interner},
};

type Result<T, E = ()> = std::result::Result<T, E>;

/// Either the parsed element or every syntax error found while parsing it.
pub type ParseResult<T> = Result<T, Vec<Spanned<Error>>>;

/// How deep expressions and blocks may nest.
pub const MAX_DEPTH: u32 = 256;

/// Keywords that close a block.
const BLOCK_END: &[TokenKind] = &[
    TokenKind::Elif,
    TokenKind::Else,
    TokenKind::EndIf,
    TokenKind::EndWhile,
    TokenKind::EndFor,
];

/// Where a failed statement inside a block resumes.
const BLOCK_RECOVERY: &[TokenKind] = &[
    TokenKind::EndLine,
    TokenKind::Elif,
    TokenKind::Else,
    TokenKind::EndIf,
    TokenKind::EndWhile,
    TokenKind::EndFor,
];

/// Parses a sequence of statements.
///
/// Declarations are recorded in `symbols`. A failed statement is skipped up to
/// the next statement terminator so that errors in later statements are
/// reported as well.
pub fn parse_program(
    src: &str,
    ident_interner: &mut Interner<str>,
    symbols: &mut SymbolTable,
) -> ParseResult<Program> {
    let mut p = Parser::new(src, ident_interner, symbols);
    let parsed = p.parse_program();
    p.finish(parsed)
}

/// Parses a single expression, which must span the whole input. Stops at the
/// first error.
pub fn parse_expr(
    src: &str,
    ident_interner: &mut Interner<str>,
    symbols: &mut SymbolTable,
) -> ParseResult<Expr> {
    let mut p = Parser::new(src, ident_interner, symbols);
    let parsed = p.parse_root_expr();
    p.finish(parsed)
}

struct Parser<'src, 'ctx> {
    src: &'src str,
    lexer: Lexer<'src>,
    /// One token of lookahead.
    current: Token,
    ident_interner: &'ctx mut Interner<str>,
    symbols: &'ctx mut SymbolTable,
    errors: Vec<Spanned<Error>>,
    depth: u32,
    /// Set once the nesting limit is hit. No recovery is attempted after it.
    aborted: bool,
}

impl Parser<'_, '_> {
    fn parse_program(&mut self) -> Result<Program> {
        let mut body = Vec::with_capacity(16);
        loop {
            while self.take(TokenKind::EndLine) {}
            if self.is(TokenKind::Eof) {
                break;
            }
            match self.parse_statement() {
                Ok(stmt) => body.push(stmt),
                Err(()) if self.aborted => break,
                Err(()) => self.synchronize(&[TokenKind::EndLine]),
            }
        }
        debug!(
            statements = body.len(),
            errors = self.errors.len(),
            "parsed program"
        );
        Ok(Program { body })
    }

    fn parse_root_expr(&mut self) -> Result<Expr> {
        let expr = self.parse_expr()?;
        while self.take(TokenKind::EndLine) {}
        self.consume(TokenKind::Eof)?;
        Ok(expr)
    }

    /// Parses a statement and its terminator, then declares the name it binds.
    /// A block closing keyword also ends a statement, as in `if c: exit 1 endif`.
    fn parse_statement(&mut self) -> Result<Stmt> {
        let stmt = self.parse_bare_statement()?;
        let at_end = self.is(TokenKind::EndLine)
            || self.is(TokenKind::Eof)
            || BLOCK_END.contains(&self.current.kind);
        if !at_end {
            self.unexpected(Some(TokenKind::EndLine));
            return Err(());
        }
        self.declare_from(&stmt)?;
        Ok(stmt)
    }

    /// Parses a statement without its terminator.
    fn parse_bare_statement(&mut self) -> Result<Stmt> {
        let start = self.at();
        let stmt = match start.kind {
            // Let: let ID [: type] [= expr]
            TokenKind::Let => {
                self.eat();
                let name = self.parse_ident()?;
                let mut end = name.span;
                let ty = if self.take(TokenKind::Colon) {
                    let ty = self.parse_type()?;
                    end = ty.span;
                    Some(ty.inner)
                } else {
                    None
                };
                let initializer = if self.take(TokenKind::Assign) {
                    let initializer = self.parse_expr()?;
                    end = initializer.span;
                    Some(initializer)
                } else {
                    None
                };
                Stmt {
                    kind: StmtKind::Let {
                        name,
                        ty,
                        initializer,
                    },
                    span: start.span().to(end),
                }
            }

            // Const: const ID = expr
            TokenKind::Const => {
                self.eat();
                let name = self.parse_ident()?;
                self.consume(TokenKind::Assign)?;
                let initializer = self.parse_expr()?;
                let end = initializer.span;
                Stmt {
                    kind: StmtKind::Const { name, initializer },
                    span: start.span().to(end),
                }
            }

            // Exit: exit expr
            TokenKind::Exit => {
                self.eat();
                let status = self.parse_expr()?;
                let span = start.span().to(status.span);
                Stmt {
                    kind: StmtKind::Exit(status),
                    span,
                }
            }

            // If: if expr : block (elif expr : block)* [else : block] endif
            TokenKind::If => {
                self.eat();
                let mut branches = vec![self.parse_branch()?];
                while self.take(TokenKind::Elif) {
                    branches.push(self.parse_branch()?);
                }
                let otherwise = if self.take(TokenKind::Else) {
                    self.consume(TokenKind::Colon)?;
                    Some(self.parse_block()?)
                } else {
                    None
                };
                let end = self.consume(TokenKind::EndIf)?;
                Stmt {
                    kind: StmtKind::If {
                        branches,
                        otherwise,
                    },
                    span: start.span().to(end.span()),
                }
            }

            // While: while expr : block endwhile
            TokenKind::While => {
                self.eat();
                let condition = self.parse_expr()?;
                self.consume(TokenKind::Colon)?;
                let body = self.parse_block()?;
                let end = self.consume(TokenKind::EndWhile)?;
                Stmt {
                    kind: StmtKind::While { condition, body },
                    span: start.span().to(end.span()),
                }
            }

            // For: for stmt ; expr ; stmt : block endfor
            TokenKind::For => {
                self.eat();
                let init = self.nested(Self::parse_bare_statement)?;
                self.consume(TokenKind::EndLine)?;
                self.declare_from(&init)?;
                let condition = self.parse_expr()?;
                self.consume(TokenKind::EndLine)?;
                let update = self.nested(Self::parse_bare_statement)?;
                self.consume(TokenKind::Colon)?;
                self.declare_from(&update)?;
                let body = self.parse_block()?;
                let end = self.consume(TokenKind::EndFor)?;
                Stmt {
                    kind: StmtKind::For {
                        init: Box::new(init),
                        condition,
                        update: Box::new(update),
                        body,
                    },
                    span: start.span().to(end.span()),
                }
            }

            TokenKind::Break => {
                self.eat();
                Stmt {
                    kind: StmtKind::Break,
                    span: start.span(),
                }
            }
            TokenKind::Continue => {
                self.eat();
                Stmt {
                    kind: StmtKind::Continue,
                    span: start.span(),
                }
            }

            _ => {
                let expr = self.parse_expr()?;
                Stmt {
                    span: expr.span,
                    kind: StmtKind::Expr(expr),
                }
            }
        };
        Ok(stmt)
    }

    /// Parses `expr : block`, the condition and body of `if` or `elif`.
    fn parse_branch(&mut self) -> Result<Branch> {
        let condition = self.parse_expr()?;
        self.consume(TokenKind::Colon)?;
        let body = self.parse_block()?;
        Ok(Branch { condition, body })
    }

    /// Parses statements up to a block closing keyword or the end of input,
    /// which the caller then checks.
    fn parse_block(&mut self) -> Result<Vec<Stmt>> {
        self.nested(|p| {
            let mut body = Vec::new();
            loop {
                while p.take(TokenKind::EndLine) {}
                if p.is(TokenKind::Eof) || BLOCK_END.contains(&p.current.kind) {
                    break;
                }
                match p.parse_statement() {
                    Ok(stmt) => body.push(stmt),
                    Err(()) if p.aborted => return Err(()),
                    Err(()) => p.synchronize(BLOCK_RECOVERY),
                }
            }
            Ok(body)
        })
    }

    fn parse_ident(&mut self) -> Result<Ident> {
        let token = self.consume(TokenKind::Identifier)?;
        Ok(self.ident(token))
    }

    /// Type names are plain identifiers.
    fn parse_type(&mut self) -> Result<Spanned<Type>> {
        let token = self.consume(TokenKind::Identifier)?;
        let name = extract::ident(token, self.src);
        if let Some(ty) = Type::from_name(name) {
            return Ok(token.span().wrap(ty));
        }
        let name = self.ident_interner.intern(name);
        self.error(token.span().wrap(Error::UnknownType { name }));
        Err(())
    }

    fn parse_expr(&mut self) -> Result<Expr> {
        self.parse_expr_bp(0)
    }

    /// Precedence climbing: keeps folding `(operator, operand)` pairs into the
    /// left operand while the operator binds at least as tight as `min_bp`.
    fn parse_expr_bp(&mut self, min_bp: u8) -> Result<Expr> {
        self.nested(|p| {
            let mut lhs = p.parse_primary()?;

            loop {
                let op_token = p.at();
                let Some((infix, lbp, rbp)) = Self::infix_binding_power(op_token.kind) else {
                    // Not an infix operator
                    break;
                };
                if lbp < min_bp {
                    // Operator binds less tightly than the minimum required
                    break;
                }

                p.eat(); // Operator
                lhs = p.parse_infix(infix, lhs, rbp)?;
            }

            Ok(lhs)
        })
    }

    /// Parses the tokens that may start an expression: literals, identifiers,
    /// grouping and prefix operators.
    fn parse_primary(&mut self) -> Result<Expr> {
        let token = self.at();
        trace!(kind = ?token.kind, span = %token.span(), "parse_primary");

        let (kind, span) = match token.kind {
            TokenKind::Number => {
                self.eat();
                let Ok(parsed) = extract::int(token, self.src) else {
                    self.error(token.span().wrap(Error::ParseInt));
                    return Err(());
                };
                (ExprKind::Int(parsed), token.span())
            }
            TokenKind::Identifier => {
                self.eat();
                (ExprKind::Id(self.ident(token)), token.span())
            }
            TokenKind::True => {
                self.eat();
                (ExprKind::Bool(true), token.span())
            }
            TokenKind::False => {
                self.eat();
                (ExprKind::Bool(false), token.span())
            }

            // Grouping: ( expr )
            TokenKind::LParen => {
                self.eat();
                let expr = self.parse_expr()?;
                let end = self.consume(TokenKind::RParen)?;
                (ExprKind::Paren(Box::new(expr)), token.span().to(end.span()))
            }

            // Prefix operators: -, not
            kind @ (TokenKind::Minus | TokenKind::Not) => {
                self.eat();
                let op = if kind == TokenKind::Minus {
                    UnaryOperator::Neg
                } else {
                    UnaryOperator::Not
                };
                let expr = self.parse_expr_bp(Self::prefix_binding_power(op))?;
                let span = token.span().to(expr.span);
                let unary = ExprKind::Unary {
                    op,
                    expr: Box::new(expr),
                };
                (unary, span)
            }

            _ => {
                self.unexpected(None);
                return Err(());
            }
        };

        Ok(Expr { kind, span })
    }

    fn parse_infix(&mut self, infix: Infix, lhs: Expr, rbp: u8) -> Result<Expr> {
        let (kind, span) = match infix {
            Infix::Binary(op) => {
                let rhs = self.parse_expr_bp(rbp)?;
                let span = lhs.span.to(rhs.span);
                let binary = ExprKind::Binary {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                };
                (binary, span)
            }

            // Assignment: ID op expr
            Infix::Assign(op) => {
                let ExprKind::Id(target) = lhs.kind else {
                    self.error(lhs.span.wrap(Error::InvalidAssignmentTarget));
                    return Err(());
                };
                let value = self.parse_expr_bp(rbp)?;
                let span = lhs.span.to(value.span);
                let assign = ExprKind::Assignment {
                    target,
                    op,
                    value: Box::new(value),
                };
                (assign, span)
            }
        };

        Ok(Expr { kind, span })
    }

    fn infix_binding_power(kind: TokenKind) -> Option<(Infix, u8, u8)> {
        use BinaryOperator::*;
        let (infix, (lbp, rbp)) = match kind {
            // Assignment (right-associative)
            TokenKind::Assign => (Infix::Assign(AssignOperator::Assign), (2, 1)),
            TokenKind::PlusAssign => (Infix::compound(Add), (2, 1)),
            TokenKind::MinusAssign => (Infix::compound(Sub), (2, 1)),
            TokenKind::StarAssign => (Infix::compound(Mul), (2, 1)),
            TokenKind::SlashAssign => (Infix::compound(Div), (2, 1)),
            TokenKind::PercentAssign => (Infix::compound(Mod), (2, 1)),

            // Logical (left-associative)
            TokenKind::Or => (Infix::Binary(Or), (3, 4)),
            TokenKind::Xor => (Infix::Binary(Xor), (3, 4)),
            TokenKind::And => (Infix::Binary(And), (5, 6)),

            // Comparisons (left-associative)
            TokenKind::EqEq => (Infix::Binary(Eq), (7, 8)),
            TokenKind::NotEq => (Infix::Binary(Ne), (7, 8)),
            TokenKind::Less => (Infix::Binary(Lt), (7, 8)),
            TokenKind::LessEq => (Infix::Binary(Le), (7, 8)),
            TokenKind::Greater => (Infix::Binary(Gt), (7, 8)),
            TokenKind::GreaterEq => (Infix::Binary(Ge), (7, 8)),

            // Addition/Subtraction (left-associative)
            TokenKind::Plus => (Infix::Binary(Add), (9, 10)),
            TokenKind::Minus => (Infix::Binary(Sub), (9, 10)),

            // Multiplication/Division/Modulo (left-associative)
            TokenKind::Star => (Infix::Binary(Mul), (11, 12)),
            TokenKind::Slash => (Infix::Binary(Div), (11, 12)),
            TokenKind::Percent => (Infix::Binary(Mod), (11, 12)),

            _ => return None,
        };
        Some((infix, lbp, rbp))
    }

    fn prefix_binding_power(op: UnaryOperator) -> u8 {
        match op {
            // Below comparisons, so `not a == b` negates the comparison.
            UnaryOperator::Not => 7,
            UnaryOperator::Neg => 13,
        }
    }
}

impl<'src, 'ctx> Parser<'src, 'ctx> {
    fn new(
        src: &'src str,
        ident_interner: &'ctx mut Interner<str>,
        symbols: &'ctx mut SymbolTable,
    ) -> Parser<'src, 'ctx> {
        let mut lexer = Lexer::new(src);
        let current = lexer.next_token();
        Parser {
            src,
            lexer,
            current,
            ident_interner,
            symbols,
            errors: Vec::with_capacity(8),
            depth: 0,
            aborted: false,
        }
    }

    fn finish<T>(self, parsed: Result<T>) -> ParseResult<T> {
        match parsed {
            Ok(el) if self.errors.is_empty() => Ok(el),
            _ => {
                assert!(!self.errors.is_empty(), "failed without an error");
                Err(self.errors)
            }
        }
    }

    /// Adds an error.
    fn error(&mut self, error: Spanned<Error>) {
        debug!(?error, "syntax error");
        self.errors.push(error);
    }

    /// Records an error for the current token, which didn't fit where it is.
    fn unexpected(&mut self, expected: Option<TokenKind>) {
        let c = self.at();
        let error = match (c.kind, expected) {
            (TokenKind::Error(error), _) => Error::Lexer(error),
            (actual, Some(expected)) => Error::Unexpected { actual, expected },
            (token, None) => Error::UnexpectedToken { token },
        };
        self.error(c.span().wrap(error));
    }

    /// Returns the current token.
    fn at(&self) -> Token {
        self.current
    }

    /// Returns the current token and advances. The lexer is only asked for
    /// the next token here.
    fn eat(&mut self) -> Token {
        let c = self.current;
        trace!(kind = ?c.kind, span = %c.span(), "eat");
        if !c.is_eof() {
            self.current = self.lexer.next_token();
        }
        c
    }

    /// Checks whether the current token matches the given one.
    fn is(&self, expect: TokenKind) -> bool {
        self.current.kind == expect
    }

    /// Advances if the current token matches the provided one, returning true.
    /// If not, returns false and doesn't advance.
    fn take(&mut self, expect: TokenKind) -> bool {
        if self.is(expect) {
            self.eat();
            true
        } else {
            false
        }
    }

    /// Advances if the current token matches the provided one. If not,
    /// records an error.
    fn consume(&mut self, expect: TokenKind) -> Result<Token> {
        if self.is(expect) {
            Ok(self.eat())
        } else {
            self.unexpected(Some(expect));
            Err(())
        }
    }

    /// Skips tokens until one of `stop` (or the end of input) is current. The
    /// stop token itself is not consumed.
    fn synchronize(&mut self, stop: &[TokenKind]) {
        while !self.is(TokenKind::Eof) && !stop.contains(&self.current.kind) {
            self.eat();
        }
    }

    fn ident(&mut self, token: Token) -> Ident {
        Ident {
            name: self.ident_interner.intern(extract::ident(token, self.src)),
            span: token.span(),
        }
    }

    /// Runs `parse` one nesting level deeper, failing past [`MAX_DEPTH`].
    fn nested<T>(&mut self, parse: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        if self.depth >= MAX_DEPTH {
            let span = self.at().span();
            self.error(span.wrap(Error::TooDeep));
            self.aborted = true;
            return Err(());
        }
        self.depth += 1;
        let parsed = parse(self);
        self.depth -= 1;
        parsed
    }

    /// Declares the name bound by a `let` or `const` statement, visible from
    /// the end of the statement on.
    fn declare_from(&mut self, stmt: &Stmt) -> Result<()> {
        let visible_from = stmt.span.hi();
        match &stmt.kind {
            StmtKind::Let {
                name,
                ty,
                initializer,
            } => {
                let ty = match (ty, initializer) {
                    (Some(ty), _) => *ty,
                    (None, Some(initializer)) => types::infer(initializer, self.symbols),
                    (None, None) => Type::Int,
                };
                self.declare(*name, Mutability::Mutable, ty, visible_from)
            }
            StmtKind::Const { name, initializer } => {
                let ty = types::infer(initializer, self.symbols);
                self.declare(*name, Mutability::Constant, ty, visible_from)
            }
            _ => Ok(()),
        }
    }

    /// Declares `name`; a name may only be declared once per compilation.
    fn declare(
        &mut self,
        name: Ident,
        mutability: Mutability,
        ty: Type,
        visible_from: usize,
    ) -> Result<()> {
        let error = match self.symbols.declare(name.name, mutability, ty, visible_from) {
            Ok(_) => return Ok(()),
            Err(DeclareError::Redeclared(_)) => Error::Redeclared { name: name.name },
            Err(DeclareError::FrameFull) => Error::TooManyVariables,
        };
        self.error(name.span.wrap(error));
        Err(())
    }
}

#[derive(Copy, Clone)]
enum Infix {
    Binary(BinaryOperator),
    Assign(AssignOperator),
}

impl Infix {
    fn compound(op: BinaryOperator) -> Infix {
        Infix::Assign(AssignOperator::Compound(op))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    InvalidAssignmentTarget,
    /// The token can't start an expression.
    UnexpectedToken {
        token: TokenKind,
    },
    Unexpected {
        actual: TokenKind,
        expected: TokenKind,
    },
    Redeclared {
        name: Interned<str>,
    },
    ParseInt,
    /// Not `int` or `bool`.
    UnknownType {
        name: Interned<str>,
    },
    /// Expressions or blocks nested deeper than [`MAX_DEPTH`].
    TooDeep,
    TooManyVariables,
    Lexer(lexer::Error),
}
