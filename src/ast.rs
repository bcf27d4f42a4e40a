// program ::= (stmt? endline)* eof
// endline ::= ';' | '\n'
// block ::= (stmt? endline)*
// stmt ::= let ID [':' type] ['=' expr]
//        | const ID '=' expr
//        | exit expr
//        | if expr ':' block (elif expr ':' block)* [else ':' block] endif
//        | while expr ':' block endwhile
//        | for stmt endline expr endline stmt ':' block endfor
//        | break
//        | continue
//        | expr
// type ::= int | bool
// expr ::= ID assign_op expr
//        | expr binary_op expr
//        | '-' expr
//        | not expr
//        | '(' expr ')'
//        | ID
//        | integer
//        | true
//        | false
// assign_op ::= '=' | '+=' | '-=' | '*=' | '/=' | '%='
// binary_op ::= or | xor | and | '==' | '!=' | '<' | '<=' | '>' | '>='
//             | '+' | '-' | '*' | '/' | '%'

// Precedence (tightest first)
//
// - (unary)
// * / %
// + -
// == != < <= > >=
// not
// and
// or xor
// = += -= *= /= %=

use crate::{token::Span, types::Type, util::intern::Interned};

#[derive(Debug, PartialEq, Default)]
pub struct Program {
    pub body: Vec<Stmt>,
}

#[derive(Debug, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

#[derive(Debug, PartialEq)]
pub enum StmtKind {
    /// `let x`, `let x: bool` or `let x = expr`. Without an initializer the
    /// slot starts as 0; without an annotation the type is the initializer's,
    /// or `int`.
    Let {
        name: Ident,
        ty: Option<Type>,
        initializer: Option<Expr>,
    },
    Const {
        name: Ident,
        initializer: Expr,
    },
    /// Ends the program, using the value as the exit status.
    Exit(Expr),
    /// Runs the body of the first branch whose condition holds, or the `else`
    /// block if none does.
    If {
        branches: Vec<Branch>,
        otherwise: Option<Vec<Stmt>>,
    },
    While {
        condition: Expr,
        body: Vec<Stmt>,
    },
    /// `continue` jumps to `update`.
    For {
        init: Box<Stmt>,
        condition: Expr,
        update: Box<Stmt>,
        body: Vec<Stmt>,
    },
    Break,
    Continue,
    Expr(Expr),
}

/// An `if` or `elif` arm.
#[derive(Debug, PartialEq)]
pub struct Branch {
    pub condition: Expr,
    pub body: Vec<Stmt>,
}

#[derive(Debug, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

#[derive(Debug, PartialEq)]
pub enum ExprKind {
    Assignment {
        target: Ident,
        op: AssignOperator,
        value: Box<Expr>,
    },
    Unary {
        op: UnaryOperator,
        expr: Box<Expr>,
    },
    Binary {
        op: BinaryOperator,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Paren(Box<Expr>),
    Id(Ident),
    Int(i64),
    Bool(bool),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum UnaryOperator {
    Neg,
    Not,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BinaryOperator {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    Xor,
}

/// `=` stores the value as is; the compound forms combine the current value
/// of the target with the right-hand side first.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AssignOperator {
    Assign,
    Compound(BinaryOperator),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Ident {
    pub name: Interned<str>,
    pub span: Span,
}

impl From<Ident> for Interned<str> {
    fn from(value: Ident) -> Self {
        value.name
    }
}

impl From<&Ident> for Interned<str> {
    fn from(value: &Ident) -> Self {
        value.name
    }
}
