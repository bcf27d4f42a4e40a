use std::fmt::{self, Write};

use crate::{ast::*, util::intern::Interner};

const INDENT_WIDTH: usize = 2;

pub fn print_program_string(idents: &Interner<str>, program: &Program) -> String {
    let mut buf = String::with_capacity(1024);
    print_program(&mut buf, idents, program).expect("writing to a String is infallible");
    buf
}

pub fn print_expr_string(idents: &Interner<str>, expr: &Expr) -> String {
    let mut buf = String::with_capacity(512);
    print_expr(&mut buf, idents, 0, expr).expect("writing to a String is infallible");
    buf
}

pub fn print_program(w: &mut impl Write, idents: &Interner<str>, program: &Program) -> fmt::Result {
    print_block(w, idents, 0, &program.body)
}

fn print_stmt(w: &mut impl Write, idents: &Interner<str>, i: usize, stmt: &Stmt) -> fmt::Result {
    let span = stmt.span;
    match &stmt.kind {
        StmtKind::Let {
            name,
            ty,
            initializer,
        } => {
            sp(w, i)?;
            let name = idents.get(name.name);
            match ty {
                Some(ty) => writeln!(w, "let {name}: {ty} ({span})")?,
                None => writeln!(w, "let {name} ({span})")?,
            }
            if let Some(initializer) = initializer {
                print_expr(w, idents, i + 1, initializer)?;
            }
        }
        StmtKind::Const { name, initializer } => {
            sp(w, i)?;
            writeln!(w, "const {} ({span})", idents.get(name.name))?;
            print_expr(w, idents, i + 1, initializer)?;
        }
        StmtKind::Exit(status) => {
            sp(w, i)?;
            writeln!(w, "exit ({span})")?;
            print_expr(w, idents, i + 1, status)?;
        }
        StmtKind::If {
            branches,
            otherwise,
        } => {
            sp(w, i)?;
            writeln!(w, "if ({span})")?;
            for branch in branches {
                print_section(w, i + 1, "cond")?;
                print_expr(w, idents, i + 2, &branch.condition)?;
                print_section(w, i + 1, "then")?;
                print_block(w, idents, i + 2, &branch.body)?;
            }
            if let Some(body) = otherwise {
                print_section(w, i + 1, "else")?;
                print_block(w, idents, i + 2, body)?;
            }
        }
        StmtKind::While { condition, body } => {
            sp(w, i)?;
            writeln!(w, "while ({span})")?;
            print_section(w, i + 1, "cond")?;
            print_expr(w, idents, i + 2, condition)?;
            print_section(w, i + 1, "do")?;
            print_block(w, idents, i + 2, body)?;
        }
        StmtKind::For {
            init,
            condition,
            update,
            body,
        } => {
            sp(w, i)?;
            writeln!(w, "for ({span})")?;
            print_section(w, i + 1, "init")?;
            print_stmt(w, idents, i + 2, init)?;
            print_section(w, i + 1, "cond")?;
            print_expr(w, idents, i + 2, condition)?;
            print_section(w, i + 1, "update")?;
            print_stmt(w, idents, i + 2, update)?;
            print_section(w, i + 1, "do")?;
            print_block(w, idents, i + 2, body)?;
        }
        StmtKind::Break => {
            sp(w, i)?;
            writeln!(w, "break ({span})")?;
        }
        StmtKind::Continue => {
            sp(w, i)?;
            writeln!(w, "continue ({span})")?;
        }
        StmtKind::Expr(expr) => print_expr(w, idents, i, expr)?,
    }
    Ok(())
}

fn print_block(w: &mut impl Write, idents: &Interner<str>, i: usize, body: &[Stmt]) -> fmt::Result {
    for stmt in body {
        print_stmt(w, idents, i, stmt)?;
    }
    Ok(())
}

fn print_section(w: &mut impl Write, i: usize, name: &str) -> fmt::Result {
    sp(w, i)?;
    writeln!(w, "{name}")
}

pub fn print_expr(
    w: &mut impl Write,
    idents: &Interner<str>,
    i: usize,
    expr: &Expr,
) -> fmt::Result {
    sp(w, i)?;
    let span = expr.span;
    match &expr.kind {
        ExprKind::Assignment { target, op, value } => {
            let target = idents.get(target.name);
            match op {
                AssignOperator::Assign => writeln!(w, "assignment {target} ({span})")?,
                AssignOperator::Compound(op) => {
                    writeln!(w, "assignment {target} {op:?} ({span})")?;
                }
            }
            print_expr(w, idents, i + 1, value)?;
        }
        ExprKind::Unary {
            op,
            expr: inner_expr,
        } => {
            writeln!(w, "unary {op:?} ({span})")?;
            print_expr(w, idents, i + 1, inner_expr)?;
        }
        ExprKind::Binary { op, lhs, rhs } => {
            writeln!(w, "binary {op:?} ({span})")?;
            print_expr(w, idents, i + 1, lhs)?;
            print_expr(w, idents, i + 1, rhs)?;
        }
        ExprKind::Paren(inner_expr) => {
            writeln!(w, "paren ({span})")?;
            print_expr(w, idents, i + 1, inner_expr)?;
        }
        ExprKind::Id(ident) => {
            writeln!(w, "ident {} ({span})", idents.get(ident.name))?;
        }
        ExprKind::Int(val) => {
            writeln!(w, "int {val} ({span})")?;
        }
        ExprKind::Bool(val) => {
            writeln!(w, "bool {val} ({span})")?;
        }
    }
    Ok(())
}

fn sp(w: &mut impl Write, i: usize) -> fmt::Result {
    write!(w, "{:width$}", "", width = i * INDENT_WIDTH)
}
