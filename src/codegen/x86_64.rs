use std::{fmt, format_args as f, marker::PhantomData};

use tracing::debug;

use crate::{
    ast::{self, AssignOperator, BinaryOperator, Expr, ExprKind, Stmt, StmtKind, UnaryOperator},
    codegen::{x86_64_env, Error},
    symbols::{Mutability, Slot, Symbol, SymbolTable},
    token::Spanned,
    types::{self, Type},
};

const DEFAULT_CODE_CAPACITY: usize = 4 * 1024; // 4 KiB

/// Instructions are written one per line; labels are not indented.
const INDENT: &str = "    ";

type Result<T, E = Spanned<Error>> = std::result::Result<T, E>;

/// An ordered list of assembly lines.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Asm {
    lines: Vec<String>,
}

impl Asm {
    pub fn new() -> Asm {
        Asm::default()
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Appends a line.
    pub fn out(&mut self, line: impl fmt::Display) {
        self.lines.push(line.to_string());
    }

    /// Appends a label definition, `name:`.
    pub fn label(&mut self, name: &str) {
        self.lines.push(format!("{name}:"));
    }

    /// Appends every line of `other`, in order.
    pub fn append(&mut self, other: Asm) {
        self.lines.extend(other.lines);
    }

    /// Whether `line` defines a label rather than holding an instruction.
    pub fn is_label(line: &str) -> bool {
        line.ends_with(':')
    }
}

impl fmt::Display for Asm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, line) in self.lines.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            f.write_str(line)?;
        }
        Ok(())
    }
}

/// Where the value of an evaluated subtree ends up.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Location {
    /// The `rax` register.
    Accumulator,
    Stack(Slot),
}

/// The instructions computing a subtree, and where they leave its value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Evaluation {
    pub asm: Asm,
    pub location: Location,
    pub ty: Type,
}

/// Jump targets of the innermost enclosing loop.
struct LoopLabels {
    /// Where `continue` goes.
    next: String,
    /// Where `break` goes.
    end: String,
}

/// Emits instructions for statements and expressions, checking operand types
/// on the way. Values are computed in `rax`; the left operand of a binary
/// operator is spilled onto the machine stack while the right one is
/// evaluated, which then sits in `rdi`.
pub struct Emitter<'sym> {
    symbols: &'sym SymbolTable,
    label_prefix: &'static str,
    /// Numbers the labels of each control flow statement.
    next_label: u32,
    loops: Vec<LoopLabels>,
}

impl<'sym> Emitter<'sym> {
    pub fn new(symbols: &'sym SymbolTable) -> Emitter<'sym> {
        Emitter::with_label_prefix(symbols, ".L")
    }

    pub fn with_label_prefix(
        symbols: &'sym SymbolTable,
        label_prefix: &'static str,
    ) -> Emitter<'sym> {
        Emitter {
            symbols,
            label_prefix,
            next_label: 0,
            loops: Vec::new(),
        }
    }

    pub fn expr(&mut self, expr: &Expr) -> Result<Evaluation> {
        let mut asm = Asm::new();
        let ty = self.g_expr(&mut asm, expr)?;
        Ok(Evaluation {
            asm,
            location: Location::Accumulator,
            ty,
        })
    }

    pub fn stmt(&mut self, stmt: &Stmt) -> Result<Evaluation> {
        let mut asm = Asm::new();
        let (location, ty) = self.g_stmt(&mut asm, stmt)?;
        Ok(Evaluation { asm, location, ty })
    }

    /// The label `exit` jumps to.
    pub fn return_label(&self) -> String {
        self.label("return")
    }

    /// Returns where the statement leaves a value, and its type. Statements
    /// without a value report an `int` in the accumulator.
    fn g_stmt(&mut self, asm: &mut Asm, stmt: &Stmt) -> Result<(Location, Type)> {
        match &stmt.kind {
            StmtKind::Let {
                name, initializer, ..
            } => {
                let symbol = self.declared(name)?;
                let slot = symbol.slot;
                match initializer {
                    Some(initializer) => {
                        self.g_expr_of(asm, initializer, symbol.ty)?;
                        asm.out(f!("mov {slot}, rax"));
                    }
                    None => asm.out(f!("mov {slot}, 0")),
                }
                return Ok((Location::Stack(slot), symbol.ty));
            }
            StmtKind::Const { name, initializer } => {
                let symbol = self.declared(name)?;
                let slot = symbol.slot;
                self.g_expr_of(asm, initializer, symbol.ty)?;
                asm.out(f!("mov {slot}, rax"));
                return Ok((Location::Stack(slot), symbol.ty));
            }
            StmtKind::Exit(status) => {
                self.g_expr_of(asm, status, Type::Int)?;
                asm.out(f!("jmp {}", self.return_label()));
            }
            StmtKind::If {
                branches,
                otherwise,
            } => {
                let id = self.new_label_id();
                let end = self.label(f!("endif_{id}"));
                for (i, branch) in branches.iter().enumerate() {
                    let is_last = i + 1 == branches.len() && otherwise.is_none();
                    let next = if is_last {
                        end.clone()
                    } else {
                        self.label(f!("if_{id}_{}", i + 1))
                    };
                    self.g_condition(asm, &branch.condition, &next)?;
                    self.g_block(asm, &branch.body)?;
                    if !is_last {
                        asm.out(f!("jmp {end}"));
                        asm.label(&next);
                    }
                }
                if let Some(body) = otherwise {
                    self.g_block(asm, body)?;
                }
                asm.label(&end);
            }
            StmtKind::While { condition, body } => {
                let id = self.new_label_id();
                let start = self.label(f!("while_{id}"));
                let end = self.label(f!("endwhile_{id}"));
                asm.label(&start);
                self.g_condition(asm, condition, &end)?;
                self.g_loop_body(asm, body, &start, &end)?;
                asm.out(f!("jmp {start}"));
                asm.label(&end);
            }
            StmtKind::For {
                init,
                condition,
                update,
                body,
            } => {
                let id = self.new_label_id();
                let start = self.label(f!("for_{id}"));
                let next = self.label(f!("for_next_{id}"));
                let end = self.label(f!("endfor_{id}"));
                self.g_stmt(asm, init)?;
                asm.label(&start);
                self.g_condition(asm, condition, &end)?;
                self.g_loop_body(asm, body, &next, &end)?;
                asm.label(&next);
                self.g_stmt(asm, update)?;
                asm.out(f!("jmp {start}"));
                asm.label(&end);
            }
            StmtKind::Break => {
                let Some(labels) = self.loops.last() else {
                    return Err(stmt.span.wrap(Error::BreakOutsideLoop));
                };
                asm.out(f!("jmp {}", labels.end));
            }
            StmtKind::Continue => {
                let Some(labels) = self.loops.last() else {
                    return Err(stmt.span.wrap(Error::ContinueOutsideLoop));
                };
                asm.out(f!("jmp {}", labels.next));
            }
            StmtKind::Expr(expr) => {
                let ty = self.g_expr(asm, expr)?;
                return Ok((Location::Accumulator, ty));
            }
        }
        Ok((Location::Accumulator, Type::Int))
    }

    fn g_block(&mut self, asm: &mut Asm, body: &[Stmt]) -> Result<()> {
        for stmt in body {
            self.g_stmt(asm, stmt)?;
        }
        Ok(())
    }

    fn g_loop_body(
        &mut self,
        asm: &mut Asm,
        body: &[Stmt],
        next: &str,
        end: &str,
    ) -> Result<()> {
        self.loops.push(LoopLabels {
            next: next.to_owned(),
            end: end.to_owned(),
        });
        let emitted = self.g_block(asm, body);
        self.loops.pop();
        emitted
    }

    /// Evaluates a `bool` condition, jumping to `otherwise` when it is false.
    fn g_condition(&mut self, asm: &mut Asm, condition: &Expr, otherwise: &str) -> Result<()> {
        self.g_expr_of(asm, condition, Type::Bool)?;
        asm.out("cmp rax, 0");
        asm.out(f!("je {otherwise}"));
        Ok(())
    }

    /// Evaluates `e`, which must be of type `expected`.
    fn g_expr_of(&mut self, asm: &mut Asm, e: &Expr, expected: Type) -> Result<()> {
        let found = self.g_expr(asm, e)?;
        if found != expected {
            return Err(e.span.wrap(Error::TypeMismatch { expected, found }));
        }
        Ok(())
    }

    fn g_expr(&mut self, asm: &mut Asm, e: &Expr) -> Result<Type> {
        let ty = match &e.kind {
            ExprKind::Assignment { target, op, value } => {
                let symbol = *self.symbols.resolve(target)?;
                if symbol.mutability == Mutability::Constant {
                    return Err(target.span.wrap(Error::AssignToConstant(target.name)));
                }
                let slot = symbol.slot;
                match op {
                    AssignOperator::Assign => self.g_expr_of(asm, value, symbol.ty)?,
                    AssignOperator::Compound(op) => {
                        let value_ty = self.g_expr(asm, value)?;
                        types::check_assign(AssignOperator::Compound(*op), symbol.ty, value_ty)
                            .ok_or_else(|| {
                                e.span.wrap(Error::InvalidOperands {
                                    op: *op,
                                    lhs: symbol.ty,
                                    rhs: value_ty,
                                })
                            })?;
                        asm.out("mov rdi, rax");
                        asm.out(f!("mov rax, {slot}"));
                        Self::g_binary_op(asm, *op);
                    }
                }
                asm.out(f!("mov {slot}, rax"));
                symbol.ty
            }
            ExprKind::Unary { op, expr } => {
                let operand = types::unary_operand(*op);
                self.g_expr_of(asm, expr, operand)?;
                match op {
                    UnaryOperator::Neg => asm.out("neg rax"),
                    UnaryOperator::Not => {
                        asm.out("cmp rax, 0");
                        asm.out("sete al");
                        asm.out("movzx rax, al");
                    }
                }
                operand
            }
            ExprKind::Binary { op, lhs, rhs } => {
                let lhs_ty = self.g_expr(asm, lhs)?;
                asm.out("push rax");
                let rhs_ty = self.g_expr(asm, rhs)?;
                asm.out("mov rdi, rax");
                asm.out("pop rax");
                let ty = types::check_binary(*op, lhs_ty, rhs_ty).ok_or_else(|| {
                    e.span.wrap(Error::InvalidOperands {
                        op: *op,
                        lhs: lhs_ty,
                        rhs: rhs_ty,
                    })
                })?;
                Self::g_binary_op(asm, *op);
                ty
            }
            ExprKind::Paren(expr) => self.g_expr(asm, expr)?,
            ExprKind::Id(ident) => {
                let symbol = self.symbols.resolve(ident)?;
                asm.out(f!("mov rax, {}", symbol.slot));
                symbol.ty
            }
            ExprKind::Int(int) => {
                asm.out(f!("mov rax, {int}"));
                Type::Int
            }
            ExprKind::Bool(value) => {
                asm.out(f!("mov rax, {}", u8::from(*value)));
                Type::Bool
            }
        };
        Ok(ty)
    }

    /// Combines `rax` (left) and `rdi` (right) into `rax`.
    fn g_binary_op(asm: &mut Asm, op: BinaryOperator) {
        use BinaryOperator::*;
        let cc = match op {
            Add => return asm.out("add rax, rdi"),
            Sub => return asm.out("sub rax, rdi"),
            Mul => return asm.out("imul rax, rdi"),
            Div | Mod => {
                asm.out("cqo");
                asm.out("idiv rdi");
                if op == Mod {
                    asm.out("mov rax, rdx");
                }
                return;
            }
            And => return asm.out("and rax, rdi"),
            Or => return asm.out("or rax, rdi"),
            Xor => return asm.out("xor rax, rdi"),
            Eq => "e",
            Ne => "ne",
            Lt => "l",
            Le => "le",
            Gt => "g",
            Ge => "ge",
        };
        asm.out("cmp rax, rdi");
        asm.out(f!("set{cc} al"));
        asm.out("movzx rax, al");
    }

    /// Symbol of a name declared by the statement being emitted.
    fn declared(&self, name: &ast::Ident) -> Result<Symbol> {
        self.symbols
            .get(name)
            .copied()
            .ok_or_else(|| name.span.wrap(Error::UndefinedIdentifier(name.name)))
    }

    fn new_label_id(&mut self) -> u32 {
        let id = self.next_label;
        self.next_label += 1;
        id
    }

    fn label(&self, name: impl fmt::Display) -> String {
        format!("{}{name}", self.label_prefix)
    }
}

/// Lays out a whole program as the target's entry function.
pub struct Generator<'sym, E> {
    code: String,
    symbols: &'sym SymbolTable,
    _env: PhantomData<E>,
}

impl<'sym, E> Generator<'sym, E>
where
    E: x86_64_env::Env,
{
    pub fn new(symbols: &'sym SymbolTable) -> Generator<'sym, E> {
        Generator {
            code: String::with_capacity(DEFAULT_CODE_CAPACITY),
            symbols,
            _env: PhantomData,
        }
    }

    /// Emits every statement. Failing statements are reported together; no
    /// code is produced if any of them fails.
    pub fn generate(mut self, program: &ast::Program) -> Result<String, Vec<Spanned<Error>>> {
        let mut emitter = Emitter::with_label_prefix(self.symbols, E::LABEL_PREFIX);
        let mut body = Asm::new();
        let mut errors = Vec::new();
        for stmt in &program.body {
            match emitter.stmt(stmt) {
                Ok(evaluation) => body.append(evaluation.asm),
                Err(error) => errors.push(error),
            }
        }
        if !errors.is_empty() {
            return Err(errors);
        }

        let frame_size = self.symbols.frame_size();
        debug!(
            entry = E::ENTRY_POINT,
            frame_size,
            instructions = body.len(),
            "generated program"
        );

        self.g_program_prologue();
        self.g_function_prologue(frame_size);
        for line in body.lines() {
            if Asm::is_label(line) {
                self.label(line);
            } else {
                self.out(line);
            }
        }
        self.g_function_epilogue(&emitter.return_label());
        Ok(self.code)
    }

    fn g_program_prologue(&mut self) {
        self.code.push_str(E::GLOBAL_PROLOGUE);
        self.label(f!(".section {}", E::SECTION_TEXT));
        self.label(f!(".global {}", E::ENTRY_POINT));
    }

    fn g_function_prologue(&mut self, frame_size: usize) {
        self.label(f!("{}:", E::ENTRY_POINT));
        self.out("push rbp");
        self.out("mov rbp, rsp");
        if frame_size > 0 {
            self.out(f!("sub rsp, {frame_size}"));
        }
    }

    /// Falling off the end of the program exits with status 0.
    fn g_function_epilogue(&mut self, return_label: &str) {
        self.out("mov rax, 0");
        self.label(f!("{return_label}:"));
        self.out("mov rsp, rbp");
        self.out("pop rbp");
        self.out("ret");
    }
}

/// Utility functions.
impl<E> Generator<'_, E> {
    /// Writes an indented instruction line.
    fn out(&mut self, line: impl fmt::Display) {
        self.line(INDENT, line);
    }

    /// Writes a line without indentation.
    fn label(&mut self, line: impl fmt::Display) {
        self.line("", line);
    }

    fn line(&mut self, indent: &str, line: impl fmt::Display) {
        use fmt::Write;
        writeln!(self.code, "{indent}{line}").expect("code emit should be infallible");
    }
}

#[cfg(test)]
mod tests {
    use crate::util::test_utils::tree_tests;

    tree_tests!(
        use codegen;

        fn test_integer_literal() {
            let expr = "42";
            let asm_ok = "mov rax, 42";
        }

        fn test_boolean_literals() {
            let expr = "true xor false";
            let asm_ok = "
                mov rax, 1
                push rax
                mov rax, 0
                mov rdi, rax
                pop rax
                xor rax, rdi
            ";
        }

        fn test_addition() {
            let expr = "1 + 2";
            let asm_ok = "
                mov rax, 1
                push rax
                mov rax, 2
                mov rdi, rax
                pop rax
                add rax, rdi
            ";
        }

        fn test_nested_operands_are_spilled() {
            let expr = "(1 - 2) * (3 - 4)";
            let asm_ok = "
                mov rax, 1
                push rax
                mov rax, 2
                mov rdi, rax
                pop rax
                sub rax, rdi
                push rax
                mov rax, 3
                push rax
                mov rax, 4
                mov rdi, rax
                pop rax
                sub rax, rdi
                mov rdi, rax
                pop rax
                imul rax, rdi
            ";
        }

        fn test_division_and_modulo() {
            let expr = "7 / 2 % 3";
            let asm_ok = "
                mov rax, 7
                push rax
                mov rax, 2
                mov rdi, rax
                pop rax
                cqo
                idiv rdi
                push rax
                mov rax, 3
                mov rdi, rax
                pop rax
                cqo
                idiv rdi
                mov rax, rdx
            ";
        }

        fn test_comparison() {
            let expr = "1 <= 2";
            let asm_ok = "
                mov rax, 1
                push rax
                mov rax, 2
                mov rdi, rax
                pop rax
                cmp rax, rdi
                setle al
                movzx rax, al
            ";
        }

        fn test_unary_operators() {
            let expr = "not -5 < 0";
            let asm_ok = "
                mov rax, 5
                neg rax
                push rax
                mov rax, 0
                mov rdi, rax
                pop rax
                cmp rax, rdi
                setl al
                movzx rax, al
                cmp rax, 0
                sete al
                movzx rax, al
            ";
        }

        fn test_error_math_on_bool() {
            let expr = "1 + true";
            let expected_errors = &["1:1: cannot do math operations on int and bool"];
        }

        fn test_error_compare_mixed() {
            let expr = "(1 == true) or false";
            let expected_errors = &["1:2: cannot compare int and bool"];
        }

        fn test_error_ordering_bools() {
            let expr = "true < false";
            let expected_errors = &["1:1: cannot compare bool and bool"];
        }

        fn test_error_logic_on_ints() {
            let expr = "1 and 2";
            let expected_errors = &["1:1: cannot do logical operations on int and int"];
        }

        fn test_error_not_on_int() {
            let expr = "not 3";
            let expected_errors = &["1:5: expected bool, but found int"];
        }

        fn test_error_negate_bool() {
            let expr = "-(1 < 2)";
            let expected_errors = &["1:2: expected int, but found bool"];
        }

        fn test_undefined_identifier() {
            let expr = "1 + y";
            let expected_errors = &["1:5: y is not defined"];
        }

        fn test_program_let_and_compound_assignment() {
            let program = "let x = 2\nx += 3\nexit x * 2";
            let asm_ok = r#"
                .intel_syntax noprefix
                .section .note.GNU-stack,"",@progbits

                .section .text
                .global main
                main:
                    push rbp
                    mov rbp, rsp
                    sub rsp, 16
                    mov rax, 2
                    mov qword ptr [rbp - 8], rax
                    mov rax, 3
                    mov rdi, rax
                    mov rax, qword ptr [rbp - 8]
                    add rax, rdi
                    mov qword ptr [rbp - 8], rax
                    mov rax, qword ptr [rbp - 8]
                    push rax
                    mov rax, 2
                    mov rdi, rax
                    pop rax
                    imul rax, rdi
                    jmp .Lreturn
                    mov rax, 0
                .Lreturn:
                    mov rsp, rbp
                    pop rbp
                    ret
            "#;
        }

        fn test_program_slots_and_frame() {
            let program = "let a; let b = 1; const c = a = b";
            let asm_ok = r#"
                .intel_syntax noprefix
                .section .note.GNU-stack,"",@progbits

                .section .text
                .global main
                main:
                    push rbp
                    mov rbp, rsp
                    sub rsp, 32
                    mov qword ptr [rbp - 8], 0
                    mov rax, 1
                    mov qword ptr [rbp - 16], rax
                    mov rax, qword ptr [rbp - 16]
                    mov qword ptr [rbp - 8], rax
                    mov qword ptr [rbp - 24], rax
                    mov rax, 0
                .Lreturn:
                    mov rsp, rbp
                    pop rbp
                    ret
            "#;
        }

        fn test_program_without_variables() {
            let program = "exit 3";
            let asm_ok = r#"
                .intel_syntax noprefix
                .section .note.GNU-stack,"",@progbits

                .section .text
                .global main
                main:
                    push rbp
                    mov rbp, rsp
                    mov rax, 3
                    jmp .Lreturn
                    mov rax, 0
                .Lreturn:
                    mov rsp, rbp
                    pop rbp
                    ret
            "#;
        }

        fn test_program_use_before_declaration() {
            let program = "x\nlet x = x";
            let expected_errors = &["1:1: x is not defined", "2:9: x is not defined"];
        }

        fn test_program_assign_to_constant() {
            let program = "const limit = 10\nlimit -= 1\nlimit";
            let expected_errors = &["2:1: cannot assign to constant limit"];
        }

        fn test_program_reports_every_statement() {
            let program = "let a = b\na = 1\nc = 2";
            let expected_errors = &["1:9: b is not defined", "3:1: c is not defined"];
        }

        fn test_program_assignment_types() {
            let program = "let flag = true\nflag = 1\nlet n: bool = 0\nflag += true";
            let expected_errors = &[
                "2:8: expected bool, but found int",
                "3:15: expected bool, but found int",
                "4:1: cannot do math operations on bool and bool",
            ];
        }

        fn test_program_exit_status_is_int() {
            let program = "exit 1 < 2";
            let expected_errors = &["1:6: expected int, but found bool"];
        }

        fn test_program_conditions_are_bool() {
            let program = "if 1: exit 1 endif\nwhile 0: endwhile\nfor let i = 0; i; i += 1: endfor";
            let expected_errors = &[
                "1:4: expected bool, but found int",
                "2:7: expected bool, but found int",
                "3:16: expected bool, but found int",
            ];
        }

        fn test_program_break_outside_loop() {
            let program = "break\nif true: continue endif\nwhile true: break endwhile";
            let expected_errors = &[
                "1:1: break outside of a loop",
                "2:10: continue outside of a loop",
            ];
        }

        fn test_program_if_elif_else() {
            let program = "let x = 1\nif x == 0: exit 1 elif false: exit 2 else: exit 3 endif";
            let asm_ok = r#"
                .intel_syntax noprefix
                .section .note.GNU-stack,"",@progbits

                .section .text
                .global main
                main:
                    push rbp
                    mov rbp, rsp
                    sub rsp, 16
                    mov rax, 1
                    mov qword ptr [rbp - 8], rax
                    mov rax, qword ptr [rbp - 8]
                    push rax
                    mov rax, 0
                    mov rdi, rax
                    pop rax
                    cmp rax, rdi
                    sete al
                    movzx rax, al
                    cmp rax, 0
                    je .Lif_0_1
                    mov rax, 1
                    jmp .Lreturn
                    jmp .Lendif_0
                .Lif_0_1:
                    mov rax, 0
                    cmp rax, 0
                    je .Lif_0_2
                    mov rax, 2
                    jmp .Lreturn
                    jmp .Lendif_0
                .Lif_0_2:
                    mov rax, 3
                    jmp .Lreturn
                .Lendif_0:
                    mov rax, 0
                .Lreturn:
                    mov rsp, rbp
                    pop rbp
                    ret
            "#;
        }

        fn test_program_while_break_continue() {
            let program = "let n = 0\nwhile true:\n  n += 1\n  if n < 3: continue endif\n  break\nendwhile\nexit n";
            let asm_ok = r#"
                .intel_syntax noprefix
                .section .note.GNU-stack,"",@progbits

                .section .text
                .global main
                main:
                    push rbp
                    mov rbp, rsp
                    sub rsp, 16
                    mov rax, 0
                    mov qword ptr [rbp - 8], rax
                .Lwhile_0:
                    mov rax, 1
                    cmp rax, 0
                    je .Lendwhile_0
                    mov rax, 1
                    mov rdi, rax
                    mov rax, qword ptr [rbp - 8]
                    add rax, rdi
                    mov qword ptr [rbp - 8], rax
                    mov rax, qword ptr [rbp - 8]
                    push rax
                    mov rax, 3
                    mov rdi, rax
                    pop rax
                    cmp rax, rdi
                    setl al
                    movzx rax, al
                    cmp rax, 0
                    je .Lendif_1
                    jmp .Lwhile_0
                .Lendif_1:
                    jmp .Lendwhile_0
                    jmp .Lwhile_0
                .Lendwhile_0:
                    mov rax, qword ptr [rbp - 8]
                    jmp .Lreturn
                    mov rax, 0
                .Lreturn:
                    mov rsp, rbp
                    pop rbp
                    ret
            "#;
        }

        fn test_program_for_continue_runs_update() {
            let program = "let sum = 0\nfor let i = 0; i < 3; i += 1:\n  if i == 1: continue endif\n  sum += i\nendfor\nexit sum";
            let asm_ok = r#"
                .intel_syntax noprefix
                .section .note.GNU-stack,"",@progbits

                .section .text
                .global main
                main:
                    push rbp
                    mov rbp, rsp
                    sub rsp, 16
                    mov rax, 0
                    mov qword ptr [rbp - 8], rax
                    mov rax, 0
                    mov qword ptr [rbp - 16], rax
                .Lfor_0:
                    mov rax, qword ptr [rbp - 16]
                    push rax
                    mov rax, 3
                    mov rdi, rax
                    pop rax
                    cmp rax, rdi
                    setl al
                    movzx rax, al
                    cmp rax, 0
                    je .Lendfor_0
                    mov rax, qword ptr [rbp - 16]
                    push rax
                    mov rax, 1
                    mov rdi, rax
                    pop rax
                    cmp rax, rdi
                    sete al
                    movzx rax, al
                    cmp rax, 0
                    je .Lendif_1
                    jmp .Lfor_next_0
                .Lendif_1:
                    mov rax, qword ptr [rbp - 16]
                    mov rdi, rax
                    mov rax, qword ptr [rbp - 8]
                    add rax, rdi
                    mov qword ptr [rbp - 8], rax
                .Lfor_next_0:
                    mov rax, 1
                    mov rdi, rax
                    mov rax, qword ptr [rbp - 16]
                    add rax, rdi
                    mov qword ptr [rbp - 16], rax
                    jmp .Lfor_0
                .Lendfor_0:
                    mov rax, qword ptr [rbp - 8]
                    jmp .Lreturn
                    mov rax, 0
                .Lreturn:
                    mov rsp, rbp
                    pop rbp
                    ret
            "#;
        }
    );

    mod darwin {
        use indoc::indoc;
        use pretty_assertions::assert_eq;

        use crate::{codegen::Target, compile};

        #[test]
        fn test_program_for_darwin() {
            let asm = compile(
                "let x = 3; while x > 0: x -= 1 endwhile; exit x",
                Target::x86_64_darwin,
            )
            .unwrap();
            let expected = indoc! {"
                .intel_syntax noprefix

                .section __TEXT,__text,regular,pure_instructions
                .global _main
                _main:
                    push rbp
                    mov rbp, rsp
                    sub rsp, 16
                    mov rax, 3
                    mov qword ptr [rbp - 8], rax
                Lwhile_0:
                    mov rax, qword ptr [rbp - 8]
                    push rax
                    mov rax, 0
                    mov rdi, rax
                    pop rax
                    cmp rax, rdi
                    setg al
                    movzx rax, al
                    cmp rax, 0
                    je Lendwhile_0
                    mov rax, 1
                    mov rdi, rax
                    mov rax, qword ptr [rbp - 8]
                    sub rax, rdi
                    mov qword ptr [rbp - 8], rax
                    jmp Lwhile_0
                Lendwhile_0:
                    mov rax, qword ptr [rbp - 8]
                    jmp Lreturn
                    mov rax, 0
                Lreturn:
                    mov rsp, rbp
                    pop rbp
                    ret
            "};
            assert_eq!(asm, expected);
        }
    }
}
