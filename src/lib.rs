//! Compiler for SPL, a small language of integer expressions and variable
//! bindings, down to x86-64 assembly (Intel syntax).
//!
//! Source text goes through the [`lexer`], the [`parser`] (which also fills
//! the [`symbols`] table) and finally [`codegen`]. A [`Unit`] owns the state
//! shared by these stages for one compilation.

use tracing::debug;

/// The lexer takes the source input, mapping it into a sequence of tokens.
pub mod lexer;

/// The parser takes a sequence of tokens, mapping it into an AST.
pub mod parser;

/// The code generator maps the AST into assembly.
pub mod codegen;

pub mod ast;
pub mod symbols;
pub mod token;
pub mod types;
pub mod util;

use crate::{
    codegen::{Emitter, Evaluation, Target},
    symbols::{DeclareError, Mutability, Slot, SymbolTable},
    token::Spanned,
    types::Type,
    util::{
        fmt::{Context, Show},
        intern::Interner,
    },
};

/// Any error produced while compiling.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Diagnostic {
    /// Lexical and syntax errors.
    Syntax(parser::Error),
    /// Errors found while emitting code, such as undefined names.
    Codegen(codegen::Error),
}

impl From<parser::Error> for Diagnostic {
    fn from(value: parser::Error) -> Self {
        Diagnostic::Syntax(value)
    }
}

impl From<codegen::Error> for Diagnostic {
    fn from(value: codegen::Error) -> Self {
        Diagnostic::Codegen(value)
    }
}

pub type Diagnostics = Vec<Spanned<Diagnostic>>;

/// A compilation unit: the identifier interner and the variables bound by the
/// host, shared by every compilation on it.
///
/// Each compilation starts from the host bindings and declares its own names
/// into a private copy of them, so nothing one source declares is seen by the
/// next. Units are independent from each other, so separate units may be used
/// from separate threads.
#[derive(Debug, Default)]
pub struct Unit {
    interner: Interner<str>,
    bindings: SymbolTable,
}

impl Unit {
    pub fn new() -> Unit {
        Unit {
            interner: Interner::with_capacity(64),
            bindings: SymbolTable::new(),
        }
    }

    /// The variables bound through [`Unit::declare`].
    pub fn symbols(&self) -> &SymbolTable {
        &self.bindings
    }

    pub fn interner(&self) -> &Interner<str> {
        &self.interner
    }

    /// Binds a mutable `int` variable visible from anywhere in the sources
    /// compiled afterwards. Declaring the same name again returns its existing
    /// slot. Returns `None` once the frame is full.
    pub fn declare(&mut self, name: &str) -> Option<Slot> {
        let name = self.interner.intern(name);
        match self.bindings.declare(name, Mutability::Mutable, Type::Int, 0) {
            Ok(slot) | Err(DeclareError::Redeclared(slot)) => Some(slot),
            Err(DeclareError::FrameFull) => None,
        }
    }

    /// Compiles a single expression to bare instructions leaving its value in
    /// `rax`. Stops at the first error.
    pub fn compile_expr(&mut self, src: &str) -> Result<Evaluation, Diagnostics> {
        let mut symbols = self.bindings.clone();
        let expr = parser::parse_expr(src, &mut self.interner, &mut symbols)
            .map_err(into_diagnostics)?;
        debug!(span = %expr.span, "parsed expression");

        let evaluation = Emitter::new(&symbols)
            .expr(&expr)
            .map_err(|error| vec![error.map(Diagnostic::from)])?;
        debug!(instructions = evaluation.asm.len(), ty = %evaluation.ty, "emitted expression");
        Ok(evaluation)
    }

    /// Compiles a sequence of statements into a complete assembly file for
    /// `target`. Every failing statement is reported.
    pub fn compile_program(&mut self, src: &str, target: Target) -> Result<String, Diagnostics> {
        let mut symbols = self.bindings.clone();
        let program = parser::parse_program(src, &mut self.interner, &mut symbols)
            .map_err(into_diagnostics)?;
        debug!(
            statements = program.body.len(),
            symbols = symbols.len(),
            "parsed program"
        );

        let asm = codegen::generate(&program, &symbols, target).map_err(into_diagnostics)?;
        debug!(%target, bytes = asm.len(), "generated assembly");
        Ok(asm)
    }

    /// Renders each diagnostic as `line:column: message`.
    pub fn format_diagnostics(
        &self,
        src: &str,
        diagnostics: &[Spanned<Diagnostic>],
    ) -> Vec<String> {
        let ctx = Context {
            src,
            ident_interner: &self.interner,
        };
        diagnostics
            .iter()
            .map(|diagnostic| format!("{:#}", diagnostic.display(&ctx)))
            .collect()
    }
}

fn into_diagnostics<E>(errors: Vec<Spanned<E>>) -> Diagnostics
where
    Diagnostic: From<E>,
{
    errors
        .into_iter()
        .map(|error| error.map(Diagnostic::from))
        .collect()
}

/// Compiles a program on a fresh [`Unit`], returning the assembly text or the
/// formatted diagnostics.
pub fn compile(src: &str, target: Target) -> Result<String, Vec<String>> {
    let mut unit = Unit::new();
    unit.compile_program(src, target)
        .map_err(|diagnostics| unit.format_diagnostics(src, &diagnostics))
}
