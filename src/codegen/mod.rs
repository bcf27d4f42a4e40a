use crate::{
    ast::{BinaryOperator, Program},
    codegen::x86_64::Generator,
    symbols::SymbolTable,
    token::Spanned,
    types::Type,
    util::intern::Interned,
};

pub mod x86_64;
pub mod x86_64_env;

pub use x86_64::{Asm, Emitter, Evaluation, Location};

/// Generates a complete assembly file for `program`, whose declarations must
/// be in `symbols`.
pub fn generate(
    program: &Program,
    symbols: &SymbolTable,
    target: Target,
) -> Result<String, Vec<Spanned<Error>>> {
    type DarwinGenerator<'a> = Generator<'a, x86_64_env::Darwin>;
    type LinuxGenerator<'a> = Generator<'a, x86_64_env::Linux>;

    match target {
        Target::x86_64_darwin => DarwinGenerator::new(symbols).generate(program),
        Target::x86_64_linux => LinuxGenerator::new(symbols).generate(program),
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    UndefinedIdentifier(Interned<str>),
    AssignToConstant(Interned<str>),
    TypeMismatch {
        expected: Type,
        found: Type,
    },
    /// The operands of `op` (or of its compound assignment) have the wrong
    /// types.
    InvalidOperands {
        op: BinaryOperator,
        lhs: Type,
        rhs: Type,
    },
    BreakOutsideLoop,
    ContinueOutsideLoop,
}

#[allow(non_camel_case_types)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Target {
    x86_64_darwin,
    x86_64_linux,
}

impl Target {
    pub const ALL: &[Target] = &[Target::x86_64_darwin, Target::x86_64_linux];

    pub const fn triple(&self) -> &'static str {
        match self {
            Target::x86_64_darwin => "x86_64-apple-darwin",
            Target::x86_64_linux => "x86_64-unknown-linux-gnu",
        }
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Target::x86_64_darwin => f.write_str("x86_64_darwin"),
            Target::x86_64_linux => f.write_str("x86_64_linux"),
        }
    }
}
