use std::{
    error::Error,
    fs,
    io::{self, Read, Write},
    path::PathBuf,
    process::ExitCode,
};

use clap::Parser;
use spl::{
    lexer::Lexer,
    parser,
    symbols::SymbolTable,
    util::{
        fmt::{tree, Context, Show},
        intern::Interner,
    },
};
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Compiles SPL source into x86-64 assembly.
#[derive(Parser)]
#[command(name = "splc", version)]
struct Cli {
    /// Source file. Reads standard input when omitted.
    file: Option<PathBuf>,

    /// Write the output here instead of standard output.
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = DEFAULT_TARGET)]
    target: Target,

    #[arg(long, value_enum, default_value_t = Emit::Asm)]
    emit: Emit,
}

#[allow(non_camel_case_types)]
#[derive(Copy, Clone, PartialEq, Eq, clap::ValueEnum)]
#[clap(rename_all = "snake_case")]
enum Target {
    x86_64_darwin,
    x86_64_linux,
}

impl From<Target> for spl::codegen::Target {
    fn from(value: Target) -> Self {
        match value {
            Target::x86_64_darwin => spl::codegen::Target::x86_64_darwin,
            Target::x86_64_linux => spl::codegen::Target::x86_64_linux,
        }
    }
}

cfg_if::cfg_if! {
    if #[cfg(all(target_arch = "x86_64", target_os = "macos"))] {
        const DEFAULT_TARGET: Target = Target::x86_64_darwin;
    } else {
        const DEFAULT_TARGET: Target = Target::x86_64_linux;
    }
}

#[derive(Copy, Clone, PartialEq, Eq, clap::ValueEnum)]
enum Emit {
    /// One token per line.
    Tokens,
    /// The syntax tree.
    Ast,
    /// Assembly for the selected target.
    Asm,
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(code) => code,
        Err(error) => {
            eprintln!("splc: {error}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<ExitCode, Box<dyn Error>> {
    let src = match &cli.file {
        Some(path) => fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    debug!(file = ?cli.file, bytes = src.len(), "read source");

    let output = match cli.emit {
        Emit::Tokens => Ok(emit_tokens(&src)),
        Emit::Ast => emit_ast(&src),
        Emit::Asm => emit_asm(&src, cli.target.into()),
    };

    match output {
        Ok(text) => {
            match &cli.output {
                Some(path) => fs::write(path, text)?,
                None => io::stdout().write_all(text.as_bytes())?,
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(errors) => {
            for error in errors {
                eprintln!("error: {error}");
            }
            Ok(ExitCode::FAILURE)
        }
    }
}

fn emit_tokens(src: &str) -> String {
    Lexer::new(src)
        .map(|token| format!("{:?} {:?}\n", token, token.text(src)))
        .collect()
}

fn emit_ast(src: &str) -> Result<String, Vec<String>> {
    let mut interner = Interner::with_capacity(64);
    let mut symbols = SymbolTable::new();
    match parser::parse_program(src, &mut interner, &mut symbols) {
        Ok(program) => Ok(tree::print_program_string(&interner, &program)),
        Err(errors) => {
            let ctx = Context {
                src,
                ident_interner: &interner,
            };
            Err(errors
                .iter()
                .map(|error| format!("{:#}", error.display(&ctx)))
                .collect())
        }
    }
}

fn emit_asm(src: &str, target: spl::codegen::Target) -> Result<String, Vec<String>> {
    debug!(%target, triple = target.triple(), "compiling");
    spl::compile(src, target)
}
