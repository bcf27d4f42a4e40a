use crate::{
    codegen::{self, Emitter, Target},
    parser,
    symbols::SymbolTable,
    token::Spanned,
    util::{
        fmt::{tree, Context, Show},
        intern::Interner,
    },
};

pub fn format_errors<E>(src: &str, i: &Interner<str>, e: &[Spanned<E>]) -> Vec<String>
where
    Spanned<E>: Show,
{
    let ctx = Context {
        src,
        ident_interner: i,
    };
    e.iter().map(|e| format!("{:#}", e.display(&ctx))).collect()
}

/// Each variant contains the input.
pub enum Test {
    ParserProgram(&'static str),
    ParserExpr(&'static str),
    CodegenProgram(&'static str),
    CodegenExpr(&'static str),
}

pub enum Assertion {
    /// Compares the AST dump (or the assembly), and checks there are no errors.
    TreeOk(&'static str),
    ExpectedErrors(&'static [&'static str]),
}

/// Returns the AST dump or the generated assembly, and the formatted errors.
#[track_caller]
pub fn run_pipeline(test: Test) -> (String, Vec<String>) {
    let interner = &mut Interner::with_capacity(128);
    let symbols = &mut SymbolTable::new();

    match test {
        Test::ParserProgram(input) => match parser::parse_program(input, interner, symbols) {
            Ok(prog) => (tree::print_program_string(interner, &prog), vec![]),
            Err(errors) => (String::new(), format_errors(input, interner, &errors)),
        },
        Test::ParserExpr(input) => match parser::parse_expr(input, interner, symbols) {
            Ok(expr) => (tree::print_expr_string(interner, &expr), vec![]),
            Err(errors) => (String::new(), format_errors(input, interner, &errors)),
        },
        Test::CodegenProgram(input) => {
            let prog = match parser::parse_program(input, interner, symbols) {
                Ok(prog) => prog,
                Err(errors) => return (String::new(), format_errors(input, interner, &errors)),
            };
            match codegen::generate(&prog, symbols, Target::x86_64_linux) {
                Ok(asm) => (asm, vec![]),
                Err(errors) => (String::new(), format_errors(input, interner, &errors)),
            }
        }
        Test::CodegenExpr(input) => {
            let expr = match parser::parse_expr(input, interner, symbols) {
                Ok(expr) => expr,
                Err(errors) => return (String::new(), format_errors(input, interner, &errors)),
            };
            match Emitter::new(symbols).expr(&expr) {
                Ok(evaluation) => (evaluation.asm.to_string(), vec![]),
                Err(error) => (String::new(), format_errors(input, interner, &[error])),
            }
        }
    }
}

#[track_caller]
pub fn run_assertion(
    assertion: Assertion,
    formatted_actual_tree: &str,
    formatted_actual_errors: &[String],
) {
    match assertion {
        Assertion::TreeOk(expected_tree) => {
            let expected_errors: &[&str] = &[];
            ::pretty_assertions::assert_eq!(formatted_actual_errors, expected_errors);
            ::pretty_assertions::assert_eq!(formatted_actual_tree.trim(), expected_tree.trim());
        }
        Assertion::ExpectedErrors(expected_errors) => {
            ::pretty_assertions::assert_eq!(formatted_actual_errors, expected_errors);
        }
    }
}

macro_rules! tree_tests {
    (
        use $test_kind:ident;

        $(
            fn $test_name:ident() {
                let $source_kind:ident = $source:expr;
                $($assertions_tt:tt)*
            }
        )*
    ) => {
        $(
            #[test]
            fn $test_name() {
                let test: crate::util::test_utils::Test =
                    tree_tests!(@@get_test($test_kind, $source_kind), $source);
                let (formatted_actual_tree, formatted_actual_errors) =
                    crate::util::test_utils::run_pipeline(test);
                let ctx = (&formatted_actual_tree, &formatted_actual_errors);
                tree_tests!(@@expand_assertions, ctx, [$($assertions_tt)*]);
            }
        )*
    };

    (@@expand_assertions, $ctx:expr, []) => {};
    (@@expand_assertions, $ctx:expr, [
        let $assertion:ident = $assertion_expected:expr;
        $($rest_assertions_tt:tt)*
    ]) => {
        crate::util::test_utils::run_assertion(
            tree_tests!(@@assertion, $assertion, $assertion_expected),
            $ctx.0,
            $ctx.1,
        );
        tree_tests!(@@expand_assertions, $ctx, [$($rest_assertions_tt)*]);
    };

    (@@assertion, tree_ok, $expected:expr) => {
        crate::util::test_utils::Assertion::TreeOk(::indoc::indoc! { $expected })
    };
    (@@assertion, asm_ok, $expected:expr) => {
        crate::util::test_utils::Assertion::TreeOk(::indoc::indoc! { $expected })
    };
    (@@assertion, expected_errors, $expected:expr) => {
        crate::util::test_utils::Assertion::ExpectedErrors($expected)
    };

    (@@get_test(parser, program), $source:expr) => {
        crate::util::test_utils::Test::ParserProgram($source)
    };
    (@@get_test(parser, expr), $source:expr) => {
        crate::util::test_utils::Test::ParserExpr($source)
    };
    (@@get_test(codegen, program), $source:expr) => {
        crate::util::test_utils::Test::CodegenProgram($source)
    };
    (@@get_test(codegen, expr), $source:expr) => {
        crate::util::test_utils::Test::CodegenExpr($source)
    };
}
pub(crate) use tree_tests;
