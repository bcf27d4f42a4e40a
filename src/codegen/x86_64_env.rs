/// Object format details of an x86-64 target, as seen by the assembler.
pub trait Env {
    /// Symbol of the generated function, called by the C runtime.
    const ENTRY_POINT: &str;

    /// Emitted once, before any section.
    const GLOBAL_PROLOGUE: &str;

    const SECTION_TEXT: &str;

    /// Prefix keeping generated labels local to the object file. The label
    /// `{LABEL_PREFIX}return` sits right before the function epilogue; `exit`
    /// jumps there.
    const LABEL_PREFIX: &str;
}

impl Env for Darwin {
    const ENTRY_POINT: &str = "_main";

    const GLOBAL_PROLOGUE: &str = ".intel_syntax noprefix\n\n";

    const SECTION_TEXT: &str = "__TEXT,__text,regular,pure_instructions";

    // Mach-O temporary symbols start with `L`.
    const LABEL_PREFIX: &str = "L";
}

impl Env for Linux {
    const ENTRY_POINT: &str = "main";

    const GLOBAL_PROLOGUE: &str = concat!(
        ".intel_syntax noprefix\n",
        ".section .note.GNU-stack,\"\",@progbits\n\n",
    );

    const SECTION_TEXT: &str = ".text";

    const LABEL_PREFIX: &str = ".L";
}

pub struct Darwin;

pub struct Linux;
