pub mod frontend;
pub mod ir;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CompileError {
    #[error("Lexical error: {0}")]
    Lexical(#[from] frontend::lexer::LexicalError),

    #[error("Parse error at {line}:{col}: {message}\n  Context: {context}")]
    Parse {
        line: usize,
        col: usize,
        context: String,
        message: String,
    },

    #[error("Type error: {0}")]
    Type(#[from] ir::typeck::TypeError),

    #[error("Lowering error: {0}")]
    Lower(#[from] ir::lower::LowerError),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Compile source text to a flat IR program: parse, type-check, lower.
pub fn compile_to_ir(source: &str) -> Result<ir::Program, CompileError> {
    let ast = frontend::parser::parse(source)?;
    let types = ir::typeck::check(&ast)?;
    let program = ir::lower::lower(&ast, &types)?;
    Ok(program)
}

/// Compile source text directly to the IR's JSON form.
pub fn compile_to_json(source: &str) -> Result<String, CompileError> {
    let program = compile_to_ir(source)?;
    Ok(serde_json::to_string_pretty(&program)?)
}
