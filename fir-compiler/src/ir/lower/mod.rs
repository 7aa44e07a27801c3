//! AST to IR lowering module.
//!
//! A single depth-first pass over the typed AST: the statement lowerer
//! (`stmt`) drives the expression lowerer (`expr`), both emitting through
//! the `Builder` in program order. Static types come exclusively from the
//! injected `TypeOracle`.

pub mod expr;
pub mod stmt;

use thiserror::Error;

use crate::ir::ast::{AstNodeId, BinOp, Program as AstProgram};
use crate::ir::builder::Builder;
use crate::ir::ir::{Program, Type};
use crate::ir::typeck::TypeOracle;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LowerError {
    #[error("unsupported expression: {0}")]
    UnsupportedExpression(String),

    #[error("unsupported {family} operator '{op}'")]
    UnsupportedOperator { op: BinOp, family: &'static str },

    #[error("unsupported statement: {0}")]
    UnsupportedStatement(String),

    #[error("unsupported construct: {0}")]
    UnsupportedConstruct(String),

    #[error("no static type recorded for node {0:?}")]
    MissingType(AstNodeId),
}

/// Lower a typed AST to a flat IR program.
///
/// The entry function `main` (no parameters, no return value) is started
/// before any statement is lowered; top-level statements land there. Any
/// failure aborts the whole pass; partial output is never returned.
pub fn lower<O: TypeOracle>(program: &AstProgram, oracle: &O) -> Result<Program, LowerError> {
    let mut lower = Lower::new(oracle);
    for s in &program.statements {
        lower.lower_stmt(s)?;
    }
    Ok(lower.finish())
}

pub struct Lower<'a, O: TypeOracle> {
    pub builder: Builder,
    oracle: &'a O,
}

impl<'a, O: TypeOracle> Lower<'a, O> {
    pub fn new(oracle: &'a O) -> Self {
        let mut builder = Builder::new();
        builder.start_function("main", Vec::new(), None);
        Self { builder, oracle }
    }

    pub fn finish(self) -> Program {
        self.builder.finish()
    }

    /// Oracle lookup with the trust boundary made explicit: a miss means
    /// the input was not well-formed for the supported subset.
    fn type_of(&self, id: AstNodeId) -> Result<Type, LowerError> {
        self.oracle.type_of(id).ok_or(LowerError::MissingType(id))
    }
}
