//! Static type assignment for the AST, behind the `TypeOracle` seam.
//!
//! The checker records a type for every value-producing node of the
//! supported subset into a `TypeMap`; the lowering engine only ever sees
//! the oracle interface, so tests can drive it with a hand-built map over a
//! synthetic AST. Constructs outside the subset are deliberately left
//! untyped rather than rejected here; the lowering names them precisely
//! with its own unsupported-construct taxonomy.

use std::collections::HashMap;
use thiserror::Error;

use crate::ir::ast::{AstNodeId, BinOp, Expr, Param, Program, Stmt};
use crate::ir::ir::Type;

/// The built-in print function's name.
pub const PRINT_BUILTIN: &str = "print";

/// Static-type lookup for AST nodes. Never fails for well-formed input in
/// the supported subset; a `None` marks a node the checker did not type.
pub trait TypeOracle {
    fn type_of(&self, id: AstNodeId) -> Option<Type>;
}

/// Node-id-keyed type table produced by `check` (or built by hand in tests).
#[derive(Debug, Clone, Default)]
pub struct TypeMap {
    types: HashMap<AstNodeId, Type>,
}

impl TypeMap {
    pub fn new() -> Self {
        Self {
            types: HashMap::new(),
        }
    }

    pub fn insert(&mut self, id: AstNodeId, ty: Type) {
        self.types.insert(id, ty);
    }
}

impl TypeOracle for TypeMap {
    fn type_of(&self, id: AstNodeId) -> Option<Type> {
        self.types.get(&id).copied()
    }
}

/// Maps the source type spellings to IR types. `void` and unrecognized
/// spellings map to nothing.
pub fn annotation_type(name: &str) -> Option<Type> {
    match name {
        "number" => Some(Type::Float),
        "bigint" => Some(Type::Int),
        "boolean" => Some(Type::Bool),
        _ => None,
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TypeError {
    #[error("undefined variable '{0}'")]
    UndefinedVariable(String),

    #[error("undefined function '{0}'")]
    UndefinedFunction(String),

    #[error("unknown type annotation '{0}'")]
    UnknownAnnotation(String),

    #[error("parameter '{0}' has no type annotation")]
    MissingAnnotation(String),

    #[error("function '{name}' expects {expected} argument(s), got {got}")]
    ArgumentCountMismatch {
        name: String,
        expected: usize,
        got: usize,
    },

    #[error("type mismatch: expected {expected}, found {found}")]
    Mismatch { expected: String, found: String },
}

#[derive(Debug, Clone)]
struct FnSig {
    params: Vec<Type>,
    ret: Option<Type>,
}

pub struct Typeck {
    types: TypeMap,
    globals: HashMap<String, Type>,
    locals: Option<HashMap<String, Type>>,
    funcs: HashMap<String, FnSig>,
}

/// Type-check a program and produce its `TypeMap`.
pub fn check(program: &Program) -> Result<TypeMap, TypeError> {
    let mut tc = Typeck::new();
    // First pass: collect function signatures for forward references.
    tc.collect_signatures(&program.statements)?;
    for s in &program.statements {
        tc.check_stmt(s)?;
    }
    Ok(tc.types)
}

impl Typeck {
    fn new() -> Self {
        Self {
            types: TypeMap::new(),
            globals: HashMap::new(),
            locals: None,
            funcs: HashMap::new(),
        }
    }

    fn lookup(&self, name: &str) -> Option<Type> {
        if let Some(locals) = &self.locals {
            if let Some(ty) = locals.get(name) {
                return Some(*ty);
            }
        }
        self.globals.get(name).copied()
    }

    fn bind(&mut self, name: &str, ty: Type) {
        let table = match &mut self.locals {
            Some(locals) => locals,
            None => &mut self.globals,
        };
        table.insert(name.to_string(), ty);
    }

    fn param_type(&self, param: &Param) -> Result<Type, TypeError> {
        match &param.annotation {
            Some(a) => annotation_type(a).ok_or_else(|| TypeError::UnknownAnnotation(a.clone())),
            None => Err(TypeError::MissingAnnotation(param.name.clone())),
        }
    }

    fn collect_signatures(&mut self, stmts: &[Stmt]) -> Result<(), TypeError> {
        for s in stmts {
            self.collect_stmt(s)?;
        }
        Ok(())
    }

    fn collect_stmt(&mut self, stmt: &Stmt) -> Result<(), TypeError> {
        match stmt {
            Stmt::Function {
                name,
                params,
                return_annotation,
                body,
                ..
            } => {
                if let Some(name) = name {
                    let mut param_types = Vec::with_capacity(params.len());
                    for p in params {
                        param_types.push(self.param_type(p)?);
                    }
                    let ret = return_annotation.as_deref().and_then(annotation_type);
                    self.funcs.insert(
                        name.clone(),
                        FnSig {
                            params: param_types,
                            ret,
                        },
                    );
                }
                if let Some(body) = body {
                    self.collect_signatures(body)?;
                }
                Ok(())
            }
            Stmt::Block { statements, .. } => self.collect_signatures(statements),
            Stmt::If {
                then_branch,
                else_branch,
                ..
            } => {
                self.collect_stmt(then_branch)?;
                if let Some(else_branch) = else_branch {
                    self.collect_stmt(else_branch)?;
                }
                Ok(())
            }
            Stmt::For { init, body, .. } => {
                if let Some(init) = init {
                    self.collect_stmt(init)?;
                }
                self.collect_stmt(body)
            }
            Stmt::While { body, .. } => self.collect_stmt(body),
            _ => Ok(()),
        }
    }

    fn check_stmt(&mut self, stmt: &Stmt) -> Result<(), TypeError> {
        match stmt {
            Stmt::Block { statements, .. } => {
                for s in statements {
                    self.check_stmt(s)?;
                }
                Ok(())
            }

            Stmt::VarDecl {
                id,
                name,
                annotation,
                init,
            } => {
                let declared = match annotation {
                    Some(a) => Some(
                        annotation_type(a)
                            .ok_or_else(|| TypeError::UnknownAnnotation(a.clone()))?,
                    ),
                    None => None,
                };
                let init_ty = match init {
                    Some(e) => self.check_expr(e)?,
                    None => None,
                };
                let ty = match (declared, init_ty) {
                    (Some(d), Some(i)) if d != i => {
                        return Err(TypeError::Mismatch {
                            expected: d.to_string(),
                            found: i.to_string(),
                        })
                    }
                    (Some(d), _) => Some(d),
                    (None, i) => i,
                };
                if let Some(ty) = ty {
                    self.types.insert(*id, ty);
                    self.bind(name, ty);
                }
                Ok(())
            }

            Stmt::Expr { expr, .. } => {
                self.check_expr(expr)?;
                Ok(())
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
                ..
            } => {
                self.check_condition(condition)?;
                self.check_stmt(then_branch)?;
                if let Some(else_branch) = else_branch {
                    self.check_stmt(else_branch)?;
                }
                Ok(())
            }

            Stmt::For {
                init,
                condition,
                update,
                body,
                ..
            } => {
                if let Some(init) = init {
                    self.check_stmt(init)?;
                }
                if let Some(condition) = condition {
                    self.check_condition(condition)?;
                }
                if let Some(update) = update {
                    self.check_expr(update)?;
                }
                self.check_stmt(body)
            }

            Stmt::While {
                condition, body, ..
            } => {
                self.check_condition(condition)?;
                self.check_stmt(body)
            }

            Stmt::Function { params, body, .. } => {
                let prev = self.locals.take();
                self.locals = Some(HashMap::new());
                for p in params {
                    let ty = self.param_type(p)?;
                    self.types.insert(p.id, ty);
                    self.bind(&p.name, ty);
                }
                if let Some(body) = body {
                    for s in body {
                        self.check_stmt(s)?;
                    }
                }
                self.locals = prev;
                Ok(())
            }

            Stmt::Return { value, .. } => {
                if let Some(value) = value {
                    self.check_expr(value)?;
                }
                Ok(())
            }
        }
    }

    fn check_condition(&mut self, cond: &Expr) -> Result<(), TypeError> {
        if let Some(ty) = self.check_expr(cond)? {
            if ty != Type::Bool {
                return Err(TypeError::Mismatch {
                    expected: Type::Bool.to_string(),
                    found: ty.to_string(),
                });
            }
        }
        Ok(())
    }

    fn check_expr(&mut self, expr: &Expr) -> Result<Option<Type>, TypeError> {
        match expr {
            Expr::Number(id, _) => {
                self.types.insert(*id, Type::Float);
                Ok(Some(Type::Float))
            }
            Expr::BigInt(id, _) => {
                self.types.insert(*id, Type::Int);
                Ok(Some(Type::Int))
            }
            Expr::Bool(id, _) => {
                self.types.insert(*id, Type::Bool);
                Ok(Some(Type::Bool))
            }
            Expr::Str(..) => Ok(None),

            Expr::Ident(id, name) => {
                let ty = self
                    .lookup(name)
                    .ok_or_else(|| TypeError::UndefinedVariable(name.clone()))?;
                self.types.insert(*id, ty);
                Ok(Some(ty))
            }

            Expr::Assign { id, target, value } => {
                let value_ty = self.check_expr(value)?;
                if let Expr::Ident(target_id, name) = target.as_ref() {
                    let ty = self
                        .lookup(name)
                        .ok_or_else(|| TypeError::UndefinedVariable(name.clone()))?;
                    if let Some(found) = value_ty {
                        if found != ty {
                            return Err(TypeError::Mismatch {
                                expected: ty.to_string(),
                                found: found.to_string(),
                            });
                        }
                    }
                    self.types.insert(*target_id, ty);
                    self.types.insert(*id, ty);
                    Ok(Some(ty))
                } else {
                    // Not an identifier target; the lowering rejects this
                    // with its own construct-level error.
                    self.check_expr(target)?;
                    Ok(None)
                }
            }

            Expr::Binary {
                id,
                op,
                left,
                right,
            } => {
                let lt = self.check_expr(left)?;
                let rt = self.check_expr(right)?;
                let result = self.binary_type(*op, lt, rt)?;
                if let Some(ty) = result {
                    self.types.insert(*id, ty);
                }
                Ok(result)
            }

            Expr::Unary { operand, .. } => {
                self.check_expr(operand)?;
                Ok(None)
            }

            Expr::Call { id, callee, args } => {
                if callee.as_str() == PRINT_BUILTIN {
                    for a in args {
                        self.check_expr(a)?;
                    }
                    return Ok(None);
                }
                let sig = self
                    .funcs
                    .get(callee.as_str())
                    .cloned()
                    .ok_or_else(|| TypeError::UndefinedFunction(callee.clone()))?;
                if args.len() != sig.params.len() {
                    return Err(TypeError::ArgumentCountMismatch {
                        name: callee.clone(),
                        expected: sig.params.len(),
                        got: args.len(),
                    });
                }
                for (a, expected) in args.iter().zip(&sig.params) {
                    if let Some(found) = self.check_expr(a)? {
                        if found != *expected {
                            return Err(TypeError::Mismatch {
                                expected: expected.to_string(),
                                found: found.to_string(),
                            });
                        }
                    }
                }
                if let Some(ret) = sig.ret {
                    self.types.insert(*id, ret);
                }
                Ok(sig.ret)
            }

            Expr::Index { base, index, .. } => {
                self.check_expr(base)?;
                self.check_expr(index)?;
                Ok(None)
            }
        }
    }

    fn binary_type(
        &self,
        op: BinOp,
        lt: Option<Type>,
        rt: Option<Type>,
    ) -> Result<Option<Type>, TypeError> {
        match op {
            BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Mod => {
                for ty in [lt, rt].into_iter().flatten() {
                    if ty == Type::Bool {
                        return Err(TypeError::Mismatch {
                            expected: format!("a numeric operand for '{}'", op),
                            found: ty.to_string(),
                        });
                    }
                }
                // Arithmetic over a float operand is float; otherwise int.
                Ok(match (lt, rt) {
                    (Some(Type::Float), Some(_)) | (Some(_), Some(Type::Float)) => {
                        Some(Type::Float)
                    }
                    (Some(_), Some(_)) => Some(Type::Int),
                    _ => None,
                })
            }
            BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => {
                for ty in [lt, rt].into_iter().flatten() {
                    if ty == Type::Bool {
                        return Err(TypeError::Mismatch {
                            expected: format!("a numeric operand for '{}'", op),
                            found: ty.to_string(),
                        });
                    }
                }
                Ok(match (lt, rt) {
                    (Some(_), Some(_)) => Some(Type::Bool),
                    _ => None,
                })
            }
            BinOp::Eq | BinOp::Ne => match (lt, rt) {
                (Some(l), Some(r)) => {
                    let bool_mix = (l == Type::Bool) != (r == Type::Bool);
                    if bool_mix {
                        return Err(TypeError::Mismatch {
                            expected: format!("matching operand types for '{}'", op),
                            found: format!("{} and {}", l, r),
                        });
                    }
                    Ok(Some(Type::Bool))
                }
                _ => Ok(None),
            },
            BinOp::And | BinOp::Or => {
                for ty in [lt, rt].into_iter().flatten() {
                    if ty != Type::Bool {
                        return Err(TypeError::Mismatch {
                            expected: format!("bool operands for '{}'", op),
                            found: ty.to_string(),
                        });
                    }
                }
                Ok(match (lt, rt) {
                    (Some(_), Some(_)) => Some(Type::Bool),
                    _ => None,
                })
            }
        }
    }
}
