use super::{Lower, LowerError};
use crate::ir::ast::{AstNodeId, BinOp, Expr};
use crate::ir::builder::ValueRef;
use crate::ir::ir::{EffectOp, Type, ValueOp};
use crate::ir::typeck::{TypeOracle, PRINT_BUILTIN};

impl<'a, O: TypeOracle> Lower<'a, O> {
    /// Lower an expression in value position. Emits instructions in
    /// left-to-right evaluation order and returns the (name, type) of the
    /// instruction holding the result.
    pub fn lower_expr(&mut self, expr: &Expr) -> Result<ValueRef, LowerError> {
        match expr {
            Expr::Number(_, value) => Ok(self.builder.build_float(*value)),
            Expr::BigInt(_, value) => Ok(self.builder.build_int(*value)),
            Expr::Bool(_, value) => Ok(self.builder.build_bool(*value)),

            // Re-materialize the variable under a fresh name; reads always
            // go through an `id` copy.
            Expr::Ident(id, name) => {
                let ty = self.type_of(*id)?;
                Ok(self
                    .builder
                    .emit_value(ValueOp::Id, ty, vec![name.clone()], None))
            }

            Expr::Assign { target, value, .. } => self.lower_assign(target, value),

            Expr::Binary {
                op, left, right, ..
            } => self.lower_binary(*op, left, right),

            Expr::Call { id, callee, args } => self.lower_call_value(*id, callee, args, None),

            Expr::Str(..) => Err(LowerError::UnsupportedExpression(
                "string literal".to_string(),
            )),
            Expr::Unary { op, .. } => Err(LowerError::UnsupportedExpression(format!(
                "unary '{}' expression",
                op
            ))),
            Expr::Index { .. } => Err(LowerError::UnsupportedExpression(
                "index expression".to_string(),
            )),
        }
    }

    /// `ident = value`: a new `id` instruction whose destination is the
    /// identifier's own name. This is the write side of the name-as-storage model.
    fn lower_assign(&mut self, target: &Expr, value: &Expr) -> Result<ValueRef, LowerError> {
        let Expr::Ident(target_id, name) = target else {
            return Err(LowerError::UnsupportedConstruct(
                "assignment to a non-identifier target".to_string(),
            ));
        };
        let rhs = self.lower_expr(value)?;
        let ty = self.type_of(*target_id)?;
        Ok(self
            .builder
            .emit_value(ValueOp::Id, ty, vec![rhs.name], Some(name.clone())))
    }

    fn lower_binary(&mut self, op: BinOp, left: &Expr, right: &Expr) -> Result<ValueRef, LowerError> {
        // Family selection is a binary decision: float opcodes whenever
        // either side is float-typed.
        let float_family =
            self.type_of(left.id())? == Type::Float || self.type_of(right.id())? == Type::Float;
        let (opcode, ty) = if float_family {
            float_op(op).ok_or(LowerError::UnsupportedOperator {
                op,
                family: "float",
            })?
        } else {
            int_op(op).ok_or(LowerError::UnsupportedOperator {
                op,
                family: "non-float",
            })?
        };
        let lhs = self.lower_expr(left)?;
        let rhs = self.lower_expr(right)?;
        Ok(self
            .builder
            .emit_value(opcode, ty, vec![lhs.name, rhs.name], None))
    }

    /// Lower a call in value position. `dest` carries the declared
    /// (name, type) when the call initializes a variable declaration.
    pub(crate) fn lower_call_value(
        &mut self,
        id: AstNodeId,
        callee: &str,
        args: &[Expr],
        dest: Option<(String, Type)>,
    ) -> Result<ValueRef, LowerError> {
        let arg_names = self.lower_args(args)?;
        if callee == PRINT_BUILTIN {
            self.builder
                .emit_effect(EffectOp::Print, arg_names, Vec::new());
            // Expressions must produce a value; print has none to give.
            return Ok(self.builder.build_int(0));
        }
        let (dest, ty) = match dest {
            Some((name, ty)) => (Some(name), ty),
            None => (None, self.type_of(id)?),
        };
        Ok(self.builder.emit_call_value(callee, arg_names, ty, dest))
    }

    /// Lower a call in statement position: effect only, no result value.
    pub(crate) fn lower_call_effect(&mut self, callee: &str, args: &[Expr]) -> Result<(), LowerError> {
        let arg_names = self.lower_args(args)?;
        if callee == PRINT_BUILTIN {
            self.builder
                .emit_effect(EffectOp::Print, arg_names, Vec::new());
        } else {
            self.builder.emit_call_effect(callee, arg_names);
        }
        Ok(())
    }

    fn lower_args(&mut self, args: &[Expr]) -> Result<Vec<String>, LowerError> {
        args.iter()
            .map(|a| self.lower_expr(a).map(|v| v.name))
            .collect()
    }
}

/// Non-float operator table: integer arithmetic, integer/boolean comparison.
fn int_op(op: BinOp) -> Option<(ValueOp, Type)> {
    match op {
        BinOp::Add => Some((ValueOp::Add, Type::Int)),
        BinOp::Mul => Some((ValueOp::Mul, Type::Int)),
        BinOp::Sub => Some((ValueOp::Sub, Type::Int)),
        BinOp::Div => Some((ValueOp::Div, Type::Int)),
        BinOp::Lt => Some((ValueOp::Lt, Type::Bool)),
        BinOp::Le => Some((ValueOp::Le, Type::Bool)),
        BinOp::Gt => Some((ValueOp::Gt, Type::Bool)),
        BinOp::Ge => Some((ValueOp::Ge, Type::Bool)),
        BinOp::Eq => Some((ValueOp::Eq, Type::Bool)),
        _ => None,
    }
}

/// Float operator table.
fn float_op(op: BinOp) -> Option<(ValueOp, Type)> {
    match op {
        BinOp::Add => Some((ValueOp::Fadd, Type::Float)),
        BinOp::Mul => Some((ValueOp::Fmul, Type::Float)),
        BinOp::Sub => Some((ValueOp::Fsub, Type::Float)),
        BinOp::Div => Some((ValueOp::Fdiv, Type::Float)),
        BinOp::Lt => Some((ValueOp::Flt, Type::Bool)),
        BinOp::Le => Some((ValueOp::Fle, Type::Bool)),
        BinOp::Gt => Some((ValueOp::Fgt, Type::Bool)),
        BinOp::Ge => Some((ValueOp::Fge, Type::Bool)),
        BinOp::Eq => Some((ValueOp::Feq, Type::Bool)),
        _ => None,
    }
}
