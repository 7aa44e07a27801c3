use super::{Lower, LowerError};
use crate::ir::ast::{AstNodeId, Expr, Param as AstParam, Stmt};
use crate::ir::ir::{Argument, EffectOp, ValueOp};
use crate::ir::typeck::{annotation_type, TypeOracle, PRINT_BUILTIN};

impl<'a, O: TypeOracle> Lower<'a, O> {
    pub fn lower_stmt(&mut self, stmt: &Stmt) -> Result<(), LowerError> {
        match stmt {
            Stmt::Block { statements, .. } => {
                for s in statements {
                    self.lower_stmt(s)?;
                }
                Ok(())
            }

            Stmt::VarDecl { id, name, init, .. } => self.lower_var_decl(*id, name, init.as_ref()),

            Stmt::Expr { expr, .. } => self.lower_expr_stmt(expr),

            Stmt::If {
                condition,
                then_branch,
                else_branch,
                ..
            } => self.lower_if(condition, then_branch, else_branch.as_deref()),

            Stmt::For {
                init,
                condition,
                update,
                body,
                ..
            } => self.lower_for(init.as_deref(), condition.as_ref(), update.as_ref(), body),

            Stmt::While { .. } => Err(LowerError::UnsupportedStatement("'while' loop".to_string())),

            Stmt::Function {
                name,
                params,
                return_annotation,
                body,
                ..
            } => self.lower_function(
                name.as_deref(),
                params,
                return_annotation.as_deref(),
                body.as_deref(),
            ),

            Stmt::Return { value, .. } => self.lower_return(value.as_ref()),
        }
    }

    /// `let name = init;`: lower the initializer, then `id`-copy it into
    /// the declared name. Declarations without initializers are no-ops.
    fn lower_var_decl(
        &mut self,
        id: AstNodeId,
        name: &str,
        init: Option<&Expr>,
    ) -> Result<(), LowerError> {
        let Some(init) = init else { return Ok(()) };
        let value = match init {
            // A call initializer lands directly in the declared name.
            Expr::Call {
                id: call_id,
                callee,
                args,
            } if callee.as_str() != PRINT_BUILTIN => {
                let ty = self.type_of(id)?;
                self.lower_call_value(*call_id, callee, args, Some((name.to_string(), ty)))?
            }
            _ => self.lower_expr(init)?,
        };
        let ty = self.type_of(id)?;
        self.builder
            .emit_value(ValueOp::Id, ty, vec![value.name], Some(name.to_string()));
        Ok(())
    }

    fn lower_expr_stmt(&mut self, expr: &Expr) -> Result<(), LowerError> {
        if let Expr::Call { callee, args, .. } = expr {
            return self.lower_call_effect(callee, args);
        }
        self.lower_expr(expr).map(|_| ())
    }

    /// The if diamond: branch to `then`/`else` labels, each branch a
    /// straight run ending at a shared `endif` label. Both branch targets
    /// are always emitted, even for an absent else branch.
    fn lower_if(
        &mut self,
        condition: &Expr,
        then_branch: &Stmt,
        else_branch: Option<&Stmt>,
    ) -> Result<(), LowerError> {
        let sfx = self.builder.fresh_suffix();
        let then_label = format!("then{sfx}");
        let else_label = format!("else{sfx}");
        let end_label = format!("endif{sfx}");

        let cond = self.lower_expr(condition)?;
        self.builder.emit_effect(
            EffectOp::Br,
            vec![cond.name],
            vec![then_label.clone(), else_label.clone()],
        );

        self.builder.emit_label(&then_label);
        self.lower_stmt(then_branch)?;
        self.builder
            .emit_effect(EffectOp::Jmp, Vec::new(), vec![end_label.clone()]);
        self.builder.emit_label(&else_label);
        if let Some(else_branch) = else_branch {
            self.lower_stmt(else_branch)?;
        }
        self.builder.emit_label(&end_label);
        Ok(())
    }

    /// Header-test loop shape. An absent condition means the loop is
    /// entered unconditionally: no branch, fallthrough into the body.
    fn lower_for(
        &mut self,
        init: Option<&Stmt>,
        condition: Option<&Expr>,
        update: Option<&Expr>,
        body: &Stmt,
    ) -> Result<(), LowerError> {
        let sfx = self.builder.fresh_suffix();
        let cond_label = format!("for.cond{sfx}");
        let body_label = format!("for.body{sfx}");
        let end_label = format!("for.end{sfx}");

        if let Some(init) = init {
            self.lower_stmt(init)?;
        }

        self.builder.emit_label(&cond_label);
        if let Some(condition) = condition {
            let cond = self.lower_expr(condition)?;
            self.builder.emit_effect(
                EffectOp::Br,
                vec![cond.name],
                vec![body_label.clone(), end_label.clone()],
            );
        }

        self.builder.emit_label(&body_label);
        self.lower_stmt(body)?;
        if let Some(update) = update {
            // Side effect only; the value is discarded.
            self.lower_expr(update)?;
        }
        self.builder
            .emit_effect(EffectOp::Jmp, Vec::new(), vec![cond_label.clone()]);
        self.builder.emit_label(&end_label);
        Ok(())
    }

    /// Start a new IR function; subsequent instructions are emitted there.
    fn lower_function(
        &mut self,
        name: Option<&str>,
        params: &[AstParam],
        return_annotation: Option<&str>,
        body: Option<&[Stmt]>,
    ) -> Result<(), LowerError> {
        let Some(name) = name else {
            return Err(LowerError::UnsupportedConstruct(
                "anonymous function declaration".to_string(),
            ));
        };
        let mut args = Vec::with_capacity(params.len());
        for p in params {
            let ty = self.type_of(p.id)?;
            args.push(Argument {
                name: p.name.clone(),
                ty,
            });
        }
        let return_type = match return_annotation {
            None | Some("void") => None,
            Some(ann) => Some(annotation_type(ann).ok_or_else(|| {
                LowerError::UnsupportedConstruct(format!("function return type '{}'", ann))
            })?),
        };
        self.builder.start_function(name, args, return_type);
        if let Some(body) = body {
            for s in body {
                self.lower_stmt(s)?;
            }
        }
        Ok(())
    }

    fn lower_return(&mut self, value: Option<&Expr>) -> Result<(), LowerError> {
        match value {
            Some(value) => {
                let v = self.lower_expr(value)?;
                self.builder
                    .emit_effect(EffectOp::Ret, vec![v.name], Vec::new());
            }
            None => self.builder.emit_effect(EffectOp::Ret, Vec::new(), Vec::new()),
        }
        Ok(())
    }
}
