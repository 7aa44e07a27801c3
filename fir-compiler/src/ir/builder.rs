use crate::ir::ir::{
    Argument, ConstOp, EffectOp, Function, Instr, Literal, Program, Type, ValueOp,
};

/// The (name, type) pair a value-producing emission hands back; the only
/// channel through which lowered sub-results compose.
#[derive(Debug, Clone)]
pub struct ValueRef {
    pub name: String,
    pub ty: Type,
}

/// Sequence-safe construction of a well-formed `Program`.
///
/// Instructions are appended to the most recently started function. The
/// temporary and suffix counters are monotonic for the builder's lifetime,
/// so generated names never collide across sibling or nested control
/// structures.
#[derive(Debug)]
pub struct Builder {
    program: Program,
    temp_count: usize,
    suffix_count: usize,
}

impl Builder {
    pub fn new() -> Self {
        Self {
            program: Program::new(),
            temp_count: 0,
            suffix_count: 0,
        }
    }

    /// Appends a new function and makes it the current emission target.
    pub fn start_function(&mut self, name: &str, args: Vec<Argument>, return_type: Option<Type>) {
        self.program.functions.push(Function {
            name: name.to_string(),
            args,
            return_type,
            instrs: Vec::new(),
        });
    }

    fn current(&mut self) -> &mut Function {
        match self.program.functions.last_mut() {
            Some(f) => f,
            None => unreachable!("instruction emitted before any function was started"),
        }
    }

    fn fresh_dest(&mut self) -> String {
        let name = format!("v{}", self.temp_count);
        self.temp_count += 1;
        name
    }

    /// Returns a suffix distinct from every previous call, for building
    /// collision-free label-name families per control-structure instance.
    pub fn fresh_suffix(&mut self) -> String {
        let sfx = format!(".{}", self.suffix_count);
        self.suffix_count += 1;
        sfx
    }

    /// Appends a value instruction; synthesizes a fresh destination when
    /// none is given. Returns the destination so the caller can thread it.
    pub fn emit_value(
        &mut self,
        op: ValueOp,
        ty: Type,
        args: Vec<String>,
        dest: Option<String>,
    ) -> ValueRef {
        let dest = match dest {
            Some(d) => d,
            None => self.fresh_dest(),
        };
        self.current().instrs.push(Instr::Value {
            op,
            dest: dest.clone(),
            ty,
            args,
            funcs: Vec::new(),
        });
        ValueRef { name: dest, ty }
    }

    pub fn emit_const(&mut self, ty: Type, value: Literal, dest: Option<String>) -> ValueRef {
        let dest = match dest {
            Some(d) => d,
            None => self.fresh_dest(),
        };
        self.current().instrs.push(Instr::Constant {
            op: ConstOp::Const,
            dest: dest.clone(),
            ty,
            value,
        });
        ValueRef { name: dest, ty }
    }

    pub fn build_int(&mut self, value: i64) -> ValueRef {
        self.emit_const(Type::Int, Literal::Int(value), None)
    }

    pub fn build_float(&mut self, value: f64) -> ValueRef {
        self.emit_const(Type::Float, Literal::Float(value), None)
    }

    pub fn build_bool(&mut self, value: bool) -> ValueRef {
        self.emit_const(Type::Bool, Literal::Bool(value), None)
    }

    pub fn emit_effect(&mut self, op: EffectOp, args: Vec<String>, labels: Vec<String>) {
        self.current().instrs.push(Instr::Effect {
            op,
            args,
            funcs: Vec::new(),
            labels,
        });
    }

    /// Call producing a value, typed by the caller.
    pub fn emit_call_value(
        &mut self,
        func: &str,
        args: Vec<String>,
        ty: Type,
        dest: Option<String>,
    ) -> ValueRef {
        let dest = match dest {
            Some(d) => d,
            None => self.fresh_dest(),
        };
        self.current().instrs.push(Instr::Value {
            op: ValueOp::Call,
            dest: dest.clone(),
            ty,
            args,
            funcs: vec![func.to_string()],
        });
        ValueRef { name: dest, ty }
    }

    /// Call whose result (if any) is discarded.
    pub fn emit_call_effect(&mut self, func: &str, args: Vec<String>) {
        self.current().instrs.push(Instr::Effect {
            op: EffectOp::Call,
            args,
            funcs: vec![func.to_string()],
            labels: Vec::new(),
        });
    }

    pub fn emit_label(&mut self, name: &str) {
        self.current().instrs.push(Instr::Label {
            label: name.to_string(),
        });
    }

    pub fn finish(self) -> Program {
        self.program
    }
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}
