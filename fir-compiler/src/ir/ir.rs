// A flat, typed, three-address IR with labels, jumps, and branches.
// Serializes to one JSON object per function with an ordered `instrs` array.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Type {
    Int,
    Bool,
    Float,
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Type::Int => "int",
            Type::Bool => "bool",
            Type::Float => "float",
        };
        write!(f, "{}", s)
    }
}

/// A constant's payload. JSON form is the bare value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Literal {
    Int(i64),
    Bool(bool),
    Float(f64),
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Int(v) => write!(f, "{}", v),
            Literal::Bool(v) => write!(f, "{}", v),
            Literal::Float(v) => write!(f, "{}", v),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConstOp {
    Const,
}

/// Opcodes of value-producing instructions. The `f`-prefixed family is
/// selected whenever either operand of the source expression is float-typed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueOp {
    Add,
    Mul,
    Sub,
    Div,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Fadd,
    Fmul,
    Fsub,
    Fdiv,
    Flt,
    Fle,
    Fgt,
    Fge,
    Feq,
    Id,
    Call,
}

impl fmt::Display for ValueOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ValueOp::Add => "add",
            ValueOp::Mul => "mul",
            ValueOp::Sub => "sub",
            ValueOp::Div => "div",
            ValueOp::Lt => "lt",
            ValueOp::Le => "le",
            ValueOp::Gt => "gt",
            ValueOp::Ge => "ge",
            ValueOp::Eq => "eq",
            ValueOp::Fadd => "fadd",
            ValueOp::Fmul => "fmul",
            ValueOp::Fsub => "fsub",
            ValueOp::Fdiv => "fdiv",
            ValueOp::Flt => "flt",
            ValueOp::Fle => "fle",
            ValueOp::Fgt => "fgt",
            ValueOp::Fge => "fge",
            ValueOp::Feq => "feq",
            ValueOp::Id => "id",
            ValueOp::Call => "call",
        };
        write!(f, "{}", s)
    }
}

/// Opcodes of instructions that produce no named result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EffectOp {
    Jmp,
    Br,
    Ret,
    Print,
    Call,
}

impl fmt::Display for EffectOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EffectOp::Jmp => "jmp",
            EffectOp::Br => "br",
            EffectOp::Ret => "ret",
            EffectOp::Print => "print",
            EffectOp::Call => "call",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Instr {
    /// `dest: type = const value`
    Constant {
        op: ConstOp,
        dest: String,
        #[serde(rename = "type")]
        ty: Type,
        value: Literal,
    },

    /// `dest: type = op args...` (calls additionally carry the callee name)
    Value {
        op: ValueOp,
        dest: String,
        #[serde(rename = "type")]
        ty: Type,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        args: Vec<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        funcs: Vec<String>,
    },

    /// Control transfer, printing, or a call with a discarded result
    Effect {
        op: EffectOp,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        args: Vec<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        funcs: Vec<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        labels: Vec<String>,
    },

    /// `name:`, a jump target, unique within its function
    Label { label: String },
}

/// A typed function parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Argument {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: Type,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Function {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<Argument>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub return_type: Option<Type>,
    pub instrs: Vec<Instr>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub functions: Vec<Function>,
}

impl Program {
    pub fn new() -> Self {
        Self {
            functions: Vec::new(),
        }
    }

    pub fn to_lines(&self) -> Vec<String> {
        let mut out = Vec::new();
        for func in &self.functions {
            out.push(function_header(func));
            for ins in &func.instrs {
                match ins {
                    Instr::Label { label } => out.push(format!("{}:", label)),
                    Instr::Constant {
                        dest, ty, value, ..
                    } => out.push(format!("  {}: {} = const {}", dest, ty, value)),
                    Instr::Value {
                        op: ValueOp::Call,
                        dest,
                        ty,
                        args,
                        funcs,
                    } => {
                        let mut line = format!("  {}: {} = call", dest, ty);
                        push_call_operands(&mut line, funcs, args);
                        out.push(line);
                    }
                    Instr::Value {
                        op, dest, ty, args, ..
                    } => out.push(format!("  {}: {} = {} {}", dest, ty, op, args.join(" "))),
                    Instr::Effect {
                        op: EffectOp::Call,
                        args,
                        funcs,
                        ..
                    } => {
                        let mut line = "  call".to_string();
                        push_call_operands(&mut line, funcs, args);
                        out.push(line);
                    }
                    Instr::Effect {
                        op, args, labels, ..
                    } => {
                        let mut line = format!("  {}", op);
                        for a in args {
                            line.push(' ');
                            line.push_str(a);
                        }
                        for l in labels {
                            line.push(' ');
                            line.push_str(l);
                        }
                        out.push(line);
                    }
                }
            }
            out.push("}".to_string());
        }
        out
    }
}

fn function_header(func: &Function) -> String {
    let mut header = format!("func {}(", func.name);
    for (i, arg) in func.args.iter().enumerate() {
        if i > 0 {
            header.push_str(", ");
        }
        header.push_str(&format!("{}: {}", arg.name, arg.ty));
    }
    header.push(')');
    if let Some(ret) = func.return_type {
        header.push_str(&format!(": {}", ret));
    }
    header.push_str(" {");
    header
}

fn push_call_operands(line: &mut String, funcs: &[String], args: &[String]) {
    for f in funcs {
        line.push_str(" @");
        line.push_str(f);
    }
    for a in args {
        line.push(' ');
        line.push_str(a);
    }
}
