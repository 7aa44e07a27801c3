use std::collections::HashSet;

use fir_compiler::compile_to_ir;
use fir_compiler::ir::ast::{AstNodeId, Expr, Program as Ast, Stmt};
use fir_compiler::ir::builder::Builder;
use fir_compiler::ir::lower::lower;
use fir_compiler::ir::typeck::TypeMap;
use fir_compiler::ir::{EffectOp, Instr, Program, Type, ValueOp};

fn text(source: &str) -> String {
    compile_to_ir(source)
        .expect("program should compile")
        .to_lines()
        .join("\n")
}

fn all_labels(program: &Program) -> Vec<String> {
    program
        .functions
        .iter()
        .flat_map(|f| f.instrs.iter())
        .filter_map(|i| match i {
            Instr::Label { label } => Some(label.clone()),
            _ => None,
        })
        .collect()
}

fn has_branch(program: &Program) -> bool {
    program.functions.iter().flat_map(|f| f.instrs.iter()).any(
        |i| matches!(i, Instr::Effect { op: EffectOp::Br, .. }),
    )
}

// ── Literals ─────────────────────────────────────────────────────────────

#[test]
fn numeric_literal_is_float_typed() {
    let ir = compile_to_ir("let x = 1;").unwrap();
    let main = &ir.functions[0];
    assert!(
        matches!(
            &main.instrs[0],
            Instr::Constant { ty: Type::Float, .. }
        ),
        "plain numeric literals must become float constants, got {:?}",
        main.instrs[0]
    );
}

#[test]
fn big_integer_literal_is_int_typed_and_round_trips() {
    let ir = compile_to_ir("let x = 9007199254740993n;").unwrap();
    let main = &ir.functions[0];
    match &main.instrs[0] {
        Instr::Constant { ty, value, .. } => {
            assert_eq!(*ty, Type::Int);
            assert_eq!(
                format!("{}", value),
                "9007199254740993",
                "int literals must round-trip exactly"
            );
        }
        other => panic!("expected a constant, got {:?}", other),
    }
}

#[test]
fn boolean_literal_is_bool_typed() {
    let ir = compile_to_ir("let x = true;").unwrap();
    assert!(matches!(
        &ir.functions[0].instrs[0],
        Instr::Constant { ty: Type::Bool, .. }
    ));
}

// ── Straight-line lowering ───────────────────────────────────────────────

#[test]
fn int_addition_lowers_to_two_constants_one_add_one_copy() {
    let expected = vec![
        "func main() {",
        "  v0: int = const 1",
        "  v1: int = const 2",
        "  v2: int = add v0 v1",
        "  x: int = id v2",
        "}",
    ];
    let ir = compile_to_ir("let x = 1n + 2n;").unwrap();
    assert_eq!(ir.to_lines(), expected);
}

#[test]
fn identifier_reads_re_materialize_through_id_copies() {
    let ir_text = text("let a = 1n;\nlet b = a;");
    assert!(
        ir_text.contains("a: int = id v0"),
        "declaration should copy into the declared name, got:\n{}",
        ir_text
    );
    assert!(
        ir_text.contains("v1: int = id a"),
        "reading a variable should emit a fresh id copy, got:\n{}",
        ir_text
    );
}

#[test]
fn assignment_reuses_the_variable_name_as_destination() {
    let ir_text = text("let x = 0n;\nx = 5n;");
    assert!(
        ir_text.contains("x: int = id v1"),
        "assignment should write through an id into the variable's own name, got:\n{}",
        ir_text
    );
}

// ── Float family dispatch ────────────────────────────────────────────────

#[test]
fn mixed_arithmetic_selects_the_float_family() {
    let ir_text = text("let a = 1;\nlet b = 2n;\nlet c = a + b;");
    assert!(
        ir_text.contains("= fadd "),
        "either operand float must select fadd, got:\n{}",
        ir_text
    );
    assert!(
        !ir_text.contains("= add "),
        "no non-float opcode may appear, got:\n{}",
        ir_text
    );
}

#[test]
fn mixed_comparison_selects_the_float_family() {
    let ir_text = text("let a = 1;\nlet b = 2n;\nlet d = b < a;");
    assert!(
        ir_text.contains("= flt "),
        "either operand float must select flt, got:\n{}",
        ir_text
    );
    assert!(!ir_text.contains("= lt "), "got:\n{}", ir_text);
}

#[test]
fn pure_int_comparison_stays_in_the_non_float_family() {
    let ir_text = text("let a = 1n;\nlet b = 2n;\nlet d = a < b;");
    assert!(ir_text.contains("= lt "), "got:\n{}", ir_text);
    assert!(!ir_text.contains("= flt "), "got:\n{}", ir_text);
}

// ── Conditionals ─────────────────────────────────────────────────────────

#[test]
fn if_else_lowers_to_a_three_label_diamond() {
    let source = r#"
        let a = 1n;
        let b = 2n;
        let x = 0n;
        if (a < b) {
            x = 1n;
        } else {
            x = 2n;
        }
    "#;
    let ir = compile_to_ir(source).unwrap();
    let ir_text = ir.to_lines().join("\n");

    assert!(
        ir_text.contains("br v5 then.0 else.0"),
        "condition should branch to the then/else labels, got:\n{}",
        ir_text
    );
    for label in ["then.0:", "else.0:", "endif.0:"] {
        assert!(ir_text.contains(label), "missing {} in:\n{}", label, ir_text);
    }
    assert!(
        ir_text.contains("jmp endif.0"),
        "then branch must jump to the merge label, got:\n{}",
        ir_text
    );
    // Both paths assign a distinct constant into x via an id copy.
    assert_eq!(ir_text.matches("x: int = id").count(), 3); // decl + both branches
    assert_eq!(all_labels(&ir).len(), 3);
}

#[test]
fn if_without_else_still_emits_both_branch_targets() {
    let ir = compile_to_ir("if (true) { print(1n); }").unwrap();
    let labels = all_labels(&ir);
    assert_eq!(labels, vec!["then.0", "else.0", "endif.0"]);
}

#[test]
fn nested_ifs_get_distinct_label_families() {
    let source = r#"
        if (true) {
            if (true) { print(1n); } else { print(2n); }
        } else {
            if (false) { print(3n); }
        }
    "#;
    let ir = compile_to_ir(source).unwrap();
    let labels = all_labels(&ir);
    assert_eq!(labels.len(), 9, "three ifs emit three labels each");
    let unique: HashSet<&String> = labels.iter().collect();
    assert_eq!(unique.len(), 9, "labels must never collide: {:?}", labels);
}

// ── Loops ────────────────────────────────────────────────────────────────

#[test]
fn for_loop_lowers_to_the_header_test_shape() {
    let source = "for (let i = 0n; i < 3n; i = i + 1n) { print(i); }";
    let ir_text = text(source);
    for needle in [
        "i: int = id v0",
        "for.cond.0:",
        "br v3 for.body.0 for.end.0",
        "for.body.0:",
        "jmp for.cond.0",
        "for.end.0:",
    ] {
        assert!(ir_text.contains(needle), "missing {:?} in:\n{}", needle, ir_text);
    }
    // The initializer runs before the condition label.
    let init_at = ir_text.find("i: int = id v0").unwrap();
    let cond_at = ir_text.find("for.cond.0:").unwrap();
    assert!(init_at < cond_at);
}

#[test]
fn for_loop_update_runs_before_the_back_edge() {
    let ir_text = text("for (let i = 0n; i < 3n; i = i + 1n) { print(i); }");
    let update_at = ir_text.rfind("i: int = id").unwrap();
    let jmp_at = ir_text.find("jmp for.cond.0").unwrap();
    assert!(
        update_at < jmp_at,
        "the incrementor must be lowered before the jump back, got:\n{}",
        ir_text
    );
}

#[test]
fn condition_less_for_emits_no_branch() {
    let ir = compile_to_ir("for (;;) { print(1n); }").unwrap();
    assert!(
        !has_branch(&ir),
        "a for without a condition falls through into the body"
    );
    let ir_text = ir.to_lines().join("\n");
    for needle in ["for.cond.0:", "for.body.0:", "jmp for.cond.0", "for.end.0:"] {
        assert!(ir_text.contains(needle), "missing {:?} in:\n{}", needle, ir_text);
    }
}

// ── Calls and print ──────────────────────────────────────────────────────

#[test]
fn print_statement_emits_one_effect_and_nothing_else() {
    let expected = vec![
        "func main() {",
        "  v0: float = const 1",
        "  v1: float = const 2",
        "  print v0 v1",
        "}",
    ];
    let ir = compile_to_ir("print(1, 2);").unwrap();
    assert_eq!(ir.to_lines(), expected);
}

#[test]
fn statement_call_is_effect_only() {
    let source = r#"
        ping();
        function ping() {
            print(1n);
        }
    "#;
    let ir = compile_to_ir(source).unwrap();
    let main = &ir.functions[0];
    assert_eq!(main.instrs.len(), 1, "no placeholder constant for a statement call");
    match &main.instrs[0] {
        Instr::Effect {
            op: EffectOp::Call,
            funcs,
            ..
        } => assert_eq!(funcs, &["ping".to_string()]),
        other => panic!("expected a call effect, got {:?}", other),
    }
}

#[test]
fn call_initializer_lands_in_the_declared_name() {
    let source = r#"
        let x = one();
        print(x);
        function one(): bigint {
            return 1n;
        }
    "#;
    let ir = compile_to_ir(source).unwrap();
    let main = &ir.functions[0];
    match &main.instrs[0] {
        Instr::Value {
            op: ValueOp::Call,
            dest,
            ty,
            funcs,
            ..
        } => {
            assert_eq!(dest, "x");
            assert_eq!(*ty, Type::Int);
            assert_eq!(funcs, &["one".to_string()]);
        }
        other => panic!("expected a value call, got {:?}", other),
    }
    // The declaration still emits its id copy afterwards.
    assert!(matches!(
        &main.instrs[1],
        Instr::Value { op: ValueOp::Id, dest, .. } if dest == "x"
    ));
}

#[test]
fn print_in_value_position_yields_a_placeholder_result() {
    let ir_text = text("let x = 0n;\nx = print(x);");
    assert!(
        ir_text.contains("v2: int = const 0"),
        "print used as a value must synthesize an integer-zero placeholder, got:\n{}",
        ir_text
    );
    assert!(
        ir_text.contains("x: int = id v2"),
        "the placeholder feeds the assignment, got:\n{}",
        ir_text
    );
}

// ── Functions and returns ────────────────────────────────────────────────

#[test]
fn function_declaration_starts_a_typed_ir_function() {
    let source = r#"
        function mul(a: number, b: number): number {
            return a * b;
        }
    "#;
    let ir = compile_to_ir(source).unwrap();
    assert_eq!(ir.functions.len(), 2);
    let mul = &ir.functions[1];
    assert_eq!(mul.name, "mul");
    assert_eq!(mul.args.len(), 2);
    assert_eq!(mul.args[0].name, "a");
    assert_eq!(mul.args[0].ty, Type::Float);
    assert_eq!(mul.return_type, Some(Type::Float));

    let ir_text = ir.to_lines().join("\n");
    assert!(ir_text.contains("func mul(a: float, b: float): float {"));
    assert!(ir_text.contains("= fmul "));
    assert!(ir_text.contains("ret v2"));
}

#[test]
fn void_function_returns_nothing() {
    let source = r#"
        function g(): void {
            return;
        }
    "#;
    let ir = compile_to_ir(source).unwrap();
    let g = &ir.functions[1];
    assert_eq!(g.return_type, None);
    assert!(matches!(
        &g.instrs[0],
        Instr::Effect { op: EffectOp::Ret, args, .. } if args.is_empty()
    ));
}

#[test]
fn ambient_function_declaration_is_an_empty_function() {
    let ir = compile_to_ir("function ext(x: bigint): bigint;").unwrap();
    let ext = &ir.functions[1];
    assert_eq!(ext.name, "ext");
    assert!(ext.instrs.is_empty());
    assert_eq!(ext.return_type, Some(Type::Int));
}

// ── Determinism ──────────────────────────────────────────────────────────

#[test]
fn lowering_the_same_source_twice_is_idempotent() {
    let source = r#"
        let a = 1n;
        let b = 2;
        if (a < 3n) {
            print(a);
        }
        for (let i = 0n; i < a; i = i + 1n) {
            print(i);
        }
    "#;
    let first = compile_to_ir(source).unwrap();
    let second = compile_to_ir(source).unwrap();
    assert_eq!(first, second);
}

// ── Builder naming ───────────────────────────────────────────────────────

#[test]
fn builder_suffixes_and_temporaries_never_repeat() {
    let mut b = Builder::new();
    b.start_function("main", Vec::new(), None);
    let suffixes: Vec<String> = (0..4).map(|_| b.fresh_suffix()).collect();
    let unique: HashSet<&String> = suffixes.iter().collect();
    assert_eq!(unique.len(), suffixes.len());

    let d0 = b.build_int(1);
    let d1 = b.build_int(2);
    assert_ne!(d0.name, d1.name);
}

// ── Synthetic AST with a hand-built oracle ───────────────────────────────

#[test]
fn lowering_accepts_a_synthetic_ast_and_mock_oracle() {
    // x = 5n; assignment into an already-bound integer variable.
    let assign = Expr::Assign {
        id: AstNodeId(3),
        target: Box::new(Expr::Ident(AstNodeId(1), "x".to_string())),
        value: Box::new(Expr::BigInt(AstNodeId(2), 5)),
    };
    let ast = Ast {
        statements: vec![Stmt::Expr {
            id: AstNodeId(0),
            expr: assign,
        }],
    };

    let mut types = TypeMap::new();
    types.insert(AstNodeId(1), Type::Int);

    let program = lower(&ast, &types).unwrap();
    let main = &program.functions[0];
    assert_eq!(main.name, "main");
    assert_eq!(main.instrs.len(), 2);
    assert!(matches!(
        &main.instrs[1],
        Instr::Value { op: ValueOp::Id, dest, ty: Type::Int, .. } if dest == "x"
    ));
}
