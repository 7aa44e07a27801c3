use fir_compiler::ir::lower::LowerError;
use fir_compiler::ir::typeck::TypeError;
use fir_compiler::{compile_to_ir, CompileError};

// ── Helpers ──────────────────────────────────────────────────────────────

fn lower_err(source: &str) -> LowerError {
    match compile_to_ir(source) {
        Err(CompileError::Lower(e)) => e,
        other => panic!("expected a lowering error, got {:?}", other),
    }
}

fn type_err(source: &str) -> TypeError {
    match compile_to_ir(source) {
        Err(CompileError::Type(e)) => e,
        other => panic!("expected a type error, got {:?}", other),
    }
}

// ── Unsupported statements ───────────────────────────────────────────────

#[test]
fn while_loops_are_unsupported() {
    let e = lower_err("while (true) { print(1n); }");
    assert!(
        matches!(e, LowerError::UnsupportedStatement(_)),
        "got {:?}",
        e
    );
}

// ── Unsupported operators ────────────────────────────────────────────────

#[test]
fn modulo_has_no_opcode_in_either_family() {
    let e = lower_err("let m = 1n % 2n;");
    assert!(matches!(e, LowerError::UnsupportedOperator { .. }), "got {:?}", e);

    let e = lower_err("let m = 1 % 2;");
    assert!(matches!(e, LowerError::UnsupportedOperator { .. }), "got {:?}", e);
}

#[test]
fn inequality_operator_is_unsupported() {
    let e = lower_err("let q = 1n != 2n;");
    assert!(matches!(e, LowerError::UnsupportedOperator { .. }), "got {:?}", e);
}

#[test]
fn logical_operators_are_unsupported() {
    let e = lower_err("let q = true && false;");
    assert!(matches!(e, LowerError::UnsupportedOperator { .. }), "got {:?}", e);

    let e = lower_err("let q = true || false;");
    assert!(matches!(e, LowerError::UnsupportedOperator { .. }), "got {:?}", e);
}

// ── Unsupported expressions ──────────────────────────────────────────────

#[test]
fn string_literals_are_unsupported() {
    let e = lower_err(r#"let s = "abc";"#);
    assert!(matches!(e, LowerError::UnsupportedExpression(_)), "got {:?}", e);
}

#[test]
fn unary_expressions_are_unsupported() {
    let e = lower_err("let n = -1;");
    assert!(matches!(e, LowerError::UnsupportedExpression(_)), "got {:?}", e);
}

#[test]
fn index_expressions_are_unsupported() {
    let e = lower_err("let a = 1n;\nlet b = a[0n];");
    assert!(matches!(e, LowerError::UnsupportedExpression(_)), "got {:?}", e);
}

// ── Unsupported constructs ───────────────────────────────────────────────

#[test]
fn assignment_to_an_index_target_is_unsupported() {
    let e = lower_err("let a = 1n;\na[0n] = 2n;");
    assert!(matches!(e, LowerError::UnsupportedConstruct(_)), "got {:?}", e);
}

#[test]
fn anonymous_functions_are_unsupported() {
    let e = lower_err("function (x: number) { return x; }");
    assert!(matches!(e, LowerError::UnsupportedConstruct(_)), "got {:?}", e);
}

#[test]
fn unknown_return_annotation_is_unsupported_and_emits_no_function_body() {
    let e = lower_err("function f(): string { return 1n; }");
    match e {
        LowerError::UnsupportedConstruct(msg) => {
            assert!(msg.contains("string"), "error should name the annotation: {}", msg)
        }
        other => panic!("got {:?}", other),
    }
}

// ── Type errors (reported before lowering) ───────────────────────────────

#[test]
fn undefined_variable() {
    let e = type_err("let x = y + 1n;");
    assert!(matches!(e, TypeError::UndefinedVariable(_)), "got {:?}", e);
}

#[test]
fn undefined_function() {
    let e = type_err("let x = foo(1n);");
    assert!(matches!(e, TypeError::UndefinedFunction(_)), "got {:?}", e);
}

#[test]
fn argument_count_mismatch() {
    let source = r#"
        function add2(a: bigint, b: bigint): bigint {
            return a + b;
        }
        let x = add2(1n);
    "#;
    let e = type_err(source);
    assert!(
        matches!(
            e,
            TypeError::ArgumentCountMismatch {
                expected: 2,
                got: 1,
                ..
            }
        ),
        "got {:?}",
        e
    );
}

#[test]
fn argument_type_mismatch() {
    let source = r#"
        function h(a: bigint): bigint {
            return a;
        }
        let x = h(1.5);
    "#;
    let e = type_err(source);
    assert!(matches!(e, TypeError::Mismatch { .. }), "got {:?}", e);
}

#[test]
fn annotation_and_initializer_must_agree() {
    let e = type_err("let x: bigint = 1;");
    assert!(matches!(e, TypeError::Mismatch { .. }), "got {:?}", e);
}

#[test]
fn unknown_declaration_annotation() {
    let e = type_err("let x: string = 1;");
    assert!(matches!(e, TypeError::UnknownAnnotation(_)), "got {:?}", e);
}

#[test]
fn non_boolean_condition_is_rejected() {
    let e = type_err("if (1n) { print(1n); }");
    assert!(matches!(e, TypeError::Mismatch { .. }), "got {:?}", e);
}

// ── Frontend errors ──────────────────────────────────────────────────────

#[test]
fn parse_error_carries_a_position() {
    match compile_to_ir("let = 1;") {
        Err(CompileError::Parse { line, col, .. }) => {
            assert_eq!(line, 1);
            assert!(col >= 1);
        }
        other => panic!("expected a parse error, got {:?}", other),
    }
}

#[test]
fn lexical_error_names_the_offending_character() {
    match compile_to_ir("let x = 1 @ 2;") {
        Err(CompileError::Lexical(e)) => assert_eq!(e.unexpected_char, '@'),
        other => panic!("expected a lexical error, got {:?}", other),
    }
}
