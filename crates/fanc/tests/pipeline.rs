//! End-to-end runs of the FanC pipeline over source strings

use fanc::common::DiagnosticReporter;
use fanc::frontend::{CompileContext, FanCFrontend, FrontendConfig};
use fanc::types::Type;
use fanc::{CompileError, SemanticError};
use pretty_assertions::assert_eq;

fn semantic_error(source: &str) -> SemanticError {
    match fanc::compile(source) {
        Err(CompileError::Semantic { error, .. }) => error,
        Err(other) => panic!("expected a semantic error, got {:?}", other),
        Ok(_) => panic!("program was accepted"),
    }
}

#[test]
fn compiles_a_complete_program() {
    let source = r#"
        // Collatz steps, printed for the first few numbers
        int steps(int n) {
            int count = 0;
            while (not (n == 1)) {
                if (n - (n / 2) * 2 == 0) n = n / 2;
                else n = 3 * n + 1;
                count = count + 1;
            }
            return count;
        }

        void main() {
            int i = 1;
            while (i <= 5) {
                printi(steps(i));
                i = i + 1;
            }
            print("done");
        }
    "#;

    let ir = fanc::compile(source).unwrap().to_string();

    assert!(ir.starts_with("declare i32 @printf(i8*, ...)\n"));
    assert!(ir.contains("define i32 @steps(i32) {"));
    assert!(ir.contains("define void @main() {"));
    assert!(ir.contains(r#"c"done\00""#));
    assert_eq!(ir.matches("call void @check_division(i32 ").count(), 2);
    assert_eq!(ir.matches(" = sdiv i32 ").count(), 2);
}

#[test]
fn division_guard_message_is_present() {
    let ir = fanc::compile("void main() { printi(10 / 0); }").unwrap().to_string();
    assert!(ir.contains(r#"c"Error division by zero\00""#));
    assert!(ir.contains("call void @check_division(i32 0)"));
    assert!(ir.contains("= sdiv i32 10, 0"));
}

#[test]
fn reports_the_first_violation_only() {
    let source = "void main() {\n  byte b = 256b;\n  undefined = 1;\n}\n";
    assert_eq!(semantic_error(source), SemanticError::ValueOutOfRange(256));
}

#[test]
fn diagnostics_name_file_and_line() {
    let source = "void main() {\n  int x;\n  int x;\n}\n";
    let mut reporter = DiagnosticReporter::new();
    let file_id = reporter.add_file("dup.fanc", source);
    let ctx = CompileContext::new("dup.fanc".to_string(), file_id, &reporter);

    let err = FanCFrontend::new()
        .compile(source, &ctx, &FrontendConfig::default())
        .unwrap_err();

    assert_eq!(
        err.as_semantic(),
        Some(&SemanticError::DuplicateDeclaration("x".to_string()))
    );
    assert_eq!(reporter.line_of(file_id, err.span().unwrap()), Some(3));
    assert!(reporter.render(file_id, &err).contains("dup.fanc:3:3"));
}

#[test]
fn semantic_error_scenarios() {
    assert_eq!(
        semantic_error("bool f() { return 5; } void main() { }"),
        SemanticError::mismatch(Type::Bool, Type::Int)
    );
    assert_eq!(
        semantic_error("void main() { while (true) { break; } break; }"),
        SemanticError::MisplacedLoopControl("break")
    );
    assert_eq!(semantic_error("void helper() { }"), SemanticError::MissingMain);
    assert_eq!(
        semantic_error("void main() { print(\"a\", \"b\"); }"),
        SemanticError::ArityMismatch {
            function: "print".to_string(),
            expected: 1,
            found: 2,
        }
    );
}

#[test]
fn syntax_and_lexical_errors_surface() {
    assert!(matches!(
        fanc::compile("void main() { int x = 1 }"),
        Err(CompileError::Parser { .. })
    ));
    assert!(matches!(
        fanc::compile("void main() { int x = 1 % 2; }"),
        Err(CompileError::Lexer { .. })
    ));
}

#[test]
fn shadowed_variables_use_their_own_slots() {
    let source = "void main() { int x = 1; { int x = 2; printi(x); } printi(x); }";
    let ir = fanc::compile(source).unwrap().to_string();

    // Outer x lives in slot 0 and inner x in slot 1
    assert!(ir.contains("alloca i32, i32 2"));
    assert!(ir.contains("i32* %t1, i32 1"));
    assert_eq!(ir.matches("call void @printi(i32 %t").count(), 2);
}

#[test]
fn literal_and_comparison_limits() {
    assert_eq!(
        semantic_error("void main() { byte b = 99999999999999999999b; }"),
        SemanticError::ValueOutOfRange(i64::MAX)
    );
    assert!(matches!(
        fanc::compile("void main() { printi(3000000000); }"),
        Err(CompileError::Parser { .. })
    ));
    assert_eq!(
        semantic_error("void main() { if (\"a\" == \"a\") print(\"same\"); }"),
        SemanticError::mismatch("a comparable type", Type::String)
    );
}

#[test]
fn user_functions_do_not_shadow_the_runtime() {
    let ir = fanc::compile("void exit(int c) { } void main() { exit(1); printi(10 / 2); }")
        .unwrap()
        .to_string();
    assert_eq!(ir.matches("@exit(").count(), 2);
    assert!(ir.contains("define void @fanc.exit(i32) {"));
    assert!(ir.contains("call void @fanc.exit(i32 1)"));
}
