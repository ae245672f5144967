//! semantic module tests

use super::*;
use crate::ir::{IrBinOp, IrOp};
use crate::lexer::tokenize;
use crate::parser::parse;
use pretty_assertions::assert_eq;

fn lower_src(source: &str) -> Result<IrProgram, SemanticError> {
    lower(&parse(&tokenize(source).unwrap()).unwrap())
}

/// Instructions of the entry function without FUNC_BEGIN / FUNC_END, as text
fn entry_lines(source: &str) -> Vec<String> {
    let ir = lower_src(source).unwrap();
    let body = &ir.entry.body;
    body[1..body.len() - 1]
        .iter()
        .map(|i| i.to_string())
        .collect()
}

fn function_lines(source: &str, name: &str) -> Vec<String> {
    let ir = lower_src(source).unwrap();
    ir.function(name)
        .unwrap()
        .body
        .iter()
        .map(|i| i.to_string())
        .collect()
}

fn mismatch_reason(source: &str) -> String {
    match lower_src(source).unwrap_err() {
        SemanticError::TypeMismatch { reason, .. } => reason,
        other => panic!("expected type mismatch, got {other:?}"),
    }
}

#[test]
fn test_first_assignment_declares() {
    assert_eq!(entry_lines("x = 5\n"), vec!["DECLARE x:int", "ASSIGN x = 5"]);
}

#[test]
fn test_reassignment_does_not_redeclare() {
    assert_eq!(
        entry_lines("x = 5\nx = x + 1\n"),
        vec!["DECLARE x:int", "ASSIGN x = 5", "ASSIGN x = (add x 1)"]
    );
}

#[test]
fn test_annotation_widens_declaration() {
    assert_eq!(
        entry_lines("ratio: float = 1\nratio = ratio / 2\n"),
        vec![
            "DECLARE ratio:float",
            "ASSIGN ratio = 1",
            "ASSIGN ratio = (div ratio 2)"
        ]
    );
}

#[test]
fn test_entry_function_shape() {
    let ir = lower_src("").unwrap();
    assert!(ir.functions.is_empty());
    assert_eq!(ir.entry.name, ENTRY_FUNCTION);
    assert_eq!(ir.entry.ret, Type::Int);
    assert_eq!(ir.entry.body.len(), 2);
    assert_eq!(ir.entry.body[0].op(), IrOp::FuncBegin);
    assert_eq!(ir.entry.body[1].op(), IrOp::FuncEnd);
}

#[test]
fn test_function_with_string_concat() {
    let source = "def greet(name):\n    print(\"Hello, \" + name)\ngreet(\"World\")\n";
    assert_eq!(
        function_lines(source, "greet"),
        vec![
            "FUNC_BEGIN greet(name:string)",
            "PRINT (concat \"Hello, \" name)",
            "FUNC_END"
        ]
    );
    assert_eq!(entry_lines(source), vec!["CALL greet(\"World\")"]);
}

#[test]
fn test_parameter_types_come_from_first_call() {
    let source = "def twice(n):\n    return n * 2\nprint(twice(21))\n";
    assert_eq!(
        function_lines(source, "twice"),
        vec![
            "FUNC_BEGIN twice(n:int) -> int",
            "RETURN (mul n 2)",
            "FUNC_END"
        ]
    );
}

#[test]
fn test_uncalled_function_defaults_to_string_params() {
    let source = "def shout(word):\n    print(word + \"!\")\n";
    let ir = lower_src(source).unwrap();
    let shout = ir.function("shout").unwrap();
    assert_eq!(shout.params, vec![("word".to_string(), Type::String)]);
    assert_eq!(shout.ret, Type::Void);
}

#[test]
fn test_uncalled_function_with_numeric_body_is_rejected() {
    // without a call there is no argument to take `n`'s type from
    let source = "def double(n):\n    return n * 2\n";
    assert_eq!(
        mismatch_reason(source),
        "unsupported operand types for '*': string and int"
    );
    assert!(lower_src("def double(n: int):\n    return n * 2\n").is_ok());
    assert!(lower_src("def double(n):\n    return n * 2\nprint(double(4))\n").is_ok());
}

#[test]
fn test_call_statements_lower_to_call_instructions() {
    let source = "def hello():\n    print(\"hi\")\nhello()\nabs(2)\nlen(\"abc\")\n";
    assert_eq!(
        entry_lines(source),
        vec!["CALL hello()", "CALL abs(2)", "CALL len(\"abc\")"]
    );
}

#[test]
fn test_functions_keep_source_order() {
    let source = "def a():\n    print(1)\ndef b():\n    print(2)\nb()\na()\n";
    let ir = lower_src(source).unwrap();
    let names: Vec<_> = ir.functions.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["a", "b"]);
}

#[test]
fn test_call_before_definition() {
    let source = "print(square(3))\ndef square(v: int) -> int:\n    return v * v\n";
    assert_eq!(entry_lines(source), vec!["PRINT (call square 3)"]);
}

#[test]
fn test_recursive_function_with_known_return() {
    let source = "\
def fact(n):
    if n <= 1:
        return 1
    return n * fact(n - 1)
print(fact(5))
";
    let ir = lower_src(source).unwrap();
    let fact = ir.function("fact").unwrap();
    assert_eq!(fact.ret, Type::Int);
    assert_eq!(fact.params, vec![("n".to_string(), Type::Int)]);
}

#[test]
fn test_recursive_call_with_unknown_return_type() {
    let source = "def loop(n):\n    return loop(n)\nloop(1)\n";
    assert_eq!(
        mismatch_reason(source),
        "cannot infer return type of recursive call to 'loop'"
    );
}

#[test]
fn test_if_without_else_shape() {
    assert_eq!(
        entry_lines("x = 1\nif x > 0:\n    print(x)\n"),
        vec![
            "DECLARE x:int",
            "ASSIGN x = 1",
            "JUMPIFFALSE (gt x 0) L0",
            "PRINT x",
            "LABEL L0"
        ]
    );
}

#[test]
fn test_if_else_shape() {
    let ir = lower_src("x = True\nif x:\n    print(1)\nelse:\n    print(2)\n").unwrap();
    assert_eq!(ir.entry.count(IrOp::JumpIfFalse), 1);
    assert_eq!(ir.entry.count(IrOp::Jump), 1);
    assert_eq!(ir.entry.count(IrOp::Label), 2);
    assert_eq!(
        entry_lines("x = True\nif x:\n    print(1)\nelse:\n    print(2)\n")[2..],
        [
            "JUMPIFFALSE x L0",
            "PRINT 1",
            "JUMP L1",
            "LABEL L0",
            "PRINT 2",
            "LABEL L1"
        ]
    );
}

#[test]
fn test_while_shape() {
    assert_eq!(
        entry_lines("n = 3\nwhile n > 0:\n    n = n - 1\n")[2..],
        [
            "LABEL L0",
            "JUMPIFFALSE (gt n 0) L1",
            "ASSIGN n = (sub n 1)",
            "JUMP L0",
            "LABEL L1"
        ]
    );
}

#[test]
fn test_labels_restart_per_function() {
    let source = "\
def f(a: int):
    while a > 0:
        a -= 1
x = 1
if x:
    f(x)
";
    let ir = lower_src(source).unwrap();
    for function in ir.iter() {
        assert!(function.verify_labels().is_ok());
        let first_label = function.body.iter().find_map(|i| match i {
            IrInstr::Label(l) | IrInstr::Jump(l) => Some(*l),
            IrInstr::JumpIfFalse { target, .. } => Some(*target),
            _ => None,
        });
        assert!(matches!(first_label, Some(LabelId(0 | 1))));
    }
}

#[test]
fn test_elif_lowering_nests() {
    let ir = lower_src("x = 2\nif x == 1:\n    print(1)\nelif x == 2:\n    print(2)\nelse:\n    print(3)\n")
        .unwrap();
    assert_eq!(ir.entry.count(IrOp::JumpIfFalse), 2);
    assert_eq!(ir.entry.count(IrOp::Jump), 2);
    assert_eq!(ir.entry.count(IrOp::Label), 4);
}

#[test]
fn test_block_scope_is_discarded() {
    let err = lower_src("if True:\n    y = 1\nprint(y)\n").unwrap_err();
    assert_eq!(
        err,
        SemanticError::UnboundName {
            identifier: "y".to_string(),
            position: SourceLocation::new(3, 7),
        }
    );
}

#[test]
fn test_assignment_in_block_updates_outer_variable() {
    let lines = entry_lines("x = 0\nwhile x < 3:\n    x = x + 1\nprint(x)\n");
    assert_eq!(lines.iter().filter(|l| l.starts_with("DECLARE")).count(), 1);
}

#[test]
fn test_functions_do_not_see_top_level_variables() {
    let err = lower_src("total = 1\ndef f():\n    print(total)\nf()\n").unwrap_err();
    assert!(matches!(err, SemanticError::UnboundName { ref identifier, .. } if identifier == "total"));
}

#[test]
fn test_unbound_name_position() {
    let err = lower_src("x = 1\nprint(x + y)\n").unwrap_err();
    assert_eq!(err.position(), SourceLocation::new(2, 11));
}

#[test]
fn test_unknown_function_is_unbound() {
    let err = lower_src("nope(1)\n").unwrap_err();
    assert!(matches!(err, SemanticError::UnboundName { ref identifier, .. } if identifier == "nope"));
}

#[test]
fn test_reassignment_type_mismatch() {
    assert_eq!(
        mismatch_reason("x = 1\nx = \"one\"\n"),
        "cannot assign string to 'x' of type int"
    );
}

#[test]
fn test_int_may_be_assigned_to_float() {
    assert!(lower_src("f = 1.5\nf = 2\n").is_ok());
    assert!(lower_src("i = 2\ni = 1.5\n").is_err());
}

#[test]
fn test_conflicting_annotation() {
    assert_eq!(
        mismatch_reason("x = 1\nx: str = \"a\"\n"),
        "'x' is already bound as int, cannot redeclare as string"
    );
}

#[test]
fn test_string_plus_int_is_rejected() {
    let err = lower_src("s = \"a\" + 1\n").unwrap_err();
    assert_eq!(err.position(), SourceLocation::new(1, 9));
}

#[test]
fn test_string_condition_is_rejected() {
    assert_eq!(
        mismatch_reason("s = \"a\"\nwhile s:\n    print(s)\n"),
        "condition must be bool, int or float, found string"
    );
}

#[test]
fn test_arity_mismatch() {
    let err = lower_src("def add(a, b):\n    return a + b\nprint(add(1))\n").unwrap_err();
    assert_eq!(
        err,
        SemanticError::ArityMismatch {
            callee: "add".to_string(),
            expected: 2,
            found: 1,
            position: SourceLocation::new(3, 7),
        }
    );
}

#[test]
fn test_argument_type_checked_after_first_call() {
    let source = "def id(v):\n    return v\nprint(id(1))\nprint(id(\"s\"))\n";
    assert_eq!(
        mismatch_reason(source),
        "argument 1 of id() expects int, found string"
    );
}

#[test]
fn test_void_call_used_as_value() {
    let source = "def hello():\n    print(\"hi\")\nx = hello()\n";
    assert_eq!(mismatch_reason(source), "'hello' does not return a value");
}

#[test]
fn test_inconsistent_returns() {
    let source = "def f(a: int):\n    if a:\n        return 1\n    return \"x\"\nf(1)\n";
    assert_eq!(mismatch_reason(source), "'f' returns int, found string");
}

#[test]
fn test_duplicate_function() {
    assert_eq!(
        mismatch_reason("def f():\n    pass\ndef f():\n    pass\n"),
        "duplicate function 'f'"
    );
}

#[test]
fn test_builtin_cannot_be_redefined() {
    assert_eq!(
        mismatch_reason("def len(s):\n    return 0\n"),
        "cannot redefine built-in function 'len'"
    );
}

#[test]
fn test_builtins_lower_to_builtin_exprs() {
    assert_eq!(
        entry_lines("s = str(42)\nn = len(s)\nf = float(n)\na = abs(-2)\n"),
        vec![
            "DECLARE s:string",
            "ASSIGN s = (str 42)",
            "DECLARE n:int",
            "ASSIGN n = (len s)",
            "DECLARE f:float",
            "ASSIGN f = (float n)",
            "DECLARE a:int",
            "ASSIGN a = (abs (neg 2))"
        ]
    );
}

#[test]
fn test_builtin_argument_checks() {
    assert_eq!(
        mismatch_reason("n = len(5)\n"),
        "len() does not accept an argument of type int"
    );
    let err = lower_src("s = str(1, 2)\n").unwrap_err();
    assert!(matches!(err, SemanticError::ArityMismatch { expected: 1, found: 2, .. }));
}

#[test]
fn test_concat_op_in_ir() {
    let ir = lower_src("s = \"a\" + \"b\"\n").unwrap();
    let IrInstr::Assign { value, .. } = &ir.entry.body[2] else {
        panic!("expected assign");
    };
    assert!(matches!(
        value.kind,
        IrExprKind::BinOp {
            op: IrBinOp::Concat,
            ..
        }
    ));
    assert_eq!(value.ty, Type::String);
}

#[test]
fn test_shadowing_in_block() {
    // a new name inside the block may reuse the name of a discarded block variable
    let source = "if True:\n    v = 1\nelse:\n    v = \"one\"\n";
    assert!(lower_src(source).is_ok());
}
