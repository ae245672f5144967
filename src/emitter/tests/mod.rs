//! emitter module tests

use super::*;
use crate::ir::{IrOp, LabelId};
use crate::lexer::tokenize;
use crate::parser::parse;
use crate::semantic::lower;
use pretty_assertions::assert_eq;

fn cpp(source: &str) -> String {
    cpp_with(source, &EmitOptions::default())
}

fn cpp_with(source: &str, options: &EmitOptions) -> String {
    let ir = lower(&parse(&tokenize(source).unwrap()).unwrap()).unwrap();
    emit(&ir, options).unwrap()
}

/// Body lines of `int main()` without indentation and without `return 0;`
fn main_body(source: &str) -> Vec<String> {
    let code = cpp(source);
    let start = code.find("int main() {\n").unwrap() + "int main() {\n".len();
    code[start..]
        .lines()
        .map(str::trim)
        .take_while(|l| *l != "return 0;")
        .map(str::to_string)
        .collect()
}

fn function(name: &str, body: Vec<IrInstr>) -> IrFunction {
    let mut full = vec![IrInstr::FuncBegin {
        name: name.to_string(),
        params: vec![],
        ret: Type::Void,
    }];
    full.extend(body);
    full.push(IrInstr::FuncEnd);
    IrFunction {
        name: name.to_string(),
        params: vec![],
        ret: Type::Void,
        body: full,
    }
}

fn print(n: i64) -> IrInstr {
    IrInstr::Print {
        value: IrExpr::int(n),
    }
}

fn emit_entry(body: Vec<IrInstr>) -> Result<String, GenerationError> {
    let ir = IrProgram {
        functions: vec![],
        entry: function("main", body),
    };
    emit(&ir, &EmitOptions::default())
}

#[test]
fn test_empty_program_is_boilerplate() {
    let expected = "\
#include <iostream>
#include <string>

using namespace std;

int main() {
    return 0;
}
";
    assert_eq!(cpp(""), expected);
}

#[test]
fn test_declare_assign_folds() {
    assert_eq!(main_body("x = 5\n"), vec!["long long x = 5;"]);
}

#[test]
fn test_lone_declare_is_value_initialized() {
    let code = emit_entry(vec![IrInstr::Declare {
        name: "s".to_string(),
        ty: Type::String,
    }])
    .unwrap();
    assert!(code.contains("    string s{};\n"));
}

#[test]
fn test_full_function_program() {
    let source = "def greet(name):\n    print(\"Hello, \" + name)\ngreet(\"World\")\n";
    let expected = "\
#include <iostream>
#include <string>

using namespace std;

void greet(string name);

void greet(string name) {
    cout << \"Hello, \" + name << endl;
}

int main() {
    greet(\"World\");
    return 0;
}
";
    assert_eq!(cpp(source), expected);
}

#[test]
fn test_no_prototypes_and_indent_width() {
    let options = EmitOptions {
        indent_width: 2,
        prototypes: false,
    };
    let code = cpp_with("def f(a: int) -> int:\n    return a\nprint(f(1))\n", &options);
    assert!(!code.contains("long long f(long long a);"));
    assert!(code.contains("long long f(long long a) {\n  return a;\n}\n"));
    assert!(code.contains("  cout << f(1) << endl;\n"));
}

#[test]
fn test_if_else_reconstruction() {
    assert_eq!(
        main_body("x = True\nif x:\n    print(1)\nelse:\n    print(2)\n"),
        vec![
            "bool x = true;",
            "if (x) {",
            "cout << 1 << endl;",
            "} else {",
            "cout << 2 << endl;",
            "}"
        ]
    );
}

#[test]
fn test_elif_chain_reconstruction() {
    let source = "n = 2\nif n == 1:\n    print(1)\nelif n == 2:\n    print(2)\nelse:\n    print(3)\n";
    assert_eq!(
        main_body(source),
        vec![
            "long long n = 2;",
            "if (n == 1) {",
            "cout << 1 << endl;",
            "} else if (n == 2) {",
            "cout << 2 << endl;",
            "} else {",
            "cout << 3 << endl;",
            "}"
        ]
    );
}

#[test]
fn test_while_reconstruction() {
    let code = cpp("i = 0\nwhile i < 3:\n    print(i)\n    i += 1\n");
    assert!(code.contains(
        "    long long i = 0;\n    while (i < 3) {\n        cout << i << endl;\n        i = i + 1;\n    }\n"
    ));
}

#[test]
fn test_nested_control_flow() {
    let source = "\
i = 0
while i < 10:
    if i % 2 == 0:
        print(i)
    i += 1
";
    assert_eq!(
        main_body(source),
        vec![
            "long long i = 0;",
            "while (i < 10) {",
            "if (i % 2 == 0) {",
            "cout << i << endl;",
            "}",
            "i = i + 1;",
            "}"
        ]
    );
}

#[test]
fn test_block_local_declaration() {
    assert_eq!(
        main_body("if True:\n    y = \"in\"\n    print(y)\n"),
        vec!["if (true) {", "string y = \"in\";", "cout << y << endl;", "}"]
    );
}

#[test]
fn test_bool_printing() {
    assert_eq!(
        main_body("ok = 1 < 2\nprint(ok)\nprint(not ok)\n"),
        vec![
            "bool ok = 1 < 2;",
            "cout << (ok ? \"True\" : \"False\") << endl;",
            "cout << (!ok ? \"True\" : \"False\") << endl;"
        ]
    );
}

#[test]
fn test_precedence_parentheses() {
    assert_eq!(
        main_body("a = 1\nb = (a + 2) * 3\nc = a - (b - 1)\nd = -(a + b)\ne = not (a < b and b < c)\n"),
        vec![
            "long long a = 1;",
            "long long b = (a + 2) * 3;",
            "long long c = a - (b - 1);",
            "long long d = -(a + b);",
            "bool e = !(a < b && b < c);"
        ]
    );
}

#[test]
fn test_logical_operators() {
    assert_eq!(
        main_body("a = True\nb = False\nc = a or b and not a\n")[2],
        "bool c = a || b && !a;"
    );
}

#[test]
fn test_double_negation_is_not_decrement() {
    assert_eq!(main_body("x = 1\ny = - -x\n")[1], "long long y = -(-x);");
}

#[test]
fn test_literal_concat_wraps_left() {
    assert_eq!(
        main_body("s = \"a\" + \"b\"\n"),
        vec!["string s = string(\"a\") + \"b\";"]
    );
}

#[test]
fn test_string_escapes_and_floats() {
    assert_eq!(
        main_body("s = \"tab\\there \\\"q\\\"\"\nf = 2.0\ng = 0.5 * f\n"),
        vec![
            "string s = \"tab\\there \\\"q\\\"\";",
            "double f = 2.0;",
            "double g = 0.5 * f;"
        ]
    );
}

#[test]
fn test_float_text_uses_cpp_formatting() {
    // cout prints 2.0 as `2` and to_string gives six decimals
    assert_eq!(
        main_body("f = 2.0\nprint(f)\ns = str(f)\n"),
        vec![
            "double f = 2.0;",
            "cout << f << endl;",
            "string s = to_string(f);"
        ]
    );
}

#[test]
fn test_builtin_call_statement() {
    assert_eq!(
        main_body("len(\"abc\")\n"),
        vec!["static_cast<long long>(string(\"abc\").size());"]
    );
}

#[test]
fn test_deeply_nested_hand_built_ifs_are_rejected() {
    let depth = 100u32;
    let mut body = Vec::new();
    for label in 0..depth {
        body.push(IrInstr::JumpIfFalse {
            cond: IrExpr::bool(true),
            target: LabelId(label),
        });
    }
    body.push(print(1));
    for label in (0..depth).rev() {
        body.push(IrInstr::Label(LabelId(label)));
    }
    let err = emit_entry(body).unwrap_err();
    assert!(err.message.contains("nested deeper"));
}

#[test]
fn test_builtins() {
    assert_eq!(
        main_body("n = 3\ns = str(n)\nm = int(\"42\")\nf = float(n)\nl = len(s + \"!\")\nb = str(True)\n"),
        vec![
            "long long n = 3;",
            "string s = to_string(n);",
            "long long m = stoll(\"42\");",
            "double f = static_cast<double>(n);",
            "long long l = static_cast<long long>((s + \"!\").size());",
            "string b = string(true ? \"True\" : \"False\");"
        ]
    );
}

#[test]
fn test_abs_adds_math_headers() {
    let code = cpp("x = abs(-3)\n");
    assert!(code.starts_with(
        "#include <iostream>\n#include <string>\n#include <cstdlib>\n#include <cmath>\n"
    ));
    assert!(code.contains("long long x = abs(-3);"));
    assert!(!cpp("x = 3\n").contains("<cmath>"));
}

#[test]
fn test_reserved_names_are_renamed() {
    let source = "def main(string):\n    print(string)\nmain(\"x\")\ncout = 1\n";
    let code = cpp(source);
    assert!(code.contains("void main_(string string_) {"));
    assert!(code.contains("    main_(\"x\");\n"));
    assert!(code.contains("    long long cout_ = 1;\n"));
}

#[test]
fn test_early_return_in_loop() {
    let source = "\
def find(limit: int) -> int:
    i = 0
    while i < limit:
        if i * i > 50:
            return i
        i += 1
    return -1
print(find(100))
";
    let code = cpp(source);
    assert!(code.contains(
        "    while (i < limit) {\n        if (i * i > 50) {\n            return i;\n        }\n"
    ));
    assert!(code.contains("    return -1;\n"));
}

#[test]
fn test_functions_emitted_in_source_order() {
    let code = cpp("def b():\n    print(2)\ndef a():\n    print(1)\na()\nb()\n");
    let b = code.find("void b() {").unwrap();
    let a = code.find("void a() {").unwrap();
    assert!(b < a);
    assert!(code.contains("void b();\nvoid a();\n"));
}

// --- malformed IR ---

#[test]
fn test_unknown_label_is_rejected() {
    let err = emit_entry(vec![IrInstr::Jump(LabelId(7))]).unwrap_err();
    assert_eq!(err.op, IrOp::Jump);
}

#[test]
fn test_duplicate_label_is_rejected() {
    let err = emit_entry(vec![IrInstr::Label(LabelId(0)), IrInstr::Label(LabelId(0))]).unwrap_err();
    assert_eq!(err.op, IrOp::Label);
}

#[test]
fn test_backward_jump_outside_loop_is_rejected() {
    let err = emit_entry(vec![
        IrInstr::Label(LabelId(0)),
        print(1),
        IrInstr::Jump(LabelId(0)),
    ])
    .unwrap_err();
    assert_eq!(err.op, IrOp::Label);
}

#[test]
fn test_forward_jump_alone_is_rejected() {
    let err = emit_entry(vec![
        IrInstr::Jump(LabelId(0)),
        print(1),
        IrInstr::Label(LabelId(0)),
    ])
    .unwrap_err();
    assert_eq!(err.op, IrOp::Jump);
}

#[test]
fn test_jump_out_of_block_is_rejected() {
    // the inner if jumps past the end of the outer then-branch
    let err = emit_entry(vec![
        IrInstr::JumpIfFalse {
            cond: IrExpr::bool(true),
            target: LabelId(0),
        },
        IrInstr::JumpIfFalse {
            cond: IrExpr::bool(false),
            target: LabelId(1),
        },
        IrInstr::Label(LabelId(0)),
        IrInstr::Label(LabelId(1)),
    ])
    .unwrap_err();
    assert_eq!(err.op, IrOp::JumpIfFalse);
}

#[test]
fn test_missing_function_boundaries() {
    let ir = IrProgram {
        functions: vec![],
        entry: IrFunction {
            name: "main".to_string(),
            params: vec![],
            ret: Type::Int,
            body: vec![print(1)],
        },
    };
    let err = emit(&ir, &EmitOptions::default()).unwrap_err();
    assert_eq!(err.op, IrOp::Print);
}

#[test]
fn test_structure_of_hand_built_while() {
    let f = function(
        "main",
        vec![
            IrInstr::Label(LabelId(0)),
            IrInstr::JumpIfFalse {
                cond: IrExpr::bool(true),
                target: LabelId(1),
            },
            IrInstr::Jump(LabelId(0)),
            IrInstr::Label(LabelId(1)),
        ],
    );
    let nodes = structure(&f).unwrap();
    assert_eq!(nodes.len(), 1);
    assert!(matches!(&nodes[0], Node::While { body, .. } if body.is_empty()));
}
