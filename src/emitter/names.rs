//! C++ identifier mapping

use once_cell::sync::Lazy;
use std::borrow::Cow;
use std::collections::HashSet;

/// C++ keywords plus the `std` names the generated code relies on
/// (visible unqualified through `using namespace std;`)
static RESERVED: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        // keywords
        "alignas", "alignof", "asm", "auto", "bool", "break", "case", "catch", "char",
        "char16_t", "char32_t", "char8_t", "class", "concept", "const", "consteval",
        "constexpr", "constinit", "const_cast", "continue", "co_await", "co_return",
        "co_yield", "decltype", "default", "delete", "do", "double", "dynamic_cast", "else",
        "enum", "explicit", "export", "extern", "false", "float", "for", "friend", "goto",
        "if", "inline", "int", "long", "mutable", "namespace", "new", "noexcept", "nullptr",
        "operator", "private", "protected", "public", "register", "reinterpret_cast",
        "requires", "return", "short", "signed", "sizeof", "static", "static_assert",
        "static_cast", "struct", "switch", "template", "this", "thread_local", "throw",
        "true", "try", "typedef", "typeid", "typename", "union", "unsigned", "using",
        "virtual", "void", "volatile", "wchar_t", "while",
        // alternative operator spellings
        "and", "and_eq", "bitand", "bitor", "compl", "not", "not_eq", "or", "or_eq", "xor",
        "xor_eq",
        // names the generated program uses
        "main", "std", "string", "cout", "cin", "cerr", "endl", "to_string", "stoll", "stod",
        "abs", "size",
    ]
    .into_iter()
    .collect()
});

/// Whether `name` cannot be used verbatim as a C++ identifier
pub fn is_reserved(name: &str) -> bool {
    RESERVED.contains(name)
}

/// C++ spelling of a source identifier (reserved names get a trailing `_`)
pub fn cpp_name(name: &str) -> Cow<'_, str> {
    if is_reserved(name) {
        Cow::Owned(format!("{name}_"))
    } else {
        Cow::Borrowed(name)
    }
}
