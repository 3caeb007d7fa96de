// types.rs - C scalar type names to Promela primitive kinds
//
// Promela only knows bit/byte/short/int; floats and wide integers collapse
// to `int`. Unknown names also map to `int`.

use std::fmt;

/// Promela primitive kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PmlType {
    Bit,
    Byte,
    Int,
}

impl PmlType {
    pub fn as_str(self) -> &'static str {
        match self {
            PmlType::Bit => "bit",
            PmlType::Byte => "byte",
            PmlType::Int => "int",
        }
    }
}

impl fmt::Display for PmlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Collapse whitespace and case: `"Unsigned   CHAR"` -> `"unsigned char"`
pub fn normalize(name: &str) -> String {
    name.split_whitespace()
        .map(str::to_ascii_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Map a C scalar type name to its Promela kind
pub fn map_scalar(name: &str) -> PmlType {
    match normalize(name).as_str() {
        "char" | "signed char" | "unsigned char" | "uint8_t" | "int8_t" => PmlType::Byte,
        "bool" | "_bool" => PmlType::Bit,
        "short" | "unsigned short" | "int" | "unsigned int" | "unsigned" | "long"
        | "unsigned long" | "float" | "double" => PmlType::Int,
        _ => PmlType::Int,
    }
}

/// Whether `name` is a built-in or `<stdint.h>`-style scalar rather than a
/// record name
pub fn is_builtin(name: &str) -> bool {
    let name = normalize(name);
    name.ends_with("_t")
        || name.split(' ').all(|word| {
            matches!(
                word,
                "char" | "short" | "int" | "long" | "signed" | "unsigned" | "float" | "double"
                    | "bool" | "_bool" | "void"
            )
        })
}
