// ast.rs - Syntax tree consumed by the translator
//
// A closed model of the C subset the translator understands. Front-ends
// (tree-sitter C parser, serialized JSON) build this tree; the translator
// only ever pattern-matches on it.

use serde::{Deserialize, Serialize};

/// A whole compilation unit
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub items: Vec<Item>,
}

/// A top-level declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Item {
    Struct(StructDef),
    /// `typedef <ty> <name>;`
    Typedef { name: String, ty: CType },
    Function(FunctionDef),
    Global(VarDecl),
    /// Something the front-end recognised but cannot lower
    Unsupported(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructDef {
    pub name: String,
    pub fields: Vec<Field>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub ty: CType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDef {
    pub name: String,
    pub return_type: CType,
    pub params: Vec<Param>,
    pub body: Vec<Stmt>,
}

impl FunctionDef {
    pub fn returns_value(&self) -> bool {
        !matches!(self.return_type, CType::Void)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub ty: CType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VarDecl {
    pub name: String,
    pub ty: CType,
    #[serde(default)]
    pub init: Option<Expr>,
}

/// Source-level type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CType {
    Void,
    /// Scalar or typedef name, e.g. `unsigned int` or `node_t`
    Named(String),
    /// `struct <name>`
    Struct(String),
    Pointer(Box<CType>),
    /// `elem[len]`; `len` is `None` for `elem[]`
    Array { elem: Box<CType>, len: Option<Box<Expr>> },
    /// Type shape the front-end could not model (function pointers, unions, ...)
    Unsupported(String),
}

impl CType {
    pub fn named(name: impl Into<String>) -> Self {
        CType::Named(name.into())
    }

    pub fn pointer_to(self) -> Self {
        CType::Pointer(Box::new(self))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stmt {
    Decl(VarDecl),
    /// Expression statement: assignments, calls, increments
    Expr(Expr),
    Block(Vec<Stmt>),
    If {
        cond: Expr,
        then_branch: Vec<Stmt>,
        #[serde(default)]
        else_branch: Option<Vec<Stmt>>,
    },
    While {
        cond: Expr,
        body: Vec<Stmt>,
    },
    For {
        /// Initializer statements; comma-separated initializers are split
        #[serde(default)]
        init: Vec<Stmt>,
        #[serde(default)]
        cond: Option<Expr>,
        #[serde(default)]
        step: Vec<Expr>,
        body: Vec<Stmt>,
    },
    Switch {
        scrutinee: Expr,
        cases: Vec<SwitchCase>,
    },
    Break,
    Continue,
    Return(Option<Expr>),
    /// `;`
    Empty,
    Unsupported(String),
}

/// One `case v:` or `default:` label with its statements
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwitchCase {
    /// `None` for `default:`
    pub value: Option<Expr>,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expr {
    Ident(String),
    /// Numeric, character, or string literal, as written
    Literal(String),
    /// `NULL`
    Null,
    Member {
        base: Box<Expr>,
        field: String,
        /// `->` rather than `.`
        arrow: bool,
    },
    Index {
        base: Box<Expr>,
        index: Box<Expr>,
    },
    Call {
        callee: String,
        args: Vec<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Update {
        op: UpdateOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Assign {
        op: AssignOp,
        target: Box<Expr>,
        value: Box<Expr>,
    },
    Ternary {
        cond: Box<Expr>,
        then_value: Box<Expr>,
        else_value: Box<Expr>,
    },
    Paren(Box<Expr>),
    Cast {
        ty: CType,
        expr: Box<Expr>,
    },
    SizeOf(CType),
    /// `{a, b, ...}` initializer
    InitList(Vec<Expr>),
    /// Source text carried through without interpretation
    Verbatim(String),
}

impl Expr {
    pub fn ident(name: impl Into<String>) -> Self {
        Expr::Ident(name.into())
    }

    pub fn lit(text: impl Into<String>) -> Self {
        Expr::Literal(text.into())
    }

    pub fn call(callee: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::Call {
            callee: callee.into(),
            args,
        }
    }

    pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Self {
        Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn assign(target: Expr, value: Expr) -> Self {
        Expr::Assign {
            op: AssignOp::Assign,
            target: Box::new(target),
            value: Box::new(value),
        }
    }

    pub fn arrow(base: Expr, field: impl Into<String>) -> Self {
        Expr::Member {
            base: Box::new(base),
            field: field.into(),
            arrow: true,
        }
    }

    pub fn dot(base: Expr, field: impl Into<String>) -> Self {
        Expr::Member {
            base: Box::new(base),
            field: field.into(),
            arrow: false,
        }
    }

    /// Strip redundant parentheses
    pub fn peel(&self) -> &Expr {
        match self {
            Expr::Paren(inner) => inner.peel(),
            other => other,
        }
    }

    /// Strip parentheses and casts, e.g. `(struct node *) malloc(...)`
    pub fn strip(&self) -> &Expr {
        match self {
            Expr::Paren(inner) | Expr::Cast { expr: inner, .. } => inner.strip(),
            other => other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnaryOp {
    Neg,
    Plus,
    Not,
    BitNot,
    Deref,
    AddrOf,
}

impl UnaryOp {
    pub fn as_str(self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Plus => "+",
            UnaryOp::Not => "!",
            UnaryOp::BitNot => "~",
            UnaryOp::Deref => "*",
            UnaryOp::AddrOf => "&",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateOp {
    PreInc,
    PostInc,
    PreDec,
    PostDec,
}

impl UpdateOp {
    pub fn is_increment(self) -> bool {
        matches!(self, UpdateOp::PreInc | UpdateOp::PostInc)
    }

    pub fn is_prefix(self) -> bool {
        matches!(self, UpdateOp::PreInc | UpdateOp::PreDec)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Shl,
    Shr,
    BitAnd,
    BitOr,
    BitXor,
    And,
    Or,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl BinaryOp {
    pub fn as_str(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
        }
    }

    pub fn from_symbol(symbol: &str) -> Option<Self> {
        let op = match symbol {
            "+" => BinaryOp::Add,
            "-" => BinaryOp::Sub,
            "*" => BinaryOp::Mul,
            "/" => BinaryOp::Div,
            "%" => BinaryOp::Rem,
            "<<" => BinaryOp::Shl,
            ">>" => BinaryOp::Shr,
            "&" => BinaryOp::BitAnd,
            "|" => BinaryOp::BitOr,
            "^" => BinaryOp::BitXor,
            "&&" => BinaryOp::And,
            "||" => BinaryOp::Or,
            "==" => BinaryOp::Eq,
            "!=" => BinaryOp::Ne,
            "<" => BinaryOp::Lt,
            "<=" => BinaryOp::Le,
            ">" => BinaryOp::Gt,
            ">=" => BinaryOp::Ge,
            _ => return None,
        };
        Some(op)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignOp {
    Assign,
    Compound(BinaryOp),
}

impl AssignOp {
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        if symbol == "=" {
            return Some(AssignOp::Assign);
        }
        let binary = symbol.strip_suffix('=')?;
        BinaryOp::from_symbol(binary)
            .filter(|op| {
                matches!(
                    op,
                    BinaryOp::Add
                        | BinaryOp::Sub
                        | BinaryOp::Mul
                        | BinaryOp::Div
                        | BinaryOp::Rem
                        | BinaryOp::Shl
                        | BinaryOp::Shr
                        | BinaryOp::BitAnd
                        | BinaryOp::BitOr
                        | BinaryOp::BitXor
                )
            })
            .map(AssignOp::Compound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assign_op_symbols() {
        assert_eq!(AssignOp::from_symbol("="), Some(AssignOp::Assign));
        assert_eq!(
            AssignOp::from_symbol("+="),
            Some(AssignOp::Compound(BinaryOp::Add))
        );
        assert_eq!(
            AssignOp::from_symbol("<<="),
            Some(AssignOp::Compound(BinaryOp::Shl))
        );
        assert_eq!(AssignOp::from_symbol("=="), None);
        assert_eq!(AssignOp::from_symbol("<="), None);
    }

    #[test]
    fn test_peel_parens() {
        let e = Expr::Paren(Box::new(Expr::Paren(Box::new(Expr::ident("x")))));
        assert_eq!(e.peel(), &Expr::ident("x"));
    }

    #[test]
    fn test_json_shape() {
        let program = Program {
            items: vec![Item::Global(VarDecl {
                name: "g".into(),
                ty: CType::named("int"),
                init: None,
            })],
        };
        let json = serde_json::to_string(&program).unwrap();
        assert!(json.contains("\"global\""));
        let back: Program = serde_json::from_str(&json).unwrap();
        assert_eq!(back, program);
    }
}
