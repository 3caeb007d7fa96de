// c.rs - C source to `ast::Program` via tree-sitter
//
// The concrete tree from tree-sitter-c is lowered node by node. Constructs
// outside the subset are kept as `Unsupported` items/statements (or verbatim
// expressions) so the translator can mark them; only a tree containing
// ERROR or MISSING nodes is rejected. Struct definitions and typedefs found
// inside declarations or function bodies are hoisted to the top level.

use crate::ast::{
    AssignOp, BinaryOp, CType, Expr, Field, FunctionDef, Item, Param, Program, Stmt, StructDef,
    SwitchCase, UnaryOp, UpdateOp, VarDecl,
};
use crate::error::{FrontendError, FrontendResult};
use crate::types;
use tree_sitter::{Node, Parser};

/// Longest source excerpt quoted in an unsupported marker
const EXCERPT_LEN: usize = 60;

/// Parse C source text into a program
pub fn parse(source: &str) -> FrontendResult<Program> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_c::LANGUAGE.into())
        .map_err(|e| FrontendError::Language(e.to_string()))?;
    let tree = parser.parse(source, None).ok_or(FrontendError::NoTree)?;
    let root = tree.root_node();
    if root.has_error() {
        return Err(syntax_error(root, source));
    }

    let mut lowerer = Lowerer {
        src: source,
        hoisted: Vec::new(),
    };
    let program = lowerer.program(root)?;
    tracing::debug!(items = program.items.len(), "lowered C source");
    Ok(program)
}

/// Locate the first ERROR or MISSING node below `node`
fn first_error<'t>(node: Node<'t>) -> Option<Node<'t>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    let mut cursor = node.walk();
    let children: Vec<Node<'t>> = node.children(&mut cursor).collect();
    children
        .into_iter()
        .filter(|child| child.has_error())
        .find_map(first_error)
}

fn syntax_error(root: Node<'_>, source: &str) -> FrontendError {
    let node = first_error(root).unwrap_or(root);
    let position = node.start_position();
    let found = if node.is_missing() {
        format!("missing {}", node.kind())
    } else {
        excerpt(node.utf8_text(source.as_bytes()).unwrap_or_default())
    };
    FrontendError::Syntax {
        line: position.row + 1,
        column: position.column + 1,
        found,
    }
}

/// First line of `text`, shortened
fn excerpt(text: &str) -> String {
    let line = text.lines().next().unwrap_or_default().trim();
    match line.char_indices().nth(EXCERPT_LEN) {
        Some((end, _)) => format!("{}...", &line[..end]),
        None => line.to_string(),
    }
}

fn named_children<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|child| child.kind() != "comment")
        .collect()
}

fn field_children<'t>(node: Node<'t>, field: &str) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.children_by_field_name(field, &mut cursor).collect()
}

/// `int f(void)` declares a function; `int (*f)(void)` declares a variable
fn is_prototype(node: Node<'_>) -> bool {
    match node.kind() {
        "function_declarator" => node
            .child_by_field_name("declarator")
            .is_some_and(|inner| inner.kind() == "identifier"),
        "pointer_declarator" => node
            .child_by_field_name("declarator")
            .is_some_and(is_prototype),
        _ => false,
    }
}

struct Lowerer<'s> {
    src: &'s str,
    /// Definitions discovered while lowering the current item
    hoisted: Vec<Item>,
}

impl<'s> Lowerer<'s> {
    fn text(&self, node: Node<'_>) -> FrontendResult<&'s str> {
        node.utf8_text(self.src.as_bytes())
            .map_err(|_| FrontendError::Utf8 {
                node: node.kind().to_string(),
            })
    }

    fn describe(&self, node: Node<'_>) -> String {
        excerpt(self.text(node).unwrap_or(node.kind()))
    }

    fn field<'t>(&self, node: Node<'t>, name: &str) -> FrontendResult<Node<'t>> {
        node.child_by_field_name(name).ok_or_else(|| {
            let position = node.start_position();
            FrontendError::Syntax {
                line: position.row + 1,
                column: position.column + 1,
                found: format!("{} without {}", node.kind(), name),
            }
        })
    }

    // ------------------------------------------------------------------
    // Items
    // ------------------------------------------------------------------

    fn program(&mut self, root: Node<'_>) -> FrontendResult<Program> {
        let mut items = Vec::new();
        for node in named_children(root) {
            let lowered = self.top_level(node)?;
            items.append(&mut self.hoisted);
            items.extend(lowered);
        }
        Ok(Program { items })
    }

    fn top_level(&mut self, node: Node<'_>) -> FrontendResult<Vec<Item>> {
        let items = match node.kind() {
            "function_definition" => match self.function(node)? {
                Some(def) => vec![Item::Function(def)],
                None => vec![Item::Unsupported(self.describe(node))],
            },
            "declaration" => self
                .declaration(node)?
                .into_iter()
                .map(Item::Global)
                .collect(),
            "type_definition" => {
                self.type_definition(node)?;
                Vec::new()
            }
            "struct_specifier" => {
                self.type_specifier(node, None)?;
                Vec::new()
            }
            "expression_statement" if node.named_child_count() == 0 => Vec::new(),
            kind if kind.starts_with("preproc_") => {
                tracing::debug!(kind, "preprocessor directive skipped");
                Vec::new()
            }
            kind => {
                tracing::warn!(kind, "unsupported top-level construct");
                vec![Item::Unsupported(self.describe(node))]
            }
        };
        Ok(items)
    }

    fn function(&mut self, node: Node<'_>) -> FrontendResult<Option<FunctionDef>> {
        let mut return_type = self.type_specifier(self.field(node, "type")?, None)?;
        let mut declarator = self.field(node, "declarator")?;
        while declarator.kind() == "pointer_declarator" {
            return_type = return_type.pointer_to();
            declarator = self.field(declarator, "declarator")?;
        }
        if declarator.kind() != "function_declarator" {
            return Ok(None);
        }
        let name = self.text(self.field(declarator, "declarator")?)?.to_string();

        let mut params = Vec::new();
        for param in named_children(self.field(declarator, "parameters")?) {
            if param.kind() != "parameter_declaration" {
                tracing::warn!(function = %name, kind = param.kind(), "parameter skipped");
                continue;
            }
            let base = self.type_specifier(self.field(param, "type")?, None)?;
            let Some(inner) = param.child_by_field_name("declarator") else {
                // `f(void)`, or an unnamed parameter
                continue;
            };
            let (param_name, ty) = self.declarator(inner, base)?;
            if let Some(param_name) = param_name {
                params.push(Param {
                    name: param_name,
                    ty,
                });
            }
        }

        let body = self.block(self.field(node, "body")?)?;
        Ok(Some(FunctionDef {
            name,
            return_type,
            params,
            body,
        }))
    }

    /// Variables introduced by a declaration; prototypes introduce none
    fn declaration(&mut self, node: Node<'_>) -> FrontendResult<Vec<VarDecl>> {
        let base = match node.child_by_field_name("type") {
            Some(ty) => self.type_specifier(ty, None)?,
            None => CType::named("int"),
        };
        let mut decls = Vec::new();
        for declarator in field_children(node, "declarator") {
            let (target, value) = if declarator.kind() == "init_declarator" {
                (
                    self.field(declarator, "declarator")?,
                    declarator.child_by_field_name("value"),
                )
            } else {
                (declarator, None)
            };
            if is_prototype(target) {
                continue;
            }
            let (name, ty) = self.declarator(target, base.clone())?;
            let Some(name) = name else {
                continue;
            };
            let init = match value {
                Some(value) => Some(self.expr(value)?),
                None => None,
            };
            decls.push(VarDecl { name, ty, init });
        }
        Ok(decls)
    }

    fn type_definition(&mut self, node: Node<'_>) -> FrontendResult<()> {
        let declarators = field_children(node, "declarator");
        // `typedef struct { ... } point;` names the struct after the alias
        let fallback = match declarators.first() {
            Some(d) if d.kind() == "type_identifier" => Some(self.text(*d)?),
            _ => None,
        };
        let base = self.type_specifier(self.field(node, "type")?, fallback)?;
        for declarator in declarators {
            let (name, ty) = self.declarator(declarator, base.clone())?;
            let Some(name) = name else {
                continue;
            };
            // The anonymous struct already carries the alias name
            if matches!(&ty, CType::Struct(record) if *record == name) {
                continue;
            }
            self.hoisted.push(Item::Typedef { name, ty });
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Types
    // ------------------------------------------------------------------

    /// Lower a type specifier. A struct body is hoisted as a definition.
    fn type_specifier(&mut self, node: Node<'_>, fallback: Option<&str>) -> FrontendResult<CType> {
        let ty = match node.kind() {
            "primitive_type" => match self.text(node)? {
                "void" => CType::Void,
                name => CType::named(name),
            },
            "sized_type_specifier" => CType::named(types::normalize(self.text(node)?)),
            "type_identifier" => CType::named(self.text(node)?),
            "struct_specifier" => {
                let name = match node.child_by_field_name("name") {
                    Some(name) => Some(self.text(name)?.to_string()),
                    None => fallback.map(str::to_string),
                };
                let body = node.child_by_field_name("body");
                match (name, body) {
                    (Some(name), None) => CType::Struct(name),
                    (Some(name), Some(body)) => {
                        let fields = self.struct_fields(body)?;
                        self.hoisted.push(Item::Struct(StructDef {
                            name: name.clone(),
                            fields,
                        }));
                        CType::Struct(name)
                    }
                    (None, _) => CType::Unsupported("anonymous struct".to_string()),
                }
            }
            "enum_specifier" => {
                if node.child_by_field_name("body").is_some() {
                    let what = format!("enum {}", self.describe(node));
                    self.hoisted.push(Item::Unsupported(what));
                }
                CType::named("int")
            }
            "union_specifier" => CType::Unsupported(format!("union {}", self.describe(node))),
            kind => CType::Unsupported(kind.to_string()),
        };
        Ok(ty)
    }

    fn struct_fields(&mut self, body: Node<'_>) -> FrontendResult<Vec<Field>> {
        let mut fields = Vec::new();
        for decl in named_children(body) {
            if decl.kind() != "field_declaration" {
                tracing::warn!(kind = decl.kind(), "struct member skipped");
                continue;
            }
            let base = self.type_specifier(self.field(decl, "type")?, None)?;
            for declarator in field_children(decl, "declarator") {
                let (name, ty) = self.declarator(declarator, base.clone())?;
                if let Some(name) = name {
                    fields.push(Field { name, ty });
                }
            }
        }
        Ok(fields)
    }

    /// Apply a declarator to `base`, returning the declared name (if any)
    /// and the complete type
    fn declarator(&mut self, node: Node<'_>, base: CType) -> FrontendResult<(Option<String>, CType)> {
        match node.kind() {
            "identifier" | "field_identifier" | "type_identifier" => {
                Ok((Some(self.text(node)?.to_string()), base))
            }
            "pointer_declarator" | "abstract_pointer_declarator" => {
                match node.child_by_field_name("declarator") {
                    Some(inner) => self.declarator(inner, base.pointer_to()),
                    None => Ok((None, base.pointer_to())),
                }
            }
            "array_declarator" | "abstract_array_declarator" => {
                let len = match node.child_by_field_name("size") {
                    Some(size) => Some(Box::new(self.expr(size)?)),
                    None => None,
                };
                let ty = CType::Array {
                    elem: Box::new(base),
                    len,
                };
                match node.child_by_field_name("declarator") {
                    Some(inner) => self.declarator(inner, ty),
                    None => Ok((None, ty)),
                }
            }
            "init_declarator" => self.declarator(self.field(node, "declarator")?, base),
            "parenthesized_declarator" | "abstract_parenthesized_declarator" => {
                match named_children(node).into_iter().next() {
                    Some(inner) => self.declarator(inner, base),
                    None => Ok((None, base)),
                }
            }
            "function_declarator" | "abstract_function_declarator" => {
                let name = match node.child_by_field_name("declarator") {
                    Some(inner) => self.declarator(inner, CType::Void)?.0,
                    None => None,
                };
                Ok((name, CType::Unsupported("function pointer".to_string())))
            }
            kind => Ok((None, CType::Unsupported(kind.to_string()))),
        }
    }

    /// `type_descriptor` in casts and `sizeof`
    fn type_descriptor(&mut self, node: Node<'_>) -> FrontendResult<CType> {
        let base = self.type_specifier(self.field(node, "type")?, None)?;
        match node.child_by_field_name("declarator") {
            Some(declarator) => Ok(self.declarator(declarator, base)?.1),
            None => Ok(base),
        }
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    fn block(&mut self, node: Node<'_>) -> FrontendResult<Vec<Stmt>> {
        let mut stmts = Vec::new();
        for child in named_children(node) {
            self.statement(child, &mut stmts)?;
        }
        Ok(stmts)
    }

    /// Body of an `if`/loop: a block, or a single statement
    fn body(&mut self, node: Node<'_>) -> FrontendResult<Vec<Stmt>> {
        if node.kind() == "compound_statement" {
            return self.block(node);
        }
        let mut stmts = Vec::new();
        self.statement(node, &mut stmts)?;
        Ok(stmts)
    }

    /// Lower one statement; declarations and comma expressions may yield
    /// several
    fn statement(&mut self, node: Node<'_>, out: &mut Vec<Stmt>) -> FrontendResult<()> {
        match node.kind() {
            "declaration" => {
                out.extend(self.declaration(node)?.into_iter().map(Stmt::Decl));
            }
            "expression_statement" => match named_children(node).into_iter().next() {
                None => out.push(Stmt::Empty),
                Some(e) => {
                    for e in self.expr_list(e)? {
                        out.push(Stmt::Expr(e));
                    }
                }
            },
            "compound_statement" => out.push(Stmt::Block(self.block(node)?)),
            "if_statement" => {
                let cond = self.expr(self.field(node, "condition")?)?;
                let then_branch = self.body(self.field(node, "consequence")?)?;
                let else_branch = match node.child_by_field_name("alternative") {
                    Some(alt) => {
                        let alt = if alt.kind() == "else_clause" {
                            named_children(alt).into_iter().next()
                        } else {
                            Some(alt)
                        };
                        match alt {
                            Some(alt) => Some(self.body(alt)?),
                            None => None,
                        }
                    }
                    None => None,
                };
                out.push(Stmt::If {
                    cond,
                    then_branch,
                    else_branch,
                });
            }
            "while_statement" => {
                let cond = self.expr(self.field(node, "condition")?)?;
                let body = self.body(self.field(node, "body")?)?;
                out.push(Stmt::While { cond, body });
            }
            "for_statement" => out.push(self.for_statement(node)?),
            "switch_statement" => {
                let scrutinee = self.expr(self.field(node, "condition")?)?;
                let mut cases = Vec::new();
                for case in named_children(self.field(node, "body")?) {
                    if case.kind() != "case_statement" {
                        out.push(Stmt::Unsupported(format!(
                            "statement outside a case: {}",
                            self.describe(case)
                        )));
                        continue;
                    }
                    cases.push(self.case(case)?);
                }
                out.push(Stmt::Switch { scrutinee, cases });
            }
            "break_statement" => out.push(Stmt::Break),
            "continue_statement" => out.push(Stmt::Continue),
            "return_statement" => {
                let value = match named_children(node).into_iter().next() {
                    Some(value) => Some(self.expr(value)?),
                    None => None,
                };
                out.push(Stmt::Return(value));
            }
            "labeled_statement" => {
                let label = self.text(self.field(node, "label")?)?;
                out.push(Stmt::Unsupported(format!("label {}", label)));
                if let Some(inner) = named_children(node).into_iter().last() {
                    if inner.kind() != "statement_identifier" {
                        self.statement(inner, out)?;
                    }
                }
            }
            "type_definition" => self.type_definition(node)?,
            "struct_specifier" => {
                self.type_specifier(node, None)?;
            }
            kind if kind.starts_with("preproc_") => {
                tracing::debug!(kind, "preprocessor directive skipped");
            }
            kind => {
                tracing::warn!(kind, "unsupported statement");
                out.push(Stmt::Unsupported(self.describe(node)));
            }
        }
        Ok(())
    }

    fn for_statement(&mut self, node: Node<'_>) -> FrontendResult<Stmt> {
        let mut init = Vec::new();
        if let Some(initializer) = node.child_by_field_name("initializer") {
            if initializer.kind() == "declaration" {
                init.extend(self.declaration(initializer)?.into_iter().map(Stmt::Decl));
            } else {
                init.extend(self.expr_list(initializer)?.into_iter().map(Stmt::Expr));
            }
        }
        let cond = match node.child_by_field_name("condition") {
            Some(cond) => Some(self.expr(cond)?),
            None => None,
        };
        let step = match node.child_by_field_name("update") {
            Some(update) => self.expr_list(update)?,
            None => Vec::new(),
        };
        let body = self.body(self.field(node, "body")?)?;
        Ok(Stmt::For {
            init,
            cond,
            step,
            body,
        })
    }

    fn case(&mut self, node: Node<'_>) -> FrontendResult<SwitchCase> {
        let value_node = node.child_by_field_name("value");
        let value = match value_node {
            Some(value) => Some(self.expr(value)?),
            None => None,
        };
        let mut body = Vec::new();
        for child in named_children(node) {
            if value_node.is_some_and(|v| v.id() == child.id()) {
                continue;
            }
            self.statement(child, &mut body)?;
        }
        Ok(SwitchCase { value, body })
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    /// `a = 1, b = 2` as separate expressions
    fn expr_list(&mut self, node: Node<'_>) -> FrontendResult<Vec<Expr>> {
        if node.kind() != "comma_expression" {
            return Ok(vec![self.expr(node)?]);
        }
        let mut list = self.expr_list(self.field(node, "left")?)?;
        list.extend(self.expr_list(self.field(node, "right")?)?);
        Ok(list)
    }

    fn verbatim(&self, node: Node<'_>) -> FrontendResult<Expr> {
        let text = self.text(node)?;
        tracing::warn!(kind = node.kind(), text, "expression kept verbatim");
        Ok(Expr::Verbatim(text.to_string()))
    }

    fn expr(&mut self, node: Node<'_>) -> FrontendResult<Expr> {
        let expr = match node.kind() {
            "identifier" => match self.text(node)? {
                "NULL" => Expr::Null,
                name => Expr::ident(name),
            },
            "null" => Expr::Null,
            "number_literal" | "char_literal" | "string_literal" | "concatenated_string"
            | "true" | "false" => Expr::lit(self.text(node)?),
            "parenthesized_expression" => match named_children(node).into_iter().next() {
                Some(inner) => Expr::Paren(Box::new(self.expr(inner)?)),
                None => return self.verbatim(node),
            },
            "binary_expression" => {
                let symbol = self.text(self.field(node, "operator")?)?;
                let Some(op) = BinaryOp::from_symbol(symbol) else {
                    return self.verbatim(node);
                };
                Expr::binary(
                    op,
                    self.expr(self.field(node, "left")?)?,
                    self.expr(self.field(node, "right")?)?,
                )
            }
            "unary_expression" | "pointer_expression" => {
                let op = match self.text(self.field(node, "operator")?)? {
                    "-" => UnaryOp::Neg,
                    "+" => UnaryOp::Plus,
                    "!" => UnaryOp::Not,
                    "~" => UnaryOp::BitNot,
                    "*" => UnaryOp::Deref,
                    "&" => UnaryOp::AddrOf,
                    _ => return self.verbatim(node),
                };
                Expr::Unary {
                    op,
                    operand: Box::new(self.expr(self.field(node, "argument")?)?),
                }
            }
            "update_expression" => {
                let operator = self.field(node, "operator")?;
                let argument = self.field(node, "argument")?;
                let prefix = operator.start_byte() < argument.start_byte();
                let op = match (self.text(operator)?, prefix) {
                    ("++", true) => UpdateOp::PreInc,
                    ("++", false) => UpdateOp::PostInc,
                    ("--", true) => UpdateOp::PreDec,
                    _ => UpdateOp::PostDec,
                };
                Expr::Update {
                    op,
                    operand: Box::new(self.expr(argument)?),
                }
            }
            "assignment_expression" => {
                let symbol = self.text(self.field(node, "operator")?)?;
                let Some(op) = AssignOp::from_symbol(symbol) else {
                    return self.verbatim(node);
                };
                Expr::Assign {
                    op,
                    target: Box::new(self.expr(self.field(node, "left")?)?),
                    value: Box::new(self.expr(self.field(node, "right")?)?),
                }
            }
            "conditional_expression" => {
                let Some(consequence) = node.child_by_field_name("consequence") else {
                    return self.verbatim(node);
                };
                Expr::Ternary {
                    cond: Box::new(self.expr(self.field(node, "condition")?)?),
                    then_value: Box::new(self.expr(consequence)?),
                    else_value: Box::new(self.expr(self.field(node, "alternative")?)?),
                }
            }
            "call_expression" => {
                let function = self.field(node, "function")?;
                if function.kind() != "identifier" {
                    return self.verbatim(node);
                }
                let callee = self.text(function)?;
                let mut args = Vec::new();
                for arg in named_children(self.field(node, "arguments")?) {
                    args.push(self.expr(arg)?);
                }
                Expr::call(callee, args)
            }
            "field_expression" => Expr::Member {
                base: Box::new(self.expr(self.field(node, "argument")?)?),
                field: self.text(self.field(node, "field")?)?.to_string(),
                arrow: self.text(self.field(node, "operator")?)? == "->",
            },
            "subscript_expression" => Expr::Index {
                base: Box::new(self.expr(self.field(node, "argument")?)?),
                index: Box::new(self.expr(self.field(node, "index")?)?),
            },
            "cast_expression" => Expr::Cast {
                ty: self.type_descriptor(self.field(node, "type")?)?,
                expr: Box::new(self.expr(self.field(node, "value")?)?),
            },
            "sizeof_expression" => Expr::SizeOf(self.sizeof_type(node)?),
            "initializer_list" => {
                let mut items = Vec::new();
                for item in named_children(node) {
                    let item = match item.kind() {
                        "initializer_pair" => self.verbatim(item)?,
                        _ => self.expr(item)?,
                    };
                    items.push(item);
                }
                Expr::InitList(items)
            }
            _ => return self.verbatim(node),
        };
        Ok(expr)
    }

    /// Type measured by `sizeof`. `sizeof(node)` may come back as a
    /// parenthesized identifier when `node` is a typedef name.
    fn sizeof_type(&mut self, node: Node<'_>) -> FrontendResult<CType> {
        if let Some(ty) = node.child_by_field_name("type") {
            return self.type_descriptor(ty);
        }
        let mut value = self.field(node, "value")?;
        while value.kind() == "parenthesized_expression" {
            match named_children(value).into_iter().next() {
                Some(inner) => value = inner,
                None => break,
            }
        }
        if value.kind() == "identifier" {
            return Ok(CType::named(self.text(value)?));
        }
        Ok(CType::Unsupported(format!("sizeof {}", self.describe(value))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn function(program: &Program, name: &str) -> FunctionDef {
        program
            .items
            .iter()
            .find_map(|item| match item {
                Item::Function(def) if def.name == name => Some(def.clone()),
                _ => None,
            })
            .unwrap()
    }

    #[test]
    fn test_function_signature() {
        let program = parse("int sum(int a, unsigned char *b) { return a; }").unwrap();
        let def = function(&program, "sum");
        assert_eq!(def.return_type, CType::named("int"));
        assert_eq!(
            def.params,
            vec![
                Param {
                    name: "a".into(),
                    ty: CType::named("int"),
                },
                Param {
                    name: "b".into(),
                    ty: CType::named("unsigned char").pointer_to(),
                },
            ]
        );
        assert_eq!(def.body, vec![Stmt::Return(Some(Expr::ident("a")))]);
    }

    #[test]
    fn test_void_parameter_list() {
        let program = parse("void tick(void) { }").unwrap();
        let def = function(&program, "tick");
        assert_eq!(def.return_type, CType::Void);
        assert!(def.params.is_empty());
        assert!(def.body.is_empty());
    }

    #[test]
    fn test_struct_and_typedef_are_hoisted() {
        let source = "
            #include <stdlib.h>
            typedef struct node { int value; struct node *next; } node_t;
            typedef struct { int x; int y; } point;
            node_t *head = NULL;
        ";
        let program = parse(source).unwrap();
        assert_eq!(
            program.items,
            vec![
                Item::Struct(StructDef {
                    name: "node".into(),
                    fields: vec![
                        Field {
                            name: "value".into(),
                            ty: CType::named("int"),
                        },
                        Field {
                            name: "next".into(),
                            ty: CType::Struct("node".into()).pointer_to(),
                        },
                    ],
                }),
                Item::Typedef {
                    name: "node_t".into(),
                    ty: CType::Struct("node".into()),
                },
                Item::Struct(StructDef {
                    name: "point".into(),
                    fields: vec![
                        Field {
                            name: "x".into(),
                            ty: CType::named("int"),
                        },
                        Field {
                            name: "y".into(),
                            ty: CType::named("int"),
                        },
                    ],
                }),
                Item::Global(VarDecl {
                    name: "head".into(),
                    ty: CType::named("node_t").pointer_to(),
                    init: Some(Expr::Null),
                }),
            ]
        );
    }

    #[test]
    fn test_prototype_is_not_a_variable() {
        let program = parse("int helper(int x);\nint count;").unwrap();
        assert_eq!(
            program.items,
            vec![Item::Global(VarDecl {
                name: "count".into(),
                ty: CType::named("int"),
                init: None,
            })]
        );
    }

    #[test]
    fn test_array_declarator() {
        let program = parse("void main() { int grid[4]; }").unwrap();
        let def = function(&program, "main");
        assert_eq!(
            def.body,
            vec![Stmt::Decl(VarDecl {
                name: "grid".into(),
                ty: CType::Array {
                    elem: Box::new(CType::named("int")),
                    len: Some(Box::new(Expr::lit("4"))),
                },
                init: None,
            })]
        );
    }

    #[test]
    fn test_update_prefix_and_postfix() {
        let program = parse("void main() { int i; i++; --i; }").unwrap();
        let def = function(&program, "main");
        let ops: Vec<UpdateOp> = def
            .body
            .iter()
            .filter_map(|stmt| match stmt {
                Stmt::Expr(Expr::Update { op, .. }) => Some(*op),
                _ => None,
            })
            .collect();
        assert_eq!(ops, vec![UpdateOp::PostInc, UpdateOp::PreDec]);
    }

    #[test]
    fn test_for_with_comma_update() {
        let program = parse("void main() { int i, j; for (i = 0; i < 3; i++, j--) { } }").unwrap();
        let def = function(&program, "main");
        let Stmt::For {
            init, cond, step, ..
        } = &def.body[2]
        else {
            panic!("expected a for loop, got {:?}", def.body[2]);
        };
        assert_eq!(
            init,
            &vec![Stmt::Expr(Expr::assign(Expr::ident("i"), Expr::lit("0")))]
        );
        assert!(cond.is_some());
        assert_eq!(step.len(), 2);
    }

    #[test]
    fn test_switch_cases() {
        let source = "void main() { int x; switch (x) { case 1: x = 2; break; default: x = 0; } }";
        let def = function(&parse(source).unwrap(), "main");
        let Stmt::Switch { cases, .. } = &def.body[1] else {
            panic!("expected a switch, got {:?}", def.body[1]);
        };
        assert_eq!(cases.len(), 2);
        assert_eq!(cases[0].value, Some(Expr::lit("1")));
        assert_eq!(cases[0].body.len(), 2);
        assert_eq!(cases[0].body[1], Stmt::Break);
        assert_eq!(cases[1].value, None);
    }

    #[test]
    fn test_arrow_and_sizeof() {
        let source = "void main() { struct node *p = malloc(sizeof(struct node)); p->value = 1; }";
        let def = function(&parse(source).unwrap(), "main");
        assert_eq!(
            def.body[0],
            Stmt::Decl(VarDecl {
                name: "p".into(),
                ty: CType::Struct("node".into()).pointer_to(),
                init: Some(Expr::call(
                    "malloc",
                    vec![Expr::SizeOf(CType::Struct("node".into()))]
                )),
            })
        );
        assert_eq!(
            def.body[1],
            Stmt::Expr(Expr::assign(
                Expr::arrow(Expr::ident("p"), "value"),
                Expr::lit("1")
            ))
        );
    }

    #[test]
    fn test_goto_is_unsupported() {
        let def = function(&parse("void main() { goto out; out: ; }").unwrap(), "main");
        assert!(matches!(&def.body[0], Stmt::Unsupported(text) if text.starts_with("goto")));
        assert_eq!(def.body[1], Stmt::Unsupported("label out".into()));
    }

    #[test]
    fn test_syntax_error_position() {
        let err = parse("void main() {\n  int x = ;\n}").unwrap_err();
        match err {
            FrontendError::Syntax { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error {:?}", other),
        }
    }
}
