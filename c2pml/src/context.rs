// context.rs - Per-run translation state
//
// One `TranslationContext` is created per translation run and threaded by
// `&mut` through every translation function. Nothing outlives the run.

use crate::ast::{CType, Expr, FunctionDef};
use crate::memory::Pool;
use crate::types::{self, PmlType};
use std::collections::{BTreeSet, HashMap};

/// What the model needs to know about a translated function
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDescriptor {
    pub name: String,
    pub params: Vec<String>,
    pub returns_value: bool,
    pub return_type: CType,
}

impl FunctionDescriptor {
    pub fn from_def(def: &FunctionDef) -> Self {
        Self {
            name: def.name.clone(),
            params: def.params.iter().map(|p| p.name.clone()).collect(),
            returns_value: def.returns_value(),
            return_type: def.return_type.clone(),
        }
    }
}

/// How a struct field is stored in the record
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    Scalar(PmlType),
    /// Pointer stored as a slot index into the pointee's backing array
    PointerIndex,
    /// Nested struct stored as a slot index into that struct's backing array
    NestedIndex(String),
    /// Fixed-size array of scalars or indices
    Array { elem: PmlType, len: String },
    Unsupported,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    pub name: String,
    pub kind: FieldKind,
    /// Declared source type, used to follow `a->b->c` chains
    pub ty: CType,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructDescriptor {
    pub name: String,
    pub fields: Vec<FieldDescriptor>,
}

impl StructDescriptor {
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Bound on typedef chains when resolving aliases
const MAX_ALIAS_DEPTH: usize = 16;

#[derive(Debug, Default)]
pub struct TranslationContext {
    /// Variables declared in the current process, with their source types
    declared: HashMap<String, CType>,
    globals: HashMap<String, CType>,
    functions: HashMap<String, FunctionDescriptor>,
    /// Declaration order, for a stable default pool
    struct_order: Vec<String>,
    structs: HashMap<String, StructDescriptor>,
    typedefs: HashMap<String, CType>,
    /// Scalar pools referenced by any process
    scalar_pools: BTreeSet<PmlType>,
    current_function: Option<String>,
    /// Reply channels handed out in the current process, per callee
    reply_channels: HashMap<String, usize>,
    /// Temporaries holding call results in the current process, per callee
    call_results: HashMap<String, usize>,
    /// Diagnostics raised while rendering the statement being emitted
    notes: Vec<String>,
}

impl TranslationContext {
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // Scope
    // ------------------------------------------------------------------

    /// Start translating `def`: register its descriptor and open a fresh
    /// process scope holding its parameters.
    pub fn enter_function(&mut self, def: &FunctionDef) {
        self.register_function(def);
        self.declared.clear();
        self.reply_channels.clear();
        self.call_results.clear();
        self.notes.clear();
        self.current_function = Some(def.name.clone());
        for param in &def.params {
            self.declared.insert(param.name.clone(), param.ty.clone());
        }
    }

    pub fn leave_function(&mut self) {
        self.current_function = None;
        self.declared.clear();
        self.reply_channels.clear();
        self.call_results.clear();
    }

    pub fn current_function(&self) -> Option<&str> {
        self.current_function.as_deref()
    }

    /// Record a declaration. Returns `false` when the name is already
    /// declared in this scope and must not be declared again.
    pub fn declare(&mut self, name: &str, ty: CType) -> bool {
        if self.declared.contains_key(name) {
            return false;
        }
        self.declared.insert(name.to_string(), ty);
        true
    }

    pub fn is_declared(&self, name: &str) -> bool {
        self.declared.contains_key(name)
    }

    pub fn declare_global(&mut self, name: &str, ty: CType) -> bool {
        if self.globals.contains_key(name) {
            return false;
        }
        self.globals.insert(name.to_string(), ty);
        true
    }

    /// Source type of a variable, locals shadowing globals
    pub fn var_type(&self, name: &str) -> Option<&CType> {
        self.declared.get(name).or_else(|| self.globals.get(name))
    }

    // ------------------------------------------------------------------
    // Functions
    // ------------------------------------------------------------------

    /// Make `def` callable as a process, whether or not its body has been
    /// translated yet
    pub fn register_function(&mut self, def: &FunctionDef) {
        self.functions
            .insert(def.name.clone(), FunctionDescriptor::from_def(def));
    }

    pub fn function(&self, name: &str) -> Option<&FunctionDescriptor> {
        self.functions.get(name)
    }

    pub fn has_function(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// A reply channel name not yet used in this process: `ret_f`, `ret_f1`, ...
    pub fn fresh_reply_channel(&mut self, callee: &str) -> String {
        fresh_name(&mut self.reply_channels, "ret", callee)
    }

    /// A temporary for a call result not yet used in this process: `val_f`,
    /// `val_f1`, ...
    pub fn fresh_call_result(&mut self, callee: &str) -> String {
        fresh_name(&mut self.call_results, "val", callee)
    }

    // ------------------------------------------------------------------
    // Structs and typedefs
    // ------------------------------------------------------------------

    pub fn add_struct(&mut self, descriptor: StructDescriptor) {
        if !self.structs.contains_key(&descriptor.name) {
            self.struct_order.push(descriptor.name.clone());
        }
        self.structs.insert(descriptor.name.clone(), descriptor);
    }

    pub fn add_typedef(&mut self, alias: &str, ty: CType) {
        self.typedefs.insert(alias.to_string(), ty);
    }

    pub fn struct_descriptor(&self, name: &str) -> Option<&StructDescriptor> {
        self.structs.get(name)
    }

    pub fn has_struct(&self, name: &str) -> bool {
        self.structs.contains_key(name)
    }

    /// Follow typedef aliases until a non-alias type is reached
    pub fn resolve<'a>(&'a self, ty: &'a CType) -> &'a CType {
        let mut ty = ty;
        for _ in 0..MAX_ALIAS_DEPTH {
            match ty {
                CType::Named(name) => match self.typedefs.get(name) {
                    Some(target) => ty = target,
                    None => return ty,
                },
                _ => return ty,
            }
        }
        ty
    }

    /// Name of the struct `ty` denotes, if any (`struct node`, `node`, or an alias)
    pub fn struct_name_of(&self, ty: &CType) -> Option<String> {
        match self.resolve(ty) {
            CType::Struct(name) => Some(name.clone()),
            CType::Named(name) if self.has_struct(name) => Some(name.clone()),
            _ => None,
        }
    }

    /// Pool backing the pointee of `ty`, when `ty` is a pointer
    pub fn pointee_pool(&self, ty: &CType) -> Option<Pool> {
        match self.resolve(ty) {
            CType::Pointer(pointee) => self.pool_for(pointee),
            _ => None,
        }
    }

    /// Pool holding values of type `ty`
    pub fn pool_for(&self, ty: &CType) -> Option<Pool> {
        if let Some(name) = self.struct_name_of(ty) {
            return Some(Pool::Record(name));
        }
        match self.resolve(ty) {
            CType::Named(name) if types::is_builtin(name) => {
                Some(Pool::Scalar(types::map_scalar(name)))
            }
            // Not declared (yet), but not a scalar either
            CType::Named(name) => Some(Pool::Record(name.clone())),
            CType::Pointer(_) => Some(Pool::Scalar(PmlType::Int)),
            CType::Struct(name) => Some(Pool::Record(name.clone())),
            CType::Void | CType::Array { .. } | CType::Unsupported(_) => None,
        }
    }

    /// Pool used when nothing better is known: the first declared struct,
    /// or `node`
    pub fn default_pool(&self) -> Pool {
        let name = self
            .struct_order
            .first()
            .cloned()
            .unwrap_or_else(|| "node".to_string());
        Pool::Record(name)
    }

    pub fn require_scalar_pool(&mut self, kind: PmlType) {
        self.scalar_pools.insert(kind);
    }

    pub fn scalar_pools(&self) -> impl Iterator<Item = PmlType> + '_ {
        self.scalar_pools.iter().copied()
    }

    // ------------------------------------------------------------------
    // Expression types
    // ------------------------------------------------------------------

    /// Best-effort source type of an expression
    pub fn type_of(&self, expr: &Expr) -> Option<CType> {
        match expr {
            Expr::Ident(name) => self.var_type(name).cloned(),
            Expr::Paren(inner) => self.type_of(inner),
            Expr::Cast { ty, .. } => Some(ty.clone()),
            Expr::Member { base, field, arrow } => {
                let base_ty = self.type_of(base)?;
                let owner = if *arrow {
                    match self.resolve(&base_ty) {
                        CType::Pointer(pointee) => self.struct_name_of(pointee)?,
                        _ => return None,
                    }
                } else {
                    self.struct_name_of(&base_ty)?
                };
                let field = self.struct_descriptor(&owner)?.field(field)?;
                Some(field.ty.clone())
            }
            Expr::Index { base, .. } => match self.resolve(&self.type_of(base)?) {
                CType::Array { elem, .. } => Some((**elem).clone()),
                CType::Pointer(pointee) => Some((**pointee).clone()),
                _ => None,
            },
            Expr::Unary {
                op: crate::ast::UnaryOp::Deref,
                operand,
            } => match self.resolve(&self.type_of(operand)?) {
                CType::Pointer(pointee) => Some((**pointee).clone()),
                _ => None,
            },
            Expr::Call { callee, .. } => self.function(callee).map(|f| f.return_type.clone()),
            _ => None,
        }
    }

    /// Field descriptor addressed by a member expression
    pub fn member_field(&self, expr: &Expr) -> Option<&FieldDescriptor> {
        let Expr::Member { base, field, arrow } = expr else {
            return None;
        };
        let base_ty = self.type_of(base)?;
        let owner = if *arrow {
            match self.resolve(&base_ty) {
                CType::Pointer(pointee) => self.struct_name_of(pointee)?,
                _ => return None,
            }
        } else {
            self.struct_name_of(&base_ty)?
        };
        self.struct_descriptor(&owner)?.field(field)
    }

    // ------------------------------------------------------------------
    // Diagnostics
    // ------------------------------------------------------------------

    /// Flag something the model cannot express faithfully. The note is
    /// emitted as a comment before the statement being rendered.
    pub fn note(&mut self, message: String) {
        self.warn(&message);
        self.notes.push(message);
    }

    /// Log an unsupported construct that is marked in the output directly
    pub fn warn(&self, message: &str) {
        tracing::warn!(
            function = self.current_function.as_deref().unwrap_or("<global>"),
            "{}",
            message
        );
    }

    pub fn take_notes(&mut self) -> Vec<String> {
        std::mem::take(&mut self.notes)
    }
}

fn fresh_name(counters: &mut HashMap<String, usize>, prefix: &str, callee: &str) -> String {
    let n = counters.entry(callee.to_string()).or_insert(0);
    let name = if *n == 0 {
        format!("{}_{}", prefix, callee)
    } else {
        format!("{}_{}{}", prefix, callee, n)
    };
    *n += 1;
    name
}
