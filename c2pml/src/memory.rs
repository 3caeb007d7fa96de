// memory.rs - Bounded heap model
//
// `malloc`/`free` are replaced by a fixed pool per pointee type:
//
//   node node_mem[9];   records
//   int node_valid[9];  occupancy flags
//
// Slot 0 is the null sentinel, so slots 1..=8 are allocatable. Allocation is
// a first-fit scan inside `atomic`; running off the end of the pool trips an
// assertion in the model. Deallocation clears the flag and zeroes the record
// in one `d_step`. Freeing a free slot is not detected.

use crate::context::{FieldKind, TranslationContext};
use crate::emit::OutputBuffer;
use crate::types::PmlType;

/// Slots per pool, including the null slot
pub const POOL_CAPACITY: usize = 9;

/// Variable receiving the allocated slot index
pub const ALLOC_RESULT: &str = "tmp";

/// A backing store for one pointee type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pool {
    /// Records of a struct type
    Record(String),
    /// Cells of a primitive kind
    Scalar(PmlType),
}

impl Pool {
    pub fn name(&self) -> &str {
        match self {
            Pool::Record(name) => name,
            Pool::Scalar(kind) => kind.as_str(),
        }
    }

    /// Backing array, e.g. `node_mem`
    pub fn mem(&self) -> String {
        format!("{}_mem", self.name())
    }

    /// Validity bitmap, e.g. `node_valid`
    pub fn valid(&self) -> String {
        format!("{}_valid", self.name())
    }

    /// Scan cursor used by the allocator, e.g. `malloc_node_c`
    pub fn cursor(&self) -> String {
        format!("malloc_{}_c", self.name())
    }
}

/// Declare the backing and validity arrays of `pool`
pub fn emit_pool_arrays(out: &mut OutputBuffer, indent: usize, pool: &Pool) {
    out.emit(
        indent,
        format!("{} {}[{}];", pool.name(), pool.mem(), POOL_CAPACITY),
    );
    out.emit(indent, format!("int {}[{}];", pool.valid(), POOL_CAPACITY));
}

/// Declare every scalar pool referenced during translation
pub fn emit_scalar_pools(cx: &TranslationContext, out: &mut OutputBuffer) {
    let mut any = false;
    for kind in cx.scalar_pools() {
        emit_pool_arrays(out, 0, &Pool::Scalar(kind));
        any = true;
    }
    if any {
        out.blank();
    }
}

/// Emit the allocation sequence for `pool`. The slot index ends up in
/// [`ALLOC_RESULT`].
pub fn emit_alloc(cx: &mut TranslationContext, out: &mut OutputBuffer, indent: usize, pool: &Pool) {
    if let Pool::Scalar(kind) = pool {
        cx.require_scalar_pool(*kind);
    }
    tracing::debug!(pool = pool.name(), "allocation");

    let cursor = pool.cursor();
    let valid = pool.valid();
    let int = crate::ast::CType::named("int");
    if cx.declare(&cursor, int.clone()) {
        out.emit(indent, format!("int {};", cursor));
    }
    if cx.declare(ALLOC_RESULT, int) {
        out.emit(indent, format!("int {};", ALLOC_RESULT));
    }

    out.emit(indent, "atomic {");
    out.emit(indent + 1, format!("{} = 1;", cursor));
    out.emit(indent + 1, "do");
    out.emit(
        indent + 1,
        format!(":: ({} >= {}) -> break", cursor, POOL_CAPACITY),
    );
    out.emit(indent + 1, ":: else ->");
    out.emit(indent + 2, "if");
    out.emit(indent + 2, format!(":: ({}[{}] == 0) ->", valid, cursor));
    out.emit(indent + 3, format!("{}[{}] = 1;", valid, cursor));
    out.emit(indent + 3, "break");
    out.emit(indent + 2, format!(":: else -> {}++", cursor));
    out.emit(indent + 2, "fi");
    out.emit(indent + 1, "od;");
    out.emit(indent + 1, format!("assert({} < {});", cursor, POOL_CAPACITY));
    out.emit(indent + 1, format!("{} = {};", ALLOC_RESULT, cursor));
    out.emit(indent, "};");
}

/// Emit the deallocation of slot `slot` (already rendered) in `pool`
pub fn emit_free(
    cx: &mut TranslationContext,
    out: &mut OutputBuffer,
    indent: usize,
    pool: &Pool,
    slot: &str,
) {
    tracing::debug!(pool = pool.name(), slot, "deallocation");

    out.emit(indent, "d_step {");
    out.emit(indent + 1, format!("{}[{}] = 0;", pool.valid(), slot));
    match pool {
        Pool::Scalar(kind) => {
            cx.require_scalar_pool(*kind);
            out.emit(indent + 1, format!("{}[{}] = 0;", pool.mem(), slot));
        }
        Pool::Record(name) => {
            let Some(descriptor) = cx.struct_descriptor(name) else {
                out.unsupported(indent + 1, &format!("fields of unknown struct {}", name));
                out.emit(indent, "};");
                return;
            };
            for field in &descriptor.fields {
                let target = format!("{}[{}].{}", pool.mem(), slot, field.name);
                match &field.kind {
                    FieldKind::Scalar(_) | FieldKind::PointerIndex | FieldKind::NestedIndex(_) => {
                        out.emit(indent + 1, format!("{} = 0;", target));
                    }
                    FieldKind::Array { len, .. } => match len.parse::<usize>() {
                        Ok(n) => {
                            for i in 0..n {
                                out.emit(indent + 1, format!("{}[{}] = 0;", target, i));
                            }
                        }
                        Err(_) => out.unsupported(indent + 1, &format!("reset of {}", target)),
                    },
                    FieldKind::Unsupported => {}
                }
            }
        }
    }
    out.emit(indent, "};");
}
