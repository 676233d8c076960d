//! The VM value: heap, shapes, string table and the global closure.

use std::fmt::Write;

use zeta_util::{FunId, Interner, Result, Symbol};

use crate::heap::{ArrayId, CellId, ClosId, Heap, HostFnId, HEAP_SIZE};
use crate::hostfn::{HostFn, HostSig};
use crate::shape::{ShapeIdx, ShapeTable};
use crate::value::Value;

/// A Zeta virtual machine.
///
/// The heap, the shape table, the string table and the global closure
/// all live here (there are no module-level globals), and a `&mut Vm`
/// is threaded through every public entry point. The semantic contract
/// is that exactly one thread touches a given `Vm`.
pub struct Vm {
    /// String-interning table.
    pub interner: Interner,
    /// Shape descriptor table.
    pub shapes: ShapeTable,
    /// Object heap.
    pub heap: Heap,
    /// Global scope closure, set by runtime initialization.
    pub global_clos: Option<ClosId>,

    /// Opaque shape of the empty object.
    pub empty_shape: ShapeIdx,
    /// Shape of string objects.
    pub string_shape: ShapeIdx,
    /// Shape of array objects.
    pub array_shape: ShapeIdx,
    /// Shape of mutable cells.
    pub cell_shape: ShapeIdx,
    /// Shape of closures.
    pub clos_shape: ShapeIdx,
    /// Shape of host function wrappers.
    pub hostfn_shape: ShapeIdx,
}

impl Vm {
    /// A VM with the standard heap budget.
    pub fn new() -> Self {
        Self::with_heap_limit(HEAP_SIZE)
    }

    /// A VM with an explicit heap byte budget.
    pub fn with_heap_limit(limit: usize) -> Self {
        let mut shapes = ShapeTable::new();
        let empty_shape = shapes.alloc_empty();
        let string_shape = shapes.alloc_empty();
        let array_shape = shapes.alloc_empty();
        let cell_shape = shapes.alloc_empty();
        let clos_shape = shapes.alloc_empty();
        let hostfn_shape = shapes.alloc_empty();

        Self {
            interner: Interner::new(),
            shapes,
            heap: Heap::with_limit(limit),
            global_clos: None,
            empty_shape,
            string_shape,
            array_shape,
            cell_shape,
            clos_shape,
            hostfn_shape,
        }
    }

    /// Intern a string in this VM's table.
    pub fn intern(&mut self, text: &str) -> Symbol {
        self.interner.intern(text)
    }

    /// Total heap bytes in use, string payload included.
    pub fn heap_bytes(&self) -> usize {
        self.heap.bytes_allocated() + self.interner.bytes()
    }

    /// Allocate an array under the standard array shape.
    pub fn alloc_array(&mut self, cap: usize) -> Result<ArrayId> {
        self.heap.alloc_array(self.array_shape, cap)
    }

    /// Allocate a mutable cell under the standard cell shape.
    pub fn alloc_cell(&mut self) -> Result<CellId> {
        self.heap.alloc_cell(self.cell_shape)
    }

    /// Allocate a closure under the standard closure shape.
    pub fn alloc_clos(&mut self, fun: FunId, cells: Vec<CellId>) -> Result<ClosId> {
        self.heap.alloc_clos(self.clos_shape, fun, cells)
    }

    /// Register a host function under its plain name.
    pub fn register_hostfn(&mut self, name: &str, sig_str: &str, sig: HostSig) -> Result<HostFnId> {
        let name = self.intern(name);
        let sig_str = self.intern(sig_str);
        self.heap.alloc_hostfn(HostFn {
            shape: self.hostfn_shape,
            name,
            sig_str,
            sig,
        })
    }

    /// Language-level equality: identical tags and either primitive word
    /// equality, interned-string identity, or structural recursive
    /// equality for arrays.
    pub fn value_equals(&self, a: Value, b: Value) -> bool {
        match (a, b) {
            (Value::Array(x), Value::Array(y)) => {
                let ax = self.heap.array(x);
                let ay = self.heap.array(y);
                ax.len() == ay.len()
                    && ax
                        .elems
                        .iter()
                        .zip(ay.elems.iter())
                        .all(|(&ea, &eb)| self.value_equals(ea, eb))
            }
            _ => a == b,
        }
    }

    /// Render a value the way the REPL prints it.
    pub fn display_value(&self, val: Value) -> String {
        let mut out = String::new();
        self.write_value(&mut out, val);
        out
    }

    fn write_value(&self, out: &mut String, val: Value) {
        match val {
            Value::Bool(true) => out.push_str("true"),
            Value::Bool(false) => out.push_str("false"),
            Value::Int64(v) => {
                let _ = write!(out, "{v}");
            }
            Value::Float64(v) => {
                let _ = write!(out, "{v}");
            }
            Value::Str(sym) => out.push_str(self.interner.resolve(sym)),
            Value::Array(id) => {
                out.push('[');
                for (i, &elem) in self.heap.array(id).elems.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    self.write_value(out, elem);
                }
                out.push(']');
            }
            Value::RawPtr(p) => {
                let _ = write!(out, "<rawptr {p:#x}>");
            }
            Value::Clos(_) => out.push_str("<closure>"),
            Value::HostFn(id) => {
                let name = self.interner.resolve(self.heap.hostfn(id).name);
                let _ = write!(out, "<hostfn {name}>");
            }
        }
    }
}

impl Default for Vm {
    fn default() -> Self {
        Self::new()
    }
}
