//! The runtime heap: typed arenas with a fixed byte budget.
//!
//! Every object kind gets its own arena and a handle type, all sharing
//! one bump-style budget: allocations are charged against a fixed byte
//! limit and exhaustion is fatal. Nothing is ever reclaimed: objects
//! outlive the unit they belong to and the heap only grows.

use zeta_util::{FunId, IndexVec, Result, ZetaError};

use crate::hostfn::HostFn;
use crate::shape::ShapeIdx;
use crate::value::{Value, VAL_FALSE};

zeta_util::define_idx!(
    /// Handle of an array object.
    ArrayId
);

zeta_util::define_idx!(
    /// Handle of a mutable cell.
    CellId
);

zeta_util::define_idx!(
    /// Handle of a closure object.
    ClosId
);

zeta_util::define_idx!(
    /// Handle of a host function record.
    HostFnId
);

/// Heap byte budget: 16 MiB, sized up-front.
pub const HEAP_SIZE: usize = 1 << 24;

/// An array (list) heap object: ordered values with append, indexed
/// access and linear identity search.
#[derive(Debug)]
pub struct ZArray {
    /// Shape index, the object's type discriminator.
    pub shape: ShapeIdx,
    /// Element values.
    pub elems: Vec<Value>,
}

impl ZArray {
    /// Element count.
    pub fn len(&self) -> usize {
        self.elems.len()
    }

    /// True if the array has no elements.
    pub fn is_empty(&self) -> bool {
        self.elems.is_empty()
    }

    /// Get an element, if in range.
    pub fn get(&self, idx: usize) -> Option<Value> {
        self.elems.get(idx).copied()
    }

    /// Position of the first element identical to `val`, if any.
    pub fn index_of(&self, val: Value) -> Option<usize> {
        self.elems.iter().position(|e| *e == val)
    }
}

/// A mutable cell: the box an escaping variable lives in. All captures go
/// through a cell, which is what gives closure-by-reference semantics.
#[derive(Debug)]
pub struct Cell {
    /// Shape index, the object's type discriminator.
    pub shape: ShapeIdx,
    /// The boxed value.
    pub val: Value,
}

/// A function closure: the function node plus one cell handle per entry
/// in the function's free-variable list, in the same order.
#[derive(Debug)]
pub struct Closure {
    /// Shape index, the object's type discriminator.
    pub shape: ShapeIdx,
    /// The function this is a closure of.
    pub fun: FunId,
    /// Captured-variable cells, indexed by the free-variable list.
    pub cells: Vec<CellId>,
}

/// The heap: one arena per object kind plus the byte budget.
pub struct Heap {
    arrays: IndexVec<ArrayId, ZArray>,
    cells: IndexVec<CellId, Cell>,
    closures: IndexVec<ClosId, Closure>,
    hostfns: IndexVec<HostFnId, HostFn>,
    bytes_allocated: usize,
    limit: usize,
}

impl Heap {
    /// A heap with the standard 16 MiB budget.
    pub fn new() -> Self {
        Self::with_limit(HEAP_SIZE)
    }

    /// A heap with an explicit byte budget (tests exercise exhaustion
    /// with small limits).
    pub fn with_limit(limit: usize) -> Self {
        Self {
            arrays: IndexVec::new(),
            cells: IndexVec::new(),
            closures: IndexVec::new(),
            hostfns: IndexVec::new(),
            bytes_allocated: 0,
            limit,
        }
    }

    /// Bytes charged so far.
    pub fn bytes_allocated(&self) -> usize {
        self.bytes_allocated
    }

    /// Charge `size` bytes against the budget.
    fn charge(&mut self, size: usize) -> Result<()> {
        let available = self.limit - self.bytes_allocated;
        if size > available {
            return Err(ZetaError::HeapExhausted {
                requested: size,
                available,
            });
        }
        self.bytes_allocated += size;
        Ok(())
    }

    /// Allocate an empty array with reserved capacity.
    pub fn alloc_array(&mut self, shape: ShapeIdx, cap: usize) -> Result<ArrayId> {
        self.charge(std::mem::size_of::<ZArray>() + cap * std::mem::size_of::<Value>())?;
        Ok(self.arrays.push(ZArray {
            shape,
            elems: Vec::with_capacity(cap),
        }))
    }

    /// Borrow an array.
    pub fn array(&self, id: ArrayId) -> &ZArray {
        &self.arrays[id]
    }

    /// Append a value to an array.
    pub fn array_push(&mut self, id: ArrayId, val: Value) -> Result<()> {
        self.charge(std::mem::size_of::<Value>())?;
        self.arrays[id].elems.push(val);
        Ok(())
    }

    /// Store a value at `idx`, extending the array with `VAL_FALSE` when
    /// `idx` is at or past the current length.
    pub fn array_set(&mut self, id: ArrayId, idx: usize, val: Value) -> Result<()> {
        let len = self.arrays[id].elems.len();
        if idx < len {
            self.arrays[id].elems[idx] = val;
            return Ok(());
        }
        let grown = idx + 1 - len;
        self.charge(grown * std::mem::size_of::<Value>())?;
        self.arrays[id].elems.resize(idx, VAL_FALSE);
        self.arrays[id].elems.push(val);
        Ok(())
    }

    /// Allocate a fresh cell holding `VAL_FALSE`.
    pub fn alloc_cell(&mut self, shape: ShapeIdx) -> Result<CellId> {
        self.charge(std::mem::size_of::<Cell>())?;
        Ok(self.cells.push(Cell {
            shape,
            val: VAL_FALSE,
        }))
    }

    /// Read a cell.
    pub fn cell_get(&self, id: CellId) -> Value {
        self.cells[id].val
    }

    /// Write a cell.
    pub fn cell_set(&mut self, id: CellId, val: Value) {
        self.cells[id].val = val;
    }

    /// Allocate a closure over `fun` with its captured cells.
    pub fn alloc_clos(&mut self, shape: ShapeIdx, fun: FunId, cells: Vec<CellId>) -> Result<ClosId> {
        self.charge(std::mem::size_of::<Closure>() + cells.len() * std::mem::size_of::<CellId>())?;
        Ok(self.closures.push(Closure { shape, fun, cells }))
    }

    /// Borrow a closure.
    pub fn clos(&self, id: ClosId) -> &Closure {
        &self.closures[id]
    }

    /// Register a host function record.
    pub fn alloc_hostfn(&mut self, hostfn: HostFn) -> Result<HostFnId> {
        self.charge(std::mem::size_of::<HostFn>())?;
        Ok(self.hostfns.push(hostfn))
    }

    /// Borrow a host function record.
    pub fn hostfn(&self, id: HostFnId) -> &HostFn {
        &self.hostfns[id]
    }

    /// Iterate over the registered host functions.
    pub fn hostfns(&self) -> impl Iterator<Item = (HostFnId, &HostFn)> {
        self.hostfns.iter_enumerated()
    }
}

impl Default for Heap {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;
    use zeta_util::Idx;

    fn shape() -> ShapeIdx {
        ShapeIdx::from_usize(0)
    }

    #[test]
    fn test_array_append_and_get() {
        let mut heap = Heap::new();
        let arr = heap.alloc_array(shape(), 4).unwrap();
        heap.array_push(arr, Value::from_int64(7)).unwrap();
        heap.array_push(arr, Value::from_int64(9)).unwrap();
        assert_eq!(heap.array(arr).len(), 2);
        assert_eq!(heap.array(arr).get(1), Some(Value::from_int64(9)));
        assert_eq!(heap.array(arr).get(2), None);
    }

    #[test]
    fn test_array_set_extends() {
        let mut heap = Heap::new();
        let arr = heap.alloc_array(shape(), 0).unwrap();
        heap.array_set(arr, 2, Value::from_int64(5)).unwrap();
        assert_eq!(heap.array(arr).len(), 3);
        assert_eq!(heap.array(arr).get(0), Some(VAL_FALSE));
        assert_eq!(heap.array(arr).get(2), Some(Value::from_int64(5)));
    }

    #[test]
    fn test_array_index_of() {
        let mut heap = Heap::new();
        let arr = heap.alloc_array(shape(), 2).unwrap();
        heap.array_push(arr, Value::from_int64(1)).unwrap();
        heap.array_push(arr, Value::from_int64(2)).unwrap();
        assert_eq!(heap.array(arr).index_of(Value::from_int64(2)), Some(1));
        assert_eq!(heap.array(arr).index_of(Value::from_int64(3)), None);
    }

    #[test]
    fn test_cell_read_write() {
        let mut heap = Heap::new();
        let cell = heap.alloc_cell(shape()).unwrap();
        assert_eq!(heap.cell_get(cell), VAL_FALSE);
        heap.cell_set(cell, Value::from_int64(42));
        assert_eq!(heap.cell_get(cell), Value::from_int64(42));
    }

    #[test]
    fn test_exhaustion_is_fatal() {
        let mut heap = Heap::with_limit(64);
        let err = heap.alloc_array(shape(), 1024).unwrap_err();
        assert!(matches!(err, ZetaError::HeapExhausted { .. }));
    }

    #[test]
    fn test_bytes_accounting_monotonic() {
        let mut heap = Heap::new();
        let before = heap.bytes_allocated();
        heap.alloc_cell(shape()).unwrap();
        let after = heap.bytes_allocated();
        assert!(after > before);
    }
}
