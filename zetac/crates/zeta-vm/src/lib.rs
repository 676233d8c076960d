//! zeta-vm - Heap and value model for the Zeta runtime.
//!
//! This crate owns the lowest layer of the runtime:
//!
//! - [`Value`] / [`Tag`]: the tagged first-class value representation.
//!   `VAL_FALSE` and `VAL_TRUE` are the only booleans.
//! - [`ShapeTable`] / [`Shape`]: heap-object layout descriptors. Every
//!   runtime heap object records the shape index it was allocated under;
//!   for the core the standard shapes act as opaque type discriminators.
//! - [`Heap`]: typed arenas for arrays, mutable cells, closures and host
//!   function records, charged against a fixed byte budget. There is no
//!   reclamation; exhaustion is fatal.
//! - [`Vm`]: the single value tying heap, shape table, string interner and
//!   the global closure together. Every public entry point of the runtime
//!   threads a `Vm` through; nothing in this workspace is a process-wide
//!   singleton.

pub mod heap;
pub mod hostfn;
pub mod shape;
pub mod value;
pub mod vm;

pub use heap::{ArrayId, Cell, CellId, ClosId, Closure, Heap, HostFnId, ZArray, HEAP_SIZE};
pub use hostfn::{HostFn, HostSig};
pub use shape::{Shape, ShapeIdx, ShapeTable};
pub use value::{Slot, Tag, Value, VAL_FALSE, VAL_TRUE};
pub use vm::Vm;
