//! Tagged first-class values.

use static_assertions::const_assert;
use zeta_util::Symbol;

use crate::heap::{ArrayId, CellId, ClosId, HostFnId};

/// Value type tags.
///
/// The tag set mirrors the wire format the host bridge speaks: a
/// `bool(tag)` host function receives one of these. `Object` is reserved
/// for the prototype object system, which the core only stubs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Tag {
    Bool = 0,
    Int64 = 1,
    Float64 = 2,
    String = 3,
    Array = 4,
    RawPtr = 5,
    Object = 6,
    Clos = 7,
    HostFn = 8,
}

/// A first-class Zeta value.
///
/// Strings are interned symbols, so `Str` comparison is identity
/// comparison. Arrays, cells, closures and host functions are heap
/// handles; the derived equality on those is *identity*, while the
/// language-level `==` (structural for arrays) lives in
/// [`Vm::value_equals`](crate::Vm::value_equals).
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Value {
    Bool(bool),
    Int64(i64),
    Float64(f64),
    Str(Symbol),
    Array(ArrayId),
    RawPtr(u64),
    Clos(ClosId),
    HostFn(HostFnId),
}

// A value is a word plus a tag; keep it register-friendly.
const_assert!(std::mem::size_of::<Value>() <= 16);

/// The canonical false value.
pub const VAL_FALSE: Value = Value::Bool(false);

/// The canonical true value.
pub const VAL_TRUE: Value = Value::Bool(true);

impl Value {
    /// Build an integer value.
    #[inline]
    pub fn from_int64(v: i64) -> Self {
        Value::Int64(v)
    }

    /// Build one of the two canonical booleans.
    #[inline]
    pub fn from_bool(b: bool) -> Self {
        if b {
            VAL_TRUE
        } else {
            VAL_FALSE
        }
    }

    /// The tag of this value.
    pub fn tag(&self) -> Tag {
        match self {
            Value::Bool(_) => Tag::Bool,
            Value::Int64(_) => Tag::Int64,
            Value::Float64(_) => Tag::Float64,
            Value::Str(_) => Tag::String,
            Value::Array(_) => Tag::Array,
            Value::RawPtr(_) => Tag::RawPtr,
            Value::Clos(_) => Tag::Clos,
            Value::HostFn(_) => Tag::HostFn,
        }
    }

    /// The integer payload, if this is an `Int64`.
    #[inline]
    pub fn as_int64(&self) -> Option<i64> {
        match self {
            Value::Int64(v) => Some(*v),
            _ => None,
        }
    }

    /// The interned-string payload, if this is a `Str`.
    #[inline]
    pub fn as_str_sym(&self) -> Option<Symbol> {
        match self {
            Value::Str(s) => Some(*s),
            _ => None,
        }
    }
}

/// Cells are not first-class values; this alias documents slots that hold
/// either a direct value or, for escaping locals, a cell handle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Slot {
    /// A stack-resident local.
    Direct(Value),
    /// An escaping local, boxed in a heap cell.
    Boxed(CellId),
}

impl Slot {
    /// Placeholder for a slot before its first assignment.
    pub const UNINIT: Slot = Slot::Direct(VAL_FALSE);
}
