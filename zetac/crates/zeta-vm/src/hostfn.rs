//! Host function records.
//!
//! A host function is native code callable from Zeta. Each record carries
//! the function's interned name, its interned signature string (the wire
//! format between evaluator and native code, e.g. `"bool(tag)"`), and the
//! signature parsed at registration time into [`HostSig`], which couples
//! the calling convention to a typed Rust function pointer. Call dispatch
//! matches on the enum; the signature string is never compared at call
//! time.

use zeta_util::Symbol;

use crate::shape::ShapeIdx;
use crate::value::Tag;

/// A host call signature with its native entry point.
///
/// Only the four forms the core evaluator dispatches are callable; every
/// other declared signature (`char*()`, `void*(size_t)`, ...) registers as
/// [`HostSig::Unsupported`] so the name exists in the global scope, but a
/// call through it is fatal.
#[derive(Clone, Copy)]
pub enum HostSig {
    /// `bool(tag)`: receives the tag of the first argument, returns a
    /// boolean value.
    BoolTag(fn(Tag) -> bool),
    /// `void(int)`: receives a 32-bit integer, returns `VAL_TRUE`.
    VoidInt(fn(i32)),
    /// `void(int64)`: receives the 64-bit integer word, returns `VAL_TRUE`.
    VoidInt64(fn(i64)),
    /// `void(string)`: receives the string bytes, returns `VAL_TRUE`.
    VoidStr(fn(&str)),
    /// Declared for the runtime's benefit but not callable from Zeta.
    Unsupported,
}

impl std::fmt::Debug for HostSig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            HostSig::BoolTag(_) => "BoolTag",
            HostSig::VoidInt(_) => "VoidInt",
            HostSig::VoidInt64(_) => "VoidInt64",
            HostSig::VoidStr(_) => "VoidStr",
            HostSig::Unsupported => "Unsupported",
        };
        f.write_str(name)
    }
}

/// A registered host function.
#[derive(Debug)]
pub struct HostFn {
    /// Shape index, the object's type discriminator.
    pub shape: ShapeIdx,
    /// Interned plain name (`print_int64`, ...); the runtime rebinds it
    /// in the Zeta global scope as `$name`.
    pub name: Symbol,
    /// Interned signature string.
    pub sig_str: Symbol,
    /// The signature, parsed once at registration.
    pub sig: HostSig,
}
