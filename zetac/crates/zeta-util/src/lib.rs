//! zeta-util - Foundation types for the Zeta runtime.
//!
//! This crate provides the utilities every other layer of the runtime is
//! built on:
//!
//! - **String interning** ([`Symbol`], [`Interner`]): canonicalizes equal
//!   strings to a single 4-byte handle, so identity comparison *is*
//!   equality. The interner is a plain value owned by the VM, not a
//!   process-wide singleton: one VM, one string table.
//! - **Typed indices** ([`Idx`], [`IndexVec`], [`define_idx!`]): arena
//!   handles for AST nodes, declarations, functions and heap objects.
//!   Back-edges in the AST (function parents, declaration owners) are
//!   stored as indices, never as owning references.
//! - **Source positions** ([`SrcPos`]): line/column pairs carried by parse
//!   errors and rendered as `@line:col` in diagnostics.
//! - **Errors** ([`ZetaError`]): the single fatal-error sum. The runtime
//!   has no error recovery; every failure propagates out to the driver,
//!   which prints one line and exits non-zero.

pub mod error;
pub mod ids;
pub mod index_vec;
pub mod srcpos;
pub mod symbol;

pub use error::{Result, ZetaError};
pub use ids::{DeclId, FunId, NodeId};
pub use index_vec::{Idx, IndexVec};
pub use srcpos::SrcPos;
pub use symbol::{Interner, Symbol};
