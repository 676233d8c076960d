//! The fatal-error sum for the Zeta runtime.
//!
//! The core language has no error recovery: the first failure anywhere in
//! the pipeline aborts the unit. Library code still models this as a
//! `Result` so the driver owns the one `exit` call; the variants below are
//! the complete taxonomy of ways a unit can die.

use thiserror::Error;

use crate::srcpos::SrcPos;

/// Result alias used throughout the runtime crates.
pub type Result<T> = std::result::Result<T, ZetaError>;

/// Every fatal failure the runtime can produce.
///
/// Display output is the exact single-line diagnostic the driver prints
/// before exiting; parse errors carry their `@line:col` position.
#[derive(Debug, Error)]
pub enum ZetaError {
    /// Syntax error, converted from a parse-error node.
    #[error("parsing failed {pos}: {msg}")]
    Parse { pos: SrcPos, msg: String },

    /// A reference that no enclosing scope declares.
    #[error("unresolved reference to \"{name}\"")]
    Unresolved { name: String },

    /// A non-boolean value at a boolean position (`if` test, `not`).
    /// Truthiness is deliberately strict: there is no coercion.
    #[error("cannot use value as boolean")]
    NotABoolean,

    /// Integer arithmetic or comparison on a non-integer operand.
    #[error("integer operator '{op}' applied to non-integer operand")]
    NotAnInteger { op: &'static str },

    /// Division or modulo by zero.
    #[error("division by zero")]
    DivideByZero,

    /// Indexing applied to a value that is not an array.
    #[error("indexed value is not an array")]
    NotAnArray,

    /// Array index outside `[0, len)`.
    #[error("array index out of range: {idx} (length {len})")]
    IndexOutOfRange { idx: i64, len: usize },

    /// Call whose callee is neither a closure nor a host function.
    #[error("invalid callee in function call")]
    NotCallable,

    /// Call with the wrong number of arguments.
    #[error("argument count mismatch: expected {expected}, got {found}")]
    ArityMismatch { expected: usize, found: usize },

    /// An operator the core evaluator does not implement
    /// (member access, bitwise and logical connectives parse but do not run).
    #[error("unimplemented operator: {op}")]
    UnimplementedOp { op: &'static str },

    /// An expression kind the core evaluator does not run (object
    /// literals, bare declarations).
    #[error("cannot evaluate {kind}")]
    UnsupportedExpr { kind: &'static str },

    /// Assignment whose left side is neither a declaration nor a
    /// variable reference.
    #[error("invalid assignment target")]
    InvalidAssignTarget,

    /// A host function whose signature the call bridge cannot dispatch.
    #[error("unsupported host function signature: {sig}")]
    UnsupportedSignature { sig: String },

    /// A host call whose argument does not fit the declared signature.
    #[error("host call argument does not match signature {sig}")]
    HostArgMismatch { sig: &'static str },

    /// The heap byte budget is spent. There is no reclamation.
    #[error("heap space exhausted: {requested} bytes requested, {available} available")]
    HeapExhausted { requested: usize, available: usize },

    /// The evaluated unit did not produce the value shape the runtime
    /// requires (the global unit must yield its scope closure).
    #[error("global unit did not evaluate to a closure")]
    BadGlobalUnit,

    /// I/O failure reading a source file.
    #[error("failed to read file \"{path}\": {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
