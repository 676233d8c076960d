//! zeta-interp - The Zeta core evaluator and runtime.
//!
//! A recursive tree-walking evaluator over resolved AST nodes. Each call
//! frame is a vector of slots sized to the callee's local count; slots of
//! escaping locals hold heap cells, everything else lives directly in the
//! frame. Closures capture by reference through those cells, so there is a
//! single code path for every captured variable.
//!
//! The runtime half loads `global.zeta` at startup, registers the native
//! host functions under `$`-prefixed names, and retains the closure the
//! global unit evaluates to. Later units resolve against that closure's
//! function, which is how user code reaches `$print_int64` and friends by
//! ordinary name lookup.

pub mod eval;
pub mod host;
pub mod runtime;

pub use eval::{eval_call, eval_expr, eval_truth};
pub use host::init_api_core;
pub use runtime::{eval_file, eval_string, eval_unit, runtime_init};
