//! zeta-sem - Variable resolution for the Zeta runtime.
//!
//! Two recursive passes over each function classify every local as
//! stack-resident, escaping (captured by a nested function) or free
//! (read from an enclosing scope), and rewrite references with numeric
//! slot indices the evaluator consumes directly:
//!
//! 1. **Declaration discovery** walks the body (skipping nested function
//!    bodies) and assigns each declaration a slot in its owning
//!    function, parameters first. A same-name redeclaration reuses the
//!    existing slot.
//! 2. **Reference resolution** binds each reference to the closest
//!    enclosing declaration. A reference into an outer scope marks the
//!    declaration escaping and threads it through every function on the
//!    path, so each closure in between gets direct cell access.
//!
//! An unresolved reference is fatal; there are no global fallbacks.

pub mod resolve;

pub use resolve::var_res_pass;
