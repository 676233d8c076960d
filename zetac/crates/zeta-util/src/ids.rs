//! Shared arena identifiers.
//!
//! AST nodes live in a per-VM arena and are addressed by these typed
//! indices. They are defined here rather than in the parser crate because
//! runtime objects refer back into the AST: a closure records the
//! [`FunId`] of the function it closes over, and references record the
//! [`DeclId`] they resolved to.

use crate::define_idx;

define_idx!(
    /// Index of an expression node in the AST arena.
    NodeId
);

define_idx!(
    /// Index of a variable/constant declaration in the AST arena.
    DeclId
);

define_idx!(
    /// Index of a function node in the AST arena.
    FunId
);
