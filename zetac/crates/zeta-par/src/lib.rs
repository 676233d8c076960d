//! zeta-par - The Zeta core parser.
//!
//! Transforms source text into AST nodes allocated in a per-VM arena.
//! Expressions are parsed by precedence climbing over a fixed operator
//! table; everything else is a small set of keyword-introduced forms
//! (`var`, `let`, `if`/`then`/`else`, `fun`) plus literals.
//!
//! A file or string parses as a *unit*: its top-level expressions are
//! wrapped in a synthetic parameterless function whose body is the
//! resulting sequence. Parsing never panics and never recovers: on the
//! first failure an error node carrying the source position is returned,
//! and [`parse_check_error`] turns it into the fatal diagnostic.

pub mod ast;
pub mod ops;
pub mod parser;

pub use ast::{Ast, Decl, Fun, Node, INVALID_IDX};
pub use ops::{Assoc, OpInfo, OpKind};
pub use parser::{parse_check_error, parse_file, parse_string};
