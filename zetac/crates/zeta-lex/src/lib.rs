//! zeta-lex - Character input for the Zeta parser.
//!
//! The Zeta parser is scannerless: it matches characters and small fixed
//! strings directly rather than tokenizing first. This crate provides the
//! [`Input`] cursor it drives (peeking, consuming, backtracking and
//! line/column tracking) together with the lexical-level scanners for
//! the pieces that *are* token-shaped: whitespace and comments,
//! identifiers, integer literals and string literals.
//!
//! Scanners report failures as [`ScanError`] values carrying the source
//! position; the parser converts them into error nodes.

pub mod input;

mod ident;
mod number;
mod string;

pub use ident::{is_ident_continue, is_ident_start};
pub use input::{Input, ScanError};
