//! Precedence-climbing expression parsing.

use std::path::Path;

use tracing::debug;
use zeta_lex::{is_ident_start, Input, ScanError};
use zeta_util::{FunId, Interner, NodeId, Result, ZetaError};
use zeta_vm::{Value, VAL_FALSE, VAL_TRUE};

use crate::ast::{Ast, Node};
use crate::ops::{match_op, Assoc, OpKind, OP_ASSIGN};

/// Parse a source string as a unit.
///
/// Returns either a `Fun` node with no parameters wrapping the top-level
/// expression sequence, or an `Error` node describing the first failure.
pub fn parse_string(ast: &mut Ast, interner: &mut Interner, source: &str) -> NodeId {
    debug!(bytes = source.len(), "parsing unit");
    let mut parser = Parser {
        input: Input::new(source),
        ast,
        interner,
    };
    parser.parse_unit()
}

/// Parse a source file as a unit.
pub fn parse_file(ast: &mut Ast, interner: &mut Interner, path: &Path) -> Result<NodeId> {
    let source = std::fs::read_to_string(path).map_err(|e| ZetaError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    Ok(parse_string(ast, interner, &source))
}

/// Check that a unit parsed successfully, converting an error node into
/// the fatal diagnostic carrying its source position.
pub fn parse_check_error(ast: &Ast, interner: &Interner, unit: NodeId) -> Result<FunId> {
    match ast.node(unit) {
        Node::Error { pos, msg } => Err(ZetaError::Parse {
            pos: *pos,
            msg: interner.resolve(*msg).to_string(),
        }),
        Node::Fun { fun } => Ok(*fun),
        _ => unreachable!("a parsed unit is always a function or an error node"),
    }
}

/// Parser state: the input cursor plus the arena and string table nodes
/// are allocated into.
struct Parser<'src, 'a> {
    input: Input<'src>,
    ast: &'a mut Ast,
    interner: &'a mut Interner,
}

impl Parser<'_, '_> {
    /// Allocate an error node at the current position.
    fn error_here(&mut self, msg: &str) -> NodeId {
        let pos = self.input.pos();
        let msg = self.interner.intern(msg);
        self.ast.error(pos, msg)
    }

    /// Convert a scanner failure into an error node.
    fn scan_error(&mut self, err: ScanError) -> NodeId {
        let msg = self.interner.intern(err.msg);
        self.ast.error(err.pos, msg)
    }

    /// Skip whitespace and comments; `Some` is an error node for an
    /// unterminated block comment.
    fn eat_ws(&mut self) -> Option<NodeId> {
        match self.input.eat_ws() {
            Ok(()) => None,
            Err(err) => Some(self.scan_error(err)),
        }
    }

    /// Parse a whole unit: top-level expressions to end of input, wrapped
    /// in a synthetic parameterless function.
    fn parse_unit(&mut self) -> NodeId {
        let mut exprs = Vec::new();

        loop {
            if let Some(err) = self.eat_ws() {
                return err;
            }
            if self.input.eof() {
                break;
            }

            let expr = self.parse_expr();
            if self.ast.is_error(expr) {
                return expr;
            }
            exprs.push(expr);
        }

        let body = self.ast.seq(exprs);
        self.ast.fun_node(Vec::new(), body)
    }

    /// Parse one expression.
    fn parse_expr(&mut self) -> NodeId {
        self.parse_expr_prec(0)
    }

    /// The precedence-climbing loop.
    ///
    /// Parses an atom, then repeatedly folds in operators of at least
    /// `min_prec` precedence, recursing for right-hand sides with
    /// `prec + 1` (left-associative) or `prec` (right-associative).
    fn parse_expr_prec(&mut self, min_prec: u8) -> NodeId {
        let mut lhs = self.parse_atom();
        if self.ast.is_error(lhs) {
            return lhs;
        }

        loop {
            if let Some(err) = self.eat_ws() {
                return err;
            }

            let Some(op) = match_op(&mut self.input, min_prec, false) else {
                break;
            };

            let next_min_prec = match op.assoc {
                // Bracketing operators reset the precedence floor inside
                // their brackets.
                Assoc::Left if op.close_sym.is_some() => 0,
                Assoc::Left => op.prec + 1,
                Assoc::Right => op.prec,
            };

            match op.kind {
                OpKind::Call => {
                    let args = match self.parse_expr_list(')', true) {
                        Ok(args) => args,
                        Err(err) => return err,
                    };
                    lhs = self.ast.call(lhs, args);
                }
                OpKind::Member => {
                    // The right operand of `.` is an identifier, stored
                    // as its interned string.
                    let name = match self.input.scan_ident() {
                        Ok(name) => name,
                        Err(_) => {
                            return self.error_here("expected identifier in member expression")
                        }
                    };
                    let sym = self.interner.intern(name);
                    let rhs = self.ast.str_lit(sym);
                    lhs = self.ast.binop(op, lhs, rhs);
                }
                _ if op.arity == 2 => {
                    let rhs = self.parse_expr_prec(next_min_prec);
                    if self.ast.is_error(rhs) {
                        return rhs;
                    }
                    lhs = self.ast.binop(op, lhs, rhs);

                    if let Some(close) = op.close_sym {
                        if !self.input.match_str(close) {
                            return self.error_here("expected operator closing");
                        }
                    }
                }
                _ => {
                    // A prefix-only operator in infix position.
                    return self.error_here("invalid operator");
                }
            }
        }

        lhs
    }

    /// Parse an atomic expression.
    fn parse_atom(&mut self) -> NodeId {
        if let Some(err) = self.eat_ws() {
            return err;
        }

        // Numeric literal
        if self.input.peek_ch().is_ascii_digit() {
            return match self.input.scan_int() {
                Ok(v) => self.ast.constant(Value::from_int64(v)),
                Err(err) => self.scan_error(err),
            };
        }

        // String literal
        if self.input.match_ch('\'') {
            return self.string_lit('\'');
        }
        if self.input.match_ch('"') {
            return self.string_lit('"');
        }

        // Array literal
        if self.input.match_ch('[') {
            return match self.parse_expr_list(']', true) {
                Ok(elems) => self.ast.array_lit(elems),
                Err(err) => err,
            };
        }

        // Object literal (stubbed)
        if self.input.match_str(":{") {
            return self.parse_obj_expr();
        }

        // Parenthesized expression
        if self.input.match_ch('(') {
            let expr = self.parse_expr();
            if self.ast.is_error(expr) {
                return self.error_here("expected expression after '('");
            }
            if !self.input.match_ch(')') {
                return self.error_here("expected closing parenthesis");
            }
            return expr;
        }

        // Sequence/block expression: { a b c }
        if self.input.match_ch('{') {
            return match self.parse_expr_list('}', false) {
                Ok(exprs) => self.ast.seq(exprs),
                Err(err) => err,
            };
        }

        // Prefix unary operator
        if let Some(op) = match_op(&mut self.input, 0, true) {
            let expr = self.parse_atom();
            if self.ast.is_error(expr) {
                return expr;
            }
            return self.ast.unop(op, expr);
        }

        // Keyword forms and identifier references
        if is_ident_start(self.input.peek_ch()) {
            let ident = match self.input.scan_ident() {
                Ok(ident) => ident,
                Err(err) => return self.scan_error(err),
            };
            return match ident {
                "var" => self.parse_var_decl(),
                "let" => self.parse_cst_decl(),
                "if" => self.parse_if_expr(),
                "fun" => self.parse_fun_expr(),
                "true" => self.ast.constant(VAL_TRUE),
                "false" => self.ast.constant(VAL_FALSE),
                name => {
                    let sym = self.interner.intern(name);
                    self.ast.reference(sym)
                }
            };
        }

        self.error_here("invalid expression")
    }

    /// Intern a scanned string literal body.
    fn string_lit(&mut self, quote: char) -> NodeId {
        match self.input.scan_string_lit(quote) {
            Ok(text) => {
                let sym = self.interner.intern(&text);
                self.ast.str_lit(sym)
            }
            Err(err) => self.scan_error(err),
        }
    }

    /// Parse a variable declaration; the `var` keyword is consumed.
    fn parse_var_decl(&mut self) -> NodeId {
        if let Some(err) = self.eat_ws() {
            return err;
        }
        let name = match self.input.scan_ident() {
            Ok(name) => name,
            Err(_) => return self.error_here("expected identifier in variable declaration"),
        };
        let sym = self.interner.intern(name);
        self.ast.decl_node(sym, false)
    }

    /// Parse a constant declaration; the `let` keyword is consumed.
    /// `let x = e` desugars to an assignment to a constant declaration.
    fn parse_cst_decl(&mut self) -> NodeId {
        if let Some(err) = self.eat_ws() {
            return err;
        }
        let name = match self.input.scan_ident() {
            Ok(name) => name,
            Err(_) => return self.error_here("expected identifier in variable declaration"),
        };
        let sym = self.interner.intern(name);

        if let Some(err) = self.eat_ws() {
            return err;
        }
        if !self.input.match_ch('=') {
            return self.error_here("expected value assignment in let declaration");
        }

        let val = self.parse_expr();
        if self.ast.is_error(val) {
            return val;
        }

        let decl = self.ast.decl_node(sym, true);
        self.ast.binop(&OP_ASSIGN, decl, val)
    }

    /// Parse an if expression; the `if` keyword is consumed.
    /// A missing else branch becomes a constant `false`.
    fn parse_if_expr(&mut self) -> NodeId {
        let test = self.parse_expr();
        if self.ast.is_error(test) {
            return test;
        }

        if let Some(err) = self.eat_ws() {
            return err;
        }
        if !self.input.match_keyword("then") {
            return self.error_here("expected 'then' keyword");
        }

        let then_expr = self.parse_expr();
        if self.ast.is_error(then_expr) {
            return then_expr;
        }

        if let Some(err) = self.eat_ws() {
            return err;
        }
        let else_expr = if self.input.match_keyword("else") {
            let expr = self.parse_expr();
            if self.ast.is_error(expr) {
                return expr;
            }
            expr
        } else {
            self.ast.constant(VAL_FALSE)
        };

        self.ast.if_expr(test, then_expr, else_expr)
    }

    /// Parse a function expression; the `fun` keyword is consumed.
    fn parse_fun_expr(&mut self) -> NodeId {
        if let Some(err) = self.eat_ws() {
            return err;
        }
        if !self.input.match_ch('(') {
            return self.error_here("expected parameter list");
        }

        let mut params = Vec::new();
        loop {
            if let Some(err) = self.eat_ws() {
                return err;
            }
            if self.input.match_ch(')') {
                break;
            }

            let name = match self.input.scan_ident() {
                Ok(name) => name,
                Err(err) => return self.scan_error(err),
            };
            let sym = self.interner.intern(name);
            params.push(self.ast.alloc_decl(sym, false));

            if let Some(err) = self.eat_ws() {
                return err;
            }
            if self.input.match_ch(')') {
                break;
            }
            if !self.input.match_ch(',') {
                return self.error_here("expected comma separator in parameter list");
            }
        }

        let body = self.parse_expr();
        if self.ast.is_error(body) {
            return body;
        }

        self.ast.fun_node(params, body)
    }

    /// Parse an object literal; the `:{` introducer is consumed.
    ///
    /// The form is not part of the core language yet: the contents are
    /// parsed and discarded, and an empty object node is produced.
    fn parse_obj_expr(&mut self) -> NodeId {
        loop {
            if let Some(err) = self.eat_ws() {
                return err;
            }
            if self.input.match_ch('}') {
                break;
            }

            let expr = self.parse_expr();
            if self.ast.is_error(expr) {
                return expr;
            }
        }

        self.ast.obj_lit()
    }

    /// Parse a comma-separated (or, for blocks, unseparated) expression
    /// list terminated by `end_ch`. A trailing comma is allowed.
    fn parse_expr_list(
        &mut self,
        end_ch: char,
        need_sep: bool,
    ) -> std::result::Result<Vec<NodeId>, NodeId> {
        let mut exprs = Vec::new();

        loop {
            if let Some(err) = self.eat_ws() {
                return Err(err);
            }
            if self.input.match_ch(end_ch) {
                break;
            }

            let expr = self.parse_expr();
            if self.ast.is_error(expr) {
                return Err(expr);
            }
            exprs.push(expr);

            if let Some(err) = self.eat_ws() {
                return Err(err);
            }
            if self.input.match_ch(end_ch) {
                break;
            }
            if need_sep && !self.input.match_ch(',') {
                return Err(self.error_here("expected comma separator in list"));
            }
        }

        Ok(exprs)
    }
}
