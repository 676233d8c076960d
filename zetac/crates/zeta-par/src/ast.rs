//! The AST arena and node types.
//!
//! Nodes, declarations and functions live in three `IndexVec` arenas
//! inside one [`Ast`] value owned alongside the VM; everything refers to
//! everything else by typed index. The graph is cyclic: functions point
//! at their parent function and declarations point back at their owning
//! function, which is exactly why back-edges are indices and not
//! references.
//!
//! The arena is append-only and outlives the units parsed into it: a
//! closure created while evaluating one unit may be called long after
//! another unit has been parsed.

use indexmap::IndexSet;
use zeta_util::{DeclId, FunId, IndexVec, NodeId, SrcPos, Symbol};
use zeta_vm::Value;

use crate::ops::OpInfo;

/// Sentinel for a slot index that resolution has not assigned yet.
pub const INVALID_IDX: u32 = u32::MAX;

/// A variable or constant declaration.
#[derive(Debug)]
pub struct Decl {
    /// Identifier name.
    pub name: Symbol,
    /// Local slot index within the owning function; [`INVALID_IDX`]
    /// until declaration discovery assigns it.
    pub idx: u32,
    /// Declared with `let` (constant) rather than `var`.
    pub cst: bool,
    /// Captured by a nested function; lives in a cell, not a stack slot.
    pub esc: bool,
    /// Owning function, set during declaration discovery.
    pub fun: Option<FunId>,
}

/// A function expression.
#[derive(Debug)]
pub struct Fun {
    /// Enclosing function, set during resolution. `None` for a unit
    /// whose scope chain has no parent.
    pub parent: Option<FunId>,
    /// Ordered parameter declarations.
    pub params: Vec<DeclId>,
    /// All local declarations, parameters first. A declaration's `idx`
    /// addresses this list.
    pub local_decls: Vec<DeclId>,
    /// Locals captured by nested functions; each gets a fresh cell on
    /// function entry.
    pub esc_locals: IndexSet<DeclId>,
    /// Variables captured from enclosing functions; a closure's cell
    /// vector is indexed by this set.
    pub free_vars: IndexSet<DeclId>,
    /// Function body expression.
    pub body: NodeId,
}

/// An expression node.
#[derive(Debug)]
pub enum Node {
    /// Parse failure: source position plus diagnostic text.
    Error { pos: SrcPos, msg: Symbol },
    /// Constant value (integers and booleans).
    Const { val: Value },
    /// String literal; the interned string is the node.
    Str { sym: Symbol },
    /// Array literal.
    ArrayLit { elems: Vec<NodeId> },
    /// Object literal (`:{}`); parsed but stubbed, never evaluated.
    ObjLit,
    /// Variable reference. `idx` addresses either the local slots or the
    /// closure's cell vector, depending on where `decl` lives.
    Ref {
        name: Symbol,
        idx: u32,
        decl: Option<DeclId>,
    },
    /// Declaration in expression position (`var x`, or the left side of
    /// a `let` desugaring).
    Decl { decl: DeclId },
    /// Binary operator application.
    BinOp {
        op: &'static OpInfo,
        lhs: NodeId,
        rhs: NodeId,
    },
    /// Prefix unary operator application.
    UnOp { op: &'static OpInfo, expr: NodeId },
    /// Sequence/block of expressions; value is the last expression's.
    Seq { exprs: Vec<NodeId> },
    /// `if test then a else b`.
    If {
        test: NodeId,
        then_expr: NodeId,
        else_expr: NodeId,
    },
    /// Function call.
    Call { callee: NodeId, args: Vec<NodeId> },
    /// Function expression.
    Fun { fun: FunId },
}

/// The AST arena.
#[derive(Default)]
pub struct Ast {
    pub nodes: IndexVec<NodeId, Node>,
    pub decls: IndexVec<DeclId, Decl>,
    pub funs: IndexVec<FunId, Fun>,
}

impl Ast {
    /// An empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Borrow a node.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    /// Mutably borrow a node.
    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id]
    }

    /// Borrow a declaration.
    pub fn decl(&self, id: DeclId) -> &Decl {
        &self.decls[id]
    }

    /// Mutably borrow a declaration.
    pub fn decl_mut(&mut self, id: DeclId) -> &mut Decl {
        &mut self.decls[id]
    }

    /// Borrow a function.
    pub fn fun(&self, id: FunId) -> &Fun {
        &self.funs[id]
    }

    /// Mutably borrow a function.
    pub fn fun_mut(&mut self, id: FunId) -> &mut Fun {
        &mut self.funs[id]
    }

    /// True if `id` is a parse-error node.
    pub fn is_error(&self, id: NodeId) -> bool {
        matches!(self.nodes[id], Node::Error { .. })
    }

    /// Allocate an error node.
    pub fn error(&mut self, pos: SrcPos, msg: Symbol) -> NodeId {
        self.nodes.push(Node::Error { pos, msg })
    }

    /// Allocate a constant node.
    pub fn constant(&mut self, val: Value) -> NodeId {
        self.nodes.push(Node::Const { val })
    }

    /// Allocate a string-literal node.
    pub fn str_lit(&mut self, sym: Symbol) -> NodeId {
        self.nodes.push(Node::Str { sym })
    }

    /// Allocate an array-literal node.
    pub fn array_lit(&mut self, elems: Vec<NodeId>) -> NodeId {
        self.nodes.push(Node::ArrayLit { elems })
    }

    /// Allocate the stubbed object-literal node.
    pub fn obj_lit(&mut self) -> NodeId {
        self.nodes.push(Node::ObjLit)
    }

    /// Allocate an unresolved reference node.
    pub fn reference(&mut self, name: Symbol) -> NodeId {
        self.nodes.push(Node::Ref {
            name,
            idx: INVALID_IDX,
            decl: None,
        })
    }

    /// Allocate a declaration and its wrapping expression node.
    pub fn decl_node(&mut self, name: Symbol, cst: bool) -> NodeId {
        let decl = self.alloc_decl(name, cst);
        self.nodes.push(Node::Decl { decl })
    }

    /// Allocate a bare declaration (used for parameters).
    pub fn alloc_decl(&mut self, name: Symbol, cst: bool) -> DeclId {
        self.decls.push(Decl {
            name,
            idx: INVALID_IDX,
            cst,
            esc: false,
            fun: None,
        })
    }

    /// Allocate a binary operator node.
    pub fn binop(&mut self, op: &'static OpInfo, lhs: NodeId, rhs: NodeId) -> NodeId {
        self.nodes.push(Node::BinOp { op, lhs, rhs })
    }

    /// Allocate a unary operator node.
    pub fn unop(&mut self, op: &'static OpInfo, expr: NodeId) -> NodeId {
        self.nodes.push(Node::UnOp { op, expr })
    }

    /// Allocate a sequence node.
    pub fn seq(&mut self, exprs: Vec<NodeId>) -> NodeId {
        self.nodes.push(Node::Seq { exprs })
    }

    /// Allocate an if node.
    pub fn if_expr(&mut self, test: NodeId, then_expr: NodeId, else_expr: NodeId) -> NodeId {
        self.nodes.push(Node::If {
            test,
            then_expr,
            else_expr,
        })
    }

    /// Allocate a call node.
    pub fn call(&mut self, callee: NodeId, args: Vec<NodeId>) -> NodeId {
        self.nodes.push(Node::Call { callee, args })
    }

    /// Allocate a function node; `local_decls`, `esc_locals`, `free_vars`
    /// and `parent` are filled in by resolution.
    pub fn fun_node(&mut self, params: Vec<DeclId>, body: NodeId) -> NodeId {
        let fun = self.funs.push(Fun {
            parent: None,
            params,
            local_decls: Vec::new(),
            esc_locals: IndexSet::new(),
            free_vars: IndexSet::new(),
            body,
        });
        self.nodes.push(Node::Fun { fun })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_detection() {
        let mut ast = Ast::new();
        let mut interner = zeta_util::Interner::new();
        let msg = interner.intern("boom");
        let err = ast.error(SrcPos::START, msg);
        let k = ast.constant(Value::from_int64(1));
        assert!(ast.is_error(err));
        assert!(!ast.is_error(k));
    }

    #[test]
    fn test_fun_node_starts_unresolved() {
        let mut ast = Ast::new();
        let body = ast.seq(Vec::new());
        let node = ast.fun_node(Vec::new(), body);
        let Node::Fun { fun } = *ast.node(node) else {
            panic!("expected fun node");
        };
        let fun = ast.fun(fun);
        assert!(fun.parent.is_none());
        assert!(fun.local_decls.is_empty());
        assert!(fun.free_vars.is_empty());
    }

    #[test]
    fn test_decl_starts_without_slot() {
        let mut ast = Ast::new();
        let mut interner = zeta_util::Interner::new();
        let name = interner.intern("x");
        let decl = ast.alloc_decl(name, true);
        assert_eq!(ast.decl(decl).idx, INVALID_IDX);
        assert!(ast.decl(decl).cst);
        assert!(!ast.decl(decl).esc);
        assert!(ast.decl(decl).fun.is_none());
    }
}
