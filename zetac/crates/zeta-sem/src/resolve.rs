//! Declaration discovery, reference resolution and upvalue threading.

use tracing::{debug, trace};
use zeta_par::{Ast, Node};
use zeta_util::{DeclId, FunId, Interner, NodeId, Result, Symbol, ZetaError};

/// Resolve all variables in `fun`, whose lexical parent is `parent`.
///
/// Runs declaration discovery over the parameters and body, then
/// reference resolution; nested functions are resolved recursively as
/// the second pass encounters them. After this returns, `local_decls`,
/// `esc_locals` and `free_vars` of every function reachable from `fun`
/// are fixed, and every reference carries its slot index.
pub fn var_res_pass(ast: &mut Ast, interner: &Interner, fun: FunId, parent: Option<FunId>) -> Result<()> {
    ast.fun_mut(fun).parent = parent;

    // Parameters occupy the low slot indices.
    let params = ast.fun(fun).params.clone();
    for param in params {
        declare(ast, fun, param);
    }

    let body = ast.fun(fun).body;
    find_decls(ast, body, fun);
    resolve_refs(ast, interner, body, fun)?;

    debug!(
        locals = ast.fun(fun).local_decls.len(),
        escaping = ast.fun(fun).esc_locals.len(),
        free = ast.fun(fun).free_vars.len(),
        "resolved function"
    );
    Ok(())
}

/// Record `decl` as a local of `fun`, assigning the next slot index.
///
/// If a local with the same interned name already exists, the new
/// declaration is dropped and takes over the existing slot index, so
/// assignments through it land on the original variable.
fn declare(ast: &mut Ast, fun: FunId, decl: DeclId) {
    ast.decl_mut(decl).fun = Some(fun);

    let name = ast.decl(decl).name;
    let existing = ast
        .fun(fun)
        .local_decls
        .iter()
        .find(|&&d| ast.decl(d).name == name)
        .copied();

    if let Some(existing) = existing {
        ast.decl_mut(decl).idx = ast.decl(existing).idx;
        return;
    }

    let idx = ast.fun(fun).local_decls.len() as u32;
    ast.decl_mut(decl).idx = idx;
    ast.fun_mut(fun).local_decls.push(decl);
}

/// Pass 1: find all declarations in an AST subtree.
///
/// Nested function bodies are skipped; their declarations are not of
/// this scope.
fn find_decls(ast: &mut Ast, expr: NodeId, fun: FunId) {
    match ast.node(expr) {
        Node::Error { .. }
        | Node::Const { .. }
        | Node::Str { .. }
        | Node::ObjLit
        | Node::Ref { .. }
        | Node::Fun { .. } => {}

        Node::Decl { decl } => {
            let decl = *decl;
            declare(ast, fun, decl);
        }

        Node::ArrayLit { elems } => {
            for elem in elems.clone() {
                find_decls(ast, elem, fun);
            }
        }

        Node::Seq { exprs } => {
            for expr in exprs.clone() {
                find_decls(ast, expr, fun);
            }
        }

        Node::BinOp { lhs, rhs, .. } => {
            let (lhs, rhs) = (*lhs, *rhs);
            find_decls(ast, lhs, fun);
            find_decls(ast, rhs, fun);
        }

        Node::UnOp { expr, .. } => {
            let expr = *expr;
            find_decls(ast, expr, fun);
        }

        Node::If {
            test,
            then_expr,
            else_expr,
        } => {
            let (test, then_expr, else_expr) = (*test, *then_expr, *else_expr);
            find_decls(ast, test, fun);
            find_decls(ast, then_expr, fun);
            find_decls(ast, else_expr, fun);
        }

        Node::Call { callee, args } => {
            let callee = *callee;
            let args = args.clone();
            find_decls(ast, callee, fun);
            for arg in args {
                find_decls(ast, arg, fun);
            }
        }
    }
}

/// Find the closest enclosing declaration with a matching name.
fn find_decl(ast: &Ast, name: Symbol, fun: FunId) -> Option<DeclId> {
    let f = ast.fun(fun);
    for &decl in &f.local_decls {
        if ast.decl(decl).name == name {
            return Some(decl);
        }
    }
    match f.parent {
        Some(parent) => find_decl(ast, name, parent),
        None => None,
    }
}

/// Thread an escaping declaration from the referring function up to (but
/// not including) the declaring function.
///
/// Every function on the path records the declaration as a free
/// variable; the declaring function records it as an escaping local.
/// Both sets are deduplicated by declaration identity, and an already
/// threaded declaration stops the climb early.
fn thread_esc_var(ast: &mut Ast, decl: DeclId, ref_fun: FunId) {
    let decl_fun = ast.decl(decl).fun.expect("discovery assigns owners before threading");
    let mut cur = ref_fun;

    loop {
        if decl_fun == cur {
            if cur != ref_fun {
                ast.fun_mut(cur).esc_locals.insert(decl);
            }
            return;
        }

        if !ast.fun_mut(cur).free_vars.insert(decl) {
            // Already threaded through this function, and therefore
            // through all of its ancestors.
            return;
        }

        cur = ast
            .fun(cur)
            .parent
            .expect("resolved declarations live in an enclosing function");
    }
}

/// Pass 2: resolve all references in an AST subtree.
fn resolve_refs(ast: &mut Ast, interner: &Interner, expr: NodeId, fun: FunId) -> Result<()> {
    match ast.node(expr) {
        Node::Error { .. }
        | Node::Const { .. }
        | Node::Str { .. }
        | Node::ObjLit
        | Node::Decl { .. } => {}

        Node::Ref { name, .. } => {
            let name = *name;
            let decl = find_decl(ast, name, fun).ok_or_else(|| ZetaError::Unresolved {
                name: interner.resolve(name).to_string(),
            })?;
            let decl_fun = ast
                .decl(decl)
                .fun
                .expect("discovered declarations have owners");

            let direct = decl_fun == fun;
            let idx = if direct {
                // Direct local access.
                let idx = ast.decl(decl).idx;
                debug_assert!((idx as usize) < ast.fun(fun).local_decls.len());
                idx
            } else {
                // Capture from an enclosing scope.
                ast.decl_mut(decl).esc = true;
                thread_esc_var(ast, decl, fun);
                ast.fun(fun)
                    .free_vars
                    .get_index_of(&decl)
                    .expect("threading inserts into the referring function") as u32
            };

            trace!(name = interner.resolve(name), idx, direct, "resolved reference");

            let Node::Ref {
                idx: ref_idx,
                decl: ref_decl,
                ..
            } = ast.node_mut(expr)
            else {
                unreachable!();
            };
            *ref_idx = idx;
            *ref_decl = Some(decl);
        }

        Node::ArrayLit { elems } => {
            for elem in elems.clone() {
                resolve_refs(ast, interner, elem, fun)?;
            }
        }

        Node::Seq { exprs } => {
            for expr in exprs.clone() {
                resolve_refs(ast, interner, expr, fun)?;
            }
        }

        Node::BinOp { lhs, rhs, .. } => {
            let (lhs, rhs) = (*lhs, *rhs);
            resolve_refs(ast, interner, lhs, fun)?;
            resolve_refs(ast, interner, rhs, fun)?;
        }

        Node::UnOp { expr, .. } => {
            let expr = *expr;
            resolve_refs(ast, interner, expr, fun)?;
        }

        Node::If {
            test,
            then_expr,
            else_expr,
        } => {
            let (test, then_expr, else_expr) = (*test, *then_expr, *else_expr);
            resolve_refs(ast, interner, test, fun)?;
            resolve_refs(ast, interner, then_expr, fun)?;
            resolve_refs(ast, interner, else_expr, fun)?;
        }

        Node::Call { callee, args } => {
            let callee = *callee;
            let args = args.clone();
            resolve_refs(ast, interner, callee, fun)?;
            for arg in args {
                resolve_refs(ast, interner, arg, fun)?;
            }
        }

        Node::Fun { fun: child } => {
            // Resolve the nested function with this one as its parent.
            let child = *child;
            var_res_pass(ast, interner, child, Some(fun))?;
        }
    }

    Ok(())
}

/// Assert the slot invariants hold for every function in the arena:
/// each declaration's index addresses its own entry in its owning
/// function's locals.
#[cfg(test)]
fn check_slot_invariants(ast: &Ast) {
    for (_, fun) in ast.funs.iter_enumerated() {
        for (i, &decl) in fun.local_decls.iter().enumerate() {
            assert_eq!(ast.decl(decl).idx as usize, i);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zeta_par::{parse_check_error, INVALID_IDX};

    /// Parse and resolve a source unit, returning its unit function.
    fn resolve(source: &str) -> (Ast, Interner, FunId) {
        let mut ast = Ast::new();
        let mut interner = Interner::new();
        let unit = zeta_par::parse_string(&mut ast, &mut interner, source);
        let fun = parse_check_error(&ast, &interner, unit).unwrap();
        var_res_pass(&mut ast, &interner, fun, None).unwrap();
        (ast, interner, fun)
    }

    fn resolve_err(source: &str) -> ZetaError {
        let mut ast = Ast::new();
        let mut interner = Interner::new();
        let unit = zeta_par::parse_string(&mut ast, &mut interner, source);
        let fun = parse_check_error(&ast, &interner, unit).unwrap();
        var_res_pass(&mut ast, &interner, fun, None).unwrap_err()
    }

    /// All function nodes in the arena except the unit itself.
    fn nested_funs(ast: &Ast, unit: FunId) -> Vec<FunId> {
        ast.funs
            .iter_enumerated()
            .map(|(id, _)| id)
            .filter(|&id| id != unit)
            .collect()
    }

    #[test]
    fn test_local_gets_slot_zero() {
        let (ast, _, unit) = resolve("var x   x");
        assert_eq!(ast.fun(unit).local_decls.len(), 1);
        let decl = ast.fun(unit).local_decls[0];
        assert_eq!(ast.decl(decl).idx, 0);
        assert!(!ast.decl(decl).esc);
        check_slot_invariants(&ast);
    }

    #[test]
    fn test_parameters_occupy_low_indices() {
        let (ast, interner, unit) = resolve("let f = fun (a, b) { var c   c }   f");
        let nested = nested_funs(&ast, unit);
        assert_eq!(nested.len(), 1);
        let f = ast.fun(nested[0]);
        assert_eq!(f.local_decls.len(), 3);
        let names: Vec<_> = f
            .local_decls
            .iter()
            .map(|&d| interner.resolve(ast.decl(d).name))
            .collect();
        assert_eq!(names, ["a", "b", "c"]);
        check_slot_invariants(&ast);
    }

    #[test]
    fn test_redeclaration_reuses_slot() {
        let (ast, _, unit) = resolve("var x   var x   x = 1   x");
        assert_eq!(ast.fun(unit).local_decls.len(), 1);
        // Every declaration of `x`, dropped or not, carries slot 0.
        for (_, decl) in ast.decls.iter_enumerated() {
            assert_eq!(decl.idx, 0);
        }
        check_slot_invariants(&ast);
    }

    #[test]
    fn test_capture_marks_escaping_and_threads() {
        let (ast, _, unit) = resolve("let a = 3    let f = fun () a    f");
        let a = ast.fun(unit).local_decls[0];
        assert!(ast.decl(a).esc);
        assert!(ast.fun(unit).esc_locals.contains(&a));

        let nested = nested_funs(&ast, unit);
        assert_eq!(nested.len(), 1);
        let f = ast.fun(nested[0]);
        assert_eq!(f.free_vars.get_index_of(&a), Some(0));
        check_slot_invariants(&ast);
    }

    #[test]
    fn test_two_level_capture_threads_through_middle() {
        let (ast, interner, unit) = resolve("let n = 5    let f = fun () { fun () n }    f");
        let n = ast.fun(unit).local_decls[0];
        assert_eq!(interner.resolve(ast.decl(n).name), "n");
        assert!(ast.decl(n).esc);
        // Exactly one function owns `n` as an escaping local.
        let owners = ast
            .funs
            .iter()
            .filter(|f| f.esc_locals.contains(&n))
            .count();
        assert_eq!(owners, 1);

        // Both nested functions see `n` as a free variable.
        for fun_id in nested_funs(&ast, unit) {
            assert!(
                ast.fun(fun_id).free_vars.contains(&n),
                "free variable not threaded through {fun_id:?}"
            );
        }
        check_slot_invariants(&ast);
    }

    #[test]
    fn test_direct_local_ref_is_not_escaping() {
        let (ast, _, unit) = resolve("var x = 3   x = x + 1   x");
        let x = ast.fun(unit).local_decls[0];
        assert!(!ast.decl(x).esc);
        assert!(ast.fun(unit).esc_locals.is_empty());
        assert!(ast.fun(unit).free_vars.is_empty());
    }

    #[test]
    fn test_every_ref_is_resolved() {
        let (ast, _, _) = resolve("var x   let f = fun (y) x + y   f(1)");
        for node in ast.nodes.iter() {
            if let Node::Ref { decl, idx, .. } = node {
                assert!(decl.is_some());
                assert_ne!(*idx, INVALID_IDX);
            }
        }
    }

    #[test]
    fn test_recursive_function_resolves_via_outer_slot() {
        let (ast, _, unit) = resolve("let fib = fun (n) if n < 2 then n else fib(n-1) + fib(n-2)   fib");
        let fib = ast.fun(unit).local_decls[0];
        assert!(ast.decl(fib).esc);

        let nested = nested_funs(&ast, unit);
        assert_eq!(nested.len(), 1);
        assert!(ast.fun(nested[0]).free_vars.contains(&fib));
    }

    #[test]
    fn test_unresolved_reference_is_fatal() {
        let err = resolve_err("zork");
        match err {
            ZetaError::Unresolved { name } => assert_eq!(name, "zork"),
            other => panic!("expected unresolved-reference error, got {other}"),
        }
    }

    #[test]
    fn test_unresolved_inside_function_is_fatal() {
        let err = resolve_err("let f = fun () missing   f");
        assert!(matches!(err, ZetaError::Unresolved { .. }));
    }
}
