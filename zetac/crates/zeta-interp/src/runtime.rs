//! Runtime initialization and unit evaluation.

use std::path::Path;

use tracing::{debug, info};
use zeta_par::{ops::OP_ASSIGN, parse_check_error, parse_file, parse_string, Ast, Node};
use zeta_sem::var_res_pass;
use zeta_util::{FunId, Result, ZetaError};
use zeta_vm::{Value, Vm};

use crate::eval::{eval_call, make_closure};
use crate::host::init_api_core;

/// Resolve and evaluate a parsed unit.
///
/// The unit resolves with the global closure's function as its lexical
/// parent (none during bootstrap), is closed over the global scope, and
/// is then called with no arguments; the call's result is the unit's
/// value.
pub fn eval_unit(vm: &mut Vm, ast: &mut Ast, unit_fun: FunId) -> Result<Value> {
    let global = vm.global_clos;
    let parent = global.map(|c| vm.heap.clos(c).fun);
    var_res_pass(ast, &vm.interner, unit_fun, parent)?;

    let unit_clos = make_closure(vm, ast, unit_fun, global, &[])?;
    eval_call(vm, ast, unit_clos, &[], None, &mut [])
}

/// Parse, resolve and evaluate a source string.
pub fn eval_string(vm: &mut Vm, ast: &mut Ast, source: &str) -> Result<Value> {
    let unit = parse_string(ast, &mut vm.interner, source);
    let unit_fun = parse_check_error(ast, &vm.interner, unit)?;
    eval_unit(vm, ast, unit_fun)
}

/// Parse, resolve and evaluate a source file.
pub fn eval_file(vm: &mut Vm, ast: &mut Ast, path: &Path) -> Result<Value> {
    let unit = parse_file(ast, &mut vm.interner, path)?;
    let unit_fun = parse_check_error(ast, &vm.interner, unit)?;
    eval_unit(vm, ast, unit_fun)
}

/// Initialize the runtime: load `global.zeta`, bind the host functions,
/// and retain the global scope closure.
///
/// The host-function table is registered first; a `$name = <constant>`
/// assignment is prepended to the unit body for each entry, so the
/// prelude defines its exports in terms of `$print_string` and friends.
/// The evaluated unit must return a closure (the closure capturing all
/// top-level variables), which becomes the VM's global closure; later
/// units resolve against its function.
pub fn runtime_init(vm: &mut Vm, ast: &mut Ast) -> Result<()> {
    runtime_init_from(vm, ast, Path::new("global.zeta"))
}

/// [`runtime_init`] with an explicit prelude path.
pub fn runtime_init_from(vm: &mut Vm, ast: &mut Ast, prelude: &Path) -> Result<()> {
    info!(path = %prelude.display(), "initializing runtime");

    let unit = parse_file(ast, &mut vm.interner, prelude)?;
    let unit_fun = parse_check_error(ast, &vm.interner, unit)?;

    let host_fns = init_api_core(vm)?;
    debug!(count = host_fns.len(), "registered host functions");

    // Prepend `$name = <hostfn>` assignments to the unit body.
    for id in host_fns {
        let name = format!("${}", vm.interner.resolve(vm.heap.hostfn(id).name));
        let sym = vm.intern(&name);

        let decl = ast.decl_node(sym, true);
        let cst = ast.constant(Value::HostFn(id));
        let assign = ast.binop(&OP_ASSIGN, decl, cst);

        let body = ast.fun(unit_fun).body;
        let Node::Seq { exprs } = ast.node_mut(body) else {
            unreachable!("a unit body is always a sequence");
        };
        exprs.insert(0, assign);
    }

    let result = eval_unit(vm, ast, unit_fun)?;
    let Value::Clos(global) = result else {
        return Err(ZetaError::BadGlobalUnit);
    };

    vm.global_clos = Some(global);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use zeta_vm::{VAL_FALSE, VAL_TRUE};

    fn eval(source: &str) -> (Vm, Value) {
        let mut vm = Vm::new();
        let mut ast = Ast::new();
        let value = eval_string(&mut vm, &mut ast, source).unwrap();
        (vm, value)
    }

    /// Evaluate and compare against an expected value.
    fn test_eval(source: &str, expected: Value) {
        let (vm, value) = eval(source);
        assert!(
            vm.value_equals(value, expected),
            "value mismatch for {source:?}: got {}",
            vm.display_value(value)
        );
    }

    fn test_eval_int(source: &str, expected: i64) {
        test_eval(source, Value::from_int64(expected));
    }

    fn test_eval_true(source: &str) {
        test_eval(source, VAL_TRUE);
    }

    fn test_eval_false(source: &str) {
        test_eval(source, VAL_FALSE);
    }

    fn eval_err(source: &str) -> ZetaError {
        let mut vm = Vm::new();
        let mut ast = Ast::new();
        eval_string(&mut vm, &mut ast, source).unwrap_err()
    }

    #[test]
    fn test_empty_unit_is_true() {
        test_eval_true("");
        test_eval_true("{}");
    }

    #[test]
    fn test_literals() {
        test_eval_int("0", 0);
        test_eval_int("1", 1);
        test_eval_int("7", 7);
        test_eval_int("0xFF", 255);
        test_eval_int("0b101", 5);
        test_eval_true("true");
        test_eval_false("false");
    }

    #[test]
    fn test_arithmetic() {
        test_eval_int("3 + 2 * 5", 13);
        test_eval_int("-7", -7);
        test_eval_int("-(7 + 3)", -10);
        test_eval_int("3 + -2 * 5", -7);
        test_eval_int("7 / 2", 3);
        test_eval_int("7 mod 2", 1);
    }

    #[test]
    fn test_comparisons() {
        test_eval_true("0 < 5");
        test_eval_true("0 <= 5");
        test_eval_true("0 <= 0");
        test_eval_true("0 == 0");
        test_eval_true("0 != 1");
        test_eval_true("not false");
        test_eval_true("not not true");
        test_eval_true("true == true");
        test_eval_false("true == false");
    }

    #[test]
    fn test_interned_string_equality() {
        test_eval_true("'foo' == 'foo'");
        test_eval_false("'foo' == 'bar'");
        test_eval_true("'f' != 'b'");
        test_eval_false("'f' != 'f'");
    }

    #[test]
    fn test_arrays() {
        test_eval_int("[7][0]", 7);
        test_eval_int("[0,1,2][0]", 0);
        test_eval_int("[7+3][0]", 10);
    }

    #[test]
    fn test_sequences() {
        test_eval_int("{ 2 3 }", 3);
        test_eval_int("{ 2 3+7 }", 10);
        test_eval_int("3 7", 7);
    }

    #[test]
    fn test_if_expressions() {
        test_eval_int("if true then 1 else 0", 1);
        test_eval_int("if false then 1 else 0", 0);
        test_eval_int("if 0 < 10 then 7 else 3", 7);
        test_eval_int("if not true then 1 else 0", 0);
    }

    #[test]
    fn test_variables() {
        test_eval_int("var x = 3    x", 3);
        test_eval_int("let x = 7    x+1", 8);
        test_eval_int("var x = 3    x = 4       x", 4);
        test_eval_int("var x = 3    x = x+1     x", 4);
        test_eval_int("var x = 3    if x != 0 then 1", 1);
    }

    #[test]
    fn test_closures_and_calls() {
        test_eval_int("fun () 1                   1", 1);
        test_eval_int("let f = fun () 1           1", 1);
        test_eval_int("let f = fun () 7           f()", 7);
        test_eval_int("let f = fun (n) n          f(8)", 8);
        test_eval_int("let f = fun (a, b) a - b   f(7, 2)", 5);
    }

    #[test]
    fn test_unit_level_captures() {
        test_eval_int("let x = 3    let f = fun () x    1", 1);
        test_eval_int("let x = 3    let f = fun () x    x = 4", 4);
        test_eval_int("let x = 3    let f = fun () x    x", 3);
    }

    #[test]
    fn test_captured_variable_read_and_write() {
        test_eval_int("let a = 3    let f = fun () a    f()", 3);
        test_eval_int("let a = 3    let f = fun () a=2  f()   a", 2);
    }

    #[test]
    fn test_recursion() {
        test_eval_int(
            "let fib = fun (n) { if n < 2 then n else fib(n-1) + fib(n-2) } fib(11)",
            89,
        );
    }

    #[test]
    fn test_nested_captures() {
        test_eval_int("let f = fun () { let x = 7 fun() x }     let g = f()     g()", 7);
        test_eval_int("let n = 5    let f = fun () { fun() n }     let g = f()     g()", 5);
        test_eval_int("let f = fun (n) { fun () n }      let g = f(88)   g()", 88);
    }

    #[test]
    fn test_parse_then_eval_constants_round_trip() {
        for n in [0i64, 1, -1, 42, i64::MAX, i64::MIN + 1] {
            let source = n.to_string();
            let (vm, value) = eval(&source);
            assert!(vm.value_equals(value, Value::from_int64(n)), "{source}");
        }
        test_eval_true("true");
        test_eval_false("false");

        // A string literal evaluates to its interned string.
        let mut vm = Vm::new();
        let mut ast = Ast::new();
        let value = eval_string(&mut vm, &mut ast, "'kzor'").unwrap();
        assert_eq!(value, Value::Str(vm.intern("kzor")));
    }

    #[test]
    fn test_truthiness_is_strict() {
        assert!(matches!(eval_err("if 3 then 1"), ZetaError::NotABoolean));
        assert!(matches!(eval_err("not 'foo'"), ZetaError::NotABoolean));
        assert!(matches!(eval_err("if 'x' then 1 else 2"), ZetaError::NotABoolean));
    }

    #[test]
    fn test_arity_mismatch_is_fatal() {
        let err = eval_err("let f = fun (a, b) a   f(1)");
        assert!(matches!(
            err,
            ZetaError::ArityMismatch {
                expected: 2,
                found: 1
            }
        ));
    }

    #[test]
    fn test_division_by_zero_is_fatal() {
        assert!(matches!(eval_err("1 / 0"), ZetaError::DivideByZero));
        assert!(matches!(eval_err("1 mod 0"), ZetaError::DivideByZero));
    }

    #[test]
    fn test_index_errors_are_fatal() {
        assert!(matches!(
            eval_err("[1,2][5]"),
            ZetaError::IndexOutOfRange { idx: 5, len: 2 }
        ));
        assert!(matches!(eval_err("3[0]"), ZetaError::NotAnArray));
    }

    #[test]
    fn test_calling_a_non_callable_is_fatal() {
        assert!(matches!(eval_err("3(1)"), ZetaError::NotCallable));
    }

    #[test]
    fn test_arithmetic_on_non_integers_is_fatal() {
        assert!(matches!(eval_err("'a' + 1"), ZetaError::NotAnInteger { .. }));
        assert!(matches!(eval_err("true < false"), ZetaError::NotAnInteger { .. }));
    }

    #[test]
    fn test_unimplemented_operators_are_fatal() {
        assert!(matches!(eval_err("1 & 2"), ZetaError::UnimplementedOp { .. }));
        assert!(matches!(eval_err("true and true"), ZetaError::UnimplementedOp { .. }));
    }

    #[test]
    fn test_runtime_init_binds_prelude_and_host_functions() {
        let dir = std::env::temp_dir().join(format!("zeta-runtime-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let prelude = dir.join("global.zeta");
        std::fs::write(
            &prelude,
            "let print = fun (x) if $is_int64(x) then $print_int64(x) else false\n\
             fun () { $is_int64 $is_string $print_int64 $print_string $read_line $read_file $malloc $free $exit print }\n",
        )
        .unwrap();

        let mut vm = Vm::new();
        let mut ast = Ast::new();
        runtime_init_from(&mut vm, &mut ast, &prelude).unwrap();
        assert!(vm.global_clos.is_some());

        // The prelude binding resolves through the global closure.
        let val = eval_string(&mut vm, &mut ast, "print != false").unwrap();
        assert!(vm.value_equals(val, VAL_TRUE));

        // Type tests dispatch through the host bridge.
        let val = eval_string(&mut vm, &mut ast, "$is_int64(3)").unwrap();
        assert!(vm.value_equals(val, VAL_TRUE));
        let val = eval_string(&mut vm, &mut ast, "$is_string(3)").unwrap();
        assert!(vm.value_equals(val, VAL_FALSE));

        // Unsupported signatures are fatal at call time.
        let err = eval_string(&mut vm, &mut ast, "$malloc(8)").unwrap_err();
        assert!(matches!(err, ZetaError::UnsupportedSignature { .. }));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_closure_write_back_through_global_scope() {
        // Assignment to a captured variable observed through a closure
        // reads back the assigned value.
        test_eval_int(
            "var counter = 0   let bump = fun () counter = counter + 1   bump() bump()   counter",
            2,
        );
    }

    #[test]
    fn test_bad_global_unit() {
        let dir = std::env::temp_dir().join(format!("zeta-badunit-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let prelude = dir.join("global.zeta");
        std::fs::write(&prelude, "1 + 1\n").unwrap();

        let mut vm = Vm::new();
        let mut ast = Ast::new();
        let err = runtime_init_from(&mut vm, &mut ast, &prelude).unwrap_err();
        assert!(matches!(err, ZetaError::BadGlobalUnit));

        std::fs::remove_dir_all(&dir).ok();
    }
}
