//! Built-in self-tests, run by `zeta --test`.
//!
//! One pass over every runtime layer in dependency order: the VM core,
//! the parser, the interpreter, and finally the initialized runtime with
//! its prelude. The parser and runtime stages read `global.zeta`,
//! `parser.zeta` and `tests/beer.zeta` from the working directory. The
//! first failure aborts with a non-zero exit; success ends with a heap
//! usage report.

use std::path::Path;

use anyhow::{ensure, Context, Result};
use zeta_interp::{eval_string, runtime_init};
use zeta_par::{parse_check_error, parse_file, parse_string, Ast};
use zeta_vm::{Value, Vm, VAL_FALSE, VAL_TRUE};

pub fn run() -> Result<()> {
    let mut vm = Vm::new();
    let mut ast = Ast::new();

    test_vm(&mut vm)?;
    test_parser(&mut vm, &mut ast)?;
    test_interp(&mut vm, &mut ast)?;

    runtime_init(&mut vm, &mut ast).context("runtime initialization")?;
    test_runtime(&mut vm, &mut ast)?;

    println!("heap space allocated: {} bytes", vm.heap_bytes());
    Ok(())
}

/// Heap, shape and interning basics.
fn test_vm(vm: &mut Vm) -> Result<()> {
    println!("core vm tests");

    // Interned strings have canonical identity.
    let a = vm.intern("foo");
    let b = vm.intern("foo");
    let c = vm.intern("bar");
    ensure!(a == b, "equal strings must intern to the same symbol");
    ensure!(a != c, "distinct strings must intern to distinct symbols");
    ensure!(vm.value_equals(Value::Str(a), Value::Str(b)), "interned string equality");

    // Arrays: append, read, identity search.
    let arr = vm.alloc_array(4)?;
    vm.heap.array_push(arr, Value::from_int64(7))?;
    vm.heap.array_push(arr, Value::Str(a))?;
    ensure!(vm.heap.array(arr).len() == 2, "array length after append");
    ensure!(
        vm.heap.array(arr).get(0) == Some(Value::from_int64(7)),
        "array read back"
    );
    ensure!(
        vm.heap.array(arr).index_of(Value::Str(b)) == Some(1),
        "array identity search finds interned string"
    );

    // Cells hold one mutable value.
    let cell = vm.alloc_cell()?;
    vm.heap.cell_set(cell, Value::from_int64(42));
    ensure!(
        vm.heap.cell_get(cell) == Value::from_int64(42),
        "cell write then read"
    );

    // Shape allocation yields fresh valid indices.
    let before = vm.shapes.len();
    let s = vm.shapes.alloc_empty();
    ensure!(vm.shapes.len() == before + 1, "shape table growth");
    ensure!(vm.shapes.get(s).idx == s, "shape self index");

    Ok(())
}

/// Assert that a source unit parses.
fn test_parse(vm: &mut Vm, ast: &mut Ast, source: &str) -> Result<()> {
    println!("{source}");
    let unit = parse_string(ast, &mut vm.interner, source);
    ensure!(!ast.is_error(unit), "failed to parse: {source:?}");
    Ok(())
}

/// Assert that parsing a source unit fails.
fn test_parse_fail(vm: &mut Vm, ast: &mut Ast, source: &str) -> Result<()> {
    println!("{source}");
    let unit = parse_string(ast, &mut vm.interner, source);
    ensure!(ast.is_error(unit), "parsing did not fail for: {source:?}");
    Ok(())
}

/// The parser corpus, plus the runtime-loaded source files.
fn test_parser(vm: &mut Vm, ast: &mut Ast) -> Result<()> {
    println!("core parser tests");

    let accept = [
        // Identifiers
        "foobar",
        "  foo_bar  ",
        "_foo",
        "$foo",
        "$foo52",
        // Literals
        "123",
        "0xFF",
        "0b101",
        "'abc'",
        "\"double-quoted string!\"",
        "\"double-quoted string, 'hi'!\"",
        "'hi' // comment",
        "'new\\nline'",
        "true",
        "false",
        // Array literals
        "[]",
        "[1]",
        "[1,a]",
        "[1 , a]",
        "[1,a, ]",
        "[ 1,\na ]",
        // Object literals
        ":{}",
        // Comments
        "1 // comment",
        "[ 1//comment\n,a ]",
        "1 /* comment */ + x",
        "1 /* // comment */ + x",
        // Arithmetic expressions
        "a + b",
        "a + b + c",
        "a + b - c",
        "a + b * c + d",
        "a or b or c",
        "(a)",
        "(a + b)",
        "(a + (b + c))",
        "((a + b) + c)",
        "(a + b) * (c + d)",
        // Member expressions
        "a.b",
        "a.b + c",
        "$runtime.v0.add",
        "$api.file.v2.fopen",
        // Array indexing
        "a[0]",
        "a[b]",
        "a[b+2]",
        "a[2*b+1]",
        // If expressions
        "if x then y",
        "if x then y + 1",
        "if x then y else z",
        "if x then a+c else d",
        "if a instanceof b then true",
        "if 'a' in b or 'c' in b then y",
        "if not x then y else z",
        "if x and not x then true else false",
        "if x <= 2 then y else z",
        "if x == 1 then y+z else z+d",
        "if true then y else z",
        "if true or false then y else z",
        // Assignment
        "x = 1",
        "x = -1",
        "a.b = x + y",
        "x = y = 1",
        "var x",
        "var x = 3",
        "let x=3",
        "let x= 3+y",
        // Call expressions
        "a()",
        "a(b)",
        "a(b,c)",
        "a(b,c+1)",
        "a(b,c+1,)",
        "x + a(b,c+1)",
        "x + a(b,c+1) + y",
        "a() b()",
        // Function expressions
        "fun () 0",
        "fun (x) x",
        "fun (x,y) x",
        "fun (x,y,) x",
        "fun (x,y) x+y",
        "fun (x,y) if x then y else 0",
        "obj.method = fun (this, x) this.x = x",
        "let f = fun () 0\nf()",
        // Fibonacci
        "let fib = fun (n) if n < 2 then n else fib(n-1) + fib(n-2)",
        // Sequence/block expressions
        "{ a b }",
        "fun (x) { println(x) println(y) }",
        "fun (x) { var y = x + 1 print(y) }",
        "if (x) then { println(x) } else { println(y) z }",
    ];
    for source in accept {
        test_parse(vm, ast, source)?;
    }

    let reject = [
        "'invalid\\iesc'",
        "'str' []",
        "[,]",
        "1 // comment\n#1",
        "1 /* */ */",
        "*a",
        "a*",
        "a # b",
        "a +",
        "a + b # c",
        "(a",
        "(a + b))",
        "((a + b)",
        "a.'b'",
        "a[]",
        "a[0 1]",
        "if x",
        "if x then",
        "if x then a if",
        "var",
        "let",
        "let x",
        "let x=",
        "var +",
        "var 3",
        "a(b c+1)",
        "fun (x,y)",
        "fun ('x') x",
        "fun (x+y) y",
        "{ a, }",
        "{ a, b }",
        "fun foo () { a, }",
    ];
    for source in reject {
        test_parse_fail(vm, ast, source)?;
    }

    // The runtime-loaded sources must parse from the working directory.
    for path in ["global.zeta", "parser.zeta", "tests/beer.zeta"] {
        let unit = parse_file(ast, &mut vm.interner, Path::new(path))?;
        parse_check_error(ast, &vm.interner, unit)
            .with_context(|| format!("parsing {path}"))?;
    }

    Ok(())
}

/// Evaluate a source string and compare against the expected value.
fn test_eval(vm: &mut Vm, ast: &mut Ast, source: &str, expected: Value) -> Result<()> {
    println!("{source}");
    let value = eval_string(vm, ast, source)?;
    ensure!(
        vm.value_equals(value, expected),
        "value doesn't match expected for input:\n{source}\ngot value: {}",
        vm.display_value(value)
    );
    Ok(())
}

fn test_eval_int(vm: &mut Vm, ast: &mut Ast, source: &str, expected: i64) -> Result<()> {
    test_eval(vm, ast, source, Value::from_int64(expected))
}

fn test_eval_true(vm: &mut Vm, ast: &mut Ast, source: &str) -> Result<()> {
    test_eval(vm, ast, source, VAL_TRUE)
}

fn test_eval_false(vm: &mut Vm, ast: &mut Ast, source: &str) -> Result<()> {
    test_eval(vm, ast, source, VAL_FALSE)
}

/// The interpreter corpus.
fn test_interp(vm: &mut Vm, ast: &mut Ast) -> Result<()> {
    println!("core interpreter tests");

    // Empty unit
    test_eval_true(vm, ast, "")?;

    // Literals and constants
    test_eval_int(vm, ast, "0", 0)?;
    test_eval_int(vm, ast, "1", 1)?;
    test_eval_int(vm, ast, "7", 7)?;
    test_eval_int(vm, ast, "0xFF", 255)?;
    test_eval_int(vm, ast, "0b101", 5)?;
    test_eval_true(vm, ast, "true")?;
    test_eval_false(vm, ast, "false")?;

    // Arithmetic
    test_eval_int(vm, ast, "3 + 2 * 5", 13)?;
    test_eval_int(vm, ast, "-7", -7)?;
    test_eval_int(vm, ast, "-(7 + 3)", -10)?;
    test_eval_int(vm, ast, "3 + -2 * 5", -7)?;

    // Comparisons
    test_eval_true(vm, ast, "0 < 5")?;
    test_eval_true(vm, ast, "0 <= 5")?;
    test_eval_true(vm, ast, "0 <= 0")?;
    test_eval_true(vm, ast, "0 == 0")?;
    test_eval_true(vm, ast, "0 != 1")?;
    test_eval_true(vm, ast, "not false")?;
    test_eval_true(vm, ast, "not not true")?;
    test_eval_true(vm, ast, "true == true")?;
    test_eval_false(vm, ast, "true == false")?;
    test_eval_true(vm, ast, "'foo' == 'foo'")?;
    test_eval_false(vm, ast, "'foo' == 'bar'")?;
    test_eval_true(vm, ast, "'f' != 'b'")?;
    test_eval_false(vm, ast, "'f' != 'f'")?;

    // Arrays
    test_eval_int(vm, ast, "[7][0]", 7)?;
    test_eval_int(vm, ast, "[0,1,2][0]", 0)?;
    test_eval_int(vm, ast, "[7+3][0]", 10)?;

    // Sequence expressions
    test_eval_true(vm, ast, "{}")?;
    test_eval_int(vm, ast, "{ 2 3 }", 3)?;
    test_eval_int(vm, ast, "{ 2 3+7 }", 10)?;
    test_eval_int(vm, ast, "3 7", 7)?;

    // If expressions
    test_eval_int(vm, ast, "if true then 1 else 0", 1)?;
    test_eval_int(vm, ast, "if false then 1 else 0", 0)?;
    test_eval_int(vm, ast, "if 0 < 10 then 7 else 3", 7)?;
    test_eval_int(vm, ast, "if not true then 1 else 0", 0)?;

    // Variable declarations
    test_eval_int(vm, ast, "var x = 3    x", 3)?;
    test_eval_int(vm, ast, "let x = 7    x+1", 8)?;
    test_eval_int(vm, ast, "var x = 3    x = 4       x", 4)?;
    test_eval_int(vm, ast, "var x = 3    x = x+1     x", 4)?;
    test_eval_int(vm, ast, "var x = 3    if x != 0 then 1", 1)?;

    // Closures and function calls
    test_eval_int(vm, ast, "fun () 1                   1", 1)?;
    test_eval_int(vm, ast, "let f = fun () 1           1", 1)?;
    test_eval_int(vm, ast, "let f = fun () 7           f()", 7)?;
    test_eval_int(vm, ast, "let f = fun (n) n          f(8)", 8)?;
    test_eval_int(vm, ast, "let f = fun (a, b) a - b   f(7, 2)", 5)?;

    // Unit-level variable captured by a closure
    test_eval_int(vm, ast, "let x = 3    let f = fun () x    1", 1)?;
    test_eval_int(vm, ast, "let x = 3    let f = fun () x    x = 4", 4)?;
    test_eval_int(vm, ast, "let x = 3    let f = fun () x    x", 3)?;

    // Reading and assigning to a captured variable
    test_eval_int(vm, ast, "let a = 3    let f = fun () a    f()", 3)?;
    test_eval_int(vm, ast, "let a = 3    let f = fun () a=2  f()   a", 2)?;

    // Recursive function
    test_eval_int(
        vm,
        ast,
        "let fib = fun (n) { if n < 2 then n else fib(n-1) + fib(n-2) } fib(11)",
        89,
    )?;

    // Two levels of nesting
    test_eval_int(
        vm,
        ast,
        "let f = fun () { let x = 7 fun() x }     let g = f()     g()",
        7,
    )?;

    // Capture by inner from outer
    test_eval_int(
        vm,
        ast,
        "let n = 5    let f = fun () { fun() n }     let g = f()     g()",
        5,
    )?;

    // Captured function parameter
    test_eval_int(vm, ast, "let f = fun (n) { fun () n }      let g = f(88)   g()", 88)?;

    Ok(())
}

/// Runtime tests: the prelude bindings are reachable and callable.
fn test_runtime(vm: &mut Vm, ast: &mut Ast) -> Result<()> {
    println!("core runtime tests");

    test_eval_true(vm, ast, "print != false")?;
    test_eval_true(vm, ast, "println != false")?;
    test_eval_true(vm, ast, "assert != false")?;
    test_eval_true(vm, ast, "assert (true, '')   true")?;

    Ok(())
}
