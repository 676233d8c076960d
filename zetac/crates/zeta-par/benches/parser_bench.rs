//! Parser benchmarks over representative Zeta sources.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use zeta_par::{parse_string, Ast};
use zeta_util::Interner;

const EXPRESSION: &str = "a + b * c - d / e + (f * g) < h";

const PROGRAM: &str = r#"
// A small but representative unit.
let fib = fun (n) { if n < 2 then n else fib(n-1) + fib(n-2) }
let make_adder = fun (k) fun (x) x + k
let add3 = make_adder(3)
var total = 0
total = add3(fib(11)) + total
let tbl = [1, 2, 3, 'four', [5, 6]]
if total < 100 then total else tbl[0]
"#;

fn bench_parse_expression(c: &mut Criterion) {
    c.bench_function("parse_expression", |b| {
        b.iter(|| {
            let mut ast = Ast::new();
            let mut interner = Interner::new();
            black_box(parse_string(&mut ast, &mut interner, black_box(EXPRESSION)))
        })
    });
}

fn bench_parse_program(c: &mut Criterion) {
    c.bench_function("parse_program", |b| {
        b.iter(|| {
            let mut ast = Ast::new();
            let mut interner = Interner::new();
            black_box(parse_string(&mut ast, &mut interner, black_box(PROGRAM)))
        })
    });
}

criterion_group!(benches, bench_parse_expression, bench_parse_program);
criterion_main!(benches);
