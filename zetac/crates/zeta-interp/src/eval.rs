//! The recursive evaluator.

use zeta_par::{Ast, Node, OpKind};
use zeta_util::{FunId, NodeId, Result, ZetaError};
use zeta_vm::{ClosId, HostFnId, HostSig, Slot, Value, Vm, VAL_TRUE};

/// Evaluate the strict boolean value of `val`.
///
/// Only the two canonical booleans are truthy or falsy; every other tag
/// is a fatal error. Integers and strings are deliberately not coerced.
pub fn eval_truth(val: Value) -> Result<bool> {
    match val {
        Value::Bool(b) => Ok(b),
        _ => Err(ZetaError::NotABoolean),
    }
}

/// Read the frame slot at `idx`, unwrapping the cell of an escaping
/// local.
fn read_slot(vm: &Vm, locals: &[Slot], idx: usize) -> Value {
    match locals[idx] {
        Slot::Direct(val) => val,
        Slot::Boxed(cell) => vm.heap.cell_get(cell),
    }
}

/// Write the frame slot at `idx`, through the cell if the local escapes.
fn write_slot(vm: &mut Vm, locals: &mut [Slot], idx: usize, val: Value) {
    match locals[idx] {
        Slot::Direct(_) => locals[idx] = Slot::Direct(val),
        Slot::Boxed(cell) => vm.heap.cell_set(cell, val),
    }
}

/// The integer payload of an operand, or the fatal diagnostic naming the
/// operator applied to it.
fn int_operand(val: Value, op: &'static str) -> Result<i64> {
    val.as_int64().ok_or(ZetaError::NotAnInteger { op })
}

/// Evaluate an assignment of `val` to the expression `lhs`.
///
/// The left side is either a declaration (its slot, or its cell when the
/// variable escapes) or a resolved reference (an outer variable writes
/// through the closure's cell vector). Anything else is fatal.
fn eval_assign(
    vm: &mut Vm,
    ast: &Ast,
    lhs: NodeId,
    val: Value,
    clos: Option<ClosId>,
    locals: &mut [Slot],
) -> Result<Value> {
    match ast.node(lhs) {
        Node::Decl { decl } => {
            let idx = ast.decl(*decl).idx as usize;
            write_slot(vm, locals, idx, val);
            Ok(val)
        }

        Node::Ref { name, idx, decl } => {
            let decl = decl.expect("references are resolved before evaluation");
            let decl_fun = ast.decl(decl).fun.expect("resolved declarations have owners");
            let cur_fun = clos.map(|c| vm.heap.clos(c).fun);

            if Some(decl_fun) != cur_fun {
                // Variable of an outer function: write through the
                // closure's cell.
                let clos = clos.expect("outer-variable write requires a closure");
                let cell = vm.heap.clos(clos).cells.get(*idx as usize).copied().ok_or_else(
                    || ZetaError::Unresolved {
                        name: vm.interner.resolve(*name).to_string(),
                    },
                )?;
                vm.heap.cell_set(cell, val);
                return Ok(val);
            }

            let idx = *idx as usize;
            if idx >= locals.len() {
                return Err(ZetaError::InvalidAssignTarget);
            }
            write_slot(vm, locals, idx, val);
            Ok(val)
        }

        _ => Err(ZetaError::InvalidAssignTarget),
    }
}

/// Construct a closure over `nested` in the current frame.
///
/// Each free variable's cell comes either from this frame (the variable
/// is ours and escaping, so its slot holds a cell) or from the current
/// closure's own cell vector.
pub(crate) fn make_closure(
    vm: &mut Vm,
    ast: &Ast,
    nested: FunId,
    clos: Option<ClosId>,
    locals: &[Slot],
) -> Result<ClosId> {
    let cur_fun = clos.map(|c| vm.heap.clos(c).fun);
    let free_vars = &ast.fun(nested).free_vars;
    let mut cells = Vec::with_capacity(free_vars.len());

    for &decl in free_vars {
        let decl_fun = ast.decl(decl).fun.expect("resolved declarations have owners");

        let cell = if Some(decl_fun) == cur_fun {
            // Our own escaping local: its frame slot holds the cell.
            match locals[ast.decl(decl).idx as usize] {
                Slot::Boxed(cell) => cell,
                Slot::Direct(_) => unreachable!("escaping locals are boxed on function entry"),
            }
        } else {
            // Captured further out: share the current closure's cell.
            // A miss here means the variable was never captured into the
            // scope closure this unit runs against.
            let clos = clos.expect("free variable from an enclosing function requires a closure");
            let unresolved = |vm: &Vm| ZetaError::Unresolved {
                name: vm.interner.resolve(ast.decl(decl).name).to_string(),
            };
            let outer_idx = ast
                .fun(cur_fun.expect("a closure always has a function"))
                .free_vars
                .get_index_of(&decl)
                .ok_or_else(|| unresolved(vm))?;
            vm.heap
                .clos(clos)
                .cells
                .get(outer_idx)
                .copied()
                .ok_or_else(|| unresolved(vm))?
        };

        cells.push(cell);
    }

    vm.alloc_clos(nested, cells)
}

/// Evaluate a closure call.
///
/// Protocol: check arity, build the callee frame (cells pre-allocated
/// for escaping locals), evaluate each argument in the caller's frame
/// and assign it to the matching parameter in the callee's frame, then
/// evaluate the body.
pub fn eval_call(
    vm: &mut Vm,
    ast: &Ast,
    callee: ClosId,
    arg_exprs: &[NodeId],
    caller_clos: Option<ClosId>,
    caller_locals: &mut [Slot],
) -> Result<Value> {
    let fun_id = vm.heap.clos(callee).fun;
    let fun = ast.fun(fun_id);

    if arg_exprs.len() != fun.params.len() {
        return Err(ZetaError::ArityMismatch {
            expected: fun.params.len(),
            found: arg_exprs.len(),
        });
    }

    let mut locals = vec![Slot::UNINIT; fun.local_decls.len()];

    // Escaping locals live in fresh cells from the first assignment on.
    for &decl in &fun.esc_locals {
        let idx = ast.decl(decl).idx as usize;
        let cell = vm.alloc_cell()?;
        locals[idx] = Slot::Boxed(cell);
    }

    for (i, &arg) in arg_exprs.iter().enumerate() {
        let val = eval_expr(vm, ast, arg, caller_clos, caller_locals)?;
        let idx = ast.decl(fun.params[i]).idx as usize;
        write_slot(vm, &mut locals, idx, val);
    }

    eval_expr(vm, ast, fun.body, Some(callee), &mut locals)
}

/// Evaluate a host function call: arguments run in the caller's frame,
/// then dispatch goes through the signature parsed at registration.
fn eval_host_call(
    vm: &mut Vm,
    ast: &Ast,
    callee: HostFnId,
    arg_exprs: &[NodeId],
    caller_clos: Option<ClosId>,
    caller_locals: &mut [Slot],
) -> Result<Value> {
    let mut args = Vec::with_capacity(arg_exprs.len());
    for &arg in arg_exprs {
        args.push(eval_expr(vm, ast, arg, caller_clos, caller_locals)?);
    }

    let sig = vm.heap.hostfn(callee).sig;
    let arg0 = |expected: usize| -> Result<Value> {
        if args.len() != expected {
            return Err(ZetaError::ArityMismatch {
                expected,
                found: args.len(),
            });
        }
        Ok(args[0])
    };

    match sig {
        HostSig::BoolTag(f) => Ok(Value::from_bool(f(arg0(1)?.tag()))),
        HostSig::VoidInt(f) => {
            let v = arg0(1)?
                .as_int64()
                .ok_or(ZetaError::HostArgMismatch { sig: "void(int)" })?;
            f(v as i32);
            Ok(VAL_TRUE)
        }
        HostSig::VoidInt64(f) => {
            let v = arg0(1)?
                .as_int64()
                .ok_or(ZetaError::HostArgMismatch { sig: "void(int64)" })?;
            f(v);
            Ok(VAL_TRUE)
        }
        HostSig::VoidStr(f) => {
            match arg0(1)? {
                Value::Str(sym) => {
                    f(vm.interner.resolve(sym));
                    Ok(VAL_TRUE)
                }
                _ => Err(ZetaError::HostArgMismatch { sig: "void(string)" }),
            }
        }
        HostSig::Unsupported => {
            let sig_str = vm.heap.hostfn(callee).sig_str;
            Err(ZetaError::UnsupportedSignature {
                sig: vm.interner.resolve(sig_str).to_string(),
            })
        }
    }
}

/// Evaluate an expression in the frame given by `clos` and `locals`.
pub fn eval_expr(
    vm: &mut Vm,
    ast: &Ast,
    expr: NodeId,
    clos: Option<ClosId>,
    locals: &mut [Slot],
) -> Result<Value> {
    match ast.node(expr) {
        Node::Error { .. } => Err(ZetaError::UnsupportedExpr {
            kind: "a parse error",
        }),

        Node::Const { val } => Ok(*val),

        Node::Str { sym } => Ok(Value::Str(*sym)),

        Node::ArrayLit { elems } => {
            let arr = vm.alloc_array(elems.len())?;
            for &elem in elems {
                let val = eval_expr(vm, ast, elem, clos, locals)?;
                vm.heap.array_push(arr, val)?;
            }
            Ok(Value::Array(arr))
        }

        Node::ObjLit => Err(ZetaError::UnsupportedExpr {
            kind: "an object literal",
        }),

        Node::Decl { .. } => Err(ZetaError::UnsupportedExpr {
            kind: "a bare declaration",
        }),

        Node::Ref { name, idx, decl } => {
            let decl = decl.expect("references are resolved before evaluation");
            let decl_fun = ast.decl(decl).fun.expect("resolved declarations have owners");
            let cur_fun = clos.map(|c| vm.heap.clos(c).fun);

            if Some(decl_fun) != cur_fun {
                // Variable of an outer function, read through the
                // closure's cell vector.
                let clos = clos.expect("outer-variable read requires a closure");
                let cell = vm.heap.clos(clos).cells.get(*idx as usize).copied().ok_or_else(
                    || ZetaError::Unresolved {
                        name: vm.interner.resolve(*name).to_string(),
                    },
                )?;
                return Ok(vm.heap.cell_get(cell));
            }

            Ok(read_slot(vm, locals, *idx as usize))
        }

        Node::BinOp { op, lhs, rhs } => {
            if op.kind == OpKind::Assign {
                let val = eval_expr(vm, ast, *rhs, clos, locals)?;
                return eval_assign(vm, ast, *lhs, val, clos, locals);
            }

            let v0 = eval_expr(vm, ast, *lhs, clos, locals)?;
            let v1 = eval_expr(vm, ast, *rhs, clos, locals)?;

            match op.kind {
                OpKind::Index => {
                    let Value::Array(arr) = v0 else {
                        return Err(ZetaError::NotAnArray);
                    };
                    let idx = int_operand(v1, "[]")?;
                    let len = vm.heap.array(arr).len();
                    if idx < 0 || idx as usize >= len {
                        return Err(ZetaError::IndexOutOfRange { idx, len });
                    }
                    Ok(vm.heap.array(arr).elems[idx as usize])
                }

                OpKind::Add => int_arith(v0, v1, op.sym, i64::wrapping_add),
                OpKind::Sub => int_arith(v0, v1, op.sym, i64::wrapping_sub),
                OpKind::Mul => int_arith(v0, v1, op.sym, i64::wrapping_mul),
                OpKind::Div => {
                    let (i0, i1) = (int_operand(v0, "/")?, int_operand(v1, "/")?);
                    if i1 == 0 {
                        return Err(ZetaError::DivideByZero);
                    }
                    Ok(Value::from_int64(i0.wrapping_div(i1)))
                }
                OpKind::Mod => {
                    let (i0, i1) = (int_operand(v0, "mod")?, int_operand(v1, "mod")?);
                    if i1 == 0 {
                        return Err(ZetaError::DivideByZero);
                    }
                    Ok(Value::from_int64(i0.wrapping_rem(i1)))
                }

                OpKind::Lt => int_compare(v0, v1, op.sym, |a, b| a < b),
                OpKind::Le => int_compare(v0, v1, op.sym, |a, b| a <= b),
                OpKind::Gt => int_compare(v0, v1, op.sym, |a, b| a > b),
                OpKind::Ge => int_compare(v0, v1, op.sym, |a, b| a >= b),

                OpKind::Eq => Ok(Value::from_bool(vm.value_equals(v0, v1))),
                OpKind::Ne => Ok(Value::from_bool(!vm.value_equals(v0, v1))),

                _ => Err(ZetaError::UnimplementedOp { op: op.sym }),
            }
        }

        Node::UnOp { op, expr } => {
            let v0 = eval_expr(vm, ast, *expr, clos, locals)?;
            match op.kind {
                OpKind::Neg => Ok(Value::from_int64(int_operand(v0, "-")?.wrapping_neg())),
                OpKind::Not => Ok(Value::from_bool(!eval_truth(v0)?)),
                _ => Err(ZetaError::UnimplementedOp { op: op.sym }),
            }
        }

        Node::Seq { exprs } => {
            // An empty sequence evaluates to true.
            let mut val = VAL_TRUE;
            for &expr in exprs {
                val = eval_expr(vm, ast, expr, clos, locals)?;
            }
            Ok(val)
        }

        Node::If {
            test,
            then_expr,
            else_expr,
        } => {
            let t = eval_expr(vm, ast, *test, clos, locals)?;
            if eval_truth(t)? {
                eval_expr(vm, ast, *then_expr, clos, locals)
            } else {
                eval_expr(vm, ast, *else_expr, clos, locals)
            }
        }

        Node::Fun { fun } => {
            let new_clos = make_closure(vm, ast, *fun, clos, locals)?;
            Ok(Value::Clos(new_clos))
        }

        Node::Call { callee, args } => {
            let callee_val = eval_expr(vm, ast, *callee, clos, locals)?;
            match callee_val {
                Value::Clos(c) => eval_call(vm, ast, c, args, clos, locals),
                Value::HostFn(h) => eval_host_call(vm, ast, h, args, clos, locals),
                _ => Err(ZetaError::NotCallable),
            }
        }
    }
}

fn int_arith(v0: Value, v1: Value, op: &'static str, f: fn(i64, i64) -> i64) -> Result<Value> {
    Ok(Value::from_int64(f(int_operand(v0, op)?, int_operand(v1, op)?)))
}

fn int_compare(v0: Value, v1: Value, op: &'static str, f: fn(i64, i64) -> bool) -> Result<Value> {
    Ok(Value::from_bool(f(int_operand(v0, op)?, int_operand(v1, op)?)))
}
