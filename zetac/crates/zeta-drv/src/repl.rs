//! The read-eval-print loop.

use std::io::{self, BufRead, Write};

use zeta_par::Ast;
use zeta_vm::Vm;

/// Run the REPL until end of input.
///
/// Each line evaluates as its own unit against the global scope; its
/// value is printed back. Errors are fatal, as everywhere else in the
/// runtime; the caller turns them into a diagnostic and a non-zero
/// exit.
pub fn run(vm: &mut Vm, ast: &mut Ast) -> anyhow::Result<()> {
    println!("Zeta Read-Eval-Print Loop (REPL). Press Ctrl+C to exit.");
    println!();
    println!("Please note that the Zeta VM is at the early prototype stage, language semantics and implementation details will change often.");
    println!();

    let stdin = io::stdin();
    let mut line = String::new();

    loop {
        print!("z> ");
        io::stdout().flush()?;

        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            // End of input.
            break;
        }

        let value = zeta_interp::eval_string(vm, ast, &line)?;
        println!("{}", vm.display_value(value));
    }

    Ok(())
}
