//! zeta - The Zeta virtual machine driver.
//!
//! Three modes, selected by the command line:
//!
//! - no arguments: open the read-eval-print loop;
//! - a file path: evaluate the file, then exit;
//! - `--test`: run the built-in self-tests for every runtime layer.
//!
//! Any fatal runtime failure prints a single diagnostic line on standard
//! output and exits with code 255.

mod repl;
mod selftest;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use zeta_par::Ast;
use zeta_vm::Vm;

/// The Zeta virtual machine.
#[derive(Parser, Debug)]
#[command(name = "zeta")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "The Zeta virtual machine", long_about = None)]
struct Cli {
    /// Source file to evaluate; the REPL opens when omitted
    file: Option<PathBuf>,

    /// Run the built-in self-tests (VM, parser, interpreter, runtime)
    #[arg(long)]
    test: bool,

    /// Enable verbose logging
    #[arg(short, long, env = "ZETA_VERBOSE")]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            // The fatal-error contract: one line on standard output,
            // exit code 255.
            println!("{err}");
            ExitCode::from(255)
        }
    }
}

/// Install the tracing subscriber. Diagnostics go to standard error so
/// evaluated programs own standard output.
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env("ZETA_LOG").unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .try_init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    tracing::debug!(file = ?cli.file, test = cli.test, "driver starting");

    if cli.test {
        return selftest::run();
    }

    let mut vm = Vm::new();
    let mut ast = Ast::new();
    zeta_interp::runtime_init(&mut vm, &mut ast)?;

    match cli.file {
        Some(path) => {
            zeta_interp::eval_file(&mut vm, &mut ast, &path)?;
            Ok(())
        }
        None => repl::run(&mut vm, &mut ast),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_file_argument() {
        let cli = Cli::parse_from(["zeta", "prog.zeta"]);
        assert_eq!(cli.file, Some(PathBuf::from("prog.zeta")));
        assert!(!cli.test);
    }

    #[test]
    fn test_cli_parse_test_flag() {
        let cli = Cli::parse_from(["zeta", "--test"]);
        assert!(cli.test);
        assert!(cli.file.is_none());
    }

    #[test]
    fn test_cli_parse_repl_default() {
        let cli = Cli::parse_from(["zeta"]);
        assert!(cli.file.is_none());
        assert!(!cli.test);
        assert!(!cli.verbose);
    }

    #[test]
    fn test_cli_parse_verbose() {
        let cli = Cli::parse_from(["zeta", "--verbose"]);
        assert!(cli.verbose);
    }
}
