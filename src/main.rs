//! Orca CLI entry point.
//!
//! Usage:
//!   orca                        # Interactive REPL
//!   orca -c <source>            # Run source and exit
//!   orca script.orca [args]...  # Run a script

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use orca::repl;
use orca_core::{parse_statements, Interpreter, InterpreterConfig, OrcaError, ShellConfig, Value};
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Orca runs scripts that mix ordinary expressions with shell commands.
#[derive(Parser, Debug)]
#[command(name = "orca", version, about, long_about = None)]
struct Args {
    /// Run SOURCE and exit
    #[arg(short = 'c', long = "command", value_name = "SOURCE")]
    command: Option<String>,

    /// Program that launches command lines
    #[arg(long, env = "ORCA_SHELL", default_value = "sh", value_name = "PROGRAM")]
    shell: String,

    /// Flag passed to the launcher before the command line
    #[arg(long, default_value = "-c", value_name = "FLAG", allow_hyphen_values = true)]
    shell_flag: String,

    /// Print the parsed program instead of running it
    #[arg(long)]
    dump_ast: bool,

    /// Raise the log level (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Script file to run
    script: Option<PathBuf>,

    /// Arguments exposed to the script as `argv`
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    match run(args) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:?}");
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr so captured stdout stays clean
fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_env("ORCA_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn run(args: Args) -> Result<ExitCode> {
    let shell = ShellConfig::new(args.shell, args.shell_flag);

    match (args.command, args.script) {
        (Some(source), script) => {
            // with -c every positional is a script argument
            let argv = script
                .map(|path| path.to_string_lossy().into_owned())
                .into_iter()
                .chain(args.args)
                .collect();
            let config = InterpreterConfig::default().with_shell(shell).with_argv(argv);
            run_source(&source, config, args.dump_ast, true)
        }
        (None, Some(path)) => {
            let source = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read script: {}", path.display()))?;
            let config = InterpreterConfig::default().with_shell(shell).with_argv(args.args);
            debug!(script = %path.display(), "running script");
            run_source(&source, config, args.dump_ast, false)
        }
        (None, None) => {
            let config = InterpreterConfig::default().with_shell(shell);
            repl::start(config)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Parse and run `source`. With `print_result` the final value is printed
/// unless it is `none`.
fn run_source(
    source: &str,
    config: InterpreterConfig,
    dump_ast: bool,
    print_result: bool,
) -> Result<ExitCode> {
    let program = match parse_statements(source) {
        Ok(program) => program,
        Err(e) => return Ok(report(&e, source)),
    };

    if dump_ast {
        print!("{}", program);
        return Ok(ExitCode::SUCCESS);
    }

    let mut interpreter = Interpreter::with_config(config);
    match interpreter.run_program(&program) {
        Ok(Some(value)) if print_result && value != Value::None => {
            println!("{}", value);
            Ok(ExitCode::SUCCESS)
        }
        Ok(_) => Ok(ExitCode::SUCCESS),
        Err(e) => Ok(report(&e, source)),
    }
}

fn report(err: &OrcaError, source: &str) -> ExitCode {
    eprintln!("{}", err.render(source));
    ExitCode::FAILURE
}
