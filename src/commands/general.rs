//! General REPL commands (help, quit, vars, :reset)

use crate::commands::{CommandContext, CommandResult};
use colored::*;
use orca_core::parser::builtins::get_registry;
use orca_core::Value;

/// Handle `help` command
pub fn cmd_help(args: &str, _ctx: &mut CommandContext<'_>) -> CommandResult {
    if !args.is_empty() {
        return CommandResult::NotACommand;
    }
    print_help();
    CommandResult::Success
}

/// Handle `quit` or `exit` command
pub fn cmd_quit(args: &str, _ctx: &mut CommandContext<'_>) -> CommandResult {
    if !args.is_empty() {
        return CommandResult::NotACommand;
    }
    CommandResult::Exit
}

/// Handle `vars` command: every visible binding, sorted by name
pub fn cmd_vars(args: &str, ctx: &mut CommandContext<'_>) -> CommandResult {
    if !args.is_empty() {
        return CommandResult::NotACommand;
    }

    let bindings = ctx.interpreter.environment().all_bindings();
    if bindings.is_empty() {
        return CommandResult::Message("No variables defined".to_string());
    }

    let lines: Vec<String> = bindings
        .iter()
        .map(|(name, value)| format!("  {} = {}", name.cyan(), describe(value)))
        .collect();
    CommandResult::Message(lines.join("\n"))
}

/// Handle `:reset` command
pub fn cmd_reset(args: &str, ctx: &mut CommandContext<'_>) -> CommandResult {
    if !args.is_empty() {
        return CommandResult::NotACommand;
    }
    ctx.interpreter.reset();
    CommandResult::Message("Environment cleared".bright_green().to_string())
}

fn describe(value: &Value) -> String {
    match value {
        Value::String(s) => format!("'{}'", s.borrow()),
        other => other.to_string(),
    }
}

/// Print help information
fn print_help() {
    println!("{}", "Orca Language Help".bold());
    println!("{}", "==================".bold());
    println!();
    println!("{}", "Values:".green());
    println!("  {}  - Numbers, strings, booleans, none", "42  'raw'  true  none".cyan());
    println!("  {}          - Template string", "\"hi $name\"".cyan());
    println!("  {}          - List and range", "[1, 2]  0..10..2".cyan());
    println!();
    println!("{}", "Statements:".green());
    println!("  {}                  - Assignment", "x = 1 + 2".cyan());
    println!("  {}  - Conditional", "if x > 2 { ... } else { ... }".cyan());
    println!("  {}            - Loop over range, list or string", "for i in 0..3 { ... }".cyan());
    println!("  {}  - Function definition", "func add(a, b) { return a + b }".cyan());
    println!();
    println!("{}", "Shell Commands:".green());
    println!("  {}              - Runs and prints its output", "ls -la".cyan());
    println!("  {}        - Captures stdout as a string", "files = ls $dir".cyan());
    println!();
    println!("{}", "Members:".green());
    for doc in get_registry().get_documentation() {
        println!(
            "  {:<8} {} - {}",
            doc.receiver,
            format!("{:<24}", doc.signature).cyan(),
            doc.description
        );
    }
    println!();
    println!("{}", "REPL Commands:".green());
    println!("  {}              - Show this help", "help".bright_green());
    println!("  {}              - List variables", "vars".bright_green());
    println!("  {}            - Reset the environment", ":reset".bright_green());
    println!("  {}              - Exit the REPL", "quit".bright_red());
}
