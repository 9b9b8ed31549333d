//! Terminal presentation for the line-oriented shell.
//!
//! All chat-facing output funnels through here so the transcript keeps one
//! consistent voice: `✓`/`✗`/`⚠` status markers, colored diff blocks, and a
//! per-file status line after every apply.

pub mod shell;

use std::io::{self, BufRead, Write};

use colored::Colorize;

use crate::commands::Command;
use crate::core::session::OperationPreview;
use crate::diff::DiffKind;
use crate::fsops::{ApplyOutcome, ApplyStatus};

pub fn print_banner(model_id: &str, display_name: &str) {
    println!("{}", "Decker — chat with your codebase".blue().bold());
    println!("Model: {} ({display_name})", model_id.cyan());
    println!(
        "Use '{}' to share a file, '{}' for commands, '{}' or '{}' to leave.\n",
        "/add <path>".magenta(),
        "/help".magenta(),
        "exit".red(),
        "quit".red()
    );
}

pub fn print_success(message: &str) {
    println!("{} {message}", "✓".green());
}

pub fn print_error(message: &str) {
    eprintln!("{} {message}", "✗".red());
}

pub fn print_warning(message: &str) {
    println!("{} {message}", "⚠".yellow());
}

pub fn print_info(message: &str) {
    println!("{} {message}", "ℹ".blue());
}

pub fn print_help(commands: &[Command]) {
    println!("Commands:");
    for command in commands {
        // Pad before coloring; escape codes would throw the column off.
        let usage = format!("{:<14}", command.usage);
        println!("  {} {}", usage.magenta(), command.help);
    }
    let exit = format!("{:<14}", "exit | quit");
    println!("  {} End the session.", exit.red());
}

pub fn print_assistant_marker() {
    print!("\n{} ", "Assistant>".blue().bold());
    let _ = io::stdout().flush();
}

/// Prompt for one input line. `Ok(None)` means stdin reached end of file.
pub fn read_input_line(prompt: &str) -> io::Result<Option<String>> {
    print!("{} ", prompt.green().bold());
    io::stdout().flush()?;

    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim_end_matches(['\n', '\r']).to_string()))
}

/// Aggregate yes/no confirmation. Anything other than `y`/`yes` declines.
pub fn confirm(prompt: &str) -> io::Result<bool> {
    print!("\n{prompt} ({}/{}): ", "y".green(), "n".red());
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    let answer = line.trim().to_ascii_lowercase();
    Ok(answer == "y" || answer == "yes")
}

pub fn print_preview(preview: &OperationPreview) {
    println!(
        "\n{} {} {}",
        "──".dimmed(),
        preview.kind.as_str().bold(),
        preview.path.cyan()
    );

    if let Some(note) = &preview.note {
        print_warning(note);
        return;
    }

    for line in &preview.diff {
        match line.kind {
            DiffKind::Added => print!("{}", format!("+{}", line.text).green()),
            DiffKind::Removed => print!("{}", format!("-{}", line.text).red()),
            DiffKind::Context => print!(" {}", line.text.dimmed()),
        }
        if !line.text.ends_with('\n') {
            println!();
        }
    }
}

pub fn print_outcomes(outcomes: &[ApplyOutcome]) {
    for outcome in outcomes {
        let line = outcome_line(outcome);
        match outcome.status {
            ApplyStatus::Applied => print_success(&line),
            ApplyStatus::Skipped => print_warning(&line),
            ApplyStatus::Failed => print_error(&line),
        }
    }
}

fn outcome_line(outcome: &ApplyOutcome) -> String {
    format!(
        "{}: {} ({})",
        outcome.path,
        outcome.status.as_str(),
        outcome.detail
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_lines_carry_path_status_and_detail() {
        let outcome = ApplyOutcome::failed("src/lib.rs", "original snippet not found");
        let line = outcome_line(&outcome);
        assert!(line.contains("src/lib.rs"));
        assert!(line.contains("failed"));
        assert!(line.contains("not found"));
    }
}
