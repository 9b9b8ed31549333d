//! Interactive line shell: reads input, dispatches commands, drives turns.

use std::error::Error;
use std::io::{self, Write};

use crate::commands::{self, CommandResult};
use crate::core::session::{ConversationSession, SendError, SendOutcome};
use crate::ui;

pub async fn run(mut session: ConversationSession) -> Result<(), Box<dyn Error>> {
    ui::print_banner(session.adapter().model(), session.adapter().display_name());

    loop {
        let Some(line) = ui::read_input_line("You>")? else {
            // stdin closed; leave as cleanly as an explicit quit.
            println!();
            ui::print_info("Session finished.");
            break;
        };

        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            ui::print_info("Goodbye!");
            break;
        }

        match commands::process_input(&mut session, input) {
            CommandResult::Continue => {}
            CommandResult::ProcessAsMessage(message) => {
                run_turn(&mut session, &message).await;
            }
        }
    }

    Ok(())
}

async fn run_turn(session: &mut ConversationSession, message: &str) {
    ui::print_assistant_marker();

    let outcome = session
        .send(message, |chunk| {
            print!("{chunk}");
            let _ = io::stdout().flush();
        })
        .await;
    println!();

    match outcome {
        Ok(SendOutcome::Completed { warning, .. }) => {
            if let Some(warning) = warning {
                ui::print_warning(&warning);
            }
        }
        Ok(SendOutcome::AwaitingConfirmation { warning, .. }) => {
            if let Some(warning) = warning {
                ui::print_warning(&warning);
            }
            review_pending(session);
        }
        Err(SendError::Cancelled) => {
            ui::print_warning("Turn cancelled; nothing was recorded.");
        }
        Err(e) => {
            ui::print_error(&e.to_string());
        }
    }
}

fn review_pending(session: &mut ConversationSession) {
    let previews = session.preview_pending();
    for preview in &previews {
        ui::print_preview(preview);
    }

    match ui::confirm("Apply these changes?") {
        Ok(true) => {
            let outcomes = session.apply_pending();
            ui::print_outcomes(&outcomes);
        }
        Ok(false) => {
            session.discard_pending();
            ui::print_info("Skipped applying file operations.");
        }
        Err(e) => {
            session.discard_pending();
            ui::print_error(&format!("could not read confirmation: {e}"));
        }
    }
}
