//! Command-line interface parsing and dispatch.

pub mod model_list;

use std::error::Error;

use clap::{Parser, Subcommand};

use crate::core::models::{resolve_session, DEFAULT_MODEL};
use crate::core::session::ConversationSession;
use crate::providers::create_adapter;
use crate::ui;
use crate::ui::shell;

#[derive(Parser)]
#[command(name = "decker")]
#[command(about = "A terminal chat client that turns AI replies into reviewable file edits")]
#[command(
    long_about = "Decker is a terminal chat client that asks the model for structured\n\
file-operation instructions alongside its reply, previews every proposed\n\
change as a diff, and writes it only after you confirm.\n\n\
Environment Variables:\n\
  OPENAI_API_KEY      Key for OpenAI models\n\
  DEEPSEEK_API_KEY    Key for DeepSeek models\n\
  GEMINI_API_KEY      Key for Gemini models\n\
  ANTHROPIC_API_KEY   Key for Anthropic models\n\
  (a .env file in the working directory is honored)\n\n\
Commands:\n\
  /add <path>         Share a file with the model\n\
  /help               Show available commands\n\
  exit | quit         End the session"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Model to use for chat
    #[arg(short = 'm', long, value_name = "MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the interactive chat shell (default)
    Chat,
    /// List supported models and the environment variable each one needs
    Models,
}

pub fn main() -> Result<(), Box<dyn Error>> {
    tokio::runtime::Runtime::new()
        .unwrap()
        .block_on(async_main())
}

async fn async_main() -> Result<(), Box<dyn Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match args.command.unwrap_or(Commands::Chat) {
        Commands::Models => {
            model_list::list_models();
            Ok(())
        }
        Commands::Chat => run_chat(&args.model).await,
    }
}

async fn run_chat(model: &str) -> Result<(), Box<dyn Error>> {
    let provider_session = match resolve_session(model) {
        Ok(session) => session,
        Err(err) => {
            ui::print_error(&err.to_string());
            let fixes = err.quick_fixes();
            if !fixes.is_empty() {
                eprintln!();
                eprintln!("Quick fixes:");
                for fix in fixes {
                    eprintln!("  • {fix}");
                }
            }
            std::process::exit(err.exit_code());
        }
    };

    let adapter = create_adapter(provider_session);
    let session = ConversationSession::new(adapter);
    shell::run(session).await
}
