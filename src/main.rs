mod api;
mod commands;
mod config;
mod conversation;
mod error;
mod events;
mod logging;
mod ui;

use anyhow::Result;
use clap::{Parser, Subcommand};
use config::Config;
use logging::LogTarget;

#[derive(Parser)]
#[command(name = "docchat")]
#[command(version)]
#[command(about = "Chat with a documentation question-answering service", long_about = None)]
struct Cli {
    /// Base URL of the QA service (the `/ask` path is appended)
    #[arg(long, global = true, env = "DOCCHAT_API_URL")]
    api_url: Option<String>,

    /// Client-side request timeout in seconds (default: none)
    #[arg(long, global = true)]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask one question and print the answer
    Ask {
        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,
    },
    /// Show the effective configuration
    Config {
        /// Write the config file if it does not exist yet
        #[arg(long)]
        init: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load()?;
    config.apply_overrides(cli.api_url, cli.timeout);

    match cli.command {
        None => {
            logging::init(LogTarget::File(config.log_dir()))?;
            tracing::info!(url = %config.ask_url(), "starting terminal UI");

            let client = api::QaClient::from_config(&config)?;
            let controller = conversation::ConversationController::new(client);
            let manager = ui::conversation::ConversationManager::new(controller, config.ui.show_timestamps);
            ui::run(&config, manager)
        }
        Some(Commands::Ask { question }) => {
            logging::init(LogTarget::Stderr)?;
            let question = question.join(" ");
            if !commands::ask(&config, &question).await? {
                std::process::exit(1);
            }
            Ok(())
        }
        Some(Commands::Config { init }) => commands::show_config(&config, init),
    }
}
