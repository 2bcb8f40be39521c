use anyhow::{Context, Result};
use crate::api::QaClient;
use crate::config::Config;
use crate::conversation::{ConversationController, Message};
use crate::ui::conversation::history::OUT_OF_SCOPE_NOTICE;

/// Ask a single question and print the reply.
///
/// Returns `Ok(false)` when the turn was rejected or ended in a failure.
pub async fn ask(config: &Config, question: &str) -> Result<bool> {
    let client = QaClient::from_config(config)?;
    let mut controller = ConversationController::new(client);

    if !controller.submit(question).await {
        println!("❌ Nothing to ask: the question is empty.");
        return Ok(false);
    }

    let reply = controller
        .state()
        .history()
        .last()
        .context("Conversation ended without a reply")?;

    match controller.state().last_error() {
        Some(_) => eprintln!("❌ {}", reply.content),
        None => print!("{}", format_reply(reply)),
    }

    Ok(controller.state().last_error().is_none())
}

/// Plain-text rendition of an assistant message for stdout
pub fn format_reply(message: &Message) -> String {
    let mut out = format!("{}\n", message.content);

    if let Some(source) = &message.primary_source {
        out.push_str(&format!("\n📚 Source: {} <{}>\n", source.title, source.url));
    }
    if message.is_out_of_scope() {
        out.push_str(&format!("\nℹ️  {OUT_OF_SCOPE_NOTICE}\n"));
    }

    out
}

/// Print the effective configuration, optionally writing it to disk first
pub fn show_config(config: &Config, init: bool) -> Result<()> {
    let config_path = config.docchat_home.join("config.toml");

    if init {
        if config_path.exists() {
            println!("⚠️  {} already exists; leaving it untouched.", config_path.display());
        } else {
            config.save()?;
            println!("✨ Wrote {}", config_path.display());
        }
    }

    println!("# {}", config_path.display());
    println!("{}", config.to_toml()?);
    println!("# ask endpoint: {}", config.ask_url());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::PrimarySource;

    #[test]
    fn reply_includes_source_line() {
        let message = Message {
            primary_source: Some(PrimarySource {
                url: "https://docs.example/ros2/dds".into(),
                title: "DDS overview".into(),
                chunk_index: 0,
            }),
            ..Message::assistant("ROS 2 uses DDS for transport.")
        };

        assert_eq!(
            format_reply(&message),
            "ROS 2 uses DDS for transport.\n\n📚 Source: DDS overview <https://docs.example/ros2/dds>\n"
        );
    }

    #[test]
    fn reply_includes_out_of_scope_notice() {
        let message = Message {
            is_out_of_scope: Some(true),
            ..Message::assistant("I can only answer questions about this book.")
        };

        let text = format_reply(&message);
        assert!(text.ends_with("This content is not related to this book.\n"));
        assert!(!text.contains("Source:"));
    }
}
