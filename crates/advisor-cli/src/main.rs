//! Health Advisor CLI
//!
//! Terminal front-end for the health advisor: wires a Gemini model provider
//! and a booking gateway into the conversation engine and exposes a small
//! line-based REPL with session commands.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use agent_core::turn::Citation;
use agent_core::{Attachment, ModelProvider, ResultSink, SessionId};
use agent_runtime::GeminiProvider;
use health_advisor::{
    BookingGateway, BookingRecord, HealthAdvisor, InMemoryDirectory, PostgrestConfig,
    PostgrestDirectory,
};

/// Prints replies, citations, and booking confirmations to the terminal
struct TerminalSink;

impl ResultSink<BookingRecord> for TerminalSink {
    fn on_chunk(&self, text: &str, citations: &[Citation]) {
        println!("\nassistant> {text}");
        for citation in citations {
            match &citation.title {
                Some(title) => println!("  [source] {title} <{}>", citation.uri),
                None => println!("  [source] <{}>", citation.uri),
            }
        }
    }

    fn on_side_effect(&self, effect: &BookingRecord) {
        println!(
            "\n✓ Appointment booked: {} for {} ({})",
            effect.provider_display_name, effect.patient_name, effect.id
        );
    }
}

fn media_type_for(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        _ => "image/jpeg",
    }
}

fn print_help() {
    println!("Commands:");
    println!("  /new [language]   start a new session (default: en)");
    println!("  /sessions         list stored sessions");
    println!("  /switch <id>      resume a stored session");
    println!("  /lang <code>      change the active session's language");
    println!("  /attach <path>    attach an image to your next message");
    println!("  /quit             exit");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment
    dotenvy::dotenv().ok();

    // Initialize model provider
    let provider = Arc::new(
        GeminiProvider::from_env()
            .context("Gemini provider not configured; set GEMINI_API_KEY")?,
    );

    match provider.health_check().await {
        Ok(true) => tracing::info!("✓ Connected to Gemini ({})", provider.name()),
        Ok(false) | Err(_) => {
            tracing::warn!("⚠ Gemini not reachable - replies will degrade gracefully");
        }
    }

    // Booking gateway: PostgREST when configured, in-memory demo otherwise
    let gateway: Arc<dyn BookingGateway> = match PostgrestConfig::from_env() {
        Some(config) => Arc::new(PostgrestDirectory::from_config(config)?),
        None => {
            tracing::info!("SUPABASE_URL not set - using in-memory directory");
            Arc::new(InMemoryDirectory::new())
        }
    };
    if !gateway.health_check().await {
        tracing::warn!("⚠ Booking gateway ({}) not reachable", gateway.name());
    }

    let store = Arc::new(agent_core::MemorySessionStore::new());
    let mut advisor = HealthAdvisor::new(provider, gateway, store);

    let session = advisor.open_session("en")?;
    println!("HealthGuide advisor ready (session {session}). Type /help for commands.");

    let sink = TerminalSink;
    let mut pending_attachment: Option<Attachment> = None;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        if let Some(command) = input.strip_prefix('/') {
            let mut parts = command.splitn(2, ' ');
            let verb = parts.next().unwrap_or_default();
            let rest = parts.next().unwrap_or_default().trim();

            match verb {
                "quit" | "exit" => break,
                "help" => print_help(),
                "new" => {
                    let language = if rest.is_empty() { "en" } else { rest };
                    let id = advisor.open_session(language)?;
                    println!("Started session {id} ({language})");
                }
                "sessions" => {
                    for session in advisor.sessions(20)? {
                        println!(
                            "  {}  {}  [{}]  {}",
                            session.id,
                            session.updated_at.format("%Y-%m-%d %H:%M"),
                            session.language,
                            session.title()
                        );
                    }
                }
                "switch" => match advisor.select_session(&SessionId::from_string(rest)) {
                    Ok(()) => println!("Resumed session {rest}"),
                    Err(e) => println!("Cannot switch: {e}"),
                },
                "lang" => match advisor.set_language(rest) {
                    Ok(()) => println!("Language set to {rest}"),
                    Err(e) => println!("Cannot set language: {e}"),
                },
                "attach" => match tokio::fs::read(rest).await {
                    Ok(bytes) => {
                        let media_type = media_type_for(Path::new(rest));
                        pending_attachment =
                            Some(Attachment::from_bytes(&bytes, media_type, rest));
                        println!("Attached {rest} ({media_type})");
                    }
                    Err(e) => println!("Cannot read {rest}: {e}"),
                },
                _ => println!("Unknown command /{verb}; try /help"),
            }
            continue;
        }

        advisor
            .send_message(input, pending_attachment.take(), &sink)
            .await?;
    }

    println!("Goodbye.");
    Ok(())
}
