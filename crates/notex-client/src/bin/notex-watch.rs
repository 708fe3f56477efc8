//! notex-watch: follow the live note list from the terminal.
//!
//! Loads every note, subscribes to change events, and reprints the reconciled
//! list after each one.

use clap::Parser;
use futures::StreamExt;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use notex_client::{LiveNotes, NotesClient};
use notex_core::{defaults, ChangeEvent, Note};

#[derive(Parser)]
#[command(name = "notex-watch")]
#[command(author, version, about = "Watch notex notes update live")]
struct Cli {
    /// API base URL
    #[arg(long, env = "NOTEX_API_BASE", default_value = defaults::API_BASE)]
    base: String,

    /// Print the current list and exit instead of following changes
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "notex_client=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let client = NotesClient::new(cli.base);
    let mut live = LiveNotes::new(client.clone());

    live.load().await?;
    print_notes(live.notes());

    if cli.once {
        return Ok(());
    }

    let mut events = client.subscribe().await?;
    tracing::info!(base = client.base(), "Watching for note changes");
    while let Some(event) = events.next().await {
        let event = event?;
        println!("-- {}", describe(&event));
        live.apply(&event);
        print_notes(live.notes());
    }

    tracing::info!("Server closed the event stream");
    Ok(())
}

fn describe(event: &ChangeEvent) -> String {
    format!("{} note {}", event.kind(), event.note_id())
}

fn print_notes(notes: &[Note]) {
    if notes.is_empty() {
        println!("(no notes)");
        return;
    }
    for note in notes {
        let updated = note
            .effective_timestamp()
            .format("%Y-%m-%d %H:%M:%S")
            .to_string();
        println!("{:>6}  {}  {}  {}", note.id, note.bg_color, updated, note.name);
    }
}
