//! # Banter
//!
//! Terminal chat client.
//!
//! ## Usage
//!
//! ```bash
//! # Connect with a display name
//! banter alice
//!
//! # Prompt for the name interactively
//! banter
//!
//! # Point at a different server
//! BANTER_HOST=chat.example.com BANTER_PORT=9001 banter alice
//! ```
//!
//! Type to chat; `/quit` logs out.

mod config;

use anyhow::{Context, Result};
use banter_client::SessionConnection;
use banter_core::{ChatRoom, Dispatcher, Notice, RoomConfig};
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "banter=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = config::Config::load()?;

    let username = match std::env::args().nth(1) {
        Some(name) => name,
        None => prompt_username()?,
    };

    run(config, username).await
}

/// Blocking username prompt, before the session starts.
fn prompt_username() -> Result<String> {
    print!("username: ");
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin()
        .read_line(&mut line)
        .context("Failed to read username")?;
    let username = line.trim().to_string();
    anyhow::ensure!(!username.is_empty(), "A display name is required");
    Ok(username)
}

async fn run(config: config::Config, username: String) -> Result<()> {
    let dispatcher = Dispatcher::new();
    let connection = Arc::new(SessionConnection::new(
        config.endpoint(),
        dispatcher.clone(),
    ));

    tracing::info!(url = %config.endpoint().url(), user = %username, "Connecting");
    connection
        .connect(&username)
        .await
        .context("Failed to reach the chat server")?;

    // Render every broadcast and roster change as it arrives.
    let print_sub = dispatcher.subscribe_messages(|message| {
        println!("[{}] <{}> {}", message.timestamp, message.username, message.content);
    });
    let roster_sub = dispatcher.subscribe_roster(|entries| {
        let names: Vec<&str> = entries.iter().map(|e| e.username.as_str()).collect();
        println!("* online: {}", names.join(", "));
    });

    let room_config = RoomConfig {
        logout_grace: config.logout_grace(),
    };
    let (room, mut notices) = ChatRoom::new(
        username.clone(),
        &dispatcher,
        connection.clone(),
        room_config,
    );

    println!("Connected as {}. Type to chat, /quit to leave.", username);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            notice = notices.recv() => match notice {
                Some(Notice::SessionEnded) | None => break,
                // Broadcasts are already rendered by the dispatcher
                // subscription above.
                Some(Notice::NewMessage { .. }) => {}
            },
            line = lines.next_line() => match line? {
                Some(line) if line.trim() == "/quit" => room.logout().await,
                Some(line) => room.submit(&line).await,
                // stdin closed: treat like a quit.
                None => room.logout().await,
            },
        }
    }

    print_sub.cancel();
    roster_sub.cancel();
    println!("Session ended.");
    Ok(())
}
