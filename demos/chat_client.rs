//! Interactive chat client
//!
//! Run with: cargo run --example chat_client [HOST:PORT]
//!
//! Type lines to send them to everyone else. Type `quit` to leave.

use chat_relay::client::{ChatSession, ClientConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("chat_relay=warn".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = match std::env::args().nth(1) {
        Some(addr) => ClientConfig::new(addr),
        None => ClientConfig::default(),
    };

    let session = ChatSession::connect(config).await?;
    if let Some(addr) = session.peer_addr() {
        eprintln!("Connected to {}", addr);
    }
    eprintln!("You can start typing. Type 'quit' to leave.");

    let summary = session.run(tokio::io::stdin(), tokio::io::stdout()).await?;
    eprintln!(
        "Disconnected: sent {} lines, received {}",
        summary.lines_sent, summary.lines_received
    );

    Ok(())
}
