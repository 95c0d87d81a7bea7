//! Chat relay server
//!
//! Run with: cargo run --example chat_server [PORT...]
//!
//! Examples:
//!   cargo run --example chat_server              # listens on 0.0.0.0:9000
//!   cargo run --example chat_server 9000 9001    # listens on both ports
//!
//! Connect with the chat_client example, or any line-based tool:
//!   nc localhost 9000
//!
//! Every line a client sends is relayed to all other clients as
//! `Client <id>: <line>`.

use chat_relay::{ChatServer, ServerConfig};

fn print_usage() {
    eprintln!("Usage: chat_server [PORT...]");
    eprintln!();
    eprintln!("  chat_server              # listens on port 9000");
    eprintln!("  chat_server 9000 9001    # listens on ports 9000 and 9001");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        return Ok(());
    }

    let mut ports = Vec::with_capacity(args.len());
    for arg in &args {
        match arg.parse::<u16>() {
            Ok(port) => ports.push(port),
            Err(_) => {
                eprintln!("Error: invalid port '{}'", arg);
                eprintln!();
                print_usage();
                std::process::exit(1);
            }
        }
    }

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("chat_relay=info".parse()?)
                .add_directive("chat_server=info".parse()?),
        )
        .init();

    let config = if ports.is_empty() {
        ServerConfig::default()
    } else {
        ServerConfig::with_ports(&ports)
    };

    let server = ChatServer::new(config);

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    if let Err(e) = server.run_until(shutdown).await {
        eprintln!("Server error: {}", e);
        std::process::exit(1);
    }

    let stats = server.stats();
    println!(
        "Served {} connections, relayed {} lines ({} dropped)",
        stats.connections_accepted, stats.lines_received, stats.dropped_deliveries
    );

    Ok(())
}
