//! Simple telemetry ingest server example with a console viewer
//!
//! Run with: cargo run --example ingest_server [BIND_ADDR]
//!
//! Examples:
//!   cargo run --example ingest_server                    # binds to 0.0.0.0:8001
//!   cargo run --example ingest_server localhost          # binds to 127.0.0.1:8001
//!   cargo run --example ingest_server 127.0.0.1:8002     # binds to 127.0.0.1:8002
//!
//! ## Sending telemetry
//!
//! Any newline-delimited JSON source works:
//!
//!   cargo run --example telemetry_probe 127.0.0.1:8001
//!
//! or from a shell:
//!
//!   while true; do echo "{\"t\":$(date +%s)}"; sleep 1; done | nc localhost 8001
//!
//! ## What it does
//!
//! - Every record is appended to log/telemetry_<timestamp>_<ip>.log
//! - A console viewer auto-subscribes to each discovered producer and
//!   prints the pushed records; after the 10-record budget runs out it
//!   re-subscribes, the way a browser viewer would

use std::net::SocketAddr;
use std::sync::Arc;

use telemetry_rs::broadcast::{ChannelTransport, NewProducerEvent, Topic};
use telemetry_rs::{ServerConfig, TelemetryServer};

/// Parse bind address from command line argument.
///
/// Accepts formats:
/// - "localhost" -> 127.0.0.1:8001
/// - "localhost:8002" -> 127.0.0.1:8002
/// - "127.0.0.1" -> 127.0.0.1:8001
/// - "0.0.0.0:8001" -> 0.0.0.0:8001
fn parse_bind_addr(arg: &str) -> Result<SocketAddr, String> {
    const DEFAULT_PORT: u16 = 8001;

    // Replace "localhost" with "127.0.0.1"
    let normalized = arg.replace("localhost", "127.0.0.1");

    // Try parsing as SocketAddr first (includes port)
    if let Ok(addr) = normalized.parse::<SocketAddr>() {
        return Ok(addr);
    }

    // Try parsing as IP address without port
    if let Ok(ip) = normalized.parse::<std::net::IpAddr>() {
        return Ok(SocketAddr::new(ip, DEFAULT_PORT));
    }

    Err(format!(
        "Invalid bind address: '{}'. Expected format: IP:PORT or IP or 'localhost'",
        arg
    ))
}

fn print_usage() {
    eprintln!("Usage: ingest_server [BIND_ADDR]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  BIND_ADDR    Address to bind to (default: 0.0.0.0:8001)");
}

/// Watch the announcement channel and attach a printing viewer to every
/// producer that shows up.
async fn run_viewer(server: Arc<TelemetryServer<ChannelTransport>>) {
    let mut announcements = server.transport().subscribe(&Topic::NewProducer);

    while let Ok(payload) = announcements.recv().await {
        let event: NewProducerEvent = match serde_json::from_slice(&payload) {
            Ok(event) => event,
            Err(e) => {
                eprintln!("Bad announcement payload: {}", e);
                continue;
            }
        };

        println!("* producer discovered: {}", event.ip);
        server.subscribe(&event.ip).await;

        let server = Arc::clone(&server);
        tokio::spawn(async move {
            let mut records = server.transport().subscribe(&Topic::NewData(event.ip));
            while let Ok(record) = records.recv().await {
                println!("[{}] {}", event.ip, String::from_utf8_lossy(&record));

                // Keep the budget topped up so the console never goes quiet
                if server.throttle().remaining(&event.ip) == 0 {
                    server.subscribe(&event.ip).await;
                }
            }
        });
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command line arguments
    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        return Ok(());
    }

    let bind_addr = match args.get(1) {
        Some(addr_str) => match parse_bind_addr(addr_str) {
            Ok(addr) => addr,
            Err(e) => {
                eprintln!("Error: {}", e);
                eprintln!();
                print_usage();
                std::process::exit(1);
            }
        },
        None => "0.0.0.0:8001".parse().unwrap(),
    };

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("telemetry_rs=debug".parse()?)
                .add_directive("ingest_server=debug".parse()?),
        )
        .init();

    let config = ServerConfig {
        bind_addr,
        ..ServerConfig::default()
    };

    println!("Starting telemetry server on {}", config.bind_addr);
    println!();
    println!("Send newline-delimited JSON to this port, e.g.:");
    println!("  cargo run --example telemetry_probe {}", config.bind_addr);
    println!();

    let server = Arc::new(TelemetryServer::new(config, ChannelTransport::new()));

    tokio::spawn(run_viewer(Arc::clone(&server)));

    tokio::select! {
        result = server.run() => {
            if let Err(e) = result {
                eprintln!("Server error: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            println!("\nShutting down...");
        }
    }

    Ok(())
}
