//! Minimal telemetry producer
//!
//! Connects to an ingest server and emits one JSON record per interval:
//!
//!   cargo run --example telemetry_probe [SERVER_ADDR] [INTERVAL_MS]
//!
//! Defaults to 127.0.0.1:8001 and one record per second. Each record
//! carries a monotonic counter and a coarse process uptime, which is
//! enough to watch the pipeline end to end.

use std::time::{Duration, Instant};

use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();

    let addr = args.get(1).map(String::as_str).unwrap_or("127.0.0.1:8001");
    let interval_ms: u64 = match args.get(2) {
        Some(raw) => raw.parse()?,
        None => 1000,
    };

    let mut stream = TcpStream::connect(addr).await.unwrap_or_else(|e| {
        eprintln!("Failed to connect to {}: {}", addr, e);
        std::process::exit(1);
    });

    println!(
        "Sending one record every {}ms to {} (ctrl-c to stop)",
        interval_ms, addr
    );

    let started = Instant::now();
    let mut ticker = tokio::time::interval(Duration::from_millis(interval_ms));

    for n in 0u64.. {
        ticker.tick().await;

        let record = serde_json::json!({
            "seq": n,
            "uptime_secs": started.elapsed().as_secs(),
        });

        let mut line = record.to_string();
        line.push('\n');
        stream.write_all(line.as_bytes()).await?;
    }

    Ok(())
}
