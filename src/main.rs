//! RelayKV - A Redis Front Door for a Record-Oriented Store
//!
//! This is the main entry point for the RelayKV server.
//! It parses the configuration, wires the embedded store to the command
//! handler, and accepts incoming connections.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use relaykv::commands::{CommandHandler, Keyspace};
use relaykv::connection::handle_connection;
use relaykv::store::MemoryStore;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Server configuration
struct Config {
    /// Host to bind to
    host: String,
    /// Port to listen on
    port: u16,
    /// Namespace records are stored in
    namespace: String,
    /// Set name within the namespace
    set: String,
    /// Bin scalar values are stored in
    bin: String,
    /// Default record TTL in seconds; 0 means records never expire
    default_ttl_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        let keyspace = Keyspace::default();
        Self {
            host: relaykv::DEFAULT_HOST.to_string(),
            port: relaykv::DEFAULT_PORT,
            namespace: keyspace.namespace,
            set: keyspace.set,
            bin: keyspace.bin,
            default_ttl_secs: 0,
        }
    }
}

impl Config {
    /// Parse configuration from command-line arguments
    fn from_args() -> Self {
        let mut config = Config::default();
        let args: Vec<String> = std::env::args().collect();

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--host" | "-h" => {
                    config.host = take_value(&args, i, "--host");
                    i += 2;
                }
                "--port" | "-p" => {
                    config.port = take_value(&args, i, "--port").parse().unwrap_or_else(|_| {
                        eprintln!("Error: invalid port number");
                        std::process::exit(1);
                    });
                    i += 2;
                }
                "--namespace" => {
                    config.namespace = take_value(&args, i, "--namespace");
                    i += 2;
                }
                "--set" => {
                    config.set = take_value(&args, i, "--set");
                    i += 2;
                }
                "--bin" => {
                    config.bin = take_value(&args, i, "--bin");
                    i += 2;
                }
                "--default-ttl" => {
                    config.default_ttl_secs = take_value(&args, i, "--default-ttl")
                        .parse()
                        .unwrap_or_else(|_| {
                            eprintln!("Error: invalid TTL");
                            std::process::exit(1);
                        });
                    i += 2;
                }
                "--help" => {
                    print_help();
                    std::process::exit(0);
                }
                "--version" | "-v" => {
                    println!("RelayKV version {}", relaykv::VERSION);
                    std::process::exit(0);
                }
                _ => {
                    eprintln!("Unknown argument: {}", args[i]);
                    print_help();
                    std::process::exit(1);
                }
            }
        }

        config
    }

    /// Returns the bind address as a string
    fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// The default record TTL, with 0 mapped to "never expire"
    fn default_ttl(&self) -> Option<Duration> {
        match self.default_ttl_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}

fn take_value(args: &[String], i: usize, flag: &str) -> String {
    match args.get(i + 1) {
        Some(value) => value.clone(),
        None => {
            eprintln!("Error: {flag} requires a value");
            std::process::exit(1);
        }
    }
}

fn print_help() {
    println!(
        r#"
RelayKV - A Redis Front Door for a Record-Oriented Store

USAGE:
    relaykv [OPTIONS]

OPTIONS:
    -h, --host <HOST>          Host to bind to (default: 127.0.0.1)
    -p, --port <PORT>          Port to listen on (default: 6379)
        --namespace <NS>       Namespace records are stored in (default: test)
        --set <SET>            Set name within the namespace (default: redis)
        --bin <BIN>            Bin scalar values are stored in (default: data)
        --default-ttl <SECS>   Default record TTL in seconds, 0 = never expire (default: 0)
    -v, --version              Print version information
        --help                 Print this help message

EXAMPLES:
    relaykv                          # Start on 127.0.0.1:6379
    relaykv --port 6380              # Start on port 6380
    relaykv --default-ttl 3600       # New records expire after an hour

CONNECTING:
    Use redis-cli or any Redis client to connect:
    $ redis-cli -p 6379
    127.0.0.1:6379> PING
    PONG
    127.0.0.1:6379> SET greeting "hello"
    OK
    127.0.0.1:6379> GET greeting
    "hello"
"#
    );
}

fn print_banner(config: &Config) {
    println!(
        r#"
 ____         _                _  ____     __
|  _ \   ___ | |  __ _  _   _ | |/ /\ \   / /
| |_) | / _ \| | / _` || | | || ' /  \ \ / /
|  _ < |  __/| || (_| || |_| || . \   \ V /
|_| \_\ \___||_| \__,_| \__, ||_|\_\   \_/
                        |___/

RelayKV v{} - Redis Front Door for a Record-Oriented Store
──────────────────────────────────────────────────────────────
Server started on {}
Keyspace: {}/{} (bin: {})
Ready to accept connections.

Use Ctrl+C to shutdown gracefully.
"#,
        relaykv::VERSION,
        config.bind_address(),
        config.namespace,
        config.set,
        config.bin,
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command-line arguments
    let config = Config::from_args();

    // Set up logging; RUST_LOG overrides the default level
    let _subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    // Print the banner
    print_banner(&config);

    // Embedded backend, shared across all connections
    let store = Arc::new(MemoryStore::with_default_ttl(config.default_ttl()));
    info!("Memory store initialized");
    if let Some(ttl) = config.default_ttl() {
        info!("Default record TTL: {}s", ttl.as_secs());
    }

    let keyspace = Keyspace::new(
        config.namespace.clone(),
        config.set.clone(),
        config.bin.clone(),
    );
    let handler = CommandHandler::new(store, keyspace);
    info!(
        "Keyspace: namespace={} set={} bin={}",
        config.namespace, config.set, config.bin
    );

    // Bind the TCP listener
    let listener = TcpListener::bind(config.bind_address())
        .await
        .with_context(|| format!("failed to bind {}", config.bind_address()))?;
    info!("Listening on {}", config.bind_address());

    // Set up graceful shutdown
    let shutdown = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
        info!("Shutdown signal received, stopping server...");
    };

    // Main accept loop
    tokio::select! {
        _ = accept_loop(listener, handler) => {}
        _ = shutdown => {}
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Main loop that accepts incoming connections
async fn accept_loop(listener: TcpListener, handler: CommandHandler) {
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let handler = handler.clone();

                // Spawn a task to handle this connection
                tokio::spawn(async move {
                    handle_connection(stream, addr, handler).await;
                });
            }
            Err(e) => {
                error!("Failed to accept connection: {}", e);
            }
        }
    }
}
