use anyhow::{Result, bail};
use clap::Parser;
use minisocks::{Authenticator, Socks5Config, Socks5Server, auth::UserPass};
use std::time::Duration;
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about = "A lightweight SOCKS5 CONNECT proxy", long_about = None)]
struct Args {
    /// Listener address
    #[arg(short, long, default_value = "127.0.0.1:1080")]
    listen: String,

    /// Username for SOCKS5 proxy
    #[arg(short, long)]
    username: Option<String>,

    /// Password for SOCKS5 proxy
    #[arg(short, long)]
    password: Option<String>,

    /// Reject clients that do not offer the configured auth method
    #[arg(long)]
    strict_methods: bool,

    /// Seconds allowed for authentication, CONNECT and dial
    #[arg(long)]
    handshake_timeout: Option<u64>,

    /// Seconds allowed for connecting to the destination
    #[arg(long)]
    dial_timeout: Option<u64>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse args
    let args = Args::parse();

    // Initialize tracing subscriber
    let level = if args.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt().with_max_level(level).init();

    // Check for auth and grab it if present
    let authenticator = match (args.username, args.password) {
        (Some(u), Some(p)) => {
            info!("Authentication enabled");
            Authenticator::with_credentials(UserPass {
                username: u,
                password: p,
            })
        }
        (None, None) => Authenticator::NoAuth,
        _ => bail!("[ERR] must provide both username and password (or neither)"),
    };

    // Build session config
    let config = Socks5Config {
        authenticator,
        strict_method_selection: args.strict_methods,
        handshake_timeout: args.handshake_timeout.map(Duration::from_secs),
        dial_timeout: args.dial_timeout.map(Duration::from_secs),
    };

    // Instantiate server
    let mut server = Socks5Server::new(args.listen).with_config(config);

    // Run it
    info!("Starting SOCKS5 proxy: {}", server.listen_addr);
    server.run().await
}
