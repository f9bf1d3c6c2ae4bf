//! SOCKS5 server with username/password authentication example

use minisocks::{Socks5Server, StaticCredentials};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let creds: StaticCredentials = [("<user>", "<pass>")].into_iter().collect();

    let mut server = Socks5Server::new("127.0.0.1:1080").with_credentials(creds);

    server.run().await
}
