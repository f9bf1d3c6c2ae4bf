use crate::{
    auth::{self, Authenticator, CredentialStore, UserPass},
    commands,
    config::Socks5Config,
    error::Socks5Error,
    relay::relay,
};
use anyhow::{Result, anyhow, bail};
use std::{net::SocketAddr, sync::Arc};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info};

/// Socks5Server represents a SOCKS5 server and houses related
/// configuration data
pub struct Socks5Server {
    pub listen_addr: String,
    pub config: Arc<Socks5Config>,
    listener: Option<TcpListener>,
}

impl Socks5Server {
    /// new is a constructor for the Socks5Server type
    pub fn new(listen_addr: impl Into<String>) -> Self {
        Self {
            listen_addr: listen_addr.into(),
            config: Arc::new(Socks5Config::default()),
            listener: None,
        }
    }

    /// with_config replaces the whole session configuration
    pub fn with_config(mut self, config: Socks5Config) -> Self {
        self.config = Arc::new(config);
        self
    }

    /// with_auth enables username/password authentication for a single
    /// credential pair, or disables authentication when given None
    pub fn with_auth(self, auth: Option<UserPass>) -> Self {
        let authenticator = match auth {
            Some(creds) => Authenticator::with_credentials(creds),
            None => Authenticator::NoAuth,
        };
        self.with_authenticator(authenticator)
    }

    /// with_credentials enables username/password authentication backed by
    /// an arbitrary credential store
    pub fn with_credentials(self, store: impl CredentialStore + 'static) -> Self {
        self.with_authenticator(Authenticator::with_credentials(store))
    }

    fn with_authenticator(mut self, authenticator: Authenticator) -> Self {
        // Arc allows the config to be shared by every session task
        let mut config = (*self.config).clone();
        config.authenticator = authenticator;
        self.config = Arc::new(config);
        self
    }

    /// bind to the listen address. Fails when called twice
    pub async fn bind(&mut self) -> Result<SocketAddr> {
        if self.listener.is_some() {
            bail!("bind can only be called once");
        }

        // Instantiate tokio listener
        let listener = TcpListener::bind(&self.listen_addr).await?;
        let addr = listener.local_addr()?;

        // DEBUG
        info!("SOCKS5 proxy listening on {:?}", addr);

        self.listener = Some(listener);
        Ok(addr)
    }

    /// run handles server spinup and listens for incoming connections
    pub async fn run(&mut self) -> Result<()> {
        if self.listener.is_none() {
            self.bind().await?;
        }
        let listener = self
            .listener
            .take()
            .ok_or_else(|| anyhow!("server is already running"))?;

        // Listen for connections to proxy
        loop {
            // Accept incoming connection
            let (inbound, peer_addr) = match listener.accept().await {
                Ok(conn) => conn,
                Err(e) => {
                    error!("accept failed: {}", e);
                    continue;
                }
            };

            // Clone for this connection
            let config = Arc::clone(&self.config);

            // Spawn async task
            tokio::spawn(async move {
                // DEBUG
                debug!("new client: {}", peer_addr);

                // Send connection to connection handler
                if let Err(e) = handle_connection(inbound, &config).await {
                    error!("{}: session aborted ({:?}): {}", peer_addr, e.kind(), e);
                }
            });
        }
    }
}

/// handle_connection drives one client session: authentication, CONNECT,
/// then the relay. Returning drops the client stream, which closes it
pub async fn handle_connection(
    mut stream: TcpStream,
    config: &Socks5Config,
) -> Result<(), Socks5Error> {
    let handshake = async {
        // Negotiate authentication with client
        auth::negotiate_auth(
            &mut stream,
            &config.authenticator,
            config.strict_method_selection,
        )
        .await?;

        // Handle connection request from client
        commands::establish_connect(&mut stream, config.dial_timeout).await
    };

    let outbound = match config.handshake_timeout {
        Some(limit) => tokio::time::timeout(limit, handshake)
            .await
            .map_err(|_| Socks5Error::HandshakeTimeout)??,
        None => handshake.await?,
    };

    // Proxy
    relay(stream, outbound).await;

    Ok(())
}
