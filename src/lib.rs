//! A lightweight SOCKS5 CONNECT proxy library
//!
//! ## SOCKS5 Implementation
//!
//! - Features:
//!     - CONNECT to IPv4 addresses and domain names
//!     - No Authentication
//!     - Username/Password Authentication backed by a pluggable credential store
//!     - Async using tokio, one task per client and one per relay direction
//!     - Optional handshake and dial timeouts
//! - Not supported: BIND, UDP ASSOCIATE, IPv6 destinations, GSSAPI
//! - [SOCKS5 (RFC 1928)](https://datatracker.ietf.org/doc/html/rfc1928)
//! - [Username/Password Authentication (RFC 1929)](https://datatracker.ietf.org/doc/html/rfc1929)
//!
//! # Example
//! ```no_run
//! use minisocks::{Socks5Server, auth::UserPass};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let auth = UserPass {
//!         username: "user".to_string(),
//!         password: "pass".to_string(),
//!     };
//!
//!     let mut server = Socks5Server::new("127.0.0.1:1080").with_auth(Some(auth));
//!     server.run().await
//! }
//! ```
//!
//! The session stages can also be driven directly on any async stream:
//! [`auth::negotiate_auth`], then [`commands::establish_connect`], then
//! [`relay::relay`].

pub mod address;
pub mod auth;
pub mod commands;
pub mod config;
pub mod error;
pub mod protocol;
pub mod relay;
pub mod server;

// Re-export main types at crate root for convenience
pub use auth::{Authenticator, CredentialStore, StaticCredentials, UserPass};
pub use config::Socks5Config;
pub use error::{ErrorKind, Socks5Error};
pub use protocol::{AuthMethod, Command, ReplyCode, Version};
pub use server::Socks5Server;
