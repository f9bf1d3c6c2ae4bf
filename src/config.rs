use crate::auth::Authenticator;
use std::time::Duration;

/// Socks5Config holds per-session protocol settings shared by every
/// connection a server accepts
#[derive(Debug, Clone, Default)]
pub struct Socks5Config {
    /// Method announced to every client
    pub authenticator: Authenticator,

    /// Reject clients that did not offer the announced method
    pub strict_method_selection: bool,

    /// Upper bound on negotiation, CONNECT parsing, dial and reply.
    /// None waits forever
    pub handshake_timeout: Option<Duration>,

    /// Upper bound on the outbound TCP connect
    pub dial_timeout: Option<Duration>,
}
