use std::io;
use thiserror::Error;

/// ErrorKind groups session errors by what went wrong on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The client sent something the protocol does not allow, or stopped
    /// sending in the middle of a frame
    ProtocolViolation,
    /// Bad credentials or an unsupported sub-negotiation version
    AuthenticationFailure,
    /// The destination could not be reached
    DialFailure,
    /// A socket read or write failed
    IoFailure,
}

/// Socks5Error is returned by every stage of a SOCKS5 session. All variants
/// are terminal for the session that produced them
#[derive(Error, Debug)]
pub enum Socks5Error {
    #[error("unsupported SOCKS version: {0:#04x}")]
    UnsupportedVersion(u8),

    #[error("client did not offer the configured authentication method")]
    NoAcceptableMethod,

    #[error("unsupported username/password auth version: {0:#04x}")]
    UnsupportedAuthVersion(u8),

    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("unsupported command: {0:#04x}")]
    UnsupportedCommand(u8),

    #[error("unsupported address type: {0:#04x}")]
    UnsupportedAddressType(u8),

    #[error("invalid address type: {0:#04x}")]
    InvalidAddressType(u8),

    #[error("domain name is not valid UTF-8")]
    InvalidDomain,

    #[error("connection closed mid-frame")]
    Truncated,

    #[error("failed to dial {target}: {source}")]
    DialFailed {
        target: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to write CONNECT reply: {0}")]
    ReplyWriteFailed(#[source] io::Error),

    #[error("handshake timed out")]
    HandshakeTimeout,

    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}

impl Socks5Error {
    /// from_read converts a failed fixed-length read: EOF before the frame is
    /// complete becomes Truncated, anything else stays an i/o error
    pub fn from_read(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::UnexpectedEof => Socks5Error::Truncated,
            _ => Socks5Error::Io(err),
        }
    }

    /// kind classifies the error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Socks5Error::UnsupportedVersion(_)
            | Socks5Error::NoAcceptableMethod
            | Socks5Error::UnsupportedCommand(_)
            | Socks5Error::UnsupportedAddressType(_)
            | Socks5Error::InvalidAddressType(_)
            | Socks5Error::InvalidDomain
            | Socks5Error::Truncated => ErrorKind::ProtocolViolation,
            Socks5Error::UnsupportedAuthVersion(_) | Socks5Error::InvalidCredentials => {
                ErrorKind::AuthenticationFailure
            }
            Socks5Error::DialFailed { .. } => ErrorKind::DialFailure,
            Socks5Error::ReplyWriteFailed(_)
            | Socks5Error::HandshakeTimeout
            | Socks5Error::Io(_) => ErrorKind::IoFailure,
        }
    }
}
