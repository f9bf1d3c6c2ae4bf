use crate::error::Socks5Error;
use crate::protocol::{
    AuthMethod, AuthStatus, USERPASS_VERSION, Version, read_array, read_vec, write_frame,
};
use std::{collections::HashMap, fmt, sync::Arc};
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::debug;

/// CredentialStore validates a username/password pair. Implementations are
/// shared by every session, so they must be safe to query concurrently
pub trait CredentialStore: Send + Sync {
    fn valid(&self, username: &[u8], password: &[u8]) -> bool;
}

/// UserPass holds a single username/password pair as dictated
/// server-side
#[derive(Clone)]
pub struct UserPass {
    pub username: String,
    pub password: String,
}

impl CredentialStore for UserPass {
    fn valid(&self, username: &[u8], password: &[u8]) -> bool {
        self.username.as_bytes() == username && self.password.as_bytes() == password
    }
}

/// StaticCredentials maps usernames to passwords
#[derive(Clone, Default)]
pub struct StaticCredentials {
    users: HashMap<String, String>,
}

impl StaticCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    /// insert adds or replaces the password for a user
    pub fn insert(&mut self, username: impl Into<String>, password: impl Into<String>) {
        self.users.insert(username.into(), password.into());
    }
}

impl<U, P> FromIterator<(U, P)> for StaticCredentials
where
    U: Into<String>,
    P: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (U, P)>>(iter: I) -> Self {
        let mut creds = Self::new();
        for (user, pass) in iter {
            creds.insert(user, pass);
        }
        creds
    }
}

impl CredentialStore for StaticCredentials {
    fn valid(&self, username: &[u8], password: &[u8]) -> bool {
        let Ok(username) = std::str::from_utf8(username) else {
            return false;
        };

        self.users
            .get(username)
            .is_some_and(|expected| expected.as_bytes() == password)
    }
}

/// Authenticator is the method the server announces to every client, picked
/// at configuration time rather than from the client's offer
#[derive(Clone, Default)]
pub enum Authenticator {
    #[default]
    NoAuth,
    UserPass(Arc<dyn CredentialStore>),
}

impl Authenticator {
    /// with_credentials builds a username/password authenticator around a store
    pub fn with_credentials(store: impl CredentialStore + 'static) -> Self {
        Authenticator::UserPass(Arc::new(store))
    }

    /// method returns the wire value announced in the method selection reply
    pub fn method(&self) -> AuthMethod {
        match self {
            Authenticator::NoAuth => AuthMethod::NoAuth,
            Authenticator::UserPass(_) => AuthMethod::UserPass,
        }
    }
}

impl fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Authenticator::NoAuth => f.write_str("NoAuth"),
            Authenticator::UserPass(_) => f.write_str("UserPass"),
        }
    }
}

/// negotiate_auth handles authentication negotiation between the SOCKS server and client.
///
/// The announced method comes from `authenticator`. With `strict` set, a client
/// that did not offer that method receives NO ACCEPTABLE METHODS and the
/// session fails; otherwise the offer is read and ignored.
pub async fn negotiate_auth<S>(
    stream: &mut S,
    authenticator: &Authenticator,
    strict: bool,
) -> Result<(), Socks5Error>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    // ClientHello format
    // +----+----------+----------+
    // |VER | NMETHODS | METHODS  |
    // +----+----------+----------+
    // | 1  |    1     | 1 to 255 |
    // +----+----------+----------+

    // Read handshake header -> version and number of methods
    let [version, n_methods] = read_array::<2, _>(stream).await?;

    // Ensure version is 0x05 -> SOCKS5
    if version != Version::SOCKS5 as u8 {
        return Err(Socks5Error::UnsupportedVersion(version));
    }

    // Read offered methods. The announced method is configured, not picked from these
    let methods = read_vec(stream, n_methods as usize).await?;
    let method = authenticator.method();

    debug!("client offered methods {:?}, selecting {:?}", methods, method);

    // Strict mode: refuse clients that did not offer the configured method
    if strict && !methods.contains(&(method as u8)) {
        write_frame(
            stream,
            &[Version::SOCKS5 as u8, AuthMethod::NoAcceptable as u8],
        )
        .await?;
        return Err(Socks5Error::NoAcceptableMethod);
    }

    // ServerChoice method selection reply format
    // +----+--------+
    // |VER | METHOD |
    // +----+--------+
    // | 1  |   1    |
    // +----+--------+

    // Write response to client with selected method
    write_frame(stream, &[Version::SOCKS5 as u8, method as u8]).await?;

    // Route to appropriate auth handler
    match authenticator {
        Authenticator::NoAuth => Ok(()),
        Authenticator::UserPass(store) => authenticate_userpass(stream, store.as_ref()).await,
    }
}

/// authenticate_userpass handles username/password authentication according to RFC 1929
async fn authenticate_userpass<S>(
    stream: &mut S,
    store: &dyn CredentialStore,
) -> Result<(), Socks5Error>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    // Client Username/Password Request
    // +----+------+----------+------+----------+
    // |VER | ULEN |  UNAME   | PLEN |  PASSWD  |
    // +----+------+----------+------+----------+
    // | 1  |  1   | 1 to 255 |  1   | 1 to 255 |
    // +----+------+----------+------+----------+

    // Read subnegotiation version and username length
    let [ver, username_len] = read_array::<2, _>(stream).await?;

    // Check version number -> 0x01 expected
    if ver != USERPASS_VERSION {
        return Err(Socks5Error::UnsupportedAuthVersion(ver));
    }

    // Read username
    let username = read_vec(stream, username_len as usize).await?;

    // Read password length, then password
    let [password_len] = read_array::<1, _>(stream).await?;
    let password = read_vec(stream, password_len as usize).await?;

    // Validate credentials
    let status = if store.valid(&username, &password) {
        AuthStatus::Success
    } else {
        AuthStatus::Failure
    };

    // Username/Password Server response
    // +----+--------+
    // |VER | STATUS |
    // +----+--------+
    // | 1  |   1    |
    // +----+--------+

    // The status goes out before a failure is reported to the caller
    write_frame(stream, &[USERPASS_VERSION, status as u8]).await?;

    match status {
        AuthStatus::Success => {
            debug!(
                "user {} authenticated",
                String::from_utf8_lossy(&username)
            );
            Ok(())
        }
        AuthStatus::Failure => Err(Socks5Error::InvalidCredentials),
    }
}
