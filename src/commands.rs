use crate::address::{TargetAddr, parse_address_from_stream};
use crate::error::Socks5Error;
use crate::protocol::{AddressType, Command, RSV, ReplyCode, Version, read_array, write_frame};
use std::{io, time::Duration};
use tokio::{
    io::{AsyncRead, AsyncWrite},
    net::TcpStream,
};
use tracing::{debug, info, warn};

/// BND.ADDR and BND.PORT sent in every CONNECT reply.
// TODO: report the dialed socket's local_addr() here for full RFC 1928 replies
pub const UNSPECIFIED_BOUND_ADDR: [u8; 6] = [0, 0, 0, 0, 0, 0];

/// Length of a CONNECT reply with an IPv4 bound address
pub const REPLY_LEN: usize = 10;

/// ConnectRequest is a parsed CONNECT request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectRequest {
    pub command: Command,
    pub target: TargetAddr,
}

/// read_connect_request reads and validates a SOCKS5 request. Anything other
/// than CONNECT is rejected before the address is read
pub async fn read_connect_request<S>(stream: &mut S) -> Result<ConnectRequest, Socks5Error>
where
    S: AsyncRead + Unpin,
{
    // SOCKS5 request format
    // +----+-----+-------+------+----------+----------+
    // |VER | CMD |  RSV  | ATYP | DST.ADDR | DST.PORT |
    // +----+-----+-------+------+----------+----------+
    // | 1  |  1  | X'00' |  1   | Variable |    2     |
    // +----+-----+-------+------+----------+----------+

    // RSV is read and ignored
    let [version, command, _, atyp] = read_array::<4, _>(stream).await?;

    // Ensure version is 0x05 -> SOCKS5
    if version != Version::SOCKS5 as u8 {
        return Err(Socks5Error::UnsupportedVersion(version));
    }

    let command = match Command::from_byte(command) {
        Some(Command::Connect) => Command::Connect,
        _ => return Err(Socks5Error::UnsupportedCommand(command)),
    };

    let target = parse_address_from_stream(stream, atyp).await?;

    Ok(ConnectRequest { command, target })
}

/// establish_connect reads a CONNECT request, dials the destination and
/// answers the client. On success the client is ready to be relayed to the
/// returned stream
pub async fn establish_connect<S>(
    stream: &mut S,
    dial_timeout: Option<Duration>,
) -> Result<TcpStream, Socks5Error>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let request = read_connect_request(stream).await?;
    let target = request.target.to_string();

    debug!("CONNECT {}", target);

    let outbound = match dial(&target, dial_timeout).await {
        Ok(outbound) => outbound,
        Err(e) => {
            // Best effort: the session is over either way
            if let Err(write_err) = send_reply(stream, ReplyCode::from(e.kind())).await {
                debug!("failed to send failure reply: {}", write_err);
            }
            warn!("dial {} failed: {}", target, e);
            return Err(Socks5Error::DialFailed { target, source: e });
        }
    };

    // Dropping outbound on error closes the destination connection
    send_reply(stream, ReplyCode::Succeeded)
        .await
        .map_err(Socks5Error::ReplyWriteFailed)?;

    info!("connected to {}", target);

    Ok(outbound)
}

/// dial opens the outbound TCP connection. Domain names are resolved here
async fn dial(target: &str, dial_timeout: Option<Duration>) -> io::Result<TcpStream> {
    match dial_timeout {
        Some(limit) => tokio::time::timeout(limit, TcpStream::connect(target))
            .await
            .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "dial timed out"))?,
        None => TcpStream::connect(target).await,
    }
}

/// encode_reply builds a CONNECT reply. The bound address is always
/// reported as 0.0.0.0:0
pub fn encode_reply(reply_code: ReplyCode) -> [u8; REPLY_LEN] {
    // SOCKS5 reply format
    // +----+-----+-------+------+----------+----------+
    // |VER | REP |  RSV  | ATYP | BND.ADDR | BND.PORT |
    // +----+-----+-------+------+----------+----------+
    // | 1  |  1  | X'00' |  1   | Variable |    2     |
    // +----+-----+-------+------+----------+----------+

    let mut reply = [0u8; REPLY_LEN];
    reply[0] = Version::SOCKS5 as u8;
    reply[1] = reply_code as u8;
    reply[2] = RSV;
    reply[3] = AddressType::IPv4 as u8;
    reply[4..].copy_from_slice(&UNSPECIFIED_BOUND_ADDR);
    reply
}

/// send_reply writes a CONNECT reply to the client
async fn send_reply<W>(stream: &mut W, reply_code: ReplyCode) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    write_frame(stream, &encode_reply(reply_code)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn connect_ipv4(ip: [u8; 4], port: u16) -> Vec<u8> {
        let mut req = vec![0x05, 0x01, 0x00, 0x01];
        req.extend_from_slice(&ip);
        req.extend_from_slice(&port.to_be_bytes());
        req
    }

    #[test]
    fn success_reply_is_fixed() {
        assert_eq!(
            encode_reply(ReplyCode::Succeeded),
            [0x05, 0x00, 0x00, 0x01, 0, 0, 0, 0, 0, 0]
        );
        assert_eq!(encode_reply(ReplyCode::ConnectionRefused)[1], 0x05);
    }

    #[tokio::test]
    async fn parses_ipv4_connect_request() {
        let (mut client, mut server) = tokio::io::duplex(64);
        client
            .write_all(&[0x05, 0x01, 0x00, 0x01, 127, 0, 0, 1, 0x1F, 0x90])
            .await
            .unwrap();

        let request = read_connect_request(&mut server).await.unwrap();
        assert_eq!(
            request,
            ConnectRequest {
                command: Command::Connect,
                target: TargetAddr {
                    host: "127.0.0.1".to_string(),
                    port: 8080,
                },
            }
        );
        assert_eq!(request.target.to_string(), "127.0.0.1:8080");
    }

    #[tokio::test]
    async fn parses_domain_connect_request() {
        let (mut client, mut server) = tokio::io::duplex(64);
        let mut req = vec![0x05, 0x01, 0x00, 0x03, 9];
        req.extend_from_slice(b"localhost");
        req.extend_from_slice(&443u16.to_be_bytes());
        client.write_all(&req).await.unwrap();

        let request = read_connect_request(&mut server).await.unwrap();
        assert_eq!(request.target.host, "localhost");
        assert_eq!(request.target.port, 443);
    }

    #[tokio::test]
    async fn bind_and_udp_associate_are_unsupported() {
        for cmd in [0x02u8, 0x03, 0x7f] {
            let (mut client, mut server) = tokio::io::duplex(64);
            client
                .write_all(&[0x05, cmd, 0x00, 0x01, 127, 0, 0, 1, 0, 80])
                .await
                .unwrap();

            let err = read_connect_request(&mut server).await.unwrap_err();
            assert!(matches!(err, Socks5Error::UnsupportedCommand(c) if c == cmd));
            assert_eq!(err.kind(), ErrorKind::ProtocolViolation);
        }
    }

    #[tokio::test]
    async fn wrong_request_version_is_rejected() {
        let (mut client, mut server) = tokio::io::duplex(64);
        client.write_all(&[0x04, 0x01, 0x00, 0x01]).await.unwrap();

        let err = read_connect_request(&mut server).await.unwrap_err();
        assert!(matches!(err, Socks5Error::UnsupportedVersion(0x04)));
    }

    #[tokio::test]
    async fn ipv6_fails_without_reply() {
        let (mut client, mut server) = tokio::io::duplex(64);
        let mut req = vec![0x05, 0x01, 0x00, 0x04];
        req.extend_from_slice(&[0u8; 18]);
        client.write_all(&req).await.unwrap();

        let err = establish_connect(&mut server, None).await.unwrap_err();
        assert!(matches!(err, Socks5Error::UnsupportedAddressType(0x04)));

        drop(server);
        let mut rest = Vec::new();
        client.read_to_end(&mut rest).await.unwrap();
        assert!(rest.is_empty());
    }

    #[tokio::test]
    async fn establish_dials_and_replies() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let (mut client, mut server) = tokio::io::duplex(64);
        client.write_all(&connect_ipv4([127, 0, 0, 1], port)).await.unwrap();

        let mut outbound = establish_connect(&mut server, None).await.unwrap();
        let (mut accepted, _) = listener.accept().await.unwrap();

        let mut reply = [0u8; REPLY_LEN];
        client.read_exact(&mut reply).await.unwrap();
        assert_eq!(reply, encode_reply(ReplyCode::Succeeded));

        outbound.write_all(b"ping").await.unwrap();
        let mut buf = [0u8; 4];
        accepted.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"ping");
    }

    #[tokio::test]
    async fn dial_timeout_is_dial_failure() {
        let (mut client, mut server) = tokio::io::duplex(64);
        // Non-routable address, nothing answers
        client
            .write_all(&connect_ipv4([10, 255, 255, 1], 80))
            .await
            .unwrap();

        let err = establish_connect(&mut server, Some(Duration::from_millis(1)))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DialFailure);
        assert!(matches!(err, Socks5Error::DialFailed { ref target, .. } if target == "10.255.255.1:80"));
    }

    #[tokio::test]
    async fn reply_write_failure_closes_destination() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let (mut client, mut server) = tokio::io::duplex(64);
        client.write_all(&connect_ipv4([127, 0, 0, 1], port)).await.unwrap();
        // Client goes away before the reply is written
        drop(client);

        let err = establish_connect(&mut server, None).await.unwrap_err();
        assert!(matches!(err, Socks5Error::ReplyWriteFailed(_)));
        assert_eq!(err.kind(), ErrorKind::IoFailure);

        let (mut accepted, _) = listener.accept().await.unwrap();
        let mut buf = [0u8; 1];
        let n = tokio::time::timeout(Duration::from_secs(2), accepted.read(&mut buf))
            .await
            .expect("destination was not closed")
            .unwrap_or(0);
        assert_eq!(n, 0);
    }

    #[tokio::test]
    async fn refused_dial_is_dial_failure() {
        // Bind then drop to get a port with nothing listening
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let (mut client, mut server) = tokio::io::duplex(64);
        client.write_all(&connect_ipv4([127, 0, 0, 1], port)).await.unwrap();

        let err = establish_connect(&mut server, None).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DialFailure);

        let mut reply = [0u8; REPLY_LEN];
        client.read_exact(&mut reply).await.unwrap();
        assert_ne!(reply[1], ReplyCode::Succeeded as u8);
    }
}
