use crate::error::Socks5Error;
use crate::protocol::{AddressType, read_array, read_vec};
use std::{fmt, net::Ipv4Addr};
use tokio::io::AsyncRead;

/// TargetAddr is the destination a client asked the proxy to reach. The host
/// is either a dotted-decimal IPv4 address or an unresolved domain name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetAddr {
    pub host: String,
    pub port: u16,
}

impl fmt::Display for TargetAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// parse_address_from_stream reads DST.ADDR and DST.PORT for the given
/// address type byte. Domain names are returned as-is; resolution is left to
/// the dialer
pub async fn parse_address_from_stream<R>(stream: &mut R, atyp: u8) -> Result<TargetAddr, Socks5Error>
where
    R: AsyncRead + Unpin,
{
    let host = match AddressType::from_byte(atyp) {
        Some(AddressType::IPv4) => {
            let addr = read_array::<4, _>(stream).await?;
            Ipv4Addr::from(addr).to_string()
        }
        Some(AddressType::DomainName) => {
            // First octet in DomainName contains the number of
            // octets to follow
            let [len] = read_array::<1, _>(stream).await?;
            let domain = read_vec(stream, len as usize).await?;
            let domain_str = String::from_utf8(domain).map_err(|_| Socks5Error::InvalidDomain)?;

            // Hosts are dialed as "host:port", so a colon would turn this into an IPv6 literal
            if domain_str.contains(':') {
                return Err(Socks5Error::InvalidDomain);
            }

            domain_str
        }
        // Nothing past ATYP is consumed for IPv6
        Some(AddressType::IPv6) => return Err(Socks5Error::UnsupportedAddressType(atyp)),
        None => return Err(Socks5Error::InvalidAddressType(atyp)),
    };

    // Port -> BigEndian (network order)
    let port = u16::from_be_bytes(read_array::<2, _>(stream).await?);

    Ok(TargetAddr { host, port })
}
