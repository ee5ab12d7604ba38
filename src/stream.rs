//! Non-blocking TCP stream construction.
//!
//! The engine itself is transport agnostic and works over any
//! `Read + Write`. This module provides the way a real endpoint obtains
//! such a stream: a TCP socket configured non-blocking before connect, so
//! no receive call can ever stall the calling task.

use std::fmt::{Display, Formatter};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::{io, vec};

use socket2::{Domain, Protocol, Socket, Type};
use url::{ParseError, Url};

#[cfg(target_os = "linux")]
const EINPROGRESS: i32 = 115;
#[cfg(target_os = "macos")]
const EINPROGRESS: i32 = 36;

/// Remote endpoint address.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct ConnectionInfo {
    host: String,
    port: u16,
}

impl ConnectionInfo {
    pub fn new(host: impl AsRef<str>, port: u16) -> Self {
        Self {
            host: host.as_ref().to_string(),
            port,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Creates a non-blocking `TcpStream` connected to this endpoint. The
    /// socket has `TCP_NODELAY` and keepalive enabled; `EINPROGRESS` is
    /// expected on a non-blocking connect and not treated as an error.
    pub fn into_tcp_stream(self) -> io::Result<TcpStream> {
        let socket_addr = self
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| io::Error::other("unable to resolve socket address"))?;

        let socket = Socket::new(
            match &socket_addr {
                SocketAddr::V4(_) => Domain::IPV4,
                SocketAddr::V6(_) => Domain::IPV6,
            },
            Type::STREAM,
            Some(Protocol::TCP),
        )?;
        socket.set_nonblocking(true)?;
        socket.set_nodelay(true)?;
        socket.set_keepalive(true)?;

        match socket.connect(&socket_addr.into()) {
            Ok(()) => Ok(socket.into()),
            Err(err) if err.raw_os_error() == Some(EINPROGRESS) => Ok(socket.into()),
            Err(err) => Err(err),
        }
    }
}

impl ToSocketAddrs for ConnectionInfo {
    type Iter = vec::IntoIter<SocketAddr>;

    fn to_socket_addrs(&self) -> io::Result<Self::Iter> {
        format!("{}:{}", self.host, self.port).to_socket_addrs()
    }
}

impl Display for ConnectionInfo {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

impl From<(&str, u16)> for ConnectionInfo {
    fn from(host_and_port: (&str, u16)) -> Self {
        let (host, port) = host_and_port;
        Self::new(host, port)
    }
}

impl TryFrom<Url> for ConnectionInfo {
    type Error = io::Error;

    fn try_from(url: Url) -> Result<Self, Self::Error> {
        Ok(ConnectionInfo {
            host: url
                .host_str()
                .ok_or_else(|| io::Error::other("host not present"))?
                .to_owned(),
            port: url
                .port_or_known_default()
                .ok_or_else(|| io::Error::other("port not present"))?,
        })
    }
}

impl TryFrom<Result<Url, ParseError>> for ConnectionInfo {
    type Error = io::Error;

    fn try_from(result: Result<Url, ParseError>) -> Result<Self, Self::Error> {
        match result {
            Ok(url) => url.try_into(),
            Err(err) => Err(io::Error::other(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_create_connection_info_from_url() {
        let info: ConnectionInfo = Url::parse("ws://example.com:8080/stream").unwrap().try_into().unwrap();
        assert_eq!(ConnectionInfo::new("example.com", 8080), info);
    }

    #[test]
    fn should_use_known_default_ports() {
        let ws: ConnectionInfo = Url::parse("ws://example.com/stream").unwrap().try_into().unwrap();
        assert_eq!(80, ws.port());

        let wss: ConnectionInfo = Url::parse("wss://example.com/stream").unwrap().try_into().unwrap();
        assert_eq!(443, wss.port());
    }

    #[test]
    fn should_display_host_and_port() {
        assert_eq!("example.com:80", ConnectionInfo::new("example.com", 80).to_string());
    }
}
