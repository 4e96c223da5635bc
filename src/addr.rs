use std::fmt;
use std::net::{IpAddr, SocketAddr};
use tokio::net::lookup_host;
use crate::error::{Error, ErrorKind, Result};

/// Transport protocol of an endpoint.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Net {
    Tcp,
    Udp,
}

/// A resolved network endpoint: transport protocol plus socket address.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct NetAddr {
    net:  Net,
    addr: SocketAddr,
}

impl Net {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tcp => "tcp",
            Self::Udp => "udp",
        }
    }
}

impl NetAddr {
    pub fn new(net: Net, addr: SocketAddr) -> Self {
        Self { net, addr }
    }

    pub fn network(&self) -> Net {
        self.net
    }

    pub fn socket_addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn ip(&self) -> IpAddr {
        self.addr.ip()
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }
}

/// Splits a "host:port" string at its last colon.
///
/// An empty host stands for the wildcard address. The port must be a
/// decimal number no greater than 65535.
pub fn split_host_port(addr: &str) -> Result<(&str, u16)> {
    let index = addr.rfind(':').ok_or_else(Error::invalid_addr)?;

    let host = &addr[..index];
    let port = &addr[index + 1..];
    let port = port.parse().map_err(|_| Error::invalid_addr())?;

    let host = match host {
        "" => "0.0.0.0",
        _  => host,
    };

    Ok((host, port))
}

/// Resolves a "host:port" string to an IPv4 endpoint of the given
/// protocol.
///
/// Hostnames go through the system resolver and only the first IPv4
/// record is used. IPv6 is not supported.
pub async fn resolve(net: Net, addr: &str) -> Result<NetAddr> {
    let (host, port) = split_host_port(addr)?;

    if let Ok(ip) = host.parse::<IpAddr>() {
        return match ip {
            IpAddr::V4(..) => Ok(NetAddr::new(net, SocketAddr::new(ip, port))),
            IpAddr::V6(..) => Err(unresolved(host)),
        };
    }

    let mut addrs = lookup_host((host, port)).await.map_err(|e| {
        Error::with_cause(ErrorKind::Resolve, format!("cannot resolve address: {}", host), e)
    })?;

    let addr = addrs.find(SocketAddr::is_ipv4).ok_or_else(|| unresolved(host))?;

    Ok(NetAddr::new(net, addr))
}

fn unresolved(host: &str) -> Error {
    Error::new(ErrorKind::Resolve, format!("cannot resolve address: {}", host))
}

impl fmt::Display for Net {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.as_str().fmt(f)
    }
}

impl fmt::Display for NetAddr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.addr.fmt(f)
    }
}
