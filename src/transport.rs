//! Transports for talking to a Mercury iPS from a `std` host.
//!
//! The driver itself only needs [`embedded_io::Read`] & [`embedded_io::Write`]. This module
//! wraps a [`TcpStream`] into those traits and parses the VISA style resource names the
//! instrument is usually addressed by.

use core::fmt;
use std::net::{TcpStream, ToSocketAddrs};

use embedded_io::{Read as _, Write as _};
use tracing::debug;

use crate::{config::ConnectionConfig, error::ConfigError, sim::Simulator};

/// Port the Mercury iPS listens on unless told otherwise.
pub const DEFAULT_PORT: u16 = 7020;

/// A [`std::io::Error`] usable as an [`embedded_io::Error`].
///
/// An expired socket read timeout must come out as [`embedded_io::ErrorKind::TimedOut`], which
/// the link turns into [`Error::Timeout`](crate::Error::Timeout). On unix, `std` reports that
/// expiry as [`std::io::ErrorKind::WouldBlock`] rather than `TimedOut`, so both map there. A
/// stream in blocking mode never returns `WouldBlock` otherwise.
#[derive(Debug)]
pub struct IoError(pub std::io::Error);

impl fmt::Display for IoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for IoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.0)
    }
}

impl From<std::io::Error> for IoError {
    fn from(e: std::io::Error) -> Self {
        Self(e)
    }
}

impl From<std::io::ErrorKind> for IoError {
    fn from(kind: std::io::ErrorKind) -> Self {
        Self(kind.into())
    }
}

impl embedded_io::Error for IoError {
    fn kind(&self) -> embedded_io::ErrorKind {
        match self.0.kind() {
            std::io::ErrorKind::NotFound => embedded_io::ErrorKind::NotFound,
            std::io::ErrorKind::PermissionDenied => embedded_io::ErrorKind::PermissionDenied,
            std::io::ErrorKind::ConnectionRefused => embedded_io::ErrorKind::ConnectionRefused,
            std::io::ErrorKind::ConnectionReset => embedded_io::ErrorKind::ConnectionReset,
            std::io::ErrorKind::ConnectionAborted => embedded_io::ErrorKind::ConnectionAborted,
            std::io::ErrorKind::NotConnected => embedded_io::ErrorKind::NotConnected,
            std::io::ErrorKind::AddrInUse => embedded_io::ErrorKind::AddrInUse,
            std::io::ErrorKind::AddrNotAvailable => embedded_io::ErrorKind::AddrNotAvailable,
            std::io::ErrorKind::BrokenPipe => embedded_io::ErrorKind::BrokenPipe,
            std::io::ErrorKind::AlreadyExists => embedded_io::ErrorKind::AlreadyExists,
            std::io::ErrorKind::InvalidInput => embedded_io::ErrorKind::InvalidInput,
            std::io::ErrorKind::InvalidData => embedded_io::ErrorKind::InvalidData,
            std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock => {
                embedded_io::ErrorKind::TimedOut
            }
            std::io::ErrorKind::Interrupted => embedded_io::ErrorKind::Interrupted,
            std::io::ErrorKind::Unsupported => embedded_io::ErrorKind::Unsupported,
            std::io::ErrorKind::OutOfMemory => embedded_io::ErrorKind::OutOfMemory,
            _ => embedded_io::ErrorKind::Other,
        }
    }
}

/// A parsed `TCPIP0::<host>::<port>::SOCKET` resource name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    pub host: String,
    pub port: u16,
}

impl Address {
    /// Parse a VISA socket resource name. The port may be left out, e.g.
    /// `TCPIP0::192.168.0.10::SOCKET`.
    pub fn parse(resource: &str) -> Result<Self, ConfigError> {
        let invalid = || ConfigError::InvalidAddress(resource.to_owned());

        let fields: Vec<&str> = resource.trim().split("::").collect();
        match fields.as_slice() {
            [board, host, "SOCKET"] if board.starts_with("TCPIP") && !host.is_empty() => {
                Ok(Self {
                    host: (*host).to_owned(),
                    port: DEFAULT_PORT,
                })
            }
            [board, host, port, "SOCKET"] if board.starts_with("TCPIP") && !host.is_empty() => {
                Ok(Self {
                    host: (*host).to_owned(),
                    port: port.parse().map_err(|_| invalid())?,
                })
            }
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TCPIP0::{}::{}::SOCKET", self.host, self.port)
    }
}

/// A TCP connection to the instrument.
pub struct TcpTransport(TcpStream);

impl TcpTransport {
    /// Open a connection, trying each address the host resolves to.
    pub fn connect(address: &Address, config: &ConnectionConfig) -> Result<Self, IoError> {
        let mut last_error = IoError::from(std::io::ErrorKind::AddrNotAvailable);
        for socket_addr in (address.host.as_str(), address.port).to_socket_addrs()? {
            debug!("Connecting to {socket_addr}");
            match TcpStream::connect_timeout(&socket_addr, config.connect_timeout) {
                Ok(stream) => {
                    stream.set_read_timeout(Some(config.read_timeout))?;
                    stream.set_write_timeout(Some(config.write_timeout))?;
                    stream.set_nodelay(true)?;
                    return Ok(Self(stream));
                }
                Err(e) => last_error = IoError(e),
            }
        }
        Err(last_error)
    }

    pub fn into_inner(self) -> TcpStream {
        self.0
    }
}

impl embedded_io::ErrorType for TcpTransport {
    type Error = IoError;
}

impl embedded_io::Read for TcpTransport {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        std::io::Read::read(&mut self.0, buf).map_err(IoError)
    }
}

impl embedded_io::Write for TcpTransport {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        std::io::Write::write(&mut self.0, buf).map_err(IoError)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        std::io::Write::flush(&mut self.0).map_err(IoError)
    }
}

/// Whatever [`MercuryIpsBuilder::connect`](crate::config::MercuryIpsBuilder::connect) opened.
pub enum Transport {
    Tcp(TcpTransport),
    Sim(Simulator),
}

impl embedded_io::ErrorType for Transport {
    type Error = IoError;
}

impl embedded_io::Read for Transport {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        match self {
            Transport::Tcp(tcp) => tcp.read(buf),
            Transport::Sim(sim) => sim.read(buf),
        }
    }
}

impl embedded_io::Write for Transport {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        match self {
            Transport::Tcp(tcp) => tcp.write(buf),
            Transport::Sim(sim) => sim.write(buf),
        }
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        match self {
            Transport::Tcp(tcp) => tcp.flush(),
            Transport::Sim(sim) => sim.flush(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_io::Error as _;

    #[test]
    fn test_parse_address() {
        assert_eq!(
            Address::parse("TCPIP0::192.168.0.10::7020::SOCKET"),
            Ok(Address {
                host: "192.168.0.10".into(),
                port: 7020
            })
        );
        assert_eq!(
            Address::parse("TCPIP0::magnet.lab::SOCKET").map(|a| a.port),
            Ok(DEFAULT_PORT)
        );
        assert_eq!(
            Address::parse("TCPIP0::192.168.0.10::7020::SOCKET")
                .unwrap()
                .to_string(),
            "TCPIP0::192.168.0.10::7020::SOCKET"
        );
    }

    #[test]
    fn test_reject_non_socket_address() {
        for resource in [
            "TCPIP0::192.168.0.10::inst0::INSTR",
            "GPIB0::12::INSTR",
            "TCPIP0::192.168.0.10::port::SOCKET",
            "TCPIP0::::7020::SOCKET",
        ] {
            assert_eq!(
                Address::parse(resource),
                Err(ConfigError::InvalidAddress(resource.to_owned()))
            );
        }
    }

    #[test]
    fn test_timeouts_map_to_timed_out() {
        for kind in [std::io::ErrorKind::TimedOut, std::io::ErrorKind::WouldBlock] {
            assert!(matches!(
                IoError::from(kind).kind(),
                embedded_io::ErrorKind::TimedOut
            ));
        }
        assert!(matches!(
            IoError::from(std::io::ErrorKind::ConnectionReset).kind(),
            embedded_io::ErrorKind::ConnectionReset
        ));
    }
}
