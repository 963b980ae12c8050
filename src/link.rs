//! Request/response handling for the Mercury's SCPI-like command language.
//!
//! Every command is one `\n` terminated line and gets exactly one line back. The instrument
//! answers very verbosely by echoing the command, so the reply is classified and the echo
//! stripped before anyone looks at the value.
//!
//! Only one command may be in flight at a time. [`Link::query`] takes `&mut self`, which is what
//! keeps a write and its matching read together.

use embedded_io::Error as _;
use tracing::{debug, error};

use crate::{
    error::{Error, Result},
    types::Backend,
};

/// Reply to a command, classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// A write the instrument accepted. Holds the echoed value.
    Set(String),
    /// A read. Holds whatever followed the echoed command.
    Read(String),
    /// The instrument refused the command. Holds the raw reply.
    Invalid(String),
}

impl Reply {
    /// Classify `response` as the reply to `cmd`.
    pub fn classify(cmd: &str, response: &str) -> Self {
        if response.contains("INVALID") {
            error!("Invalid command. Got response: {response}");
            Reply::Invalid(response.to_owned())
        } else if response.ends_with("VALID") {
            // STAT:SET:DEV:GRPX:PSU:SIG:FSET:0.5:VALID
            let echoed = response.rsplit(':').nth(1).unwrap_or_default();
            Reply::Set(echoed.to_owned())
        } else {
            // '*IDN?' is the only command not echoed back like this, and it falls through as is.
            let echo = format!("STAT:{}", cmd.strip_prefix("READ:").unwrap_or(cmd));
            let payload = response.strip_prefix(echo.as_str()).unwrap_or(response);
            Reply::Read(payload.to_owned())
        }
    }

    pub fn payload(&self) -> &str {
        match self {
            Reply::Set(payload) | Reply::Read(payload) | Reply::Invalid(payload) => payload,
        }
    }

    pub fn into_payload(self) -> String {
        match self {
            Reply::Set(payload) | Reply::Read(payload) | Reply::Invalid(payload) => payload,
        }
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, Reply::Invalid(_))
    }
}

/// Line oriented link to the instrument over any [`embedded_io`] interface.
///
/// `L` is the size of the receive buffer; a single reply must fit in it.
pub struct Link<S: embedded_io::Read + embedded_io::Write, const L: usize = 256> {
    interface: S,
    backend: Backend,
    /// Bytes received but not yet consumed as a line.
    read_buf: heapless::Vec<u8, L>,
}

impl<S: embedded_io::Read + embedded_io::Write, const L: usize> Link<S, L> {
    pub fn new(interface: S, backend: Backend) -> Self {
        Self {
            interface,
            backend,
            read_buf: heapless::Vec::new(),
        }
    }

    pub fn backend(&self) -> Backend {
        self.backend
    }

    pub fn interface(&self) -> &S {
        &self.interface
    }

    pub fn interface_mut(&mut self) -> &mut S {
        &mut self.interface
    }

    pub fn into_inner(self) -> S {
        self.interface
    }

    /// Send a command and return the useful part of the reply.
    ///
    /// An `INVALID` reply is logged and returned raw; it is not an error here.
    pub fn ask(&mut self, cmd: &str) -> Result<String, S::Error> {
        Ok(self.query(cmd)?.into_payload())
    }

    /// Send a command and return the classified reply.
    pub fn query(&mut self, cmd: &str) -> Result<Reply, S::Error> {
        debug!("Writing to instrument: {cmd}");
        self.write_line(cmd)?;
        let response = self.read_line()?;
        debug!("Got instrument response: {response}");
        let reply = Reply::classify(cmd, &response);
        if matches!(reply, Reply::Set(_)) && !Self::echoes_item(cmd, &response) {
            error!("Reply {response:?} does not belong to {cmd:?}");
            return Err(Error::InvalidResponse(response));
        }
        Ok(reply)
    }

    /// Whether `response` echoes the item `cmd` wrote to. The value may differ, the instrument
    /// rounds it.
    fn echoes_item(cmd: &str, response: &str) -> bool {
        let item = cmd.rsplit_once(':').map_or(cmd, |(item, _)| item);
        response.starts_with(&format!("STAT:{item}:"))
    }

    fn write_line(&mut self, cmd: &str) -> Result<(), S::Error> {
        self.interface
            .write_all(cmd.as_bytes())
            .map_err(Error::Transport)?;
        self.interface.write_all(b"\n").map_err(Error::Transport)?;
        self.interface.flush().map_err(Error::Transport)
    }

    /// Read one `\n` terminated line, without the terminator.
    fn read_line(&mut self) -> Result<String, S::Error> {
        let mut scanned = 0;
        loop {
            if let Some(pos) = self.read_buf[scanned..].iter().position(|&b| b == b'\n') {
                let end = scanned + pos;
                let line = String::from_utf8(self.read_buf[..end].to_vec());
                self.drop_first(end + 1);
                return match line {
                    Ok(line) => Ok(line.trim_end_matches('\r').to_owned()),
                    Err(e) => Err(Error::InvalidResponse(
                        String::from_utf8_lossy(e.as_bytes()).into_owned(),
                    )),
                };
            }
            scanned = self.read_buf.len();

            let mut temp_buf = [0u8; 64];
            let bytes_read = match self.interface.read(&mut temp_buf) {
                Ok(0) => return Err(Error::ConnectionClosed),
                Ok(bytes_read) => bytes_read,
                Err(e) if matches!(e.kind(), embedded_io::ErrorKind::TimedOut) => {
                    // Whatever arrived so far belongs to this command, not the next one.
                    self.read_buf.clear();
                    return Err(Error::Timeout);
                }
                Err(e) => return Err(Error::Transport(e)),
            };
            if self
                .read_buf
                .extend_from_slice(&temp_buf[..bytes_read])
                .is_err()
            {
                // Resynchronising mid-line is not possible, drop everything.
                self.read_buf.clear();
                return Err(Error::BufferOverflow);
            }
        }
    }

    /// Drop the first `n` bytes of the receive buffer.
    fn drop_first(&mut self, n: usize) {
        if n >= self.read_buf.len() {
            self.read_buf.clear();
        } else {
            self.read_buf.rotate_left(n);
            let remaining = self.read_buf.len() - n;
            self.read_buf.truncate(remaining);
        }
    }
}
