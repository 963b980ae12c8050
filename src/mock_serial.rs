//! We use this mocking module in unit tests to emulate the instrument socket with scripted
//! replies.

use std::collections::VecDeque;

/// Our mock type used to emulate the socket.
pub struct MockSerial {
    /// Everything written to the mock.
    write_buffer: Vec<u8>,
    /// Pre-configured reply bytes, consumed by reads.
    read_buffer: VecDeque<u8>,
    /// Flag to simulate write errors
    should_error_on_write: bool,
    /// Flag to simulate read errors
    should_error_on_read: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum MockSerialError {
    /// Nothing left to read.
    #[error("simulated timeout")]
    Timeout,
    /// Generic simulated error for testing
    #[error("simulated error")]
    SimulatedError,
}

impl embedded_io::Error for MockSerialError {
    fn kind(&self) -> embedded_io::ErrorKind {
        match self {
            MockSerialError::Timeout => embedded_io::ErrorKind::TimedOut,
            MockSerialError::SimulatedError => embedded_io::ErrorKind::Other,
        }
    }
}

impl embedded_io::ErrorType for MockSerial {
    type Error = MockSerialError;
}

impl embedded_io::Write for MockSerial {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        if self.should_error_on_write {
            return Err(MockSerialError::SimulatedError);
        }
        self.write_buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        if self.should_error_on_write {
            return Err(MockSerialError::SimulatedError);
        }
        Ok(())
    }
}

impl embedded_io::Read for MockSerial {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        if self.should_error_on_read {
            return Err(MockSerialError::SimulatedError);
        }
        if self.read_buffer.is_empty() {
            return Err(MockSerialError::Timeout);
        }

        let bytes_to_read = core::cmp::min(buf.len(), self.read_buffer.len());
        for (slot, byte) in buf.iter_mut().zip(self.read_buffer.drain(..bytes_to_read)) {
            *slot = byte;
        }
        Ok(bytes_to_read)
    }
}

impl MockSerial {
    /// Create a new MockSerial instance with empty buffers
    pub fn new() -> Self {
        Self {
            write_buffer: Vec::new(),
            read_buffer: VecDeque::new(),
            should_error_on_write: false,
            should_error_on_read: false,
        }
    }

    /// Queue one reply line. The terminator is added for you.
    pub fn push_reply(&mut self, line: &str) {
        self.push_raw(line.as_bytes());
        self.push_raw(b"\n");
    }

    /// Queue raw bytes to be read.
    pub fn push_raw(&mut self, data: &[u8]) {
        self.read_buffer.extend(data.iter().copied());
    }

    /// Get a reference to the data that was written to this mock
    pub fn written_data(&self) -> &[u8] {
        &self.write_buffer
    }

    /// Lines written so far, without terminators.
    pub fn written_lines(&self) -> Vec<String> {
        String::from_utf8_lossy(&self.write_buffer)
            .lines()
            .map(str::to_owned)
            .collect()
    }

    /// Configure whether write operations should fail with an error
    pub fn set_write_error(&mut self, should_error: bool) {
        self.should_error_on_write = should_error;
    }

    /// Configure whether read operations should fail with an error
    pub fn set_read_error(&mut self, should_error: bool) {
        self.should_error_on_read = should_error;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_io::{Error, Read, Write};

    #[test]
    fn test_write_multiple_times() {
        let mut mock = MockSerial::new();
        mock.write(b"READ:DEV:").unwrap();
        mock.write(b"GRPX:PSU:SIG:FLD\n").unwrap();
        assert_eq!(mock.written_data(), b"READ:DEV:GRPX:PSU:SIG:FLD\n");
        assert_eq!(mock.written_lines(), ["READ:DEV:GRPX:PSU:SIG:FLD"]);
    }

    #[test]
    fn test_read_partial_data() {
        let mut mock = MockSerial::new();
        mock.push_reply("STAT:HOLD");

        let mut buffer = [0u8; 5];
        assert_eq!(mock.read(&mut buffer).unwrap(), 5);
        assert_eq!(&buffer, b"STAT:");

        let mut buffer = [0u8; 16];
        assert_eq!(mock.read(&mut buffer).unwrap(), 5);
        assert_eq!(&buffer[..5], b"HOLD\n");
    }

    #[test]
    fn test_read_timeout_when_no_data() {
        let mut mock = MockSerial::new();
        let mut buffer = [0u8; 10];
        let result = mock.read(&mut buffer);
        assert!(matches!(result, Err(MockSerialError::Timeout)));
    }

    #[test]
    fn test_error_flags() {
        let mut mock = MockSerial::new();
        mock.set_write_error(true);
        assert!(mock.write(b"test").is_err());
        assert!(mock.flush().is_err());
        assert!(mock.written_data().is_empty());

        mock.push_reply("data");
        mock.set_read_error(true);
        let mut buffer = [0u8; 10];
        assert!(matches!(
            mock.read(&mut buffer),
            Err(MockSerialError::SimulatedError)
        ));
    }

    #[test]
    fn test_error_kinds() {
        assert!(matches!(
            MockSerialError::Timeout.kind(),
            embedded_io::ErrorKind::TimedOut
        ));
        assert!(matches!(
            MockSerialError::SimulatedError.kind(),
            embedded_io::ErrorKind::Other
        ));
    }
}
