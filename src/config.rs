//! Driver configuration.
//!
//! Use [`MercuryIpsBuilder`] to set up a [`MercuryIps`], either on an interface you already
//! have with [`MercuryIpsBuilder::build`] or from a VISA style resource name with
//! [`MercuryIpsBuilder::connect`].

use std::time::Duration;

use fugit::MillisDurationU32;

use crate::{
    driver::MercuryIps,
    error::{Error, Result},
    sim::Simulator,
    target::FieldLimits,
    transport::{Address, IoError, TcpTransport, Transport},
    types::Backend,
};

/// Time between ramp status polls in safe mode.
pub const DEFAULT_POLL_INTERVAL: MillisDurationU32 = MillisDurationU32::millis(100);

/// Socket timeouts. These are the only timeouts the driver has.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    pub write_timeout: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            read_timeout: Duration::from_secs(10),
            write_timeout: Duration::from_secs(5),
        }
    }
}

pub struct MercuryIpsBuilder {
    limits: FieldLimits,
    poll_interval: MillisDurationU32,
    backend: Backend,
    connection: ConnectionConfig,
}

impl Default for MercuryIpsBuilder {
    fn default() -> Self {
        Self {
            limits: Box::new(|_, _, _| true),
            poll_interval: DEFAULT_POLL_INTERVAL,
            backend: Backend::default(),
            connection: ConnectionConfig::default(),
        }
    }
}

impl MercuryIpsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict the field to the region where `limits(x, y, z)` is `true`. Unrestricted by
    /// default.
    ///
    /// Safe mode ramps only stay inside the region if it is convex.
    pub fn with_field_limits<F>(mut self, limits: F) -> Self
    where
        F: Fn(f64, f64, f64) -> bool + Send + Sync + 'static,
    {
        self.limits = Box::new(limits);
        self
    }

    pub fn with_poll_interval(mut self, interval: MillisDurationU32) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_backend(mut self, backend: Backend) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_connection(mut self, connection: ConnectionConfig) -> Self {
        self.connection = connection;
        self
    }

    /// Create the driver on an open interface.
    ///
    /// This talks to the instrument: it reads the identity and the present field, which seeds
    /// the target.
    pub fn build<S, const L: usize>(self, interface: S) -> Result<MercuryIps<S, L>, S::Error>
    where
        S: embedded_io::Read + embedded_io::Write,
    {
        MercuryIps::init(interface, self.backend, self.limits, self.poll_interval)
    }

    /// Open `resource` and create the driver on it.
    ///
    /// `resource` must be of the form `TCPIP0::<host>::<port>::SOCKET`. With
    /// [`Backend::Simulation`] it is not checked and a fresh [`Simulator`] is used instead.
    pub fn connect(self, resource: &str) -> Result<MercuryIps<Transport>, IoError> {
        let transport = match self.backend {
            Backend::Simulation => Transport::Sim(Simulator::new()),
            Backend::Socket => {
                let address = Address::parse(resource)?;
                let tcp = TcpTransport::connect(&address, &self.connection)
                    .map_err(Error::Transport)?;
                Transport::Tcp(tcp)
            }
        };
        self.build(transport)
    }
}
