//! UDP values source: TCode messages received on a local port.

use std::io;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};

use bevy::prelude::*;

use super::ValuesSource;
use super::tcode::{self, ParseStats};
use crate::axis::{AxisValues, DeviceAxis};
use crate::config::ConfigStore;
use crate::controls::{ControlKind, ControlRegistry};

const MAX_DATAGRAM: usize = 2048;

/// Receives TCode over UDP without ever blocking the tick.
#[derive(Debug)]
pub struct UdpValuesSource {
    port: u16,
    socket: Option<UdpSocket>,
    buffer: Vec<u8>,
    received: u64,
    skipped: u64,
    last_error: Option<String>,
}

impl UdpValuesSource {
    pub const NAME: &'static str = "Udp";
    pub const DEFAULT_PORT: u16 = 8000;
    pub const PORT_KEY: &'static str = "ValuesSource:Udp:Port";

    /// Listen on `0.0.0.0:port`. A failed bind is logged and leaves the
    /// source disconnected.
    pub fn new(port: u16) -> Self {
        let mut source = Self::disconnected(port);
        if let Err(err) = source.connect(("0.0.0.0", port)) {
            warn!("udp values source: failed to bind port {port}: {err}");
            source.last_error = Some(err.to_string());
        }
        source
    }

    /// Listen on an explicit address.
    pub fn bind(addr: impl ToSocketAddrs) -> io::Result<Self> {
        let mut source = Self::disconnected(0);
        source.connect(addr)?;
        Ok(source)
    }

    fn disconnected(port: u16) -> Self {
        Self {
            port,
            socket: None,
            buffer: vec![0; MAX_DATAGRAM],
            received: 0,
            skipped: 0,
            last_error: None,
        }
    }

    fn connect(&mut self, addr: impl ToSocketAddrs) -> io::Result<()> {
        let socket = UdpSocket::bind(addr)?;
        socket.set_nonblocking(true)?;
        self.port = socket.local_addr()?.port();
        info!("udp values source: listening on port {}", self.port);
        self.socket = Some(socket);
        self.last_error = None;
        Ok(())
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn is_connected(&self) -> bool {
        self.socket.is_some()
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.socket.as_ref().and_then(|s| s.local_addr().ok())
    }

    /// Commands applied and skipped since creation.
    pub fn stats(&self) -> ParseStats {
        ParseStats {
            applied: self.received as usize,
            skipped: self.skipped as usize,
        }
    }
}

impl ValuesSource for UdpValuesSource {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn update(&mut self, values: &mut AxisValues) -> bool {
        let Some(socket) = self.socket.as_ref() else {
            return false;
        };

        let mut updated = false;
        loop {
            match socket.recv_from(&mut self.buffer) {
                Ok((len, _)) => {
                    let message = String::from_utf8_lossy(&self.buffer[..len]);
                    let stats = tcode::parse_into(&message, values);
                    if stats.skipped > 0 {
                        debug!("udp values source: skipped {} malformed commands", stats.skipped);
                    }
                    self.received += stats.applied as u64;
                    self.skipped += stats.skipped as u64;
                    updated |= stats.applied > 0;
                }
                Err(err) if err.kind() == io::ErrorKind::WouldBlock => break,
                Err(err) => {
                    // ICMP errors surface here on some platforms; try again next tick
                    debug!("udp values source: receive failed: {err}");
                    self.last_error = Some(err.to_string());
                    break;
                }
            }
        }
        updated
    }

    fn report(&self, values: &AxisValues) -> String {
        let status = match (&self.socket, &self.last_error) {
            (Some(_), _) => format!("Udp: listening on {}", self.port),
            (None, Some(err)) => format!("Udp: not connected ({err})"),
            (None, None) => "Udp: not connected".to_owned(),
        };
        let axes: Vec<String> = DeviceAxis::ALL
            .into_iter()
            .map(|axis| format!("{axis}: {:.3}", values.get(axis)))
            .collect();
        format!(
            "{status}\nCommands: {} ok, {} skipped\n{}",
            self.received,
            self.skipped,
            axes.join("\n")
        )
    }

    fn create_controls(&self, registry: &mut ControlRegistry) {
        registry.register(Self::PORT_KEY, "Port", ControlKind::Slider);
    }

    fn destroy_controls(&self, registry: &mut ControlRegistry) {
        registry.destroy(Self::PORT_KEY);
    }

    fn store_config(&self, store: &mut ConfigStore) {
        store.set(Self::PORT_KEY, self.port);
    }
}
