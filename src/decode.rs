//! Decode one raw frame read from a TUN device.
//!
//! A frame is an IPv4 header followed by whatever the protocol field says.
//! [`decode`] reads the header fields, then dispatches on the protocol to the
//! [`tcp`] or [`udp`] view to pull out the port numbers. Everything else is
//! reported as [`DecodeError::UnsupportedOrTruncated`].
//!
//! Failures are per frame. A frame that cannot be decoded says nothing about
//! the next one, so callers should report the error and keep reading.
use crate::ipv4::{self, Protocol};
use crate::{tcp, udp};
use std::fmt;
use std::net::Ipv4Addr;

/// Why a frame, or the transport part of it, could not be decoded.
#[derive(thiserror::Error, Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum DecodeError {
    #[error("packet too short to be an IP packet ({0} bytes)")]
    TooShort(usize),
    #[error("header length {0} is below the 5 word minimum")]
    BadHeaderLen(u8),
    #[error("unsupported protocol {protocol} or packet too short")]
    UnsupportedOrTruncated { protocol: u8 },
}

/// Source and destination port of a TCP segment or UDP datagram.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub struct Ports {
    pub source: u16,
    pub dest: u16,
}

/// The decoded transport header.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum Transport {
    Tcp { ports: Ports, flags: tcp::Flags },
    Udp { ports: Ports, len: u16 },
}

impl Transport {
    /// Ports of the segment or datagram.
    #[must_use]
    pub fn ports(&self) -> Ports {
        match self {
            Self::Tcp { ports, .. } | Self::Udp { ports, .. } => *ports,
        }
    }
}

/// Everything extracted from one frame.
///
/// The IPv4 fields are always present. The transport header is only present
/// when the protocol is TCP or UDP and the frame is long enough to hold it.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub struct Report {
    pub version: u8,
    pub ihl: u8,
    pub total_len: u16,
    pub protocol: u8,
    pub source: Ipv4Addr,
    pub dest: Ipv4Addr,
    pub transport: Result<Transport, DecodeError>,
}

impl Report {
    /// Ports of the transport header, if one was decoded.
    #[must_use]
    pub fn ports(&self) -> Option<Ports> {
        self.transport.as_ref().ok().map(Transport::ports)
    }
}

/// Decode a raw frame.
///
/// # Errors
///
/// Returns [`DecodeError::TooShort`] when the frame cannot hold the fixed
/// 20 byte IPv4 header. Transport failures do not fail the whole decode;
/// they are carried in [`Report::transport`].
pub fn decode(frame: &[u8]) -> Result<Report, DecodeError> {
    let Ok(packet) = ipv4::Packet::new(frame) else {
        log::debug!("frame too short: {} bytes", frame.len());
        return Err(DecodeError::TooShort(frame.len()));
    };

    let transport = transport(&packet);
    if let Err(err) = &transport {
        log::debug!("transport not decoded: {err}");
    }

    Ok(Report {
        version: packet.version(),
        ihl: packet.ihl(),
        total_len: packet.len(),
        protocol: packet.protocol(),
        source: packet.source(),
        dest: packet.dest(),
        transport,
    })
}

fn transport(packet: &ipv4::Packet<&[u8]>) -> Result<Transport, DecodeError> {
    if packet.ihl() < ipv4::MIN_IHL {
        return Err(DecodeError::BadHeaderLen(packet.ihl()));
    }

    let protocol = packet.protocol();
    let truncated = DecodeError::UnsupportedOrTruncated { protocol };

    // payload() is empty when the IHL points past the end of the frame, so
    // the view constructors also cover that case.
    match Protocol::from(protocol) {
        Protocol::Tcp => {
            log::trace!("dispatching to tcp at offset {}", packet.header_len());
            let segment = tcp::Segment::new(packet.payload()).map_err(|_| truncated)?;
            Ok(Transport::Tcp {
                ports: Ports {
                    source: segment.source(),
                    dest: segment.dest(),
                },
                flags: segment.flags(),
            })
        }
        Protocol::Udp => {
            log::trace!("dispatching to udp at offset {}", packet.header_len());
            let datagram = udp::Datagram::new(packet.payload()).map_err(|_| truncated)?;
            Ok(Transport::Udp {
                ports: Ports {
                    source: datagram.source(),
                    dest: datagram.dest(),
                },
                len: datagram.len(),
            })
        }
        Protocol::Icmp | Protocol::Other(_) => Err(truncated),
    }
}

/// Human-readable trace lines for one decoded frame.
impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "IP Packet - Version: {}, IHL: {}, Length: {}, Protocol: {} ({})",
            self.version,
            self.ihl,
            self.total_len,
            self.protocol,
            Protocol::from(self.protocol),
        )?;
        writeln!(f, "Source IP: {}", self.source)?;
        writeln!(f, "Destination IP: {}", self.dest)?;
        match &self.transport {
            Ok(Transport::Tcp { ports, flags }) => write!(
                f,
                "TCP Packet - Source Port: {}, Destination Port: {}, Flags: {flags}",
                ports.source, ports.dest
            ),
            Ok(Transport::Udp { ports, len }) => write!(
                f,
                "UDP Packet - Source Port: {}, Destination Port: {}, Length: {len}",
                ports.source, ports.dest
            ),
            Err(err) => write!(f, "{err}"),
        }
    }
}
