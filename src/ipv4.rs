//! IPv4 header parsing.
//!
//! ## Standards conformance
//!
//! Field offsets follow the [RFC
//! 791](https://datatracker.ietf.org/doc/html/rfc791) header format. Only the
//! fields needed to identify a flow are exposed; the type-of-service byte, the
//! fragmentation fields and the options are left alone, and the header
//! checksum is never verified.
use crate::{Error, Result};
use byteorder::{ByteOrder, NetworkEndian};
use std::fmt;
use std::net::Ipv4Addr;

/// An IPv4 packet.
///
/// This struct wraps a byte buffer directly. Nothing is parsed until the field
/// accessor methods are called, like [`Packet::dest`]. Header values are
/// passed as copies, and the payload is always referred to by reference.
///
/// See the module documentation for more information.
#[derive(Debug, PartialEq, Eq, Clone, Hash)]
pub struct Packet<B: AsRef<[u8]>> {
    buf: B,
}

impl<B: AsRef<[u8]>> Packet<B> {
    /// Create a new IP packet.
    ///
    /// # Errors
    ///
    /// Fails when the buffer is shorter than [`MIN_HEADER_LEN`] bytes, but
    /// does no other validation. In particular the IHL field is not checked
    /// against the buffer length; use [`Packet::header_len`] for that.
    #[inline]
    #[must_use]
    pub fn new(buf: B) -> Result<Self> {
        if buf.as_ref().len() >= MIN_HEADER_LEN {
            Ok(Self { buf })
        } else {
            Err(Error::CannotParse("packet too small"))
        }
    }

    /// Extract the version.
    #[inline]
    #[must_use]
    pub fn version(&self) -> u8 {
        self.buf.as_ref()[offsets::VERSION_IHL] >> 4
    }

    /// Extract the raw IHL field, which counts the header length in
    /// increments of [`u32`].
    #[inline]
    #[must_use]
    pub fn ihl(&self) -> u8 {
        self.buf.as_ref()[offsets::VERSION_IHL] & 0xF
    }

    /// Length of the header in bytes.
    #[inline]
    #[must_use]
    pub fn header_len(&self) -> usize {
        usize::from(self.ihl()) * std::mem::size_of::<u32>()
    }

    /// Extract the total length.
    #[inline]
    #[must_use]
    pub fn len(&self) -> u16 {
        NetworkEndian::read_u16(&self.buf.as_ref()[offsets::LEN])
    }

    /// Extract the identification bits.
    #[inline]
    #[must_use]
    pub fn id(&self) -> u16 {
        NetworkEndian::read_u16(&self.buf.as_ref()[offsets::ID])
    }

    /// Extract the time-to-live (TTL).
    #[inline]
    #[must_use]
    pub fn ttl(&self) -> u8 {
        self.buf.as_ref()[offsets::TTL]
    }

    /// Extract the protocol identifier.
    #[inline]
    #[must_use]
    pub fn protocol(&self) -> u8 {
        self.buf.as_ref()[offsets::PROTOCOL]
    }

    /// Extract the source address.
    #[inline]
    #[must_use]
    pub fn source(&self) -> Ipv4Addr {
        let data = self.buf.as_ref();
        Ipv4Addr::from(NetworkEndian::read_u32(&data[offsets::SOURCE]))
    }

    /// Extract the destination address.
    #[inline]
    #[must_use]
    pub fn dest(&self) -> Ipv4Addr {
        let data = self.buf.as_ref();
        Ipv4Addr::from(NetworkEndian::read_u32(&data[offsets::DEST]))
    }

    /// Extract the payload, starting right after the header.
    ///
    /// Empty when the IHL field points past the end of the buffer.
    #[inline]
    #[must_use]
    pub fn payload(&self) -> &[u8] {
        self.buf.as_ref().get(self.header_len()..).unwrap_or_default()
    }
}

mod offsets {
    use std::ops::Range;
    pub(crate) const VERSION_IHL: usize = 0;
    pub(crate) const LEN: Range<usize> = 2..4;
    pub(crate) const ID: Range<usize> = 4..6;
    pub(crate) const TTL: usize = 8;
    pub(crate) const PROTOCOL: usize = 9;
    pub(crate) const SOURCE: Range<usize> = 12..16;
    pub(crate) const DEST: Range<usize> = 16..20;
}

/// Transport protocols carried in the IPv4 protocol field.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum Protocol {
    Icmp,
    Tcp,
    Udp,
    Other(u8),
}

impl From<u8> for Protocol {
    fn from(value: u8) -> Self {
        match value {
            1 => Self::Icmp,
            6 => Self::Tcp,
            17 => Self::Udp,
            other => Self::Other(other),
        }
    }
}

impl From<Protocol> for u8 {
    fn from(value: Protocol) -> Self {
        match value {
            Protocol::Icmp => 1,
            Protocol::Tcp => 6,
            Protocol::Udp => 17,
            Protocol::Other(other) => other,
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Icmp => write!(f, "ICMP"),
            Self::Tcp => write!(f, "TCP"),
            Self::Udp => write!(f, "UDP"),
            Self::Other(_) => write!(f, "unknown"),
        }
    }
}

/// Minimum length of an IPv4 header.
pub const MIN_HEADER_LEN: usize = 20;

/// Smallest IHL value that can describe a complete header.
pub const MIN_IHL: u8 = 5;
