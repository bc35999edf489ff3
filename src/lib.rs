//! Inspect the IP traffic flowing through a TUN interface.
//!
//! The crate has a thin device layer, a pure decoder and the loop joining them:
//!
//! * [`device`] opens a kernel TUN interface (or replays canned frames) and
//!   hands out one raw frame at a time through [`device::Capture`].
//! * [`decode`] turns one raw frame into a [`decode::Report`] with the IPv4
//!   addressing fields and, for TCP and UDP, the port numbers.
//! * [`inspect`] ties the two together: read a frame, decode it, print the
//!   trace, repeat.
//!
//! ## Performance
//!
//! Decoding never allocates heap memory. The header views in [`ipv4`],
//! [`tcp`] and [`udp`] wrap a borrowed byte slice and only read a field when
//! its accessor is called. Lengths are checked once in each constructor, so
//! the accessors can index directly into the buffer.
//!
//! Fields are returned by value (i.e. copied) when they are small, like an IPv4
//! address or a port number.
#![warn(clippy::pedantic)]
#![allow(clippy::double_must_use)]
#![allow(clippy::len_without_is_empty)]
#![allow(clippy::module_name_repetitions)]

pub mod decode;
pub mod device;
pub mod inspect;
pub mod ipv4;
pub mod tcp;
pub mod udp;

/// Utility wrapper for results that can hit a fatal error.
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong outside of decoding a single frame.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid argument: {0}")]
    CannotParse(&'static str),
    #[error("device unavailable: {0}")]
    DeviceUnavailable(std::io::Error),
    #[error("io error: {0}")]
    IoError(std::io::Error),
}

// Check if the nth bit is set
#[inline]
#[must_use]
pub(crate) fn bitset(byte: u8, n: usize) -> bool {
    byte & (1 << n) != 0
}
