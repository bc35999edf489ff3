//! Sources of raw frames.
//!
//! [`FrameSource`] is the seam between the decoder and the operating system.
//! On Linux, [`Tun`] allocates a kernel TUN interface configured without the
//! packet information prefix, so every read yields one bare IP packet.
//! [`Replay`] hands out canned frames instead, which is what the tests and the
//! `--replay` flag use.
//!
//! [`Capture`] owns a source together with the fixed-size read buffer, and is
//! the only state carried from one frame to the next.
use crate::{Error, Result};
use std::collections::VecDeque;
use std::path::Path;

/// Default read buffer size, matching the usual Ethernet MTU.
pub const DEFAULT_MTU: usize = 1500;

/// Something that yields raw frames, one per call.
pub trait FrameSource {
    /// Block until a frame arrives and copy it into `buf`.
    ///
    /// Returns the number of bytes written, or `None` once the source has no
    /// more frames to give.
    ///
    /// # Errors
    ///
    /// Any error is fatal for the source.
    fn recv(&mut self, buf: &mut [u8]) -> Result<Option<usize>>;

    /// Name of the interface the frames come from.
    fn name(&self) -> &str;
}

/// A frame source paired with the buffer frames are read into.
pub struct Capture<S: FrameSource> {
    source: S,
    buf: Vec<u8>,
}

impl<S: FrameSource> Capture<S> {
    /// Create a new [`Capture`] reading frames of at most `mtu` bytes.
    ///
    /// # Errors
    ///
    /// Fails when `mtu` cannot hold a minimal IPv4 header.
    pub fn new(source: S, mtu: usize) -> Result<Self> {
        if mtu < crate::ipv4::MIN_HEADER_LEN {
            return Err(Error::CannotParse("mtu smaller than an ipv4 header"));
        }

        Ok(Self {
            source,
            buf: vec![0; mtu],
        })
    }

    /// Read the next frame. The returned slice is only valid until the next
    /// call.
    ///
    /// # Errors
    ///
    /// Propagates the source's read error.
    pub fn next_frame(&mut self) -> Result<Option<&[u8]>> {
        match self.source.recv(&mut self.buf)? {
            Some(n) => Ok(Some(&self.buf[..n])),
            None => Ok(None),
        }
    }

    /// The underlying frame source.
    #[must_use]
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Size of the read buffer.
    #[must_use]
    pub fn mtu(&self) -> usize {
        self.buf.len()
    }
}

/// Replays a fixed sequence of frames, then reports end of stream.
///
/// Frames larger than the read buffer are truncated, the same way a read from
/// a real device would be.
#[derive(Debug, Clone, Default)]
pub struct Replay {
    frames: VecDeque<Vec<u8>>,
}

impl Replay {
    /// Create a new [`Replay`] from in-memory frames.
    pub fn new<I>(frames: I) -> Self
    where
        I: IntoIterator<Item = Vec<u8>>,
    {
        Self {
            frames: frames.into_iter().collect(),
        }
    }

    /// Load one frame per file, in order.
    ///
    /// # Errors
    ///
    /// Fails when any of the files cannot be read.
    pub fn from_files<P: AsRef<Path>>(paths: &[P]) -> Result<Self> {
        let frames = paths
            .iter()
            .map(|path| std::fs::read(path).map_err(Error::IoError))
            .collect::<Result<VecDeque<_>>>()?;
        Ok(Self { frames })
    }

    /// Number of frames not yet handed out.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl FrameSource for Replay {
    fn recv(&mut self, buf: &mut [u8]) -> Result<Option<usize>> {
        let Some(frame) = self.frames.pop_front() else {
            return Ok(None);
        };

        let n = frame.len().min(buf.len());
        buf[..n].copy_from_slice(&frame[..n]);
        Ok(Some(n))
    }

    fn name(&self) -> &str {
        "replay"
    }
}

#[cfg(target_os = "linux")]
pub use linux::Tun;

#[cfg(target_os = "linux")]
mod linux {
    use super::FrameSource;
    use crate::{Error, Result};
    use std::fs::{File, OpenOptions};
    use std::io::{self, Read};
    use std::os::fd::AsRawFd;

    const TUN_PATH: &str = "/dev/net/tun";

    // _IOW('T', 202, int)
    const TUNSETIFF: u32 = 0x4004_54ca;

    const IFF_TUN: libc::c_short = 0x0001;
    const IFF_NO_PI: libc::c_short = 0x1000;

    /// The kernel's `struct ifreq` as used by `TUNSETIFF`: the interface name
    /// followed by the flags at byte 16, padded out to the full union size.
    #[repr(C)]
    pub(super) struct IfReq {
        name: [u8; libc::IFNAMSIZ],
        // Only read back by the kernel.
        #[allow(dead_code)]
        flags: libc::c_short,
        _pad: [u8; 22],
    }

    const _: () = assert!(std::mem::size_of::<IfReq>() == 40);

    impl IfReq {
        pub(super) fn new(name: &str, flags: libc::c_short) -> Result<Self> {
            let bytes = name.as_bytes();
            if bytes.len() >= libc::IFNAMSIZ || bytes.contains(&0) {
                return Err(Error::DeviceUnavailable(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("invalid interface name {name:?}"),
                )));
            }

            let mut req = Self {
                name: [0; libc::IFNAMSIZ],
                flags,
                _pad: [0; 22],
            };
            req.name[..bytes.len()].copy_from_slice(bytes);
            Ok(req)
        }

        pub(super) fn name(&self) -> String {
            let end = self
                .name
                .iter()
                .position(|&b| b == 0)
                .unwrap_or(self.name.len());
            String::from_utf8_lossy(&self.name[..end]).into_owned()
        }
    }

    /// A Linux TUN interface.
    ///
    /// The interface is removed by the kernel when the handle is dropped,
    /// unless it was made persistent elsewhere.
    #[derive(Debug)]
    pub struct Tun {
        file: File,
        name: String,
    }

    impl Tun {
        /// Allocate (or attach to) the TUN interface called `name`.
        ///
        /// An empty name lets the kernel pick one; see [`FrameSource::name`]
        /// for the name it chose.
        ///
        /// # Errors
        ///
        /// Returns [`Error::DeviceUnavailable`] when the name is not a valid
        /// interface name, when the clone device cannot be opened, or when
        /// the kernel rejects the configuration call. Usually the latter two
        /// mean the process lacks `CAP_NET_ADMIN`.
        pub fn open(name: &str) -> Result<Self> {
            let mut req = IfReq::new(name, IFF_TUN | IFF_NO_PI)?;

            let file = OpenOptions::new()
                .read(true)
                .write(true)
                .open(TUN_PATH)
                .map_err(Error::DeviceUnavailable)?;

            // The request struct outlives the call and has the layout the
            // kernel expects for TUNSETIFF.
            let rc = unsafe {
                libc::ioctl(
                    file.as_raw_fd(),
                    TUNSETIFF as _,
                    std::ptr::addr_of_mut!(req),
                )
            };
            if rc < 0 {
                return Err(Error::DeviceUnavailable(io::Error::last_os_error()));
            }

            let name = req.name();
            log::info!("opened tun interface {name}");
            Ok(Self { file, name })
        }
    }

    impl FrameSource for Tun {
        fn recv(&mut self, buf: &mut [u8]) -> Result<Option<usize>> {
            loop {
                match self.file.read(buf) {
                    Ok(n) => return Ok(Some(n)),
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    Err(e) => return Err(Error::IoError(e)),
                }
            }
        }

        fn name(&self) -> &str {
            &self.name
        }
    }

    #[cfg(test)]
    mod tests {
        use super::{IfReq, IFF_NO_PI, IFF_TUN};
        use crate::Error;

        #[test]
        fn ifreq_places_flags_after_name() {
            assert_eq!(std::mem::offset_of!(IfReq, flags), 16);
        }

        #[test]
        fn ifreq_copies_name_and_flags() -> crate::Result<()> {
            let req = IfReq::new("tun0", IFF_TUN | IFF_NO_PI)?;
            assert_eq!(&req.name[..5], b"tun0\0");
            assert_eq!(req.flags, 0x1001);
            assert_eq!(req.name(), "tun0");
            Ok(())
        }

        #[test]
        fn ifreq_rejects_long_name() {
            let req = IfReq::new("a-very-long-name0", IFF_TUN);
            assert!(matches!(req, Err(Error::DeviceUnavailable(_))));
        }

        #[test]
        fn ifreq_rejects_nul_in_name() {
            let req = IfReq::new("tun\0", IFF_TUN);
            assert!(matches!(req, Err(Error::DeviceUnavailable(_))));
        }

        #[test]
        fn ifreq_accepts_longest_name() -> crate::Result<()> {
            let req = IfReq::new("abcdefghijklmno", IFF_TUN)?;
            assert_eq!(req.name(), "abcdefghijklmno");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Capture, FrameSource, Replay};
    use std::error::Error;

    #[test]
    fn capture_rejects_tiny_mtu() {
        let capture = Capture::new(Replay::default(), 19);
        assert!(capture.is_err());
    }

    #[test]
    fn capture_yields_frames_in_order() -> Result<(), Box<dyn Error>> {
        let mut capture = Capture::new(Replay::new([vec![1, 2, 3], vec![], vec![4]]), 1500)?;
        assert_eq!(capture.next_frame()?, Some(&[1, 2, 3][..]));
        assert_eq!(capture.next_frame()?, Some(&[][..]));
        assert_eq!(capture.next_frame()?, Some(&[4][..]));
        assert_eq!(capture.next_frame()?, None);
        Ok(())
    }

    #[test]
    fn capture_truncates_to_mtu() -> Result<(), Box<dyn Error>> {
        let mut capture = Capture::new(Replay::new([vec![7; 64]]), 20)?;
        assert_eq!(capture.mtu(), 20);
        assert_eq!(capture.next_frame()?.map(<[u8]>::len), Some(20));
        Ok(())
    }

    #[test]
    fn replay_counts_remaining_frames() -> Result<(), Box<dyn Error>> {
        let mut replay = Replay::new([vec![0], vec![1]]);
        let mut buf = [0; 4];
        assert_eq!(replay.remaining(), 2);
        replay.recv(&mut buf)?;
        assert_eq!(replay.remaining(), 1);
        assert_eq!(replay.name(), "replay");
        Ok(())
    }

    #[test]
    fn replay_from_missing_file_fails() {
        let replay = Replay::from_files(&["/nonexistent/tunpeek-frame.bin"]);
        assert!(replay.is_err());
    }
}
