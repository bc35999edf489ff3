//! The read, decode, print loop.
use crate::decode::decode;
use crate::device::{Capture, FrameSource};
use crate::{Error, Result};
use std::fmt;
use std::io::Write;

/// What to print for every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    /// Print the `Read N bytes: ..` line with a hex dump of the frame.
    pub hexdump: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self { hexdump: true }
    }
}

/// Counters for a finished run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Summary {
    /// Frames read from the source.
    pub frames: u64,
    /// Frames whose transport header was decoded.
    pub decoded: u64,
    /// Frames that were too short, or whose transport header was not decoded.
    pub failed: u64,
}

/// Read frames until the source runs dry, writing one trace block per frame
/// to `out`.
///
/// Decode failures are written to the trace and counted; they never stop the
/// loop.
///
/// # Errors
///
/// Fails on the first read error from the source, or when `out` cannot be
/// written to.
pub fn inspect<S, W>(capture: &mut Capture<S>, out: &mut W, opts: Options) -> Result<Summary>
where
    S: FrameSource,
    W: Write,
{
    let mut summary = Summary::default();

    while let Some(frame) = capture.next_frame()? {
        summary.frames += 1;

        if opts.hexdump {
            writeln!(out, "Read {} bytes: {}", frame.len(), Hex(frame)).map_err(Error::IoError)?;
        }

        match decode(frame) {
            Ok(report) => {
                if report.transport.is_ok() {
                    summary.decoded += 1;
                } else {
                    summary.failed += 1;
                }
                writeln!(out, "{report}").map_err(Error::IoError)?;
            }
            Err(err) => {
                summary.failed += 1;
                writeln!(out, "{err}").map_err(Error::IoError)?;
            }
        }
    }

    log::info!(
        "{} frames read, {} decoded, {} failed",
        summary.frames,
        summary.decoded,
        summary.failed
    );
    Ok(summary)
}

// Space separated lowercase hex bytes.
struct Hex<'a>(&'a [u8]);

impl fmt::Display for Hex<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, byte) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{inspect, Hex, Options, Summary};
    use crate::device::{Capture, Replay};
    use std::error::Error;

    #[test]
    fn hex_formats_bytes_with_spaces() {
        assert_eq!(Hex(&[0x45, 0x00, 0xff]).to_string(), "45 00 ff");
        assert_eq!(Hex(&[]).to_string(), "");
    }

    #[test]
    fn inspect_reports_short_frame_and_continues() -> Result<(), Box<dyn Error>> {
        let mut capture = Capture::new(Replay::new([vec![0x45; 4], vec![0x45; 4]]), 1500)?;
        let mut out = Vec::new();
        let summary = inspect(&mut capture, &mut out, Options::default())?;

        assert_eq!(
            summary,
            Summary {
                frames: 2,
                decoded: 0,
                failed: 2
            }
        );
        let trace = String::from_utf8(out)?;
        assert_eq!(
            trace.lines().collect::<Vec<_>>(),
            [
                "Read 4 bytes: 45 45 45 45",
                "packet too short to be an IP packet (4 bytes)",
                "Read 4 bytes: 45 45 45 45",
                "packet too short to be an IP packet (4 bytes)",
            ]
        );
        Ok(())
    }

    #[test]
    fn inspect_skips_hexdump_when_disabled() -> Result<(), Box<dyn Error>> {
        let mut capture = Capture::new(Replay::new([vec![0; 3]]), 1500)?;
        let mut out = Vec::new();
        inspect(&mut capture, &mut out, Options { hexdump: false })?;
        assert!(!String::from_utf8(out)?.contains("Read"));
        Ok(())
    }
}
