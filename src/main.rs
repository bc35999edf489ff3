use std::path::PathBuf;
use std::process::ExitCode;
use tunpeek::device::{Capture, FrameSource, Replay, DEFAULT_MTU};
use tunpeek::inspect::{self, Options};
use tunpeek::Result;

/// Print the IP packets the kernel routes into a TUN interface.
#[derive(argh::FromArgs, Debug)]
struct Args {
    /// name of the interface to create (default: tun0)
    #[argh(option, default = "String::from(\"tun0\")")]
    name: String,

    /// size of the read buffer in bytes (default: 1500)
    #[argh(option, default = "DEFAULT_MTU")]
    mtu: usize,

    /// decode a raw frame from this file instead of reading a device; may be
    /// repeated
    #[argh(option)]
    replay: Vec<PathBuf>,

    /// do not print the hex dump of every frame
    #[argh(switch, short = 'q')]
    quiet: bool,
}

fn main() -> ExitCode {
    env_logger::init();
    let args: Args = argh::from_env();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<()> {
    let opts = Options {
        hexdump: !args.quiet,
    };

    if args.replay.is_empty() {
        capture_device(args, opts)
    } else {
        let replay = Replay::from_files(&args.replay)?;
        capture(Capture::new(replay, args.mtu)?, opts)
    }
}

#[cfg(target_os = "linux")]
fn capture_device(args: &Args, opts: Options) -> Result<()> {
    let tun = tunpeek::device::Tun::open(&args.name)?;
    println!("TUN interface created: {}", tun.name());
    capture(Capture::new(tun, args.mtu)?, opts)
}

#[cfg(not(target_os = "linux"))]
fn capture_device(_args: &Args, _opts: Options) -> Result<()> {
    Err(tunpeek::Error::DeviceUnavailable(std::io::Error::new(
        std::io::ErrorKind::Unsupported,
        "tun devices are only supported on linux, use --replay",
    )))
}

fn capture<S: FrameSource>(mut capture: Capture<S>, opts: Options) -> Result<()> {
    log::debug!(
        "reading from {} with a {} byte buffer",
        capture.source().name(),
        capture.mtu()
    );
    let stdout = std::io::stdout();
    inspect::inspect(&mut capture, &mut stdout.lock(), opts)?;
    Ok(())
}
