//! Bus traffic monitor.
//!
//! Replays a captured service-bus byte stream through a session and reports
//! every classification: frames decoded, corruption encountered, foreign
//! traffic skipped. Useful for checking a capture against the register table
//! and for watching what a pump publishes without touching it.
//!
//! ```text
//! RUST_LOG=debug thermolink-monitor --hex-file capture.hex --json
//! ```

use std::error::Error;
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use thermolink_bus::{BusTransport, HeatPumpSession, ProcessedFrameType};
use thermolink_protocol::{find_register, ConsumeMode};

#[derive(Parser, Debug)]
#[command(name = "thermolink-monitor", about = "Replay captured heat-pump bus traffic")]
struct Args {
    /// Hex dump of captured bus traffic (whitespace ignored). Raw bytes are
    /// read from stdin when omitted.
    #[arg(long)]
    hex_file: Option<PathBuf>,

    /// Bytes handed to the session per processing tick.
    #[arg(long, default_value_t = 16)]
    chunk: usize,

    /// Print the final status snapshot as JSON.
    #[arg(long)]
    json: bool,
}

/// Feeds a captured byte stream to the session in fixed-size chunks.
struct ReplayTransport {
    data: Vec<u8>,
    pos: usize,
    chunk: usize,
}

impl ReplayTransport {
    fn exhausted(&self) -> bool {
        self.pos >= self.data.len()
    }
}

impl BusTransport for ReplayTransport {
    fn read_available(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = buf
            .len()
            .min(self.chunk)
            .min(self.data.len() - self.pos);
        buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }

    fn write_frame(&mut self, _bytes: &[u8]) -> io::Result<()> {
        // Replay is observation only; nothing goes back out.
        Ok(())
    }
}

fn load_capture(args: &Args) -> Result<Vec<u8>, Box<dyn Error>> {
    match &args.hex_file {
        Some(path) => {
            let text = fs::read_to_string(path)?;
            let compact: String = text.split_whitespace().collect();
            Ok(hex::decode(compact)?)
        }
        None => {
            let mut raw = Vec::new();
            io::stdin().read_to_end(&mut raw)?;
            Ok(raw)
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let data = load_capture(&args)?;
    info!("replaying {} captured bytes", data.len());

    let mut session = HeatPumpSession::new(ReplayTransport {
        data,
        pos: 0,
        chunk: args.chunk.max(1),
    });
    session.set_grab_capacity(Some(256));

    let (mut queries, mut replies, mut corrupted, mut unknown) = (0u64, 0u64, 0u64, 0u64);
    loop {
        match session.process(ConsumeMode::Consume) {
            ProcessedFrameType::None => {
                // Nothing classifiable buffered; once the capture is fully
                // replayed there is nothing more to wait for.
                if session.transport().exhausted() {
                    break;
                }
            }
            ProcessedFrameType::Query => {
                queries += 1;
                log_frame(&session, "query");
            }
            ProcessedFrameType::Reply => {
                replies += 1;
                log_frame(&session, "reply");
            }
            ProcessedFrameType::Corrupted => corrupted += 1,
            ProcessedFrameType::Unknown => unknown += 1,
        }
    }

    info!(
        queries,
        replies, corrupted, unknown, "replay finished"
    );

    if args.json {
        println!("{}", serde_json::to_string_pretty(session.status())?);
    }

    Ok(())
}

fn log_frame(session: &HeatPumpSession<ReplayTransport>, kind: &str) {
    if let Some(frame) = session.last_frame() {
        let display_name = find_register(&frame.register_id)
            .map(|d| d.display)
            .unwrap_or("<unmodeled>");
        info!(
            "{} {} ({}) payload {}",
            kind,
            display_name,
            frame.op,
            hex::encode(&frame.payload)
        );
    }
}
