//! JBOD Array CLI
//!
//! Reads and writes the linear volume of a remote JBOD array, or serves an
//! in-memory array for local testing.
//!
//! ```text
//! jbod-array --cache-entries 64 write --address 4096 --text "hello"
//! jbod-array read --address 4096 --length 5
//! jbod-array serve-mock --listen 127.0.0.1:3333
//! ```

use clap::{Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use jbod_array::config::{DEFAULT_HOST, DEFAULT_PORT};
use jbod_array::error::{Error, Result};
use jbod_array::{ArrayController, ArrayGeometry, ClientConfig};

// =============================================================================
// CLI Arguments
// =============================================================================

/// JBOD array controller - linear volume access to a remote disk array
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JBOD service host
    #[arg(long, env = "JBOD_HOST", default_value = DEFAULT_HOST)]
    host: String,

    /// JBOD service port
    #[arg(long, env = "JBOD_PORT", default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Block cache entries (2-4096); omit to run uncached
    #[arg(long, env = "JBOD_CACHE_ENTRIES")]
    cache_entries: Option<usize>,

    /// Number of disks in the array
    #[arg(long, env = "JBOD_DISKS", default_value = "16")]
    disks: u32,

    /// Blocks on each disk
    #[arg(long, env = "JBOD_BLOCKS_PER_DISK", default_value = "256")]
    blocks_per_disk: u32,

    /// Print cache statistics as JSON after the command
    #[arg(long)]
    stats: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, env = "LOG_JSON")]
    log_json: bool,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Read bytes from the volume and print them as a hex dump
    Read {
        #[arg(long)]
        address: u64,
        #[arg(long)]
        length: usize,
    },
    /// Write bytes to the volume
    Write {
        #[arg(long)]
        address: u64,
        /// Data as hex digits, e.g. "deadbeef"
        #[arg(long, conflicts_with = "text", required_unless_present = "text")]
        hex: Option<String>,
        /// Data as UTF-8 text
        #[arg(long)]
        text: Option<String>,
    },
    /// Serve an in-memory array on the given address
    #[cfg(feature = "mock-jbod")]
    ServeMock {
        #[arg(long, default_value = "127.0.0.1:3333")]
        listen: String,
    },
}

// =============================================================================
// Main
// =============================================================================

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args);

    let geometry = ArrayGeometry::new(args.disks, args.blocks_per_disk)?;

    #[cfg(feature = "mock-jbod")]
    if let Cmd::ServeMock { listen } = &args.command {
        use jbod_array::mock::{MockJbod, MockJbodServer};

        let server = MockJbodServer::bind(
            listen,
            MockJbod::with_geometry(geometry).without_operation_log(),
        )?;
        info!("Serving mock array of {} bytes", geometry.total_capacity());
        server.wait();
        return Ok(());
    }

    let config = ClientConfig {
        host: args.host.clone(),
        port: args.port,
        cache_entries: args.cache_entries,
        geometry,
    };

    let mut array = ArrayController::connect(&config)?;
    array.mount()?;

    let outcome = run_command(&mut array, &args.command);

    if args.stats {
        if let Some(stats) = array.cache_stats() {
            let json = serde_json::to_string_pretty(&stats)
                .map_err(|e| Error::Config(format!("failed to encode stats: {}", e)))?;
            println!("{}", json);
        }
    }
    array.report_hit_rate();

    array.unmount()?;
    array.disconnect();
    outcome
}

fn run_command(array: &mut ArrayController<jbod_array::JbodConnection>, command: &Cmd) -> Result<()> {
    match command {
        Cmd::Read { address, length } => {
            let data = array.read_vec(*address, *length)?;
            print_hex_dump(*address, &data);
        }
        Cmd::Write { address, hex, text } => {
            let data = match (hex, text) {
                (Some(hex), _) => parse_hex(hex)?,
                (None, Some(text)) => text.as_bytes().to_vec(),
                (None, None) => Vec::new(),
            };
            let written = array.write(*address, &data)?;
            info!("Wrote {} bytes at address {}", written, address);
        }
        #[cfg(feature = "mock-jbod")]
        Cmd::ServeMock { .. } => {}
    }
    Ok(())
}

// =============================================================================
// Logging Setup
// =============================================================================

fn init_logging(args: &Args) {
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    // Logs go to stderr so dumps and stats on stdout stay clean.
    if args.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}

// =============================================================================
// Data Formatting
// =============================================================================

fn parse_hex(input: &str) -> Result<Vec<u8>> {
    let digits: String = input.chars().filter(|c| !c.is_whitespace()).collect();
    hex::decode(&digits).map_err(|e| Error::Config(format!("invalid hex data: {}", e)))
}

fn print_hex_dump(address: u64, data: &[u8]) {
    for (row, chunk) in data.chunks(16).enumerate() {
        println!("{}", format_dump_row(address + (row * 16) as u64, chunk));
    }
}

fn format_dump_row(address: u64, chunk: &[u8]) -> String {
    let encoded = hex::encode(chunk);
    let bytes: Vec<&str> = (0..encoded.len())
        .step_by(2)
        .map(|i| &encoded[i..i + 2])
        .collect();
    let ascii: String = chunk
        .iter()
        .map(|&b| if b.is_ascii_graphic() || b == b' ' { b as char } else { '.' })
        .collect();
    format!("{:08x}  {:<47}  |{}|", address, bytes.join(" "), ascii)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex() {
        assert_eq!(parse_hex("de ad BE ef").unwrap(), vec![0xde, 0xad, 0xbe, 0xef]);
        assert!(matches!(parse_hex("abc"), Err(Error::Config(_))));
        assert!(matches!(parse_hex("zz"), Err(Error::Config(_))));
        assert!(parse_hex("").unwrap().is_empty());
    }

    #[test]
    fn test_format_dump_row() {
        let row = format_dump_row(0x1000, b"Hi\x00");
        assert!(row.starts_with("00001000  48 69 00 "));
        assert!(row.ends_with("|Hi.|"));
    }

    #[test]
    fn test_args_parse() {
        let args = Args::try_parse_from([
            "jbod-array",
            "--cache-entries",
            "64",
            "read",
            "--address",
            "4096",
            "--length",
            "5",
        ])
        .unwrap();
        assert_eq!(args.cache_entries, Some(64));
        assert!(matches!(args.command, Cmd::Read { address: 4096, length: 5 }));
    }
}
