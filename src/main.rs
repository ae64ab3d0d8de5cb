//! headerpeek command line tool
//!
//! Replays a file through a header-peekable stream the way a live source
//! would deliver it: a producer thread pushes chunks (optionally paced), while
//! the consumer sniffs the container format from the header window and then
//! drains the payload, hashing it as it goes.

use std::fs::File;
use std::io::{self, Read};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};
use serde::Serialize;
use sha2::{Digest, Sha256};

use headerpeek::{
    feed_with, fold, sniff_stream, split, ContainerFormat, HeaderPeekStream, StreamConfig,
    DEFAULT_CHUNK_SIZE,
};

#[derive(Parser)]
#[command(name = "headerpeek", version, about = "Sniff and drain live byte streams")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Stream a file through a header-peekable stream and report on it
    Inspect {
        /// Input file, or `-` for stdin
        path: PathBuf,

        /// JSON stream configuration; flags below override it
        #[arg(long)]
        config: Option<PathBuf>,

        /// Header window capacity in bytes
        #[arg(long)]
        header_capacity: Option<usize>,

        /// Header-ready timeout in milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,

        /// Producer chunk size in bytes
        #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
        chunk_size: usize,

        /// Delay after each produced chunk, to mimic a live source
        #[arg(long, default_value_t = 0)]
        delay_ms: u64,

        /// Consumer read buffer size in bytes
        #[arg(long, default_value_t = 8192)]
        read_size: usize,

        /// Emit the report as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Serialize)]
struct Report {
    format: ContainerFormat,
    mime_type: &'static str,
    header_hex: String,
    observed_len: u64,
    total_bytes: u64,
    sha256: String,
    elapsed_ms: u128,
}

fn main() {
    #[cfg(feature = "logging")]
    init_logging();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

#[cfg(feature = "logging")]
fn init_logging() {
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();
}

fn run(cli: Cli) -> io::Result<()> {
    match cli.command {
        Command::Inspect {
            path,
            config,
            header_capacity,
            timeout_ms,
            chunk_size,
            delay_ms,
            read_size,
            json,
        } => {
            let mut stream_config = match config {
                Some(config_path) => StreamConfig::from_json_file(config_path)?,
                None => StreamConfig::default(),
            };
            if let Some(capacity) = header_capacity {
                stream_config = stream_config.with_header_capacity(capacity);
            }
            if let Some(ms) = timeout_ms {
                stream_config = stream_config.with_header_ready_timeout(Duration::from_millis(ms));
            }

            let source: Box<dyn Read + Send> = if path.as_os_str() == "-" {
                Box::new(io::stdin())
            } else {
                Box::new(File::open(&path)?)
            };

            let report = inspect(
                source,
                stream_config,
                chunk_size,
                Duration::from_millis(delay_ms),
                read_size,
            )?;
            print_report(&report, json)
        }
    }
}

fn inspect(
    mut source: Box<dyn Read + Send>,
    config: StreamConfig,
    chunk_size: usize,
    delay: Duration,
    read_size: usize,
) -> io::Result<Report> {
    let start = Instant::now();
    let stream = Arc::new(HeaderPeekStream::new(config));
    let (producer, mut consumer) = split(Arc::clone(&stream));

    let feeder = thread::spawn(move || -> io::Result<u64> {
        let fed = feed_with(&mut source, &producer, chunk_size, |_| {
            if !delay.is_zero() {
                thread::sleep(delay);
            }
        })?;
        producer.finish()?;
        Ok(fed)
    });

    let sniffed = sniff_stream(&stream)?;
    let (total_bytes, hasher) = fold(
        &mut consumer,
        read_size,
        (0u64, Sha256::new()),
        |(n, mut hasher), chunk| {
            hasher.update(chunk);
            (n + chunk.len() as u64, hasher)
        },
    )?;

    let fed = feeder
        .join()
        .map_err(|_| io::Error::other("producer thread panicked"))??;
    if fed != total_bytes {
        return Err(io::Error::other(format!(
            "fed {fed} bytes but consumed {total_bytes}"
        )));
    }

    Ok(Report {
        format: sniffed.format,
        mime_type: sniffed.format.mime_type(),
        header_hex: hex::encode(&sniffed.header),
        observed_len: sniffed.observed_len,
        total_bytes,
        sha256: hex::encode(hasher.finalize()),
        elapsed_ms: start.elapsed().as_millis(),
    })
}

fn print_report(report: &Report, json: bool) -> io::Result<()> {
    if json {
        let out = serde_json::to_string_pretty(report).map_err(io::Error::other)?;
        println!("{out}");
        return Ok(());
    }

    println!("format:       {} ({})", report.format, report.mime_type);
    println!("header:       {}", report.header_hex);
    println!("observed len: {}", report.observed_len);
    println!("total bytes:  {}", report.total_bytes);
    println!("sha256:       {}", report.sha256);
    println!("elapsed:      {} ms", report.elapsed_ms);
    Ok(())
}
