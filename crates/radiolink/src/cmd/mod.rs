use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Subcommand};
use radiolink_frame::{Compression, DecodeOptions, Encryption, MessageClass};
use radiolink_station::StationConfig;

use crate::exit::{io_error, CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod encode;
pub mod listen;
pub mod send;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Send a single frame to a station.
    Send(SendArgs),
    /// Receive frames as a station and print them.
    Listen(ListenArgs),
    /// Encode a frame and print it without sending.
    Encode(EncodeArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, config: StationConfig, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Send(args) => send::run(args, config, format),
        Command::Listen(args) => listen::run(args, config, format),
        Command::Encode(args) => encode::run(args, config, format),
        Command::Version(args) => version::run(args),
    }
}

/// What to put in a frame and how to encode it.
#[derive(Args, Debug)]
pub struct PayloadArgs {
    /// Receiving station id.
    #[arg(long, short = 't', default_value = "0")]
    pub to: u8,
    /// Text payload.
    #[arg(long, conflicts_with = "file")]
    pub text: Option<String>,
    /// Read payload from file.
    #[arg(long, conflicts_with = "text")]
    pub file: Option<PathBuf>,
    /// Send as a one-shot audio broadcast.
    #[arg(long, conflicts_with = "stream")]
    pub audio: bool,
    /// Send as an audio stream chunk.
    #[arg(long, conflicts_with = "audio")]
    pub stream: bool,
    /// Run-length compress the payload.
    #[arg(long)]
    pub rle: bool,
    /// XOR obscure the payload.
    #[arg(long)]
    pub xor: bool,
    /// XOR key (overrides config).
    #[arg(long, value_parser = parse_byte)]
    pub key: Option<u8>,
    /// Write the payload with no header.
    #[arg(long, conflicts_with_all = ["rle", "xor", "audio", "stream"])]
    pub raw: bool,
}

impl PayloadArgs {
    pub fn options(&self) -> DecodeOptions {
        let class = if self.audio {
            MessageClass::Audio
        } else if self.stream {
            MessageClass::AudioStream
        } else {
            MessageClass::Text
        };
        let mut options = DecodeOptions::new(class);
        if self.rle {
            options = options.with_rle();
        }
        if self.xor {
            options = options.with_xor();
        }
        options
    }

    pub fn read_payload(&self) -> CliResult<Vec<u8>> {
        if let Some(text) = &self.text {
            return Ok(text.as_bytes().to_vec());
        }
        if let Some(path) = &self.file {
            return fs::read(path)
                .map_err(|err| io_error(&format!("failed reading {}", path.display()), err));
        }
        Ok(Vec::new())
    }

    /// Apply per-invocation overrides to the station config.
    pub fn apply(&self, config: &mut StationConfig) {
        if let Some(key) = self.key {
            config.encryption_key = key;
        }
    }

    /// Short label for the frame kind, used in output.
    pub fn kind(&self) -> &'static str {
        if self.raw {
            "raw"
        } else {
            self.options().class.name()
        }
    }
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Link socket path.
    pub path: PathBuf,
    #[command(flatten)]
    pub payload: PayloadArgs,
    /// Bind the path and wait for the far end instead of connecting.
    #[arg(long)]
    pub listen: bool,
    /// Write timeout (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub timeout: String,
}

#[derive(Args, Debug)]
pub struct ListenArgs {
    /// Link socket path.
    pub path: PathBuf,
    /// Station id to receive as (overrides config).
    #[arg(long, short = 's')]
    pub station: Option<u8>,
    /// Exit after printing N deliveries.
    #[arg(long)]
    pub count: Option<usize>,
    /// Connect to the path instead of binding it.
    #[arg(long)]
    pub connect: bool,
    /// Print received bytes without parsing frames.
    #[arg(long)]
    pub raw: bool,
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    #[command(flatten)]
    pub payload: PayloadArgs,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Human-readable summary such as `TEXT+rle+xor`.
pub fn describe_options(options: DecodeOptions) -> String {
    let mut label = options.class.name().to_string();
    if options.compression == Compression::Rle {
        label.push_str("+rle");
    }
    if options.encryption == Encryption::Xor {
        label.push_str("+xor");
    }
    label
}

/// Accept `81`, `0x51` or `'Q'`-style single characters.
fn parse_byte(input: &str) -> Result<u8, String> {
    let input = input.trim();
    if let Some(hex) = input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
    {
        return u8::from_str_radix(hex, 16).map_err(|err| format!("invalid hex byte: {err}"));
    }
    let mut chars = input.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        if !c.is_ascii_digit() && c.is_ascii() {
            return Ok(c as u8);
        }
    }
    input
        .parse()
        .map_err(|err| format!("invalid byte value: {err}"))
}

pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        _ => Ok(Duration::from_secs(value)),
    }
}
