use std::fmt::Write as _;
use std::io::{IsTerminal, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use radiolink_frame::{FrameHeader, Message, HEADER_SIZE};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct MessageOutput<'a> {
    kind: &'a str,
    sender_id: u8,
    receiver_id: u8,
    priority: u8,
    sequence: u16,
    timestamp: u32,
    text: String,
}

#[derive(Serialize)]
struct AudioOutput<'a> {
    kind: &'a str,
    size: usize,
    received_at: String,
}

#[derive(Serialize)]
struct SentOutput<'a> {
    kind: &'a str,
    receiver_id: u8,
    options: String,
    bytes_written: usize,
}

#[derive(Serialize)]
struct EncodedOutput {
    length: usize,
    receiver_id: Option<u8>,
    data_length: Option<u32>,
    uncompressed_length: Option<u32>,
    decode_opts: Option<u8>,
    encryption_key: Option<u8>,
    hex: String,
}

pub fn print_message(message: &Message, format: OutputFormat) {
    let text = message.text().into_owned();
    match format {
        OutputFormat::Json => {
            let out = MessageOutput {
                kind: "TEXT",
                sender_id: message.sender_id,
                receiver_id: message.receiver_id,
                priority: message.priority,
                sequence: message.sequence,
                timestamp: message.timestamp,
                text,
            };
            print_json(&out);
        }
        OutputFormat::Table => {
            let mut table = new_table(vec!["FROM", "TO", "SEQ", "PRIO", "TIME", "TEXT"]);
            table.add_row(vec![
                message.sender_id.to_string(),
                message.receiver_id.to_string(),
                message.sequence.to_string(),
                message.priority.to_string(),
                message.timestamp.to_string(),
                text,
            ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "text from={} to={} seq={} prio={} time={} text={}",
                message.sender_id,
                message.receiver_id,
                message.sequence,
                message.priority,
                message.timestamp,
                text
            );
        }
        OutputFormat::Raw => print_raw(message.text_bytes()),
    }
}

/// `kind` is `AUDIO` for broadcasts, `AUDIO_STREAM` for stream chunks, `raw` for pass-through.
pub fn print_audio(kind: &str, data: &[u8], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = AudioOutput {
                kind,
                size: data.len(),
                received_at: now_unix_seconds(),
            };
            print_json(&out);
        }
        OutputFormat::Table => {
            let mut table = new_table(vec!["KIND", "SIZE"]);
            table.add_row(vec![kind.to_string(), data.len().to_string()]);
            println!("{table}");
        }
        OutputFormat::Pretty => println!("{kind} size={}", data.len()),
        OutputFormat::Raw => print_raw(data),
    }
}

pub fn print_sent(kind: &str, receiver_id: u8, options: &str, bytes_written: usize, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = SentOutput {
                kind,
                receiver_id,
                options: options.to_string(),
                bytes_written,
            };
            print_json(&out);
        }
        OutputFormat::Table => {
            let mut table = new_table(vec!["KIND", "TO", "OPTIONS", "BYTES"]);
            table.add_row(vec![
                kind.to_string(),
                receiver_id.to_string(),
                options.to_string(),
                bytes_written.to_string(),
            ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!("sent {kind} to={receiver_id} options={options} bytes={bytes_written}")
        }
        OutputFormat::Raw => {}
    }
}

/// Print an encoded frame. `framed` is false for raw pass-through bytes.
pub fn print_encoded(wire: &[u8], framed: bool, format: OutputFormat) {
    let header = if framed { FrameHeader::parse(wire) } else { None };
    match format {
        OutputFormat::Json => {
            let out = EncodedOutput {
                length: wire.len(),
                receiver_id: header.map(|h| h.receiver_id),
                data_length: header.map(|h| h.data_length),
                uncompressed_length: header.map(|h| h.uncompressed_length),
                decode_opts: header.map(|h| h.decode_opts),
                encryption_key: header.map(|h| h.encryption_key),
                hex: hex_string(wire),
            };
            print_json(&out);
        }
        OutputFormat::Table => {
            let mut table = new_table(vec!["FIELD", "VALUE"]);
            table.add_row(vec!["length".to_string(), wire.len().to_string()]);
            if let Some(h) = header {
                table.add_row(vec!["receiver_id".to_string(), h.receiver_id.to_string()]);
                table.add_row(vec!["data_length".to_string(), h.data_length.to_string()]);
                table.add_row(vec![
                    "uncompressed_length".to_string(),
                    h.uncompressed_length.to_string(),
                ]);
                table.add_row(vec!["decode_opts".to_string(), format!("{:#04x}", h.decode_opts)]);
                table.add_row(vec![
                    "encryption_key".to_string(),
                    format!("{:#04x}", h.encryption_key),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => print!("{}", hex_dump(wire, if framed { HEADER_SIZE } else { 0 })),
        OutputFormat::Raw => print_raw(wire),
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

fn print_json<T: Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

fn hex_string(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len() * 2);
    for byte in data {
        let _ = write!(out, "{byte:02x}");
    }
    out
}

/// Classic 16-bytes-per-line dump; a `|` marks where the header ends.
pub fn hex_dump(data: &[u8], header_len: usize) -> String {
    let mut out = String::new();
    for (line, chunk) in data.chunks(16).enumerate() {
        let offset = line * 16;
        let _ = write!(out, "{offset:08x} ");
        for (i, byte) in chunk.iter().enumerate() {
            let sep = if header_len > 0 && offset + i == header_len { '|' } else { ' ' };
            let _ = write!(out, "{sep}{byte:02x}");
        }
        for _ in chunk.len()..16 {
            out.push_str("   ");
        }
        out.push_str("  ");
        out.extend(chunk.iter().map(|&b| {
            if b.is_ascii_graphic() || b == b' ' {
                b as char
            } else {
                '.'
            }
        }));
        out.push('\n');
    }
    out
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_string_is_lowercase_pairs() {
        assert_eq!(hex_string(&[0xDE, 0xAD, 0x01]), "dead01");
        assert_eq!(hex_string(&[]), "");
    }

    #[test]
    fn hex_dump_marks_header_boundary() {
        let data: Vec<u8> = (0u8..24).collect();
        let dump = hex_dump(&data, 20);
        let lines: Vec<&str> = dump.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("00000000  00 01"));
        assert!(lines[1].starts_with("00000010  10 11 12 13|14"));
    }

    #[test]
    fn hex_dump_shows_printable_text() {
        let dump = hex_dump(b"HELLO", 0);
        assert!(dump.trim_end().ends_with("HELLO"));
    }
}
