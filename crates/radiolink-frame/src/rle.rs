//! Escape-byte run-length codec.
//!
//! Encoded form:
//! ```text
//! literal byte            b                   (b != escape)
//! run of n copies of b    escape, n, b        (1 <= n <= 255)
//! ```
//! Runs of at least [`MIN_RUN`] bytes are always emitted as triples. The
//! escape byte itself is never emitted as a literal: every occurrence, even a
//! single one, becomes a triple. That keeps the stream unambiguous for any
//! input and any choice of escape byte.

/// Escape byte stations use for text records (ASCII ESC).
pub const TEXT_ESCAPE: u8 = 0x1B;

/// Escape byte stations use for audio payloads.
pub const AUDIO_ESCAPE: u8 = 0xFF;

/// Shortest run of a non-escape byte that is worth a triple.
pub const MIN_RUN: usize = 4;

/// Longest run one triple can describe.
pub const MAX_RUN: usize = u8::MAX as usize;

/// Errors produced while expanding a run-length stream.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RleError {
    /// A triple declares a run of zero bytes.
    #[error("zero-length run at offset {offset}")]
    ZeroRun { offset: usize },

    /// The input ends in the middle of a triple.
    #[error("truncated run at offset {offset}")]
    Truncated { offset: usize },

    /// The expanded output would exceed the declared length.
    #[error("expanded output exceeds declared length {expected}")]
    Overflow { expected: usize },

    /// The expanded output is shorter than the declared length.
    #[error("expanded {actual} bytes, expected {expected}")]
    LengthMismatch { expected: usize, actual: usize },
}

/// Run-length encode `input` using `escape` as the run marker.
pub fn compress(input: &[u8], escape: u8) -> Vec<u8> {
    let mut out = Vec::with_capacity(input.len());
    let mut i = 0;

    while i < input.len() {
        let byte = input[i];
        let run = input[i..]
            .iter()
            .take(MAX_RUN)
            .take_while(|&&b| b == byte)
            .count();

        if run >= MIN_RUN || byte == escape {
            out.extend_from_slice(&[escape, run as u8, byte]);
        } else {
            out.extend(std::iter::repeat_n(byte, run));
        }
        i += run;
    }

    out
}

/// Expand a run-length stream that must produce exactly `expected_len` bytes.
pub fn decompress(input: &[u8], escape: u8, expected_len: usize) -> Result<Vec<u8>, RleError> {
    let mut out = Vec::with_capacity(expected_len.min(input.len().saturating_mul(MAX_RUN)));
    decompress_into(input, escape, expected_len, &mut out)?;
    Ok(out)
}

/// Expand a run-length stream, appending to `out`.
///
/// Exactly `expected_len` bytes are appended on success. Expansion stops as
/// soon as the output would grow past `expected_len`, so a hostile run count
/// cannot inflate the buffer beyond what the caller reserved.
pub fn decompress_into(
    input: &[u8],
    escape: u8,
    expected_len: usize,
    out: &mut Vec<u8>,
) -> Result<(), RleError> {
    let start = out.len();
    let mut i = 0;

    while i < input.len() {
        let written = out.len() - start;
        if input[i] != escape {
            if written >= expected_len {
                return Err(RleError::Overflow {
                    expected: expected_len,
                });
            }
            out.push(input[i]);
            i += 1;
            continue;
        }

        let [count, byte] = match input.get(i + 1..i + 3) {
            Some(&[count, byte]) => [count, byte],
            _ => return Err(RleError::Truncated { offset: i }),
        };
        if count == 0 {
            return Err(RleError::ZeroRun { offset: i });
        }
        if written + usize::from(count) > expected_len {
            return Err(RleError::Overflow {
                expected: expected_len,
            });
        }
        out.extend(std::iter::repeat_n(byte, usize::from(count)));
        i += 3;
    }

    let actual = out.len() - start;
    if actual != expected_len {
        return Err(RleError::LengthMismatch {
            expected: expected_len,
            actual,
        });
    }
    Ok(())
}
