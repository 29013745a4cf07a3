//! Splitting a received chunk into individual payloads.
//!
//! Clients write JSON objects with no terminator, with a trailing newline, or
//! several back to back in a single write, and TCP may coalesce separate
//! writes into one read.  Every complete top-level JSON value in a chunk is
//! one payload, whether or not whitespace separates it from the next.
//!
//! Each line is scanned independently.  When a line stops parsing, the rest
//! of that line becomes one payload, which then fails as malformed JSON; the
//! following lines are still scanned.

use serde::de::IgnoredAny;
use serde_json::Deserializer;

/// Default number of bytes requested per socket read.
pub const DEFAULT_READ_BUFFER_SIZE: usize = 1024;

/// Largest accepted per-read buffer.  Every connection allocates one.
pub const MAX_READ_BUFFER_SIZE: usize = 64 * 1024;

/// Returns the trimmed, non-empty payloads contained in `chunk`, in order.
///
/// # Example
///
/// ```rust
/// use vlistener_core::protocol::framing::split_payloads;
///
/// let payloads: Vec<&str> = split_payloads("{\"a\":1}{\"b\":2}\n  {\"c\":3}\n\n").collect();
/// assert_eq!(payloads, ["{\"a\":1}", "{\"b\":2}", "{\"c\":3}"]);
/// ```
pub fn split_payloads(chunk: &str) -> impl Iterator<Item = &str> {
    chunk
        .split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .flat_map(line_payloads)
}

fn line_payloads(line: &str) -> Vec<&str> {
    let mut payloads = Vec::new();
    let mut values = Deserializer::from_str(line).into_iter::<IgnoredAny>();
    let mut start = 0;

    while let Some(value) = values.next() {
        if value.is_err() {
            payloads.push(line[start..].trim());
            break;
        }
        let end = values.byte_offset();
        payloads.push(line[start..end].trim());
        start = end;
    }
    payloads
}
