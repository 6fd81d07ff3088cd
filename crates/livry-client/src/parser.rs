//! Incremental SSE record parser
//!
//! Network chunks arrive split at arbitrary byte offsets, so the parser
//! buffers until it sees a blank-line record boundary. Comment records (the
//! server's keep-alives) are surfaced as [`Record::Comment`] so the consumer
//! can skip them without touching JSON.

/// One complete record from the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    /// The joined payload of the record's `data:` lines.
    Data(String),
    /// A record with no `data:` lines: keep-alives and other non-events.
    Comment,
}

/// Buffering parser; feed it chunks, get back complete records.
#[derive(Debug, Default)]
pub struct RecordParser {
    buffer: Vec<u8>,
}

impl RecordParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and drain every record it completes.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<Record> {
        self.buffer.extend_from_slice(chunk);

        let mut records = Vec::new();
        while let Some((end, skip)) = find_boundary(&self.buffer) {
            let block: Vec<u8> = self.buffer.drain(..end + skip).collect();
            records.push(parse_block(&block[..end]));
        }
        records
    }
}

/// Find the first blank-line boundary. Returns the block length and the
/// number of delimiter bytes to discard. Tolerates CRLF line endings.
fn find_boundary(buf: &[u8]) -> Option<(usize, usize)> {
    let mut i = 0;
    while i < buf.len() {
        if buf[i] == b'\n' {
            match buf.get(i + 1) {
                Some(b'\n') => return Some((i, 2)),
                Some(b'\r') if buf.get(i + 2) == Some(&b'\n') => return Some((i, 3)),
                _ => {}
            }
        }
        i += 1;
    }
    None
}

fn parse_block(block: &[u8]) -> Record {
    let text = String::from_utf8_lossy(block);
    let mut data_lines: Vec<&str> = Vec::new();

    for line in text.lines() {
        let line = line.trim_end_matches('\r');
        if let Some(payload) = line.strip_prefix("data:") {
            data_lines.push(payload.strip_prefix(' ').unwrap_or(payload));
        }
        // Comment lines (leading ':') and unknown fields are skipped.
    }

    if data_lines.is_empty() {
        Record::Comment
    } else {
        Record::Data(data_lines.join("\n"))
    }
}
