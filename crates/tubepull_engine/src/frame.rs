use std::collections::VecDeque;
use std::fmt::Display;
use std::time::Duration;

use bytes::Bytes;
use encoding_rs::{Encoding, UTF_8};
use futures_util::{Stream, StreamExt};
use pull_logging::{pull_debug, pull_warn};

use crate::{BackendError, FailureKind, StreamRecord};

/// Prefix that marks a line as an event frame.
pub const DATA_PREFIX: &str = "data: ";

/// Incremental decoder for newline-delimited `data: {json}` frames.
///
/// Bytes are buffered until a newline arrives, so both frames and multi-byte
/// characters may be split across chunks at any offset.
#[derive(Debug)]
pub struct FrameDecoder {
    carry: Vec<u8>,
    encoding: &'static Encoding,
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::with_encoding(UTF_8)
    }
}

impl FrameDecoder {
    /// Non ASCII-compatible encodings cannot be split on `\n` bytes and fall
    /// back to UTF-8.
    pub fn with_encoding(encoding: &'static Encoding) -> Self {
        let encoding = if encoding.is_ascii_compatible() {
            encoding
        } else {
            UTF_8
        };
        Self {
            carry: Vec::new(),
            encoding,
        }
    }

    /// Picks the charset from a `Content-Type` header, UTF-8 otherwise.
    pub fn for_content_type(content_type: Option<&str>) -> Self {
        let encoding = content_type
            .and_then(extract_charset)
            .and_then(|label| Encoding::for_label(label.as_bytes()))
            .unwrap_or(UTF_8);
        Self::with_encoding(encoding)
    }

    pub fn encoding(&self) -> &'static Encoding {
        self.encoding
    }

    /// Feeds one chunk and returns the records completed by it.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<StreamRecord> {
        self.carry.extend_from_slice(chunk);
        let Some(last_newline) = self.carry.iter().rposition(|byte| *byte == b'\n') else {
            return Vec::new();
        };
        let partial = self.carry.split_off(last_newline + 1);
        let complete = std::mem::replace(&mut self.carry, partial);
        complete
            .split(|byte| *byte == b'\n')
            .filter_map(|line| self.decode_line(line))
            .collect()
    }

    /// Flushes a final line that was not newline-terminated.
    pub fn finish(&mut self) -> Vec<StreamRecord> {
        let rest = std::mem::take(&mut self.carry);
        self.decode_line(&rest).into_iter().collect()
    }

    fn decode_line(&self, raw: &[u8]) -> Option<StreamRecord> {
        if raw.is_empty() {
            return None;
        }
        let (text, had_errors) = self.encoding.decode_without_bom_handling(raw);
        if had_errors {
            pull_debug!("Frame line contained undecodable bytes ({})", self.encoding.name());
        }
        let line = text.trim_end_matches('\r');
        let payload = line.strip_prefix(DATA_PREFIX)?;
        match serde_json::from_str::<StreamRecord>(payload) {
            Ok(record) => Some(record),
            Err(err) => {
                pull_warn!("Dropping malformed frame ({err}): {payload}");
                None
            }
        }
    }
}

fn extract_charset(content_type: &str) -> Option<String> {
    content_type
        .split(';')
        .filter_map(|part| {
            let (key, value) = part.trim().split_once('=')?;
            key.trim()
                .eq_ignore_ascii_case("charset")
                .then(|| value.trim().trim_matches(&['"', '\''][..]).to_string())
        })
        .next()
}

struct RecordStreamState<S> {
    chunks: S,
    decoder: FrameDecoder,
    pending: VecDeque<StreamRecord>,
    idle_timeout: Duration,
    finished: bool,
}

/// Lazily turns a body of byte chunks into decoded records.
///
/// The stream is finite: it ends with the body, after a read error, or after
/// `idle_timeout` passes without a chunk. Errors are yielded once as the last
/// item.
pub fn record_stream<S, E>(
    chunks: S,
    decoder: FrameDecoder,
    idle_timeout: Duration,
) -> impl Stream<Item = Result<StreamRecord, BackendError>>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
    E: Display,
{
    let state = RecordStreamState {
        chunks,
        decoder,
        pending: VecDeque::new(),
        idle_timeout,
        finished: false,
    };

    futures_util::stream::unfold(state, |mut state| async move {
        loop {
            if let Some(record) = state.pending.pop_front() {
                return Some((Ok(record), state));
            }
            if state.finished {
                return None;
            }
            match tokio::time::timeout(state.idle_timeout, state.chunks.next()).await {
                Ok(Some(Ok(chunk))) => {
                    let records = state.decoder.push(&chunk);
                    state.pending.extend(records);
                }
                Ok(Some(Err(err))) => {
                    state.finished = true;
                    let err = BackendError::new(FailureKind::Network, err.to_string());
                    return Some((Err(err), state));
                }
                Ok(None) => {
                    state.finished = true;
                    let records = state.decoder.finish();
                    state.pending.extend(records);
                }
                Err(_) => {
                    state.finished = true;
                    let err = BackendError::new(
                        FailureKind::Timeout,
                        format!("no data received for {}s", state.idle_timeout.as_secs()),
                    );
                    return Some((Err(err), state));
                }
            }
        }
    })
}
