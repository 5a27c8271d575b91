//! Streaming Support
//!
//! Decodes the Server-Sent Events body of a streaming chat completion into
//! plain assistant text.
//!
//! The body is a sequence of lines:
//! ```text
//! data: {"choices":[{"delta":{"content":"Hi"}}]}
//!
//! data: {"choices":[{"delta":{"content":" there"}}]}
//!
//! data: [DONE]
//! ```

use crate::error::{CopilotError, Result};
use bytes::Bytes;
use futures::{Stream, StreamExt};
use serde::Deserialize;
use tracing::debug;

const DATA_PREFIX: &[u8] = b"data: ";
const DONE_SENTINEL: &[u8] = b"data: [DONE]";

/// Payload carried by one `data: ` line
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StreamPayload {
    /// Choices with deltas; some servers send `[]` or omit it on the last chunk
    #[serde(default)]
    pub choices: Option<Vec<StreamChoice>>,
}

/// A choice in a streamed payload
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StreamChoice {
    /// The delta (partial message)
    #[serde(default)]
    pub delta: Option<StreamDelta>,

    /// Finish reason (set in final chunk)
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Delta content in a streamed payload
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StreamDelta {
    /// Role (usually only in first chunk)
    #[serde(default)]
    pub role: Option<String>,

    /// Content delta
    #[serde(default)]
    pub content: Option<String>,
}

impl StreamPayload {
    /// The `choices[0].delta.content` fragment, if present
    pub fn content(&self) -> Option<&str> {
        self.choices
            .as_ref()?
            .first()?
            .delta
            .as_ref()?
            .content
            .as_deref()
    }
}

/// Classification of one raw body line
#[derive(Debug, Clone)]
pub enum SseLine {
    /// Blank line, comment, or any non-`data: ` line
    Skip,

    /// The `data: [DONE]` sentinel
    Done,

    /// A decoded `data: ` payload
    Data(StreamPayload),
}

/// Parse one raw SSE line
///
/// The sentinel is matched after trimming surrounding whitespace; the
/// `data: ` prefix must start the line.
pub fn parse_sse_line(line: &[u8]) -> Result<SseLine> {
    let trimmed = line.trim_ascii();
    if trimmed.is_empty() {
        return Ok(SseLine::Skip);
    }

    if trimmed == DONE_SENTINEL {
        return Ok(SseLine::Done);
    }

    let Some(data) = line.strip_prefix(DATA_PREFIX) else {
        return Ok(SseLine::Skip);
    };

    let text = std::str::from_utf8(data).map_err(|e| CopilotError::decode(e, data))?;
    let payload: StreamPayload =
        serde_json::from_str(text).map_err(|e| CopilotError::decode(e, data))?;

    Ok(SseLine::Data(payload))
}

/// Decoder state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecoderState {
    #[default]
    Streaming,
    /// Terminal; reached on the sentinel
    Done,
}

/// Folds raw body lines into the assistant's text
#[derive(Debug, Default)]
pub struct StreamDecoder {
    state: DecoderState,
    text: String,
}

impl StreamDecoder {
    /// Create a new decoder in the `Streaming` state
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one raw line and return the resulting state
    ///
    /// Lines fed after the sentinel are ignored.
    pub fn feed(&mut self, line: &[u8]) -> Result<DecoderState> {
        if self.state == DecoderState::Done {
            return Ok(self.state);
        }

        match parse_sse_line(line)? {
            SseLine::Skip => {}
            SseLine::Done => self.state = DecoderState::Done,
            SseLine::Data(payload) => {
                if let Some(content) = payload.content() {
                    self.text.push_str(content);
                }
            }
        }

        Ok(self.state)
    }

    pub fn state(&self) -> DecoderState {
        self.state
    }

    pub fn is_done(&self) -> bool {
        self.state == DecoderState::Done
    }

    /// Text accumulated so far
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }

    /// Decode a finite sequence of lines, stopping at the sentinel
    ///
    /// Input that ends without a sentinel yields the text accumulated so far.
    pub fn decode<I, L>(lines: I) -> Result<String>
    where
        I: IntoIterator<Item = L>,
        L: AsRef<[u8]>,
    {
        let mut decoder = Self::new();
        for line in lines {
            if decoder.feed(line.as_ref())? == DecoderState::Done {
                break;
            }
        }
        Ok(decoder.into_text())
    }

    /// Decode a stream of body lines as they arrive, stopping at the sentinel
    ///
    /// The remaining stream is dropped unread once the sentinel is seen.
    pub async fn decode_stream<S>(lines: S) -> Result<String>
    where
        S: Stream<Item = Result<Bytes>>,
    {
        let mut lines = std::pin::pin!(lines);
        let mut decoder = Self::new();

        while let Some(line) = lines.next().await {
            if decoder.feed(&line?)? == DecoderState::Done {
                debug!(chars = decoder.text.len(), "stream finished at sentinel");
                break;
            }
        }

        Ok(decoder.into_text())
    }
}
