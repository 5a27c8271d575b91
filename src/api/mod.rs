//! API Module
//!
//! Chat completion request types and streaming response decoding.

pub mod completion;
pub mod streaming;

pub use completion::{CompletionRequest, Message, Role};
pub use streaming::{
    parse_sse_line, DecoderState, SseLine, StreamChoice, StreamDecoder, StreamDelta,
    StreamPayload,
};
