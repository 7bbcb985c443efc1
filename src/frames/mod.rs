//! Inbound frame codec
//!
//! Turns backend output into [`InboundFrame`]s. Streams arrive as lines, each
//! optionally prefixed with `data: ` and holding one JSON object:
//! - `{"type":"chunk","id":..,"content":..}` - text delta
//! - `{"type":"complete","id":..}` - end of a message
//! - `{"type":"options","id":..,"options":[..]}` - selectable replies
//! - an object with `content` or `parts` - a whole message
//!
//! # Module structure
//! - `events` - Frame type definitions (InboundFrame, FrameLine, FrameParseError)
//! - `payloads` - Internal payload deserialization structs
//! - `parser` - Line parsing and payload decoding
//! - `decoder` - Byte accumulator for chunked transports

mod decoder;
mod events;
mod parser;
mod payloads;

pub use decoder::{Decoded, DecoderStats, FrameDecoder, MAX_LINE_LEN};
pub use events::{FrameLine, FrameParseError, FullMessage, InboundFrame};
pub use parser::{decode_frame, decode_reply, parse_frame_line};
