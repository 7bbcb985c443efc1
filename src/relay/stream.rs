//! Byte stream to frame stream adapter.

use futures::stream::{self, Stream};
use futures_util::StreamExt;
use std::collections::VecDeque;
use std::pin::Pin;
use std::time::Duration;

use crate::debug::{DebugTracer, ErrorSource};
use crate::error::StreamError;
use crate::frames::{Decoded, FrameDecoder, InboundFrame};
use crate::traits::ByteStream;

/// Stream of reconcilable frames. An `Err` item is terminal.
pub type FrameStream = Pin<Box<dyn Stream<Item = Result<InboundFrame, StreamError>> + Send>>;

struct State {
    bytes: ByteStream,
    decoder: FrameDecoder,
    ready: VecDeque<Decoded>,
    idle_timeout: Option<Duration>,
    tracer: Option<DebugTracer>,
    finished: bool,
}

impl State {
    /// Trace one decoded line and keep it only if it is a frame.
    fn take_frame(&self, decoded: Decoded) -> Option<InboundFrame> {
        match decoded {
            Decoded::Frame { line, frame } => {
                if let Some(tracer) = &self.tracer {
                    tracer.raw_frame(&line, frame.frame_type());
                }
                Some(frame)
            }
            Decoded::Ignored { line } => {
                if let Some(tracer) = &self.tracer {
                    tracer.raw_frame(&line, "ignored");
                }
                None
            }
            Decoded::Malformed { line, error } => {
                tracing::warn!("Skipping malformed frame: {} ({})", error, line);
                if let Some(tracer) = &self.tracer {
                    tracer.raw_frame(&line, "malformed");
                    tracer.error(ErrorSource::FrameParsing, error.to_string());
                }
                None
            }
        }
    }

    async fn next_chunk(&mut self) -> Option<Result<bytes::Bytes, StreamError>> {
        match self.idle_timeout {
            Some(limit) => match tokio::time::timeout(limit, self.bytes.next()).await {
                Ok(item) => item.map(|r| r.map_err(StreamError::from)),
                Err(_) => Some(Err(StreamError::Stalled {
                    secs: limit.as_secs(),
                })),
            },
            None => self
                .bytes
                .next()
                .await
                .map(|r| r.map_err(StreamError::from)),
        }
    }
}

/// Adapt a raw response body into frames.
///
/// Lines are decoded as they complete; malformed lines are logged and
/// skipped. A transport failure (or `idle_timeout` with no data) yields one
/// `Err` and ends the stream. Frames without an id bind to `fallback_id`.
pub fn frame_stream(
    bytes: ByteStream,
    fallback_id: Option<String>,
    idle_timeout: Option<Duration>,
    tracer: Option<DebugTracer>,
) -> FrameStream {
    let decoder = match fallback_id {
        Some(id) => FrameDecoder::new().with_fallback_id(id),
        None => FrameDecoder::new(),
    };
    let state = State {
        bytes,
        decoder,
        ready: VecDeque::new(),
        idle_timeout,
        tracer,
        finished: false,
    };

    let frames = stream::unfold(state, |mut state| async move {
        loop {
            // First, drain lines already decoded
            while let Some(decoded) = state.ready.pop_front() {
                if let Some(frame) = state.take_frame(decoded) {
                    return Some((Ok(frame), state));
                }
            }

            if state.finished {
                return None;
            }

            // Need more data from the stream
            match state.next_chunk().await {
                Some(Ok(chunk)) => {
                    let decoded = state.decoder.feed(&chunk);
                    state.ready.extend(decoded);
                }
                Some(Err(e)) => {
                    tracing::error!("Frame stream failed: {}", e);
                    state.finished = true;
                    state.ready.clear();
                    return Some((Err(e), state));
                }
                None => {
                    // Stream ended - flush a trailing line without a newline
                    state.finished = true;
                    state.ready.extend(state.decoder.finish());
                    let stats = state.decoder.stats();
                    tracing::debug!(
                        "Frame stream ended: {} frames, {} ignored, {} malformed",
                        stats.frames,
                        stats.ignored,
                        stats.malformed
                    );
                }
            }
        }
    });

    Box::pin(frames)
}
