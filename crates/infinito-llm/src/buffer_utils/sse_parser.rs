use futures::{Stream, StreamExt};
use std::fmt::Display;

use super::frame_buffer::CircularFrameBuffer;
use crate::error::StreamError;
use crate::streaming::{FinishReason, FragmentStream, StreamEvent};
use crate::{DONE_SENTINEL, ERROR_MARKER};

const DATA_PREFIX: &str = "data: ";

/// Strategy for turning a frame payload into display text
pub trait FrameDecoder: Send {
    /// Decode a `data: ` payload. `Ok(None)` drops the frame.
    fn decode_payload(&self, payload: &str) -> Result<Option<String>, StreamError>;

    /// Check if this payload signals end of stream
    fn is_done_marker(&self, payload: &str) -> bool {
        payload == DONE_SENTINEL
    }
}

/// Payloads are raw text, concatenated verbatim.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawTextDecoder;

impl FrameDecoder for RawTextDecoder {
    fn decode_payload(&self, payload: &str) -> Result<Option<String>, StreamError> {
        if payload.is_empty() {
            return Ok(None);
        }
        Ok(Some(payload.to_string()))
    }
}

enum FrameOutcome {
    Skip,
    Done,
    Fragment(String),
}

fn decode_frame<D: FrameDecoder>(
    decoder: &D,
    frame: &str,
    first_fragment: bool,
) -> Result<FrameOutcome, StreamError> {
    // Comment frames (`:hb` heartbeats) and non-data fields carry no text.
    let Some(payload) = frame.strip_prefix(DATA_PREFIX) else {
        return Ok(FrameOutcome::Skip);
    };

    if decoder.is_done_marker(payload) {
        return Ok(FrameOutcome::Done);
    }

    if first_fragment && payload.starts_with(ERROR_MARKER) {
        return Err(StreamError::GenerationFailed(payload.trim().to_string()));
    }

    Ok(match decoder.decode_payload(payload)? {
        Some(text) => FrameOutcome::Fragment(text),
        None => FrameOutcome::Skip,
    })
}

/// Decode a chunked event-stream transport into text fragments.
///
/// Yields one `StreamEvent::Fragment` per data frame, then exactly one
/// `StreamEvent::Completed` carrying the concatenated text. A transport error
/// before the first fragment yields `StreamFailed` instead; after it, the
/// partial text completes with `FinishReason::Interrupted`.
///
/// The returned stream is lazy: reads only happen while it is polled, and
/// dropping it drops the transport.
pub fn decode_frame_stream<S, B, E, D>(transport: S, decoder: D) -> FragmentStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Display + Send + 'static,
    D: FrameDecoder + 'static,
{
    Box::pin(async_stream::stream! {
        let mut transport = Box::pin(transport);
        let mut buffer = CircularFrameBuffer::with_capacity(4096);
        let mut text = String::new();
        let mut fragments = 0usize;
        let mut finish = FinishReason::Closed;

        'read: loop {
            match transport.next().await {
                Some(Ok(bytes)) => {
                    buffer.extend(bytes.as_ref());

                    // Process all complete frames in buffer
                    while let Some(frame) = buffer.next_frame() {
                        match decode_frame(&decoder, &frame, fragments == 0) {
                            Ok(FrameOutcome::Skip) => continue,
                            Ok(FrameOutcome::Done) => {
                                finish = FinishReason::Sentinel;
                                break 'read;
                            }
                            Ok(FrameOutcome::Fragment(content)) => {
                                text.push_str(&content);
                                fragments += 1;
                                yield Ok(StreamEvent::Fragment { content });
                            }
                            Err(e) => {
                                tracing::warn!(error = %e, "generator refused request");
                                yield Err(e);
                                return;
                            }
                        }
                    }
                }
                Some(Err(e)) => {
                    if fragments == 0 {
                        tracing::warn!(error = %e, "transport failed before first fragment");
                        yield Err(StreamError::StreamFailed(e.to_string()));
                        return;
                    }
                    tracing::warn!(error = %e, fragments, "transport failed mid-stream, keeping partial text");
                    finish = FinishReason::Interrupted { error: e.to_string() };
                    break 'read;
                }
                None => {
                    // Unterminated trailing frame: emit rather than drop it.
                    if let Some(rest) = buffer.take_remainder() {
                        match decode_frame(&decoder, &rest, fragments == 0) {
                            Ok(FrameOutcome::Fragment(content)) => {
                                text.push_str(&content);
                                fragments += 1;
                                yield Ok(StreamEvent::Fragment { content });
                            }
                            Ok(FrameOutcome::Done) => finish = FinishReason::Sentinel,
                            Ok(FrameOutcome::Skip) => {}
                            Err(e) => {
                                yield Err(e);
                                return;
                            }
                        }
                    }
                    break 'read;
                }
            }
        }

        tracing::debug!(fragments, chars = text.len(), "generation stream finished");
        yield Ok(StreamEvent::Completed { text, finish });
    })
}
