pub mod buffer_utils;
pub mod config;
pub mod error;
pub mod http;
pub mod streaming;
pub mod traits;

pub use traits::{Generator, GenerationOptions, GenerationRequest, ResponseStyle};

pub use buffer_utils::{decode_frame_stream, CircularFrameBuffer, FrameDecoder, RawTextDecoder};
pub use config::GeneratorConfig;
pub use error::{Result, StreamError};
pub use http::HttpGenerator;
pub use streaming::{collect_completion, Completion, FinishReason, FragmentStream, StreamEvent};

/// Payload that marks the end of a generation stream.
pub const DONE_SENTINEL: &str = "[DONE]";

/// Prefix the generator puts on an in-band refusal.
pub const ERROR_MARKER: &str = "[AiO Error]";
