mod frame_buffer;
mod sse_parser;

pub use frame_buffer::CircularFrameBuffer;
pub use sse_parser::{decode_frame_stream, FrameDecoder, RawTextDecoder};
