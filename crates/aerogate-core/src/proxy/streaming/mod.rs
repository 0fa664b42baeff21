//! Incremental streaming re-encoder.
//!
//! Consumes the provider's SSE byte stream and re-emits it, chunk for
//! chunk, in the client's streaming shape. One state machine drives both
//! output shapes; the wire envelope is the only thing a strategy decides.

mod claude_format;
mod line_buffer;
mod openai_format;
mod pump;
mod state;

pub use claude_format::ClaudeFormat;
pub use line_buffer::SseLineBuffer;
pub use openai_format::OpenAiFormat;
pub use pump::recode_stream;
pub use state::{BlockKind, OutputFormat, StreamState};
