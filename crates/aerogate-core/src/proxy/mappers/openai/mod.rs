//! OpenAI ChatCompletions ↔ Gemini translation.

pub mod request;
pub mod response;

pub use request::build_generate_request;
pub use response::transform_response;
