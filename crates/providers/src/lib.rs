pub mod openai_compat;
pub mod title;
pub mod traits;
pub(crate) mod util;

// Re-exports for convenience.
pub use openai_compat::OpenAiCompatProvider;
pub use title::{LlmTitleGenerator, TitleGenerator};
pub use traits::{ChatRequest, ChatResponse, LlmProvider};
pub use util::resolve_api_key;
