// Document generation: CVs, cover letters and recruitment emails.
// All LLM calls go through llm_client.

pub mod generator;
pub mod handlers;
pub mod prompts;
