pub mod llm_provider;
pub mod progress;
pub mod session;
pub mod story;
pub mod translation;
