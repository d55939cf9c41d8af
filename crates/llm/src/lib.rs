//! Answering provider integration for the notebook.
//!
//! A provider-agnostic abstraction over the LLM backends the notebook can
//! dispatch questions to.
//!
//! # Providers
//! - **Ollama**: Local LLM runtime (default, no citations)
//! - **Gemini**: Google Generative Language API with search grounding
//!
//! # Example
//! ```no_run
//! use notebook_llm::{create_client, LlmRequest};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = create_client("ollama", None, None, Duration::from_secs(60))?;
//! let request = LlmRequest::new("Hello, world!", "llama3.2");
//! let response = client.complete(&request).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;
pub mod types;

// Re-export main types
pub use client::{GroundingChunk, LlmClient, LlmRequest, LlmResponse, LlmUsage, WebReference};
pub use factory::create_client;
pub use providers::{GeminiClient, OllamaClient};
pub use types::ProviderType;
