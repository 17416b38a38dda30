//! Inference service clients.

pub mod ollama;

pub use ollama::Ollama;
