//! Gemini REST client implementing packsmith's image, masked-edit and chat ports.
#![deny(unsafe_code)]
// `DefaultGeminiClient` is meant to be used through the core ports, not its
// generic backend structure
#![allow(private_interfaces)]

mod client;
mod config;
mod error;
mod http;
mod models;
mod port;

pub use client::DefaultGeminiClient;
pub use config::{DEFAULT_CHAT_MODEL, GeminiConfig};
pub use error::{GeminiError, GeminiResult};
pub use port::UnconfiguredGemini;

