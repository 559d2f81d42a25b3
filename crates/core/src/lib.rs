//! # Corretor Core
//!
//! Domain types, traits, and error definitions for the Corretor listings
//! assistant. This crate has **no framework dependencies**: it defines the
//! model every other crate implements against.
//!
//! ## Design Philosophy
//!
//! The two external collaborators of a chat turn are traits here:
//! - [`Provider`] streams completions from an LLM backend
//! - [`DataFetchTool`] fetches the listings data the model asks for
//!
//! Implementations live in `corretor-providers` and `corretor-tools`, so the
//! turn pipeline can be exercised against scripted stand-ins in tests.

pub mod error;
pub mod message;
pub mod provider;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use error::{Error, ProviderError, Result, ToolError};
pub use message::{Message, Role};
pub use provider::{ChunkReceiver, Provider, ProviderRequest, ProviderResponse, StreamChunk, Usage};
pub use tool::DataFetchTool;
