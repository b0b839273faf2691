//! Infrastructure layer module
//!
//! This module contains the concrete implementations behind the domain ports:
//! - Model provider clients (Anthropic, OpenAI-compatible) with rate limiting and retry
//! - File-backed datasets
//! - Completion audit stores
//! - Configuration management
//! - Logging infrastructure

pub mod config;
pub mod dataset;
pub mod llm;
pub mod logging;
pub mod store;
