//! Agora Core - Foundation crate for the Agora forum client.
//!
//! This crate provides shared types, error handling, configuration management,
//! and logging setup that the extraction, session and page crates depend on.
//!
//! # Modules
//!
//! - [`error`] - Central error types using thiserror
//! - [`config`] - TOML-based configuration with XDG paths
//! - [`types`] - Shared newtypes (`Username`, `TopicId`, `SessionId`)
//! - [`logging`] - Tracing subscriber setup for embedding applications
//!
//! # Example
//!
//! ```rust
//! use agora_core::{AppConfig, TopicId};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::default();
//! config.validate()?;
//!
//! let topic = TopicId::from_link("/t/1024#reply12")?;
//! assert_eq!(topic.get(), 1024);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod config;
pub mod error;
pub mod logging;
pub mod types;

// Re-export commonly used types
pub use config::{AppConfig, ExtractionConfig, SessionConfig, SiteConfig};
pub use error::{AgoraError, ConfigError, ConfigResult, Result};
pub use types::{SessionId, TopicId, Username};
