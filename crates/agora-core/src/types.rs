//! Shared types used across the Agora crates.
//!
//! This module defines common newtypes that provide type safety
//! and clear domain modeling.

use crate::error::AgoraError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Newtype for forum member names with validation.
///
/// Usernames are 1-32 characters of ASCII letters, digits or underscores.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Username(String);

impl Username {
    /// Create a new `Username` from a string.
    ///
    /// # Errors
    /// Returns error if the name doesn't match the required format.
    pub fn new(name: impl Into<String>) -> Result<Self, AgoraError> {
        let name = name.into();
        Self::validate(&name)?;
        Ok(Self(name))
    }

    /// Get the inner string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(name: &str) -> Result<(), AgoraError> {
        static USERNAME_REGEX: OnceLock<Regex> = OnceLock::new();
        let regex =
            USERNAME_REGEX.get_or_init(|| Regex::new(r"^[A-Za-z0-9_]{1,32}$").expect("valid regex"));

        if regex.is_match(name) {
            Ok(())
        } else {
            Err(AgoraError::Validation(format!(
                "invalid username: must be 1-32 letters, digits or underscores, got '{name}'"
            )))
        }
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Numeric topic identifier, as it appears in `/t/<id>` links.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TopicId(u64);

impl TopicId {
    /// Wrap a raw topic number.
    #[must_use]
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw topic number.
    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }

    /// Parse a topic id out of a topic link.
    ///
    /// Accepts relative and absolute links; the `#reply` fragment and any
    /// query string are ignored.
    ///
    /// # Errors
    /// Returns error if the link does not contain a `/t/<digits>` segment.
    pub fn from_link(link: &str) -> Result<Self, AgoraError> {
        static TOPIC_LINK_REGEX: OnceLock<Regex> = OnceLock::new();
        let regex =
            TOPIC_LINK_REGEX.get_or_init(|| Regex::new(r"/t/(\d+)").expect("valid regex"));

        regex
            .captures(link)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse().ok())
            .map(Self)
            .ok_or_else(|| AgoraError::Validation(format!("not a topic link: '{link}'")))
    }
}

impl fmt::Display for TopicId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of one logical (per-user) session.
///
/// Used as the opaque key under which session state is persisted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    /// Create a new random `SessionId` using UUID v4.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Restore a session id previously produced by [`SessionId::generate`].
    ///
    /// # Errors
    /// Returns error if the value is not a UUID.
    pub fn parse(id: &str) -> Result<Self, AgoraError> {
        uuid::Uuid::parse_str(id)
            .map(|uuid| Self(uuid.to_string()))
            .map_err(|e| AgoraError::Validation(format!("invalid session ID '{id}': {e}")))
    }

    /// Get the inner string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
