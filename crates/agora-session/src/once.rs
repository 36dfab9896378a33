//! Single-use anti-forgery tokens.
//!
//! Every mutating request must carry the `once` value from a freshly
//! rendered page, and the site rejects a replayed one without saying why.
//! A [`OnceLedger`] remembers the tokens this session already spent so a
//! replay fails locally, before a request is sent.
//!
//! The lifecycle is encoded in types: a raw string becomes a shape-checked
//! [`OnceToken`], and [`OnceLedger::spend`] turns that into a [`SpentOnce`],
//! the only form request preparation accepts.

use crate::error::TokenError;
use regex::Regex;
use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::sync::{Mutex, OnceLock};
use tracing::{debug, trace};

/// Whether `token` looks like a once-token: 16 to 64 ASCII alphanumerics.
///
/// A local sanity check only; the server may still reject it.
#[must_use]
pub fn is_valid_shape(token: &str) -> bool {
    static SHAPE_REGEX: OnceLock<Regex> = OnceLock::new();
    SHAPE_REGEX
        .get_or_init(|| Regex::new(r"^[A-Za-z0-9]{16,64}$").expect("valid once token regex"))
        .is_match(token)
}

/// A token that passed the shape check but has not been spent.
#[derive(PartialEq, Eq)]
pub struct OnceToken(String);

impl OnceToken {
    /// Shape-check a raw token.
    pub fn parse(raw: &str) -> Result<Self, TokenError> {
        if is_valid_shape(raw) {
            Ok(Self(raw.to_string()))
        } else {
            Err(TokenError::InvalidShape {
                length: raw.chars().count(),
            })
        }
    }

    /// The token text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for OnceToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OnceToken(<{} chars>)", self.0.len())
    }
}

/// A token recorded as used; it may be sent exactly once.
#[derive(PartialEq, Eq)]
pub struct SpentOnce(String);

impl SpentOnce {
    /// The token text, for the request form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume into the token text.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Debug for SpentOnce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SpentOnce(<{} chars>)", self.0.len())
    }
}

#[derive(Debug, Default)]
struct History {
    order: VecDeque<String>,
    members: HashSet<String>,
}

/// Bounded record of the tokens one session has spent.
///
/// Once `cap` tokens are recorded the oldest is forgotten for each new
/// one. Every operation holds one mutex, so [`OnceLedger::validate_and_mark`]
/// is atomic with respect to concurrent callers.
#[derive(Debug)]
pub struct OnceLedger {
    cap: usize,
    history: Mutex<History>,
}

impl OnceLedger {
    /// Create a ledger remembering up to `cap` tokens (at least one).
    #[must_use]
    pub fn new(cap: usize) -> Self {
        Self {
            cap: cap.max(1),
            history: Mutex::new(History::default()),
        }
    }

    /// See [`is_valid_shape`].
    #[must_use]
    pub fn is_valid_shape(token: &str) -> bool {
        is_valid_shape(token)
    }

    /// Whether `token` is in the history.
    #[must_use]
    pub fn is_used(&self, token: &str) -> bool {
        self.history
            .lock()
            .expect("acquire lock on once history")
            .members
            .contains(token)
    }

    /// Record `token` as used. Recording a known token is a no-op.
    pub fn mark_used(&self, token: &str) {
        let mut history = self.history.lock().expect("acquire lock on once history");
        self.insert(&mut history, token);
    }

    /// Shape-check, then check-and-mark in one step.
    ///
    /// An invalid token is never recorded.
    pub fn validate_and_mark(&self, token: &str) -> Result<(), TokenError> {
        if !is_valid_shape(token) {
            debug!(length = token.len(), "rejected once token with invalid shape");
            return Err(TokenError::InvalidShape {
                length: token.chars().count(),
            });
        }

        let mut history = self.history.lock().expect("acquire lock on once history");
        if history.members.contains(token) {
            debug!("rejected reused once token");
            return Err(TokenError::AlreadyUsed);
        }
        self.insert(&mut history, token);
        Ok(())
    }

    /// Spend a shape-checked token.
    pub fn spend(&self, token: OnceToken) -> Result<SpentOnce, TokenError> {
        self.validate_and_mark(token.as_str())?;
        Ok(SpentOnce(token.0))
    }

    /// Number of remembered tokens.
    #[must_use]
    pub fn len(&self) -> usize {
        self.history
            .lock()
            .expect("acquire lock on once history")
            .order
            .len()
    }

    /// True when no token has been spent.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of remembered tokens.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.cap
    }

    fn insert(&self, history: &mut History, token: &str) {
        if !history.members.insert(token.to_string()) {
            return;
        }
        history.order.push_back(token.to_string());
        while history.order.len() > self.cap {
            if let Some(oldest) = history.order.pop_front() {
                history.members.remove(&oldest);
                trace!("evicted oldest once token");
            }
        }
    }
}
