//! The in-memory cookie store shared by every request of one session.

use crate::cookie::Cookie;
use crate::error::Result;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::RwLock;
use tracing::{debug, warn};
use url::Url;

/// Transport-neutral view of a response: where it came from, its status
/// and its raw `Set-Cookie` header values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseHead {
    /// Final URL the response was served from
    pub url: Url,
    /// HTTP status code
    pub status: u16,
    /// Every `Set-Cookie` header value, in received order
    pub set_cookies: Vec<String>,
}

impl ResponseHead {
    /// A response with no cookies.
    #[must_use]
    pub fn new(url: Url, status: u16) -> Self {
        Self {
            url,
            status,
            set_cookies: Vec::new(),
        }
    }

    /// Add a `Set-Cookie` header value.
    #[must_use]
    pub fn with_set_cookie(mut self, header: impl Into<String>) -> Self {
        self.set_cookies.push(header.into());
        self
    }
}

/// Storage the transport reads cookies from and records cookies into.
///
/// Implementations must be shareable across concurrent requests.
pub trait CookieStore: Send + Sync {
    /// Unexpired cookies to send to `origin`, most specific path first.
    fn get_cookies_for(&self, origin: &Url) -> Vec<Cookie>;

    /// Apply the response's `Set-Cookie` headers.
    fn record_cookies(&self, response: &ResponseHead);

    /// Forget every cookie.
    fn clear(&self);
}

type CookieKey = (String, String, String);

/// [`CookieStore`] backed by a map under one `RwLock`.
///
/// Reads share the lock; recording and clearing take it exclusively, so
/// concurrent responses for the same session never lose each other's
/// updates.
#[derive(Debug, Default)]
pub struct CookieJar {
    cookies: RwLock<HashMap<CookieKey, Cookie>>,
}

impl CookieJar {
    /// Create an empty jar.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cookies matching `origin` that are unexpired at `now`.
    #[must_use]
    pub fn cookies_at(&self, origin: &Url, now: DateTime<Utc>) -> Vec<Cookie> {
        let cookies = self.cookies.read().expect("acquire read lock on cookies");
        let mut matching: Vec<Cookie> = cookies
            .values()
            .filter(|c| !c.is_expired(now) && c.matches(origin))
            .cloned()
            .collect();
        matching.sort_by(|a, b| {
            b.path()
                .len()
                .cmp(&a.path().len())
                .then_with(|| a.name().cmp(b.name()))
        });
        matching
    }

    /// Record `response`'s cookies as of `now`.
    ///
    /// Error responses (status 400 and above) are ignored. A cookie that is
    /// already expired removes any stored cookie with the same key.
    pub fn record_at(&self, response: &ResponseHead, now: DateTime<Utc>) {
        if response.status >= 400 || response.set_cookies.is_empty() {
            return;
        }

        let parsed: Vec<Cookie> = response
            .set_cookies
            .iter()
            .filter_map(|header| match Cookie::parse(header, &response.url, now) {
                Ok(cookie) => Some(cookie),
                Err(e) => {
                    warn!(url = %response.url, error = %e, "ignoring Set-Cookie header");
                    None
                }
            })
            .collect();

        let mut cookies = self.cookies.write().expect("acquire write lock on cookies");
        for cookie in parsed {
            if cookie.is_expired(now) {
                cookies.remove(&cookie.key());
            } else {
                cookies.insert(cookie.key(), cookie);
            }
        }
        debug!(url = %response.url, stored = cookies.len(), "recorded cookies");
    }

    /// `Cookie` header value for `origin`, or `None` when nothing matches.
    #[must_use]
    pub fn cookie_header(&self, origin: &Url) -> Option<String> {
        let cookies = self.get_cookies_for(origin);
        if cookies.is_empty() {
            return None;
        }
        Some(
            cookies
                .iter()
                .map(Cookie::pair)
                .collect::<Vec<_>>()
                .join("; "),
        )
    }

    /// Insert a cookie directly, replacing any with the same key.
    pub fn insert(&self, cookie: Cookie) {
        self.cookies
            .write()
            .expect("acquire write lock on cookies")
            .insert(cookie.key(), cookie);
    }

    /// Number of stored cookies, expired ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cookies.read().expect("acquire read lock on cookies").len()
    }

    /// True when the jar holds no cookies.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Serialize the unexpired cookies into an opaque blob.
    pub fn export(&self) -> Result<String> {
        let now = Utc::now();
        let cookies = self.cookies.read().expect("acquire read lock on cookies");
        let mut live: Vec<&Cookie> = cookies.values().filter(|c| !c.is_expired(now)).collect();
        live.sort_by_key(|c| c.key());
        Ok(serde_json::to_string(&live)?)
    }

    /// Merge cookies from a blob produced by [`CookieJar::export`].
    ///
    /// Returns how many unexpired cookies were imported.
    pub fn import(&self, blob: &str) -> Result<usize> {
        let incoming: Vec<Cookie> = serde_json::from_str(blob)?;
        let now = Utc::now();
        let mut cookies = self.cookies.write().expect("acquire write lock on cookies");
        let mut imported = 0;
        for cookie in incoming.into_iter().filter(|c| !c.is_expired(now)) {
            cookies.insert(cookie.key(), cookie);
            imported += 1;
        }
        debug!(imported, "imported cookies");
        Ok(imported)
    }
}

impl CookieStore for CookieJar {
    fn get_cookies_for(&self, origin: &Url) -> Vec<Cookie> {
        self.cookies_at(origin, Utc::now())
    }

    fn record_cookies(&self, response: &ResponseHead) {
        self.record_at(response, Utc::now());
    }

    fn clear(&self) {
        self.cookies
            .write()
            .expect("acquire write lock on cookies")
            .clear();
        debug!("cleared cookies");
    }
}
