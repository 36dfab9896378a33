//! A single cookie and the `Set-Cookie` subset the forum relies on.

use crate::error::CookieError;
use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// A stored cookie.
///
/// `domain` is always lowercase and without a leading dot. When the server
/// sent no `Domain` attribute the cookie is host-only and matches exactly
/// the host that set it.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cookie {
    name: String,
    value: String,
    domain: String,
    host_only: bool,
    path: String,
    expires: Option<DateTime<Utc>>,
    secure: bool,
    http_only: bool,
}

impl Cookie {
    /// Parse a `Set-Cookie` header received from `request_url` at `now`.
    ///
    /// Unknown attributes and unparseable `Expires` dates are ignored.
    /// `Max-Age` takes precedence over `Expires` wherever it appears.
    pub fn parse(set_cookie: &str, request_url: &Url, now: DateTime<Utc>) -> Result<Self, CookieError> {
        let host = request_url
            .host_str()
            .ok_or(CookieError::NoHost)?
            .to_ascii_lowercase();

        let mut parts = set_cookie.split(';');
        let (name, value) = parts
            .next()
            .and_then(|pair| pair.split_once('='))
            .map(|(name, value)| (name.trim(), value.trim()))
            .ok_or(CookieError::Malformed)?;
        if name.is_empty() {
            return Err(CookieError::Malformed);
        }

        let mut domain = None;
        let mut path = None;
        let mut expires = None;
        let mut max_age = None;
        let mut secure = false;
        let mut http_only = false;

        for attribute in parts {
            let (key, val) = match attribute.split_once('=') {
                Some((key, val)) => (key.trim(), val.trim()),
                None => (attribute.trim(), ""),
            };
            match key.to_ascii_lowercase().as_str() {
                "domain" => {
                    let d = val.trim_start_matches('.').to_ascii_lowercase();
                    if !d.is_empty() {
                        domain = Some(d);
                    }
                }
                "path" if val.starts_with('/') => path = Some(val.to_string()),
                "expires" => expires = parse_expires(val).or(expires),
                "max-age" => {
                    if let Ok(seconds) = val.parse::<i64>() {
                        max_age = Some(if seconds <= 0 {
                            now
                        } else {
                            now + Duration::seconds(seconds)
                        });
                    }
                }
                "secure" => secure = true,
                "httponly" => http_only = true,
                _ => {}
            }
        }

        let (domain, host_only) = match domain {
            Some(d) if domain_matches(&host, &d) => (d, false),
            Some(d) => return Err(CookieError::DomainMismatch { domain: d, host }),
            None => (host, true),
        };

        Ok(Self {
            name: name.to_string(),
            value: value.to_string(),
            domain,
            host_only,
            path: path.unwrap_or_else(|| default_path(request_url)),
            expires: max_age.or(expires),
            secure,
            http_only,
        })
    }

    /// A session cookie valid for every path on `domain`.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: domain.into().trim_start_matches('.').to_ascii_lowercase(),
            host_only: false,
            path: "/".to_string(),
            expires: None,
            secure: false,
            http_only: false,
        }
    }

    /// Cookie name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Cookie value.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Domain the cookie is scoped to.
    #[must_use]
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Path the cookie is scoped to.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Absolute expiry, or `None` for a session cookie.
    #[must_use]
    pub fn expires(&self) -> Option<DateTime<Utc>> {
        self.expires
    }

    /// Only sent over HTTPS.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.secure
    }

    /// Hidden from page scripts.
    #[must_use]
    pub fn is_http_only(&self) -> bool {
        self.http_only
    }

    /// Matches only the exact host that set it.
    #[must_use]
    pub fn is_host_only(&self) -> bool {
        self.host_only
    }

    /// True once `now` has reached the expiry.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires.is_some_and(|at| at <= now)
    }

    /// Whether this cookie should be sent with a request to `url`.
    #[must_use]
    pub fn matches(&self, url: &Url) -> bool {
        let Some(host) = url.host_str() else {
            return false;
        };
        let host = host.to_ascii_lowercase();
        let domain_ok = if self.host_only {
            host == self.domain
        } else {
            domain_matches(&host, &self.domain)
        };
        domain_ok
            && path_matches(url.path(), &self.path)
            && (!self.secure || url.scheme() == "https")
    }

    /// Storage identity: a later cookie with the same key replaces this one.
    pub(crate) fn key(&self) -> (String, String, String) {
        (self.name.clone(), self.domain.clone(), self.path.clone())
    }

    /// `name=value`, as sent in a `Cookie` request header.
    #[must_use]
    pub fn pair(&self) -> String {
        format!("{}={}", self.name, self.value)
    }
}

impl fmt::Debug for Cookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cookie")
            .field("name", &self.name)
            .field("value", &"<redacted>")
            .field("domain", &self.domain)
            .field("host_only", &self.host_only)
            .field("path", &self.path)
            .field("expires", &self.expires)
            .field("secure", &self.secure)
            .field("http_only", &self.http_only)
            .finish()
    }
}

fn domain_matches(host: &str, domain: &str) -> bool {
    host == domain
        || host
            .strip_suffix(domain)
            .is_some_and(|prefix| prefix.ends_with('.'))
}

fn path_matches(request_path: &str, cookie_path: &str) -> bool {
    if request_path == cookie_path {
        return true;
    }
    request_path.strip_prefix(cookie_path).is_some_and(|rest| {
        cookie_path.ends_with('/') || rest.starts_with('/')
    })
}

/// Directory of the request path, or `/` at the top level.
fn default_path(url: &Url) -> String {
    let path = url.path();
    match path.rfind('/') {
        Some(0) | None => "/".to_string(),
        Some(i) => path[..i].to_string(),
    }
}

fn parse_expires(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(at) = DateTime::parse_from_rfc2822(value) {
        return Some(at.with_timezone(&Utc));
    }
    ["%a, %d-%b-%Y %H:%M:%S GMT", "%a, %d-%b-%y %H:%M:%S GMT"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|naive| naive.and_utc())
}
