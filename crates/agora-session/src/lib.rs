//! Agora Session - Authentication state shared across requests.
//!
//! The forum has no mutation API: writes are ordinary form posts that only
//! succeed with the right session cookies and a fresh single-use `once`
//! token scraped from a page. This crate owns both pieces of state.
//!
//! # Components
//!
//! - **Cookies** ([`cookie`], [`jar`]): `Set-Cookie` parsing and the
//!   [`CookieStore`] the transport reads from and records into
//! - **Persistence** ([`persistence`]): optional durable storage of the
//!   jar as an opaque blob
//! - **Once tokens** ([`once`]): shape checks and the bounded spent-token
//!   history that rejects replays before they reach the network
//! - **Sessions** ([`session`]): [`UserSession`] ties the above together
//!
//! # Example
//!
//! ```rust
//! use agora_core::SessionConfig;
//! use agora_session::{CookieStore, OnceToken, ResponseHead, TokenError, UserSession};
//! use url::Url;
//!
//! let session = UserSession::new(&SessionConfig::default());
//! let origin = Url::parse("https://www.v2ex.com/").unwrap();
//! session
//!     .cookies()
//!     .record_cookies(&ResponseHead::new(origin.clone(), 200).with_set_cookie("A2=t; Path=/"));
//! assert_eq!(session.cookies().cookie_header(&origin).as_deref(), Some("A2=t"));
//!
//! let ledger = session.once_ledger();
//! let token = OnceToken::parse("k9Xh2LmQ7pRt4WvZ").unwrap();
//! let spent = ledger.spend(token).unwrap();
//! assert_eq!(spent.as_str(), "k9Xh2LmQ7pRt4WvZ");
//! assert_eq!(ledger.validate_and_mark("k9Xh2LmQ7pRt4WvZ"), Err(TokenError::AlreadyUsed));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod cookie;
#[allow(missing_docs)]
pub mod error;
pub mod jar;
pub mod once;
pub mod persistence;
pub mod session;

// Re-export commonly used types
pub use cookie::Cookie;
pub use error::{CookieError, Result, SessionError, TokenError};
pub use jar::{CookieJar, CookieStore, ResponseHead};
pub use once::{is_valid_shape, OnceLedger, OnceToken, SpentOnce};
pub use persistence::{FilePersistence, SessionPersistence};
pub use session::UserSession;
