//! The write path: turning a user action into a ready-to-send request.
//!
//! The forum has no mutation API. Every write is a plain GET or form POST
//! that carries the session cookies and a once-token scraped from the page
//! the action started on. [`prepare`] spends that token before building
//! anything, so a double submit fails here instead of at the server.

use crate::error::{ActionError, Result};
use crate::signin::SigninFields;
use agora_core::TopicId;
use agora_session::{OnceToken, SpentOnce, UserSession};
use serde::Serialize;
use std::fmt;
use tracing::{debug, info};
use url::Url;

/// HTTP method of a prepared request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Method {
    /// `GET`
    Get,
    /// `POST` with a urlencoded form body
    Post,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Get => f.write_str("GET"),
            Self::Post => f.write_str("POST"),
        }
    }
}

/// A mutating action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    /// Submit the sign-in form using the names scraped from it.
    Signin {
        /// Randomized input names from the same render as the once-token
        fields: SigninFields,
        /// Username or email
        username: String,
        /// Password
        password: String,
        /// Captcha answer
        captcha: String,
    },
    /// Post a reply to a topic.
    Reply {
        /// Topic replied to
        topic: TopicId,
        /// Reply body
        content: String,
    },
    /// Add a topic to favorites.
    FavoriteTopic {
        /// Topic to favorite
        topic: TopicId,
    },
    /// Thank the author of a reply.
    ThankReply {
        /// Reply id, from [`Reply::reply_id`](crate::Reply::reply_id)
        reply: u64,
    },
    /// Up- or down-vote a topic.
    VoteTopic {
        /// Topic voted on
        topic: TopicId,
        /// `true` for an up-vote
        up: bool,
    },
    /// Redeem the daily check-in reward.
    CheckIn,
}

impl Mutation {
    /// Short name for logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Signin { .. } => "signin",
            Self::Reply { .. } => "reply",
            Self::FavoriteTopic { .. } => "favorite_topic",
            Self::ThankReply { .. } => "thank_reply",
            Self::VoteTopic { .. } => "vote_topic",
            Self::CheckIn => "check_in",
        }
    }
}

/// A request ready for the transport.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct PreparedRequest {
    /// HTTP method
    pub method: Method,
    /// Absolute target URL
    pub url: Url,
    /// Form fields for `POST`; empty for `GET`
    pub form: Vec<(String, String)>,
    /// `Cookie` header for `url`, if the session has matching cookies
    pub cookie_header: Option<String>,
}

impl fmt::Debug for PreparedRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields: Vec<&str> = self.form.iter().map(|(name, _)| name.as_str()).collect();
        f.debug_struct("PreparedRequest")
            .field("method", &self.method)
            .field("url", &self.url.path())
            .field("form_fields", &fields)
            .field("has_cookies", &self.cookie_header.is_some())
            .finish()
    }
}

/// Spend `raw_once` and build the request for `mutation`.
///
/// `raw_once` is the token scraped from the page the action started on;
/// `None` fails with [`ActionError::MissingOnce`]. The token is validated
/// and marked used before anything else, so a reused or malformed token
/// yields no request at all.
pub fn prepare(
    session: &UserSession,
    base: &Url,
    mutation: Mutation,
    raw_once: Option<&str>,
) -> Result<PreparedRequest> {
    let raw = raw_once.ok_or(ActionError::MissingOnce)?;
    let once = session.once_ledger().spend(OnceToken::parse(raw)?)?;
    let kind = mutation.kind();
    let is_signin = matches!(mutation, Mutation::Signin { .. });

    let (method, url, form) = build(base, mutation, once)?;
    let cookie_header = session.cookies().cookie_header(&url);

    debug!(
        session = %session.id(),
        action = kind,
        method = %method,
        path = url.path(),
        "prepared request"
    );
    if is_signin {
        info!(session = %session.id(), "prepared sign-in");
    }

    Ok(PreparedRequest {
        method,
        url,
        form,
        cookie_header,
    })
}

fn build(
    base: &Url,
    mutation: Mutation,
    once: SpentOnce,
) -> Result<(Method, Url, Vec<(String, String)>)> {
    let with_once = |path: &str| -> Result<Url> {
        let mut url = base.join(path)?;
        url.query_pairs_mut().append_pair("once", once.as_str());
        Ok(url)
    };

    let request = match mutation {
        Mutation::Signin {
            fields,
            username,
            password,
            captcha,
        } => (
            Method::Post,
            base.join("/signin")?,
            vec![
                (fields.username, username),
                (fields.password, password),
                (fields.captcha, captcha),
                ("once".to_string(), once.as_str().to_string()),
                ("next".to_string(), "/".to_string()),
            ],
        ),
        Mutation::Reply { topic, content } => (
            Method::Post,
            base.join(&format!("/t/{}", topic.get()))?,
            vec![
                ("content".to_string(), content),
                ("once".to_string(), once.as_str().to_string()),
            ],
        ),
        Mutation::FavoriteTopic { topic } => (
            Method::Get,
            with_once(&format!("/favorite/topic/{}", topic.get()))?,
            Vec::new(),
        ),
        Mutation::ThankReply { reply } => (
            Method::Post,
            with_once(&format!("/thank/reply/{reply}"))?,
            Vec::new(),
        ),
        Mutation::VoteTopic { topic, up } => {
            let direction = if up { "up" } else { "down" };
            (
                Method::Post,
                with_once(&format!("/{direction}/topic/{}", topic.get()))?,
                Vec::new(),
            )
        }
        Mutation::CheckIn => (
            Method::Get,
            with_once("/mission/daily/redeem")?,
            Vec::new(),
        ),
    };
    Ok(request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use agora_core::SessionConfig;
    use agora_session::{CookieStore, ResponseHead, TokenError};

    const ONCE: &str = "Fh3kP9sQ2wXz7LmN";

    fn base() -> Url {
        Url::parse("https://www.v2ex.com").expect("valid base")
    }

    fn session() -> UserSession {
        let session = UserSession::new(&SessionConfig::default());
        session.cookies().record_cookies(
            &ResponseHead::new(base(), 200).with_set_cookie("A2=signed; Path=/"),
        );
        session
    }

    #[test]
    fn test_reply_is_form_post() {
        let session = session();
        let request = prepare(
            &session,
            &base(),
            Mutation::Reply {
                topic: TopicId::new(1024),
                content: "hello".to_string(),
            },
            Some(ONCE),
        )
        .expect("prepare reply");

        assert_eq!(request.method, Method::Post);
        assert_eq!(request.url.as_str(), "https://www.v2ex.com/t/1024");
        assert_eq!(
            request.form,
            vec![
                ("content".to_string(), "hello".to_string()),
                ("once".to_string(), ONCE.to_string()),
            ]
        );
        assert_eq!(request.cookie_header.as_deref(), Some("A2=signed"));
        assert!(session.once_ledger().is_used(ONCE));
    }

    #[test]
    fn test_query_once_actions() {
        let session = session();
        let cases = [
            (Mutation::CheckIn, Method::Get, "/mission/daily/redeem"),
            (
                Mutation::FavoriteTopic {
                    topic: TopicId::new(7),
                },
                Method::Get,
                "/favorite/topic/7",
            ),
            (Mutation::ThankReply { reply: 9001 }, Method::Post, "/thank/reply/9001"),
            (
                Mutation::VoteTopic {
                    topic: TopicId::new(7),
                    up: false,
                },
                Method::Post,
                "/down/topic/7",
            ),
        ];
        for (i, (mutation, method, path)) in cases.into_iter().enumerate() {
            let once = format!("{ONCE}{i}");
            let request = prepare(&session, &base(), mutation, Some(once.as_str())).expect("prepare");
            assert_eq!(request.method, method);
            assert_eq!(request.url.path(), path);
            assert_eq!(request.url.query(), Some(format!("once={once}").as_str()));
            assert!(request.form.is_empty());
        }
    }

    #[test]
    fn test_reuse_produces_no_request() {
        let session = session();
        prepare(&session, &base(), Mutation::CheckIn, Some(ONCE)).expect("first use");
        assert_eq!(
            prepare(&session, &base(), Mutation::CheckIn, Some(ONCE)),
            Err(ActionError::Token(TokenError::AlreadyUsed))
        );
    }

    #[test]
    fn test_missing_and_malformed_once() {
        let session = session();
        assert_eq!(
            prepare(&session, &base(), Mutation::CheckIn, None),
            Err(ActionError::MissingOnce)
        );
        assert_eq!(
            prepare(&session, &base(), Mutation::CheckIn, Some("ab$%")),
            Err(ActionError::Token(TokenError::InvalidShape { length: 4 }))
        );
        assert!(session.once_ledger().is_empty());
    }

    #[test]
    fn test_debug_hides_form_values() {
        let session = session();
        let request = prepare(
            &session,
            &base(),
            Mutation::Signin {
                fields: SigninFields {
                    username: "u1".to_string(),
                    password: "p1".to_string(),
                    captcha: "c1".to_string(),
                },
                username: "alice".to_string(),
                password: "hunter2".to_string(),
                captcha: "XKCD".to_string(),
            },
            Some(ONCE),
        )
        .expect("prepare sign-in");
        let shown = format!("{request:?}");
        assert!(!shown.contains("hunter2"));
        assert!(!shown.contains("signed"));
        assert!(shown.contains("p1"));
    }

    #[test]
    fn test_signin_posts_credentials_under_scraped_names() {
        let session = session();
        let mutation = Mutation::Signin {
            fields: SigninFields {
                username: "u9".to_string(),
                password: "p9".to_string(),
                captcha: "c9".to_string(),
            },
            username: "alice".to_string(),
            password: "hunter2".to_string(),
            captcha: "XKCD".to_string(),
        };
        assert_eq!(mutation.kind(), "signin");

        let request = prepare(&session, &base(), mutation, Some(ONCE)).expect("prepare sign-in");
        assert_eq!(request.method, Method::Post);
        assert_eq!(request.url.as_str(), "https://www.v2ex.com/signin");
        assert_eq!(
            request.form,
            vec![
                ("u9".to_string(), "alice".to_string()),
                ("p9".to_string(), "hunter2".to_string()),
                ("c9".to_string(), "XKCD".to_string()),
                ("once".to_string(), ONCE.to_string()),
                ("next".to_string(), "/".to_string()),
            ]
        );
        assert!(session.once_ledger().is_used(ONCE));
    }
}
