//! Response classification and the site's inline problem block.
//!
//! The forum reports many business-rule failures (bad captcha, duplicate
//! reply, too-frequent posting) as ordinary 200 pages with an error
//! fragment rendered into them. Classification therefore checks the
//! transport status first and then searches the body for that fragment.

use crate::engine::Extractor;
use crate::error::PageError;
use crate::schema::{Bindable, FieldSpec, SchemaBuilder};
use scraper::Html;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const PROBLEM_ITEMS: &str = "//div[contains(@class,'problem')]//li";
const PROBLEM_CONTAINER: &str = "//div[contains(@class,'problem')]";

/// Human-readable validation errors rendered by the site.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Problem {
    items: Vec<String>,
    summary: Option<String>,
}

impl Problem {
    /// Build a problem from explicit messages.
    #[must_use]
    pub fn from_messages(messages: Vec<String>) -> Self {
        Self {
            items: messages,
            summary: None,
        }
    }

    /// True iff the block held at least one message.
    #[must_use]
    pub fn has_problem(&self) -> bool {
        !self.messages().is_empty()
    }

    /// The listed errors, or the container's text when it has no list.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        let items: Vec<String> = self
            .items
            .iter()
            .filter(|item| !item.is_empty())
            .cloned()
            .collect();
        if !items.is_empty() {
            return items;
        }
        self.summary
            .iter()
            .filter(|summary| !summary.is_empty())
            .cloned()
            .collect()
    }
}

impl Bindable for Problem {
    const TYPE_NAME: &'static str = "Problem";

    fn bind(schema: SchemaBuilder<Self>) -> SchemaBuilder<Self> {
        schema
            .scalar_list(FieldSpec::text("items", PROBLEM_ITEMS).tolerant(), |p, v| {
                p.items = v;
            })
            .scalar(
                FieldSpec::text("summary", PROBLEM_CONTAINER).tolerant(),
                |p, v| p.summary = Some(v),
            )
    }
}

/// What a caller should do with a fetched response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The session is invalid or forbidden: sign in again.
    Unauthorized,
    /// Any other 4xx.
    ClientError(u16),
    /// 5xx, or a status outside the HTTP range.
    ServerError(u16),
    /// A 2xx/3xx page carrying a populated problem block.
    ValidationFailure(Problem),
    /// Proceed to ordinary extraction.
    Continue,
}

/// Classify by status alone; `None` means the body decides.
#[must_use]
pub fn classify_status(status: u16) -> Option<Outcome> {
    match status {
        401 | 403 => Some(Outcome::Unauthorized),
        400..=499 => Some(Outcome::ClientError(status)),
        100..=399 => None,
        _ => Some(Outcome::ServerError(status)),
    }
}

impl Extractor {
    /// Classify a response: transport status first, then the problem block.
    #[must_use]
    pub fn classify_response(&self, status: u16, body: &str) -> Outcome {
        if let Some(outcome) = classify_status(status) {
            debug!(status, outcome = ?outcome, "classified by status");
            return outcome;
        }
        self.classify_document(&Html::parse_document(body))
    }

    /// Probe an already-parsed 2xx/3xx page for a problem block.
    #[must_use]
    pub fn classify_document(&self, document: &Html) -> Outcome {
        match self.extract::<Problem>(document) {
            Ok(problem) if problem.has_problem() => {
                debug!(count = problem.messages().len(), "page carries a problem block");
                Outcome::ValidationFailure(problem)
            }
            Ok(_) => Outcome::Continue,
            Err(err) => {
                warn!(error = %err, "problem block extraction failed; continuing");
                Outcome::Continue
            }
        }
    }

    /// Classify a response and, if it may proceed, extract `T` from it.
    ///
    /// The body is parsed once and shared by both steps.
    pub fn read<T: Bindable>(&self, status: u16, body: &str) -> Result<T, PageError> {
        if let Some(err) = classify_status(status).and_then(|o| rejection(status, o)) {
            return Err(err);
        }
        let document = Html::parse_document(body);
        match rejection(status, self.classify_document(&document)) {
            Some(err) => Err(err),
            None => self.extract(&document).map_err(PageError::from),
        }
    }
}

/// The error for an outcome that stops the read, `None` for `Continue`.
fn rejection(status: u16, outcome: Outcome) -> Option<PageError> {
    match outcome {
        Outcome::Continue => None,
        Outcome::Unauthorized => Some(PageError::Unauthorized { status }),
        Outcome::ClientError(status) => Some(PageError::ClientError { status }),
        Outcome::ServerError(status) => Some(PageError::ServerError { status }),
        Outcome::ValidationFailure(problem) => Some(PageError::Validation(problem)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExtractionError;
    use crate::registry::SchemaRegistry;
    use std::sync::Arc;

    fn extractor() -> Extractor {
        Extractor::new(Arc::new(SchemaRegistry::new()))
    }

    #[test]
    fn test_classify_status() {
        assert_eq!(classify_status(200), None);
        assert_eq!(classify_status(302), None);
        assert_eq!(classify_status(401), Some(Outcome::Unauthorized));
        assert_eq!(classify_status(403), Some(Outcome::Unauthorized));
        assert_eq!(classify_status(404), Some(Outcome::ClientError(404)));
        assert_eq!(classify_status(503), Some(Outcome::ServerError(503)));
        assert_eq!(classify_status(0), Some(Outcome::ServerError(0)));
    }

    #[test]
    fn test_problem_list_items() {
        let body = r#"
            <div id="Main"><div class="problem">请解决以下问题然后再提交：
              <ul><li>输入的验证码不正确</li><li>用户名和密码无法匹配</li></ul>
            </div></div>
        "#;
        match extractor().classify_response(200, body) {
            Outcome::ValidationFailure(problem) => {
                assert_eq!(
                    problem.messages(),
                    vec!["输入的验证码不正确".to_string(), "用户名和密码无法匹配".to_string()]
                );
            }
            other => panic!("expected validation failure, got {other:?}"),
        }
    }

    #[test]
    fn test_problem_without_list_uses_container_text() {
        let body = r#"<div class="problem">  你回复过于频繁了  </div>"#;
        let outcome = extractor().classify_response(200, body);
        assert_eq!(
            outcome,
            Outcome::ValidationFailure(Problem {
                items: Vec::new(),
                summary: Some("你回复过于频繁了".to_string()),
            })
        );
    }

    #[test]
    fn test_empty_problem_block_continues() {
        let body = r#"<div class="problem"> </div><p>ok</p>"#;
        assert_eq!(extractor().classify_response(200, body), Outcome::Continue);
        assert_eq!(
            extractor().classify_response(200, "<p>fine</p>"),
            Outcome::Continue
        );
    }

    #[test]
    fn test_status_wins_over_body() {
        let body = r#"<div class="problem"><ul><li>x</li></ul></div>"#;
        assert_eq!(
            extractor().classify_response(403, body),
            Outcome::Unauthorized
        );
    }

    #[derive(Debug, Default)]
    struct Headline {
        title: String,
    }

    impl Bindable for Headline {
        const TYPE_NAME: &'static str = "Headline";

        fn bind(schema: SchemaBuilder<Self>) -> SchemaBuilder<Self> {
            schema.scalar(FieldSpec::text("title", "//h1"), |h, v| h.title = v)
        }
    }

    #[test]
    fn test_read_maps_each_outcome() {
        let extractor = extractor();
        let page = "<h1>Hello</h1>";

        let read = extractor.read::<Headline>(200, page).unwrap();
        assert_eq!(read.title, "Hello");

        assert_eq!(
            extractor.read::<Headline>(401, page).unwrap_err(),
            PageError::Unauthorized { status: 401 }
        );
        assert_eq!(
            extractor.read::<Headline>(404, page).unwrap_err(),
            PageError::ClientError { status: 404 }
        );
        assert_eq!(
            extractor.read::<Headline>(503, page).unwrap_err(),
            PageError::ServerError { status: 503 }
        );

        let rejected = r#"<div class="problem"><ul><li>验证码错误</li></ul></div><h1>x</h1>"#;
        let err = extractor.read::<Headline>(200, rejected).unwrap_err();
        assert_eq!(err.user_messages(), vec!["验证码错误".to_string()]);

        let err = extractor.read::<Headline>(200, "<p>no title</p>").unwrap_err();
        assert!(matches!(
            err,
            PageError::Extraction(ExtractionError::NotFound { type_name: "Headline", .. })
        ));
    }
}
