//! Agora Pages - Typed views of the forum's pages and its write path.
//!
//! Each page the client reads is a [`Bindable`](agora_extract::Bindable)
//! type, so fetching a page is `extractor.read::<TopicPage>(status, body)`.
//! Mutations are prepared by [`actions::prepare`], which spends the page's
//! once-token and attaches the session cookies.
//!
//! # Example
//!
//! ```rust
//! use agora_extract::{Extractor, SchemaRegistry};
//! use agora_pages::MemberPage;
//! use std::sync::Arc;
//!
//! let registry = Arc::new(SchemaRegistry::new());
//! agora_pages::preload(&registry).expect("page schemas are valid");
//!
//! let extractor = Extractor::new(registry);
//! let body = r#"<img class="avatar" src="/a/alice.png"><h1>alice</h1>"#;
//! let member: MemberPage = extractor.read(200, body).unwrap();
//! assert_eq!(member.name, "alice");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod actions;
pub mod error;
pub mod member;
pub mod mission;
pub mod notification;
pub mod signin;
pub mod topic;

use agora_extract::{SchemaError, SchemaRegistry};
use tracing::info;

// Re-export commonly used types
pub use actions::{prepare, Method, Mutation, PreparedRequest};
pub use error::{ActionError, Result};
pub use member::MemberPage;
pub use mission::DailyMissionPage;
pub use notification::{Notification, NotificationsPage};
pub use signin::{SigninFields, SigninPage};
pub use topic::{Reply, TopicListPage, TopicPage, TopicSummary};

/// Build every page schema now, so a broken path fails at start-up.
pub fn preload(registry: &SchemaRegistry) -> std::result::Result<(), SchemaError> {
    registry.preload::<SigninPage>()?;
    registry.preload::<TopicListPage>()?;
    registry.preload::<TopicPage>()?;
    registry.preload::<MemberPage>()?;
    registry.preload::<DailyMissionPage>()?;
    registry.preload::<NotificationsPage>()?;
    info!(schemas = registry.len(), "page schemas ready");
    Ok(())
}
