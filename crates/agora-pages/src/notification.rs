//! The notifications inbox.

use agora_core::{AgoraError, TopicId};
use agora_extract::{Bindable, FieldSpec, SchemaBuilder};
use serde::Serialize;

/// One inbox entry: a reply, mention, thanks or favorite.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Notification {
    element_id: String,
    /// Who triggered it
    pub actor: String,
    /// Actor's avatar URL
    pub avatar: Option<String>,
    /// The one-line description, e.g. "bob 在 Title 里回复了你"
    pub summary: String,
    /// Link to the topic (and reply) concerned
    pub topic_link: String,
    /// Quoted reply body, for replies and mentions
    pub payload: Option<String>,
    /// Relative time as displayed
    pub age: Option<String>,
}

impl Notification {
    /// The notification's numeric id, from its `n_<id>` element id.
    #[must_use]
    pub fn notification_id(&self) -> Option<u64> {
        self.element_id.strip_prefix("n_")?.parse().ok()
    }

    /// The topic concerned.
    pub fn topic_id(&self) -> Result<TopicId, AgoraError> {
        TopicId::from_link(&self.topic_link)
    }
}

impl Bindable for Notification {
    const TYPE_NAME: &'static str = "Notification";

    fn bind(schema: SchemaBuilder<Self>) -> SchemaBuilder<Self> {
        schema
            .scalar(FieldSpec::attr("element_id", ".", "id"), |n, v| {
                n.element_id = v;
            })
            .scalar(FieldSpec::text("actor", ".//span[@class='fade']//strong"), |n, v| {
                n.actor = v;
            })
            .scalar(
                FieldSpec::attr("avatar", ".//img[@class='avatar']", "src").tolerant(),
                |n, v| n.avatar = Some(v),
            )
            .scalar(FieldSpec::text("summary", ".//span[@class='fade']"), |n, v| {
                n.summary = v;
            })
            .scalar(
                FieldSpec::attr("topic_link", ".//a[@class='topic-link']", "href"),
                |n, v| n.topic_link = v,
            )
            .scalar(
                FieldSpec::inner_markup("payload", ".//div[@class='payload']").tolerant(),
                |n, v: String| n.payload = Some(v.trim().to_string()),
            )
            .scalar(FieldSpec::text("age", ".//span[@class='snow']").tolerant(), |n, v| {
                n.age = Some(v);
            })
    }
}

/// `/notifications`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NotificationsPage {
    /// Newest first, as rendered
    pub notifications: Vec<Notification>,
}

impl Bindable for NotificationsPage {
    const TYPE_NAME: &'static str = "NotificationsPage";

    fn bind(schema: SchemaBuilder<Self>) -> SchemaBuilder<Self> {
        schema.list(
            FieldSpec::node("notifications", "//div[starts-with(@id,'n_')]").tolerant(),
            |p, v| p.notifications = v,
        )
    }
}
