//! Topic listings and topic detail pages.

use agora_core::{AgoraError, TopicId};
use agora_extract::{Bindable, FieldSpec, SchemaBuilder};
use serde::Serialize;

/// One row of a topic listing (home page tabs, node pages).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TopicSummary {
    /// Topic title
    pub title: String,
    /// Relative link, e.g. `/t/1024#reply12`
    pub link: String,
    /// Author's username
    pub author: String,
    /// Author's avatar URL
    pub avatar: String,
    /// Node display name
    pub node: Option<String>,
    /// Number of replies; zero when the counter is not rendered
    pub replies: u32,
    /// Username of the latest replier
    pub last_replier: Option<String>,
}

impl TopicSummary {
    /// The topic's numeric id, parsed from its link.
    pub fn topic_id(&self) -> Result<TopicId, AgoraError> {
        TopicId::from_link(&self.link)
    }
}

impl Bindable for TopicSummary {
    const TYPE_NAME: &'static str = "TopicSummary";

    fn bind(schema: SchemaBuilder<Self>) -> SchemaBuilder<Self> {
        schema
            .scalar(FieldSpec::text("title", ".//span[@class='item_title']/a"), |t, v| {
                t.title = v;
            })
            .scalar(
                FieldSpec::attr("link", ".//span[@class='item_title']/a", "href"),
                |t, v| t.link = v,
            )
            .scalar(
                FieldSpec::text("author", ".//span[@class='topic_info']/strong[1]/a"),
                |t, v| t.author = v,
            )
            .scalar(
                FieldSpec::attr("avatar", ".//img[contains(@class,'avatar')]", "src"),
                |t, v| t.avatar = v,
            )
            .scalar(FieldSpec::text("node", ".//a[@class='node']").tolerant(), |t, v| {
                t.node = Some(v);
            })
            .scalar(
                FieldSpec::text("replies", ".//a[contains(@class,'count_')]").tolerant(),
                |t, v| t.replies = v,
            )
            .scalar(
                FieldSpec::text("last_replier", ".//span[@class='topic_info']/strong[2]/a")
                    .tolerant(),
                |t, v| t.last_replier = Some(v),
            )
    }
}

/// A page listing topics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TopicListPage {
    /// Rows in display order
    pub topics: Vec<TopicSummary>,
}

impl Bindable for TopicListPage {
    const TYPE_NAME: &'static str = "TopicListPage";

    fn bind(schema: SchemaBuilder<Self>) -> SchemaBuilder<Self> {
        schema.list(
            FieldSpec::node(
                "topics",
                "//div[contains(@class,'cell') and contains(@class,'item')]",
            )
            .tolerant(),
            |p, v| p.topics = v,
        )
    }
}

/// One reply on a topic page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Reply {
    element_id: String,
    /// Replier's username
    pub author: String,
    /// Replier's avatar URL
    pub avatar: String,
    /// 1-based floor number
    pub floor: u32,
    /// Rendered reply body
    pub content: String,
    /// Thanks received
    pub thanks: u32,
}

impl Reply {
    /// The reply's numeric id, from its `r_<id>` element id.
    #[must_use]
    pub fn reply_id(&self) -> Option<u64> {
        self.element_id.strip_prefix("r_")?.parse().ok()
    }
}

impl Bindable for Reply {
    const TYPE_NAME: &'static str = "Reply";

    fn bind(schema: SchemaBuilder<Self>) -> SchemaBuilder<Self> {
        schema
            .scalar(FieldSpec::attr("element_id", ".", "id"), |r, v| {
                r.element_id = v;
            })
            .scalar(FieldSpec::text("author", ".//strong/a[@class='dark']"), |r, v| {
                r.author = v;
            })
            .scalar(
                FieldSpec::attr("avatar", ".//img[@class='avatar']", "src"),
                |r, v| r.avatar = v,
            )
            .scalar(FieldSpec::text("floor", ".//span[@class='no']"), |r, v| {
                r.floor = v;
            })
            .scalar(
                FieldSpec::inner_markup("content", ".//div[@class='reply_content']"),
                |r, v: String| r.content = v.trim().to_string(),
            )
            .scalar(
                FieldSpec::text("thanks", ".//span[@class='small fade']").tolerant(),
                |r, v| r.thanks = v,
            )
    }
}

/// `/t/<id>`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TopicPage {
    /// Topic title
    pub title: String,
    /// Author's username
    pub author: String,
    /// Author's avatar URL
    pub avatar: String,
    /// Node display name
    pub node: Option<String>,
    /// Rendered topic body; title-only topics have none
    pub content: Option<String>,
    /// Replies in floor order
    pub replies: Vec<Reply>,
    once: Option<String>,
    favorite_link: Option<String>,
}

impl TopicPage {
    /// Once-token of the reply form, present when signed in.
    #[must_use]
    pub fn once(&self) -> Option<&str> {
        self.once.as_deref()
    }

    /// The favorite (or unfavorite) link, present when signed in.
    #[must_use]
    pub fn favorite_link(&self) -> Option<&str> {
        self.favorite_link.as_deref()
    }

    /// True when the signed-in user already favorited the topic.
    #[must_use]
    pub fn is_favorited(&self) -> bool {
        self.favorite_link
            .as_deref()
            .is_some_and(|link| link.starts_with("/unfavorite/"))
    }
}

impl Bindable for TopicPage {
    const TYPE_NAME: &'static str = "TopicPage";

    fn bind(schema: SchemaBuilder<Self>) -> SchemaBuilder<Self> {
        schema
            .scalar(FieldSpec::text("title", "//div[@class='header']/h1"), |t, v| {
                t.title = v;
            })
            .scalar(
                FieldSpec::text("author", "//div[@class='header']/small[@class='gray']/a"),
                |t, v| t.author = v,
            )
            .scalar(
                FieldSpec::attr("avatar", "//div[@class='header']//img[@class='avatar']", "src"),
                |t, v| t.avatar = v,
            )
            .scalar(
                FieldSpec::text("node", "//div[@class='header']/a[starts-with(@href,'/go/')]")
                    .tolerant(),
                |t, v| t.node = Some(v),
            )
            .scalar(
                FieldSpec::inner_markup("content", "//div[@class='topic_content']").tolerant(),
                |t, v: String| t.content = Some(v.trim().to_string()),
            )
            .list(
                FieldSpec::node("replies", "//div[starts-with(@id,'r_')]").tolerant(),
                |t, v| t.replies = v,
            )
            .scalar(
                FieldSpec::attr(
                    "once",
                    "//form[starts-with(@action,'/t/')]//input[@name='once']",
                    "value",
                )
                .tolerant(),
                |t, v| t.once = Some(v),
            )
            .scalar(
                FieldSpec::attr(
                    "favorite_link",
                    "//a[starts-with(@href,'/favorite/topic/') or starts-with(@href,'/unfavorite/topic/')]",
                    "href",
                )
                .tolerant(),
                |t, v| t.favorite_link = Some(v),
            )
    }
}
