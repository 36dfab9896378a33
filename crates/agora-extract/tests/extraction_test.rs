//! Integration tests for the extraction engine
//!
//! Exercises strict/tolerant fields, list ordering, nested trails and
//! response classification against small forum-shaped documents.

use agora_extract::{
    Bindable, ExtractionError, Extractor, FieldSpec, Outcome, PageError, SchemaBuilder,
    SchemaError, SchemaRegistry,
};
use scraper::Html;
use std::sync::Arc;

#[derive(Debug, Default, PartialEq)]
struct Author {
    name: String,
    avatar: String,
}

impl Bindable for Author {
    const TYPE_NAME: &'static str = "Author";

    fn bind(schema: SchemaBuilder<Self>) -> SchemaBuilder<Self> {
        schema
            .scalar(FieldSpec::text("name", ".//strong/a"), |a, v| a.name = v)
            .scalar(
                FieldSpec::attr("avatar", ".//img[@class='avatar']", "src"),
                |a, v| a.avatar = v,
            )
    }
}

#[derive(Debug, Default, PartialEq)]
struct Comment {
    author: Author,
    body: String,
    floor: u32,
}

impl Bindable for Comment {
    const TYPE_NAME: &'static str = "Comment";

    fn bind(schema: SchemaBuilder<Self>) -> SchemaBuilder<Self> {
        schema
            .nested(FieldSpec::node("author", "."), |c, v| c.author = v)
            .scalar(
                FieldSpec::text("body", ".//div[@class='reply_content']"),
                |c, v| c.body = v,
            )
            .scalar(FieldSpec::text("floor", ".//span[@class='no']"), |c, v| {
                c.floor = v;
            })
    }
}

#[derive(Debug, Default, PartialEq)]
struct Thread {
    title: String,
    tags: Vec<String>,
    node: Option<String>,
    pinned: Option<Author>,
    comments: Vec<Comment>,
}

impl Bindable for Thread {
    const TYPE_NAME: &'static str = "Thread";

    fn bind(schema: SchemaBuilder<Self>) -> SchemaBuilder<Self> {
        schema
            .scalar(FieldSpec::text("title", "//div[@class='header']/h1"), |t, v| {
                t.title = v;
            })
            .scalar_list(
                FieldSpec::text("tags", "//a[@class='tag']").tolerant(),
                |t, v| t.tags = v,
            )
            .scalar(
                FieldSpec::attr("node", "//a[@class='node']", "href").tolerant(),
                |t, v| t.node = Some(v),
            )
            .nested(
                FieldSpec::node("pinned", "//div[@class='pinned']").tolerant(),
                |t, v: Author| t.pinned = Some(v),
            )
            .list(
                FieldSpec::node("comments", "//div[starts-with(@id,'r_')]").tolerant(),
                |t, v| t.comments = v,
            )
    }
}

#[derive(Debug, Default, PartialEq)]
struct Profile {
    author: Author,
}

impl Bindable for Profile {
    const TYPE_NAME: &'static str = "Profile";

    fn bind(schema: SchemaBuilder<Self>) -> SchemaBuilder<Self> {
        schema.nested(FieldSpec::node("author", "//div[@class='profile']"), |p, v| {
            p.author = v;
        })
    }
}

#[derive(Debug, Default, PartialEq)]
struct Feed {
    comments: Vec<Comment>,
}

impl Bindable for Feed {
    const TYPE_NAME: &'static str = "Feed";

    fn bind(schema: SchemaBuilder<Self>) -> SchemaBuilder<Self> {
        schema.list(
            FieldSpec::node("comments", "//div[starts-with(@id,'r_')]"),
            |f, v| f.comments = v,
        )
    }
}

#[derive(Debug, Default)]
struct Frame {
    panel: Option<Box<Panel>>,
}

#[derive(Debug, Default)]
struct Panel {
    frame: Option<Box<Frame>>,
}

impl Bindable for Frame {
    const TYPE_NAME: &'static str = "Frame";

    fn bind(schema: SchemaBuilder<Self>) -> SchemaBuilder<Self> {
        schema.nested(FieldSpec::node("panel", ".").tolerant(), |f, v: Panel| {
            f.panel = Some(Box::new(v));
        })
    }
}

impl Bindable for Panel {
    const TYPE_NAME: &'static str = "Panel";

    fn bind(schema: SchemaBuilder<Self>) -> SchemaBuilder<Self> {
        schema.nested(FieldSpec::node("frame", ".").tolerant(), |p, v: Frame| {
            p.frame = Some(Box::new(v));
        })
    }
}

fn extractor() -> Extractor {
    Extractor::new(Arc::new(SchemaRegistry::new()))
}

fn comment(id: u32, name: &str, body: &str) -> String {
    format!(
        r#"<div id="r_{id}" class="cell">
             <img class="avatar" src="/a/{name}.png">
             <strong><a href="/member/{name}">{name}</a></strong>
             <div class="reply_content">{body}</div>
             <span class="no">{id}</span>
           </div>"#
    )
}

#[test]
fn test_strict_miss_names_field_path() {
    let err = extractor()
        .extract_str::<Thread>("<div class='body'>no header</div>")
        .expect_err("title is strict");
    assert_eq!(
        err,
        ExtractionError::NotFound {
            type_name: "Thread",
            field: "title".to_string(),
            path: "//div[@class='header']/h1".to_string(),
        }
    );
}

#[test]
fn test_strict_nested_object_without_match_fails() {
    let err = extractor()
        .extract_str::<Profile>("<div class='sidebar'>nobody</div>")
        .expect_err("author is strict");
    assert_eq!(
        err,
        ExtractionError::NotFound {
            type_name: "Profile",
            field: "author".to_string(),
            path: "//div[@class='profile']".to_string(),
        }
    );
}

#[test]
fn test_strict_list_without_match_fails() {
    let err = extractor()
        .extract_str::<Feed>("<div class='box'>no replies yet</div>")
        .expect_err("comments is strict");
    assert_eq!(
        err,
        ExtractionError::NotFound {
            type_name: "Feed",
            field: "comments".to_string(),
            path: "//div[starts-with(@id,'r_')]".to_string(),
        }
    );

    let feed: Feed = extractor()
        .extract_str(&comment(1, "bob", "first"))
        .expect("one reply satisfies a strict list");
    assert_eq!(feed.comments.len(), 1);
}

#[test]
fn test_types_nesting_each_other_in_place_fail_before_extraction() {
    let extractor = extractor();
    let err = extractor
        .extract_str::<Frame>("<div>x</div>")
        .expect_err("Frame and Panel never leave the scope node");
    assert!(matches!(
        err,
        ExtractionError::Schema(SchemaError::SelfRecursion { .. })
    ));
    assert!(extractor.registry().is_empty());
}

#[test]
fn test_tolerant_fields_keep_defaults() {
    let thread: Thread = extractor()
        .extract_str(r#"<div class="header"><h1>Only a title</h1></div>"#)
        .expect("tolerant fields may be absent");
    assert_eq!(
        thread,
        Thread {
            title: "Only a title".to_string(),
            ..Thread::default()
        }
    );
    assert!(thread.pinned.is_none());
}

#[test]
fn test_lists_follow_document_order() {
    let html = format!(
        r#"<div class="header"><h1>Ordering</h1>
             <a class="tag">rust</a><a class="tag">html</a><a class="tag">xpath</a>
           </div>
           <div id="Main">{}{}{}</div>"#,
        comment(1, "alice", "first"),
        comment(2, "bob", "second"),
        comment(3, "carol", "third"),
    );
    let thread: Thread = extractor().extract_str(&html).expect("extract thread");

    assert_eq!(thread.tags, vec!["rust", "html", "xpath"]);
    let floors: Vec<u32> = thread.comments.iter().map(|c| c.floor).collect();
    assert_eq!(floors, vec![1, 2, 3]);
    let names: Vec<&str> = thread
        .comments
        .iter()
        .map(|c| c.author.name.as_str())
        .collect();
    assert_eq!(names, vec!["alice", "bob", "carol"]);
    assert_eq!(thread.comments[1].body, "second");
}

#[test]
fn test_first_avatar_wins() {
    let html = r#"
        <div class="pinned">
          <img class="avatar" src="/a/first.png">
          <strong><a>mod</a></strong>
          <img class="avatar" src="/a/second.png">
        </div>
        <div class="header"><h1>Avatars</h1></div>
    "#;
    let thread: Thread = extractor().extract_str(html).expect("extract thread");
    let pinned = thread.pinned.expect("pinned author present");
    assert_eq!(pinned.avatar, "/a/first.png");
    assert_eq!(pinned.name, "mod");
}

#[test]
fn test_nested_failure_carries_trail() {
    let broken = r#"<div id="r_9" class="cell">
                      <img class="avatar" src="/a/x.png">
                      <div class="reply_content">orphan</div>
                      <span class="no">9</span>
                    </div>"#;
    let html = format!(
        r#"<div class="header"><h1>Trail</h1></div>{}{}{}"#,
        comment(1, "alice", "a"),
        comment(2, "bob", "b"),
        broken
    );
    let err = extractor()
        .extract_str::<Thread>(&html)
        .expect_err("third comment lacks an author name");
    assert_eq!(err.field(), Some("comments[2].author.name"));
    assert_eq!(err.path(), Some(".//strong/a"));
    assert!(err.to_string().starts_with("Thread.comments[2].author.name"));
}

#[test]
fn test_missing_attribute_is_a_miss() {
    let html = r#"<div class="header"><h1>t</h1></div><a class="node">no href</a>"#;
    let thread: Thread = extractor().extract_str(html).expect("node is tolerant");
    assert_eq!(thread.node, None);

    let html = r#"<div id="r_1"><img class="avatar"><strong><a>x</a></strong>
                  <div class="reply_content">c</div><span class="no">1</span></div>"#;
    let document = Html::parse_document(html);
    let err = extractor()
        .extract::<Comment>(&document)
        .expect_err("avatar src is strict");
    assert!(matches!(
        err,
        ExtractionError::MissingAttribute { ref attribute, .. } if attribute == "src"
    ));
}

#[test]
fn test_extract_from_element_scope() {
    let html = format!("<div id='Main'>{}{}</div>", comment(7, "dave", "x"), comment(8, "erin", "y"));
    let document = Html::parse_document(&html);
    let selector = scraper::Selector::parse("#r_8").expect("valid selector");
    let second = document.select(&selector).next().expect("second reply");

    let comment: Comment = extractor().extract_from(second).expect("extract comment");
    assert_eq!(comment.author.name, "erin");
    assert_eq!(comment.floor, 8);
}

#[test]
fn test_problem_page_is_validation_failure() {
    let body = r#"
        <div class="problem"><ul><li>回复内容不能为空</li></ul></div>
        <div class="header"><h1>Still rendered</h1></div>
    "#;
    let extractor = extractor();
    assert!(matches!(
        extractor.classify_response(200, body),
        Outcome::ValidationFailure(ref p) if p.messages() == vec!["回复内容不能为空".to_string()]
    ));

    let err = extractor
        .read::<Thread>(200, body)
        .expect_err("problem block wins over extraction");
    assert!(matches!(err, PageError::Validation(_)));
    assert_eq!(err.user_messages(), vec!["回复内容不能为空".to_string()]);
}

#[test]
fn test_read_maps_statuses() {
    let extractor = extractor();
    let body = r#"<div class="header"><h1>ok</h1></div>"#;

    assert!(extractor.read::<Thread>(403, body).expect_err("forbidden").needs_sign_in());
    assert_eq!(
        extractor.read::<Thread>(404, body).expect_err("missing"),
        PageError::ClientError { status: 404 }
    );
    assert_eq!(
        extractor.read::<Thread>(502, body).expect_err("bad gateway"),
        PageError::ServerError { status: 502 }
    );
    let thread = extractor.read::<Thread>(200, body).expect("extract thread");
    assert_eq!(thread.title, "ok");

    let err = extractor.read::<Thread>(200, "<p></p>").expect_err("no title");
    assert!(matches!(err, PageError::Extraction(ExtractionError::NotFound { .. })));
}

#[test]
fn test_shared_extractor_across_threads() {
    let extractor = extractor();
    std::thread::scope(|s| {
        for i in 0..8u32 {
            let extractor = &extractor;
            s.spawn(move || {
                let html = format!(
                    r#"<div class="header"><h1>thread {i}</h1></div>{}"#,
                    comment(i, "alice", "hi")
                );
                let thread: Thread = extractor.extract_str(&html).expect("extract thread");
                assert_eq!(thread.title, format!("thread {i}"));
                assert_eq!(thread.comments[0].floor, i);
            });
        }
    });
    assert!(extractor.registry().contains::<Thread>());
    assert!(extractor.registry().contains::<Comment>());
    assert!(extractor.registry().contains::<Author>());
}
