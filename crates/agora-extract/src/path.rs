//! Path expressions: the XPath subset used to address nodes in a page.
//!
//! Expressions are compiled once, when a type's schema is built, and then
//! evaluated against a [`Scope`]. Evaluation is a pure read of the parsed
//! document and always yields element nodes in document order, without
//! duplicates.
//!
//! Supported syntax:
//!
//! - `/` (child) and `//` (descendant-or-self, then child) separators; a
//!   leading `/`, `//`, `./` or `.//` is anchored at the scope node
//! - element names (ASCII case-insensitive), `*`, `.` and `..`
//! - predicates: `[2]`, `[last()]`, `[@href]`, `[@class='x']`,
//!   `[@class!='x']`, `[text()='x']`, `[contains(@class,'x')]`,
//!   `[starts-with(@href,'/t/')]`, `[not(...)]`, joined with `and`/`or`
//!
//! Attribute and `text()` steps are rejected; reading attributes or text is
//! the job of the field's [`ValueSelector`](crate::ValueSelector).

use crate::error::PathError;
use scraper::{ElementRef, Html};
use std::collections::HashSet;
use std::fmt;

/// The node a path expression is evaluated from.
#[derive(Debug, Clone, Copy)]
pub enum Scope<'a> {
    /// The whole document (top-level extraction).
    Document(&'a Html),
    /// A single element (nested objects and list items).
    Element(ElementRef<'a>),
}

impl<'a> From<&'a Html> for Scope<'a> {
    fn from(document: &'a Html) -> Self {
        Self::Document(document)
    }
}

impl<'a> From<ElementRef<'a>> for Scope<'a> {
    fn from(element: ElementRef<'a>) -> Self {
        Self::Element(element)
    }
}

/// A compiled path expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathExpr {
    source: String,
    steps: Vec<Step>,
}

impl PathExpr {
    /// Compile an expression.
    ///
    /// # Errors
    /// Returns a [`PathError`] pointing at the offending offset.
    pub fn compile(source: &str) -> Result<Self, PathError> {
        let steps = Parser::new(source).parse_path()?;
        Ok(Self {
            source: source.to_string(),
            steps,
        })
    }

    /// The expression as written.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// True when the expression can only ever select the scope node itself.
    #[must_use]
    pub fn is_self_only(&self) -> bool {
        self.steps.iter().all(|step| step.axis == Axis::SelfNode)
    }

    /// True when the expression may select the scope node again, or leave
    /// it: `.`-only paths and any path with a `..` step.
    ///
    /// Nesting a type through such a path does not make progress down the
    /// tree, so a cycle of them would never terminate.
    #[must_use]
    pub fn may_revisit_scope(&self) -> bool {
        self.is_self_only() || self.steps.iter().any(|step| step.axis == Axis::Parent)
    }

    /// All matching elements, in document order.
    #[must_use]
    pub fn select<'a>(&self, scope: impl Into<Scope<'a>>) -> Vec<ElementRef<'a>> {
        let mut current = vec![Ctx::from(scope.into())];
        for step in &self.steps {
            if current.is_empty() {
                break;
            }
            current = step.apply(&current);
        }

        let mut seen = HashSet::new();
        current
            .into_iter()
            .map(Ctx::element)
            .filter(|el| seen.insert(el.id()))
            .collect()
    }

    /// The first matching element in document order.
    #[must_use]
    pub fn select_first<'a>(&self, scope: impl Into<Scope<'a>>) -> Option<ElementRef<'a>> {
        self.select(scope).into_iter().next()
    }
}

impl fmt::Display for PathExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Evaluation context: either the document node or an element.
///
/// The document node is not an element, so it is carried by its root
/// element and only ever expanded, never returned.
#[derive(Debug, Clone, Copy)]
enum Ctx<'a> {
    Document(ElementRef<'a>),
    Element(ElementRef<'a>),
}

impl<'a> From<Scope<'a>> for Ctx<'a> {
    fn from(scope: Scope<'a>) -> Self {
        match scope {
            Scope::Document(html) => Self::Document(html.root_element()),
            Scope::Element(el) => Self::Element(el),
        }
    }
}

impl<'a> Ctx<'a> {
    fn element(self) -> ElementRef<'a> {
        match self {
            Self::Document(root) | Self::Element(root) => root,
        }
    }

    fn child_elements(self) -> Vec<ElementRef<'a>> {
        match self {
            Self::Document(root) => vec![root],
            Self::Element(el) => el.children().filter_map(ElementRef::wrap).collect(),
        }
    }

    fn descendants_or_self(self) -> Vec<Ctx<'a>> {
        match self {
            Self::Document(root) => std::iter::once(self)
                .chain(
                    root.descendants()
                        .filter_map(ElementRef::wrap)
                        .map(Ctx::Element),
                )
                .collect(),
            Self::Element(el) => el
                .descendants()
                .filter_map(ElementRef::wrap)
                .map(Ctx::Element)
                .collect(),
        }
    }

    /// Whether `other` is this node or lies inside its subtree.
    fn contains(self, other: Ctx<'a>) -> bool {
        match (self, other) {
            (Self::Document(_), _) => true,
            (Self::Element(_), Self::Document(_)) => false,
            (Self::Element(el), Self::Element(inner)) => {
                el.id() == inner.id() || inner.ancestors().any(|a| a.id() == el.id())
            }
        }
    }

    /// Every element of this node's subtree, in document order.
    fn subtree(self) -> impl Iterator<Item = ElementRef<'a>> {
        self.element().descendants().filter_map(ElementRef::wrap)
    }

    fn parent(self) -> Option<Ctx<'a>> {
        match self {
            Self::Document(_) => None,
            Self::Element(el) => {
                let parent = el.parent()?;
                match ElementRef::wrap(parent) {
                    Some(p) => Some(Self::Element(p)),
                    None if parent.value().is_document() => Some(Self::Document(el)),
                    None => None,
                }
            }
        }
    }
}

/// Contexts that are not inside an earlier context. `contexts` must be in
/// document order.
fn outermost<'a>(contexts: &[Ctx<'a>]) -> Vec<Ctx<'a>> {
    let mut roots: Vec<Ctx<'a>> = Vec::new();
    for ctx in contexts {
        if !roots.last().is_some_and(|root| root.contains(*ctx)) {
            roots.push(*ctx);
        }
    }
    roots
}

/// Sort element nodes into document order and drop duplicates, walking only
/// the subtrees of `roots`. Every node must lie in one of them.
fn order_within<'a>(roots: &[Ctx<'a>], nodes: &[Ctx<'a>]) -> Vec<Ctx<'a>> {
    let wanted: HashSet<_> = nodes.iter().map(|c| c.element().id()).collect();
    roots
        .iter()
        .flat_map(|root| root.subtree())
        .filter(|el| wanted.contains(&el.id()))
        .map(Ctx::Element)
        .collect()
}

/// Sort nodes into document order and drop duplicates, walking the whole
/// document. Only needed for `..`, whose results leave the contexts.
fn document_order(nodes: Vec<Ctx<'_>>) -> Vec<Ctx<'_>> {
    let Some(first) = nodes.first().copied() else {
        return nodes;
    };
    let Some(top) = first.element().ancestors().last() else {
        return nodes;
    };

    let document = nodes.iter().copied().find(|c| matches!(c, Ctx::Document(_)));
    let wanted: HashSet<_> = nodes
        .iter()
        .filter(|c| matches!(c, Ctx::Element(_)))
        .map(|c| c.element().id())
        .collect();

    let mut ordered = Vec::with_capacity(wanted.len() + 1);
    ordered.extend(document);
    ordered.extend(
        top.descendants()
            .filter(|node| wanted.contains(&node.id()))
            .filter_map(ElementRef::wrap)
            .map(Ctx::Element),
    );
    ordered
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Child,
    Descendant,
    SelfNode,
    Parent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum NodeTest {
    Any,
    Name(String),
}

impl NodeTest {
    fn matches(&self, el: ElementRef<'_>) -> bool {
        match self {
            Self::Any => true,
            Self::Name(name) => el.value().name().eq_ignore_ascii_case(name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Step {
    axis: Axis,
    test: NodeTest,
    predicates: Vec<Expr>,
}

impl Step {
    /// `contexts` are in document order without duplicates, and so is the
    /// result.
    fn apply<'a>(&self, contexts: &[Ctx<'a>]) -> Vec<Ctx<'a>> {
        match self.axis {
            Axis::SelfNode => contexts.to_vec(),
            Axis::Parent => {
                let out: Vec<Ctx<'a>> = contexts.iter().filter_map(|c| c.parent()).collect();
                if contexts.len() > 1 {
                    document_order(out)
                } else {
                    out
                }
            }
            Axis::Child => {
                let mut out = Vec::new();
                for ctx in contexts {
                    self.select_children(*ctx, &mut out);
                }
                let roots = outermost(contexts);
                // Disjoint contexts already yield document order.
                if roots.len() == contexts.len() {
                    out
                } else {
                    order_within(&roots, &out)
                }
            }
            Axis::Descendant => {
                // A nested context's descendants are already under its root.
                let roots = outermost(contexts);
                let mut out = Vec::new();
                for root in &roots {
                    for inner in root.descendants_or_self() {
                        self.select_children(inner, &mut out);
                    }
                }
                order_within(&roots, &out)
            }
        }
    }

    /// Predicate positions are relative to each parent's candidate list.
    fn select_children<'a>(&self, ctx: Ctx<'a>, out: &mut Vec<Ctx<'a>>) {
        let mut candidates: Vec<ElementRef<'a>> = ctx
            .child_elements()
            .into_iter()
            .filter(|el| self.test.matches(*el))
            .collect();

        for predicate in &self.predicates {
            let size = candidates.len();
            candidates = candidates
                .into_iter()
                .enumerate()
                .filter(|(i, el)| predicate.matches(*el, i + 1, size))
                .map(|(_, el)| el)
                .collect();
        }

        out.extend(candidates.into_iter().map(Ctx::Element));
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Operand {
    Attr(String),
    /// `text()`: the element's own text children
    Text,
    /// `.`: the element's full text content
    StringValue,
}

impl Operand {
    fn read(&self, el: ElementRef<'_>) -> Option<String> {
        match self {
            Self::Attr(name) => el.value().attr(name).map(str::to_string),
            Self::Text => {
                let own: String = el
                    .children()
                    .filter_map(|child| child.value().as_text().map(|t| &**t))
                    .collect();
                Some(own.trim().to_string())
            }
            Self::StringValue => Some(el.text().collect::<String>().trim().to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Expr {
    Position(usize),
    Last,
    Exists(Operand),
    Equals {
        operand: Operand,
        value: String,
        negate: bool,
    },
    Contains(Operand, String),
    StartsWith(Operand, String),
    Not(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
}

impl Expr {
    fn matches(&self, el: ElementRef<'_>, position: usize, size: usize) -> bool {
        match self {
            Self::Position(n) => position == *n,
            Self::Last => position == size,
            Self::Exists(operand) => operand.read(el).is_some_and(|v| match operand {
                Operand::Attr(_) => true,
                Operand::Text | Operand::StringValue => !v.is_empty(),
            }),
            Self::Equals {
                operand,
                value,
                negate,
            } => {
                let equal = operand.read(el).is_some_and(|v| v == *value);
                equal != *negate
            }
            Self::Contains(operand, needle) => {
                operand.read(el).is_some_and(|v| v.contains(needle.as_str()))
            }
            Self::StartsWith(operand, prefix) => {
                operand.read(el).is_some_and(|v| v.starts_with(prefix.as_str()))
            }
            Self::Not(inner) => !inner.matches(el, position, size),
            Self::And(a, b) => a.matches(el, position, size) && b.matches(el, position, size),
            Self::Or(a, b) => a.matches(el, position, size) || b.matches(el, position, size),
        }
    }
}

struct Parser<'s> {
    src: &'s str,
    pos: usize,
}

impl<'s> Parser<'s> {
    fn new(src: &'s str) -> Self {
        Self { src, pos: 0 }
    }

    fn rest(&self) -> &'s str {
        &self.src[self.pos..]
    }

    fn fail<T>(&self, reason: impl Into<String>) -> Result<T, PathError> {
        Err(PathError {
            offset: self.pos,
            reason: reason.into(),
        })
    }

    fn skip_ws(&mut self) {
        let trimmed = self.rest().trim_start();
        self.pos = self.src.len() - trimmed.len();
    }

    fn eat(&mut self, token: &str) -> bool {
        if self.rest().starts_with(token) {
            self.pos += token.len();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &str) -> Result<(), PathError> {
        self.skip_ws();
        if self.eat(token) {
            Ok(())
        } else {
            self.fail(format!("expected `{token}`"))
        }
    }

    /// Consume `word` only when it is not the prefix of a longer name.
    fn eat_keyword(&mut self, word: &str) -> bool {
        let Some(after) = self.rest().strip_prefix(word) else {
            return false;
        };
        if after.chars().next().is_some_and(is_name_char) {
            return false;
        }
        self.pos += word.len();
        true
    }

    /// Consume a function name when it is followed by `(`.
    fn eat_function(&mut self, name: &str) -> bool {
        let rest = self.rest();
        if rest.starts_with(name) && rest[name.len()..].trim_start().starts_with('(') {
            self.pos += name.len();
            true
        } else {
            false
        }
    }

    fn name(&mut self) -> Option<&'s str> {
        let rest = self.rest();
        let len = rest
            .char_indices()
            .find(|(_, c)| !is_name_char(*c))
            .map_or(rest.len(), |(i, _)| i);
        if len == 0 || rest.starts_with(|c: char| c.is_ascii_digit() || c == '-') {
            return None;
        }
        self.pos += len;
        Some(&rest[..len])
    }

    fn parse_path(mut self) -> Result<Vec<Step>, PathError> {
        self.skip_ws();
        if self.rest().is_empty() {
            return self.fail("empty path");
        }

        let mut steps = Vec::new();
        let mut axis = if self.eat("//") {
            Axis::Descendant
        } else {
            self.eat("/");
            Axis::Child
        };

        loop {
            steps.push(self.parse_step(axis)?);
            self.skip_ws();
            if self.rest().is_empty() {
                break;
            }
            axis = if self.eat("//") {
                Axis::Descendant
            } else if self.eat("/") {
                Axis::Child
            } else {
                return self.fail("expected `/` or `//` between steps");
            };
        }

        Ok(steps)
    }

    fn parse_step(&mut self, axis: Axis) -> Result<Step, PathError> {
        self.skip_ws();

        let abbreviated = if self.eat("..") {
            Some(Axis::Parent)
        } else if self.eat(".") {
            Some(Axis::SelfNode)
        } else {
            None
        };
        if let Some(step_axis) = abbreviated {
            if axis == Axis::Descendant {
                return self.fail("`.` and `..` cannot follow `//`");
            }
            self.skip_ws();
            if self.rest().starts_with('[') {
                return self.fail("predicates are not allowed on `.` or `..`");
            }
            return Ok(Step {
                axis: step_axis,
                test: NodeTest::Any,
                predicates: Vec::new(),
            });
        }

        if self.rest().starts_with('@') {
            return self.fail("attribute steps are not supported; select attributes with the value selector");
        }

        let test = if self.eat("*") {
            NodeTest::Any
        } else {
            let Some(name) = self.name() else {
                return self.fail("expected an element name, `*`, `.` or `..`");
            };
            if self.rest().trim_start().starts_with('(') {
                return self.fail(format!("`{name}()` steps are not supported"));
            }
            NodeTest::Name(name.to_ascii_lowercase())
        };

        let mut predicates = Vec::new();
        loop {
            self.skip_ws();
            if !self.eat("[") {
                break;
            }
            predicates.push(self.parse_or()?);
            self.expect("]")?;
        }

        Ok(Step {
            axis,
            test,
            predicates,
        })
    }

    fn parse_or(&mut self) -> Result<Expr, PathError> {
        let mut left = self.parse_and()?;
        loop {
            self.skip_ws();
            if !self.eat_keyword("or") {
                return Ok(left);
            }
            let right = self.parse_and()?;
            left = Expr::Or(Box::new(left), Box::new(right));
        }
    }

    fn parse_and(&mut self) -> Result<Expr, PathError> {
        let mut left = self.parse_unary()?;
        loop {
            self.skip_ws();
            if !self.eat_keyword("and") {
                return Ok(left);
            }
            let right = self.parse_unary()?;
            left = Expr::And(Box::new(left), Box::new(right));
        }
    }

    fn parse_unary(&mut self) -> Result<Expr, PathError> {
        self.skip_ws();

        if self.eat("(") {
            let inner = self.parse_or()?;
            self.expect(")")?;
            return Ok(inner);
        }
        if self.eat_function("not") {
            self.expect("(")?;
            let inner = self.parse_or()?;
            self.expect(")")?;
            return Ok(Expr::Not(Box::new(inner)));
        }
        if self.eat_function("last") {
            self.expect("(")?;
            self.expect(")")?;
            return Ok(Expr::Last);
        }
        if self.eat_function("contains") {
            let (operand, needle) = self.parse_string_call()?;
            return Ok(Expr::Contains(operand, needle));
        }
        if self.eat_function("starts-with") {
            let (operand, prefix) = self.parse_string_call()?;
            return Ok(Expr::StartsWith(operand, prefix));
        }
        if self.rest().starts_with(|c: char| c.is_ascii_digit()) {
            return self.parse_position();
        }

        let operand = self.parse_operand()?;
        self.skip_ws();
        if self.eat("!=") {
            let value = self.parse_literal()?;
            return Ok(Expr::Equals {
                operand,
                value,
                negate: true,
            });
        }
        if self.eat("=") {
            let value = self.parse_literal()?;
            return Ok(Expr::Equals {
                operand,
                value,
                negate: false,
            });
        }
        Ok(Expr::Exists(operand))
    }

    fn parse_position(&mut self) -> Result<Expr, PathError> {
        let rest = self.rest();
        let len = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        let start = self.pos;
        self.pos += len;
        match rest[..len].parse::<usize>() {
            Ok(n) if n >= 1 => Ok(Expr::Position(n)),
            _ => Err(PathError {
                offset: start,
                reason: "positions are 1-based integers".to_string(),
            }),
        }
    }

    /// `(operand, 'literal')` of `contains` / `starts-with`.
    fn parse_string_call(&mut self) -> Result<(Operand, String), PathError> {
        self.expect("(")?;
        let operand = self.parse_operand()?;
        self.expect(",")?;
        let literal = self.parse_literal()?;
        self.expect(")")?;
        Ok((operand, literal))
    }

    fn parse_operand(&mut self) -> Result<Operand, PathError> {
        self.skip_ws();
        if self.eat("@") {
            return match self.name() {
                Some(name) => Ok(Operand::Attr(name.to_ascii_lowercase())),
                None => self.fail("expected an attribute name after `@`"),
            };
        }
        if self.eat_function("text") {
            self.expect("(")?;
            self.expect(")")?;
            return Ok(Operand::Text);
        }
        if self.eat(".") {
            return Ok(Operand::StringValue);
        }
        self.fail("expected `@name`, `text()` or `.`")
    }

    fn parse_literal(&mut self) -> Result<String, PathError> {
        self.skip_ws();
        let Some(quote) = self.rest().chars().next().filter(|c| *c == '\'' || *c == '"') else {
            return self.fail("expected a quoted string");
        };
        let body = &self.rest()[1..];
        let Some(end) = body.find(quote) else {
            return self.fail("unterminated string");
        };
        let literal = body[..end].to_string();
        self.pos += end + 2;
        Ok(literal)
    }
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':')
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><body>
          <div id="Main">
            <div class="box">
              <div class="cell item" data-id="1"><a class="topic-link" href="/t/1">first</a></div>
              <div class="cell item" data-id="2"><a class="topic-link" href="/t/2">second</a></div>
              <div class="cell"><span>Ad</span></div>
              <div class="cell item" data-id="3"><a class="topic-link" href="/t/3">third</a>
                <div class="cell item" data-id="3a"><a href="/t/4">nested</a></div>
              </div>
            </div>
          </div>
        </body></html>
    "#;

    fn ids(nodes: &[ElementRef<'_>]) -> Vec<String> {
        nodes
            .iter()
            .map(|n| n.value().attr("data-id").unwrap_or("-").to_string())
            .collect()
    }

    fn select(path: &str) -> Vec<String> {
        let doc = Html::parse_document(PAGE);
        let expr = PathExpr::compile(path).expect("valid path");
        ids(&expr.select(&doc))
    }

    #[test]
    fn test_descendant_with_contains() {
        assert_eq!(
            select("//div[contains(@class,'item')]"),
            vec!["1", "2", "3", "3a"]
        );
    }

    #[test]
    fn test_exact_attribute_match() {
        assert!(select("//div[@class='item']").is_empty());
        assert_eq!(select("//div[@class='cell item']").len(), 4);
        assert_eq!(select("//div[@class!='cell item' and @class='cell']"), vec!["-"]);
    }

    #[test]
    fn test_positions_are_per_parent() {
        assert_eq!(select("//div[@class='box']/div[2]"), vec!["2"]);
        assert_eq!(select("//div[@class='box']/div[last()]"), vec!["3"]);
        // first item under the box, and first item under item 3
        assert_eq!(select("//div[@data-id][1]"), vec!["1", "3a"]);
    }

    #[test]
    fn test_absolute_and_relative_paths() {
        assert_eq!(select("/html/body/div/div/div[1]"), vec!["1"]);
        assert_eq!(select("./html/body//div[@data-id='3a']"), vec!["3a"]);
        assert_eq!(select("//a[starts-with(@href,'/t/')]/..").len(), 4);
    }

    #[test]
    fn test_text_equality() {
        let doc = Html::parse_document(PAGE);
        let expr = PathExpr::compile("//a[text()='second']").expect("valid path");
        let found = expr.select(&doc);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].value().attr("href"), Some("/t/2"));

        let expr = PathExpr::compile("//span[contains(., 'A')]").expect("valid path");
        assert_eq!(expr.select(&doc).len(), 1);
    }

    #[test]
    fn test_element_scope_is_relative() {
        let doc = Html::parse_document(PAGE);
        let item = PathExpr::compile("//div[@data-id='3']")
            .expect("valid path")
            .select_first(&doc)
            .expect("item present");

        let links = PathExpr::compile("//a").expect("valid path").select(item);
        let hrefs: Vec<_> = links.iter().filter_map(|a| a.value().attr("href")).collect();
        assert_eq!(hrefs, vec!["/t/3", "/t/4"]);

        let direct = PathExpr::compile("./a").expect("valid path").select(item);
        assert_eq!(direct.len(), 1);
    }

    #[test]
    fn test_results_are_in_document_order_without_duplicates() {
        let doc = Html::parse_document(PAGE);
        let expr = PathExpr::compile("//div//a").expect("valid path");
        let hrefs: Vec<_> = expr
            .select(&doc)
            .iter()
            .filter_map(|a| a.value().attr("href"))
            .collect();
        assert_eq!(hrefs, vec!["/t/1", "/t/2", "/t/3", "/t/4"]);
    }

    #[test]
    fn test_compile_errors() {
        for bad in [
            "",
            "//a/@href",
            "//a/text()",
            "//div[",
            "//div[0]",
            "//div[@class='x]",
            "//div/",
            "//.",
            "//div[contains(@class)]",
            "a b",
            "//div[a[text()='x']]",
        ] {
            assert!(PathExpr::compile(bad).is_err(), "should reject: {bad:?}");
        }
    }

    #[test]
    fn test_error_offset() {
        let err = PathExpr::compile("//a/@href").expect_err("attribute step");
        assert_eq!(err.offset, 4);
    }

    #[test]
    fn test_self_only() {
        assert!(PathExpr::compile(".").expect("valid").is_self_only());
        assert!(!PathExpr::compile("./div").expect("valid").is_self_only());
    }

    #[test]
    fn test_may_revisit_scope() {
        for path in [".", "./.", "./div/..", "..//a"] {
            assert!(
                PathExpr::compile(path).expect("valid").may_revisit_scope(),
                "should revisit: {path:?}"
            );
        }
        for path in ["./div", "//a", ".//span[@class='no']"] {
            assert!(
                !PathExpr::compile(path).expect("valid").may_revisit_scope(),
                "should descend: {path:?}"
            );
        }
    }

    #[test]
    fn test_zero_net_path_selects_scope_again() {
        let doc = Html::parse_document(PAGE);
        let item = PathExpr::compile("//div[@data-id='3']")
            .expect("valid path")
            .select_first(&doc)
            .expect("item present");
        let again = PathExpr::compile("./div/..").expect("valid path").select(item);
        assert_eq!(again.len(), 1);
        assert_eq!(again[0].id(), item.id());
    }

    #[test]
    fn test_child_step_under_nested_contexts_keeps_document_order() {
        let doc = Html::parse_document(
            r#"<section><div><p id="d"></p></div><p id="c"></p></section>"#,
        );
        let ids: Vec<_> = PathExpr::compile("//*/p")
            .expect("valid path")
            .select(&doc)
            .iter()
            .filter_map(|p| p.value().attr("id"))
            .collect();
        assert_eq!(ids, vec!["d", "c"]);
    }

    #[test]
    fn test_descendant_step_stays_inside_scope() {
        let doc = Html::parse_document(PAGE);
        let second = PathExpr::compile("//div[@data-id='2']")
            .expect("valid path")
            .select_first(&doc)
            .expect("item present");
        let links = PathExpr::compile("//a").expect("valid path").select(second);
        let hrefs: Vec<_> = links.iter().filter_map(|a| a.value().attr("href")).collect();
        assert_eq!(hrefs, vec!["/t/2"]);
    }
}
