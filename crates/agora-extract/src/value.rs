//! Turning a matched node into a scalar value.

use scraper::ElementRef;
use serde::{Deserialize, Serialize};
use std::fmt;

/// What to read from the first node a scalar field's path matches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueSelector {
    /// Concatenated text content of the node and its descendants
    #[default]
    Text,
    /// Serialized markup of the node's children
    InnerMarkup,
    /// Serialized markup of the node including its own tag
    OuterMarkup,
    /// Value of a single named attribute, e.g. `href`
    Attribute(String),
}

impl ValueSelector {
    /// Read the selected value. `None` only when a named attribute is absent.
    #[must_use]
    pub fn read(&self, node: ElementRef<'_>, trim_text: bool) -> Option<String> {
        match self {
            Self::Text => {
                let text: String = node.text().collect();
                Some(if trim_text {
                    text.trim().to_string()
                } else {
                    text
                })
            }
            Self::InnerMarkup => Some(node.inner_html()),
            Self::OuterMarkup => Some(node.html()),
            Self::Attribute(name) => node.value().attr(name).map(str::to_string),
        }
    }

    /// The attribute name, for attribute selectors.
    #[must_use]
    pub fn attribute(&self) -> Option<&str> {
        match self {
            Self::Attribute(name) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for ValueSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => f.write_str("text"),
            Self::InnerMarkup => f.write_str("inner markup"),
            Self::OuterMarkup => f.write_str("outer markup"),
            Self::Attribute(name) => write!(f, "@{name}"),
        }
    }
}

/// Conversion from the raw string a [`ValueSelector`] produced.
pub trait FromNodeValue: Sized {
    /// Human-readable target shape, used in mismatch errors.
    const EXPECTED: &'static str;

    /// Convert, or `None` when the value does not fit the target shape.
    fn from_node_value(raw: &str) -> Option<Self>;
}

impl FromNodeValue for String {
    const EXPECTED: &'static str = "a string";

    fn from_node_value(raw: &str) -> Option<Self> {
        Some(raw.to_string())
    }
}

impl FromNodeValue for bool {
    const EXPECTED: &'static str = "a boolean";

    fn from_node_value(raw: &str) -> Option<Self> {
        match raw.trim() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        }
    }
}

macro_rules! impl_from_node_value_parse {
    ($($ty:ty => $expected:literal),* $(,)?) => {
        $(
            impl FromNodeValue for $ty {
                const EXPECTED: &'static str = $expected;

                fn from_node_value(raw: &str) -> Option<Self> {
                    raw.trim().parse().ok()
                }
            }
        )*
    };
}

impl_from_node_value_parse! {
    u16 => "an unsigned integer",
    u32 => "an unsigned integer",
    u64 => "an unsigned integer",
    usize => "an unsigned integer",
    i32 => "an integer",
    i64 => "an integer",
    f64 => "a number",
}
