//! Agora Extract - Typed extraction from forum pages.
//!
//! The forum exposes almost nothing as an API, so this crate turns its
//! session-authenticated HTML into strongly-typed values. Each result type
//! declares a binding schema mapping fields to path-addressed nodes; the
//! [`Extractor`] walks that schema against a parsed page.
//!
//! # Architecture
//!
//! - **Paths** ([`path`]): the XPath subset used to address nodes
//! - **Values** ([`value`]): value selectors and scalar conversions
//! - **Schemas** ([`schema`]): the [`Bindable`] trait and schema builder
//! - **Registry** ([`registry`]): owned, build-once cache of schemas
//! - **Engine** ([`engine`]): the [`Extractor`]
//! - **Problems** ([`problem`]): status/problem-block classification
//!
//! # Example
//!
//! ```rust
//! use agora_extract::{Bindable, Extractor, FieldSpec, SchemaBuilder, SchemaRegistry};
//! use std::sync::Arc;
//!
//! #[derive(Debug, Default)]
//! struct Headline {
//!     title: String,
//!     link: String,
//! }
//!
//! impl Bindable for Headline {
//!     const TYPE_NAME: &'static str = "Headline";
//!
//!     fn bind(schema: SchemaBuilder<Self>) -> SchemaBuilder<Self> {
//!         schema
//!             .scalar(FieldSpec::text("title", "//h1/a"), |h, v| h.title = v)
//!             .scalar(FieldSpec::attr("link", "//h1/a", "href"), |h, v| h.link = v)
//!     }
//! }
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let extractor = Extractor::new(Arc::new(SchemaRegistry::new()));
//! let headline: Headline = extractor.extract_str(r#"<h1><a href="/t/1">Hello</a></h1>"#)?;
//! assert_eq!(headline.title, "Hello");
//! assert_eq!(headline.link, "/t/1");
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod engine;
#[allow(missing_docs)]
pub mod error;
pub mod path;
pub mod problem;
pub mod registry;
#[allow(missing_docs)]
pub mod schema;
pub mod value;

// Re-export commonly used types
pub use engine::Extractor;
pub use error::{ExtractionError, PageError, PathError, Result, SchemaError};
pub use path::{PathExpr, Scope};
pub use problem::{classify_status, Outcome, Problem};
pub use registry::SchemaRegistry;
pub use schema::{Bindable, FieldDescriptor, FieldSpec, SchemaBuilder, Shape, Tolerance, TypeDescriptor};
pub use value::{FromNodeValue, ValueSelector};
