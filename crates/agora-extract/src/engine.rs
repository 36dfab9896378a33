//! The extraction engine: walks a type's schema against a parsed page.
//!
//! Extraction is synchronous and a pure read of the document. An
//! [`Extractor`] holds no per-call state, so one instance can serve any
//! number of concurrent callers, each with its own document.

use crate::error::{ExtractionError, Result};
use crate::path::Scope;
use crate::registry::SchemaRegistry;
use crate::schema::Bindable;
use agora_core::ExtractionConfig;
use scraper::{ElementRef, Html};
use std::sync::Arc;
use tracing::trace;

/// Populates [`Bindable`] types from HTML.
#[derive(Debug, Clone)]
pub struct Extractor {
    registry: Arc<SchemaRegistry>,
    trim_text: bool,
}

impl Extractor {
    /// Create an extractor backed by `registry`, with default settings.
    #[must_use]
    pub fn new(registry: Arc<SchemaRegistry>) -> Self {
        Self::with_config(registry, &ExtractionConfig::default())
    }

    /// Create an extractor using the `[extraction]` configuration section.
    #[must_use]
    pub fn with_config(registry: Arc<SchemaRegistry>, config: &ExtractionConfig) -> Self {
        Self {
            registry,
            trim_text: config.trim_text,
        }
    }

    /// The schema registry this extractor reads from.
    #[must_use]
    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    pub(crate) fn trims_text(&self) -> bool {
        self.trim_text
    }

    /// Extract `T` with the whole document as scope.
    pub fn extract<T: Bindable>(&self, document: &Html) -> Result<T> {
        self.extract_scope(Scope::Document(document))
    }

    /// Extract `T` with `element` as scope.
    pub fn extract_from<T: Bindable>(&self, element: ElementRef<'_>) -> Result<T> {
        self.extract_scope(Scope::Element(element))
    }

    /// Parse `html` as a document and extract `T` from it.
    pub fn extract_str<T: Bindable>(&self, html: &str) -> Result<T> {
        let document = Html::parse_document(html);
        self.extract(&document)
    }

    /// Core walk: every field of `T`, in declaration order.
    ///
    /// The value is only returned once every strict field resolved; the
    /// first strict miss aborts the whole object.
    pub(crate) fn extract_scope<T: Bindable>(&self, scope: Scope<'_>) -> Result<T> {
        let schema = self.registry.schema::<T>()?;
        let mut value = T::default();

        for field in schema.bound_fields() {
            let descriptor = &field.descriptor;
            let matches = descriptor.path().select(scope);

            if matches.is_empty() {
                if descriptor.is_tolerant() {
                    trace!(
                        type_name = T::TYPE_NAME,
                        field = descriptor.name(),
                        "tolerant field absent"
                    );
                    continue;
                }
                return Err(ExtractionError::NotFound {
                    type_name: T::TYPE_NAME,
                    field: descriptor.name().to_string(),
                    path: descriptor.path().source().to_string(),
                });
            }

            field.binder.bind(&mut value, descriptor, &matches, self)?;
        }

        Ok(value)
    }
}
