//! Binding schemas: which path feeds which field, and how.
//!
//! A type opts into extraction by implementing [`Bindable`]. Its
//! [`Bindable::bind`] declares each field once through a [`SchemaBuilder`];
//! the resulting [`TypeDescriptor`] is built by the
//! [`SchemaRegistry`](crate::SchemaRegistry) on first use and reused for
//! every later extraction.
//!
//! ```rust
//! use agora_extract::{Bindable, FieldSpec, SchemaBuilder};
//!
//! #[derive(Debug, Default)]
//! struct Member {
//!     name: String,
//!     avatar: Option<String>,
//! }
//!
//! impl Bindable for Member {
//!     const TYPE_NAME: &'static str = "Member";
//!
//!     fn bind(schema: SchemaBuilder<Self>) -> SchemaBuilder<Self> {
//!         schema
//!             .scalar(FieldSpec::text("name", "//h1"), |m, v| m.name = v)
//!             .scalar(
//!                 FieldSpec::attr("avatar", "//img[@class='avatar']", "src").tolerant(),
//!                 |m, v| m.avatar = Some(v),
//!             )
//!     }
//! }
//! ```

use crate::engine::Extractor;
use crate::error::{ExtractionError, SchemaError};
use crate::path::{PathExpr, Scope};
use crate::registry::SchemaRegistry;
use crate::value::{FromNodeValue, ValueSelector};
use scraper::ElementRef;
use serde::{Deserialize, Serialize};
use std::any::TypeId;
use std::marker::PhantomData;

/// A type that can be populated from a page.
///
/// `Default` supplies the value tolerant fields keep when nothing matches.
pub trait Bindable: Default + Send + Sync + 'static {
    /// Name used in schema and extraction errors.
    const TYPE_NAME: &'static str;

    /// Declare the type's fields.
    fn bind(schema: SchemaBuilder<Self>) -> SchemaBuilder<Self>;
}

/// Whether a field may be absent from the page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tolerance {
    /// Zero matches fail the whole containing object.
    #[default]
    Strict,
    /// Zero matches leave the field at its default.
    Tolerant,
}

/// The target shape of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    Scalar,
    ScalarList,
    /// Nested object of the named type
    Object(&'static str),
    /// Ordered list of objects of the named type
    ObjectList(&'static str),
}

/// Declaration of one field, before its path is compiled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    name: &'static str,
    path: String,
    selector: ValueSelector,
    tolerance: Tolerance,
}

impl FieldSpec {
    /// A field read with the given selector.
    #[must_use]
    pub fn new(name: &'static str, path: impl Into<String>, selector: ValueSelector) -> Self {
        Self {
            name,
            path: path.into(),
            selector,
            tolerance: Tolerance::Strict,
        }
    }

    /// Text content of the first match.
    #[must_use]
    pub fn text(name: &'static str, path: impl Into<String>) -> Self {
        Self::new(name, path, ValueSelector::Text)
    }

    /// Inner markup of the first match.
    #[must_use]
    pub fn inner_markup(name: &'static str, path: impl Into<String>) -> Self {
        Self::new(name, path, ValueSelector::InnerMarkup)
    }

    /// Outer markup of the first match.
    #[must_use]
    pub fn outer_markup(name: &'static str, path: impl Into<String>) -> Self {
        Self::new(name, path, ValueSelector::OuterMarkup)
    }

    /// A named attribute of the first match.
    #[must_use]
    pub fn attr(name: &'static str, path: impl Into<String>, attribute: &str) -> Self {
        Self::new(name, path, ValueSelector::Attribute(attribute.to_ascii_lowercase()))
    }

    /// A nested object or object list rooted at the matched node(s).
    #[must_use]
    pub fn node(name: &'static str, path: impl Into<String>) -> Self {
        Self::new(name, path, ValueSelector::Text)
    }

    /// Leave the field at its default when nothing matches.
    #[must_use]
    pub fn tolerant(mut self) -> Self {
        self.tolerance = Tolerance::Tolerant;
        self
    }
}

/// A compiled field: the inspectable part of a [`TypeDescriptor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    name: &'static str,
    path: PathExpr,
    selector: ValueSelector,
    tolerance: Tolerance,
    shape: Shape,
}

impl FieldDescriptor {
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub fn path(&self) -> &PathExpr {
        &self.path
    }

    #[must_use]
    pub fn selector(&self) -> &ValueSelector {
        &self.selector
    }

    #[must_use]
    pub fn tolerance(&self) -> Tolerance {
        self.tolerance
    }

    #[must_use]
    pub fn is_tolerant(&self) -> bool {
        self.tolerance == Tolerance::Tolerant
    }

    #[must_use]
    pub fn shape(&self) -> Shape {
        self.shape
    }
}

/// Reads a field's matched nodes into the target value.
pub(crate) trait FieldBinder<T>: Send + Sync {
    fn bind<'a>(
        &self,
        target: &mut T,
        field: &FieldDescriptor,
        matches: &[ElementRef<'a>],
        extractor: &Extractor,
    ) -> Result<(), ExtractionError>;
}

pub(crate) struct BoundField<T> {
    pub(crate) descriptor: FieldDescriptor,
    pub(crate) binder: Box<dyn FieldBinder<T>>,
}

/// Builds a dependency's schema so errors in nested types surface early.
pub(crate) type Dependency = fn(&SchemaRegistry) -> Result<(), SchemaError>;

fn ensure<U: Bindable>(registry: &SchemaRegistry) -> Result<(), SchemaError> {
    registry.schema::<U>().map(|_| ())
}

/// A nested field whose path can select the scope node again.
///
/// A cycle made only of these edges would recurse on the same node forever;
/// the registry rejects one when it resolves a type's dependencies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ScopeEdge {
    pub(crate) field: &'static str,
    pub(crate) path: String,
    pub(crate) target: TypeId,
}

/// The compiled schema of one [`Bindable`] type.
pub struct TypeDescriptor<T> {
    type_name: &'static str,
    fields: Vec<BoundField<T>>,
    dependencies: Vec<Dependency>,
    scope_edges: Vec<ScopeEdge>,
}

impl<T> TypeDescriptor<T> {
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Field descriptors in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().map(|f| &f.descriptor)
    }

    /// Look up a field by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields().find(|f| f.name == name)
    }

    pub(crate) fn bound_fields(&self) -> &[BoundField<T>] {
        &self.fields
    }

    pub(crate) fn dependencies(&self) -> &[Dependency] {
        &self.dependencies
    }

    pub(crate) fn scope_edges(&self) -> &[ScopeEdge] {
        &self.scope_edges
    }
}

impl<T> std::fmt::Debug for TypeDescriptor<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("type_name", &self.type_name)
            .field("fields", &self.fields().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

/// Collects field declarations for a [`Bindable`] type.
///
/// The first invalid declaration is remembered and reported by
/// [`SchemaBuilder::finish`]; later declarations are ignored.
pub struct SchemaBuilder<T> {
    type_name: &'static str,
    fields: Vec<BoundField<T>>,
    dependencies: Vec<Dependency>,
    scope_edges: Vec<ScopeEdge>,
    error: Option<SchemaError>,
}

impl<T: Bindable> SchemaBuilder<T> {
    pub(crate) fn new() -> Self {
        Self {
            type_name: T::TYPE_NAME,
            fields: Vec::new(),
            dependencies: Vec::new(),
            scope_edges: Vec::new(),
            error: None,
        }
    }

    /// A single value read from the first match.
    #[must_use]
    pub fn scalar<V, F>(self, spec: FieldSpec, set: F) -> Self
    where
        V: FromNodeValue + 'static,
        F: Fn(&mut T, V) + Send + Sync + 'static,
    {
        self.push(
            spec,
            Shape::Scalar,
            Box::new(ScalarBinder {
                set,
                _value: PhantomData,
            }),
        )
    }

    /// One value per match, in document order.
    #[must_use]
    pub fn scalar_list<V, F>(self, spec: FieldSpec, set: F) -> Self
    where
        V: FromNodeValue + 'static,
        F: Fn(&mut T, Vec<V>) + Send + Sync + 'static,
    {
        self.push(
            spec,
            Shape::ScalarList,
            Box::new(ScalarListBinder {
                set,
                _value: PhantomData,
            }),
        )
    }

    /// A nested object extracted from the first match.
    #[must_use]
    pub fn nested<U, F>(mut self, spec: FieldSpec, set: F) -> Self
    where
        U: Bindable,
        F: Fn(&mut T, U) + Send + Sync + 'static,
    {
        if !self.check_object::<U>(&spec) {
            return self;
        }
        self.dependencies.push(ensure::<U>);
        self.push(
            spec,
            Shape::Object(U::TYPE_NAME),
            Box::new(NestedBinder {
                set,
                _value: PhantomData,
            }),
        )
    }

    /// One nested object per match, in document order.
    #[must_use]
    pub fn list<U, F>(mut self, spec: FieldSpec, set: F) -> Self
    where
        U: Bindable,
        F: Fn(&mut T, Vec<U>) + Send + Sync + 'static,
    {
        if !self.check_object::<U>(&spec) {
            return self;
        }
        self.dependencies.push(ensure::<U>);
        self.push(
            spec,
            Shape::ObjectList(U::TYPE_NAME),
            Box::new(ListBinder {
                set,
                _value: PhantomData,
            }),
        )
    }

    /// Validate the declarations and produce the descriptor.
    pub fn finish(self) -> Result<TypeDescriptor<T>, SchemaError> {
        if let Some(err) = self.error {
            return Err(err);
        }
        Ok(TypeDescriptor {
            type_name: self.type_name,
            fields: self.fields,
            dependencies: self.dependencies,
            scope_edges: self.scope_edges,
        })
    }

    fn check_object<U: Bindable>(&mut self, spec: &FieldSpec) -> bool {
        if self.error.is_some() {
            return false;
        }
        if spec.selector != ValueSelector::Text {
            self.error = Some(SchemaError::SelectorOnObject {
                type_name: self.type_name,
                field: spec.name,
            });
            return false;
        }
        // Invalid paths are reported by `push`.
        let revisits = PathExpr::compile(&spec.path).is_ok_and(|p| p.may_revisit_scope());
        if !revisits {
            return true;
        }
        if TypeId::of::<U>() == TypeId::of::<T>() {
            self.error = Some(SchemaError::SelfRecursion {
                type_name: self.type_name,
                field: spec.name,
                path: spec.path.clone(),
            });
            return false;
        }
        self.scope_edges.push(ScopeEdge {
            field: spec.name,
            path: spec.path.clone(),
            target: TypeId::of::<U>(),
        });
        true
    }

    fn push(mut self, spec: FieldSpec, shape: Shape, binder: Box<dyn FieldBinder<T>>) -> Self {
        if self.error.is_some() {
            return self;
        }
        if self.fields.iter().any(|f| f.descriptor.name == spec.name) {
            self.error = Some(SchemaError::DuplicateField {
                type_name: self.type_name,
                field: spec.name,
            });
            return self;
        }

        match PathExpr::compile(&spec.path) {
            Ok(path) => self.fields.push(BoundField {
                descriptor: FieldDescriptor {
                    name: spec.name,
                    path,
                    selector: spec.selector,
                    tolerance: spec.tolerance,
                    shape,
                },
                binder,
            }),
            Err(source) => {
                self.error = Some(SchemaError::InvalidPath {
                    type_name: self.type_name,
                    field: spec.name,
                    path: spec.path,
                    source,
                });
            }
        }
        self
    }
}

/// Read one node with the field's selector; `Ok(None)` means "treat as absent".
fn read_node(
    type_name: &'static str,
    field: &FieldDescriptor,
    node: ElementRef<'_>,
    extractor: &Extractor,
) -> Result<Option<String>, ExtractionError> {
    match field.selector.read(node, extractor.trims_text()) {
        Some(raw) => Ok(Some(raw)),
        None if field.is_tolerant() => Ok(None),
        None => Err(ExtractionError::MissingAttribute {
            type_name,
            field: field.name.to_string(),
            path: field.path.source().to_string(),
            attribute: field.selector.attribute().unwrap_or_default().to_string(),
        }),
    }
}

fn convert<V: FromNodeValue>(
    type_name: &'static str,
    field: &FieldDescriptor,
    raw: String,
) -> Result<V, ExtractionError> {
    V::from_node_value(&raw).ok_or_else(|| ExtractionError::ShapeMismatch {
        type_name,
        field: field.name.to_string(),
        path: field.path.source().to_string(),
        value: raw,
        expected: V::EXPECTED,
    })
}

struct ScalarBinder<F, V> {
    set: F,
    _value: PhantomData<fn() -> V>,
}

impl<T, V, F> FieldBinder<T> for ScalarBinder<F, V>
where
    T: Bindable,
    V: FromNodeValue + 'static,
    F: Fn(&mut T, V) + Send + Sync,
{
    fn bind<'a>(
        &self,
        target: &mut T,
        field: &FieldDescriptor,
        matches: &[ElementRef<'a>],
        extractor: &Extractor,
    ) -> Result<(), ExtractionError> {
        let Some(first) = matches.first() else {
            return Ok(());
        };
        if let Some(raw) = read_node(T::TYPE_NAME, field, *first, extractor)? {
            (self.set)(target, convert(T::TYPE_NAME, field, raw)?);
        }
        Ok(())
    }
}

struct ScalarListBinder<F, V> {
    set: F,
    _value: PhantomData<fn() -> V>,
}

impl<T, V, F> FieldBinder<T> for ScalarListBinder<F, V>
where
    T: Bindable,
    V: FromNodeValue + 'static,
    F: Fn(&mut T, Vec<V>) + Send + Sync,
{
    fn bind<'a>(
        &self,
        target: &mut T,
        field: &FieldDescriptor,
        matches: &[ElementRef<'a>],
        extractor: &Extractor,
    ) -> Result<(), ExtractionError> {
        let mut values = Vec::with_capacity(matches.len());
        for node in matches {
            if let Some(raw) = read_node(T::TYPE_NAME, field, *node, extractor)? {
                values.push(convert(T::TYPE_NAME, field, raw)?);
            }
        }
        (self.set)(target, values);
        Ok(())
    }
}

struct NestedBinder<F, U> {
    set: F,
    _value: PhantomData<fn() -> U>,
}

impl<T, U, F> FieldBinder<T> for NestedBinder<F, U>
where
    T: Bindable,
    U: Bindable,
    F: Fn(&mut T, U) + Send + Sync,
{
    fn bind<'a>(
        &self,
        target: &mut T,
        field: &FieldDescriptor,
        matches: &[ElementRef<'a>],
        extractor: &Extractor,
    ) -> Result<(), ExtractionError> {
        let Some(first) = matches.first() else {
            return Ok(());
        };
        let value = extractor
            .extract_scope::<U>(Scope::Element(*first))
            .map_err(|e| e.within(T::TYPE_NAME, field.name, None))?;
        (self.set)(target, value);
        Ok(())
    }
}

struct ListBinder<F, U> {
    set: F,
    _value: PhantomData<fn() -> U>,
}

impl<T, U, F> FieldBinder<T> for ListBinder<F, U>
where
    T: Bindable,
    U: Bindable,
    F: Fn(&mut T, Vec<U>) + Send + Sync,
{
    fn bind<'a>(
        &self,
        target: &mut T,
        field: &FieldDescriptor,
        matches: &[ElementRef<'a>],
        extractor: &Extractor,
    ) -> Result<(), ExtractionError> {
        let items = matches
            .iter()
            .enumerate()
            .map(|(i, node)| {
                extractor
                    .extract_scope::<U>(Scope::Element(*node))
                    .map_err(|e| e.within(T::TYPE_NAME, field.name, Some(i)))
            })
            .collect::<Result<Vec<U>, _>>()?;
        (self.set)(target, items);
        Ok(())
    }
}
