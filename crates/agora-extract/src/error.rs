use crate::problem::Problem;
use thiserror::Error;

/// A path expression that could not be compiled.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("at offset {offset}: {reason}")]
pub struct PathError {
    /// Byte offset into the expression where compilation stopped
    pub offset: usize,
    /// What was expected or rejected
    pub reason: String,
}

/// Errors raised while building a type's binding schema.
///
/// These surface the first time a type is requested from the
/// [`SchemaRegistry`](crate::SchemaRegistry), never mid-extraction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("{type_name}.{field}: invalid path `{path}` {source}")]
    InvalidPath {
        type_name: &'static str,
        field: &'static str,
        path: String,
        #[source]
        source: PathError,
    },

    #[error("{type_name}.{field}: field declared twice")]
    DuplicateField {
        type_name: &'static str,
        field: &'static str,
    },

    #[error("{type_name}.{field}: value selectors apply to scalar fields only")]
    SelectorOnObject {
        type_name: &'static str,
        field: &'static str,
    },

    #[error("{type_name}.{field}: `{path}` can re-enter {type_name} without descending")]
    SelfRecursion {
        type_name: &'static str,
        field: &'static str,
        path: String,
    },
}

/// Why a value could not be extracted.
///
/// `field` is the dotted trail from the top-level type to the failing field,
/// e.g. `replies[2].author`, and `path` is the expression that failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionError {
    #[error("{type_name}.{field}: no node matched `{path}`")]
    NotFound {
        type_name: &'static str,
        field: String,
        path: String,
    },

    #[error("{type_name}.{field}: node matched by `{path}` has no `{attribute}` attribute")]
    MissingAttribute {
        type_name: &'static str,
        field: String,
        path: String,
        attribute: String,
    },

    #[error("{type_name}.{field}: cannot read {value:?} matched by `{path}` as {expected}")]
    ShapeMismatch {
        type_name: &'static str,
        field: String,
        path: String,
        value: String,
        expected: &'static str,
    },

    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),
}

impl ExtractionError {
    /// The dotted field trail, if this is a field-level failure.
    #[must_use]
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::NotFound { field, .. }
            | Self::MissingAttribute { field, .. }
            | Self::ShapeMismatch { field, .. } => Some(field),
            Self::Schema(_) => None,
        }
    }

    /// The path expression that failed, if this is a field-level failure.
    #[must_use]
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::NotFound { path, .. }
            | Self::MissingAttribute { path, .. }
            | Self::ShapeMismatch { path, .. } => Some(path),
            Self::Schema(_) => None,
        }
    }

    /// Re-attribute a nested failure to the enclosing type, prefixing the
    /// field trail with the enclosing field (and list index).
    pub(crate) fn within(
        mut self,
        parent_type: &'static str,
        parent: &str,
        index: Option<usize>,
    ) -> Self {
        if let Self::NotFound {
            type_name, field, ..
        }
        | Self::MissingAttribute {
            type_name, field, ..
        }
        | Self::ShapeMismatch {
            type_name, field, ..
        } = &mut self
        {
            *type_name = parent_type;
            *field = match index {
                Some(i) => format!("{parent}[{i}].{field}"),
                None => format!("{parent}.{field}"),
            };
        }
        self
    }
}

/// Failure reading a fetched page into a typed value.
///
/// The variants are ordered the way they are checked: transport status
/// first, then the embedded problem block, then extraction itself.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PageError {
    /// The session is missing, expired or forbidden.
    #[error("not signed in (HTTP {status})")]
    Unauthorized { status: u16 },

    #[error("request rejected (HTTP {status})")]
    ClientError { status: u16 },

    #[error("site unavailable (HTTP {status})")]
    ServerError { status: u16 },

    /// The site accepted the request but rendered validation errors.
    #[error("site rejected the request: {}", .0.messages().join("; "))]
    Validation(Problem),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),
}

impl PageError {
    /// True when the caller should send the user back to sign in.
    #[must_use]
    pub fn needs_sign_in(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }

    /// Messages meant for the user, present only for validation failures.
    #[must_use]
    pub fn user_messages(&self) -> Vec<String> {
        match self {
            Self::Validation(problem) => problem.messages(),
            _ => Vec::new(),
        }
    }
}

/// Result type for extraction operations.
pub type Result<T> = std::result::Result<T, ExtractionError>;

impl From<ExtractionError> for agora_core::AgoraError {
    fn from(err: ExtractionError) -> Self {
        Self::Extraction(err.to_string())
    }
}
