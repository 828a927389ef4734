use crate::value::Value;
use thiserror::Error as ThisError;

///
/// AggregateError
///
/// Structured failures raised by the state and change engines. Nothing is
/// retried internally; retry policy belongs to the caller (re-fetch and
/// re-diff on `Conflict`, fix the model on `SchemaMismatch` or
/// `UnsupportedDefault`).
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum AggregateError {
    #[error("unknown attribute or association `{name}` on `{class}`")]
    SchemaMismatch { class: String, name: String },

    #[error("conflict on `{attribute}`: expected {expected}, found {actual}")]
    Conflict {
        attribute: String,
        expected: Value,
        actual: Value,
    },

    #[error("malformed payload for `{name}`: expected {expected}")]
    Malformed { name: String, expected: &'static str },

    #[error("default value for `{class}.{attribute}` does not survive its own codec")]
    UnsupportedDefault { class: String, attribute: String },

    #[error("aggregate exceeds {limit} levels")]
    DepthExceeded { limit: usize },

    #[error("changes rejected by validation ({count} finding(s))", count = errors.len())]
    InvalidChanges { errors: Vec<ValidationError> },

    #[error("{path}: {source}")]
    Context {
        path: String,
        #[source]
        source: Box<Self>,
    },
}

impl AggregateError {
    /// Prepend a field segment to the error path.
    #[must_use]
    pub fn with_field(self, field: impl AsRef<str>) -> Self {
        self.with_path_segment(field.as_ref())
    }

    /// Prepend an index segment to the error path.
    #[must_use]
    pub fn with_index(self, index: usize) -> Self {
        self.with_path_segment(format!("[{index}]"))
    }

    /// Return the full contextual path, if available.
    #[must_use]
    pub const fn path(&self) -> Option<&str> {
        match self {
            Self::Context { path, .. } => Some(path.as_str()),
            _ => None,
        }
    }

    /// Return the innermost, non-context error variant.
    #[must_use]
    pub fn leaf(&self) -> &Self {
        match self {
            Self::Context { source, .. } => source.leaf(),
            _ => self,
        }
    }

    #[must_use]
    fn with_path_segment(self, segment: impl Into<String>) -> Self {
        let segment = segment.into();
        match self {
            Self::Context { path, source } => Self::Context {
                path: Self::join_segments(segment.as_str(), path.as_str()),
                source,
            },
            source => Self::Context {
                path: segment,
                source: Box::new(source),
            },
        }
    }

    #[must_use]
    fn join_segments(prefix: &str, suffix: &str) -> String {
        if suffix.starts_with('[') {
            format!("{prefix}{suffix}")
        } else {
            format!("{prefix}.{suffix}")
        }
    }
}

///
/// ValidationError
///
/// One finding from change validation. An empty finding list means the
/// changes are safe to apply.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum ValidationError {
    #[error("malformed shape at `{path}`: expected {expected}")]
    Shape { path: String, expected: &'static str },

    #[error("changes do not survive double reversal")]
    NotInvolutive,

    #[error("simulated application failed: {source}")]
    Apply {
        #[source]
        source: Box<AggregateError>,
    },

    #[error("entity graph fails host validation after simulated application")]
    InvalidResult,

    #[error("applying changes and their reversal does not restore the original graph")]
    NotNeutral,
}
