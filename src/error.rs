//! Error types for dependency injection

use std::sync::Arc;
use thiserror::Error;

/// Error produced by a provider, shared so that [`DiError`] stays `Clone`.
pub type ProviderError = Arc<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur while binding, resolving or wiring services
#[derive(Error, Debug, Clone)]
pub enum DiError {
    /// No binding exists for the requested type and name
    #[error(
        "no provider found for type `{type_name}`{}, ensure the type provided matches the return value of the provider",
        display_name(.name)
    )]
    NotFound { type_name: &'static str, name: String },

    /// A binding exists for `Arc<T>` but the destination holds `T` by value
    #[error(
        "provider found for `Arc<{type_name}>`, but the destination holds `{type_name}` by value"
    )]
    PassedByValue { type_name: &'static str },

    /// The provider's signature cannot be bound
    #[error("provider function signature of `{signature}` is invalid, {reason}")]
    InvalidProviderSignature {
        signature: String,
        reason: &'static str,
    },

    /// The provider returned nothing where an instance was required
    #[error("provider for type `{type_name}` returned a nil value")]
    NilProviderResult { type_name: &'static str },

    /// The provider reported an error of its own
    #[error("provider for type `{type_name}` failed: {source}")]
    ProviderReturnedError {
        type_name: &'static str,
        #[source]
        source: ProviderError,
    },

    /// A field carries an injection tag that is neither `type` nor `name`
    #[error("field `{field}` has an invalid injection tag `{tag}`")]
    InvalidTag {
        field: &'static str,
        tag: &'static str,
    },

    /// A tagged field could not be resolved
    #[error("cannot resolve field `{field}` of type `{type_name}`: {source}")]
    UnresolvedField {
        field: &'static str,
        type_name: &'static str,
        #[source]
        source: Box<DiError>,
    },

    /// The value handed to fill does not lead to a struct
    #[error("cannot fill a value of type `{type_name}`: {reason}")]
    InvalidFillTarget {
        type_name: &'static str,
        reason: &'static str,
    },

    /// The requested type cannot be produced by a lookup
    #[error("invalid target type `{type_name}`, lookups produce `Arc<T>` (pointer or interface) values")]
    InvalidTarget { type_name: &'static str },

    /// A callable asks for an argument the container can never provide
    #[error(
        "invalid callable: parameter {position} of type `{type_name}` is not a pointer or interface type"
    )]
    InvalidCallReceiver {
        type_name: &'static str,
        position: usize,
    },

    /// Internal error
    #[error("internal DI error: {0}")]
    Internal(String),
}

fn display_name(name: &str) -> String {
    if name.is_empty() {
        String::new()
    } else {
        format!(" under name `{name}`")
    }
}

impl DiError {
    /// Create a NotFound error
    #[inline]
    pub fn not_found(type_name: &'static str, name: &str) -> Self {
        Self::NotFound {
            type_name,
            name: name.to_owned(),
        }
    }

    /// Create an InvalidProviderSignature error
    #[inline]
    pub fn invalid_signature(signature: impl ToString, reason: &'static str) -> Self {
        Self::InvalidProviderSignature {
            signature: signature.to_string(),
            reason,
        }
    }

    /// Wrap a field resolution failure
    #[inline]
    pub fn unresolved_field(field: &'static str, type_name: &'static str, source: DiError) -> Self {
        Self::UnresolvedField {
            field,
            type_name,
            source: Box::new(source),
        }
    }

    /// Create an Internal error for a product that is not of the requested type
    #[inline]
    pub fn mismatch(expected: &'static str) -> Self {
        Self::Internal(format!(
            "binding produced a value that is not of the requested type `{expected}`"
        ))
    }

    /// Walk `UnresolvedField` wrappers down to the error that started the failure.
    pub fn root_cause(&self) -> &DiError {
        let mut current = self;
        while let Self::UnresolvedField { source, .. } = current {
            current = source;
        }
        current
    }
}

/// Result type alias for DI operations
pub type Result<T> = std::result::Result<T, DiError>;
