use crate::{config::ConfigError, normalize::NormalizeError, persist::PersistError};
use cfstore_schema::registry::RegistryError;
use std::fmt;
use thiserror::Error as ThisError;

///
/// InternalError
///
/// Structured error with a stable classification. Every failure the store
/// records into request or page state passes through this type first, so
/// observers see one message format regardless of where it came from.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[error("{message}")]
pub struct InternalError {
    pub class: ErrorClass,
    pub origin: ErrorOrigin,
    pub message: String,
}

impl InternalError {
    pub fn new(class: ErrorClass, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            class,
            origin,
            message: message.into(),
        }
    }

    /// Construct a not-found error for one entity.
    pub fn entity_not_found(kind: &str, id: &str) -> Self {
        Self::new(
            ErrorClass::NotFound,
            ErrorOrigin::Merge,
            format!("entity not found: {kind}/{id}"),
        )
    }

    #[must_use]
    pub const fn is_schema_mismatch(&self) -> bool {
        matches!(self.class, ErrorClass::SchemaMismatch)
    }

    #[must_use]
    pub fn display_with_class(&self) -> String {
        format!("{}:{}: {}", self.origin, self.class, self.message)
    }
}

impl From<NormalizeError> for InternalError {
    fn from(err: NormalizeError) -> Self {
        let class = match err {
            NormalizeError::SchemaMismatch { .. } | NormalizeError::UnexpectedShape { .. } => {
                ErrorClass::SchemaMismatch
            }
            NormalizeError::UnknownKind(_) => ErrorClass::Unsupported,
        };

        Self::new(class, ErrorOrigin::Normalize, err.to_string())
    }
}

impl From<RegistryError> for InternalError {
    fn from(err: RegistryError) -> Self {
        Self::new(ErrorClass::Unsupported, ErrorOrigin::Schema, err.to_string())
    }
}

impl From<cfstore_schema::Error> for InternalError {
    fn from(err: cfstore_schema::Error) -> Self {
        Self::new(ErrorClass::InvalidConfig, ErrorOrigin::Schema, err.to_string())
    }
}

impl From<ConfigError> for InternalError {
    fn from(err: ConfigError) -> Self {
        Self::new(ErrorClass::InvalidConfig, ErrorOrigin::Config, err.to_string())
    }
}

impl From<PersistError> for InternalError {
    fn from(err: PersistError) -> Self {
        Self::new(ErrorClass::Corruption, ErrorOrigin::Persist, err.to_string())
    }
}

///
/// ErrorClass
/// Error taxonomy for runtime classification.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorClass {
    SchemaMismatch,
    Fetch,
    NotFound,
    Unsupported,
    InvalidConfig,
    Corruption,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::SchemaMismatch => "schema_mismatch",
            Self::Fetch => "fetch",
            Self::NotFound => "not_found",
            Self::Unsupported => "unsupported",
            Self::InvalidConfig => "invalid_config",
            Self::Corruption => "corruption",
        };
        write!(f, "{label}")
    }
}

///
/// ErrorOrigin
/// Origin taxonomy for runtime classification.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorOrigin {
    Schema,
    Normalize,
    Merge,
    Request,
    Pagination,
    Relation,
    Config,
    Persist,
}

impl fmt::Display for ErrorOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Schema => "schema",
            Self::Normalize => "normalize",
            Self::Merge => "merge",
            Self::Request => "request",
            Self::Pagination => "pagination",
            Self::Relation => "relation",
            Self::Config => "config",
            Self::Persist => "persist",
        };
        write!(f, "{label}")
    }
}
