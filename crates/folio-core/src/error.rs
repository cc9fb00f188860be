//! Error taxonomy for shapes, templates, model calls and flows
//!
//! Every failure surfaces to the immediate caller as one of these typed
//! values. Nothing here is recovered internally.

use thiserror::Error;

/// Shape violations, for both flow inputs and model outputs
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("missing required field '{0}'")]
    MissingField(String),

    #[error("field '{field}': expected {expected}, got {actual}")]
    TypeMismatch {
        field: String,
        expected: String,
        actual: String,
    },

    #[error("field '{field}' violates constraint: {constraint}")]
    ConstraintViolation { field: String, constraint: String },
}

impl SchemaError {
    /// Name of the offending field (`$` for the root value)
    pub fn field(&self) -> &str {
        match self {
            SchemaError::MissingField(field) => field,
            SchemaError::TypeMismatch { field, .. } => field,
            SchemaError::ConstraintViolation { field, .. } => field,
        }
    }
}

/// Template parse and render failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("unresolved placeholder '{0}'")]
    UnresolvedPlaceholder(String),

    #[error("template syntax error at byte {offset}: {message}")]
    Syntax { offset: usize, message: String },
}

/// Hosted model failures
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("provider returned {status}: {message}")]
    Provider { status: u16, message: String },

    #[error("malformed model response: {0}")]
    Malformed(String),

    #[error("prompt blocked by provider: {0}")]
    Blocked(String),

    #[error("model output does not match output shape: {0}")]
    OutputValidation(#[source] SchemaError),

    #[error("unsupported model '{0}'")]
    UnsupportedModel(String),

    #[error("model configuration error: {0}")]
    Config(String),
}

impl ModelError {
    pub fn transport(msg: impl Into<String>) -> Self {
        ModelError::Transport(msg.into())
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        ModelError::Malformed(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        ModelError::Config(msg.into())
    }
}

/// Errors returned by `define`, `lookup` and `Flow::run`
#[derive(Debug, Error)]
pub enum FlowError {
    #[error("invalid input: {0}")]
    InvalidInput(#[source] SchemaError),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("flow '{0}' produced no output")]
    EmptyModelOutput(String),

    #[error("flow '{0}' is already registered")]
    DuplicateFlowName(String),

    #[error("flow '{0}' not found")]
    NotFound(String),
}

impl FlowError {
    /// Whether a caller may reasonably retry the same request.
    ///
    /// Only vacuous model responses and transport hiccups qualify; shape and
    /// registry errors will fail the same way again.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            FlowError::EmptyModelOutput(_) | FlowError::Model(ModelError::Transport(_))
        )
    }
}

pub type FlowResult<T> = std::result::Result<T, FlowError>;
pub type ModelResult<T> = std::result::Result<T, ModelError>;
