// Folio Core - Typed prompt flows
//
// Shapes validate records crossing the caller and model boundaries, templates
// turn validated input into prompt text, and flows bind both to one model
// call behind a uniform `run` contract.

pub mod error;
pub mod flow;
pub mod model;
pub mod registry;
pub mod schema;
pub mod template;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use error::{FlowError, FlowResult, ModelError, ModelResult, SchemaError, TemplateError};
pub use flow::{Flow, FlowDefinition, PromptSource};
pub use model::{invoke, MediaPart, Modality, Model, ModelOutput, ModelRequest, ResponseMode};
pub use registry::FlowRegistry;
pub use schema::{Field, FieldType, Shape, ValidatedValue};
pub use template::Template;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
