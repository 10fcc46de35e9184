//! Dynamic Production Form Engine
//!
//! Interprets a backend-supplied product schema and maintains the editable
//! state of a blind/screen production form built from it.
//!
//! ## Flow
//!
//! 1. **Schema ingestion**: [`parse_schema`] / [`validate_payload`]
//! 2. **State synthesis**: [`DynamicForm::generate`] fills every field with its default
//! 3. **Dependency resolution**: [`resolve_options`] and [`is_field_disabled`] per row
//! 4. **Mutation**: every edit returns a new [`DynamicForm`] snapshot
//! 5. **Export**: [`DynamicForm::submission`] produces the payload for the forms backend
//!
//! The engine performs no I/O; transport lives in the gateway crate.

pub mod defaults;
pub mod dimensions;
pub mod form;
pub mod resolve;
pub mod schema;
pub mod state;
pub mod submission;

use std::borrow::Cow;

use serde_json::Value;
use thiserror::Error;

pub use defaults::{default_value, section_defaults};
pub use dimensions::{compute_area, DimensionRange, DimensionRule, DimensionStatus, StatusColor};
pub use form::DynamicForm;
pub use resolve::{is_field_disabled, resolve_options, ResolvedOption};
pub use schema::{
    parse_schema, validate_payload, DataType, EnumEntry, EnumValue, PayloadDependency,
    ProductSchema, PropertyDefinition, PropertyId, SectionBlock,
};
pub use state::{FixedSection, FormRow, FormState, Room};
pub use submission::{FormSubmission, FormUpdate, SubmitGuard, SubmitTicket};

/// Field values keyed by property code, in schema order
pub type FieldValues = serde_json::Map<String, Value>;

// =============================================================================
// Error Types
// =============================================================================

/// Rejection reasons for a schema payload
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Invalid JSON: {0}")]
    Parse(#[source] serde_json::Error),

    #[error("Missing required field: {0}")]
    Missing(&'static str),

    #[error("Invalid field {field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("Duplicate property code {code} in section {section}")]
    DuplicateCode { section: String, code: String },
}

/// Errors raised by form mutations
#[derive(Error, Debug)]
pub enum FormError {
    #[error("Room not found: {0}")]
    RoomNotFound(u64),

    #[error("Row {row_id} not found in room {room_id}")]
    RowNotFound { room_id: u64, row_id: u64 },

    #[error("Unknown property: {0}")]
    UnknownProperty(String),

    #[error("Field is disabled: {0}")]
    FieldDisabled(String),

    #[error("Stored form belongs to product {found}, expected {expected}")]
    ProductMismatch { expected: String, found: String },

    #[error("Stored id {0} is outside the id range")]
    IdOutOfRange(u64),

    #[error("Invalid form JSON: {0}")]
    InvalidFormJson(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, FormError>;

/// Textual view of a stored value, as the form inputs display it
pub(crate) fn value_text(value: &Value) -> Option<Cow<'_, str>> {
    match value {
        Value::String(s) => Some(Cow::Borrowed(s.as_str())),
        Value::Number(n) => Some(Cow::Owned(n.to_string())),
        Value::Bool(b) => Some(Cow::Owned(b.to_string())),
        _ => None,
    }
}
