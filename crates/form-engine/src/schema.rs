//! Product schema payload
//!
//! The forms backend describes each product as a JSON payload with an optional
//! header block (`zahlavi`), a repeatable body block (`form_body`), an optional
//! footer block (`zapati`), enumerated option lists and dependency rules.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{FieldValues, SchemaError};

/// Key under which each exported row carries its id
pub(crate) const ROW_ID_KEY: &str = "id";

// =============================================================================
// Schema Types
// =============================================================================

/// Complete product schema
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProductSchema {
    pub product_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zahlavi: Option<SectionBlock>,
    pub form_body: SectionBlock,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zapati: Option<SectionBlock>,
    pub enums: BTreeMap<String, EnumEntry>,
    #[serde(default)]
    pub dependencies: Vec<PayloadDependency>,
}

impl ProductSchema {
    /// Header block, if the product has one
    pub fn header(&self) -> Option<&SectionBlock> {
        self.zahlavi.as_ref()
    }

    /// Footer block, if the product has one
    pub fn footer(&self) -> Option<&SectionBlock> {
        self.zapati.as_ref()
    }

    /// Option universe of an enum property
    pub fn enum_entry(&self, code: &str) -> Option<&EnumEntry> {
        self.enums.get(code)
    }

    /// Dependencies targeting a property, in declaration order
    pub fn dependencies_for<'a>(
        &'a self,
        code: &'a str,
    ) -> impl Iterator<Item = &'a PayloadDependency> + 'a {
        self.dependencies
            .iter()
            .filter(move |d| d.target_property == code)
    }

    fn check_unique_codes(&self) -> Result<(), SchemaError> {
        let blocks = [
            ("zahlavi", self.zahlavi.as_ref()),
            ("form_body", Some(&self.form_body)),
            ("zapati", self.zapati.as_ref()),
        ];

        for (name, block) in blocks {
            let Some(block) = block else { continue };
            let mut seen = HashSet::new();
            for prop in &block.properties {
                if !seen.insert(prop.code.as_str()) {
                    return Err(SchemaError::DuplicateCode {
                        section: name.to_string(),
                        code: prop.code.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Named group of properties rendered together
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SectionBlock {
    #[serde(rename = "Code", default)]
    pub code: String,
    #[serde(rename = "Name", default)]
    pub name: String,
    #[serde(rename = "Properties", default)]
    pub properties: Vec<PropertyDefinition>,
}

impl SectionBlock {
    pub fn property(&self, code: &str) -> Option<&PropertyDefinition> {
        self.properties.iter().find(|p| p.code == code)
    }

    pub fn contains(&self, code: &str) -> bool {
        self.property(code).is_some()
    }
}

/// Backend identifier of a property; numeric in most payloads
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyId {
    Number(i64),
    Text(String),
}

/// One form field
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PropertyDefinition {
    #[serde(rename = "ID", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<PropertyId>,
    #[serde(rename = "Code")]
    pub code: String,
    #[serde(rename = "Name", default)]
    pub name: String,
    #[serde(rename = "DataType")]
    pub data_type: DataType,
    /// Static value; wins over the type default
    #[serde(rename = "Value", default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(rename = "Label", default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl PropertyDefinition {
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Text,
    Numeric,
    Boolean,
    Enum,
    Textarea,
}

/// Option universe for one enum property
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EnumEntry {
    #[serde(default)]
    pub default: Vec<EnumValue>,
    /// Alternate option lists keyed by group id
    #[serde(flatten)]
    pub groups: BTreeMap<String, Vec<EnumValue>>,
}

impl EnumEntry {
    pub fn group(&self, name: &str) -> Option<&[EnumValue]> {
        self.groups.get(name).map(Vec::as_slice)
    }
}

/// One selectable option
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnumValue {
    pub code: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl EnumValue {
    /// Options without an explicit `active: false` are selectable
    pub fn is_active(&self) -> bool {
        self.active != Some(false)
    }
}

/// Conditional rule narrowing options of, or disabling, a target property
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PayloadDependency {
    pub source_enum: String,
    pub source_value: Value,
    pub target_property: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_values: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_group: Option<String>,
    #[serde(default)]
    pub field_disabled: bool,
}

impl PayloadDependency {
    /// Whether the source field currently holds the trigger value
    pub fn is_triggered(&self, values: &FieldValues) -> bool {
        values.get(&self.source_enum) == Some(&self.source_value)
    }
}

// =============================================================================
// Validation
// =============================================================================

/// Parse schema text. Malformed JSON is reported separately from a
/// structurally incomplete payload.
pub fn parse_schema(text: &str) -> Result<ProductSchema, SchemaError> {
    let value: Value = serde_json::from_str(text).map_err(SchemaError::Parse)?;
    validate_payload(value)
}

/// Check the minimal payload shape and decode it
pub fn validate_payload(value: Value) -> Result<ProductSchema, SchemaError> {
    check_shape(&value)?;

    let schema: ProductSchema =
        serde_json::from_value(value).map_err(|e| SchemaError::Invalid {
            field: "payload",
            reason: e.to_string(),
        })?;
    schema.check_unique_codes()?;
    if schema.form_body.contains(ROW_ID_KEY) {
        return Err(invalid("form_body.Properties", "code `id` is reserved for the row id"));
    }

    tracing::debug!(
        product_code = %schema.product_code,
        properties = schema.form_body.properties.len(),
        dependencies = schema.dependencies.len(),
        "Schema accepted"
    );
    Ok(schema)
}

fn check_shape(value: &Value) -> Result<(), SchemaError> {
    let payload = value.as_object().ok_or_else(|| SchemaError::Invalid {
        field: "payload",
        reason: "expected a JSON object".into(),
    })?;

    match payload.get("product_code") {
        None => return Err(SchemaError::Missing("product_code")),
        Some(Value::String(_)) => {}
        Some(_) => return Err(invalid("product_code", "expected a string")),
    }

    match payload.get("enums") {
        None => return Err(SchemaError::Missing("enums")),
        Some(Value::Object(_)) => {}
        Some(_) => return Err(invalid("enums", "expected an object")),
    }

    match payload.get("form_body").and_then(|body| body.get("Properties")) {
        None => Err(SchemaError::Missing("form_body.Properties")),
        Some(Value::Array(items)) if items.is_empty() => Err(invalid(
            "form_body.Properties",
            "must contain at least one property",
        )),
        Some(Value::Array(_)) => Ok(()),
        Some(_) => Err(invalid("form_body.Properties", "expected an array")),
    }
}

fn invalid(field: &'static str, reason: &str) -> SchemaError {
    SchemaError::Invalid {
        field,
        reason: reason.to_string(),
    }
}
