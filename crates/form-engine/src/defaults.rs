//! Default values for freshly created fields

use serde_json::Value;

use crate::schema::{DataType, PropertyDefinition, SectionBlock};
use crate::FieldValues;

/// Initial value of a property: its static `Value` if present, otherwise
/// `false` for booleans and an empty string for everything else.
pub fn default_value(prop: &PropertyDefinition) -> Value {
    if let Some(value) = &prop.value {
        return value.clone();
    }
    match prop.data_type {
        DataType::Boolean => Value::Bool(false),
        DataType::Numeric | DataType::Text | DataType::Textarea | DataType::Enum => {
            Value::String(String::new())
        }
    }
}

/// Defaults for every property of a block, in schema order
pub fn section_defaults(block: &SectionBlock) -> FieldValues {
    block
        .properties
        .iter()
        .map(|p| (p.code.clone(), default_value(p)))
        .collect()
}

pub(crate) fn optional_section_defaults(block: Option<&SectionBlock>) -> FieldValues {
    block.map(section_defaults).unwrap_or_default()
}

/// Keep stored values for codes the block defines, default the rest and drop
/// anything the block does not know.
pub(crate) fn normalize_values(block: Option<&SectionBlock>, stored: &FieldValues) -> FieldValues {
    let Some(block) = block else {
        return FieldValues::new();
    };
    block
        .properties
        .iter()
        .map(|p| {
            let value = stored
                .get(&p.code)
                .cloned()
                .unwrap_or_else(|| default_value(p));
            (p.code.clone(), value)
        })
        .collect()
}
