//! Dependency resolution for enum options and disabled fields
//!
//! Both resolvers evaluate dependencies against a value map: the row for body
//! fields, the section values for header and footer fields.

use serde::Serialize;

use crate::schema::{EnumValue, ProductSchema};
use crate::{value_text, FieldValues};

/// Option as offered to the user
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ResolvedOption {
    pub code: String,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Set on the placeholder kept for a stored value that is no longer offered
    pub disabled: bool,
}

impl From<&EnumValue> for ResolvedOption {
    fn from(value: &EnumValue) -> Self {
        Self {
            code: value.code.clone(),
            label: value.name.clone(),
            note: value.note.clone(),
            disabled: false,
        }
    }
}

/// Options of an enum property for the given context.
///
/// Starts from the entry's `default` list. The first triggered dependency
/// carrying `allowed_values` (or an `allowed_group`) replaces that list; later
/// dependencies are not combined. Inactive options are dropped, and a value
/// already stored in the context that is no longer offered comes back as a
/// disabled placeholder labelled with its raw code. Source order is kept.
pub fn resolve_options(
    schema: &ProductSchema,
    code: &str,
    context: Option<&FieldValues>,
) -> Vec<ResolvedOption> {
    let Some(entry) = schema.enum_entry(code) else {
        return Vec::new();
    };

    let mut working: Vec<&EnumValue> = entry.default.iter().collect();

    if let Some(values) = context {
        for dep in schema.dependencies_for(code) {
            if !dep.is_triggered(values) {
                continue;
            }
            if !dep.allowed_values.is_empty() {
                working = entry
                    .default
                    .iter()
                    .filter(|v| dep.allowed_values.contains(&v.code))
                    .collect();
                tracing::trace!(target_property = code, source = %dep.source_enum, "Options narrowed by allowed values");
                break;
            }
            if let Some(group) = dep.allowed_group.as_deref().and_then(|g| entry.group(g)) {
                working = group.iter().collect();
                tracing::trace!(target_property = code, source = %dep.source_enum, "Options narrowed by group");
                break;
            }
        }
    }

    let mut options: Vec<ResolvedOption> = working
        .into_iter()
        .filter(|v| v.is_active())
        .map(ResolvedOption::from)
        .collect();

    let selected = context
        .and_then(|values| values.get(code))
        .and_then(value_text)
        .filter(|s| !s.is_empty());

    if let Some(selected) = selected {
        if !options.iter().any(|o| o.code == selected) {
            options.push(ResolvedOption {
                code: selected.to_string(),
                label: selected.to_string(),
                note: None,
                disabled: true,
            });
        }
    }

    options
}

/// A field is disabled when any triggered dependency targeting it has
/// `field_disabled` set.
pub fn is_field_disabled(schema: &ProductSchema, code: &str, context: Option<&FieldValues>) -> bool {
    let Some(values) = context else {
        return false;
    };
    schema
        .dependencies_for(code)
        .any(|dep| dep.field_disabled && dep.is_triggered(values))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::validate_payload;
    use proptest::prelude::*;
    use serde_json::json;

    fn schema() -> ProductSchema {
        validate_payload(json!({
            "product_code": "ZALUZIE",
            "form_body": {
                "Code": "BODY",
                "Name": "Položky",
                "Properties": [
                    {"Code": "type", "Name": "Typ", "DataType": "enum"},
                    {"Code": "color", "Name": "Barva", "DataType": "enum"},
                    {"Code": "control", "Name": "Ovládání", "DataType": "enum"},
                    {"Code": "crank", "Name": "Klika", "DataType": "numeric"}
                ]
            },
            "enums": {
                "type": {"default": [
                    {"code": "standard", "name": "Standard"},
                    {"code": "premium", "name": "Premium"},
                    {"code": "motor", "name": "Motor"}
                ]},
                "color": {
                    "default": [
                        {"code": "white", "name": "Bílá"},
                        {"code": "grey", "name": "Šedá"},
                        {"code": "black", "name": "Černá"},
                        {"code": "oak", "name": "Dub", "active": false}
                    ],
                    "exclusive": [
                        {"code": "gold", "name": "Zlatá"},
                        {"code": "silver", "name": "Stříbrná"}
                    ]
                },
                "control": {"default": [
                    {"code": "left", "name": "Vlevo"},
                    {"code": "right", "name": "Vpravo"}
                ]}
            },
            "dependencies": [
                {"source_enum": "type", "source_value": "standard", "target_property": "color", "allowed_values": ["black", "white"]},
                {"source_enum": "type", "source_value": "standard", "target_property": "color", "allowed_values": ["grey"]},
                {"source_enum": "type", "source_value": "premium", "target_property": "color", "allowed_group": "exclusive"},
                {"source_enum": "type", "source_value": "motor", "target_property": "crank", "field_disabled": true},
                {"source_enum": "control", "source_value": "left", "target_property": "crank", "field_disabled": true}
            ]
        }))
        .unwrap()
    }

    fn row(pairs: &[(&str, &str)]) -> FieldValues {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), json!(v)))
            .collect()
    }

    fn codes(options: &[ResolvedOption]) -> Vec<&str> {
        options.iter().map(|o| o.code.as_str()).collect()
    }

    #[test]
    fn test_default_options_skip_inactive() {
        let s = schema();
        let options = resolve_options(&s, "color", None);
        assert_eq!(codes(&options), vec!["white", "grey", "black"]);
    }

    #[test]
    fn test_allowed_values_keep_source_order() {
        let s = schema();
        let options = resolve_options(&s, "color", Some(&row(&[("type", "standard")])));
        // first matching dependency wins, order comes from the default list
        assert_eq!(codes(&options), vec!["white", "black"]);
    }

    #[test]
    fn test_allowed_group_replaces_list() {
        let s = schema();
        let options = resolve_options(&s, "color", Some(&row(&[("type", "premium")])));
        assert_eq!(codes(&options), vec!["gold", "silver"]);
    }

    #[test]
    fn test_untriggered_dependency_ignored() {
        let s = schema();
        let options = resolve_options(&s, "color", Some(&row(&[("type", "motor")])));
        assert_eq!(codes(&options), vec!["white", "grey", "black"]);
    }

    #[test]
    fn test_inactive_selected_value_kept_as_placeholder() {
        let s = schema();
        let options = resolve_options(&s, "color", Some(&row(&[("color", "oak")])));
        assert_eq!(codes(&options), vec!["white", "grey", "black", "oak"]);
        let placeholder = options.last().unwrap();
        assert!(placeholder.disabled);
        assert_eq!(placeholder.label, "oak");
    }

    #[test]
    fn test_selected_value_outside_narrowed_list_kept() {
        let s = schema();
        let context = row(&[("type", "standard"), ("color", "grey")]);
        let options = resolve_options(&s, "color", Some(&context));
        assert_eq!(codes(&options), vec!["white", "black", "grey"]);
        assert!(options[2].disabled);
    }

    #[test]
    fn test_missing_enum_entry_is_empty() {
        let s = schema();
        assert!(resolve_options(&s, "crank", None).is_empty());
        assert!(resolve_options(&s, "nope", Some(&row(&[("nope", "x")]))).is_empty());
    }

    #[test]
    fn test_disabled_or_combined() {
        let s = schema();
        assert!(!is_field_disabled(&s, "crank", None));
        assert!(!is_field_disabled(&s, "crank", Some(&row(&[("type", "standard")]))));
        assert!(is_field_disabled(&s, "crank", Some(&row(&[("type", "motor")]))));
        assert!(is_field_disabled(&s, "crank", Some(&row(&[("control", "left")]))));
        assert!(!is_field_disabled(&s, "color", Some(&row(&[("type", "motor")]))));
    }

    proptest! {
        #[test]
        fn prop_resolution_is_idempotent(
            ty in prop_oneof![Just("standard"), Just("premium"), Just("motor"), Just("")],
            color in prop_oneof![Just("white"), Just("oak"), Just("gold"), Just("")],
        ) {
            let s = schema();
            let context = row(&[("type", ty), ("color", color)]);
            let first = resolve_options(&s, "color", Some(&context));
            let second = resolve_options(&s, "color", Some(&context));
            prop_assert_eq!(first, second);
        }

        #[test]
        fn prop_allowed_values_is_ordered_intersection(
            allowed in proptest::sample::subsequence(vec!["white", "grey", "black"], 1..=3),
        ) {
            let mut s = schema();
            s.dependencies = vec![serde_json::from_value(json!({
                "source_enum": "type",
                "source_value": "standard",
                "target_property": "color",
                "allowed_values": allowed.clone()
            })).unwrap()];
            let options = resolve_options(&s, "color", Some(&row(&[("type", "standard")])));
            let expected: Vec<&str> = ["white", "grey", "black"]
                .into_iter()
                .filter(|c| allowed.contains(c))
                .collect();
            prop_assert_eq!(codes(&options), expected);
        }
    }
}
