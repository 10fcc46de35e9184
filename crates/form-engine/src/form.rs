//! Dynamic form bound to a product schema
//!
//! A [`DynamicForm`] is an immutable snapshot. Every operation borrows the
//! current snapshot and returns a new one, so a previous snapshot is never
//! observed half-updated.

use std::sync::Arc;

use serde_json::Value;

use crate::defaults::{normalize_values, optional_section_defaults, section_defaults};
use crate::dimensions::{DimensionRule, DimensionStatus};
use crate::resolve::{is_field_disabled, resolve_options, ResolvedOption};
use crate::schema::{ProductSchema, SectionBlock};
use crate::state::{FixedSection, FormRow, FormState, Room};
use crate::submission::{FormSubmission, FormUpdate};
use crate::{FormError, Result};

const ROOM_NAME_PREFIX: &str = "Místnost";

/// Largest id a form may hold; ids must stay exact in browser JSON numbers
pub const MAX_ID: u64 = (1 << 53) - 1;

#[derive(Clone, Debug)]
pub struct DynamicForm {
    schema: Arc<ProductSchema>,
    state: FormState,
    next_id: u64,
    dimensions: Option<DimensionRule>,
}

impl DynamicForm {
    /// Fresh form: header/footer defaults and one room holding one row
    pub fn generate(schema: Arc<ProductSchema>) -> Self {
        let state = FormState {
            product_code: schema.product_code.clone(),
            zahlavi: optional_section_defaults(schema.header()),
            rooms: Vec::new(),
            zapati: optional_section_defaults(schema.footer()),
        };
        let mut form = Self {
            schema,
            state,
            next_id: 1,
            dimensions: None,
        };
        form.push_room(None);
        tracing::debug!(product_code = %form.state.product_code, "Form generated");
        form
    }

    /// Rebuild a form from a stored `form_json` blob. Missing fields get their
    /// defaults, fields the schema no longer defines are dropped.
    pub fn from_form_json(schema: Arc<ProductSchema>, form_json: Value) -> Result<Self> {
        let stored: FormState = serde_json::from_value(form_json)?;

        if !stored.product_code.is_empty() && stored.product_code != schema.product_code {
            return Err(FormError::ProductMismatch {
                expected: schema.product_code.clone(),
                found: stored.product_code,
            });
        }

        let rooms = stored
            .rooms
            .iter()
            .map(|room| Room {
                id: room.id,
                name: room.name.clone(),
                rows: room
                    .rows
                    .iter()
                    .map(|row| {
                        FormRow::new(row.id, normalize_values(Some(&schema.form_body), &row.values))
                    })
                    .collect(),
            })
            .collect();

        let state = FormState {
            product_code: schema.product_code.clone(),
            zahlavi: normalize_values(schema.header(), &stored.zahlavi),
            rooms,
            zapati: normalize_values(schema.footer(), &stored.zapati),
        };
        let max_id = state.max_id();
        if max_id >= MAX_ID {
            return Err(FormError::IdOutOfRange(max_id));
        }
        let next_id = max_id + 1;

        Ok(Self {
            schema,
            state,
            next_id,
            dimensions: None,
        })
    }

    /// Derive area and range status from the given width/height fields
    pub fn with_dimension_rule(mut self, rule: DimensionRule) -> Result<Self> {
        if let Some(code) = rule.codes().find(|c| !self.schema.form_body.contains(c)) {
            return Err(FormError::UnknownProperty(code.to_string()));
        }
        self.dimensions = Some(rule);
        Ok(self)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn schema(&self) -> &ProductSchema {
        &self.schema
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    pub fn rooms(&self) -> &[Room] {
        &self.state.rooms
    }

    pub fn room(&self, room_id: u64) -> Option<&Room> {
        self.state.room(room_id)
    }

    pub fn dimension_rule(&self) -> Option<&DimensionRule> {
        self.dimensions.as_ref()
    }

    // =========================================================================
    // Rooms
    // =========================================================================

    pub fn add_room(&self, name: Option<&str>) -> Self {
        let mut next = self.clone();
        next.push_room(name);
        next
    }

    pub fn remove_room(&self, room_id: u64) -> Result<Self> {
        self.room(room_id).ok_or(FormError::RoomNotFound(room_id))?;
        let mut next = self.clone();
        next.state.rooms.retain(|r| r.id != room_id);
        Ok(next)
    }

    pub fn rename_room(&self, room_id: u64, name: impl Into<String>) -> Result<Self> {
        let mut next = self.clone();
        let room = next.room_mut(room_id)?;
        room.name = name.into();
        Ok(next)
    }

    // =========================================================================
    // Rows
    // =========================================================================

    pub fn add_row(&self, room_id: u64) -> Result<Self> {
        self.room(room_id).ok_or(FormError::RoomNotFound(room_id))?;
        let mut next = self.clone();
        let row = next.fresh_row();
        next.room_mut(room_id)?.rows.push(row);
        Ok(next)
    }

    /// Removing the last row leaves the room empty
    pub fn remove_row(&self, room_id: u64, row_id: u64) -> Result<Self> {
        let mut next = self.clone();
        let room = next.room_mut(room_id)?;
        let before = room.rows.len();
        room.rows.retain(|r| r.id != row_id);
        if room.rows.len() == before {
            return Err(FormError::RowNotFound { room_id, row_id });
        }
        Ok(next)
    }

    // =========================================================================
    // Edits
    // =========================================================================

    /// Set a header or footer value
    pub fn set_section_value(&self, section: FixedSection, code: &str, value: Value) -> Result<Self> {
        if !self.section_block(section).is_some_and(|b| b.contains(code)) {
            return Err(FormError::UnknownProperty(code.to_string()));
        }

        let current = self.state.section(section);
        if is_field_disabled(&self.schema, code, Some(current)) {
            tracing::debug!(code, ?section, "Edit rejected: field disabled");
            return Err(FormError::FieldDisabled(code.to_string()));
        }

        let mut next = self.clone();
        next.state.section_mut(section).insert(code.to_string(), value);
        Ok(next)
    }

    /// Set a row value. Editing width or height re-derives the area from the
    /// updated row; an unparsable dimension keeps the stored area.
    pub fn set_row_value(&self, room_id: u64, row_id: u64, code: &str, value: Value) -> Result<Self> {
        if !self.schema.form_body.contains(code) {
            return Err(FormError::UnknownProperty(code.to_string()));
        }
        let row = self.row(room_id, row_id)?;
        if is_field_disabled(&self.schema, code, Some(&row.values)) {
            tracing::debug!(code, room_id, row_id, "Edit rejected: field disabled");
            return Err(FormError::FieldDisabled(code.to_string()));
        }

        let mut updated = row.clone();
        updated.values.insert(code.to_string(), value);

        if let Some(rule) = self.dimensions.as_ref().filter(|r| r.is_dimension(code)) {
            if let (Some(area_code), Some(area)) = (rule.area.as_ref(), rule.derive_area(&updated.values)) {
                updated.values.insert(area_code.clone(), Value::String(area));
            }
        }

        let mut next = self.clone();
        let slot = next.row_mut(room_id, row_id)?;
        *slot = updated;
        Ok(next)
    }

    // =========================================================================
    // Resolution
    // =========================================================================

    /// Options of a body enum field for one row
    pub fn row_options(&self, room_id: u64, row_id: u64, code: &str) -> Result<Vec<ResolvedOption>> {
        let row = self.row(room_id, row_id)?;
        Ok(resolve_options(&self.schema, code, Some(&row.values)))
    }

    /// Options of a header or footer enum field
    pub fn section_options(&self, section: FixedSection, code: &str) -> Vec<ResolvedOption> {
        resolve_options(&self.schema, code, Some(self.state.section(section)))
    }

    pub fn is_row_field_disabled(&self, room_id: u64, row_id: u64, code: &str) -> Result<bool> {
        let row = self.row(room_id, row_id)?;
        Ok(is_field_disabled(&self.schema, code, Some(&row.values)))
    }

    pub fn is_section_field_disabled(&self, section: FixedSection, code: &str) -> bool {
        is_field_disabled(&self.schema, code, Some(self.state.section(section)))
    }

    /// Width/height status of a row; `None` without a dimension rule
    pub fn dimension_status(
        &self,
        room_id: u64,
        row_id: u64,
    ) -> Result<Option<(DimensionStatus, DimensionStatus)>> {
        let row = self.row(room_id, row_id)?;
        Ok(self.dimensions.as_ref().map(|rule| rule.status(&row.values)))
    }

    // =========================================================================
    // Export
    // =========================================================================

    pub fn to_form_json(&self) -> Result<Value> {
        Ok(serde_json::to_value(&self.state)?)
    }

    pub fn submission(&self, form_type: impl Into<String>, order_id: Option<i64>) -> Result<FormSubmission> {
        Ok(FormSubmission {
            form_type: form_type.into(),
            form_json: self.to_form_json()?,
            order_id,
        })
    }

    pub fn update(&self) -> Result<FormUpdate> {
        Ok(FormUpdate {
            form_json: self.to_form_json()?,
        })
    }

    // =========================================================================
    // Internals (only ever applied to a fresh clone)
    // =========================================================================

    fn section_block(&self, section: FixedSection) -> Option<&SectionBlock> {
        match section {
            FixedSection::Header => self.schema.header(),
            FixedSection::Footer => self.schema.footer(),
        }
    }

    fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id = self.next_id.saturating_add(1);
        id
    }

    fn fresh_row(&mut self) -> FormRow {
        let id = self.allocate_id();
        FormRow::new(id, section_defaults(&self.schema.form_body))
    }

    fn push_room(&mut self, name: Option<&str>) {
        let id = self.allocate_id();
        let row = self.fresh_row();
        let name = name
            .map(str::to_string)
            .unwrap_or_else(|| format!("{} {}", ROOM_NAME_PREFIX, self.state.rooms.len() + 1));
        self.state.rooms.push(Room {
            id,
            name,
            rows: vec![row],
        });
    }

    fn row(&self, room_id: u64, row_id: u64) -> Result<&FormRow> {
        self.room(room_id)
            .ok_or(FormError::RoomNotFound(room_id))?
            .row(row_id)
            .ok_or(FormError::RowNotFound { room_id, row_id })
    }

    fn room_mut(&mut self, room_id: u64) -> Result<&mut Room> {
        self.state
            .rooms
            .iter_mut()
            .find(|r| r.id == room_id)
            .ok_or(FormError::RoomNotFound(room_id))
    }

    fn row_mut(&mut self, room_id: u64, row_id: u64) -> Result<&mut FormRow> {
        self.room_mut(room_id)?
            .rows
            .iter_mut()
            .find(|r| r.id == row_id)
            .ok_or(FormError::RowNotFound { room_id, row_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dimensions::DimensionRange;
    use crate::schema::validate_payload;
    use serde_json::json;

    fn minimal_schema() -> Arc<ProductSchema> {
        Arc::new(
            validate_payload(json!({
                "product_code": "SIT",
                "form_body": {"Properties": [
                    {"Code": "W", "DataType": "numeric"},
                    {"Code": "H", "DataType": "numeric"}
                ]},
                "enums": {}
            }))
            .unwrap(),
        )
    }

    fn blind_schema() -> Arc<ProductSchema> {
        Arc::new(
            validate_payload(json!({
                "product_code": "ROLETA",
                "zahlavi": {"Code": "HDR", "Name": "Záhlaví", "Properties": [
                    {"Code": "customer", "Name": "Zákazník", "DataType": "text"},
                    {"Code": "delivery", "Name": "Doprava", "DataType": "enum"},
                    {"Code": "address", "Name": "Adresa", "DataType": "textarea"}
                ]},
                "form_body": {"Code": "BODY", "Name": "Položky", "Properties": [
                    {"Code": "width", "Name": "Šířka", "DataType": "numeric"},
                    {"Code": "height", "Name": "Výška", "DataType": "numeric"},
                    {"Code": "area", "Name": "Plocha", "DataType": "numeric"},
                    {"Code": "motor", "Name": "Motor", "DataType": "enum"},
                    {"Code": "crank", "Name": "Klika", "DataType": "numeric", "Value": "1200"},
                    {"Code": "blackout", "Name": "Zatemnění", "DataType": "boolean"}
                ]},
                "zapati": {"Code": "FTR", "Name": "Zápatí", "Properties": [
                    {"Code": "note", "Name": "Poznámka", "DataType": "textarea"}
                ]},
                "enums": {
                    "motor": {"default": [
                        {"code": "none", "name": "Bez motoru"},
                        {"code": "somfy", "name": "Somfy"}
                    ]},
                    "delivery": {"default": [
                        {"code": "pickup", "name": "Osobní odběr"},
                        {"code": "courier", "name": "Kurýr"}
                    ]}
                },
                "dependencies": [
                    {"source_enum": "motor", "source_value": "somfy", "target_property": "crank", "field_disabled": true},
                    {"source_enum": "delivery", "source_value": "pickup", "target_property": "address", "field_disabled": true}
                ]
            }))
            .unwrap(),
        )
    }

    fn first_ids(form: &DynamicForm) -> (u64, u64) {
        let room = &form.rooms()[0];
        (room.id, room.rows[0].id)
    }

    #[test]
    fn test_generate_minimal_form() {
        let form = DynamicForm::generate(minimal_schema());
        assert_eq!(form.rooms().len(), 1);
        assert_eq!(form.rooms()[0].rows.len(), 1);
        assert_eq!(
            serde_json::to_value(&form.rooms()[0].rows[0].values).unwrap(),
            json!({"W": "", "H": ""})
        );
        assert!(form.state().zahlavi.is_empty());
        assert!(form.state().zapati.is_empty());
    }

    #[test]
    fn test_minimal_values_stored_verbatim() {
        let form = DynamicForm::generate(minimal_schema());
        let (room, row) = first_ids(&form);
        let form = form
            .set_row_value(room, row, "W", json!("1500"))
            .unwrap()
            .set_row_value(room, row, "H", json!("1000"))
            .unwrap();
        let values = &form.room(room).unwrap().row(row).unwrap().values;
        assert_eq!(values.get("W"), Some(&json!("1500")));
        assert_eq!(values.get("H"), Some(&json!("1000")));
    }

    #[test]
    fn test_generate_with_sections_and_static_values() {
        let form = DynamicForm::generate(blind_schema());
        let row = &form.rooms()[0].rows[0];
        assert_eq!(row.values.get("crank"), Some(&json!("1200")));
        assert_eq!(row.values.get("blackout"), Some(&json!(false)));
        assert_eq!(row.values.len(), 6);
        assert_eq!(form.state().zahlavi.get("customer"), Some(&json!("")));
        assert_eq!(form.state().zapati.get("note"), Some(&json!("")));
        assert_eq!(form.rooms()[0].name, "Místnost 1");
    }

    #[test]
    fn test_add_room_has_one_full_row() {
        let form = DynamicForm::generate(blind_schema());
        let next = form.add_room(None).add_room(Some("Ložnice"));

        assert_eq!(form.rooms().len(), 1);
        assert_eq!(next.rooms().len(), 3);
        for room in next.rooms() {
            assert_eq!(room.rows.len(), 1);
            for prop in &next.schema().form_body.properties {
                assert!(room.rows[0].values.contains_key(&prop.code));
            }
        }
        assert_eq!(next.rooms()[1].name, "Místnost 2");
        assert_eq!(next.rooms()[2].name, "Ložnice");
    }

    #[test]
    fn test_ids_are_unique() {
        let form = DynamicForm::generate(minimal_schema()).add_room(None);
        let room = form.rooms()[1].id;
        let form = form.add_row(room).unwrap();
        let mut ids: Vec<u64> = form
            .rooms()
            .iter()
            .flat_map(|r| std::iter::once(r.id).chain(r.rows.iter().map(|row| row.id)))
            .collect();
        let total = ids.len();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), total);
    }

    #[test]
    fn test_rename_and_remove_room() {
        let form = DynamicForm::generate(minimal_schema()).add_room(None);
        let (first, _) = first_ids(&form);

        let renamed = form.rename_room(first, "Kuchyň").unwrap();
        assert_eq!(renamed.rooms()[0].name, "Kuchyň");
        assert_eq!(form.rooms()[0].name, "Místnost 1");

        let removed = renamed.remove_room(first).unwrap();
        assert_eq!(removed.rooms().len(), 1);
        assert!(matches!(removed.remove_room(first), Err(FormError::RoomNotFound(_))));
        assert!(matches!(form.rename_room(999, "x"), Err(FormError::RoomNotFound(999))));
    }

    #[test]
    fn test_remove_last_row_leaves_empty_room() {
        let form = DynamicForm::generate(minimal_schema());
        let (room, row) = first_ids(&form);
        let next = form.remove_row(room, row).unwrap();
        assert!(next.room(room).unwrap().rows.is_empty());
        assert_eq!(form.room(room).unwrap().rows.len(), 1);

        assert!(matches!(
            next.remove_row(room, row),
            Err(FormError::RowNotFound { .. })
        ));

        let refilled = next.add_row(room).unwrap();
        assert_eq!(refilled.room(room).unwrap().rows.len(), 1);
    }

    #[test]
    fn test_unknown_property_rejected() {
        let form = DynamicForm::generate(minimal_schema());
        let (room, row) = first_ids(&form);
        assert!(matches!(
            form.set_row_value(room, row, "depth", json!("1")),
            Err(FormError::UnknownProperty(_))
        ));
        assert!(matches!(
            form.set_section_value(FixedSection::Header, "W", json!("1")),
            Err(FormError::UnknownProperty(_))
        ));
    }

    #[test]
    fn test_disabled_row_field_keeps_value() {
        let form = DynamicForm::generate(blind_schema());
        let (room, row) = first_ids(&form);
        let form = form.set_row_value(room, row, "motor", json!("somfy")).unwrap();
        assert!(form.is_row_field_disabled(room, row, "crank").unwrap());

        let err = form.set_row_value(room, row, "crank", json!("900")).unwrap_err();
        assert!(matches!(err, FormError::FieldDisabled(_)));
        let values = &form.room(room).unwrap().row(row).unwrap().values;
        assert_eq!(values.get("crank"), Some(&json!("1200")));

        let form = form.set_row_value(room, row, "motor", json!("none")).unwrap();
        assert!(form.set_row_value(room, row, "crank", json!("900")).is_ok());
    }

    #[test]
    fn test_disabled_section_field() {
        let form = DynamicForm::generate(blind_schema())
            .set_section_value(FixedSection::Header, "delivery", json!("pickup"))
            .unwrap();
        assert!(form.is_section_field_disabled(FixedSection::Header, "address"));
        assert!(matches!(
            form.set_section_value(FixedSection::Header, "address", json!("Brno")),
            Err(FormError::FieldDisabled(_))
        ));
        assert_eq!(form.section_options(FixedSection::Header, "delivery").len(), 2);
    }

    #[test]
    fn test_area_derived_from_dimensions() {
        let form = DynamicForm::generate(blind_schema())
            .with_dimension_rule(DimensionRule::new("width", "height").with_area("area"))
            .unwrap();
        let (room, row) = first_ids(&form);

        let form = form
            .set_row_value(room, row, "width", json!("2000"))
            .unwrap()
            .set_row_value(room, row, "height", json!("1000"))
            .unwrap();
        let area = |f: &DynamicForm| f.room(room).unwrap().row(row).unwrap().values.get("area").cloned();
        assert_eq!(area(&form), Some(json!("2.00")));

        let form = form.set_row_value(room, row, "width", json!("abc")).unwrap();
        assert_eq!(area(&form), Some(json!("2.00")));

        let form = form.set_row_value(room, row, "width", json!("1500")).unwrap();
        assert_eq!(area(&form), Some(json!("1.50")));
    }

    #[test]
    fn test_dimension_rule_requires_known_codes() {
        let form = DynamicForm::generate(minimal_schema());
        let err = form
            .with_dimension_rule(DimensionRule::new("W", "H").with_area("area"))
            .unwrap_err();
        assert!(matches!(err, FormError::UnknownProperty(code) if code == "area"));
    }

    #[test]
    fn test_dimension_status() {
        let form = DynamicForm::generate(minimal_schema());
        let (room, row) = first_ids(&form);
        assert_eq!(form.dimension_status(room, row).unwrap(), None);

        let form = form
            .with_dimension_rule(
                DimensionRule::new("W", "H")
                    .with_ranges(DimensionRange::new(400.0, 3000.0), DimensionRange::new(400.0, 2500.0)),
            )
            .unwrap()
            .set_row_value(room, row, "W", json!("3500"))
            .unwrap();
        assert_eq!(
            form.dimension_status(room, row).unwrap(),
            Some((DimensionStatus::OutOfRange, DimensionStatus::Empty))
        );
    }

    #[test]
    fn test_row_options_follow_row() {
        let form = DynamicForm::generate(blind_schema());
        let (room, row) = first_ids(&form);
        let options = form.row_options(room, row, "motor").unwrap();
        assert_eq!(options.len(), 2);
        assert!(form.row_options(room, 999, "motor").is_err());
    }

    #[test]
    fn test_submission_payload() {
        let form = DynamicForm::generate(minimal_schema());
        let submission = form.submission("SIT", Some(42)).unwrap();
        assert_eq!(submission.form_type, "SIT");
        assert_eq!(submission.order_id, Some(42));
        assert_eq!(
            submission.form_json,
            json!({
                "product_code": "SIT",
                "zahlavi": {},
                "rooms": [{"id": 1, "name": "Místnost 1", "rows": [{"id": 2, "W": "", "H": ""}]}],
                "zapati": {}
            })
        );
        assert_eq!(form.update().unwrap().form_json, submission.form_json);
    }

    #[test]
    fn test_from_form_json_normalizes() {
        let stored = json!({
            "product_code": "SIT",
            "rooms": [{"id": 4, "name": "Obývák", "rows": [
                {"id": 7, "W": "800", "legacy": "x"}
            ]}]
        });
        let form = DynamicForm::from_form_json(minimal_schema(), stored).unwrap();
        let row = form.room(4).unwrap().row(7).unwrap();
        assert_eq!(serde_json::to_value(&row.values).unwrap(), json!({"W": "800", "H": ""}));

        let form = form.add_row(4).unwrap();
        assert_eq!(form.room(4).unwrap().rows[1].id, 8);
    }

    #[test]
    fn test_from_form_json_rejects_other_product() {
        let err = DynamicForm::from_form_json(minimal_schema(), json!({"product_code": "ROLETA"}))
            .unwrap_err();
        assert!(matches!(err, FormError::ProductMismatch { .. }));

        let err = DynamicForm::from_form_json(minimal_schema(), json!({"rooms": "nope"})).unwrap_err();
        assert!(matches!(err, FormError::InvalidFormJson(_)));
    }

    #[test]
    fn test_from_form_json_rejects_huge_ids() {
        let stored = json!({"rooms": [{"id": u64::MAX, "name": "x", "rows": []}]});
        let err = DynamicForm::from_form_json(minimal_schema(), stored).unwrap_err();
        assert!(matches!(err, FormError::IdOutOfRange(u64::MAX)));

        let stored = json!({"rooms": [{"id": 1, "name": "x", "rows": [{"id": MAX_ID}]}]});
        assert!(DynamicForm::from_form_json(minimal_schema(), stored).is_err());

        let stored = json!({"rooms": [{"id": MAX_ID - 1, "name": "x", "rows": []}]});
        let form = DynamicForm::from_form_json(minimal_schema(), stored).unwrap();
        assert_eq!(form.add_row(MAX_ID - 1).unwrap().rooms()[0].rows[0].id, MAX_ID);
    }

    #[test]
    fn test_exported_form_rehydrates() {
        let form = DynamicForm::generate(minimal_schema()).add_room(Some("Kuchyň"));
        let form = form.set_row_value(3, 4, "W", json!("950")).unwrap();
        let back = DynamicForm::from_form_json(minimal_schema(), form.to_form_json().unwrap()).unwrap();
        assert_eq!(back.state(), form.state());
    }
}
