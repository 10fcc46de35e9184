//! Editable form state
//!
//! Serialized as-is into the `form_json` blob stored by the forms backend.

use serde::{Deserialize, Serialize};

use crate::FieldValues;

/// Header or footer block of a form
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FixedSection {
    /// `zahlavi`
    Header,
    /// `zapati`
    Footer,
}

/// One repeatable record; every `form_body` code has an entry
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FormRow {
    pub id: u64,
    #[serde(flatten)]
    pub values: FieldValues,
}

impl FormRow {
    pub fn new(id: u64, values: FieldValues) -> Self {
        Self { id, values }
    }
}

/// User-managed group of rows, typically one physical room
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub rows: Vec<FormRow>,
}

impl Room {
    pub fn row(&self, row_id: u64) -> Option<&FormRow> {
        self.rows.iter().find(|r| r.id == row_id)
    }
}

/// Snapshot of a whole form
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FormState {
    #[serde(default)]
    pub product_code: String,
    #[serde(default)]
    pub zahlavi: FieldValues,
    #[serde(default)]
    pub rooms: Vec<Room>,
    #[serde(default)]
    pub zapati: FieldValues,
}

impl FormState {
    pub fn room(&self, room_id: u64) -> Option<&Room> {
        self.rooms.iter().find(|r| r.id == room_id)
    }

    pub fn section(&self, section: FixedSection) -> &FieldValues {
        match section {
            FixedSection::Header => &self.zahlavi,
            FixedSection::Footer => &self.zapati,
        }
    }

    pub(crate) fn section_mut(&mut self, section: FixedSection) -> &mut FieldValues {
        match section {
            FixedSection::Header => &mut self.zahlavi,
            FixedSection::Footer => &mut self.zapati,
        }
    }

    /// Largest room or row id in use
    pub(crate) fn max_id(&self) -> u64 {
        self.rooms
            .iter()
            .flat_map(|room| std::iter::once(room.id).chain(room.rows.iter().map(|r| r.id)))
            .max()
            .unwrap_or(0)
    }

    /// Number of rows across all rooms
    pub fn row_count(&self) -> usize {
        self.rooms.iter().map(|r| r.rows.len()).sum()
    }
}
