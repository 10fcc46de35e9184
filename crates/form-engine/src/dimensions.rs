//! Width/height handling: derived area and range status

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{value_text, FieldValues};

/// Parse a millimetre dimension. Accepts a decimal comma; only positive
/// finite numbers count.
pub fn parse_dimension(raw: &str) -> Option<f64> {
    let normalized = raw.trim().replace(',', ".");
    normalized
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v > 0.0)
}

/// Area in m² from millimetre inputs, rounded to two decimals
pub fn compute_area(width: &str, height: &str) -> Option<String> {
    let width = parse_dimension(width)?;
    let height = parse_dimension(height)?;
    Some(format!("{:.2}", width * height / 1_000_000.0))
}

/// Inclusive millimetre range a product can be manufactured in
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DimensionRange {
    pub min: f64,
    pub max: f64,
}

impl DimensionRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn status(&self, value: Option<&Value>) -> DimensionStatus {
        let Some(text) = value.and_then(value_text) else {
            return DimensionStatus::Empty;
        };
        if text.trim().is_empty() {
            return DimensionStatus::Empty;
        }
        match parse_dimension(&text) {
            Some(v) if v >= self.min && v <= self.max => DimensionStatus::InRange,
            Some(_) => DimensionStatus::OutOfRange,
            None => DimensionStatus::Invalid,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DimensionStatus {
    Empty,
    InRange,
    OutOfRange,
    Invalid,
}

impl DimensionStatus {
    pub fn color(self) -> StatusColor {
        match self {
            Self::Empty => StatusColor::Neutral,
            Self::InRange => StatusColor::Ok,
            Self::OutOfRange | Self::Invalid => StatusColor::Error,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusColor {
    Neutral,
    Ok,
    Error,
}

/// Which row fields hold width, height and the derived area
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DimensionRule {
    pub width: String,
    pub height: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width_range: Option<DimensionRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height_range: Option<DimensionRange>,
}

impl DimensionRule {
    pub fn new(width: impl Into<String>, height: impl Into<String>) -> Self {
        Self {
            width: width.into(),
            height: height.into(),
            area: None,
            width_range: None,
            height_range: None,
        }
    }

    pub fn with_area(mut self, code: impl Into<String>) -> Self {
        self.area = Some(code.into());
        self
    }

    pub fn with_ranges(mut self, width: DimensionRange, height: DimensionRange) -> Self {
        self.width_range = Some(width);
        self.height_range = Some(height);
        self
    }

    pub(crate) fn codes(&self) -> impl Iterator<Item = &str> {
        [Some(self.width.as_str()), Some(self.height.as_str()), self.area.as_deref()]
            .into_iter()
            .flatten()
    }

    pub(crate) fn is_dimension(&self, code: &str) -> bool {
        code == self.width || code == self.height
    }

    /// Area derived from one row snapshot; `None` when either side is not a
    /// positive number.
    pub fn derive_area(&self, values: &FieldValues) -> Option<String> {
        let width = values.get(&self.width).and_then(value_text)?;
        let height = values.get(&self.height).and_then(value_text)?;
        compute_area(&width, &height)
    }

    /// Width and height status; unconfigured ranges report `Empty`/`InRange`
    /// based only on whether a value is present.
    pub fn status(&self, values: &FieldValues) -> (DimensionStatus, DimensionStatus) {
        let unbounded = DimensionRange::new(f64::MIN_POSITIVE, f64::MAX);
        let width = self.width_range.unwrap_or(unbounded);
        let height = self.height_range.unwrap_or(unbounded);
        (
            width.status(values.get(&self.width)),
            height.status(values.get(&self.height)),
        )
    }
}
