//! Metric blocks anchored at a date label.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::cell::Cell;
use crate::date::DateLabel;
use crate::schema::{METRIC_COUNT, METRICS, MetricKind};

/// The 23 raw metric values of one block, in schema order.
///
/// Serialized as a JSON object keyed by metric name in schema order. Keys
/// outside the schema are dropped on load and missing keys read as blank.
#[derive(Debug, Clone, PartialEq)]
pub struct Metrics {
    values: Vec<Cell>,
}

impl Metrics {
    /// Zips cells positionally onto the schema.
    ///
    /// Extra cells are ignored and missing trailing cells are blank.
    #[must_use]
    pub fn from_cells(cells: impl IntoIterator<Item = Cell>) -> Self {
        let mut values: Vec<Cell> = cells
            .into_iter()
            .take(METRIC_COUNT)
            .map(Cell::into_canonical)
            .collect();
        values.resize(METRIC_COUNT, Cell::Blank);
        Self { values }
    }

    /// Returns the raw value of a metric, blank for unknown names.
    #[must_use]
    pub fn get(&self, name: &str) -> &Cell {
        static BLANK: Cell = Cell::Blank;
        METRICS
            .iter()
            .position(|m| m.name == name)
            .and_then(|i| self.values.get(i))
            .unwrap_or(&BLANK)
    }

    /// Sets the raw value of a metric. Unknown names are ignored.
    pub fn set(&mut self, name: &str, cell: Cell) {
        if let Some(i) = METRICS.iter().position(|m| m.name == name) {
            self.values[i] = cell.into_canonical();
        }
    }

    /// Iterates `(name, kind, value)` in schema order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, MetricKind, &Cell)> {
        METRICS
            .iter()
            .zip(self.values.iter())
            .map(|(spec, cell)| (spec.name, spec.kind, cell))
    }

    /// Names of metrics of the given kinds whose value is blank.
    pub fn blank_of<'a>(
        &'a self,
        kinds: &'a [MetricKind],
    ) -> impl Iterator<Item = &'static str> + 'a {
        self.iter()
            .filter(move |(_, kind, cell)| kinds.contains(kind) && cell.is_blank())
            .map(|(name, _, _)| name)
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::from_cells(std::iter::empty())
    }
}

impl Serialize for Metrics {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(METRIC_COUNT))?;
        for (name, _, cell) in self.iter() {
            map.serialize_entry(name, cell)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Metrics {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct MetricsVisitor;

        impl<'de> Visitor<'de> for MetricsVisitor {
            type Value = Metrics;

            fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str("a map of metric name to value")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Metrics, A::Error> {
                let mut raw: HashMap<String, Cell> = HashMap::new();
                while let Some((name, cell)) = access.next_entry::<String, Cell>()? {
                    raw.insert(name, cell);
                }
                Ok(Metrics::from_cells(
                    METRICS
                        .iter()
                        .map(|m| raw.remove(m.name).unwrap_or_default()),
                ))
            }
        }

        deserializer.deserialize_map(MetricsVisitor)
    }
}

/// One date-anchored metric block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateBlock {
    /// Owning sheet. Implied by the dataset's sheet mapping, not stored per block.
    #[serde(skip)]
    pub sheet: String,
    /// Canonical date label.
    #[serde(rename = "date")]
    pub label: DateLabel,
    /// A1 reference of the anchor cell.
    #[serde(rename = "a1")]
    pub anchor_ref: String,
    /// 1-based row of the anchor.
    pub row: usize,
    /// 1-based column of the anchor.
    pub col: usize,
    /// Raw metric values.
    pub metrics: Metrics,
}

impl DateBlock {
    /// Dataset ordering: by date, then by anchor reference text.
    #[must_use]
    pub fn dataset_order(&self, other: &Self) -> Ordering {
        self.label
            .cmp(&other.label)
            .then_with(|| self.anchor_ref.cmp(&other.anchor_ref))
    }
}
