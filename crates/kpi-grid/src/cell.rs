//! Raw cell values as read from a grid.
//!
//! Cells are loosely typed in the source: a cell may be empty, hold text, or
//! hold a number. [`Cell`] keeps that shape unchanged so the only place that
//! interprets it numerically is [`crate::normalize`].

use std::fmt;

use serde::de::{self, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

/// A raw grid cell.
///
/// Serialized untagged: `null`, a JSON string, or a JSON number. On input a
/// boolean becomes the text `TRUE`/`FALSE`, and a nested array or object
/// becomes [`Cell::Blank`], so one odd cell never rejects a whole grid.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    /// A raw numeric value.
    Number(f64),
    /// Raw text, passed through untouched.
    Text(String),
    /// Absent or empty.
    #[default]
    Blank,
}

impl Cell {
    /// Builds a cell from text, mapping whitespace-only text to [`Cell::Blank`].
    #[must_use]
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        if text.trim().is_empty() {
            Self::Blank
        } else {
            Self::Text(text)
        }
    }

    /// Returns true if the cell carries no value.
    ///
    /// Whitespace-only text counts as blank.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Blank => true,
            Self::Text(text) => text.trim().is_empty(),
            Self::Number(_) => false,
        }
    }

    /// Returns the text content, if this is a text cell.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Canonical form used when storing a cell in a metric block.
    #[must_use]
    pub fn into_canonical(self) -> Self {
        if self.is_blank() { Self::Blank } else { self }
    }
}

impl<'de> Deserialize<'de> for Cell {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(CellVisitor)
    }
}

struct CellVisitor;

impl<'de> Visitor<'de> for CellVisitor {
    type Value = Cell;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a cell value")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Cell, E> {
        Ok(Cell::Text(if v { "TRUE" } else { "FALSE" }.to_string()))
    }

    #[allow(clippy::cast_precision_loss)]
    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Cell, E> {
        Ok(Cell::Number(v as f64))
    }

    #[allow(clippy::cast_precision_loss)]
    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Cell, E> {
        Ok(Cell::Number(v as f64))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Cell, E> {
        Ok(Cell::Number(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Cell, E> {
        Ok(Cell::Text(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Cell, E> {
        Ok(Cell::Text(v))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Cell, E> {
        Ok(Cell::Blank)
    }

    fn visit_none<E: de::Error>(self) -> Result<Cell, E> {
        Ok(Cell::Blank)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Cell, D::Error> {
        deserializer.deserialize_any(self)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Cell, A::Error> {
        while seq.next_element::<IgnoredAny>()?.is_some() {}
        Ok(Cell::Blank)
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Cell, A::Error> {
        while map.next_entry::<IgnoredAny, IgnoredAny>()?.is_some() {}
        Ok(Cell::Blank)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(text) => write!(f, "{text}"),
            Self::Blank => Ok(()),
        }
    }
}

impl From<&str> for Cell {
    fn from(text: &str) -> Self {
        Self::from_text(text)
    }
}

impl From<f64> for Cell {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

/// Folds full-width digits and numeric punctuation to their ASCII forms.
///
/// `０`–`９`, `：`, `，`, `．`, `－` and `＋` are mapped; everything else is kept.
#[must_use]
pub fn fold_width(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '０'..='９' => char::from_u32(c as u32 - '０' as u32 + '0' as u32).unwrap_or(c),
            '：' => ':',
            '，' => ',',
            '．' => '.',
            '－' | '−' => '-',
            '＋' => '+',
            _ => c,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_detection() {
        assert!(Cell::Blank.is_blank());
        assert!(Cell::Text("   ".to_string()).is_blank());
        assert!(Cell::Text("\u{3000}".to_string()).is_blank());
        assert!(!Cell::Text("0".to_string()).is_blank());
        assert!(!Cell::Number(0.0).is_blank());
    }

    #[test]
    fn from_text_maps_empty_to_blank() {
        assert_eq!(Cell::from(""), Cell::Blank);
        assert_eq!(Cell::from(" x "), Cell::Text(" x ".to_string()));
    }

    #[test]
    fn serde_untagged_shapes() {
        let cells: Vec<Cell> = serde_json::from_str(r#"[null, "12件", 3.5]"#).unwrap();
        assert_eq!(
            cells,
            vec![Cell::Blank, Cell::Text("12件".to_string()), Cell::Number(3.5)]
        );
        assert_eq!(serde_json::to_string(&cells).unwrap(), r#"[null,"12件",3.5]"#);
    }

    #[test]
    fn unexpected_json_values_still_load() {
        let cells: Vec<Cell> = serde_json::from_str(r#"[true, false, 7, {"v": 1}, [1, 2]]"#).unwrap();
        assert_eq!(
            cells,
            vec![
                Cell::Text("TRUE".to_string()),
                Cell::Text("FALSE".to_string()),
                Cell::Number(7.0),
                Cell::Blank,
                Cell::Blank,
            ]
        );
    }

    #[test]
    fn fold_width_digits_and_punctuation() {
        assert_eq!(fold_width("１２月３１日"), "12月31日");
        assert_eq!(fold_width("１，２３４．５"), "1,234.5");
        assert_eq!(fold_width("０：４２"), "0:42");
        assert_eq!(fold_width("abc"), "abc");
    }
}
