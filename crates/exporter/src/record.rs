//! Positioned records and the JSON-lines input reader.

use std::fmt;
use std::io::BufRead;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use exporter_core::{Error, Result};

/// Location of a record in the source log. Defines the total export order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Position(u64);

impl Position {
    /// Create a position.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Get the raw position value.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl From<u64> for Position {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A unit of exported data.
///
/// The exporter never looks inside the payload; it only asks for the
/// record's position and its textual rendering.
pub trait ExportRecord {
    /// Position assigned by the upstream log.
    fn position(&self) -> Position;

    /// Render the record as JSON text.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload cannot be rendered.
    fn to_json(&self) -> Result<String>;
}

/// A record whose payload is an arbitrary JSON value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRecord {
    position: Position,
    value: Value,
}

impl JsonRecord {
    /// Create a record from a position and its payload.
    #[must_use]
    pub const fn new(position: Position, value: Value) -> Self {
        Self { position, value }
    }

    /// Parse one line of record JSON.
    ///
    /// The line must be a JSON object carrying an unsigned `"position"`
    /// field. The whole object becomes the payload.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidRecord` if the line is not an object with a
    /// valid position.
    pub fn from_json_line(line: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(line)
            .map_err(|e| Error::invalid_record(format!("malformed JSON: {e}")))?;

        let position = value
            .as_object()
            .ok_or_else(|| Error::invalid_record("record is not a JSON object"))?
            .get("position")
            .ok_or_else(|| Error::invalid_record("record has no 'position' field"))?
            .as_u64()
            .ok_or_else(|| Error::invalid_record("'position' is not an unsigned integer"))?;

        Ok(Self::new(Position::new(position), value))
    }

    /// Borrow the payload.
    #[must_use]
    pub const fn value(&self) -> &Value {
        &self.value
    }
}

impl ExportRecord for JsonRecord {
    fn position(&self) -> Position {
        self.position
    }

    fn to_json(&self) -> Result<String> {
        serde_json::to_string(&self.value)
            .map_err(|e| Error::render_failed(self.position.value(), e.to_string()))
    }
}

/// Read records from a JSON-lines stream.
///
/// Blank lines are skipped. A malformed line yields an `InvalidRecord` error
/// naming its 1-based line number; iteration can continue past it.
pub fn read_records<R: BufRead>(reader: R) -> impl Iterator<Item = Result<JsonRecord>> {
    reader
        .lines()
        .enumerate()
        .filter_map(|(index, line)| {
            let line_number = index.saturating_add(1);
            match line {
                Ok(text) if text.trim().is_empty() => None,
                Ok(text) => Some(JsonRecord::from_json_line(&text).map_err(|e| {
                    Error::invalid_record(format!("line {line_number}: {e}"))
                })),
                Err(e) => Some(Err(Error::Io(e))),
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // ==========================================================================
    // Position
    // ==========================================================================

    #[test]
    fn test_position_ordering() {
        assert!(Position::new(10) < Position::new(11));
        assert_eq!(Position::from(7).value(), 7);
        assert_eq!(Position::new(42).to_string(), "42");
    }

    #[test]
    fn test_position_serializes_as_plain_integer() -> Result<()> {
        let text = serde_json::to_string(&Position::new(5))
            .map_err(|e| Error::invalid_record(e.to_string()))?;
        assert_eq!(text, "5");
        Ok(())
    }

    // ==========================================================================
    // JsonRecord
    // ==========================================================================

    #[test]
    fn test_from_json_line_takes_position_from_object() -> Result<()> {
        let record = JsonRecord::from_json_line(r#"{"position":12,"valueType":"JOB"}"#)?;
        assert_eq!(record.position(), Position::new(12));
        assert_eq!(record.value()["valueType"], json!("JOB"));
        Ok(())
    }

    #[test]
    fn test_from_json_line_rejects_missing_position() {
        let result = JsonRecord::from_json_line(r#"{"key":"value"}"#);
        assert!(matches!(result, Err(Error::InvalidRecord { .. })));
    }

    #[test]
    fn test_from_json_line_rejects_negative_position() {
        let result = JsonRecord::from_json_line(r#"{"position":-1}"#);
        assert!(matches!(result, Err(Error::InvalidRecord { .. })));
    }

    #[test]
    fn test_from_json_line_rejects_non_object() {
        assert!(JsonRecord::from_json_line("[1,2,3]").is_err());
        assert!(JsonRecord::from_json_line("not json").is_err());
    }

    #[test]
    fn test_to_json_is_single_line() -> Result<()> {
        let record = JsonRecord::new(
            Position::new(1),
            json!({"nested": {"a": [1, 2]}, "b": "text"}),
        );
        let text = record.to_json()?;
        assert!(!text.contains('\n'));
        Ok(())
    }

    // ==========================================================================
    // read_records
    // ==========================================================================

    #[test]
    fn test_read_records_skips_blank_lines() -> Result<()> {
        let input = "{\"position\":1}\n\n   \n{\"position\":2}\n";
        let records = read_records(input.as_bytes()).collect::<Result<Vec<_>>>()?;
        let positions: Vec<u64> = records.iter().map(|r| r.position().value()).collect();
        assert_eq!(positions, vec![1, 2]);
        Ok(())
    }

    #[test]
    fn test_read_records_reports_line_number() {
        let input = "{\"position\":1}\n{broken\n";
        let results: Vec<_> = read_records(input.as_bytes()).collect();
        assert_eq!(results.len(), 2);
        let message = results
            .get(1)
            .and_then(|r| r.as_ref().err())
            .map(ToString::to_string)
            .unwrap_or_default();
        assert!(message.contains("line 2"), "got: {message}");
    }
}
