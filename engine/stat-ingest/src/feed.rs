//! Locating and parsing the stat payload

use crate::error::{IngestError, Result};
use crate::models::RawStatRecord;
use crate::source::SourceOutput;
use tracing::debug;

/// Marker printed by the source right before the payload
pub const JSON_START: &str = "---JSON_START---";

/// Marker printed by the source right after the payload
pub const JSON_END: &str = "---JSON_END---";

/// Extract the stat records from whatever the source produced
pub fn extract(output: &SourceOutput) -> Result<Vec<RawStatRecord>> {
    match output {
        SourceOutput::Stdout(text) => extract_from_stdout(text),
        SourceOutput::PayloadFile { file, .. } => {
            let payload = std::fs::read_to_string(file.path())?;
            parse_payload(&payload)
        }
    }
}

/// Extract the records delimited by [`JSON_START`] and [`JSON_END`]
///
/// Only the first occurrence of each marker is considered.
pub fn extract_from_stdout(output: &str) -> Result<Vec<RawStatRecord>> {
    let start = output
        .find(JSON_START)
        .ok_or_else(|| IngestError::malformed_feed(format!("missing {JSON_START} marker")))?;
    let end = output
        .find(JSON_END)
        .ok_or_else(|| IngestError::malformed_feed(format!("missing {JSON_END} marker")))?;

    let payload_start = start + JSON_START.len();
    if end < payload_start {
        return Err(IngestError::malformed_feed(format!("{JSON_END} appears before {JSON_START}")));
    }

    parse_payload(&output[payload_start..end])
}

/// Parse a payload that holds nothing but the JSON array
pub fn parse_payload(payload: &str) -> Result<Vec<RawStatRecord>> {
    let payload = payload.trim();
    if payload.is_empty() {
        return Err(IngestError::malformed_feed("payload is empty"));
    }

    let records: Vec<RawStatRecord> = serde_json::from_str(payload)
        .map_err(|e| IngestError::malformed_feed(format!("payload is not a stat array: {e}")))?;

    debug!("Parsed {} raw stat records ({} bytes)", records.len(), payload.len());
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENARIO: &str = r#"---JSON_START---[{"player_id":"P1","player_display_name":"A","position":"QB","recent_team":"NYJ","season":2024,"week":1,"gameday":"2024-09-08","passing_yards":300}]---JSON_END---"#;

    #[test]
    fn test_extracts_single_record() {
        let records = extract_from_stdout(SCENARIO).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].player_id.as_deref(), Some("P1"));
        assert_eq!(records[0].passing_yards, Some(300.0));
    }

    #[test]
    fn test_ignores_surrounding_noise() {
        let output = format!("Downcasting floats.\n{JSON_START}\n[]\n{JSON_END}\ntrailing\n");
        assert!(extract_from_stdout(&output).unwrap().is_empty());
    }

    #[test]
    fn test_missing_start_marker() {
        let err = extract_from_stdout("[]---JSON_END---").unwrap_err();
        assert!(matches!(err, IngestError::MalformedFeed(_)));
    }

    #[test]
    fn test_missing_end_marker() {
        let err = extract_from_stdout("---JSON_START---[]").unwrap_err();
        assert!(matches!(err, IngestError::MalformedFeed(_)));
    }

    #[test]
    fn test_end_before_start() {
        let err = extract_from_stdout("---JSON_END---[]---JSON_START---").unwrap_err();
        assert!(matches!(err, IngestError::MalformedFeed(_)));
    }

    #[test]
    fn test_invalid_json() {
        let err = extract_from_stdout("---JSON_START--- {not json ---JSON_END---").unwrap_err();
        assert!(matches!(err, IngestError::MalformedFeed(_)));
    }

    #[test]
    fn test_object_instead_of_array() {
        let err = parse_payload(r#"{"player_id":"P1"}"#).unwrap_err();
        assert!(matches!(err, IngestError::MalformedFeed(_)));
    }

    #[test]
    fn test_empty_payload() {
        assert!(parse_payload("  \n").is_err());
    }

    #[test]
    fn test_payload_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "\n[{\"player_id\":\"P9\"}]\n").unwrap();

        let records =
            extract(&SourceOutput::PayloadFile { file, stdout: String::new() }).unwrap();
        assert_eq!(records[0].player_id.as_deref(), Some("P9"));
    }
}
