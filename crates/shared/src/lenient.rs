//! Strict parsing of loosely typed upstream fields.
//!
//! Some match data sources send numbers as JSON strings (`"3"`), empty
//! strings for "not yet known", or real integers. These helpers accept those
//! shapes and turn them into typed values, failing loudly on anything else.

use serde::Deserialize;
use thiserror::Error;

/// Error produced when a loosely typed field cannot be interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldParseError {
    #[error("field `{field}` is not an integer: {value:?}")]
    NotAnInteger { field: &'static str, value: String },

    #[error("field `{field}` is out of range: {value}")]
    OutOfRange { field: &'static str, value: i64 },
}

/// An integer that may arrive as a JSON number or as a string.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum LooseInt {
    Int(i64),
    Text(String),
}

impl LooseInt {
    /// Interprets the value as an optional integer.
    ///
    /// Blank strings mean "absent"; any other non-numeric text is an error.
    pub fn parse(&self, field: &'static str) -> Result<Option<i64>, FieldParseError> {
        match self {
            LooseInt::Int(v) => Ok(Some(*v)),
            LooseInt::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return Ok(None);
                }
                trimmed
                    .parse::<i64>()
                    .map(Some)
                    .map_err(|_| FieldParseError::NotAnInteger {
                        field,
                        value: s.clone(),
                    })
            }
        }
    }
}

/// Parses an optional loose field into a non-negative `i32` bounded by `max`.
pub fn parse_bounded_score(
    field: &'static str,
    raw: Option<&LooseInt>,
    max: i32,
) -> Result<Option<i32>, FieldParseError> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    match raw.parse(field)? {
        None => Ok(None),
        Some(v) if (0..=max as i64).contains(&v) => Ok(Some(v as i32)),
        Some(v) => Err(FieldParseError::OutOfRange { field, value: v }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Payload {
        score: Option<LooseInt>,
    }

    fn score_of(json: &str) -> Result<Option<i32>, FieldParseError> {
        let payload: Payload = serde_json::from_str(json).unwrap();
        parse_bounded_score("score", payload.score.as_ref(), 99)
    }

    #[test]
    fn test_parses_numbers_and_numeric_strings() {
        assert_eq!(score_of(r#"{"score": 3}"#), Ok(Some(3)));
        assert_eq!(score_of(r#"{"score": "3"}"#), Ok(Some(3)));
        assert_eq!(score_of(r#"{"score": " 12 "}"#), Ok(Some(12)));
    }

    #[test]
    fn test_absent_null_and_blank_are_none() {
        assert_eq!(score_of(r#"{}"#), Ok(None));
        assert_eq!(score_of(r#"{"score": null}"#), Ok(None));
        assert_eq!(score_of(r#"{"score": ""}"#), Ok(None));
    }

    #[test]
    fn test_rejects_garbage_text() {
        let err = score_of(r#"{"score": "three"}"#).unwrap_err();
        assert_eq!(
            err,
            FieldParseError::NotAnInteger {
                field: "score",
                value: "three".to_string()
            }
        );
        assert!(err.to_string().contains("score"));
    }

    #[test]
    fn test_rejects_out_of_range() {
        assert_eq!(
            score_of(r#"{"score": -1}"#),
            Err(FieldParseError::OutOfRange {
                field: "score",
                value: -1
            })
        );
        assert!(score_of(r#"{"score": "100"}"#).is_err());
    }
}
