//! Forgiving field readers for stored documents.
//!
//! Documents may come from older clients or be edited by hand, so a wrong-typed or `null` field
//! degrades to its default instead of failing the whole document.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Reads a string field. Numbers and booleans keep their text form; `null`, arrays and objects
/// become the empty string.
pub(crate) fn string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null | Value::Array(_) | Value::Object(_) => String::new(),
    })
}

/// Reads any defaultable field, falling back to `T::default()` when the value does not fit.
pub(crate) fn or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(T::deserialize(value).unwrap_or_default())
}

/// Reads a score. Fractional values round to the nearest integer; negative, non-finite or
/// non-numeric values become 0.
pub(crate) fn score<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let number = match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(match number {
        Some(n) if n.is_finite() && n > 0.0 => n.round().min(f64::from(u32::MAX)) as u32,
        _ => 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Sample {
        #[serde(deserialize_with = "string")]
        text: String,
        #[serde(deserialize_with = "score")]
        score: u32,
        #[serde(deserialize_with = "or_default")]
        list: Vec<u32>,
    }

    fn read(json: &str) -> Sample {
        serde_json::from_str(json).expect("lenient fields should never fail")
    }

    #[test]
    fn strings_accept_scalars_and_drop_structures() {
        assert_eq!(read(r#"{"text":130,"score":0,"list":[]}"#).text, "130");
        assert_eq!(read(r#"{"text":null,"score":0,"list":[]}"#).text, "");
        assert_eq!(read(r#"{"text":{"a":1},"score":0,"list":[]}"#).text, "");
    }

    #[test]
    fn scores_round_and_reject_nonsense() {
        assert_eq!(read(r#"{"text":"","score":3.5,"list":[]}"#).score, 4);
        assert_eq!(read(r#"{"text":"","score":"7","list":[]}"#).score, 7);
        assert_eq!(read(r#"{"text":"","score":-2,"list":[]}"#).score, 0);
        assert_eq!(read(r#"{"text":"","score":null,"list":[]}"#).score, 0);
    }

    #[test]
    fn mismatched_values_fall_back_to_default() {
        assert!(read(r#"{"text":"","score":0,"list":"nope"}"#).list.is_empty());
        assert_eq!(read(r#"{"text":"","score":0,"list":[1,2]}"#).list, vec![1, 2]);
    }
}
