//! Serde helpers for numeric fields the API may emit as strings.
//!
//! Decimal columns are rendered as JSON strings (`"85.50"`) by the backend,
//! while computed fields arrive as plain numbers.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum Numeric {
    Float(f64),
    Text(String),
}

impl Numeric {
    fn into_f64<E: serde::de::Error>(self) -> Result<f64, E> {
        match self {
            Self::Float(value) => Ok(value),
            Self::Text(text) => text
                .trim()
                .parse::<f64>()
                .map_err(|err| E::custom(format!("invalid decimal '{text}': {err}"))),
        }
    }
}

pub(crate) fn f64_lenient<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Numeric::deserialize(deserializer)?.into_f64()
}

pub(crate) fn i64_lenient<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Identifier {
        Int(i64),
        Text(String),
    }

    match Identifier::deserialize(deserializer)? {
        Identifier::Int(value) => Ok(value),
        Identifier::Text(text) => text
            .trim()
            .parse::<i64>()
            .map_err(|err| D::Error::custom(format!("invalid identifier '{text}': {err}"))),
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Deserialize)]
    struct Sample {
        #[serde(deserialize_with = "super::f64_lenient")]
        value: f64,
        #[serde(deserialize_with = "super::i64_lenient")]
        id: i64,
    }

    #[test]
    fn accepts_strings_and_numbers() -> Result<(), serde_json::Error> {
        let text: Sample = serde_json::from_value(json!({"value": "85.50", "id": "7"}))?;
        assert!((text.value - 85.5).abs() < f64::EPSILON);
        assert_eq!(text.id, 7);

        let number: Sample = serde_json::from_value(json!({"value": 12, "id": 3}))?;
        assert!((number.value - 12.0).abs() < f64::EPSILON);
        assert_eq!(number.id, 3);
        Ok(())
    }

    #[test]
    fn rejects_garbage() {
        let result = serde_json::from_value::<Sample>(json!({"value": "n/a", "id": 1}));
        assert!(result.is_err());
    }
}
