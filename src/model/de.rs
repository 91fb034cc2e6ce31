//! Lenient serde helpers for scraped values

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Python-style truthiness of a JSON value
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(false, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// A flag that may arrive as bool, number, string or null
pub fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => matches!(s.trim().to_lowercase().as_str(), "true" | "1" | "yes"),
        Some(other) => is_truthy(&other),
        None => false,
    })
}

/// A list of strings that may arrive as one string, a list, or null
pub fn deserialize_string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) if !s.is_empty() => vec![s],
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) if !s.is_empty() => Some(s),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Deserialize)]
    struct Sample {
        #[serde(default, deserialize_with = "deserialize_flag")]
        flag: bool,
        #[serde(default, deserialize_with = "deserialize_string_list")]
        list: Vec<String>,
    }

    #[test]
    fn test_truthiness() {
        assert!(!is_truthy(&json!(null)));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!("")));
        assert!(!is_truthy(&json!([])));
        assert!(is_truthy(&json!(0.5)));
        assert!(is_truthy(&json!(["x"])));
    }

    #[test]
    fn test_lenient_fields() {
        let sample: Sample = serde_json::from_value(json!({"flag": "True", "list": "one"})).unwrap();
        assert!(sample.flag);
        assert_eq!(sample.list, vec!["one"]);

        let sample: Sample = serde_json::from_value(json!({"flag": null, "list": ["a", null, 3]})).unwrap();
        assert!(!sample.flag);
        assert_eq!(sample.list, vec!["a", "3"]);

        let sample: Sample = serde_json::from_value(json!({})).unwrap();
        assert!(!sample.flag);
        assert!(sample.list.is_empty());
    }
}
