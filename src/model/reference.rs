//! Encoded `name[:id]` references to related entities

use crate::error::LoadError;
use serde_json::Value;

/// A parsed `"<name>"` or `"<name>:<id>"` reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignReference {
    pub name: Option<String>,
    pub id: Option<i64>,
}

impl ForeignReference {
    /// Parse one encoded reference. Empty input yields `None`.
    ///
    /// The id is the run of digits after the last colon; a zero or
    /// unparseable id counts as absent.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.is_empty() {
            return None;
        }

        let (name, id) = match value.rfind(':') {
            Some(pos) if is_digits(&value[pos + 1..]) => {
                let id = value[pos + 1..].parse::<i64>().ok().filter(|id| *id != 0);
                (&value[..pos], id)
            }
            _ => (value, None),
        };

        let name = Some(name.trim()).filter(|n| !n.is_empty()).map(str::to_string);

        if name.is_none() && id.is_none() {
            return None;
        }

        Some(Self { name, id })
    }

    /// Both parts present, the only form that can be resolved
    pub fn resolved(&self) -> Result<(i64, &str), LoadError> {
        match (self.id, self.name.as_deref()) {
            (Some(id), Some(name)) => Ok((id, name)),
            _ => Err(LoadError::UnresolvedReference(format!("{:?}", self))),
        }
    }
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Split a single string holding several references.
///
/// Commas only separate references when the piece before them ends in an
/// `:<id>` suffix, so names containing commas survive.
pub fn split_references(value: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();

    for piece in value.split(',') {
        if !current.is_empty() {
            current.push(',');
        }
        current.push_str(piece);

        let ends_with_id = current
            .rfind(':')
            .map_or(false, |pos| is_digits(current[pos + 1..].trim_end()));
        if ends_with_id {
            parts.push(current.trim().to_string());
            current.clear();
        }
    }

    if !current.trim().is_empty() {
        parts.push(current.trim().to_string());
    }

    parts
}

/// Every parseable reference held by a field value (string or list of strings)
pub fn references_in(value: &Value) -> Vec<ForeignReference> {
    match value {
        Value::String(s) => split_references(s)
            .iter()
            .filter_map(|part| ForeignReference::parse(part))
            .collect(),
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .filter_map(ForeignReference::parse)
            .collect(),
        _ => Vec::new(),
    }
}

/// Integer id held by a scalar JSON value
pub fn id_from_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Every integer id held by a field value (scalar or list); zero ids are dropped
pub fn ids_in(value: &Value) -> Vec<i64> {
    let ids: Vec<i64> = match value {
        Value::Array(items) => items.iter().filter_map(id_from_value).collect(),
        Value::String(s) if s.contains(',') => s
            .split(',')
            .filter_map(|part| part.trim().parse().ok())
            .collect(),
        other => id_from_value(other).into_iter().collect(),
    };
    ids.into_iter().filter(|id| *id != 0).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_name_and_id() {
        assert_eq!(
            ForeignReference::parse("Name:42"),
            Some(ForeignReference { name: Some("Name".to_string()), id: Some(42) })
        );
    }

    #[test]
    fn test_parse_name_only() {
        assert_eq!(
            ForeignReference::parse("Name"),
            Some(ForeignReference { name: Some("Name".to_string()), id: None })
        );
        // no digits after the colon, so the colon belongs to the name
        assert_eq!(
            ForeignReference::parse("Star Wars: Rebellion"),
            Some(ForeignReference { name: Some("Star Wars: Rebellion".to_string()), id: None })
        );
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(ForeignReference::parse(""), None);
        assert_eq!(ForeignReference::parse("   "), None);
        assert_eq!(references_in(&Value::Null), Vec::new());
    }

    #[test]
    fn test_parse_id_only_and_zero_id() {
        assert_eq!(
            ForeignReference::parse(":7"),
            Some(ForeignReference { name: None, id: Some(7) })
        );
        assert_eq!(
            ForeignReference::parse("Nobody:0"),
            Some(ForeignReference { name: Some("Nobody".to_string()), id: None })
        );
    }

    #[test]
    fn test_split_comma_separated_references() {
        assert_eq!(split_references("Alice:5,Bob:7"), vec!["Alice:5", "Bob:7"]);
        assert_eq!(
            split_references("Smith, John:5, Bob:7"),
            vec!["Smith, John:5", "Bob:7"]
        );
        assert_eq!(split_references("Alice:5,Trailing"), vec!["Alice:5", "Trailing"]);
    }

    #[test]
    fn test_references_in_list() {
        let refs = references_in(&json!(["Alice:5", "", 12, "Bob:7"]));
        let resolved: Vec<(i64, &str)> = refs.iter().filter_map(|r| r.resolved().ok()).collect();
        assert_eq!(resolved, vec![(5, "Alice"), (7, "Bob")]);
    }

    #[test]
    fn test_ids_in_mixed_values() {
        assert_eq!(ids_in(&json!([3, "4", "x", 0])), vec![3, 4]);
        assert_eq!(ids_in(&json!("12")), vec![12]);
        assert_eq!(ids_in(&json!("1, 2")), vec![1, 2]);
        assert_eq!(ids_in(&Value::Null), Vec::<i64>::new());
    }
}
