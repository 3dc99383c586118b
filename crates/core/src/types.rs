// Data model: raw upstream items and their normalized form

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One normalized hot-search entry, the only record shape handed to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedItem {
    /// 1-based rank, unique within a result set
    pub rank: u32,
    pub title: String,
    #[serde(rename = "hotScore")]
    pub score: String,
    pub trend: String,
    #[serde(rename = "url")]
    pub link: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// An untrusted item from the upstream `data` array.
///
/// Every field is optional and may arrive as a string or a number; an empty
/// string is treated the same as a missing field.
#[derive(Debug, Clone, Default)]
pub struct RawUpstreamItem {
    fields: Map<String, Value>,
}

impl RawUpstreamItem {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Non-empty text value of a field, numbers rendered as text.
    pub fn text(&self, key: &str) -> Option<String> {
        match self.fields.get(key)? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// First non-empty text value among `keys`, in order.
    pub fn first_text(&self, keys: &[String]) -> Option<String> {
        keys.iter().find_map(|key| self.text(key))
    }

    /// Non-negative integer value of a field, accepting numeric strings.
    pub fn index(&self, key: &str) -> Option<u32> {
        match self.fields.get(key)? {
            Value::Number(n) => n.as_u64().and_then(|v| u32::try_from(v).ok()),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: Value) -> RawUpstreamItem {
        match value {
            Value::Object(map) => RawUpstreamItem::new(map),
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_text_treats_empty_as_absent() {
        let item = raw(json!({"word": "", "query": "rust", "hotScore": 4821}));

        assert_eq!(item.text("word"), None);
        assert_eq!(item.text("query").as_deref(), Some("rust"));
        assert_eq!(item.text("hotScore").as_deref(), Some("4821"));
        assert_eq!(item.text("missing"), None);
    }

    #[test]
    fn test_index_accepts_numbers_and_numeric_strings() {
        assert_eq!(raw(json!({"index": 4})).index("index"), Some(4));
        assert_eq!(raw(json!({"index": "7"})).index("index"), Some(7));
        assert_eq!(raw(json!({"index": -1})).index("index"), None);
        assert_eq!(raw(json!({"index": 1.5})).index("index"), None);
        assert_eq!(raw(json!({"index": null})).index("index"), None);
    }

    #[test]
    fn test_normalized_item_wire_names() {
        let item = NormalizedItem {
            rank: 1,
            title: "headline".to_string(),
            score: "100".to_string(),
            trend: "🔥 Hot".to_string(),
            link: "https://example.com".to_string(),
            description: None,
        };

        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["hotScore"], "100");
        assert_eq!(json["url"], "https://example.com");
        assert!(json.get("description").is_none());
    }
}
