// Per-tool argument validation

use hotsearch_core::{HotSearchError, HotSearchResult};
use serde_json::{Map, Value};

/// Untrusted tool arguments, checked field by field against a tool's schema.
pub struct Arguments<'a> {
    fields: Option<&'a Map<String, Value>>,
}

impl<'a> Arguments<'a> {
    /// Accepts an object, `null` or a missing value (treated as `{}`).
    pub fn parse(value: &'a Value) -> HotSearchResult<Self> {
        match value {
            Value::Null => Ok(Self { fields: None }),
            Value::Object(map) => Ok(Self { fields: Some(map) }),
            _ => Err(HotSearchError::invalid_argument(
                "arguments",
                "must be an object",
            )),
        }
    }

    /// Reject any property not listed in `allowed`.
    pub fn deny_unknown(&self, allowed: &[&str]) -> HotSearchResult<()> {
        let unknown = self
            .fields
            .into_iter()
            .flat_map(|map| map.keys())
            .find(|key| !allowed.contains(&key.as_str()));

        match unknown {
            Some(key) => Err(HotSearchError::invalid_argument(
                key.as_str(),
                "unknown property",
            )),
            None => Ok(()),
        }
    }

    fn get(&self, field: &str) -> Option<&'a Value> {
        self.fields?.get(field).filter(|v| !v.is_null())
    }

    /// Optional integer within `min..=max`, `default` when absent.
    ///
    /// Whole-valued floats such as `5.0` are accepted.
    pub fn integer_in_range(&self, field: &str, min: i64, max: i64, default: i64) -> HotSearchResult<i64> {
        let Some(value) = self.get(field) else {
            return Ok(default);
        };

        let number = value
            .as_i64()
            .or_else(|| value.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
            .ok_or_else(|| HotSearchError::invalid_argument(field, "must be an integer"))?;

        if !(min..=max).contains(&number) {
            return Err(HotSearchError::invalid_argument(
                field,
                format!("must be between {} and {}, got {}", min, max, number),
            ));
        }
        Ok(number)
    }

    /// Optional boolean, `default` when absent.
    pub fn boolean(&self, field: &str, default: bool) -> HotSearchResult<bool> {
        match self.get(field) {
            None => Ok(default),
            Some(value) => value
                .as_bool()
                .ok_or_else(|| HotSearchError::invalid_argument(field, "must be a boolean")),
        }
    }

    /// Required string that is not empty or whitespace.
    pub fn non_empty_string(&self, field: &str) -> HotSearchResult<&'a str> {
        let value = self
            .get(field)
            .ok_or_else(|| HotSearchError::invalid_argument(field, "is required"))?;
        let text = value
            .as_str()
            .ok_or_else(|| HotSearchError::invalid_argument(field, "must be a string"))?;

        if text.trim().is_empty() {
            return Err(HotSearchError::invalid_argument(field, "must not be empty"));
        }
        Ok(text)
    }
}
