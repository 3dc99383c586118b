//! Replaceable mapping tables describing the upstream schema.
//!
//! The upstream field names and trend codes were derived from observed
//! payloads. Both tables deserialize from the config file so a schema change
//! upstream can be absorbed without touching the pipeline.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Names of the upstream fields each normalized field is read from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldMap {
    /// 0-based position reported by the upstream
    pub index: String,
    /// Tried in order; the first non-empty value wins
    pub title: Vec<String>,
    pub score: String,
    pub trend: String,
    /// Tried in order; the first non-empty value wins
    pub link: Vec<String>,
    pub description: String,
}

impl Default for FieldMap {
    fn default() -> Self {
        Self {
            index: "index".to_string(),
            title: vec!["word".to_string(), "query".to_string()],
            score: "hotScore".to_string(),
            trend: "hotChange".to_string(),
            link: vec!["url".to_string(), "rawUrl".to_string()],
            description: "desc".to_string(),
        }
    }
}

/// Exact-match lookup from upstream trend codes to display labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendTable {
    pub labels: HashMap<String, String>,
    /// Label for a code that is present but not in `labels`
    pub unknown: String,
    /// Label when the item carries no trend code at all
    pub missing: String,
}

impl Default for TrendTable {
    fn default() -> Self {
        let labels = [
            ("up", "↗️ Rising"),
            ("down", "↘️ Falling"),
            ("same", "➡️ Steady"),
            ("new", "🆕 New"),
            ("hot", "🔥 Hot"),
        ]
        .into_iter()
        .map(|(code, label)| (code.to_string(), label.to_string()))
        .collect();

        Self {
            labels,
            unknown: "➡️ No change".to_string(),
            missing: "➖ No data".to_string(),
        }
    }
}

impl TrendTable {
    /// Label for a raw trend code.
    pub fn label(&self, code: Option<&str>) -> &str {
        match code {
            None => &self.missing,
            Some(code) => self.labels.get(code).unwrap_or(&self.unknown),
        }
    }
}
