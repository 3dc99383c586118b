// Envelope validation and item normalization

use crate::error::{HotSearchError, HotSearchResult};
use crate::mapping::{FieldMap, TrendTable};
use crate::types::{NormalizedItem, RawUpstreamItem};
use serde_json::Value;
use std::collections::HashSet;

/// Value of the envelope `code` field on success.
pub const SUCCESS_CODE: i64 = 200;

/// Title used when none of the title fields carry a value.
pub const PLACEHOLDER_TITLE: &str = "Untitled";

/// Check the upstream envelope and extract its items.
///
/// The body must be non-null, carry `code == 200`, and hold a non-empty
/// `data` array of objects.
pub fn validate_envelope(body: Value) -> HotSearchResult<Vec<RawUpstreamItem>> {
    let mut envelope = match body {
        Value::Null => return Err(HotSearchError::invalid_payload("response body is empty")),
        Value::Object(map) => map,
        other => {
            return Err(HotSearchError::invalid_payload(format!(
                "expected a JSON object, got {}",
                json_kind(&other)
            )))
        }
    };

    match envelope.get("code").and_then(Value::as_i64) {
        Some(SUCCESS_CODE) => {}
        Some(code) => {
            return Err(HotSearchError::invalid_payload(format!(
                "upstream returned status code {}",
                code
            )))
        }
        None => {
            return Err(HotSearchError::invalid_payload(
                "status code field is missing",
            ))
        }
    }

    let data = match envelope.remove("data") {
        Some(Value::Array(data)) => data,
        Some(other) => {
            return Err(HotSearchError::invalid_payload(format!(
                "data field must be an array, got {}",
                json_kind(&other)
            )))
        }
        None => return Err(HotSearchError::invalid_payload("data field is missing")),
    };

    if data.is_empty() {
        return Err(HotSearchError::invalid_payload("data array is empty"));
    }

    let total = data.len();
    let items: Vec<RawUpstreamItem> = data
        .into_iter()
        .filter_map(|value| match value {
            Value::Object(map) => Some(RawUpstreamItem::new(map)),
            _ => None,
        })
        .collect();

    if items.len() < total {
        tracing::warn!(
            "Skipped {} non-object entries in upstream data",
            total - items.len()
        );
    }
    if items.is_empty() {
        return Err(HotSearchError::invalid_payload(
            "data array contains no objects",
        ));
    }

    Ok(items)
}

/// Normalize raw items into a rank-sorted sequence with unique ranks.
///
/// Rank comes from the item's own index field plus one, so gaps in the
/// upstream ordering survive. When two items claim the same index the one
/// that appeared first upstream is kept. Items without a usable index never
/// displace an indexed one: they take the lowest ranks left free, in
/// upstream order.
pub fn normalize(
    items: &[RawUpstreamItem],
    fields: &FieldMap,
    trends: &TrendTable,
) -> Vec<NormalizedItem> {
    let mut taken = HashSet::with_capacity(items.len());
    let mut normalized = Vec::with_capacity(items.len());
    let mut unindexed = Vec::new();

    for item in items {
        match item.index(&fields.index) {
            Some(index) => {
                let rank = index.saturating_add(1);
                let candidate = normalize_item(rank, item, fields, trends);
                if taken.insert(rank) {
                    normalized.push(candidate);
                } else {
                    tracing::warn!(
                        "Dropping duplicate rank {} ({:?})",
                        rank,
                        candidate.title
                    );
                }
            }
            None => unindexed.push(item),
        }
    }

    let mut next_free: u32 = 1;
    for item in unindexed {
        while taken.contains(&next_free) {
            next_free = next_free.saturating_add(1);
        }
        taken.insert(next_free);
        normalized.push(normalize_item(next_free, item, fields, trends));
    }

    normalized.sort_by_key(|item| item.rank);
    normalized
}

fn normalize_item(
    rank: u32,
    item: &RawUpstreamItem,
    fields: &FieldMap,
    trends: &TrendTable,
) -> NormalizedItem {
    let trend_code = item.text(&fields.trend);

    NormalizedItem {
        rank,
        title: item
            .first_text(&fields.title)
            .unwrap_or_else(|| PLACEHOLDER_TITLE.to_string()),
        score: item.text(&fields.score).unwrap_or_else(|| "0".to_string()),
        trend: trends.label(trend_code.as_deref()).to_string(),
        link: item.first_text(&fields.link).unwrap_or_default(),
        description: item.text(&fields.description),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
