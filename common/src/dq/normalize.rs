// Reconciles per-rule overrides into input entries before rendering

use crate::models::DqRuleInputEntry;
use serde_json::{Map, Value};

const INDEX_KEY: &str = "index";
const IS_SHOW_KEY: &str = "is_show";
const CAN_EDIT_KEY: &str = "can_edit";

/// Apply each entry's `values_map` overrides, then order entries by index.
///
/// The sort is stable, so entries sharing an index keep their stored order.
pub fn transform_input_entries(mut entries: Vec<DqRuleInputEntry>) -> Vec<DqRuleInputEntry> {
    for entry in &mut entries {
        if let Some(overrides) = parse_values_map(entry) {
            apply_overrides(entry, &overrides);
        }
    }

    entries.sort_by_key(|entry| entry.index);
    entries
}

fn parse_values_map(entry: &DqRuleInputEntry) -> Option<Map<String, Value>> {
    let raw = entry.values_map.as_deref()?.trim();
    if raw.is_empty() {
        return None;
    }

    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Some(map),
        Ok(_) => {
            tracing::warn!(entry_id = entry.id, "values_map is not a JSON object, ignoring");
            None
        }
        Err(e) => {
            tracing::warn!(entry_id = entry.id, error = %e, "Malformed values_map, ignoring");
            None
        }
    }
}

fn apply_overrides(entry: &mut DqRuleInputEntry, overrides: &Map<String, Value>) {
    if let Some(value) = overrides.get(&entry.field).filter(|v| !v.is_null()) {
        entry.data = Some(value_as_string(value));
    }
    if let Some(index) = overrides.get(INDEX_KEY).and_then(value_as_i32) {
        entry.index = index;
    }
    if let Some(is_show) = overrides.get(IS_SHOW_KEY).and_then(value_as_bool) {
        entry.is_show = is_show;
    }
    if let Some(can_edit) = overrides.get(CAN_EDIT_KEY).and_then(value_as_bool) {
        entry.can_edit = can_edit;
    }
}

fn value_as_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn value_as_i32(value: &Value) -> Option<i32> {
    match value {
        Value::Number(n) => n.as_i64().and_then(|n| i32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn value_as_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
