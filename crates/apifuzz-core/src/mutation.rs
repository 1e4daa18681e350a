//! Applying a [`FuzzingStrategy`] to a copy of a payload or header list.
//!
//! Field paths are `#`-separated object keys (`objectField#myField`). When a
//! path crosses an array, the remaining path is applied to every element.
//! Everything outside the targeted field is left as it was.

use apifuzz_types::{FuzzingStrategy, Header, StrategyKind, FIELD_PATH_SEPARATOR};
use serde_json::{Map, Value};

use crate::error::FuzzError;

/// Value currently stored at `path`; arrays on the way resolve to their
/// first element that contains the remaining path.
pub fn current_value<'a>(payload: &'a Value, path: &str) -> Option<&'a Value> {
    let mut node = payload;
    for segment in path.split(FIELD_PATH_SEPARATOR) {
        node = descend(node, segment)?;
    }
    Some(node)
}

fn descend<'a>(node: &'a Value, segment: &str) -> Option<&'a Value> {
    match node {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => items.iter().find_map(|item| descend(item, segment)),
        _ => None,
    }
}

/// Clone `payload` and apply `strategy` to the field at `path`.
pub fn apply_to_payload(
    payload: &Value,
    path: &str,
    strategy: &FuzzingStrategy,
) -> Result<Value, FuzzError> {
    let mut mutated = payload.clone();
    if strategy.kind == StrategyKind::Noop {
        return Ok(mutated);
    }

    let segments: Vec<&str> = path.split(FIELD_PATH_SEPARATOR).collect();
    if apply_at(&mut mutated, &segments, strategy) == 0 {
        return Err(FuzzError::FieldNotInPayload {
            field: path.to_string(),
        });
    }
    Ok(mutated)
}

/// Returns how many values were mutated.
fn apply_at(node: &mut Value, segments: &[&str], strategy: &FuzzingStrategy) -> usize {
    let Some((head, rest)) = segments.split_first() else {
        return 0;
    };
    match node {
        Value::Array(items) => items
            .iter_mut()
            .map(|item| apply_at(item, segments, strategy))
            .sum(),
        Value::Object(map) if rest.is_empty() => apply_to_entry(map, head, strategy),
        Value::Object(map) => match map.get_mut(*head) {
            Some(child) => apply_at(child, rest, strategy),
            None => 0,
        },
        _ => 0,
    }
}

fn apply_to_entry(map: &mut Map<String, Value>, key: &str, strategy: &FuzzingStrategy) -> usize {
    if strategy.kind == StrategyKind::Skip {
        return usize::from(map.remove(key).is_some());
    }
    let Some(slot) = map.get_mut(key) else {
        return 0;
    };
    match strategy.kind {
        StrategyKind::Replace => *slot = strategy.value.clone(),
        StrategyKind::Trail => {
            *slot = Value::String(format!("{}{}", text_of(slot), strategy.value_as_text()))
        }
        StrategyKind::Prefix => {
            *slot = Value::String(format!("{}{}", strategy.value_as_text(), text_of(slot)))
        }
        StrategyKind::Noop | StrategyKind::Skip => {}
    }
    1
}

fn text_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Clone `headers` and apply `strategy` to the header called `name`.
///
/// Only the targeted header can be removed; every other header, required or
/// not, is sent unchanged.
pub fn apply_to_headers(
    headers: &[Header],
    name: &str,
    strategy: &FuzzingStrategy,
) -> Result<Vec<Header>, FuzzError> {
    let mut mutated = headers.to_vec();
    let position = mutated
        .iter()
        .position(|h| h.has_name(name))
        .ok_or_else(|| FuzzError::FieldNotInPayload {
            field: name.to_string(),
        })?;

    match strategy.kind {
        StrategyKind::Noop => {}
        StrategyKind::Skip => {
            mutated.remove(position);
        }
        StrategyKind::Replace => mutated[position].value = strategy.value_as_text(),
        StrategyKind::Trail => mutated[position].value.push_str(&strategy.value_as_text()),
        StrategyKind::Prefix => mutated[position]
            .value
            .insert_str(0, &strategy.value_as_text()),
    }
    Ok(mutated)
}
