use crate::foundation::error::{SlidecastError, SlidecastResult};
use serde_json::Value;

/// Deep-merge `override_doc` over `base`.
///
/// Objects merge key by key, recursively. Everything else (arrays, scalars, `null`) in the
/// override replaces the base value wholesale; arrays are never merged by index. `None` is a
/// no-op.
pub fn merge_override(base: Value, override_doc: Option<Value>) -> SlidecastResult<Value> {
    let Some(over) = override_doc else {
        return Ok(base);
    };
    if !over.is_object() {
        return Err(SlidecastError::merge(format!(
            "override document must be a JSON object, got {}",
            crate::schema::validate::json_kind(&over)
        )));
    }

    let mut merged = base;
    deep_merge(&mut merged, over);
    Ok(merged)
}

/// Merge `over` into `target` in place.
pub fn deep_merge(target: &mut Value, over: Value) {
    match (target, over) {
        (Value::Object(dst), Value::Object(src)) => {
            for (key, value) in src {
                match dst.get_mut(&key) {
                    Some(existing) => deep_merge(existing, value),
                    None => {
                        dst.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

/// Parse override file contents, mapping JSON syntax errors to [`SlidecastError::Merge`].
pub fn parse_override(text: &str) -> SlidecastResult<Value> {
    serde_json::from_str(text)
        .map_err(|e| SlidecastError::merge(format!("override is not valid JSON: {e}")))
}

#[cfg(test)]
#[path = "../../tests/unit/document/merge.rs"]
mod tests;
