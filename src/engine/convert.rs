//! JSON ⇄ JS value conversion.

use rquickjs::{Array, Ctx, Object, Value};
use serde_json::{Map, Number, Value as JsonValue};

use crate::error::SandboxError;

/// Nesting bound for script-produced values; a cyclic object graph must not
/// hang the conversion.
const MAX_DEPTH: usize = 64;

pub fn json_to_js<'js>(ctx: &Ctx<'js>, value: &JsonValue) -> rquickjs::Result<Value<'js>> {
    match value {
        JsonValue::Null => Ok(Value::new_null(ctx.clone())),
        JsonValue::Bool(b) => Ok(Value::new_bool(ctx.clone(), *b)),
        JsonValue::Number(n) => Ok(number_to_js(ctx, n)),
        JsonValue::String(s) => Ok(rquickjs::String::from_str(ctx.clone(), s)?.into_value()),
        JsonValue::Array(items) => {
            let array = Array::new(ctx.clone())?;
            for (index, item) in items.iter().enumerate() {
                array.set(index, json_to_js(ctx, item)?)?;
            }
            Ok(array.into_value())
        }
        JsonValue::Object(map) => {
            let object = Object::new(ctx.clone())?;
            for (key, item) in map {
                object.set(key.as_str(), json_to_js(ctx, item)?)?;
            }
            Ok(object.into_value())
        }
    }
}

fn number_to_js<'js>(ctx: &Ctx<'js>, number: &Number) -> Value<'js> {
    if let Some(i) = number.as_i64() {
        if let Ok(small) = i32::try_from(i) {
            return Value::new_int(ctx.clone(), small);
        }
        return Value::new_float(ctx.clone(), i as f64);
    }
    Value::new_float(ctx.clone(), number.as_f64().unwrap_or(f64::NAN))
}

/// Convert a script completion value to JSON. Functions and symbols map to
/// null; non-finite numbers map to null the way `JSON.stringify` does.
pub fn js_to_json(value: &Value<'_>) -> Result<JsonValue, SandboxError> {
    js_to_json_at(value, 0)
}

fn js_to_json_at(value: &Value<'_>, depth: usize) -> Result<JsonValue, SandboxError> {
    if depth > MAX_DEPTH {
        return Err(SandboxError::SerializationError(
            "script value nesting exceeds supported depth".into(),
        ));
    }
    if value.is_undefined() || value.is_null() {
        return Ok(JsonValue::Null);
    }
    if let Some(b) = value.as_bool() {
        return Ok(JsonValue::Bool(b));
    }
    if let Some(i) = value.as_int() {
        return Ok(JsonValue::from(i));
    }
    if let Some(f) = value.as_float() {
        return Ok(Number::from_f64(f)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null));
    }
    if let Some(s) = value.as_string() {
        let text = s
            .to_string()
            .map_err(|e| SandboxError::EngineError(e.to_string()))?;
        return Ok(JsonValue::String(text));
    }
    if let Some(array) = value.as_array() {
        let mut items = Vec::with_capacity(array.len());
        for item in array.iter::<Value>() {
            let item = item.map_err(|e| SandboxError::EngineError(e.to_string()))?;
            items.push(js_to_json_at(&item, depth + 1)?);
        }
        return Ok(JsonValue::Array(items));
    }
    if value.is_function() || value.is_symbol() {
        return Ok(JsonValue::Null);
    }
    if let Some(object) = value.as_object() {
        let mut map = Map::new();
        for prop in object.props::<String, Value>() {
            let (key, item) = prop.map_err(|e| SandboxError::EngineError(e.to_string()))?;
            map.insert(key, js_to_json_at(&item, depth + 1)?);
        }
        return Ok(JsonValue::Object(map));
    }
    Ok(JsonValue::Null)
}
