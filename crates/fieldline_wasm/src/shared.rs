//! Conversions between JS values and core types.

use serde::Serialize;
use serde_wasm_bindgen::to_value;
use wasm_bindgen::JsValue;

pub(crate) fn to_js_error(err: anyhow::Error) -> JsValue {
    JsValue::from_str(&format!("{err:#}"))
}

pub(crate) fn serialize<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    to_value(value).map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

pub(crate) fn fixed<const N: usize>(values: &[f64], name: &str) -> Result<[f64; N], JsValue> {
    <[f64; N]>::try_from(values).map_err(|_| {
        JsValue::from_str(&format!(
            "{name} must have {N} entries, got {}.",
            values.len()
        ))
    })
}

/// Splits a flat `[s0, θ0, s1, θ1, ...]` buffer into start points.
pub(crate) fn start_points(flat: &[f64]) -> Result<Vec<[f64; 2]>, JsValue> {
    if flat.len() % 2 != 0 {
        return Err(JsValue::from_str(
            "Start points must be given as (s, theta) pairs.",
        ));
    }
    Ok(flat.chunks_exact(2).map(|pair| [pair[0], pair[1]]).collect())
}
