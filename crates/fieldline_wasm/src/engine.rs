//! Field engine backed by JavaScript callbacks.

use anyhow::{anyhow, Result};
use fieldline_core::bfield::FieldEngine;
use fieldline_core::error::FieldLineError;
use js_sys::{Array, Float64Array, Function};
use wasm_bindgen::{JsCast, JsValue};

/// Calls `get_bfield(zeta, st)` and `get_xyz(stz)` on the host.
///
/// Both callbacks receive `Float64Array`s and may return either a
/// `Float64Array` or a plain array of numbers. A thrown exception becomes the
/// engine error.
pub(crate) struct JsFieldEngine {
    get_bfield: Function,
    get_xyz: Function,
}

impl JsFieldEngine {
    pub(crate) fn new(get_bfield: Function, get_xyz: Function) -> Self {
        Self {
            get_bfield,
            get_xyz,
        }
    }
}

impl FieldEngine for JsFieldEngine {
    fn get_bfield(&self, zeta: f64, st: [f64; 2]) -> Result<[f64; 2]> {
        let st = Float64Array::from(&st[..]);
        let value = self
            .get_bfield
            .call2(&JsValue::NULL, &JsValue::from_f64(zeta), &st)
            .map_err(host_error)?;
        read_components(&value)
    }

    fn get_xyz(&self, stz: [f64; 3]) -> Result<[f64; 3]> {
        let stz = Float64Array::from(&stz[..]);
        let value = self
            .get_xyz
            .call1(&JsValue::NULL, &stz)
            .map_err(host_error)?;
        read_components(&value)
    }
}

fn host_error(err: JsValue) -> anyhow::Error {
    if let Some(error) = err.dyn_ref::<js_sys::Error>() {
        return anyhow!("Field engine error: {}", String::from(error.message()));
    }
    match err.as_string() {
        Some(message) => anyhow!("Field engine error: {message}"),
        None => anyhow!("Field engine error: {err:?}"),
    }
}

fn read_components<const N: usize>(value: &JsValue) -> Result<[f64; N]> {
    let values = if let Some(typed) = value.dyn_ref::<Float64Array>() {
        typed.to_vec()
    } else if Array::is_array(value) {
        Array::from(value)
            .iter()
            .enumerate()
            .map(|(index, entry)| {
                entry.as_f64().ok_or_else(|| {
                    anyhow!("Field engine returned a non-numeric component at index {index}.")
                })
            })
            .collect::<Result<Vec<f64>>>()?
    } else {
        return Err(anyhow!("Field engine must return an array of numbers."));
    };
    <[f64; N]>::try_from(values.as_slice()).map_err(|_| {
        FieldLineError::EngineShape {
            expected: N,
            got: values.len(),
        }
        .into()
    })
}
