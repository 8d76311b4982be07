//! Field-line adapter exposed to JavaScript.

use crate::engine::JsFieldEngine;
use crate::shared::{fixed, serialize, start_points, to_js_error};
use fieldline_core::bfield::SpecBfield;
use fieldline_core::poincare::{compute_iota, poincare_plot, PoincareSettings};
use fieldline_core::volume::EquilibriumContext;
use js_sys::Function;
use serde_wasm_bindgen::from_value;
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
pub struct WasmSpecBfield {
    bfield: SpecBfield<JsFieldEngine>,
}

fn parse_settings(settings: JsValue) -> Result<PoincareSettings, JsValue> {
    if settings.is_undefined() || settings.is_null() {
        return Ok(PoincareSettings::default());
    }
    from_value(settings).map_err(|e| JsValue::from_str(&format!("Invalid settings: {}", e)))
}

#[wasm_bindgen]
impl WasmSpecBfield {
    /// `context` is `{ igeometry, rpol, rtor, mvol, nfp? }`; `lvol` is 1-based.
    #[wasm_bindgen(constructor)]
    pub fn new(
        context: JsValue,
        lvol: usize,
        get_bfield: Function,
        get_xyz: Function,
    ) -> Result<WasmSpecBfield, JsValue> {
        console_error_panic_hook::set_once();

        let context: EquilibriumContext = from_value(context)
            .map_err(|e| JsValue::from_str(&format!("Invalid equilibrium context: {}", e)))?;
        let engine = JsFieldEngine::new(get_bfield, get_xyz);
        let bfield = SpecBfield::new(&context, lvol, engine)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;

        Ok(WasmSpecBfield { bfield })
    }

    pub fn geometry(&self) -> i32 {
        self.bfield.geometry().code()
    }

    pub fn plot_labels(&self) -> Result<JsValue, JsValue> {
        serialize(&self.bfield.labels())
    }

    pub fn rhs(&self, zeta: f64, st: Vec<f64>) -> Result<Vec<f64>, JsValue> {
        let st = fixed::<2>(&st, "st")?;
        let out = self.bfield.evaluate_rhs(zeta, st).map_err(to_js_error)?;
        Ok(out.to_vec())
    }

    pub fn rhs_tangent(&self, zeta: f64, st: Vec<f64>) -> Result<Vec<f64>, JsValue> {
        let st = fixed::<6>(&st, "st")?;
        let out = self
            .bfield
            .evaluate_rhs_tangent(zeta, st)
            .map_err(to_js_error)?;
        Ok(out.to_vec())
    }

    pub fn convert_coords(&self, stz: Vec<f64>) -> Result<Vec<f64>, JsValue> {
        let stz = fixed::<3>(&stz, "stz")?;
        let out = self
            .bfield
            .convert_to_plot_coords(stz)
            .map_err(to_js_error)?;
        Ok(out.to_vec())
    }

    /// `starts` is a flat `[s0, θ0, s1, θ1, ...]` buffer.
    pub fn poincare(&self, starts: Vec<f64>, settings: JsValue) -> Result<JsValue, JsValue> {
        let starts = start_points(&starts)?;
        let settings = parse_settings(settings)?;
        let result = poincare_plot(&self.bfield, &starts, &settings).map_err(to_js_error)?;
        serialize(&result)
    }

    pub fn iota(&self, s: f64, theta: f64, settings: JsValue) -> Result<f64, JsValue> {
        let settings = parse_settings(settings)?;
        compute_iota(&self.bfield, [s, theta], &settings).map_err(to_js_error)
    }
}
