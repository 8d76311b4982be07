//! Field-line right-hand side for one equilibrium volume.
//!
//! [`SpecBfield`] bridges a generic ODE integrator and a [`FieldEngine`]: the
//! engine knows how to evaluate the field, the adapter knows what the
//! coordinates mean in each geometry.

use crate::{
    error::FieldLineError,
    geometry::{Geometry, PlotLabels},
    traits::DynamicalSystem,
    volume::{EquilibriumContext, VolumeSetup},
};
use anyhow::{anyhow, Result};
use tracing::debug;

/// Size of the `(s, θ)` field-line state.
pub const PROBLEM_SIZE: usize = 2;

/// Size of the `(s, θ, ds₁, dθ₁, ds₂, dθ₂)` tangent state.
pub const TANGENT_SIZE: usize = 6;

/// Numerical core that evaluates the magnetic field of an equilibrium volume.
pub trait FieldEngine {
    /// Field-line tangent `(ds/dζ, dθ/dζ)` at `(s, θ)` and toroidal angle `zeta`.
    fn get_bfield(&self, zeta: f64, st: [f64; 2]) -> Result<[f64; 2]>;

    /// Real-space point for `(s, θ, ζ)`. The axes are geometry dependent:
    /// `(R, θ, ζ)` for slab, `(r, θ, ζ)` for cylindrical, `(R, ζ, Z)` for toroidal.
    fn get_xyz(&self, stz: [f64; 3]) -> Result<[f64; 3]>;
}

impl<E: FieldEngine + ?Sized> FieldEngine for &E {
    fn get_bfield(&self, zeta: f64, st: [f64; 2]) -> Result<[f64; 2]> {
        (**self).get_bfield(zeta, st)
    }

    fn get_xyz(&self, stz: [f64; 3]) -> Result<[f64; 3]> {
        (**self).get_xyz(stz)
    }
}

impl<E: FieldEngine + ?Sized> FieldEngine for Box<E> {
    fn get_bfield(&self, zeta: f64, st: [f64; 2]) -> Result<[f64; 2]> {
        (**self).get_bfield(zeta, st)
    }

    fn get_xyz(&self, stz: [f64; 3]) -> Result<[f64; 3]> {
        (**self).get_xyz(stz)
    }
}

/// Field-line ODE for one volume, bound to an engine.
pub struct SpecBfield<E> {
    setup: VolumeSetup,
    labels: PlotLabels,
    engine: E,
}

impl<E: FieldEngine> SpecBfield<E> {
    /// Validates the geometry and `lvol` (1-based) against `context`.
    pub fn new(
        context: &EquilibriumContext,
        lvol: usize,
        engine: E,
    ) -> Result<Self, FieldLineError> {
        let setup = VolumeSetup::new(context, lvol)?;
        debug!(lvol, geometry = %setup.geometry, "field-line adapter ready");
        Ok(Self {
            labels: setup.geometry.labels(),
            setup,
            engine,
        })
    }

    /// `(ds/dζ, dθ/dζ)` at `(zeta, st)`. Engine errors are returned as is.
    #[inline]
    pub fn evaluate_rhs(&self, zeta: f64, st: [f64; PROBLEM_SIZE]) -> Result<[f64; PROBLEM_SIZE]> {
        self.engine.get_bfield(zeta, st)
    }

    /// Tangent-map RHS for `(s, θ, ds₁, dθ₁, ds₂, dθ₂)`.
    ///
    /// The engine exposes no linearized field, so this always fails with
    /// [`FieldLineError::TangentNotImplemented`].
    pub fn evaluate_rhs_tangent(
        &self,
        _zeta: f64,
        _st: [f64; TANGENT_SIZE],
    ) -> Result<[f64; TANGENT_SIZE]> {
        Err(FieldLineError::TangentNotImplemented.into())
    }

    pub fn convert_to_plot_coords(&self, stz: [f64; 3]) -> Result<[f64; 3]> {
        let xyz = self.engine.get_xyz(stz)?;
        Ok(self
            .setup
            .geometry
            .transform(xyz, stz, self.setup.rpol, self.setup.rtor))
    }

    pub fn geometry(&self) -> Geometry {
        self.setup.geometry
    }

    pub fn labels(&self) -> PlotLabels {
        self.labels
    }

    pub fn setup(&self) -> &VolumeSetup {
        &self.setup
    }

    pub fn lvol(&self) -> usize {
        self.setup.lvol
    }

    pub fn rpol(&self) -> f64 {
        self.setup.rpol
    }

    pub fn rtor(&self) -> f64 {
        self.setup.rtor
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }
}

impl<E: FieldEngine> DynamicalSystem<f64> for SpecBfield<E> {
    fn dimension(&self) -> usize {
        PROBLEM_SIZE
    }

    fn apply(&self, t: f64, x: &[f64], out: &mut [f64]) -> Result<()> {
        let st = <[f64; PROBLEM_SIZE]>::try_from(x).map_err(|_| {
            anyhow!(
                "Field-line state must have {PROBLEM_SIZE} entries, got {}.",
                x.len()
            )
        })?;
        if out.len() != PROBLEM_SIZE {
            return Err(anyhow!(
                "Field-line output buffer must have {PROBLEM_SIZE} entries, got {}.",
                out.len()
            ));
        }
        out.copy_from_slice(&self.evaluate_rhs(t, st)?);
        Ok(())
    }
}
