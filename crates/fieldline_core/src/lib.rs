pub mod bfield;
pub mod error;
pub mod geometry;
pub mod poincare;
pub mod solvers;
/// The `fieldline_core` crate traces magnetic field lines inside one volume of a
/// stepped-pressure MHD equilibrium.
///
/// The field itself comes from an external engine; this crate owns what the
/// coordinates mean in each geometry and how a generic integrator drives the engine.
///
/// Key components:
/// - **Geometry**: the slab/cylindrical/toroidal conventions, plot labels and transforms.
/// - **Bfield**: `SpecBfield`, the field-line RHS adapter over a `FieldEngine`.
/// - **Solvers**: fixed-step integrators (RK4, Tsit5) over a fallible RHS.
/// - **Poincare**: section plots and rotational transform from traced lines.
pub mod traits;
pub mod volume;

pub use bfield::{FieldEngine, SpecBfield};
pub use error::FieldLineError;
pub use geometry::{Geometry, PlotLabels};
pub use volume::EquilibriumContext;
