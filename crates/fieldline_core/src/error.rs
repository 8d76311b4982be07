use thiserror::Error;

/// Errors raised by the field-line layer itself.
///
/// Failures reported by a [`FieldEngine`](crate::bfield::FieldEngine) are not
/// wrapped in this type; they pass through as the engine's own `anyhow::Error`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldLineError {
    #[error("Unsupported geometry code {0}; expected 1 (slab), 2 (cylindrical) or 3 (toroidal).")]
    UnsupportedGeometry(i32),

    #[error("Volume index {lvol} is out of range; expected 1..={mvol}.")]
    VolumeOutOfRange { lvol: usize, mvol: usize },

    #[error("Number of field periods must be positive.")]
    ZeroFieldPeriods,

    #[error("Tangent field evaluation is not implemented.")]
    TangentNotImplemented,

    #[error("Field engine returned {got} components, expected {expected}.")]
    EngineShape { expected: usize, got: usize },
}
