use crate::error::FieldLineError;
use serde::Serialize;
use std::fmt;

/// Coordinate convention of an equilibrium.
///
/// Selected once from the integer geometry code; every consumer dispatches on the
/// variant instead of re-checking the code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Geometry {
    /// Code 1. Periodic slab: `x` is the radial coordinate, `y` and `z` are
    /// scaled angles.
    Slab,
    /// Code 2. Cylinder of length `2π·rtor`.
    Cylindrical,
    /// Code 3. Full toroidal geometry in `(R, ζ, Z)`.
    Toroidal,
}

/// Axis labels a plotting front-end uses for Poincaré sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlotLabels {
    pub plot_type: &'static str,
    pub xlabel: &'static str,
    pub ylabel: &'static str,
}

const RZ_LABELS: PlotLabels = PlotLabels {
    plot_type: "RZ",
    xlabel: "R(m)",
    ylabel: "Z(m)",
};

const SLAB_LABELS: PlotLabels = PlotLabels {
    plot_type: "yx",
    xlabel: "θ",
    ylabel: "R",
};

impl Geometry {
    pub fn select(code: i32) -> Result<Self, FieldLineError> {
        match code {
            1 => Ok(Geometry::Slab),
            2 => Ok(Geometry::Cylindrical),
            3 => Ok(Geometry::Toroidal),
            other => Err(FieldLineError::UnsupportedGeometry(other)),
        }
    }

    pub fn code(self) -> i32 {
        match self {
            Geometry::Slab => 1,
            Geometry::Cylindrical => 2,
            Geometry::Toroidal => 3,
        }
    }

    pub fn labels(self) -> PlotLabels {
        match self {
            Geometry::Slab => SLAB_LABELS,
            Geometry::Cylindrical | Geometry::Toroidal => RZ_LABELS,
        }
    }

    /// Maps an engine real-space point to plot coordinates.
    ///
    /// `xyz` is what the engine's coordinate routine returned for `stz`; the
    /// scale factors only enter for slab and cylindrical geometry.
    ///
    /// | geometry    | axis0     | axis1    | axis2     |
    /// |-------------|-----------|----------|-----------|
    /// | slab        | R         | θ·rpol   | ζ·rtor    |
    /// | cylindrical | r·cos θ   | ζ·rtor   | r·sin θ   |
    /// | toroidal    | R         | ζ        | Z         |
    pub fn transform(self, xyz: [f64; 3], stz: [f64; 3], rpol: f64, rtor: f64) -> [f64; 3] {
        let [_, theta, zeta] = stz;
        match self {
            Geometry::Slab => [xyz[0], theta * rpol, zeta * rtor],
            Geometry::Cylindrical => {
                let r = xyz[0];
                let (sin, cos) = theta.sin_cos();
                [r * cos, zeta * rtor, r * sin]
            }
            Geometry::Toroidal => xyz,
        }
    }
}

impl fmt::Display for Geometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Geometry::Slab => "slab",
            Geometry::Cylindrical => "cylindrical",
            Geometry::Toroidal => "toroidal",
        };
        f.write_str(name)
    }
}

impl TryFrom<i32> for Geometry {
    type Error = FieldLineError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        Geometry::select(code)
    }
}
