use crate::{error::FieldLineError, geometry::Geometry};
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

/// The slice of an equilibrium that field-line tracing needs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquilibriumContext {
    /// Geometry code: 1 slab, 2 cylindrical, 3 toroidal.
    pub igeometry: i32,
    pub rpol: f64,
    pub rtor: f64,
    /// Number of nested volumes; volume indices run `1..=mvol`.
    pub mvol: usize,
    #[serde(default = "default_nfp")]
    pub nfp: u32,
}

fn default_nfp() -> u32 {
    1
}

/// Validated per-volume setup shared by everything that traces in one volume.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolumeSetup {
    pub lvol: usize,
    pub geometry: Geometry,
    pub rpol: f64,
    pub rtor: f64,
    pub nfp: u32,
}

impl VolumeSetup {
    pub fn new(context: &EquilibriumContext, lvol: usize) -> Result<Self, FieldLineError> {
        let geometry = Geometry::select(context.igeometry)?;
        if lvol == 0 || lvol > context.mvol {
            return Err(FieldLineError::VolumeOutOfRange {
                lvol,
                mvol: context.mvol,
            });
        }
        if context.nfp == 0 {
            return Err(FieldLineError::ZeroFieldPeriods);
        }

        Ok(Self {
            lvol,
            geometry,
            rpol: context.rpol,
            rtor: context.rtor,
            nfp: context.nfp,
        })
    }

    /// Toroidal extent of one field period, `2π / nfp`.
    pub fn period(&self) -> f64 {
        TAU / self.nfp as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(igeometry: i32) -> EquilibriumContext {
        EquilibriumContext {
            igeometry,
            rpol: 2.0,
            rtor: 3.0,
            mvol: 4,
            nfp: 5,
        }
    }

    #[test]
    fn captures_scale_factors() {
        let setup = VolumeSetup::new(&context(2), 3).expect("valid setup");
        assert_eq!(setup.geometry, Geometry::Cylindrical);
        assert_eq!(setup.lvol, 3);
        assert_eq!(setup.rpol, 2.0);
        assert_eq!(setup.rtor, 3.0);
        assert!((setup.period() - TAU / 5.0).abs() < 1e-15);
    }

    #[test]
    fn rejects_volume_outside_range() {
        for lvol in [0, 5] {
            assert_eq!(
                VolumeSetup::new(&context(3), lvol),
                Err(FieldLineError::VolumeOutOfRange { lvol, mvol: 4 })
            );
        }
        assert!(VolumeSetup::new(&context(3), 1).is_ok());
        assert!(VolumeSetup::new(&context(3), 4).is_ok());
    }

    #[test]
    fn geometry_is_checked_before_volume() {
        assert_eq!(
            VolumeSetup::new(&context(9), 0),
            Err(FieldLineError::UnsupportedGeometry(9))
        );
    }

    #[test]
    fn rejects_zero_field_periods() {
        let mut ctx = context(1);
        ctx.nfp = 0;
        assert_eq!(
            VolumeSetup::new(&ctx, 1),
            Err(FieldLineError::ZeroFieldPeriods)
        );
    }
}
