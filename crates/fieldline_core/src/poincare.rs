//! Poincaré sections and rotational transform from traced field lines.

use crate::{
    bfield::{FieldEngine, SpecBfield, PROBLEM_SIZE},
    geometry::PlotLabels,
    solvers::StepperKind,
    traits::Steppable,
};
use anyhow::{anyhow, bail, Context, Result};
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;
use tracing::{debug, debug_span};

/// Upper bound on `n_periods`; every period stores one crossing.
pub const MAX_PERIODS: usize = 1_000_000;

// Crossings reserved up front; longer traces grow the buffer as they go.
const PREALLOCATED_CROSSINGS: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoincareSettings {
    /// Field periods to follow each line through.
    pub n_periods: usize,
    pub steps_per_period: usize,
    pub stepper: StepperKind,
    /// Toroidal angle of the section plane.
    pub zeta0: f64,
}

impl Default for PoincareSettings {
    fn default() -> Self {
        Self {
            n_periods: 100,
            steps_per_period: 64,
            stepper: StepperKind::Rk4,
            zeta0: 0.0,
        }
    }
}

impl PoincareSettings {
    fn validate(&self) -> Result<()> {
        if self.n_periods == 0 {
            bail!("n_periods must be at least 1.");
        }
        if self.n_periods > MAX_PERIODS {
            bail!(
                "n_periods must be at most {MAX_PERIODS}, got {}.",
                self.n_periods
            );
        }
        if self.steps_per_period == 0 {
            bail!("steps_per_period must be at least 1.");
        }
        if !self.zeta0.is_finite() {
            bail!("zeta0 must be finite.");
        }
        Ok(())
    }
}

/// One crossing of the section plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SectionPoint {
    /// Integrated `(s, θ, ζ)`; θ and ζ are not wrapped.
    pub stz: [f64; 3],
    /// Plot coordinates of the crossing, evaluated on the section plane.
    pub plot: [f64; 3],
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldLineTrace {
    pub start: [f64; 2],
    /// The start point followed by one crossing per period.
    pub points: Vec<SectionPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PoincareResult {
    pub labels: PlotLabels,
    pub traces: Vec<FieldLineTrace>,
}

/// Traces every start `(s, θ)` and collects its section crossings.
pub fn poincare_plot<E: FieldEngine>(
    bfield: &SpecBfield<E>,
    starts: &[[f64; 2]],
    settings: &PoincareSettings,
) -> Result<PoincareResult> {
    if starts.is_empty() {
        bail!("Poincaré plot requires at least one starting point.");
    }
    settings.validate()?;

    let traces = starts
        .iter()
        .map(|start| {
            trace_field_line(bfield, *start, settings).with_context(|| {
                format!(
                    "Failed to trace field line from s = {}, θ = {}.",
                    start[0], start[1]
                )
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(PoincareResult {
        labels: bfield.labels(),
        traces,
    })
}

pub fn trace_field_line<E: FieldEngine>(
    bfield: &SpecBfield<E>,
    start: [f64; 2],
    settings: &PoincareSettings,
) -> Result<FieldLineTrace> {
    settings.validate()?;
    let _span = debug_span!("trace_field_line", s = start[0], theta = start[1]).entered();

    let period = bfield.setup().period();
    let dt = period / settings.steps_per_period as f64;
    let mut stepper = settings.stepper.build(PROBLEM_SIZE);

    let mut points = Vec::with_capacity(settings.n_periods.min(PREALLOCATED_CROSSINGS) + 1);
    let mut state = start;
    let mut zeta = settings.zeta0;
    points.push(section_point(bfield, state, zeta, settings.zeta0)?);

    for crossing in 1..=settings.n_periods {
        for _ in 0..settings.steps_per_period {
            stepper.step(bfield, &mut zeta, &mut state, dt)?;
        }
        // Land exactly on the plane instead of accumulating roundoff in ζ.
        zeta = settings.zeta0 + crossing as f64 * period;
        points.push(section_point(bfield, state, zeta, settings.zeta0)?);
    }

    debug!(crossings = settings.n_periods, "field line traced");
    Ok(FieldLineTrace { start, points })
}

fn section_point<E: FieldEngine>(
    bfield: &SpecBfield<E>,
    state: [f64; 2],
    zeta: f64,
    zeta0: f64,
) -> Result<SectionPoint> {
    let [s, theta] = state;
    let plot = bfield.convert_to_plot_coords([s, theta.rem_euclid(TAU), zeta0])?;
    Ok(SectionPoint {
        stz: [s, theta, zeta],
        plot,
    })
}

/// Rotational transform `ι = dθ/dζ` of the line through `start`.
///
/// The unwrapped θ of every crossing is fitted against ζ by least squares.
pub fn compute_iota<E: FieldEngine>(
    bfield: &SpecBfield<E>,
    start: [f64; 2],
    settings: &PoincareSettings,
) -> Result<f64> {
    let trace = trace_field_line(bfield, start, settings)?;
    fit_iota(&trace.points)
}

fn fit_iota(points: &[SectionPoint]) -> Result<f64> {
    if points.len() < 2 {
        bail!("Rotational transform fit needs at least two crossings.");
    }
    let n = points.len();
    let design = DMatrix::from_fn(n, 2, |i, j| if j == 0 { 1.0 } else { points[i].stz[2] });
    let theta = DVector::from_iterator(n, points.iter().map(|p| p.stz[1]));
    let coefficients = design
        .svd(true, true)
        .solve(&theta, 1e-12)
        .map_err(|e| anyhow!("Rotational transform fit failed: {e}"))?;
    Ok(coefficients[1])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::volume::EquilibriumContext;

    /// Straight field lines with constant `dθ/dζ` on circular surfaces.
    struct StraightField {
        iota: f64,
    }

    impl FieldEngine for StraightField {
        fn get_bfield(&self, _zeta: f64, st: [f64; 2]) -> Result<[f64; 2]> {
            if st[0] > 1.0 {
                bail!("s = {} is outside the volume", st[0]);
            }
            Ok([0.0, self.iota])
        }

        fn get_xyz(&self, stz: [f64; 3]) -> Result<[f64; 3]> {
            let [s, theta, zeta] = stz;
            Ok([3.0 + s * theta.cos(), zeta, s * theta.sin()])
        }
    }

    /// Radial drift that leaves the volume after a while.
    struct Leaky;

    impl FieldEngine for Leaky {
        fn get_bfield(&self, _zeta: f64, st: [f64; 2]) -> Result<[f64; 2]> {
            if st[0] > 1.0 {
                bail!("s = {} is outside the volume", st[0]);
            }
            Ok([0.5, 0.0])
        }

        fn get_xyz(&self, stz: [f64; 3]) -> Result<[f64; 3]> {
            Ok(stz)
        }
    }

    fn toroidal(nfp: u32) -> EquilibriumContext {
        EquilibriumContext {
            igeometry: 3,
            rpol: 1.0,
            rtor: 1.0,
            mvol: 1,
            nfp,
        }
    }

    fn settings(n_periods: usize, stepper: StepperKind) -> PoincareSettings {
        PoincareSettings {
            n_periods,
            steps_per_period: 16,
            stepper,
            zeta0: 0.0,
        }
    }

    fn assert_err_contains<T: std::fmt::Debug>(result: anyhow::Result<T>, needle: &str) {
        let err = result.expect_err("expected error");
        let message = format!("{err:#}");
        assert!(
            message.contains(needle),
            "expected error to contain \"{needle}\", got \"{message}\""
        );
    }

    #[test]
    fn rejects_invalid_settings() {
        let bfield = SpecBfield::new(&toroidal(1), 1, StraightField { iota: 0.3 })
            .expect("adapter");
        assert_err_contains(
            poincare_plot(&bfield, &[], &PoincareSettings::default()),
            "at least one starting point",
        );
        assert_err_contains(
            poincare_plot(&bfield, &[[0.5, 0.0]], &settings(0, StepperKind::Rk4)),
            "n_periods",
        );
        let mut no_steps = settings(1, StepperKind::Rk4);
        no_steps.steps_per_period = 0;
        assert_err_contains(
            trace_field_line(&bfield, [0.5, 0.0], &no_steps),
            "steps_per_period",
        );
        let mut bad_plane = settings(1, StepperKind::Rk4);
        bad_plane.zeta0 = f64::NAN;
        assert_err_contains(trace_field_line(&bfield, [0.5, 0.0], &bad_plane), "zeta0");
    }

    #[test]
    fn rejects_oversized_period_count() {
        let bfield = SpecBfield::new(&toroidal(1), 1, StraightField { iota: 0.3 })
            .expect("adapter");
        for n_periods in [MAX_PERIODS + 1, usize::MAX] {
            let mut huge = settings(n_periods, StepperKind::Rk4);
            huge.steps_per_period = 1;
            assert_err_contains(
                trace_field_line(&bfield, [0.5, 0.0], &huge),
                "n_periods must be at most",
            );
            assert_err_contains(compute_iota(&bfield, [0.5, 0.0], &huge), "n_periods");
        }
    }

    #[test]
    fn collects_one_crossing_per_period() {
        let bfield = SpecBfield::new(&toroidal(2), 1, StraightField { iota: 0.25 })
            .expect("adapter");
        let result = poincare_plot(
            &bfield,
            &[[0.2, 0.0], [0.6, 1.0]],
            &settings(5, StepperKind::Tsit5),
        )
        .expect("poincare plot");

        assert_eq!(result.labels.plot_type, "RZ");
        assert_eq!(result.traces.len(), 2);
        for trace in &result.traces {
            assert_eq!(trace.points.len(), 6);
            assert_eq!(trace.points[0].stz, [trace.start[0], trace.start[1], 0.0]);
            for (k, point) in trace.points.iter().enumerate() {
                let zeta = k as f64 * TAU / 2.0;
                assert!((point.stz[2] - zeta).abs() < 1e-12);
                assert_eq!(point.stz[0], trace.start[0]);
                let theta = trace.start[1] + 0.25 * zeta;
                assert!((point.stz[1] - theta).abs() < 1e-10);
                // Section plane is ζ = 0, so the toroidal axis stays put.
                assert_eq!(point.plot[1], 0.0);
                let r = point.plot[0] - 3.0;
                let z = point.plot[2];
                assert!(((r * r + z * z).sqrt() - trace.start[0]).abs() < 1e-10);
            }
        }
    }

    #[test]
    fn slab_plot_wraps_theta() {
        let context = EquilibriumContext {
            igeometry: 1,
            rpol: 2.0,
            rtor: 5.0,
            mvol: 1,
            nfp: 1,
        };
        let bfield = SpecBfield::new(&context, 1, StraightField { iota: 1.5 }).expect("adapter");
        let trace = trace_field_line(&bfield, [0.5, 0.0], &settings(3, StepperKind::Rk4))
            .expect("trace");
        for point in &trace.points {
            assert!(point.plot[1] >= 0.0 && point.plot[1] < TAU * 2.0);
            assert_eq!(point.plot[2], 0.0);
        }
    }

    #[test]
    fn recovers_rotational_transform() {
        for nfp in [1, 5] {
            let bfield = SpecBfield::new(&toroidal(nfp), 1, StraightField { iota: 0.618 })
                .expect("adapter");
            let iota = compute_iota(&bfield, [0.4, 0.1], &settings(20, StepperKind::Rk4))
                .expect("iota");
            assert!((iota - 0.618).abs() < 1e-10, "nfp = {nfp}: iota = {iota}");
        }
    }

    #[test]
    fn engine_failure_names_the_start_point() {
        let bfield = SpecBfield::new(&toroidal(1), 1, Leaky).expect("adapter");
        let err = poincare_plot(&bfield, &[[0.1, 0.0]], &settings(3, StepperKind::Rk4))
            .expect_err("line leaves the volume");
        let message = format!("{err:#}");
        assert!(message.contains("s = 0.1"), "{message}");
        assert!(message.contains("outside the volume"), "{message}");
    }

    #[test]
    fn default_settings_are_valid() {
        let defaults = PoincareSettings::default();
        assert_eq!(defaults.n_periods, 100);
        assert_eq!(defaults.stepper, StepperKind::Rk4);
        assert!(defaults.validate().is_ok());
    }
}
