use crate::traits::{DynamicalSystem, Scalar, Steppable};
use anyhow::Result;
use serde::{Deserialize, Serialize};

fn coefficient<T: Scalar>(value: f64) -> T {
    T::from_f64(value).unwrap_or_else(T::nan)
}

/// Classic Runge-Kutta 4th Order Solver
pub struct RK4<T: Scalar> {
    k1: Vec<T>,
    k2: Vec<T>,
    k3: Vec<T>,
    k4: Vec<T>,
    tmp: Vec<T>,
}

impl<T: Scalar> RK4<T> {
    pub fn new(dim: usize) -> Self {
        Self {
            k1: vec![T::zero(); dim],
            k2: vec![T::zero(); dim],
            k3: vec![T::zero(); dim],
            k4: vec![T::zero(); dim],
            tmp: vec![T::zero(); dim],
        }
    }
}

impl<T: Scalar> Steppable<T> for RK4<T> {
    fn step(
        &mut self,
        system: &impl DynamicalSystem<T>,
        t: &mut T,
        state: &mut [T],
        dt: T,
    ) -> Result<()> {
        let half: T = coefficient(0.5);
        let sixth: T = coefficient(1.0 / 6.0);
        let two: T = coefficient(2.0);

        let t0 = *t;

        // k1 = f(t, y)
        system.apply(t0, state, &mut self.k1)?;

        // k2 = f(t + dt/2, y + dt*k1/2)
        for i in 0..state.len() {
            self.tmp[i] = state[i] + dt * self.k1[i] * half;
        }
        system.apply(t0 + dt * half, &self.tmp, &mut self.k2)?;

        // k3 = f(t + dt/2, y + dt*k2/2)
        for i in 0..state.len() {
            self.tmp[i] = state[i] + dt * self.k2[i] * half;
        }
        system.apply(t0 + dt * half, &self.tmp, &mut self.k3)?;

        // k4 = f(t + dt, y + dt*k3)
        for i in 0..state.len() {
            self.tmp[i] = state[i] + dt * self.k3[i];
        }
        system.apply(t0 + dt, &self.tmp, &mut self.k4)?;

        for i in 0..state.len() {
            state[i] = state[i]
                + dt * sixth * (self.k1[i] + two * self.k2[i] + two * self.k3[i] + self.k4[i]);
        }

        *t = t0 + dt;
        Ok(())
    }
}

const TSIT5_C: [f64; 6] = [0.0, 0.161, 0.327, 0.9, 0.9800255409045097, 1.0];

const TSIT5_A: [[f64; 5]; 6] = [
    [0.0, 0.0, 0.0, 0.0, 0.0],
    [0.161, 0.0, 0.0, 0.0, 0.0],
    [-0.008480655492356989, 0.335480655492357, 0.0, 0.0, 0.0],
    [2.898, -6.359447987781783, 4.361447987781783, 0.0, 0.0],
    [
        5.325864858437957,
        -11.748883564062828,
        7.495539342889693,
        -0.09249506636030195,
        0.0,
    ],
    [
        5.86145544294642,
        -12.92096931784711,
        8.159367898576159,
        -0.071584973281401,
        -0.02826857949054663,
    ],
];

// 5th order weights.
const TSIT5_B: [f64; 6] = [
    0.09646076681806523,
    0.01,
    0.4798896504144996,
    1.379008574103742,
    -3.290069515436099,
    2.324710524099774,
];

/// Tsitouras 5/4 Solver, fixed step.
pub struct Tsit5<T: Scalar> {
    stages: [Vec<T>; 6],
    tmp: Vec<T>,
}

impl<T: Scalar> Tsit5<T> {
    pub fn new(dim: usize) -> Self {
        Self {
            stages: std::array::from_fn(|_| vec![T::zero(); dim]),
            tmp: vec![T::zero(); dim],
        }
    }
}

impl<T: Scalar> Steppable<T> for Tsit5<T> {
    fn step(
        &mut self,
        system: &impl DynamicalSystem<T>,
        t: &mut T,
        state: &mut [T],
        dt: T,
    ) -> Result<()> {
        let t0 = *t;

        for stage in 0..TSIT5_C.len() {
            let (done, rest) = self.stages.split_at_mut(stage);
            for i in 0..state.len() {
                let mut acc = T::zero();
                for (j, k) in done.iter().enumerate() {
                    acc = acc + coefficient::<T>(TSIT5_A[stage][j]) * k[i];
                }
                self.tmp[i] = state[i] + dt * acc;
            }
            let t_stage = t0 + coefficient::<T>(TSIT5_C[stage]) * dt;
            system.apply(t_stage, &self.tmp, &mut rest[0])?;
        }

        for i in 0..state.len() {
            let mut acc = T::zero();
            for (b, k) in TSIT5_B.iter().zip(self.stages.iter()) {
                acc = acc + coefficient::<T>(*b) * k[i];
            }
            state[i] = state[i] + dt * acc;
        }

        *t = t0 + dt;
        Ok(())
    }
}

/// Integrator choice for field-line tracing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepperKind {
    #[default]
    Rk4,
    Tsit5,
}

impl StepperKind {
    pub fn build(self, dim: usize) -> Stepper {
        match self {
            StepperKind::Rk4 => Stepper::Rk4(RK4::new(dim)),
            StepperKind::Tsit5 => Stepper::Tsit5(Tsit5::new(dim)),
        }
    }
}

pub enum Stepper {
    Rk4(RK4<f64>),
    Tsit5(Tsit5<f64>),
}

impl Steppable<f64> for Stepper {
    fn step(
        &mut self,
        system: &impl DynamicalSystem<f64>,
        t: &mut f64,
        state: &mut [f64],
        dt: f64,
    ) -> Result<()> {
        match self {
            Stepper::Rk4(s) => s.step(system, t, state, dt),
            Stepper::Tsit5(s) => s.step(system, t, state, dt),
        }
    }
}
