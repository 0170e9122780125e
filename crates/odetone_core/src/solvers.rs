use crate::traits::{Scalar, Steppable, VectorField};

/// Classic Runge-Kutta 4th Order Solver.
/// Stage buffers are allocated once at construction; `step` is
/// allocation-free.
pub struct RK4<T: Scalar> {
    k1: Vec<T>,
    k2: Vec<T>,
    k3: Vec<T>,
    k4: Vec<T>,
    tmp: Vec<T>,
}

impl<T: Scalar> RK4<T> {
    pub fn new(dim: usize) -> Self {
        let z = T::from_f64(0.0).unwrap();
        Self {
            k1: vec![z; dim],
            k2: vec![z; dim],
            k3: vec![z; dim],
            k4: vec![z; dim],
            tmp: vec![z; dim],
        }
    }
}

impl<T: Scalar> Steppable<T> for RK4<T> {
    fn step(
        &mut self,
        field: &mut impl VectorField<T>,
        t: &mut T,
        y: &mut [T],
        p: &[T],
        dt: T,
    ) {
        let half = T::from_f64(0.5).unwrap();
        let sixth = T::from_f64(1.0 / 6.0).unwrap();
        let two = T::from_f64(2.0).unwrap();

        let t0 = *t;

        // k1 = f(t, y)
        field.eval(t0, y, p, &mut self.k1);

        // k2 = f(t + dt/2, y + dt*k1/2)
        for i in 0..y.len() {
            self.tmp[i] = y[i] + dt * self.k1[i] * half;
        }
        field.eval(t0 + dt * half, &self.tmp, p, &mut self.k2);

        // k3 = f(t + dt/2, y + dt*k2/2)
        for i in 0..y.len() {
            self.tmp[i] = y[i] + dt * self.k2[i] * half;
        }
        field.eval(t0 + dt * half, &self.tmp, p, &mut self.k3);

        // k4 = f(t + dt, y + dt*k3)
        for i in 0..y.len() {
            self.tmp[i] = y[i] + dt * self.k3[i];
        }
        field.eval(t0 + dt, &self.tmp, p, &mut self.k4);

        // y_next = y + dt/6 * (k1 + 2k2 + 2k3 + k4)
        for i in 0..y.len() {
            y[i] = y[i]
                + dt * sixth * (self.k1[i] + two * self.k2[i] + two * self.k3[i] + self.k4[i]);
        }

        *t = t0 + dt;
    }
}

/// Forward Euler Solver: y_next = y + dt * f(t, y). O(dt) local error.
pub struct Euler<T: Scalar> {
    k1: Vec<T>,
}

impl<T: Scalar> Euler<T> {
    pub fn new(dim: usize) -> Self {
        Self {
            k1: vec![T::from_f64(0.0).unwrap(); dim],
        }
    }
}

impl<T: Scalar> Steppable<T> for Euler<T> {
    fn step(
        &mut self,
        field: &mut impl VectorField<T>,
        t: &mut T,
        y: &mut [T],
        p: &[T],
        dt: T,
    ) {
        field.eval(*t, y, p, &mut self.k1);

        for i in 0..y.len() {
            y[i] = y[i] + dt * self.k1[i];
        }

        *t = *t + dt;
    }
}
