use num_traits::{Float, FromPrimitive};
use std::fmt::Debug;

/// A trait for types usable as scalars by the integrators.
/// Must support floating-point arithmetic, debug printing, and conversion
/// from f64.
pub trait Scalar: Float + FromPrimitive + Debug + 'static {}

impl<T: Float + FromPrimitive + Debug + 'static> Scalar for T {}

/// The right-hand side of a first-order ODE system: dy/dt = f(t, y, p).
///
/// `eval` takes `&mut self` because implementations may evaluate in place
/// over owned scratch memory (the compiled module does). Parameters are
/// passed per call rather than stored, so the caller can swap the parameter
/// vector between steps without touching the field.
pub trait VectorField<T: Scalar> {
    /// Dimension of the state space.
    fn dimension(&self) -> usize;

    /// Writes f(t, y, p) into `dydt`.
    fn eval(&mut self, t: T, y: &[T], p: &[T], dydt: &mut [T]);
}

/// A trait for fixed-step integrators that advance state and time in place.
pub trait Steppable<T: Scalar> {
    /// Performs one step of size dt.
    /// t: current time (updated after step)
    /// y: current state (updated after step)
    /// p: parameter vector for every stage evaluation of this step
    fn step(
        &mut self,
        field: &mut impl VectorField<T>,
        t: &mut T,
        y: &mut [T],
        p: &[T],
        dt: T,
    );
}
