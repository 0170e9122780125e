use odetone_core::error::InstantiateError;
use ringbuf::{traits::Split, HeapCons, HeapProd, HeapRb};
use thiserror::Error;

/// Messages from the control context into the render loop. Each one is
/// applied as a single atomic swap between integration steps, never
/// partially and never mid-step.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlMsg {
    /// Replace the whole parameter vector (Parameter Set order).
    UpdateParameters(Vec<f64>),
    /// Replace the stored initial values and restore the state vector to
    /// them at the start of the next render callback.
    ResetInitialConditions(Vec<f64>),
    /// Multiplier on the base step size, effective from the next step.
    SetDetuning(f64),
}

/// Why a node entered the terminal `Failed` state.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NodeError {
    #[error(transparent)]
    Instantiate(#[from] InstantiateError),
    #[error("module loader went away before delivering a module")]
    LoaderLost,
}

/// Lifecycle signals from the render side back to the control panel.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeEvent {
    /// The compiled module arrived; the node now produces signal.
    Ready,
    /// Module instantiation failed; the node renders silence from here on.
    Failed(NodeError),
}

/// Wait-free single-producer single-consumer queue, the only shared channel
/// between the control and render contexts.
pub(crate) fn queue<T>(capacity: usize) -> (HeapProd<T>, HeapCons<T>) {
    HeapRb::<T>::new(capacity).split()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ringbuf::traits::{Consumer, Producer};

    #[test]
    fn messages_cross_the_queue_in_order() {
        let (mut tx, mut rx) = queue::<ControlMsg>(8);
        tx.try_push(ControlMsg::SetDetuning(0.5)).expect("push");
        tx.try_push(ControlMsg::UpdateParameters(vec![1.0, 2.0]))
            .expect("push");

        assert_eq!(rx.try_pop(), Some(ControlMsg::SetDetuning(0.5)));
        assert_eq!(
            rx.try_pop(),
            Some(ControlMsg::UpdateParameters(vec![1.0, 2.0]))
        );
        assert_eq!(rx.try_pop(), None);
    }

    #[test]
    fn full_queue_rejects_without_blocking() {
        let (mut tx, _rx) = queue::<ControlMsg>(1);
        tx.try_push(ControlMsg::SetDetuning(1.0)).expect("push");
        assert!(tx.try_push(ControlMsg::SetDetuning(2.0)).is_err());
    }
}
