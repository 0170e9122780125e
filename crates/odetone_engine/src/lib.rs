//! The `odetone_engine` crate owns the render/control split around
//! `odetone_core`: node configuration, the asynchronous module loader, the
//! render-side evaluator that produces one frame of channel values per
//! sample, and the wait-free control channel feeding it live edits.
//!
//! Two execution contexts share a node: the control context (unconstrained,
//! may allocate and wait) holds a [`NodeHandle`]; the render context (hard
//! real-time, never blocks, never allocates on its steady-state path) holds
//! the [`OdeNode`]. They communicate only through single-producer
//! single-consumer queues, by value.

pub mod config;
pub mod control;
pub mod loader;
pub mod node;

pub use config::{Method, NodeConfig};
pub use control::{ControlMsg, NodeError, NodeEvent};
pub use loader::{EngineContext, ModuleLoader};
pub use node::{NodeHandle, OdeNode};
