use crate::config::{Method, NodeConfig};
use crate::control::{queue, ControlMsg, NodeError, NodeEvent};
use crate::loader::{EngineContext, ModuleLoader};
use anyhow::Context;
use odetone_core::codegen::compile_system;
use odetone_core::error::InstantiateError;
use odetone_core::module::ExprModule;
use odetone_core::resolve::SymbolTable;
use odetone_core::solvers::{Euler, RK4};
use odetone_core::traits::Steppable;
use ringbuf::traits::{Consumer, Producer};
use ringbuf::{HeapCons, HeapProd};
use std::sync::mpsc::{Receiver, TryRecvError};
use tracing::{debug, warn};

const CONTROL_QUEUE_CAPACITY: usize = 64;
const EVENT_QUEUE_CAPACITY: usize = 16;

enum SolverKind {
    Euler(Euler<f64>),
    Rk4(RK4<f64>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeState {
    AwaitingModule,
    Ready,
    Failed,
}

/// Render-side evaluator for one ODE node.
///
/// Owns the render state (time, step size, detuning, state vector,
/// parameter vector, pending-reset flag) exclusively. The control context
/// reaches it only through the SPSC queues held by the paired
/// [`NodeHandle`]; nothing here blocks, and the steady-state render path
/// performs no allocation.
pub struct OdeNode {
    state: NodeState,
    module_rx: Receiver<Result<ExprModule, InstantiateError>>,
    module: Option<ExprModule>,
    solver: SolverKind,
    t: f64,
    h_base: f64,
    detuning: f64,
    y: Vec<f64>,
    params: Vec<f64>,
    initial_values: Vec<f64>,
    pending_reset: bool,
    channels_per_equation: usize,
    ctrl_rx: HeapCons<ControlMsg>,
    event_tx: HeapProd<NodeEvent>,
}

/// Control-side handle for one ODE node: enqueue live edits, poll
/// lifecycle events. May allocate and wait freely.
pub struct NodeHandle {
    ctrl_tx: HeapProd<ControlMsg>,
    event_rx: HeapCons<NodeEvent>,
}

impl OdeNode {
    /// Validates the configuration, compiles the equations synchronously,
    /// and hands the generated program to the loader for asynchronous
    /// instantiation. Returns the render-side node paired with its
    /// control-side handle.
    ///
    /// Compile and configuration errors surface here, before any render
    /// callback exists; instantiation errors arrive later as a
    /// [`NodeEvent::Failed`].
    pub fn spawn(
        ctx: &EngineContext,
        loader: &ModuleLoader,
        config: &NodeConfig,
    ) -> anyhow::Result<(OdeNode, NodeHandle)> {
        config.validate().context("invalid node configuration")?;
        let symbols = SymbolTable::new(&config.state_names(), &config.param_names())
            .context("invalid state/parameter names")?;
        let program = compile_system(&config.expressions(), &symbols)
            .context("equation compilation failed")?;
        let module_rx = loader.spawn_instantiate(program);
        Ok(Self::assemble(ctx, config, module_rx))
    }

    fn assemble(
        ctx: &EngineContext,
        config: &NodeConfig,
        module_rx: Receiver<Result<ExprModule, InstantiateError>>,
    ) -> (OdeNode, NodeHandle) {
        let dim = config.equations.len();
        let solver = match config.method {
            Method::Euler => SolverKind::Euler(Euler::new(dim)),
            Method::Rk4 => SolverKind::Rk4(RK4::new(dim)),
        };
        let (ctrl_tx, ctrl_rx) = queue(CONTROL_QUEUE_CAPACITY);
        let (event_tx, event_rx) = queue(EVENT_QUEUE_CAPACITY);

        let node = OdeNode {
            state: NodeState::AwaitingModule,
            module_rx,
            module: None,
            solver,
            t: 0.0,
            h_base: config.time_scale / ctx.sample_rate(),
            detuning: 1.0,
            y: config.initial_values.clone(),
            params: config.param_values(),
            initial_values: config.initial_values.clone(),
            pending_reset: false,
            channels_per_equation: config.channels_per_equation,
            ctrl_rx,
            event_tx,
        };
        (node, NodeHandle { ctrl_tx, event_rx })
    }

    /// Number of equations (state-vector length).
    pub fn dimension(&self) -> usize {
        self.y.len()
    }

    /// Channel count of one output frame.
    pub fn frame_channels(&self) -> usize {
        self.y.len() * self.channels_per_equation
    }

    pub fn is_ready(&self) -> bool {
        self.state == NodeState::Ready
    }

    pub fn is_failed(&self) -> bool {
        self.state == NodeState::Failed
    }

    /// Renders one quantum into `out`, interpreted as consecutive frames of
    /// [`Self::frame_channels`] interleaved values.
    ///
    /// Applies pending control messages at the callback boundary, then
    /// steps the integrator once per frame and fans each equation's state
    /// value out across its channel group. Until the module is ready, and
    /// forever after a failed instantiation, every channel gets exact 0.0.
    pub fn process(&mut self, out: &mut [f64]) {
        self.drain_control();
        self.poll_module();

        if self.state != NodeState::Ready {
            out.fill(0.0);
            return;
        }

        if self.pending_reset {
            self.y.copy_from_slice(&self.initial_values);
            self.pending_reset = false;
        }

        let h = self.h_base * self.detuning;
        let channels = self.channels_per_equation;
        let frame_len = self.y.len() * channels;
        debug_assert_eq!(out.len() % frame_len, 0, "output not a whole frame count");

        let module = match self.module.as_mut() {
            Some(module) => module,
            None => {
                out.fill(0.0);
                return;
            }
        };

        let mut frames = out.chunks_exact_mut(frame_len);
        for frame in &mut frames {
            match &mut self.solver {
                SolverKind::Euler(solver) => {
                    solver.step(&mut *module, &mut self.t, &mut self.y, &self.params, h)
                }
                SolverKind::Rk4(solver) => {
                    solver.step(&mut *module, &mut self.t, &mut self.y, &self.params, h)
                }
            }
            for (slot, value) in self.y.iter().enumerate() {
                frame[slot * channels..(slot + 1) * channels].fill(*value);
            }
        }
        frames.into_remainder().fill(0.0);
    }

    fn drain_control(&mut self) {
        while let Some(msg) = self.ctrl_rx.try_pop() {
            self.apply(msg);
        }
    }

    fn apply(&mut self, msg: ControlMsg) {
        match msg {
            ControlMsg::UpdateParameters(values) => {
                if values.len() == self.params.len() {
                    self.params.copy_from_slice(&values);
                } else {
                    warn!(
                        got = values.len(),
                        expected = self.params.len(),
                        "dropping parameter update with wrong length"
                    );
                }
            }
            ControlMsg::ResetInitialConditions(values) => {
                if values.len() == self.y.len() {
                    self.initial_values.copy_from_slice(&values);
                    self.pending_reset = true;
                } else {
                    warn!(
                        got = values.len(),
                        expected = self.y.len(),
                        "dropping reset with wrong length"
                    );
                }
            }
            ControlMsg::SetDetuning(factor) => {
                if factor.is_finite() {
                    self.detuning = factor;
                } else {
                    warn!(factor, "dropping non-finite detuning factor");
                }
            }
        }
    }

    fn poll_module(&mut self) {
        if self.state != NodeState::AwaitingModule {
            return;
        }
        match self.module_rx.try_recv() {
            Ok(Ok(module)) => {
                self.module = Some(module);
                self.state = NodeState::Ready;
                debug!("equation module ready");
                let _ = self.event_tx.try_push(NodeEvent::Ready);
            }
            Ok(Err(err)) => {
                self.state = NodeState::Failed;
                warn!(error = %err, "module instantiation failed; node renders silence");
                let _ = self
                    .event_tx
                    .try_push(NodeEvent::Failed(NodeError::Instantiate(err)));
            }
            Err(TryRecvError::Empty) => {}
            Err(TryRecvError::Disconnected) => {
                self.state = NodeState::Failed;
                warn!("module loader disconnected; node renders silence");
                let _ = self
                    .event_tx
                    .try_push(NodeEvent::Failed(NodeError::LoaderLost));
            }
        }
    }
}

impl NodeHandle {
    pub fn update_parameters(&mut self, values: Vec<f64>) -> anyhow::Result<()> {
        self.send(ControlMsg::UpdateParameters(values))
    }

    pub fn reset_initial_conditions(&mut self, values: Vec<f64>) -> anyhow::Result<()> {
        self.send(ControlMsg::ResetInitialConditions(values))
    }

    pub fn set_detuning(&mut self, factor: f64) -> anyhow::Result<()> {
        self.send(ControlMsg::SetDetuning(factor))
    }

    pub fn send(&mut self, msg: ControlMsg) -> anyhow::Result<()> {
        self.ctrl_tx
            .try_push(msg)
            .map_err(|_| anyhow::anyhow!("control queue full"))
    }

    /// Next lifecycle event emitted by the render side, if any.
    pub fn poll_event(&mut self) -> Option<NodeEvent> {
        self.event_rx.try_pop()
    }
}
