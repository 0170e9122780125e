use odetone_core::error::InstantiateError;
use odetone_core::module::{ExprModule, Program};
use std::sync::mpsc::{self, Receiver};
use std::thread;
use tracing::debug;

/// Facts about the render host, created once and passed by reference into
/// node construction. Explicit lifecycle instead of an ambient global audio
/// context.
#[derive(Debug, Clone)]
pub struct EngineContext {
    sample_rate: f64,
}

impl EngineContext {
    pub fn new(sample_rate: f64) -> anyhow::Result<Self> {
        anyhow::ensure!(
            sample_rate.is_finite() && sample_rate > 0.0,
            "sample rate must be positive, got {sample_rate}"
        );
        Ok(Self { sample_rate })
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }
}

/// Assembles generated programs into executable modules. The explicit
/// counterpart of a process-wide toolchain instance: create once, pass by
/// reference into every node constructor.
///
/// Instantiation runs on its own thread and the result is delivered over a
/// channel, so it races the first render callback; the render side treats
/// "not delivered yet" as a valid silent state.
#[derive(Debug, Default)]
pub struct ModuleLoader;

impl ModuleLoader {
    pub fn new() -> Self {
        Self
    }

    /// Kicks off an asynchronous build. The returned receiver yields
    /// exactly one result; a failed build must fail only the owning node.
    pub(crate) fn spawn_instantiate(
        &self,
        program: Program,
    ) -> Receiver<Result<ExprModule, InstantiateError>> {
        let (tx, rx) = mpsc::sync_channel(1);
        thread::spawn(move || {
            let result = ExprModule::instantiate(program);
            match &result {
                Ok(_) => debug!("module instantiated"),
                Err(err) => debug!(error = %err, "module instantiation failed"),
            }
            let _ = tx.send(result);
        });
        rx
    }

    /// Synchronous instantiation for offline rendering and tests.
    pub fn instantiate_blocking(
        &self,
        program: Program,
    ) -> Result<ExprModule, InstantiateError> {
        ExprModule::instantiate(program)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use odetone_core::codegen::compile_system;
    use odetone_core::module::{Instr, MemoryLayout};
    use odetone_core::resolve::SymbolTable;
    use std::time::Duration;

    fn simple_program() -> Program {
        let symbols = SymbolTable::new(&["x".to_string()], &[]).expect("symbols");
        compile_system(&["-x".to_string()], &symbols).expect("program")
    }

    #[test]
    fn rejects_non_positive_sample_rate() {
        assert!(EngineContext::new(0.0).is_err());
        assert!(EngineContext::new(-44_100.0).is_err());
        assert!(EngineContext::new(f64::NAN).is_err());
        assert!(EngineContext::new(48_000.0).is_ok());
    }

    #[test]
    fn spawned_build_delivers_a_module() {
        let loader = ModuleLoader::new();
        let rx = loader.spawn_instantiate(simple_program());
        let result = rx
            .recv_timeout(Duration::from_secs(5))
            .expect("build thread delivers");
        assert!(result.is_ok());
    }

    #[test]
    fn spawned_build_delivers_instantiation_failures() {
        let loader = ModuleLoader::new();
        let bad = Program {
            code: vec![Instr::Add, Instr::Store { offset: 0 }],
            layout: MemoryLayout::new(1, 0),
        };
        let rx = loader.spawn_instantiate(bad);
        let result = rx
            .recv_timeout(Duration::from_secs(5))
            .expect("build thread delivers");
        assert!(result.is_err());
    }

    #[test]
    fn blocking_instantiation_works_inline() {
        let loader = ModuleLoader::new();
        assert!(loader.instantiate_blocking(simple_program()).is_ok());
    }
}
