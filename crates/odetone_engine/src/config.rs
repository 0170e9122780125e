use odetone_core::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Integration method, fixed per node at configuration time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    Euler,
    #[default]
    Rk4,
}

fn default_time_scale() -> f64 {
    1.0
}

fn default_channels_per_equation() -> usize {
    2
}

/// Everything needed to build one ODE node.
///
/// Declaration order of `equations` and `parameters` is the canonical
/// state/parameter index order for the lifetime of the compiled module;
/// only parameter and state *values* change after construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    /// (state variable name, its d/dt expression), in state-vector order.
    pub equations: Vec<(String, String)>,
    /// (parameter name, initial value), in parameter-vector order.
    #[serde(default)]
    pub parameters: Vec<(String, f64)>,
    /// Initial state, aligned with `equations`.
    pub initial_values: Vec<f64>,
    #[serde(default)]
    pub method: Method,
    /// Scales the base step: h_base = time_scale / sample_rate.
    #[serde(default = "default_time_scale")]
    pub time_scale: f64,
    /// Output channels per equation; each channel of a group carries that
    /// equation's state value.
    #[serde(default = "default_channels_per_equation")]
    pub channels_per_equation: usize,
}

impl NodeConfig {
    pub fn state_names(&self) -> Vec<String> {
        self.equations.iter().map(|(name, _)| name.clone()).collect()
    }

    pub fn param_names(&self) -> Vec<String> {
        self.parameters.iter().map(|(name, _)| name.clone()).collect()
    }

    pub fn param_values(&self) -> Vec<f64> {
        self.parameters.iter().map(|(_, value)| *value).collect()
    }

    pub fn expressions(&self) -> Vec<String> {
        self.equations.iter().map(|(_, expr)| expr.clone()).collect()
    }

    /// Synchronous construction-time checks. Runs before compilation and
    /// before the asynchronous module build is kicked off.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.equations.is_empty() {
            return Err(ConfigError::EmptySystem);
        }
        if self.initial_values.len() != self.equations.len() {
            return Err(ConfigError::InitialValueCount {
                values: self.initial_values.len(),
                equations: self.equations.len(),
            });
        }
        for ((name, _), value) in self.equations.iter().zip(&self.initial_values) {
            if !value.is_finite() {
                return Err(ConfigError::NonFiniteInitial { name: name.clone() });
            }
        }
        for (name, value) in &self.parameters {
            if !value.is_finite() {
                return Err(ConfigError::NonFiniteParameter { name: name.clone() });
            }
        }
        if self.channels_per_equation == 0 {
            return Err(ConfigError::ZeroChannels);
        }
        if !self.time_scale.is_finite() || self.time_scale <= 0.0 {
            return Err(ConfigError::BadTimeScale {
                value: self.time_scale,
            });
        }
        Ok(())
    }
}
