//! Project parameters shared by the builder and every kernel.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ParamError;

/// Optional capabilities of the shared project configuration.
///
/// Every method has a no-op default, so an implementation only overrides the
/// capabilities it actually has. The builder and crawler call these
/// unconditionally.
pub trait ProjectParams {
    fn log_info(&self, _message: &str) {}

    fn log_warn(&self, _message: &str) {}

    fn log_exception(&self, _error: &dyn std::error::Error) {}

    /// Experiment parameters for one session directory.
    ///
    /// `Ok(None)` means no parameters are known for `dir`.
    fn get_exp_param(&self, _dir: &Path) -> Result<Option<Value>, ParamError> {
        Ok(None)
    }
}

/// Parameters with no capabilities at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoParams;

impl ProjectParams for NoParams {}

/// Project configuration loaded from a JSON file.
///
/// Logging goes through `tracing`. Experiment parameters are the base
/// `exp_param` value, deep-merged with an optional per-session override file
/// found inside the session directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Project directory, used when no path is given on the command line.
    #[serde(default)]
    pub prj_dir: Option<PathBuf>,

    /// Base experiment parameters shared by every session.
    #[serde(default)]
    pub exp_param: Value,

    /// File name of the per-session override inside a session directory.
    #[serde(default = "default_individual_param_file")]
    pub individual_param_file: String,
}

fn default_individual_param_file() -> String {
    "param_individual.json".to_string()
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            prj_dir: None,
            exp_param: Value::Null,
            individual_param_file: default_individual_param_file(),
        }
    }
}

impl ProjectConfig {
    /// Load a configuration file.
    pub fn load(path: &Path) -> Result<Self, ParamError> {
        let content = fs::read_to_string(path).map_err(|source| ParamError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ParamError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Create a config with the given base experiment parameters.
    pub fn with_exp_param(mut self, exp_param: Value) -> Self {
        self.exp_param = exp_param;
        self
    }
}

impl ProjectParams for ProjectConfig {
    fn log_info(&self, message: &str) {
        tracing::info!(target: "labcrawl::params", "{message}");
    }

    fn log_warn(&self, message: &str) {
        tracing::warn!(target: "labcrawl::params", "{message}");
    }

    fn log_exception(&self, error: &dyn std::error::Error) {
        tracing::error!(target: "labcrawl::params", "{error}");
    }

    fn get_exp_param(&self, dir: &Path) -> Result<Option<Value>, ParamError> {
        let override_path = dir.join(&self.individual_param_file);
        if !override_path.is_file() {
            return Ok((!self.exp_param.is_null()).then(|| self.exp_param.clone()));
        }

        let content = fs::read_to_string(&override_path).map_err(|source| ParamError::Io {
            path: override_path.clone(),
            source,
        })?;
        let individual: Value =
            serde_json::from_str(&content).map_err(|source| ParamError::Parse {
                path: override_path.clone(),
                source,
            })?;

        let mut merged = self.exp_param.clone();
        deep_update(&mut merged, individual);
        Ok(Some(merged))
    }
}

/// Merge `other` into `base`.
///
/// Objects present on both sides are merged key by key, recursively; any
/// other value in `other` replaces the one in `base`.
pub fn deep_update(base: &mut Value, other: Value) {
    match (base, other) {
        (Value::Object(base), Value::Object(other)) => {
            for (key, value) in other {
                let nested = value.is_object() && base.get(&key).is_some_and(Value::is_object);
                match base.get_mut(&key) {
                    Some(existing) if nested => deep_update(existing, value),
                    _ => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, other) => *base = other,
    }
}
