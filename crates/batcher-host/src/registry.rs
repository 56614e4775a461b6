use std::collections::BTreeMap;

use batcher_core::errors::{BatcherError, ErrorInfo};
use batcher_core::HostConfig;

use crate::backend::ExecutionBackend;
use crate::dry_run::DryRunBackend;
use crate::local::LocalBackend;
use crate::slurm::SlurmBackend;

/// Builds a backend from the host section of the configuration.
pub type BackendCtor = fn(&HostConfig) -> Result<Box<dyn ExecutionBackend>, BatcherError>;

/// Named backend constructors, resolved by the configured host type.
#[derive(Clone, Default)]
pub struct BackendRegistry {
    ctors: BTreeMap<String, BackendCtor>,
}

fn local(config: &HostConfig) -> Result<Box<dyn ExecutionBackend>, BatcherError> {
    Ok(Box::new(LocalBackend::from_config(config)))
}

fn slurm(config: &HostConfig) -> Result<Box<dyn ExecutionBackend>, BatcherError> {
    Ok(Box::new(SlurmBackend::from_config(config)))
}

fn dry_run(config: &HostConfig) -> Result<Box<dyn ExecutionBackend>, BatcherError> {
    Ok(Box::new(DryRunBackend::from_config(config)))
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// `local`, `slurm` and `dry-run`, plus the `LocalHost`/`Slurm` spellings
    /// used by older configuration files.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("local", local);
        registry.register("LocalHost", local);
        registry.register("slurm", slurm);
        registry.register("Slurm", slurm);
        registry.register("dry-run", dry_run);
        registry
    }

    pub fn register(&mut self, name: impl Into<String>, ctor: BackendCtor) {
        self.ctors.insert(name.into(), ctor);
    }

    pub fn names(&self) -> Vec<&str> {
        self.ctors.keys().map(String::as_str).collect()
    }

    /// Constructs the backend named `name` with `config`'s options.
    pub fn build_named(
        &self,
        name: &str,
        config: &HostConfig,
    ) -> Result<Box<dyn ExecutionBackend>, BatcherError> {
        let ctor = self.ctors.get(name).ok_or_else(|| {
            BatcherError::Config(
                ErrorInfo::new("config.unknown_backend", "no execution backend with this name")
                    .with_context("host", name)
                    .with_hint(format!("known backends: {}", self.names().join(", "))),
            )
        })?;
        ctor(config)
    }

    /// Constructs the backend selected by `config.kind`.
    pub fn build(&self, config: &HostConfig) -> Result<Box<dyn ExecutionBackend>, BatcherError> {
        self.build_named(&config.kind, config)
    }
}
