//! Loading of description files into jobs.
//!
//! A description is either a leaf experiment or a global descriptor listing
//! further description files. Global descriptors nest; a file that is still
//! being loaded further up the chain is rejected as a cycle.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use batcher_core::errors::{BatcherError, ErrorInfo};
use batcher_core::{BatcherConfig, ModuleConfig};
use tracing::info;

use crate::document::read_description;
use crate::factory::{ModuleRegistry, DEFAULT_MODULE};
use crate::job::Job;
use crate::sampler::sample;
use crate::spec::{Description, ExperimentSpec, GlobalDescription};

/// Caller overrides applied while loading.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadOptions {
    /// Prepended to every experiment's name and pack name.
    pub name_prefix: Option<String>,
    /// Replaces every experiment's module.
    pub model_override: Option<String>,
}

/// A loaded global descriptor with the jobs it (transitively) produced.
#[derive(Debug, Clone)]
pub struct GlobalDescriptor {
    pub path: PathBuf,
    pub jobs: Vec<Job>,
    pub csv_params: Option<Vec<String>>,
    pub csv_stats: Option<Vec<String>>,
    pub csv_output: Option<PathBuf>,
}

/// Everything produced by one load.
#[derive(Debug, Clone, Default)]
pub struct LoadedExperiments {
    /// Every job in file order; ids are unique and increase in this order.
    pub jobs: Vec<Job>,
    /// Global descriptors that produced at least one job, innermost first.
    pub descriptors: Vec<GlobalDescriptor>,
}

/// Walks description files and expands them into jobs.
pub struct ExperimentLoader<'a> {
    config: &'a BatcherConfig,
    modules: &'a ModuleRegistry,
    options: LoadOptions,
    next_id: usize,
    in_progress: Vec<PathBuf>,
    module_configs: BTreeMap<String, Arc<ModuleConfig>>,
    loaded: LoadedExperiments,
}

impl<'a> ExperimentLoader<'a> {
    pub fn new(
        config: &'a BatcherConfig,
        modules: &'a ModuleRegistry,
        options: LoadOptions,
    ) -> Self {
        Self {
            config,
            modules,
            options,
            next_id: 0,
            in_progress: Vec::new(),
            module_configs: BTreeMap::new(),
            loaded: LoadedExperiments::default(),
        }
    }

    /// Loads every file in order.
    pub fn load<P: AsRef<Path>>(mut self, files: &[P]) -> Result<LoadedExperiments, BatcherError> {
        for file in files {
            self.load_file(file.as_ref())?;
        }
        info!(
            jobs = self.loaded.jobs.len(),
            descriptors = self.loaded.descriptors.len(),
            "loaded experiments"
        );
        Ok(self.loaded)
    }

    /// Loads one file, returning the jobs it produced.
    fn load_file(&mut self, path: &Path) -> Result<Vec<Job>, BatcherError> {
        let key = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        if self.in_progress.contains(&key) {
            let chain: Vec<String> = self
                .in_progress
                .iter()
                .map(|p| p.display().to_string())
                .collect();
            return Err(BatcherError::Spec(
                ErrorInfo::new("spec.cycle", "description includes itself")
                    .with_context("path", key.display().to_string())
                    .with_context("chain", chain.join(" -> ")),
            ));
        }
        info!(path = %path.display(), "reading description");
        let description = read_description(path).and_then(Description::from_json).map_err(
            |err| match err {
                BatcherError::Spec(info) if !info.context.contains_key("path") => {
                    BatcherError::Spec(info.with_context("path", path.display().to_string()))
                }
                other => other,
            },
        )?;
        self.in_progress.push(key);
        let result = match description {
            Description::Experiment(spec) => self.expand(spec),
            Description::Global(global) => self.load_global(path, global),
        };
        self.in_progress.pop();
        result
    }

    fn load_global(
        &mut self,
        path: &Path,
        global: GlobalDescription,
    ) -> Result<Vec<Job>, BatcherError> {
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        let mut jobs = Vec::new();
        for entry in &global.sub_files {
            for sub in resolve_entry(base, entry)? {
                jobs.extend(self.load_file(&sub)?);
            }
        }
        if !jobs.is_empty() {
            self.loaded.descriptors.push(GlobalDescriptor {
                path: path.to_path_buf(),
                jobs: jobs.clone(),
                csv_params: global.csv_params,
                csv_stats: global.csv_stats,
                csv_output: global.csv_output.map(|out| base.join(out)),
            });
        }
        Ok(jobs)
    }

    fn module_config(&mut self, name: &str) -> Arc<ModuleConfig> {
        let config = self.config;
        self.module_configs
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(config.module(name)))
            .clone()
    }

    fn expand(&mut self, mut spec: ExperimentSpec) -> Result<Vec<Job>, BatcherError> {
        if let Some(prefix) = &self.options.name_prefix {
            spec.name = format!("{prefix}{}", spec.name);
            spec.pack_name = format!("{prefix}{}", spec.pack_name);
        }
        let module_name = self
            .options
            .model_override
            .clone()
            .or_else(|| spec.model.clone())
            .unwrap_or_else(|| DEFAULT_MODULE.to_string());
        let modules = self.modules;
        let factory = modules.resolve(&module_name)?;
        let module = self.module_config(&module_name);
        let spec = Arc::new(spec);
        let mut jobs = Vec::new();
        for params in sample(&spec.params) {
            let built = factory.build(&spec, params, self.next_id, &module)?;
            if built.is_empty() {
                return Err(BatcherError::Config(
                    ErrorInfo::new("config.empty_module", "job module produced no jobs")
                        .with_context("module", module_name.as_str()),
                ));
            }
            self.next_id += built.len();
            jobs.extend(built);
        }
        info!(
            experiment = %spec.name,
            module = %module_name,
            jobs = jobs.len(),
            "expanded experiment"
        );
        self.loaded.jobs.extend(jobs.iter().cloned());
        Ok(jobs)
    }
}

fn is_pattern(entry: &str) -> bool {
    entry.contains(['*', '?', '['])
}

/// Resolves a sub-file entry relative to the descriptor's directory.
fn resolve_entry(base: &Path, entry: &str) -> Result<Vec<PathBuf>, BatcherError> {
    let joined = base.join(entry);
    if !is_pattern(entry) {
        return Ok(vec![joined]);
    }
    let pattern = joined.to_string_lossy().into_owned();
    let paths = glob::glob(&pattern).map_err(|err| {
        BatcherError::Spec(
            ErrorInfo::new("spec.glob", err.to_string()).with_context("pattern", pattern.as_str()),
        )
    })?;
    let mut matches = Vec::new();
    for path in paths {
        matches.push(path.map_err(|err| {
            BatcherError::Spec(
                ErrorInfo::new("spec.glob", err.to_string())
                    .with_context("pattern", pattern.as_str()),
            )
        })?);
    }
    if matches.is_empty() {
        return Err(BatcherError::Spec(
            ErrorInfo::new("spec.glob_empty", "pattern matched no description files")
                .with_context("pattern", pattern),
        ));
    }
    matches.sort();
    Ok(matches)
}
