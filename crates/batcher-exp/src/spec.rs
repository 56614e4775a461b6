use std::collections::BTreeMap;
use std::path::PathBuf;

use batcher_core::errors::{BatcherError, ErrorInfo};
use batcher_core::expr::{evaluate, strip_expr};
use batcher_core::template::strip_placeholders;
use batcher_core::ParamValue;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field whose presence marks a document as a global descriptor.
pub const SUB_FILES_FIELD: &str = "sim_files";

/// Default wall time when an experiment does not set one.
pub const DEFAULT_WALL_TIME: &str = "01:00:00";

/// Pack name for experiments whose name is nothing but placeholders.
pub const DEFAULT_PACK_NAME: &str = "pack";

/// One sweep dimension: a parameter name and its candidate values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub values: Vec<ParamValue>,
}

/// Immutable experiment description after parameter normalisation.
///
/// String fields are templates; `{param}` placeholders are filled per job.
/// `params` keeps declaration order, which fixes the enumeration order of the
/// sampler.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExperimentSpec {
    pub name: String,
    pub working_dir: String,
    pub app_dir: String,
    pub bin: String,
    pub env: String,
    pub wall_time: Option<String>,
    pub params: Vec<Parameter>,
    pub graph_name: String,
    pub pack_name: String,
    pub model: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(untagged)]
enum Lines {
    #[default]
    Empty,
    One(String),
    Many(Vec<String>),
}

impl Lines {
    fn joined(self) -> String {
        match self {
            Lines::Empty => String::new(),
            Lines::One(line) => line,
            Lines::Many(lines) => lines.join("\n"),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawExperiment {
    name: String,
    #[serde(default)]
    working_dir: String,
    #[serde(default)]
    app_dir: String,
    bin: Lines,
    #[serde(default)]
    env: Lines,
    #[serde(default)]
    wall_time: Option<String>,
    #[serde(default)]
    params: Map<String, Value>,
    #[serde(default)]
    graph_name: Option<String>,
    #[serde(default)]
    pack_name: Option<String>,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    vars: Map<String, Value>,
}

impl ExperimentSpec {
    /// Parses a leaf experiment document and normalises its parameters.
    pub fn from_json(value: Value) -> Result<Self, BatcherError> {
        let raw: RawExperiment = serde_json::from_value(value)
            .map_err(|err| BatcherError::Spec(ErrorInfo::new("spec.schema", err.to_string())))?;
        let vars = normalize_vars(&raw.vars)?;
        let params = raw
            .params
            .iter()
            .map(|(name, value)| {
                Ok(Parameter {
                    name: name.clone(),
                    values: normalize_candidates(name, value, &vars)?,
                })
            })
            .collect::<Result<Vec<_>, BatcherError>>()?;
        Ok(Self {
            graph_name: raw.graph_name.unwrap_or_else(|| raw.name.clone()),
            pack_name: raw.pack_name.unwrap_or_else(|| default_pack_name(&raw.name)),
            name: raw.name,
            working_dir: raw.working_dir,
            app_dir: raw.app_dir,
            bin: raw.bin.joined(),
            env: raw.env.joined(),
            wall_time: raw.wall_time,
            params,
            model: raw.model,
        })
    }
}

/// Pack name used when a document sets none: the experiment name with its
/// placeholders removed, so every job of the experiment agrees on it.
fn default_pack_name(name: &str) -> String {
    let stripped = strip_placeholders(name);
    if stripped.is_empty() {
        DEFAULT_PACK_NAME.to_string()
    } else {
        stripped
    }
}

fn expr_error(err: BatcherError, field: &str) -> BatcherError {
    match err {
        BatcherError::Expr(info) => BatcherError::Expr(info.with_context("field", field)),
        other => other,
    }
}

fn normalize_vars(raw: &Map<String, Value>) -> Result<BTreeMap<String, ParamValue>, BatcherError> {
    let mut vars = BTreeMap::new();
    for (name, value) in raw {
        let resolved = match value.as_str().and_then(strip_expr) {
            Some(source) => {
                let mut values = evaluate(source, &vars).map_err(|err| expr_error(err, name))?;
                if values.len() != 1 {
                    return Err(BatcherError::Expr(
                        ErrorInfo::new("expr.type", "variables must evaluate to a scalar")
                            .with_context("field", name.as_str()),
                    ));
                }
                values.remove(0)
            }
            None => ParamValue::from_json(value)?,
        };
        vars.insert(name.clone(), resolved);
    }
    Ok(vars)
}

fn expand_value(
    name: &str,
    value: &Value,
    vars: &BTreeMap<String, ParamValue>,
    out: &mut Vec<ParamValue>,
) -> Result<(), BatcherError> {
    match value.as_str().and_then(strip_expr) {
        Some(source) => out.extend(evaluate(source, vars).map_err(|err| expr_error(err, name))?),
        None => out.push(ParamValue::from_json(value).map_err(|err| match err {
            BatcherError::Spec(info) => BatcherError::Spec(info.with_context("param", name)),
            other => other,
        })?),
    }
    Ok(())
}

/// Turns a `params` entry into a non-empty candidate list.
///
/// Bare scalars become singletons and `expr:` strings are evaluated, with list
/// results contributing one candidate per element.
pub fn normalize_candidates(
    name: &str,
    value: &Value,
    vars: &BTreeMap<String, ParamValue>,
) -> Result<Vec<ParamValue>, BatcherError> {
    let mut out = Vec::new();
    match value {
        Value::Array(items) => {
            for item in items {
                expand_value(name, item, vars, &mut out)?;
            }
        }
        other => expand_value(name, other, vars, &mut out)?,
    }
    if out.is_empty() {
        return Err(BatcherError::Spec(
            ErrorInfo::new("spec.empty_param", "parameter has no candidate values")
                .with_context("param", name),
        ));
    }
    Ok(out)
}

/// Global descriptor document: a list of sub-description files plus optional
/// result-column overrides.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GlobalDescription {
    #[serde(rename = "sim_files")]
    pub sub_files: Vec<String>,
    #[serde(default)]
    pub csv_params: Option<Vec<String>>,
    #[serde(default)]
    pub csv_stats: Option<Vec<String>>,
    #[serde(default)]
    pub csv_output: Option<PathBuf>,
}

/// A parsed description file.
#[derive(Debug, Clone, PartialEq)]
pub enum Description {
    Global(GlobalDescription),
    Experiment(ExperimentSpec),
}

impl Description {
    /// Classifies and parses a description document.
    pub fn from_json(value: Value) -> Result<Self, BatcherError> {
        if value.get(SUB_FILES_FIELD).is_some() {
            let global = serde_json::from_value(value).map_err(|err| {
                BatcherError::Spec(ErrorInfo::new("spec.schema", err.to_string()))
            })?;
            Ok(Description::Global(global))
        } else {
            ExperimentSpec::from_json(value).map(Description::Experiment)
        }
    }
}
