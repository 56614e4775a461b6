#![deny(missing_docs)]
//! Core types shared by the batcher crates: errors, parameter values,
//! templates, restricted expressions and run configuration.

pub mod config;
pub mod errors;
pub mod expr;
pub mod rng;
pub mod template;
mod value;

pub use config::{BatcherConfig, HostConfig, ModuleConfig};
pub use errors::{BatcherError, ErrorInfo};
pub use rng::RngHandle;
pub use value::{format_float, ParamValue, ParameterSample};
