//! Job script rendering shared by the backends.

use std::fs;
use std::path::{Path, PathBuf};

use batcher_core::BatcherError;
use batcher_exp::Dispatchable;

/// Body common to every backend: environment, directory change and command.
///
/// When `redirect` is set the command's output goes to the unit's marker;
/// schedulers that capture output themselves pass `false`.
pub fn render_body(unit: &dyn Dispatchable, redirect: bool) -> Result<String, BatcherError> {
    let mut body = String::new();
    let env = unit.env()?;
    if !env.is_empty() {
        body.push_str(&env);
        body.push('\n');
    }
    let app_dir = unit.app_dir()?;
    if !app_dir.is_empty() {
        body.push_str(&format!("cd {app_dir}\n"));
    }
    let code = unit.cmd_line()?;
    if redirect {
        body.push_str(&format!(
            "{{\n{}\n}} > {} 2>&1\n",
            code.trim_end(),
            unit.marker()?.display()
        ));
    } else {
        body.push_str(code.trim_end());
        body.push('\n');
    }
    Ok(body)
}

/// Script run directly by `bash` on this machine.
pub fn render_local(unit: &dyn Dispatchable) -> Result<String, BatcherError> {
    Ok(format!("#!/bin/bash\n\n{}", render_body(unit, true)?))
}

/// Location of the script generated for `unit`.
pub fn script_path(script_dir: &Path, unit: &dyn Dispatchable) -> Result<PathBuf, BatcherError> {
    Ok(script_dir.join(format!("{}.job", unit.name()?)))
}

/// Writes `body` as the unit's script and makes sure the marker's directory
/// exists so the unit's output has somewhere to go.
pub fn write_script(
    script_dir: &Path,
    unit: &dyn Dispatchable,
    body: &str,
) -> Result<PathBuf, BatcherError> {
    let marker = unit.marker()?;
    if let Some(parent) = marker.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|err| BatcherError::io("backend.script_io", parent, err))?;
    }
    fs::create_dir_all(script_dir)
        .map_err(|err| BatcherError::io("backend.script_io", script_dir, err))?;
    let path = script_path(script_dir, unit)?;
    fs::write(&path, body).map_err(|err| BatcherError::io("backend.script_io", &path, err))?;
    Ok(path)
}
