use crate::output::print_json;
use anyhow::Context;
use multio_plans::{Format, PlanExport};
use std::path::Path;
use std::process::Command;

fn prepare(path: &Path, var: &str) -> anyhow::Result<PlanExport> {
    let export = PlanExport::new(path)
        .with_context(|| format!("failed to load {}", path.display()))?
        .with_var(var);
    Ok(export)
}

/// Single-quote `value` for a POSIX shell.
fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

pub fn env(path: &Path, var: &str, json: bool) -> anyhow::Result<()> {
    let (var, value) = prepare(path, var)?.env_pair()?;
    if json {
        let mut map = serde_json::Map::new();
        map.insert(var, serde_json::Value::String(value));
        print_json(&map)?;
    } else {
        println!("export {var}={}", shell_quote(&value));
    }
    Ok(())
}

pub fn run(
    path: &Path,
    var: &str,
    plans_file: Option<&Path>,
    command: &[String],
) -> anyhow::Result<()> {
    let Some((program, args)) = command.split_first() else {
        anyhow::bail!("no command given");
    };
    let export = prepare(path, var)?;

    // The guard must outlive the child so it inherits the variable.
    let _guard = match plans_file {
        Some(file) => export.activate_file(file, Format::from_path(file))?,
        None => export.activate()?,
    };

    tracing::info!(%program, "running with plans exported");
    let status = Command::new(program)
        .args(args)
        .status()
        .with_context(|| format!("failed to start '{program}'"))?;

    if !status.success() {
        match status.code() {
            Some(code) => anyhow::bail!("'{program}' exited with status {code}"),
            None => anyhow::bail!("'{program}' was terminated by a signal"),
        }
    }
    Ok(())
}
