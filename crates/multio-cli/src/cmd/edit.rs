use anyhow::Context;
use multio_plans::{Config, Document, Format, Plan, Sink};
use serde_json::Value;
use std::path::Path;

// ---------------------------------------------------------------------------
// init
// ---------------------------------------------------------------------------

pub fn init(
    path: &Path,
    plan_name: &str,
    server: bool,
    transport: Option<String>,
    force: bool,
) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists; pass --force to overwrite",
            path.display()
        );
    }

    let mut plan = Plan::new(plan_name);
    plan.ensure_sink();
    let name = plan.name.clone();
    let config = if server || transport.is_some() {
        plan.to_server(transport)
    } else {
        plan.to_client()
    };

    save(&config, path)?;
    println!(
        "Created {} {} config with plan '{name}'.",
        path.display(),
        config.role()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// add-action
// ---------------------------------------------------------------------------

pub fn add_action(path: &Path, plan_name: &str, action: &str, create: bool) -> anyhow::Result<()> {
    let mut config = load(path)?;
    let value = parse_json(action, "action")?;

    if create && config.plan(plan_name).is_err() {
        config.add_plan(Plan::new(plan_name));
    }
    let plan = config.plan_mut(plan_name)?;
    plan.add_action_value(value)
        .with_context(|| format!("invalid action for plan '{plan_name}'"))?;
    let tag = plan
        .actions
        .last()
        .map(|a| a.type_name())
        .unwrap_or_default();

    save(&config, path)?;
    println!("Added '{tag}' action to plan '{plan_name}'.");
    Ok(())
}

// ---------------------------------------------------------------------------
// add-sink
// ---------------------------------------------------------------------------

pub fn add_sink(path: &Path, plan_name: &str, sink: &str) -> anyhow::Result<()> {
    let mut config = load(path)?;
    let sink = Sink::from_value(parse_json(sink, "sink")?).context("invalid sink")?;
    let tag = sink.type_name();

    config.plan_mut(plan_name)?.add_sink(sink);

    save(&config, path)?;
    println!("Added '{tag}' sink to plan '{plan_name}'.");
    Ok(())
}

// ---------------------------------------------------------------------------
// helpers
// ---------------------------------------------------------------------------

fn load(path: &Path) -> anyhow::Result<Config> {
    Config::from_file(path).with_context(|| format!("failed to load {}", path.display()))
}

fn save(config: &Config, path: &Path) -> anyhow::Result<()> {
    config
        .write(path, Format::from_path(path))
        .with_context(|| format!("failed to write {}", path.display()))
}

fn parse_json(raw: &str, what: &str) -> anyhow::Result<Value> {
    serde_json::from_str(raw).with_context(|| format!("{what} is not valid JSON: {raw}"))
}
