use super::Loaded;
use crate::output::{print_json, print_table};
use multio_plans::{Action, Plan};
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct PlanSummary<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    config: Option<&'a str>,
    role: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    transport: Option<&'a str>,
    plan: &'a str,
    actions: Vec<&'static str>,
    terminal: bool,
}

fn action_chain(plan: &Plan) -> Vec<&'static str> {
    plan.actions.iter().map(Action::type_name).collect()
}

pub fn run(path: &Path, collection: bool, json: bool) -> anyhow::Result<()> {
    let doc = Loaded::read(path, collection)?;

    let mut summaries = Vec::new();
    for (key, config) in doc.configs() {
        for plan in config.plans() {
            summaries.push(PlanSummary {
                config: key,
                role: config.role(),
                transport: config.transport(),
                plan: &plan.name,
                actions: action_chain(plan),
                terminal: plan.check_validity(),
            });
        }
    }

    if json {
        return print_json(&summaries);
    }

    if summaries.is_empty() {
        println!("No plans.");
        return Ok(());
    }

    let rows: Vec<Vec<String>> = summaries
        .iter()
        .map(|s| {
            vec![
                s.config.unwrap_or("-").to_string(),
                s.role.to_string(),
                s.plan.to_string(),
                s.actions.join(" > "),
                if s.terminal { "yes" } else { "no" }.to_string(),
            ]
        })
        .collect();
    print_table(&["CONFIG", "ROLE", "PLAN", "ACTIONS", "TERMINAL"], &rows);
    Ok(())
}
