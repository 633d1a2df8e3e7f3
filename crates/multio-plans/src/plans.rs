use crate::actions::{Action, SinkAction};
use crate::configs::Config;
use crate::document::Document;
use crate::error::Result;
use crate::sinks::Sink;
use crate::validate::{field, indexed, Issue, Validate};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::ops::Add;

/// Plan names may not contain spaces; the engine uses them as identifiers.
pub fn normalize_name(name: &str) -> String {
    name.replace(' ', "-")
}

fn deserialize_name<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(normalize_name(&raw))
}

// ---------------------------------------------------------------------------
// Plan
// ---------------------------------------------------------------------------

/// A named, ordered pipeline of actions.
///
/// The engine only accepts a plan that hands its data somewhere, so a finished
/// plan needs at least one terminal action (`sink`, `transport` or
/// `single-field-sink`). Plans under construction may lack one; see
/// [`Plan::check_validity`] and [`Plan::ensure_sink`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Plan {
    #[serde(deserialize_with = "deserialize_name")]
    pub name: String,
    #[serde(default)]
    pub actions: Vec<Action>,
}

impl Plan {
    pub fn new(name: &str) -> Self {
        Self {
            name: normalize_name(name),
            actions: Vec::new(),
        }
    }

    pub fn with_actions(name: &str, actions: Vec<Action>) -> Self {
        Self {
            name: normalize_name(name),
            actions,
        }
    }

    pub fn add_action(&mut self, action: impl Into<Action>) {
        self.actions.push(action.into());
    }

    pub fn extend_actions(&mut self, actions: impl IntoIterator<Item = Action>) {
        self.actions.extend(actions);
    }

    /// Append an action given as an untyped map, e.g. `{"type": "print"}`.
    /// The plan is left unchanged when the value does not describe a valid
    /// action.
    pub fn add_action_value(&mut self, value: Value) -> Result<()> {
        let action = Action::from_value(value)?;
        self.actions.push(action);
        Ok(())
    }

    /// Add `sink` to the last `sink` action, appending one if there is none.
    pub fn add_sink(&mut self, sink: Sink) {
        let existing = self.actions.iter_mut().rev().find_map(|a| match a {
            Action::Sink(s) => Some(s),
            _ => None,
        });
        match existing {
            Some(action) => action.add_sink(sink),
            None => {
                let mut action = SinkAction::default();
                action.add_sink(sink);
                self.actions.push(Action::Sink(action));
            }
        }
    }

    pub fn has_sink(&self) -> bool {
        self.actions.iter().any(|a| matches!(a, Action::Sink(_)))
    }

    /// True when at least one action is terminal.
    pub fn check_validity(&self) -> bool {
        self.actions.iter().any(Action::is_terminal)
    }

    /// Append an empty `sink` action unless the plan already has one.
    pub fn ensure_sink(&mut self) -> &mut Self {
        if !self.has_sink() {
            self.actions.push(Action::Sink(SinkAction::default()));
        }
        self
    }

    pub fn to_client(self) -> Config {
        Config::client(vec![self])
    }

    pub fn to_server(self, transport: Option<String>) -> Config {
        Config::server(vec![self], transport)
    }
}

impl Add for Plan {
    type Output = Config;

    fn add(self, other: Plan) -> Config {
        Config::client(vec![self, other])
    }
}

impl Validate for Plan {
    fn check(&self, at: &str, issues: &mut Vec<Issue>) {
        if self.name.trim().is_empty() {
            issues.push(Issue::error(field(at, "name"), "plan name must not be empty"));
        }
        for (i, action) in self.actions.iter().enumerate() {
            action.check(&indexed(at, "actions", i), issues);
        }
    }

    fn check_complete(&self, at: &str, issues: &mut Vec<Issue>) {
        if !self.check_validity() {
            issues.push(Issue::error(
                at,
                format!(
                    "plan '{}' has no terminal action (sink, transport or single-field-sink)",
                    self.name
                ),
            ));
        }
    }
}

impl Document for Plan {
    const KIND: &'static str = "plan";
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::Encode;
    use crate::PlanError;
    use serde_json::json;

    #[test]
    fn name_spaces_replaced() {
        assert_eq!(Plan::new("No op").name, "No-op");
        let plan: Plan = serde_yaml::from_str("name: output plan\n").unwrap();
        assert_eq!(plan.name, "output-plan");
        assert!(plan.actions.is_empty());
    }

    #[test]
    fn add_valid_action() {
        let mut plan = Plan::new("testing");
        plan.add_action_value(json!({"type": "print"})).unwrap();
        assert_eq!(plan.actions.len(), 1);
    }

    #[test]
    fn add_invalid_action_leaves_plan_unchanged() {
        let mut plan = Plan::new("testing");
        let err = plan.add_action_value(json!({"type": "invalid"})).unwrap_err();
        assert!(matches!(err, PlanError::Json(_)));
        assert!(plan.actions.is_empty());
    }

    #[test]
    fn validity_needs_terminal_action() {
        let mut plan = Plan::new("p");
        plan.add_action(Action::print());
        assert!(!plan.check_validity());
        plan.add_action(Action::transport("server"));
        assert!(plan.check_validity());
    }

    #[test]
    fn ensure_sink_appends_once() {
        let mut plan = Plan::new("p");
        plan.add_action(Action::print());
        plan.ensure_sink().ensure_sink();
        assert_eq!(plan.actions.len(), 2);
        assert_eq!(plan.actions[1], Action::sink(vec![]));
        assert!(plan.check_validity());
    }

    #[test]
    fn ensure_sink_keeps_existing_sink() {
        let mut plan = Plan::with_actions("p", vec![Action::sink(vec![Sink::debug()])]);
        plan.ensure_sink();
        assert_eq!(plan.actions.len(), 1);
    }

    #[test]
    fn ensure_sink_ignores_other_terminals() {
        let mut plan = Plan::with_actions("p", vec![Action::transport("server")]);
        plan.ensure_sink();
        assert_eq!(plan.actions.len(), 2);
    }

    #[test]
    fn add_sink_targets_last_sink_action() {
        let mut plan = Plan::with_actions(
            "p",
            vec![Action::sink(vec![]), Action::print(), Action::sink(vec![])],
        );
        plan.add_sink(Sink::fdb());
        assert_eq!(plan.actions[0], Action::sink(vec![]));
        assert_eq!(plan.actions[2], Action::sink(vec![Sink::fdb()]));
    }

    #[test]
    fn add_sink_creates_sink_action() {
        let mut plan = Plan::with_actions("p", vec![Action::print()]);
        plan.add_sink(Sink::debug());
        assert_eq!(plan.actions.len(), 2);
        assert_eq!(plan.actions[1], Action::sink(vec![Sink::debug()]));
    }

    #[test]
    fn extend_actions_preserves_order() {
        let mut plan = Plan::new("p");
        plan.extend_actions([Action::print(), Encode::raw().into(), Action::sink(vec![])]);
        let tags: Vec<&str> = plan.actions.iter().map(Action::type_name).collect();
        assert_eq!(tags, ["print", "encode", "sink"]);
    }

    #[test]
    fn adding_plans_builds_a_client() {
        let config = Plan::new("a") + Plan::new("b");
        assert!(!config.is_server());
        let names: Vec<&str> = config.plans().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["a", "b"]);
    }

    #[test]
    fn to_server_carries_transport() {
        let config = Plan::new("a").to_server(Some("mpi".to_string()));
        assert!(config.is_server());
        assert_eq!(config.transport(), Some("mpi"));
    }

    #[test]
    fn unknown_plan_key_rejected() {
        let err = Plan::from_yaml("name: p\nsteps: []\n").unwrap_err();
        assert!(err.to_string().contains("unknown field"));
    }

    #[test]
    fn incomplete_plan_loads_but_fails_validation() {
        let plan = Plan::from_yaml("name: p\nactions:\n  - type: print\n").unwrap();
        let issues = plan.validate();
        assert_eq!(issues.len(), 1);
        assert!(issues[0].is_error());
        assert!(issues[0].message.contains("no terminal action"));
    }

    #[test]
    fn field_errors_are_located_in_plan() {
        let err = Plan::from_yaml(
            "name: p\nactions:\n  - type: print\n  - type: encode\n    format: grib\n",
        )
        .unwrap_err();
        assert!(err.to_string().contains("actions[1].template"));
    }
}
