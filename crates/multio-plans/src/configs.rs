use crate::document::Document;
use crate::error::{PlanError, Result};
use crate::plans::Plan;
use crate::validate::{field, indexed, Issue, Validate};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_yaml::Value;
use std::collections::{BTreeMap, HashSet};

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// A set of plans run by one engine instance.
///
/// The role is decided by the document itself: a `transport` key, even a null
/// one, makes it a server config; anything else is a client config. Both roles
/// require a `plans` list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Config {
    Client(ClientConfig),
    Server(ServerConfig),
}

impl<'de> Deserialize<'de> for Config {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // YAML values keep non-finite floats such as `.nan`.
        let value = Value::deserialize(deserializer)?;
        let config = if value.get("transport").is_some() {
            ServerConfig::deserialize(value).map(Config::Server)
        } else {
            ClientConfig::deserialize(value).map(Config::Client)
        };
        config.map_err(D::Error::custom)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    pub plans: Vec<Plan>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    pub plans: Vec<Plan>,
    /// Transport protocol, e.g. `mpi` or `tcp`. Always written, even when
    /// unset, since its presence marks the document as a server config.
    #[serde(default)]
    pub transport: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
}

impl Config {
    pub fn client(plans: Vec<Plan>) -> Self {
        Config::Client(ClientConfig { plans })
    }

    pub fn server(plans: Vec<Plan>, transport: Option<String>) -> Self {
        Config::Server(ServerConfig {
            plans,
            transport,
            group: None,
            count: None,
        })
    }

    pub fn is_server(&self) -> bool {
        matches!(self, Config::Server(_))
    }

    pub fn role(&self) -> &'static str {
        match self {
            Config::Client(_) => "client",
            Config::Server(_) => "server",
        }
    }

    pub fn transport(&self) -> Option<&str> {
        match self {
            Config::Client(_) => None,
            Config::Server(s) => s.transport.as_deref(),
        }
    }

    pub fn plans(&self) -> &[Plan] {
        match self {
            Config::Client(c) => &c.plans,
            Config::Server(s) => &s.plans,
        }
    }

    pub fn plans_mut(&mut self) -> &mut Vec<Plan> {
        match self {
            Config::Client(c) => &mut c.plans,
            Config::Server(s) => &mut s.plans,
        }
    }

    pub fn add_plan(&mut self, plan: Plan) {
        self.plans_mut().push(plan);
    }

    pub fn extend_plans(&mut self, plans: impl IntoIterator<Item = Plan>) {
        self.plans_mut().extend(plans);
    }

    pub fn plan(&self, name: &str) -> Result<&Plan> {
        self.plans()
            .iter()
            .find(|p| p.name == name)
            .ok_or_else(|| PlanError::PlanNotFound(name.to_string()))
    }

    pub fn plan_mut(&mut self, name: &str) -> Result<&mut Plan> {
        self.plans_mut()
            .iter_mut()
            .find(|p| p.name == name)
            .ok_or_else(|| PlanError::PlanNotFound(name.to_string()))
    }

    /// Turn a client into a server holding the same plans. Server settings
    /// other than the transport are kept when `self` is already a server.
    pub fn into_server(self, transport: Option<String>) -> Config {
        match self {
            Config::Client(c) => Config::server(c.plans, transport),
            Config::Server(mut s) => {
                s.transport = transport;
                Config::Server(s)
            }
        }
    }

    /// Append an empty sink to every plan that lacks one.
    pub fn ensure_sinks(&mut self) {
        for plan in self.plans_mut() {
            plan.ensure_sink();
        }
    }

    /// Names of plans that have no terminal action.
    pub fn incomplete_plans(&self) -> Vec<&str> {
        self.plans()
            .iter()
            .filter(|p| !p.check_validity())
            .map(|p| p.name.as_str())
            .collect()
    }
}

impl Default for Config {
    fn default() -> Self {
        Config::Client(ClientConfig::default())
    }
}

impl Validate for Config {
    fn check(&self, at: &str, issues: &mut Vec<Issue>) {
        for (i, plan) in self.plans().iter().enumerate() {
            plan.check(&indexed(at, "plans", i), issues);
        }
        if let Config::Server(s) = self {
            if matches!(s.transport.as_deref(), Some(t) if t.trim().is_empty()) {
                issues.push(Issue::error(
                    field(at, "transport"),
                    "transport must not be empty when set",
                ));
            }
            if s.count == Some(0) {
                issues.push(Issue::warning(
                    field(at, "count"),
                    "count of 0 starts no server instances",
                ));
            }
        }
    }

    fn check_complete(&self, at: &str, issues: &mut Vec<Issue>) {
        if self.plans().is_empty() {
            issues.push(Issue::warning(field(at, "plans"), "config has no plans"));
        }
        let mut seen = HashSet::new();
        for (i, plan) in self.plans().iter().enumerate() {
            let loc = indexed(at, "plans", i);
            plan.check_complete(&loc, issues);
            if !seen.insert(plan.name.as_str()) {
                issues.push(Issue::warning(
                    field(&loc, "name"),
                    format!("duplicate plan name '{}'", plan.name),
                ));
            }
        }
    }
}

impl Document for Config {
    const KIND: &'static str = "config";
}

// ---------------------------------------------------------------------------
// Collection
// ---------------------------------------------------------------------------

/// Named configs, written as a flat map: `{server: {...}, client: {...}}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Collection {
    configs: BTreeMap<String, Config>,
}

impl Collection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the config under `key`, returning the previous one.
    pub fn add_config(&mut self, key: impl Into<String>, config: Config) -> Option<Config> {
        self.configs.insert(key.into(), config)
    }

    pub fn get(&self, key: &str) -> Result<&Config> {
        self.configs
            .get(key)
            .ok_or_else(|| PlanError::ConfigNotFound(key.to_string()))
    }

    pub fn get_mut(&mut self, key: &str) -> Result<&mut Config> {
        self.configs
            .get_mut(key)
            .ok_or_else(|| PlanError::ConfigNotFound(key.to_string()))
    }

    pub fn remove(&mut self, key: &str) -> Option<Config> {
        self.configs.remove(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Config)> {
        self.configs.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.configs.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }
}

impl FromIterator<(String, Config)> for Collection {
    fn from_iter<I: IntoIterator<Item = (String, Config)>>(iter: I) -> Self {
        Self {
            configs: iter.into_iter().collect(),
        }
    }
}

impl Validate for Collection {
    fn check(&self, at: &str, issues: &mut Vec<Issue>) {
        for (key, config) in &self.configs {
            config.check(&field(at, key), issues);
        }
    }

    fn check_complete(&self, at: &str, issues: &mut Vec<Issue>) {
        for (key, config) in &self.configs {
            config.check_complete(&field(at, key), issues);
        }
    }
}

impl Document for Collection {
    const KIND: &'static str = "collection";
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
