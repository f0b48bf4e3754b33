//! Node-type configuration contracts
//!
//! Each node kind constrains the shape of its `config` object. A contract
//! knows the subtypes a kind accepts, the default configuration for a fresh
//! node, and which fields must be filled in for each subtype.
//!
//! Contracts are looked up through a [`ContractRegistry`] instead of
//! matching on the kind at every call site.

mod action;
mod condition;
mod delay;
mod loop_node;
mod trigger;

use std::collections::HashMap;

use serde_json::Value;

use crate::types::{AutomationNode, NodeConfig, NodeKind};

pub use action::{ActionContract, ActionType};
pub use condition::{
    parse_rules, ConditionContract, ConditionOperator, ConditionRule, ConditionType,
};
pub use delay::DelayContract;
pub use loop_node::{LoopContract, LoopType, DEFAULT_MAX_ITERATIONS};
pub use trigger::{is_valid_cron, TriggerContract, TriggerType};

/// Findings produced by a contract for one node
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContractReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ContractReport {
    pub fn error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    pub fn is_clean(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty()
    }
}

/// Capability set implemented once per node kind
pub trait NodeContract: Send + Sync {
    /// The kind this contract describes
    fn kind(&self) -> NodeKind;

    /// Accepted values of `config.type`; empty when the kind has no subtype
    fn subtypes(&self) -> &'static [&'static str];

    /// Named output ports; empty for a single unnamed output
    fn output_ports(&self) -> &'static [&'static str] {
        self.kind().output_ports()
    }

    /// Configuration for a freshly added node.
    ///
    /// Fields required by `subtype` are present but empty so the editor
    /// always has a well-typed object to bind to.
    fn default_config(&self, subtype: Option<&str>) -> NodeConfig;

    /// Check the configuration of one node, appending to `report`
    fn validate(&self, node_id: &str, config: &NodeConfig, report: &mut ContractReport);
}

/// Registry mapping node kinds to their contracts
pub struct ContractRegistry {
    entries: HashMap<NodeKind, Box<dyn NodeContract>>,
}

impl ContractRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Create a registry holding the built-in contract for every kind
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(TriggerContract));
        registry.register(Box::new(ActionContract));
        registry.register(Box::new(ConditionContract));
        registry.register(Box::new(DelayContract));
        registry.register(Box::new(LoopContract));
        registry
    }

    /// Register a contract, replacing any existing one for the same kind
    pub fn register(&mut self, contract: Box<dyn NodeContract>) {
        self.entries.insert(contract.kind(), contract);
    }

    /// Get the contract for a kind
    pub fn get(&self, kind: NodeKind) -> Option<&dyn NodeContract> {
        self.entries.get(&kind).map(|c| c.as_ref())
    }

    /// Check if a kind has a registered contract
    pub fn has_kind(&self, kind: NodeKind) -> bool {
        self.entries.contains_key(&kind)
    }

    /// Default configuration for a new node of `kind`
    pub fn default_config(&self, kind: NodeKind, subtype: Option<&str>) -> NodeConfig {
        match self.get(kind) {
            Some(contract) => contract.default_config(subtype),
            None => NodeConfig::new(),
        }
    }

    /// Run the node's contract against its configuration
    pub fn validate_node(&self, node: &AutomationNode, report: &mut ContractReport) {
        match self.get(node.kind) {
            Some(contract) => contract.validate(&node.id, &node.config, report),
            None => report.error(format!(
                "{} node {} has no registered configuration contract",
                node.kind, node.id
            )),
        }
    }
}

impl Default for ContractRegistry {
    fn default() -> Self {
        Self::with_builtin()
    }
}

impl std::fmt::Debug for ContractRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut kinds: Vec<_> = self.entries.keys().collect();
        kinds.sort();
        f.debug_struct("ContractRegistry").field("kinds", &kinds).finish()
    }
}

// =============================================================================
// Shared field helpers
// =============================================================================

/// How a missing `config.type` is reported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MissingSubtype {
    Error,
    Warning,
    Allowed,
}

/// Resolve `config.type` against the accepted subtypes.
///
/// Returns the subtype when it is present and known.
pub(crate) fn check_subtype<'a>(
    kind: NodeKind,
    node_id: &str,
    config: &'a NodeConfig,
    subtypes: &[&str],
    missing: MissingSubtype,
    report: &mut ContractReport,
) -> Option<&'a str> {
    let value = config
        .get("type")
        .filter(|v| !v.is_null() && v.as_str() != Some(""));

    match value {
        None => {
            let message = format!("{} node {} has no {} type configured", kind, node_id, kind);
            match missing {
                MissingSubtype::Error => report.error(message),
                MissingSubtype::Warning => report.warning(message),
                MissingSubtype::Allowed => {}
            }
            None
        }
        Some(Value::String(s)) if subtypes.contains(&s.as_str()) => Some(s.as_str()),
        Some(other) => {
            let shown = other.as_str().map(str::to_string).unwrap_or_else(|| other.to_string());
            report.error(format!("{} node {} has unknown type '{}'", kind, node_id, shown));
            None
        }
    }
}

/// Non-empty (after trimming) string field
pub(crate) fn non_empty_str<'a>(config: &'a NodeConfig, field: &str) -> Option<&'a str> {
    config
        .get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
}

/// Strictly positive integer field
pub(crate) fn positive_int(config: &NodeConfig, field: &str) -> Option<u64> {
    config.get(field).and_then(Value::as_u64).filter(|n| *n > 0)
}

/// Report a required string field that is unset or blank
pub(crate) fn require_str(
    kind: NodeKind,
    node_id: &str,
    config: &NodeConfig,
    field: &str,
    report: &mut ContractReport,
) {
    if non_empty_str(config, field).is_none() {
        report.error(format!(
            "{} node {} requires a non-empty '{}'",
            kind, node_id, field
        ));
    }
}

/// Build a config object holding `type` plus empty string fields
pub(crate) fn config_with_fields(subtype: Option<&str>, fields: &[&str]) -> NodeConfig {
    let mut config = NodeConfig::new();
    if let Some(subtype) = subtype {
        config.insert("type".to_string(), Value::String(subtype.to_string()));
    }
    for field in fields {
        config.insert((*field).to_string(), Value::String(String::new()));
    }
    config
}
