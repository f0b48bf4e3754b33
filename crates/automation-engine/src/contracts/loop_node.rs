//! Loop node contract
//!
//! A loop runs the subgraph behind its `loop-body` port repeatedly and then
//! continues through `loop-exit`. Every loop carries a positive
//! `max_iterations` cap; a `while` loop additionally names the field its
//! rule reads.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::condition::check_rule;
use super::{
    check_subtype, non_empty_str, positive_int, require_str, ContractReport, MissingSubtype,
    NodeContract,
};
use crate::types::{NodeConfig, NodeKind};

/// Iteration style of a loop node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopType {
    /// Iterate over the list found at the `items` field path
    ForEach,
    /// Repeat while the `while` rule holds
    While,
    /// Repeat `max_iterations` times
    Times,
}

const LOOP_TYPES: [&str; 3] = ["for_each", "while", "times"];

/// Iteration cap given to new loop nodes
pub const DEFAULT_MAX_ITERATIONS: u64 = 10;

impl LoopType {
    pub fn from_name(name: &str) -> Option<Self> {
        serde_json::from_value(Value::String(name.to_string())).ok()
    }
}

/// Contract for `loop` nodes
#[derive(Debug, Clone, Copy, Default)]
pub struct LoopContract;

impl LoopContract {
    /// Configured iteration cap, if it is a positive integer
    pub fn max_iterations(config: &NodeConfig) -> Option<u64> {
        positive_int(config, "max_iterations")
    }

    /// Field path of the `while` rule, if one is set
    pub fn while_field(config: &NodeConfig) -> Option<&str> {
        config
            .get("while")
            .and_then(Value::as_object)
            .and_then(|rule| non_empty_str(rule, "field"))
    }

    /// Whether the loop is guaranteed to stop
    pub fn has_termination_bound(config: &NodeConfig) -> bool {
        Self::max_iterations(config).is_some() || Self::while_field(config).is_some()
    }
}

impl NodeContract for LoopContract {
    fn kind(&self) -> NodeKind {
        NodeKind::Loop
    }

    fn subtypes(&self) -> &'static [&'static str] {
        &LOOP_TYPES
    }

    fn default_config(&self, subtype: Option<&str>) -> NodeConfig {
        let subtype = subtype.unwrap_or("times");
        let mut config = NodeConfig::new();
        config.insert("type".to_string(), Value::String(subtype.to_string()));
        config.insert(
            "max_iterations".to_string(),
            Value::from(DEFAULT_MAX_ITERATIONS),
        );
        if subtype == "for_each" {
            config.insert("items".to_string(), Value::String(String::new()));
        }
        config
    }

    fn validate(&self, node_id: &str, config: &NodeConfig, report: &mut ContractReport) {
        let loop_type = check_subtype(
            NodeKind::Loop,
            node_id,
            config,
            &LOOP_TYPES,
            MissingSubtype::Allowed,
            report,
        )
        .and_then(LoopType::from_name);

        if Self::max_iterations(config).is_none() {
            report.error(format!(
                "loop node {} requires a positive 'max_iterations'",
                node_id
            ));
        }

        match loop_type {
            Some(LoopType::ForEach) => {
                require_str(NodeKind::Loop, node_id, config, "items", report);
            }
            Some(LoopType::While) if config.get("while").map_or(true, Value::is_null) => {
                report.error(format!("loop node {} requires a while condition", node_id));
            }
            _ => {}
        }

        if let Some(rule) = config.get("while").filter(|v| !v.is_null()) {
            let label = format!("loop node {} while condition", node_id);
            check_rule(&label, rule, report);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn run(config: Value) -> ContractReport {
        let mut report = ContractReport::default();
        LoopContract.validate("l1", config.as_object().unwrap(), &mut report);
        report
    }

    #[test]
    fn test_termination_bound() {
        let bounded = json!({"type": "times", "max_iterations": 5});
        assert!(LoopContract::has_termination_bound(bounded.as_object().unwrap()));

        let by_while = json!({"type": "while", "while": {"field": "lead.status", "operator": "equals", "value": "new"}});
        assert!(LoopContract::has_termination_bound(by_while.as_object().unwrap()));

        let unbounded = json!({"type": "times", "max_iterations": 0});
        assert!(!LoopContract::has_termination_bound(unbounded.as_object().unwrap()));

        let blank_while = json!({"type": "while", "while": {"field": " "}});
        assert!(!LoopContract::has_termination_bound(blank_while.as_object().unwrap()));
    }

    #[test]
    fn test_for_each_requires_items() {
        let report = run(json!({"type": "for_each", "items": "", "max_iterations": 3}));
        assert_eq!(report.errors, vec!["loop node l1 requires a non-empty 'items'"]);
        assert!(run(json!({"type": "for_each", "items": "lead.properties", "max_iterations": 3})).is_clean());
    }

    #[test]
    fn test_while_requires_condition() {
        let report = run(json!({"type": "while", "max_iterations": 3}));
        assert_eq!(report.errors, vec!["loop node l1 requires a while condition"]);

        let report = run(json!({
            "type": "while",
            "max_iterations": 3,
            "while": {"field": "lead.score", "operator": "up_to"}
        }));
        assert_eq!(
            report.errors,
            vec!["loop node l1 while condition has unknown operator 'up_to'"]
        );
    }

    #[test]
    fn test_while_loop_still_needs_a_cap() {
        let rule = json!({"field": "lead.status", "operator": "equals", "value": "nurturing"});

        let report = run(json!({"type": "while", "max_iterations": null, "while": rule.clone()}));
        assert_eq!(
            report.errors,
            vec!["loop node l1 requires a positive 'max_iterations'"]
        );

        let report = run(json!({"type": "while", "while": rule.clone()}));
        assert_eq!(report.errors.len(), 1);

        assert!(run(json!({"type": "while", "max_iterations": 20, "while": rule.clone()})).is_clean());
    }

    #[test]
    fn test_times_loop_rejects_zero_cap() {
        let report = run(json!({"type": "times", "max_iterations": 0}));
        assert_eq!(
            report.errors,
            vec!["loop node l1 requires a positive 'max_iterations'"]
        );
    }

    #[test]
    fn test_default_config() {
        let config = LoopContract.default_config(Some("for_each"));
        assert_eq!(
            Value::Object(config.clone()),
            json!({"type": "for_each", "max_iterations": 10, "items": ""})
        );
        assert!(LoopContract::has_termination_bound(&config));

        let config = LoopContract.default_config(None);
        assert_eq!(config.get("type"), Some(&json!("times")));
    }
}
