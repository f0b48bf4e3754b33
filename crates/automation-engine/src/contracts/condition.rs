//! Condition node contract
//!
//! A condition holds an ordered list of `{field, operator, value}` rules and
//! routes the run through its `true`, `false` or `default` port.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{check_subtype, ContractReport, MissingSubtype, NodeContract};
use crate::types::{NodeConfig, NodeKind};

/// Branching style of a condition node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionType {
    If,
    Switch,
}

const CONDITION_TYPES: [&str; 2] = ["if", "switch"];

/// Comparison applied by a single rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionOperator {
    Equals,
    NotEquals,
    Contains,
    GreaterThan,
    LessThan,
    In,
    NotIn,
}

impl ConditionOperator {
    pub fn from_name(name: &str) -> Option<Self> {
        serde_json::from_value(Value::String(name.to_string())).ok()
    }

    /// Whether the rule value must be a list
    pub fn expects_list(&self) -> bool {
        matches!(self, ConditionOperator::In | ConditionOperator::NotIn)
    }
}

/// One `{field, operator, value}` rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionRule {
    /// Dotted path into the lead/event payload (e.g. `lead.status`)
    pub field: String,
    pub operator: ConditionOperator,
    #[serde(default)]
    pub value: Value,
}

impl ConditionRule {
    pub fn new(field: impl Into<String>, operator: ConditionOperator, value: Value) -> Self {
        Self {
            field: field.into(),
            operator,
            value,
        }
    }
}

/// Parse the `conditions` list into typed rules.
///
/// Returns `None` if the list is missing or any rule is malformed.
pub fn parse_rules(config: &NodeConfig) -> Option<Vec<ConditionRule>> {
    let list = config.get("conditions")?.as_array()?;
    list.iter()
        .map(|rule| serde_json::from_value(rule.clone()).ok())
        .collect()
}

/// Check one rule object, reporting problems against `label`.
///
/// Returns true when the rule is well formed.
pub(crate) fn check_rule(label: &str, rule: &Value, report: &mut ContractReport) -> bool {
    let Some(rule) = rule.as_object() else {
        report.error(format!("{} must be an object", label));
        return false;
    };

    let mut ok = true;
    let field = rule.get("field").and_then(Value::as_str).unwrap_or("");
    if field.trim().is_empty() {
        report.error(format!("{} requires a field", label));
        ok = false;
    }

    match rule.get("operator").and_then(Value::as_str) {
        None | Some("") => {
            report.error(format!("{} requires an operator", label));
            ok = false;
        }
        Some(name) => match ConditionOperator::from_name(name) {
            None => {
                report.error(format!("{} has unknown operator '{}'", label, name));
                ok = false;
            }
            Some(op) if op.expects_list() && !rule.get("value").is_some_and(Value::is_array) => {
                report.error(format!("{} operator '{}' requires a list value", label, name));
                ok = false;
            }
            Some(_) => {}
        },
    }

    ok
}

/// Contract for `condition` nodes
#[derive(Debug, Clone, Copy, Default)]
pub struct ConditionContract;

impl NodeContract for ConditionContract {
    fn kind(&self) -> NodeKind {
        NodeKind::Condition
    }

    fn subtypes(&self) -> &'static [&'static str] {
        &CONDITION_TYPES
    }

    fn default_config(&self, subtype: Option<&str>) -> NodeConfig {
        let mut config = NodeConfig::new();
        config.insert(
            "type".to_string(),
            Value::String(subtype.unwrap_or("if").to_string()),
        );
        config.insert("conditions".to_string(), Value::Array(Vec::new()));
        config
    }

    fn validate(&self, node_id: &str, config: &NodeConfig, report: &mut ContractReport) {
        // Absent type means a plain if/else
        check_subtype(
            NodeKind::Condition,
            node_id,
            config,
            &CONDITION_TYPES,
            MissingSubtype::Allowed,
            report,
        );

        let rules = match config.get("conditions").and_then(Value::as_array) {
            Some(rules) if !rules.is_empty() => rules,
            _ => {
                report.error(format!(
                    "condition node {} requires at least one rule",
                    node_id
                ));
                return;
            }
        };

        for (index, rule) in rules.iter().enumerate() {
            let label = format!("condition node {} rule {}", node_id, index + 1);
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
        ConditionContract.validate("c1", config.as_object().unwrap(), &mut report);
        report
    }

    #[test]
    fn test_requires_at_least_one_rule() {
        let report = run(json!({"type": "if", "conditions": []}));
        assert_eq!(report.errors, vec!["condition node c1 requires at least one rule"]);

        let report = run(json!({"type": "if"}));
        assert_eq!(report.errors.len(), 1);
    }

    #[test]
    fn test_valid_rules() {
        let report = run(json!({
            "type": "switch",
            "conditions": [
                {"field": "lead.status", "operator": "equals", "value": "hot"},
                {"field": "lead.source", "operator": "in", "value": ["zillow", "referral"]}
            ]
        }));
        assert!(report.is_clean(), "{:?}", report);
    }

    #[test]
    fn test_rule_problems_accumulate() {
        let report = run(json!({
            "conditions": [
                {"field": "", "operator": "equals", "value": 1},
                {"field": "lead.score", "operator": "between", "value": 1},
                {"field": "lead.tags", "operator": "not_in", "value": "vip"},
                "lead.status == hot"
            ]
        }));
        assert_eq!(
            report.errors,
            vec![
                "condition node c1 rule 1 requires a field",
                "condition node c1 rule 2 has unknown operator 'between'",
                "condition node c1 rule 3 operator 'not_in' requires a list value",
                "condition node c1 rule 4 must be an object",
            ]
        );
    }

    #[test]
    fn test_parse_rules() {
        let config = json!({
            "conditions": [{"field": "lead.score", "operator": "greater_than", "value": 80}]
        });
        let rules = parse_rules(config.as_object().unwrap()).unwrap();
        assert_eq!(
            rules,
            vec![ConditionRule::new("lead.score", ConditionOperator::GreaterThan, json!(80))]
        );

        let bad = json!({"conditions": [{"field": "x", "operator": "nope"}]});
        assert!(parse_rules(bad.as_object().unwrap()).is_none());
    }

    #[test]
    fn test_default_config() {
        let config = ConditionContract.default_config(None);
        assert_eq!(Value::Object(config), json!({"type": "if", "conditions": []}));
    }
}
