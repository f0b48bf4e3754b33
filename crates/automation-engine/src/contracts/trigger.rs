//! Trigger node contract

use serde::{Deserialize, Serialize};

use super::{
    check_subtype, config_with_fields, non_empty_str, require_str, ContractReport,
    MissingSubtype, NodeContract,
};
use crate::types::{NodeConfig, NodeKind};

/// What starts a workflow run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerType {
    LeadCreated,
    LeadStatusChanged,
    LeadScoreChanged,
    TagAdded,
    TagRemoved,
    PropertyViewed,
    MessageReceived,
    /// Fires on a cron-like schedule
    Schedule,
    /// Fires when an inbound webhook is called
    Webhook,
    /// Started by hand from the dashboard
    Manual,
}

const TRIGGER_TYPES: [&str; 10] = [
    "lead_created",
    "lead_status_changed",
    "lead_score_changed",
    "tag_added",
    "tag_removed",
    "property_viewed",
    "message_received",
    "schedule",
    "webhook",
    "manual",
];

impl TriggerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerType::LeadCreated => "lead_created",
            TriggerType::LeadStatusChanged => "lead_status_changed",
            TriggerType::LeadScoreChanged => "lead_score_changed",
            TriggerType::TagAdded => "tag_added",
            TriggerType::TagRemoved => "tag_removed",
            TriggerType::PropertyViewed => "property_viewed",
            TriggerType::MessageReceived => "message_received",
            TriggerType::Schedule => "schedule",
            TriggerType::Webhook => "webhook",
            TriggerType::Manual => "manual",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        serde_json::from_value(serde_json::Value::String(name.to_string())).ok()
    }

    /// Config fields that must be non-empty for this trigger type
    pub fn required_fields(&self) -> &'static [&'static str] {
        match self {
            TriggerType::Schedule => &["cron"],
            TriggerType::Webhook => &["endpoint"],
            _ => &[],
        }
    }
}

/// Contract for `trigger` nodes
#[derive(Debug, Clone, Copy, Default)]
pub struct TriggerContract;

impl NodeContract for TriggerContract {
    fn kind(&self) -> NodeKind {
        NodeKind::Trigger
    }

    fn subtypes(&self) -> &'static [&'static str] {
        &TRIGGER_TYPES
    }

    fn default_config(&self, subtype: Option<&str>) -> NodeConfig {
        let fields = subtype
            .and_then(TriggerType::from_name)
            .map(|t| t.required_fields())
            .unwrap_or_default();
        config_with_fields(subtype, fields)
    }

    fn validate(&self, node_id: &str, config: &NodeConfig, report: &mut ContractReport) {
        let Some(subtype) = check_subtype(
            NodeKind::Trigger,
            node_id,
            config,
            &TRIGGER_TYPES,
            MissingSubtype::Error,
            report,
        ) else {
            return;
        };
        let Some(trigger_type) = TriggerType::from_name(subtype) else {
            return;
        };

        for field in trigger_type.required_fields() {
            require_str(NodeKind::Trigger, node_id, config, field, report);
        }

        if trigger_type == TriggerType::Schedule {
            if let Some(cron) = non_empty_str(config, "cron") {
                if !is_valid_cron(cron) {
                    report.error(format!(
                        "trigger node {} has an invalid cron schedule '{}'",
                        node_id, cron
                    ));
                }
            }
        }
    }
}

const CRON_MACROS: [&str; 7] = [
    "@yearly",
    "@annually",
    "@monthly",
    "@weekly",
    "@daily",
    "@midnight",
    "@hourly",
];

/// Check that `expr` looks like a cron schedule.
///
/// Accepts the common macros (`@daily`, ...) or 5/6 whitespace-separated
/// fields made of digits, names (`MON`, `JAN`) and the `* , - / ? L W #`
/// operators. Field ranges are not checked.
pub fn is_valid_cron(expr: &str) -> bool {
    let expr = expr.trim();
    if expr.starts_with('@') {
        return CRON_MACROS.contains(&expr);
    }

    let fields: Vec<&str> = expr.split_whitespace().collect();
    if !(5..=6).contains(&fields.len()) {
        return false;
    }

    fields.iter().all(|field| {
        field
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '*' | ',' | '-' | '/' | '?' | '#'))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn run(config: serde_json::Value) -> ContractReport {
        let mut report = ContractReport::default();
        TriggerContract.validate("t1", config.as_object().unwrap(), &mut report);
        report
    }

    #[test]
    fn test_manual_trigger_is_clean() {
        assert!(run(json!({"type": "manual"})).is_clean());
    }

    #[test]
    fn test_missing_type_is_error() {
        let report = run(json!({}));
        assert_eq!(report.errors, vec!["trigger node t1 has no trigger type configured"]);
    }

    #[test]
    fn test_schedule_requires_cron() {
        let report = run(json!({"type": "schedule", "cron": ""}));
        assert_eq!(report.errors, vec!["trigger node t1 requires a non-empty 'cron'"]);

        let report = run(json!({"type": "schedule", "cron": "every day"}));
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].contains("invalid cron schedule"));

        assert!(run(json!({"type": "schedule", "cron": "0 9 * * MON-FRI"})).is_clean());
    }

    #[test]
    fn test_webhook_requires_endpoint() {
        let report = run(json!({"type": "webhook"}));
        assert_eq!(report.errors, vec!["trigger node t1 requires a non-empty 'endpoint'"]);
        assert!(run(json!({"type": "webhook", "endpoint": "/hooks/lead"})).is_clean());
    }

    #[test]
    fn test_default_config_has_required_fields() {
        let config = TriggerContract.default_config(Some("schedule"));
        assert_eq!(config.get("type"), Some(&json!("schedule")));
        assert_eq!(config.get("cron"), Some(&json!("")));

        assert!(TriggerContract.default_config(None).is_empty());
    }

    #[test]
    fn test_is_valid_cron() {
        assert!(is_valid_cron("*/15 * * * *"));
        assert!(is_valid_cron("0 0 7 * * ?"));
        assert!(is_valid_cron("@daily"));
        assert!(!is_valid_cron("@sometimes"));
        assert!(!is_valid_cron("* * *"));
        assert!(!is_valid_cron("0 7 * * * * * *"));
        assert!(!is_valid_cron("0 7 * * $"));
    }

    #[test]
    fn test_trigger_type_names_round_trip() {
        for name in TRIGGER_TYPES {
            assert_eq!(TriggerType::from_name(name).unwrap().as_str(), name);
        }
        assert!(TriggerType::from_name("nope").is_none());
    }
}
