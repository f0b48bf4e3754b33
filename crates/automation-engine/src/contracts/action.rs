//! Action node contract

use serde::{Deserialize, Serialize};

use super::{
    check_subtype, config_with_fields, require_str, ContractReport, MissingSubtype, NodeContract,
};
use crate::types::{NodeConfig, NodeKind};

/// CRM side effect performed by an action node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    SendMessage,
    UpdateLead,
    MovePipeline,
    AddTag,
    RemoveTag,
    AssignAgent,
    CreateTask,
    CreateEvent,
    SendWebhook,
    ExecuteCode,
    Wait,
}

const ACTION_TYPES: [&str; 11] = [
    "send_message",
    "update_lead",
    "move_pipeline",
    "add_tag",
    "remove_tag",
    "assign_agent",
    "create_task",
    "create_event",
    "send_webhook",
    "execute_code",
    "wait",
];

impl ActionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::SendMessage => "send_message",
            ActionType::UpdateLead => "update_lead",
            ActionType::MovePipeline => "move_pipeline",
            ActionType::AddTag => "add_tag",
            ActionType::RemoveTag => "remove_tag",
            ActionType::AssignAgent => "assign_agent",
            ActionType::CreateTask => "create_task",
            ActionType::CreateEvent => "create_event",
            ActionType::SendWebhook => "send_webhook",
            ActionType::ExecuteCode => "execute_code",
            ActionType::Wait => "wait",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        serde_json::from_value(serde_json::Value::String(name.to_string())).ok()
    }

    /// Config fields that must be non-empty for this action type
    pub fn required_fields(&self) -> &'static [&'static str] {
        match self {
            ActionType::SendMessage => &["channel", "content"],
            ActionType::AddTag | ActionType::RemoveTag => &["tag"],
            ActionType::ExecuteCode => &["code"],
            _ => &[],
        }
    }
}

/// Contract for `action` nodes
#[derive(Debug, Clone, Copy, Default)]
pub struct ActionContract;

impl NodeContract for ActionContract {
    fn kind(&self) -> NodeKind {
        NodeKind::Action
    }

    fn subtypes(&self) -> &'static [&'static str] {
        &ACTION_TYPES
    }

    fn default_config(&self, subtype: Option<&str>) -> NodeConfig {
        let fields = subtype
            .and_then(ActionType::from_name)
            .map(|t| t.required_fields())
            .unwrap_or_default();
        config_with_fields(subtype, fields)
    }

    fn validate(&self, node_id: &str, config: &NodeConfig, report: &mut ContractReport) {
        // A draft action without a type is tolerated but flagged
        let Some(action_type) = check_subtype(
            NodeKind::Action,
            node_id,
            config,
            &ACTION_TYPES,
            MissingSubtype::Warning,
            report,
        )
        .and_then(ActionType::from_name) else {
            return;
        };

        for field in action_type.required_fields() {
            require_str(NodeKind::Action, node_id, config, field, report);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn run(config: serde_json::Value) -> ContractReport {
        let mut report = ContractReport::default();
        ActionContract.validate("a1", config.as_object().unwrap(), &mut report);
        report
    }

    #[test]
    fn test_missing_type_is_warning() {
        let report = run(json!({}));
        assert!(report.errors.is_empty());
        assert_eq!(report.warnings, vec!["action node a1 has no action type configured"]);
    }

    #[test]
    fn test_send_message_requires_channel_and_content() {
        let report = run(json!({"type": "send_message", "channel": "", "content": " "}));
        assert_eq!(
            report.errors,
            vec![
                "action node a1 requires a non-empty 'channel'",
                "action node a1 requires a non-empty 'content'",
            ]
        );

        let report = run(json!({"type": "send_message", "channel": "sms", "content": "Hi {{lead.first_name}}"}));
        assert!(report.is_clean());
    }

    #[test]
    fn test_tag_actions_require_tag() {
        assert_eq!(run(json!({"type": "add_tag"})).errors.len(), 1);
        assert_eq!(run(json!({"type": "remove_tag", "tag": ""})).errors.len(), 1);
        assert!(run(json!({"type": "add_tag", "tag": "contacted"})).is_clean());
    }

    #[test]
    fn test_execute_code_requires_code() {
        let report = run(json!({"type": "execute_code"}));
        assert_eq!(report.errors, vec!["action node a1 requires a non-empty 'code'"]);
    }

    #[test]
    fn test_types_without_required_fields() {
        for name in ["update_lead", "assign_agent", "wait", "create_task"] {
            assert!(run(json!({"type": name})).is_clean(), "{} should be clean", name);
        }
    }

    #[test]
    fn test_unknown_type() {
        let report = run(json!({"type": "launch_rocket"}));
        assert_eq!(report.errors, vec!["action node a1 has unknown type 'launch_rocket'"]);
    }

    #[test]
    fn test_default_config() {
        let config = ActionContract.default_config(Some("send_message"));
        assert_eq!(
            serde_json::Value::Object(config),
            json!({"type": "send_message", "channel": "", "content": ""})
        );
    }
}
