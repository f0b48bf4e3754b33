//! Delay node contract

use serde_json::Value;

use super::{positive_int, ContractReport, NodeContract};
use crate::types::{NodeConfig, NodeKind};

/// Contract for `delay` nodes. `delay` is a duration in milliseconds.
#[derive(Debug, Clone, Copy, Default)]
pub struct DelayContract;

impl DelayContract {
    /// Configured delay in milliseconds, if valid
    pub fn delay_ms(config: &NodeConfig) -> Option<u64> {
        positive_int(config, "delay")
    }
}

impl NodeContract for DelayContract {
    fn kind(&self) -> NodeKind {
        NodeKind::Delay
    }

    fn subtypes(&self) -> &'static [&'static str] {
        &[]
    }

    fn default_config(&self, _subtype: Option<&str>) -> NodeConfig {
        let mut config = NodeConfig::new();
        config.insert("delay".to_string(), Value::from(0u64));
        config
    }

    fn validate(&self, node_id: &str, config: &NodeConfig, report: &mut ContractReport) {
        if Self::delay_ms(config).is_none() {
            report.error(format!(
                "delay node {} requires a positive delay in milliseconds",
                node_id
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_delay_must_be_positive_integer() {
        for bad in [json!({}), json!({"delay": 0}), json!({"delay": -5}), json!({"delay": 1.5}), json!({"delay": "60000"})] {
            let mut report = ContractReport::default();
            DelayContract.validate("d1", bad.as_object().unwrap(), &mut report);
            assert_eq!(report.errors.len(), 1, "{} should be rejected", bad);
        }

        let mut report = ContractReport::default();
        DelayContract.validate("d1", json!({"delay": 3_600_000}).as_object().unwrap(), &mut report);
        assert!(report.is_clean());
    }

    #[test]
    fn test_default_config_is_unset_delay() {
        let config = DelayContract.default_config(None);
        assert_eq!(config.get("delay"), Some(&json!(0)));
        assert!(DelayContract::delay_ms(&config).is_none());
    }
}
