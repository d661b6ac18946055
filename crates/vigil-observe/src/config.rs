//! Registry configuration

use serde::{Deserialize, Serialize};

use crate::CostModel;

/// Registry configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Costs behind the diagnostic memory estimate
    pub cost_model: CostModel,
    /// Log the platform support matrix when the registry is created
    pub log_support_on_init: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            cost_model: CostModel::default(),
            log_support_on_init: true,
        }
    }
}

impl RegistryConfig {
    /// Parse from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json() {
        let config = RegistryConfig::from_json(r#"{ "cost_model": { "per_target": 256 } }"#).unwrap();
        assert_eq!(config.cost_model.per_target, 256);
        assert_eq!(config.cost_model.per_watcher, 1024);
        assert!(config.log_support_on_init);
    }

    #[test]
    fn test_empty_json() {
        assert_eq!(RegistryConfig::from_json("{}").unwrap(), RegistryConfig::default());
    }
}
