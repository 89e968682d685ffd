//! Identifier pools used to build claim payloads

use crate::error::ConfigResult;
use crate::validation::Validatable;
use serde::{Deserialize, Serialize};

/// Seed identifiers known to exist in the claims service
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub policy_ids: Vec<String>,
    pub customer_ids: Vec<String>,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            policy_ids: vec![
                "11111111-1111-1111-1111-111111111111".to_string(),
                "22222222-2222-2222-2222-222222222222".to_string(),
                "33333333-3333-3333-3333-333333333333".to_string(),
            ],
            customer_ids: vec![
                "11111111-1111-1111-1111-111111111111".to_string(),
                "22222222-2222-2222-2222-222222222222".to_string(),
            ],
        }
    }
}

impl Validatable for DataConfig {
    fn validate(&self) -> ConfigResult<()> {
        for (name, pool) in [("policy_ids", &self.policy_ids), ("customer_ids", &self.customer_ids)] {
            if pool.is_empty() {
                return Err(self.validation_error(format!("{} must contain at least one id", name)));
            }
            if pool.iter().any(|id| id.trim().is_empty()) {
                return Err(self.validation_error(format!("{} contains a blank id", name)));
            }
        }
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "data"
    }
}
