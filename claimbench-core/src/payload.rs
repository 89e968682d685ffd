//! Deterministic claim payload generation
//!
//! Payloads are a pure function of the virtual-user id, the iteration number
//! and the configured identifier pools. Two runs with the same scheduling
//! parameters therefore touch the same identifiers in the same order, which is
//! what makes post-hoc correlation debugging possible.

use crate::error::{CoreError, Result};
use crate::types::{CommunicationPattern, VuIdentity};
use serde::{Deserialize, Serialize};

/// Amount reported on every generated claim
pub const DEFAULT_REPORTED_AMOUNT: f64 = 1000.0;

/// Claim submission body, shared by the HTTP and gRPC transports
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimPayload {
    pub policy_id: String,
    pub customer_id: String,
    pub description: String,
    pub reported_amount: f64,
}

/// Pick an element of `pool` at index `(vu_id + iteration) mod |pool|`.
pub fn select<'a, T>(pool: &'a [T], vu_id: u64, iteration: u64) -> Result<&'a T> {
    if pool.is_empty() {
        return Err(CoreError::EmptyPool {
            pool: "selection".to_string(),
        });
    }
    let len = pool.len() as u64;
    let index = (vu_id % len + iteration % len) % len;
    Ok(&pool[index as usize])
}

/// Builds claim payloads from identifier pools
#[derive(Debug, Clone)]
pub struct PayloadGenerator {
    policy_ids: Vec<String>,
    customer_ids: Vec<String>,
    pattern: CommunicationPattern,
    reported_amount: f64,
}

impl PayloadGenerator {
    /// Create a generator; both pools must be non-empty.
    pub fn new(
        policy_ids: Vec<String>,
        customer_ids: Vec<String>,
        pattern: CommunicationPattern,
    ) -> Result<Self> {
        if policy_ids.is_empty() {
            return Err(CoreError::EmptyPool {
                pool: "policy_ids".to_string(),
            });
        }
        if customer_ids.is_empty() {
            return Err(CoreError::EmptyPool {
                pool: "customer_ids".to_string(),
            });
        }

        Ok(Self {
            policy_ids,
            customer_ids,
            pattern,
            reported_amount: DEFAULT_REPORTED_AMOUNT,
        })
    }

    pub fn pattern(&self) -> CommunicationPattern {
        self.pattern
    }

    /// Build the payload for one iteration of one virtual user
    pub fn build(&self, identity: &VuIdentity) -> ClaimPayload {
        // Pools are validated non-empty in `new`, so indexing cannot fail here.
        let policy_index = pool_index(self.policy_ids.len(), identity);
        let customer_index = pool_index(self.customer_ids.len(), identity);

        ClaimPayload {
            policy_id: self.policy_ids[policy_index].clone(),
            customer_id: self.customer_ids[customer_index].clone(),
            description: format!(
                "SubmitClaim ({}) run={}|vu={}|it={}",
                self.pattern, identity.test_run, identity.vu_id, identity.iteration_in_test
            ),
            reported_amount: self.reported_amount,
        }
    }
}

fn pool_index(len: usize, identity: &VuIdentity) -> usize {
    let len = len as u64;
    ((identity.vu_id % len + identity.iteration_in_test % len) % len) as usize
}
