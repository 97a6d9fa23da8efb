use super::profile::ProfileId;
use serde::{Deserialize, Serialize};

pub type ContractId = u32;

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum ContractStatus {
    New,
    InProgress,
    Terminated,
}

/// An agreement between a client and a contractor. Contracts are created
/// externally and are read-only inside the payment core.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Contract {
    pub id: ContractId,
    pub client_id: ProfileId,
    pub contractor_id: ProfileId,
    pub status: ContractStatus,
    pub terms: String,
}

impl Contract {
    /// Both parties can see the contract; nobody else can tell it exists.
    pub fn involves(&self, profile: ProfileId) -> bool {
        self.client_id == profile || self.contractor_id == profile
    }

    pub fn is_active(&self) -> bool {
        self.status == ContractStatus::InProgress
    }
}
