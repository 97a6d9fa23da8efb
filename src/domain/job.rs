use super::contract::ContractId;
use super::money::Amount;
use crate::error::MarketError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type JobId = u32;

/// A unit of billable work under a contract.
///
/// `paid_on` doubles as the paid flag: `None` is an open job, `Some` records
/// the one moment it was settled. Price and settlement time never change
/// after that.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Job {
    pub id: JobId,
    pub contract_id: ContractId,
    pub description: String,
    pub price: Amount,
    #[serde(default)]
    pub paid_on: Option<DateTime<Utc>>,
}

impl Job {
    pub fn is_paid(&self) -> bool {
        self.paid_on.is_some()
    }

    /// Settles the job. A job can be paid at most once.
    pub fn mark_paid(&mut self, at: DateTime<Utc>) -> Result<(), MarketError> {
        if self.is_paid() {
            return Err(MarketError::AlreadyPaid(self.id));
        }
        self.paid_on = Some(at);
        Ok(())
    }
}
