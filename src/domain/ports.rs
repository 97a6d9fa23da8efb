use super::contract::{Contract, ContractId};
use super::job::{Job, JobId};
use super::money::Amount;
use super::profile::{Profile, ProfileId};
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;

pub type LedgerRef = Arc<dyn Ledger>;
pub type TxBox = Box<dyn LedgerTx>;

/// Durable storage of profiles, contracts and jobs.
///
/// Plain reads observe committed state only. Anything that mutates a balance
/// or settles a job must go through a transaction obtained from [`begin`].
///
/// [`begin`]: Ledger::begin
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Opens an exclusive transaction. Waits a bounded time for concurrent
    /// transactions to finish and fails with `TransientStore` on timeout.
    async fn begin(&self) -> Result<TxBox>;

    async fn profile(&self, id: ProfileId) -> Result<Option<Profile>>;
    /// Every profile, ordered by id.
    async fn profiles(&self) -> Result<Vec<Profile>>;
    async fn contract(&self, id: ContractId) -> Result<Option<Contract>>;
    /// Contracts where the given profile is client or contractor.
    async fn contracts_of(&self, party: ProfileId) -> Result<Vec<Contract>>;
    /// Jobs joined with their contract, for contracts involving the profile.
    async fn jobs_of(&self, party: ProfileId) -> Result<Vec<(Job, Contract)>>;
    /// All settled jobs joined with their contract.
    async fn paid_jobs(&self) -> Result<Vec<(Job, Contract)>>;

    async fn put_profile(&self, profile: Profile) -> Result<()>;
    async fn put_contract(&self, contract: Contract) -> Result<()>;
    async fn put_job(&self, job: Job) -> Result<()>;
}

/// A scoped, serializable unit of work against the ledger.
///
/// Balance changes are staged as deltas and applied relative to the stored
/// value when [`commit`] runs; that is also where the non-negative balance
/// and unpaid-job invariants are re-checked, so a decision made on stale
/// reads can never corrupt state. Dropping a transaction without committing
/// discards every staged write.
///
/// [`commit`]: LedgerTx::commit
#[async_trait]
pub trait LedgerTx: Send {
    async fn profile(&mut self, id: ProfileId) -> Result<Option<Profile>>;
    async fn contract(&mut self, id: ContractId) -> Result<Option<Contract>>;
    async fn job(&mut self, id: JobId) -> Result<Option<Job>>;
    /// Sum of unpaid job prices across the client's contracts, regardless of
    /// contract status. Zero when the client has no open jobs.
    async fn unpaid_total(&mut self, client: ProfileId) -> Result<Decimal>;

    /// Stages an increment of the profile's balance.
    fn credit(&mut self, profile: ProfileId, amount: Amount);
    /// Stages a decrement of the profile's balance.
    fn debit(&mut self, profile: ProfileId, amount: Amount);
    /// Stages the settlement of a job.
    fn mark_paid(&mut self, job: JobId, at: DateTime<Utc>);

    /// Applies every staged write atomically, or none of them.
    async fn commit(self: Box<Self>) -> Result<()>;
}
