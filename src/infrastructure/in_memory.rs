use crate::domain::contract::{Contract, ContractId};
use crate::domain::job::{Job, JobId};
use crate::domain::money::Amount;
use crate::domain::ports::{Ledger, LedgerTx, TxBox};
use crate::domain::profile::{Profile, ProfileId};
use crate::error::{MarketError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Default)]
struct LedgerState {
    profiles: HashMap<ProfileId, Profile>,
    contracts: HashMap<ContractId, Contract>,
    jobs: HashMap<JobId, Job>,
}

/// In-memory ledger.
///
/// One mutex over the whole state serializes transactions, which makes every
/// transaction trivially serializable: a transaction's reads cannot go stale
/// before its commit. Plain reads take the same lock briefly and therefore
/// always observe committed state.
#[derive(Clone)]
pub struct InMemoryLedger {
    state: Arc<Mutex<LedgerState>>,
    lock_wait: Duration,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::with_lock_wait(Duration::from_secs(5))
    }

    pub fn with_lock_wait(lock_wait: Duration) -> Self {
        Self {
            state: Arc::new(Mutex::new(LedgerState::default())),
            lock_wait,
        }
    }
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Ledger for InMemoryLedger {
    async fn begin(&self) -> Result<TxBox> {
        let guard = tokio::time::timeout(self.lock_wait, self.state.clone().lock_owned())
            .await
            .map_err(|_| {
                MarketError::TransientStore(
                    "timed out waiting for a concurrent transaction".into(),
                )
            })?;
        Ok(Box::new(InMemoryTx {
            state: guard,
            deltas: HashMap::new(),
            settled: HashMap::new(),
        }))
    }

    async fn profile(&self, id: ProfileId) -> Result<Option<Profile>> {
        Ok(self.state.lock().await.profiles.get(&id).cloned())
    }

    async fn profiles(&self) -> Result<Vec<Profile>> {
        let state = self.state.lock().await;
        let mut profiles: Vec<Profile> = state.profiles.values().cloned().collect();
        profiles.sort_by_key(|profile| profile.id);
        Ok(profiles)
    }

    async fn contract(&self, id: ContractId) -> Result<Option<Contract>> {
        Ok(self.state.lock().await.contracts.get(&id).cloned())
    }

    async fn contracts_of(&self, party: ProfileId) -> Result<Vec<Contract>> {
        let state = self.state.lock().await;
        let mut contracts: Vec<Contract> = state
            .contracts
            .values()
            .filter(|contract| contract.involves(party))
            .cloned()
            .collect();
        contracts.sort_by_key(|contract| contract.id);
        Ok(contracts)
    }

    async fn jobs_of(&self, party: ProfileId) -> Result<Vec<(Job, Contract)>> {
        let state = self.state.lock().await;
        let mut jobs: Vec<(Job, Contract)> = state
            .jobs
            .values()
            .filter_map(|job| {
                let contract = state.contracts.get(&job.contract_id)?;
                contract
                    .involves(party)
                    .then(|| (job.clone(), contract.clone()))
            })
            .collect();
        jobs.sort_by_key(|(job, _)| job.id);
        Ok(jobs)
    }

    async fn paid_jobs(&self) -> Result<Vec<(Job, Contract)>> {
        let state = self.state.lock().await;
        Ok(state
            .jobs
            .values()
            .filter(|job| job.is_paid())
            .filter_map(|job| {
                let contract = state.contracts.get(&job.contract_id)?;
                Some((job.clone(), contract.clone()))
            })
            .collect())
    }

    async fn put_profile(&self, profile: Profile) -> Result<()> {
        self.state.lock().await.profiles.insert(profile.id, profile);
        Ok(())
    }

    async fn put_contract(&self, contract: Contract) -> Result<()> {
        self.state
            .lock()
            .await
            .contracts
            .insert(contract.id, contract);
        Ok(())
    }

    async fn put_job(&self, job: Job) -> Result<()> {
        self.state.lock().await.jobs.insert(job.id, job);
        Ok(())
    }
}

/// A transaction over the in-memory ledger.
///
/// Holds the state lock for its whole lifetime, so no other transaction or
/// read can interleave between its reads and its commit. Staged writes live
/// outside the state and are simply dropped on rollback.
struct InMemoryTx {
    state: OwnedMutexGuard<LedgerState>,
    deltas: HashMap<ProfileId, Decimal>,
    settled: HashMap<JobId, DateTime<Utc>>,
}

#[async_trait]
impl LedgerTx for InMemoryTx {
    async fn profile(&mut self, id: ProfileId) -> Result<Option<Profile>> {
        Ok(self.state.profiles.get(&id).cloned())
    }

    async fn contract(&mut self, id: ContractId) -> Result<Option<Contract>> {
        Ok(self.state.contracts.get(&id).cloned())
    }

    async fn job(&mut self, id: JobId) -> Result<Option<Job>> {
        Ok(self.state.jobs.get(&id).cloned())
    }

    async fn unpaid_total(&mut self, client: ProfileId) -> Result<Decimal> {
        let state = &*self.state;
        Ok(state
            .jobs
            .values()
            .filter(|job| !job.is_paid())
            .filter(|job| {
                state
                    .contracts
                    .get(&job.contract_id)
                    .is_some_and(|contract| contract.client_id == client)
            })
            .map(|job| job.price.value())
            .sum())
    }

    fn credit(&mut self, profile: ProfileId, amount: Amount) {
        *self.deltas.entry(profile).or_default() += amount.value();
    }

    fn debit(&mut self, profile: ProfileId, amount: Amount) {
        *self.deltas.entry(profile).or_default() -= amount.value();
    }

    fn mark_paid(&mut self, job: JobId, at: DateTime<Utc>) {
        self.settled.insert(job, at);
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let Self {
            mut state,
            deltas,
            settled,
        } = *self;

        // Validate everything before applying anything, so a rejected commit
        // leaves no partial writes behind.
        for (&id, &delta) in &deltas {
            let profile = state
                .profiles
                .get(&id)
                .ok_or(MarketError::NotFound { entity: "profile", id })?;
            if profile.balance.0 + delta < Decimal::ZERO {
                return Err(MarketError::InsufficientBalance { profile: id });
            }
        }
        for &id in settled.keys() {
            match state.jobs.get(&id) {
                None => return Err(MarketError::NotFound { entity: "job", id }),
                Some(job) if job.is_paid() => return Err(MarketError::AlreadyPaid(id)),
                Some(_) => {}
            }
        }

        for (&id, &delta) in &deltas {
            if let Some(profile) = state.profiles.get_mut(&id) {
                profile.balance.0 += delta;
            }
        }
        for (&id, &at) in &settled {
            if let Some(job) = state.jobs.get_mut(&id) {
                job.paid_on = Some(at);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::contract::ContractStatus;
    use crate::domain::money::Balance;
    use crate::domain::profile::ProfileKind;
    use rust_decimal_macros::dec;

    fn profile(id: ProfileId, balance: Decimal) -> Profile {
        Profile {
            id,
            kind: ProfileKind::Client,
            first_name: "Test".into(),
            last_name: format!("Profile{id}"),
            profession: "tester".into(),
            balance: Balance::new(balance),
        }
    }

    fn job(id: JobId, contract_id: ContractId, price: Decimal) -> Job {
        Job {
            id,
            contract_id,
            description: "work".into(),
            price: Amount::new(price).unwrap(),
            paid_on: None,
        }
    }

    #[tokio::test]
    async fn test_put_and_get() {
        let ledger = InMemoryLedger::new();
        ledger.put_profile(profile(1, dec!(100))).await.unwrap();

        let stored = ledger.profile(1).await.unwrap().unwrap();
        assert_eq!(stored.balance, Balance::new(dec!(100)));
        assert!(ledger.profile(2).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_commit_applies_deltas() {
        let ledger = InMemoryLedger::new();
        ledger.put_profile(profile(1, dec!(100))).await.unwrap();
        ledger.put_profile(profile(2, dec!(0))).await.unwrap();

        let mut tx = ledger.begin().await.unwrap();
        tx.debit(1, Amount::new(dec!(40)).unwrap());
        tx.credit(2, Amount::new(dec!(40)).unwrap());
        tx.commit().await.unwrap();

        assert_eq!(
            ledger.profile(1).await.unwrap().unwrap().balance,
            Balance::new(dec!(60))
        );
        assert_eq!(
            ledger.profile(2).await.unwrap().unwrap().balance,
            Balance::new(dec!(40))
        );
    }

    #[tokio::test]
    async fn test_dropped_transaction_rolls_back() {
        let ledger = InMemoryLedger::new();
        ledger.put_profile(profile(1, dec!(100))).await.unwrap();

        {
            let mut tx = ledger.begin().await.unwrap();
            tx.debit(1, Amount::new(dec!(40)).unwrap());
            // dropped without commit
        }

        assert_eq!(
            ledger.profile(1).await.unwrap().unwrap().balance,
            Balance::new(dec!(100))
        );
    }

    #[tokio::test]
    async fn test_commit_rejects_overdraft() {
        let ledger = InMemoryLedger::new();
        ledger.put_profile(profile(1, dec!(10))).await.unwrap();
        ledger.put_profile(profile(2, dec!(0))).await.unwrap();

        let mut tx = ledger.begin().await.unwrap();
        tx.debit(1, Amount::new(dec!(40)).unwrap());
        tx.credit(2, Amount::new(dec!(40)).unwrap());
        let result = tx.commit().await;

        assert!(matches!(
            result,
            Err(MarketError::InsufficientBalance { profile: 1 })
        ));
        assert_eq!(
            ledger.profile(1).await.unwrap().unwrap().balance,
            Balance::new(dec!(10))
        );
        assert_eq!(
            ledger.profile(2).await.unwrap().unwrap().balance,
            Balance::new(dec!(0))
        );
    }

    #[tokio::test]
    async fn test_commit_rejects_double_settlement() {
        let ledger = InMemoryLedger::new();
        ledger.put_job(job(7, 1, dec!(50))).await.unwrap();

        let mut tx = ledger.begin().await.unwrap();
        tx.mark_paid(7, Utc::now());
        tx.commit().await.unwrap();

        let mut tx = ledger.begin().await.unwrap();
        tx.mark_paid(7, Utc::now());
        assert!(matches!(
            tx.commit().await,
            Err(MarketError::AlreadyPaid(7))
        ));
    }

    #[tokio::test]
    async fn test_begin_times_out_while_transaction_open() {
        let ledger = InMemoryLedger::with_lock_wait(Duration::from_millis(20));
        let _open = ledger.begin().await.unwrap();

        let result = ledger.begin().await;
        assert!(matches!(result, Err(MarketError::TransientStore(_))));
    }

    #[tokio::test]
    async fn test_unpaid_total_ignores_contract_status() {
        let ledger = InMemoryLedger::new();
        ledger
            .put_contract(Contract {
                id: 1,
                client_id: 1,
                contractor_id: 5,
                status: ContractStatus::Terminated,
                terms: "done".into(),
            })
            .await
            .unwrap();
        ledger
            .put_contract(Contract {
                id: 2,
                client_id: 1,
                contractor_id: 6,
                status: ContractStatus::InProgress,
                terms: "ongoing".into(),
            })
            .await
            .unwrap();
        ledger.put_job(job(1, 1, dec!(102))).await.unwrap();
        ledger.put_job(job(2, 2, dec!(200))).await.unwrap();
        let mut paid = job(3, 2, dec!(999));
        paid.paid_on = Some(Utc::now());
        ledger.put_job(paid).await.unwrap();

        let mut tx = ledger.begin().await.unwrap();
        assert_eq!(tx.unpaid_total(1).await.unwrap(), dec!(302));
        assert_eq!(tx.unpaid_total(42).await.unwrap(), Decimal::ZERO);
    }
}
