use crate::domain::contract::{Contract, ContractId};
use crate::domain::job::{Job, JobId};
use crate::domain::money::Amount;
use crate::domain::ports::{Ledger, LedgerTx, TxBox};
use crate::domain::profile::{Profile, ProfileId};
use crate::error::{MarketError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rocksdb::{ColumnFamilyDescriptor, DB, Options, WriteBatch};
use rust_decimal::Decimal;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Column Family for profile rows.
pub const CF_PROFILES: &str = "profiles";
/// Column Family for contract rows.
pub const CF_CONTRACTS: &str = "contracts";
/// Column Family for job rows.
pub const CF_JOBS: &str = "jobs";

impl From<rocksdb::Error> for MarketError {
    fn from(e: rocksdb::Error) -> Self {
        MarketError::TransientStore(e.to_string())
    }
}

/// Persistent ledger backed by RocksDB.
///
/// Rows are serde_json-encoded under big-endian id keys, one column family
/// per entity. A writer mutex serializes transactions and the staged writes
/// of a transaction land in a single `WriteBatch`, so a commit hits the disk
/// atomically. Plain reads go straight to the DB and see committed rows.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksLedger {
    db: Arc<DB>,
    write_lock: Arc<Mutex<()>>,
    lock_wait: Duration,
}

impl RocksLedger {
    /// Opens or creates a RocksDB instance at the specified path, ensuring
    /// the three entity column families exist.
    pub fn open<P: AsRef<Path>>(path: P, lock_wait: Duration) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let descriptors = vec![
            ColumnFamilyDescriptor::new(CF_PROFILES, Options::default()),
            ColumnFamilyDescriptor::new(CF_CONTRACTS, Options::default()),
            ColumnFamilyDescriptor::new(CF_JOBS, Options::default()),
        ];
        let db = DB::open_cf_descriptors(&opts, path, descriptors)?;

        Ok(Self {
            db: Arc::new(db),
            write_lock: Arc::new(Mutex::new(())),
            lock_wait,
        })
    }
}

fn cf<'a>(db: &'a DB, name: &'static str) -> Result<&'a rocksdb::ColumnFamily> {
    db.cf_handle(name)
        .ok_or_else(|| MarketError::TransientStore(format!("{name} column family not found")))
}

fn get_row<T: DeserializeOwned>(db: &DB, cf_name: &'static str, id: u32) -> Result<Option<T>> {
    let handle = cf(db, cf_name)?;
    match db.get_cf(handle, id.to_be_bytes())? {
        Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        None => Ok(None),
    }
}

fn put_row<T: Serialize>(db: &DB, cf_name: &'static str, id: u32, row: &T) -> Result<()> {
    let handle = cf(db, cf_name)?;
    db.put_cf(handle, id.to_be_bytes(), serde_json::to_vec(row)?)?;
    Ok(())
}

fn scan<T: DeserializeOwned>(db: &DB, cf_name: &'static str) -> Result<Vec<T>> {
    let handle = cf(db, cf_name)?;
    let mut rows = Vec::new();
    for item in db.iterator_cf(handle, rocksdb::IteratorMode::Start) {
        let (_key, value) = item?;
        rows.push(serde_json::from_slice(&value)?);
    }
    Ok(rows)
}

#[async_trait]
impl Ledger for RocksLedger {
    async fn begin(&self) -> Result<TxBox> {
        let guard = tokio::time::timeout(self.lock_wait, self.write_lock.clone().lock_owned())
            .await
            .map_err(|_| {
                MarketError::TransientStore(
                    "timed out waiting for a concurrent transaction".into(),
                )
            })?;
        Ok(Box::new(RocksTx {
            db: self.db.clone(),
            _guard: guard,
            deltas: HashMap::new(),
            settled: HashMap::new(),
        }))
    }

    async fn profile(&self, id: ProfileId) -> Result<Option<Profile>> {
        get_row(&self.db, CF_PROFILES, id)
    }

    async fn profiles(&self) -> Result<Vec<Profile>> {
        let mut profiles: Vec<Profile> = scan(&self.db, CF_PROFILES)?;
        profiles.sort_by_key(|profile| profile.id);
        Ok(profiles)
    }

    async fn contract(&self, id: ContractId) -> Result<Option<Contract>> {
        get_row(&self.db, CF_CONTRACTS, id)
    }

    async fn contracts_of(&self, party: ProfileId) -> Result<Vec<Contract>> {
        let mut contracts: Vec<Contract> = scan(&self.db, CF_CONTRACTS)?;
        contracts.retain(|contract| contract.involves(party));
        contracts.sort_by_key(|contract| contract.id);
        Ok(contracts)
    }

    async fn jobs_of(&self, party: ProfileId) -> Result<Vec<(Job, Contract)>> {
        let mut jobs = Vec::new();
        for job in scan::<Job>(&self.db, CF_JOBS)? {
            if let Some(contract) = get_row::<Contract>(&self.db, CF_CONTRACTS, job.contract_id)?
                && contract.involves(party)
            {
                jobs.push((job, contract));
            }
        }
        jobs.sort_by_key(|(job, _)| job.id);
        Ok(jobs)
    }

    async fn paid_jobs(&self) -> Result<Vec<(Job, Contract)>> {
        let mut jobs = Vec::new();
        for job in scan::<Job>(&self.db, CF_JOBS)? {
            if !job.is_paid() {
                continue;
            }
            if let Some(contract) = get_row::<Contract>(&self.db, CF_CONTRACTS, job.contract_id)? {
                jobs.push((job, contract));
            }
        }
        Ok(jobs)
    }

    async fn put_profile(&self, profile: Profile) -> Result<()> {
        put_row(&self.db, CF_PROFILES, profile.id, &profile)
    }

    async fn put_contract(&self, contract: Contract) -> Result<()> {
        put_row(&self.db, CF_CONTRACTS, contract.id, &contract)
    }

    async fn put_job(&self, job: Job) -> Result<()> {
        put_row(&self.db, CF_JOBS, job.id, &job)
    }
}

/// A transaction over the RocksDB ledger.
///
/// The writer lock is held for the transaction's lifetime, so the rows it
/// reads cannot change under it. Nothing is written until `commit`, which
/// re-validates and then flushes one atomic batch.
struct RocksTx {
    db: Arc<DB>,
    _guard: OwnedMutexGuard<()>,
    deltas: HashMap<ProfileId, Decimal>,
    settled: HashMap<JobId, DateTime<Utc>>,
}

#[async_trait]
impl LedgerTx for RocksTx {
    async fn profile(&mut self, id: ProfileId) -> Result<Option<Profile>> {
        get_row(&self.db, CF_PROFILES, id)
    }

    async fn contract(&mut self, id: ContractId) -> Result<Option<Contract>> {
        get_row(&self.db, CF_CONTRACTS, id)
    }

    async fn job(&mut self, id: JobId) -> Result<Option<Job>> {
        get_row(&self.db, CF_JOBS, id)
    }

    async fn unpaid_total(&mut self, client: ProfileId) -> Result<Decimal> {
        let mut total = Decimal::ZERO;
        for job in scan::<Job>(&self.db, CF_JOBS)? {
            if job.is_paid() {
                continue;
            }
            if let Some(contract) = get_row::<Contract>(&self.db, CF_CONTRACTS, job.contract_id)?
                && contract.client_id == client
            {
                total += job.price.value();
            }
        }
        Ok(total)
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
            db,
            _guard,
            deltas,
            settled,
        } = *self;

        let mut batch = WriteBatch::default();
        for (&id, &delta) in &deltas {
            let mut profile: Profile = get_row(&db, CF_PROFILES, id)?
                .ok_or(MarketError::NotFound { entity: "profile", id })?;
            let next = profile.balance.0 + delta;
            if next < Decimal::ZERO {
                return Err(MarketError::InsufficientBalance { profile: id });
            }
            profile.balance.0 = next;
            batch.put_cf(cf(&db, CF_PROFILES)?, id.to_be_bytes(), serde_json::to_vec(&profile)?);
        }
        for (&id, &at) in &settled {
            let mut job: Job = get_row(&db, CF_JOBS, id)?
                .ok_or(MarketError::NotFound { entity: "job", id })?;
            job.mark_paid(at)?;
            batch.put_cf(cf(&db, CF_JOBS)?, id.to_be_bytes(), serde_json::to_vec(&job)?);
        }
        db.write(batch)?;
        Ok(())
    }
}
