use crate::domain::contract::{Contract, ContractId, ContractStatus};
use crate::domain::job::Job;
use crate::domain::ports::LedgerRef;
use crate::domain::profile::{Profile, ProfileId};
use crate::error::{MarketError, Result};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Inclusive calendar-date range for the reporting queries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// Parses `YYYY-MM-DD` bounds. Both are required and validated before
    /// any query runs.
    pub fn parse(start: Option<&str>, end: Option<&str>) -> Result<Self> {
        let (Some(start), Some(end)) = (start, end) else {
            return Err(MarketError::Validation("provide start & end date".into()));
        };
        let parse_day = |raw: &str| {
            NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|_| {
                MarketError::Validation(format!(
                    "provide valid start & end date (YYYY-MM-DD), got {raw:?}"
                ))
            })
        };
        Ok(Self {
            start: parse_day(start)?,
            end: parse_day(end)?,
        })
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        let day = at.date_naive();
        self.start <= day && day <= self.end
    }
}

#[derive(Debug, Serialize, PartialEq)]
pub struct ProfessionEarnings {
    pub profession: String,
    pub total: Decimal,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct ClientSpending {
    pub id: ProfileId,
    pub full_name: String,
    pub paid: Decimal,
}

/// Default number of clients returned by [`Reporting::best_clients`].
pub const DEFAULT_BEST_CLIENTS_LIMIT: usize = 2;

/// Read-only marketplace queries.
///
/// These never open a ledger transaction; they observe committed state only
/// and take no part in the financial consistency guarantees.
pub struct Reporting {
    ledger: LedgerRef,
}

impl Reporting {
    pub fn new(ledger: LedgerRef) -> Self {
        Self { ledger }
    }

    /// The contract, visible only to its two parties. A contract someone
    /// else owns is reported as missing rather than forbidden.
    pub async fn contract_for(&self, caller: ProfileId, id: ContractId) -> Result<Contract> {
        self.ledger
            .contract(id)
            .await?
            .filter(|contract| contract.involves(caller))
            .ok_or(MarketError::NotFound { entity: "contract", id })
    }

    /// The caller's non-terminated contracts, as client or contractor.
    pub async fn contracts_for(&self, caller: ProfileId) -> Result<Vec<Contract>> {
        let mut contracts = self.ledger.contracts_of(caller).await?;
        contracts.retain(|contract| contract.status != ContractStatus::Terminated);
        Ok(contracts)
    }

    /// Unpaid jobs on in-progress contracts where the caller is a party.
    pub async fn unpaid_jobs_for(&self, caller: ProfileId) -> Result<Vec<Job>> {
        let jobs = self.ledger.jobs_of(caller).await?;
        Ok(jobs
            .into_iter()
            .filter(|(job, contract)| !job.is_paid() && contract.is_active())
            .map(|(job, _)| job)
            .collect())
    }

    /// The profession that earned the most from jobs paid inside the range.
    pub async fn best_profession(&self, range: &DateRange) -> Result<ProfessionEarnings> {
        let totals = self.paid_totals(range, |contract| contract.contractor_id).await?;
        let profiles = self.profile_index().await?;

        let mut by_profession: HashMap<String, Decimal> = HashMap::new();
        for (contractor, total) in totals {
            let Some(profile) = profiles.get(&contractor) else {
                continue;
            };
            *by_profession.entry(profile.profession.clone()).or_default() += total;
        }

        by_profession
            .into_iter()
            // Ties break toward the lexicographically smaller profession so
            // the report is deterministic.
            .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(&a.0)))
            .map(|(profession, total)| ProfessionEarnings { profession, total })
            .ok_or(MarketError::NoData)
    }

    /// Top `limit` clients by paid job total inside the range.
    pub async fn best_clients(&self, range: &DateRange, limit: usize) -> Result<Vec<ClientSpending>> {
        let totals = self.paid_totals(range, |contract| contract.client_id).await?;
        let profiles = self.profile_index().await?;

        let mut ranked: Vec<ClientSpending> = totals
            .into_iter()
            .filter_map(|(client, paid)| {
                profiles.get(&client).map(|profile| ClientSpending {
                    id: client,
                    full_name: profile.full_name(),
                    paid,
                })
            })
            .collect();
        if ranked.is_empty() {
            return Err(MarketError::NoData);
        }
        ranked.sort_by(|a, b| b.paid.cmp(&a.paid).then(a.id.cmp(&b.id)));
        ranked.truncate(limit);
        Ok(ranked)
    }

    async fn paid_totals(
        &self,
        range: &DateRange,
        party: impl Fn(&Contract) -> ProfileId,
    ) -> Result<HashMap<ProfileId, Decimal>> {
        let mut totals = HashMap::new();
        for (job, contract) in self.ledger.paid_jobs().await? {
            if job.paid_on.is_some_and(|at| range.contains(at)) {
                *totals.entry(party(&contract)).or_default() += job.price.value();
            }
        }
        Ok(totals)
    }

    async fn profile_index(&self) -> Result<HashMap<ProfileId, Profile>> {
        Ok(self
            .ledger
            .profiles()
            .await?
            .into_iter()
            .map(|profile| (profile.id, profile))
            .collect())
    }
}
