use crate::domain::job::JobId;
use crate::domain::money::Amount;
use crate::domain::ports::{LedgerRef, TxBox};
use crate::domain::profile::{Profile, ProfileId};
use crate::error::{MarketError, Result};
use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{debug, info};

/// Executes the money-moving operations of the marketplace.
///
/// Every operation runs inside a single ledger transaction: authorization
/// checks, balance deltas and the job settlement flag commit together or not
/// at all. Rejections happen before the commit, and a failed commit drops
/// the transaction whole, so no operation ever leaves a balance or paid flag
/// half-updated.
pub struct PaymentEngine {
    ledger: LedgerRef,
}

impl PaymentEngine {
    pub fn new(ledger: LedgerRef) -> Self {
        Self { ledger }
    }

    /// Moves `amount` between two distinct existing profiles.
    pub async fn transfer(&self, from: ProfileId, to: ProfileId, amount: Amount) -> Result<()> {
        let mut tx = self.ledger.begin().await?;
        let source = require_profile(&mut tx, from).await?;
        require_profile(&mut tx, to).await?;
        if !source.balance.covers(amount) {
            return Err(MarketError::InsufficientBalance { profile: from });
        }
        stage_transfer(&mut tx, from, to, amount)?;
        tx.commit().await?;
        debug!(from, to, %amount, "transfer committed");
        Ok(())
    }

    /// Pays a job on behalf of `caller`, who must be the client on the
    /// job's contract. The price moves from the client to the contractor and
    /// the job is settled, atomically.
    pub async fn pay_job(&self, caller: ProfileId, job_id: JobId) -> Result<()> {
        let mut tx = self.ledger.begin().await?;
        let job = tx
            .job(job_id)
            .await?
            .ok_or(MarketError::NotFound { entity: "job", id: job_id })?;
        if job.is_paid() {
            return Err(MarketError::AlreadyPaid(job_id));
        }
        let contract = tx.contract(job.contract_id).await?.ok_or(MarketError::NotFound {
            entity: "contract",
            id: job.contract_id,
        })?;
        if contract.client_id != caller {
            return Err(MarketError::Unauthorized(caller));
        }
        let client = require_profile(&mut tx, contract.client_id).await?;
        require_profile(&mut tx, contract.contractor_id).await?;
        if !client.balance.covers(job.price) {
            return Err(MarketError::InsufficientBalance { profile: client.id });
        }
        stage_transfer(&mut tx, contract.client_id, contract.contractor_id, job.price)?;
        tx.mark_paid(job_id, Utc::now());
        tx.commit().await?;
        info!(
            job = job_id,
            client = contract.client_id,
            contractor = contract.contractor_id,
            price = %job.price,
            "job paid"
        );
        Ok(())
    }

    /// Deposits `amount` from `caller` into a client's balance.
    ///
    /// A deposit must stay strictly below a quarter of the target client's
    /// outstanding unpaid jobs total. The total is recomputed inside the
    /// same transaction that commits the transfer, so a concurrent job
    /// payment cannot invalidate the cap decision.
    pub async fn deposit(&self, caller: ProfileId, target: ProfileId, amount: Decimal) -> Result<()> {
        let amount = Amount::new(amount)?;
        let mut tx = self.ledger.begin().await?;
        let depositor = require_profile(&mut tx, caller).await?;
        if !depositor.balance.covers(amount) {
            return Err(MarketError::InsufficientBalance { profile: caller });
        }
        let recipient = require_profile(&mut tx, target).await?;
        if !recipient.is_client() {
            return Err(MarketError::NotFound { entity: "client profile", id: target });
        }
        let outstanding = tx.unpaid_total(target).await?;
        if amount.value() >= outstanding / Decimal::from(4) {
            return Err(MarketError::DepositCapExceeded {
                amount: amount.value(),
                outstanding,
            });
        }
        stage_transfer(&mut tx, caller, target, amount)?;
        tx.commit().await?;
        info!(from = caller, to = target, %amount, "deposit committed");
        Ok(())
    }
}

async fn require_profile(tx: &mut TxBox, id: ProfileId) -> Result<Profile> {
    tx.profile(id)
        .await?
        .ok_or(MarketError::NotFound { entity: "profile", id })
}

/// Stages the two halves of a transfer. Both deltas land in the same
/// transaction, so conservation holds on every commit.
fn stage_transfer(tx: &mut TxBox, from: ProfileId, to: ProfileId, amount: Amount) -> Result<()> {
    if from == to {
        return Err(MarketError::Validation(
            "cannot transfer between a profile and itself".into(),
        ));
    }
    tx.debit(from, amount);
    tx.credit(to, amount);
    Ok(())
}
