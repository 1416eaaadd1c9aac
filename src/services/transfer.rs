//! Transfer orchestration: two balance updates and the transfer record,
//! committed or rolled back as one unit of work.

use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::account::Account;
use crate::models::transfer::{NewTransfer, Transfer};
use crate::services::ledger::{self, LedgerError};
use crate::store::{self, StoreError, UnitOfWork};

/// Upper bound on waiting for the two row locks. Contention past this
/// surfaces as [`TransferError::Busy`] with nothing committed.
const LOCK_WAIT: &str = "2s";

#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("cannot transfer from an account to itself")]
    SelfTransfer,
    #[error("amount must be at least 1")]
    InvalidAmount,
    #[error("account not found")]
    NotFound,
    #[error("insufficient funds on the sending account")]
    InsufficientFunds,
    #[error("account row is held by a concurrent transfer")]
    Busy,
    #[error(transparent)]
    Store(StoreError),
}

impl TransferError {
    /// Business-rule rejection, as opposed to a system fault. Rejections are
    /// final; `Busy` is the one outcome a caller may reasonably retry.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            TransferError::SelfTransfer
                | TransferError::InvalidAmount
                | TransferError::NotFound
                | TransferError::InsufficientFunds
        )
    }
}

impl From<StoreError> for TransferError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => TransferError::NotFound,
            StoreError::Busy => TransferError::Busy,
            other => TransferError::Store(other),
        }
    }
}

impl From<LedgerError> for TransferError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::NotFound => TransferError::NotFound,
            LedgerError::InsufficientFunds => TransferError::InsufficientFunds,
            LedgerError::Store(store) => TransferError::from(store),
        }
    }
}

/// Checks that need no storage access. Amounts below one unit are rejected,
/// matching the minimum transfer size.
fn validate(from: Uuid, to: Uuid, amount: Decimal) -> Result<(), TransferError> {
    if from == to {
        return Err(TransferError::SelfTransfer);
    }
    if amount < Decimal::ONE {
        return Err(TransferError::InvalidAmount);
    }
    Ok(())
}

/// Ascending-byte order, so every transfer touching the same pair of accounts
/// locks them in the same sequence regardless of direction.
fn lock_order(a: Uuid, b: Uuid) -> (Uuid, Uuid) {
    if a.as_bytes() <= b.as_bytes() {
        (a, b)
    } else {
        (b, a)
    }
}

/// Moves `amount` from one account to another.
///
/// Everything after validation happens inside one Postgres transaction: both
/// rows are locked in deterministic order, the sender's balance is checked
/// under its lock, both adjustments are applied, and the transfer record is
/// inserted before the single commit. Every error path drops the unit of
/// work, which rolls it back, so callers observe either the whole transfer or
/// nothing.
pub async fn execute(
    pool: &PgPool,
    from: Uuid,
    to: Uuid,
    amount: Decimal,
) -> Result<Transfer, TransferError> {
    validate(from, to, amount)?;

    let mut uow: UnitOfWork<'_> = pool.begin().await.map_err(StoreError::from)?;
    sqlx::query(&format!("SET LOCAL lock_timeout = '{LOCK_WAIT}'"))
        .execute(&mut *uow)
        .await
        .map_err(StoreError::from)?;

    // Take both locks before any balance decision.
    let (first, second) = lock_order(from, to);
    let first_row: Account = store::fetch_locked(&mut uow, first)
        .await?
        .ok_or(TransferError::NotFound)?;
    let second_row: Account = store::fetch_locked(&mut uow, second)
        .await?
        .ok_or(TransferError::NotFound)?;

    let sender = if first_row.id == from {
        &first_row
    } else {
        &second_row
    };
    if sender.balance < amount {
        return Err(TransferError::InsufficientFunds);
    }

    ledger::adjust_balance(&mut uow, from, -amount).await?;
    ledger::adjust_balance(&mut uow, to, amount).await?;

    let record = store::create(
        &mut *uow,
        &NewTransfer {
            from_account: from,
            to_account: to,
            amount,
        },
    )
    .await?;

    uow.commit().await.map_err(StoreError::from)?;
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_order_is_direction_independent() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert_eq!(lock_order(a, b), lock_order(b, a));
        let (first, second) = lock_order(a, b);
        assert!(first.as_bytes() <= second.as_bytes());
    }

    #[test]
    fn self_transfer_rejected_before_storage() {
        let a = Uuid::new_v4();
        assert!(matches!(
            validate(a, a, Decimal::new(10, 0)),
            Err(TransferError::SelfTransfer)
        ));
    }

    #[test]
    fn amounts_below_one_unit_rejected() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert!(matches!(
            validate(a, b, Decimal::ZERO),
            Err(TransferError::InvalidAmount)
        ));
        assert!(matches!(
            validate(a, b, Decimal::new(-5, 0)),
            Err(TransferError::InvalidAmount)
        ));
        assert!(matches!(
            validate(a, b, Decimal::new(5, 1)),
            Err(TransferError::InvalidAmount)
        ));
        assert!(validate(a, b, Decimal::ONE).is_ok());
    }

    #[test]
    fn rejections_are_distinguished_from_faults() {
        assert!(TransferError::InsufficientFunds.is_rejection());
        assert!(TransferError::SelfTransfer.is_rejection());
        assert!(!TransferError::Busy.is_rejection());
        assert!(!TransferError::Store(StoreError::Ambiguous).is_rejection());
    }

    #[test]
    fn lock_timeouts_map_to_busy() {
        assert!(matches!(
            TransferError::from(StoreError::Busy),
            TransferError::Busy
        ));
        assert!(matches!(
            TransferError::from(LedgerError::InsufficientFunds),
            TransferError::InsufficientFunds
        ));
    }
}
