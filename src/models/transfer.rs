use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::store::{Entity, InsertRow, SqlValue};

/// An immutable record of a committed transfer. Written inside the same unit
/// of work as the two balance updates it describes; never patched afterwards,
/// so there is no `PatchRow` for it.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Transfer {
    pub id: Uuid,
    pub from_account: Uuid,
    pub to_account: Uuid,
    pub amount: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transfer {
    pub const ID: &'static str = "id";
    pub const FROM_ACCOUNT: &'static str = "from_account";
    pub const TO_ACCOUNT: &'static str = "to_account";
    pub const AMOUNT: &'static str = "amount";
    pub const CREATED_AT: &'static str = "created_at";
    pub const UPDATED_AT: &'static str = "updated_at";
}

impl Entity for Transfer {
    const TABLE: &'static str = "transfers";
    const COLUMNS: &'static [&'static str] = &[
        Transfer::ID,
        Transfer::FROM_ACCOUNT,
        Transfer::TO_ACCOUNT,
        Transfer::AMOUNT,
        Transfer::CREATED_AT,
        Transfer::UPDATED_AT,
    ];

    fn id(&self) -> Uuid {
        self.id
    }

    fn value_of(&self, column: &str) -> Option<SqlValue> {
        match column {
            Transfer::ID => Some(self.id.into()),
            Transfer::FROM_ACCOUNT => Some(self.from_account.into()),
            Transfer::TO_ACCOUNT => Some(self.to_account.into()),
            Transfer::AMOUNT => Some(self.amount.into()),
            Transfer::CREATED_AT => Some(self.created_at.into()),
            Transfer::UPDATED_AT => Some(self.updated_at.into()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewTransfer {
    pub from_account: Uuid,
    pub to_account: Uuid,
    pub amount: Decimal,
}

impl InsertRow for NewTransfer {
    type Entity = Transfer;

    fn columns(&self) -> &'static [&'static str] {
        &[
            Transfer::FROM_ACCOUNT,
            Transfer::TO_ACCOUNT,
            Transfer::AMOUNT,
        ]
    }

    fn values(&self) -> Vec<SqlValue> {
        vec![
            self.from_account.into(),
            self.to_account.into(),
            self.amount.into(),
        ]
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateTransferRequest {
    pub from_account: Uuid,
    pub to_account: Uuid,
    pub amount: Decimal,
}

#[derive(Debug, Serialize)]
pub struct TransferResponse {
    pub id: Uuid,
    pub from_account: Uuid,
    pub to_account: Uuid,
    pub amount: Decimal,
    pub created_at: DateTime<Utc>,
}

impl From<Transfer> for TransferResponse {
    fn from(transfer: Transfer) -> Self {
        Self {
            id: transfer.id,
            from_account: transfer.from_account,
            to_account: transfer.to_account,
            amount: transfer.amount,
            created_at: transfer.created_at,
        }
    }
}
