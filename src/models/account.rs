use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::store::{Entity, InsertRow, PatchRow, SqlValue};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Account {
    pub id: Uuid,
    pub owner_name: String,
    pub balance: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    pub const ID: &'static str = "id";
    pub const OWNER_NAME: &'static str = "owner_name";
    pub const BALANCE: &'static str = "balance";
    pub const CREATED_AT: &'static str = "created_at";
    pub const UPDATED_AT: &'static str = "updated_at";
}

impl Entity for Account {
    const TABLE: &'static str = "accounts";
    const COLUMNS: &'static [&'static str] = &[
        Account::ID,
        Account::OWNER_NAME,
        Account::BALANCE,
        Account::CREATED_AT,
        Account::UPDATED_AT,
    ];

    fn id(&self) -> Uuid {
        self.id
    }

    fn value_of(&self, column: &str) -> Option<SqlValue> {
        match column {
            Account::ID => Some(self.id.into()),
            Account::OWNER_NAME => Some(self.owner_name.clone().into()),
            Account::BALANCE => Some(self.balance.into()),
            Account::CREATED_AT => Some(self.created_at.into()),
            Account::UPDATED_AT => Some(self.updated_at.into()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewAccount {
    pub owner_name: String,
    pub balance: Decimal,
}

impl InsertRow for NewAccount {
    type Entity = Account;

    fn columns(&self) -> &'static [&'static str] {
        &[Account::OWNER_NAME, Account::BALANCE]
    }

    fn values(&self) -> Vec<SqlValue> {
        vec![self.owner_name.clone().into(), self.balance.into()]
    }
}

/// Unset fields are left untouched by `update_locked`.
#[derive(Debug, Clone, Default)]
pub struct AccountPatch {
    pub owner_name: Option<String>,
    pub balance: Option<Decimal>,
}

impl AccountPatch {
    pub fn balance(value: Decimal) -> Self {
        Self {
            balance: Some(value),
            ..Self::default()
        }
    }

    pub fn owner_name(value: impl Into<String>) -> Self {
        Self {
            owner_name: Some(value.into()),
            ..Self::default()
        }
    }
}

impl PatchRow for AccountPatch {
    type Entity = Account;

    fn changes(&self) -> Vec<(&'static str, SqlValue)> {
        let mut changes = Vec::new();
        if let Some(owner_name) = &self.owner_name {
            changes.push((Account::OWNER_NAME, owner_name.clone().into()));
        }
        if let Some(balance) = self.balance {
            changes.push((Account::BALANCE, balance.into()));
        }
        changes
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateAccountRequest {
    pub owner_name: String,
    #[serde(default)]
    pub balance: Option<Decimal>,
}

/// Outward account shape: `updated_at` stays internal.
#[derive(Debug, Serialize)]
pub struct AccountView {
    pub id: Uuid,
    pub owner_name: String,
    pub balance: Decimal,
    pub created_at: DateTime<Utc>,
}

impl From<Account> for AccountView {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            owner_name: account.owner_name,
            balance: account.balance,
            created_at: account.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::changed_fields;

    fn account(balance: Decimal) -> Account {
        let now = Utc::now();
        Account {
            id: Uuid::new_v4(),
            owner_name: "alice".to_string(),
            balance,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn value_of_covers_every_column() {
        let account = account(Decimal::new(100, 0));
        for column in Account::COLUMNS {
            assert!(account.value_of(column).is_some(), "missing {column}");
        }
        assert!(account.value_of("nickname").is_none());
    }

    #[test]
    fn unchanged_patch_fields_are_dropped() {
        let account = account(Decimal::new(100, 0));

        let same = AccountPatch {
            owner_name: Some("alice".to_string()),
            balance: Some(Decimal::new(100, 0)),
        };
        assert!(changed_fields(&account, &same).is_empty());

        let debit = AccountPatch::balance(Decimal::new(70, 0));
        let changed = changed_fields(&account, &debit);
        assert_eq!(changed.len(), 1);
        assert_eq!(changed[0].0, Account::BALANCE);
    }

    #[test]
    fn view_drops_updated_at_only() {
        let account = account(Decimal::new(5, 0));
        let view = AccountView::from(account.clone());
        assert_eq!(view.id, account.id);
        assert_eq!(view.owner_name, account.owner_name);
        assert_eq!(view.balance, account.balance);
        assert_eq!(view.created_at, account.created_at);
    }
}
