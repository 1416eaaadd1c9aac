pub mod ledger;
pub mod transfer;
