pub mod account;
pub mod transfer;
