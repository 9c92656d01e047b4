pub mod error;
pub mod intent;
pub mod ledger;
pub mod party;
pub mod token;
