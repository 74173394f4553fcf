//! Serializable wizard state exchanged with the portal API.

pub mod bank_account;
pub mod form_model;

pub use bank_account::{synthesize_nickname, AccountType, BankAccountInfo, CHECKING, SAVING};
pub use form_model::{AccountSelection, AchInformation, FormModel, PayMode, PolicyPayment};
