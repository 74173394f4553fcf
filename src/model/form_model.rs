use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use super::bank_account::{AccountType, BankAccountInfo, CHECKING};
use crate::currency::Amount;
use crate::errors::PortalError;

/// How the policy holder chose to pay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum PayMode {
    #[default]
    Full,
    Partial,
}

impl TryFrom<u8> for PayMode {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(PayMode::Full),
            1 => Ok(PayMode::Partial),
            other => Err(format!("unsupported HowToPay value {other}")),
        }
    }
}

impl From<PayMode> for u8 {
    fn from(mode: PayMode) -> Self {
        match mode {
            PayMode::Full => 0,
            PayMode::Partial => 1,
        }
    }
}

/// Decoded form of the bank-account selection sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountSelection {
    /// Negative identifier: nothing chosen yet.
    NoneChosen,
    /// Zero: the holder is entering a new account.
    EnterNew,
    /// Positive identifier of a saved account.
    Saved(i64),
}

impl AccountSelection {
    pub const NONE_CHOSEN_ID: i64 = -1;

    pub fn from_id(id: i64) -> Self {
        match id {
            i64::MIN..=-1 => AccountSelection::NoneChosen,
            0 => AccountSelection::EnterNew,
            saved => AccountSelection::Saved(saved),
        }
    }

    pub fn id(self) -> i64 {
        match self {
            AccountSelection::NoneChosen => Self::NONE_CHOSEN_ID,
            AccountSelection::EnterNew => 0,
            AccountSelection::Saved(id) => id,
        }
    }
}

/// One policy's payment line.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "PascalCase", default)]
pub struct PolicyPayment {
    pub policy_id: i64,
    pub amount_due: Amount,
    pub payment_amount: Amount,
    /// Raw text of the partial-amount input bound to this line.
    #[serde(skip)]
    pub entered_amount: String,
}

/// Saved accounts, the current selection, and the inline entry fields.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase", default)]
pub struct AchInformation {
    pub saved_bank_accounts: Vec<BankAccountInfo>,
    pub selected_bank_account_info_id: i64,
    pub selected_bank_account_info: BankAccountInfo,
    pub default_bank_account: BankAccountInfo,
    pub account_type: String,
    pub account_type_id: u8,
    pub bank_account_name: String,
    pub bank_account_number: String,
    pub bank_name: String,
    pub routing_number: String,
    #[serde(skip)]
    pub bank_account_number_confirm: String,
    #[serde(skip)]
    pub routing_number_confirm: String,
}

impl Default for AchInformation {
    fn default() -> Self {
        Self {
            saved_bank_accounts: Vec::new(),
            selected_bank_account_info_id: AccountSelection::NONE_CHOSEN_ID,
            selected_bank_account_info: BankAccountInfo::default(),
            default_bank_account: BankAccountInfo::default(),
            account_type: CHECKING.into(),
            account_type_id: 0,
            bank_account_name: String::new(),
            bank_account_number: String::new(),
            bank_name: String::new(),
            routing_number: String::new(),
            bank_account_number_confirm: String::new(),
            routing_number_confirm: String::new(),
        }
    }
}

impl AchInformation {
    pub fn selection(&self) -> AccountSelection {
        AccountSelection::from_id(self.selected_bank_account_info_id)
    }

    pub fn entry_account_type(&self) -> AccountType {
        AccountType::from_id(self.account_type_id)
    }

    /// True when none of the new-account fields hold any input.
    pub fn entry_is_empty(&self) -> bool {
        self.bank_account_number.is_empty()
            && self.bank_name.is_empty()
            && self.bank_account_name.is_empty()
            && self.routing_number.is_empty()
    }

    pub fn saved_account(&self, id: i64) -> Option<&BankAccountInfo> {
        self.saved_bank_accounts
            .iter()
            .find(|account| account.bank_account_info_id == id)
    }

    pub fn remove_saved_account(&mut self, id: i64) -> Option<BankAccountInfo> {
        let position = self
            .saved_bank_accounts
            .iter()
            .position(|account| account.bank_account_info_id == id)?;
        Some(self.saved_bank_accounts.remove(position))
    }

    pub fn reset_entry(&mut self) {
        self.account_type = CHECKING.into();
        self.account_type_id = 0;
        self.bank_account_name.clear();
        self.bank_account_number.clear();
        self.bank_name.clear();
        self.routing_number.clear();
        self.bank_account_number_confirm.clear();
        self.routing_number_confirm.clear();
    }
}

/// The session's single mutable source of truth.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "PascalCase", default)]
pub struct FormModel {
    pub submission_id: i64,
    pub insured_id: i64,
    pub how_to_pay: PayMode,
    pub total_due: Amount,
    pub draft_amount: Amount,
    #[serde(deserialize_with = "lenient_date", skip_serializing_if = "Option::is_none")]
    pub draft_date: Option<NaiveDate>,
    pub policy_payments: Vec<PolicyPayment>,
    pub ach_information: AchInformation,
    pub terms_accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    /// Server fields the wizard does not interpret; sent back untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FormModel {
    pub fn from_json(json: &str) -> Result<Self, PortalError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, PortalError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Total due in full mode, otherwise the sum of the line payments.
    pub fn effective_total(&self) -> Amount {
        match self.how_to_pay {
            PayMode::Full => self.total_due,
            PayMode::Partial => self.policy_payments.iter().map(|p| p.payment_amount).sum(),
        }
    }

    pub fn payment_mut(&mut self, policy_id: i64) -> Option<&mut PolicyPayment> {
        self.policy_payments
            .iter_mut()
            .find(|payment| payment.policy_id == policy_id)
    }

    pub fn selection(&self) -> AccountSelection {
        self.ach_information.selection()
    }
}

fn lenient_date<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<NaiveDate>, D::Error> {
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|text| {
        let head: String = text.chars().take(10).collect();
        NaiveDate::parse_from_str(&head, "%Y-%m-%d").ok()
    }))
}
