use serde::{Deserialize, Serialize};

use crate::currency::mask_number;

pub const CHECKING: &str = "Checking";
pub const SAVING: &str = "Saving";

/// Bank account record as exchanged with the portal API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase", default)]
pub struct BankAccountInfo {
    pub bank_account_info_id: i64,
    pub ach_information_id: i64,
    pub account_type: String,
    pub account_type_id: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bank_account_type: Option<u8>,
    pub bank_account_name: String,
    pub bank_account_number: String,
    pub bank_name: String,
    pub insured_id: i64,
    pub is_active: bool,
    pub masked_account_number: String,
    pub masked_routing_number: String,
    pub routing_number: String,
}

impl Default for BankAccountInfo {
    fn default() -> Self {
        Self {
            bank_account_info_id: 0,
            ach_information_id: 0,
            account_type: CHECKING.into(),
            account_type_id: 0,
            bank_account_type: None,
            bank_account_name: String::new(),
            bank_account_number: String::new(),
            bank_name: String::new(),
            insured_id: 0,
            is_active: true,
            masked_account_number: String::new(),
            masked_routing_number: String::new(),
            routing_number: String::new(),
        }
    }
}

impl BankAccountInfo {
    /// Returns this record laid over `template`: empty text and zero ids
    /// fall back to the template's values.
    pub fn overlay(&self, template: &BankAccountInfo) -> BankAccountInfo {
        fn text(value: &str, fallback: &str) -> String {
            let chosen = if value.is_empty() { fallback } else { value };
            chosen.to_string()
        }
        fn id(value: i64, fallback: i64) -> i64 {
            if value == 0 {
                fallback
            } else {
                value
            }
        }

        BankAccountInfo {
            bank_account_info_id: id(self.bank_account_info_id, template.bank_account_info_id),
            ach_information_id: id(self.ach_information_id, template.ach_information_id),
            account_type: text(&self.account_type, &template.account_type),
            account_type_id: self.account_type_id,
            bank_account_type: self.bank_account_type.or(template.bank_account_type),
            bank_account_name: text(&self.bank_account_name, &template.bank_account_name),
            bank_account_number: text(&self.bank_account_number, &template.bank_account_number),
            bank_name: text(&self.bank_name, &template.bank_name),
            insured_id: id(self.insured_id, template.insured_id),
            is_active: self.is_active,
            masked_account_number: text(&self.masked_account_number, &template.masked_account_number),
            masked_routing_number: text(&self.masked_routing_number, &template.masked_routing_number),
            routing_number: text(&self.routing_number, &template.routing_number),
        }
    }

    /// Derives the display account type from the server's numeric type.
    pub fn normalize_account_type(&mut self) {
        match self.bank_account_type {
            Some(0) | None => {
                self.account_type = CHECKING.into();
                self.account_type_id = 0;
            }
            Some(_) => {
                self.account_type = SAVING.into();
                self.account_type_id = 1;
            }
        }
    }
}

/// Account type offered for a newly entered bank account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccountType {
    #[default]
    Checking,
    Saving,
}

impl AccountType {
    pub fn from_id(id: u8) -> Self {
        if id == 0 {
            AccountType::Checking
        } else {
            AccountType::Saving
        }
    }

    pub fn id(self) -> u8 {
        match self {
            AccountType::Checking => 0,
            AccountType::Saving => 1,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AccountType::Checking => CHECKING,
            AccountType::Saving => SAVING,
        }
    }

    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "0" | "checking" => Some(AccountType::Checking),
            "1" | "saving" | "savings" => Some(AccountType::Saving),
            _ => None,
        }
    }
}

/// Builds the nickname shown for an entered account.
pub fn synthesize_nickname(bank_name: &str, account_type_name: &str, account_number: &str) -> String {
    format!(
        "{} - {} - {}",
        bank_name,
        account_type_name,
        mask_number(account_number)
    )
}
